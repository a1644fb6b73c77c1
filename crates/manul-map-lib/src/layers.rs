//! Layer visibility
//!
//! The store is the only place visibility changes. Every control that shows
//! a layer's state (chips, legend checkboxes, the show/hide-all button)
//! reads it from here, and every change goes through [`LayerVisibilityStore::set_visible`],
//! so the controls and the map attachment can never disagree.

use crate::scene::Scene;
use crate::surface::MapSurface;

/// Padding ratio applied around the visible data when fitting the view
pub const FIT_PADDING: f64 = 0.15;

/// One of the three toggleable overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerName {
    Zoos,
    Reserves,
    Range,
}

impl LayerName {
    pub const ALL: [LayerName; 3] = [LayerName::Zoos, LayerName::Reserves, LayerName::Range];

    /// Stable identifier used by controls
    pub fn key(&self) -> &'static str {
        match self {
            Self::Zoos => "zoos",
            Self::Reserves => "reserves",
            Self::Range => "range",
        }
    }

    /// Human-readable label for chips and the legend
    pub fn label(&self) -> &'static str {
        match self {
            Self::Zoos => "Зоопарки",
            Self::Reserves => "ООПТ",
            Self::Range => "Ареал",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.key() == key)
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Zoos => 0,
            Self::Reserves => 1,
            Self::Range => 2,
        }
    }
}

/// Visibility of every layer at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilitySet([bool; 3]);

impl VisibilitySet {
    pub fn all() -> Self {
        Self([true; 3])
    }

    pub fn none() -> Self {
        Self([false; 3])
    }

    pub fn get(&self, layer: LayerName) -> bool {
        self.0[layer.index()]
    }

    pub fn set(&mut self, layer: LayerName, visible: bool) {
        self.0[layer.index()] = visible;
    }

    pub fn aggregate(&self) -> AggregateVisibility {
        match self.0.iter().filter(|v| **v).count() {
            3 => AggregateVisibility::AllVisible,
            0 => AggregateVisibility::AllHidden,
            _ => AggregateVisibility::PartialVisible,
        }
    }
}

impl Default for VisibilitySet {
    fn default() -> Self {
        Self::all()
    }
}

/// Combined state shown by the show/hide-all control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateVisibility {
    AllVisible,
    PartialVisible,
    AllHidden,
}

impl AggregateVisibility {
    /// Label of the show/hide-all button for this state
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Self::AllVisible => "Скрыть все слои",
            _ => "Показать все слои",
        }
    }
}

type ToggleListener = Box<dyn FnMut(LayerName, bool)>;

/// Single owner of per-layer visibility
pub struct LayerVisibilityStore {
    visible: VisibilitySet,
    listeners: Vec<ToggleListener>,
}

impl std::fmt::Debug for LayerVisibilityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerVisibilityStore")
            .field("visible", &self.visible)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for LayerVisibilityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerVisibilityStore {
    /// All layers start visible
    pub fn new() -> Self {
        Self {
            visible: VisibilitySet::all(),
            listeners: Vec::new(),
        }
    }

    pub fn is_visible(&self, layer: LayerName) -> bool {
        self.visible.get(layer)
    }

    pub fn visibility(&self) -> VisibilitySet {
        self.visible
    }

    pub fn aggregate(&self) -> AggregateVisibility {
        self.visible.aggregate()
    }

    /// Register a callback fired after each real change of one layer
    pub fn on_layer_toggled(&mut self, listener: impl FnMut(LayerName, bool) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Show or hide one layer
    ///
    /// The surface attachment is always brought in line with the requested
    /// state, even when it already matches. Listeners only hear about
    /// actual changes.
    pub fn set_visible(&mut self, layer: LayerName, visible: bool, surface: &mut dyn MapSurface) {
        let changed = self.visible.get(layer) != visible;
        self.visible.set(layer, visible);
        surface.set_layer_attached(layer, visible);

        if changed {
            tracing::debug!(layer = layer.key(), visible, "Layer visibility changed");
            for listener in &mut self.listeners {
                listener(layer, visible);
            }
        }
    }

    /// Flip one layer and return its new state
    pub fn toggle(&mut self, layer: LayerName, surface: &mut dyn MapSurface) -> bool {
        let visible = !self.is_visible(layer);
        self.set_visible(layer, visible, surface);
        visible
    }

    /// Show every layer and fit the view to the data
    pub fn show_all(&mut self, scene: &Scene, surface: &mut dyn MapSurface) {
        for layer in LayerName::ALL {
            self.set_visible(layer, true, surface);
        }
        if let Some(bounds) = scene.bounds_of(&self.visible)
            && bounds.is_valid()
        {
            surface.fit_bounds(bounds.pad(FIT_PADDING));
        }
    }

    /// Hide every layer and close any open popup
    pub fn hide_all(&mut self, surface: &mut dyn MapSurface) {
        for layer in LayerName::ALL {
            self.set_visible(layer, false, surface);
        }
        surface.close_popup();
    }

    /// Hide everything when all layers are visible, otherwise show everything
    ///
    /// Returns true when the layers were shown.
    pub fn toggle_all(&mut self, scene: &Scene, surface: &mut dyn MapSurface) -> bool {
        if self.aggregate() == AggregateVisibility::AllVisible {
            self.hide_all(surface);
            false
        } else {
            self.show_all(scene, surface);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tests::sample_data;
    use crate::surface::tests::{RecordingSurface, SurfaceCall};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_layer_keys() {
        for layer in LayerName::ALL {
            assert_eq!(LayerName::from_key(layer.key()), Some(layer));
        }
        assert_eq!(LayerName::from_key("lakes"), None);
    }

    #[test]
    fn test_aggregate() {
        let mut set = VisibilitySet::all();
        assert_eq!(set.aggregate(), AggregateVisibility::AllVisible);
        set.set(LayerName::Range, false);
        assert_eq!(set.aggregate(), AggregateVisibility::PartialVisible);
        assert_eq!(VisibilitySet::none().aggregate(), AggregateVisibility::AllHidden);
        assert_eq!(AggregateVisibility::AllVisible.toggle_label(), "Скрыть все слои");
        assert_eq!(AggregateVisibility::PartialVisible.toggle_label(), "Показать все слои");
    }

    #[test]
    fn test_set_visible_notifies_only_on_change() {
        let mut store = LayerVisibilityStore::new();
        let mut surface = RecordingSurface::default();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        store.on_layer_toggled(move |layer, visible| sink.borrow_mut().push((layer, visible)));

        store.set_visible(LayerName::Zoos, true, &mut surface);
        assert!(events.borrow().is_empty());
        // Attachment is still synced on a no-op
        assert_eq!(surface.calls, vec![SurfaceCall::Attach(LayerName::Zoos, true)]);

        store.set_visible(LayerName::Zoos, false, &mut surface);
        store.set_visible(LayerName::Zoos, false, &mut surface);
        assert_eq!(*events.borrow(), vec![(LayerName::Zoos, false)]);
        assert!(!store.is_visible(LayerName::Zoos));
        assert!(!surface.attached(LayerName::Zoos));
    }

    #[test]
    fn test_toggle() {
        let mut store = LayerVisibilityStore::new();
        let mut surface = RecordingSurface::default();
        assert!(!store.toggle(LayerName::Range, &mut surface));
        assert!(store.toggle(LayerName::Range, &mut surface));
        assert!(surface.attached(LayerName::Range));
    }

    #[test]
    fn test_hide_all_closes_popup() {
        let mut store = LayerVisibilityStore::new();
        let mut surface = RecordingSurface::default();
        store.hide_all(&mut surface);
        assert_eq!(store.aggregate(), AggregateVisibility::AllHidden);
        assert_eq!(surface.calls.last(), Some(&SurfaceCall::ClosePopup));
        for layer in LayerName::ALL {
            assert!(!surface.attached(layer));
        }
    }

    #[test]
    fn test_show_all_fits_padded_bounds() {
        let scene = Scene::build(sample_data());
        let mut store = LayerVisibilityStore::new();
        let mut surface = RecordingSurface::default();
        store.hide_all(&mut surface);
        store.show_all(&scene, &mut surface);

        assert_eq!(store.aggregate(), AggregateVisibility::AllVisible);
        let expected = scene.bounds_of(&VisibilitySet::all()).unwrap().pad(FIT_PADDING);
        assert_eq!(surface.calls.last(), Some(&SurfaceCall::Fit(expected)));
    }

    #[test]
    fn test_show_all_without_data_does_not_fit() {
        let scene = Scene::default();
        let mut store = LayerVisibilityStore::new();
        let mut surface = RecordingSurface::default();
        store.show_all(&scene, &mut surface);
        assert!(!surface.calls.iter().any(|c| matches!(c, SurfaceCall::Fit(_))));
    }

    #[test]
    fn test_toggle_all_round_trip() {
        let scene = Scene::build(sample_data());
        let mut store = LayerVisibilityStore::new();
        let mut surface = RecordingSurface::default();

        assert!(!store.toggle_all(&scene, &mut surface));
        assert_eq!(store.aggregate(), AggregateVisibility::AllHidden);

        store.set_visible(LayerName::Zoos, true, &mut surface);
        assert_eq!(store.aggregate(), AggregateVisibility::PartialVisible);
        // Partial state shows everything
        assert!(store.toggle_all(&scene, &mut surface));
        assert_eq!(store.aggregate(), AggregateVisibility::AllVisible);
    }
}
