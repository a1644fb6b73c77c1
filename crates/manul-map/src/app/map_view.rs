//! The walkers map memory seen through the coordinator's [`MapSurface`]

use manul_map_lib::{Bounds, GraphicHandle, LayerName, MIN_SELECT_ZOOM, MapSurface, VisibilitySet, utils};
use walkers::MapMemory;

pub const MIN_ZOOM: f64 = 3.0;
pub const MAX_ZOOM: f64 = 19.0;
pub const INITIAL_CENTER: (f64, f64) = (49.5, 95.0);
pub const INITIAL_ZOOM: f64 = 4.0;

/// Camera, attached layers and the open popup
pub struct MapView {
    pub memory: MapMemory,
    attached: VisibilitySet,
    popup: Option<GraphicHandle>,
    /// Size of the map widget in the last frame
    viewport: Option<egui::Vec2>,
    /// Fit requested before the widget was laid out
    pending_fit: Option<Bounds>,
}

impl Default for MapView {
    fn default() -> Self {
        Self::new()
    }
}

impl MapView {
    pub fn new() -> Self {
        let mut view = Self {
            memory: MapMemory::default(),
            attached: VisibilitySet::all(),
            popup: None,
            viewport: None,
            pending_fit: None,
        };
        view.set_view(INITIAL_CENTER.0, INITIAL_CENTER.1, INITIAL_ZOOM);
        view
    }

    pub fn attached(&self) -> VisibilitySet {
        self.attached
    }

    /// Open popup, if its layer is still attached
    pub fn popup(&self) -> Option<GraphicHandle> {
        self.popup.filter(|p| self.attached.get(p.layer()))
    }

    /// Record the widget size and run a fit that was waiting for it
    pub fn set_viewport(&mut self, size: egui::Vec2) {
        self.viewport = Some(size);
        if let Some(bounds) = self.pending_fit.take() {
            self.apply_fit(bounds, size);
        }
    }

    /// Keep user zooming inside the allowed range
    pub fn clamp_zoom(&mut self) {
        let zoom = self.memory.zoom();
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            let _ = self.memory.set_zoom(zoom.clamp(MIN_ZOOM, MAX_ZOOM));
        }
    }

    fn apply_fit(&mut self, bounds: Bounds, size: egui::Vec2) {
        let min = utils::wgs84_to_mercator(bounds.south(), bounds.west());
        let max = utils::wgs84_to_mercator(bounds.north(), bounds.east());
        let zoom = utils::zoom_to_fit(min, max, size.x as f64, size.y as f64).unwrap_or(MIN_SELECT_ZOOM);
        let (lat, lng) = bounds.center();
        self.set_view(lat, lng, zoom);
        tracing::trace!(
            "Fitted to ({:.3}, {:.3}) - ({:.3}, {:.3}) at zoom {:.1}",
            bounds.south(),
            bounds.west(),
            bounds.north(),
            bounds.east(),
            zoom
        );
    }
}

impl MapSurface for MapView {
    fn set_layer_attached(&mut self, layer: LayerName, attached: bool) {
        self.attached.set(layer, attached);
    }

    fn zoom(&self) -> f64 {
        self.memory.zoom()
    }

    fn set_view(&mut self, lat: f64, lng: f64, zoom: f64) {
        self.memory.center_at(walkers::lat_lon(lat, lng));
        let _ = self.memory.set_zoom(zoom.clamp(MIN_ZOOM, MAX_ZOOM));
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        match self.viewport {
            Some(size) => self.apply_fit(bounds, size),
            None => self.pending_fit = Some(bounds),
        }
    }

    fn open_popup(&mut self, graphic: GraphicHandle) {
        self.popup = Some(graphic);
    }

    fn close_popup(&mut self) {
        self.popup = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_view() {
        let view = MapView::new();
        assert_eq!(view.zoom(), INITIAL_ZOOM);
        assert_eq!(view.attached(), VisibilitySet::all());
        assert!(view.popup().is_none());
    }

    #[test]
    fn test_set_view_clamps_zoom() {
        let mut view = MapView::new();
        view.set_view(50.0, 100.0, 25.0);
        assert_eq!(view.zoom(), MAX_ZOOM);
        view.set_view(50.0, 100.0, 0.0);
        assert_eq!(view.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_fit_waits_for_viewport() {
        let mut view = MapView::new();
        view.fit_bounds(Bounds::from_corners(40.0, 80.0, 55.0, 120.0));
        assert_eq!(view.zoom(), INITIAL_ZOOM);

        view.set_viewport(egui::vec2(1280.0, 720.0));
        assert!(view.zoom() >= MIN_ZOOM && view.zoom() <= MAX_ZOOM);
        assert_ne!(view.zoom(), INITIAL_ZOOM);
    }

    #[test]
    fn test_point_bounds_use_select_zoom() {
        let mut view = MapView::new();
        view.set_viewport(egui::vec2(800.0, 600.0));
        view.fit_bounds(Bounds::from_point(51.35, 12.37));
        assert_eq!(view.zoom(), MIN_SELECT_ZOOM);
    }
}
