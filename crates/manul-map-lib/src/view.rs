//! View synchronizer: result selection, delayed popups and fit-all

use crate::feature::FeatureId;
use crate::layers::LayerVisibilityStore;
use crate::scene::{GraphicHandle, Scene};
use crate::surface::MapSurface;
use instant::Instant;
use std::time::Duration;

/// Zoom used when focusing a selected feature, unless already closer
pub const MIN_SELECT_ZOOM: f64 = 7.0;

/// Delay between centering on a feature and opening its popup
pub const POPUP_OPEN_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingPopup {
    graphic: GraphicHandle,
    due: Instant,
}

/// Moves the viewport in response to user actions
#[derive(Debug, Clone, Default)]
pub struct ViewSynchronizer {
    pending: Option<PendingPopup>,
}

impl ViewSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Focus a search result
    ///
    /// Makes the feature's layer visible, centers on it without zooming out
    /// and schedules its popup. Returns false for an unknown id.
    pub fn select_result(
        &mut self,
        id: FeatureId,
        scene: &Scene,
        store: &mut LayerVisibilityStore,
        surface: &mut dyn MapSurface,
        now: Instant,
    ) -> bool {
        let Some(feature) = scene.feature(id) else {
            tracing::warn!(id = id.0, "Selected feature does not exist");
            return false;
        };

        store.set_visible(feature.kind.layer(), true, surface);
        let zoom = surface.zoom().max(MIN_SELECT_ZOOM);
        surface.set_view(feature.lat, feature.lng, zoom);
        self.pending = Some(PendingPopup {
            graphic: feature.marker,
            due: now + POPUP_OPEN_DELAY,
        });

        tracing::debug!(name = %feature.name, zoom, "Focused search result");
        true
    }

    /// Open the scheduled popup once it is due
    ///
    /// The popup is dropped if its layer was hidden in the meantime.
    pub fn poll(&mut self, now: Instant, store: &LayerVisibilityStore, surface: &mut dyn MapSurface) {
        let Some(pending) = self.pending else {
            return;
        };
        if now < pending.due {
            return;
        }
        self.pending = None;
        if store.is_visible(pending.graphic.layer()) {
            surface.open_popup(pending.graphic);
        }
    }

    /// The show/hide-all action
    ///
    /// Returns true when the layers were shown.
    pub fn fit_all(
        &mut self,
        scene: &Scene,
        store: &mut LayerVisibilityStore,
        surface: &mut dyn MapSurface,
    ) -> bool {
        let shown = store.toggle_all(scene, surface);
        if !shown {
            self.pending = None;
        }
        shown
    }

    /// When the next popup is due, for scheduling a repaint
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.due)
    }
}
