use crate::bounds::Bounds;
use crate::layers::LayerName;
use crate::scene::GraphicHandle;

/// What the coordinator needs from a map widget
///
/// Implemented by the viewer on top of the map widget's memory, and by a
/// recording fake in tests.
pub trait MapSurface {
    /// Attach or detach a layer's graphics
    fn set_layer_attached(&mut self, layer: LayerName, attached: bool);

    /// Current zoom level
    fn zoom(&self) -> f64;

    /// Center the view on a position at a zoom level
    fn set_view(&mut self, lat: f64, lng: f64, zoom: f64);

    /// Move and zoom so that the bounds fill the viewport
    fn fit_bounds(&mut self, bounds: Bounds);

    fn open_popup(&mut self, graphic: GraphicHandle);

    fn close_popup(&mut self);
}
