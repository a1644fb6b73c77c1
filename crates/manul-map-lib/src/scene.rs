//! Feature renderer
//!
//! Turns the loaded documents into features and per-layer graphics. The
//! scene is built once per session and never mutated afterwards; what is
//! visible is decided by the [`LayerVisibilityStore`](crate::LayerVisibilityStore).

use crate::bounds::Bounds;
use crate::feature::{FeatureId, FeatureKind, GeoFeature, PointRecord, RangePolygon};
use crate::layers::{LayerName, VisibilitySet};
use crate::loader::GeoData;
use crate::markup::Markup;
use geo::InteriorPoint;

/// Title of range polygons without a name
pub const DEFAULT_RANGE_NAME: &str = "Ареал манула";

/// Opaque reference to one graphic of one layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphicHandle {
    layer: LayerName,
    index: usize,
}

impl GraphicHandle {
    pub(crate) fn new(layer: LayerName, index: usize) -> Self {
        Self { layer, index }
    }

    pub fn layer(&self) -> LayerName {
        self.layer
    }
}

/// What a graphic draws
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicShape {
    Marker {
        feature: FeatureId,
        kind: FeatureKind,
        lat: f64,
        lng: f64,
    },
    Polygon(RangePolygon),
}

/// A drawable item with its popup
#[derive(Debug, Clone, PartialEq)]
pub struct Graphic {
    pub shape: GraphicShape,
    pub popup: Markup,
}

impl Graphic {
    /// Where the popup is anchored, as (lat, lng)
    pub fn anchor(&self) -> Option<(f64, f64)> {
        match &self.shape {
            GraphicShape::Marker { lat, lng, .. } => Some((*lat, *lng)),
            GraphicShape::Polygon(polygon) => polygon
                .to_geo()
                .interior_point()
                .map(|p| (p.y(), p.x())),
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match &self.shape {
            GraphicShape::Marker { lat, lng, .. } => Some(Bounds::from_point(*lat, *lng)),
            GraphicShape::Polygon(polygon) => polygon.bounds(),
        }
    }
}

/// All graphics of one layer, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerGroup {
    graphics: Vec<Graphic>,
}

impl LayerGroup {
    fn push(&mut self, graphic: Graphic) -> usize {
        self.graphics.push(graphic);
        self.graphics.len() - 1
    }

    pub fn graphics(&self) -> &[Graphic] {
        &self.graphics
    }

    pub fn len(&self) -> usize {
        self.graphics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.graphics
            .iter()
            .fold(None, |acc, g| Bounds::merge(acc, g.bounds()))
    }
}

/// Rendered features and layers for one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    features: Vec<GeoFeature>,
    layers: [LayerGroup; 3],
}

impl Scene {
    /// Build the scene from loaded data
    ///
    /// Features are numbered in load order: every zoo, then every reserve,
    /// each in file order. Records with unusable coordinates are skipped.
    pub fn build(data: GeoData) -> Self {
        #[cfg(feature = "profiling")]
        profiling::scope!("scene::build");

        let mut scene = Self::default();
        scene.add_points(data.zoos, FeatureKind::Zoo);
        scene.add_points(data.reserves, FeatureKind::Reserve);

        let polygon_count = data.range.polygons.len();
        for record in data.range.polygons {
            match RangePolygon::from_record(record) {
                Some(polygon) => {
                    let title = polygon.name.as_deref().unwrap_or(DEFAULT_RANGE_NAME);
                    let popup = Markup::builder().bold(title).build();
                    scene.layers[LayerName::Range.index()].push(Graphic {
                        shape: GraphicShape::Polygon(polygon),
                        popup,
                    });
                }
                None => tracing::warn!("Skipping range polygon with invalid coordinates"),
            }
        }

        tracing::info!(
            zoos = scene.count(FeatureKind::Zoo),
            reserves = scene.count(FeatureKind::Reserve),
            polygons = scene.layer(LayerName::Range).len(),
            skipped_polygons = polygon_count - scene.layer(LayerName::Range).len(),
            "Scene built"
        );

        scene
    }

    fn add_points(&mut self, records: Vec<PointRecord>, kind: FeatureKind) {
        let layer = kind.layer();
        for record in records {
            let name = record.name.clone();
            let id = FeatureId(self.features.len());
            let handle = GraphicHandle::new(layer, self.layers[layer.index()].len());
            let Some(feature) = GeoFeature::from_record(record, id, kind, handle) else {
                tracing::warn!(name = %name, ?kind, "Skipping record with invalid coordinates");
                continue;
            };

            let popup = Markup::builder()
                .bold(&feature.name)
                .line_break()
                .small(&feature.location_line())
                .line_break()
                .small_labelled("Тип:", kind.type_label())
                .build();

            self.layers[layer.index()].push(Graphic {
                shape: GraphicShape::Marker {
                    feature: id,
                    kind,
                    lat: feature.lat,
                    lng: feature.lng,
                },
                popup,
            });
            self.features.push(feature);
        }
    }

    /// Point features in load order
    pub fn features(&self) -> &[GeoFeature] {
        &self.features
    }

    pub fn feature(&self, id: FeatureId) -> Option<&GeoFeature> {
        self.features.get(id.0)
    }

    pub fn layer(&self, layer: LayerName) -> &LayerGroup {
        &self.layers[layer.index()]
    }

    pub fn graphic(&self, handle: GraphicHandle) -> Option<&Graphic> {
        self.layers[handle.layer.index()].graphics.get(handle.index)
    }

    /// Number of features of a kind
    pub fn count(&self, kind: FeatureKind) -> usize {
        self.layer(kind.layer()).len()
    }

    /// Union of the bounds of every graphic in the visible layers
    pub fn bounds_of(&self, visible: &VisibilitySet) -> Option<Bounds> {
        LayerName::ALL
            .iter()
            .filter(|layer| visible.get(**layer))
            .fold(None, |acc, layer| Bounds::merge(acc, self.layer(*layer).bounds()))
    }

    /// Topmost graphic of the visible layers under a position
    ///
    /// Markers within `marker_radius_deg` win over polygons.
    pub fn hit_test(
        &self,
        lat: f64,
        lng: f64,
        marker_radius_deg: f64,
        visible: &VisibilitySet,
    ) -> Option<GraphicHandle> {
        let mut best: Option<(GraphicHandle, f64)> = None;
        for layer in [LayerName::Zoos, LayerName::Reserves] {
            if !visible.get(layer) {
                continue;
            }
            for (index, graphic) in self.layer(layer).graphics.iter().enumerate() {
                if let GraphicShape::Marker { lat: mlat, lng: mlng, .. } = graphic.shape {
                    let distance = ((mlat - lat).powi(2) + (mlng - lng).powi(2)).sqrt();
                    if distance <= marker_radius_deg
                        && best.is_none_or(|(_, d)| distance < d)
                    {
                        best = Some((GraphicHandle::new(layer, index), distance));
                    }
                }
            }
        }
        if let Some((handle, _)) = best {
            return Some(handle);
        }

        if !visible.get(LayerName::Range) {
            return None;
        }
        self.layer(LayerName::Range)
            .graphics
            .iter()
            .enumerate()
            .rev()
            .find(|(_, g)| matches!(&g.shape, GraphicShape::Polygon(p) if p.contains(lat, lng)))
            .map(|(index, _)| GraphicHandle::new(LayerName::Range, index))
    }
}
