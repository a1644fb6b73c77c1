//! Raw data records and the immutable features built from them

use crate::bounds::Bounds;
use crate::layers::LayerName;
use crate::scene::GraphicHandle;
use crate::utils;
use geo::{Contains, Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

/// One entry of `zoos.json` or `reserves.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub region: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

/// The whole of `range.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeDocument {
    #[serde(default)]
    pub polygons: Vec<PolygonRecord>,
}

/// One habitat polygon, vertices as `[lat, lng]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub coords: Vec<[f64; 2]>,
}

/// Kind of a point feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Zoo,
    Reserve,
}

impl FeatureKind {
    /// Layer the feature's marker lives in
    pub fn layer(&self) -> LayerName {
        match self {
            Self::Zoo => LayerName::Zoos,
            Self::Reserve => LayerName::Reserves,
        }
    }

    /// Type line shown in the popup
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Zoo => "зоопарк",
            Self::Reserve => "ООПТ / заповедник",
        }
    }

    /// Short badge shown next to search results
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Zoo => "Зоопарк",
            Self::Reserve => "ООПТ",
        }
    }
}

/// Position of a feature in load order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(pub usize);

/// A zoo or reserve plotted on the map
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    pub id: FeatureId,
    pub name: String,
    pub country: String,
    pub region: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub kind: FeatureKind,
    /// Marker drawn for this feature
    pub marker: GraphicHandle,
}

impl GeoFeature {
    /// Validate a record; `None` when the coordinates are unusable
    pub(crate) fn from_record(
        record: PointRecord,
        id: FeatureId,
        kind: FeatureKind,
        marker: GraphicHandle,
    ) -> Option<Self> {
        if !utils::is_valid_lat_lng(record.lat, record.lng) {
            return None;
        }
        Some(Self {
            id,
            name: record.name,
            country: record.country,
            // An empty region is the same as no region
            region: record.region.filter(|r| !r.trim().is_empty()),
            lat: record.lat,
            lng: record.lng,
            kind,
            marker,
        })
    }

    /// `country` or `country, region`
    pub fn location_line(&self) -> String {
        match &self.region {
            Some(region) => format!("{}, {}", self.country, region),
            None => self.country.clone(),
        }
    }

    /// Raw text the search index normalizes: `name country region`
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {}",
            self.name,
            self.country,
            self.region.as_deref().unwrap_or("")
        )
    }
}

/// A habitat range polygon
#[derive(Debug, Clone, PartialEq)]
pub struct RangePolygon {
    pub name: Option<String>,
    /// Vertices as (lat, lng), in file order
    pub coordinates: Vec<(f64, f64)>,
}

impl RangePolygon {
    /// Validate a record; needs at least three valid vertices
    pub(crate) fn from_record(record: PolygonRecord) -> Option<Self> {
        if record.coords.len() < 3
            || record
                .coords
                .iter()
                .any(|[lat, lng]| !utils::is_valid_lat_lng(*lat, *lng))
        {
            return None;
        }
        Some(Self {
            name: record.name.filter(|n| !n.trim().is_empty()),
            coordinates: record.coords.iter().map(|[lat, lng]| (*lat, *lng)).collect(),
        })
    }

    /// Geometry with `x = lng`, `y = lat`
    pub fn to_geo(&self) -> Polygon<f64> {
        let ring: LineString<f64> = self
            .coordinates
            .iter()
            .map(|(lat, lng)| Coord { x: *lng, y: *lat })
            .collect();
        Polygon::new(ring, vec![])
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of_points(self.coordinates.iter().copied())
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        self.to_geo().contains(&Point::new(lng, lat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> GraphicHandle {
        GraphicHandle::new(LayerName::Zoos, 0)
    }

    #[test]
    fn test_point_record_deserialize_optional_region() {
        let records: Vec<PointRecord> = serde_json::from_str(
            r#"[
                {"name": "Московский зоопарк", "country": "Россия", "lat": 55.76, "lng": 37.58},
                {"name": "Zoo", "country": "Mongolia", "region": "Ulaanbaatar", "lat": 47.9, "lng": 106.9}
            ]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].region, None);
        assert_eq!(records[1].region.as_deref(), Some("Ulaanbaatar"));
    }

    #[test]
    fn test_range_document_missing_polygons() {
        let doc: RangeDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.polygons.is_empty());
    }

    #[test]
    fn test_feature_from_record() {
        let record = PointRecord {
            name: "Zoo".into(),
            country: "Россия".into(),
            region: Some("  ".into()),
            lat: 55.0,
            lng: 37.0,
        };
        let feature = GeoFeature::from_record(record, FeatureId(0), FeatureKind::Zoo, handle()).unwrap();
        assert_eq!(feature.region, None);
        assert_eq!(feature.location_line(), "Россия");
        assert_eq!(feature.search_text(), "Zoo Россия ");
    }

    #[test]
    fn test_feature_rejects_bad_coordinates() {
        let record = PointRecord {
            name: "Nowhere".into(),
            country: "".into(),
            region: None,
            lat: 120.0,
            lng: 37.0,
        };
        assert!(GeoFeature::from_record(record, FeatureId(0), FeatureKind::Zoo, handle()).is_none());
    }

    #[test]
    fn test_location_line_with_region() {
        let record = PointRecord {
            name: "Убсунурская котловина".into(),
            country: "Россия".into(),
            region: Some("Тыва".into()),
            lat: 50.6,
            lng: 93.0,
        };
        let f = GeoFeature::from_record(record, FeatureId(3), FeatureKind::Reserve, handle()).unwrap();
        assert_eq!(f.location_line(), "Россия, Тыва");
        assert_eq!(f.kind.layer(), LayerName::Reserves);
    }

    #[test]
    fn test_range_polygon() {
        let polygon = RangePolygon::from_record(PolygonRecord {
            name: None,
            coords: vec![[40.0, 80.0], [40.0, 120.0], [55.0, 120.0], [55.0, 80.0]],
        })
        .unwrap();
        assert!(polygon.contains(50.0, 100.0));
        assert!(!polygon.contains(60.0, 100.0));
        let b = polygon.bounds().unwrap();
        assert_eq!((b.south(), b.west(), b.north(), b.east()), (40.0, 80.0, 55.0, 120.0));
    }

    #[test]
    fn test_range_polygon_too_few_vertices() {
        let record = PolygonRecord {
            name: Some("line".into()),
            coords: vec![[40.0, 80.0], [41.0, 81.0]],
        };
        assert!(RangePolygon::from_record(record).is_none());
    }
}
