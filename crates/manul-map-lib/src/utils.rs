//! Coordinate helpers shared by bounds fitting and record validation

use geo::Point;

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;
pub const EARTH_MERCATOR_MIN: f64 = -20037508.34;
pub const EARTH_SIZE_METERS: f64 = EARTH_MERCATOR_MAX - EARTH_MERCATOR_MIN;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Side of a slippy-map tile in pixels
pub const TILE_SIZE: f64 = 256.0;

const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;
const X_TO_LON_FACTOR: f64 = 180.0 / EARTH_MERCATOR_MAX;
const Y_TO_LAT_FACTOR: f64 = std::f64::consts::PI / EARTH_MERCATOR_MAX;

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// Latitude is clamped to the representable range first.
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = lon * LON_TO_X_FACTOR;
    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;
    Point::new(x, y)
}

/// Convert Web Mercator (x, y) in meters to WGS84 (lat, lon)
#[inline(always)]
pub fn mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = x * X_TO_LON_FACTOR;
    let lat =
        (std::f64::consts::PI / 2.0 - 2.0 * ((-y * Y_TO_LAT_FACTOR).exp()).atan()).to_degrees();
    (lat, lon)
}

/// Whether a coordinate pair is a finite, in-range WGS84 position
#[inline]
pub fn is_valid_lat_lng(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}

/// Largest integer zoom at which a Mercator span fits into a pixel viewport
///
/// Returns `None` when the span is degenerate (a single point) or the
/// viewport has no area, in which case the caller picks a zoom itself.
pub fn zoom_to_fit(
    min: Point<f64>,
    max: Point<f64>,
    viewport_width: f64,
    viewport_height: f64,
) -> Option<f64> {
    if viewport_width <= 0.0 || viewport_height <= 0.0 {
        return None;
    }

    let span_x = (max.x() - min.x()).abs();
    let span_y = (max.y() - min.y()).abs();
    if span_x <= f64::EPSILON && span_y <= f64::EPSILON {
        return None;
    }

    // At zoom z the world is TILE_SIZE * 2^z pixels wide
    let zoom_for = |span: f64, pixels: f64| {
        if span <= f64::EPSILON {
            f64::INFINITY
        } else {
            (pixels * EARTH_SIZE_METERS / (TILE_SIZE * span)).log2()
        }
    };

    let zoom = zoom_for(span_x, viewport_width).min(zoom_for(span_y, viewport_height));
    Some(zoom.floor())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_to_mercator_origin() {
        let point = wgs84_to_mercator(0.0, 0.0);
        assert!((point.x() - 0.0).abs() < 0.01);
        assert!((point.y() - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_mercator_to_wgs84_roundtrip() {
        let (lat, lon) = (51.7, 94.4);
        let mercator = wgs84_to_mercator(lat, lon);
        let (lat2, lon2) = mercator_to_wgs84(mercator.x(), mercator.y());
        assert!((lat - lat2).abs() < 0.0001);
        assert!((lon - lon2).abs() < 0.0001);
    }

    #[test]
    fn test_is_valid_lat_lng() {
        assert!(is_valid_lat_lng(49.5, 95.0));
        assert!(is_valid_lat_lng(-90.0, 180.0));
        assert!(!is_valid_lat_lng(91.0, 0.0));
        assert!(!is_valid_lat_lng(0.0, -180.5));
        assert!(!is_valid_lat_lng(f64::NAN, 0.0));
    }

    #[test]
    fn test_zoom_to_fit_whole_world() {
        let min = Point::new(EARTH_MERCATOR_MIN, EARTH_MERCATOR_MIN);
        let max = Point::new(EARTH_MERCATOR_MAX, EARTH_MERCATOR_MAX);
        // The whole world fits in one 256px tile at zoom 0
        assert_eq!(zoom_to_fit(min, max, 256.0, 256.0), Some(0.0));
        assert_eq!(zoom_to_fit(min, max, 512.0, 512.0), Some(1.0));
    }

    #[test]
    fn test_zoom_to_fit_uses_tighter_axis() {
        let min = wgs84_to_mercator(40.0, 80.0);
        let max = wgs84_to_mercator(55.0, 120.0);
        let wide = zoom_to_fit(min, max, 1600.0, 400.0).unwrap();
        let tall = zoom_to_fit(min, max, 400.0, 1600.0).unwrap();
        assert!(wide >= tall);
    }

    #[test]
    fn test_zoom_to_fit_degenerate() {
        let p = wgs84_to_mercator(50.0, 90.0);
        assert_eq!(zoom_to_fit(p, p, 800.0, 600.0), None);
        assert_eq!(zoom_to_fit(p, wgs84_to_mercator(51.0, 91.0), 0.0, 600.0), None);
    }
}
