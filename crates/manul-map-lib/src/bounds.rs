//! Geographic bounding boxes used for bounds-fitting

use geo::{Coord, Rect};

/// Axis-aligned WGS84 bounding box
///
/// Stored as a [`geo::Rect`] with `x = longitude` and `y = latitude`, the
/// same axis order the map widget uses for its positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    rect: Rect<f64>,
}

impl Bounds {
    /// Bounds covering a single position
    pub fn from_point(lat: f64, lng: f64) -> Self {
        let c = Coord { x: lng, y: lat };
        Self {
            rect: Rect::new(c, c),
        }
    }

    /// Bounds from two opposite corners in any order
    pub fn from_corners(lat_a: f64, lng_a: f64, lat_b: f64, lng_b: f64) -> Self {
        Self {
            rect: Rect::new(Coord { x: lng_a, y: lat_a }, Coord { x: lng_b, y: lat_b }),
        }
    }

    /// Smallest bounds covering every position, `None` for an empty input
    pub fn of_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut bounds: Option<Self> = None;
        for (lat, lng) in points {
            match bounds.as_mut() {
                Some(b) => b.extend_point(lat, lng),
                None => bounds = Some(Self::from_point(lat, lng)),
            }
        }
        bounds
    }

    /// Grow to include a position
    pub fn extend_point(&mut self, lat: f64, lng: f64) {
        self.extend(&Self::from_point(lat, lng));
    }

    /// Grow to include other bounds
    pub fn extend(&mut self, other: &Bounds) {
        let min = Coord {
            x: self.rect.min().x.min(other.rect.min().x),
            y: self.rect.min().y.min(other.rect.min().y),
        };
        let max = Coord {
            x: self.rect.max().x.max(other.rect.max().x),
            y: self.rect.max().y.max(other.rect.max().y),
        };
        self.rect = Rect::new(min, max);
    }

    /// Union of two optional bounds
    pub fn merge(a: Option<Bounds>, b: Option<Bounds>) -> Option<Bounds> {
        match (a, b) {
            (Some(mut a), Some(b)) => {
                a.extend(&b);
                Some(a)
            }
            (a, None) => a,
            (None, b) => b,
        }
    }

    /// Grow every side by `ratio` of the span along that axis
    pub fn pad(&self, ratio: f64) -> Self {
        let lat_buffer = self.rect.height() * ratio;
        let lng_buffer = self.rect.width() * ratio;
        Self {
            rect: Rect::new(
                Coord {
                    x: self.west() - lng_buffer,
                    y: self.south() - lat_buffer,
                },
                Coord {
                    x: self.east() + lng_buffer,
                    y: self.north() + lat_buffer,
                },
            ),
        }
    }

    /// Whether every corner is a finite number
    pub fn is_valid(&self) -> bool {
        [self.south(), self.west(), self.north(), self.east()]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn south(&self) -> f64 {
        self.rect.min().y
    }

    pub fn west(&self) -> f64 {
        self.rect.min().x
    }

    pub fn north(&self) -> f64 {
        self.rect.max().y
    }

    pub fn east(&self) -> f64 {
        self.rect.max().x
    }

    /// Center as (lat, lng)
    pub fn center(&self) -> (f64, f64) {
        let c = self.rect.center();
        (c.y, c.x)
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.south()..=self.north()).contains(&lat) && (self.west()..=self.east()).contains(&lng)
    }

    pub fn as_rect(&self) -> Rect<f64> {
        self.rect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_points_empty() {
        assert!(Bounds::of_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_of_points_covers_all() {
        let b = Bounds::of_points([(50.0, 90.0), (45.0, 110.0), (52.0, 100.0)]).unwrap();
        assert_eq!(b.south(), 45.0);
        assert_eq!(b.north(), 52.0);
        assert_eq!(b.west(), 90.0);
        assert_eq!(b.east(), 110.0);
        assert!(b.contains(50.0, 100.0));
        assert!(!b.contains(44.0, 100.0));
    }

    #[test]
    fn test_pad_fifteen_percent() {
        let b = Bounds::from_corners(40.0, 80.0, 60.0, 120.0).pad(0.15);
        assert!((b.south() - 37.0).abs() < 1e-9);
        assert!((b.north() - 63.0).abs() < 1e-9);
        assert!((b.west() - 74.0).abs() < 1e-9);
        assert!((b.east() - 126.0).abs() < 1e-9);
        let (lat, lng) = b.center();
        assert!((lat - 50.0).abs() < 1e-9);
        assert!((lng - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_merge() {
        let a = Some(Bounds::from_point(10.0, 10.0));
        let b = Some(Bounds::from_point(20.0, 30.0));
        let m = Bounds::merge(a, b).unwrap();
        assert_eq!((m.south(), m.west(), m.north(), m.east()), (10.0, 10.0, 20.0, 30.0));
        assert_eq!(Bounds::merge(None, b), b);
        assert!(Bounds::merge(None, None).is_none());
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(Bounds::from_point(50.0, 90.0).is_valid());
        assert!(!Bounds::from_point(f64::NAN, 90.0).is_valid());
    }
}
