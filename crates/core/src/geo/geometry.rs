//! Planar geometry in geographic coordinates
//!
//! Coordinates are `Point2<f64>` with `x = longitude`, `y = latitude`, both in
//! degrees. Containment is a planar even-odd test: at the 1° scale of the
//! forecast lattice the difference from a spherical test is negligible for
//! the contiguous US.

use nalgebra::Point2;

/// Axis-aligned bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Bounds {
    /// Empty bounds that any point extends
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::INFINITY, f64::INFINITY),
            max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Bounds of a point set, `None` if the set is empty
    pub fn of_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point2<f64>>,
    {
        let mut bounds = Self::empty();
        for p in points {
            bounds.extend(p);
        }
        bounds.is_valid().then_some(bounds)
    }

    /// Grow to include `p`
    pub fn extend(&mut self, p: &Point2<f64>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    /// Grow to include `other`
    pub fn merge(&mut self, other: &Bounds) {
        self.extend(&other.min);
        self.extend(&other.max);
    }

    /// True once at least one point has been added
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    /// Inclusive containment
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min.x && x <= self.max.x && y >= self.min.y && y <= self.max.y
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Closed ring of vertices; the closing vertex may or may not be repeated
pub type Ring = Vec<Point2<f64>>;

/// Polygon: first ring is the exterior, the rest are holes
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    rings: Vec<Ring>,
    bounds: Bounds,
}

impl Polygon {
    /// Build from rings, dropping rings with fewer than three vertices
    #[must_use]
    pub fn new(rings: Vec<Ring>) -> Self {
        let rings: Vec<Ring> = rings.into_iter().filter(|r| r.len() >= 3).collect();
        let bounds = Bounds::of_points(rings.iter().flatten()).unwrap_or_else(Bounds::empty);
        Self { rings, bounds }
    }

    #[must_use]
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    #[must_use]
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// Even-odd containment across all rings (holes flip parity)
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if !self.bounds.contains(x, y) {
            return false;
        }
        self.rings
            .iter()
            .fold(false, |inside, ring| inside ^ ring_crossings_odd(ring, x, y))
    }
}

/// Ray-cast toward +x and report whether the crossing count is odd
fn ring_crossings_odd(ring: &[Point2<f64>], x: f64, y: f64) -> bool {
    let mut inside = false;
    let n = ring.len();
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];
        if (a.y > y) != (b.y > y) {
            let x_cross = (b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Land area made of one or more polygons
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiPolygon {
    polygons: Vec<Polygon>,
}

impl MultiPolygon {
    #[must_use]
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self {
            polygons: polygons.into_iter().filter(|p| !p.is_empty()).collect(),
        }
    }

    #[must_use]
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// True if any polygon contains the point
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.polygons.iter().any(|p| p.contains(x, y))
    }

    /// Bounds of all polygons
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        let mut bounds = Bounds::empty();
        for p in &self.polygons {
            bounds.merge(p.bounds());
        }
        bounds.is_valid().then_some(bounds)
    }

    /// Every vertex of every ring
    pub fn vertices(&self) -> impl Iterator<Item = &Point2<f64>> {
        self.polygons.iter().flat_map(|p| p.rings.iter().flatten())
    }
}

/// Open polyline
pub type LineString = Vec<Point2<f64>>;

/// Set of polylines, used for internal subdivision borders
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiLineString {
    lines: Vec<LineString>,
}

impl MultiLineString {
    #[must_use]
    pub fn new(lines: Vec<LineString>) -> Self {
        Self {
            lines: lines.into_iter().filter(|l| l.len() >= 2).collect(),
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[LineString] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Immutable boundary data shared by containment and rendering
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryGeometry {
    /// Land silhouette used for containment
    pub land: MultiPolygon,
    /// Internal subdivision borders (state lines), if available
    pub borders: Option<MultiLineString>,
}

impl BoundaryGeometry {
    #[must_use]
    pub fn new(land: MultiPolygon, borders: Option<MultiLineString>) -> Self {
        Self { land, borders }
    }
}

/// Point-in-land test used by the forecast synthesizer
pub trait LandMask {
    /// True if `(lon, lat)` lies on land
    fn contains(&self, lon: f64, lat: f64) -> bool;
}

impl LandMask for MultiPolygon {
    fn contains(&self, lon: f64, lat: f64) -> bool {
        MultiPolygon::contains(self, lon, lat)
    }
}

impl LandMask for BoundaryGeometry {
    fn contains(&self, lon: f64, lat: f64) -> bool {
        self.land.contains(lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Ring {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn test_square_containment() {
        let poly = Polygon::new(vec![square(0.0, 0.0, 10.0, 10.0)]);
        assert!(poly.contains(5.0, 5.0));
        assert!(!poly.contains(15.0, 5.0));
        assert!(!poly.contains(5.0, -0.1));
    }

    #[test]
    fn test_hole_excluded() {
        let poly = Polygon::new(vec![square(0.0, 0.0, 10.0, 10.0), square(4.0, 4.0, 6.0, 6.0)]);
        assert!(poly.contains(2.0, 2.0));
        assert!(!poly.contains(5.0, 5.0));
    }

    #[test]
    fn test_concave_ring() {
        // U shape opening upward
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(9.0, 0.0),
            Point2::new(9.0, 9.0),
            Point2::new(6.0, 9.0),
            Point2::new(6.0, 3.0),
            Point2::new(3.0, 3.0),
            Point2::new(3.0, 9.0),
            Point2::new(0.0, 9.0),
        ];
        let poly = Polygon::new(vec![ring]);
        assert!(poly.contains(1.5, 6.0));
        assert!(poly.contains(7.5, 6.0));
        assert!(!poly.contains(4.5, 6.0));
        assert!(poly.contains(4.5, 1.5));
    }

    #[test]
    fn test_multipolygon_and_bounds() {
        let land = MultiPolygon::new(vec![
            Polygon::new(vec![square(0.0, 0.0, 1.0, 1.0)]),
            Polygon::new(vec![square(5.0, 5.0, 6.0, 7.0)]),
            Polygon::new(vec![vec![Point2::new(0.0, 0.0)]]),
        ]);
        assert_eq!(land.polygons().len(), 2);
        assert!(land.contains(5.5, 6.5));
        assert!(!land.contains(3.0, 3.0));
        let b = land.bounds().unwrap();
        assert_eq!(b.min, Point2::new(0.0, 0.0));
        assert_eq!(b.max, Point2::new(6.0, 7.0));
        assert_eq!(land.vertices().count(), 8);
    }

    #[test]
    fn test_empty_bounds() {
        assert!(Bounds::of_points(std::iter::empty::<&Point2<f64>>()).is_none());
        assert!(MultiPolygon::default().bounds().is_none());
    }

    #[test]
    fn test_degenerate_lines_dropped() {
        let lines = MultiLineString::new(vec![
            vec![Point2::new(0.0, 0.0)],
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)],
        ]);
        assert_eq!(lines.lines().len(), 1);
    }
}
