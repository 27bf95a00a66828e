//! Geographic-to-screen projections
//!
//! Implements the conic equal-area (Albers) projection and the "Albers USA"
//! composite, which draws the lower 48 states with a standard Albers
//! projection and places Alaska and Hawaii in insets below it. Screen
//! coordinates grow rightward (x) and downward (y).
//!
//! A projection is fitted once to a geometry and a target extent with
//! [`AlbersUsa::fit_extent`] and is immutable afterwards.

use super::geometry::Bounds;
use nalgebra::Point2;

/// Scale the extent fit measures bounds at
const FIT_REFERENCE_SCALE: f64 = 150.0;

/// Inset boxes are shrunk by this much to avoid shared edges
const CLIP_EPSILON: f64 = 1e-6;

/// Anything that maps `(lon, lat)` degrees to screen pixels
pub trait Projection {
    /// Screen position, `None` if the point is clipped away
    fn project(&self, lon: f64, lat: f64) -> Option<Point2<f64>>;
}

/// Screen-space rectangle a projection clips points to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipExtent {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl ClipExtent {
    #[must_use]
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            min: Point2::new(x0, y0),
            max: Point2::new(x1, y1),
        }
    }

    #[must_use]
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Conic equal-area projection with a longitude rotation and a centre point
#[derive(Debug, Clone, PartialEq)]
pub struct ConicEqualArea {
    n: f64,
    c: f64,
    r0: f64,
    /// Longitude rotation in radians
    rotate: f64,
    /// Raw (unscaled) projection of the centre point
    center_raw: (f64, f64),
    scale: f64,
    translate: Point2<f64>,
    clip: Option<ClipExtent>,
}

impl ConicEqualArea {
    /// Projection with standard parallels, longitude rotation and centre, in degrees
    ///
    /// The centre is given in rotated coordinates and maps onto `translate`.
    #[must_use]
    pub fn new(parallels: (f64, f64), rotate_deg: f64, center_deg: (f64, f64)) -> Self {
        let phi0 = parallels.0.to_radians();
        let phi1 = parallels.1.to_radians();
        let sy0 = phi0.sin();
        let n = (sy0 + phi1.sin()) / 2.0;
        let c = 1.0 + sy0 * (2.0 * n - sy0);
        let r0 = c.sqrt() / n;

        let mut projection = Self {
            n,
            c,
            r0,
            rotate: rotate_deg.to_radians(),
            center_raw: (0.0, 0.0),
            scale: 150.0,
            translate: Point2::new(480.0, 250.0),
            clip: None,
        };
        projection.center_raw = projection.raw(center_deg.0.to_radians(), center_deg.1.to_radians());
        projection
    }

    /// Standard Albers for the lower 48: parallels 29.5°/45.5°, centred on 96.6°W 38.7°N
    #[must_use]
    pub fn albers() -> Self {
        Self::new((29.5, 45.5), 96.0, (-0.6, 38.7)).with_scale(1070.0)
    }

    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub fn with_translate(mut self, translate: Point2<f64>) -> Self {
        self.translate = translate;
        self
    }

    #[must_use]
    pub fn with_clip(mut self, clip: Option<ClipExtent>) -> Self {
        self.clip = clip;
        self
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn translate(&self) -> Point2<f64> {
        self.translate
    }

    /// Unit-sphere projection of rotated coordinates in radians
    fn raw(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let r = (self.c - 2.0 * self.n * phi.sin()).sqrt() / self.n;
        let a = lambda * self.n;
        (r * a.sin(), self.r0 - r * a.cos())
    }

    /// Project without clipping
    #[must_use]
    pub fn project_unclipped(&self, lon: f64, lat: f64) -> Option<Point2<f64>> {
        let mut lambda = lon.to_radians() + self.rotate;
        if lambda > std::f64::consts::PI {
            lambda -= std::f64::consts::TAU;
        } else if lambda < -std::f64::consts::PI {
            lambda += std::f64::consts::TAU;
        }
        let (x, y) = self.raw(lambda, lat.to_radians());
        let p = Point2::new(
            self.translate.x + self.scale * (x - self.center_raw.0),
            self.translate.y - self.scale * (y - self.center_raw.1),
        );
        (p.x.is_finite() && p.y.is_finite()).then_some(p)
    }
}

impl Projection for ConicEqualArea {
    fn project(&self, lon: f64, lat: f64) -> Option<Point2<f64>> {
        let p = self.project_unclipped(lon, lat)?;
        match &self.clip {
            Some(clip) if !clip.contains(&p) => None,
            _ => Some(p),
        }
    }
}

/// Composite projection: lower 48 plus Alaska and Hawaii insets
///
/// A point is tried against the lower-48, Alaska and Hawaii projections in
/// that order; the first one whose clip box contains the projected point wins.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbersUsa {
    scale: f64,
    translate: Point2<f64>,
    lower48: ConicEqualArea,
    alaska: ConicEqualArea,
    hawaii: ConicEqualArea,
}

impl Default for AlbersUsa {
    fn default() -> Self {
        Self::new(1070.0, Point2::new(480.0, 250.0))
    }
}

impl AlbersUsa {
    /// Composite at scale `k` centred on `translate`
    #[must_use]
    pub fn new(k: f64, translate: Point2<f64>) -> Self {
        let (x, y) = (translate.x, translate.y);
        let e = CLIP_EPSILON;

        let lower48 = ConicEqualArea::albers()
            .with_scale(k)
            .with_translate(translate)
            .with_clip(Some(ClipExtent::new(
                x - 0.455 * k,
                y - 0.238 * k,
                x + 0.455 * k,
                y + 0.238 * k,
            )));

        let alaska = ConicEqualArea::new((55.0, 65.0), 154.0, (-2.0, 58.5))
            .with_scale(k * 0.35)
            .with_translate(Point2::new(x - 0.307 * k, y + 0.201 * k))
            .with_clip(Some(ClipExtent::new(
                x - 0.425 * k + e,
                y + 0.120 * k + e,
                x - 0.214 * k - e,
                y + 0.234 * k - e,
            )));

        let hawaii = ConicEqualArea::new((8.0, 18.0), 157.0, (-3.0, 19.9))
            .with_scale(k)
            .with_translate(Point2::new(x - 0.205 * k, y + 0.212 * k))
            .with_clip(Some(ClipExtent::new(
                x - 0.214 * k + e,
                y + 0.166 * k + e,
                x - 0.115 * k - e,
                y + 0.234 * k - e,
            )));

        Self {
            scale: k,
            translate,
            lower48,
            alaska,
            hawaii,
        }
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn translate(&self) -> Point2<f64> {
        self.translate
    }

    /// Fit scale and translation so `vertices` fill `extent`, centred
    ///
    /// Bounds are measured at a reference scale with zero translation, then
    /// scaled so the tighter dimension exactly fits. Returns `None` when no
    /// vertex projects or the projected bounds are degenerate.
    pub fn fit_extent<'a, I>(extent: &ClipExtent, vertices: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point2<f64>>,
    {
        let reference = Self::new(FIT_REFERENCE_SCALE, Point2::origin());
        let projected: Vec<Point2<f64>> = vertices
            .into_iter()
            .filter_map(|v| reference.project(v.x, v.y))
            .collect();
        let b = Bounds::of_points(projected.iter())?;
        if b.width() <= 0.0 || b.height() <= 0.0 {
            return None;
        }

        let w = extent.max.x - extent.min.x;
        let h = extent.max.y - extent.min.y;
        let k = (w / b.width()).min(h / b.height());
        let x = extent.min.x + (w - k * (b.max.x + b.min.x)) / 2.0;
        let y = extent.min.y + (h - k * (b.max.y + b.min.y)) / 2.0;
        Some(Self::new(FIT_REFERENCE_SCALE * k, Point2::new(x, y)))
    }
}

impl Projection for AlbersUsa {
    fn project(&self, lon: f64, lat: f64) -> Option<Point2<f64>> {
        self.lower48
            .project(lon, lat)
            .or_else(|| self.alaska.project(lon, lat))
            .or_else(|| self.hawaii.project(lon, lat))
    }
}
