//! Boundary/projection context shared by synthesis and rendering
//!
//! Replaces implicit global map state with one explicitly constructed value.
//! Initialization either yields a complete, immutable [`MapContext`] or a
//! [`BoundaryError`]; there is no partially initialized state. Callers that
//! failed to initialize hold `None` and every consumer treats `None` as
//! "boundary not loaded" (empty forecast, nothing drawn).

use super::geometry::{BoundaryGeometry, LandMask};
use super::projection::{AlbersUsa, ClipExtent, Projection};
use super::topology::Topology;
use super::BoundaryError;
use nalgebra::Point2;
use std::path::Path;
use tracing::{info, warn};

/// Default canvas width in pixels
pub const DEFAULT_CANVAS_WIDTH: u32 = 960;

/// Default canvas height in pixels
pub const DEFAULT_CANVAS_HEIGHT: u32 = 600;

/// Default margin between the fitted map and the canvas edge
pub const DEFAULT_MARGIN: f64 = 20.0;

/// Raster extent the projection is fitted to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenExtent {
    pub width: u32,
    pub height: u32,
    pub margin: f64,
}

impl ScreenExtent {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            margin: DEFAULT_MARGIN,
        }
    }

    #[must_use]
    pub const fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// `[[m, m], [w - m, h - m]]`
    #[must_use]
    pub fn fit_box(&self) -> ClipExtent {
        ClipExtent::new(
            self.margin,
            self.margin,
            f64::from(self.width) - self.margin,
            f64::from(self.height) - self.margin,
        )
    }
}

impl Default for ScreenExtent {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

/// Names of the topology objects holding land and subdivision borders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryLayers {
    pub land: String,
    pub borders: Option<String>,
}

impl Default for BoundaryLayers {
    fn default() -> Self {
        Self {
            land: "nation".to_string(),
            borders: Some("states".to_string()),
        }
    }
}

/// Immutable land boundary plus the projection fitted to it
#[derive(Debug, Clone)]
pub struct MapContext {
    geometry: BoundaryGeometry,
    projection: AlbersUsa,
    extent: ScreenExtent,
}

impl MapContext {
    /// Build the context from a decoded topology
    ///
    /// A missing border layer only disables border drawing; a missing or
    /// empty land layer is an error.
    ///
    /// # Errors
    /// `MissingObject`, `InvalidArc` from decoding, or `EmptyGeometry` if the
    /// land cannot be projected into the extent
    pub fn initialize(
        topology: &Topology,
        layers: &BoundaryLayers,
        extent: ScreenExtent,
    ) -> Result<Self, BoundaryError> {
        let land = topology.feature(&layers.land)?;
        let borders = match &layers.borders {
            Some(name) => match topology.interior_mesh(name) {
                Ok(mesh) => Some(mesh),
                Err(BoundaryError::MissingObject(missing)) => {
                    warn!("Border layer '{}' not found, drawing without borders", missing);
                    None
                }
                Err(e) => return Err(e),
            },
            None => None,
        };
        Self::from_geometry(BoundaryGeometry::new(land, borders), extent)
    }

    /// Parse a TopoJSON string and build the context
    ///
    /// # Errors
    /// See [`Topology::from_json`] and [`MapContext::initialize`]
    pub fn from_topojson(
        json: &str,
        layers: &BoundaryLayers,
        extent: ScreenExtent,
    ) -> Result<Self, BoundaryError> {
        Self::initialize(&Topology::from_json(json)?, layers, extent)
    }

    /// Read a TopoJSON file and build the context
    ///
    /// # Errors
    /// See [`Topology::load`] and [`MapContext::initialize`]
    pub fn load<P: AsRef<Path>>(
        path: P,
        layers: &BoundaryLayers,
        extent: ScreenExtent,
    ) -> Result<Self, BoundaryError> {
        Self::initialize(&Topology::load(path)?, layers, extent)
    }

    /// Fit the projection to already decoded geometry
    ///
    /// # Errors
    /// `EmptyGeometry` if the land has no polygons or no projectable extent
    pub fn from_geometry(
        geometry: BoundaryGeometry,
        extent: ScreenExtent,
    ) -> Result<Self, BoundaryError> {
        if geometry.land.is_empty() {
            return Err(BoundaryError::EmptyGeometry(
                "land layer has no polygons".to_string(),
            ));
        }
        let projection = AlbersUsa::fit_extent(&extent.fit_box(), geometry.land.vertices())
            .ok_or_else(|| {
                BoundaryError::EmptyGeometry("land does not project to a non-empty area".to_string())
            })?;

        info!(
            "Map context initialized: {} land polygons, {} border lines, scale {:.1}",
            geometry.land.polygons().len(),
            geometry.borders.as_ref().map_or(0, |b| b.lines().len()),
            projection.scale()
        );

        Ok(Self {
            geometry,
            projection,
            extent,
        })
    }

    /// Point-in-land test
    #[must_use]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.geometry.land.contains(lon, lat)
    }

    /// Screen position of a geographic point, `None` if clipped away
    #[must_use]
    pub fn project(&self, lon: f64, lat: f64) -> Option<Point2<f64>> {
        self.projection.project(lon, lat)
    }

    #[must_use]
    pub fn geometry(&self) -> &BoundaryGeometry {
        &self.geometry
    }

    #[must_use]
    pub fn projection(&self) -> &AlbersUsa {
        &self.projection
    }

    #[must_use]
    pub fn extent(&self) -> ScreenExtent {
        self.extent
    }
}

impl LandMask for MapContext {
    fn contains(&self, lon: f64, lat: f64) -> bool {
        MapContext::contains(self, lon, lat)
    }
}

/// Screen position through an optional context
///
/// `None` when the context was never initialized.
#[must_use]
pub fn project(context: Option<&MapContext>, lon: f64, lat: f64) -> Option<Point2<f64>> {
    context.and_then(|c| c.project(lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::geometry::{MultiPolygon, Polygon};

    const SQUARE_STATE: &str = r#"{
        "type": "Topology",
        "arcs": [[[-110, 30], [-90, 30], [-90, 45], [-110, 45], [-110, 30]]],
        "objects": {
            "nation": { "type": "GeometryCollection",
                        "geometries": [{ "type": "Polygon", "arcs": [[0]] }] }
        }
    }"#;

    #[test]
    fn test_initialize_without_border_layer() {
        let ctx =
            MapContext::from_topojson(SQUARE_STATE, &BoundaryLayers::default(), ScreenExtent::default())
                .unwrap();
        assert!(ctx.geometry().borders.is_none());
        assert!(ctx.contains(-100.0, 40.0));
        assert!(!ctx.contains(-120.0, 40.0));
    }

    #[test]
    fn test_projection_fits_inside_margin() {
        let extent = ScreenExtent::new(800, 500);
        let ctx = MapContext::from_topojson(SQUARE_STATE, &BoundaryLayers::default(), extent).unwrap();
        for (lon, lat) in [(-110.0, 30.0), (-90.0, 45.0), (-100.0, 37.5)] {
            let p = ctx.project(lon, lat).unwrap();
            assert!(p.x >= 20.0 - 1e-6 && p.x <= 780.0 + 1e-6, "x {}", p.x);
            assert!(p.y >= 20.0 - 1e-6 && p.y <= 480.0 + 1e-6, "y {}", p.y);
        }
    }

    #[test]
    fn test_missing_land_layer_fails() {
        let layers = BoundaryLayers {
            land: "land".to_string(),
            borders: None,
        };
        let err = MapContext::from_topojson(SQUARE_STATE, &layers, ScreenExtent::default()).unwrap_err();
        assert_eq!(err, BoundaryError::MissingObject("land".to_string()));
    }

    #[test]
    fn test_empty_land_fails() {
        let geometry = BoundaryGeometry::new(MultiPolygon::new(vec![Polygon::new(vec![])]), None);
        assert!(matches!(
            MapContext::from_geometry(geometry, ScreenExtent::default()),
            Err(BoundaryError::EmptyGeometry(_))
        ));
    }

    #[test]
    fn test_project_without_context() {
        assert!(project(None, -100.0, 40.0).is_none());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            BoundaryError::MissingObject("states".to_string()).to_string(),
            "Boundary topology has no object named 'states'"
        );
        assert_eq!(
            BoundaryError::InvalidArc(-3).to_string(),
            "Boundary topology references missing arc -3"
        );
    }
}
