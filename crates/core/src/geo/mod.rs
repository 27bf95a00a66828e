//! Boundary geometry, topology decoding and map projection
//!
//! The [`MapContext`] built here is the only shared state of a session: it is
//! constructed once by [`MapContext::initialize`] and read by every forecast
//! run and every render afterwards.

pub mod context;
pub mod geometry;
pub mod projection;
pub mod topology;

pub use context::{BoundaryLayers, MapContext, ScreenExtent};
pub use geometry::{
    BoundaryGeometry, Bounds, LandMask, LineString, MultiLineString, MultiPolygon, Polygon, Ring,
};
pub use projection::{AlbersUsa, ClipExtent, ConicEqualArea, Projection};
pub use topology::{GeometryObject, Topology, Transform};

/// Errors that can occur while loading boundary data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryError {
    /// Failed to read the boundary source
    LoadFailed(String),
    /// Failed to parse the boundary document
    ParseFailed(String),
    /// A required object is missing from the topology
    MissingObject(String),
    /// An arc reference points outside the arc table
    InvalidArc(i64),
    /// The land geometry has no usable polygons or cannot be projected
    EmptyGeometry(String),
}

impl std::fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryError::LoadFailed(msg) => write!(f, "Failed to load boundary data: {msg}"),
            BoundaryError::ParseFailed(msg) => write!(f, "Failed to parse boundary data: {msg}"),
            BoundaryError::MissingObject(name) => {
                write!(f, "Boundary topology has no object named '{name}'")
            }
            BoundaryError::InvalidArc(index) => {
                write!(f, "Boundary topology references missing arc {index}")
            }
            BoundaryError::EmptyGeometry(msg) => write!(f, "Boundary geometry is unusable: {msg}"),
        }
    }
}

impl std::error::Error for BoundaryError {}
