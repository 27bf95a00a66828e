//! TopoJSON boundary decoding
//!
//! Decodes the subset of the TopoJSON format needed for boundary data:
//! shared arcs (optionally quantized and delta-encoded), polygon and
//! multipolygon objects grouped in geometry collections, and line meshes
//! built from arcs shared between geometries.
//!
//! # Example
//!
//! ```
//! use precip_forecast_core::geo::Topology;
//!
//! let json = r#"{
//!   "type": "Topology",
//!   "arcs": [[[0, 0], [4, 0], [4, 4], [0, 4], [0, 0]]],
//!   "objects": {
//!     "nation": { "type": "GeometryCollection",
//!                 "geometries": [{ "type": "Polygon", "arcs": [[0]] }] }
//!   }
//! }"#;
//! let topology = Topology::from_json(json).unwrap();
//! let land = topology.feature("nation").unwrap();
//! assert!(land.contains(2.0, 2.0));
//! ```

use super::geometry::{LineString, MultiLineString, MultiPolygon, Polygon, Ring};
use super::BoundaryError;
use nalgebra::Point2;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Quantization transform of a TopoJSON document
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

/// Geometry object as stored in the document (arc references, not coordinates)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum GeometryObject {
    GeometryCollection { geometries: Vec<GeometryObject> },
    Polygon { arcs: Vec<Vec<i64>> },
    MultiPolygon { arcs: Vec<Vec<Vec<i64>>> },
    LineString { arcs: Vec<i64> },
    MultiLineString { arcs: Vec<Vec<i64>> },
    /// Points and null geometries carry no boundary information
    #[serde(other)]
    Unsupported,
}

impl GeometryObject {
    /// Flatten nested collections into their leaf geometries
    fn leaves<'a>(&'a self, out: &mut Vec<&'a GeometryObject>) {
        match self {
            Self::GeometryCollection { geometries } => {
                for g in geometries {
                    g.leaves(out);
                }
            }
            other => out.push(other),
        }
    }

    /// Every arc reference of a leaf geometry
    fn arc_refs(&self) -> Vec<i64> {
        match self {
            Self::Polygon { arcs } | Self::MultiLineString { arcs } => {
                arcs.iter().flatten().copied().collect()
            }
            Self::MultiPolygon { arcs } => arcs.iter().flatten().flatten().copied().collect(),
            Self::LineString { arcs } => arcs.clone(),
            Self::GeometryCollection { .. } | Self::Unsupported => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TopologyDocument {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    transform: Option<Transform>,
    arcs: Vec<Vec<Vec<f64>>>,
    objects: HashMap<String, GeometryObject>,
}

/// Decoded topology: absolute arc coordinates plus named objects
#[derive(Debug, Clone)]
pub struct Topology {
    arcs: Vec<Vec<Point2<f64>>>,
    objects: HashMap<String, GeometryObject>,
}

impl Topology {
    /// Parse a TopoJSON document
    ///
    /// # Errors
    /// Returns `ParseFailed` if the JSON is malformed, is not a `Topology`,
    /// or contains positions with fewer than two coordinates
    pub fn from_json(json: &str) -> Result<Self, BoundaryError> {
        let doc: TopologyDocument =
            serde_json::from_str(json).map_err(|e| BoundaryError::ParseFailed(e.to_string()))?;

        if doc.kind != "Topology" {
            return Err(BoundaryError::ParseFailed(format!(
                "expected type \"Topology\", got \"{}\"",
                doc.kind
            )));
        }

        let arcs = doc
            .arcs
            .iter()
            .map(|arc| decode_arc(arc, doc.transform.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Decoded topology: {} arcs, {} objects, quantized={}",
            arcs.len(),
            doc.objects.len(),
            doc.transform.is_some()
        );

        Ok(Self {
            arcs,
            objects: doc.objects,
        })
    }

    /// Read and parse a TopoJSON file
    ///
    /// # Errors
    /// Returns `LoadFailed` if the file cannot be read, otherwise see [`Topology::from_json`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BoundaryError> {
        let contents =
            fs::read_to_string(path).map_err(|e| BoundaryError::LoadFailed(e.to_string()))?;
        Self::from_json(&contents)
    }

    /// Number of decoded arcs
    #[must_use]
    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Names of the top-level objects
    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    fn object(&self, name: &str) -> Result<&GeometryObject, BoundaryError> {
        self.objects
            .get(name)
            .ok_or_else(|| BoundaryError::MissingObject(name.to_string()))
    }

    /// Resolve an arc reference; negative indices (`!i`) are reversed arcs
    fn arc(&self, index: i64) -> Result<Vec<Point2<f64>>, BoundaryError> {
        let (slot, reversed) = if index < 0 { (!index, true) } else { (index, false) };
        let arc = usize::try_from(slot)
            .ok()
            .and_then(|i| self.arcs.get(i))
            .ok_or(BoundaryError::InvalidArc(index))?;
        let mut points = arc.clone();
        if reversed {
            points.reverse();
        }
        Ok(points)
    }

    /// Concatenate arcs, dropping the duplicated joint vertex between them
    fn stitch(&self, refs: &[i64]) -> Result<Vec<Point2<f64>>, BoundaryError> {
        let mut points: Vec<Point2<f64>> = Vec::new();
        for &r in refs {
            let arc = self.arc(r)?;
            if !points.is_empty() {
                points.pop();
            }
            points.extend(arc);
        }
        Ok(points)
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Result<Polygon, BoundaryError> {
        let rings = rings
            .iter()
            .map(|r| self.stitch(r))
            .collect::<Result<Vec<Ring>, _>>()?;
        Ok(Polygon::new(rings))
    }

    /// Polygons of a named object (lines and points are ignored)
    ///
    /// # Errors
    /// `MissingObject` if no such object exists, `InvalidArc` for a dangling arc reference
    pub fn feature(&self, name: &str) -> Result<MultiPolygon, BoundaryError> {
        let mut leaves = Vec::new();
        self.object(name)?.leaves(&mut leaves);

        let mut polygons = Vec::new();
        for leaf in leaves {
            match leaf {
                GeometryObject::Polygon { arcs } => polygons.push(self.polygon(arcs)?),
                GeometryObject::MultiPolygon { arcs } => {
                    for rings in arcs {
                        polygons.push(self.polygon(rings)?);
                    }
                }
                _ => {}
            }
        }
        Ok(MultiPolygon::new(polygons))
    }

    /// Arcs of a named object kept by `filter(first_owner, last_owner)`
    ///
    /// Owners are indices of the object's leaf geometries in document order.
    /// An arc used by a single geometry is passed as `(a, a)`, so
    /// `|a, b| a != b` keeps only borders shared by two geometries.
    ///
    /// # Errors
    /// `MissingObject` if no such object exists, `InvalidArc` for a dangling arc reference
    pub fn mesh<F>(&self, name: &str, filter: F) -> Result<MultiLineString, BoundaryError>
    where
        F: Fn(usize, usize) -> bool,
    {
        let mut leaves = Vec::new();
        self.object(name)?.leaves(&mut leaves);

        let mut owners: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
        for (geom, leaf) in leaves.iter().enumerate() {
            for r in leaf.arc_refs() {
                let slot = if r < 0 { !r } else { r };
                let slot = usize::try_from(slot).map_err(|_| BoundaryError::InvalidArc(r))?;
                if slot >= self.arcs.len() {
                    return Err(BoundaryError::InvalidArc(r));
                }
                let list = owners.entry(slot).or_default();
                if list.last() != Some(&geom) {
                    list.push(geom);
                }
            }
        }

        let mut slots: Vec<usize> = owners
            .iter()
            .filter(|(_, geoms)| match (geoms.first(), geoms.last()) {
                (Some(&a), Some(&b)) => filter(a, b),
                _ => false,
            })
            .map(|(&slot, _)| slot)
            .collect();
        slots.sort_unstable();

        let lines: Vec<LineString> = slots.into_iter().map(|s| self.arcs[s].clone()).collect();
        debug!("Mesh '{}': {} of {} arcs kept", name, lines.len(), owners.len());
        Ok(MultiLineString::new(lines))
    }

    /// Borders shared by two distinct geometries of `name`
    ///
    /// # Errors
    /// See [`Topology::mesh`]
    pub fn interior_mesh(&self, name: &str) -> Result<MultiLineString, BoundaryError> {
        self.mesh(name, |a, b| a != b)
    }
}

/// Convert one stored arc to absolute coordinates
fn decode_arc(
    arc: &[Vec<f64>],
    transform: Option<&Transform>,
) -> Result<Vec<Point2<f64>>, BoundaryError> {
    let mut x = 0.0;
    let mut y = 0.0;
    arc.iter()
        .map(|position| {
            let (px, py) = match position.as_slice() {
                [px, py, ..] => (*px, *py),
                _ => {
                    return Err(BoundaryError::ParseFailed(format!(
                        "arc position has {} coordinates, need at least 2",
                        position.len()
                    )))
                }
            };
            Ok(match transform {
                Some(t) => {
                    x += px;
                    y += py;
                    Point2::new(x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1])
                }
                None => Point2::new(px, py),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Two unit squares side by side sharing the edge x = 1
    const TWO_SQUARES: &str = r#"{
        "type": "Topology",
        "arcs": [
            [[1, 0], [1, 1]],
            [[1, 1], [0, 1], [0, 0], [1, 0]],
            [[1, 0], [2, 0], [2, 1], [1, 1]]
        ],
        "objects": {
            "nation": { "type": "GeometryCollection", "geometries": [
                { "type": "Polygon", "arcs": [[1, 2]] }
            ]},
            "states": { "type": "GeometryCollection", "geometries": [
                { "type": "Polygon", "id": "W", "arcs": [[0, 1]] },
                { "type": "Polygon", "id": "E", "arcs": [[2, -1]] },
                { "type": "Point", "coordinates": [5, 5] }
            ]}
        }
    }"#;

    #[test]
    fn test_feature_stitches_arcs() {
        let topo = Topology::from_json(TWO_SQUARES).unwrap();
        let nation = topo.feature("nation").unwrap();
        assert_eq!(nation.polygons().len(), 1);
        let ring = &nation.polygons()[0].rings()[0];
        // 4 + 4 points minus one shared joint
        assert_eq!(ring.len(), 7);
        assert!(nation.contains(0.5, 0.5));
        assert!(nation.contains(1.5, 0.5));
        assert!(!nation.contains(2.5, 0.5));
    }

    #[test]
    fn test_reversed_arc_reference() {
        let topo = Topology::from_json(TWO_SQUARES).unwrap();
        let states = topo.feature("states").unwrap();
        assert_eq!(states.polygons().len(), 2);
        let east = &states.polygons()[1];
        assert!(east.contains(1.5, 0.5));
        assert!(!east.contains(0.5, 0.5));
        let ring = &east.rings()[0];
        assert_eq!(ring.last(), Some(&Point2::new(1.0, 0.0)));
    }

    #[test]
    fn test_interior_mesh_keeps_shared_arc_only() {
        let topo = Topology::from_json(TWO_SQUARES).unwrap();
        let borders = topo.interior_mesh("states").unwrap();
        assert_eq!(borders.lines().len(), 1);
        assert_eq!(
            borders.lines()[0],
            vec![Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)]
        );

        let all = topo.mesh("states", |_, _| true).unwrap();
        assert_eq!(all.lines().len(), 3);
    }

    #[test]
    fn test_quantized_arcs_are_delta_decoded() {
        let json = r#"{
            "type": "Topology",
            "transform": { "scale": [0.5, 0.25], "translate": [-100, 30] },
            "arcs": [[[0, 0], [4, 0], [0, 8], [-4, 0], [0, -8]]],
            "objects": { "land": { "type": "Polygon", "arcs": [[0]] } }
        }"#;
        let topo = Topology::from_json(json).unwrap();
        let land = topo.feature("land").unwrap();
        let ring = &land.polygons()[0].rings()[0];
        assert_relative_eq!(ring[1].x, -98.0);
        assert_relative_eq!(ring[2].y, 32.0);
        assert_eq!(ring[4], ring[0]);
        assert!(land.contains(-99.0, 31.0));
    }

    #[test]
    fn test_multipolygon_object() {
        let json = r#"{
            "type": "Topology",
            "arcs": [
                [[0, 0], [1, 0], [1, 1], [0, 0]],
                [[5, 5], [6, 5], [6, 6], [5, 5]]
            ],
            "objects": { "islands": { "type": "MultiPolygon", "arcs": [[[0]], [[1]]] } }
        }"#;
        let topo = Topology::from_json(json).unwrap();
        assert_eq!(topo.feature("islands").unwrap().polygons().len(), 2);
    }

    #[test]
    fn test_missing_object() {
        let topo = Topology::from_json(TWO_SQUARES).unwrap();
        assert!(matches!(
            topo.feature("counties"),
            Err(BoundaryError::MissingObject(name)) if name == "counties"
        ));
    }

    #[test]
    fn test_dangling_arc_reference() {
        let json = r#"{
            "type": "Topology",
            "arcs": [[[0, 0], [1, 0], [1, 1], [0, 0]]],
            "objects": { "bad": { "type": "Polygon", "arcs": [[0, 7]] } }
        }"#;
        let topo = Topology::from_json(json).unwrap();
        assert!(matches!(topo.feature("bad"), Err(BoundaryError::InvalidArc(7))));
        assert!(matches!(topo.mesh("bad", |_, _| true), Err(BoundaryError::InvalidArc(7))));
    }

    #[test]
    fn test_rejects_non_topology() {
        let json = r#"{ "type": "FeatureCollection", "arcs": [], "objects": {} }"#;
        assert!(matches!(
            Topology::from_json(json),
            Err(BoundaryError::ParseFailed(_))
        ));
        assert!(matches!(
            Topology::from_json("not json"),
            Err(BoundaryError::ParseFailed(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Topology::load("/nonexistent/boundary.topojson"),
            Err(BoundaryError::LoadFailed(_))
        ));
    }
}
