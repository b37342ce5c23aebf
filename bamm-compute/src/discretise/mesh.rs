//! One-dimensional meshes.
//!
//! Every region of the cell is meshed independently by a [`SubMesh1D`], a set of `n` nodes (the
//! points where node-valued quantities, such as concentrations, are stored) and `n + 1` edges
//! (the faces between nodes, where fluxes are stored, including both ends of the region). The
//! layout of the nodes between the edges depends on the scheme:
//!
//! - cell-centred meshes place each node in the middle of two consecutive edges,
//! - vertex-centred meshes place the first and last nodes on the boundary, and each interior edge
//!   halfway between two nodes.
//!
//! A [`Mesh`] holds the sub-mesh of each region, and joins the sub-meshes of adjacent regions
//! for expressions spanning several regions, such as the electrolyte concentration.

use bamm_error::Error;
use indexmap::IndexMap;
use nalgebra::DVector;
use std::{fmt, str::FromStr};
use super::error::{InvalidConfiguration, MissingMesh};
use crate::symbolic::Domain;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The coordinate system of a one-dimensional mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "lowercase"))]
pub enum CoordSys {
    /// Cartesian coordinates, for the electrodes, separator and current collector.
    #[default]
    Cartesian,

    /// Radial spherical coordinates, for electrode particles.
    Spherical,
}

impl fmt::Display for CoordSys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cartesian => write!(f, "cartesian"),
            Self::Spherical => write!(f, "spherical"),
        }
    }
}

impl FromStr for CoordSys {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cartesian" => Ok(Self::Cartesian),
            "spherical" | "spherical polar" => Ok(Self::Spherical),
            _ => Err(Error::bare(InvalidConfiguration {
                reason: format!("unknown coordinate system `{}`", s),
            })),
        }
    }
}

/// A one-dimensional mesh of a single region.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh1D {
    /// The `n + 1` edges of the mesh, in increasing order.
    pub edges: DVector<f64>,

    /// The `n` nodes of the mesh, in increasing order.
    pub nodes: DVector<f64>,

    /// The coordinate system of the mesh.
    pub coord_sys: CoordSys,
}

impl SubMesh1D {
    /// Creates a uniform cell-centred mesh of `[start, end]` with the given number of nodes.
    pub fn uniform(start: f64, end: f64, points: usize, coord_sys: CoordSys) -> Self {
        let edges = linspace(start, end, points + 1);
        let nodes = DVector::from_fn(points, |i, _| 0.5 * (edges[i] + edges[i + 1]));
        Self { edges, nodes, coord_sys }
    }

    /// Creates a uniform vertex-centred mesh of `[start, end]` with the given number of nodes.
    pub fn vertex_centred(start: f64, end: f64, points: usize, coord_sys: CoordSys) -> Self {
        let nodes = linspace(start, end, points);
        let edges = DVector::from_fn(points + 1, |i, _| match i {
            0 => start,
            i if i == points => end,
            i => 0.5 * (nodes[i - 1] + nodes[i]),
        });
        Self { edges, nodes, coord_sys }
    }

    /// The number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the mesh has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The distances between consecutive nodes.
    pub fn node_spacing(&self) -> DVector<f64> {
        DVector::from_fn(self.len().saturating_sub(1), |i, _| self.nodes[i + 1] - self.nodes[i])
    }

    /// The volume of the control volume around each node, between two consecutive edges.
    ///
    /// In spherical coordinates this is the volume of the spherical shell, including the `4π`
    /// factor.
    pub fn volumes(&self) -> DVector<f64> {
        DVector::from_fn(self.len(), |i, _| {
            let (a, b) = (self.edges[i], self.edges[i + 1]);
            match self.coord_sys {
                CoordSys::Cartesian => b - a,
                CoordSys::Spherical => 4.0 / 3.0 * std::f64::consts::PI * (b.powi(3) - a.powi(3)),
            }
        })
    }

    /// The area of each edge through which fluxes pass.
    pub fn edge_areas(&self) -> DVector<f64> {
        self.edges.map(|e| match self.coord_sys {
            CoordSys::Cartesian => 1.0,
            CoordSys::Spherical => 4.0 * std::f64::consts::PI * e * e,
        })
    }

    /// Returns true if the first and last nodes lie on the boundary of the mesh.
    pub fn is_vertex_centred(&self) -> bool {
        self.nodes[0] == self.edges[0]
    }
}

/// Returns `points` evenly spaced values from `start` to `end`, inclusive.
fn linspace(start: f64, end: f64, points: usize) -> DVector<f64> {
    let step = (end - start) / (points.max(2) - 1) as f64;
    DVector::from_fn(points, |i, _| if i + 1 == points { end } else { start + step * i as f64 })
}

/// The sub-meshes of every region of the cell.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    submeshes: IndexMap<String, SubMesh1D>,
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the sub-mesh of a region.
    pub fn insert(&mut self, region: impl Into<String>, submesh: SubMesh1D) {
        self.submeshes.insert(region.into(), submesh);
    }

    /// Returns the sub-mesh of a region.
    pub fn get(&self, region: &str) -> Option<&SubMesh1D> {
        self.submeshes.get(region)
    }

    /// Joins the sub-meshes of the regions of `domain` into a single sub-mesh.
    ///
    /// Consecutive regions must be adjacent: the last edge of each region is the first edge of
    /// the next one.
    pub fn combine(&self, domain: &Domain) -> Result<SubMesh1D, Error> {
        let mut submeshes = domain.names().iter().map(|region| {
            self.get(region).ok_or_else(|| Error::bare(MissingMesh { domain: region.clone() }))
        });

        let Some(first) = submeshes.next().transpose()? else {
            return Err(Error::bare(InvalidConfiguration {
                reason: "cannot mesh the empty domain".to_string(),
            }));
        };
        if domain.names().len() == 1 {
            return Ok(first.clone());
        }
        if first.is_vertex_centred() {
            return Err(Error::bare(InvalidConfiguration {
                reason: format!("vertex-centred meshes cannot be joined across {}", domain),
            }));
        }

        let mut edges = first.edges.iter().copied().collect::<Vec<_>>();
        let mut nodes = first.nodes.iter().copied().collect::<Vec<_>>();
        for (submesh, region) in submeshes.zip(domain.names().iter().skip(1)) {
            let submesh = submesh?;
            let last = edges.last().copied().unwrap_or(submesh.edges[0]);
            if (submesh.edges[0] - last).abs() > 1e-12 * last.abs().max(1.0)
                || submesh.coord_sys != first.coord_sys
            {
                return Err(Error::bare(InvalidConfiguration {
                    reason: format!("the `{}` region is not adjacent to the region before it", region),
                }));
            }
            edges.extend(submesh.edges.iter().skip(1));
            nodes.extend(submesh.nodes.iter());
        }

        Ok(SubMesh1D {
            edges: DVector::from_vec(edges),
            nodes: DVector::from_vec(nodes),
            coord_sys: first.coord_sys,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::{
        afe_abs,
        afe_relative_error_msg,
        afe_is_relative_eq,
        assert_float_relative_eq,
    };
    use super::*;

    #[test]
    fn uniform_cell_centred() {
        let mesh = SubMesh1D::uniform(0.0, 1.0, 4, CoordSys::Cartesian);
        assert_eq!(mesh.edges.len(), 5);
        assert_eq!(mesh.len(), 4);
        assert_float_relative_eq!(mesh.nodes[0], 0.125);
        assert_float_relative_eq!(mesh.nodes[3], 0.875);
        assert!(!mesh.is_vertex_centred());
    }

    #[test]
    fn vertex_centred() {
        let mesh = SubMesh1D::vertex_centred(0.0, 1.0, 5, CoordSys::Cartesian);
        assert_eq!(mesh.edges.len(), 6);
        assert_eq!(mesh.nodes[0], 0.0);
        assert_eq!(mesh.nodes[4], 1.0);
        assert_float_relative_eq!(mesh.edges[1], 0.125);
        assert_float_relative_eq!(mesh.volumes().sum(), 1.0);
    }

    #[test]
    fn spherical_volumes() {
        let mesh = SubMesh1D::uniform(0.0, 2.0, 10, CoordSys::Spherical);
        let sphere = 4.0 / 3.0 * std::f64::consts::PI * 8.0;
        assert_float_relative_eq!(mesh.volumes().sum(), sphere, 1e-12);
    }

    #[test]
    fn combine_adjacent_regions() {
        let mut mesh = Mesh::new();
        mesh.insert("negative electrode", SubMesh1D::uniform(0.0, 1.0, 3, CoordSys::Cartesian));
        mesh.insert("separator", SubMesh1D::uniform(1.0, 1.5, 2, CoordSys::Cartesian));
        let combined = mesh.combine(&Domain::from(["negative electrode", "separator"])).unwrap();
        assert_eq!(combined.len(), 5);
        assert_eq!(combined.edges.len(), 6);
        assert_float_relative_eq!(combined.edges[5], 1.5);
    }

    #[test]
    fn combine_missing_region() {
        let mesh = Mesh::new();
        let err = mesh.combine(&Domain::from("separator")).unwrap_err();
        assert_eq!(err.downcast_ref::<MissingMesh>().unwrap().domain, "separator");
    }

    #[test]
    fn combine_gap() {
        let mut mesh = Mesh::new();
        mesh.insert("negative electrode", SubMesh1D::uniform(0.0, 1.0, 3, CoordSys::Cartesian));
        mesh.insert("positive electrode", SubMesh1D::uniform(2.0, 3.0, 3, CoordSys::Cartesian));
        let err = mesh.combine(&Domain::from(["negative electrode", "positive electrode"])).unwrap_err();
        assert!(err.is::<InvalidConfiguration>());
    }
}
