//! Spatial discretisation schemes.
//!
//! A scheme turns the continuous spatial operators of a domain into sparse matrices acting on
//! the node values of the domain's mesh. Every scheme builds matrices of the same shapes for a
//! mesh with `n` nodes, so the discretiser does not need to know which scheme it is using:
//!
//! | operator                 | shape         | maps                                  |
//! | ------------------------ | ------------- | ------------------------------------- |
//! | gradient (interior)      | `n-1 x n`     | node values to interior edge values   |
//! | gradient (with BCs)      | `n+1 x n`     | node values to all edge values        |
//! | divergence               | `n x n+1`     | edge fluxes to node values            |
//! | mass                     | `n x n`       | node values to node values            |
//! | node to edge             | `n+1 x n`     | node values to edge values            |
//! | boundary value           | `1 x n`       | node values to a boundary value       |
//! | integral                 | `1 x n`       | node values to their integral         |
//!
//! Boundary conditions are folded into the edge rows of the gradient: each scheme decides how a
//! Dirichlet condition determines the flux through a boundary edge. Neumann conditions prescribe
//! the flux directly in every scheme, and a missing condition leaves the boundary insulated.

mod control_volume;
mod finite_element;
mod finite_volume;

pub use control_volume::ControlVolume;
pub use finite_element::FiniteElement;
pub use finite_volume::FiniteVolume;

use bamm_error::Error;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::{fmt, str::FromStr, sync::Arc};
use crate::symbolic::Side;
use super::{bc::BcKind, error::InvalidConfiguration, mesh::{CoordSys, SubMesh1D}};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The recognised spatial schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SchemeKind {
    /// Cell-centred finite volumes.
    #[cfg_attr(feature = "serde", serde(rename = "finite-volume-1D"))]
    FiniteVolume,

    /// Vertex-centred control volumes.
    #[cfg_attr(feature = "serde", serde(rename = "control-volume"))]
    ControlVolume,

    /// One-dimensional linear finite elements along the current-collector coordinate.
    #[cfg_attr(feature = "serde", serde(rename = "finite-element-2D1D"))]
    FiniteElement,
}

impl SchemeKind {
    /// The identifier of the scheme in configurations.
    pub fn id(&self) -> &'static str {
        match self {
            Self::FiniteVolume => "finite-volume-1D",
            Self::ControlVolume => "control-volume",
            Self::FiniteElement => "finite-element-2D1D",
        }
    }

    /// Returns the implementation of the scheme.
    pub fn method(&self) -> Arc<dyn SpatialMethod> {
        match self {
            Self::FiniteVolume => Arc::new(FiniteVolume),
            Self::ControlVolume => Arc::new(ControlVolume),
            Self::FiniteElement => Arc::new(FiniteElement),
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for SchemeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::FiniteVolume, Self::ControlVolume, Self::FiniteElement]
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| Error::bare(InvalidConfiguration {
                reason: format!(
                    "unknown scheme `{}`, expected one of `finite-volume-1D`, `control-volume`, `finite-element-2D1D`",
                    s,
                ),
            }))
    }
}

/// How the flux through a boundary edge depends on the node values and the value of the
/// boundary condition: `flux = sum(coefficient * c[node]) + load * value`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFlux {
    /// The coefficients of the node values, as `(node, coefficient)` pairs.
    pub coefficients: Vec<(usize, f64)>,

    /// The coefficient of the boundary condition's value.
    pub load: f64,
}

impl BoundaryFlux {
    /// The flux is prescribed by the value of the boundary condition.
    pub fn prescribed() -> Self {
        Self { coefficients: Vec::new(), load: 1.0 }
    }

    /// No flux passes through the boundary.
    pub fn insulated() -> Self {
        Self { coefficients: Vec::new(), load: 0.0 }
    }
}

/// The gradient of a domain including its boundary edges.
#[derive(Debug, Clone)]
pub struct GradientOperator {
    /// The `n+1 x n` matrix acting on the node values.
    pub matrix: CsrMatrix<f64>,

    /// The `n+1` column multiplying the value of the left boundary condition, if any.
    pub left_load: Option<DVector<f64>>,

    /// The `n+1` column multiplying the value of the right boundary condition, if any.
    pub right_load: Option<DVector<f64>>,
}

/// A spatial discretisation scheme.
///
/// Only [`SpatialMethod::kind`], [`SpatialMethod::build_submesh`] and
/// [`SpatialMethod::dirichlet_flux`] are required; the other matrices have conservative defaults
/// built from the edges and nodes of the mesh, which schemes override where they differ.
pub trait SpatialMethod: fmt::Debug + Send + Sync {
    /// The kind of the scheme.
    fn kind(&self) -> SchemeKind;

    /// Returns true if the scheme can discretise domains in the given coordinate system.
    fn supports(&self, _coord_sys: CoordSys) -> bool {
        true
    }

    /// Builds the mesh of a region with the given number of nodes.
    fn build_submesh(&self, start: f64, end: f64, points: usize, coord_sys: CoordSys) -> SubMesh1D;

    /// How a Dirichlet condition determines the flux through the boundary edge on the given side.
    fn dirichlet_flux(&self, mesh: &SubMesh1D, side: Side) -> BoundaryFlux;

    /// The `n-1 x n` gradient at the interior edges.
    fn gradient_matrix(&self, mesh: &SubMesh1D) -> CsrMatrix<f64> {
        let n = mesh.len();
        let dx = mesh.node_spacing();
        let mut coo = CooMatrix::new(n - 1, n);
        for i in 0..n - 1 {
            coo.push(i, i, -1.0 / dx[i]);
            coo.push(i, i + 1, 1.0 / dx[i]);
        }
        CsrMatrix::from(&coo)
    }

    /// The `n x n+1` conservative divergence of edge fluxes, per unit control volume.
    fn divergence_matrix(&self, mesh: &SubMesh1D) -> CsrMatrix<f64> {
        let n = mesh.len();
        let areas = mesh.edge_areas();
        let volumes = mesh.volumes();
        let mut coo = CooMatrix::new(n, n + 1);
        for i in 0..n {
            coo.push(i, i, -areas[i] / volumes[i]);
            coo.push(i, i + 1, areas[i + 1] / volumes[i]);
        }
        CsrMatrix::from(&coo)
    }

    /// The `n x n` mass matrix of the time derivative.
    fn mass_matrix(&self, mesh: &SubMesh1D) -> CsrMatrix<f64> {
        CsrMatrix::identity(mesh.len())
    }

    /// The `n+1 x n` interpolation of node values to edges: the mean of the neighbouring nodes
    /// inside the domain, and linear extrapolation at the boundary edges.
    fn node_to_edge_matrix(&self, mesh: &SubMesh1D) -> CsrMatrix<f64> {
        let n = mesh.len();
        let mut coo = CooMatrix::new(n + 1, n);
        for (row, (col, weight)) in extrapolation(mesh, Side::Left) {
            coo.push(row, col, weight);
        }
        for i in 1..n {
            coo.push(i, i - 1, 0.5);
            coo.push(i, i, 0.5);
        }
        for (row, (col, weight)) in extrapolation(mesh, Side::Right) {
            coo.push(row, col, weight);
        }
        CsrMatrix::from(&coo)
    }

    /// The `1 x n` value at the boundary on the given side, extrapolated from the nodes.
    fn boundary_value_matrix(&self, mesh: &SubMesh1D, side: Side) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(1, mesh.len());
        for (_, (col, weight)) in extrapolation(mesh, side) {
            coo.push(0, col, weight);
        }
        CsrMatrix::from(&coo)
    }

    /// The `1 x n` integral of node values over the domain.
    fn integral_matrix(&self, mesh: &SubMesh1D) -> CsrMatrix<f64> {
        let volumes = mesh.volumes();
        let mut coo = CooMatrix::new(1, mesh.len());
        for (i, volume) in volumes.iter().enumerate() {
            coo.push(0, i, *volume);
        }
        CsrMatrix::from(&coo)
    }

    /// The `n+1 x n` gradient at every edge, with the given boundary conditions folded into the
    /// boundary edge rows.
    fn gradient(
        &self,
        mesh: &SubMesh1D,
        left: Option<BcKind>,
        right: Option<BcKind>,
    ) -> GradientOperator {
        let n = mesh.len();
        let interior = self.gradient_matrix(mesh);
        let flux = |side, kind| match kind {
            Some(BcKind::Dirichlet) => self.dirichlet_flux(mesh, side),
            Some(BcKind::Neumann) => BoundaryFlux::prescribed(),
            None => BoundaryFlux::insulated(),
        };
        let left_flux = flux(Side::Left, left);
        let right_flux = flux(Side::Right, right);

        let mut coo = CooMatrix::new(n + 1, n);
        for &(col, coefficient) in &left_flux.coefficients {
            coo.push(0, col, coefficient);
        }
        for (row, col, value) in interior.triplet_iter() {
            coo.push(row + 1, col, *value);
        }
        for &(col, coefficient) in &right_flux.coefficients {
            coo.push(n, col, coefficient);
        }

        let load = |row: usize, flux: &BoundaryFlux| {
            let mut column = DVector::zeros(n + 1);
            column[row] = flux.load;
            column
        };
        GradientOperator {
            matrix: CsrMatrix::from(&coo),
            left_load: left.map(|_| load(0, &left_flux)),
            right_load: right.map(|_| load(n, &right_flux)),
        }
    }
}

/// The weights of the linear extrapolation of node values to the boundary edge on the given side,
/// as `(edge row, (node column, weight))` pairs.
fn extrapolation(mesh: &SubMesh1D, side: Side) -> Vec<(usize, (usize, f64))> {
    let n = mesh.len();
    let (row, near, far) = match side {
        Side::Left => (0, 0, 1),
        Side::Right => (n, n - 1, n - 2),
    };
    let edge = mesh.edges[row];
    let ratio = (edge - mesh.nodes[near]) / (mesh.nodes[far] - mesh.nodes[near]);
    if ratio == 0.0 {
        return vec![(row, (near, 1.0))];
    }
    vec![(row, (near, 1.0 - ratio)), (row, (far, ratio))]
}
