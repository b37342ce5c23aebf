use crate::discretise::mesh::{CoordSys, SubMesh1D};
use crate::symbolic::Side;
use super::{BoundaryFlux, SchemeKind, SpatialMethod};

/// Cell-centred finite volumes.
///
/// Node values are cell averages, and fluxes are evaluated at the cell faces. A Dirichlet
/// condition is folded in through a ghost node mirrored across the boundary face, whose value
/// `c_g = 2v - c_b` makes the boundary face value equal to `v`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FiniteVolume;

impl SpatialMethod for FiniteVolume {
    fn kind(&self) -> SchemeKind {
        SchemeKind::FiniteVolume
    }

    fn build_submesh(&self, start: f64, end: f64, points: usize, coord_sys: CoordSys) -> SubMesh1D {
        SubMesh1D::uniform(start, end, points, coord_sys)
    }

    fn dirichlet_flux(&self, mesh: &SubMesh1D, side: Side) -> BoundaryFlux {
        let n = mesh.len();
        let (edge, node) = match side {
            Side::Left => (mesh.edges[0], mesh.nodes[0]),
            Side::Right => (mesh.edges[n], mesh.nodes[n - 1]),
        };

        // distance between the boundary node and its ghost
        let dx = 2.0 * (node - edge).abs();
        match side {
            // (c_0 - c_g) / dx
            Side::Left => BoundaryFlux { coefficients: vec![(0, 2.0 / dx)], load: -2.0 / dx },
            // (c_g - c_n) / dx
            Side::Right => BoundaryFlux { coefficients: vec![(n - 1, -2.0 / dx)], load: 2.0 / dx },
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use crate::discretise::bc::BcKind;
    use crate::numerical::value::mat_vec;
    use nalgebra::DVector;
    use super::*;

    #[test]
    fn ghost_node_dirichlet() {
        // c = x on [0, 1], with c(0) = 0 and c(1) = 1: the flux is 1 through every face
        let mesh = FiniteVolume.build_submesh(0.0, 1.0, 10, CoordSys::Cartesian);
        let grad = FiniteVolume.gradient(&mesh, Some(BcKind::Dirichlet), Some(BcKind::Dirichlet));
        let flux = mat_vec(&grad.matrix, &mesh.nodes)
            + grad.left_load.unwrap() * 0.0
            + grad.right_load.unwrap() * 1.0;
        assert_relative_eq!(flux, DVector::from_element(11, 1.0), max_relative = 1e-12);
    }

    #[test]
    fn spherical_divergence() {
        // div(grad(r^2)) = 6 in spherical coordinates, exactly for this flux
        let mesh = FiniteVolume.build_submesh(0.0, 1.0, 20, CoordSys::Spherical);
        let flux = mesh.edges.map(|r| 2.0 * r);
        let div = mat_vec(&FiniteVolume.divergence_matrix(&mesh), &flux);
        assert_relative_eq!(div, DVector::from_element(20, 6.0), max_relative = 1e-10);
    }
}
