use crate::discretise::mesh::{CoordSys, SubMesh1D};
use crate::symbolic::Side;
use super::{BoundaryFlux, SchemeKind, SpatialMethod};

/// Vertex-centred control volumes.
///
/// Nodes sit on the mesh vertices, including both boundaries, and each node owns the control
/// volume between the midpoints to its neighbours (half a volume at the boundaries). A Dirichlet
/// condition is imposed weakly: the flux through the boundary face is the one-sided gradient at
/// the boundary node, plus a penalty `2 (c_b - v) / h` pulling the boundary node towards `v`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlVolume;

/// The weakly imposed Dirichlet flux of a vertex-centred mesh.
pub(super) fn weak_dirichlet(mesh: &SubMesh1D, side: Side) -> BoundaryFlux {
    let n = mesh.len();
    match side {
        Side::Left => {
            let h = mesh.nodes[1] - mesh.nodes[0];
            // (c_{b+1} - c_b) / h + 2 (c_b - v) / h
            BoundaryFlux { coefficients: vec![(0, 1.0 / h), (1, 1.0 / h)], load: -2.0 / h }
        },
        Side::Right => {
            let h = mesh.nodes[n - 1] - mesh.nodes[n - 2];
            // (c_b - c_{b-1}) / h - 2 (c_b - v) / h
            BoundaryFlux { coefficients: vec![(n - 2, -1.0 / h), (n - 1, -1.0 / h)], load: 2.0 / h }
        },
    }
}

impl SpatialMethod for ControlVolume {
    fn kind(&self) -> SchemeKind {
        SchemeKind::ControlVolume
    }

    fn build_submesh(&self, start: f64, end: f64, points: usize, coord_sys: CoordSys) -> SubMesh1D {
        SubMesh1D::vertex_centred(start, end, points, coord_sys)
    }

    fn dirichlet_flux(&self, mesh: &SubMesh1D, side: Side) -> BoundaryFlux {
        weak_dirichlet(mesh, side)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use crate::numerical::value::mat_vec;
    use nalgebra::DVector;
    use super::*;

    #[test]
    fn half_volumes_at_boundaries() {
        let mesh = ControlVolume.build_submesh(0.0, 1.0, 5, CoordSys::Cartesian);
        let volumes = mesh.volumes();
        assert_relative_eq!(volumes[0], 0.125);
        assert_relative_eq!(volumes[2], 0.25);
        assert_relative_eq!(volumes[4], 0.125);
    }

    #[test]
    fn boundary_value_is_the_boundary_node() {
        let mesh = ControlVolume.build_submesh(0.0, 1.0, 5, CoordSys::Cartesian);
        let c = DVector::from_vec(vec![3.0, 1.0, 4.0, 1.0, 5.0]);
        let left = mat_vec(&ControlVolume.boundary_value_matrix(&mesh, Side::Left), &c);
        let right = mat_vec(&ControlVolume.boundary_value_matrix(&mesh, Side::Right), &c);
        assert_eq!((left[0], right[0]), (3.0, 5.0));
    }
}
