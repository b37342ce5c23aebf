use bamm_error::Error;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use crate::discretise::{error::UnsupportedCoordinateSystem, mesh::{CoordSys, SubMesh1D}};
use crate::symbolic::Side;
use super::{control_volume::weak_dirichlet, BoundaryFlux, SchemeKind, SpatialMethod};

/// Linear Lagrange finite elements on the current-collector coordinate.
///
/// This is a one-dimensional scheme. It is selected with the `finite-element-2D1D` identifier,
/// but it only discretises the single collector coordinate along a line; there is no second
/// in-plane direction and no coupling to a through-cell dimension.
///
/// Nodes sit on the element vertices. The weak divergence is normalised by the lumped mass of
/// each node, so it has the same units and shape as in the volume schemes, and the mass matrix is
/// the consistent mass matrix normalised the same way. Neumann conditions enter as boundary
/// loads, and Dirichlet conditions are imposed weakly as in the control-volume scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct FiniteElement;

impl FiniteElement {
    /// Returns an error if the scheme cannot be used in the given coordinate system.
    pub fn check_coord_sys(coord_sys: CoordSys) -> Result<(), Error> {
        if FiniteElement.supports(coord_sys) {
            Ok(())
        } else {
            Err(Error::bare(UnsupportedCoordinateSystem {
                scheme: SchemeKind::FiniteElement,
                coord_sys,
            }))
        }
    }
}

impl SpatialMethod for FiniteElement {
    fn kind(&self) -> SchemeKind {
        SchemeKind::FiniteElement
    }

    fn supports(&self, coord_sys: CoordSys) -> bool {
        coord_sys == CoordSys::Cartesian
    }

    fn build_submesh(&self, start: f64, end: f64, points: usize, coord_sys: CoordSys) -> SubMesh1D {
        SubMesh1D::vertex_centred(start, end, points, coord_sys)
    }

    fn dirichlet_flux(&self, mesh: &SubMesh1D, side: Side) -> BoundaryFlux {
        weak_dirichlet(mesh, side)
    }

    fn mass_matrix(&self, mesh: &SubMesh1D) -> CsrMatrix<f64> {
        let n = mesh.len();
        let lumped = mesh.volumes();
        let mut coo = CooMatrix::new(n, n);
        for (e, h) in mesh.node_spacing().iter().enumerate() {
            // element matrix h/6 * [2 1; 1 2]
            let (diagonal, off_diagonal) = (h / 3.0, h / 6.0);
            coo.push(e, e, diagonal / lumped[e]);
            coo.push(e, e + 1, off_diagonal / lumped[e]);
            coo.push(e + 1, e, off_diagonal / lumped[e + 1]);
            coo.push(e + 1, e + 1, diagonal / lumped[e + 1]);
        }
        CsrMatrix::from(&coo)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use crate::numerical::value::mat_vec;
    use nalgebra::DVector;
    use super::*;

    #[test]
    fn normalised_mass_preserves_constants() {
        let mesh = FiniteElement.build_submesh(0.0, 0.065, 8, CoordSys::Cartesian);
        let mass = mat_vec(&FiniteElement.mass_matrix(&mesh), &DVector::from_element(8, 2.0));
        assert_relative_eq!(mass, DVector::from_element(8, 2.0), max_relative = 1e-12);
    }

    #[test]
    fn consistent_mass_entries() {
        let mesh = FiniteElement.build_submesh(0.0, 1.0, 3, CoordSys::Cartesian);
        let mass = nalgebra::DMatrix::from(&FiniteElement.mass_matrix(&mesh));
        assert_relative_eq!(mass[(0, 0)], 2.0 / 3.0, max_relative = 1e-12);
        assert_relative_eq!(mass[(0, 1)], 1.0 / 3.0, max_relative = 1e-12);
        assert_relative_eq!(mass[(1, 1)], 2.0 / 3.0, max_relative = 1e-12);
        assert_relative_eq!(mass[(1, 0)], 1.0 / 6.0, max_relative = 1e-12);
    }

    #[test]
    fn rejects_spherical_coordinates() {
        let err = FiniteElement::check_coord_sys(CoordSys::Spherical).unwrap_err();
        let kind = err.downcast_ref::<UnsupportedCoordinateSystem>().unwrap();
        assert_eq!(kind.coord_sys, CoordSys::Spherical);
        assert!(FiniteElement::check_coord_sys(CoordSys::Cartesian).is_ok());
    }
}
