//! Configuration of the spatial discretisation.
//!
//! A [`DiscretisationConfig`] assigns a [`SchemeKind`], a number of mesh points and a
//! [`DomainGeometry`] to each region of the cell. It is an ordinary value: build one (or start
//! from [`DiscretisationConfig::default`], the standard battery catalogue) and pass it to
//! [`Discretisation::new`](super::Discretisation::new).
//!
//! With the `serde` feature, the configuration can be loaded from any serde format:
//!
//! ```json
//! {
//!   "schemes": { "separator": "finite-volume-1D" },
//!   "mesh_points": { "separator": 20 },
//!   "geometry": { "separator": { "start": 8.52e-5, "end": 9.72e-5, "coord_sys": "cartesian" } }
//! }
//! ```

use bamm_error::Error;
use indexmap::IndexMap;
use crate::symbolic::domain::{
    CURRENT_COLLECTOR,
    NEGATIVE_ELECTRODE,
    NEGATIVE_PARTICLE,
    POSITIVE_ELECTRODE,
    POSITIVE_PARTICLE,
    SEPARATOR,
};
use super::{error::InvalidConfiguration, mesh::CoordSys, scheme::SchemeKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The extent and coordinate system of a region.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DomainGeometry {
    /// The coordinate of the start of the region.
    pub start: f64,

    /// The coordinate of the end of the region.
    pub end: f64,

    /// The coordinate system of the region.
    #[cfg_attr(feature = "serde", serde(default))]
    pub coord_sys: CoordSys,
}

impl DomainGeometry {
    /// A region in cartesian coordinates.
    pub fn cartesian(start: f64, end: f64) -> Self {
        Self { start, end, coord_sys: CoordSys::Cartesian }
    }

    /// A particle of the given radius, in spherical coordinates.
    pub fn sphere(radius: f64) -> Self {
        Self { start: 0.0, end: radius, coord_sys: CoordSys::Spherical }
    }
}

/// The scheme, mesh resolution and geometry of each region of the cell.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiscretisationConfig {
    /// The scheme of each region.
    pub schemes: IndexMap<String, SchemeKind>,

    /// The number of mesh nodes in each region.
    pub mesh_points: IndexMap<String, usize>,

    /// The geometry of each region.
    pub geometry: IndexMap<String, DomainGeometry>,
}

impl Default for DiscretisationConfig {
    /// The battery catalogue: finite volumes through the cell and in spherical particles, and
    /// finite elements along the current collector, with the dimensions of an LG M50 cell.
    fn default() -> Self {
        let negative = 85.2e-6;
        let separator = 12e-6;
        let positive = 75.6e-6;
        Self::empty()
            .with_region(NEGATIVE_ELECTRODE, SchemeKind::FiniteVolume, 20, DomainGeometry::cartesian(0.0, negative))
            .with_region(SEPARATOR, SchemeKind::FiniteVolume, 20, DomainGeometry::cartesian(negative, negative + separator))
            .with_region(
                POSITIVE_ELECTRODE,
                SchemeKind::FiniteVolume,
                20,
                DomainGeometry::cartesian(negative + separator, negative + separator + positive),
            )
            .with_region(NEGATIVE_PARTICLE, SchemeKind::FiniteVolume, 20, DomainGeometry::sphere(5.86e-6))
            .with_region(POSITIVE_PARTICLE, SchemeKind::FiniteVolume, 20, DomainGeometry::sphere(5.22e-6))
            .with_region(CURRENT_COLLECTOR, SchemeKind::FiniteElement, 10, DomainGeometry::cartesian(0.0, 0.065))
    }
}

impl DiscretisationConfig {
    /// A configuration without any region.
    pub fn empty() -> Self {
        Self {
            schemes: IndexMap::new(),
            mesh_points: IndexMap::new(),
            geometry: IndexMap::new(),
        }
    }

    /// Adds (or replaces) a region.
    pub fn with_region(
        mut self,
        region: impl Into<String>,
        scheme: SchemeKind,
        points: usize,
        geometry: DomainGeometry,
    ) -> Self {
        let region = region.into();
        self.schemes.insert(region.clone(), scheme);
        self.mesh_points.insert(region.clone(), points);
        self.geometry.insert(region, geometry);
        self
    }

    /// Changes the scheme of a region.
    pub fn with_scheme(mut self, region: impl Into<String>, scheme: SchemeKind) -> Self {
        self.schemes.insert(region.into(), scheme);
        self
    }

    /// Changes the number of mesh nodes of a region.
    pub fn with_mesh_points(mut self, region: impl Into<String>, points: usize) -> Self {
        self.mesh_points.insert(region.into(), points);
        self
    }

    /// Checks that every mesh has at least two nodes and a non-empty extent.
    pub fn validate(&self) -> Result<(), Error> {
        for (region, points) in &self.mesh_points {
            if *points < 2 {
                return Err(Error::bare(InvalidConfiguration {
                    reason: format!("the `{}` region needs at least 2 mesh points, got {}", region, points),
                }));
            }
        }
        for (region, geometry) in &self.geometry {
            if !(geometry.end > geometry.start) {
                return Err(Error::bare(InvalidConfiguration {
                    reason: format!("the `{}` region ends before it starts", region),
                }));
            }
        }
        Ok(())
    }
}
