//! Spatial discretisation of expression trees.
//!
//! A [`Discretisation`] turns a parameter-free symbolic tree into a discrete one, whose leaves are
//! numbers, vectors, sparse matrices and slices of the state vector, and which can therefore be
//! evaluated with [`Eval`](crate::numerical::Eval) at any time and state.
//!
//! 1. [`Discretisation::new`] builds the mesh of every region in a [`DiscretisationConfig`] with
//!    the region's scheme.
//! 2. [`Discretisation::set_variable_slices`] assigns each variable a contiguous slice of the state
//!    vector, with one entry per mesh node of the variable's domain. The slices only depend on the
//!    variables and the mesh, so they are stable across re-discretisations with different
//!    parameter values.
//! 3. [`Discretisation::process_symbol`] walks a tree bottom-up:
//!    - variables become [`StateVector`](ExprKind::StateVector) slices,
//!    - numbers and spatial variables defined over a domain become vectors of node values,
//!    - spatial operators become products of [`Matrix`](ExprKind::Matrix) leaves built by the
//!      domain's scheme, with the boundary conditions of the operand folded into the gradient,
//!    - element-wise operators combining node values with edge values (such as `D * grad(c)`
//!      with a node-valued `D`) interpolate the node values to the edges first.
//!
//! Operator matrices are kept in an [`OperatorCache`] for the lifetime of the
//! [`Discretisation`], so discretising the same model again reuses them.

pub mod bc;
pub mod cache;
pub mod config;
pub mod error;
pub mod mesh;
pub mod scheme;

use bamm_error::Error;
use indexmap::IndexMap;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::{collections::HashMap, ops::Range, sync::Arc};
use crate::symbolic::{
    error::{ShapeMismatch, UnresolvedSymbol},
    BinaryOp,
    Domain,
    Expr,
    ExprKind,
    Side,
    UnaryOp,
};
use bc::BoundaryConditions;
use cache::{CacheKey, CachedOperator, Operator, OperatorCache};
use config::DiscretisationConfig;
use error::{
    DuplicateVariable,
    MissingDiscretisation,
    SchemeConflict,
    UnknownVariable,
    UnsupportedCoordinateSystem,
};
use mesh::{Mesh, SubMesh1D};
use scheme::SpatialMethod;

pub use bc::{BcKind, BoundaryCondition, BoundaryPair};
pub use scheme::SchemeKind;

/// Maps symbolic trees to discrete trees on a fixed mesh.
///
/// For more information, see the [module-level documentation](self).
#[derive(Debug)]
pub struct Discretisation {
    config: DiscretisationConfig,
    mesh: Mesh,
    methods: IndexMap<String, Arc<dyn SpatialMethod>>,
    slices: IndexMap<String, Range<usize>>,
    cache: OperatorCache,
}

impl Discretisation {
    /// Builds the meshes and schemes of every region in the configuration.
    ///
    /// Regions with a scheme but no mesh points or geometry are accepted, but discretising an
    /// expression defined over them fails.
    pub fn new(config: DiscretisationConfig) -> Result<Self, Error> {
        config.validate()?;

        let mut mesh = Mesh::new();
        let mut methods = IndexMap::new();
        for (region, scheme) in &config.schemes {
            let method = scheme.method();
            if let (Some(points), Some(geometry)) = (config.mesh_points.get(region), config.geometry.get(region)) {
                if !method.supports(geometry.coord_sys) {
                    return Err(Error::bare(UnsupportedCoordinateSystem {
                        scheme: *scheme,
                        coord_sys: geometry.coord_sys,
                    }));
                }
                mesh.insert(
                    region.clone(),
                    method.build_submesh(geometry.start, geometry.end, *points, geometry.coord_sys),
                );
            }
            methods.insert(region.clone(), method);
        }

        log::debug!("built meshes for {} regions", methods.len());
        Ok(Self {
            config,
            mesh,
            methods,
            slices: IndexMap::new(),
            cache: OperatorCache::new(),
        })
    }

    /// The configuration the discretisation was built from.
    pub fn config(&self) -> &DiscretisationConfig {
        &self.config
    }

    /// The meshes of every region.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// The operators built so far.
    pub fn cache(&self) -> &OperatorCache {
        &self.cache
    }

    /// The slice of the state vector assigned to each variable, in order.
    pub fn slices(&self) -> &IndexMap<String, Range<usize>> {
        &self.slices
    }

    /// The length of the state vector.
    pub fn state_len(&self) -> usize {
        self.slices.values().map(|range| range.end).max().unwrap_or(0)
    }

    /// Returns the scheme and the joined mesh of the regions of a domain. `expr` is the node
    /// reported in errors.
    fn resolve(&self, domain: &Domain, expr: &Expr) -> Result<(Arc<dyn SpatialMethod>, SubMesh1D), Error> {
        let mut kind = None;
        let mut method = None;
        for region in domain.names() {
            let found = self.methods.get(region)
                .ok_or_else(|| expr.error(MissingDiscretisation { domain: region.clone() }))?;
            match kind {
                Some(kind) if kind != found.kind() => {
                    return Err(expr.error(SchemeConflict { domains: domain.clone() }));
                },
                _ => kind = Some(found.kind()),
            }
            method = Some(Arc::clone(found));
        }

        let Some(method) = method else {
            return Err(expr.error(MissingDiscretisation { domain: domain.to_string() }));
        };
        let mesh = self.mesh.combine(domain).map_err(|err| {
            let source = expr.to_string();
            Error { spans: vec![0..source.len()], source, ..err }
        })?;
        Ok((method, mesh))
    }

    /// Returns the number of mesh nodes of a domain (one for the empty domain).
    pub fn node_count(&self, domain: &Domain, expr: &Expr) -> Result<usize, Error> {
        if domain.is_empty() {
            return Ok(1);
        }
        Ok(self.resolve(domain, expr)?.1.len())
    }

    /// Assigns consecutive slices of the state vector to the given variables, in order.
    pub fn set_variable_slices(&mut self, variables: &[Expr]) -> Result<(), Error> {
        let mut slices = IndexMap::new();
        let mut offset = 0;
        for variable in variables {
            let Some(name) = variable.as_variable() else {
                return Err(variable.error(UnknownVariable { name: variable.to_string() }));
            };
            if slices.contains_key(name) {
                return Err(variable.error(DuplicateVariable { name: name.to_string() }));
            }
            let size = self.node_count(variable.domain(), variable)?;
            slices.insert(name.to_string(), offset..offset + size);
            offset += size;
        }

        log::debug!("assigned {} variables to a state vector of length {}", slices.len(), offset);
        self.slices = slices;
        Ok(())
    }

    /// Returns the discrete operator for the key, building it from the scheme and mesh of the key's
    /// domain on a cache miss.
    fn operator<F>(&mut self, key: CacheKey, expr: &Expr, build: F) -> Result<CachedOperator, Error>
    where
        F: FnOnce(&dyn SpatialMethod, &SubMesh1D) -> CachedOperator,
    {
        let (method, mesh) = self.resolve(&key.domain, expr)?;
        self.cache.get_or_try_insert_with(key, || Ok(build(method.as_ref(), &mesh)))
    }

    /// Returns the mass matrix of the domain of a variable.
    pub fn mass_matrix(&mut self, variable: &Expr) -> Result<CsrMatrix<f64>, Error> {
        if variable.domain().is_empty() {
            return Ok(CsrMatrix::identity(1));
        }

        let key = CacheKey::new(variable.domain().clone(), Operator::Mass);
        let operator = self.operator(key, variable, |method, mesh| {
            Expr::matrix(method.mass_matrix(mesh)).into()
        })?;
        match operator.matrix.kind() {
            ExprKind::Matrix(matrix) => Ok(matrix.clone()),
            _ => Ok(CsrMatrix::identity(1)),
        }
    }

    /// Discretises a parameter-free tree.
    ///
    /// `bcs` holds the boundary conditions of the operands of gradients in the tree. Their values
    /// must be parameter-free too, and are discretised alongside the tree.
    pub fn process_symbol(&mut self, expr: &Expr, bcs: &BoundaryConditions) -> Result<Expr, Error> {
        let mut memo = HashMap::new();
        self.process(expr, bcs, &mut memo)
    }

    fn process(
        &mut self,
        expr: &Expr,
        bcs: &BoundaryConditions,
        memo: &mut HashMap<usize, Expr>,
    ) -> Result<Expr, Error> {
        if let Some(discrete) = memo.get(&expr.id()) {
            return Ok(discrete.clone());
        }

        let discrete = self.process_node(expr, bcs, memo)?;
        memo.insert(expr.id(), discrete.clone());
        Ok(discrete)
    }

    fn process_node(
        &mut self,
        expr: &Expr,
        bcs: &BoundaryConditions,
        memo: &mut HashMap<usize, Expr>,
    ) -> Result<Expr, Error> {
        let unresolved = |kind: &'static str, name: &str| expr.error(UnresolvedSymbol {
            kind,
            name: name.to_string(),
        });

        match expr.kind() {
            ExprKind::Scalar(value) => {
                if expr.domain().is_empty() {
                    return Ok(expr.clone());
                }
                let n = self.node_count(expr.domain(), expr)?;
                Ok(Expr::vector_on(DVector::from_element(n, *value), expr.domain().clone()))
            },
            ExprKind::Variable(name) => match self.slices.get(name) {
                Some(range) => Ok(Expr::state_vector(range.clone(), expr.domain().clone())),
                None => Err(expr.error(UnknownVariable { name: name.clone() })),
            },
            ExprKind::SpatialVariable(_) => {
                let (_, mesh) = self.resolve(expr.domain(), expr)?;
                Ok(Expr::vector_on(mesh.nodes, expr.domain().clone()))
            },
            ExprKind::Parameter(name) => Err(unresolved("parameter", name)),
            ExprKind::FunctionParameter(name, _) => Err(unresolved("function parameter", name)),
            ExprKind::Time
                | ExprKind::InputParameter(_)
                | ExprKind::Vector(_)
                | ExprKind::Matrix(_)
                | ExprKind::StateVector(_) => Ok(expr.clone()),
            ExprKind::Unary(UnaryOp::Grad, child) => self.gradient(expr, child, bcs, memo),
            ExprKind::Unary(UnaryOp::Div, child) => {
                let flux = self.process(child, bcs, memo)?;
                let flux = self.to_edges(flux, child.domain(), expr)?;
                let key = CacheKey::new(child.domain().clone(), Operator::Divergence);
                let divergence = self.operator(key, expr, |method, mesh| {
                    Expr::matrix(method.divergence_matrix(mesh)).into()
                })?;
                divergence.matrix.matmul(flux)
            },
            ExprKind::Unary(UnaryOp::BoundaryValue(side), child) => {
                let discrete = self.process(child, bcs, memo)?;
                let n = self.node_count(child.domain(), expr)?;
                let matrix = if discrete.shape().rows() == Some(n + 1) {
                    Expr::matrix(edge_selection(n + 1, *side))
                } else {
                    let key = CacheKey::new(child.domain().clone(), Operator::BoundaryValue(*side));
                    self.operator(key, expr, |method, mesh| {
                        Expr::matrix(method.boundary_value_matrix(mesh, *side)).into()
                    })?.matrix
                };
                Ok(matrix.matmul(discrete)?.with_domain(Domain::empty()))
            },
            ExprKind::Unary(UnaryOp::Integral, child) => {
                let discrete = self.process(child, bcs, memo)?;
                let key = CacheKey::new(child.domain().clone(), Operator::Integral);
                let integral = self.operator(key, expr, |method, mesh| {
                    Expr::matrix(method.integral_matrix(mesh)).into()
                })?;
                Ok(integral.matrix.matmul(discrete)?.with_domain(Domain::empty()))
            },
            ExprKind::Unary(..) => expr.map_children(|child| self.process(child, bcs, memo)),
            ExprKind::Binary(op, [lhs, rhs]) => {
                let lhs = self.process(lhs, bcs, memo)?;
                let rhs = self.process(rhs, bcs, memo)?;
                if *op == BinaryOp::MatMul {
                    return Expr::binary(*op, lhs, rhs);
                }
                let mut operands = [lhs, rhs];
                self.align(&mut operands, expr)?;
                let [lhs, rhs] = operands;
                Expr::binary(*op, lhs, rhs)
            },
            ExprKind::Sum(terms) => {
                let mut terms = terms.iter()
                    .map(|term| self.process(term, bcs, memo))
                    .collect::<Result<Vec<_>, _>>()?;
                self.align(&mut terms, expr)?;
                Expr::sum(terms)
            },
            ExprKind::Concatenation(_) => expr.map_children(|child| self.process(child, bcs, memo)),
        }
    }

    /// Discretises the gradient of `child`, folding in its boundary conditions.
    fn gradient(
        &mut self,
        expr: &Expr,
        child: &Expr,
        bcs: &BoundaryConditions,
        memo: &mut HashMap<usize, Expr>,
    ) -> Result<Expr, Error> {
        let discrete = self.process(child, bcs, memo)?;
        let domain = child.domain();
        let n = self.node_count(domain, expr)?;
        if discrete.shape().rows() != Some(n) {
            return Err(expr.children_error(&[0], ShapeMismatch {
                op: "grad".to_string(),
                left: discrete.shape(),
                right: discrete.shape(),
            }));
        }

        let pair = bcs.get(child).cloned().unwrap_or_default();
        let (left, right) = pair.kinds();
        let key = CacheKey { left, right, ..CacheKey::new(domain.clone(), Operator::Gradient) };
        let gradient = self.operator(key, expr, |method, mesh| {
            let gradient = method.gradient(mesh, left, right);
            CachedOperator {
                matrix: Expr::matrix(gradient.matrix),
                left_load: gradient.left_load.map(Expr::vector),
                right_load: gradient.right_load.map(Expr::vector),
            }
        })?;

        let mut terms = vec![gradient.matrix.matmul(discrete)?];
        for (side, load) in [(Side::Left, gradient.left_load), (Side::Right, gradient.right_load)] {
            if let (Some(load), Some(bc)) = (load, pair.get(side)) {
                let value = self.process(&bc.value, bcs, memo)?;
                terms.push((load * value)?);
            }
        }
        if terms.len() == 1 {
            Ok(terms.remove(0))
        } else {
            Expr::sum(terms)
        }
    }

    /// Interpolates a node-valued discrete tree to the edges of its domain. Edge-valued trees and
    /// trees without a domain are returned as is.
    fn to_edges(&mut self, discrete: Expr, domain: &Domain, expr: &Expr) -> Result<Expr, Error> {
        if domain.is_empty() {
            return Ok(discrete);
        }

        let n = self.node_count(domain, expr)?;
        if discrete.shape().rows() != Some(n) {
            return Ok(discrete);
        }
        let key = CacheKey::new(domain.clone(), Operator::NodeToEdge);
        let interpolation = self.operator(key, expr, |method, mesh| {
            Expr::matrix(method.node_to_edge_matrix(mesh)).into()
        })?;
        interpolation.matrix.matmul(discrete)
    }

    /// Interpolates the node-valued operands of an element-wise node to edges, if any other
    /// operand is edge-valued.
    fn align(&mut self, operands: &mut [Expr], expr: &Expr) -> Result<(), Error> {
        let domain = expr.domain();
        if domain.is_empty() {
            return Ok(());
        }

        let n = self.node_count(domain, expr)?;
        if operands.iter().all(|operand| operand.shape().rows() != Some(n + 1)) {
            return Ok(());
        }
        for operand in operands.iter_mut() {
            *operand = self.to_edges(operand.clone(), domain, expr)?;
        }
        Ok(())
    }
}

/// Returns the `1 x edges` matrix selecting the first or last edge.
fn edge_selection(edges: usize, side: Side) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(1, edges);
    match side {
        Side::Left => coo.push(0, 0, 1.0),
        Side::Right => coo.push(0, edges - 1, 1.0),
    }
    CsrMatrix::from(&coo)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use crate::numerical::{Ctxt, Eval};
    use crate::symbolic::{boundary_value, div, grad, integral, Domain};
    use nalgebra::dvector;
    use pretty_assertions::assert_eq;
    use super::*;
    use super::config::DomainGeometry;
    use super::error::{DuplicateVariable, MissingDiscretisation, SchemeConflict};

    const ROD: &str = "rod";

    fn rod(scheme: SchemeKind, points: usize) -> DiscretisationConfig {
        DiscretisationConfig::empty()
            .with_region(ROD, scheme, points, DomainGeometry::cartesian(0.0, 1.0))
    }

    fn c() -> Expr {
        Expr::variable("c", ROD)
    }

    fn eval(expr: &Expr, state: DVector<f64>) -> DVector<f64> {
        let rows = expr.shape().rows().unwrap();
        expr.eval(&Ctxt::at(0.0, state)).unwrap().into_vector(rows).unwrap()
    }

    #[test]
    fn variables_become_state_slices() {
        let mut disc = Discretisation::new(rod(SchemeKind::FiniteVolume, 5)).unwrap();
        let v = Expr::variable("v", Domain::empty());
        disc.set_variable_slices(&[c(), v.clone()]).unwrap();
        assert_eq!(disc.slices()["c"], 0..5);
        assert_eq!(disc.slices()["v"], 5..6);
        assert_eq!(disc.state_len(), 6);

        let discrete = disc.process_symbol(&(c() * &v).unwrap(), &BoundaryConditions::new()).unwrap();
        let value = eval(&discrete, dvector![1.0, 2.0, 3.0, 4.0, 5.0, 2.0]);
        assert_eq!(value, dvector![2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn variables_with_the_same_name() {
        let config = rod(SchemeKind::FiniteVolume, 3)
            .with_region("sleeve", SchemeKind::FiniteVolume, 4, DomainGeometry::cartesian(1.0, 2.0));
        let mut disc = Discretisation::new(config).unwrap();
        let err = disc.set_variable_slices(&[c(), Expr::variable("c", "sleeve")]).unwrap_err();
        assert_eq!(err.downcast_ref::<DuplicateVariable>().unwrap().name, "c");
    }

    #[test]
    fn laplacian_with_neumann_boundaries() {
        let mut disc = Discretisation::new(rod(SchemeKind::FiniteVolume, 10)).unwrap();
        disc.set_variable_slices(&[c()]).unwrap();
        let mut bcs = BoundaryConditions::new();
        bcs.insert(c(), BoundaryPair::new(BoundaryCondition::neumann(0.0), BoundaryCondition::neumann(0.0)));

        let discrete = disc.process_symbol(&div(grad(c())).unwrap(), &bcs).unwrap();
        assert_eq!(discrete.shape(), crate::symbolic::Shape::Column(10));
        let residual = eval(&discrete, DVector::from_element(10, 1.0));
        assert_relative_eq!(residual, DVector::zeros(10), epsilon = 1e-12);
    }

    #[test]
    fn dirichlet_values_enter_the_gradient() {
        // c'' = 0 with c(0) = 0, c(1) = 1 is solved by c = x
        for scheme in [SchemeKind::FiniteVolume, SchemeKind::ControlVolume, SchemeKind::FiniteElement] {
            let mut disc = Discretisation::new(rod(scheme, 8)).unwrap();
            disc.set_variable_slices(&[c()]).unwrap();
            let mut bcs = BoundaryConditions::new();
            bcs.insert(c(), BoundaryPair::new(BoundaryCondition::dirichlet(0.0), BoundaryCondition::dirichlet(1.0)));

            let discrete = disc.process_symbol(&grad(c()).unwrap(), &bcs).unwrap();
            let x = disc.mesh().get(ROD).unwrap().nodes.clone();
            let flux = eval(&discrete, x);
            assert_relative_eq!(flux, DVector::from_element(9, 1.0), max_relative = 1e-10);
        }
    }

    #[test]
    fn node_values_are_interpolated_to_edges() {
        let mut disc = Discretisation::new(rod(SchemeKind::FiniteVolume, 4)).unwrap();
        disc.set_variable_slices(&[c()]).unwrap();
        let expr = div((c() * grad(c()).unwrap()).unwrap()).unwrap();
        let discrete = disc.process_symbol(&expr, &BoundaryConditions::new()).unwrap();
        assert_eq!(discrete.shape(), crate::symbolic::Shape::Column(4));
        assert_eq!(disc.cache().len(), 3);
    }

    #[test]
    fn scalars_on_a_domain_fill_the_mesh() {
        let mut disc = Discretisation::new(rod(SchemeKind::ControlVolume, 3)).unwrap();
        let discrete = disc.process_symbol(&Expr::scalar_on(2.0, ROD), &BoundaryConditions::new()).unwrap();
        assert_eq!(discrete, Expr::vector_on(dvector![2.0, 2.0, 2.0], ROD));
    }

    #[test]
    fn boundary_values_and_integrals() {
        let mut disc = Discretisation::new(rod(SchemeKind::FiniteVolume, 10)).unwrap();
        disc.set_variable_slices(&[c()]).unwrap();
        let x = Expr::spatial_variable("x", ROD);
        let expr = ((boundary_value(&x, Side::Right).unwrap() + integral(&x).unwrap()).unwrap() * c()).unwrap();
        let discrete = disc.process_symbol(&expr, &BoundaryConditions::new()).unwrap();

        // (1 + 1/2) * c
        let value = eval(&discrete, DVector::from_element(10, 2.0));
        assert_relative_eq!(value, DVector::from_element(10, 3.0), max_relative = 1e-12);
    }

    #[test]
    fn cached_operators_are_reused() {
        let mut disc = Discretisation::new(rod(SchemeKind::FiniteVolume, 6)).unwrap();
        disc.set_variable_slices(&[c()]).unwrap();
        let expr = div(grad(c())).unwrap();
        let first = disc.process_symbol(&expr, &BoundaryConditions::new()).unwrap();
        let misses = disc.cache().misses();
        let second = disc.process_symbol(&expr, &BoundaryConditions::new()).unwrap();
        assert_eq!(disc.cache().misses(), misses);
        assert_eq!(disc.cache().hits(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_scheme() {
        let mut disc = Discretisation::new(rod(SchemeKind::FiniteVolume, 6)).unwrap();
        let other = Expr::variable("T", "current collector");
        let err = disc.set_variable_slices(&[other]).unwrap_err();
        assert_eq!(err.downcast_ref::<MissingDiscretisation>().unwrap().domain, "current collector");
    }

    #[test]
    fn conflicting_schemes() {
        let config = rod(SchemeKind::FiniteVolume, 4)
            .with_region("tip", SchemeKind::ControlVolume, 4, DomainGeometry::cartesian(1.0, 2.0));
        let mut disc = Discretisation::new(config).unwrap();
        let err = disc.set_variable_slices(&[Expr::variable("c", [ROD, "tip"])]).unwrap_err();
        assert!(err.is::<SchemeConflict>());
    }

    #[test]
    fn parameters_must_be_substituted_first() {
        let mut disc = Discretisation::new(rod(SchemeKind::FiniteVolume, 4)).unwrap();
        disc.set_variable_slices(&[c()]).unwrap();
        let expr = (Expr::parameter("D") * c()).unwrap();
        let err = disc.process_symbol(&expr, &BoundaryConditions::new()).unwrap_err();
        assert_eq!(err.downcast_ref::<UnresolvedSymbol>().unwrap().kind, "parameter");
    }

    #[test]
    fn finite_elements_reject_spheres() {
        let config = DiscretisationConfig::empty()
            .with_region("particle", SchemeKind::FiniteElement, 5, DomainGeometry::sphere(1.0));
        let err = Discretisation::new(config).unwrap_err();
        assert!(err.is::<UnsupportedCoordinateSystem>());
    }
}
