//! Caching of discrete operator matrices.
//!
//! Building the matrices of a spatial operator only depends on the mesh of the domain it acts on
//! and the kinds (not the values) of the boundary conditions folded into it. The
//! [`OperatorCache`] keeps every matrix built by a [`Discretisation`](super::Discretisation), so
//! re-discretising a model with new parameter values reuses the same matrix nodes.

use bamm_error::Error;
use std::collections::HashMap;
use crate::symbolic::{Domain, Expr, Side};
use super::bc::BcKind;

/// The discrete operators built by a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Gradient,
    Divergence,
    NodeToEdge,
    BoundaryValue(Side),
    Integral,
    Mass,
}

/// Identifies a discrete operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// The domain the operator acts on.
    pub domain: Domain,

    /// The operator.
    pub operator: Operator,

    /// The kind of the boundary condition at the start of the domain, if any.
    pub left: Option<BcKind>,

    /// The kind of the boundary condition at the end of the domain, if any.
    pub right: Option<BcKind>,
}

impl CacheKey {
    /// The key of an operator that does not depend on boundary conditions.
    pub fn new(domain: Domain, operator: Operator) -> Self {
        Self { domain, operator, left: None, right: None }
    }
}

/// A discrete operator: a matrix leaf, and the columns multiplying the values of the boundary
/// conditions folded into it.
#[derive(Debug, Clone)]
pub struct CachedOperator {
    pub matrix: Expr,
    pub left_load: Option<Expr>,
    pub right_load: Option<Expr>,
}

impl From<Expr> for CachedOperator {
    fn from(matrix: Expr) -> Self {
        Self { matrix, left_load: None, right_load: None }
    }
}

/// Discrete operators built so far, keyed by [`CacheKey`].
#[derive(Debug, Default)]
pub struct OperatorCache {
    entries: HashMap<CacheKey, CachedOperator>,
    hits: usize,
    misses: usize,
}

impl OperatorCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached operator for the key, building it with `build` if it is not cached.
    pub fn get_or_try_insert_with<F>(&mut self, key: CacheKey, build: F) -> Result<CachedOperator, Error>
    where
        F: FnOnce() -> Result<CachedOperator, Error>,
    {
        if let Some(operator) = self.entries.get(&key) {
            self.hits += 1;
            log::debug!("operator cache hit: {:?} on {}", key.operator, key.domain);
            return Ok(operator.clone());
        }

        self.misses += 1;
        log::debug!("operator cache miss: {:?} on {}", key.operator, key.domain);
        let operator = build()?;
        self.entries.insert(key, operator.clone());
        Ok(operator)
    }

    /// The number of lookups that found a cached operator.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// The number of lookups that had to build the operator.
    pub fn misses(&self) -> usize {
        self.misses
    }

    /// The number of cached operators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no operator is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every cached operator.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use nalgebra_sparse::CsrMatrix;
    use super::*;

    #[test]
    fn builds_once() {
        let mut cache = OperatorCache::new();
        let key = CacheKey::new(Domain::from("separator"), Operator::Mass);
        let mut builds = 0;
        for _ in 0..3 {
            let operator = cache.get_or_try_insert_with(key.clone(), || {
                builds += 1;
                Ok(Expr::matrix(CsrMatrix::identity(3)).into())
            }).unwrap();
            assert!(operator.left_load.is_none());
        }
        assert_eq!(builds, 1);
        assert_eq!((cache.hits(), cache.misses(), cache.len()), (2, 1, 1));
    }

    #[test]
    fn boundary_kinds_are_part_of_the_key() {
        let mut cache = OperatorCache::new();
        let domain = Domain::from("negative particle");
        for right in [None, Some(BcKind::Neumann), Some(BcKind::Dirichlet)] {
            let key = CacheKey { right, ..CacheKey::new(domain.clone(), Operator::Gradient) };
            cache.get_or_try_insert_with(key, || Ok(Expr::scalar(0.0).into())).unwrap();
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.hits(), 0);
    }
}
