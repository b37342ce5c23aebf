//! The immutable expression tree that model equations are written in.
//!
//! An [`Expr`] is a cheap-to-clone handle to an immutable node. Nodes are never mutated after
//! they are built: every transformation (simplification, parameter substitution,
//! discretisation) builds new nodes, reusing untouched sub-trees as-is. This means the same
//! sub-tree can be referenced from many places (the `rhs` of a model and one of its output
//! `variables`, for example) without any risk of one owner changing it under the other.
//!
//! # Structure
//!
//! The kind of a node is a closed enum, [`ExprKind`]. Leaves are either **symbolic**
//! ([`ExprKind::Variable`], [`ExprKind::Parameter`], ...), which must be resolved by a later
//! stage of the pipeline, or **discrete** ([`ExprKind::Vector`], [`ExprKind::Matrix`],
//! [`ExprKind::StateVector`]), which are produced by the discretiser and can be evaluated
//! directly.
//!
//! When a node is built, its domain and shape are derived from its children and cached on the
//! node, along with a structural hash. Incompatible domains or shapes are reported immediately:
//!
//! ```
//! use bamm_compute::symbolic::{Domain, Expr};
//!
//! let c_n = Expr::variable("c_n", "negative electrode");
//! let c_p = Expr::variable("c_p", "positive electrode");
//! assert!((&c_n + &c_p).is_err());
//!
//! let scaled = (2.0 * &c_n).unwrap();
//! assert_eq!(scaled.domain(), &Domain::from("negative electrode"));
//! ```
//!
//! # Structural equality
//!
//! The [`PartialEq`], [`Eq`] and [`Hash`] implementations for [`Expr`] compare trees
//! **structurally**: two independently built trees with the same kinds, payloads and children
//! are equal. Unlike a simplifying computer algebra system, no reordering is considered, so
//! `a + b` and `b + a` are different trees. Floating-point payloads are compared by their bit
//! patterns. The simplifier must never produce `NaN` payloads.

mod fmt;
mod iter;
mod ops;

pub use iter::ExprIter;
pub use ops::*;

use bamm_error::Error;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    ops::Range,
    sync::Arc,
};
use super::{
    domain::Domain,
    error::{DomainMismatch, NoSpatialDomain, ShapeMismatch},
    shape::Shape,
};

/// A side of a one-dimensional domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The side with the smallest coordinate.
    Left,

    /// The side with the largest coordinate.
    Right,
}

impl Side {
    /// The lowercase name of the side.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Elementary functions that can be applied to an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    Exp,
    Log,
    Sqrt,
    Tanh,
    Sinh,
    Cosh,
    Sin,
    Cos,
}

impl Func {
    /// The name of the function, as it is printed.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Sqrt => "sqrt",
            Self::Tanh => "tanh",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Sin => "sin",
            Self::Cos => "cos",
        }
    }

    /// Evaluates the function at the given point.
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Self::Exp => x.exp(),
            Self::Log => x.ln(),
            Self::Sqrt => x.sqrt(),
            Self::Tanh => x.tanh(),
            Self::Sinh => x.sinh(),
            Self::Cosh => x.cosh(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
        }
    }
}

/// Operators with a single operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Neg,

    /// The spatial gradient of the operand.
    Grad,

    /// The spatial divergence of the operand.
    Div,

    /// The value of the operand on one side of its domain.
    BoundaryValue(Side),

    /// The integral of the operand over its domain.
    Integral,

    /// An elementary function applied to the operand.
    Function(Func),
}

impl UnaryOp {
    /// The name of the operator, as it is printed.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Grad => "grad",
            Self::Div => "div",
            Self::BoundaryValue(_) => "boundary_value",
            Self::Integral => "integral",
            Self::Function(func) => func.name(),
        }
    }

    /// Returns true if the operator acts on the spatial structure of its operand, and must be
    /// replaced by the discretiser.
    pub fn is_spatial(&self) -> bool {
        matches!(self, Self::Grad | Self::Div | Self::BoundaryValue(_) | Self::Integral)
    }
}

/// Operators with two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,

    /// Matrix multiplication.
    MatMul,
}

impl BinaryOp {
    /// The symbol of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
            Self::MatMul => "@",
        }
    }

    /// Applies the operator to two numbers. Matrix multiplication of two numbers is their
    /// product.
    pub fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul | Self::MatMul => lhs * rhs,
            Self::Div => lhs / rhs,
            Self::Pow => lhs.powf(rhs),
        }
    }
}

/// The kind of an expression node.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// A number.
    Scalar(f64),

    /// An unknown field, resolved to a slice of the state vector by the discretiser.
    Variable(String),

    /// A named placeholder for a number, resolved by parameter substitution.
    Parameter(String),

    /// A parameter whose value is supplied at evaluation time, so that it can be changed without
    /// processing the model again.
    InputParameter(String),

    /// The time variable.
    Time,

    /// A spatial coordinate, resolved to the mesh node positions by the discretiser.
    SpatialVariable(String),

    /// A constant column vector.
    Vector(DVector<f64>),

    /// A constant sparse matrix.
    Matrix(CsrMatrix<f64>),

    /// A contiguous slice of the discrete state vector.
    StateVector(Range<usize>),

    /// A named placeholder for a function of the given arguments, resolved by parameter
    /// substitution.
    FunctionParameter(String, Vec<Expr>),

    /// A unary operator applied to an operand.
    Unary(UnaryOp, Expr),

    /// A binary operator applied to two operands.
    Binary(BinaryOp, [Expr; 2]),

    /// A flattened chain of additions.
    Sum(Vec<Expr>),

    /// Children glued together along their (disjoint) domains.
    Concatenation(Vec<Expr>),
}

impl ExprKind {
    /// Returns the children of this node, in order.
    pub fn children(&self) -> &[Expr] {
        match self {
            Self::FunctionParameter(_, args) => args,
            Self::Unary(_, child) => std::slice::from_ref(child),
            Self::Binary(_, children) => children,
            Self::Sum(children) | Self::Concatenation(children) => children,
            _ => &[],
        }
    }

    /// Returns true if this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.children().is_empty()
            && !matches!(self, Self::FunctionParameter(..) | Self::Sum(_) | Self::Concatenation(_))
    }

    /// Hashes the payload of this node, excluding its children.
    fn hash_payload<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Scalar(value) => value.to_bits().hash(state),
            Self::Variable(name)
                | Self::Parameter(name)
                | Self::InputParameter(name)
                | Self::SpatialVariable(name)
                | Self::FunctionParameter(name, _) => name.hash(state),
            Self::Time | Self::Sum(_) | Self::Concatenation(_) => (),
            Self::Vector(values) => {
                values.len().hash(state);
                values.iter().for_each(|v| v.to_bits().hash(state));
            },
            Self::Matrix(matrix) => {
                (matrix.nrows(), matrix.ncols()).hash(state);
                matrix.row_offsets().hash(state);
                matrix.col_indices().hash(state);
                matrix.values().iter().for_each(|v| v.to_bits().hash(state));
            },
            Self::StateVector(range) => range.hash(state),
            Self::Unary(op, _) => op.hash(state),
            Self::Binary(op, _) => op.hash(state),
        }
    }

    /// Compares the payloads of two nodes, excluding their children.
    fn payload_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a.to_bits() == b.to_bits(),
            (Self::Variable(a), Self::Variable(b))
                | (Self::Parameter(a), Self::Parameter(b))
                | (Self::InputParameter(a), Self::InputParameter(b))
                | (Self::SpatialVariable(a), Self::SpatialVariable(b))
                | (Self::FunctionParameter(a, _), Self::FunctionParameter(b, _)) => a == b,
            (Self::Time, Self::Time)
                | (Self::Sum(_), Self::Sum(_))
                | (Self::Concatenation(_), Self::Concatenation(_)) => true,
            (Self::Vector(a), Self::Vector(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(a, b)| a.to_bits() == b.to_bits())
            },
            (Self::Matrix(a), Self::Matrix(b)) => {
                a.nrows() == b.nrows()
                    && a.ncols() == b.ncols()
                    && a.row_offsets() == b.row_offsets()
                    && a.col_indices() == b.col_indices()
                    && a.values().iter().zip(b.values()).all(|(a, b)| a.to_bits() == b.to_bits())
            },
            (Self::StateVector(a), Self::StateVector(b)) => a == b,
            (Self::Unary(a, _), Self::Unary(b, _)) => a == b,
            (Self::Binary(a, _), Self::Binary(b, _)) => a == b,
            _ => false,
        }
    }

    /// Builds an error of the given kind, pointing at the children with the given indices.
    fn error_at(&self, children: &[usize], kind: impl bamm_error::ErrorKind + 'static) -> Error {
        let (text, spans) = self.render();
        let spans = children.iter()
            .filter_map(|&idx| spans.get(idx).cloned())
            .collect();
        Error::new(spans, kind).with_source(text)
    }

    /// Derives the domain of a composite node from its children.
    fn derive_domain(&self) -> Result<Domain, Error> {
        let combine_all = |children: &[Expr]| {
            let mut domain = Domain::empty();
            let mut from = 0;
            for (idx, child) in children.iter().enumerate() {
                match domain.combine(child.domain()) {
                    Some(combined) => {
                        if domain.is_empty() && !combined.is_empty() {
                            from = idx;
                        }
                        domain = combined;
                    },
                    None => return Err(self.error_at(&[from, idx], DomainMismatch {
                        left: domain,
                        right: child.domain().clone(),
                    })),
                }
            }
            Ok(domain)
        };

        match self {
            Self::Unary(op, child) => {
                if op.is_spatial() && child.domain().is_empty() {
                    return Err(self.error_at(&[0], NoSpatialDomain { op: op.name() }));
                }
                match op {
                    UnaryOp::BoundaryValue(_) | UnaryOp::Integral => Ok(Domain::empty()),
                    _ => Ok(child.domain().clone()),
                }
            },
            Self::Concatenation(children) => {
                let mut domain = Domain::empty();
                for (idx, child) in children.iter().enumerate() {
                    if let Some(prev) = children[..idx].iter().position(|prev| !prev.domain().is_disjoint(child.domain())) {
                        return Err(self.error_at(&[prev, idx], DomainMismatch {
                            left: children[prev].domain().clone(),
                            right: child.domain().clone(),
                        }));
                    }
                    domain.extend(child.domain());
                }
                Ok(domain)
            },
            Self::FunctionParameter(_, children)
                | Self::Sum(children) => combine_all(children),
            Self::Binary(_, children) => combine_all(children),
            _ => Ok(Domain::empty()),
        }
    }

    /// Derives the shape of a composite node from its children.
    fn derive_shape(&self) -> Result<Shape, Error> {
        match self {
            Self::Scalar(_) => Ok(Shape::Scalar),
            Self::Vector(values) => Ok(Shape::Column(values.len())),
            Self::Matrix(matrix) => Ok(Shape::Matrix(matrix.nrows(), matrix.ncols())),
            Self::StateVector(range) => Ok(Shape::Column(range.len())),
            Self::Variable(_)
                | Self::Parameter(_)
                | Self::SpatialVariable(_)
                | Self::FunctionParameter(..) => Ok(Shape::Unknown),
            // inputs only ever take scalar values
            Self::Time | Self::InputParameter(_) => Ok(Shape::Scalar),
            Self::Unary(op, child) => match op {
                UnaryOp::Neg => Ok(child.shape()),
                UnaryOp::Function(func) => match child.shape() {
                    Shape::Matrix(..) => Err(self.error_at(&[0], ShapeMismatch {
                        op: func.name().to_string(),
                        left: child.shape(),
                        right: Shape::Scalar,
                    })),
                    shape => Ok(shape),
                },
                _ => Ok(Shape::Unknown),
            },
            Self::Binary(op, [lhs, rhs]) => Shape::binary(*op, lhs.shape(), rhs.shape())
                .ok_or_else(|| self.error_at(&[0, 1], ShapeMismatch {
                    op: op.symbol().to_string(),
                    left: lhs.shape(),
                    right: rhs.shape(),
                })),
            Self::Sum(terms) => {
                let Some(first) = terms.first() else {
                    return Ok(Shape::Scalar);
                };
                let mut shape = first.shape();
                for (idx, term) in terms.iter().enumerate().skip(1) {
                    shape = Shape::binary(BinaryOp::Add, shape, term.shape())
                        .ok_or_else(|| self.error_at(&[idx.saturating_sub(1), idx], ShapeMismatch {
                            op: "+".to_string(),
                            left: shape,
                            right: term.shape(),
                        }))?;
                }
                Ok(shape)
            },
            Self::Concatenation(children) => {
                Shape::concatenate(children.iter().map(Expr::shape))
                    .ok_or_else(|| {
                        // point at the first child whose shape can't be stacked onto the others
                        let idx = (1..children.len())
                            .find(|&idx| Shape::concatenate(children[..=idx].iter().map(Expr::shape)).is_none())
                            .unwrap_or(0);
                        self.error_at(&[idx.saturating_sub(1), idx], ShapeMismatch {
                            op: "concatenation".to_string(),
                            left: children[idx.saturating_sub(1)].shape(),
                            right: children[idx].shape(),
                        })
                    })
            },
        }
    }
}

/// A node of the expression tree, along with information cached when it was built.
#[derive(Debug)]
struct Node {
    kind: ExprKind,
    domain: Domain,
    shape: Shape,

    /// True if the domain was set explicitly instead of derived from the children, and must be
    /// kept when the node is rebuilt with new children.
    pinned_domain: bool,

    /// True if the node contains only constant leaves and no spatial operators.
    constant: bool,

    /// Structural hash of the node and all its descendants.
    hash: u64,
}

/// An immutable, shareable expression tree.
///
/// For more information about this type, see the [module-level documentation](self).
#[derive(Clone)]
pub struct Expr(Arc<Node>);

impl Expr {
    /// Builds a node from its kind, domain and shape, computing the cached information.
    fn build(kind: ExprKind, domain: Domain, shape: Shape, pinned_domain: bool) -> Self {
        let mut hasher = DefaultHasher::new();
        kind.hash_payload(&mut hasher);
        domain.hash(&mut hasher);
        for child in kind.children() {
            hasher.write_u64(child.0.hash);
        }

        let constant = match &kind {
            ExprKind::Scalar(_) | ExprKind::Vector(_) | ExprKind::Matrix(_) => true,
            ExprKind::Unary(op, child) => !op.is_spatial() && child.is_constant(),
            ExprKind::Binary(_, children) => children.iter().all(Expr::is_constant),
            ExprKind::Sum(children)
                | ExprKind::Concatenation(children) => children.iter().all(Expr::is_constant),
            _ => false,
        };

        Self(Arc::new(Node {
            kind,
            domain,
            shape,
            pinned_domain,
            constant,
            hash: hasher.finish(),
        }))
    }

    /// Builds a leaf node on the given domain.
    fn leaf(kind: ExprKind, domain: Domain) -> Self {
        // leaves always have a well-defined shape
        let shape = kind.derive_shape().unwrap_or(Shape::Unknown);
        Self::build(kind, domain, shape, false)
    }

    /// Builds a node of the given kind, deriving its domain and shape from its children.
    ///
    /// Returns [`Err`] if the children have incompatible domains or shapes.
    pub fn from_kind(kind: ExprKind) -> Result<Self, Error> {
        let domain = kind.derive_domain()?;
        let shape = kind.derive_shape()?;
        Ok(Self::build(kind, domain, shape, false))
    }

    /// A number.
    pub fn scalar(value: f64) -> Self {
        Self::leaf(ExprKind::Scalar(value), Domain::empty())
    }

    /// A number broadcast over the given domain.
    pub fn scalar_on(value: f64, domain: impl Into<Domain>) -> Self {
        Self::leaf(ExprKind::Scalar(value), domain.into())
    }

    /// An unknown field over the given domain.
    pub fn variable(name: impl Into<String>, domain: impl Into<Domain>) -> Self {
        Self::leaf(ExprKind::Variable(name.into()), domain.into())
    }

    /// A named parameter.
    pub fn parameter(name: impl Into<String>) -> Self {
        Self::leaf(ExprKind::Parameter(name.into()), Domain::empty())
    }

    /// A parameter supplied at evaluation time.
    pub fn input_parameter(name: impl Into<String>) -> Self {
        Self::leaf(ExprKind::InputParameter(name.into()), Domain::empty())
    }

    /// The time variable.
    pub fn time() -> Self {
        Self::leaf(ExprKind::Time, Domain::empty())
    }

    /// A spatial coordinate over the given domain.
    pub fn spatial_variable(name: impl Into<String>, domain: impl Into<Domain>) -> Self {
        Self::leaf(ExprKind::SpatialVariable(name.into()), domain.into())
    }

    /// A constant column vector.
    pub fn vector(values: DVector<f64>) -> Self {
        Self::leaf(ExprKind::Vector(values), Domain::empty())
    }

    /// A constant column vector over the given domain.
    pub fn vector_on(values: DVector<f64>, domain: impl Into<Domain>) -> Self {
        Self::leaf(ExprKind::Vector(values), domain.into())
    }

    /// A constant sparse matrix.
    pub fn matrix(matrix: CsrMatrix<f64>) -> Self {
        Self::leaf(ExprKind::Matrix(matrix), Domain::empty())
    }

    /// A slice of the state vector, holding the discrete values of a field on the given domain.
    pub fn state_vector(range: Range<usize>, domain: impl Into<Domain>) -> Self {
        Self::leaf(ExprKind::StateVector(range), domain.into())
    }

    /// A named function of the given arguments, resolved by parameter substitution.
    pub fn function_parameter(name: impl Into<String>, args: Vec<Expr>) -> Result<Self, Error> {
        Self::from_kind(ExprKind::FunctionParameter(name.into(), args))
    }

    /// Applies a unary operator.
    pub fn unary(op: UnaryOp, child: Expr) -> Result<Self, Error> {
        Self::from_kind(ExprKind::Unary(op, child))
    }

    /// Applies a binary operator.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Result<Self, Error> {
        Self::from_kind(ExprKind::Binary(op, [lhs, rhs]))
    }

    /// Adds all the given terms together.
    pub fn sum(terms: Vec<Expr>) -> Result<Self, Error> {
        Self::from_kind(ExprKind::Sum(terms))
    }

    /// Concatenates the given children along their domains.
    pub fn concatenation(children: Vec<Expr>) -> Result<Self, Error> {
        Self::from_kind(ExprKind::Concatenation(children))
    }

    /// Raises this expression to the given power.
    pub fn pow(&self, exponent: impl IntoExpr) -> Result<Self, Error> {
        Self::binary(BinaryOp::Pow, self.clone(), exponent.into_expr()?)
    }

    /// Multiplies this matrix-valued expression with the given expression.
    pub fn matmul(&self, rhs: impl IntoExpr) -> Result<Self, Error> {
        Self::binary(BinaryOp::MatMul, self.clone(), rhs.into_expr()?)
    }

    /// Returns a zero with the same shape and domain as this expression.
    pub fn zeros_like(&self) -> Self {
        match self.shape() {
            Shape::Column(n) => Self::vector_on(DVector::zeros(n), self.domain().clone()),
            Shape::Matrix(r, c) => Self::matrix(CsrMatrix::zeros(r, c))
                .with_domain(self.domain().clone()),
            Shape::Scalar | Shape::Unknown => Self::scalar_on(0.0, self.domain().clone()),
        }
    }

    /// Returns a copy of this node on the given domain, instead of the domain derived from its
    /// children. The domain is kept when the node is rebuilt with new children.
    pub fn with_domain(&self, domain: Domain) -> Self {
        if &domain == self.domain() {
            return self.clone();
        }
        Self::build(self.0.kind.clone(), domain, self.shape(), true)
    }

    /// Rebuilds this node with each child replaced by the result of `f`.
    ///
    /// If `f` returns every child unchanged (the same node, not just an equal one), this node is
    /// returned as-is, so untouched sub-trees keep their identity.
    pub fn map_children<F>(&self, mut f: F) -> Result<Self, Error>
    where
        F: FnMut(&Expr) -> Result<Expr, Error>,
    {
        let kind = match &self.0.kind {
            ExprKind::FunctionParameter(name, args) => {
                ExprKind::FunctionParameter(name.clone(), args.iter().map(&mut f).collect::<Result<_, _>>()?)
            },
            ExprKind::Unary(op, child) => ExprKind::Unary(*op, f(child)?),
            ExprKind::Binary(op, [lhs, rhs]) => ExprKind::Binary(*op, [f(lhs)?, f(rhs)?]),
            ExprKind::Sum(terms) => ExprKind::Sum(terms.iter().map(&mut f).collect::<Result<_, _>>()?),
            ExprKind::Concatenation(children) => {
                ExprKind::Concatenation(children.iter().map(&mut f).collect::<Result<_, _>>()?)
            },
            _ => return Ok(self.clone()),
        };

        let unchanged = kind.children().iter()
            .zip(self.children())
            .all(|(new, old)| new.ptr_eq(old));
        if unchanged {
            return Ok(self.clone());
        }

        let expr = Self::from_kind(kind)?;
        if self.0.pinned_domain {
            Ok(expr.with_domain(self.domain().clone()))
        } else {
            Ok(expr)
        }
    }

    /// The kind of this node.
    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    /// The domain this expression is defined over.
    pub fn domain(&self) -> &Domain {
        &self.0.domain
    }

    /// The shape of the value this expression evaluates to.
    pub fn shape(&self) -> Shape {
        self.0.shape
    }

    /// The children of this node, in order.
    pub fn children(&self) -> &[Expr] {
        self.0.kind.children()
    }

    /// Returns true if the expression contains only constant leaves (numbers, vectors and
    /// matrices) and no spatial operators, meaning it can be evaluated without any context.
    pub fn is_constant(&self) -> bool {
        self.0.constant
    }

    /// Returns true if both handles point to the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A key identifying this node (not its structure), used to memoise tree walks over shared
    /// sub-trees.
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Builds an error of the given kind pointing at the whole of this node.
    pub(crate) fn error(&self, kind: impl bamm_error::ErrorKind + 'static) -> Error {
        let text = self.to_string();
        Error::new(vec![0..text.len()], kind).with_source(text)
    }

    /// Builds an error of the given kind pointing at the children with the given indices.
    pub(crate) fn children_error(
        &self,
        children: &[usize],
        kind: impl bamm_error::ErrorKind + 'static,
    ) -> Error {
        self.kind().error_at(children, kind)
    }

    /// If the expression is a [`ExprKind::Scalar`], returns the number.
    pub fn as_scalar(&self) -> Option<f64> {
        match self.0.kind {
            ExprKind::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Returns true if the expression is a constant equal to zero everywhere.
    pub fn is_zero(&self) -> bool {
        match &self.0.kind {
            ExprKind::Scalar(value) => *value == 0.0,
            ExprKind::Vector(values) => values.iter().all(|v| *v == 0.0),
            ExprKind::Matrix(matrix) => matrix.values().iter().all(|v| *v == 0.0),
            _ => false,
        }
    }

    /// Returns true if the expression is the scalar one.
    pub fn is_one(&self) -> bool {
        self.as_scalar() == Some(1.0)
    }

    /// If the expression is a [`ExprKind::Variable`], returns its name.
    pub fn as_variable(&self) -> Option<&str> {
        match &self.0.kind {
            ExprKind::Variable(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the number of nodes in the tree, counting shared sub-trees once per reference.
    pub fn size(&self) -> usize {
        self.post_order_iter().count()
    }

    /// Returns true if any node of the tree satisfies the predicate.
    pub fn any(&self, mut predicate: impl FnMut(&Expr) -> bool) -> bool {
        self.post_order_iter().any(|expr| predicate(expr))
    }

    /// Returns the distinct variables in the tree, in the order they are first visited.
    pub fn variables(&self) -> Vec<Expr> {
        let mut variables: Vec<Expr> = Vec::new();
        for expr in self.post_order_iter() {
            if matches!(expr.kind(), ExprKind::Variable(_)) && !variables.contains(expr) {
                variables.push(expr.clone());
            }
        }
        variables
    }

    /// Returns an iterator that traverses the tree of expressions in left-to-right post-order
    /// (i.e. depth-first).
    pub fn post_order_iter(&self) -> ExprIter {
        ExprIter::new(self)
    }
}

/// Checks if two expressions are **structurally** equal.
///
/// For more information about structural equality, see the [module-level documentation](self).
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }

        self.0.hash == other.0.hash
            && self.0.domain == other.0.domain
            && self.0.kind.payload_eq(&other.0.kind)
            && self.children() == other.children()
    }
}

impl Eq for Expr {}

/// Uses the structural hash cached when the node was built.
impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl std::fmt::Debug for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.domain().is_empty() {
            write!(f, "{:?}", self.0.kind)
        } else {
            write!(f, "{:?} on {}", self.0.kind, self.domain())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::symbolic::error::{DomainMismatch, NoSpatialDomain, ShapeMismatch};
    use nalgebra::dvector;
    use pretty_assertions::assert_eq;
    use super::*;

    fn c() -> Expr {
        Expr::variable("c", "negative electrode")
    }

    #[test]
    fn structural_equality() {
        let a = ((c() * 2.0).unwrap() + 1.0).unwrap();
        let b = ((c() * 2.0).unwrap() + 1.0).unwrap();
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);

        // no reordering is considered
        let swapped = (1.0 + (c() * 2.0).unwrap()).unwrap();
        assert_ne!(a, swapped);
    }

    #[test]
    fn domain_mismatch_at_construction() {
        let c_p = Expr::variable("c_p", "positive electrode");
        let err = (c() * &c_p).unwrap_err();
        let kind = err.downcast_ref::<DomainMismatch>().unwrap();
        assert_eq!(kind.left, Domain::from("negative electrode"));
        assert_eq!(kind.right, Domain::from("positive electrode"));
        assert_eq!(err.source, "c * c_p");
        assert_eq!(err.spans, vec![0..1, 4..7]);
    }

    #[test]
    fn domain_mismatch_in_sum() {
        let c_p = Expr::variable("c_p", "positive electrode");
        let err = Expr::sum(vec![Expr::scalar(1.0), c(), c_p]).unwrap_err();
        assert!(err.is::<DomainMismatch>());
        assert_eq!(err.source, "1 + c + c_p");
        assert_eq!(err.spans, vec![4..5, 8..11]);
    }

    #[test]
    fn domain_of_spatial_operators() {
        let flux = grad(c()).unwrap();
        assert_eq!(flux.domain(), &Domain::from("negative electrode"));

        let surface = boundary_value(c(), Side::Right).unwrap();
        assert!(surface.domain().is_empty());

        let err = grad(Expr::parameter("D")).unwrap_err();
        assert!(err.is::<NoSpatialDomain>());
    }

    #[test]
    fn concatenation_domains() {
        let c_n = c();
        let c_s = Expr::variable("c_s", "separator");
        let joined = concatenation([c_n.clone(), c_s]).unwrap();
        assert_eq!(joined.domain(), &Domain::from(["negative electrode", "separator"]));

        let err = concatenation([c_n.clone(), c_n]).unwrap_err();
        assert!(err.is::<DomainMismatch>());
    }

    #[test]
    fn shape_mismatch_at_construction() {
        let a = Expr::vector(dvector![1.0, 2.0, 3.0]);
        let b = Expr::vector(dvector![1.0, 2.0]);
        let err = (&a + &b).unwrap_err();
        assert!(err.is::<ShapeMismatch>());

        let y = Expr::state_vector(0..3, Domain::empty());
        assert_eq!((&a * &y).unwrap().shape(), Shape::Column(3));
    }

    #[test]
    fn sum_of_matrices() {
        let terms = vec![
            Expr::matrix(CsrMatrix::identity(3)),
            Expr::matrix(CsrMatrix::identity(3)),
            Expr::matrix(CsrMatrix::identity(3)),
        ];
        assert_eq!(Expr::sum(terms).unwrap().shape(), Shape::Matrix(3, 3));

        let err = Expr::sum(vec![Expr::matrix(CsrMatrix::identity(3)), Expr::scalar(1.0)]).unwrap_err();
        assert!(err.is::<ShapeMismatch>());
    }

    #[test]
    fn input_parameters_are_scalar() {
        let k = Expr::input_parameter("k");
        assert_eq!(k.shape(), Shape::Scalar);
        assert_eq!((&k * Expr::matrix(CsrMatrix::identity(2))).unwrap().shape(), Shape::Matrix(2, 2));
    }

    #[test]
    fn map_children_keeps_identity() {
        let expr = ((c() * 2.0).unwrap() + 1.0).unwrap();
        let same = expr.map_children(|child| Ok(child.clone())).unwrap();
        assert!(same.ptr_eq(&expr));

        let replaced = expr.map_children(|child| match child.as_scalar() {
            Some(_) => Ok(Expr::scalar(5.0)),
            None => Ok(child.clone()),
        }).unwrap();
        assert_eq!(replaced, ((c() * 2.0).unwrap() + 5.0).unwrap());
        // the untouched left operand is shared
        assert!(replaced.children()[0].ptr_eq(&expr.children()[0]));
    }

    #[test]
    fn pinned_domain_survives_rebuild() {
        let c_p = Expr::variable("c_p", "positive particle");
        let row = Expr::matrix(CsrMatrix::identity(1));
        let y = Expr::state_vector(0..1, "positive particle");
        let surface = row.matmul(&y).unwrap().with_domain(Domain::empty());
        let wrapped = (&surface * 2.0).unwrap();
        let rebuilt = wrapped.map_children(|child| child.map_children(|leaf| {
            if leaf.ptr_eq(&y) { Ok(Expr::state_vector(0..1, c_p.domain().clone())) } else { Ok(leaf.clone()) }
        })).unwrap();
        assert!(rebuilt.domain().is_empty());
    }

    #[test]
    fn variables_are_collected_once() {
        let d = Expr::variable("d", "negative electrode");
        let expr = ((c() * &d).unwrap() + &c()).unwrap();
        assert_eq!(expr.variables(), vec![c(), d]);
    }
}
