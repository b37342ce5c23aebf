//! Shapes of the values expressions evaluate to.
//!
//! Symbolic leaves (variables, parameters) have an [`Shape::Unknown`] shape until they are
//! discretised. Discrete leaves (vectors, matrices, state vector slices) know their shape, and
//! every composite node derives its shape from its children when it is built, so shape conflicts
//! are caught at construction time instead of evaluation time.

use std::fmt;
use super::expr::BinaryOp;

/// The shape of the value an expression evaluates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A single number, broadcast against anything it is combined with.
    Scalar,

    /// A column vector with the given number of rows.
    Column(usize),

    /// A (sparse) matrix with the given number of rows and columns.
    Matrix(usize, usize),

    /// The shape is not known yet (the expression contains symbolic leaves).
    Unknown,
}

impl Shape {
    /// Returns the number of rows of the value, if known. Scalars have one row.
    pub fn rows(&self) -> Option<usize> {
        match self {
            Self::Scalar => Some(1),
            Self::Column(n) | Self::Matrix(n, _) => Some(*n),
            Self::Unknown => None,
        }
    }

    /// Returns true if the shape is known.
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Computes the shape of applying the given binary operator to values of shapes `lhs` and
    /// `rhs`. Returns [`None`] if the shapes are incompatible.
    pub fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Option<Self> {
        use Shape::*;

        if op == BinaryOp::MatMul {
            return match (lhs, rhs) {
                (Unknown, _) | (_, Unknown) => Some(Unknown),
                (Matrix(r, c), Column(n)) if c == n => Some(Column(r)),
                (Matrix(r, c), Matrix(n, k)) if c == n => Some(Matrix(r, k)),
                _ => None,
            };
        }

        match (lhs, rhs) {
            (Unknown, _) | (_, Unknown) => Some(Unknown),
            (Scalar, Scalar) => Some(Scalar),
            (Scalar, Column(n)) | (Column(n), Scalar) => Some(Column(n)),
            (Column(a), Column(b)) if a == b => Some(Column(a)),
            // single-row values (boundary values, integrals) broadcast like scalars
            (Column(1), Column(n)) | (Column(n), Column(1)) => Some(Column(n)),
            _ => match op {
                BinaryOp::Add | BinaryOp::Sub => match (lhs, rhs) {
                    (Matrix(a, b), Matrix(c, d)) if a == c && b == d => Some(lhs),
                    _ => None,
                },
                BinaryOp::Mul => match (lhs, rhs) {
                    (Scalar, Matrix(..)) => Some(rhs),
                    (Matrix(..), Scalar) => Some(lhs),
                    // row scaling of a Jacobian block
                    (Column(n), Matrix(r, _)) if n == r => Some(rhs),
                    (Matrix(r, _), Column(n)) if n == r => Some(lhs),
                    (Column(1), Matrix(..)) => Some(rhs),
                    (Matrix(..), Column(1)) => Some(lhs),
                    _ => None,
                },
                BinaryOp::Div => match (lhs, rhs) {
                    (Matrix(..), Scalar | Column(1)) => Some(lhs),
                    (Matrix(r, _), Column(n)) if n == r => Some(lhs),
                    _ => None,
                },
                BinaryOp::Pow | BinaryOp::MatMul => None,
            },
        }
    }

    /// Computes the shape of stacking values of the given shapes vertically. Scalars are treated
    /// as single-row columns. Returns [`None`] if the shapes cannot be stacked.
    pub fn concatenate(shapes: impl IntoIterator<Item = Self>) -> Option<Self> {
        let mut result: Option<Self> = None;
        for shape in shapes {
            let shape = match shape {
                Self::Scalar => Self::Column(1),
                other => other,
            };
            result = Some(match (result, shape) {
                (None, shape) => shape,
                (Some(Self::Unknown), _) | (_, Self::Unknown) => Self::Unknown,
                (Some(Self::Column(a)), Self::Column(b)) => Self::Column(a + b),
                (Some(Self::Matrix(a, c)), Self::Matrix(b, d)) if c == d => Self::Matrix(a + b, c),
                _ => return None,
            });
        }
        Some(result.unwrap_or(Self::Column(0)))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::Column(n) => write!(f, "column({})", n),
            Self::Matrix(r, c) => write!(f, "matrix({}x{})", r, c),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_scalars() {
        assert_eq!(Shape::binary(BinaryOp::Add, Shape::Scalar, Shape::Column(4)), Some(Shape::Column(4)));
        assert_eq!(Shape::binary(BinaryOp::Mul, Shape::Scalar, Shape::Matrix(2, 3)), Some(Shape::Matrix(2, 3)));
    }

    #[test]
    fn broadcast_single_rows() {
        assert_eq!(Shape::binary(BinaryOp::Mul, Shape::Column(1), Shape::Column(4)), Some(Shape::Column(4)));
        assert_eq!(Shape::binary(BinaryOp::Mul, Shape::Column(1), Shape::Matrix(4, 8)), Some(Shape::Matrix(4, 8)));
    }

    #[test]
    fn column_mismatch() {
        assert_eq!(Shape::binary(BinaryOp::Add, Shape::Column(3), Shape::Column(4)), None);
        assert_eq!(Shape::binary(BinaryOp::Add, Shape::Scalar, Shape::Matrix(3, 3)), None);
    }

    #[test]
    fn matmul_inner_dimension() {
        assert_eq!(Shape::binary(BinaryOp::MatMul, Shape::Matrix(4, 3), Shape::Column(3)), Some(Shape::Column(4)));
        assert_eq!(Shape::binary(BinaryOp::MatMul, Shape::Matrix(4, 3), Shape::Column(4)), None);
        assert_eq!(Shape::binary(BinaryOp::MatMul, Shape::Matrix(4, 3), Shape::Matrix(3, 7)), Some(Shape::Matrix(4, 7)));
    }

    #[test]
    fn row_scaling() {
        assert_eq!(Shape::binary(BinaryOp::Mul, Shape::Column(5), Shape::Matrix(5, 9)), Some(Shape::Matrix(5, 9)));
        assert_eq!(Shape::binary(BinaryOp::Div, Shape::Column(5), Shape::Matrix(5, 9)), None);
    }

    #[test]
    fn stack() {
        assert_eq!(Shape::concatenate([Shape::Column(3), Shape::Scalar, Shape::Column(2)]), Some(Shape::Column(6)));
        assert_eq!(Shape::concatenate([Shape::Matrix(3, 4), Shape::Matrix(1, 4)]), Some(Shape::Matrix(4, 4)));
        assert_eq!(Shape::concatenate([Shape::Matrix(3, 4), Shape::Column(1)]), None);
    }
}
