use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::fmt::{Display, Formatter};
use crate::symbolic::{BinaryOp, Func, Shape};

/// The value a discretised expression evaluates to.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single number, broadcast against anything it is combined with.
    Scalar(f64),

    /// A dense column vector.
    Vector(DVector<f64>),

    /// A sparse matrix, usually a block of a Jacobian.
    Matrix(CsrMatrix<f64>),
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(value)
    }
}

impl From<DVector<f64>> for Value {
    fn from(value: DVector<f64>) -> Self {
        Value::Vector(value)
    }
}

impl From<CsrMatrix<f64>> for Value {
    fn from(value: CsrMatrix<f64>) -> Self {
        Value::Matrix(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Scalar(value) => write!(f, "{}", value),
            Value::Vector(values) => {
                let items = values.iter().map(f64::to_string).collect::<Vec<_>>();
                write!(f, "[{}]", items.join(", "))
            },
            Value::Matrix(matrix) => write!(f, "matrix({}x{}, {} non-zeros)", matrix.nrows(), matrix.ncols(), matrix.nnz()),
        }
    }
}

/// Returns a copy of the matrix with every stored value mapped through `f`.
fn map_values(matrix: &CsrMatrix<f64>, f: impl Fn(f64) -> f64) -> CsrMatrix<f64> {
    let mut matrix = matrix.clone();
    matrix.values_mut().iter_mut().for_each(|v| *v = f(*v));
    matrix
}

/// Returns a copy of the matrix with row `i` mapped through `f(row_factor[i], value)`.
fn map_rows(matrix: &CsrMatrix<f64>, factors: &DVector<f64>, f: impl Fn(f64, f64) -> f64) -> CsrMatrix<f64> {
    let mut matrix = matrix.clone();
    for (mut row, factor) in matrix.row_iter_mut().zip(factors.iter()) {
        row.values_mut().iter_mut().for_each(|v| *v = f(*factor, *v));
    }
    matrix
}

/// Sparse matrix-vector product.
pub fn mat_vec(matrix: &CsrMatrix<f64>, vector: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(
        matrix.nrows(),
        matrix.row_iter().map(|row| {
            row.col_indices()
                .iter()
                .zip(row.values())
                .map(|(&col, value)| value * vector[col])
                .sum::<f64>()
        }),
    )
}

/// Stacks sparse matrices with the same number of columns vertically.
pub fn vstack(blocks: &[CsrMatrix<f64>]) -> Option<CsrMatrix<f64>> {
    let ncols = blocks.first().map(|b| b.ncols()).unwrap_or(0);
    if blocks.iter().any(|b| b.ncols() != ncols) {
        return None;
    }

    let nrows = blocks.iter().map(|b| b.nrows()).sum();
    let mut coo = CooMatrix::new(nrows, ncols);
    let mut offset = 0;
    for block in blocks {
        for (i, j, v) in block.triplet_iter() {
            coo.push(offset + i, j, *v);
        }
        offset += block.nrows();
    }
    Some(CsrMatrix::from(&coo))
}

impl Value {
    /// The shape of the value.
    pub fn shape(&self) -> Shape {
        match self {
            Value::Scalar(_) => Shape::Scalar,
            Value::Vector(values) => Shape::Column(values.len()),
            Value::Matrix(matrix) => Shape::Matrix(matrix.nrows(), matrix.ncols()),
        }
    }

    /// Returns the number if the value is a scalar.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    /// Converts the value into a vector with the given number of rows, broadcasting scalars.
    ///
    /// Returns [`None`] if the value is a matrix, or a vector of a different length.
    pub fn into_vector(self, rows: usize) -> Option<DVector<f64>> {
        match self {
            Value::Scalar(value) => Some(DVector::from_element(rows, value)),
            Value::Vector(values) if values.len() == rows => Some(values),
            _ => None,
        }
    }

    /// Converts the value into a sparse matrix with the given shape. A scalar zero is an empty
    /// matrix; any other scalar is broadcast into a dense block.
    ///
    /// Returns [`None`] if the value is a vector, or a matrix of a different shape.
    pub fn into_matrix(self, rows: usize, cols: usize) -> Option<CsrMatrix<f64>> {
        match self {
            Value::Scalar(value) if value == 0.0 => Some(CsrMatrix::zeros(rows, cols)),
            Value::Scalar(value) => {
                let mut coo = CooMatrix::new(rows, cols);
                for i in 0..rows {
                    for j in 0..cols {
                        coo.push(i, j, value);
                    }
                }
                Some(CsrMatrix::from(&coo))
            },
            Value::Matrix(matrix) if matrix.nrows() == rows && matrix.ncols() == cols => Some(matrix),
            _ => None,
        }
    }

    /// Returns true if every number stored in the value is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Scalar(value) => value.is_finite(),
            Value::Vector(values) => values.iter().all(|v| v.is_finite()),
            Value::Matrix(matrix) => matrix.values().iter().all(|v| v.is_finite()),
        }
    }

    /// Applies `-x`.
    pub fn neg(&self) -> Value {
        match self {
            Value::Scalar(value) => Value::Scalar(-value),
            Value::Vector(values) => Value::Vector(-values),
            Value::Matrix(matrix) => Value::Matrix(map_values(matrix, |v| -v)),
        }
    }

    /// Applies an elementary function element-wise. Returns [`None`] for matrices.
    pub fn apply(&self, func: Func) -> Option<Value> {
        match self {
            Value::Scalar(value) => Some(Value::Scalar(func.apply(*value))),
            Value::Vector(values) => Some(Value::Vector(values.map(|v| func.apply(v)))),
            Value::Matrix(_) => None,
        }
    }

    /// Applies a binary operator. Returns [`None`] if the shapes of the operands are
    /// incompatible.
    pub fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Option<Value> {
        use Value::*;

        if op == BinaryOp::MatMul {
            return match (lhs, rhs) {
                (Scalar(a), Scalar(b)) => Some(Scalar(a * b)),
                (Matrix(m), Vector(v)) if m.ncols() == v.len() => Some(Vector(mat_vec(m, v))),
                (Matrix(a), Matrix(b)) if a.ncols() == b.nrows() => Some(Matrix(a * b)),
                _ => None,
            };
        }

        // single-row vectors broadcast like scalars against anything with more rows
        let rows = |value: &Value| match value {
            Scalar(_) => 1,
            Vector(v) => v.len(),
            Matrix(m) => m.nrows(),
        };
        let broadcast;
        let (lhs, rhs) = match (lhs, rhs) {
            (Vector(v), other) if v.len() == 1 && rows(other) != 1 => {
                broadcast = Scalar(v[0]);
                (&broadcast, other)
            },
            (other, Vector(v)) if v.len() == 1 && rows(other) != 1 => {
                broadcast = Scalar(v[0]);
                (other, &broadcast)
            },
            _ => (lhs, rhs),
        };

        let apply = |a: f64, b: f64| op.apply(a, b);
        match (lhs, rhs) {
            (Scalar(a), Scalar(b)) => Some(Scalar(apply(*a, *b))),
            (Scalar(a), Vector(b)) => Some(Vector(b.map(|b| apply(*a, b)))),
            (Vector(a), Scalar(b)) => Some(Vector(a.map(|a| apply(a, *b)))),
            (Vector(a), Vector(b)) if a.len() == b.len() => {
                Some(Vector(a.zip_map(b, apply)))
            },
            (Matrix(a), Matrix(b)) if a.nrows() == b.nrows() && a.ncols() == b.ncols() => match op {
                BinaryOp::Add => Some(Matrix(a + b)),
                BinaryOp::Sub => Some(Matrix(a - b)),
                _ => None,
            },
            (Scalar(s), Matrix(m)) => match op {
                BinaryOp::Mul => Some(Matrix(map_values(m, |v| s * v))),
                // a zero scalar leaves the matrix unchanged
                BinaryOp::Add if *s == 0.0 => Some(Matrix(m.clone())),
                BinaryOp::Sub if *s == 0.0 => Some(Matrix(map_values(m, |v| -v))),
                _ => None,
            },
            (Matrix(m), Scalar(s)) => match op {
                BinaryOp::Mul => Some(Matrix(map_values(m, |v| v * s))),
                BinaryOp::Div => Some(Matrix(map_values(m, |v| v / s))),
                BinaryOp::Add | BinaryOp::Sub if *s == 0.0 => Some(Matrix(m.clone())),
                _ => None,
            },
            (Vector(d), Matrix(m)) if op == BinaryOp::Mul && d.len() == m.nrows() => {
                Some(Matrix(map_rows(m, d, |d, v| d * v)))
            },
            (Matrix(m), Vector(d)) if d.len() == m.nrows() => match op {
                BinaryOp::Mul => Some(Matrix(map_rows(m, d, |d, v| v * d))),
                BinaryOp::Div => Some(Matrix(map_rows(m, d, |d, v| v / d))),
                _ => None,
            },
            _ => None,
        }
    }

    /// Stacks values vertically. Scalars and vectors stack into a vector; matrices (and scalar
    /// zeros, standing for empty blocks) stack into a matrix.
    ///
    /// Returns [`None`] if the values cannot be stacked.
    pub fn concatenate(values: Vec<Value>) -> Option<Value> {
        use Value::*;

        let ncols = values.iter().find_map(|value| match value {
            Matrix(m) => Some(m.ncols()),
            _ => None,
        });

        match ncols {
            None => {
                let mut stacked = Vec::new();
                for value in values {
                    match value {
                        Scalar(v) => stacked.push(v),
                        Vector(v) => stacked.extend(v.iter()),
                        Matrix(_) => return None,
                    }
                }
                Some(Vector(DVector::from_vec(stacked)))
            },
            Some(ncols) => {
                let blocks = values.into_iter()
                    .map(|value| match value {
                        Scalar(v) if v == 0.0 => Some(CsrMatrix::zeros(1, ncols)),
                        Matrix(m) => Some(m),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()?;
                vstack(&blocks).map(Matrix)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::dvector;
    use pretty_assertions::assert_eq;
    use super::*;

    fn laplacian(n: usize) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(n, n);
        for i in 0..n {
            coo.push(i, i, -2.0);
            if i > 0 {
                coo.push(i, i - 1, 1.0);
            }
            if i + 1 < n {
                coo.push(i, i + 1, 1.0);
            }
        }
        CsrMatrix::from(&coo)
    }

    #[test]
    fn sparse_mat_vec() {
        let m = laplacian(4);
        let v = dvector![1.0, 2.0, 3.0, 4.0];
        assert_eq!(mat_vec(&m, &v), dvector![0.0, 0.0, 0.0, -5.0]);
    }

    #[test]
    fn broadcast_scalar() {
        let v = Value::Vector(dvector![1.0, 2.0]);
        let result = Value::binary(BinaryOp::Sub, &Value::Scalar(3.0), &v).unwrap();
        assert_eq!(result, Value::Vector(dvector![2.0, 1.0]));
    }

    #[test]
    fn row_scaling() {
        let m = Value::Matrix(laplacian(3));
        let d = Value::Vector(dvector![1.0, 2.0, 3.0]);
        let Value::Matrix(scaled) = Value::binary(BinaryOp::Mul, &d, &m).unwrap() else {
            panic!("expected a matrix");
        };
        let dense = nalgebra::DMatrix::from(&scaled);
        assert_eq!(dense[(1, 1)], -4.0);
        assert_eq!(dense[(2, 1)], 3.0);
    }

    #[test]
    fn broadcast_single_row() {
        let bv = Value::Vector(dvector![2.0]);
        let v = Value::Vector(dvector![1.0, 2.0, 3.0]);
        let result = Value::binary(BinaryOp::Mul, &bv, &v).unwrap();
        assert_eq!(result, Value::Vector(dvector![2.0, 4.0, 6.0]));
    }

    #[test]
    fn shape_mismatch() {
        let a = Value::Vector(dvector![1.0, 2.0]);
        let b = Value::Vector(dvector![1.0, 2.0, 3.0]);
        assert!(Value::binary(BinaryOp::Add, &a, &b).is_none());
        assert!(Value::binary(BinaryOp::MatMul, &a, &b).is_none());
    }

    #[test]
    fn concatenate_blocks() {
        let stacked = Value::concatenate(vec![
            Value::Matrix(CsrMatrix::identity(2)),
            Value::Scalar(0.0),
        ]).unwrap();
        assert_eq!(stacked.shape(), Shape::Matrix(3, 2));

        let stacked = Value::concatenate(vec![Value::Scalar(1.0), Value::Vector(dvector![2.0, 3.0])]).unwrap();
        assert_eq!(stacked, Value::Vector(dvector![1.0, 2.0, 3.0]));
    }
}
