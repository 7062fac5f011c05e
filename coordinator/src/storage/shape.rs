use std::{
    error::Error,
    fmt::{self, Display},
};

use super::Matrix;

/// The dimensions shared by every tensor of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
    pub bias_len: usize,
}

impl Shape {
    /// Computes the dimensions of a matrix, refusing ragged ones.
    ///
    /// # Arguments
    /// * `tensor` - The name of the matrix, used for error reporting.
    /// * `matrix` - The matrix to measure.
    ///
    /// # Returns
    /// The `(rows, cols)` pair or a `ShapeErr::RaggedMatrix`.
    pub(super) fn matrix_dims(
        tensor: &'static str,
        matrix: &Matrix,
    ) -> Result<(usize, usize), ShapeErr> {
        let cols = matrix.first().map_or(0, Vec::len);

        match matrix.iter().position(|row| row.len() != cols) {
            Some(row) => Err(ShapeErr::RaggedMatrix {
                tensor,
                row,
                expected: cols,
                got: matrix[row].len(),
            }),
            None => Ok((matrix.len(), cols)),
        }
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}] / [{}]", self.rows, self.cols, self.bias_len)
    }
}

/// Error returned whenever a tensor doesn't have the shape it is required to have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeErr {
    RaggedMatrix {
        tensor: &'static str,
        row: usize,
        expected: usize,
        got: usize,
    },
    MatrixShape {
        tensor: &'static str,
        expected: (usize, usize),
        got: (usize, usize),
    },
    BiasLength {
        tensor: &'static str,
        expected: usize,
        got: usize,
    },
}

impl Display for ShapeErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RaggedMatrix {
                tensor,
                row,
                expected,
                got,
            } => write!(
                f,
                "shape mismatch: {tensor} row {row} has {got} columns, expected {expected}"
            ),
            Self::MatrixShape {
                tensor,
                expected: (er, ec),
                got: (gr, gc),
            } => write!(
                f,
                "shape mismatch: {tensor} is [{gr}][{gc}], expected [{er}][{ec}]"
            ),
            Self::BiasLength {
                tensor,
                expected,
                got,
            } => write!(
                f,
                "shape mismatch: {tensor} has length {got}, expected {expected}"
            ),
        }
    }
}

impl Error for ShapeErr {}
