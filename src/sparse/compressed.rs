use std::fmt;

use crate::error::{ConfigurationError, Result};
use crate::float::Float;
use crate::sparse::SeedMatrix;

/// Dense row-major block produced by a compressed sweep.
///
/// For column compression this is `Jc = J S` (`m x p`); for row compression
/// it is `(W^T J)^T` (`n x p`).
#[derive(Clone, Debug, PartialEq)]
pub struct CompressedJacobian<F> {
    nrows: usize,
    ncols: usize,
    data: Vec<F>,
}

impl<F: Float> CompressedJacobian<F> {
    /// Wrap a row-major buffer of length `nrows * ncols`.
    pub fn from_vec(nrows: usize, ncols: usize, data: Vec<F>) -> Result<Self> {
        if data.len() != nrows * ncols {
            return Err(ConfigurationError::DimensionMismatch {
                what: "compressed Jacobian data",
                expected: nrows * ncols,
                actual: data.len(),
            }
            .into());
        }
        Ok(CompressedJacobian { nrows, ncols, data })
    }

    /// `dense * seed` for a dense row-major matrix.
    ///
    /// Reference compression used to check sweeps and recovery against a
    /// known Jacobian.
    pub fn compress(dense: &[Vec<F>], seed: &SeedMatrix) -> Result<Self> {
        let p = seed.ncols();
        let mut data = vec![F::zero(); dense.len() * p];
        for (i, row) in dense.iter().enumerate() {
            crate::error::check_len("dense row", seed.nrows(), row.len())?;
            for (j, &v) in row.iter().enumerate() {
                for c in 0..p {
                    if seed.get(j, c) {
                        data[i * p + c] = data[i * p + c] + v;
                    }
                }
            }
        }
        Self::from_vec(dense.len(), p, data)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of lanes (colours).
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn get(&self, i: usize, c: usize) -> F {
        self.data[i * self.ncols + c]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[F] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }

    pub fn as_slice(&self) -> &[F] {
        &self.data
    }

    /// Split rows `0..at` from `at..nrows`.
    ///
    /// A row-compressed block of `F(x, xdot)` over the stacked input has the
    /// `x` rows first and the `xdot` rows after them.
    pub fn split_rows(self, at: usize) -> (Self, Self) {
        let at = at.min(self.nrows);
        let mut head = self.data;
        let tail = head.split_off(at * self.ncols);
        (
            CompressedJacobian {
                nrows: at,
                ncols: self.ncols,
                data: head,
            },
            CompressedJacobian {
                nrows: self.nrows - at,
                ncols: self.ncols,
                data: tail,
            },
        )
    }

    /// Convert to a `nalgebra::DMatrix`.
    #[cfg(feature = "nalgebra")]
    pub fn to_dmatrix(&self) -> nalgebra::DMatrix<F>
    where
        F: nalgebra::Scalar,
    {
        nalgebra::DMatrix::from_row_slice(self.nrows, self.ncols, &self.data)
    }
}

impl<F: Float> fmt::Display for CompressedJacobian<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "compressed Jacobian {} x {}", self.nrows, self.ncols)?;
        for i in 0..self.nrows {
            write!(f, "{i:>6}:")?;
            for v in self.row(i) {
                write!(f, " {v:>12.6}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::Coloring;

    #[test]
    fn compress_sums_colour_classes() {
        let dense = vec![vec![1.0, 0.0, 2.0], vec![0.0, 3.0, 0.0]];
        let seed = SeedMatrix::from_coloring(&Coloring::from_colors(vec![0, 0, 1]));
        let jc = CompressedJacobian::compress(&dense, &seed).unwrap();
        assert_eq!(jc.row(0), &[1.0, 2.0]);
        assert_eq!(jc.row(1), &[3.0, 0.0]);
    }

    #[test]
    fn split_keeps_width() {
        let jc = CompressedJacobian::from_vec(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let (a, b) = jc.split_rows(1);
        assert_eq!(a.nrows(), 1);
        assert_eq!(b.row(1), &[5.0, 6.0]);
        assert!(CompressedJacobian::<f64>::from_vec(2, 2, vec![0.0]).is_err());
    }
}
