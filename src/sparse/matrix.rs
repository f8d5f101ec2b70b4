use std::sync::Arc;

use crate::error::{ConsistencyError, Result};
use crate::float::Float;
use crate::sparse::SparsityPattern;

/// How a value is combined with the entry already stored in a matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InsertMode {
    /// Overwrite the stored value.
    #[default]
    Insert,
    /// Add to the stored value.
    Add,
}

impl InsertMode {
    #[inline]
    pub(crate) fn apply<F: Float>(self, slot: &mut F, value: F) {
        match self {
            InsertMode::Insert => *slot = value,
            InsertMode::Add => *slot = *slot + value,
        }
    }
}

/// CSR matrix whose structure is fixed by a [`SparsityPattern`].
///
/// Values exist only on the pattern support; writing outside it is an error.
/// The pattern is shared, so matrices created by one engine are cheap to clone.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix<F> {
    pattern: Arc<SparsityPattern>,
    values: Vec<F>,
}

impl<F: Float> SparseMatrix<F> {
    /// Zero matrix on `pattern`.
    pub fn from_pattern(pattern: Arc<SparsityPattern>) -> Self {
        let values = vec![F::zero(); pattern.nnz()];
        SparseMatrix { pattern, values }
    }

    pub fn pattern(&self) -> &SparsityPattern {
        &self.pattern
    }

    pub(crate) fn shares_pattern(&self, pattern: &Arc<SparsityPattern>) -> bool {
        Arc::ptr_eq(&self.pattern, pattern) || *self.pattern == **pattern
    }

    pub fn nrows(&self) -> usize {
        self.pattern.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.pattern.ncols()
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Stored values in CSR order.
    pub fn values(&self) -> &[F] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [F] {
        &mut self.values
    }

    /// Entry `(i, j)`; zero off the support.
    pub fn get(&self, i: usize, j: usize) -> F {
        self.pattern
            .position(i, j)
            .map_or_else(F::zero, |k| self.values[k])
    }

    /// Write `value` at `(i, j)` with `mode`.
    ///
    /// # Errors
    ///
    /// [`ConsistencyError::PatternMismatch`] if `(i, j)` is not in the pattern.
    pub fn insert(&mut self, i: usize, j: usize, value: F, mode: InsertMode) -> Result<()> {
        let Some(k) = self.pattern.position(i, j) else {
            return Err(ConsistencyError::PatternMismatch(format!(
                "entry ({i}, {j}) is outside the matrix pattern"
            ))
            .into());
        };
        mode.apply(&mut self.values[k], value);
        Ok(())
    }

    /// `(column, value)` pairs of row `i`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, F)> + '_ {
        let start = self.pattern.row_ptr()[i];
        self.pattern
            .row(i)
            .iter()
            .zip(&self.values[start..])
            .map(|(&j, &v)| (j, v))
    }

    /// All stored entries as `(row, col, value)` in row-major order.
    pub fn triplets(&self) -> Vec<(usize, usize, F)> {
        self.pattern
            .iter()
            .zip(&self.values)
            .map(|((i, j), &v)| (i, j, v))
            .collect()
    }

    /// Dense row-major copy.
    pub fn to_dense(&self) -> Vec<Vec<F>> {
        let mut dense = vec![vec![F::zero(); self.ncols()]; self.nrows()];
        for (i, j, v) in self.triplets() {
            dense[i][j] = v;
        }
        dense
    }

    /// Main diagonal (length `min(m, n)`), zero where not stored.
    pub fn diagonal(&self) -> Vec<F> {
        (0..self.nrows().min(self.ncols()))
            .map(|i| self.get(i, i))
            .collect()
    }

    /// `y = A x`.
    pub fn matvec(&self, x: &[F]) -> Result<Vec<F>> {
        crate::error::check_len("matvec input", self.ncols(), x.len())?;
        Ok((0..self.nrows())
            .map(|i| {
                self.row(i)
                    .fold(F::zero(), |acc, (j, v)| acc + v * x[j])
            })
            .collect())
    }

    /// Reset every stored value to zero, keeping the structure.
    pub fn fill_zero(&mut self) {
        self.values.fill(F::zero());
    }

    /// Convert to a `nalgebra_sparse::CsrMatrix` with the same structure.
    #[cfg(feature = "nalgebra")]
    pub fn to_csr(&self) -> Result<nalgebra_sparse::CsrMatrix<F>>
    where
        F: nalgebra::Scalar,
    {
        nalgebra_sparse::CsrMatrix::try_from_csr_data(
            self.nrows(),
            self.ncols(),
            self.pattern.row_ptr().to_vec(),
            self.pattern.col_indices().to_vec(),
            self.values.clone(),
        )
        .map_err(|e| crate::Error::from(ConsistencyError::PatternMismatch(e.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_three() -> SparseMatrix<f64> {
        let p = SparsityPattern::from_rows(3, vec![vec![0, 2], vec![1]]).unwrap();
        SparseMatrix::from_pattern(Arc::new(p))
    }

    #[test]
    fn insert_then_add() {
        let mut a = two_by_three();
        a.insert(0, 2, 4.0, InsertMode::Insert).unwrap();
        a.insert(0, 2, 0.5, InsertMode::Add).unwrap();
        assert_eq!(a.get(0, 2), 4.5);
        assert_eq!(a.get(1, 0), 0.0);
        assert!(a.insert(1, 0, 1.0, InsertMode::Insert).is_err());
    }

    #[test]
    fn matvec_uses_support_only() {
        let mut a = two_by_three();
        a.values_mut().copy_from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(a.matvec(&[1.0, 1.0, 1.0]).unwrap(), vec![3.0, 3.0]);
        assert_eq!(a.to_dense(), vec![vec![1.0, 0.0, 2.0], vec![0.0, 3.0, 0.0]]);
        assert_eq!(a.diagonal(), vec![1.0, 3.0]);
    }
}
