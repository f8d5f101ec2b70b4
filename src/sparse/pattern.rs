use std::collections::BTreeSet;

use crate::error::{ConfigurationError, Result};
use crate::trace::TraceId;

/// Jacobian sparsity pattern in compressed-row form.
///
/// Row `i` holds the sorted, duplicate-free column indices that output `i`
/// may depend on. Rows may be empty (constant outputs). Equality compares
/// structure only, not the source trace.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PatternData"))]
pub struct SparsityPattern {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_indices: Vec<usize>,
    #[cfg_attr(feature = "serde", serde(skip))]
    source: Option<TraceId>,
}

impl SparsityPattern {
    /// Pattern with no entries.
    pub fn empty(nrows: usize, ncols: usize) -> Self {
        SparsityPattern {
            nrows,
            ncols,
            row_ptr: vec![0; nrows + 1],
            col_indices: Vec::new(),
            source: None,
        }
    }

    /// `n x n` identity pattern.
    pub fn identity(n: usize) -> Self {
        SparsityPattern {
            nrows: n,
            ncols: n,
            row_ptr: (0..=n).collect(),
            col_indices: (0..n).collect(),
            source: None,
        }
    }

    /// Build from per-row column lists. Columns are sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::InvalidPattern`] if a column index is `>= ncols`.
    pub fn from_rows(ncols: usize, rows: Vec<Vec<usize>>) -> Result<Self> {
        let mut cleaned = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            row.sort_unstable();
            row.dedup();
            if let Some(&last) = row.last() {
                if last >= ncols {
                    return Err(ConfigurationError::InvalidPattern(format!(
                        "row {i} references column {last}, but there are only {ncols} columns"
                    ))
                    .into());
                }
            }
            cleaned.push(row);
        }
        Ok(Self::from_sorted_rows(ncols, cleaned))
    }

    /// Build from compressed-row arrays.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::InvalidPattern`] unless `row_ptr` has
    /// `nrows + 1` non-decreasing offsets from `0` to `col_indices.len()` and
    /// every row is strictly increasing and below `ncols`.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_indices: Vec<usize>,
    ) -> Result<Self> {
        let invalid =
            |msg: String| -> Result<Self> { Err(ConfigurationError::InvalidPattern(msg).into()) };
        if row_ptr.len() != nrows + 1 {
            return invalid(format!("{} row offsets for {nrows} rows", row_ptr.len()));
        }
        if row_ptr[0] != 0 || row_ptr[nrows] != col_indices.len() {
            return invalid(format!(
                "row offsets span {}..{}, expected 0..{}",
                row_ptr[0],
                row_ptr[nrows],
                col_indices.len()
            ));
        }
        for i in 0..nrows {
            let (start, end) = (row_ptr[i], row_ptr[i + 1]);
            if start > end || end > col_indices.len() {
                return invalid(format!("row {i} has invalid offsets {start}..{end}"));
            }
            let row = &col_indices[start..end];
            if !row.windows(2).all(|w| w[0] < w[1]) {
                return invalid(format!("row {i} is not strictly increasing"));
            }
            if let Some(&last) = row.last() {
                if last >= ncols {
                    return invalid(format!(
                        "row {i} references column {last}, but there are only {ncols} columns"
                    ));
                }
            }
        }
        Ok(SparsityPattern {
            nrows,
            ncols,
            row_ptr,
            col_indices,
            source: None,
        })
    }

    /// Build from rows that are already sorted, unique and in range.
    pub(crate) fn from_sorted_rows(ncols: usize, rows: Vec<Vec<usize>>) -> Self {
        let nrows = rows.len();
        let mut row_ptr = Vec::with_capacity(nrows + 1);
        row_ptr.push(0);
        let mut col_indices = Vec::with_capacity(rows.iter().map(Vec::len).sum());
        for row in rows {
            debug_assert!(row.windows(2).all(|w| w[0] < w[1]));
            col_indices.extend(row);
            row_ptr.push(col_indices.len());
        }
        SparsityPattern {
            nrows,
            ncols,
            row_ptr,
            col_indices,
            source: None,
        }
    }

    /// Structural nonzeros of a dense matrix (`rows[i][j] != 0`).
    pub fn from_dense<F: num_traits::Zero + PartialEq>(ncols: usize, rows: &[Vec<F>]) -> Result<Self> {
        let rows = rows
            .iter()
            .map(|r| {
                r.iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_zero())
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();
        Self::from_rows(ncols, rows)
    }

    pub(crate) fn with_source(mut self, id: TraceId) -> Self {
        self.source = Some(id);
        self
    }

    /// Trace this pattern was extracted from, if any.
    pub fn source(&self) -> Option<TraceId> {
        self.source
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of structural nonzeros.
    pub fn nnz(&self) -> usize {
        self.col_indices.len()
    }

    /// Whether the pattern has no entries.
    pub fn is_empty(&self) -> bool {
        self.col_indices.is_empty()
    }

    /// Sorted column indices of row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[usize] {
        &self.col_indices[self.row_ptr[i]..self.row_ptr[i + 1]]
    }

    /// CSR row pointer (length `nrows + 1`).
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// CSR column indices (length `nnz`).
    pub fn col_indices(&self) -> &[usize] {
        &self.col_indices
    }

    /// Position of `(i, j)` in [`col_indices`](Self::col_indices), if present.
    pub fn position(&self, i: usize, j: usize) -> Option<usize> {
        if i >= self.nrows {
            return None;
        }
        self.row(i)
            .binary_search(&j)
            .ok()
            .map(|k| self.row_ptr[i] + k)
    }

    /// Check if position `(i, j)` is in the pattern.
    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.position(i, j).is_some()
    }

    /// All entries `(row, col)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.nrows).flat_map(move |i| self.row(i).iter().map(move |&j| (i, j)))
    }

    /// Transposed pattern (`ncols x nrows`).
    pub fn transpose(&self) -> Self {
        let mut rows = vec![Vec::new(); self.ncols];
        for (i, j) in self.iter() {
            rows[j].push(i);
        }
        let mut t = Self::from_sorted_rows(self.nrows, rows);
        t.source = self.source;
        t
    }

    /// Columns `start..start + len` as a pattern of width `len`.
    pub fn column_block(&self, start: usize, len: usize) -> Self {
        let rows = (0..self.nrows)
            .map(|i| {
                self.row(i)
                    .iter()
                    .filter(|&&j| j >= start && j < start + len)
                    .map(|&j| j - start)
                    .collect()
            })
            .collect();
        let mut block = Self::from_sorted_rows(len, rows);
        block.source = self.source;
        block
    }

    /// Fold a `m x (k * width)` pattern into `m x width` by mapping column
    /// `j` to `j % width` and taking the union.
    ///
    /// Used for `F(x, xdot)` traced over the stacked input `[x; xdot]`.
    pub fn fold_columns(&self, width: usize) -> Self {
        if width == 0 {
            return Self::empty(self.nrows, 0);
        }
        let rows = (0..self.nrows)
            .map(|i| {
                let set: BTreeSet<usize> = self.row(i).iter().map(|&j| j % width).collect();
                set.into_iter().collect()
            })
            .collect();
        let mut folded = Self::from_sorted_rows(width, rows);
        folded.source = self.source;
        folded
    }

    /// Number of rows with an entry on the main diagonal.
    pub fn diagonal_nnz(&self) -> usize {
        (0..self.nrows.min(self.ncols))
            .filter(|&i| self.contains(i, i))
            .count()
    }

    /// Largest row length.
    pub fn max_row_len(&self) -> usize {
        (0..self.nrows).map(|i| self.row(i).len()).max().unwrap_or(0)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct PatternData {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_indices: Vec<usize>,
}

#[cfg(feature = "serde")]
impl TryFrom<PatternData> for SparsityPattern {
    type Error = crate::Error;

    fn try_from(data: PatternData) -> Result<Self> {
        SparsityPattern::from_csr(data.nrows, data.ncols, data.row_ptr, data.col_indices)
    }
}

impl PartialEq for SparsityPattern {
    fn eq(&self, other: &Self) -> bool {
        self.nrows == other.nrows
            && self.ncols == other.ncols
            && self.row_ptr == other.row_ptr
            && self.col_indices == other.col_indices
    }
}

impl Eq for SparsityPattern {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_sorts_and_dedups() {
        let p = SparsityPattern::from_rows(4, vec![vec![3, 1, 1], vec![], vec![0]]).unwrap();
        assert_eq!(p.row(0), &[1, 3]);
        assert!(p.row(1).is_empty());
        assert_eq!(p.nnz(), 3);
        assert_eq!(p.position(2, 0), Some(2));
        assert!(!p.contains(1, 1));
    }

    #[test]
    fn from_rows_rejects_out_of_range() {
        assert!(SparsityPattern::from_rows(2, vec![vec![2]]).is_err());
    }

    #[test]
    fn transpose_and_fold() {
        let p = SparsityPattern::from_rows(4, vec![vec![0, 3], vec![1, 2]]).unwrap();
        let t = p.transpose();
        assert_eq!(t.nrows(), 4);
        assert_eq!(t.row(3), &[0]);
        let folded = p.fold_columns(2);
        assert_eq!(folded.row(0), &[0, 1]);
        assert_eq!(folded.row(1), &[0, 1]);
        let block = p.column_block(2, 2);
        assert_eq!(block.row(0), &[1]);
        assert_eq!(block.row(1), &[0]);
    }

    #[test]
    fn from_csr_checks_structure() {
        let p = SparsityPattern::from_csr(2, 3, vec![0, 2, 3], vec![0, 2, 1]).unwrap();
        assert_eq!(p, SparsityPattern::from_rows(3, vec![vec![0, 2], vec![1]]).unwrap());

        assert!(SparsityPattern::from_csr(1, 2, vec![0, 1], vec![7]).is_err());
        assert!(SparsityPattern::from_csr(2, 3, vec![0, 2], vec![0, 1]).is_err());
        assert!(SparsityPattern::from_csr(1, 3, vec![0, 2], vec![2, 1]).is_err());
        assert!(SparsityPattern::from_csr(2, 3, vec![0, 2, 1], vec![0]).is_err());
        assert!(SparsityPattern::from_csr(2, 3, vec![0, 5, 1], vec![0]).is_err());
    }
}
