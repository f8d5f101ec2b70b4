//! Recovery of Jacobian entries from a compressed block.
//!
//! Column compression stores `Jc[i][c] = sum_{colour(j) = c} J[i][j]`. Since the
//! columns of one row carry distinct colours, entry `(i, j)` is exactly
//! `Jc[i][colour(j)]`. Row compression is the transposed case: entry `(i, j)` is
//! `C[j][colour(i)]`.

use std::sync::Arc;

use crate::error::{check_len, ConsistencyError, Result};
use crate::float::Float;
use crate::sparse::{Coloring, CompressedJacobian, InsertMode, SparseMatrix, SparsityPattern};

/// Which dimension of the Jacobian the compressed block was taken over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// `Jc = J S`, one row per output.
    Columns,
    /// `C = (W^T J)^T`, one row per input.
    Rows,
}

/// Precomputed lookup from every pattern entry to its compressed location.
///
/// Built once per pattern and colouring and checked for per-row colour
/// uniqueness at construction, so every later recovery is a plain gather.
#[derive(Clone, Debug)]
pub struct RecoveryMap {
    pattern: Arc<SparsityPattern>,
    orientation: Orientation,
    num_colors: usize,
    /// `(compressed row, colour)` per pattern entry, in CSR order.
    sources: Vec<(usize, usize)>,
    /// `(i, k)` for every diagonal entry `(i, i)` at CSR position `k`.
    diagonal: Vec<(usize, usize)>,
}

impl RecoveryMap {
    /// Map for a column colouring of `pattern`.
    ///
    /// # Errors
    ///
    /// [`ConsistencyError::ColourCollision`] if two columns of one row share a
    /// colour, [`ConsistencyError::ColouringSize`] if the colouring does not
    /// cover the pattern's columns.
    pub fn new(pattern: Arc<SparsityPattern>, coloring: &Coloring) -> Result<Self> {
        coloring.verify(&pattern)?;
        let sources = pattern
            .iter()
            .map(|(i, j)| coloring.lane(i, j).map(|c| (i, c)))
            .collect::<Result<_>>()?;
        Ok(Self::build(pattern, Orientation::Columns, coloring.num_colors(), sources))
    }

    /// Map for a row colouring of `pattern`, used with
    /// [`Trace::reverse_compressed`](crate::Trace::reverse_compressed).
    ///
    /// # Errors
    ///
    /// [`ConsistencyError::ColourCollision`] if two rows that share a column
    /// carry the same colour (reported with rows and columns swapped).
    pub fn for_rows(pattern: Arc<SparsityPattern>, coloring: &Coloring) -> Result<Self> {
        coloring.verify(&pattern.transpose())?;
        // Entry (i, j) is entry (j, i) of the coloured transpose.
        let sources = pattern
            .iter()
            .map(|(i, j)| coloring.lane(j, i).map(|c| (j, c)))
            .collect::<Result<_>>()?;
        Ok(Self::build(pattern, Orientation::Rows, coloring.num_colors(), sources))
    }

    fn build(
        pattern: Arc<SparsityPattern>,
        orientation: Orientation,
        num_colors: usize,
        sources: Vec<(usize, usize)>,
    ) -> Self {
        let diagonal = pattern
            .iter()
            .enumerate()
            .filter(|(_, (i, j))| i == j)
            .map(|(k, (i, _))| (i, k))
            .collect();
        RecoveryMap {
            pattern,
            orientation,
            num_colors,
            sources,
            diagonal,
        }
    }

    pub fn pattern(&self) -> &Arc<SparsityPattern> {
        &self.pattern
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn num_colors(&self) -> usize {
        self.num_colors
    }

    fn check_compressed<F: Float>(&self, compressed: &CompressedJacobian<F>) -> Result<()> {
        let rows = match self.orientation {
            Orientation::Columns => self.pattern.nrows(),
            Orientation::Rows => self.pattern.ncols(),
        };
        check_len("compressed rows", rows, compressed.nrows())?;
        check_len("compressed lanes", self.num_colors, compressed.ncols())
    }

    /// Write `scale * value` for every pattern entry into `out` with `mode`.
    ///
    /// # Errors
    ///
    /// Shape mismatch of `compressed`, or [`ConsistencyError::PatternMismatch`]
    /// if `out` was not built on this map's pattern.
    pub fn recover_into<F: Float>(
        &self,
        compressed: &CompressedJacobian<F>,
        out: &mut SparseMatrix<F>,
        mode: InsertMode,
        scale: F,
    ) -> Result<()> {
        self.recover_filtered(compressed, out, mode, scale, |_| true)
    }

    /// Like [`recover_into`](Self::recover_into), but entries for which
    /// `keep(value)` is false are written as zero.
    pub(crate) fn recover_filtered<F: Float>(
        &self,
        compressed: &CompressedJacobian<F>,
        out: &mut SparseMatrix<F>,
        mode: InsertMode,
        scale: F,
        keep: impl Fn(F) -> bool,
    ) -> Result<()> {
        self.check_compressed(compressed)?;
        if !out.shares_pattern(&self.pattern) {
            return Err(ConsistencyError::PatternMismatch(format!(
                "output matrix is {} x {} with {} entries, recovery map expects {} x {} with {}",
                out.nrows(),
                out.ncols(),
                out.nnz(),
                self.pattern.nrows(),
                self.pattern.ncols(),
                self.pattern.nnz()
            ))
            .into());
        }
        for (slot, &(src, colour)) in out.values_mut().iter_mut().zip(&self.sources) {
            let v = compressed.get(src, colour);
            let v = if keep(v) { v } else { F::zero() };
            mode.apply(slot, scale * v);
        }
        Ok(())
    }

    /// Allocate a matrix on the map's pattern and recover into it.
    pub fn recover<F: Float>(&self, compressed: &CompressedJacobian<F>) -> Result<SparseMatrix<F>> {
        let mut out = SparseMatrix::from_pattern(Arc::clone(&self.pattern));
        self.recover_into(compressed, &mut out, InsertMode::Insert, F::one())?;
        Ok(out)
    }

    /// Diagonal-only recovery into `out` (length `min(m, n)`).
    ///
    /// Diagonal positions absent from the pattern are structurally zero: set
    /// to zero in [`InsertMode::Insert`], left alone in [`InsertMode::Add`].
    pub fn recover_diagonal<F: Float>(
        &self,
        compressed: &CompressedJacobian<F>,
        out: &mut [F],
        mode: InsertMode,
        scale: F,
    ) -> Result<()> {
        self.check_compressed(compressed)?;
        check_len(
            "diagonal",
            self.pattern.nrows().min(self.pattern.ncols()),
            out.len(),
        )?;
        if mode == InsertMode::Insert {
            out.fill(F::zero());
        }
        for &(i, k) in &self.diagonal {
            let (src, colour) = self.sources[k];
            mode.apply(&mut out[i], scale * compressed.get(src, colour));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrow() -> (Arc<SparsityPattern>, Vec<Vec<f64>>) {
        let dense = vec![
            vec![1.0, 0.0, 0.0, 2.0],
            vec![0.0, 3.0, 0.0, 0.0],
            vec![0.0, 0.0, 4.0, 5.0],
        ];
        let pattern = SparsityPattern::from_dense(4, &dense).unwrap();
        (Arc::new(pattern), dense)
    }

    #[test]
    fn column_round_trip() {
        let (pattern, dense) = arrow();
        let coloring = Coloring::from_colors(vec![0, 0, 0, 1]);
        let map = RecoveryMap::new(Arc::clone(&pattern), &coloring).unwrap();
        let seed = crate::sparse::SeedMatrix::from_coloring(&coloring);
        let jc = CompressedJacobian::compress(&dense, &seed).unwrap();
        assert_eq!(map.recover(&jc).unwrap().to_dense(), dense);
    }

    #[test]
    fn row_round_trip() {
        let (pattern, dense) = arrow();
        // Rows 0 and 2 share column 3.
        let coloring = Coloring::from_colors(vec![0, 0, 1]);
        let map = RecoveryMap::for_rows(Arc::clone(&pattern), &coloring).unwrap();
        // C[j][c] = sum over rows of colour c of J[i][j].
        let mut data = vec![0.0; 4 * 2];
        for (i, row) in dense.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                data[j * 2 + coloring.color(i).unwrap()] += v;
            }
        }
        let c = CompressedJacobian::from_vec(4, 2, data).unwrap();
        assert_eq!(map.recover(&c).unwrap().to_dense(), dense);
    }

    #[test]
    fn collision_is_rejected() {
        let (pattern, _) = arrow();
        let coloring = Coloring::from_colors(vec![0, 0, 1, 1]);
        let err = RecoveryMap::new(pattern, &coloring).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn diagonal_add_scaled() {
        let (pattern, dense) = arrow();
        let coloring = Coloring::trivial(4);
        let map = RecoveryMap::new(pattern, &coloring).unwrap();
        let jc = CompressedJacobian::compress(&dense, &crate::sparse::SeedMatrix::identity(4)).unwrap();
        let mut diag = vec![10.0; 3];
        map.recover_diagonal(&jc, &mut diag, InsertMode::Add, 2.0).unwrap();
        assert_eq!(diag, vec![12.0, 16.0, 18.0]);
        map.recover_diagonal(&jc, &mut diag, InsertMode::Insert, 1.0).unwrap();
        assert_eq!(diag, vec![1.0, 3.0, 4.0]);
    }
}
