use std::fmt;

use crate::float::Float;
use crate::sparse::Coloring;

/// Dense 0/1 seed matrix `S` (`n x p`) with `S[j][c] = 1` iff column `j`
/// has colour `c`.
///
/// Stored row-major as booleans; sweeps read it through [`get`](Self::get).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "SeedData"))]
pub struct SeedMatrix {
    nrows: usize,
    ncols: usize,
    data: Vec<bool>,
}

impl SeedMatrix {
    /// All-zero `nrows x ncols` seed.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        SeedMatrix {
            nrows,
            ncols,
            data: vec![false; nrows * ncols],
        }
    }

    /// Seed of a colouring: one column per colour class. Uncoloured rows
    /// stay zero.
    pub fn from_coloring(coloring: &Coloring) -> Self {
        let mut seed = Self::zeros(coloring.len(), coloring.num_colors());
        for (j, c) in coloring.colors().iter().enumerate() {
            if let Some(c) = *c {
                seed.data[j * seed.ncols + c] = true;
            }
        }
        seed
    }

    /// `n x n` identity seed (uncompressed evaluation).
    pub fn identity(n: usize) -> Self {
        let mut seed = Self::zeros(n, n);
        for j in 0..n {
            seed.data[j * n + j] = true;
        }
        seed
    }

    /// Place `self` at rows `offset..offset + nrows` of a zero seed with
    /// `total_rows` rows.
    ///
    /// Seeds one block of a stacked input such as `[x; xdot]`.
    ///
    /// # Panics
    ///
    /// If the block does not fit.
    pub fn embed(&self, offset: usize, total_rows: usize) -> Self {
        assert!(
            offset + self.nrows <= total_rows,
            "seed block of {} rows at offset {offset} exceeds {total_rows} rows",
            self.nrows
        );
        let mut seed = Self::zeros(total_rows, self.ncols);
        let start = offset * self.ncols;
        seed.data[start..start + self.data.len()].copy_from_slice(&self.data);
        seed
    }

    /// Number of rows `n`.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of colours `p`.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn get(&self, j: usize, c: usize) -> bool {
        self.data[j * self.ncols + c]
    }

    /// Dense row-major copy with `0` and `1` entries.
    pub fn to_dense<F: Float>(&self) -> Vec<Vec<F>> {
        (0..self.nrows)
            .map(|j| {
                (0..self.ncols)
                    .map(|c| if self.get(j, c) { F::one() } else { F::zero() })
                    .collect()
            })
            .collect()
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct SeedData {
    nrows: usize,
    ncols: usize,
    data: Vec<bool>,
}

#[cfg(feature = "serde")]
impl TryFrom<SeedData> for SeedMatrix {
    type Error = crate::Error;

    fn try_from(seed: SeedData) -> crate::Result<Self> {
        let expected = seed.nrows.checked_mul(seed.ncols);
        if expected != Some(seed.data.len()) {
            return Err(crate::ConfigurationError::InvalidSeed(format!(
                "{} entries for a {} x {} seed",
                seed.data.len(),
                seed.nrows,
                seed.ncols
            ))
            .into());
        }
        Ok(SeedMatrix {
            nrows: seed.nrows,
            ncols: seed.ncols,
            data: seed.data,
        })
    }
}

impl fmt::Display for SeedMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for j in 0..self.nrows {
            for c in 0..self.ncols {
                let bit = if self.get(j, c) { '1' } else { '0' };
                if c > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{bit}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_bit_per_row() {
        let coloring = Coloring::from_colors(vec![0, 1, 0, 2]);
        let seed = SeedMatrix::from_coloring(&coloring);
        assert_eq!((seed.nrows(), seed.ncols()), (4, 3));
        for j in 0..4 {
            let bits = (0..3).filter(|&c| seed.get(j, c)).count();
            assert_eq!(bits, 1);
            assert!(seed.get(j, coloring.color(j).unwrap()));
        }
    }

    #[test]
    fn embed_offsets_rows() {
        let seed = SeedMatrix::identity(2).embed(2, 4);
        assert!(!seed.get(0, 0));
        assert!(seed.get(2, 0));
        assert!(seed.get(3, 1));
        assert_eq!(format!("{seed}"), "0 0\n0 0\n1 0\n0 1\n");
    }
}
