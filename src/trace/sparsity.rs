use crate::config::{SparseConfig, SparsityMode};
use crate::error::Result;
use crate::float::Float;
use crate::opcode::OpCode;
use crate::sparse::SparsityPattern;

/// Merge two sorted, duplicate-free index lists.
fn union_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

impl<F: Float> super::Trace<F> {
    /// Input dependency set of every entry, propagated forward through the trace.
    ///
    /// Each set is a sorted list of input indices. Dependencies never shrink
    /// along a data path except through piecewise-constant ops in
    /// [`SparsityMode::Tight`], so the result over-approximates the true
    /// structure.
    fn dependency_sets(&self, mode: SparsityMode) -> Vec<Vec<u32>> {
        let mut deps: Vec<Vec<u32>> = Vec::with_capacity(self.opcodes.len());
        for i in 0..self.opcodes.len() {
            let set = match self.opcodes[i] {
                OpCode::Input => vec![i as u32],
                OpCode::Const => Vec::new(),
                op if mode == SparsityMode::Tight && op.is_piecewise_constant() => Vec::new(),
                op => {
                    let [a_idx, b_idx] = self.arg_indices[i];
                    let a = &deps[a_idx as usize];
                    if op.is_binary() && b_idx != a_idx {
                        union_sorted(a, &deps[b_idx as usize])
                    } else {
                        a.clone()
                    }
                }
            };
            deps.push(set);
        }
        deps
    }

    /// Structural sparsity pattern of the Jacobian (`m x n`).
    ///
    /// Row `i` lists every input on which output `i` may depend along the
    /// recorded path. The input values play no role.
    pub fn sparsity_pattern(&self, mode: SparsityMode) -> SparsityPattern {
        let deps = self.dependency_sets(mode);
        let rows: Vec<Vec<usize>> = self
            .output_indices
            .iter()
            .map(|&idx| deps[idx as usize].iter().map(|&c| c as usize).collect())
            .collect();
        SparsityPattern::from_sorted_rows(self.num_inputs as usize, rows).with_source(self.id)
    }

    /// [`sparsity_pattern`](Self::sparsity_pattern) guarded by the dimension
    /// limits of `config`.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::DimensionLimit`](crate::ConfigurationError::DimensionLimit)
    /// if `m > config.max_rows` or `n > config.max_cols`.
    pub fn jacobian_pattern(&self, config: &SparseConfig) -> Result<SparsityPattern> {
        config.check_dimensions(self.num_outputs(), self.num_inputs())?;
        let pattern = self.sparsity_pattern(config.sparsity_mode);
        log::debug!(
            "sparsity pattern of trace {}: {} x {}, nnz = {}",
            self.id,
            pattern.nrows(),
            pattern.ncols(),
            pattern.nnz()
        );
        Ok(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::union_sorted;

    #[test]
    fn union_merges_and_dedups() {
        assert_eq!(union_sorted(&[0, 2, 5], &[1, 2, 6]), vec![0, 1, 2, 5, 6]);
        assert_eq!(union_sorted(&[], &[3]), vec![3]);
        assert!(union_sorted(&[], &[]).is_empty());
    }
}
