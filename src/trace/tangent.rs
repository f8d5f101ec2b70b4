use crate::error::{check_len, EvaluationError, Result};
use crate::float::Float;
use crate::opcode::{self, OpCode};
use crate::sparse::{CompressedJacobian, SeedMatrix};

/// `d * t`, treating a zero tangent as exactly zero so an infinite partial on
/// an untouched lane does not produce NaN.
#[inline]
fn scaled<F: Float>(d: F, t: F) -> F {
    if t == F::zero() {
        F::zero()
    } else {
        d * t
    }
}

impl<F: Float> super::Trace<F> {
    /// Vector forward sweep carrying `lanes` tangent directions.
    ///
    /// `seed(j, c)` is the tangent of input `j` in lane `c`. On return `values`
    /// holds the primal entries and `dots[k * lanes + c]` the tangent of entry
    /// `k` in lane `c`. Every lane is propagated with the same arithmetic, so a
    /// `p`-lane sweep equals `p` single-lane sweeps entry for entry.
    pub(crate) fn tangent_sweep(
        &self,
        inputs: &[F],
        lanes: usize,
        seed: impl Fn(usize, usize) -> F,
        values: &mut Vec<F>,
        dots: &mut Vec<F>,
    ) -> Result<()> {
        self.forward_into(inputs, values)?;

        let ni = self.num_inputs as usize;
        dots.clear();
        dots.resize(self.opcodes.len() * lanes, F::zero());
        for j in 0..ni {
            for c in 0..lanes {
                dots[j * lanes + c] = seed(j, c);
            }
        }
        if lanes == 0 {
            return Ok(());
        }

        for i in ni..self.opcodes.len() {
            let op = self.opcodes[i];
            if op == OpCode::Const || op == OpCode::Input {
                continue;
            }
            let [a_idx, b_idx] = self.arg_indices[i];
            let a = values[a_idx as usize];
            let b = self.operand_b(op, b_idx, values);
            let (da, db) = opcode::partials(op, a, b, values[i]);

            // Operands always precede the entry they feed.
            let (head, tail) = dots.split_at_mut(i * lanes);
            let out = &mut tail[..lanes];
            let ta = &head[a_idx as usize * lanes..][..lanes];
            if op.is_binary() {
                let tb = &head[b_idx as usize * lanes..][..lanes];
                for c in 0..lanes {
                    out[c] = scaled(da, ta[c]) + scaled(db, tb[c]);
                }
            } else {
                for c in 0..lanes {
                    out[c] = scaled(da, ta[c]);
                }
            }
        }
        Ok(())
    }

    /// Gather output tangents into an `m x lanes` row-major block.
    fn collect_tangents(&self, dots: &[F], lanes: usize) -> Result<Vec<F>> {
        let mut data = Vec::with_capacity(self.output_indices.len() * lanes);
        for (row, &idx) in self.output_indices.iter().enumerate() {
            let lane_vals = &dots[idx as usize * lanes..][..lanes];
            if let Some(c) = lane_vals.iter().position(|v| !v.is_finite()) {
                log::warn!("derivative of output {row} in direction {c} is {}", lane_vals[c]);
                return Err(EvaluationError::NonFiniteDerivative {
                    row,
                    lane: c,
                    value: lane_vals[c].to_f64_lossy(),
                }
                .into());
            }
            data.extend_from_slice(lane_vals);
        }
        Ok(data)
    }

    /// Compressed Jacobian `J(x) S` by one vector-forward sweep, together with `f(x)`.
    pub fn forward_compressed_with_outputs(
        &self,
        inputs: &[F],
        seed: &SeedMatrix,
    ) -> Result<(Vec<F>, CompressedJacobian<F>)> {
        check_len("seed rows", self.num_inputs as usize, seed.nrows())?;
        let lanes = seed.ncols();
        log::trace!(
            "vector forward sweep: {} entries, {} lanes",
            self.opcodes.len(),
            lanes
        );

        let mut values = Vec::with_capacity(self.opcodes.len());
        let mut dots = Vec::new();
        self.tangent_sweep(
            inputs,
            lanes,
            |j, c| if seed.get(j, c) { F::one() } else { F::zero() },
            &mut values,
            &mut dots,
        )?;

        let outputs = self.collect_outputs(&values)?;
        let data = self.collect_tangents(&dots, lanes)?;
        Ok((
            outputs,
            CompressedJacobian::from_vec(self.num_outputs(), lanes, data)?,
        ))
    }

    /// Compressed Jacobian `Jc = J(x) S` (`m x p`) by one vector-forward sweep.
    ///
    /// The full `m x n` Jacobian is never formed.
    ///
    /// # Errors
    ///
    /// Dimension mismatches between `inputs`, `seed` and the trace, and
    /// non-finite outputs or derivatives at `inputs`.
    pub fn forward_compressed(&self, inputs: &[F], seed: &SeedMatrix) -> Result<CompressedJacobian<F>> {
        self.forward_compressed_with_outputs(inputs, seed)
            .map(|(_, jc)| jc)
    }

    /// Jacobian-vector product: returns `(f(x), J(x) v)`.
    pub fn jvp(&self, inputs: &[F], direction: &[F]) -> Result<(Vec<F>, Vec<F>)> {
        check_len("direction", self.num_inputs as usize, direction.len())?;
        let mut values = Vec::with_capacity(self.opcodes.len());
        let mut dots = Vec::new();
        self.tangent_sweep(inputs, 1, |j, _| direction[j], &mut values, &mut dots)?;
        let outputs = self.collect_outputs(&values)?;
        let jv = self.collect_tangents(&dots, 1)?;
        Ok((outputs, jv))
    }

    /// Dense Jacobian `J[i][j] = ∂f_i/∂x_j` with one forward lane per input.
    ///
    /// Intended for small problems and for checking sparse results.
    pub fn jacobian(&self, inputs: &[F]) -> Result<Vec<Vec<F>>> {
        let n = self.num_inputs as usize;
        let jc = self.forward_compressed(inputs, &SeedMatrix::identity(n))?;
        Ok((0..jc.nrows()).map(|i| jc.row(i).to_vec()).collect())
    }
}
