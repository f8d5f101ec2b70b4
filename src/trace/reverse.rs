use crate::error::{check_len, EvaluationError, Result};
use crate::float::Float;
use crate::opcode::{self, OpCode};
use crate::sparse::{CompressedJacobian, SeedMatrix};

impl<F: Float> super::Trace<F> {
    /// Vector reverse sweep carrying `lanes` adjoint directions.
    ///
    /// `adjoints` must be pre-seeded at the output entries (length
    /// `num_ops * lanes`, lane-contiguous per entry). `values` holds the
    /// primal entries from [`forward_into`](Self::forward_into). On return the
    /// first `num_inputs * lanes` entries hold the input adjoints.
    pub(crate) fn reverse_sweep(&self, values: &[F], adjoints: &mut [F], lanes: usize) {
        let ni = self.num_inputs as usize;
        for i in (ni..self.opcodes.len()).rev() {
            let op = self.opcodes[i];
            if op == OpCode::Const || op == OpCode::Input {
                continue;
            }

            let (head, tail) = adjoints.split_at_mut(i * lanes);
            let adj = &mut tail[..lanes];
            if adj.iter().all(|&v| v == F::zero()) {
                continue;
            }

            let [a_idx, b_idx] = self.arg_indices[i];
            let a = values[a_idx as usize];
            let b = self.operand_b(op, b_idx, values);
            let (da, db) = opcode::partials(op, a, b, values[i]);

            let a_base = a_idx as usize * lanes;
            for c in 0..lanes {
                if adj[c] != F::zero() {
                    head[a_base + c] = head[a_base + c] + da * adj[c];
                }
            }
            if op.is_binary() {
                let b_base = b_idx as usize * lanes;
                for c in 0..lanes {
                    if adj[c] != F::zero() {
                        head[b_base + c] = head[b_base + c] + db * adj[c];
                    }
                }
            }
            adj.fill(F::zero());
        }
    }

    /// Run a primal sweep, seed `lanes` adjoint directions with
    /// `weight(row, lane)` and sweep back. Returns `(f(x), input adjoints)`.
    fn adjoint_lanes(
        &self,
        inputs: &[F],
        lanes: usize,
        weight: impl Fn(usize, usize) -> F,
    ) -> Result<(Vec<F>, Vec<F>)> {
        let mut values = Vec::with_capacity(self.opcodes.len());
        self.forward_into(inputs, &mut values)?;
        let outputs = self.collect_outputs(&values)?;

        let mut adjoints = vec![F::zero(); self.opcodes.len() * lanes];
        for (row, &idx) in self.output_indices.iter().enumerate() {
            let base = idx as usize * lanes;
            // Several outputs may share one entry; their weights accumulate.
            for c in 0..lanes {
                adjoints[base + c] = adjoints[base + c] + weight(row, c);
            }
        }
        self.reverse_sweep(&values, &mut adjoints, lanes);

        adjoints.truncate(self.num_inputs as usize * lanes);
        if let Some(pos) = adjoints.iter().position(|v| !v.is_finite()) {
            log::warn!("adjoint of input {} is {}", pos / lanes.max(1), adjoints[pos]);
            return Err(EvaluationError::NonFiniteDerivative {
                row: pos / lanes.max(1),
                lane: pos % lanes.max(1),
                value: adjoints[pos].to_f64_lossy(),
            }
            .into());
        }
        Ok((outputs, adjoints))
    }

    /// Vector-Jacobian product: returns `(f(x), w^T J(x))`.
    pub fn vjp(&self, inputs: &[F], weights: &[F]) -> Result<(Vec<F>, Vec<F>)> {
        check_len("weights", self.num_outputs(), weights.len())?;
        self.adjoint_lanes(inputs, 1, |row, _| weights[row])
    }

    /// Row-compressed Jacobian `W^T J(x)` by one vector-reverse sweep.
    ///
    /// `weights` is an `m x p` 0/1 matrix (typically built from a row colouring).
    /// The result is stored transposed as an `n x p` block: entry `(j, c)` is
    /// `sum_i W[i][c] * J[i][j]`.
    pub fn reverse_compressed(
        &self,
        inputs: &[F],
        weights: &SeedMatrix,
    ) -> Result<CompressedJacobian<F>> {
        check_len("weight rows", self.num_outputs(), weights.nrows())?;
        let lanes = weights.ncols();
        log::trace!(
            "vector reverse sweep: {} entries, {} lanes",
            self.opcodes.len(),
            lanes
        );
        let (_, data) = self.adjoint_lanes(inputs, lanes, |row, c| {
            if weights.get(row, c) {
                F::one()
            } else {
                F::zero()
            }
        })?;
        CompressedJacobian::from_vec(self.num_inputs as usize, lanes, data)
    }
}
