use crate::error::{check_len, EvaluationError, Result};
use crate::float::Float;
use crate::opcode::{self, OpCode};

/// Agreement between the trace and a passive evaluation of the same function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZeroOrderReport<F> {
    /// `||f_trace(x) - f_passive(x)||_2`.
    pub abs_error: F,
    /// `abs_error / ||f_passive(x)||_2`, or `abs_error` when the passive norm is zero.
    pub rel_error: F,
}

impl<F: Float> super::Trace<F> {
    /// Primal sweep into an external buffer.
    ///
    /// Reads opcodes, constants and argument indices from `self`, writing
    /// computed values into `values_buf` (length = number of entries).
    pub fn forward_into(&self, inputs: &[F], values_buf: &mut Vec<F>) -> Result<()> {
        check_len("inputs", self.num_inputs as usize, inputs.len())?;

        values_buf.clear();
        values_buf.extend_from_slice(&self.values);
        values_buf[..inputs.len()].copy_from_slice(inputs);

        for i in self.num_inputs as usize..self.opcodes.len() {
            match self.opcodes[i] {
                OpCode::Input | OpCode::Const => continue,
                op => {
                    let [a_idx, b_idx] = self.arg_indices[i];
                    let a = values_buf[a_idx as usize];
                    let b = self.operand_b(op, b_idx, values_buf);
                    values_buf[i] = opcode::eval_forward(op, a, b);
                }
            }
        }
        Ok(())
    }

    /// Evaluate `f(x)`.
    ///
    /// # Errors
    ///
    /// [`EvaluationError::NonFinite`] if an output is NaN or infinite.
    pub fn forward(&self, inputs: &[F]) -> Result<Vec<F>> {
        let mut values = Vec::with_capacity(self.opcodes.len());
        self.forward_into(inputs, &mut values)?;
        self.collect_outputs(&values)
    }

    /// Gather output values from a primal buffer, rejecting non-finite outputs.
    pub(crate) fn collect_outputs(&self, values: &[F]) -> Result<Vec<F>> {
        self.output_indices
            .iter()
            .enumerate()
            .map(|(row, &idx)| {
                let v = values[idx as usize];
                if v.is_finite() {
                    Ok(v)
                } else {
                    log::warn!("output {row} evaluated to {v}");
                    Err(EvaluationError::NonFinite {
                        output: row,
                        value: v.to_f64_lossy(),
                    }
                    .into())
                }
            })
            .collect()
    }

    /// Compare the trace against a passive evaluation `passive = f(x)`.
    ///
    /// Useful right after recording to confirm the traced function and the
    /// plain-float function agree.
    pub fn zero_order_check(&self, inputs: &[F], passive: &[F]) -> Result<ZeroOrderReport<F>> {
        check_len("passive outputs", self.num_outputs(), passive.len())?;
        let traced = self.forward(inputs)?;

        let mut diff_sq = F::zero();
        let mut norm_sq = F::zero();
        for (&t, &p) in traced.iter().zip(passive) {
            diff_sq = diff_sq + (t - p) * (t - p);
            norm_sq = norm_sq + p * p;
        }
        let abs_error = diff_sq.sqrt();
        let rel_error = if norm_sq > F::zero() {
            abs_error / norm_sq.sqrt()
        } else {
            abs_error
        };
        log::debug!("zero-order check: abs {abs_error}, rel {rel_error}");
        Ok(ZeroOrderReport {
            abs_error,
            rel_error,
        })
    }
}
