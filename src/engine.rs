//! Solver-facing Jacobian engines.
//!
//! An engine is built once per trace: it extracts the sparsity pattern, colours
//! it, and precomputes the seed and the recovery map. Each evaluation then costs
//! one compressed sweep plus a gather. Engines never hold the trace itself; every
//! evaluation takes it explicitly and checks its [`TraceId`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{CompressionMode, SparseConfig};
use crate::error::{check_len, ConfigurationError, Result};
use crate::float::Float;
use crate::sparse::{
    color_columns, color_rows, Coloring, CompressedJacobian, InsertMode, RecoveryMap, SeedMatrix,
    SparseMatrix, SparsityPattern,
};
use crate::trace::{Trace, TraceId};

/// Colouring, seed and recovery map for one pattern under one compression mode.
#[derive(Clone, Debug)]
struct Compression {
    mode: CompressionMode,
    drop_tolerance: f64,
    coloring: Coloring,
    seed: SeedMatrix,
    recovery: RecoveryMap,
    /// Set once the compressed block has been logged. `None` unless
    /// `view_compressed` is on. Clones share the flag.
    viewed: Option<Arc<AtomicBool>>,
}

impl Compression {
    fn new(pattern: &Arc<SparsityPattern>, config: &SparseConfig) -> Result<Self> {
        let (coloring, recovery) = match config.compression {
            CompressionMode::Column => {
                let coloring = color_columns(pattern, config.coloring_order);
                let recovery = RecoveryMap::new(Arc::clone(pattern), &coloring)?;
                (coloring, recovery)
            }
            CompressionMode::Row => {
                let coloring = color_rows(pattern, config.coloring_order);
                let recovery = RecoveryMap::for_rows(Arc::clone(pattern), &coloring)?;
                (coloring, recovery)
            }
            CompressionMode::Dense => {
                let coloring = Coloring::trivial(pattern.ncols());
                let recovery = RecoveryMap::new(Arc::clone(pattern), &coloring)?;
                (coloring, recovery)
            }
        };
        let seed = SeedMatrix::from_coloring(&coloring);
        log::debug!(
            "{:?} compression of a {} x {} pattern ({} nonzeros): {} lanes",
            config.compression,
            pattern.nrows(),
            pattern.ncols(),
            pattern.nnz(),
            coloring.num_colors()
        );
        Ok(Compression {
            mode: config.compression,
            drop_tolerance: config.drop_tolerance,
            coloring,
            seed,
            recovery,
            viewed: config.view_compressed.then(Arc::default),
        })
    }

    /// Forward seed of this block placed at `offset` of a stacked input of
    /// length `total`. `None` under row compression.
    fn stacked_seed(&self, offset: usize, total: usize) -> Option<SeedMatrix> {
        match self.mode {
            CompressionMode::Row => None,
            CompressionMode::Column | CompressionMode::Dense => {
                Some(self.seed.embed(offset, total))
            }
        }
    }

    /// Compressed block of the columns starting at `offset` of `J(inputs)`.
    ///
    /// `stacked_seed` comes from [`stacked_seed`](Self::stacked_seed) with the
    /// same offset.
    fn compress_block<F: Float>(
        &self,
        trace: &Trace<F>,
        inputs: &[F],
        stacked_seed: Option<&SeedMatrix>,
        offset: usize,
    ) -> Result<CompressedJacobian<F>> {
        match stacked_seed {
            Some(seed) => trace.forward_compressed(inputs, seed),
            None => {
                let width = self.recovery.pattern().ncols();
                let (_, tail) = trace.reverse_compressed(inputs, &self.seed)?.split_rows(offset);
                Ok(tail.split_rows(width).0)
            }
        }
    }

    /// Scatter `scale * compressed` into `out`.
    fn assemble<F: Float>(
        &self,
        compressed: &CompressedJacobian<F>,
        out: &mut SparseMatrix<F>,
        mode: InsertMode,
        scale: F,
    ) -> Result<()> {
        if self.mode == CompressionMode::Dense {
            let tol = self.drop_tolerance;
            self.recovery
                .recover_filtered(compressed, out, mode, scale, |v| v.abs().to_f64_lossy() > tol)
        } else {
            self.recovery.recover_into(compressed, out, mode, scale)
        }
    }

    /// Log `blocks` at debug level on the first evaluation only.
    fn view<F: Float>(&self, blocks: &[(&str, &CompressedJacobian<F>)]) {
        let Some(viewed) = &self.viewed else {
            return;
        };
        if !viewed.swap(true, Ordering::Relaxed) {
            for (label, block) in blocks {
                log::debug!("{label}\n{block}");
            }
        }
    }
}

/// Jacobian with respect to the trailing parameter inputs of a trace.
#[derive(Clone, Debug)]
struct ParameterBlock {
    offset: usize,
    pattern: Arc<SparsityPattern>,
    compression: Compression,
    stacked_seed: Option<SeedMatrix>,
}

impl ParameterBlock {
    /// Block of the columns `offset..` of `stacked`, `None` if there are none.
    fn new(
        stacked: &SparsityPattern,
        offset: usize,
        config: &SparseConfig,
    ) -> Result<Option<Self>> {
        let len = stacked.ncols() - offset;
        if len == 0 {
            return Ok(None);
        }
        let pattern = Arc::new(stacked.column_block(offset, len));
        log::debug!("parameter block: {len} parameters, {} nonzeros", pattern.nnz());
        let compression = Compression::new(&pattern, config)?;
        let stacked_seed = compression.stacked_seed(offset, stacked.ncols());
        Ok(Some(ParameterBlock {
            offset,
            pattern,
            compression,
            stacked_seed,
        }))
    }

    fn compute<F: Float>(&self, trace: &Trace<F>, inputs: &[F]) -> Result<SparseMatrix<F>> {
        let compressed = self.compression.compress_block(
            trace,
            inputs,
            self.stacked_seed.as_ref(),
            self.offset,
        )?;
        self.compression.view(&[("compressed dF/dp", &compressed)]);
        let mut out = SparseMatrix::from_pattern(Arc::clone(&self.pattern));
        self.compression
            .assemble(&compressed, &mut out, InsertMode::Insert, F::one())?;
        Ok(out)
    }
}

/// `dF/dp` on an engine's parameter block, or an `m x 0` matrix without one.
fn parameter_jacobian<F: Float>(
    parameters: Option<&ParameterBlock>,
    trace: &Trace<F>,
    inputs: &[F],
) -> Result<SparseMatrix<F>> {
    match parameters {
        Some(block) => block.compute(trace, inputs),
        None => Ok(SparseMatrix::from_pattern(Arc::new(SparsityPattern::empty(
            trace.num_outputs(),
            0,
        )))),
    }
}

/// Concatenate `blocks` after checking their lengths. Trailing inputs not
/// covered by `blocks` keep their recorded values.
fn stack_inputs<F: Float>(
    trace: &Trace<F>,
    blocks: &[(&'static str, usize, &[F])],
) -> Result<Vec<F>> {
    let mut stacked = Vec::with_capacity(trace.num_inputs());
    for &(what, len, values) in blocks {
        check_len(what, len, values.len())?;
        stacked.extend_from_slice(values);
    }
    if let Some(rest) = trace.recorded_inputs().get(stacked.len()..) {
        stacked.extend_from_slice(rest);
    }
    Ok(stacked)
}

/// Sparse Jacobian of an explicit function `f: R^n -> R^m`.
///
/// ```
/// use jacolor::{record, JacobianEngine, Scalar, SparseConfig};
///
/// fn f<T: Scalar>(x: &[T]) -> Vec<T> {
///     vec![x[0] * x[0], x[1].sin(), x[2] + x[0]]
/// }
///
/// let x = [1.0_f64, 0.0, 2.0];
/// let (trace, _) = record(|v| f(v), &x);
/// let engine = JacobianEngine::new(&trace, SparseConfig::default()).unwrap();
/// let jac = engine.compute_jacobian(&trace, &x).unwrap();
/// assert_eq!(jac.get(0, 0), 2.0);
/// assert_eq!(jac.get(1, 1), 1.0);
/// assert_eq!(jac.get(0, 1), 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct JacobianEngine {
    trace_id: TraceId,
    n: usize,
    config: SparseConfig,
    pattern: Arc<SparsityPattern>,
    compression: Compression,
    stacked_seed: Option<SeedMatrix>,
    parameters: Option<ParameterBlock>,
}

impl JacobianEngine {
    /// Extract the pattern of `trace`, colour it and build seed and recovery.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::DimensionLimit`] if the trace exceeds the limits
    /// in `config`.
    pub fn new<F: Float>(trace: &Trace<F>, config: SparseConfig) -> Result<Self> {
        Self::with_parameters(trace, 0, config)
    }

    /// Build for `f(x, p)` recorded over the stacked input `[x; p]`, where
    /// the last `num_params` inputs are parameters.
    ///
    /// The state methods evaluate `df/dx` with `p` held at its recorded
    /// values; [`compute_parameter_jacobian`](Self::compute_parameter_jacobian)
    /// evaluates `df/dp`. Each block gets its own colouring.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::DimensionMismatch`] if the trace has fewer than
    /// `num_params` inputs; [`ConfigurationError::DimensionLimit`] as for
    /// [`new`](Self::new).
    pub fn with_parameters<F: Float>(
        trace: &Trace<F>,
        num_params: usize,
        config: SparseConfig,
    ) -> Result<Self> {
        let total = trace.num_inputs();
        let n = total
            .checked_sub(num_params)
            .ok_or(ConfigurationError::DimensionMismatch {
                what: "trace inputs for the parameters",
                expected: num_params,
                actual: total,
            })?;
        let stacked = trace.jacobian_pattern(&config)?;
        let parameters = ParameterBlock::new(&stacked, n, &config)?;
        let pattern = if num_params == 0 {
            Arc::new(stacked)
        } else {
            Arc::new(stacked.column_block(0, n))
        };
        let compression = Compression::new(&pattern, &config)?;
        let stacked_seed = compression.stacked_seed(0, total);
        Ok(JacobianEngine {
            trace_id: trace.id(),
            n,
            config,
            pattern,
            compression,
            stacked_seed,
            parameters,
        })
    }

    /// Id of the trace this engine was built from.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    pub fn config(&self) -> &SparseConfig {
        &self.config
    }

    /// Pattern of `df/dx` (`m x n`).
    pub fn pattern(&self) -> &SparsityPattern {
        &self.pattern
    }

    /// Column colouring, or the row colouring in [`CompressionMode::Row`].
    pub fn coloring(&self) -> &Coloring {
        &self.compression.coloring
    }

    /// Seed (`n x p`), or the row weights (`m x p`) in [`CompressionMode::Row`].
    pub fn seed(&self) -> &SeedMatrix {
        &self.compression.seed
    }

    /// Number of compressed lanes `p`.
    pub fn num_colors(&self) -> usize {
        self.compression.coloring.num_colors()
    }

    pub fn recovery(&self) -> &RecoveryMap {
        &self.compression.recovery
    }

    pub fn num_parameters(&self) -> usize {
        self.parameters.as_ref().map_or(0, |b| b.pattern.ncols())
    }

    /// Pattern of `df/dp`, if the engine has parameters.
    pub fn parameter_pattern(&self) -> Option<&SparsityPattern> {
        self.parameters.as_ref().map(|b| b.pattern.as_ref())
    }

    /// Number of compressed lanes of the `df/dp` block.
    pub fn num_parameter_colors(&self) -> usize {
        self.parameters
            .as_ref()
            .map_or(0, |b| b.compression.coloring.num_colors())
    }

    /// Zero matrix on the engine's pattern, for [`compute_jacobian_into`](Self::compute_jacobian_into).
    pub fn new_matrix<F: Float>(&self) -> SparseMatrix<F> {
        SparseMatrix::from_pattern(Arc::clone(&self.pattern))
    }

    /// Compressed block at `x`: `J(x) S` for column and dense compression,
    /// `(W^T J(x))^T` for row compression.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::StaleTrace`] if `trace` is not the trace the
    /// engine was built from; evaluation errors from the sweep.
    pub fn compute_compressed<F: Float>(
        &self,
        trace: &Trace<F>,
        x: &[F],
    ) -> Result<CompressedJacobian<F>> {
        trace.check_id(self.trace_id)?;
        let inputs = stack_inputs(trace, &[("x", self.n, x)])?;
        let seed = self.stacked_seed.as_ref();
        let compressed = self.compression.compress_block(trace, &inputs, seed, 0)?;
        self.compression.view(&[("compressed Jacobian", &compressed)]);
        Ok(compressed)
    }

    /// Sparse Jacobian at `x`.
    pub fn compute_jacobian<F: Float>(&self, trace: &Trace<F>, x: &[F]) -> Result<SparseMatrix<F>> {
        let mut out = self.new_matrix();
        self.compute_jacobian_into(trace, x, &mut out)?;
        Ok(out)
    }

    /// Sparse Jacobian at `x`, overwriting the values of `out`.
    ///
    /// `out` must have been created on this engine's pattern.
    pub fn compute_jacobian_into<F: Float>(
        &self,
        trace: &Trace<F>,
        x: &[F],
        out: &mut SparseMatrix<F>,
    ) -> Result<()> {
        let compressed = self.compute_compressed(trace, x)?;
        self.compression
            .assemble(&compressed, out, InsertMode::Insert, F::one())
    }

    /// Diagonal of the Jacobian at `x` (length `min(m, n)`).
    pub fn compute_diagonal<F: Float>(&self, trace: &Trace<F>, x: &[F]) -> Result<Vec<F>> {
        let compressed = self.compute_compressed(trace, x)?;
        let mut diag = vec![F::zero(); self.pattern.nrows().min(self.pattern.ncols())];
        self.compression
            .recovery
            .recover_diagonal(&compressed, &mut diag, InsertMode::Insert, F::one())?;
        Ok(diag)
    }

    /// Sparse `df/dp` (`m x num_params`) at `(x, p)`.
    ///
    /// An engine without parameters returns an `m x 0` matrix.
    pub fn compute_parameter_jacobian<F: Float>(
        &self,
        trace: &Trace<F>,
        x: &[F],
        p: &[F],
    ) -> Result<SparseMatrix<F>> {
        trace.check_id(self.trace_id)?;
        let np = self.num_parameters();
        let inputs = stack_inputs(trace, &[("x", self.n, x), ("p", np, p)])?;
        parameter_jacobian(self.parameters.as_ref(), trace, &inputs)
    }
}

/// Shifted Jacobian `dF/dx + a dF/dxdot` of an implicit residual `F(x, xdot)`.
///
/// The residual is recorded over the stacked input `[x; xdot]` (`2n` inputs,
/// `m` outputs), optionally followed by parameters `p`. Both Jacobian blocks
/// are compressed with one colouring of the union of their patterns, so they
/// share a single recovery map and land on the same `m x n` matrix structure.
#[derive(Clone, Debug)]
pub struct ImplicitJacobianEngine {
    trace_id: TraceId,
    n: usize,
    config: SparseConfig,
    pattern: Arc<SparsityPattern>,
    compression: Compression,
    /// Column seeds of the `x` and `xdot` blocks over the stacked input.
    stacked_seeds: Option<(SeedMatrix, SeedMatrix)>,
    parameters: Option<ParameterBlock>,
}

impl ImplicitJacobianEngine {
    /// Build from a trace of `F(x, xdot)` with `n` state variables.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::DimensionMismatch`] unless the trace has `2n`
    /// inputs; [`ConfigurationError::DimensionLimit`] if the limits in
    /// `config` are exceeded.
    pub fn new<F: Float>(trace: &Trace<F>, n: usize, config: SparseConfig) -> Result<Self> {
        Self::with_parameters(trace, n, 0, config)
    }

    /// Build from a trace of `F(x, xdot, p)` recorded over `[x; xdot; p]`.
    ///
    /// The state methods hold `p` at its recorded values;
    /// [`compute_parameter_jacobian`](Self::compute_parameter_jacobian)
    /// evaluates `dF/dp`.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::DimensionMismatch`] unless the trace has
    /// `2n + num_params` inputs.
    pub fn with_parameters<F: Float>(
        trace: &Trace<F>,
        n: usize,
        num_params: usize,
        config: SparseConfig,
    ) -> Result<Self> {
        let total = 2 * n + num_params;
        if trace.num_inputs() != total {
            return Err(ConfigurationError::DimensionMismatch {
                what: if num_params == 0 {
                    "stacked [x; xdot] inputs"
                } else {
                    "stacked [x; xdot; p] inputs"
                },
                expected: total,
                actual: trace.num_inputs(),
            }
            .into());
        }
        let stacked = trace.jacobian_pattern(&config)?;
        let parameters = ParameterBlock::new(&stacked, 2 * n, &config)?;
        let pattern = if num_params == 0 {
            Arc::new(stacked.fold_columns(n))
        } else {
            Arc::new(stacked.column_block(0, 2 * n).fold_columns(n))
        };
        log::debug!(
            "implicit pattern: {} stacked nonzeros folded to {}",
            stacked.nnz(),
            pattern.nnz()
        );
        let compression = Compression::new(&pattern, &config)?;
        let stacked_seeds = compression
            .stacked_seed(0, total)
            .zip(compression.stacked_seed(n, total));
        Ok(ImplicitJacobianEngine {
            trace_id: trace.id(),
            n,
            config,
            pattern,
            compression,
            stacked_seeds,
            parameters,
        })
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// Number of state variables `n`.
    pub fn num_states(&self) -> usize {
        self.n
    }

    pub fn config(&self) -> &SparseConfig {
        &self.config
    }

    /// Union pattern of `dF/dx` and `dF/dxdot` (`m x n`).
    pub fn pattern(&self) -> &SparsityPattern {
        &self.pattern
    }

    pub fn coloring(&self) -> &Coloring {
        &self.compression.coloring
    }

    pub fn num_colors(&self) -> usize {
        self.compression.coloring.num_colors()
    }

    pub fn num_parameters(&self) -> usize {
        self.parameters.as_ref().map_or(0, |b| b.pattern.ncols())
    }

    /// Pattern of `dF/dp`, if the engine has parameters.
    pub fn parameter_pattern(&self) -> Option<&SparsityPattern> {
        self.parameters.as_ref().map(|b| b.pattern.as_ref())
    }

    pub fn num_parameter_colors(&self) -> usize {
        self.parameters
            .as_ref()
            .map_or(0, |b| b.compression.coloring.num_colors())
    }

    pub fn new_matrix<F: Float>(&self) -> SparseMatrix<F> {
        SparseMatrix::from_pattern(Arc::clone(&self.pattern))
    }

    /// Compressed blocks of `dF/dx` and `dF/dxdot` at `(x, xdot)`.
    pub fn compute_compressed<F: Float>(
        &self,
        trace: &Trace<F>,
        x: &[F],
        xdot: &[F],
    ) -> Result<(CompressedJacobian<F>, CompressedJacobian<F>)> {
        trace.check_id(self.trace_id)?;
        let stacked = stack_inputs(trace, &[("x", self.n, x), ("xdot", self.n, xdot)])?;
        let blocks = match &self.stacked_seeds {
            Some((seed_x, seed_xdot)) => (
                trace.forward_compressed(&stacked, seed_x)?,
                trace.forward_compressed(&stacked, seed_xdot)?,
            ),
            None => {
                let (dx, rest) = trace
                    .reverse_compressed(&stacked, &self.compression.seed)?
                    .split_rows(self.n);
                (dx, rest.split_rows(self.n).0)
            }
        };
        self.compression.view(&[
            ("compressed dF/dx", &blocks.0),
            ("compressed dF/dxdot", &blocks.1),
        ]);
        Ok(blocks)
    }

    /// `dF/dx + a dF/dxdot` at `(x, xdot)`.
    pub fn compute_shifted_jacobian<F: Float>(
        &self,
        trace: &Trace<F>,
        x: &[F],
        xdot: &[F],
        a: F,
    ) -> Result<SparseMatrix<F>> {
        let mut out = self.new_matrix();
        self.compute_shifted_jacobian_into(trace, x, xdot, a, &mut out)?;
        Ok(out)
    }

    /// Like [`compute_shifted_jacobian`](Self::compute_shifted_jacobian),
    /// overwriting the values of `out`.
    pub fn compute_shifted_jacobian_into<F: Float>(
        &self,
        trace: &Trace<F>,
        x: &[F],
        xdot: &[F],
        a: F,
        out: &mut SparseMatrix<F>,
    ) -> Result<()> {
        let (dx, dxdot) = self.compute_compressed(trace, x, xdot)?;
        self.compression
            .assemble(&dx, out, InsertMode::Insert, F::one())?;
        self.compression.assemble(&dxdot, out, InsertMode::Add, a)
    }

    /// Diagonal of `dF/dx + a dF/dxdot` (length `min(m, n)`).
    pub fn compute_diagonal<F: Float>(
        &self,
        trace: &Trace<F>,
        x: &[F],
        xdot: &[F],
        a: F,
    ) -> Result<Vec<F>> {
        let (dx, dxdot) = self.compute_compressed(trace, x, xdot)?;
        let recovery = &self.compression.recovery;
        let mut diag = vec![F::zero(); self.pattern.nrows().min(self.n)];
        recovery.recover_diagonal(&dx, &mut diag, InsertMode::Insert, F::one())?;
        recovery.recover_diagonal(&dxdot, &mut diag, InsertMode::Add, a)?;
        Ok(diag)
    }

    /// Sparse `dF/dp` (`m x num_params`) at `(x, xdot, p)`.
    ///
    /// An engine without parameters returns an `m x 0` matrix.
    pub fn compute_parameter_jacobian<F: Float>(
        &self,
        trace: &Trace<F>,
        x: &[F],
        xdot: &[F],
        p: &[F],
    ) -> Result<SparseMatrix<F>> {
        trace.check_id(self.trace_id)?;
        let inputs = stack_inputs(
            trace,
            &[
                ("x", self.n, x),
                ("xdot", self.n, xdot),
                ("p", self.num_parameters(), p),
            ],
        )?;
        parameter_jacobian(self.parameters.as_ref(), trace, &inputs)
    }
}
