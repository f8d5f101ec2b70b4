mod common;

use approx::assert_relative_eq;
use common::*;
use jacolor::{
    record, CompressionMode, ConfigurationError, Error, ImplicitJacobianEngine, SparseConfig,
};

fn state(n: usize) -> (Vec<f64>, Vec<f64>) {
    let u: Vec<f64> = (0..n).map(|i| (0.3 * i as f64).sin()).collect();
    let udot: Vec<f64> = (0..n).map(|i| 0.1 * i as f64 - 0.2).collect();
    (u, udot)
}

fn stacked(u: &[f64], udot: &[f64]) -> Vec<f64> {
    u.iter().chain(udot).copied().collect()
}

/// `dF/dx + a dF/dxdot` from the dense Jacobian of the stacked trace.
fn dense_shifted(trace: &jacolor::Trace<f64>, z: &[f64], n: usize, a: f64) -> Vec<Vec<f64>> {
    trace
        .jacobian(z)
        .unwrap()
        .into_iter()
        .map(|row| (0..n).map(|j| row[j] + a * row[n + j]).collect())
        .collect()
}

#[test]
fn shifted_jacobian_matches_dense() {
    let n = 9;
    let (u, udot) = state(n);
    let z = stacked(&u, &udot);
    let (trace, _) = record(|v| reaction_diffusion(v), &z);
    let engine = ImplicitJacobianEngine::new(&trace, n, SparseConfig::default()).unwrap();

    // Union of the tridiagonal dF/du and the diagonal dF/dudot.
    assert_eq!(engine.pattern().nnz(), 3 * n - 2);
    assert_eq!(engine.num_colors(), 3);

    for a in [0.0, 1.0, 25.0] {
        let jac = engine.compute_shifted_jacobian(&trace, &u, &udot, a).unwrap();
        assert_matches_dense(&jac, &dense_shifted(&trace, &z, n, a), 1e-12);
    }
}

#[test]
fn shifted_entries_by_hand() {
    let n = 5;
    let (u, udot) = state(n);
    let (trace, _) = record(|v| reaction_diffusion(v), &stacked(&u, &udot));
    let engine = ImplicitJacobianEngine::new(&trace, n, SparseConfig::default()).unwrap();
    let a = 4.0;
    let jac = engine.compute_shifted_jacobian(&trace, &u, &udot, a).unwrap();

    for i in 0..n {
        assert_relative_eq!(jac.get(i, i), 2.0 + 2.0 * u[i] + a, epsilon = 1e-14);
        if i > 0 {
            assert_eq!(jac.get(i, i - 1), -1.0);
        }
        if i + 1 < n {
            assert_eq!(jac.get(i, i + 1), -1.0);
        }
    }
}

#[test]
fn diagonal_only() {
    let n = 6;
    let (u, udot) = state(n);
    let (trace, _) = record(|v| reaction_diffusion(v), &stacked(&u, &udot));
    let engine = ImplicitJacobianEngine::new(&trace, n, SparseConfig::default()).unwrap();
    let a = 0.5;

    let diag = engine.compute_diagonal(&trace, &u, &udot, a).unwrap();
    let full = engine.compute_shifted_jacobian(&trace, &u, &udot, a).unwrap();
    assert_eq!(diag, full.diagonal());
}

#[test]
fn row_and_dense_modes_agree() {
    let n = 8;
    let (u, udot) = state(n);
    let (trace, _) = record(|v| reaction_diffusion(v), &stacked(&u, &udot));
    let reference = ImplicitJacobianEngine::new(&trace, n, SparseConfig::default())
        .unwrap()
        .compute_shifted_jacobian(&trace, &u, &udot, 3.0)
        .unwrap();

    for compression in [CompressionMode::Row, CompressionMode::Dense] {
        let config = SparseConfig {
            compression,
            ..SparseConfig::default()
        };
        let engine = ImplicitJacobianEngine::new(&trace, n, config).unwrap();
        let jac = engine.compute_shifted_jacobian(&trace, &u, &udot, 3.0).unwrap();
        for (a, b) in jac.values().iter().zip(reference.values()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
        let diag = engine.compute_diagonal(&trace, &u, &udot, 3.0).unwrap();
        for (a, b) in diag.iter().zip(reference.diagonal()) {
            assert_relative_eq!(*a, b, epsilon = 1e-12);
        }
    }
}

#[test]
fn into_overwrites_previous_values() {
    let n = 4;
    let (u, udot) = state(n);
    let (trace, _) = record(|v| reaction_diffusion(v), &stacked(&u, &udot));
    let engine = ImplicitJacobianEngine::new(&trace, n, SparseConfig::default()).unwrap();

    let mut jac = engine.new_matrix();
    engine
        .compute_shifted_jacobian_into(&trace, &u, &udot, 10.0, &mut jac)
        .unwrap();
    engine
        .compute_shifted_jacobian_into(&trace, &u, &udot, 1.0, &mut jac)
        .unwrap();
    let fresh = engine.compute_shifted_jacobian(&trace, &u, &udot, 1.0).unwrap();
    assert_eq!(jac, fresh);
}

#[test]
fn odd_input_count_is_rejected() {
    let (trace, _) = record(|v| vec![v[0] + v[1] + v[2]], &[1.0_f64, 2.0, 3.0]);
    let err = ImplicitJacobianEngine::new(&trace, 1, SparseConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::DimensionMismatch {
            expected: 2,
            actual: 3,
            ..
        })
    ));
}

#[test]
fn state_length_is_checked() {
    let n = 3;
    let (u, udot) = state(n);
    let (trace, _) = record(|v| reaction_diffusion(v), &stacked(&u, &udot));
    let engine = ImplicitJacobianEngine::new(&trace, n, SparseConfig::default()).unwrap();
    assert!(engine
        .compute_shifted_jacobian(&trace, &u[..2], &udot, 1.0)
        .is_err());
}
