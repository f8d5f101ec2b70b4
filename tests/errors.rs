mod common;

use std::sync::Arc;

use common::*;
use jacolor::{
    record, Coloring, ConfigurationError, ConsistencyError, Error, EvaluationError, InsertMode,
    JacobianEngine, RecoveryMap, SparseConfig, SparseMatrix, SparsityPattern,
};
use num_traits::Float;

#[test]
fn stale_trace_is_rejected() {
    let x = log_point(6);
    let (trace, _) = record(|v| three_by_six(v), &x);
    let (other, _) = record(|v| three_by_six(v), &x);
    let engine = JacobianEngine::new(&trace, SparseConfig::default()).unwrap();

    let err = engine.compute_jacobian(&other, &x).unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(
        err,
        Error::Configuration(ConfigurationError::StaleTrace {
            expected: trace.id(),
            actual: other.id(),
        })
    );
}

#[test]
fn dimension_limits() {
    let x = log_point(6);
    let (trace, _) = record(|v| three_by_six(v), &x);

    let config = SparseConfig {
        max_cols: 5,
        ..SparseConfig::default()
    };
    let err = JacobianEngine::new(&trace, config).unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::DimensionLimit {
            actual: 6,
            limit: 5,
            ..
        })
    ));

    let config = SparseConfig {
        max_rows: 2,
        ..SparseConfig::default()
    };
    assert!(JacobianEngine::new(&trace, config).is_err());
}

#[test]
fn wrong_point_length() {
    let x = log_point(6);
    let (trace, _) = record(|v| three_by_six(v), &x);
    let engine = JacobianEngine::new(&trace, SparseConfig::default()).unwrap();
    let err = engine.compute_jacobian(&trace, &x[..5]).unwrap_err();
    assert!(matches!(
        err,
        Error::Configuration(ConfigurationError::DimensionMismatch {
            expected: 6,
            actual: 5,
            ..
        })
    ));
}

#[test]
fn domain_error_is_recoverable() {
    let x = [2.0_f64, 1.0];
    let (trace, _) = record(|v| vec![v[0].ln() * v[1], v[1].sqrt()], &x);
    let engine = JacobianEngine::new(&trace, SparseConfig::default()).unwrap();
    assert!(engine.compute_jacobian(&trace, &x).is_ok());

    // ln(-1) is NaN.
    let err = engine.compute_jacobian(&trace, &[-1.0, 1.0]).unwrap_err();
    assert!(!err.is_fatal());
    assert!(matches!(
        err,
        Error::Evaluation(EvaluationError::NonFinite { output: 0, .. })
    ));

    // sqrt has an infinite derivative at 0 while the value stays finite.
    let err = engine.compute_jacobian(&trace, &[2.0, 0.0]).unwrap_err();
    assert!(matches!(
        err,
        Error::Evaluation(EvaluationError::NonFiniteDerivative { row: 1, .. })
    ));
}

#[test]
fn colour_collision_is_fatal() {
    let pattern = Arc::new(SparsityPattern::from_rows(3, vec![vec![0, 1], vec![1, 2]]).unwrap());
    let bad = Coloring::from_colors(vec![0, 1, 1]);
    let err = RecoveryMap::new(pattern, &bad).unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(
        err,
        Error::Consistency(ConsistencyError::ColourCollision {
            row: 1,
            first: 1,
            second: 2,
            colour: 1,
        })
    );
}

#[test]
fn colouring_of_wrong_size() {
    let pattern = Arc::new(SparsityPattern::identity(3));
    let err = RecoveryMap::new(pattern, &Coloring::trivial(2)).unwrap_err();
    assert!(matches!(
        err,
        Error::Consistency(ConsistencyError::ColouringSize {
            colouring: 2,
            pattern: 3
        })
    ));
}

#[test]
fn matrix_from_another_pattern() {
    let x = log_point(6);
    let (trace, _) = record(|v| three_by_six(v), &x);
    let engine = JacobianEngine::new(&trace, SparseConfig::default()).unwrap();
    let mut foreign: SparseMatrix<f64> = SparseMatrix::from_pattern(Arc::new(SparsityPattern::identity(3)));
    let err = engine
        .compute_jacobian_into(&trace, &x, &mut foreign)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Consistency(ConsistencyError::PatternMismatch(_))
    ));

    let jc = engine.compute_compressed(&trace, &x).unwrap();
    let mut ok = engine.new_matrix();
    engine
        .recovery()
        .recover_into(&jc, &mut ok, InsertMode::Insert, 1.0)
        .unwrap();
}

#[test]
fn error_messages() {
    let err: Error = ConfigurationError::DimensionLimit {
        what: "row",
        actual: 10,
        limit: 4,
    }
    .into();
    assert_eq!(
        err.to_string(),
        "row dimension 10 exceeds the configured limit of 4"
    );
}
