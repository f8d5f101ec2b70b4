mod common;

use std::sync::Mutex;

use common::*;
use jacolor::{record, ImplicitJacobianEngine, JacobianEngine, SparseConfig};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Keeps the first line of every debug record.
struct Capture {
    lines: Mutex<Vec<String>>,
}

impl Log for Capture {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        let message = record.args().to_string();
        if let Some(first) = message.lines().next() {
            self.lines.lock().unwrap().push(first.to_owned());
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    lines: Mutex::new(Vec::new()),
};

fn install() {
    let _ = log::set_logger(&CAPTURE);
    log::set_max_level(LevelFilter::Debug);
}

fn count(label: &str) -> usize {
    CAPTURE
        .lines
        .lock()
        .unwrap()
        .iter()
        .filter(|line| line.as_str() == label)
        .count()
}

fn viewing() -> SparseConfig {
    SparseConfig {
        view_compressed: true,
        ..SparseConfig::default()
    }
}

#[test]
fn compressed_jacobian_is_logged_once_per_engine() {
    install();
    let x = log_point(6);
    let (trace, _) = record(|v| three_by_six(v), &x);

    let quiet = JacobianEngine::new(&trace, SparseConfig::default()).unwrap();
    quiet.compute_jacobian(&trace, &x).unwrap();
    assert_eq!(count("compressed Jacobian"), 0);

    let engine = JacobianEngine::new(&trace, viewing()).unwrap();
    for _ in 0..3 {
        engine.compute_jacobian(&trace, &x).unwrap();
    }
    engine.compute_diagonal(&trace, &x).unwrap();
    assert_eq!(count("compressed Jacobian"), 1);

    // Clones share the flag.
    engine.clone().compute_jacobian(&trace, &x).unwrap();
    assert_eq!(count("compressed Jacobian"), 1);

    let second = JacobianEngine::new(&trace, viewing()).unwrap();
    second.compute_jacobian(&trace, &x).unwrap();
    assert_eq!(count("compressed Jacobian"), 2);
}

#[test]
fn implicit_blocks_are_logged_once() {
    install();
    let n = 5;
    let z: Vec<f64> = (0..2 * n).map(|i| 0.1 * i as f64).collect();
    let (trace, _) = record(|v| reaction_diffusion(v), &z);
    let engine = ImplicitJacobianEngine::new(&trace, n, viewing()).unwrap();
    for a in [1.0, 2.0, 3.0] {
        engine
            .compute_shifted_jacobian(&trace, &z[..n], &z[n..], a)
            .unwrap();
    }
    assert_eq!(count("compressed dF/dx"), 1);
    assert_eq!(count("compressed dF/dxdot"), 1);
}
