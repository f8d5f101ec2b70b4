use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jacolor::{record, CompressionMode, ImplicitJacobianEngine, JacobianEngine, SparseConfig};

#[path = "common/mod.rs"]
mod common;
use common::*;

fn bench_setup(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_setup");
    for m in [10, 30, 60] {
        let u = heat_initial(m, m);
        let (trace, _) = record(|v| heat_rhs(v, m, m), &u);

        group.bench_with_input(BenchmarkId::new("heat", m), &trace, |b, trace| {
            b.iter(|| black_box(JacobianEngine::new(black_box(trace), SparseConfig::default())))
        });
    }
    group.finish();
}

fn bench_heat(c: &mut Criterion) {
    let mut group = c.benchmark_group("heat_jacobian");
    for m in [10, 30, 60] {
        let u = heat_initial(m, m);
        let (trace, _) = record(|v| heat_rhs(v, m, m), &u);

        for (name, compression) in [("column", CompressionMode::Column), ("row", CompressionMode::Row)] {
            let config = SparseConfig {
                compression,
                ..SparseConfig::default()
            };
            let Ok(engine) = JacobianEngine::new(&trace, config) else {
                continue;
            };
            let mut jac = engine.new_matrix();
            group.bench_with_input(BenchmarkId::new(name, m), &u, |b, u| {
                b.iter(|| black_box(engine.compute_jacobian_into(&trace, black_box(u), &mut jac)))
            });
        }

        if m <= 30 {
            group.bench_with_input(BenchmarkId::new("dense", m), &u, |b, u| {
                b.iter(|| black_box(trace.jacobian(black_box(u))))
            });
        }
    }
    group.finish();
}

fn bench_gray_scott(c: &mut Criterion) {
    let mut group = c.benchmark_group("gray_scott_shifted");
    for m in [8, 16, 32] {
        let (z, zdot) = gray_scott_state(m);
        let stacked: Vec<f64> = z.iter().chain(&zdot).copied().collect();
        let (trace, _) = record(|v| gray_scott(v, m), &stacked);
        let Ok(engine) = ImplicitJacobianEngine::new(&trace, z.len(), SparseConfig::default())
        else {
            continue;
        };
        let mut jac = engine.new_matrix();

        group.bench_with_input(BenchmarkId::new("assemble", m), &z, |b, z| {
            b.iter(|| {
                black_box(engine.compute_shifted_jacobian_into(
                    &trace,
                    black_box(z),
                    &zdot,
                    10.0,
                    &mut jac,
                ))
            })
        });

        group.bench_with_input(BenchmarkId::new("diagonal", m), &z, |b, z| {
            b.iter(|| black_box(engine.compute_diagonal(&trace, black_box(z), &zdot, 10.0)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_setup, bench_heat, bench_gray_scott);
criterion_main!(benches);
