//! Plan construction benchmark suite
//!
//! - Full plan builds at the reference density and at denser sweeps
//! - Geometric stepping across a whole series
//! - Trial-count evaluation inside and outside the interpolation window

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use uniques_sweep_bench::{build_plan, GeometricStepper, PlanParams, TrialPolicy};

fn bench_build_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_plan");

    for u_ppo in [1u32, 4, 16, 64] {
        let params = PlanParams {
            u_ppo,
            ..PlanParams::default()
        };
        group.bench_with_input(BenchmarkId::new("u_ppo", u_ppo), &params, |bencher, p| {
            bencher.iter(|| build_plan(black_box(p)))
        });
    }

    group.finish();
}

fn bench_stepper(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometric_stepper");

    for ppo in [1u32, 16, 256] {
        let stepper = GeometricStepper::new(ppo).expect("valid density");
        group.bench_with_input(BenchmarkId::new("series_to_2^30", ppo), &stepper, |bencher, s| {
            bencher.iter(|| {
                s.series(1, black_box(1 << 30))
                    .map(|series| series.count())
                    .unwrap_or_default()
            })
        });
    }

    group.finish();
}

fn bench_trials(c: &mut Criterion) {
    let mut group = c.benchmark_group("trial_policy");
    let policy = TrialPolicy::new(4, 20, 4, 24).expect("valid bounds");

    group.bench_function("saturated", |bencher| {
        bencher.iter(|| policy.trials_for(black_box(8)))
    });
    group.bench_function("interpolated", |bencher| {
        bencher.iter(|| policy.trials_for(black_box(12_345)))
    });

    group.finish();
}

criterion_group!(benches, bench_build_plan, bench_stepper, bench_trials);
criterion_main!(benches);
