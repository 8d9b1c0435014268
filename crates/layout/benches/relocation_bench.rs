//! Benchmarks for module relocation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tqec_pack_layout::{
    placement_cost, seed_linear, Config, Loop, LoopType, ModuleFactory, Relocation, SaConfig,
};

fn loops(count: i64) -> Vec<Loop> {
    (0..count)
        .map(|i| {
            let loop_type = if i % 2 == 0 {
                LoopType::Primal
            } else {
                LoopType::Dual
            };
            Loop::new(i, loop_type)
                .with_cross(vec![(i + 1) % count])
                .with_pins((i % 3) as u32)
        })
        .collect()
}

fn relocation_benchmark(c: &mut Criterion) {
    let modules = ModuleFactory::new().create_all(&loops(20));
    let config = Config::default().with_sa(
        SaConfig::default()
            .with_iterations_per_temp(100)
            .with_cooling_rate(0.9)
            .with_seed(1),
    );
    let relocation = Relocation::new(config);

    c.bench_function("relocate_20_modules", |b| {
        b.iter(|| {
            let mut ms = modules.clone();
            let report = relocation.run(black_box(&mut ms));
            black_box(report)
        })
    });
}

fn cost_benchmark(c: &mut Criterion) {
    let mut modules = ModuleFactory::new().create_all(&loops(200));
    seed_linear(&mut modules);

    c.bench_function("cost_200_modules_sequential", |b| {
        b.iter(|| black_box(placement_cost(black_box(&modules), usize::MAX)))
    });
    c.bench_function("cost_200_modules_parallel", |b| {
        b.iter(|| black_box(placement_cost(black_box(&modules), 1)))
    });
}

criterion_group!(benches, relocation_benchmark, cost_benchmark);
criterion_main!(benches);
