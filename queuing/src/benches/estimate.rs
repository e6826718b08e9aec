use criterion::{criterion_group, Criterion};
use queuing::{estimator::estimate, processor::ProcessorSet};
use std::time::Duration;

fn benchmark_estimate(c: &mut Criterion) {
    for processors in [1, 64, 4_096] {
        let costs: Vec<Duration> = (1..=processors).map(Duration::from_micros).collect();
        let set = ProcessorSet::new(&costs).unwrap();
        c.bench_function(
            &format!("{}/processors={}", module_path!(), processors),
            |b| {
                b.iter(|| estimate(&set, 10_000.0).unwrap());
            },
        );
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_estimate,
}
