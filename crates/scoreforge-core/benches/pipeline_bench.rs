use criterion::{criterion_group, criterion_main, Criterion};
use scoreforge_core::relativize::Relativizer;
use scoreforge_core::stats::Population;
use scoreforge_core::{
    AttributeConfig, Direction, EngineConfig, ImpactScoreConfig, Pipeline, Product, VerticalConfig,
};
use std::hint::black_box;

const ATTRIBUTES: [(&str, Direction); 6] = [
    ("REPAIR", Direction::Lower),
    ("WARRANTY", Direction::Greater),
    ("POWER", Direction::Lower),
    ("NOISE", Direction::Lower),
    ("WEIGHT", Direction::Lower),
    ("CLASS", Direction::Greater),
];

fn setup_vertical() -> VerticalConfig {
    let mut vertical = VerticalConfig::new("bench");
    let mut impact = ImpactScoreConfig::default();
    for (key, direction) in ATTRIBUTES {
        let mut attribute = AttributeConfig::new(key).scored(direction);
        if key == "REPAIR" || key == "WARRANTY" {
            attribute = attribute.participating_in("DURABILITY");
        }
        vertical = vertical.with_attribute(attribute);
        impact.criterias_ponderation.insert(key.to_string(), 1.0 / ATTRIBUTES.len() as f64);
    }
    vertical.with_impact_score(impact)
}

fn setup_products(count: u64, rng: &mut fastrand::Rng) -> Vec<Product> {
    (0..count)
        .map(|id| {
            let mut product = Product::new(id);
            for (key, _) in ATTRIBUTES {
                // Roughly one value in ten is missing
                if rng.u8(0..10) == 0 {
                    continue;
                }
                let value = if key == "CLASS" {
                    rng.u8(0..7) as f64
                } else {
                    rng.f64() * 100.0
                };
                product = product.with_attribute(key, &format!("{:.2}", value));
            }
            product
        })
        .collect()
}

fn bench_relativize(c: &mut Criterion) {
    let mut rng = fastrand::Rng::with_seed(7);
    let values: Vec<f64> = (0..10_000).map(|_| rng.f64() * 50.0).collect();
    let population = Population::from_values(&values);
    let relativizer = Relativizer::new(10);

    c.bench_function("relativize_sigma", |b| {
        b.iter(|| {
            relativizer.relativize(
                "X",
                black_box(21.0),
                black_box(&population),
                Direction::Greater,
            )
        })
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let mut rng = fastrand::Rng::with_seed(42);
    let vertical = setup_vertical();
    let products = setup_products(5_000, &mut rng);

    let parallel = Pipeline::from_config(EngineConfig::default()).unwrap();
    let sequential = Pipeline::from_config(EngineConfig {
        parallel: false,
        ..Default::default()
    })
    .unwrap();

    let mut group = c.benchmark_group("pipeline_5k");
    group.sample_size(20);
    group.bench_function("parallel", |b| {
        b.iter_batched_ref(
            || products.clone(),
            |batch| parallel.run(black_box(&vertical), batch),
            criterion::BatchSize::LargeInput,
        )
    });
    group.bench_function("sequential", |b| {
        b.iter_batched_ref(
            || products.clone(),
            |batch| sequential.run(black_box(&vertical), batch),
            criterion::BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_relativize, bench_pipeline);
criterion_main!(benches);
