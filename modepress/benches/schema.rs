//! Schema Benchmarks
//!
//! Every write clones the model's schema before setting client data on it,
//! so clone, set and serialize sit on the hot path of `create_instance` and
//! `update`. Projection is measured without foreign key expansion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use modepress::collections::posts;
use modepress::prelude::*;
use serde_json::Value;
use uuid::Uuid;

fn post_data(tags: usize) -> Value {
    json!({
        "title": "Benchmarking schemas",
        "slug": "benchmarking-schemas",
        "brief": "<b>Short</b> introduction",
        "content": "<p>Body with <em>markup</em></p>",
        "public": true,
        "tags": (0..tags).map(|i| format!("tag-{}", i)).collect::<Vec<_>>(),
    })
}

fn benchmark_schema_clone(c: &mut Criterion) {
    let model = posts::model().unwrap();

    c.bench_function("schema_clone", |b| {
        b.iter(|| black_box(model.schema().clone()))
    });
}

fn benchmark_schema_set(c: &mut Criterion) {
    let model = posts::model().unwrap();
    let mut group = c.benchmark_group("schema_set");

    for tags in [0, 10, 100] {
        let data = post_data(tags);
        group.bench_with_input(BenchmarkId::from_parameter(tags), &data, |b, data| {
            b.iter(|| {
                let mut schema = model.schema().clone();
                schema.set(black_box(data)).unwrap();
                schema
            })
        });
    }
    group.finish();
}

fn benchmark_schema_serialize(c: &mut Criterion) {
    let model = posts::model().unwrap();
    let mut schema = model.schema().clone();
    schema.set(&post_data(10)).unwrap();

    c.bench_function("schema_serialize", |b| b.iter(|| black_box(schema.serialize())));
}

fn benchmark_schema_projection(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let registry = ModelRegistry::new();
    let model = posts::model().unwrap();
    let mut schema = model.schema().clone();
    schema.set(&post_data(10)).unwrap();
    let id = Uuid::new_v4();

    for (name, options) in [
        ("schema_projection", JsonOptions::default()),
        ("schema_projection_verbose", JsonOptions::verbose()),
    ] {
        c.bench_function(name, |b| {
            b.iter(|| {
                runtime
                    .block_on(schema.get_as_json(id, posts::NAME, &options, &registry))
                    .unwrap()
            })
        });
    }
}

criterion_group!(
    benches,
    benchmark_schema_clone,
    benchmark_schema_set,
    benchmark_schema_serialize,
    benchmark_schema_projection
);
criterion_main!(benches);
