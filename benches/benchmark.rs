// Matching benchmarks: similarity matrix and ranking at portfolio scale
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use std::collections::BTreeMap;
use venturematch::{
    similarity_matrix, top_aggregate_matches, top_best_matches, CollectionKind, Embedding,
    EntityCollection, EntityRecord,
};

const DIM: usize = 1536;

fn generate_random_embedding(rng: &mut impl Rng, dim: usize) -> Embedding {
    let data: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0f32..1.0f32)).collect();
    Embedding::new(data)
}

fn generate_collection(kind: CollectionKind, size: usize, dim: usize) -> EntityCollection {
    let mut rng = rand::rng();
    let records = (0..size)
        .map(|i| {
            let mut fields = BTreeMap::new();
            fields.insert("name".to_string(), format!("entity {i}"));
            EntityRecord::new(i, fields, format!("Name: entity {i}"), 3)
                .with_embedding(generate_random_embedding(&mut rng, dim))
                .unwrap()
        })
        .collect();
    EntityCollection::from_records(kind, records)
}

fn benchmark_similarity_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity_matrix");
    group.sample_size(20);

    let portfolio = generate_collection(CollectionKind::Portfolio, 500, DIM);
    for size in [100, 500, 1000].iter() {
        let jobs = generate_collection(CollectionKind::Jobs, *size, DIM);
        group.bench_with_input(BenchmarkId::new("jobs_x_500", size), size, |b, _| {
            b.iter(|| similarity_matrix(black_box(&jobs), black_box(&portfolio)).unwrap());
        });
    }

    group.finish();
}

fn benchmark_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");

    let jobs = generate_collection(CollectionKind::Jobs, 1000, DIM);
    let portfolio = generate_collection(CollectionKind::Portfolio, 500, DIM);
    let matrix = similarity_matrix(&jobs, &portfolio).unwrap();

    group.bench_function("best_match_top_10", |b| {
        b.iter(|| top_best_matches(&jobs, &portfolio, black_box(&matrix), 10).unwrap());
    });
    group.bench_function("aggregate_top_15", |b| {
        b.iter(|| top_aggregate_matches(&jobs, &portfolio, black_box(&matrix), 15, 3).unwrap());
    });

    group.finish();
}

criterion_group!(benches, benchmark_similarity_matrix, benchmark_ranking);
criterion_main!(benches);
