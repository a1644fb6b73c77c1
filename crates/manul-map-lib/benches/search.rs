//! Search and scene benchmarks for manul-map-lib
//!
//! Run with: cargo bench --package manul-map-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use manul_map_lib::{GeoData, PointRecord, SearchIndex, Scene, VisibilitySet};

const COUNTRIES: [&str; 4] = ["Россия", "Монголия", "Казахстан", "Китай"];
const REGIONS: [&str; 5] = ["Тыва", "Алтай", "Забайкальский край", "Бурятия", "Синьцзян"];

/// Generate point records spread over the manul's range
fn generate_records(count: usize, prefix: &str) -> Vec<PointRecord> {
    (0..count)
        .map(|i| PointRecord {
            name: format!("{prefix} №{i}"),
            country: COUNTRIES[i % COUNTRIES.len()].to_string(),
            region: (i % 3 != 0).then(|| REGIONS[i % REGIONS.len()].to_string()),
            lat: 40.0 + (i % 150) as f64 * 0.1,
            lng: 80.0 + (i / 150) as f64 * 0.5,
        })
        .collect()
}

fn build_scene(zoos: usize, reserves: usize) -> Scene {
    Scene::build(GeoData {
        zoos: generate_records(zoos, "Зоопарк"),
        reserves: generate_records(reserves, "Заповедник"),
        ..Default::default()
    })
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [100usize, 500] {
        let scene = build_scene(size / 2, size / 2);
        let index = SearchIndex::build(scene.features());
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("empty_query", size), &index, |b, index| {
            b.iter(|| index.filter(""));
        });
        group.bench_with_input(BenchmarkId::new("region_query", size), &index, |b, index| {
            b.iter(|| index.filter("  ЗАБАЙКАЛЬСКИЙ   край "));
        });
        group.bench_with_input(BenchmarkId::new("no_match", size), &index, |b, index| {
            b.iter(|| index.filter("снежный барс"));
        });
    }

    group.finish();
}

fn bench_scene(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene");
    group.sample_size(20);

    let zoos = generate_records(250, "Зоопарк");
    let reserves = generate_records(250, "Заповедник");
    group.bench_function("build_500", |b| {
        b.iter(|| {
            Scene::build(GeoData {
                zoos: zoos.clone(),
                reserves: reserves.clone(),
                ..Default::default()
            })
        });
    });

    let scene = build_scene(250, 250);
    group.bench_function("bounds_all_500", |b| {
        b.iter(|| scene.bounds_of(&VisibilitySet::all()));
    });

    group.bench_function("index_500", |b| {
        b.iter(|| SearchIndex::build(scene.features()));
    });

    group.finish();
}

criterion_group!(benches, bench_filter, bench_scene);
criterion_main!(benches);
