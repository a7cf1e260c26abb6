//! FILENAME: benches/pivot_calculations.rs
//! Cross-tab computation benchmarks over synthetic sales data.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use engine::{Row, Scalar};
use pivot_engine::{compute, render, Aggregation, PivotConfig};

const REGIONS: [&str; 5] = ["East", "West", "North", "South", "Central"];
const CATEGORIES: [&str; 8] = [
    "1. 食品",
    "2. 服饰",
    "3. 家电",
    "4. 图书",
    "日用品",
    "进口零食",
    "夏季衣物",
    "其他杂项",
];

fn synthetic_rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            let mut row = Row::new();
            row.insert(
                "region".to_string(),
                Scalar::Text(REGIONS[i % REGIONS.len()].to_string()),
            );
            row.insert(
                "category".to_string(),
                Scalar::Text(CATEGORIES[i % CATEGORIES.len()].to_string()),
            );
            // Mix raw numbers with formatted text amounts.
            let amount = if i % 3 == 0 {
                Scalar::Text(format!("¥{},{:03}", i % 9 + 1, i % 1000))
            } else {
                Scalar::Number((i % 5000) as f64)
            };
            row.insert("amount".to_string(), amount);
            row
        })
        .collect()
}

fn config() -> PivotConfig {
    let mut cfg = PivotConfig::count_by("category");
    cfg.column_field = Some("region".to_string());
    cfg.value_field = Some("amount".to_string());
    cfg.aggregation = Aggregation::Sum;
    cfg
}

fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("pivot_compute");
    for size in [1_000usize, 10_000, 50_000] {
        let rows = synthetic_rows(size);
        let cfg = config();
        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| compute(black_box(rows), black_box(&cfg)));
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let rows = synthetic_rows(10_000);
    let table = compute(&rows, &config());
    c.bench_function("pivot_render_folded", |b| {
        b.iter(|| render(black_box(&table), black_box(5)));
    });
}

criterion_group!(benches, bench_compute, bench_render);
criterion_main!(benches);
