use am_core::document::parse_document;
use am_core::read_model;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::fmt::Write;

const SMALL_MODEL: &str = r#"
version: 1.0
system:
  name: Shop
personas:
  shopper:
    uses:
      - form: checkout
services:
  orders:
    technologies: [java]
    forms: [checkout]
technologies:
  java:
    quadrant: languagesAndFrameworks
"#;

/// A model with `size` services that each call the next one, own a form
/// used by a persona, and write to their own database.
fn generated_model(size: usize) -> String {
    let mut text = String::from("version: 1.0\npersonas:\n");
    for i in 0..size {
        let _ = write!(text, "  persona-{i}:\n    uses:\n      - form: form-{i}\n");
    }
    text.push_str("services:\n");
    for i in 0..size {
        let _ = write!(
            text,
            "  service-{i}:\n    technologies: stack\n    forms: [form-{i}]\n    dataStores:\n      - database: db-{i}\n    calls:\n      - service: service-{}\n",
            (i + 1) % size
        );
    }
    text.push_str("databases:\n");
    for i in 0..size {
        let _ = write!(text, "  db-{i}:\n    views: [view-{i}]\n");
    }
    text.push_str(
        "technologies:\n  java:\n    quadrant: languagesAndFrameworks\n  postgres:\n    quadrant: platforms\ntechnologyBundles:\n  stack: [java, postgres]\n",
    );
    text.push_str("workflows:\n");
    for i in 0..size {
        let _ = write!(
            text,
            "  flow-{i}:\n    steps:\n      - performer: persona-{i}\n        form: form-{i}\n      - performer: service-{i}\n        view: view-{i}\n"
        );
    }
    text
}

fn bench_small_model(c: &mut Criterion) {
    c.bench_function("read_small_model", |b| {
        b.iter(|| read_model(black_box(SMALL_MODEL)))
    });
}

fn bench_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for size in [10, 100, 1000] {
        let text = generated_model(size);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| parse_document(black_box(text)))
        });
    }
    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_model");
    for size in [10, 100, 1000] {
        let text = generated_model(size);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| read_model(black_box(text)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_small_model, bench_decoding, bench_full_pipeline);
criterion_main!(benches);
