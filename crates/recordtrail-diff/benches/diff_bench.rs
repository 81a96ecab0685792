use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use recordtrail_diff::{StructuredDiff, line_stats, unified_diff};

/// Build a record list document with `n` linked records
fn record_list(n: usize, changed: usize) -> String {
    (0..n)
        .map(|i| {
            let value = if i == changed { "edited" } else { "original" };
            format!("- uuid: r{i}\n  person_id: p{}\n  note: {value}\n", i % 7)
        })
        .collect()
}

/// Build a nested mapping document with `n` sections
fn nested_document(n: usize, changed: usize) -> String {
    (0..n)
        .map(|i| {
            let year = if i == changed { 2000 } else { 1900 + i };
            format!("section_{i}:\n  title: Section {i}\n  meta:\n    year: {year}\n")
        })
        .collect()
}

fn structured_benchmarks(c: &mut Criterion) {
    let engine = StructuredDiff::default();
    let mut group = c.benchmark_group("structured");

    for size in [10, 100, 1000] {
        let old = record_list(size, usize::MAX);
        let new = record_list(size, size / 2);
        group.bench_with_input(BenchmarkId::new("record_list", size), &size, |b, _| {
            b.iter(|| engine.diff_text(&old, &new, true))
        });

        let old = nested_document(size, usize::MAX);
        let new = nested_document(size, size / 2);
        group.bench_with_input(BenchmarkId::new("nested_mapping", size), &size, |b, _| {
            b.iter(|| engine.diff_text(&old, &new, false))
        });
    }

    group.finish();
}

fn line_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("lines");

    for size in [10, 100, 1000] {
        let old = record_list(size, usize::MAX);
        let new = record_list(size, size / 2);
        group.bench_with_input(BenchmarkId::new("line_stats", size), &size, |b, _| {
            b.iter(|| line_stats(&old, &new))
        });
        group.bench_with_input(BenchmarkId::new("unified_diff", size), &size, |b, _| {
            b.iter(|| unified_diff("links.yaml", &old, &new))
        });
    }

    group.finish();
}

criterion_group!(benches, structured_benchmarks, line_benchmarks);
criterion_main!(benches);
