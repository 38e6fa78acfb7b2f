//! Condition compilation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use restoc_bench::utils::{id_list, mixed_filter, sample_structure};
use restoc_codec::Value;
use restoc_core::{process_value, Escaper};
use restoc_exec::RecordingExecutor;

/// Benchmark single-value predicates.
fn bench_process_value(c: &mut Criterion) {
    let structure = sample_structure();
    let exec = RecordingExecutor::new();
    let esc = Escaper::new(&exec, "primary");
    let mut group = c.benchmark_group("process_value");

    let cases = [
        ("uint_eq", "age", Value::Integer(42)),
        ("text_eq", "email", Value::from("o'brien@example.com")),
        ("null", "name", Value::Null),
        ("between", "age", Value::map([("between", Value::from(vec![18, 65]))])),
        ("timestamp", "created", Value::Integer(1_700_000_000)),
    ];
    for (name, field, value) in &cases {
        group.bench_function(*name, |b| {
            b.iter(|| {
                let sql = process_value(&structure, &esc, black_box(field), black_box(value))
                    .unwrap();
                black_box(sql);
            });
        });
    }

    group.finish();
}

/// Benchmark IN lists of growing length.
fn bench_in_lists(c: &mut Criterion) {
    let structure = sample_structure();
    let exec = RecordingExecutor::new();
    let esc = Escaper::new(&exec, "primary");
    let mut group = c.benchmark_group("in_list");

    for count in [10, 100, 1000] {
        let ids = id_list(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &ids, |b, ids| {
            b.iter(|| {
                let sql = process_value(&structure, &esc, "_id", black_box(ids)).unwrap();
                black_box(sql);
            });
        });
    }

    group.finish();
}

/// Benchmark whole filters.
fn bench_filter(c: &mut Criterion) {
    let structure = sample_structure();
    let exec = RecordingExecutor::new();
    let esc = Escaper::new(&exec, "primary");
    let filter = mixed_filter();

    c.bench_function("filter_compile", |b| {
        b.iter(|| {
            let terms = black_box(&filter).compile(&structure, &esc).unwrap();
            black_box(terms);
        });
    });
}

criterion_group!(benches, bench_process_value, bench_in_lists, bench_filter);
criterion_main!(benches);
