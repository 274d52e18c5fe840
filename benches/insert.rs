//! Insert and scan throughput over a temp-file table.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use featherdb::{Row, Table};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::hint::black_box;
use tempfile::tempdir;

fn numbered_row(key: u32) -> Row {
    Row::new(
        key as i32,
        &format!("user{}", key),
        &format!("person{}@example.com", key),
    )
    .unwrap()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_insert");

    for count in [100u32, 250].iter() {
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("sequential", count), count, |b, &count| {
            b.iter_with_setup(
                || {
                    let dir = tempdir().unwrap();
                    let table = Table::open(dir.path().join("bench.db")).unwrap();
                    (dir, table)
                },
                |(dir, mut table)| {
                    for key in 1..=count {
                        table.insert(&numbered_row(key)).unwrap();
                    }
                    (dir, table)
                },
            );
        });

        group.bench_with_input(BenchmarkId::new("shuffled", count), count, |b, &count| {
            let mut keys: Vec<u32> = (1..=count).collect();
            keys.shuffle(&mut StdRng::seed_from_u64(42));

            b.iter_with_setup(
                || {
                    let dir = tempdir().unwrap();
                    let table = Table::open(dir.path().join("bench.db")).unwrap();
                    (dir, table)
                },
                |(dir, mut table)| {
                    for key in &keys {
                        table.insert(&numbered_row(*key)).unwrap();
                    }
                    (dir, table)
                },
            );
        });
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let mut table = Table::open(dir.path().join("bench.db")).unwrap();
    for key in 1..=250 {
        table.insert(&numbered_row(key)).unwrap();
    }

    let mut group = c.benchmark_group("table_scan");
    group.throughput(Throughput::Elements(250));
    group.bench_function("full_scan_250", |b| {
        b.iter(|| {
            let rows = table.scan().unwrap().map(|row| row.unwrap()).count();
            black_box(rows)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_insert, bench_scan);
criterion_main!(benches);
