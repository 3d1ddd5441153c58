use std::io::Cursor;

use criterion::{criterion_group, criterion_main, Criterion};
use flatops::core::key::KeySpec;
use flatops::core::row::Row;
use flatops::io::SortedFileSearcher;
use flatops::operators::traits::rows_ok;
use flatops::operators::{AggFunction, GroupBy, GroupByOptions, HashJoin, SetOpOptions, SetOperator};

fn make_rows(rows: usize, keys: usize) -> Vec<Row> {
    (0..rows)
        .map(|i| {
            vec![
                format!("key-{}", i % keys),
                format!("group-{}", i % 4),
                ((i % 10) as f64).to_string(),
            ]
        })
        .collect()
}

fn bench_join(c: &mut Criterion) {
    let left = make_rows(10_000, 2_000);
    let right = make_rows(2_000, 2_000);
    let op = HashJoin::new(SetOpOptions::new(KeySpec::single(0), KeySpec::single(0)))
        .with_insert_columns(vec![2]);
    c.bench_function("hash_join_10k", |b| {
        b.iter(|| {
            let mut out: Vec<Row> = Vec::new();
            op.run(rows_ok(left.clone()), rows_ok(right.clone()), &mut out)
                .unwrap();
            out
        })
    });
}

fn bench_group_by(c: &mut Criterion) {
    let rows = make_rows(10_000, 100);
    let options = GroupByOptions::new(KeySpec::single(1), vec![2], AggFunction::Sum);
    let op = GroupBy::new(options).unwrap();
    c.bench_function("group_by_sum_10k", |b| {
        b.iter(|| {
            let mut out: Vec<Row> = Vec::new();
            op.run(rows_ok(rows.clone()), &mut out).unwrap();
            out
        })
    });
}

fn bench_search(c: &mut Criterion) {
    let mut text = String::new();
    for i in 0..50_000 {
        text.push_str(&format!("{:08}\tpayload-{}\n", i, i % 7));
    }
    let mut searcher = SortedFileSearcher::new(Cursor::new(text.into_bytes())).unwrap();
    c.bench_function("sorted_search_50k", |b| {
        b.iter(|| searcher.find("00031337").unwrap())
    });
}

criterion_group!(benches, bench_join, bench_group_by, bench_search);
criterion_main!(benches);
