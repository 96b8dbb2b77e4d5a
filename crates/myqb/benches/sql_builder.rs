use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use myqb::{Fields, JoinOptions, Query, select};

/// SELECT col0, col1, ... FROM `t` WHERE (col0 = ? AND col1 = ? ...)
fn build_select(n: usize) -> Query {
    let mut q = select();
    q.columns((0..n).map(|i| format!("col{i}"))).unwrap().from("t");
    let fields: Fields = (0..n).map(|i| (format!("col{i}"), i as i64)).collect();
    q.where_clause(fields).unwrap();
    q
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/compile");

    for n in [1, 5, 10, 50, 100] {
        let q = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.compile().unwrap()));
        });
    }

    group.finish();
}

fn bench_build_and_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/build_and_compile");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_select(n).compile().unwrap()));
        });
    }

    group.finish();
}

fn bench_where_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/where_in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let mut q = select();
                q.from("t").where_eq("id", values.clone()).unwrap();
                black_box(q.compile().unwrap());
            });
        });
    }

    group.finish();
}

fn bench_multi_row_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/multi_row_insert");

    for n in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut q = Query::new();
                q.insert().into_table("t");
                for i in 0..n {
                    q.add_row(Fields::new().field("id", i).field("name", "x"))
                        .unwrap();
                }
                black_box(q.compile().unwrap());
            });
        });
    }

    group.finish();
}

fn bench_join_subquery(c: &mut Criterion) {
    let mut totals = select();
    totals
        .columns(["userid", "SUM(total) AS spent"])
        .unwrap()
        .from("orders")
        .where_eq("status", "paid")
        .unwrap()
        .group_by(["userid"])
        .as_name("totals");

    c.bench_function("sql_builder/join_subquery", |b| {
        b.iter(|| {
            let mut q = select();
            q.from_as("users", "u")
                .join_with(&totals, JoinOptions::new().on("totals.userid = u.id"))
                .unwrap()
                .where_eq("u.active", true)
                .unwrap();
            black_box(q.compile().unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_compile,
    bench_build_and_compile,
    bench_where_in_list,
    bench_multi_row_insert,
    bench_join_subquery
);
criterion_main!(benches);
