//! Benchmark the template cache under hits, misses and eviction.
//!
//! Each distinct key is a structurally different tree: `t{i}.id = ?` for a
//! different table `t{i}`.

use clausekit::prelude::*;
use clausekit::CompilerConfig;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn make_tree(i: usize) -> NodeRef {
    let t = table(format!("t{i}"), &[("id", SqlType::Integer)]);
    t.c("id").unwrap().eq(i as i64).unwrap()
}

fn bench_cache_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment_lru/hit");

    for capacity in [64, 256, 1024] {
        let compiler = Compiler::new(CompilerConfig::new().cache_capacity(capacity));
        for i in 0..capacity {
            compiler.compile(&make_tree(i), &Sqlite).unwrap();
        }

        let hit = make_tree(capacity / 2);
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &hit, |b, tree| {
            b.iter(|| black_box(compiler.compile(tree, &Sqlite).unwrap()));
        });
    }

    group.finish();
}

fn bench_cache_miss_and_evict(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment_lru/miss_evict");

    for capacity in [64, 256, 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &cap| {
                let compiler = Compiler::new(CompilerConfig::new().cache_capacity(cap));
                for i in 0..cap {
                    compiler.compile(&make_tree(i), &Sqlite).unwrap();
                }
                let mut counter = cap;
                b.iter(|| {
                    counter += 1;
                    black_box(compiler.compile(&make_tree(counter), &Sqlite).unwrap());
                });
            },
        );
    }

    group.finish();
}

fn bench_cache_mixed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment_lru/mixed");

    for capacity in [64, 256, 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &cap| {
                let compiler = Compiler::new(CompilerConfig::new().cache_capacity(cap));
                let prefill = cap * 4 / 5;
                for i in 0..prefill {
                    compiler.compile(&make_tree(i), &Sqlite).unwrap();
                }
                let mut counter = 0usize;
                b.iter(|| {
                    counter += 1;
                    let i = if counter % 5 == 0 {
                        cap + counter
                    } else {
                        counter % prefill
                    };
                    black_box(compiler.compile(&make_tree(i), &Sqlite).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_cache_hit,
    bench_cache_miss_and_evict,
    bench_cache_mixed_workload
);
criterion_main!(benches);
