use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use mochi_obj_model::{Arena, Fault, Handle};

fn bench_add_get_reset(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena");
    for size in [1024usize, 8192, 65536] {
        let arena: Arena<String> = Arena::new();
        let values: Vec<String> = (0..size).map(|i| format!("value-{i}")).collect();
        group.bench_with_input(BenchmarkId::new("add_get_reset", size), &values, |b, values| {
            b.iter(|| {
                for value in values {
                    let handle = arena.add(value.clone());
                    black_box(arena.with(handle, |stored| stored.len()).ok());
                }
                black_box(arena.reset());
            });
        });
    }
    group.finish();
}

fn bench_lookup_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena");
    for size in [1024usize, 8192, 65536] {
        let arena: Arena<u64> = Arena::new();
        let handles: Vec<Handle> = (0..size as u64).map(|i| arena.add(i)).collect();
        group.bench_with_input(BenchmarkId::new("lookup", size), &handles, |b, handles| {
            b.iter(|| {
                for &handle in handles {
                    black_box(arena.get(handle).ok());
                }
            });
        });
    }
    group.finish();
}

fn bench_fault_path(c: &mut Criterion) {
    let arena: Arena<u64> = Arena::new();
    c.bench_function("arena/fault_then_lookup", |b| {
        b.iter(|| {
            let handle = arena.add_fault(Fault::cast("wrong kind"));
            black_box(arena.get(handle).is_err());
            if arena.fault_len() > 65536 {
                arena.reset();
            }
        });
    });
}

criterion_group!(benches, bench_add_get_reset, bench_lookup_only, bench_fault_path);
criterion_main!(benches);
