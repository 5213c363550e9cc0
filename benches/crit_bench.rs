use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use segmented_collections::{FixedVec, Map, SegmentedDeque, SegmentedVec, StaticFlatMultimap};

criterion_group!(
    benches,
    bench_emplace_random,
    bench_push_back,
    bench_fixed_push,
    bench_map_insert,
    bench_flat_insert
);
criterion_main!(benches);

/// Deterministic positions so every container sees the same sequence.
fn positions(n: usize) -> Vec<usize> {
    let mut x: u64 = 0x2545_f491_4f6c_dd1d;
    (0..n)
        .map(|len| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            (x % (len as u64 + 1)) as usize
        })
        .collect()
}

fn bench_emplace_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("EmplaceRandom");
    for n in [1000, 10000, 50000].iter() {
        let n = *n;
        let pos = positions(n);

        group.bench_function(BenchmarkId::new("SegDeque", n), |b| {
            b.iter(|| {
                let mut d = SegmentedDeque::<u64, 512>::new();
                for (i, &p) in pos.iter().enumerate() {
                    d.insert(p, i as u64);
                }
                d
            })
        });
        group.bench_function(BenchmarkId::new("SegVec", n), |b| {
            b.iter(|| {
                let mut v = SegmentedVec::<u64, 512>::new();
                for (i, &p) in pos.iter().enumerate() {
                    v.insert(p, i as u64);
                }
                v
            })
        });
        group.bench_function(BenchmarkId::new("StdVecDeque", n), |b| {
            b.iter(|| {
                let mut d = std::collections::VecDeque::new();
                for (i, &p) in pos.iter().enumerate() {
                    d.insert(p, i as u64);
                }
                d
            })
        });
        group.bench_function(BenchmarkId::new("StdVec", n), |b| {
            b.iter(|| {
                let mut v = Vec::new();
                for (i, &p) in pos.iter().enumerate() {
                    v.insert(p, i as u64);
                }
                v
            })
        });
    }
    group.finish();
}

fn bench_push_back(c: &mut Criterion) {
    let mut group = c.benchmark_group("PushBack");
    for n in [1000, 100000].iter() {
        let n = *n;
        group.bench_function(BenchmarkId::new("SegDeque", n), |b| {
            b.iter(|| {
                let mut d = SegmentedDeque::<usize, 512>::new();
                for i in 0..n {
                    d.push_back(i);
                }
                d
            })
        });
        group.bench_function(BenchmarkId::new("StdVecDeque", n), |b| {
            b.iter(|| {
                let mut d = std::collections::VecDeque::new();
                for i in 0..n {
                    d.push_back(i);
                }
                d
            })
        });
    }
    group.finish();
}

fn bench_fixed_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("FixedPush");
    group.bench_function("FixedVec", |b| {
        b.iter(|| {
            let mut v = FixedVec::<u32, 1024>::new();
            for i in 0..1024 {
                v.push(i);
            }
            v.len()
        })
    });
    group.bench_function("ArrayVec", |b| {
        b.iter(|| {
            let mut v = arrayvec::ArrayVec::<u32, 1024>::new();
            for i in 0..1024 {
                v.push(i);
            }
            v.len()
        })
    });
    group.finish();
}

fn bench_map_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("MapInsert");
    for n in [100, 1000, 10000].iter() {
        let n = *n;
        let keys = positions(n);
        group.bench_function(BenchmarkId::new("Exp", n), |b| {
            b.iter(|| {
                let mut m = Map::new();
                for (i, &k) in keys.iter().enumerate() {
                    m.insert(k, i).unwrap();
                }
                m
            })
        });
        group.bench_function(BenchmarkId::new("Std", n), |b| {
            b.iter(|| {
                let mut m = std::collections::BTreeMap::new();
                for (i, &k) in keys.iter().enumerate() {
                    m.entry(k).or_insert(i);
                }
                m
            })
        });
    }
    group.finish();
}

fn bench_flat_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("FlatInsert");
    let keys = positions(256);
    group.bench_function("FlatMultimap", |b| {
        b.iter(|| {
            let mut m = StaticFlatMultimap::<usize, usize, 256>::new();
            for (i, &k) in keys.iter().enumerate() {
                m.insert(k, i).unwrap();
            }
            m.len()
        })
    });
    group.bench_function("StdBTreeMap", |b| {
        b.iter(|| {
            let mut m = std::collections::BTreeMap::new();
            for (i, &k) in keys.iter().enumerate() {
                m.entry(k).or_insert_with(Vec::new).push(i);
            }
            m.len()
        })
    });
    group.finish();
}
