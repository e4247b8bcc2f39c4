//! Benchmarks comparing BucketList against the std sequence containers.
//!
//! Run with: cargo bench

use std::collections::{LinkedList, VecDeque};

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use bucket_list::BucketList;

const N: usize = 100_000;

fn bench_push_back(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_back");
    group.throughput(Throughput::Elements(N as u64));

    group.bench_function("bucket-list", |b| {
        b.iter(|| {
            let mut list: BucketList<u64> = BucketList::new();
            for i in 0..N as u64 {
                black_box(list.push_back(i));
            }
            list
        });
    });

    group.bench_function("bucket-list/reserved", |b| {
        b.iter(|| {
            let mut list: BucketList<u64> = BucketList::with_capacity(N);
            for i in 0..N as u64 {
                black_box(list.push_back(i));
            }
            list
        });
    });

    group.bench_function("linked-list", |b| {
        b.iter(|| {
            let mut list: LinkedList<u64> = LinkedList::new();
            for i in 0..N as u64 {
                list.push_back(i);
            }
            list
        });
    });

    group.bench_function("vec-deque", |b| {
        b.iter(|| {
            let mut list: VecDeque<u64> = VecDeque::new();
            for i in 0..N as u64 {
                list.push_back(i);
            }
            list
        });
    });

    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");
    group.throughput(Throughput::Elements(N as u64));

    // Steady-state insert/remove: capacity settles, then slots recycle.
    group.bench_function("bucket-list", |b| {
        let mut list: BucketList<u64> = (0..1024).collect();
        b.iter(|| {
            for i in 0..N as u64 {
                list.push_back(i);
                black_box(list.pop_front());
            }
        });
    });

    group.bench_function("linked-list", |b| {
        let mut list: LinkedList<u64> = (0..1024).collect();
        b.iter(|| {
            for i in 0..N as u64 {
                list.push_back(i);
                black_box(list.pop_front());
            }
        });
    });

    group.finish();
}

fn bench_remove_middle(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_middle");
    group.throughput(Throughput::Elements(N as u64));

    // Slot-addressed removal from arbitrary positions; LinkedList has no
    // equivalent without an O(n) walk, so only VecDeque is comparable.
    group.bench_function("bucket-list", |b| {
        b.iter(|| {
            let mut list: BucketList<u64> = (0..N as u64).collect();
            let slots: Vec<_> = list.slots().collect();
            for slot in slots {
                black_box(list.remove(slot));
            }
        });
    });

    group.bench_function("vec-deque/swap_remove", |b| {
        b.iter(|| {
            let mut deque: VecDeque<u64> = (0..N as u64).collect();
            while !deque.is_empty() {
                black_box(deque.swap_remove_back(0));
            }
        });
    });

    group.finish();
}

fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");
    group.throughput(Throughput::Elements(N as u64));

    let bucket: BucketList<u64> = (0..N as u64).collect();
    let mut fragmented: BucketList<u64> = (0..N as u64 * 2).collect();
    let slots: Vec<_> = fragmented.slots().collect();
    for slot in slots.iter().step_by(2) {
        fragmented.remove(*slot);
    }
    let mut compacted: BucketList<u64> = (0..N as u64 * 2).collect();
    let slots: Vec<_> = compacted.slots().collect();
    for slot in slots.iter().step_by(2) {
        compacted.remove(*slot);
    }
    compacted.optimize(true);
    let linked: LinkedList<u64> = (0..N as u64).collect();

    group.bench_function("bucket-list", |b| {
        b.iter(|| black_box(bucket.iter().sum::<u64>()));
    });

    group.bench_function("bucket-list/fragmented", |b| {
        b.iter(|| black_box(fragmented.iter().sum::<u64>()));
    });

    group.bench_function("bucket-list/compacted", |b| {
        b.iter(|| black_box(compacted.iter().sum::<u64>()));
    });

    group.bench_function("linked-list", |b| {
        b.iter(|| black_box(linked.iter().sum::<u64>()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_push_back,
    bench_churn,
    bench_remove_middle,
    bench_iterate
);
criterion_main!(benches);
