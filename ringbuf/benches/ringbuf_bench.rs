//! Benchmarks for RingBuffer.

use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use giztoy_ringbuf::{FullPolicy, RingBuffer};

fn bench_put_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("ringbuf_put_get");

    for capacity in [16, 256, 4096].iter() {
        let buf = RingBuffer::<u64>::new(*capacity).unwrap();

        group.bench_with_input(BenchmarkId::new("single_thread", capacity), capacity, |b, &cap| {
            b.iter(|| {
                for i in 0..cap as u64 {
                    buf.put(i).unwrap();
                }
                for _ in 0..cap {
                    black_box(buf.get().unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_overwrite(c: &mut Criterion) {
    let buf = RingBuffer::<u64>::with_policy(64, FullPolicy::Overwrite).unwrap();

    c.bench_function("ringbuf_overwrite_put", |b| {
        let mut i = 0u64;
        b.iter(|| {
            buf.put(black_box(i)).unwrap();
            i = i.wrapping_add(1);
        });
    });
}

fn bench_blocking_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("ringbuf_blocking_handoff");
    const ITEMS: u64 = 10_000;

    for capacity in [1, 64, 1024].iter() {
        group.bench_with_input(BenchmarkId::new("spsc", capacity), capacity, |b, &cap| {
            b.iter(|| {
                let buf = RingBuffer::<u64>::with_policy(cap, FullPolicy::Block).unwrap();
                let producer_buf = buf.clone();
                let producer = thread::spawn(move || {
                    for i in 0..ITEMS {
                        producer_buf.put(i).unwrap();
                    }
                });
                let mut sum = 0u64;
                for _ in 0..ITEMS {
                    sum += buf.get().unwrap().unwrap_or(0);
                }
                producer.join().unwrap();
                black_box(sum)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_put_get, bench_overwrite, bench_blocking_handoff);
criterion_main!(benches);
