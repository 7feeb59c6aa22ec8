//! Benchmarks for the bounded priority queue.
//!
//! Compares against `std::collections::BinaryHeap` behind a mutex to show
//! the cost of the blocking coordination layer.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Mutex;
use std::thread;

use bounded_priority_queue::BoundedPriorityQueue;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

// ============================================================================
// Single-threaded put/take latency
// ============================================================================

fn bench_single_thread_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread_latency");

    group.bench_function("bounded_priority_queue/u64", |b| {
        let queue: BoundedPriorityQueue<u64> = BoundedPriorityQueue::new(1024);
        b.iter(|| {
            queue.try_put(black_box(42)).unwrap();
            black_box(queue.try_take().unwrap())
        });
    });

    group.bench_function("mutex_binary_heap/u64", |b| {
        let heap: Mutex<BinaryHeap<Reverse<u64>>> = Mutex::new(BinaryHeap::with_capacity(1024));
        b.iter(|| {
            heap.lock().unwrap().push(Reverse(black_box(42)));
            black_box(heap.lock().unwrap().pop().unwrap())
        });
    });

    group.finish();
}

// ============================================================================
// Burst throughput (fill then drain, ordered extraction)
// ============================================================================

fn bench_burst_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("burst_throughput");

    for batch_size in [100usize, 1000] {
        group.throughput(Throughput::Elements(batch_size as u64));

        group.bench_with_input(
            BenchmarkId::new("bounded_priority_queue", batch_size),
            &batch_size,
            |b, &n| {
                let queue: BoundedPriorityQueue<u64> = BoundedPriorityQueue::new(n);
                b.iter(|| {
                    for i in 0..n {
                        // Scrambled priorities so extraction does real sifting.
                        queue.try_put(black_box(((i * 7 + 13) % n) as u64)).unwrap();
                    }
                    for _ in 0..n {
                        black_box(queue.try_take().unwrap());
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("mutex_binary_heap", batch_size),
            &batch_size,
            |b, &n| {
                let heap: Mutex<BinaryHeap<Reverse<u64>>> =
                    Mutex::new(BinaryHeap::with_capacity(n));
                b.iter(|| {
                    for i in 0..n {
                        heap.lock()
                            .unwrap()
                            .push(Reverse(black_box(((i * 7 + 13) % n) as u64)));
                    }
                    for _ in 0..n {
                        black_box(heap.lock().unwrap().pop().unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Cross-thread producer-consumer throughput with backpressure
// ============================================================================

fn bench_cross_thread_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_thread_throughput");

    const MESSAGE_COUNT: usize = 100_000;
    group.throughput(Throughput::Elements(MESSAGE_COUNT as u64));

    for capacity in [64usize, 1024] {
        group.bench_with_input(
            BenchmarkId::new("blocking_put_take", capacity),
            &capacity,
            |b, &cap| {
                b.iter(|| {
                    let queue: BoundedPriorityQueue<u64> = BoundedPriorityQueue::new(cap);
                    let producer_q = queue.clone();

                    let producer = thread::spawn(move || {
                        for i in 0..MESSAGE_COUNT {
                            producer_q.put(i as u64);
                        }
                    });

                    let consumer = thread::spawn(move || {
                        for _ in 0..MESSAGE_COUNT {
                            black_box(queue.take());
                        }
                    });

                    producer.join().unwrap();
                    consumer.join().unwrap();
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_thread_latency,
    bench_burst_throughput,
    bench_cross_thread_throughput,
);

criterion_main!(benches);
