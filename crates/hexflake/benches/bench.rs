use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use hexflake::{HexFlakeGenerator, HexFlakeId, SystemClock, TimeSource};
use std::{
    sync::{
        Arc, Barrier,
        atomic::{AtomicU64, Ordering},
    },
    thread::scope,
    time::Instant,
};

/// Advances one millisecond per call so the sequence never runs out.
struct TickingMockTime {
    millis: AtomicU64,
}

impl TimeSource<u64> for TickingMockTime {
    fn current_millis(&self) -> u64 {
        self.millis.fetch_add(1, Ordering::Relaxed)
    }
}

// Number of `produce` calls per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_CALLS: usize = 4096;

/// Benchmarks batches of `batch` IDs from a single thread.
fn bench_produce(c: &mut Criterion, batch: usize) {
    let mut group = c.benchmark_group(format!("produce/batch_{batch}"));
    group.throughput(Throughput::Elements((TOTAL_CALLS * batch) as u64));

    group.bench_function(format!("calls/{TOTAL_CALLS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = HexFlakeGenerator::new(
                    0x0242_ac11_0002,
                    TickingMockTime {
                        millis: AtomicU64::new(0),
                    },
                );
                for _ in 0..TOTAL_CALLS {
                    black_box(generator.produce(batch).unwrap());
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks the lock under contention from every core.
fn bench_produce_contended(c: &mut Criterion, batch: usize) {
    let threads = num_cpus::get();
    let mut group = c.benchmark_group(format!("produce_contended/batch_{batch}"));
    group.throughput(Throughput::Elements((threads * TOTAL_CALLS * batch) as u64));

    group.bench_function(format!("threads/{threads}"), |b| {
        b.iter_custom(|iters| {
            let generator = Arc::new(HexFlakeGenerator::new(
                0x0242_ac11_0002,
                TickingMockTime {
                    millis: AtomicU64::new(0),
                },
            ));
            let barrier = Arc::new(Barrier::new(threads + 1));

            let start = scope(|s| {
                for _ in 0..threads {
                    let generator = Arc::clone(&generator);
                    let barrier = Arc::clone(&barrier);
                    s.spawn(move || {
                        barrier.wait();
                        for _ in 0..iters {
                            for _ in 0..TOTAL_CALLS {
                                black_box(generator.produce(batch).unwrap());
                            }
                        }
                    });
                }
                let start = Instant::now();
                barrier.wait();
                start
            });

            start.elapsed()
        });
    });

    group.finish();
}

/// Benchmarks the wall clock path, where most calls share a millisecond.
fn bench_produce_system_clock(c: &mut Criterion) {
    let mut group = c.benchmark_group("produce/system_clock");
    group.throughput(Throughput::Elements(TOTAL_CALLS as u64));

    group.bench_function(format!("calls/{TOTAL_CALLS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let generator = HexFlakeGenerator::new(0x0242_ac11_0002, SystemClock::default());
                for _ in 0..TOTAL_CALLS {
                    // Exhaustion or a clock step are fine here; only cost matters.
                    let _ = black_box(generator.produce(1));
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

fn bench_encode_hex(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(1));
    let id = HexFlakeId::from(1_700_000_000_000, 0x0242_ac11_0002, 42);

    group.bench_function("to_hex", |b| b.iter(|| black_box(black_box(id).to_hex())));
    group.bench_function("encode_hex_into", |b| {
        let mut buf = [0_u8; HexFlakeId::HEX_SIZE];
        b.iter(|| {
            black_box(id).encode_hex_into(&mut buf);
            black_box(&buf);
        });
    });
    group.bench_function("decode_hex", |b| {
        let hex = id.to_hex();
        b.iter(|| black_box(HexFlakeId::decode_hex(black_box(&hex)).unwrap()));
    });

    group.finish();
}

fn benches(c: &mut Criterion) {
    for batch in [1, 10] {
        bench_produce(c, batch);
        bench_produce_contended(c, batch);
    }
    bench_produce_system_clock(c);
    bench_encode_hex(c);
}

criterion_group!(hexflake_benches, benches);
criterion_main!(hexflake_benches);
