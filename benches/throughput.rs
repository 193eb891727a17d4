//! Throughput Benchmark for ttlkv
//!
//! This benchmark measures the performance of the store
//! under various workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use ttlkv::clock::ManualClock;
use ttlkv::commands::{parse_line, CommandHandler};
use ttlkv::storage::Store;

/// Builds a store with `n` keys; every second key expires after `ttl` seconds.
fn populated_store(n: u64, ttl: u32, clock: ManualClock) -> Store<ManualClock> {
    Store::from_entries(
        (0..n).map(|i| {
            let ttl = if i % 2 == 0 { ttl } else { 0 };
            (format!("key:{:08}", i), format!("value:{}", i), ttl)
        }),
        clock,
    )
}

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let mut store = Store::new(ManualClock::new(0));

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_immortal", |b| {
        let mut i = 0u64;
        b.iter(|| {
            store.set(format!("key:{}", i), "small_value", 0);
            i += 1;
        });
    });

    group.bench_function("set_with_ttl", |b| {
        let mut i = 0u64;
        b.iter(|| {
            store.set(format!("ttl:{}", i), "small_value", 3600);
            i += 1;
        });
    });

    group.bench_function("overwrite_changing_ttl", |b| {
        // Every overwrite replaces the key's expiration record
        let mut i = 0u32;
        b.iter(|| {
            store.set("hot", "value", i % 100);
            i = i.wrapping_add(1);
        });
    });

    group.bench_function("set_large", |b| {
        let mut i = 0u64;
        let value = Bytes::from("x".repeat(64 * 1024)); // 64KB value
        b.iter(|| {
            store.set(format!("large:{}", i), value.clone(), 0);
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let clock = ManualClock::new(0);
    let store = populated_store(100_000, 60, clock.clone());

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{:08}", i % 100_000);
            black_box(store.get(key.as_bytes()));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{}", i);
            black_box(store.get(key.as_bytes()));
            i += 1;
        });
    });

    clock.advance(60);

    group.bench_function("get_expired", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{:08}", (i * 2) % 100_000);
            black_box(store.get(key.as_bytes()));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark ordered range scans
fn bench_range(c: &mut Criterion) {
    let clock = ManualClock::new(0);
    let store = populated_store(100_000, 60, clock.clone());

    let mut group = c.benchmark_group("range");

    for count in [10u32, 100, 1_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("get_many_sorted_{}", count), |b| {
            let mut i = 0u64;
            b.iter(|| {
                let start = format!("key:{:08}", (i * 997) % 100_000);
                black_box(store.get_many_sorted(start.as_bytes(), count));
                i += 1;
            });
        });
    }

    // Half of the keys are expired and must be skipped
    clock.advance(60);

    group.throughput(Throughput::Elements(100));
    group.bench_function("get_many_sorted_skipping_expired", |b| {
        b.iter(|| {
            black_box(store.get_many_sorted(b"key:", 100));
        });
    });

    group.finish();
}

/// Benchmark eviction of expired entries
fn bench_evict(c: &mut Criterion) {
    let mut group = c.benchmark_group("evict");

    group.throughput(Throughput::Elements(5_000));
    group.bench_function("remove_one_expired_entry", |b| {
        b.iter_batched(
            || {
                let clock = ManualClock::new(0);
                let store = populated_store(10_000, 30, clock.clone());
                clock.advance(30);
                store
            },
            |mut store| {
                while let Some(entry) = store.remove_one_expired_entry() {
                    black_box(entry);
                }
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("evict_expired_batch", |b| {
        b.iter_batched(
            || {
                let clock = ManualClock::new(0);
                let store = populated_store(10_000, 30, clock.clone());
                clock.advance(30);
                store
            },
            |mut store| black_box(store.evict_expired(usize::MAX)),
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

/// Benchmark mixed workload (80% reads, 20% writes)
fn bench_mixed(c: &mut Criterion) {
    let clock = ManualClock::new(0);
    let mut store = populated_store(10_000, 3600, clock);

    let mut group = c.benchmark_group("mixed");
    group.throughput(Throughput::Elements(1));

    group.bench_function("80_read_20_write", |b| {
        let mut i = 0u64;
        b.iter(|| {
            if i % 5 == 0 {
                // 20% writes
                store.set(format!("new:{}", i), "value", (i % 120) as u32);
            } else {
                // 80% reads
                let key = format!("key:{:08}", i % 10_000);
                black_box(store.get(key.as_bytes()));
            }
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark shell command execution end to end (tokenize + dispatch)
fn bench_commands(c: &mut Criterion) {
    let clock = ManualClock::new(0);
    let mut handler = CommandHandler::with_time_control(Store::new(clock.clone()), clock);

    let mut group = c.benchmark_group("commands");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_then_get", |b| {
        let set = br#"SET "user:1" "hello world" 60"#;
        let get = b"GET user:1";
        b.iter(|| {
            let args = parse_line(set).unwrap();
            black_box(handler.execute(&args));
            let args = parse_line(get).unwrap();
            black_box(handler.execute(&args));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_range,
    bench_evict,
    bench_mixed,
    bench_commands,
);

criterion_main!(benches);
