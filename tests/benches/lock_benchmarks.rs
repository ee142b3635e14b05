//! # Quantum-Lock Engine Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | uncontended | acquire + release of a free key |
//! | handover | release with a queue of waiters |
//! | deadlock-detection | refused request at the end of a long wait chain |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ql_01_lock_engine::{
    AcquireRequest, LockCoordinator, LockKey, TokioTimeoutScheduler,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use shared_types::SessionId;
use std::time::Duration;

fn coordinator() -> LockCoordinator<TokioTimeoutScheduler> {
    let (scheduler, _expiries) = TokioTimeoutScheduler::channel();
    LockCoordinator::new(scheduler)
}

fn bench_uncontended(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let _guard = runtime.enter();
    let mut group = c.benchmark_group("uncontended");

    let mut engine = coordinator();
    let session = SessionId::FIRST;
    let key = LockKey::from("bench");
    group.bench_function("acquire_release", |b| {
        b.iter(|| {
            black_box(engine.acquire(AcquireRequest::exclusive(
                session,
                key.clone(),
                Duration::ZERO,
            )));
            black_box(engine.release(session, &key));
        })
    });

    let mut rng = StdRng::seed_from_u64(7);
    let keys: Vec<LockKey> = (0..1024).map(|i| LockKey::new(format!("k{i}"))).collect();
    group.bench_function("random_keys", |b| {
        b.iter(|| {
            let key = &keys[rng.gen_range(0..keys.len())];
            black_box(engine.acquire(AcquireRequest::exclusive(
                session,
                key.clone(),
                Duration::ZERO,
            )));
            black_box(engine.release(session, key));
        })
    });
    group.finish();
}

fn bench_handover(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let _guard = runtime.enter();
    let mut group = c.benchmark_group("handover");

    for waiters in [1u64, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(waiters), &waiters, |b, &waiters| {
            b.iter(|| {
                let mut engine = coordinator();
                let key = LockKey::from("hot");
                engine.acquire(AcquireRequest::exclusive(
                    SessionId::FIRST,
                    key.clone(),
                    Duration::ZERO,
                ));
                let mut queued = Vec::new();
                for raw in 2..=waiters + 1 {
                    queued.push(engine.acquire(AcquireRequest::exclusive(
                        SessionId::new(raw),
                        key.clone(),
                        Duration::from_secs(60),
                    )));
                }
                let mut holder = SessionId::FIRST;
                for raw in 2..=waiters + 1 {
                    engine.release(holder, &key);
                    holder = SessionId::new(raw);
                }
                black_box(queued)
            })
        });
    }
    group.finish();
}

fn bench_deadlock_detection(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let _guard = runtime.enter();
    let mut group = c.benchmark_group("deadlock-detection");

    for length in [2u64, 16, 128] {
        // Session i owns key i and waits on key i+1; the last session then
        // asks for key 1 and closes the cycle.
        let mut engine = coordinator();
        for raw in 1..=length {
            engine.acquire(AcquireRequest::exclusive(
                SessionId::new(raw),
                LockKey::new(format!("k{raw}")),
                Duration::ZERO,
            ));
        }
        let mut pending = Vec::new();
        for raw in 1..length {
            pending.push(engine.acquire(AcquireRequest::exclusive(
                SessionId::new(raw),
                LockKey::new(format!("k{}", raw + 1)),
                Duration::from_secs(60),
            )));
        }
        let closing = SessionId::new(length);
        let first = LockKey::from("k1");

        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, _| {
            b.iter(|| {
                black_box(engine.acquire(AcquireRequest::exclusive(
                    closing,
                    first.clone(),
                    Duration::from_secs(60),
                )))
            })
        });
        drop(pending);
    }
    group.finish();
}

criterion_group!(benches, bench_uncontended, bench_handover, bench_deadlock_detection);
criterion_main!(benches);
