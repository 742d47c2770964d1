//! Simulation benchmarks for palisade_core.
//!
//! Run with: `cargo bench -p palisade_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use palisade_core::session::{Session, SessionConfig};

fn busy_session() -> Session {
    let mut config = SessionConfig::standard(42);
    config.downtime.initial = Duration::from_secs(1);
    let mut session = Session::new(config).unwrap();
    // Warm up past the first wave activation so ticks have work to do
    for _ in 0..5 {
        let _ = session.update(Duration::from_secs(1));
    }
    session
}

pub fn simulation_benchmark(c: &mut Criterion) {
    c.bench_function("session_update_one_tick", |b| {
        let session = busy_session();
        b.iter(|| {
            let mut s = session.clone();
            black_box(s.update(Duration::from_secs(1)))
        })
    });

    c.bench_function("state_hash", |b| {
        let session = busy_session();
        b.iter(|| black_box(session.state_hash()))
    });

    c.bench_function("snapshot_round_trip", |b| {
        let session = busy_session();
        b.iter(|| {
            let bytes = session.serialize().unwrap();
            black_box(Session::deserialize(&bytes).unwrap())
        })
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
