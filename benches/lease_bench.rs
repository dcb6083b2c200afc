//! Benchmarks for lease acquire/release

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use setlease_check::lease::{current_lease, open_target, release_lease, set_lease};
use setlease_check::{AccessMode, LeaseType};

fn benchmark_read_lease_cycle(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("bench");

    c.bench_function("read_lease_cycle", |b| {
        b.iter(|| {
            let fd = open_target(&path, AccessMode::ReadOnly).expect("open");
            let result = set_lease(&fd, LeaseType::Read);
            let _ = black_box(result);
            release_lease(&fd);
        });
    });
}

fn benchmark_getlease(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let fd = open_target(&dir.path().join("bench"), AccessMode::WriteOnly).expect("open");
    let _ = set_lease(&fd, LeaseType::Write);

    c.bench_function("getlease", |b| {
        b.iter(|| {
            let result = current_lease(black_box(&fd));
            let _ = black_box(result);
        });
    });
}

criterion_group!(benches, benchmark_read_lease_cycle, benchmark_getlease);
criterion_main!(benches);
