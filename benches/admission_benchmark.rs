/*!
 * Admission Controller Benchmarks
 *
 * Register/unregister cost and status snapshots at different registry sizes
 */

use cli_process_manager::{AdmissionController, Pid, ProcessTable, SignalError};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

/// Every pid is alive; isolates locking and bookkeeping from syscalls
struct AlwaysAlive;

impl ProcessTable for AlwaysAlive {
    fn is_alive(&self, _pid: Pid) -> bool {
        true
    }

    fn terminate(&self, _pid: Pid) -> Result<(), SignalError> {
        Ok(())
    }
}

fn controller(max: usize) -> AdmissionController {
    AdmissionController::builder()
        .with_max_concurrent(max)
        .with_process_table(Arc::new(AlwaysAlive))
        .build()
}

fn bench_register_unregister(c: &mut Criterion) {
    let mut group = c.benchmark_group("register_unregister");

    for occupied in [0usize, 16, 256] {
        let ctrl = controller(occupied + 1);
        for pid in 0..occupied as Pid {
            ctrl.register_process(pid + 10);
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(occupied),
            &ctrl,
            |b, ctrl| {
                b.iter(|| {
                    black_box(ctrl.register_process(1));
                    ctrl.unregister_process(1);
                });
            },
        );
    }

    group.finish();
}

fn bench_status(c: &mut Criterion) {
    let ctrl = controller(64);
    for pid in 1..=64 {
        ctrl.register_process(pid);
    }

    c.bench_function("get_process_status_64", |b| {
        b.iter(|| black_box(ctrl.get_process_status()))
    });
}

#[cfg(unix)]
fn bench_system_probe(c: &mut Criterion) {
    use cli_process_manager::SystemProcessTable;

    let table = SystemProcessTable::new();
    let me = std::process::id();

    c.bench_function("system_is_alive_self", |b| {
        b.iter(|| black_box(table.is_alive(black_box(me))))
    });
}

#[cfg(not(unix))]
fn bench_system_probe(_c: &mut Criterion) {}

criterion_group!(
    benches,
    bench_register_unregister,
    bench_status,
    bench_system_probe
);
criterion_main!(benches);
