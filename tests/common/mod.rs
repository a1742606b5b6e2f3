/*!
 * Shared test fixtures
 */

#![allow(dead_code)]

use cli_process_manager::{AdmissionController, Pid, ProcessTable, SignalError};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// In-memory process table: pids are alive until killed
#[derive(Default)]
pub struct FakeProcessTable {
    dead: Mutex<HashSet<Pid>>,
    unsignalable: Mutex<HashSet<Pid>>,
}

impl FakeProcessTable {
    pub fn kill(&self, pid: Pid) {
        self.dead.lock().insert(pid);
    }

    pub fn refuse_signals(&self, pid: Pid) {
        self.unsignalable.lock().insert(pid);
    }
}

impl ProcessTable for FakeProcessTable {
    fn is_alive(&self, pid: Pid) -> bool {
        !self.dead.lock().contains(&pid)
    }

    fn terminate(&self, pid: Pid) -> Result<(), SignalError> {
        if self.unsignalable.lock().contains(&pid) {
            return Err(SignalError::NoSuchProcess(pid));
        }
        self.kill(pid);
        Ok(())
    }
}

pub fn fake_controller(max: usize) -> (Arc<AdmissionController>, Arc<FakeProcessTable>) {
    let table = Arc::new(FakeProcessTable::default());
    let controller = AdmissionController::builder()
        .with_max_concurrent(max)
        .with_process_table(table.clone())
        .build();
    (Arc::new(controller), table)
}
