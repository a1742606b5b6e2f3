/*!
 * Admission Controller
 * Gates how many external CLI processes may run at once
 *
 * All state lives behind one mutex so the prune, capacity check and insert in
 * `register_process` form a single critical section.
 */

use super::probe::{ProcessTable, SystemProcessTable};
use super::registry::PidRegistry;
use super::types::{Admission, TrackedProcess};
use crate::core::config::ManagerConfig;
use crate::core::errors::ProcessError;
use crate::core::limits::DEFAULT_MAX_CONCURRENT_PROCESSES;
use crate::core::types::{Pid, ProcessResult};
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared mutable state, only reachable through the controller
#[derive(Debug)]
pub(super) struct AdmissionState {
    pub(super) registry: PidRegistry,
    pub(super) max_concurrent: usize,
}

impl AdmissionState {
    fn has_room(&self) -> bool {
        self.registry.len() < self.max_concurrent
    }
}

/// Counts observed when a registration is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Denial {
    pub(super) active: usize,
    pub(super) max_concurrent: usize,
}

/// Concurrency ceiling and liveness tracking for external build processes
pub struct AdmissionController {
    state: Mutex<AdmissionState>,
    table: Arc<dyn ProcessTable>,
}

/// Builder for AdmissionController
pub struct AdmissionControllerBuilder {
    max_concurrent: usize,
    table: Option<Arc<dyn ProcessTable>>,
}

impl AdmissionControllerBuilder {
    pub fn new() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT_PROCESSES,
            table: None,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Replace the OS process table (tests, sandboxes)
    pub fn with_process_table(mut self, table: Arc<dyn ProcessTable>) -> Self {
        self.table = Some(table);
        self
    }

    pub fn build(self) -> AdmissionController {
        let table = self
            .table
            .unwrap_or_else(|| Arc::new(SystemProcessTable::new()));

        info!(
            max_concurrent = self.max_concurrent,
            "Admission controller initialized"
        );

        AdmissionController {
            state: Mutex::new(AdmissionState {
                registry: PidRegistry::new(),
                max_concurrent: self.max_concurrent,
            }),
            table,
        }
    }
}

impl Default for AdmissionControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissionController {
    /// Controller probing the host OS with the given ceiling
    pub fn new(max_concurrent: usize) -> Self {
        Self::builder().with_max_concurrent(max_concurrent).build()
    }

    pub fn from_config(config: &ManagerConfig) -> Self {
        Self::new(config.max_concurrent)
    }

    pub fn builder() -> AdmissionControllerBuilder {
        AdmissionControllerBuilder::new()
    }

    /// Lock the state and drop entries whose process has exited
    pub(super) fn lock_pruned(&self) -> MutexGuard<'_, AdmissionState> {
        let mut state = self.state.lock();
        let pruned = state.registry.prune(self.table.as_ref());
        if !pruned.is_empty() {
            debug!(
                pruned = pruned.len(),
                active = state.registry.len(),
                "Reclaimed slots from exited processes"
            );
        }
        state
    }

    /// Lock the state without pruning
    pub(super) fn lock_raw(&self) -> MutexGuard<'_, AdmissionState> {
        self.state.lock()
    }

    pub(super) fn table(&self) -> &dyn ProcessTable {
        self.table.as_ref()
    }

    /// Whether a new process would currently be admitted
    ///
    /// Advisory only: `register_process` repeats the check atomically.
    pub fn can_start_process(&self) -> bool {
        self.lock_pruned().has_room()
    }

    /// Advisory pre-spawn check yielding the user-facing denial
    pub fn ensure_capacity(&self) -> ProcessResult<()> {
        let state = self.lock_pruned();
        if state.has_room() {
            Ok(())
        } else {
            Err(ProcessError::AdmissionDenied {
                max_concurrent: state.max_concurrent,
            })
        }
    }

    /// Claim a slot for `pid`
    ///
    /// Prune, capacity check and insert happen under one lock. A pid that is
    /// already tracked keeps its slot and is reported as admitted.
    pub fn try_register(&self, pid: Pid) -> Admission {
        match self.claim(pid) {
            Ok(_) => Admission::Admitted,
            Err(Denial {
                active,
                max_concurrent,
            }) => Admission::Denied {
                active,
                max_concurrent,
            },
        }
    }

    /// Registration step shared by `try_register` and `admit`
    ///
    /// Yields the generation of the registration holding the slot.
    pub(super) fn claim(&self, pid: Pid) -> Result<u64, Denial> {
        let mut state = self.lock_pruned();

        if let Some(generation) = state.registry.generation(pid) {
            debug!(pid, "Process already registered");
            return Ok(generation);
        }

        if !state.has_room() {
            warn!(
                pid,
                active = state.registry.len(),
                max_concurrent = state.max_concurrent,
                "Process registration denied, limit reached"
            );
            return Err(Denial {
                active: state.registry.len(),
                max_concurrent: state.max_concurrent,
            });
        }

        let generation = state.registry.insert(pid);
        info!(
            pid,
            active = state.registry.len(),
            max_concurrent = state.max_concurrent,
            "Registered CLI process"
        );
        Ok(generation)
    }

    /// Boolean form of [`try_register`](Self::try_register)
    pub fn register_process(&self, pid: Pid) -> bool {
        self.try_register(pid).is_admitted()
    }

    /// Release the slot held by `pid`; unknown pids are ignored
    pub fn unregister_process(&self, pid: Pid) {
        let mut state = self.lock_raw();
        if state.registry.remove(pid).is_some() {
            info!(
                pid,
                active = state.registry.len(),
                "Unregistered CLI process"
            );
        }
    }

    /// Release `pid` only if its registration is still `generation`
    ///
    /// A pid pruned and then reused by a newer admission keeps its slot.
    pub(super) fn unregister_generation(&self, pid: Pid, generation: u64) {
        let mut state = self.lock_raw();
        if state.registry.remove_generation(pid, generation).is_some() {
            info!(
                pid,
                active = state.registry.len(),
                "Unregistered CLI process"
            );
        } else if state.registry.contains(pid) {
            debug!(pid, generation, "Pid re-registered since admission, keeping slot");
        }
    }

    pub fn get_active_pids(&self) -> HashSet<Pid> {
        self.lock_pruned().registry.pids()
    }

    pub fn get_active_count(&self) -> usize {
        self.lock_pruned().registry.len()
    }

    /// Live entries with registration times, oldest first
    pub fn tracked_processes(&self) -> Vec<TrackedProcess> {
        self.lock_pruned().registry.snapshot()
    }

    pub fn max_concurrent(&self) -> usize {
        self.lock_raw().max_concurrent
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("AdmissionController")
            .field("active", &state.registry.len())
            .field("max_concurrent", &state.max_concurrent)
            .finish()
    }
}
