/*!
 * Status & Control
 * Utilization snapshot, emergency kill-all and runtime limit changes
 */

use super::admission::AdmissionController;
use super::types::{KillFailure, KillReport, LimitChange, ProcessStatus};
use crate::core::errors::ProcessError;
use crate::core::types::ProcessResult;
use tracing::{info, warn};

impl AdmissionController {
    /// Current utilization, computed after pruning
    pub fn get_process_status(&self) -> ProcessStatus {
        let state = self.lock_pruned();
        ProcessStatus::from_counts(state.registry.len(), state.max_concurrent)
    }

    /// Send SIGTERM to every tracked process and stop tracking all of them
    ///
    /// Entries are not pruned first, so pids that already exited show up as
    /// errors. Every pid is untracked whether or not the signal landed.
    pub fn kill_all_cli_processes(&self) -> KillReport {
        let mut state = self.lock_raw();
        let entries = state.registry.drain();
        let mut report = KillReport::default();

        for entry in entries {
            match self.table().terminate(entry.pid) {
                Ok(()) => {
                    report.killed_count += 1;
                    info!(pid = entry.pid, "Terminated CLI process");
                }
                Err(e) => {
                    warn!(pid = entry.pid, error = %e, "Failed to terminate CLI process");
                    report.errors.push(KillFailure {
                        pid: entry.pid,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            killed = report.killed_count,
            failed = report.errors.len(),
            "Kill-all completed"
        );
        report
    }

    /// Change the ceiling at runtime
    ///
    /// Non-positive limits are rejected and leave the current limit in place.
    /// Lowering below the active count only blocks new admissions.
    pub fn set_process_limit(&self, new_limit: i64) -> ProcessResult<LimitChange> {
        if new_limit <= 0 {
            warn!(new_limit, "Rejected non-positive process limit");
            return Err(ProcessError::InvalidLimit(new_limit));
        }
        let new_limit =
            usize::try_from(new_limit).map_err(|_| ProcessError::InvalidLimit(new_limit))?;

        let mut state = self.lock_raw();
        let old_limit = std::mem::replace(&mut state.max_concurrent, new_limit);

        if new_limit < state.registry.len() {
            warn!(
                old_limit,
                new_limit,
                active = state.registry.len(),
                "Process limit lowered below active count"
            );
        } else {
            info!(old_limit, new_limit, "Process limit updated");
        }

        Ok(LimitChange {
            old_limit,
            new_limit,
        })
    }
}
