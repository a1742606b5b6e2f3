/*!
 * Process Types
 * Common types for admission control and build launching
 */

use crate::core::serde::{duration_millis, is_empty_vec, system_time_micros};
use crate::core::types::Pid;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// A process currently holding an admission slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TrackedProcess {
    pub pid: Pid,
    #[serde(with = "system_time_micros")]
    pub registered_at: SystemTime,
    /// Distinguishes successive registrations of a reused pid
    pub generation: u64,
}

impl TrackedProcess {
    pub fn new(pid: Pid, generation: u64) -> Self {
        Self {
            pid,
            registered_at: SystemTime::now(),
            generation,
        }
    }

    /// Time since registration (zero if the clock went backwards)
    pub fn age(&self) -> Duration {
        self.registered_at.elapsed().unwrap_or_default()
    }
}

/// Outcome of a registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Admission {
    /// The pid now holds a slot
    Admitted,
    /// Capacity reached; nothing was mutated
    Denied { active: usize, max_concurrent: usize },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Point-in-time utilization of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessStatus {
    pub active_processes: usize,
    pub max_allowed: usize,
    pub utilization_percent: u32,
    pub can_start_new: bool,
}

impl ProcessStatus {
    /// Derive a status from raw counts
    ///
    /// A zero ceiling reports full utilization and refuses new starts.
    pub fn from_counts(active: usize, max_allowed: usize) -> Self {
        let utilization_percent = if max_allowed == 0 {
            100
        } else {
            ((active as f64 * 100.0) / max_allowed as f64).round() as u32
        };

        Self {
            active_processes: active,
            max_allowed,
            utilization_percent,
            can_start_new: max_allowed > 0 && active < max_allowed,
        }
    }
}

/// A pid that could not be signalled during kill-all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KillFailure {
    pub pid: Pid,
    pub reason: String,
}

/// Result of terminating every tracked process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KillReport {
    /// Pids that were successfully sent a terminate signal
    pub killed_count: usize,
    pub errors: Vec<KillFailure>,
}

/// Ceiling before and after a runtime limit change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LimitChange {
    pub old_limit: usize,
    pub new_limit: usize,
}

/// External build command to run under admission control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BuildCommand {
    pub program: String,
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub env_vars: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// stdout and stderr are appended here; discarded when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl BuildCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            env_vars: vec![],
            working_dir: None,
            log_file: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }
}

/// How a launched build ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BuildOutcome {
    /// The process exited on its own; `exit_code` is `None` when killed by a signal
    Completed {
        pid: Pid,
        exit_code: Option<i32>,
        #[serde(with = "duration_millis")]
        duration: Duration,
    },
    /// The process exceeded its budget and was killed
    TimedOut {
        pid: Pid,
        #[serde(with = "duration_millis")]
        timeout: Duration,
    },
}

impl BuildOutcome {
    pub fn pid(&self) -> Pid {
        match self {
            BuildOutcome::Completed { pid, .. } | BuildOutcome::TimedOut { pid, .. } => *pid,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(
            self,
            BuildOutcome::Completed {
                exit_code: Some(0),
                ..
            }
        )
    }
}
