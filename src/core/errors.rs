/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::Pid;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Admission, limit and launch errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ProcessError {
    #[error(
        "Cannot start build: maximum concurrent CLI processes ({max_concurrent}) reached. \
         Please wait for existing builds to complete."
    )]
    #[diagnostic(
        code(process::admission_denied),
        help("Retry once a running build finishes, or raise the limit with set_process_limit.")
    )]
    AdmissionDenied { max_concurrent: usize },

    #[error("Invalid process limit: {0} (must be a positive integer)")]
    #[diagnostic(
        code(process::invalid_limit),
        help("The previous limit is still in effect.")
    )]
    InvalidLimit(i64),

    #[error("Invalid command: {0}")]
    #[diagnostic(
        code(process::invalid_command),
        help("Pass the program and its arguments separately; shell syntax is not interpreted.")
    )]
    InvalidCommand(String),

    #[error("Spawn failed: {0}")]
    #[diagnostic(
        code(process::spawn_failed),
        help("Check that the CLI is installed and on PATH.")
    )]
    SpawnFailed(String),

    #[error("Failed to wait for process: {0}")]
    #[diagnostic(code(process::wait_failed))]
    WaitFailed(String),
}

impl ProcessError {
    /// Whether the caller can succeed by retrying later
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProcessError::AdmissionDenied { .. })
    }
}

/// Per-pid signal delivery errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SignalError {
    #[error("Process {0} does not exist")]
    #[diagnostic(code(signal::no_such_process))]
    NoSuchProcess(Pid),

    #[error("Permission denied signalling process {0}")]
    #[diagnostic(
        code(signal::permission_denied),
        help("The process belongs to another user and cannot be controlled.")
    )]
    PermissionDenied(Pid),

    #[error("Pid {0} cannot be signalled")]
    #[diagnostic(code(signal::invalid_pid))]
    InvalidPid(Pid),

    #[error("Signalling process {pid} failed: {reason}")]
    #[diagnostic(code(signal::os_error))]
    Os { pid: Pid, reason: String },

    #[error("Process signals are not supported on this platform")]
    #[diagnostic(code(signal::unsupported))]
    Unsupported,
}
