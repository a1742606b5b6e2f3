/*!
 * CLI Process Manager Library
 * Admission control for concurrently running external build CLIs
 */

pub mod api;
pub mod core;
pub mod monitoring;
pub mod process;

// Re-exports
pub use crate::core::{ManagerConfig, Pid, ProcessError, ProcessResult, SignalError};
pub use api::ToolResponse;
pub use monitoring::init_tracing;
pub use process::{
    Admission, AdmissionController, BuildCommand, BuildLauncher, BuildOutcome, KillReport,
    LimitChange, ProcessSlot, ProcessStatus, ProcessTable, SystemProcessTable,
};
