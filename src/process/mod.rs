/*!
 * Process Module
 * Admission control, liveness tracking and lifecycle hooks for external
 * CLI build processes
 */

pub mod admission;
pub mod control;
pub mod lifecycle;
pub mod probe;
pub mod registry;
pub mod types;

// Re-export for convenience
pub use admission::{AdmissionController, AdmissionControllerBuilder};
pub use lifecycle::{BuildLauncher, ProcessSlot};
pub use probe::{ProcessTable, SystemProcessTable};
pub use registry::PidRegistry;
pub use types::{
    Admission, BuildCommand, BuildOutcome, KillFailure, KillReport, LimitChange, ProcessStatus,
    TrackedProcess,
};
