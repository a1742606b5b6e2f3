/*!
 * Core Types
 * Common types used across the process manager
 */

/// OS process ID type
pub type Pid = u32;

/// Common result type for process manager operations
pub type ProcessResult<T> = Result<T, super::errors::ProcessError>;
