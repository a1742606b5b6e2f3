/*!
 * System Limits and Constants
 *
 * Centralized location for the admission ceiling, build timeouts and the
 * environment variable names that override them.
 */

use std::time::Duration;

// =============================================================================
// ADMISSION LIMITS
// =============================================================================

/// Default ceiling on concurrently tracked CLI processes
pub const DEFAULT_MAX_CONCURRENT_PROCESSES: usize = 5;

// =============================================================================
// BUILD LIMITS
// =============================================================================

/// Default wall-clock budget for a single external build (30 minutes)
/// Code-generation CLIs routinely run for tens of minutes
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Exit code reported by the binary when a build hits its timeout
/// Matches coreutils `timeout(1)`
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code reported by the binary when admission is denied (EX_TEMPFAIL)
pub const ADMISSION_DENIED_EXIT_CODE: i32 = 75;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Overrides the admission ceiling
pub const ENV_MAX_CONCURRENT: &str = "CLI_MAX_CONCURRENT_PROCESSES";

/// Overrides the build timeout, in seconds
pub const ENV_BUILD_TIMEOUT_SECS: &str = "CLI_BUILD_TIMEOUT_SECS";

/// Enables JSON log output when set to `1` or `true`
pub const ENV_TRACE_JSON: &str = "PROCMAN_TRACE_JSON";
