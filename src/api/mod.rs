/*!
 * API Module
 * Agent-facing tool functions over the admission controller
 */

pub mod tools;
pub mod types;

// Re-export for convenience
pub use tools::{
    get_cli_process_status, kill_all_cli_processes, set_cli_process_limit, start_build,
};
pub use types::ToolResponse;
