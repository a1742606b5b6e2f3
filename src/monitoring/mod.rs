/*!
 * Monitoring
 * Structured logging setup and tool-call tracing
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, span_tool, ToolSpan};
