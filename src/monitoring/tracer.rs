/*!
 * Structured Tracing
 * Subscriber setup and spans for agent tool invocations
 *
 * Environment variables:
 * - RUST_LOG: log filter (default: info)
 * - PROCMAN_TRACE_JSON: JSON output when `1` or `true`
 */

use crate::core::limits::ENV_TRACE_JSON;
use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Tool calls slower than this are logged as warnings
const SLOW_TOOL_MILLIS: u128 = 100;

/// Initialize the global subscriber
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let initialized = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if initialized {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Generate a unique trace ID for request correlation
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one agent tool invocation
pub struct ToolSpan {
    span: tracing::Span,
    start: Instant,
    tool: &'static str,
    trace_id: String,
}

impl ToolSpan {
    pub fn new(tool: &'static str) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::INFO,
            "tool",
            trace_id = %trace_id,
            tool = tool,
            result = tracing::field::Empty,
            error = tracing::field::Empty,
        );

        let _entered = span.enter();
        debug!(tool, "tool call started");
        drop(_entered);

        Self {
            span,
            start: Instant::now(),
            tool,
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn record_result(&self, success: bool) {
        self.span
            .record("result", if success { "success" } else { "error" });
    }

    pub fn record_error(&self, error: &str) {
        self.span.record("error", error);
        self.span.record("result", "error");
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Underlying span, for instrumenting futures that run inside the call
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

impl Drop for ToolSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();

        if duration.as_millis() > SLOW_TOOL_MILLIS {
            warn!(
                tool = self.tool,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow tool call"
            );
        } else {
            debug!(
                tool = self.tool,
                duration_us = duration.as_micros() as u64,
                "tool call completed"
            );
        }
    }
}

/// Open a span for a tool invocation
#[inline]
pub fn span_tool(tool: &'static str) -> ToolSpan {
    ToolSpan::new(tool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_ids_unique() {
        assert_ne!(generate_trace_id(), generate_trace_id());
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }

    #[test]
    fn test_tool_span_records() {
        let span = span_tool("get_cli_process_status");
        assert_eq!(span.trace_id().len(), 36);
        span.record_result(true);
        span.record_error("boom");
    }
}
