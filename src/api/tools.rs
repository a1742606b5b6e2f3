/*!
 * Agent Tools
 * Process status and control operations exposed to the agent tool layer
 */

use super::types::ToolResponse;
use crate::monitoring::span_tool;
use crate::process::{AdmissionController, BuildCommand, BuildLauncher, BuildOutcome};
use tracing::{info, warn, Instrument};

/// Report current CLI process utilization
pub fn get_cli_process_status(controller: &AdmissionController) -> ToolResponse {
    let span = span_tool("get_cli_process_status");
    let _guard = span.enter();

    let status = controller.get_process_status();
    let message = format!(
        "{} of {} CLI processes running ({}% utilization). {}",
        status.active_processes,
        status.max_allowed,
        status.utilization_percent,
        if status.can_start_new {
            "New builds can start."
        } else {
            "New builds must wait."
        }
    );

    span.record_result(true);
    ToolResponse::ok(message).with_data(&status)
}

/// Terminate every tracked CLI process
pub fn kill_all_cli_processes(controller: &AdmissionController) -> ToolResponse {
    let span = span_tool("kill_all_cli_processes");
    let _guard = span.enter();

    let report = controller.kill_all_cli_processes();
    let mut message = format!("Terminated {} CLI process(es).", report.killed_count);
    if !report.errors.is_empty() {
        message.push_str(&format!(
            " {} process(es) could not be signalled and were untracked.",
            report.errors.len()
        ));
    }

    info!(
        trace_id = %span.trace_id(),
        killed = report.killed_count,
        "kill_all_cli_processes tool completed"
    );
    span.record_result(report.errors.is_empty());
    ToolResponse::ok(message).with_data(&report)
}

/// Change the concurrent CLI process ceiling
pub fn set_cli_process_limit(controller: &AdmissionController, new_limit: i64) -> ToolResponse {
    let span = span_tool("set_cli_process_limit");
    let _guard = span.enter();

    match controller.set_process_limit(new_limit) {
        Ok(change) => {
            span.record_result(true);
            ToolResponse::ok(format!(
                "CLI process limit changed from {} to {}.",
                change.old_limit, change.new_limit
            ))
            .with_data(&change)
        }
        Err(e) => {
            span.record_error(&e.to_string());
            warn!(trace_id = %span.trace_id(), new_limit, "set_cli_process_limit rejected");
            ToolResponse::error(e.to_string()).with_data(&e)
        }
    }
}

/// Run one external build under admission control
///
/// Denials and launch failures come back as a plain-text message, never as
/// an error to the caller.
pub async fn start_build(launcher: &BuildLauncher, command: BuildCommand) -> ToolResponse {
    let span = span_tool("start_build");
    let program = command.program.clone();

    let result = launcher
        .run(command)
        .instrument(span.span().clone())
        .await;

    match result {
        Ok(outcome) => {
            let message = match &outcome {
                BuildOutcome::Completed {
                    exit_code: Some(0),
                    duration,
                    ..
                } => format!("Build '{}' completed in {}s.", program, duration.as_secs()),
                BuildOutcome::Completed { exit_code, .. } => match exit_code {
                    Some(code) => format!("Build '{}' failed with exit code {}.", program, code),
                    None => format!("Build '{}' was terminated by a signal.", program),
                },
                BuildOutcome::TimedOut { timeout, .. } => format!(
                    "Build '{}' timed out after {}s and was terminated.",
                    program,
                    timeout.as_secs()
                ),
            };
            span.record_result(outcome.succeeded());
            ToolResponse {
                success: outcome.succeeded(),
                message,
                data: None,
            }
            .with_data(&outcome)
        }
        Err(e) => {
            span.record_error(&e.to_string());
            ToolResponse::error(e.to_string()).with_data(&e)
        }
    }
}
