/*!
 * procman - run one external build CLI under admission control
 *
 * Usage:
 *   procman <program> [args...]   run a build, print its outcome as JSON
 *   procman --status              print controller utilization as JSON
 *
 * Configuration comes from CLI_MAX_CONCURRENT_PROCESSES and
 * CLI_BUILD_TIMEOUT_SECS.
 */

use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use cli_process_manager::api::get_cli_process_status;
use cli_process_manager::core::limits::{ADMISSION_DENIED_EXIT_CODE, TIMEOUT_EXIT_CODE};
use cli_process_manager::{
    init_tracing, AdmissionController, BuildCommand, BuildLauncher, BuildOutcome, ManagerConfig,
};

const USAGE: &str = "usage: procman <program> [args...] | procman --status";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ManagerConfig::from_env();
    info!(
        max_concurrent = config.max_concurrent,
        build_timeout_secs = config.build_timeout.as_secs(),
        "procman starting"
    );

    let controller = Arc::new(AdmissionController::from_config(&config));
    let launcher = BuildLauncher::from_config(Arc::clone(&controller), &config);

    let mut args = std::env::args().skip(1);
    let Some(program) = args.next() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    if program == "--status" {
        println!("{}", get_cli_process_status(&controller).to_json());
        return Ok(());
    }

    let command = BuildCommand::new(program).with_args(args);
    let outcome = match launcher.run(command).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_recoverable() => {
            eprintln!("{}", e);
            std::process::exit(ADMISSION_DENIED_EXIT_CODE);
        }
        Err(e) => return Err(e).context("build failed"),
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).context("encoding build outcome")?
    );

    let code = match outcome {
        BuildOutcome::Completed { exit_code, .. } => exit_code.unwrap_or(1),
        BuildOutcome::TimedOut { .. } => TIMEOUT_EXIT_CODE,
    };
    std::process::exit(code);
}
