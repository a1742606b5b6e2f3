/*!
 * Process Lifecycle Hooks
 *
 * Register-on-start / unregister-on-exit integration for build launchers:
 * an RAII slot that releases on every exit path, and a launcher that runs
 * one external build under admission control with a timeout
 */

use super::admission::AdmissionController;
use super::types::{BuildCommand, BuildOutcome};
use crate::core::config::ManagerConfig;
use crate::core::errors::ProcessError;
use crate::core::types::{Pid, ProcessResult};
use std::fs::OpenOptions;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Admission slot held by a running process
///
/// Unregisters the pid exactly once, on `release` or on drop, and only while
/// the registration it was admitted under is still current.
#[derive(Debug)]
pub struct ProcessSlot {
    controller: Arc<AdmissionController>,
    pid: Pid,
    generation: u64,
    released: bool,
}

impl ProcessSlot {
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Give the slot back now
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.controller
                .unregister_generation(self.pid, self.generation);
        }
    }
}

impl Drop for ProcessSlot {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl AdmissionController {
    /// Register `pid` and tie its slot to the returned guard
    pub fn admit(self: &Arc<Self>, pid: Pid) -> ProcessResult<ProcessSlot> {
        match self.claim(pid) {
            Ok(generation) => Ok(ProcessSlot {
                controller: Arc::clone(self),
                pid,
                generation,
                released: false,
            }),
            Err(denial) => Err(ProcessError::AdmissionDenied {
                max_concurrent: denial.max_concurrent,
            }),
        }
    }
}

/// Runs external build CLIs under admission control
#[derive(Debug, Clone)]
pub struct BuildLauncher {
    controller: Arc<AdmissionController>,
    timeout: Duration,
}

impl BuildLauncher {
    pub fn new(controller: Arc<AdmissionController>, timeout: Duration) -> Self {
        Self {
            controller,
            timeout,
        }
    }

    pub fn from_config(controller: Arc<AdmissionController>, config: &ManagerConfig) -> Self {
        Self::new(controller, config.build_timeout)
    }

    pub fn controller(&self) -> &Arc<AdmissionController> {
        &self.controller
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check capacity, spawn, register, await under the timeout, unregister
    ///
    /// Returns `AdmissionDenied` without spawning when the controller is
    /// full, and kills the freshly spawned child if it loses the race for
    /// the last slot.
    pub async fn run(&self, command: BuildCommand) -> ProcessResult<BuildOutcome> {
        validate_command(&command)?;
        self.controller.ensure_capacity()?;

        let build_id = Uuid::new_v4();
        let span = info_span!(
            "build",
            build_id = %build_id,
            program = %command.program,
        );
        self.run_admitted(command).instrument(span).await
    }

    async fn run_admitted(&self, command: BuildCommand) -> ProcessResult<BuildOutcome> {
        let mut child = spawn(&command)?;
        let started = Instant::now();

        let Some(pid) = child.id() else {
            return Err(ProcessError::SpawnFailed(format!(
                "{}: exited before its pid could be read",
                command.program
            )));
        };

        let slot = match self.controller.admit(pid) {
            Ok(slot) => slot,
            Err(e) => {
                warn!(pid, "Lost admission race, terminating spawned process");
                if let Err(kill_err) = child.kill().await {
                    error!(pid, error = %kill_err, "Failed to kill unadmitted process");
                }
                return Err(e);
            }
        };

        info!(pid, timeout_secs = self.timeout.as_secs(), "Build started");

        let outcome = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => {
                let duration = started.elapsed();
                info!(
                    pid,
                    exit_code = ?status.code(),
                    duration_ms = duration.as_millis() as u64,
                    "Build finished"
                );
                BuildOutcome::Completed {
                    pid,
                    exit_code: status.code(),
                    duration,
                }
            }
            Ok(Err(e)) => {
                error!(pid, error = %e, "Failed to wait for build");
                return Err(ProcessError::WaitFailed(e.to_string()));
            }
            Err(_) => {
                warn!(
                    pid,
                    timeout_secs = self.timeout.as_secs(),
                    "Build timed out, terminating"
                );
                if let Err(e) = child.kill().await {
                    error!(pid, error = %e, "Failed to kill timed out build");
                }
                BuildOutcome::TimedOut {
                    pid,
                    timeout: self.timeout,
                }
            }
        };

        slot.release();
        Ok(outcome)
    }
}

/// Reject commands that look like shell snippets rather than a program
fn validate_command(command: &BuildCommand) -> ProcessResult<()> {
    let program = command.program.trim();

    if program.is_empty() {
        return Err(ProcessError::InvalidCommand("Empty command".to_string()));
    }

    let dangerous_chars = [';', '|', '&', '\n', '\r', '\0', '`', '$', '(', ')'];
    if dangerous_chars.iter().any(|&c| program.contains(c)) {
        return Err(ProcessError::InvalidCommand(
            "Command contains shell metacharacters".to_string(),
        ));
    }

    if program.contains("..") {
        return Err(ProcessError::InvalidCommand(
            "Command contains path traversal".to_string(),
        ));
    }

    if command.args.iter().any(|arg| arg.contains('\0')) {
        return Err(ProcessError::InvalidCommand(
            "Argument contains NUL byte".to_string(),
        ));
    }

    Ok(())
}

fn spawn(command: &BuildCommand) -> ProcessResult<Child> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .envs(command.env_vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .kill_on_drop(true);

    if let Some(ref dir) = command.working_dir {
        cmd.current_dir(dir);
    }

    match command.log_file {
        Some(ref path) => {
            let spawn_err = |e: std::io::Error| {
                ProcessError::SpawnFailed(format!("log file {}: {}", path.display(), e))
            };
            let stdout = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(spawn_err)?;
            let stderr = stdout.try_clone().map_err(spawn_err)?;
            cmd.stdout(Stdio::from(stdout)).stderr(Stdio::from(stderr));
        }
        None => {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
    }

    cmd.spawn()
        .map_err(|e| ProcessError::SpawnFailed(format!("{}: {}", command.program, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::admission::testing::controller;

    #[test]
    fn test_slot_releases_on_drop() {
        let (ctrl, _) = controller(1);
        let ctrl = Arc::new(ctrl);

        {
            let slot = ctrl.admit(42).unwrap();
            assert_eq!(slot.pid(), 42);
            assert!(!ctrl.can_start_process());
        }

        assert!(ctrl.can_start_process());
    }

    #[test]
    fn test_slot_explicit_release() {
        let (ctrl, _) = controller(1);
        let ctrl = Arc::new(ctrl);

        let slot = ctrl.admit(42).unwrap();
        slot.release();
        assert_eq!(ctrl.get_active_count(), 0);
    }

    #[test]
    fn test_stale_slot_keeps_reused_pid() {
        let (ctrl, table) = controller(2);
        let ctrl = Arc::new(ctrl);

        let stale = ctrl.admit(42).unwrap();
        table.kill(42);
        assert_eq!(ctrl.get_active_count(), 0);

        table.reuse(42);
        let current = ctrl.admit(42).unwrap();

        drop(stale);
        assert!(ctrl.get_active_pids().contains(&42));

        current.release();
        assert_eq!(ctrl.get_active_count(), 0);
    }

    #[test]
    fn test_admit_denied_at_capacity() {
        let (ctrl, _) = controller(1);
        let ctrl = Arc::new(ctrl);
        let _held = ctrl.admit(1).unwrap();

        let err = ctrl.admit(2).unwrap_err();
        assert_eq!(err, ProcessError::AdmissionDenied { max_concurrent: 1 });
        assert_eq!(ctrl.get_active_pids().len(), 1);
    }

    #[test]
    fn test_validate_command() {
        assert!(validate_command(&BuildCommand::new("claude").with_args(["-p", "a; b"])).is_ok());

        for bad in ["", "   ", "echo; rm -rf /", "$(whoami)", "../bin/tool"] {
            let result = validate_command(&BuildCommand::new(bad));
            assert!(
                matches!(result, Err(ProcessError::InvalidCommand(_))),
                "{bad:?} should be rejected"
            );
        }

        let nul_arg = BuildCommand::new("gemini").with_args(["bad\0arg"]);
        assert!(validate_command(&nul_arg).is_err());
    }

    #[tokio::test]
    async fn test_invalid_command_is_not_spawned() {
        let (ctrl, _) = controller(1);
        let launcher = BuildLauncher::new(Arc::new(ctrl), Duration::from_secs(1));

        let result = launcher.run(BuildCommand::new("echo | cat")).await;
        assert!(matches!(result, Err(ProcessError::InvalidCommand(_))));
        assert_eq!(launcher.controller().get_active_count(), 0);
    }
}
