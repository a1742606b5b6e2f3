/*!
 * Process Table
 *
 * OS-level liveness probing and termination for tracked pids, using
 * signal 0 for the probe and SIGTERM for termination
 */

use crate::core::errors::SignalError;
use crate::core::types::Pid;
use tracing::debug;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{kill, Signal as UnixSignal};
#[cfg(unix)]
use nix::unistd::Pid as NixPid;

/// View of the OS process table used by the admission controller
pub trait ProcessTable: Send + Sync {
    /// Whether `pid` refers to a running process
    ///
    /// Fails closed: any probe failure, including permission denied, reports
    /// the process as dead. Never panics.
    fn is_alive(&self, pid: Pid) -> bool;

    /// Send a termination request to `pid`
    fn terminate(&self, pid: Pid) -> Result<(), SignalError>;
}

/// Process table backed by the host operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessTable;

impl SystemProcessTable {
    pub fn new() -> Self {
        Self
    }
}

/// Map a pid onto a signal target, refusing values that would address a
/// process group or wrap negative
#[cfg(unix)]
fn signal_target(pid: Pid) -> Option<NixPid> {
    let raw = i32::try_from(pid).ok()?;
    (raw > 0).then(|| NixPid::from_raw(raw))
}

/// Exited-but-unreaped processes still answer signal 0
#[cfg(target_os = "linux")]
fn is_zombie(pid: Pid) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) else {
        return false;
    };
    // Format: "<pid> (<comm>) <state> ..."; comm may itself contain ')'
    stat.rfind(')')
        .and_then(|idx| stat[idx + 1..].trim_start().chars().next())
        .map(|state| state == 'Z')
        .unwrap_or(false)
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_zombie(_pid: Pid) -> bool {
    false
}

#[cfg(unix)]
impl ProcessTable for SystemProcessTable {
    fn is_alive(&self, pid: Pid) -> bool {
        let Some(target) = signal_target(pid) else {
            return false;
        };

        match kill(target, None) {
            Ok(()) => !is_zombie(pid),
            Err(Errno::EPERM) => {
                debug!(pid, "Liveness probe denied, treating process as dead");
                false
            }
            Err(_) => false,
        }
    }

    fn terminate(&self, pid: Pid) -> Result<(), SignalError> {
        let target = signal_target(pid).ok_or(SignalError::InvalidPid(pid))?;

        kill(target, UnixSignal::SIGTERM).map_err(|errno| match errno {
            Errno::ESRCH => SignalError::NoSuchProcess(pid),
            Errno::EPERM => SignalError::PermissionDenied(pid),
            other => SignalError::Os {
                pid,
                reason: other.desc().to_string(),
            },
        })
    }
}

/// Non-Unix stubs
#[cfg(not(unix))]
impl ProcessTable for SystemProcessTable {
    fn is_alive(&self, pid: Pid) -> bool {
        debug!(pid, "Liveness probe not supported on this platform");
        false
    }

    fn terminate(&self, _pid: Pid) -> Result<(), SignalError> {
        Err(SignalError::Unsupported)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::{Command, Stdio};

    fn spawn_sleep(secs: &str) -> std::process::Child {
        Command::new("sleep")
            .arg(secs)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("sleep should spawn")
    }

    #[test]
    fn test_running_child_is_alive() {
        let table = SystemProcessTable::new();
        let mut child = spawn_sleep("10");
        let pid = child.id();

        assert!(table.is_alive(pid));

        child.kill().ok();
        child.wait().ok();
        assert!(!table.is_alive(pid));
    }

    #[test]
    fn test_invalid_pids_are_dead() {
        let table = SystemProcessTable::new();
        assert!(!table.is_alive(0));
        assert!(!table.is_alive(u32::MAX));
    }

    #[test]
    fn test_terminate_invalid_pid() {
        let table = SystemProcessTable::new();
        assert_eq!(table.terminate(0), Err(SignalError::InvalidPid(0)));
        assert_eq!(
            table.terminate(u32::MAX),
            Err(SignalError::InvalidPid(u32::MAX))
        );
    }

    #[test]
    fn test_terminate_running_child() {
        let table = SystemProcessTable::new();
        let mut child = spawn_sleep("10");
        let pid = child.id();

        assert!(table.terminate(pid).is_ok());
        let status = child.wait().unwrap();
        assert!(!status.success());
        assert_eq!(table.terminate(pid), Err(SignalError::NoSuchProcess(pid)));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_zombie_is_dead() {
        let table = SystemProcessTable::new();
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();

        // Exited but not yet reaped
        std::thread::sleep(std::time::Duration::from_millis(300));
        assert!(is_zombie(pid));
        assert!(!table.is_alive(pid));

        child.wait().unwrap();
        assert!(!is_zombie(pid));
    }
}
