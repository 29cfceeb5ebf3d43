//! Owning-process inspection and termination via the `sysinfo` crate.
//!
//! Used by backends whose window system has no process API of its own
//! (X11, macOS).  The Win32 backend overrides both operations with
//! `OpenProcess`-based calls.
//!
//! # Thread safety
//!
//! `sysinfo::System` is wrapped in `parking_lot::Mutex` + `OnceLock` and
//! refreshed only for the single pid being asked about.

use std::sync::OnceLock;

use parking_lot::Mutex;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, Signal, System, UpdateKind};

use crate::errors::WindowControlError;

// ---------------------------------------------------------------------------
// Singleton
// ---------------------------------------------------------------------------

static SYSTEM: OnceLock<Mutex<System>> = OnceLock::new();

fn get_system() -> &'static Mutex<System> {
    SYSTEM.get_or_init(|| Mutex::new(System::new()))
}

/// Refresh one pid and run `f` on it, or report that it has exited.
fn with_process<T>(
    pid: u32,
    f: impl FnOnce(&sysinfo::Process) -> Result<T, WindowControlError>,
) -> Result<T, WindowControlError> {
    let mut sys = get_system().lock();
    let sys_pid = Pid::from_u32(pid);
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[sys_pid]),
        true,
        ProcessRefreshKind::nothing().with_exe(UpdateKind::Always),
    );
    match sys.process(sys_pid) {
        Some(process) => f(process),
        None => Err(WindowControlError::platform(
            3, // ESRCH
            format!("process {pid} has exited"),
        )),
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Refuse pids that must never be force-terminated through a window
/// handle: the idle / kernel pid and the calling process itself.
pub fn ensure_killable(pid: u32) -> Result<(), WindowControlError> {
    if pid == 0 {
        return Err(WindowControlError::AccessDenied(
            "refusing to terminate pid 0".to_owned(),
        ));
    }
    if pid == std::process::id() {
        return Err(WindowControlError::AccessDenied(format!(
            "refusing to terminate the calling process ({pid})"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Absolute executable path of `pid`.
///
/// `sysinfo` leaves `exe()` empty when the caller may not inspect the
/// process, which is reported as `AccessDenied`.
pub fn executable_path(pid: u32) -> Result<String, WindowControlError> {
    with_process(pid, |process| match process.exe() {
        Some(path) => Ok(path.to_string_lossy().into_owned()),
        None => Err(WindowControlError::AccessDenied(format!(
            "cannot read executable path of process {pid}"
        ))),
    })
}

/// Forcibly terminate `pid` (SIGKILL / TerminateProcess).  Callers run
/// [`ensure_killable`] first.
pub fn terminate(pid: u32) -> Result<(), WindowControlError> {
    with_process(pid, |process| match process.kill_with(Signal::Kill) {
        Some(true) => {
            log::debug!("terminated process {pid}");
            Ok(())
        }
        Some(false) => Err(WindowControlError::AccessDenied(format!(
            "not permitted to terminate process {pid}"
        ))),
        None => Err(WindowControlError::unsupported("kill_owning_process", "sysinfo")),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_refuses_self_and_pid_zero() {
        assert_eq!(ensure_killable(0).unwrap_err().kind(), ErrorKind::AccessDenied);
        assert_eq!(
            ensure_killable(std::process::id()).unwrap_err().kind(),
            ErrorKind::AccessDenied
        );
        assert!(ensure_killable(std::process::id().wrapping_add(1)).is_ok());
    }

    #[test]
    fn test_terminate_missing_process_is_platform_error() {
        let err = terminate(u32::MAX - 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PlatformError);
    }

    #[test]
    fn test_own_executable_path_resolves() {
        let path = executable_path(std::process::id()).unwrap();
        assert!(!path.is_empty());
    }
}
