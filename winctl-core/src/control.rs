//! The public operation set: [`WindowController`] plus free functions over
//! the process-wide native controller.
//!
//! Every per-window operation follows the same path:
//!
//! 1. argument validation (no OS call on bad input),
//! 2. liveness probe (`InvalidHandle` for dead or null handles),
//! 3. one backend call sequence,
//! 4. lazy registry eviction when the window turned out to be gone.
//!
//! Click-through operations and `set_opacity` run step 3 inside
//! [`ClickThroughRegistry::update`], so the registry lock covers the read,
//! the decision and the write of the window's style.
//!
//! # Thread safety
//!
//! `WindowController<B>` is `Send + Sync` for any backend.  The registry
//! mutex is the only state the controller mutates.

use std::sync::OnceLock;

use crate::backend::{Backend, NativeBackend};
use crate::config::EnumerationFilter;
use crate::enumerate as enumeration;
use crate::errors::WindowControlError;
use crate::handle::WindowHandle;
use crate::process;
use crate::registry::{ClickThroughRecord, ClickThroughRegistry};
use crate::types::{ClickThroughAuthority, TitleMatch, WindowInfo, WindowStateKind};
use crate::validation;

type Result<T> = std::result::Result<T, WindowControlError>;

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Uniform window-control surface over one [`Backend`].
#[derive(Debug, Default)]
pub struct WindowController<B: Backend> {
    backend: B,
    registry: ClickThroughRegistry,
    filter: EnumerationFilter,
}

impl<B: Backend> WindowController<B> {
    pub fn new(backend: B) -> Self {
        Self::with_filter(backend, EnumerationFilter::default())
    }

    pub fn with_filter(backend: B, filter: EnumerationFilter) -> Self {
        Self {
            backend,
            registry: ClickThroughRegistry::new(),
            filter,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &ClickThroughRegistry {
        &self.registry
    }

    pub fn filter(&self) -> &EnumerationFilter {
        &self.filter
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn click_through_authority(&self) -> ClickThroughAuthority {
        self.backend.click_through_authority()
    }

    /// Liveness probe + `f`, with lazy eviction on `InvalidHandle`.
    fn checked<T>(
        &self,
        operation: &'static str,
        handle: WindowHandle,
        f: impl FnOnce(&B) -> Result<T>,
    ) -> Result<T> {
        let result = validation::ensure_live(&self.backend, handle).and_then(|()| f(&self.backend));
        match &result {
            Ok(_) => log::debug!("{operation}({handle}) ok"),
            Err(WindowControlError::InvalidHandle { .. }) => {
                if self.registry.forget(handle) {
                    log::warn!("{operation}: window {handle} is gone, evicted registry entry");
                } else {
                    log::debug!("{operation}: window {handle} is gone");
                }
            }
            Err(e) => log::debug!("{operation}({handle}) failed: {e}"),
        }
        result
    }

    /// Effective click-through: the OS answer when it has one, otherwise
    /// the last state this controller applied.
    fn effective_click_through(
        backend: &B,
        handle: WindowHandle,
        entry: &Option<ClickThroughRecord>,
    ) -> Result<bool> {
        Ok(match backend.read_click_through(handle)? {
            Some(enabled) => enabled,
            None => entry.is_some_and(|r| r.enabled),
        })
    }

    /// Apply `enable` and store what was applied.
    fn write_click_through(
        backend: &B,
        handle: WindowHandle,
        enable: bool,
        entry: &mut Option<ClickThroughRecord>,
    ) -> Result<()> {
        let owned = entry.map_or(0, |r| r.owned_bits);
        let owned_bits = backend.write_click_through(handle, enable, owned)?;
        *entry = if enable || owned_bits != 0 {
            Some(ClickThroughRecord {
                enabled: enable,
                owned_bits,
            })
        } else {
            None
        };
        Ok(())
    }

    // -- enumeration -------------------------------------------------------

    pub fn enumerate(&self) -> Result<Vec<WindowInfo>> {
        enumeration::collect(&self.backend, &self.filter)
    }

    /// First enumerated window whose title equals (`exact`) or contains
    /// `text`.  Case-sensitive.
    pub fn find_by_title(&self, text: &str, exact: bool) -> Result<Option<WindowInfo>> {
        self.find_matching(text, TitleMatch::from_exact(exact))
    }

    pub fn find_all_by_title(&self, text: &str, exact: bool) -> Result<Vec<WindowInfo>> {
        self.find_all_matching(text, TitleMatch::from_exact(exact))
    }

    pub fn find_matching(&self, text: &str, mode: TitleMatch) -> Result<Option<WindowInfo>> {
        validation::validate_search_text(text)?;
        Ok(enumeration::find_first(self.enumerate()?, text, mode))
    }

    pub fn find_all_matching(&self, text: &str, mode: TitleMatch) -> Result<Vec<WindowInfo>> {
        validation::validate_search_text(text)?;
        Ok(enumeration::find_all(self.enumerate()?, text, mode))
    }

    pub fn active_window(&self) -> Result<Option<WindowHandle>> {
        Ok(self
            .backend
            .foreground_window()?
            .filter(|h| !h.is_null()))
    }

    // -- queries -----------------------------------------------------------

    /// Whether `handle` names a live window.  Never fails with
    /// `InvalidHandle`.
    pub fn is_alive(&self, handle: WindowHandle) -> Result<bool> {
        if handle.is_null() {
            return Ok(false);
        }
        self.backend.is_window(handle)
    }

    pub fn info(&self, handle: WindowHandle) -> Result<WindowInfo> {
        self.checked("info", handle, |b| b.window_info(handle))
    }

    /// Executable path of the process owning `handle`.
    pub fn process_path(&self, handle: WindowHandle) -> Result<String> {
        self.checked("process_path", handle, |b| {
            let pid = b.owning_pid(handle)?;
            b.process_path(pid)
        })
    }

    // -- click-through -----------------------------------------------------

    pub fn set_click_through(&self, handle: WindowHandle) -> Result<()> {
        self.checked("set_click_through", handle, |b| {
            self.registry
                .update(handle, |entry| Self::write_click_through(b, handle, true, entry))
        })
    }

    /// Clear click-through, leaving style bits this controller did not
    /// introduce in place.
    pub fn remove_click_through(&self, handle: WindowHandle) -> Result<()> {
        self.checked("remove_click_through", handle, |b| {
            self.registry
                .update(handle, |entry| Self::write_click_through(b, handle, false, entry))
        })
    }

    /// Flip click-through and return the new state.
    pub fn toggle_click_through(&self, handle: WindowHandle) -> Result<bool> {
        self.checked("toggle_click_through", handle, |b| {
            self.registry.update(handle, |entry| {
                let next = !Self::effective_click_through(b, handle, entry)?;
                Self::write_click_through(b, handle, next, entry)?;
                Ok(next)
            })
        })
    }

    /// `false` for windows this controller never touched on backends where
    /// the OS cannot report the state.
    pub fn is_click_through(&self, handle: WindowHandle) -> Result<bool> {
        self.checked("is_click_through", handle, |b| {
            let entry = self.registry.get(handle);
            Self::effective_click_through(b, handle, &entry)
        })
    }

    // -- other mutations ---------------------------------------------------

    pub fn set_always_on_top(&self, handle: WindowHandle, enabled: bool) -> Result<()> {
        self.checked("set_always_on_top", handle, |b| b.set_topmost(handle, enabled))
    }

    /// `level` in `[0.0, 1.0]`; 1.0 restores the untouched appearance.
    ///
    /// Runs under the registry lock: on Win32 it rewrites the same
    /// extended style as click-through.
    pub fn set_opacity(&self, handle: WindowHandle, level: f64) -> Result<()> {
        let opacity = validation::validate_opacity(level)?;
        self.checked("set_opacity", handle, |b| {
            self.registry.update(handle, |_| b.set_opacity(handle, opacity))
        })
    }

    pub fn set_window_state(&self, handle: WindowHandle, kind: WindowStateKind) -> Result<()> {
        self.checked("set_window_state", handle, |b| b.apply_state(handle, kind))
    }

    pub fn focus(&self, handle: WindowHandle) -> Result<()> {
        self.checked("focus", handle, |b| b.focus(handle))
    }

    /// Request a graceful close.  Returns as soon as the request is
    /// delivered; the window may still be open, or never close.
    pub fn close(&self, handle: WindowHandle) -> Result<()> {
        self.checked("close", handle, |b| b.request_close(handle))
    }

    /// Forcibly terminate the process owning `handle`.
    ///
    /// The pid is resolved from the live window immediately before the
    /// kill.  The calling process and pid 0 are refused with `AccessDenied`.
    pub fn kill_owning_process(&self, handle: WindowHandle) -> Result<()> {
        self.checked("kill_owning_process", handle, |b| {
            let pid = b.owning_pid(handle)?;
            process::ensure_killable(pid)?;
            log::debug!("terminating pid {pid} (owner of window {handle})");
            b.terminate_process(pid)
        })
    }

    // -- registry ----------------------------------------------------------

    pub fn tracked_handles(&self) -> Vec<WindowHandle> {
        self.registry.tracked_handles()
    }

    /// Drop remembered click-through state for `handle`.
    pub fn forget(&self, handle: WindowHandle) -> bool {
        self.registry.forget(handle)
    }
}

// ---------------------------------------------------------------------------
// Process-wide native controller
// ---------------------------------------------------------------------------

static NATIVE: OnceLock<WindowController<NativeBackend>> = OnceLock::new();

/// The controller for this platform's window system, created on first use
/// and shared for the life of the process.
pub fn native() -> &'static WindowController<NativeBackend> {
    NATIVE.get_or_init(|| {
        let controller = WindowController::new(NativeBackend::default());
        log::debug!("initialised {} window controller", controller.backend_name());
        controller
    })
}

pub fn backend_name() -> &'static str {
    native().backend_name()
}

pub fn click_through_authority() -> ClickThroughAuthority {
    native().click_through_authority()
}

pub fn enumerate() -> Result<Vec<WindowInfo>> {
    native().enumerate()
}

pub fn find_by_title(text: &str, exact: bool) -> Result<Option<WindowInfo>> {
    native().find_by_title(text, exact)
}

pub fn find_all_by_title(text: &str, exact: bool) -> Result<Vec<WindowInfo>> {
    native().find_all_by_title(text, exact)
}

pub fn find_matching(text: &str, mode: TitleMatch) -> Result<Option<WindowInfo>> {
    native().find_matching(text, mode)
}

pub fn active_window() -> Result<Option<WindowHandle>> {
    native().active_window()
}

pub fn is_alive(handle: WindowHandle) -> Result<bool> {
    native().is_alive(handle)
}

pub fn info(handle: WindowHandle) -> Result<WindowInfo> {
    native().info(handle)
}

pub fn process_path(handle: WindowHandle) -> Result<String> {
    native().process_path(handle)
}

pub fn set_click_through(handle: WindowHandle) -> Result<()> {
    native().set_click_through(handle)
}

pub fn remove_click_through(handle: WindowHandle) -> Result<()> {
    native().remove_click_through(handle)
}

pub fn toggle_click_through(handle: WindowHandle) -> Result<bool> {
    native().toggle_click_through(handle)
}

pub fn is_click_through(handle: WindowHandle) -> Result<bool> {
    native().is_click_through(handle)
}

pub fn set_always_on_top(handle: WindowHandle, enabled: bool) -> Result<()> {
    native().set_always_on_top(handle, enabled)
}

pub fn set_opacity(handle: WindowHandle, level: f64) -> Result<()> {
    native().set_opacity(handle, level)
}

pub fn set_window_state(handle: WindowHandle, kind: WindowStateKind) -> Result<()> {
    native().set_window_state(handle, kind)
}

pub fn focus(handle: WindowHandle) -> Result<()> {
    native().focus(handle)
}

pub fn close(handle: WindowHandle) -> Result<()> {
    native().close(handle)
}

pub fn kill_owning_process(handle: WindowHandle) -> Result<()> {
    native().kill_owning_process(handle)
}

pub fn tracked_handles() -> Vec<WindowHandle> {
    native().tracked_handles()
}

pub fn forget(handle: WindowHandle) -> bool {
    native().forget(handle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::UnsupportedBackend;
    use crate::errors::ErrorKind;

    #[test]
    fn test_controller_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WindowController<UnsupportedBackend>>();
        assert_send_sync::<WindowController<NativeBackend>>();
    }

    #[test]
    fn test_opacity_checked_before_liveness() {
        // The unsupported backend fails every probe; the argument error
        // must win.
        let c = WindowController::new(UnsupportedBackend);
        let err = c.set_opacity(WindowHandle::from_raw(7), 2.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_null_handle_is_dead() {
        let c = WindowController::new(UnsupportedBackend);
        assert!(!c.is_alive(WindowHandle::NULL).unwrap());
        assert_eq!(
            c.info(WindowHandle::NULL).unwrap_err().kind(),
            ErrorKind::InvalidHandle
        );
    }

    #[test]
    fn test_native_backend_name_is_stable() {
        assert_eq!(backend_name(), native().backend().name());
    }
}
