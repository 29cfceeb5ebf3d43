//! Platform backends.
//!
//! Every operating-system family implements [`Backend`], translating the
//! uniform capability set into its own primitive:
//!
//! | Backend | Click-through | Always-on-top | Opacity |
//! |---------|---------------|---------------|---------|
//! | [`Win32Backend`] | `WS_EX_TRANSPARENT \| WS_EX_LAYERED` | `HWND_TOPMOST` | layered alpha |
//! | [`X11Backend`] | XFixes empty input shape | `_NET_WM_STATE_ABOVE` | `_NET_WM_WINDOW_OPACITY` |
//! | [`CocoaBackend`] | `setIgnoresMouseEvents:` | `setLevel:` | `setAlphaValue:` |
//! | [`UnsupportedBackend`] | -- | -- | -- |
//!
//! Exactly one native backend is compiled per target and exported as
//! [`NativeBackend`].  All `unsafe` OS calls live under this module.
//!
//! Backends are never called with a null handle, an out-of-range opacity,
//! or (for per-window operations) a handle that failed the liveness probe
//! moments earlier; [`crate::validation`] runs first.  They must still
//! report `InvalidHandle` when the window vanishes mid-call.

pub mod ex_style;
mod unsupported;

#[cfg(target_os = "windows")]
mod win32;

#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
mod x11;

#[cfg(target_os = "macos")]
mod macos;

pub use unsupported::UnsupportedBackend;

#[cfg(target_os = "windows")]
pub use win32::Win32Backend;
#[cfg(target_os = "windows")]
pub type NativeBackend = Win32Backend;

#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
pub use x11::X11Backend;
#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
pub type NativeBackend = X11Backend;

#[cfg(target_os = "macos")]
pub use macos::CocoaBackend;
#[cfg(target_os = "macos")]
pub type NativeBackend = CocoaBackend;

#[cfg(not(any(
    target_os = "windows",
    target_os = "macos",
    all(unix, not(any(target_os = "ios", target_os = "android")))
)))]
pub type NativeBackend = UnsupportedBackend;

use crate::config::EnumerationFilter;
use crate::errors::WindowControlError;
use crate::handle::WindowHandle;
use crate::process;
use crate::types::{ClickThroughAuthority, Opacity, WindowInfo, WindowStateKind};

pub type BackendResult<T> = Result<T, WindowControlError>;

/// The fixed capability set every platform provides.
///
/// Methods that a platform cannot honour return
/// [`WindowControlError::UnsupportedOperation`]; they never silently
/// succeed.
pub trait Backend: Send + Sync {
    /// Short backend identifier used in logs and errors.
    fn name(&self) -> &'static str;

    /// Whether [`Backend::read_click_through`] is authoritative.
    fn click_through_authority(&self) -> ClickThroughAuthority;

    /// Liveness probe: does `handle` still name a window?
    fn is_window(&self, handle: WindowHandle) -> BackendResult<bool>;

    /// One OS enumeration pass over top-level windows.
    ///
    /// Backends drop non-top-level windows and, unless
    /// `filter.include_tool_windows` is set, tool / dock / system windows.
    /// Title and class filtering happens afterwards in
    /// [`crate::enumerate`].
    fn list_windows(&self, filter: &EnumerationFilter) -> BackendResult<Vec<WindowInfo>>;

    fn window_info(&self, handle: WindowHandle) -> BackendResult<WindowInfo>;

    /// The OS foreground window, or `None` when indeterminate.
    fn foreground_window(&self) -> BackendResult<Option<WindowHandle>>;

    /// Process id owning `handle`, resolved fresh from the OS.
    fn owning_pid(&self, handle: WindowHandle) -> BackendResult<u32>;

    fn process_path(&self, pid: u32) -> BackendResult<String> {
        process::executable_path(pid)
    }

    fn terminate_process(&self, pid: u32) -> BackendResult<()> {
        process::terminate(pid)
    }

    /// Read click-through from the OS.  `Ok(None)` means the OS cannot tell.
    fn read_click_through(&self, handle: WindowHandle) -> BackendResult<Option<bool>>;

    /// Apply or clear click-through in one read-modify-write.
    ///
    /// `owned_bits` are the bits this crate introduced earlier (from the
    /// registry); the return value is the updated set to store back.
    fn write_click_through(
        &self,
        handle: WindowHandle,
        enable: bool,
        owned_bits: u64,
    ) -> BackendResult<u64>;

    fn set_topmost(&self, handle: WindowHandle, enabled: bool) -> BackendResult<()>;

    fn set_opacity(&self, handle: WindowHandle, opacity: Opacity) -> BackendResult<()>;

    fn apply_state(&self, handle: WindowHandle, kind: WindowStateKind) -> BackendResult<()>;

    fn focus(&self, handle: WindowHandle) -> BackendResult<()>;

    /// Ask the window to close through its own protocol.  Returns once the
    /// request is delivered; the application may refuse it.
    fn request_close(&self, handle: WindowHandle) -> BackendResult<()>;
}
