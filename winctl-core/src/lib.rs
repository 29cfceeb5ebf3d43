//! `winctl_core` -- cross-platform control of native top-level windows.
//!
//! Enumerate windows, look them up by title, and change how they behave:
//! click-through, always-on-top, opacity, minimize / maximize / restore,
//! focus, close, and terminating the owning process.
//!
//! This crate contains all logic with **no binding dependency**.  It is
//! consumed by:
//! - `winctl-pyo3` (PyO3 Python extension)
//! - `winctl-ffi` (C ABI library for ctypes / other languages)
//! - `winctl-cli` (`winctl` command)
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`handle`] | `WindowHandle` newtype and its JSON / text encodings |
//! | [`errors`] | `WindowControlError` enum via `thiserror`, flat `ErrorKind` |
//! | [`types`] | `WindowInfo`, `Opacity`, `WindowStateKind`, `TitleMatch` |
//! | [`config`] | `EnumerationFilter` (serde-configurable) |
//! | [`registry`] | Process-wide click-through state, `parking_lot::Mutex` |
//! | [`backend`] | `Backend` trait, Win32 / X11 / Cocoa implementations |
//! | [`process`] | Owning-process path and termination via `sysinfo` |
//! | [`validation`] | Liveness and argument checks |
//! | [`enumerate`] | Enumeration filtering and title search |
//! | [`control`] | `WindowController` and the free-function API |
//!
//! # Example
//!
//! ```no_run
//! let target = winctl_core::find_by_title("Overlay", true)?;
//! if let Some(window) = target {
//!     winctl_core::set_click_through(window.handle)?;
//!     winctl_core::set_opacity(window.handle, 0.8)?;
//! }
//! # Ok::<(), winctl_core::WindowControlError>(())
//! ```

pub mod backend;
pub mod config;
pub mod control;
pub mod enumerate;
pub mod errors;
pub mod handle;
pub mod process;
pub mod registry;
pub mod types;
pub mod validation;

pub use backend::{Backend, NativeBackend};
pub use config::EnumerationFilter;
pub use control::{
    active_window, backend_name, click_through_authority, close, enumerate, find_all_by_title,
    find_by_title, find_matching, focus, forget, info, is_alive, is_click_through,
    kill_owning_process, native, process_path, remove_click_through, set_always_on_top,
    set_click_through, set_opacity, set_window_state, toggle_click_through, tracked_handles,
    WindowController,
};
pub use errors::{ErrorKind, WindowControlError};
pub use handle::WindowHandle;
pub use types::{ClickThroughAuthority, Opacity, TitleMatch, WindowInfo, WindowStateKind};
