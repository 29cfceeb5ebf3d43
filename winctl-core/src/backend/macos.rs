//! macOS backend: Quartz window list for discovery, AppKit for mutation.
//!
//! Handles are `CGWindowID`s (`kCGWindowNumber`), which are stable for a
//! window's lifetime and visible to every process.  Enumeration, info and
//! the liveness probe use `CGWindowListCopyWindowInfo`.
//!
//! Mutating a window means sending AppKit messages to its `NSWindow`, which
//! only exists inside the owning process.  Handles are therefore mapped back
//! with `[NSApp windowWithWindowNumber:]`; windows of other applications
//! report `UnsupportedOperation`.  The one exception is `focus`, which for a
//! foreign window activates the owning application instead.
//!
//! # Platform notes
//!
//! - Window titles (`kCGWindowName`) are empty unless the host process has
//!   the Screen Recording permission.  Quartz has no window-class notion,
//!   so `class_name` is always empty.
//! - AppKit expects these messages on the main thread; callers embedding
//!   this crate in an app should dispatch accordingly.
//! - `ignoresMouseEvents` is readable for in-process windows only, so the
//!   registry stays authoritative for click-through.

#![allow(unexpected_cfgs)]

use std::os::raw::c_void;

use core_foundation::base::{CFType, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::geometry::CGRect;
use core_graphics::window::{
    copy_window_info, kCGNullWindowID, kCGWindowListExcludeDesktopElements,
    kCGWindowListOptionIncludingWindow, kCGWindowListOptionOnScreenOnly, CGWindowID,
    CGWindowListOption,
};
use objc::runtime::{Object, BOOL, NO, YES};
use objc::{class, msg_send, sel, sel_impl};

use super::{Backend, BackendResult};
use crate::config::EnumerationFilter;
use crate::errors::WindowControlError;
use crate::handle::WindowHandle;
use crate::types::{ClickThroughAuthority, Opacity, WindowInfo, WindowStateKind};

const NAME: &str = "macos";

// NSWindowLevel
const NS_NORMAL_WINDOW_LEVEL: isize = 0;
const NS_FLOATING_WINDOW_LEVEL: isize = 3;
// NSApplicationActivationOptions
const NS_ACTIVATE_IGNORING_OTHER_APPS: usize = 1 << 1;

#[link(name = "AppKit", kind = "framework")]
extern "C" {
    static NSApp: *mut Object;
}

// ---------------------------------------------------------------------------
// Quartz window list
// ---------------------------------------------------------------------------

fn window_dicts(option: CGWindowListOption, relative_to: CGWindowID) -> Vec<CFDictionary> {
    let Some(array) = copy_window_info(option, relative_to) else {
        return Vec::new();
    };
    array
        .iter()
        .filter(|item| !item.is_null())
        .map(|item| unsafe { CFDictionary::wrap_under_get_rule(*item as CFDictionaryRef) })
        .collect()
}

fn lookup(dict: &CFDictionary, key: &'static str) -> Option<CFType> {
    let key = CFString::from_static_string(key);
    dict.find(key.as_CFTypeRef() as *const c_void)
        .map(|value| unsafe { CFType::wrap_under_get_rule(*value) })
}

fn lookup_i64(dict: &CFDictionary, key: &'static str) -> Option<i64> {
    lookup(dict, key)?.downcast::<CFNumber>()?.to_i64()
}

fn lookup_string(dict: &CFDictionary, key: &'static str) -> String {
    lookup(dict, key)
        .and_then(|v| v.downcast::<CFString>())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn lookup_bool(dict: &CFDictionary, key: &'static str) -> bool {
    lookup(dict, key)
        .and_then(|v| v.downcast::<CFBoolean>())
        .is_some_and(bool::from)
}

/// Window layer; 0 is the normal application layer.
fn layer(dict: &CFDictionary) -> i64 {
    lookup_i64(dict, "kCGWindowLayer").unwrap_or(0)
}

fn to_info(dict: &CFDictionary) -> Option<WindowInfo> {
    let number = lookup_i64(dict, "kCGWindowNumber")?;
    let bounds = lookup(dict, "kCGWindowBounds")
        .and_then(|v| v.downcast::<CFDictionary>())
        .and_then(|b| CGRect::from_dict_representation(&b));
    let (x, y, width, height) = bounds
        .map(|r| {
            (
                r.origin.x as i32,
                r.origin.y as i32,
                r.size.width as i32,
                r.size.height as i32,
            )
        })
        .unwrap_or_default();

    Some(WindowInfo {
        handle: WindowHandle::from_raw(number),
        title: lookup_string(dict, "kCGWindowName"),
        process_id: lookup_i64(dict, "kCGWindowOwnerPID")
            .and_then(|pid| u32::try_from(pid).ok())
            .unwrap_or(0),
        class_name: String::new(),
        visible: lookup_bool(dict, "kCGWindowIsOnscreen"),
        x,
        y,
        width,
        height,
    })
}

fn describe(handle: WindowHandle) -> BackendResult<Option<WindowInfo>> {
    let id = handle.to_u32()?;
    Ok(window_dicts(kCGWindowListOptionIncludingWindow, id)
        .iter()
        .filter_map(to_info)
        .find(|info| info.handle == handle))
}

// ---------------------------------------------------------------------------
// AppKit
// ---------------------------------------------------------------------------

/// The in-process `NSWindow` behind `handle`.
fn ns_window(handle: WindowHandle, operation: &'static str) -> BackendResult<*mut Object> {
    let number = handle.to_u32()?;
    let window: *mut Object = unsafe {
        let app = NSApp;
        if app.is_null() {
            return Err(WindowControlError::unsupported(operation, NAME));
        }
        msg_send![app, windowWithWindowNumber: number as isize]
    };
    if window.is_null() {
        log::debug!("window {handle} belongs to another process; {operation} unavailable");
        return Err(WindowControlError::unsupported(operation, NAME));
    }
    Ok(window)
}

fn to_bool(flag: BOOL) -> bool {
    flag != NO
}

/// Bring the application owning `pid` to the front.
fn activate_application(pid: u32) -> BackendResult<()> {
    let activated: BOOL = unsafe {
        let app: *mut Object = msg_send![
            class!(NSRunningApplication),
            runningApplicationWithProcessIdentifier: pid as i32
        ];
        if app.is_null() {
            return Err(WindowControlError::platform(
                3, // ESRCH
                format!("no running application with pid {pid}"),
            ));
        }
        msg_send![app, activateWithOptions: NS_ACTIVATE_IGNORING_OTHER_APPS]
    };
    if to_bool(activated) {
        Ok(())
    } else {
        Err(WindowControlError::AccessDenied(format!(
            "application {pid} refused activation"
        )))
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct CocoaBackend;

impl Backend for CocoaBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn click_through_authority(&self) -> ClickThroughAuthority {
        ClickThroughAuthority::Registry
    }

    fn is_window(&self, handle: WindowHandle) -> BackendResult<bool> {
        if handle.to_u32().is_err() {
            return Ok(false);
        }
        Ok(describe(handle)?.is_some())
    }

    fn list_windows(&self, filter: &EnumerationFilter) -> BackendResult<Vec<WindowInfo>> {
        let dicts = window_dicts(
            kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements,
            kCGNullWindowID,
        );
        Ok(dicts
            .iter()
            // Menu bar, Dock and overlays sit above layer 0.
            .filter(|d| filter.include_tool_windows || layer(d) == 0)
            .filter_map(to_info)
            .collect())
    }

    fn window_info(&self, handle: WindowHandle) -> BackendResult<WindowInfo> {
        describe(handle)?.ok_or(WindowControlError::InvalidHandle { handle })
    }

    fn foreground_window(&self) -> BackendResult<Option<WindowHandle>> {
        // The on-screen list is ordered front to back.
        let dicts = window_dicts(
            kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements,
            kCGNullWindowID,
        );
        Ok(dicts
            .iter()
            .filter(|d| layer(d) == 0)
            .find_map(to_info)
            .map(|info| info.handle))
    }

    fn owning_pid(&self, handle: WindowHandle) -> BackendResult<u32> {
        let info = self.window_info(handle)?;
        if info.process_id == 0 {
            return Err(WindowControlError::platform(
                0,
                format!("window {handle} reports no owner pid"),
            ));
        }
        Ok(info.process_id)
    }

    fn read_click_through(&self, handle: WindowHandle) -> BackendResult<Option<bool>> {
        match ns_window(handle, "is_click_through") {
            Ok(window) => {
                let ignores: BOOL = unsafe { msg_send![window, ignoresMouseEvents] };
                Ok(Some(to_bool(ignores)))
            }
            Err(WindowControlError::UnsupportedOperation { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_click_through(
        &self,
        handle: WindowHandle,
        enable: bool,
        _owned_bits: u64,
    ) -> BackendResult<u64> {
        let window = ns_window(handle, "set_click_through")?;
        let flag = if enable { YES } else { NO };
        unsafe {
            let () = msg_send![window, setIgnoresMouseEvents: flag];
        }
        Ok(0)
    }

    fn set_topmost(&self, handle: WindowHandle, enabled: bool) -> BackendResult<()> {
        let window = ns_window(handle, "set_always_on_top")?;
        let level = if enabled {
            NS_FLOATING_WINDOW_LEVEL
        } else {
            NS_NORMAL_WINDOW_LEVEL
        };
        unsafe {
            let () = msg_send![window, setLevel: level];
        }
        Ok(())
    }

    fn set_opacity(&self, handle: WindowHandle, opacity: Opacity) -> BackendResult<()> {
        let window = ns_window(handle, "set_opacity")?;
        unsafe {
            let () = msg_send![window, setAlphaValue: opacity.level()];
        }
        Ok(())
    }

    fn apply_state(&self, handle: WindowHandle, kind: WindowStateKind) -> BackendResult<()> {
        let window = ns_window(handle, "set_window_state")?;
        let nil: *mut Object = std::ptr::null_mut();
        unsafe {
            let zoomed: BOOL = msg_send![window, isZoomed];
            match kind {
                WindowStateKind::Minimize => {
                    let () = msg_send![window, miniaturize: nil];
                }
                WindowStateKind::Maximize => {
                    if !to_bool(zoomed) {
                        let () = msg_send![window, zoom: nil];
                    }
                }
                WindowStateKind::Restore => {
                    let minimized: BOOL = msg_send![window, isMiniaturized];
                    if to_bool(minimized) {
                        let () = msg_send![window, deminiaturize: nil];
                    }
                    if to_bool(zoomed) {
                        let () = msg_send![window, zoom: nil];
                    }
                }
            }
        }
        Ok(())
    }

    fn focus(&self, handle: WindowHandle) -> BackendResult<()> {
        match ns_window(handle, "focus") {
            Ok(window) => {
                let nil: *mut Object = std::ptr::null_mut();
                unsafe {
                    let () = msg_send![window, makeKeyAndOrderFront: nil];
                    let () = msg_send![NSApp, activateIgnoringOtherApps: YES];
                }
                Ok(())
            }
            Err(WindowControlError::UnsupportedOperation { .. }) => {
                activate_application(self.owning_pid(handle)?)
            }
            Err(e) => Err(e),
        }
    }

    fn request_close(&self, handle: WindowHandle) -> BackendResult<()> {
        let window = ns_window(handle, "close")?;
        let nil: *mut Object = std::ptr::null_mut();
        unsafe {
            let () = msg_send![window, performClose: nil];
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&'static str, CFType)]) -> CFDictionary {
        let pairs: Vec<(CFString, CFType)> = pairs
            .iter()
            .map(|(k, v)| (CFString::from_static_string(k), v.clone()))
            .collect();
        CFDictionary::from_CFType_pairs(&pairs).to_untyped()
    }

    #[test]
    fn test_window_record_leaves_class_name_empty() {
        let dict = record(&[
            ("kCGWindowNumber", CFNumber::from(42i64).as_CFType()),
            ("kCGWindowOwnerPID", CFNumber::from(501i64).as_CFType()),
            ("kCGWindowOwnerName", CFString::from_static_string("Finder").as_CFType()),
            ("kCGWindowName", CFString::from_static_string("Downloads").as_CFType()),
        ]);
        let info = to_info(&dict).unwrap();
        assert_eq!(info.handle, WindowHandle::from_raw(42));
        assert_eq!(info.process_id, 501);
        assert_eq!(info.title, "Downloads");
        assert!(info.class_name.is_empty());
    }
}
