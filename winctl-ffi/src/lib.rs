//! C ABI library for winctl -- loadable by ctypes, C#, or any FFI consumer.
//!
//! All exported functions follow the convention:
//! - Return `i32` status code: `WINCTL_OK=0`, or a negative code per error
//!   kind (`WINCTL_ERR_INVALID_HANDLE` .. `WINCTL_ERR_INTERNAL`)
//! - Window handles cross the boundary as `int64_t`; `0` is the null handle
//! - Structured outputs are JSON C strings allocated by Rust, freed via
//!   `winctl_free_string()`
//! - Last error retrievable via `winctl_last_error()`

use std::cell::RefCell;
use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde::Serialize;
use winctl_core::{ErrorKind, WindowControlError, WindowHandle, WindowStateKind};

pub const WINCTL_OK: i32 = 0;
pub const WINCTL_ERR_INVALID_HANDLE: i32 = -1;
pub const WINCTL_ERR_ACCESS_DENIED: i32 = -2;
pub const WINCTL_ERR_INVALID_ARGUMENT: i32 = -3;
pub const WINCTL_ERR_UNSUPPORTED: i32 = -4;
pub const WINCTL_ERR_PLATFORM: i32 = -5;
/// Marshalling failure inside this library (JSON, interior NUL).
pub const WINCTL_ERR_INTERNAL: i32 = -6;

pub const WINCTL_STATE_MINIMIZE: i32 = 0;
pub const WINCTL_STATE_MAXIMIZE: i32 = 1;
pub const WINCTL_STATE_RESTORE: i32 = 2;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn status_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::InvalidHandle => WINCTL_ERR_INVALID_HANDLE,
        ErrorKind::AccessDenied => WINCTL_ERR_ACCESS_DENIED,
        ErrorKind::InvalidArgument => WINCTL_ERR_INVALID_ARGUMENT,
        ErrorKind::UnsupportedOperation => WINCTL_ERR_UNSUPPORTED,
        ErrorKind::PlatformError => WINCTL_ERR_PLATFORM,
    }
}

fn fail(err: &WindowControlError) -> i32 {
    set_last_error(&err.to_string());
    status_code(err.kind())
}

fn invalid_argument(msg: &str) -> i32 {
    set_last_error(msg);
    WINCTL_ERR_INVALID_ARGUMENT
}

fn status(result: Result<(), WindowControlError>) -> i32 {
    match result {
        Ok(()) => WINCTL_OK,
        Err(e) => fail(&e),
    }
}

/// Store `value` through `out`, rejecting a null destination.
///
/// # Safety
///
/// `out` must be null or valid for a write of `T`.
unsafe fn write_out<T>(out: *mut T, value: T) -> i32 {
    if out.is_null() {
        return invalid_argument("output pointer is null");
    }
    unsafe { *out = value };
    WINCTL_OK
}

/// # Safety
///
/// `out` must be null or valid for a write of `*mut c_char`.
unsafe fn write_string(out: *mut *mut c_char, value: String) -> i32 {
    if out.is_null() {
        return invalid_argument("output pointer is null");
    }
    match CString::new(value) {
        Ok(cstr) => {
            unsafe { *out = cstr.into_raw() };
            WINCTL_OK
        }
        Err(e) => {
            set_last_error(&format!("CString conversion failed: {e}"));
            WINCTL_ERR_INTERNAL
        }
    }
}

/// # Safety
///
/// `out` must be null or valid for a write of `*mut c_char`.
unsafe fn write_json<T: Serialize>(out: *mut *mut c_char, value: &T) -> i32 {
    match serde_json::to_string(value) {
        Ok(json) => unsafe { write_string(out, json) },
        Err(e) => {
            set_last_error(&format!("JSON serialization failed: {e}"));
            WINCTL_ERR_INTERNAL
        }
    }
}

/// # Safety
///
/// `text` must be null or a valid null-terminated C string.
unsafe fn read_str<'a>(text: *const c_char, name: &str) -> Result<&'a str, i32> {
    if text.is_null() {
        return Err(invalid_argument(&format!("{name} is null")));
    }
    unsafe { CStr::from_ptr(text) }
        .to_str()
        .map_err(|e| invalid_argument(&format!("{name} is not valid UTF-8: {e}")))
}

fn state_kind(state: i32) -> Option<WindowStateKind> {
    match state {
        WINCTL_STATE_MINIMIZE => Some(WindowStateKind::Minimize),
        WINCTL_STATE_MAXIMIZE => Some(WindowStateKind::Maximize),
        WINCTL_STATE_RESTORE => Some(WindowStateKind::Restore),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Memory / errors
// ---------------------------------------------------------------------------

/// Retrieve the last error message (thread-local).
///
/// Returns a pointer valid until the next failing winctl_* call on this
/// thread.  Returns null if no error has occurred.
#[no_mangle]
pub extern "C" fn winctl_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|s| s.as_ptr())
            .unwrap_or(ptr::null())
    })
}

/// Free a string previously allocated by a winctl_* function.
///
/// # Safety
///
/// `ptr` must be a pointer returned by a winctl_* function or null.
#[no_mangle]
pub unsafe extern "C" fn winctl_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ---------------------------------------------------------------------------
// Enumeration / queries
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PlatformInfo {
    backend: &'static str,
    click_through_authority: winctl_core::ClickThroughAuthority,
}

/// Compiled backend and click-through authority as a JSON object.
///
/// # Safety
///
/// `out_json` must be a valid pointer to a `*mut c_char`.
#[no_mangle]
pub unsafe extern "C" fn winctl_platform(out_json: *mut *mut c_char) -> i32 {
    let info = PlatformInfo {
        backend: winctl_core::backend_name(),
        click_through_authority: winctl_core::click_through_authority(),
    };
    unsafe { write_json(out_json, &info) }
}

/// Visible top-level windows as a JSON array of window objects.
///
/// # Safety
///
/// `out_json` must be a valid pointer to a `*mut c_char`.
/// Caller must free the result with `winctl_free_string()`.
#[no_mangle]
pub unsafe extern "C" fn winctl_enumerate(out_json: *mut *mut c_char) -> i32 {
    match winctl_core::enumerate() {
        Ok(windows) => unsafe { write_json(out_json, &windows) },
        Err(e) => fail(&e),
    }
}

/// First window whose title equals (`exact != 0`) or contains `title`.
/// Writes the JSON object, or `null` when nothing matches.
///
/// # Safety
///
/// `title` must be a valid null-terminated UTF-8 C string; `out_json` a
/// valid pointer to a `*mut c_char`.
#[no_mangle]
pub unsafe extern "C" fn winctl_find_by_title(
    title: *const c_char,
    exact: i32,
    out_json: *mut *mut c_char,
) -> i32 {
    let title = match unsafe { read_str(title, "title") } {
        Ok(t) => t,
        Err(code) => return code,
    };
    match winctl_core::find_by_title(title, exact != 0) {
        Ok(found) => unsafe { write_json(out_json, &found) },
        Err(e) => fail(&e),
    }
}

/// Every window matching `title`, as a JSON array.
///
/// # Safety
///
/// Same contract as [`winctl_find_by_title`].
#[no_mangle]
pub unsafe extern "C" fn winctl_find_all_by_title(
    title: *const c_char,
    exact: i32,
    out_json: *mut *mut c_char,
) -> i32 {
    let title = match unsafe { read_str(title, "title") } {
        Ok(t) => t,
        Err(code) => return code,
    };
    match winctl_core::find_all_by_title(title, exact != 0) {
        Ok(found) => unsafe { write_json(out_json, &found) },
        Err(e) => fail(&e),
    }
}

/// Foreground window handle, or `0` when indeterminate.
///
/// # Safety
///
/// `out_handle` must be a valid pointer to an `int64_t`.
#[no_mangle]
pub unsafe extern "C" fn winctl_active_window(out_handle: *mut i64) -> i32 {
    match winctl_core::active_window() {
        Ok(handle) => unsafe { write_out(out_handle, handle.map_or(0, WindowHandle::raw)) },
        Err(e) => fail(&e),
    }
}

/// # Safety
///
/// `out_alive` must be a valid pointer to an `int32_t`.
#[no_mangle]
pub unsafe extern "C" fn winctl_is_alive(handle: i64, out_alive: *mut i32) -> i32 {
    match winctl_core::is_alive(WindowHandle::from_raw(handle)) {
        Ok(alive) => unsafe { write_out(out_alive, i32::from(alive)) },
        Err(e) => fail(&e),
    }
}

/// # Safety
///
/// `out_json` must be a valid pointer to a `*mut c_char`.
#[no_mangle]
pub unsafe extern "C" fn winctl_info(handle: i64, out_json: *mut *mut c_char) -> i32 {
    match winctl_core::info(WindowHandle::from_raw(handle)) {
        Ok(info) => unsafe { write_json(out_json, &info) },
        Err(e) => fail(&e),
    }
}

/// Executable path of the owning process as a plain C string.
///
/// # Safety
///
/// `out_path` must be a valid pointer to a `*mut c_char`.
#[no_mangle]
pub unsafe extern "C" fn winctl_process_path(handle: i64, out_path: *mut *mut c_char) -> i32 {
    match winctl_core::process_path(WindowHandle::from_raw(handle)) {
        Ok(path) => unsafe { write_string(out_path, path) },
        Err(e) => fail(&e),
    }
}

// ---------------------------------------------------------------------------
// Click-through
// ---------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn winctl_set_click_through(handle: i64) -> i32 {
    status(winctl_core::set_click_through(WindowHandle::from_raw(handle)))
}

#[no_mangle]
pub extern "C" fn winctl_remove_click_through(handle: i64) -> i32 {
    status(winctl_core::remove_click_through(WindowHandle::from_raw(handle)))
}

/// # Safety
///
/// `out_enabled` must be a valid pointer to an `int32_t`.
#[no_mangle]
pub unsafe extern "C" fn winctl_toggle_click_through(handle: i64, out_enabled: *mut i32) -> i32 {
    match winctl_core::toggle_click_through(WindowHandle::from_raw(handle)) {
        Ok(enabled) => unsafe { write_out(out_enabled, i32::from(enabled)) },
        Err(e) => fail(&e),
    }
}

/// # Safety
///
/// `out_enabled` must be a valid pointer to an `int32_t`.
#[no_mangle]
pub unsafe extern "C" fn winctl_is_click_through(handle: i64, out_enabled: *mut i32) -> i32 {
    match winctl_core::is_click_through(WindowHandle::from_raw(handle)) {
        Ok(enabled) => unsafe { write_out(out_enabled, i32::from(enabled)) },
        Err(e) => fail(&e),
    }
}

// ---------------------------------------------------------------------------
// Other mutations
// ---------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn winctl_set_always_on_top(handle: i64, enabled: i32) -> i32 {
    status(winctl_core::set_always_on_top(
        WindowHandle::from_raw(handle),
        enabled != 0,
    ))
}

/// `opacity` in `[0.0, 1.0]`; anything else is `WINCTL_ERR_INVALID_ARGUMENT`.
#[no_mangle]
pub extern "C" fn winctl_set_opacity(handle: i64, opacity: f64) -> i32 {
    status(winctl_core::set_opacity(WindowHandle::from_raw(handle), opacity))
}

/// `state` is one of `WINCTL_STATE_MINIMIZE`, `WINCTL_STATE_MAXIMIZE`,
/// `WINCTL_STATE_RESTORE`.
#[no_mangle]
pub extern "C" fn winctl_set_window_state(handle: i64, state: i32) -> i32 {
    match state_kind(state) {
        Some(kind) => status(winctl_core::set_window_state(
            WindowHandle::from_raw(handle),
            kind,
        )),
        None => invalid_argument(&format!("unknown window state {state}")),
    }
}

#[no_mangle]
pub extern "C" fn winctl_focus(handle: i64) -> i32 {
    status(winctl_core::focus(WindowHandle::from_raw(handle)))
}

/// Ask the window to close.  Returns once the request is delivered.
#[no_mangle]
pub extern "C" fn winctl_close(handle: i64) -> i32 {
    status(winctl_core::close(WindowHandle::from_raw(handle)))
}

#[no_mangle]
pub extern "C" fn winctl_kill_owning_process(handle: i64) -> i32 {
    status(winctl_core::kill_owning_process(WindowHandle::from_raw(handle)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn last_error() -> String {
        let ptr = winctl_last_error();
        assert!(!ptr.is_null());
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }

    #[test]
    fn test_status_codes_are_distinct() {
        let kinds = [
            ErrorKind::InvalidHandle,
            ErrorKind::AccessDenied,
            ErrorKind::InvalidArgument,
            ErrorKind::UnsupportedOperation,
            ErrorKind::PlatformError,
        ];
        let mut codes: Vec<i32> = kinds.iter().map(|k| status_code(*k)).collect();
        codes.push(WINCTL_ERR_INTERNAL);
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 6);
        assert!(codes.iter().all(|c| *c < WINCTL_OK));
    }

    #[test]
    fn test_null_handle_reports_invalid_handle() {
        assert_eq!(winctl_set_click_through(0), WINCTL_ERR_INVALID_HANDLE);
        assert!(last_error().starts_with("InvalidHandle"));
    }

    #[test]
    fn test_bad_opacity_reports_invalid_argument() {
        assert_eq!(winctl_set_opacity(1, 1.5), WINCTL_ERR_INVALID_ARGUMENT);
        assert!(last_error().contains("opacity"));
    }

    #[test]
    fn test_unknown_state_reports_invalid_argument() {
        assert_eq!(winctl_set_window_state(1, 9), WINCTL_ERR_INVALID_ARGUMENT);
        assert_eq!(state_kind(WINCTL_STATE_RESTORE), Some(WindowStateKind::Restore));
    }

    #[test]
    fn test_null_pointers_are_rejected() {
        let rc = unsafe { winctl_find_by_title(ptr::null(), 0, ptr::null_mut()) };
        assert_eq!(rc, WINCTL_ERR_INVALID_ARGUMENT);
        let rc = unsafe { winctl_is_alive(0, ptr::null_mut()) };
        assert_eq!(rc, WINCTL_ERR_INVALID_ARGUMENT);
    }

    #[test]
    fn test_platform_json() {
        let mut out: *mut c_char = ptr::null_mut();
        assert_eq!(unsafe { winctl_platform(&mut out) }, WINCTL_OK);
        let json = unsafe { CStr::from_ptr(out) }.to_string_lossy().into_owned();
        unsafe { winctl_free_string(out) };
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["backend"], winctl_core::backend_name());
    }

    #[test]
    fn test_json_string_round_trips_through_c() {
        let mut out: *mut c_char = ptr::null_mut();
        let rc = unsafe { write_json(&mut out, &vec![1, 2, 3]) };
        assert_eq!(rc, WINCTL_OK);
        let text = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_owned();
        unsafe { winctl_free_string(out) };
        assert_eq!(text, "[1,2,3]");
    }
}
