//! Win32 backend.
//!
//! Click-through is the combination of two extended-style bits:
//! `WS_EX_TRANSPARENT` (hit-testing skips the window) and `WS_EX_LAYERED`
//! (the compositor keeps drawing it).  Either bit alone does not give the
//! intended result, so both are written in a single `SetWindowLongPtrW`
//! computed from the style read in the same call.
//!
//! The OS reports extended styles directly, so this backend is the
//! click-through authority; the registry only remembers which bits this
//! crate added.
//!
//! Snapshot collection for enumeration runs on the Rayon pool: each
//! `WindowInfo` needs several cross-process round trips (`WM_GETTEXT`).

use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;

use rayon::prelude::*;
use windows::core::PWSTR;
use windows::Win32::Foundation::{
    CloseHandle, GetLastError, SetLastError, BOOL, COLORREF, ERROR_INVALID_WINDOW_HANDLE,
    ERROR_SUCCESS, HANDLE, HWND, LPARAM, RECT, TRUE, WIN32_ERROR, WPARAM,
};
use windows::Win32::Graphics::Dwm::{DwmGetWindowAttribute, DWMWA_CLOAKED};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, TerminateProcess, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_TERMINATE,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, GetForegroundWindow, GetLayeredWindowAttributes,
    GetWindowLongPtrW, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
    GetWindowThreadProcessId, IsWindow, IsWindowVisible, PostMessageW, SetForegroundWindow,
    SetLayeredWindowAttributes, SetWindowLongPtrW, SetWindowPos, ShowWindow, GWL_EXSTYLE,
    GWL_STYLE, HWND_NOTOPMOST, HWND_TOPMOST, LAYERED_WINDOW_ATTRIBUTES_FLAGS, LWA_ALPHA,
    LWA_COLORKEY, SHOW_WINDOW_CMD, SWP_FRAMECHANGED, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE,
    SWP_NOZORDER, SW_MAXIMIZE, SW_MINIMIZE, SW_RESTORE, WINDOW_LONG_PTR_INDEX, WM_CLOSE,
    WS_CHILD, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TRANSPARENT,
};

use super::ex_style::{self, CLICK_THROUGH_BITS};
use super::{Backend, BackendResult};
use crate::config::EnumerationFilter;
use crate::errors::WindowControlError;
use crate::handle::WindowHandle;
use crate::types::{ClickThroughAuthority, Opacity, WindowInfo, WindowStateKind};

const NAME: &str = "win32";

const _: () = assert!(
    ex_style::TRANSPARENT == WS_EX_TRANSPARENT.0 && ex_style::LAYERED == WS_EX_LAYERED.0
);

#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Backend;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn to_hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.raw() as isize as *mut core::ffi::c_void)
}

fn from_hwnd(hwnd: HWND) -> WindowHandle {
    WindowHandle::from_raw(hwnd.0 as isize as i64)
}

/// Classify a Win32 failure against the handle it was issued for.
fn os_error(handle: WindowHandle, err: windows::core::Error) -> WindowControlError {
    if err.code() == ERROR_INVALID_WINDOW_HANDLE.to_hresult() {
        WindowControlError::InvalidHandle { handle }
    } else {
        err.into()
    }
}

/// Report the thread's last error if it is set, for APIs whose return value
/// cannot distinguish failure from a legitimate zero.
fn check_last_error(handle: WindowHandle, what: &str) -> BackendResult<()> {
    let code: WIN32_ERROR = unsafe { GetLastError() };
    if code == ERROR_SUCCESS {
        return Ok(());
    }
    if code == ERROR_INVALID_WINDOW_HANDLE {
        return Err(WindowControlError::InvalidHandle { handle });
    }
    let err = windows::core::Error::from(code.to_hresult());
    log::debug!("{what}({handle}) failed: {err}");
    Err(err.into())
}

fn read_long(handle: WindowHandle, index: WINDOW_LONG_PTR_INDEX) -> BackendResult<u32> {
    let hwnd = to_hwnd(handle);
    unsafe { SetLastError(ERROR_SUCCESS) };
    let value = unsafe { GetWindowLongPtrW(hwnd, index) };
    if value == 0 {
        check_last_error(handle, "GetWindowLongPtrW")?;
    }
    Ok(value as u32)
}

fn write_ex_style(handle: WindowHandle, style: u32) -> BackendResult<()> {
    let hwnd = to_hwnd(handle);
    unsafe { SetLastError(ERROR_SUCCESS) };
    let previous = unsafe { SetWindowLongPtrW(hwnd, GWL_EXSTYLE, style as _) };
    if previous == 0 {
        check_last_error(handle, "SetWindowLongPtrW")?;
    }
    // Cached frame data must be refreshed for style changes to apply.
    unsafe {
        SetWindowPos(
            hwnd,
            HWND::default(),
            0,
            0,
            0,
            0,
            SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_FRAMECHANGED | SWP_NOACTIVATE,
        )
    }
    .map_err(|e| os_error(handle, e))
}

/// Whether the window currently relies on `WS_EX_LAYERED` for an alpha or
/// colour-key effect, in which case the bit must stay.
fn layered_attributes_in_use(hwnd: HWND) -> bool {
    let mut alpha: u8 = 255;
    let mut flags = LAYERED_WINDOW_ATTRIBUTES_FLAGS(0);
    let ok = unsafe { GetLayeredWindowAttributes(hwnd, None, Some(&mut alpha), Some(&mut flags)) };
    if ok.is_err() {
        // Layered through UpdateLayeredWindow: the owner manages it.
        return true;
    }
    (flags.0 & LWA_ALPHA.0 != 0 && alpha < 255) || flags.0 & LWA_COLORKEY.0 != 0
}

/// Read the window title.
fn read_window_title(hwnd: HWND) -> String {
    let len = unsafe { GetWindowTextLengthW(hwnd) };
    if len <= 0 {
        return String::new();
    }
    let mut buf = vec![0u16; (len + 1) as usize];
    let copied = unsafe { GetWindowTextW(hwnd, &mut buf) };
    if copied <= 0 {
        return String::new();
    }
    OsString::from_wide(&buf[..copied as usize])
        .to_string_lossy()
        .into_owned()
}

/// Read the window class name (up to 256 chars).
fn read_class_name(hwnd: HWND) -> String {
    let mut buf = [0u16; 256];
    let len = unsafe { GetClassNameW(hwnd, &mut buf) };
    if len <= 0 {
        return String::new();
    }
    OsString::from_wide(&buf[..len as usize])
        .to_string_lossy()
        .into_owned()
}

/// DWM-cloaked windows (suspended UWP apps, other virtual desktops) report
/// as visible but are not on screen.
fn is_cloaked(hwnd: HWND) -> bool {
    let mut cloaked: u32 = 0;
    let res = unsafe {
        DwmGetWindowAttribute(
            hwnd,
            DWMWA_CLOAKED,
            &mut cloaked as *mut u32 as *mut core::ffi::c_void,
            std::mem::size_of::<u32>() as u32,
        )
    };
    res.is_ok() && cloaked != 0
}

/// Top-level, visible, not cloaked and (unless requested) not a tool window.
///
/// Tool windows that are also `WS_EX_NOACTIVATE` are kept: that combination
/// is what floating overlays use, and overlays are prime click-through
/// targets.
fn is_candidate(hwnd: HWND, include_tool_windows: bool) -> bool {
    if !unsafe { IsWindowVisible(hwnd) }.as_bool() {
        return false;
    }
    let style = unsafe { GetWindowLongPtrW(hwnd, GWL_STYLE) } as u32;
    if style & WS_CHILD.0 != 0 {
        return false;
    }
    if !include_tool_windows {
        let ex_style = unsafe { GetWindowLongPtrW(hwnd, GWL_EXSTYLE) } as u32;
        if ex_style & WS_EX_TOOLWINDOW.0 != 0 && ex_style & WS_EX_NOACTIVATE.0 == 0 {
            return false;
        }
    }
    !is_cloaked(hwnd)
}

fn snapshot(handle: WindowHandle) -> BackendResult<WindowInfo> {
    let hwnd = to_hwnd(handle);

    let mut pid: u32 = 0;
    if unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) } == 0 {
        return Err(WindowControlError::InvalidHandle { handle });
    }

    let mut rect = RECT::default();
    unsafe { GetWindowRect(hwnd, &mut rect) }.map_err(|e| os_error(handle, e))?;

    Ok(WindowInfo {
        handle,
        title: read_window_title(hwnd),
        process_id: pid,
        class_name: read_class_name(hwnd),
        visible: unsafe { IsWindowVisible(hwnd) }.as_bool(),
        x: rect.left,
        y: rect.top,
        width: rect.right - rect.left,
        height: rect.bottom - rect.top,
    })
}

struct EnumState {
    handles: Vec<isize>,
    include_tool_windows: bool,
}

/// Callback for EnumWindows that collects candidate window handles.
unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let state = unsafe { &mut *(lparam.0 as *mut EnumState) };
    if is_candidate(hwnd, state.include_tool_windows) {
        state.handles.push(hwnd.0 as isize);
    }
    TRUE // continue enumeration
}

/// RAII wrapper closing a process `HANDLE`.
struct ProcessHandle(HANDLE);

impl ProcessHandle {
    fn open(
        pid: u32,
        access: windows::Win32::System::Threading::PROCESS_ACCESS_RIGHTS,
    ) -> BackendResult<Self> {
        unsafe { OpenProcess(access, false, pid) }
            .map(ProcessHandle)
            .map_err(WindowControlError::from)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        let _ = unsafe { CloseHandle(self.0) };
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

impl Backend for Win32Backend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn click_through_authority(&self) -> ClickThroughAuthority {
        ClickThroughAuthority::Os
    }

    fn is_window(&self, handle: WindowHandle) -> BackendResult<bool> {
        Ok(unsafe { IsWindow(to_hwnd(handle)) }.as_bool())
    }

    fn list_windows(&self, filter: &EnumerationFilter) -> BackendResult<Vec<WindowInfo>> {
        let mut state = EnumState {
            handles: Vec::with_capacity(64),
            include_tool_windows: filter.include_tool_windows,
        };
        unsafe {
            EnumWindows(
                Some(enum_callback),
                LPARAM(&mut state as *mut EnumState as isize),
            )
        }?;

        // A window closing mid-pass is benign staleness, not an error.
        let windows: Vec<WindowInfo> = state
            .handles
            .par_iter()
            .filter_map(|&raw| snapshot(WindowHandle::from_raw(raw as i64)).ok())
            .collect();
        Ok(windows)
    }

    fn window_info(&self, handle: WindowHandle) -> BackendResult<WindowInfo> {
        snapshot(handle)
    }

    fn foreground_window(&self) -> BackendResult<Option<WindowHandle>> {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd.0.is_null() {
            Ok(None)
        } else {
            Ok(Some(from_hwnd(hwnd)))
        }
    }

    fn owning_pid(&self, handle: WindowHandle) -> BackendResult<u32> {
        let mut pid: u32 = 0;
        if unsafe { GetWindowThreadProcessId(to_hwnd(handle), Some(&mut pid)) } == 0 {
            return Err(WindowControlError::InvalidHandle { handle });
        }
        Ok(pid)
    }

    fn process_path(&self, pid: u32) -> BackendResult<String> {
        let process = ProcessHandle::open(pid, PROCESS_QUERY_LIMITED_INFORMATION)?;
        let mut buf = vec![0u16; 1024];
        let mut len = buf.len() as u32;
        unsafe {
            QueryFullProcessImageNameW(
                process.0,
                PROCESS_NAME_WIN32,
                PWSTR(buf.as_mut_ptr()),
                &mut len,
            )
        }?;
        Ok(OsString::from_wide(&buf[..len as usize])
            .to_string_lossy()
            .into_owned())
    }

    fn terminate_process(&self, pid: u32) -> BackendResult<()> {
        let process = ProcessHandle::open(pid, PROCESS_TERMINATE)?;
        unsafe { TerminateProcess(process.0, 1) }?;
        log::debug!("terminated process {pid}");
        Ok(())
    }

    fn read_click_through(&self, handle: WindowHandle) -> BackendResult<Option<bool>> {
        let style = read_long(handle, GWL_EXSTYLE)?;
        Ok(Some(style & CLICK_THROUGH_BITS == CLICK_THROUGH_BITS))
    }

    fn write_click_through(
        &self,
        handle: WindowHandle,
        enable: bool,
        owned_bits: u64,
    ) -> BackendResult<u64> {
        let current = read_long(handle, GWL_EXSTYLE)?;
        let owned = owned_bits as u32;
        let layered_in_use = !enable
            && owned & ex_style::LAYERED != 0
            && layered_attributes_in_use(to_hwnd(handle));
        let (next, owned) = ex_style::next_ex_style(current, owned, enable, layered_in_use);

        if next != current {
            write_ex_style(handle, next)?;
        }
        log::debug!("ex-style {handle:x}: {current:#010x} -> {next:#010x}");
        Ok(u64::from(owned))
    }

    fn set_topmost(&self, handle: WindowHandle, enabled: bool) -> BackendResult<()> {
        let insert_after = if enabled { HWND_TOPMOST } else { HWND_NOTOPMOST };
        unsafe {
            SetWindowPos(
                to_hwnd(handle),
                insert_after,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            )
        }
        .map_err(|e| os_error(handle, e))
    }

    fn set_opacity(&self, handle: WindowHandle, opacity: Opacity) -> BackendResult<()> {
        let current = read_long(handle, GWL_EXSTYLE)?;
        if current & WS_EX_LAYERED.0 == 0 {
            write_ex_style(handle, current | WS_EX_LAYERED.0)?;
        }
        unsafe {
            SetLayeredWindowAttributes(
                to_hwnd(handle),
                COLORREF(0),
                opacity.to_alpha_u8(),
                LWA_ALPHA,
            )
        }
        .map_err(|e| os_error(handle, e))
    }

    fn apply_state(&self, handle: WindowHandle, kind: WindowStateKind) -> BackendResult<()> {
        let cmd: SHOW_WINDOW_CMD = match kind {
            WindowStateKind::Minimize => SW_MINIMIZE,
            WindowStateKind::Maximize => SW_MAXIMIZE,
            WindowStateKind::Restore => SW_RESTORE,
        };
        // The return value is the previous visibility, not success.
        let _ = unsafe { ShowWindow(to_hwnd(handle), cmd) };
        Ok(())
    }

    fn focus(&self, handle: WindowHandle) -> BackendResult<()> {
        if unsafe { SetForegroundWindow(to_hwnd(handle)) }.as_bool() {
            Ok(())
        } else {
            // Foreground lock: Windows only grants focus to the input owner.
            Err(WindowControlError::AccessDenied(format!(
                "SetForegroundWindow({handle}) refused by the foreground lock"
            )))
        }
    }

    fn request_close(&self, handle: WindowHandle) -> BackendResult<()> {
        unsafe { PostMessageW(to_hwnd(handle), WM_CLOSE, WPARAM(0), LPARAM(0)) }
            .map_err(|e| os_error(handle, e))
    }
}
