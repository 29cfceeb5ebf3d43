//! `winctl` -- Thin PyO3 wrappers around `winctl_core`.
//!
//! Each function releases the GIL via `py.allow_threads()` and converts
//! the Rust result to Python objects.  All logic lives in `winctl_core`.
//!
//! Window handles are plain Python `int`s.  Failures raise a subclass of
//! `winctl.WinctlError`, one per error kind.

use pyo3::create_exception;
use pyo3::exceptions::PyException;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use winctl_core::{
    ErrorKind, TitleMatch, WindowControlError, WindowHandle, WindowInfo, WindowStateKind,
};

// ---------------------------------------------------------------------------
// Exceptions
// ---------------------------------------------------------------------------

create_exception!(winctl, WinctlError, PyException, "Base class for winctl failures.");
create_exception!(winctl, InvalidHandleError, WinctlError, "The handle no longer names a live window.");
create_exception!(winctl, AccessDeniedError, WinctlError, "The OS refused the operation.");
create_exception!(winctl, InvalidArgumentError, WinctlError, "An argument was out of range.");
create_exception!(winctl, UnsupportedOperationError, WinctlError, "Not available on this platform.");
create_exception!(winctl, PlatformError, WinctlError, "Opaque OS-level failure.");

fn to_py_err(e: WindowControlError) -> PyErr {
    let msg = e.to_string();
    match e.kind() {
        ErrorKind::InvalidHandle => InvalidHandleError::new_err(msg),
        ErrorKind::AccessDenied => AccessDeniedError::new_err(msg),
        ErrorKind::InvalidArgument => InvalidArgumentError::new_err(msg),
        ErrorKind::UnsupportedOperation => UnsupportedOperationError::new_err(msg),
        ErrorKind::PlatformError => PlatformError::new_err(msg),
    }
}

// ---------------------------------------------------------------------------
// WindowInfo -> Python dict conversion
// ---------------------------------------------------------------------------

fn window_to_py_dict(py: Python<'_>, w: &WindowInfo) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    dict.set_item("handle", w.handle.raw())?;
    dict.set_item("title", &w.title)?;
    dict.set_item("process_id", w.process_id)?;
    dict.set_item("class_name", &w.class_name)?;
    dict.set_item("visible", w.visible)?;
    dict.set_item("x", w.x)?;
    dict.set_item("y", w.y)?;
    dict.set_item("width", w.width)?;
    dict.set_item("height", w.height)?;
    Ok(dict.into())
}

fn windows_to_py_list(py: Python<'_>, windows: &[WindowInfo]) -> PyResult<PyObject> {
    let result = PyList::empty(py);
    for w in windows {
        result.append(window_to_py_dict(py, w)?)?;
    }
    Ok(result.into())
}

fn title_match(mode: &str) -> PyResult<TitleMatch> {
    match mode {
        "exact" => Ok(TitleMatch::Exact),
        "contains" => Ok(TitleMatch::Contains),
        "contains_ignore_case" => Ok(TitleMatch::ContainsIgnoreCase),
        other => Err(InvalidArgumentError::new_err(format!(
            "unknown match mode {other:?} (expected exact, contains or contains_ignore_case)"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Enumeration / queries
// ---------------------------------------------------------------------------

/// Compiled backend name and click-through authority.
#[pyfunction]
fn platform(py: Python<'_>) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    dict.set_item("backend", winctl_core::backend_name())?;
    let authority = match winctl_core::click_through_authority() {
        winctl_core::ClickThroughAuthority::Os => "os",
        winctl_core::ClickThroughAuthority::Registry => "registry",
    };
    dict.set_item("click_through_authority", authority)?;
    Ok(dict.into())
}

/// Visible top-level windows as a list of dicts.
#[pyfunction]
fn enumerate(py: Python<'_>) -> PyResult<PyObject> {
    let windows = py.allow_threads(winctl_core::enumerate).map_err(to_py_err)?;
    windows_to_py_list(py, &windows)
}

/// First window whose title equals (`exact`) or contains `title`.
#[pyfunction]
#[pyo3(signature = (title, exact=false))]
fn find_by_title(py: Python<'_>, title: &str, exact: bool) -> PyResult<Option<PyObject>> {
    let title = title.to_owned();
    let found = py
        .allow_threads(move || winctl_core::find_by_title(&title, exact))
        .map_err(to_py_err)?;
    found.map(|w| window_to_py_dict(py, &w)).transpose()
}

#[pyfunction]
#[pyo3(signature = (title, exact=false))]
fn find_all_by_title(py: Python<'_>, title: &str, exact: bool) -> PyResult<PyObject> {
    let title = title.to_owned();
    let found = py
        .allow_threads(move || winctl_core::find_all_by_title(&title, exact))
        .map_err(to_py_err)?;
    windows_to_py_list(py, &found)
}

/// Title search with an explicit mode: `exact`, `contains` or
/// `contains_ignore_case`.
#[pyfunction]
#[pyo3(signature = (title, mode="contains"))]
fn find_matching(py: Python<'_>, title: &str, mode: &str) -> PyResult<Option<PyObject>> {
    let mode = title_match(mode)?;
    let title = title.to_owned();
    let found = py
        .allow_threads(move || winctl_core::find_matching(&title, mode))
        .map_err(to_py_err)?;
    found.map(|w| window_to_py_dict(py, &w)).transpose()
}

/// Foreground window handle, or `None`.
#[pyfunction]
fn active_window(py: Python<'_>) -> PyResult<Option<i64>> {
    let handle = py
        .allow_threads(winctl_core::active_window)
        .map_err(to_py_err)?;
    Ok(handle.map(WindowHandle::raw))
}

#[pyfunction]
fn is_alive(py: Python<'_>, handle: i64) -> PyResult<bool> {
    py.allow_threads(move || winctl_core::is_alive(WindowHandle::from_raw(handle)))
        .map_err(to_py_err)
}

#[pyfunction]
fn info(py: Python<'_>, handle: i64) -> PyResult<PyObject> {
    let w = py
        .allow_threads(move || winctl_core::info(WindowHandle::from_raw(handle)))
        .map_err(to_py_err)?;
    window_to_py_dict(py, &w)
}

/// Executable path of the process owning the window.
#[pyfunction]
fn process_path(py: Python<'_>, handle: i64) -> PyResult<String> {
    py.allow_threads(move || winctl_core::process_path(WindowHandle::from_raw(handle)))
        .map_err(to_py_err)
}

// ---------------------------------------------------------------------------
// Click-through
// ---------------------------------------------------------------------------

#[pyfunction]
fn set_click_through(py: Python<'_>, handle: i64) -> PyResult<()> {
    py.allow_threads(move || winctl_core::set_click_through(WindowHandle::from_raw(handle)))
        .map_err(to_py_err)
}

#[pyfunction]
fn remove_click_through(py: Python<'_>, handle: i64) -> PyResult<()> {
    py.allow_threads(move || winctl_core::remove_click_through(WindowHandle::from_raw(handle)))
        .map_err(to_py_err)
}

/// Flip click-through; returns the new state.
#[pyfunction]
fn toggle_click_through(py: Python<'_>, handle: i64) -> PyResult<bool> {
    py.allow_threads(move || winctl_core::toggle_click_through(WindowHandle::from_raw(handle)))
        .map_err(to_py_err)
}

#[pyfunction]
fn is_click_through(py: Python<'_>, handle: i64) -> PyResult<bool> {
    py.allow_threads(move || winctl_core::is_click_through(WindowHandle::from_raw(handle)))
        .map_err(to_py_err)
}

// ---------------------------------------------------------------------------
// Other mutations
// ---------------------------------------------------------------------------

#[pyfunction]
#[pyo3(signature = (handle, enabled=true))]
fn set_always_on_top(py: Python<'_>, handle: i64, enabled: bool) -> PyResult<()> {
    py.allow_threads(move || {
        winctl_core::set_always_on_top(WindowHandle::from_raw(handle), enabled)
    })
    .map_err(to_py_err)
}

/// `opacity` in `[0.0, 1.0]`.
#[pyfunction]
fn set_opacity(py: Python<'_>, handle: i64, opacity: f64) -> PyResult<()> {
    py.allow_threads(move || winctl_core::set_opacity(WindowHandle::from_raw(handle), opacity))
        .map_err(to_py_err)
}

/// `state` is `"minimize"`, `"maximize"` or `"restore"`.
#[pyfunction]
fn set_window_state(py: Python<'_>, handle: i64, state: &str) -> PyResult<()> {
    let kind: WindowStateKind = state.parse().map_err(to_py_err)?;
    py.allow_threads(move || winctl_core::set_window_state(WindowHandle::from_raw(handle), kind))
        .map_err(to_py_err)
}

#[pyfunction]
fn focus(py: Python<'_>, handle: i64) -> PyResult<()> {
    py.allow_threads(move || winctl_core::focus(WindowHandle::from_raw(handle)))
        .map_err(to_py_err)
}

/// Ask the window to close.  Does not wait for it to disappear.
#[pyfunction]
fn close(py: Python<'_>, handle: i64) -> PyResult<()> {
    py.allow_threads(move || winctl_core::close(WindowHandle::from_raw(handle)))
        .map_err(to_py_err)
}

#[pyfunction]
fn kill_owning_process(py: Python<'_>, handle: i64) -> PyResult<()> {
    py.allow_threads(move || winctl_core::kill_owning_process(WindowHandle::from_raw(handle)))
        .map_err(to_py_err)
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[pyfunction]
fn tracked_handles() -> Vec<i64> {
    winctl_core::tracked_handles()
        .into_iter()
        .map(WindowHandle::raw)
        .collect()
}

#[pyfunction]
fn forget(handle: i64) -> bool {
    winctl_core::forget(WindowHandle::from_raw(handle))
}

// ---------------------------------------------------------------------------
// Module registration
// ---------------------------------------------------------------------------

/// Register the `winctl` Python module.
#[pymodule]
fn winctl(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    m.add("WinctlError", py.get_type::<WinctlError>())?;
    m.add("InvalidHandleError", py.get_type::<InvalidHandleError>())?;
    m.add("AccessDeniedError", py.get_type::<AccessDeniedError>())?;
    m.add("InvalidArgumentError", py.get_type::<InvalidArgumentError>())?;
    m.add("UnsupportedOperationError", py.get_type::<UnsupportedOperationError>())?;
    m.add("PlatformError", py.get_type::<PlatformError>())?;

    m.add_function(wrap_pyfunction!(platform, m)?)?;
    m.add_function(wrap_pyfunction!(enumerate, m)?)?;
    m.add_function(wrap_pyfunction!(find_by_title, m)?)?;
    m.add_function(wrap_pyfunction!(find_all_by_title, m)?)?;
    m.add_function(wrap_pyfunction!(find_matching, m)?)?;
    m.add_function(wrap_pyfunction!(active_window, m)?)?;
    m.add_function(wrap_pyfunction!(is_alive, m)?)?;
    m.add_function(wrap_pyfunction!(info, m)?)?;
    m.add_function(wrap_pyfunction!(process_path, m)?)?;
    m.add_function(wrap_pyfunction!(set_click_through, m)?)?;
    m.add_function(wrap_pyfunction!(remove_click_through, m)?)?;
    m.add_function(wrap_pyfunction!(toggle_click_through, m)?)?;
    m.add_function(wrap_pyfunction!(is_click_through, m)?)?;
    m.add_function(wrap_pyfunction!(set_always_on_top, m)?)?;
    m.add_function(wrap_pyfunction!(set_opacity, m)?)?;
    m.add_function(wrap_pyfunction!(set_window_state, m)?)?;
    m.add_function(wrap_pyfunction!(focus, m)?)?;
    m.add_function(wrap_pyfunction!(close, m)?)?;
    m.add_function(wrap_pyfunction!(kill_owning_process, m)?)?;
    m.add_function(wrap_pyfunction!(tracked_handles, m)?)?;
    m.add_function(wrap_pyfunction!(forget, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("__doc__", "Cross-platform native window control.")?;

    Ok(())
}
