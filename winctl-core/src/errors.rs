//! Error types for `winctl_core`.
//!
//! All failures are funnelled through [`WindowControlError`], which uses
//! `thiserror` for `Display` and `Error` derives.  Binding crates map
//! [`ErrorKind`] onto their own error surface (Python exception classes,
//! C status codes, CLI exit codes), keeping this crate binding-free.

use serde::Serialize;
use thiserror::Error;

use crate::handle::WindowHandle;

/// Top-level error type for the `winctl_core` library.
///
/// No operation retries on failure: every variant describes a structural
/// condition (dead handle, missing permission, unsupported platform) that
/// an immediate retry would not change.
#[derive(Debug, Error)]
pub enum WindowControlError {
    /// The handle does not (or no longer) refer to a live window, or the
    /// process that owned it has exited.
    #[error("InvalidHandle: {handle} does not refer to a live window")]
    InvalidHandle { handle: WindowHandle },

    /// Insufficient privilege, e.g. inspecting a higher-integrity process.
    #[error("AccessDenied: {0}")]
    AccessDenied(String),

    /// Caller-supplied value out of range.  Raised before any OS call.
    #[error("InvalidArgument: {0}")]
    InvalidArgument(String),

    /// The compiled backend cannot perform the requested operation.
    #[error("UnsupportedOperation: {operation} is not available on the {backend} backend")]
    UnsupportedOperation {
        operation: &'static str,
        backend: &'static str,
    },

    /// Opaque OS-level failure.  `code` is the native error code
    /// (HRESULT on Windows, X11 error code on X11, errno-like elsewhere).
    #[error("PlatformError: {message} (code {code:#x})")]
    PlatformError { code: i64, message: String },
}

/// Flat classification of [`WindowControlError`] for binding layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidHandle,
    AccessDenied,
    InvalidArgument,
    UnsupportedOperation,
    PlatformError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidHandle => "InvalidHandle",
            ErrorKind::AccessDenied => "AccessDenied",
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::UnsupportedOperation => "UnsupportedOperation",
            ErrorKind::PlatformError => "PlatformError",
        }
    }
}

impl WindowControlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidHandle { .. } => ErrorKind::InvalidHandle,
            Self::AccessDenied(_) => ErrorKind::AccessDenied,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::UnsupportedOperation { .. } => ErrorKind::UnsupportedOperation,
            Self::PlatformError { .. } => ErrorKind::PlatformError,
        }
    }

    pub fn platform(code: i64, message: impl Into<String>) -> Self {
        Self::PlatformError {
            code,
            message: message.into(),
        }
    }

    pub fn unsupported(operation: &'static str, backend: &'static str) -> Self {
        Self::UnsupportedOperation { operation, backend }
    }
}

/// Convert a `windows::core::Error` (Win32 / HRESULT failure).
///
/// `E_ACCESSDENIED` becomes [`WindowControlError::AccessDenied`]; everything
/// else is an opaque [`WindowControlError::PlatformError`].  Call sites that
/// know the target handle classify `ERROR_INVALID_WINDOW_HANDLE` themselves.
#[cfg(target_os = "windows")]
impl From<windows::core::Error> for WindowControlError {
    fn from(err: windows::core::Error) -> Self {
        use windows::Win32::Foundation::E_ACCESSDENIED;

        if err.code() == E_ACCESSDENIED {
            WindowControlError::AccessDenied(err.message())
        } else {
            WindowControlError::platform(i64::from(err.code().0), err.message())
        }
    }
}

#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
impl From<x11rb::errors::ConnectionError> for WindowControlError {
    fn from(err: x11rb::errors::ConnectionError) -> Self {
        WindowControlError::platform(-1, format!("X11 connection error: {err}"))
    }
}

#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
impl From<x11rb::errors::ConnectError> for WindowControlError {
    fn from(err: x11rb::errors::ConnectError) -> Self {
        WindowControlError::platform(-1, format!("cannot open X11 display: {err}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = WindowControlError::InvalidHandle {
            handle: WindowHandle::from_raw(7),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidHandle);
        assert_eq!(
            WindowControlError::unsupported("set_opacity", "unsupported").kind(),
            ErrorKind::UnsupportedOperation
        );
    }

    #[test]
    fn test_platform_error_display_carries_code() {
        let err = WindowControlError::platform(0x8007_0578, "SetWindowPos failed");
        let text = err.to_string();
        assert!(text.starts_with("PlatformError"));
        assert!(text.contains("0x80070578"));
    }

    #[test]
    fn test_kind_serializes_as_name() {
        let json = serde_json::to_string(&ErrorKind::AccessDenied).unwrap();
        assert_eq!(json, "\"AccessDenied\"");
        assert_eq!(ErrorKind::AccessDenied.as_str(), "AccessDenied");
    }
}
