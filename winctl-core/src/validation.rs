//! Checks that run before any backend mutation.

use crate::backend::Backend;
use crate::errors::WindowControlError;
use crate::handle::WindowHandle;
use crate::types::Opacity;

/// Fail with `InvalidHandle` unless `handle` names a live window right now.
///
/// The window may still disappear between this probe and the OS call that
/// follows; backends report that case as `InvalidHandle` too.
pub fn ensure_live<B: Backend + ?Sized>(
    backend: &B,
    handle: WindowHandle,
) -> Result<(), WindowControlError> {
    if handle.is_null() || !backend.is_window(handle)? {
        return Err(WindowControlError::InvalidHandle { handle });
    }
    Ok(())
}

/// Range-check an opacity level before it reaches the OS.
pub fn validate_opacity(level: f64) -> Result<Opacity, WindowControlError> {
    Opacity::new(level)
}

/// Search text for title lookups.  Empty text would match every window.
pub fn validate_search_text(text: &str) -> Result<(), WindowControlError> {
    if text.is_empty() {
        return Err(WindowControlError::InvalidArgument(
            "title search text must not be empty".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::UnsupportedBackend;
    use crate::errors::ErrorKind;

    #[test]
    fn test_null_handle_is_invalid_without_probing() {
        // The unsupported backend would answer UnsupportedOperation if probed.
        let err = ensure_live(&UnsupportedBackend, WindowHandle::NULL).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHandle);
    }

    #[test]
    fn test_opacity_range() {
        assert!(validate_opacity(0.25).is_ok());
        assert_eq!(
            validate_opacity(1.5).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            validate_opacity(f64::NAN).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_empty_search_text() {
        assert!(validate_search_text("Notepad").is_ok());
        assert_eq!(
            validate_search_text("").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }
}
