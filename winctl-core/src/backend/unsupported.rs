//! Backend for targets with no window-manager integration.
//!
//! Every operation reports `UnsupportedOperation` so callers can tell
//! "nothing to do here" apart from "nothing happened".

use super::{Backend, BackendResult};
use crate::config::EnumerationFilter;
use crate::errors::WindowControlError;
use crate::handle::WindowHandle;
use crate::types::{ClickThroughAuthority, Opacity, WindowInfo, WindowStateKind};

const NAME: &str = "unsupported";

#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedBackend;

fn unsupported<T>(operation: &'static str) -> BackendResult<T> {
    Err(WindowControlError::unsupported(operation, NAME))
}

impl Backend for UnsupportedBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn click_through_authority(&self) -> ClickThroughAuthority {
        ClickThroughAuthority::Registry
    }

    fn is_window(&self, _handle: WindowHandle) -> BackendResult<bool> {
        unsupported("is_window")
    }

    fn list_windows(&self, _filter: &EnumerationFilter) -> BackendResult<Vec<WindowInfo>> {
        unsupported("enumerate")
    }

    fn window_info(&self, _handle: WindowHandle) -> BackendResult<WindowInfo> {
        unsupported("info")
    }

    fn foreground_window(&self) -> BackendResult<Option<WindowHandle>> {
        unsupported("active_window")
    }

    fn owning_pid(&self, _handle: WindowHandle) -> BackendResult<u32> {
        unsupported("owning_pid")
    }

    fn read_click_through(&self, _handle: WindowHandle) -> BackendResult<Option<bool>> {
        Ok(None)
    }

    fn write_click_through(&self, _h: WindowHandle, _enable: bool, _owned: u64) -> BackendResult<u64> {
        unsupported("set_click_through")
    }

    fn set_topmost(&self, _handle: WindowHandle, _enabled: bool) -> BackendResult<()> {
        unsupported("set_always_on_top")
    }

    fn set_opacity(&self, _handle: WindowHandle, _opacity: Opacity) -> BackendResult<()> {
        unsupported("set_opacity")
    }

    fn apply_state(&self, _handle: WindowHandle, _kind: WindowStateKind) -> BackendResult<()> {
        unsupported("set_window_state")
    }

    fn focus(&self, _handle: WindowHandle) -> BackendResult<()> {
        unsupported("focus")
    }

    fn request_close(&self, _handle: WindowHandle) -> BackendResult<()> {
        unsupported("close")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_every_operation_reports_unsupported() {
        let b = UnsupportedBackend;
        let h = WindowHandle::from_raw(1);
        assert_eq!(b.is_window(h).unwrap_err().kind(), ErrorKind::UnsupportedOperation);
        assert_eq!(
            b.list_windows(&EnumerationFilter::default()).unwrap_err().kind(),
            ErrorKind::UnsupportedOperation
        );
        assert_eq!(b.set_topmost(h, true).unwrap_err().kind(), ErrorKind::UnsupportedOperation);
        assert_eq!(b.request_close(h).unwrap_err().kind(), ErrorKind::UnsupportedOperation);
        assert_eq!(b.read_click_through(h).unwrap(), None);
    }
}
