//! Enumeration filter configuration.
//!
//! [`EnumerationFilter`] decides which top-level windows count as
//! "user-visible" for [`enumerate`](crate::control::WindowController::enumerate).
//! It deserializes from JSON with every field optional, so a config file
//! only needs to name what it changes:
//!
//! ```json
//! { "require_title": false, "skip_classes": ["Progman"] }
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::WindowControlError;
use crate::types::WindowInfo;

/// Shell and system surfaces that cannot be meaningfully manipulated.
pub const DEFAULT_SKIP_CLASSES: &[&str] = &[
    "Windows.UI.Core.CoreWindow",
    "Shell_TrayWnd",
    "Shell_SecondaryTrayWnd",
    "Progman",
    "WorkerW",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumerationFilter {
    /// Drop windows whose title is empty.
    pub require_title: bool,
    /// Keep tool / utility / dock windows that backends drop by default.
    pub include_tool_windows: bool,
    /// Exact class names to drop.
    pub skip_classes: Vec<String>,
}

impl Default for EnumerationFilter {
    fn default() -> Self {
        Self {
            require_title: true,
            include_tool_windows: false,
            skip_classes: DEFAULT_SKIP_CLASSES.iter().map(|c| (*c).to_owned()).collect(),
        }
    }
}

impl EnumerationFilter {
    /// A filter that only drops invisible windows.
    pub fn permissive() -> Self {
        Self {
            require_title: false,
            include_tool_windows: true,
            skip_classes: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, WindowControlError> {
        serde_json::from_str(json)
            .map_err(|e| WindowControlError::InvalidArgument(format!("invalid filter config: {e}")))
    }

    /// Platform-independent admission check, applied after the backend's
    /// own top-level / tool-window filtering.
    pub fn admits(&self, window: &WindowInfo) -> bool {
        if !window.visible {
            return false;
        }
        if self.require_title && window.title.is_empty() {
            return false;
        }
        !self.skip_classes.iter().any(|c| *c == window.class_name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::WindowHandle;

    fn window(title: &str, class_name: &str, visible: bool) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle::from_raw(1),
            title: title.into(),
            process_id: 1,
            class_name: class_name.into(),
            visible,
            x: 0,
            y: 0,
            width: 100,
            height: 100,
        }
    }

    #[test]
    fn test_default_filter() {
        let f = EnumerationFilter::default();
        assert!(f.admits(&window("Editor", "Notepad", true)));
        assert!(!f.admits(&window("", "Notepad", true)));
        assert!(!f.admits(&window("Taskbar", "Shell_TrayWnd", true)));
        assert!(!f.admits(&window("Editor", "Notepad", false)));
    }

    #[test]
    fn test_permissive_filter_keeps_untitled() {
        let f = EnumerationFilter::permissive();
        assert!(f.admits(&window("", "Shell_TrayWnd", true)));
        assert!(!f.admits(&window("", "", false)));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let f = EnumerationFilter::from_json(r#"{ "require_title": false }"#).unwrap();
        assert!(!f.require_title);
        assert!(!f.include_tool_windows);
        assert_eq!(f.skip_classes.len(), DEFAULT_SKIP_CLASSES.len());
    }

    #[test]
    fn test_bad_json_is_invalid_argument() {
        let err = EnumerationFilter::from_json("{ require_title: ").unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::InvalidArgument);
    }
}
