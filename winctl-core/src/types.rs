//! Plain data types shared by every backend.
//!
//! Everything here is an owned snapshot or a validated value: fully `Send`,
//! `Serialize`, and free of OS references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::WindowControlError;
use crate::handle::WindowHandle;

// ---------------------------------------------------------------------------
// Window snapshot
// ---------------------------------------------------------------------------

/// Owned snapshot of a top-level window.
///
/// Immutable once produced.  The window may have moved, been retitled or
/// destroyed by the time the caller looks at it; re-query when freshness
/// matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub handle: WindowHandle,
    pub title: String,
    pub process_id: u32,
    /// Win32 window class or the `WM_CLASS` class part on X11.  Empty on
    /// macOS, which has no window classes.
    pub class_name: String,
    pub visible: bool,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

// ---------------------------------------------------------------------------
// Commands and validated values
// ---------------------------------------------------------------------------

/// One-shot show-state command.  Not tracked after it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowStateKind {
    Minimize,
    Maximize,
    Restore,
}

impl WindowStateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WindowStateKind::Minimize => "minimize",
            WindowStateKind::Maximize => "maximize",
            WindowStateKind::Restore => "restore",
        }
    }
}

impl fmt::Display for WindowStateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowStateKind {
    type Err = WindowControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimize" | "min" => Ok(WindowStateKind::Minimize),
            "maximize" | "max" => Ok(WindowStateKind::Maximize),
            "restore" => Ok(WindowStateKind::Restore),
            other => Err(WindowControlError::InvalidArgument(format!(
                "unknown window state {other:?} (expected minimize, maximize or restore)"
            ))),
        }
    }
}

/// Window opacity in `[0.0, 1.0]`; `1.0` is fully opaque.
///
/// Construct with [`Opacity::new`], which rejects out-of-range and NaN
/// values, so backends only ever see valid levels.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Opacity(f64);

impl Opacity {
    pub const OPAQUE: Opacity = Opacity(1.0);

    pub fn new(level: f64) -> Result<Self, WindowControlError> {
        if (0.0..=1.0).contains(&level) {
            Ok(Opacity(level))
        } else {
            Err(WindowControlError::InvalidArgument(format!(
                "opacity must be within [0.0, 1.0], got {level}"
            )))
        }
    }

    pub fn level(self) -> f64 {
        self.0
    }

    pub fn is_opaque(self) -> bool {
        self.0 >= 1.0
    }

    /// Scale to an 8-bit alpha (Win32 layered windows).
    pub fn to_alpha_u8(self) -> u8 {
        (self.0 * 255.0).round() as u8
    }

    /// Scale to a 32-bit cardinal (`_NET_WM_WINDOW_OPACITY`).
    pub fn to_cardinal(self) -> u32 {
        (self.0 * f64::from(u32::MAX)).round() as u32
    }
}

/// How [`find_matching`](crate::control::WindowController::find_matching)
/// compares a window title against the search text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TitleMatch {
    /// Title equals the search text.
    Exact,
    /// Title contains the search text, case-sensitive.
    #[default]
    Contains,
    /// Title contains the search text, ignoring case.
    ContainsIgnoreCase,
}

impl TitleMatch {
    pub fn from_exact(exact: bool) -> Self {
        if exact {
            TitleMatch::Exact
        } else {
            TitleMatch::Contains
        }
    }

    pub fn matches(self, title: &str, needle: &str) -> bool {
        match self {
            TitleMatch::Exact => title == needle,
            TitleMatch::Contains => title.contains(needle),
            TitleMatch::ContainsIgnoreCase => title.to_lowercase().contains(&needle.to_lowercase()),
        }
    }
}

/// Where the effective click-through state of a window comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClickThroughAuthority {
    /// The OS reports the state; the registry is advisory.
    Os,
    /// The OS cannot report it; the registry is authoritative.
    Registry,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opacity_bounds() {
        assert!(Opacity::new(0.0).is_ok());
        assert!(Opacity::new(1.0).is_ok());
        assert!(Opacity::new(0.5).is_ok());
        assert!(Opacity::new(1.5).is_err());
        assert!(Opacity::new(-0.1).is_err());
        assert!(Opacity::new(f64::NAN).is_err());
    }

    #[test]
    fn test_opacity_scaling() {
        assert_eq!(Opacity::OPAQUE.to_alpha_u8(), 255);
        assert_eq!(Opacity::new(0.0).unwrap().to_alpha_u8(), 0);
        assert_eq!(Opacity::new(0.5).unwrap().to_alpha_u8(), 128);
        assert_eq!(Opacity::OPAQUE.to_cardinal(), u32::MAX);
        assert!(Opacity::OPAQUE.is_opaque());
    }

    #[test]
    fn test_title_match_modes() {
        assert!(TitleMatch::Exact.matches("Notepad", "Notepad"));
        assert!(!TitleMatch::Exact.matches("Untitled - Notepad", "Notepad"));
        assert!(TitleMatch::Contains.matches("Untitled - Notepad", "Notepad"));
        assert!(!TitleMatch::Contains.matches("Untitled - Notepad", "notepad"));
        assert!(TitleMatch::ContainsIgnoreCase.matches("Untitled - Notepad", "notepad"));
        assert_eq!(TitleMatch::from_exact(true), TitleMatch::Exact);
    }

    #[test]
    fn test_window_state_parse() {
        assert_eq!("Max".parse::<WindowStateKind>().unwrap(), WindowStateKind::Maximize);
        assert_eq!("restore".parse::<WindowStateKind>().unwrap(), WindowStateKind::Restore);
        assert!("hide".parse::<WindowStateKind>().is_err());
    }

    #[test]
    fn test_window_info_serialization() {
        let info = WindowInfo {
            handle: WindowHandle::from_raw(0x1_0040),
            title: "Overlay".into(),
            process_id: 4242,
            class_name: "OverlayWnd".into(),
            visible: true,
            x: 10,
            y: 20,
            width: 640,
            height: 480,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"handle\":65600"));
        assert!(json.contains("\"process_id\":4242"));
        let back: WindowInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
