//! Opaque window handle and its boundary encodings.
//!
//! A [`WindowHandle`] is a weak reference to an OS window that this crate
//! neither owns nor controls the lifetime of.  The wrapped integer is the
//! platform's native identifier:
//!
//! | Platform | Native identifier |
//! |----------|-------------------|
//! | Windows  | `HWND` (pointer-sized) |
//! | X11      | X11 `Window` id (32-bit) |
//! | macOS    | `CGWindowID` / `kCGWindowNumber` (32-bit) |
//!
//! No arithmetic is ever performed on a handle.  Zero is never valid.
//!
//! # Serialization
//!
//! JSON consumers frequently decode numbers as IEEE-754 doubles, which only
//! represent integers up to 2^53 - 1 exactly.  Handles inside that range are
//! serialized as JSON numbers; anything larger is serialized as a decimal
//! string so it survives the trip without truncation.  Deserialization
//! accepts numbers, decimal strings and `0x`-prefixed hex strings.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::WindowControlError;

/// Largest integer magnitude a double-precision float represents exactly.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Opaque, platform-native window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(i64);

impl WindowHandle {
    /// The null handle.  Never refers to a window.
    pub const NULL: WindowHandle = WindowHandle(0);

    pub const fn from_raw(raw: i64) -> Self {
        WindowHandle(raw)
    }

    pub const fn raw(self) -> i64 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Whether the handle fits a 53-bit-safe integer encoding.
    pub const fn is_js_safe(self) -> bool {
        self.0 >= -MAX_SAFE_INTEGER && self.0 <= MAX_SAFE_INTEGER
    }

    /// Narrow to a 32-bit window id (X11 / macOS).
    ///
    /// Values that cannot name a 32-bit window are reported as
    /// `InvalidHandle`: no such window can exist.
    pub fn to_u32(self) -> Result<u32, WindowControlError> {
        u32::try_from(self.0)
            .ok()
            .filter(|id| *id != 0)
            .ok_or(WindowControlError::InvalidHandle { handle: self })
    }
}

impl From<i64> for WindowHandle {
    fn from(raw: i64) -> Self {
        WindowHandle(raw)
    }
}

impl From<u32> for WindowHandle {
    fn from(raw: u32) -> Self {
        WindowHandle(i64::from(raw))
    }
}

impl From<WindowHandle> for i64 {
    fn from(handle: WindowHandle) -> Self {
        handle.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::LowerHex for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Parse `"12345"`, `"-7"` or `"0x1a2b"`.
impl FromStr for WindowHandle {
    type Err = WindowControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            // Hex handles are bit patterns: accept the full u64 range and
            // reinterpret, so sign-extended HWNDs round-trip.
            Some(hex) => u64::from_str_radix(hex, 16).map(|v| v as i64),
            None => trimmed.parse::<i64>(),
        };
        parsed.map(WindowHandle).map_err(|e| {
            WindowControlError::InvalidArgument(format!("cannot parse window handle {s:?}: {e}"))
        })
    }
}

impl Serialize for WindowHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_js_safe() {
            serializer.serialize_i64(self.0)
        } else {
            serializer.collect_str(&self.0)
        }
    }
}

struct HandleVisitor;

impl Visitor<'_> for HandleVisitor {
    type Value = WindowHandle;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer window handle or its decimal / 0x-hex string form")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(WindowHandle(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(WindowHandle)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse::<WindowHandle>()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for WindowHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(HandleVisitor)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_and_hex() {
        assert_eq!("12345".parse::<WindowHandle>().unwrap().raw(), 12345);
        assert_eq!("0x1A2B".parse::<WindowHandle>().unwrap().raw(), 0x1a2b);
        assert_eq!(" 42 ".parse::<WindowHandle>().unwrap().raw(), 42);
    }

    #[test]
    fn test_parse_full_width_hex() {
        let h: WindowHandle = "0xFFFFFFFFFFFFFFFF".parse().unwrap();
        assert_eq!(h.raw(), -1);
    }

    #[test]
    fn test_parse_garbage_is_invalid_argument() {
        let err = "window-7".parse::<WindowHandle>().unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_small_handle_serializes_as_number() {
        let json = serde_json::to_string(&WindowHandle::from_raw(65_800)).unwrap();
        assert_eq!(json, "65800");
    }

    #[test]
    fn test_large_handle_serializes_as_string() {
        let big = WindowHandle::from_raw(MAX_SAFE_INTEGER + 2);
        let json = serde_json::to_string(&big).unwrap();
        assert_eq!(json, "\"9007199254740993\"");
        let back: WindowHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, big);
    }

    #[test]
    fn test_deserialize_accepts_hex_string() {
        let h: WindowHandle = serde_json::from_str("\"0x10\"").unwrap();
        assert_eq!(h.raw(), 16);
    }

    #[test]
    fn test_to_u32_rejects_out_of_range() {
        assert!(WindowHandle::from_raw(0x0040_0001).to_u32().is_ok());
        assert!(WindowHandle::from_raw(i64::from(u32::MAX) + 1).to_u32().is_err());
        assert!(WindowHandle::from_raw(-5).to_u32().is_err());
        assert!(WindowHandle::NULL.to_u32().is_err());
    }
}
