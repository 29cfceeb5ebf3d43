//! Extended-style arithmetic behind Win32 click-through.
//!
//! Plain bit manipulation with no OS calls, built on every target.  The
//! Win32 backend reads `GWL_EXSTYLE`, asks [`next_ex_style`] for the result
//! and writes it back in one `SetWindowLongPtrW`.

/// `WS_EX_TRANSPARENT`: hit-testing skips the window.
pub const TRANSPARENT: u32 = 0x0000_0020;

/// `WS_EX_LAYERED`: required for the window to keep drawing while
/// transparent to input, and for per-window alpha.
pub const LAYERED: u32 = 0x0008_0000;

/// Both bits that together make a window click-through.
pub const CLICK_THROUGH_BITS: u32 = TRANSPARENT | LAYERED;

/// Next extended style and owned-bit set for a click-through change.
///
/// `owned` holds the bits this crate added earlier.  Enabling sets both
/// bits and takes ownership of whichever were missing.  Disabling always
/// clears `TRANSPARENT`; `LAYERED` is cleared only when owned and
/// `layered_in_use` is false (no alpha or colour key depends on it).
/// Bits outside [`CLICK_THROUGH_BITS`] pass through untouched.
pub fn next_ex_style(current: u32, owned: u32, enable: bool, layered_in_use: bool) -> (u32, u32) {
    if enable {
        let added = CLICK_THROUGH_BITS & !current;
        return (current | CLICK_THROUGH_BITS, owned | added);
    }
    let mut clear = TRANSPARENT;
    if owned & LAYERED != 0 && !layered_in_use {
        clear |= LAYERED;
    }
    (current & !clear, owned & !clear)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOOLWINDOW: u32 = 0x0000_0080;

    #[test]
    fn test_enable_takes_ownership_of_missing_bits() {
        let (style, owned) = next_ex_style(TOOLWINDOW, 0, true, false);
        assert_eq!(style, TOOLWINDOW | CLICK_THROUGH_BITS);
        assert_eq!(owned, CLICK_THROUGH_BITS);
    }

    #[test]
    fn test_reenable_is_idempotent() {
        let (style, owned) = next_ex_style(0, 0, true, false);
        assert_eq!(next_ex_style(style, owned, true, false), (style, owned));
    }

    #[test]
    fn test_preexisting_layered_is_kept() {
        let (style, owned) = next_ex_style(LAYERED, 0, true, false);
        assert_eq!(owned, TRANSPARENT);
        let (style, owned) = next_ex_style(style, owned, false, false);
        assert_eq!(style, LAYERED);
        assert_eq!(owned, 0);
    }

    #[test]
    fn test_owned_layered_is_cleared() {
        let (style, owned) = next_ex_style(TOOLWINDOW, 0, true, false);
        let (style, owned) = next_ex_style(style, owned, false, false);
        assert_eq!(style, TOOLWINDOW);
        assert_eq!(owned, 0);
    }

    #[test]
    fn test_owned_layered_survives_while_translucent() {
        let (style, owned) = next_ex_style(0, 0, true, false);
        let (style, owned) = next_ex_style(style, owned, false, true);
        assert_eq!(style, LAYERED);
        assert_eq!(owned, LAYERED);

        // Once alpha is back to opaque the retained bit goes.
        assert_eq!(next_ex_style(style, owned, false, false), (0, 0));
    }

    #[test]
    fn test_disable_on_untouched_window_only_clears_transparent() {
        let current = TOOLWINDOW | TRANSPARENT | LAYERED;
        let (style, owned) = next_ex_style(current, 0, false, false);
        assert_eq!(style, TOOLWINDOW | LAYERED);
        assert_eq!(owned, 0);
    }
}
