//! Enumeration engine: one backend pass, then platform-independent
//! filtering and title search.

use crate::backend::Backend;
use crate::config::EnumerationFilter;
use crate::errors::WindowControlError;
use crate::types::{TitleMatch, WindowInfo};

/// Snapshot of user-visible top-level windows, in backend order.
pub fn collect<B: Backend + ?Sized>(
    backend: &B,
    filter: &EnumerationFilter,
) -> Result<Vec<WindowInfo>, WindowControlError> {
    let raw = backend.list_windows(filter)?;
    let total = raw.len();
    let windows: Vec<WindowInfo> = raw.into_iter().filter(|w| filter.admits(w)).collect();
    log::debug!(
        "{}: enumerated {} windows, {} admitted",
        backend.name(),
        total,
        windows.len()
    );
    Ok(windows)
}

pub fn find_all(windows: Vec<WindowInfo>, text: &str, mode: TitleMatch) -> Vec<WindowInfo> {
    windows
        .into_iter()
        .filter(|w| mode.matches(&w.title, text))
        .collect()
}

pub fn find_first(windows: Vec<WindowInfo>, text: &str, mode: TitleMatch) -> Option<WindowInfo> {
    windows.into_iter().find(|w| mode.matches(&w.title, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::WindowHandle;

    fn window(raw: i64, title: &str) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle::from_raw(raw),
            title: title.into(),
            process_id: 42,
            class_name: "Frame".into(),
            visible: true,
            x: 0,
            y: 0,
            width: 640,
            height: 480,
        }
    }

    fn sample() -> Vec<WindowInfo> {
        vec![
            window(1, "Overlay - Game"),
            window(2, "overlay settings"),
            window(3, "Overlay"),
        ]
    }

    #[test]
    fn test_contains_is_case_sensitive() {
        let hits = find_all(sample(), "Overlay", TitleMatch::Contains);
        let handles: Vec<i64> = hits.iter().map(|w| w.handle.raw()).collect();
        assert_eq!(handles, vec![1, 3]);
    }

    #[test]
    fn test_ignore_case_is_opt_in() {
        let hits = find_all(sample(), "OVERLAY", TitleMatch::ContainsIgnoreCase);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_exact_first_match() {
        let hit = find_first(sample(), "Overlay", TitleMatch::Exact).unwrap();
        assert_eq!(hit.handle.raw(), 3);
        assert!(find_first(sample(), "NoSuchWindowTitle12345", TitleMatch::Exact).is_none());
    }
}
