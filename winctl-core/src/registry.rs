//! Process-wide click-through registry.
//!
//! Some backends cannot ask the OS whether a window currently ignores
//! pointer input, so the core remembers what it last applied.  Every entry
//! also carries the backend-specific style bits the core itself introduced,
//! letting `remove_click_through` clear only what it set.
//!
//! # Thread safety
//!
//! One `parking_lot::Mutex` guards the map.  [`ClickThroughRegistry::update`]
//! holds it across a whole read-modify-write sequence, including the
//! backend call made inside the closure, so a toggle is never observed
//! half-applied by another thread.
//!
//! # Eviction
//!
//! There is no notification when a window is destroyed.  Entries are
//! evicted lazily, when an operation on the handle reports
//! `InvalidHandle`, or explicitly via [`ClickThroughRegistry::forget`].

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;

use crate::handle::WindowHandle;

/// What the core last applied to one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClickThroughRecord {
    pub enabled: bool,
    /// Backend-defined bits the core turned on that were not set before.
    pub owned_bits: u64,
}

#[derive(Debug, Default)]
pub struct ClickThroughRegistry {
    entries: Mutex<HashMap<WindowHandle, ClickThroughRecord>>,
}

impl ClickThroughRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handle: WindowHandle) -> Option<ClickThroughRecord> {
        self.entries.lock().get(&handle).copied()
    }

    /// Last applied state; `false` for handles never seen.
    #[cfg(test)]
    pub fn is_enabled(&self, handle: WindowHandle) -> bool {
        self.get(handle).is_some_and(|r| r.enabled)
    }

    /// Run `f` on the entry for `handle` under the registry lock.
    ///
    /// `f` receives a copy of the current entry (`None` if untracked).  The
    /// copy is written back only when `f` returns `Ok`; setting it to `None`
    /// removes the entry.  On `Err` the registry is left untouched.
    pub fn update<T, E, F>(&self, handle: WindowHandle, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Option<ClickThroughRecord>) -> Result<T, E>,
    {
        let mut entries = self.entries.lock();
        let mut entry = entries.get(&handle).copied();
        let out = f(&mut entry)?;
        match entry {
            Some(record) => {
                entries.insert(handle, record);
            }
            None => {
                entries.remove(&handle);
            }
        }
        Ok(out)
    }

    /// Drop the entry for `handle`.  Returns whether one existed.
    pub fn forget(&self, handle: WindowHandle) -> bool {
        self.entries.lock().remove(&handle).is_some()
    }

    pub fn tracked_handles(&self) -> Vec<WindowHandle> {
        let mut handles: Vec<WindowHandle> = self.entries.lock().keys().copied().collect();
        handles.sort_unstable();
        handles
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const H: WindowHandle = WindowHandle::from_raw(0x2a);

    #[test]
    fn test_unknown_handle_defaults_to_disabled() {
        let reg = ClickThroughRegistry::new();
        assert!(!reg.is_enabled(H));
        assert!(reg.get(H).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_update_writes_back_on_ok() {
        let reg = ClickThroughRegistry::new();
        let r: Result<(), ()> = reg.update(H, |entry| {
            *entry = Some(ClickThroughRecord {
                enabled: true,
                owned_bits: 0x20,
            });
            Ok(())
        });
        assert!(r.is_ok());
        assert!(reg.is_enabled(H));
        assert_eq!(reg.get(H).unwrap().owned_bits, 0x20);
    }

    #[test]
    fn test_update_discards_on_err() {
        let reg = ClickThroughRegistry::new();
        let r: Result<(), &str> = reg.update(H, |entry| {
            *entry = Some(ClickThroughRecord {
                enabled: true,
                owned_bits: 0,
            });
            Err("backend failed")
        });
        assert!(r.is_err());
        assert!(reg.get(H).is_none());
    }

    #[test]
    fn test_update_to_none_removes() {
        let reg = ClickThroughRegistry::new();
        let _: Result<(), ()> = reg.update(H, |e| {
            *e = Some(ClickThroughRecord::default());
            Ok(())
        });
        assert_eq!(reg.len(), 1);
        let _: Result<(), ()> = reg.update(H, |e| {
            *e = None;
            Ok(())
        });
        assert!(reg.is_empty());
    }

    #[test]
    fn test_forget_and_tracked_handles() {
        let reg = ClickThroughRegistry::new();
        for raw in [3, 1, 2] {
            let _: Result<(), ()> = reg.update(WindowHandle::from_raw(raw), |e| {
                *e = Some(ClickThroughRecord::default());
                Ok(())
            });
        }
        assert_eq!(
            reg.tracked_handles(),
            vec![
                WindowHandle::from_raw(1),
                WindowHandle::from_raw(2),
                WindowHandle::from_raw(3)
            ]
        );
        assert!(reg.forget(WindowHandle::from_raw(2)));
        assert!(!reg.forget(WindowHandle::from_raw(2)));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_concurrent_toggles_do_not_lose_updates() {
        use std::sync::Arc;

        let reg = Arc::new(ClickThroughRegistry::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let _: Result<(), ()> = reg.update(H, |e| {
                            let cur = e.unwrap_or_default();
                            *e = Some(ClickThroughRecord {
                                enabled: !cur.enabled,
                                owned_bits: cur.owned_bits + 1,
                            });
                            Ok(())
                        });
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        let rec = reg.get(H).unwrap();
        assert_eq!(rec.owned_bits, 8000);
        // an even number of flips lands back on the initial state
        assert!(!rec.enabled);
    }
}
