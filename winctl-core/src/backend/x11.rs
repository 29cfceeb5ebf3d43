//! X11 backend (Linux / BSD) via `x11rb`.
//!
//! Window-manager attributes go through EWMH: `_NET_CLIENT_LIST` for
//! enumeration, `_NET_WM_STATE` client messages for always-on-top and
//! maximize, `_NET_WM_WINDOW_OPACITY` for opacity (honoured by compositing
//! managers), `_NET_CLOSE_WINDOW` / `_NET_ACTIVE_WINDOW` for close and focus.
//!
//! Click-through replaces the window's XFixes input shape with an empty
//! region.  X11 offers no cheap way to ask whether a window's input shape
//! is empty, so the registry is authoritative on this backend.
//!
//! # Platform notes
//!
//! - Under a reparenting window manager the input shape applies to the
//!   client area; the frame and its title bar still receive clicks.
//! - Process ids come from `_NET_WM_PID`.  Windows that do not publish it
//!   cannot be resolved to a process, and ids of windows forwarded from a
//!   remote host name processes on that host.
//! - One connection is opened on first use and shared; `RustConnection`
//!   is internally synchronised.

use std::sync::Arc;

use parking_lot::Mutex;
use x11rb::connection::Connection;
use x11rb::errors::ReplyOrIdError;
use x11rb::protocol::shape::SK;
use x11rb::protocol::xfixes::ConnectionExt as _;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ClientMessageEvent, ConnectionExt as _, EventMask, MapState, PropMode,
    Rectangle, Window,
};
use x11rb::protocol::ErrorKind as X11ErrorKind;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{CURRENT_TIME, NONE};

use super::{Backend, BackendResult};
use crate::config::EnumerationFilter;
use crate::errors::WindowControlError;
use crate::handle::WindowHandle;
use crate::types::{ClickThroughAuthority, Opacity, WindowInfo, WindowStateKind};

const NAME: &str = "x11";

// _NET_WM_STATE actions
const STATE_REMOVE: u32 = 0;
const STATE_ADD: u32 = 1;
// EWMH source indication: pager / direct user action
const SOURCE_PAGER: u32 = 2;
// ICCCM WM_STATE
const ICONIC_STATE: u32 = 3;

x11rb::atom_manager! {
    Atoms: AtomsCookie {
        _NET_CLIENT_LIST,
        _NET_ACTIVE_WINDOW,
        _NET_CLOSE_WINDOW,
        _NET_WM_NAME,
        _NET_WM_PID,
        _NET_WM_STATE,
        _NET_WM_STATE_ABOVE,
        _NET_WM_STATE_HIDDEN,
        _NET_WM_STATE_MAXIMIZED_VERT,
        _NET_WM_STATE_MAXIMIZED_HORZ,
        _NET_WM_WINDOW_OPACITY,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_DESKTOP,
        _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_WINDOW_TYPE_TOOLBAR,
        _NET_WM_WINDOW_TYPE_MENU,
        _NET_WM_WINDOW_TYPE_UTILITY,
        _NET_WM_WINDOW_TYPE_SPLASH,
        _NET_WM_WINDOW_TYPE_NOTIFICATION,
        WM_CHANGE_STATE,
        UTF8_STRING,
    }
}

type X11Result<T> = Result<T, ReplyOrIdError>;

/// Classify an x11rb failure against the window it was issued for.
fn x11_error(handle: WindowHandle, err: ReplyOrIdError) -> WindowControlError {
    match err {
        ReplyOrIdError::X11Error(e) if matches!(e.error_kind, X11ErrorKind::Window) => {
            WindowControlError::InvalidHandle { handle }
        }
        ReplyOrIdError::X11Error(e) => WindowControlError::platform(
            i64::from(e.error_code),
            format!("X11 request failed: {:?}", e.error_kind),
        ),
        ReplyOrIdError::ConnectionError(e) => e.into(),
        ReplyOrIdError::IdsExhausted => {
            WindowControlError::platform(-1, "X11 resource ids exhausted")
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

struct Session {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
    has_xfixes: bool,
}

impl Session {
    fn connect() -> BackendResult<Self> {
        let (conn, screen_num) = RustConnection::connect(None)?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = Atoms::new(&conn)?
            .reply()
            .map_err(|e| x11_error(WindowHandle::from(root), e.into()))?;
        // Input shapes need XFixes >= 2.0.
        let has_xfixes = conn
            .xfixes_query_version(5, 0)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .is_some_and(|v| v.major_version >= 2);
        if !has_xfixes {
            log::warn!("XFixes unavailable: click-through is not supported on this display");
        }
        log::debug!("connected to X11 display, root window {root:#x}");
        Ok(Self {
            conn,
            root,
            atoms,
            has_xfixes,
        })
    }

    fn property32(&self, window: Window, property: Atom, type_: impl Into<Atom>) -> X11Result<Vec<u32>> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, u32::MAX)?
            .reply()?;
        Ok(reply.value32().map(|v| v.collect()).unwrap_or_default())
    }

    fn property_bytes(&self, window: Window, property: Atom, type_: impl Into<Atom>) -> X11Result<Vec<u8>> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, u32::MAX)?
            .reply()?;
        Ok(reply.value)
    }

    fn title(&self, window: Window) -> X11Result<String> {
        let utf8 = self.property_bytes(window, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)?;
        if !utf8.is_empty() {
            return Ok(String::from_utf8_lossy(&utf8).into_owned());
        }
        let legacy = self.property_bytes(window, AtomEnum::WM_NAME.into(), AtomEnum::ANY)?;
        Ok(String::from_utf8_lossy(&legacy).into_owned())
    }

    /// Class part of `WM_CLASS` (`"instance\0class\0"`).
    fn class_name(&self, window: Window) -> X11Result<String> {
        let raw = self.property_bytes(window, AtomEnum::WM_CLASS.into(), AtomEnum::STRING)?;
        let class = raw
            .split(|b| *b == 0)
            .filter(|part| !part.is_empty())
            .nth(1)
            .unwrap_or_default();
        Ok(String::from_utf8_lossy(class).into_owned())
    }

    fn pid(&self, window: Window) -> X11Result<Option<u32>> {
        Ok(self
            .property32(window, self.atoms._NET_WM_PID, AtomEnum::CARDINAL)?
            .first()
            .copied())
    }

    fn is_tool_window(&self, window: Window) -> X11Result<bool> {
        let a = &self.atoms;
        let tool_types = [
            a._NET_WM_WINDOW_TYPE_DESKTOP,
            a._NET_WM_WINDOW_TYPE_DOCK,
            a._NET_WM_WINDOW_TYPE_TOOLBAR,
            a._NET_WM_WINDOW_TYPE_MENU,
            a._NET_WM_WINDOW_TYPE_UTILITY,
            a._NET_WM_WINDOW_TYPE_SPLASH,
            a._NET_WM_WINDOW_TYPE_NOTIFICATION,
        ];
        let types = self.property32(window, a._NET_WM_WINDOW_TYPE, AtomEnum::ATOM)?;
        Ok(types.iter().any(|t| tool_types.contains(t)))
    }

    fn is_hidden(&self, window: Window) -> X11Result<bool> {
        let states = self.property32(window, self.atoms._NET_WM_STATE, AtomEnum::ATOM)?;
        Ok(states.contains(&self.atoms._NET_WM_STATE_HIDDEN))
    }

    /// Managed top-level windows, falling back to the root's children when
    /// the window manager does not publish `_NET_CLIENT_LIST`.
    fn client_list(&self) -> X11Result<Vec<Window>> {
        let managed = self.property32(self.root, self.atoms._NET_CLIENT_LIST, AtomEnum::WINDOW)?;
        if !managed.is_empty() {
            return Ok(managed);
        }
        log::warn!("_NET_CLIENT_LIST missing: window manager is not EWMH-compliant");
        Ok(self.conn.query_tree(self.root)?.reply()?.children)
    }

    fn snapshot(&self, window: Window) -> X11Result<WindowInfo> {
        let attrs = self.conn.get_window_attributes(window)?.reply()?;
        let geometry = self.conn.get_geometry(window)?.reply()?;
        let origin = self.conn.translate_coordinates(window, self.root, 0, 0)?.reply()?;
        let visible = attrs.map_state == MapState::VIEWABLE && !self.is_hidden(window)?;

        Ok(WindowInfo {
            handle: WindowHandle::from(window),
            title: self.title(window)?,
            process_id: self.pid(window)?.unwrap_or(0),
            class_name: self.class_name(window)?,
            visible,
            x: i32::from(origin.dst_x),
            y: i32::from(origin.dst_y),
            width: i32::from(geometry.width),
            height: i32::from(geometry.height),
        })
    }

    /// EWMH client message addressed to the root window.
    fn send_to_root(&self, window: Window, message_type: Atom, data: [u32; 5]) -> X11Result<()> {
        let event = ClientMessageEvent::new(32, window, message_type, data);
        self.conn
            .send_event(
                false,
                self.root,
                EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
                event,
            )?
            .check()?;
        self.conn.flush()?;
        Ok(())
    }

    fn change_state(&self, window: Window, action: u32, first: Atom, second: Atom) -> X11Result<()> {
        self.send_to_root(
            window,
            self.atoms._NET_WM_STATE,
            [action, first, second, SOURCE_PAGER, 0],
        )
    }

    fn set_input_passthrough(&self, window: Window, enable: bool) -> X11Result<()> {
        if enable {
            let region = self.conn.generate_id()?;
            self.conn
                .xfixes_create_region(region, &[] as &[Rectangle])?
                .check()?;
            let applied = self
                .conn
                .xfixes_set_window_shape_region(window, SK::INPUT, 0, 0, region)
                .map_err(ReplyOrIdError::from)
                .and_then(|cookie| cookie.check().map_err(ReplyOrIdError::from));
            // The shape keeps its own copy; the region is ours to free
            // whether or not the shape request succeeded.
            self.conn.xfixes_destroy_region(region)?;
            applied?;
        } else {
            // NONE restores the default (whole-window) input shape.
            self.conn
                .xfixes_set_window_shape_region(window, SK::INPUT, 0, 0, NONE)?
                .check()?;
        }
        self.conn.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct X11Backend {
    session: Mutex<Option<Arc<Session>>>,
}

impl X11Backend {
    /// Shared connection, opened on first use.  A failed attempt is not
    /// cached, so a display that appears later can still be reached.
    fn session(&self) -> BackendResult<Arc<Session>> {
        let mut slot = self.session.lock();
        if let Some(session) = slot.as_ref() {
            return Ok(Arc::clone(session));
        }
        let session = Arc::new(Session::connect()?);
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Resolve the session and the 32-bit window id, then run `f`, mapping
    /// X11 errors against `handle`.
    fn with_window<T>(
        &self,
        handle: WindowHandle,
        f: impl FnOnce(&Session, Window) -> X11Result<T>,
    ) -> BackendResult<T> {
        let window = handle.to_u32()?;
        let session = self.session()?;
        f(&session, window).map_err(|e| x11_error(handle, e))
    }
}

impl Backend for X11Backend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn click_through_authority(&self) -> ClickThroughAuthority {
        ClickThroughAuthority::Registry
    }

    fn is_window(&self, handle: WindowHandle) -> BackendResult<bool> {
        let Ok(window) = handle.to_u32() else {
            return Ok(false);
        };
        let session = self.session()?;
        let probe = session
            .conn
            .get_window_attributes(window)
            .map_err(ReplyOrIdError::from)
            .and_then(|cookie| cookie.reply().map_err(ReplyOrIdError::from));
        match probe {
            Ok(_) => Ok(true),
            Err(e) => match x11_error(handle, e) {
                WindowControlError::InvalidHandle { .. } => Ok(false),
                other => Err(other),
            },
        }
    }

    fn list_windows(&self, filter: &EnumerationFilter) -> BackendResult<Vec<WindowInfo>> {
        let session = self.session()?;
        let clients = session
            .client_list()
            .map_err(|e| x11_error(WindowHandle::from(session.root), e))?;

        let mut windows = Vec::with_capacity(clients.len());
        for window in clients {
            let collected = session.is_tool_window(window).and_then(|is_tool| {
                if is_tool && !filter.include_tool_windows {
                    Ok(None)
                } else {
                    session.snapshot(window).map(Some)
                }
            });
            match collected {
                Ok(Some(info)) => windows.push(info),
                Ok(None) => {}
                // Destroyed between listing and inspection.
                Err(e) => log::debug!("skipping window {window:#x}: {e}"),
            }
        }
        Ok(windows)
    }

    fn window_info(&self, handle: WindowHandle) -> BackendResult<WindowInfo> {
        self.with_window(handle, |s, w| s.snapshot(w))
    }

    fn foreground_window(&self) -> BackendResult<Option<WindowHandle>> {
        let session = self.session()?;
        let active = session
            .property32(session.root, session.atoms._NET_ACTIVE_WINDOW, AtomEnum::WINDOW)
            .map_err(|e| x11_error(WindowHandle::from(session.root), e))?;
        Ok(active
            .first()
            .copied()
            .filter(|w| *w != NONE)
            .map(WindowHandle::from))
    }

    fn owning_pid(&self, handle: WindowHandle) -> BackendResult<u32> {
        self.with_window(handle, |s, w| s.pid(w))?
            .filter(|pid| *pid != 0)
            .ok_or_else(|| {
                WindowControlError::platform(
                    0,
                    format!("window {handle:#x} does not publish _NET_WM_PID"),
                )
            })
    }

    fn read_click_through(&self, _handle: WindowHandle) -> BackendResult<Option<bool>> {
        Ok(None)
    }

    fn write_click_through(
        &self,
        handle: WindowHandle,
        enable: bool,
        _owned_bits: u64,
    ) -> BackendResult<u64> {
        if !self.session()?.has_xfixes {
            return Err(WindowControlError::unsupported("set_click_through", NAME));
        }
        self.with_window(handle, |s, w| s.set_input_passthrough(w, enable))?;
        Ok(0)
    }

    fn set_topmost(&self, handle: WindowHandle, enabled: bool) -> BackendResult<()> {
        let action = if enabled { STATE_ADD } else { STATE_REMOVE };
        self.with_window(handle, |s, w| {
            s.change_state(w, action, s.atoms._NET_WM_STATE_ABOVE, NONE)
        })
    }

    fn set_opacity(&self, handle: WindowHandle, opacity: Opacity) -> BackendResult<()> {
        self.with_window(handle, |s, w| {
            let atom = s.atoms._NET_WM_WINDOW_OPACITY;
            if opacity.is_opaque() {
                // No property is how an untouched window looks.
                s.conn.delete_property(w, atom)?.check()?;
            } else {
                s.conn
                    .change_property32(
                        PropMode::REPLACE,
                        w,
                        atom,
                        AtomEnum::CARDINAL,
                        &[opacity.to_cardinal()],
                    )?
                    .check()?;
            }
            s.conn.flush()?;
            Ok(())
        })
    }

    fn apply_state(&self, handle: WindowHandle, kind: WindowStateKind) -> BackendResult<()> {
        self.with_window(handle, |s, w| {
            let (vert, horz) = (
                s.atoms._NET_WM_STATE_MAXIMIZED_VERT,
                s.atoms._NET_WM_STATE_MAXIMIZED_HORZ,
            );
            match kind {
                WindowStateKind::Minimize => {
                    s.send_to_root(w, s.atoms.WM_CHANGE_STATE, [ICONIC_STATE, 0, 0, 0, 0])
                }
                WindowStateKind::Maximize => s.change_state(w, STATE_ADD, vert, horz),
                WindowStateKind::Restore => {
                    s.change_state(w, STATE_REMOVE, vert, horz)?;
                    // Mapping an iconic window is the ICCCM way to restore it.
                    s.conn.map_window(w)?.check()?;
                    s.conn.flush()?;
                    Ok(())
                }
            }
        })
    }

    fn focus(&self, handle: WindowHandle) -> BackendResult<()> {
        self.with_window(handle, |s, w| {
            s.send_to_root(
                w,
                s.atoms._NET_ACTIVE_WINDOW,
                [SOURCE_PAGER, CURRENT_TIME, 0, 0, 0],
            )
        })
    }

    fn request_close(&self, handle: WindowHandle) -> BackendResult<()> {
        self.with_window(handle, |s, w| {
            s.send_to_root(
                w,
                s.atoms._NET_CLOSE_WINDOW,
                [CURRENT_TIME, SOURCE_PAGER, 0, 0, 0],
            )
        })
    }
}
