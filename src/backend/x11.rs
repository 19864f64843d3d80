//! X11 backend.
//!
//! Idle time comes from the MIT-SCREEN-SAVER extension, the quit hotkey is a
//! passive key grab on the root window, and the cursor override is a glyph
//! cursor from the core `cursor` font.

use std::env;
use std::fmt::Display;

use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;
use x11rb::connection::Connection;
use x11rb::connection::RequestConnection as _;
use x11rb::protocol::Event;
use x11rb::protocol::screensaver;
use x11rb::protocol::screensaver::ConnectionExt as _;
use x11rb::protocol::xproto::ChangeWindowAttributesAux;
use x11rb::protocol::xproto::ConnectionExt as _;
use x11rb::protocol::xproto::Cursor;
use x11rb::protocol::xproto::EventMask;
use x11rb::protocol::xproto::GrabMode;
use x11rb::protocol::xproto::Keycode;
use x11rb::protocol::xproto::Keysym;
use x11rb::protocol::xproto::ModMask;
use x11rb::protocol::xproto::Window;
use x11rb::rust_connection::RustConnection;

use super::BackendError;
use super::PointerBackend;
use crate::domain::CursorShape;

/// Keysyms that quit: `q`, `Q` and the Cyrillic `й`/`Й` on the same key in
/// ЙЦУКЕН layouts.
const QUIT_KEYSYMS: [Keysym; 4] = [0x0071, 0x0051, 0x06ca, 0x06ea];

/// `XC_left_ptr` from cursorfont.h. The mask glyph follows it.
const XC_LEFT_PTR: u16 = 68;

/// X11 pointer backend bound to the default screen.
pub struct X11Backend {
    conn: RustConnection,
    root: Window,
    width: u16,
    height: u16,
    quit_keycodes: Vec<Keycode>,
    cursor: Option<Cursor>,
    closed: bool,
}

impl X11Backend {
    /// Connect to `$DISPLAY` and register the quit hotkey.
    pub fn connect() -> Result<Self, BackendError> {
        let (conn, screen_num) =
            x11rb::connect(None).map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        let (root, width, height) = {
            let screen = conn.setup().roots.get(screen_num).ok_or_else(|| {
                BackendError::ConnectionFailed(format!("Screen {screen_num} not found"))
            })?;
            (screen.root, screen.width_in_pixels, screen.height_in_pixels)
        };
        info!("Connected to X11 display, screen {} is {}x{}", screen_num, width, height);

        let mut backend = Self {
            conn,
            root,
            width,
            height,
            quit_keycodes: Vec::new(),
            cursor: None,
            closed: false,
        };

        let screensaver_ext = backend
            .conn
            .extension_information(screensaver::X11_EXTENSION_NAME)
            .map_err(request_failed)?;
        if screensaver_ext.is_none() {
            return Err(BackendError::QueryFailed(format!(
                "{} extension not available",
                screensaver::X11_EXTENSION_NAME
            )));
        }
        backend.idle_ms()?;

        backend.grab_quit_keys()?;
        Ok(backend)
    }

    /// Get diagnostic information about the X11 environment.
    pub fn get_diagnostics() -> Vec<String> {
        ["DISPLAY", "XDG_SESSION_TYPE", "WAYLAND_DISPLAY"]
            .iter()
            .map(|var| match env::var(var) {
                Ok(v) => format!("{var}={v}"),
                Err(_) => format!("{var}: NOT SET"),
            })
            .collect()
    }

    fn grab_quit_keys(&mut self) -> Result<(), BackendError> {
        let (min_keycode, max_keycode) = {
            let setup = self.conn.setup();
            (setup.min_keycode, setup.max_keycode)
        };
        let count = max_keycode.saturating_sub(min_keycode).saturating_add(1);

        let mapping = self
            .conn
            .get_keyboard_mapping(min_keycode, count)
            .map_err(request_failed)?
            .reply()
            .map_err(request_failed)?;
        self.quit_keycodes =
            quit_keycodes(min_keycode, mapping.keysyms_per_keycode, &mapping.keysyms);

        if self.quit_keycodes.is_empty() {
            warn!("No quit key found in the keyboard mapping; use Ctrl+C to exit");
            return Ok(());
        }

        let attrs = ChangeWindowAttributesAux::new().event_mask(EventMask::KEY_PRESS);
        self.conn
            .change_window_attributes(self.root, &attrs)
            .map_err(request_failed)?;

        for &keycode in &self.quit_keycodes {
            let grabbed = self
                .conn
                .grab_key(
                    true,
                    self.root,
                    ModMask::ANY,
                    keycode,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )
                .map_err(request_failed)?
                .check();
            match grabbed {
                Ok(()) => debug!("Grabbed quit key (keycode {})", keycode),
                Err(e) => warn!("Failed to grab quit key (keycode {}): {}", keycode, e),
            }
        }

        Ok(())
    }

    fn create_font_cursor(&self, glyph: u16) -> Result<Cursor, BackendError> {
        let font = self.conn.generate_id().map_err(request_failed)?;
        self.conn.open_font(font, b"cursor").map_err(request_failed)?;

        let cursor = self.conn.generate_id().map_err(request_failed)?;
        self.conn
            .create_glyph_cursor(
                cursor,
                font,
                font,
                glyph,
                glyph + 1,
                0,
                0,
                0,
                0xffff,
                0xffff,
                0xffff,
            )
            .map_err(request_failed)?;
        self.conn.close_font(font).map_err(request_failed)?;

        Ok(cursor)
    }
}

impl PointerBackend for X11Backend {
    fn screen_size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    fn pointer_position(&mut self) -> Result<(i32, i32), BackendError> {
        let reply = self
            .conn
            .query_pointer(self.root)
            .map_err(request_failed)?
            .reply()
            .map_err(request_failed)?;
        Ok((i32::from(reply.root_x), i32::from(reply.root_y)))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn set_pointer_position(&mut self, x: i32, y: i32) {
        let x = x.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        let y = y.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;

        let result = self
            .conn
            .warp_pointer(x11rb::NONE, self.root, 0, 0, 0, 0, x, y)
            .and_then(|_| self.conn.flush());
        if let Err(e) = result {
            debug!("Ignoring pointer warp failure: {}", e);
        }
    }

    fn idle_ms(&mut self) -> Result<u64, BackendError> {
        let info = self
            .conn
            .screensaver_query_info(self.root)
            .map_err(query_failed)?
            .reply()
            .map_err(query_failed)?;
        Ok(u64::from(info.ms_since_user_input))
    }

    fn poll_quit_hotkey(&mut self) -> Result<bool, BackendError> {
        let mut pressed = false;
        while let Some(event) = self.conn.poll_for_event().map_err(request_failed)? {
            match event {
                Event::KeyPress(key) if self.quit_keycodes.contains(&key.detail) => {
                    debug!("Quit key pressed (keycode {})", key.detail);
                    pressed = true;
                }
                Event::Error(e) => debug!("X11 error event: {:?}", e),
                other => trace!("Ignoring event: {:?}", other),
            }
        }
        Ok(pressed)
    }

    fn set_cursor_shape(&mut self, shape: CursorShape) -> Result<(), BackendError> {
        let glyph = match shape {
            CursorShape::Arrow => XC_LEFT_PTR,
        };

        let cursor = match self.cursor {
            Some(cursor) => cursor,
            None => {
                let cursor = self.create_font_cursor(glyph)?;
                self.cursor = Some(cursor);
                cursor
            }
        };

        let attrs = ChangeWindowAttributesAux::new().cursor(cursor);
        self.conn
            .change_window_attributes(self.root, &attrs)
            .map_err(request_failed)?;
        self.conn.flush().map_err(request_failed)
    }

    fn restore_cursor_shape(&mut self) -> Result<(), BackendError> {
        let attrs = ChangeWindowAttributesAux::new().cursor(x11rb::NONE);
        self.conn
            .change_window_attributes(self.root, &attrs)
            .map_err(request_failed)?;
        self.conn.flush().map_err(request_failed)
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        for &keycode in &self.quit_keycodes {
            if let Err(e) = self.conn.ungrab_key(keycode, self.root, ModMask::ANY) {
                debug!("Failed to ungrab keycode {}: {}", keycode, e);
            }
        }

        if let Err(e) = self.restore_cursor_shape() {
            debug!("Ignoring cursor restore failure: {}", e);
        }
        if let Some(cursor) = self.cursor.take()
            && let Err(e) = self.conn.free_cursor(cursor)
        {
            debug!("Failed to free cursor: {}", e);
        }
        if let Err(e) = self.conn.flush() {
            debug!("Failed to flush on close: {}", e);
        }

        info!("Closed X11 display");
    }
}

impl Drop for X11Backend {
    fn drop(&mut self) {
        self.close();
    }
}

/// Keycodes whose mapping contains any of the quit keysyms.
///
/// `keysyms` is the flat `GetKeyboardMapping` reply starting at
/// `min_keycode`, `keysyms_per_keycode` entries per key.
fn quit_keycodes(min_keycode: Keycode, keysyms_per_keycode: u8, keysyms: &[Keysym]) -> Vec<Keycode> {
    if keysyms_per_keycode == 0 {
        return Vec::new();
    }

    keysyms
        .chunks(usize::from(keysyms_per_keycode))
        .enumerate()
        .filter(|(_, syms)| syms.iter().any(|sym| QUIT_KEYSYMS.contains(sym)))
        .filter_map(|(offset, _)| {
            u8::try_from(offset)
                .ok()
                .and_then(|offset| min_keycode.checked_add(offset))
        })
        .collect()
}

fn request_failed(e: impl Display) -> BackendError {
    BackendError::RequestFailed(e.to_string())
}

fn query_failed(e: impl Display) -> BackendError {
    BackendError::QueryFailed(e.to_string())
}
