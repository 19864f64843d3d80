//! Display and input backends.
//!
//! The animation and idle loops only talk to the display server through
//! [`PointerBackend`], so the same logic drives X11 in production and a
//! scripted fake under test.

#[cfg(test)]
pub(crate) mod fake;
mod x11;

use std::ops::Deref;
use std::ops::DerefMut;

use thiserror::Error;
use tracing::debug;
pub use x11::X11Backend;

use crate::domain::CursorShape;

/// Trait for the platform session the pointer lives in.
///
/// All calls are synchronous and expected to return quickly.
pub trait PointerBackend {
    /// Pixel size of the primary screen.
    fn screen_size(&self) -> (u32, u32);

    /// Current pointer position in root window coordinates.
    fn pointer_position(&mut self) -> Result<(i32, i32), BackendError>;

    /// Move the pointer.
    ///
    /// Best-effort: implementations log and drop failures.
    fn set_pointer_position(&mut self, x: i32, y: i32);

    /// Milliseconds since the last genuine user input.
    fn idle_ms(&mut self) -> Result<u64, BackendError>;

    /// Non-blocking check whether the quit hotkey was pressed since the last
    /// call.
    fn poll_quit_hotkey(&mut self) -> Result<bool, BackendError>;

    /// Force the pointer shape. Cosmetic.
    fn set_cursor_shape(&mut self, shape: CursorShape) -> Result<(), BackendError>;

    /// Undo [`set_cursor_shape`](Self::set_cursor_shape). Cosmetic.
    fn restore_cursor_shape(&mut self) -> Result<(), BackendError>;

    /// Release hotkeys and other session state. Safe to call more than once.
    fn close(&mut self);
}

/// Errors that can occur talking to the display server.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Cannot open display: {0}")]
    ConnectionFailed(String),

    #[error("Idle time query failed: {0}")]
    QueryFailed(String),

    #[error("Display request failed: {0}")]
    RequestFailed(String),
}

/// Forced cursor shape, restored when dropped.
///
/// Derefs to the backend so the animation loop keeps using it while the
/// override is active. Restoration happens on every exit path, including
/// the enclosing future being dropped on interrupt.
pub struct CursorOverride<'a, B: PointerBackend + ?Sized> {
    backend: &'a mut B,
}

impl<'a, B: PointerBackend + ?Sized> CursorOverride<'a, B> {
    /// Force `shape` on `backend`. Failures are logged and ignored.
    pub fn engage(backend: &'a mut B, shape: CursorShape) -> Self {
        if let Err(e) = backend.set_cursor_shape(shape) {
            debug!("Ignoring cursor shape failure: {}", e);
        }
        Self { backend }
    }
}

impl<B: PointerBackend + ?Sized> Deref for CursorOverride<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.backend
    }
}

impl<B: PointerBackend + ?Sized> DerefMut for CursorOverride<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.backend
    }
}

impl<B: PointerBackend + ?Sized> Drop for CursorOverride<'_, B> {
    fn drop(&mut self) {
        if let Err(e) = self.backend.restore_cursor_shape() {
            debug!("Ignoring cursor restore failure: {}", e);
        }
    }
}
