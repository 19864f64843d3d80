//! Scripted in-memory backend for loop tests.

use std::collections::VecDeque;

use super::BackendError;
use super::PointerBackend;
use crate::domain::CursorShape;

/// Backend that replays a script of idle readings and records every call.
#[derive(Debug, Default)]
pub struct FakeBackend {
    pub size: (u32, u32),
    pub pointer: (i32, i32),

    /// Idle readings handed out in order; the last one repeats forever.
    pub idle_script: VecDeque<u64>,
    last_idle: u64,
    /// Number of upcoming idle queries that fail.
    pub idle_failures: u32,
    pub idle_queries: usize,

    /// The hotkey reads as pressed from this poll (1-based) onwards.
    pub quit_at_poll: Option<usize>,
    pub hotkey_polls: usize,

    pub cursor_fails: bool,
    pub cursor_sets: usize,
    pub cursor_restores: usize,
    /// Hotkey poll count at the time of the first cursor override.
    pub first_override_at_poll: Option<usize>,

    pub warps: Vec<(i32, i32)>,
}

impl FakeBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            pointer: (i32::try_from(width / 2).unwrap(), i32::try_from(height / 2).unwrap()),
            ..Self::default()
        }
    }

    pub fn with_idle(mut self, readings: &[u64]) -> Self {
        self.idle_script = readings.iter().copied().collect();
        self
    }

    pub fn with_quit_at_poll(mut self, poll: usize) -> Self {
        self.quit_at_poll = Some(poll);
        self
    }
}

impl PointerBackend for FakeBackend {
    fn screen_size(&self) -> (u32, u32) {
        self.size
    }

    fn pointer_position(&mut self) -> Result<(i32, i32), BackendError> {
        Ok(self.pointer)
    }

    fn set_pointer_position(&mut self, x: i32, y: i32) {
        self.pointer = (x, y);
        self.warps.push((x, y));
    }

    fn idle_ms(&mut self) -> Result<u64, BackendError> {
        self.idle_queries += 1;
        if self.idle_failures > 0 {
            self.idle_failures -= 1;
            return Err(BackendError::QueryFailed("scripted failure".to_string()));
        }
        if let Some(next) = self.idle_script.pop_front() {
            self.last_idle = next;
        }
        Ok(self.last_idle)
    }

    fn poll_quit_hotkey(&mut self) -> Result<bool, BackendError> {
        self.hotkey_polls += 1;
        Ok(self.quit_at_poll.is_some_and(|n| self.hotkey_polls >= n))
    }

    fn set_cursor_shape(&mut self, _shape: CursorShape) -> Result<(), BackendError> {
        self.cursor_sets += 1;
        if self.first_override_at_poll.is_none() {
            self.first_override_at_poll = Some(self.hotkey_polls);
        }
        if self.cursor_fails {
            return Err(BackendError::RequestFailed("scripted cursor failure".to_string()));
        }
        Ok(())
    }

    fn restore_cursor_shape(&mut self) -> Result<(), BackendError> {
        self.cursor_restores += 1;
        if self.cursor_fails {
            return Err(BackendError::RequestFailed("scripted cursor failure".to_string()));
        }
        Ok(())
    }

    fn close(&mut self) {}
}
