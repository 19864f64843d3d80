//! Cursor animation burst.
//!
//! Walks the pointer along bouncing diagonals at a fixed frame rate until
//! the idle counter drops (someone touched the keyboard or mouse) or the
//! quit hotkey is pressed.

use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use rand::Rng;
use tokio::time::Instant;
use tokio::time::sleep_until;
use tracing::debug;
use tracing::info;
use tracing::trace;

use crate::backend::CursorOverride;
use crate::backend::PointerBackend;
use crate::bounce::pick_diagonal_velocity;
use crate::config::Config;
use crate::domain::Bounds;
use crate::domain::CursorShape;
use crate::domain::EdgeHits;
use crate::domain::Position;
use crate::domain::Velocity;
use crate::idle::query_idle_ms;

/// Frame rates below this are raised to it.
const MIN_FPS: f64 = 30.0;

/// Longest time step integrated in one frame, to ride out scheduler stalls.
const MAX_FRAME_DT: Duration = Duration::from_millis(50);

/// Bounces never slow the pointer below this (px/s).
const MIN_BOUNCE_SPEED: f64 = 150.0;

/// Why an animation burst ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstOutcome {
    /// Real user input was detected; go back to waiting.
    UserInput,
    /// The quit hotkey was pressed; shut down.
    QuitRequested,
}

/// Runs animation bursts against a backend.
pub struct Animator<R> {
    frame_interval: Duration,
    input_tolerance_ms: u64,
    min_start_speed: f64,
    max_start_speed: f64,
    rng: R,
}

impl<R: Rng> Animator<R> {
    /// Create an animator. `min_start_speed` must not exceed `max_start_speed`.
    pub fn new(
        fps: f64,
        input_tolerance_ms: u64,
        min_start_speed: f64,
        max_start_speed: f64,
        rng: R,
    ) -> Self {
        Self {
            frame_interval: Duration::from_secs_f64(1.0 / fps.max(MIN_FPS)),
            input_tolerance_ms,
            min_start_speed,
            max_start_speed,
            rng,
        }
    }

    pub fn from_config(config: &Config, rng: R) -> Self {
        Self::new(
            config.animation_fps,
            config.input_tolerance_ms,
            config.min_start_speed,
            config.max_start_speed,
            rng,
        )
    }

    /// Sleep between frames.
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Animate until user input or the quit hotkey.
    ///
    /// The cursor shape override is restored on every way out, including
    /// errors and this future being dropped.
    pub async fn run<B>(&mut self, backend: &mut B) -> Result<BurstOutcome>
    where
        B: PointerBackend + ?Sized,
    {
        let mut idle_prev = query_idle_ms(backend)?;
        let (width, height) = backend.screen_size();
        let bounds = Bounds::from_size(width, height);

        let (x, y) = backend
            .pointer_position()
            .context("Failed to read pointer position")?;
        let mut pos = Position::new(f64::from(x), f64::from(y));

        let speed = self
            .rng
            .gen_range(self.min_start_speed..=self.max_start_speed);
        let mut velocity =
            pick_diagonal_velocity(speed, EdgeHits::NONE, Velocity::ZERO, &mut self.rng);
        info!(
            "Starting cursor animation at ({}, {}) on {}x{}, {:.0} px/s",
            x, y, width, height, speed
        );

        let mut backend = CursorOverride::engage(backend, CursorShape::Arrow);
        let mut prev_t = Instant::now();
        let mut frames: u64 = 0;

        loop {
            let frame_start = Instant::now();

            if backend.poll_quit_hotkey()? {
                info!("Quit hotkey pressed during animation");
                return Ok(BurstOutcome::QuitRequested);
            }

            let idle = query_idle_ms(&mut *backend)?;
            if idle.saturating_add(self.input_tolerance_ms) < idle_prev {
                info!(
                    "User input detected after {} frames, stopping animation",
                    frames
                );
                return Ok(BurstOutcome::UserInput);
            }
            idle_prev = idle;

            let dt = frame_dt(prev_t, frame_start);
            prev_t = frame_start;

            pos.advance(velocity, dt.as_secs_f64());

            let hits = bounds.resolve(&mut pos);
            if hits.any() {
                let speed = velocity.magnitude().max(MIN_BOUNCE_SPEED);
                velocity = pick_diagonal_velocity(speed, hits, velocity, &mut self.rng);
                debug!("Bounced off {:?}, new velocity {:?}", hits, velocity);
            }

            let (px, py) = pos.to_pixel();
            trace!("Frame {}: pointer -> ({}, {})", frames, px, py);
            backend.set_pointer_position(px, py);
            frames += 1;

            sleep_until(frame_start + self.frame_interval).await;
        }
    }
}

/// Time step to integrate: the measured gap, capped at [`MAX_FRAME_DT`].
fn frame_dt(prev: Instant, now: Instant) -> Duration {
    now.saturating_duration_since(prev).min(MAX_FRAME_DT)
}
