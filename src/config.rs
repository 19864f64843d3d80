//! Configuration loading and defaults for mousewalk.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

/// Shortest idle threshold, whatever `idle_minutes` says.
const MIN_THRESHOLD: Duration = Duration::from_secs(1);

/// Main configuration for mousewalk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Idle minutes before the cursor animation starts (default: 10).
    pub idle_minutes: f64,

    /// Run one animation burst at startup before arming (default: true).
    pub start_immediately: bool,

    /// Animation frame rate; anything below 30 is treated as 30 (default: 120).
    pub animation_fps: f64,

    /// How far idle time must drop to count as real input (default: 50).
    pub input_tolerance_ms: u64,

    /// Idle poll interval while waiting (default: 1000).
    pub idle_poll_interval_ms: u64,

    /// Pause after an animation burst ends (default: 250).
    pub resume_delay_ms: u64,

    /// Initial speed range in pixels per second (default: 300..=700).
    pub min_start_speed: f64,
    pub max_start_speed: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_minutes: 10.0,
            start_immediately: true,
            animation_fps: 120.0,
            input_tolerance_ms: 50,
            idle_poll_interval_ms: 1000,
            resume_delay_ms: 250,
            min_start_speed: 300.0,
            max_start_speed: 700.0,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration from the default path, or return defaults if not found.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            return Self::load(p);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let default_path = config_dir.join("mousewalk").join("config.toml");
            if default_path.exists() {
                return Self::load(&default_path);
            }
        }

        Ok(Self::default())
    }

    /// Reject values the loops can't run with.
    pub fn validate(&self) -> Result<()> {
        if !self.animation_fps.is_finite() || self.animation_fps <= 0.0 {
            anyhow::bail!("animation_fps must be a positive number, got {}", self.animation_fps);
        }

        if self.idle_poll_interval_ms == 0 {
            anyhow::bail!("idle_poll_interval_ms must be greater than zero");
        }

        for (name, speed) in [
            ("min_start_speed", self.min_start_speed),
            ("max_start_speed", self.max_start_speed),
        ] {
            if !speed.is_finite() || speed <= 0.0 {
                anyhow::bail!("{name} must be a positive number, got {speed}");
            }
        }

        if self.min_start_speed > self.max_start_speed {
            anyhow::bail!(
                "min_start_speed ({}) is greater than max_start_speed ({})",
                self.min_start_speed,
                self.max_start_speed
            );
        }

        Ok(())
    }

    /// Idle time after which animation starts.
    ///
    /// Whole seconds, never less than one; non-positive or NaN minutes map to
    /// the one second minimum.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn threshold(&self) -> Duration {
        // Float-to-int casts saturate: NaN and negatives become 0.
        let secs = (self.idle_minutes * 60.0) as u64;
        Duration::from_secs(secs).max(MIN_THRESHOLD)
    }

    pub fn idle_poll_interval(&self) -> Duration {
        Duration::from_millis(self.idle_poll_interval_ms)
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }
}
