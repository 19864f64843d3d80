//! Idle monitoring.
//!
//! Polls the display server's idle counter and hands control to the
//! [`Animator`] once the configured threshold is reached.

use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use rand::Rng;
use tokio::time::sleep;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::animation::Animator;
use crate::animation::BurstOutcome;
use crate::backend::BackendError;
use crate::backend::PointerBackend;
use crate::config::Config;

/// Idle queries attempted in a row before giving up.
const QUERY_ATTEMPTS: u32 = 3;

/// Query idle time, retrying a few times before failing.
pub(crate) fn query_idle_ms<B>(backend: &mut B) -> Result<u64>
where
    B: PointerBackend + ?Sized,
{
    let mut last_err: Option<BackendError> = None;

    for attempt in 1..=QUERY_ATTEMPTS {
        match backend.idle_ms() {
            Ok(ms) => return Ok(ms),
            Err(e) => {
                warn!(
                    "Failed to query idle time (attempt {}/{}): {}",
                    attempt, QUERY_ATTEMPTS, e
                );
                last_err = Some(e);
            }
        }
    }

    match last_err {
        Some(e) => Err(e).context("Idle time query kept failing"),
        None => anyhow::bail!("Idle time query was never attempted"),
    }
}

/// Idle monitor that starts an animation burst once the session is idle.
pub struct IdleMonitor<R> {
    animator: Animator<R>,

    /// Idle time that triggers a burst.
    threshold: Duration,

    /// Poll interval while waiting.
    poll_interval: Duration,

    /// Pause after a burst before polling again.
    resume_delay: Duration,

    /// Run one burst before the first poll.
    start_immediately: bool,
}

impl<R: Rng> IdleMonitor<R> {
    /// Create a new idle monitor.
    pub fn new(
        animator: Animator<R>,
        threshold: Duration,
        poll_interval: Duration,
        resume_delay: Duration,
    ) -> Self {
        Self {
            animator,
            threshold,
            poll_interval,
            resume_delay,
            start_immediately: false,
        }
    }

    pub fn from_config(config: &Config, animator: Animator<R>) -> Self {
        let mut monitor = Self::new(
            animator,
            config.threshold(),
            config.idle_poll_interval(),
            config.resume_delay(),
        );
        monitor.start_immediately = config.start_immediately;
        monitor
    }

    /// Idle time that triggers a burst.
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Wait for idleness and animate, until the quit hotkey is pressed.
    ///
    /// Returns `Ok(())` on quit. Idle query failures that outlast the retry
    /// budget are returned as errors.
    pub async fn run<B>(&mut self, backend: &mut B) -> Result<()>
    where
        B: PointerBackend + ?Sized,
    {
        if self.start_immediately {
            debug!("Running initial animation burst");
            if self.animator.run(backend).await? == BurstOutcome::QuitRequested {
                return Ok(());
            }
            sleep(self.resume_delay).await;
        }

        info!(
            "Idle monitor armed, animating after {:?} of inactivity",
            self.threshold
        );

        loop {
            if backend.poll_quit_hotkey()? {
                info!("Quit hotkey pressed");
                return Ok(());
            }

            let idle = Duration::from_millis(query_idle_ms(backend)?);
            if idle >= self.threshold {
                info!("Idle for {:?}, starting animation", idle);
                match self.animator.run(backend).await? {
                    BurstOutcome::QuitRequested => return Ok(()),
                    BurstOutcome::UserInput => sleep(self.resume_delay).await,
                }
            } else {
                trace!("Idle for {:?} of {:?}", idle, self.threshold);
                sleep(self.poll_interval).await;
            }
        }
    }
}
