//! mousewalk - transparent cursor screensaver for X11.
//!
//! Keeps the session awake by moving the pointer after a period of
//! inactivity. Press Q to quit.

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use mousewalk::animation::Animator;
use mousewalk::backend::PointerBackend;
use mousewalk::backend::X11Backend;
use mousewalk::config::Config;
use mousewalk::idle::IdleMonitor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Transparent cursor screensaver for X11.
///
/// Moves the mouse pointer along bouncing diagonals after a period of
/// inactivity, and stops as soon as you touch the keyboard or mouse.
#[derive(Parser, Debug)]
#[command(name = "mousewalk")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Idle minutes before the cursor animation starts [default: 10].
    #[arg(long)]
    minutes: Option<f64>,

    /// Skip the initial animation burst and wait for the idle threshold.
    #[arg(long)]
    wait: bool,

    /// Seed for the bounce direction generator.
    #[arg(long)]
    seed: Option<u64>,

    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("mousewalk v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config =
        Config::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(minutes) = args.minutes {
        config.idle_minutes = minutes;
    }
    if args.wait {
        config.start_immediately = false;
    }
    config.validate().context("Invalid configuration")?;

    let mut backend = match X11Backend::connect() {
        Ok(backend) => backend,
        Err(e) => {
            error!("Could not set up the X11 session: {}", e);
            error!("Environment:");
            for diag in X11Backend::get_diagnostics() {
                error!("  {}", diag);
            }
            error!("mousewalk needs an X11 session (or XWayland with DISPLAY set).");
            return Err(e).context("Failed to open display");
        }
    };

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let animator = Animator::from_config(&config, rng);
    let mut monitor = IdleMonitor::from_config(&config, animator);

    info!(
        "Armed: will start after {:?} of inactivity",
        monitor.threshold()
    );
    info!("Press Q to quit at any time.");

    tokio::select! {
        result = monitor.run(&mut backend) => result?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("Interrupted, exiting");
        }
    }

    backend.close();
    Ok(())
}

/// Initialize logging with the specified level.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(format!("mousewalk={level}"))
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    Ok(())
}
