//! mousewalk - transparent cursor screensaver for X11.
//!
//! Watches the session idle counter and, once it passes a threshold, walks
//! the pointer along bouncing diagonals until real input shows up again.

pub mod animation;
pub mod backend;
pub mod bounce;
pub mod config;
pub mod domain;
pub mod idle;
