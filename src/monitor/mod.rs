//! The monitor loop: capture → recognize → detect → count.
//!
//! This module provides:
//! - The per-scan state machine with debounce (`state`)
//! - The loop driver and shared snapshot for the presentation layer (`runner`)

pub mod runner;
pub mod state;

pub use runner::{reset_counter, run_blocking, start_monitor, MonitorShared};
pub use state::{MonitorContext, ScanOutcome};

use thiserror::Error;

/// Per-scan failures. All of these are non-fatal: the runner logs them,
/// discards the scan, and continues with the next one.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("screen capture failed: {0}")]
    Capture(anyhow::Error),
    #[error("text recognition failed: {0}")]
    Recognition(anyhow::Error),
    #[error("failed to persist counter: {0}")]
    Persistence(anyhow::Error),
}
