//! Screen capture functionality.
//!
//! This module provides:
//! - The `FrameSource` trait the monitor loop captures through
//! - An xcap-backed implementation (`ScreenGrabber`)
//! - Manual test captures for verifying the capture zone

pub mod grabber;

pub use grabber::ScreenGrabber;

use anyhow::Result;
use chrono::Local;
use image::{ImageBuffer, Rgba};
use std::path::PathBuf;

use crate::screen::CaptureZone;

/// One captured frame of the capture zone.
pub type Frame = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Source of screen frames.
///
/// The monitor loop only talks to this trait, so tests can drive the loop
/// with canned frames instead of a live screen.
pub trait FrameSource {
    /// Captures the given zone. The zone is in virtual-desktop coordinates.
    fn capture(&mut self, zone: &CaptureZone) -> Result<Frame>;
}

/// Captures the zone once and saves it as `test_capture_<unix-ts>.png`
/// in the screenshots directory. Used by the "Test Zone" action so the
/// user can verify the zone actually covers the death message area.
pub fn save_test_capture(source: &mut dyn FrameSource, zone: &CaptureZone) -> Result<PathBuf> {
    let frame = source.capture(zone)?;
    let timestamp = Local::now().timestamp();
    let path = crate::paths::get_screenshots_dir().join(format!("test_capture_{}.png", timestamp));
    frame.save(&path)?;
    Ok(path)
}
