//! xcap-backed screen capture.
//!
//! Captures the whole monitor image and crops to the capture zone. The
//! monitor handle is resolved lazily by name on every capture so unplugging
//! and replugging a display does not wedge a running monitor loop.

use anyhow::{anyhow, Result};
use image::imageops;
use xcap::Monitor;

use super::{Frame, FrameSource};
use crate::screen::CaptureZone;

/// Captures frames from a single monitor, selected by name.
pub struct ScreenGrabber {
    /// Monitor name to capture from. Empty = primary.
    screen_name: String,
}

impl ScreenGrabber {
    pub fn new(screen_name: String) -> Self {
        Self { screen_name }
    }

    fn find_monitor(&self) -> Result<Monitor> {
        let monitors = Monitor::all().map_err(|e| anyhow!("monitor enumeration failed: {}", e))?;

        let index = monitors
            .iter()
            .position(|m| !self.screen_name.is_empty() && m.name() == self.screen_name)
            .or_else(|| monitors.iter().position(|m| m.is_primary()))
            .unwrap_or(0);

        monitors
            .into_iter()
            .nth(index)
            .ok_or_else(|| anyhow!("no monitors found"))
    }
}

impl FrameSource for ScreenGrabber {
    fn capture(&mut self, zone: &CaptureZone) -> Result<Frame> {
        let monitor = self.find_monitor()?;
        let image = monitor
            .capture_image()
            .map_err(|e| anyhow!("screen capture failed: {}", e))?;

        // Zone is in virtual-desktop coordinates; the captured image starts
        // at the monitor origin.
        let rel_x = (zone.x - monitor.x()).max(0) as u32;
        let rel_y = (zone.y - monitor.y()).max(0) as u32;

        let (img_w, img_h) = image.dimensions();
        if rel_x >= img_w || rel_y >= img_h {
            return Err(anyhow!(
                "capture zone ({}, {}) lies outside monitor image {}x{}",
                zone.x,
                zone.y,
                img_w,
                img_h
            ));
        }

        let crop_w = zone.width.min(img_w - rel_x);
        let crop_h = zone.height.min(img_h - rel_y);

        Ok(imageops::crop_imm(&image, rel_x, rel_y, crop_w, crop_h).to_image())
    }
}
