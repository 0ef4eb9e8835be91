//! Monitor detection and capture zone geometry.
//!
//! Death messages appear centered on screen, so the capture zone is a
//! fixed-size rectangle centered on the selected monitor.

use xcap::Monitor;

/// A detected monitor.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenInfo {
    /// Monitor name as reported by the OS (e.g. "DP-1", "\\\\.\\DISPLAY1")
    pub name: String,
    /// Top-left corner in virtual-desktop coordinates
    pub origin: (i32, i32),
    /// Width and height in pixels
    pub resolution: (u32, u32),
    pub is_primary: bool,
}

impl ScreenInfo {
    /// Human-readable label for screen selection UI.
    pub fn description(&self) -> String {
        let primary = if self.is_primary { ", primary" } else { "" };
        format!(
            "{} ({}x{}{})",
            self.name, self.resolution.0, self.resolution.1, primary
        )
    }
}

/// A rectangular screen region in virtual-desktop coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureZone {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Enumerates available monitors.
///
/// Falls back to a single 1920x1080 primary screen if enumeration fails,
/// so the rest of the application can keep going with sensible geometry.
pub fn detect_screens() -> Vec<ScreenInfo> {
    match Monitor::all() {
        Ok(monitors) if !monitors.is_empty() => monitors
            .iter()
            .map(|m| ScreenInfo {
                name: m.name().to_string(),
                origin: (m.x(), m.y()),
                resolution: (m.width(), m.height()),
                is_primary: m.is_primary(),
            })
            .collect(),
        Ok(_) => {
            crate::log("No monitors reported. Falling back to 1920x1080 default.");
            vec![default_screen()]
        }
        Err(e) => {
            crate::log(&format!(
                "Monitor enumeration failed: {}. Falling back to 1920x1080 default.",
                e
            ));
            vec![default_screen()]
        }
    }
}

fn default_screen() -> ScreenInfo {
    ScreenInfo {
        name: "Default Screen".to_string(),
        origin: (0, 0),
        resolution: (1920, 1080),
        is_primary: true,
    }
}

/// Picks the configured screen by name, or the primary screen, or the first.
pub fn select_screen(screens: &[ScreenInfo], name: &str) -> ScreenInfo {
    screens
        .iter()
        .find(|s| !name.is_empty() && s.name == name)
        .or_else(|| screens.iter().find(|s| s.is_primary))
        .or_else(|| screens.first())
        .cloned()
        .unwrap_or_else(default_screen)
}

/// Computes a capture zone of the requested size centered on the screen.
///
/// The zone is clamped to the screen bounds, so a zone larger than the
/// screen captures the whole screen.
pub fn centered_capture_zone(screen: &ScreenInfo, width: u32, height: u32) -> CaptureZone {
    let (origin_x, origin_y) = screen.origin;
    let (screen_w, screen_h) = screen.resolution;

    let width = width.min(screen_w);
    let height = height.min(screen_h);

    CaptureZone {
        x: origin_x + ((screen_w - width) / 2) as i32,
        y: origin_y + ((screen_h - height) / 2) as i32,
        width,
        height,
    }
}
