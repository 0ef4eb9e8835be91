//! Console front-end.
//!
//! Runs the monitor loop on the main thread with no GUI. Monitoring
//! continues until the process is killed; the counter is persisted after
//! every increment, so Ctrl+C loses nothing.

use anyhow::Result;

use crate::capture::{save_test_capture, ScreenGrabber};
use crate::config::AppConfig;
use crate::counter::CounterStore;
use crate::monitor::{run_blocking, MonitorShared};
use crate::screen::{centered_capture_zone, detect_screens, select_screen};

/// Runs the console monitor until the process exits.
pub fn run(config: &AppConfig) -> Result<()> {
    let previous = CounterStore::new(crate::paths::get_counter_file()).load();
    if previous > 0 {
        crate::log(&format!("Counter loaded: {} previous deaths", previous));
    }
    crate::log("Starting death counter... Ctrl+C to stop.");

    let shared = MonitorShared::new();
    run_blocking(config, &shared);
    Ok(())
}

/// Captures the configured zone once, saves it, and exits.
/// Used to verify zone placement before a session.
pub fn run_test_capture(config: &AppConfig) -> Result<()> {
    let screens = detect_screens();
    let screen = select_screen(&screens, &config.selected_screen_name);
    let zone = centered_capture_zone(&screen, config.capture_width, config.capture_height);

    crate::log(&format!(
        "Testing capture zone {}x{} at ({}, {}) on {}",
        zone.width,
        zone.height,
        zone.x,
        zone.y,
        screen.description()
    ));

    let mut grabber = ScreenGrabber::new(config.selected_screen_name.clone());
    let path = save_test_capture(&mut grabber, &zone)?;
    crate::log(&format!("Test capture saved: {}", path.display()));
    Ok(())
}
