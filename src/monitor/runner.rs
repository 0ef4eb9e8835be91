//! Monitor loop driver.
//!
//! One thread runs capture → recognize → detect sequentially, then sleeps
//! for the scan delay. At most one scan is ever in flight: if OCR takes
//! longer than the delay, the next scan simply starts late instead of
//! overlapping. Stopping is cooperative and never interrupts a scan.

use anyhow::{anyhow, Result};
use chrono::Local;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::capture::ScreenGrabber;
use crate::config::AppConfig;
use crate::counter::CounterStore;
use crate::detector::DeathDetector;
use crate::monitor::state::{MonitorContext, ScanOutcome};
use crate::ocr::TesseractEngine;
use crate::screen::{centered_capture_zone, detect_screens, select_screen};

/// Event lines kept for the GUI log panel.
const MAX_EVENTS: usize = 200;

/// Scans between "monitoring active" heartbeat log lines.
const HEARTBEAT_EVERY: u64 = 10;

/// Stop-flag polling granularity while sleeping between scans.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Snapshot of the monitor loop for the presentation layer.
///
/// The loop owns its state and publishes read-only copies here; the GUI
/// and console never mutate monitoring state directly, they only request
/// start/stop/reset.
pub struct MonitorShared {
    running: AtomicBool,
    death_count: AtomicU64,
    scan_count: AtomicU64,
    status: Mutex<String>,
    events: Mutex<VecDeque<String>>,
}

impl MonitorShared {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            running: AtomicBool::new(false),
            death_count: AtomicU64::new(0),
            scan_count: AtomicU64::new(0),
            status: Mutex::new("Ready".to_string()),
            events: Mutex::new(VecDeque::new()),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// Requests a cooperative stop. Only prevents future scans; an
    /// in-flight scan finishes and its result is discarded.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn death_count(&self) -> u64 {
        self.death_count.load(Ordering::SeqCst)
    }

    pub fn set_death_count(&self, count: u64) {
        self.death_count.store(count, Ordering::SeqCst);
    }

    pub fn status_text(&self) -> String {
        self.status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|_| "Unknown".to_string())
    }

    pub fn set_status(&self, status: &str) {
        if let Ok(mut s) = self.status.lock() {
            *s = status.to_string();
        }
    }

    /// Logs a message and appends it to the GUI event list with a timestamp.
    pub fn event(&self, msg: &str) {
        crate::log(msg);
        if let Ok(mut events) = self.events.lock() {
            let line = format!("[{}] {}", Local::now().format("%H:%M:%S"), msg);
            events.push_back(line);
            while events.len() > MAX_EVENTS {
                events.pop_front();
            }
        }
    }

    pub fn recent_events(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Starts the monitor loop in a background thread (GUI mode).
///
/// Returns an error if monitoring is already running. The thread builds
/// its own capture and OCR backends so none of them cross threads.
pub fn start_monitor(config: AppConfig, shared: Arc<MonitorShared>) -> Result<()> {
    if shared.running.swap(true, Ordering::SeqCst) {
        return Err(anyhow!("Monitoring is already running"));
    }

    thread::spawn(move || {
        run_loop(&config, &shared);
        shared.set_running(false);
        shared.event("Monitoring stopped");
        shared.set_status("Stopped");
    });

    Ok(())
}

/// Runs the monitor loop on the current thread (console mode).
/// Blocks until `request_stop` is called or the process exits.
pub fn run_blocking(config: &AppConfig, shared: &Arc<MonitorShared>) {
    shared.set_running(true);
    run_loop(config, shared);
    shared.set_running(false);
}

/// Resets the persisted counter to zero. Only valid while stopped.
pub fn reset_counter(shared: &MonitorShared) -> Result<()> {
    if shared.is_running() {
        return Err(anyhow!("Cannot reset while monitoring is running"));
    }
    CounterStore::new(crate::paths::get_counter_file()).reset()?;
    shared.set_death_count(0);
    shared.event("Counter reset to zero");
    Ok(())
}

/// Builds the capture/OCR/detection pipeline from config and scans until
/// the stop flag clears.
fn run_loop(config: &AppConfig, shared: &Arc<MonitorShared>) {
    let screens = detect_screens();
    let screen = select_screen(&screens, &config.selected_screen_name);
    let zone = centered_capture_zone(&screen, config.capture_width, config.capture_height);

    shared.event(&format!("Monitoring started on {}", screen.description()));
    crate::log(&format!(
        "Capture zone: {}x{} at ({}, {})",
        zone.width, zone.height, zone.x, zone.y
    ));

    let engine = TesseractEngine::new();
    if let Err(e) = engine.check_available() {
        // Not fatal: every scan will fail with a recognition error, which
        // is logged, and the user can install tesseract without restarting.
        shared.event(&format!("Warning: tesseract not available: {}", e));
    }

    let mut ctx = MonitorContext::new(
        ScreenGrabber::new(config.selected_screen_name.clone()),
        engine,
        DeathDetector::new(config.min_confidence, config.match_threshold),
        CounterStore::new(crate::paths::get_counter_file()),
        zone,
        shared.clone(),
        config.verbose_mode,
        config.debug_mode,
    );

    shared.set_status(&format!("Monitoring... deaths: {}", ctx.death_count()));
    let delay = Duration::from_secs_f64(config.scan_delay.max(0.1));

    while shared.is_running() {
        match ctx.step() {
            Ok(ScanOutcome::Counted(total)) => {
                shared.set_status(&format!("Monitoring... deaths: {}", total));
            }
            Ok(ScanOutcome::Discarded) => break,
            Ok(_) => {}
            Err(e) => {
                // Log and keep scanning; a failed scan never ends the loop
                shared.event(&format!("Scan error: {}", e));
            }
        }

        let scans = shared.scan_count.fetch_add(1, Ordering::SeqCst) + 1;
        if scans % HEARTBEAT_EVERY == 0 {
            crate::log(&format!(
                "Monitoring active... current deaths: {}",
                ctx.death_count()
            ));
        }

        sleep_with_stop(shared, delay);
    }
}

/// Sleeps for the scan delay in short slices so a stop request takes
/// effect promptly instead of after a full delay.
fn sleep_with_stop(shared: &MonitorShared, delay: Duration) {
    let mut remaining = delay;
    while shared.is_running() && !remaining.is_zero() {
        let slice = remaining.min(SLEEP_SLICE);
        thread::sleep(slice);
        remaining = remaining.saturating_sub(slice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_defaults() {
        let shared = MonitorShared::new();
        assert!(!shared.is_running());
        assert_eq!(shared.death_count(), 0);
        assert_eq!(shared.status_text(), "Ready");
        assert!(shared.recent_events().is_empty());
    }

    #[test]
    fn test_event_list_is_capped() {
        let shared = MonitorShared::new();
        for i in 0..(MAX_EVENTS + 50) {
            shared.event(&format!("event {}", i));
        }
        let events = shared.recent_events();
        assert_eq!(events.len(), MAX_EVENTS);
        // Oldest entries were dropped
        assert!(events[0].contains("event 50"));
    }

    #[test]
    fn test_reset_refused_while_running() {
        let shared = MonitorShared::new();
        shared.set_running(true);
        assert!(reset_counter(&shared).is_err());
    }

    #[test]
    fn test_stop_request_clears_running() {
        let shared = MonitorShared::new();
        shared.set_running(true);
        shared.request_stop();
        assert!(!shared.is_running());
    }
}
