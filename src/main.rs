//! Death Counter
//!
//! Watches a region of the screen with OCR and counts FromSoftware death
//! messages ("YOU DIED", "VOUS ÊTES MORT", "VOUS AVEZ PÉRI", ...).
//! Runs as a GUI by default, or headless with `--console`.

mod capture;
mod config;
mod console;
mod counter;
mod detector;
mod gui;
mod monitor;
mod ocr;
mod paths;
mod screen;

use anyhow::{anyhow, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("death_counter.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        let log_path = paths::get_logs_dir().join("death_counter.log");
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));

    // Ensure output directories exist
    paths::ensure_directories()?;

    // Load configuration
    let app_config = config::load_config(&paths::get_config_file());

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--test-capture") {
        console::run_test_capture(&app_config)
    } else if args.iter().any(|a| a == "--console") {
        log("Starting console monitor...");
        console::run(&app_config)
    } else {
        log("Starting GUI application...");
        match gui::run_gui(app_config) {
            Ok(()) => {
                log("GUI application exited normally");
                Ok(())
            }
            Err(e) => {
                log(&format!("GUI error: {}", e));
                Err(anyhow!("GUI error: {}", e))
            }
        }
    }
}
