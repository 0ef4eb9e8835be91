//! GUI module for the application.
//!
//! Provides a graphical interface using egui/eframe for user interaction.

pub mod render;
pub mod state;

use std::sync::Arc;
use std::time::Instant;

use eframe::egui::{self, Vec2};

use crate::capture::{save_test_capture, ScreenGrabber};
use crate::config::{save_config, AppConfig, WindowGeometry};
use crate::counter::CounterStore;
use crate::monitor::{reset_counter, start_monitor, MonitorShared};
use crate::screen::{centered_capture_zone, detect_screens};

use state::{GuiState, MonitorStatus};

/// Main GUI application struct.
pub struct GuiApp {
    /// Current configuration; edited live and persisted on change.
    config: AppConfig,
    /// UI state (screen list, status).
    state: GuiState,
    /// Shared snapshot of the monitor loop.
    shared: Arc<MonitorShared>,
}

impl GuiApp {
    pub fn new(config: AppConfig) -> Self {
        let screens = detect_screens();
        let state = GuiState::new(screens, &config.selected_screen_name);

        let shared = MonitorShared::new();
        shared.set_death_count(CounterStore::new(crate::paths::get_counter_file()).load());

        Self {
            config,
            state,
            shared,
        }
    }

    /// Reconcile displayed status with the actual loop state.
    fn update_status(&mut self) {
        if self.state.status.is_running() && !self.shared.is_running() {
            self.state.status = MonitorStatus::Idle;
        }
    }

    fn handle_start(&mut self) {
        self.config.selected_screen_name = self.state.selected_screen_name();
        self.persist_config();

        match start_monitor(self.config.clone(), self.shared.clone()) {
            Ok(()) => {
                self.state.status = MonitorStatus::Running {
                    start_time: Instant::now(),
                };
            }
            Err(e) => {
                self.state.status = MonitorStatus::Error(e.to_string());
                crate::log(&format!("GUI: failed to start monitoring: {}", e));
            }
        }
    }

    fn handle_stop(&mut self) {
        self.shared.request_stop();
        crate::log("GUI: requested monitor stop");
    }

    fn handle_reset(&mut self) {
        if let Err(e) = reset_counter(&self.shared) {
            self.state.status = MonitorStatus::Error(e.to_string());
        }
    }

    fn handle_test_capture(&mut self) {
        let screen_name = self.state.selected_screen_name();
        let Some(screen) = self.state.screens.get(self.state.selected_screen) else {
            self.shared.event("Test capture failed: no screen selected");
            return;
        };
        let zone =
            centered_capture_zone(screen, self.config.capture_width, self.config.capture_height);

        let mut grabber = ScreenGrabber::new(screen_name);
        match save_test_capture(&mut grabber, &zone) {
            Ok(path) => {
                self.shared
                    .event(&format!("Test capture saved: {}", path.display()));
            }
            Err(e) => {
                self.shared.event(&format!("Test capture failed: {}", e));
            }
        }
    }

    fn persist_config(&mut self) {
        if let Err(e) = save_config(&crate::paths::get_config_file(), &self.config) {
            crate::log(&format!("Failed to save config: {}", e));
        }
    }

    /// Record the current window placement so it can be restored next run.
    fn track_window_geometry(&mut self, ctx: &egui::Context) {
        if let Some(rect) = ctx.input(|i| i.viewport().outer_rect) {
            self.config.window_geometry = Some(WindowGeometry {
                x: rect.min.x,
                y: rect.min.y,
                width: rect.width(),
                height: rect.height(),
            });
        }
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_status();
        self.track_window_geometry(ctx);

        // Repaint regularly so counter and log stay fresh while scanning
        if self.state.status.is_running() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Death Counter");
            ui.add_space(12.0);

            let running = self.state.status.is_running();

            let reset_clicked = render::render_counter(ui, self.shared.death_count(), !running);
            let config_changed = render::render_config(ui, &mut self.config, &mut self.state, !running);
            let (start_clicked, stop_clicked, test_clicked) = render::render_controls(ui, running);

            render::render_status(
                ui,
                &self.state,
                &self.shared.status_text(),
                &self.shared.recent_events(),
            );

            if config_changed {
                self.config.selected_screen_name = self.state.selected_screen_name();
                self.persist_config();
            }
            if reset_clicked {
                self.handle_reset();
            }
            if start_clicked {
                self.handle_start();
            }
            if stop_clicked {
                self.handle_stop();
            }
            if test_clicked {
                self.handle_test_capture();
            }
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.shared.is_running() {
            self.shared.request_stop();
        }
        self.persist_config();
    }
}

/// Run the GUI application.
/// This function blocks until the window is closed.
pub fn run_gui(config: AppConfig) -> eframe::Result<()> {
    let mut viewport = egui::ViewportBuilder::default()
        .with_inner_size(Vec2::new(560.0, 620.0))
        .with_min_inner_size(Vec2::new(420.0, 420.0))
        .with_title("Death Counter");

    if let Some(geometry) = &config.window_geometry {
        viewport = viewport
            .with_position(egui::pos2(geometry.x, geometry.y))
            .with_inner_size(Vec2::new(geometry.width, geometry.height));
    }

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "Death Counter",
        options,
        Box::new(|_cc| Ok(Box::new(GuiApp::new(config)))),
    )
}
