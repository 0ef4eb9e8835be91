//! GUI rendering functions.
//!
//! Contains UI layout and component rendering logic.

use eframe::egui::{self, Color32, RichText};

use crate::config::AppConfig;
use crate::gui::state::{GuiState, MonitorStatus};

/// Render the death counter display.
/// Returns true if the Reset button was clicked.
pub fn render_counter(ui: &mut egui::Ui, death_count: u64, reset_enabled: bool) -> bool {
    let mut reset_clicked = false;

    ui.horizontal(|ui| {
        ui.label(RichText::new("Deaths:").size(16.0));
        ui.label(
            RichText::new(death_count.to_string())
                .size(32.0)
                .strong()
                .color(Color32::from_rgb(200, 60, 60)),
        );

        ui.add_space(20.0);

        // Reset only makes sense while stopped
        ui.add_enabled_ui(reset_enabled, |ui| {
            if ui.button("Reset").clicked() {
                reset_clicked = true;
            }
        });
    });

    reset_clicked
}

/// Render the configuration panel.
/// Returns true if any setting changed this frame.
pub fn render_config(
    ui: &mut egui::Ui,
    config: &mut AppConfig,
    state: &mut GuiState,
    enabled: bool,
) -> bool {
    let mut changed = false;

    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);
    ui.heading("Configuration");
    ui.add_space(8.0);

    ui.add_enabled_ui(enabled, |ui| {
        ui.horizontal(|ui| {
            ui.label("Screen:");
            let selected_text = state
                .screens
                .get(state.selected_screen)
                .map(|s| s.description())
                .unwrap_or_else(|| "No screens detected".to_string());

            egui::ComboBox::from_id_salt("screen_combo")
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for (idx, screen) in state.screens.iter().enumerate() {
                        if ui
                            .selectable_value(&mut state.selected_screen, idx, screen.description())
                            .changed()
                        {
                            changed = true;
                        }
                    }
                });
        });

        ui.horizontal(|ui| {
            ui.label("Zone width:");
            changed |= ui
                .add(egui::DragValue::new(&mut config.capture_width).range(100..=3840))
                .changed();
            ui.label("Zone height:");
            changed |= ui
                .add(egui::DragValue::new(&mut config.capture_height).range(50..=2160))
                .changed();
        });

        ui.horizontal(|ui| {
            ui.label("Scan delay (s):");
            changed |= ui
                .add(
                    egui::DragValue::new(&mut config.scan_delay)
                        .range(0.1..=5.0)
                        .speed(0.1),
                )
                .changed();
        });

        ui.horizontal(|ui| {
            changed |= ui.checkbox(&mut config.verbose_mode, "Verbose mode").changed();
            ui.add_space(20.0);
            changed |= ui.checkbox(&mut config.debug_mode, "Debug mode").changed();
        });
    });

    changed
}

/// Render the control buttons.
/// Returns (start_clicked, stop_clicked, test_clicked).
pub fn render_controls(ui: &mut egui::Ui, running: bool) -> (bool, bool, bool) {
    let mut start_clicked = false;
    let mut stop_clicked = false;
    let mut test_clicked = false;

    ui.add_space(16.0);

    ui.horizontal(|ui| {
        ui.add_enabled_ui(!running, |ui| {
            if ui.button(RichText::new("▶ Start").size(16.0)).clicked() {
                start_clicked = true;
            }
        });

        ui.add_space(20.0);

        ui.add_enabled_ui(running, |ui| {
            if ui.button(RichText::new("◼ Stop").size(16.0)).clicked() {
                stop_clicked = true;
            }
        });

        ui.add_space(20.0);

        ui.add_enabled_ui(!running, |ui| {
            if ui.button("Test Zone").clicked() {
                test_clicked = true;
            }
        });
    });

    (start_clicked, stop_clicked, test_clicked)
}

/// Render the status line and scrolling event log.
pub fn render_status(ui: &mut egui::Ui, state: &GuiState, status_text: &str, events: &[String]) {
    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        ui.label("Status:");

        let color = match &state.status {
            MonitorStatus::Idle => Color32::GRAY,
            MonitorStatus::Running { .. } => Color32::from_rgb(0, 150, 0),
            MonitorStatus::Error(_) => Color32::from_rgb(200, 0, 0),
        };

        let text = match &state.status {
            MonitorStatus::Error(msg) => format!("Error: {}", msg),
            _ => status_text.to_string(),
        };
        ui.label(RichText::new(text).color(color));

        if let Some(elapsed) = state.status.elapsed_text() {
            ui.add_space(10.0);
            ui.label(format!("({})", elapsed));
        }
    });

    ui.add_space(8.0);

    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .max_height(200.0)
        .show(ui, |ui| {
            for line in events {
                ui.label(RichText::new(line).monospace().size(11.0));
            }
        });
}
