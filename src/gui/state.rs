//! GUI application state management.
//!
//! Tracks user input values and monitoring status for display.

use std::time::Instant;

use crate::screen::ScreenInfo;

/// Monitoring status for display in the GUI.
#[derive(Clone, Debug)]
pub enum MonitorStatus {
    /// Not running, ready to start
    Idle,
    /// Monitor loop is running
    Running { start_time: Instant },
    /// Failed to start or stopped with an error
    Error(String),
}

impl Default for MonitorStatus {
    fn default() -> Self {
        Self::Idle
    }
}

impl MonitorStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    /// Elapsed time string while running.
    pub fn elapsed_text(&self) -> Option<String> {
        match self {
            Self::Running { start_time } => {
                let secs = start_time.elapsed().as_secs();
                Some(format!("{:02}:{:02}", secs / 60, secs % 60))
            }
            _ => None,
        }
    }
}

/// GUI application state.
pub struct GuiState {
    /// Monitors detected at startup.
    pub screens: Vec<ScreenInfo>,
    /// Index into `screens` for the screen combo box.
    pub selected_screen: usize,
    /// Current monitoring status.
    pub status: MonitorStatus,
}

impl GuiState {
    pub fn new(screens: Vec<ScreenInfo>, selected_screen_name: &str) -> Self {
        let selected_screen = screens
            .iter()
            .position(|s| !selected_screen_name.is_empty() && s.name == selected_screen_name)
            .or_else(|| screens.iter().position(|s| s.is_primary))
            .unwrap_or(0);

        Self {
            screens,
            selected_screen,
            status: MonitorStatus::Idle,
        }
    }

    /// Name of the currently selected screen, empty if none detected.
    pub fn selected_screen_name(&self) -> String {
        self.screens
            .get(self.selected_screen)
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screens() -> Vec<ScreenInfo> {
        vec![
            ScreenInfo {
                name: "A".into(),
                origin: (0, 0),
                resolution: (1920, 1080),
                is_primary: false,
            },
            ScreenInfo {
                name: "B".into(),
                origin: (1920, 0),
                resolution: (1920, 1080),
                is_primary: true,
            },
        ]
    }

    #[test]
    fn test_initial_selection_by_name() {
        let state = GuiState::new(screens(), "A");
        assert_eq!(state.selected_screen, 0);
        assert_eq!(state.selected_screen_name(), "A");
    }

    #[test]
    fn test_initial_selection_falls_back_to_primary() {
        let state = GuiState::new(screens(), "unknown");
        assert_eq!(state.selected_screen_name(), "B");
        let state = GuiState::new(screens(), "");
        assert_eq!(state.selected_screen_name(), "B");
    }

    #[test]
    fn test_status_defaults_to_idle() {
        let state = GuiState::new(screens(), "");
        assert!(!state.status.is_running());
        assert!(state.status.elapsed_text().is_none());
    }
}
