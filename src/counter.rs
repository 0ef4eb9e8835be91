//! Persisted death counter.
//!
//! A single integer stored as `{"count": <n>}` in death_counter.json.
//! The file is rewritten synchronously after every increment so the
//! on-disk value converges with memory before the next scan starts.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Serialize, Deserialize)]
struct CounterFile {
    count: u64,
}

/// Handle to the counter file.
pub struct CounterStore {
    path: PathBuf,
}

impl CounterStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the persisted count. Missing or unreadable file means 0.
    pub fn load(&self) -> u64 {
        if !self.path.exists() {
            return 0;
        }
        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str::<CounterFile>(&contents) {
                Ok(data) => data.count,
                Err(e) => {
                    crate::log(&format!("Failed to parse counter file: {}. Starting at 0.", e));
                    0
                }
            },
            Err(e) => {
                crate::log(&format!("Failed to read counter file: {}. Starting at 0.", e));
                0
            }
        }
    }

    /// Writes the count to disk. Blocking; returns an error on I/O failure.
    pub fn save(&self, count: u64) -> Result<()> {
        let json = serde_json::to_string(&CounterFile { count })?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Resets the counter to zero and persists immediately.
    pub fn reset(&self) -> Result<()> {
        self.save(0)
    }
}
