use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::{BlinkStats, ReminderMode};

/// What survives a restart: the chosen mode and the last stats shown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub reminder_mode: Option<ReminderMode>,
    #[serde(default)]
    pub stats: Option<BlinkStats>,
}

pub struct StateStore {
    pub state: PersistedState,
    storage_path: PathBuf,
    dirty: bool,
}

impl StateStore {
    pub fn new(storage_path: PathBuf) -> Self {
        Self {
            state: PersistedState::default(),
            storage_path,
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn record_stats(&mut self, stats: BlinkStats) {
        self.state.stats = Some(stats);
        self.dirty = true;
    }

    pub fn set_mode(&mut self, mode: Option<ReminderMode>) {
        if self.state.reminder_mode != mode {
            self.state.reminder_mode = mode;
            self.dirty = true;
        }
    }

    fn sanitized_for_save(&self) -> PersistedState {
        let mut state = self.state.clone();
        if let Some(stats) = &mut state.stats {
            if !stats.ear.is_some_and(f32::is_finite) {
                stats.ear = None;
            }
        }
        state
    }

    pub fn save(&mut self) -> Result<()> {
        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create state dir: {:?}", parent))?;
            }
        }
        let file = File::create(&self.storage_path).context("Failed to create state file")?;
        serde_json::to_writer_pretty(file, &self.sanitized_for_save())
            .context("Failed to serialize state")?;
        self.dirty = false;
        debug!("Saved state to {:?}", self.storage_path);
        Ok(())
    }

    pub fn load(&mut self) -> Result<()> {
        if !self.storage_path.exists() {
            info!(
                "No state file found at {:?}, starting fresh",
                self.storage_path
            );
            return Ok(());
        }

        let file = File::open(&self.storage_path).context("Failed to open state file")?;
        let reader = BufReader::new(file);
        let state: PersistedState =
            serde_json::from_reader(reader).context("Failed to deserialize state")?;

        self.state = state;
        self.dirty = false;
        info!("Loaded state from {:?}", self.storage_path);
        Ok(())
    }
}
