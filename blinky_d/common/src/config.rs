use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::{ActiveSettings, BreakTimerConfig, ReminderMode, Settings, SettingsError};

/// Where landmark frames come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum ProviderRuntime {
    /// Native (.dll/.so/.dylib) provider plugins from plugins/native (default)
    #[default]
    #[serde(alias = "native")]
    Native,
    /// JSON Lines file of recorded frames
    #[serde(alias = "replay", alias = "File", alias = "file")]
    Replay,
    /// JSON frames pushed over UDP by an external face-mesh process
    #[serde(alias = "udp", alias = "UDP")]
    Udp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum OutputMode {
    #[default]
    #[serde(alias = "log")]
    Log,
    #[serde(alias = "udp", alias = "UDP", alias = "GenericUDP")]
    Udp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub runtime: ProviderRuntime,
    /// File name of the native plugin to drive.
    pub active: String,
    pub replay_path: String,
    pub replay_loop: bool,
    pub listen_port: u16,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            runtime: ProviderRuntime::default(),
            active: default_active_provider(),
            replay_path: "frames.jsonl".to_string(),
            replay_loop: true,
            listen_port: 9100,
        }
    }
}

fn default_active_provider() -> String {
    if cfg!(windows) {
        "synthetic_provider.dll".to_string()
    } else if cfg!(target_os = "macos") {
        "libsynthetic_provider.dylib".to_string()
    } else {
        "libsynthetic_provider.so".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    #[serde(alias = "output_mode")]
    pub mode: OutputMode,
    pub send_address: String,
    pub send_port: u16,
    /// StatsUpdate fires every frame; sinks only get it when asked to.
    pub emit_stats: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::default(),
            send_address: "127.0.0.1".to_string(),
            send_port: 9101,
            emit_stats: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkyConfig {
    /// Mode used when no mode was persisted by a previous session.
    #[serde(alias = "reminder_mode")]
    pub mode: ReminderMode,
    /// Overrides the mode table entirely when set.
    pub thresholds: Option<Settings>,
    pub provider: ProviderConfig,
    pub output: OutputConfig,
    pub break_timer: BreakTimerConfig,
    pub http_port: u16,
    pub state_path: String,
    pub state_flush_secs: u64,
    #[serde(default = "default_max_fps")]
    pub max_fps: Option<f32>,
}

fn default_max_fps() -> Option<f32> {
    Some(30.0)
}

impl Default for BlinkyConfig {
    fn default() -> Self {
        Self {
            mode: ReminderMode::default(),
            thresholds: None,
            provider: ProviderConfig::default(),
            output: OutputConfig::default(),
            break_timer: BreakTimerConfig::default(),
            http_port: 0,
            state_path: "blinky_state.json".to_string(),
            state_flush_secs: 5,
            max_fps: default_max_fps(),
        }
    }
}

impl BlinkyConfig {
    /// Reads `path`, or writes the defaults there when it does not exist yet.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading config from {:?}", path);
            let file = fs::File::open(path)
                .with_context(|| format!("Failed to open config {:?}", path))?;
            let reader = std::io::BufReader::new(file);
            let config = serde_json::from_reader(reader).context("Failed to parse config")?;
            Ok(config)
        } else {
            info!("Config not found. Creating default at {:?}", path);
            let config = Self::default();
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to create config {:?}", path))?;
            let writer = std::io::BufWriter::new(file);
            serde_json::to_writer_pretty(writer, &config).context("Failed to write config")?;
            Ok(config)
        }
    }

    /// Explicit thresholds win, then the persisted mode, then the configured mode.
    pub fn initial_settings(
        &self,
        persisted_mode: Option<ReminderMode>,
    ) -> Result<ActiveSettings, SettingsError> {
        if let Some(settings) = self.thresholds {
            settings.validate()?;
            return Ok(ActiveSettings {
                mode: None,
                settings,
            });
        }
        Ok(ActiveSettings::for_mode(persisted_mode.unwrap_or(self.mode)))
    }
}
