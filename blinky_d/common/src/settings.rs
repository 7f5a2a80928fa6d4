use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// EAR below which an eye counts as closed. Physical constant, shared by all modes.
pub const DEFAULT_EAR_THRESHOLD: f32 = 0.21;
/// Closed frames required before a closure counts as a blink.
pub const DEFAULT_CONSECUTIVE_FRAMES: u32 = 2;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("unknown reminder mode '{0}' (expected strict, balanced or gentle)")]
    UnknownMode(String),
    #[error("invalid {field}: {reason}")]
    InvalidThreshold {
        field: &'static str,
        reason: &'static str,
    },
}

/// Built-in sensitivity profiles.
///
/// Serialized lowercase; parsed case-insensitively through `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMode {
    Strict,
    #[default]
    Balanced,
    Gentle,
}

impl ReminderMode {
    pub const ALL: [ReminderMode; 3] = [Self::Strict, Self::Balanced, Self::Gentle];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Balanced => "balanced",
            Self::Gentle => "gentle",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Strict => {
                "Reminder every 20s if you blink less than 12 times/min or haven't blinked in 3s."
            }
            Self::Balanced => {
                "Reminder every 45s if you blink less than 10 times/min or haven't blinked in 8s."
            }
            Self::Gentle => {
                "Reminder every 2min if you blink less than 7 times/min or haven't blinked in 15s."
            }
        }
    }
}

impl fmt::Display for ReminderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReminderMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SettingsError::UnknownMode(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for ReminderMode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Thresholds the detector and the reminder policy read every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub ear_threshold: f32,
    pub consecutive_frames: u32,
    pub time_since_last_blink_ms: u64,
    pub min_blinks_per_minute: u32,
    pub reminder_cooldown_ms: u64,
}

impl Settings {
    pub fn for_mode(mode: ReminderMode) -> Self {
        let (time_since_last_blink_ms, min_blinks_per_minute, reminder_cooldown_ms) = match mode {
            ReminderMode::Strict => (3_000, 12, 20_000),
            ReminderMode::Balanced => (8_000, 10, 45_000),
            ReminderMode::Gentle => (15_000, 7, 120_000),
        };
        Self {
            ear_threshold: DEFAULT_EAR_THRESHOLD,
            consecutive_frames: DEFAULT_CONSECUTIVE_FRAMES,
            time_since_last_blink_ms,
            min_blinks_per_minute,
            reminder_cooldown_ms,
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.ear_threshold.is_finite() || self.ear_threshold <= 0.0 || self.ear_threshold > 1.0
        {
            return Err(SettingsError::InvalidThreshold {
                field: "ear_threshold",
                reason: "must be within (0, 1]",
            });
        }
        if self.consecutive_frames == 0 {
            return Err(SettingsError::InvalidThreshold {
                field: "consecutive_frames",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::for_mode(ReminderMode::default())
    }
}

/// A request from the preferences channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsUpdate {
    Mode(ReminderMode),
    #[serde(rename = "thresholds")]
    Explicit(Settings),
}

/// The settings in force plus the mode they came from (`None` for explicit thresholds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveSettings {
    pub mode: Option<ReminderMode>,
    pub settings: Settings,
}

impl ActiveSettings {
    pub fn for_mode(mode: ReminderMode) -> Self {
        Self {
            mode: Some(mode),
            settings: Settings::for_mode(mode),
        }
    }

    fn resolve(update: SettingsUpdate) -> Result<Self, SettingsError> {
        match update {
            SettingsUpdate::Mode(mode) => Ok(Self::for_mode(mode)),
            SettingsUpdate::Explicit(settings) => {
                settings.validate()?;
                Ok(Self {
                    mode: None,
                    settings,
                })
            }
        }
    }
}

impl Default for ActiveSettings {
    fn default() -> Self {
        Self::for_mode(ReminderMode::default())
    }
}

/// Cross-thread side of the settings manager.
///
/// Updates land in a single slot; a newer update replaces one the engine has not
/// picked up yet. The engine drains the slot between frames only.
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    pending: Arc<Mutex<Option<SettingsUpdate>>>,
    published: Arc<RwLock<ActiveSettings>>,
}

impl SettingsHandle {
    pub fn post(&self, update: SettingsUpdate) -> Result<(), SettingsError> {
        ActiveSettings::resolve(update)?;
        let mut slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(update);
        Ok(())
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Settings the engine last committed.
    pub fn snapshot(&self) -> ActiveSettings {
        *self.published.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self) -> Option<SettingsUpdate> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn publish(&self, active: ActiveSettings) {
        if let Ok(mut published) = self.published.write() {
            *published = active;
        }
    }
}

/// Sole owner and writer of the active settings.
#[derive(Debug)]
pub struct SettingsManager {
    active: ActiveSettings,
    handle: SettingsHandle,
}

impl SettingsManager {
    pub fn new(initial: ActiveSettings) -> Self {
        let handle = SettingsHandle::default();
        handle.publish(initial);
        Self {
            active: initial,
            handle,
        }
    }

    pub fn handle(&self) -> SettingsHandle {
        self.handle.clone()
    }

    pub fn active(&self) -> &ActiveSettings {
        &self.active
    }

    pub fn settings(&self) -> &Settings {
        &self.active.settings
    }

    /// Replaces the whole record. Callers must be outside a frame step.
    pub fn apply(&mut self, update: SettingsUpdate) -> Result<ActiveSettings, SettingsError> {
        let next = ActiveSettings::resolve(update)?;
        match next.mode {
            Some(mode) => info!("Reminder mode switched to {}: {:?}", mode, next.settings),
            None => info!("Explicit thresholds applied: {:?}", next.settings),
        }
        self.active = next;
        self.handle.publish(next);
        Ok(next)
    }

    /// Applies whatever the preferences channel queued since the last frame.
    pub fn drain_pending(&mut self) -> Option<ActiveSettings> {
        let update = self.handle.take()?;
        match self.apply(update) {
            Ok(active) => Some(active),
            Err(e) => {
                warn!("Dropping queued settings update: {}", e);
                None
            }
        }
    }
}

impl Default for SettingsManager {
    fn default() -> Self {
        Self::new(ActiveSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_table() {
        let strict = Settings::for_mode(ReminderMode::Strict);
        assert_eq!(strict.time_since_last_blink_ms, 3_000);
        assert_eq!(strict.min_blinks_per_minute, 12);
        assert_eq!(strict.reminder_cooldown_ms, 20_000);

        let gentle = Settings::for_mode(ReminderMode::Gentle);
        assert_eq!(gentle.time_since_last_blink_ms, 15_000);
        assert_eq!(gentle.min_blinks_per_minute, 7);
        assert_eq!(gentle.reminder_cooldown_ms, 120_000);

        for mode in ReminderMode::ALL {
            let s = Settings::for_mode(mode);
            assert_eq!(s.ear_threshold, DEFAULT_EAR_THRESHOLD);
            assert_eq!(s.consecutive_frames, DEFAULT_CONSECUTIVE_FRAMES);
        }
    }

    #[test]
    fn default_is_balanced() {
        assert_eq!(Settings::default(), Settings::for_mode(ReminderMode::Balanced));
        assert_eq!(ActiveSettings::default().mode, Some(ReminderMode::Balanced));
    }

    #[test]
    fn mode_names_parse_case_insensitively() {
        assert_eq!("Strict".parse::<ReminderMode>(), Ok(ReminderMode::Strict));
        assert_eq!(" gentle ".parse::<ReminderMode>(), Ok(ReminderMode::Gentle));
        assert!(matches!(
            "turbo".parse::<ReminderMode>(),
            Err(SettingsError::UnknownMode(_))
        ));
    }

    #[test]
    fn update_json_shapes() {
        let mode: SettingsUpdate = serde_json::from_str(r#"{"mode": "Strict"}"#).unwrap();
        assert_eq!(mode, SettingsUpdate::Mode(ReminderMode::Strict));

        let mixed: SettingsUpdate = serde_json::from_str(r#"{"mode": "gEnTlE"}"#).unwrap();
        assert_eq!(mixed, SettingsUpdate::Mode(ReminderMode::Gentle));

        let err = serde_json::from_str::<SettingsUpdate>(r#"{"mode": "turbo"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown reminder mode 'turbo'"));
        assert_eq!(
            serde_json::to_string(&ReminderMode::Strict).unwrap(),
            r#""strict""#
        );

        let explicit: SettingsUpdate = serde_json::from_str(
            r#"{"thresholds": {"ear_threshold": 0.2, "consecutive_frames": 3,
                "time_since_last_blink_ms": 5000, "min_blinks_per_minute": 9,
                "reminder_cooldown_ms": 30000}}"#,
        )
        .unwrap();
        assert!(matches!(explicit, SettingsUpdate::Explicit(s) if s.consecutive_frames == 3));
    }

    #[test]
    fn invalid_thresholds_are_refused_at_post() {
        let manager = SettingsManager::default();
        let handle = manager.handle();
        let mut bad = Settings::default();
        bad.consecutive_frames = 0;
        assert!(handle.post(SettingsUpdate::Explicit(bad)).is_err());
        assert!(!handle.has_pending());
    }

    #[test]
    fn posted_update_waits_for_drain() {
        let mut manager = SettingsManager::new(ActiveSettings::for_mode(ReminderMode::Balanced));
        let handle = manager.handle();

        handle.post(SettingsUpdate::Mode(ReminderMode::Gentle)).unwrap();
        assert_eq!(manager.active().mode, Some(ReminderMode::Balanced));
        assert_eq!(handle.snapshot().mode, Some(ReminderMode::Balanced));

        manager.drain_pending();
        assert_eq!(manager.active().mode, Some(ReminderMode::Gentle));
        assert_eq!(handle.snapshot(), ActiveSettings::for_mode(ReminderMode::Gentle));
        assert!(manager.drain_pending().is_none());
    }

    #[test]
    fn latest_post_wins() {
        let mut manager = SettingsManager::default();
        let handle = manager.handle();
        handle.post(SettingsUpdate::Mode(ReminderMode::Gentle)).unwrap();
        handle.post(SettingsUpdate::Mode(ReminderMode::Strict)).unwrap();
        manager.drain_pending();
        assert_eq!(manager.active().mode, Some(ReminderMode::Strict));
    }
}
