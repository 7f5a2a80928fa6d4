use anyhow::Result;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Number of points in the face-mesh topology providers deliver.
pub const FACE_MESH_POINTS: usize = 468;

/// Face-mesh indices for the left eye: outer corner, upper-outer, upper-inner,
/// inner corner, lower-inner, lower-outer.
pub const LEFT_EYE_INDICES: [usize; 6] = [33, 160, 158, 133, 153, 144];
/// Face-mesh indices for the right eye, same order as the left.
pub const RIGHT_EYE_INDICES: [usize; 6] = [263, 387, 385, 362, 380, 373];

/// One camera frame as seen by a landmark provider.
///
/// Landmarks are normalized image-space points; `z` is the model's relative depth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceFrame {
    pub face_detected: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub landmarks: Vec<Vec3>,
}

impl FaceFrame {
    pub fn detected(landmarks: Vec<Vec3>) -> Self {
        Self {
            face_detected: true,
            landmarks,
        }
    }

    pub fn no_face() -> Self {
        Self::default()
    }
}

/// Live counters published with every processed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BlinkStats {
    pub total_blinks: u64,
    pub blinks_per_minute: u32,
    /// `None` until the first blink of the session.
    pub time_since_last_blink_ms: Option<u64>,
    pub ear: Option<f32>,
}

/// Everything the engine and the break timer hand to the notification layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineSignal {
    BlinkDetected {
        total_blinks: u64,
        blinks_per_minute: u32,
        ear: f32,
    },
    LowBlinkRate {
        blinks_per_minute: u32,
    },
    StatsUpdate(BlinkStats),
    BreakStarted {
        break_secs: u64,
    },
    BreakFinished,
    DetectionUnavailable {
        reason: String,
    },
}

impl EngineSignal {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BlinkDetected { .. } => "BlinkDetected",
            Self::LowBlinkRate { .. } => "LowBlinkRate",
            Self::StatsUpdate(_) => "StatsUpdate",
            Self::BreakStarted { .. } => "BreakStarted",
            Self::BreakFinished => "BreakFinished",
            Self::DetectionUnavailable { .. } => "DetectionUnavailable",
        }
    }
}

/// log level for provider logging
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

/// logger callback for providers
pub type LogCallback =
    extern "C" fn(level: LogLevel, target: *const std::ffi::c_char, message: *const std::ffi::c_char);

/// Logger handed to native providers, which can't reach the host's `log` statics.
pub struct ProviderLogger {
    callback: LogCallback,
    provider_name: String,
}

impl ProviderLogger {
    pub fn new(callback: LogCallback, provider_name: String) -> Self {
        Self {
            callback,
            provider_name,
        }
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn trace(&self, message: &str) {
        self.log(LogLevel::Trace, message);
    }

    fn log(&self, level: LogLevel, message: &str) {
        // Interior NULs would make CString::new fail; strip them rather than drop the line.
        let target = std::ffi::CString::new(self.provider_name.replace('\0', ""))
            .unwrap_or_default();
        let msg = std::ffi::CString::new(message.replace('\0', "")).unwrap_or_default();
        (self.callback)(level, target.as_ptr(), msg.as_ptr());
    }
}

/// Source of per-frame face landmarks (camera + face-mesh model).
///
/// `initialize` failing means the model or camera is unusable; the daemon treats
/// it as fatal. `next_frame` returns `Ok(None)` when no new frame is ready yet.
pub trait LandmarkProvider {
    fn initialize(&mut self, logger: ProviderLogger) -> Result<()>;
    fn next_frame(&mut self) -> Result<Option<FaceFrame>>;
    fn unload(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_serializes_with_type_tag() {
        let signal = EngineSignal::LowBlinkRate {
            blinks_per_minute: 4,
        };
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["type"], "LOW_BLINK_RATE");
        assert_eq!(json["blinks_per_minute"], 4);
    }

    #[test]
    fn stats_update_flattens_into_tagged_object() {
        let signal = EngineSignal::StatsUpdate(BlinkStats {
            total_blinks: 3,
            blinks_per_minute: 2,
            time_since_last_blink_ms: None,
            ear: Some(0.3),
        });
        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["type"], "STATS_UPDATE");
        assert_eq!(json["total_blinks"], 3);
        assert!(json["time_since_last_blink_ms"].is_null());
    }

    #[test]
    fn eye_tables_are_distinct_mesh_points() {
        let mut all: Vec<usize> = LEFT_EYE_INDICES
            .iter()
            .chain(RIGHT_EYE_INDICES.iter())
            .copied()
            .collect();
        assert!(all.iter().all(|&i| i < FACE_MESH_POINTS));
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 12);
    }

    #[test]
    fn no_face_frame_parses_without_landmarks() {
        let frame: FaceFrame = serde_json::from_str(r#"{"face_detected": false}"#).unwrap();
        assert_eq!(frame, FaceFrame::no_face());
    }
}
