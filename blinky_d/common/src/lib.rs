pub use api::{BlinkStats, EngineSignal, FaceFrame, LandmarkProvider, FACE_MESH_POINTS};

mod blink;
mod break_timer;
mod config;
pub mod ear;
mod engine;
mod rate_tracker;
mod reminder;
mod settings;
mod sink;
pub mod state_store;

pub use blink::{BlinkEvent, BlinkPhase, BlinkStateMachine};
pub use break_timer::{BreakPhase, BreakTimer, BreakTimerConfig};
pub use config::{BlinkyConfig, OutputConfig, OutputMode, ProviderConfig, ProviderRuntime};
pub use ear::{eye_aspect_ratio, EyeReadings, EyeSample, SampleError};
pub use engine::{BlinkEngine, FrameObservation, StepOutcome};
pub use rate_tracker::{RateTracker, RATE_WINDOW_MS};
pub use reminder::ReminderPolicy;
pub use settings::{
    ActiveSettings, ReminderMode, Settings, SettingsError, SettingsHandle, SettingsManager,
    SettingsUpdate, DEFAULT_CONSECUTIVE_FRAMES, DEFAULT_EAR_THRESHOLD,
};
pub use sink::SignalSink;
