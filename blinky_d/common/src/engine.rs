use log::{debug, trace};

use crate::{
    ActiveSettings, BlinkEvent, BlinkStateMachine, BlinkStats, EngineSignal, EyeReadings,
    FaceFrame, RateTracker, ReminderPolicy, SettingsError, SettingsHandle, SettingsManager,
    SettingsUpdate,
};

/// What the engine made of one frame. Not retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameObservation {
    pub timestamp_ms: u64,
    pub face_detected: bool,
    pub left_ear: Option<f32>,
    pub right_ear: Option<f32>,
    pub avg_ear: Option<f32>,
}

impl FrameObservation {
    pub fn from_frame(frame: &FaceFrame, timestamp_ms: u64) -> Self {
        let Some(readings) = EyeReadings::from_frame(frame) else {
            return Self {
                timestamp_ms,
                face_detected: false,
                left_ear: None,
                right_ear: None,
                avg_ear: None,
            };
        };

        if let Err(e) = readings.left.and(readings.right) {
            trace!("Frame at {} ms has no usable eye sample: {}", timestamp_ms, e);
        }

        Self {
            timestamp_ms,
            face_detected: true,
            left_ear: readings.left.ok(),
            right_ear: readings.right.ok(),
            avg_ear: readings.average(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: FrameObservation,
    pub blink: Option<BlinkEvent>,
    pub stats: BlinkStats,
    /// In order: blink, low-rate reminder, stats.
    pub signals: Vec<EngineSignal>,
}

/// Blink detection and reminder engine. One instance per session, stepped once per frame.
#[derive(Debug)]
pub struct BlinkEngine {
    settings: SettingsManager,
    detector: BlinkStateMachine,
    rate: RateTracker,
    reminder: ReminderPolicy,
    total_blinks: u64,
}

impl BlinkEngine {
    pub fn new(initial: ActiveSettings) -> Self {
        Self {
            settings: SettingsManager::new(initial),
            detector: BlinkStateMachine::new(),
            rate: RateTracker::new(),
            reminder: ReminderPolicy::new(),
            total_blinks: 0,
        }
    }

    /// Handle for other threads to queue settings updates and read the active snapshot.
    pub fn settings_handle(&self) -> SettingsHandle {
        self.settings.handle()
    }

    pub fn active_settings(&self) -> &ActiveSettings {
        self.settings.active()
    }

    /// Swaps settings immediately. Counters and the blink window are kept.
    pub fn apply_settings(
        &mut self,
        update: SettingsUpdate,
    ) -> Result<ActiveSettings, SettingsError> {
        self.settings.apply(update)
    }

    pub fn total_blinks(&self) -> u64 {
        self.total_blinks
    }

    pub fn step(&mut self, frame: &FaceFrame, now_ms: u64) -> StepOutcome {
        // Queued updates land here, before anything of this frame is read.
        self.settings.drain_pending();
        let settings = *self.settings.settings();

        let observation = FrameObservation::from_frame(frame, now_ms);
        let mut signals = Vec::with_capacity(3);

        let blink = self
            .detector
            .update(observation.avg_ear, now_ms, &settings);
        if let Some(event) = blink {
            self.total_blinks += 1;
            self.rate.record_blink(event.timestamp_ms);
            let blinks_per_minute = self.rate.current_rate(now_ms);
            debug!(
                "Blink #{} at {} ms (EAR {:.3}, {} in the last minute)",
                self.total_blinks, event.timestamp_ms, event.ear, blinks_per_minute
            );
            signals.push(EngineSignal::BlinkDetected {
                total_blinks: self.total_blinks,
                blinks_per_minute,
                ear: event.ear,
            });
        }

        let blinks_per_minute = self.rate.current_rate(now_ms);
        let time_since_last_blink_ms = self.rate.time_since_last_blink(now_ms);

        if self
            .reminder
            .evaluate(now_ms, time_since_last_blink_ms, blinks_per_minute, &settings)
        {
            signals.push(EngineSignal::LowBlinkRate { blinks_per_minute });
        }

        let stats = BlinkStats {
            total_blinks: self.total_blinks,
            blinks_per_minute,
            time_since_last_blink_ms,
            ear: observation.avg_ear,
        };
        signals.push(EngineSignal::StatsUpdate(stats));

        StepOutcome {
            observation,
            blink,
            stats,
            signals,
        }
    }
}

impl Default for BlinkEngine {
    fn default() -> Self {
        Self::new(ActiveSettings::default())
    }
}
