use serde::{Deserialize, Serialize};

use crate::Settings;

/// A completed blink, stamped at the frame the eyes reopened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinkEvent {
    pub timestamp_ms: u64,
    pub ear: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlinkPhase {
    #[default]
    Open,
    /// Eyes below threshold, debounce not yet satisfied.
    Closing { closed_frames: u32 },
    /// Debounce satisfied; the blink commits on the next open frame.
    BlinkInProgress { closed_frames: u32 },
}

impl BlinkPhase {
    pub fn closed_frames(&self) -> u32 {
        match *self {
            Self::Open => 0,
            Self::Closing { closed_frames } | Self::BlinkInProgress { closed_frames } => {
                closed_frames
            }
        }
    }
}

/// Debounces the per-frame EAR stream into discrete blinks.
#[derive(Debug, Clone, Default)]
pub struct BlinkStateMachine {
    phase: BlinkPhase,
}

impl BlinkStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    /// Feeds one frame. `None` (no face, unreadable eyes) holds the current phase.
    pub fn update(
        &mut self,
        avg_ear: Option<f32>,
        timestamp_ms: u64,
        settings: &Settings,
    ) -> Option<BlinkEvent> {
        let ear = avg_ear?;
        let required = settings.consecutive_frames.max(1);

        if ear < settings.ear_threshold {
            let closed_frames = self.phase.closed_frames().saturating_add(1);
            self.phase = if closed_frames >= required {
                BlinkPhase::BlinkInProgress { closed_frames }
            } else {
                BlinkPhase::Closing { closed_frames }
            };
            return None;
        }

        let closed_frames = self.phase.closed_frames();
        self.phase = BlinkPhase::Open;
        // Re-checked against `required` because a settings swap may have lowered it
        // while the eyes were closed.
        (closed_frames >= required).then_some(BlinkEvent { timestamp_ms, ear })
    }
}
