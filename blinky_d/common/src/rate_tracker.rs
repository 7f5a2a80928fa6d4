use std::collections::VecDeque;

/// Horizon of the trailing blink window.
pub const RATE_WINDOW_MS: u64 = 60_000;

/// Trailing 60 s window of blink timestamps.
///
/// The rate is the raw number of blinks inside the window, not an
/// extrapolated per-minute figure.
#[derive(Debug, Clone, Default)]
pub struct RateTracker {
    window: VecDeque<u64>,
    last_blink_ms: Option<u64>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_blink(&mut self, timestamp_ms: u64) {
        self.evict(timestamp_ms);
        self.window.push_back(timestamp_ms);
        self.last_blink_ms = Some(
            self.last_blink_ms
                .map_or(timestamp_ms, |t| t.max(timestamp_ms)),
        );
    }

    pub fn current_rate(&mut self, now_ms: u64) -> u32 {
        self.evict(now_ms);
        self.window.len() as u32
    }

    /// `None` means no blink was ever recorded.
    pub fn time_since_last_blink(&self, now_ms: u64) -> Option<u64> {
        self.last_blink_ms.map(|t| now_ms.saturating_sub(t))
    }

    fn evict(&mut self, now_ms: u64) {
        // Timestamps arrive in frame order, so stale entries sit at the front.
        while let Some(&oldest) = self.window.front() {
            if now_ms.saturating_sub(oldest) >= RATE_WINDOW_MS {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }
}
