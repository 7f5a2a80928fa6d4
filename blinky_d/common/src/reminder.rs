use log::info;

use crate::Settings;

/// Cooldown-gated low-blink-rate decision.
///
/// The cooldown is the only de-duplication: once it expires the policy fires
/// again if the condition still holds.
#[derive(Debug, Clone, Default)]
pub struct ReminderPolicy {
    last_reminder_at_ms: Option<u64>,
}

impl ReminderPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_reminder_at_ms(&self) -> Option<u64> {
        self.last_reminder_at_ms
    }

    /// Returns true when a reminder fires at `now_ms`.
    pub fn evaluate(
        &mut self,
        now_ms: u64,
        time_since_last_blink_ms: Option<u64>,
        blinks_per_minute: u32,
        settings: &Settings,
    ) -> bool {
        let overdue =
            time_since_last_blink_ms.map_or(true, |t| t > settings.time_since_last_blink_ms);
        let slow = blinks_per_minute < settings.min_blinks_per_minute;
        let cooled_down = self
            .last_reminder_at_ms
            .map_or(true, |last| now_ms.saturating_sub(last) > settings.reminder_cooldown_ms);

        if overdue && slow && cooled_down {
            info!(
                "Low blink rate: {} blinks/min, last blink {:?} ms ago",
                blinks_per_minute, time_since_last_blink_ms
            );
            self.last_reminder_at_ms = Some(now_ms);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReminderMode;

    #[test]
    fn cooldown_gates_continuous_trigger() {
        let settings = Settings::for_mode(ReminderMode::Strict);
        let mut policy = ReminderPolicy::new();

        let fired: Vec<u64> = (0..=45_000u64)
            .step_by(1_000)
            .filter(|&now| policy.evaluate(now, None, 0, &settings))
            .collect();

        assert_eq!(fired, vec![0, 21_000, 42_000]);
    }

    #[test]
    fn recent_blink_suppresses() {
        let settings = Settings::for_mode(ReminderMode::Balanced);
        let mut policy = ReminderPolicy::new();
        assert!(!policy.evaluate(10_000, Some(8_000), 0, &settings));
        assert!(policy.evaluate(10_000, Some(8_001), 0, &settings));
    }

    #[test]
    fn healthy_rate_suppresses() {
        let settings = Settings::for_mode(ReminderMode::Gentle);
        let mut policy = ReminderPolicy::new();
        assert!(!policy.evaluate(0, None, 7, &settings));
        assert!(policy.evaluate(0, None, 6, &settings));
        assert_eq!(policy.last_reminder_at_ms(), Some(0));
    }
}
