use log::info;
use serde::{Deserialize, Serialize};

use crate::EngineSignal;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BreakTimerConfig {
    pub enabled: bool,
    pub work_secs: u64,
    pub break_secs: u64,
    /// Start the next work period as soon as a break ends instead of waiting in `Ready`.
    pub auto_continue: bool,
}

impl Default for BreakTimerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            work_secs: 20 * 60,
            break_secs: 20,
            auto_continue: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakPhase {
    Working { until_ms: u64 },
    OnBreak { until_ms: u64 },
    Ready,
}

/// 20-20-20 countdown: work, look away, repeat.
#[derive(Debug, Clone)]
pub struct BreakTimer {
    config: BreakTimerConfig,
    phase: Option<BreakPhase>,
}

impl BreakTimer {
    pub fn new(config: BreakTimerConfig) -> Self {
        Self {
            config,
            phase: None,
        }
    }

    pub fn phase(&self) -> Option<BreakPhase> {
        self.phase
    }

    pub fn start(&mut self, now_ms: u64) {
        self.phase = Some(self.working(now_ms));
    }

    /// Seconds left in the current work period or break.
    pub fn remaining_secs(&self, now_ms: u64) -> Option<u64> {
        match self.phase? {
            BreakPhase::Working { until_ms } | BreakPhase::OnBreak { until_ms } => {
                Some(until_ms.saturating_sub(now_ms).div_ceil(1_000))
            }
            BreakPhase::Ready => None,
        }
    }

    /// Starts a new work period after a break. Ignored in any other phase.
    pub fn continue_session(&mut self, now_ms: u64) -> bool {
        if self.phase != Some(BreakPhase::Ready) {
            return false;
        }
        info!("Starting next work session");
        self.start(now_ms);
        true
    }

    pub fn tick(&mut self, now_ms: u64) -> Option<EngineSignal> {
        if !self.config.enabled {
            return None;
        }

        match self.phase {
            None => {
                self.start(now_ms);
                None
            }
            Some(BreakPhase::Working { until_ms }) if now_ms >= until_ms => {
                info!("Break time: look away for {}s", self.config.break_secs);
                self.phase = Some(BreakPhase::OnBreak {
                    until_ms: now_ms + self.config.break_secs * 1_000,
                });
                Some(EngineSignal::BreakStarted {
                    break_secs: self.config.break_secs,
                })
            }
            Some(BreakPhase::OnBreak { until_ms }) if now_ms >= until_ms => {
                self.phase = Some(if self.config.auto_continue {
                    self.working(now_ms)
                } else {
                    BreakPhase::Ready
                });
                Some(EngineSignal::BreakFinished)
            }
            _ => None,
        }
    }

    fn working(&self, now_ms: u64) -> BreakPhase {
        BreakPhase::Working {
            until_ms: now_ms + self.config.work_secs * 1_000,
        }
    }
}
