use anyhow::Result;
use common::{EngineSignal, SignalSink};
use log::{debug, error, info, warn};

/// Writes signals to the log. The default when nothing listens on the network.
#[derive(Debug, Default)]
pub struct LogStrategy;

impl LogStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl SignalSink for LogStrategy {
    fn initialize(&mut self) -> Result<()> {
        info!("Signals will be written to the log");
        Ok(())
    }

    fn send(&self, signal: &EngineSignal) -> Result<()> {
        match signal {
            EngineSignal::BlinkDetected {
                total_blinks,
                blinks_per_minute,
                ..
            } => debug!(
                "Blink detected (total {}, {} blinks/min)",
                total_blinks, blinks_per_minute
            ),
            EngineSignal::LowBlinkRate { blinks_per_minute } => warn!(
                "Time to blink! Only {} blinks in the last minute",
                blinks_per_minute
            ),
            EngineSignal::StatsUpdate(stats) => debug!("Stats: {:?}", stats),
            EngineSignal::BreakStarted { break_secs } => info!(
                "Time for a break: look at something 20 feet away for {} seconds",
                break_secs
            ),
            EngineSignal::BreakFinished => info!("Break over. Ready for the next session."),
            EngineSignal::DetectionUnavailable { reason } => {
                error!("Blink detection unavailable: {}", reason)
            }
        }
        Ok(())
    }
}
