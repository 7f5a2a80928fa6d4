use crate::EngineSignal;

/// Outbound side of the pipeline: whatever shows reminders to the user.
pub trait SignalSink: Send + Sync {
    fn initialize(&mut self) -> anyhow::Result<()>;
    fn send(&self, signal: &EngineSignal) -> anyhow::Result<()>;
}
