pub mod generic_udp;
pub mod log_sink;

use anyhow::Result;
use common::{BlinkyConfig, EngineSignal, OutputMode, SignalSink};
use generic_udp::GenericUdpStrategy;
use log_sink::LogStrategy;

pub enum SinkBackend {
    Log(LogStrategy),
    Generic(GenericUdpStrategy),
}

impl SignalSink for SinkBackend {
    fn initialize(&mut self) -> Result<()> {
        match self {
            Self::Log(s) => s.initialize(),
            Self::Generic(s) => s.initialize(),
        }
    }

    fn send(&self, signal: &EngineSignal) -> Result<()> {
        match self {
            Self::Log(s) => s.send(signal),
            Self::Generic(s) => s.send(signal),
        }
    }
}

pub fn create_strategy(config: &BlinkyConfig) -> SinkBackend {
    match config.output.mode {
        OutputMode::Log => SinkBackend::Log(LogStrategy::new()),
        OutputMode::Udp => SinkBackend::Generic(GenericUdpStrategy::new(format!(
            "{}:{}",
            config.output.send_address, config.output.send_port
        ))),
    }
}
