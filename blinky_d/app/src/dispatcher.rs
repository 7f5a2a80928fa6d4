use crate::control::DetectionStatus;
use crate::strategies::SinkBackend;
use anyhow::Result;
use common::{EngineSignal, SignalSink};
use log::error;
use std::sync::RwLock;

pub struct Dispatcher {
    backend: SinkBackend,
    emit_stats: bool,
}

impl Dispatcher {
    pub fn new(backend: SinkBackend, emit_stats: bool) -> Self {
        Self {
            backend,
            emit_stats,
        }
    }

    pub fn initialize(&mut self) -> Result<()> {
        self.backend.initialize()
    }

    pub fn wants(&self, signal: &EngineSignal) -> bool {
        self.emit_stats || !matches!(signal, EngineSignal::StatsUpdate(_))
    }

    pub fn send(&self, signal: &EngineSignal) -> Result<()> {
        if !self.wants(signal) {
            return Ok(());
        }
        self.backend.send(signal)
    }

    pub fn send_all(&self, signals: &[EngineSignal]) -> Result<()> {
        for signal in signals {
            self.send(signal)?;
        }
        Ok(())
    }

    /// Pipeline-fatal failure: publish it on the status endpoint and tell the sinks.
    pub fn report_unavailable(&self, reason: String, status: &RwLock<DetectionStatus>) {
        error!("Blink detection unavailable: {}", reason);
        if let Ok(mut st) = status.write() {
            st.detection_available = false;
            st.reason = Some(reason.clone());
        }
        if let Err(e) = self.send(&EngineSignal::DetectionUnavailable { reason }) {
            error!("Failed to send unavailable signal: {}", e);
        }
    }
}
