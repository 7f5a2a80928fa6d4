use anyhow::{Context, Result};
use common::{EngineSignal, SignalSink};
use log::{info, warn};
use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sends each signal as one JSON datagram to a listener such as `blinky_udp_rcv`.
///
/// The listener is optional. While nobody is there (refused) or the socket buffer
/// is full, signals are dropped and counted; the frame loop keeps running.
pub struct GenericUdpStrategy {
    socket: Option<UdpSocket>,
    target: String,
    dropped: AtomicU64,
}

impl GenericUdpStrategy {
    pub fn new(target: String) -> Self {
        Self {
            socket: None,
            target,
            dropped: AtomicU64::new(0),
        }
    }

    /// Signals lost because no listener was reachable.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn note_dropped(&self, signal: &EngineSignal, kind: ErrorKind) {
        let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        if dropped == 1 || dropped.is_multiple_of(100) {
            warn!(
                "No signal listener on {} ({:?}); dropped {} ({} so far)",
                self.target,
                kind,
                signal.kind(),
                dropped
            );
        }
    }
}

impl SignalSink for GenericUdpStrategy {
    fn initialize(&mut self) -> Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind UDP socket")?;
        socket
            .connect(&self.target)
            .with_context(|| format!("Failed to connect to {}", self.target))?;
        socket
            .set_nonblocking(true)
            .context("Failed to set non-blocking mode")?;

        self.socket = Some(socket);
        info!("Sending signals as JSON datagrams to {}", self.target);
        Ok(())
    }

    fn send(&self, signal: &EngineSignal) -> Result<()> {
        let Some(socket) = &self.socket else {
            anyhow::bail!("UDP sink used before initialize");
        };
        let payload = serde_json::to_vec(signal).context("Failed to encode signal")?;

        match socket.send(&payload) {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::ConnectionRefused) => {
                self.note_dropped(signal, e.kind());
                Ok(())
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to send {} to {}", signal.kind(), self.target)),
        }
    }
}
