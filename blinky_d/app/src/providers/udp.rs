use anyhow::{Context, Result};
use api::{FaceFrame, LandmarkProvider, ProviderLogger};
use std::io::ErrorKind;
use std::net::UdpSocket;

const MAX_DATAGRAM: usize = 65535;

/// Receives `FaceFrame` JSON datagrams from an external face-mesh process.
pub struct UdpProvider {
    port: u16,
    socket: Option<UdpSocket>,
    buf: Vec<u8>,
    logger: Option<ProviderLogger>,
}

impl UdpProvider {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            socket: None,
            buf: vec![0u8; MAX_DATAGRAM],
            logger: None,
        }
    }

    pub fn local_port(&self) -> Option<u16> {
        self.socket
            .as_ref()
            .and_then(|s| s.local_addr().ok())
            .map(|a| a.port())
    }
}

impl LandmarkProvider for UdpProvider {
    fn initialize(&mut self, logger: ProviderLogger) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let socket =
            UdpSocket::bind(&addr).with_context(|| format!("Failed to bind {}", addr))?;
        socket
            .set_nonblocking(true)
            .context("Failed to set non-blocking mode")?;
        logger.info(&format!("Listening for face frames on {}", addr));
        self.socket = Some(socket);
        self.logger = Some(logger);
        Ok(())
    }

    /// Drains the socket and keeps only the newest frame.
    fn next_frame(&mut self) -> Result<Option<FaceFrame>> {
        let Some(socket) = &self.socket else {
            anyhow::bail!("UDP provider used before initialize");
        };

        let mut latest = None;
        loop {
            match socket.recv_from(&mut self.buf) {
                Ok((amt, src)) => match serde_json::from_slice::<FaceFrame>(&self.buf[..amt]) {
                    Ok(frame) => latest = Some(frame),
                    Err(e) => {
                        if let Some(logger) = &self.logger {
                            logger.warn(&format!("Dropping bad frame from {}: {}", src, e));
                        }
                    }
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => return Err(e).context("UDP receive failed"),
            }
        }
        Ok(latest)
    }

    fn unload(&mut self) {
        self.socket = None;
    }
}
