pub mod native;
pub mod replay;
pub mod udp;

use crate::control::DetectionStatus;
use crate::dispatcher::Dispatcher;
use anyhow::Result;
use api::{FaceFrame, LandmarkProvider, LogCallback, ProviderLogger};
use common::{ProviderConfig, ProviderRuntime};
use log::info;
use std::path::PathBuf;
use std::sync::RwLock;

pub use native::NativeProvider;
pub use replay::ReplayProvider;
pub use udp::UdpProvider;

pub struct LoadedProvider {
    pub name: String,
    pub provider: Box<dyn LandmarkProvider>,
}

/// Builds the configured provider. Failures here mean detection is unavailable.
pub fn create_provider(config: &ProviderConfig) -> Result<LoadedProvider> {
    match config.runtime {
        ProviderRuntime::Replay => Ok(LoadedProvider {
            name: "replay".to_string(),
            provider: Box::new(ReplayProvider::new(
                PathBuf::from(&config.replay_path),
                config.replay_loop,
            )),
        }),
        ProviderRuntime::Udp => Ok(LoadedProvider {
            name: "udp".to_string(),
            provider: Box::new(UdpProvider::new(config.listen_port)),
        }),
        ProviderRuntime::Native => {
            let provider = native::load_active(&config.active)?;
            Ok(LoadedProvider {
                name: config.active.clone(),
                provider: Box::new(provider),
            })
        }
    }
}

/// Creates and initializes the configured provider.
///
/// `None` means detection is unavailable for the rest of the session; the failure
/// has already been reported.
pub fn start_provider(
    config: &ProviderConfig,
    log_callback: LogCallback,
    status: &RwLock<DetectionStatus>,
    dispatcher: &Dispatcher,
) -> Option<LoadedProvider> {
    let mut loaded = match create_provider(config) {
        Ok(p) => p,
        Err(e) => {
            dispatcher.report_unavailable(format!("{:#}", e), status);
            return None;
        }
    };

    let logger = ProviderLogger::new(
        log_callback,
        format!("blinky_d::providers::{}", loaded.name),
    );
    match loaded.provider.initialize(logger) {
        Ok(()) => {
            info!("✓ Initialized provider: {}", loaded.name);
            Some(loaded)
        }
        Err(e) => {
            dispatcher.report_unavailable(
                format!("provider {} failed to start: {:#}", loaded.name, e),
                status,
            );
            None
        }
    }
}

/// Pulls the next frame from the running provider, if any.
///
/// A provider error is fatal: it is reported once, the provider is unloaded and
/// `slot` is emptied so later calls return `None` without touching it.
pub fn poll_frame(
    slot: &mut Option<LoadedProvider>,
    status: &RwLock<DetectionStatus>,
    dispatcher: &Dispatcher,
) -> Option<FaceFrame> {
    let loaded = slot.as_mut()?;
    match loaded.provider.next_frame() {
        Ok(frame) => frame,
        Err(e) => {
            dispatcher.report_unavailable(
                format!("provider {} failed: {:#}", loaded.name, e),
                status,
            );
            loaded.provider.unload();
            *slot = None;
            None
        }
    }
}
