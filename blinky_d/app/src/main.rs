use anyhow::Result;
use api::LogLevel;
use blinky_d::control::{self, ControlHost, ControlState, DetectionStatus};
use blinky_d::dispatcher::Dispatcher;
use blinky_d::providers;
use blinky_d::strategies;
use common::state_store::StateStore;
use common::{ActiveSettings, BlinkEngine, BlinkyConfig, BreakTimer};
use log::{debug, error, info, trace, warn};
use std::ffi::c_char;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

extern "C" fn provider_log_callback(level: LogLevel, target: *const c_char, message: *const c_char) {
    unsafe {
        let target_str = std::ffi::CStr::from_ptr(target)
            .to_str()
            .unwrap_or("unknown");
        let message_str = std::ffi::CStr::from_ptr(message).to_str().unwrap_or("");

        match level {
            LogLevel::Error => error!(target: target_str, "{}", message_str),
            LogLevel::Warn => warn!(target: target_str, "{}", message_str),
            LogLevel::Info => info!(target: target_str, "{}", message_str),
            LogLevel::Debug => debug!(target: target_str, "{}", message_str),
            LogLevel::Trace => trace!(target: target_str, "{}", message_str),
        }
    }
}

fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    info!("Starting...");
    debug!("Debug logging is active");
    trace!("Trace logging is active");

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        info!("Received Ctrl-C, shutting down...");
        r.store(false, Ordering::SeqCst);
    })?;

    let config_path = Path::new("config.json");
    let config = BlinkyConfig::load_or_create(config_path).unwrap_or_else(|e| {
        error!("Failed to load config: {:#}. Using defaults.", e);
        BlinkyConfig::default()
    });
    info!("Loaded Config: {:?}", config);

    let mut store = StateStore::new(PathBuf::from(&config.state_path));
    if let Err(e) = store.load() {
        error!("Failed to load persisted state: {:#}", e);
    }

    let initial = config
        .initial_settings(store.state.reminder_mode)
        .unwrap_or_else(|e| {
            error!("Invalid thresholds in config: {}. Using {} mode.", e, config.mode);
            ActiveSettings::for_mode(config.mode)
        });
    info!("Active settings: {:?}", initial);

    let mut engine = BlinkEngine::new(initial);
    let mut persisted_mode = initial.mode;
    store.set_mode(persisted_mode);

    let shared_stats = Arc::new(RwLock::new(store.state.stats));
    let status = Arc::new(RwLock::new(DetectionStatus::default()));
    let continue_request = Arc::new(AtomicBool::new(false));

    let mut dispatcher = Dispatcher::new(
        strategies::create_strategy(&config),
        config.output.emit_stats,
    );
    if let Err(e) = dispatcher.initialize() {
        error!("Failed to initialize signal output: {}", e);
        return Err(e);
    }
    info!("Signal output initialized with {:?} sink.", config.output.mode);

    let control_state = ControlState {
        settings: engine.settings_handle(),
        stats: shared_stats.clone(),
        status: status.clone(),
        continue_request: continue_request.clone(),
    };
    let http_port = config.http_port;
    thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to create Tokio runtime: {}", e);
                return;
            }
        };
        rt.block_on(async {
            let router = control::get_router(control_state);
            if let Err(e) = ControlHost::start(http_port, router).await {
                error!("Control host failed: {}", e);
            }
        });
    });

    let mut loaded =
        providers::start_provider(&config.provider, provider_log_callback, &status, &dispatcher);

    let mut break_timer = BreakTimer::new(config.break_timer.clone());

    info!("Entering Main Loop...");

    let session_start = Instant::now();
    let flush_interval = Duration::from_secs(config.state_flush_secs);
    let mut last_flush = Instant::now();
    let mut frame_count: u64 = 0;
    let mut log_interval: u64 = 1000;
    let mut last_log = Instant::now();
    let mut last_frame_time = Instant::now();
    let mut last_idle_warn: Option<Instant> = None;
    let target_frame_duration = config
        .max_fps
        .filter(|fps| *fps > 0.0)
        .map(|fps| Duration::from_secs_f32(1.0 / fps));

    while running.load(Ordering::SeqCst) {
        let now_ms = session_start.elapsed().as_millis() as u64;

        if continue_request.swap(false, Ordering::SeqCst) && !break_timer.continue_session(now_ms)
        {
            debug!("Continue requested outside of a finished break; ignored");
        }
        if let Some(signal) = break_timer.tick(now_ms) {
            if let Err(e) = dispatcher.send(&signal) {
                error!("Failed to send break signal: {}", e);
            }
        }

        if loaded.is_none() {
            if last_idle_warn.is_none_or(|t| t.elapsed() >= Duration::from_secs(5)) {
                warn!("No landmark provider running; blink detection is paused");
                last_idle_warn = Some(Instant::now());
            }
            thread::sleep(Duration::from_millis(100));
            continue;
        }

        let Some(frame) = providers::poll_frame(&mut loaded, &status, &dispatcher) else {
            if loaded.is_some() {
                thread::sleep(Duration::from_millis(5));
            }
            continue;
        };

        let outcome = engine.step(&frame, now_ms);
        #[cfg(feature = "xtralog")]
        trace!("Frame observation: {:?}", outcome.observation);

        if let Err(e) = dispatcher.send_all(&outcome.signals) {
            error!("Failed to send signals: {}", e);
        }
        if let Ok(mut st) = shared_stats.write() {
            *st = Some(outcome.stats);
        }
        store.record_stats(outcome.stats);

        let mode = engine.active_settings().mode;
        if mode != persisted_mode {
            persisted_mode = mode;
            store.set_mode(mode);
            if let Err(e) = store.save() {
                error!("Failed to save reminder mode: {:#}", e);
            }
            last_flush = Instant::now();
        }

        if store.is_dirty() && last_flush.elapsed() >= flush_interval {
            if let Err(e) = store.save() {
                error!("Failed to save stats: {:#}", e);
            }
            last_flush = Instant::now();
        }

        frame_count += 1;
        if frame_count.is_multiple_of(log_interval) {
            let elapsed = last_log.elapsed().as_secs_f32();
            let fps = log_interval as f32 / elapsed;
            info!(
                "Detection Active: Processed {} frames (approx {:.1} FPS), {} blinks",
                frame_count,
                fps,
                engine.total_blinks()
            );
            last_log = Instant::now();

            if frame_count >= 1_000_000 {
                log_interval = 1_000_000;
            } else if frame_count >= 100_000 {
                log_interval = 100_000;
            } else if frame_count >= 10_000 {
                log_interval = 10_000;
            }
        }

        if let Some(target_duration) = target_frame_duration {
            let elapsed = last_frame_time.elapsed();
            if elapsed < target_duration {
                thread::sleep(target_duration - elapsed);
            }
        }
        last_frame_time = Instant::now();
    }

    info!("Shutting down...");
    if let Some(mut p) = loaded.take() {
        p.provider.unload();
    }
    if let Err(e) = store.save() {
        error!("Failed to save state on shutdown: {:#}", e);
    }
    Ok(())
}
