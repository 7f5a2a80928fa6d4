use api::{FaceFrame, LogLevel};
use blinky_d::control::DetectionStatus;
use blinky_d::dispatcher::Dispatcher;
use blinky_d::providers::{self, LoadedProvider, ReplayProvider};
use blinky_d::strategies::{generic_udp::GenericUdpStrategy, SinkBackend};
use common::{ProviderConfig, ProviderRuntime};
use std::ffi::c_char;
use std::net::UdpSocket;
use std::sync::RwLock;
use std::time::Duration;

extern "C" fn quiet_log(_level: LogLevel, _target: *const c_char, _message: *const c_char) {}

fn udp_dispatcher() -> (UdpSocket, Dispatcher) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_millis(500)))
        .unwrap();
    let addr = socket.local_addr().unwrap().to_string();
    let mut dispatcher = Dispatcher::new(
        SinkBackend::Generic(GenericUdpStrategy::new(addr)),
        false,
    );
    dispatcher.initialize().unwrap();
    (socket, dispatcher)
}

fn recv_json(socket: &UdpSocket) -> Option<serde_json::Value> {
    let mut buf = [0u8; 4096];
    let (amt, _) = socket.recv_from(&mut buf).ok()?;
    serde_json::from_slice(&buf[..amt]).ok()
}

#[test]
fn test_replay_running_dry_reports_unavailable_once() {
    let (socket, dispatcher) = udp_dispatcher();
    let status = RwLock::new(DetectionStatus::default());

    let mut replay = ReplayProvider::from_frames(vec![FaceFrame::no_face()], false);
    api::LandmarkProvider::initialize(
        &mut replay,
        api::ProviderLogger::new(quiet_log, "replay".to_string()),
    )
    .unwrap();
    let mut slot = Some(LoadedProvider {
        name: "replay".to_string(),
        provider: Box::new(replay),
    });

    assert_eq!(
        providers::poll_frame(&mut slot, &status, &dispatcher),
        Some(FaceFrame::no_face())
    );
    assert!(status.read().unwrap().detection_available);

    assert_eq!(providers::poll_frame(&mut slot, &status, &dispatcher), None);
    assert!(slot.is_none());

    let current = status.read().unwrap().clone();
    assert!(!current.detection_available);
    assert!(current
        .reason
        .as_deref()
        .is_some_and(|r| r.contains("Replay finished")));

    let json = recv_json(&socket).expect("no unavailable datagram");
    assert_eq!(json["type"], "DETECTION_UNAVAILABLE");
    assert!(json["reason"].as_str().unwrap().contains("replay"));

    // Stopped providers stay stopped and are not reported again.
    assert_eq!(providers::poll_frame(&mut slot, &status, &dispatcher), None);
    assert!(recv_json(&socket).is_none());
}

#[test]
fn test_failed_start_reports_unavailable() {
    let (socket, dispatcher) = udp_dispatcher();
    let status = RwLock::new(DetectionStatus::default());
    let config = ProviderConfig {
        runtime: ProviderRuntime::Replay,
        replay_path: "does/not/exist.jsonl".to_string(),
        ..ProviderConfig::default()
    };

    let loaded = providers::start_provider(&config, quiet_log, &status, &dispatcher);
    assert!(loaded.is_none());

    let current = status.read().unwrap().clone();
    assert!(!current.detection_available);
    assert!(current
        .reason
        .as_deref()
        .is_some_and(|r| r.contains("failed to start")));

    let json = recv_json(&socket).expect("no unavailable datagram");
    assert_eq!(json["type"], "DETECTION_UNAVAILABLE");
}

#[test]
fn test_replay_start_succeeds_with_frames() {
    let dir = std::env::temp_dir().join("blinky_test_replay_start");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("frames.jsonl");
    std::fs::write(&path, "{\"face_detected\": false}\n").unwrap();

    let (_socket, dispatcher) = udp_dispatcher();
    let status = RwLock::new(DetectionStatus::default());
    let config = ProviderConfig {
        runtime: ProviderRuntime::Replay,
        replay_path: path.to_string_lossy().into_owned(),
        replay_loop: true,
        ..ProviderConfig::default()
    };

    let mut loaded = providers::start_provider(&config, quiet_log, &status, &dispatcher);
    assert!(loaded.is_some());
    assert_eq!(
        providers::poll_frame(&mut loaded, &status, &dispatcher),
        Some(FaceFrame::no_face())
    );
    assert!(status.read().unwrap().detection_available);

    let _ = std::fs::remove_dir_all(&dir);
}
