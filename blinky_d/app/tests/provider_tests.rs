use api::{FaceFrame, LandmarkProvider, LogLevel, ProviderLogger};
use blinky_d::providers::replay::{parse_frames, ReplayProvider};
use blinky_d::providers::UdpProvider;
use glam::Vec3;
use std::ffi::c_char;
use std::io::Cursor;
use std::net::UdpSocket;
use std::thread;
use std::time::Duration;

extern "C" fn quiet_log(_level: LogLevel, _target: *const c_char, _message: *const c_char) {}

fn logger() -> ProviderLogger {
    ProviderLogger::new(quiet_log, "test".to_string())
}

#[test]
fn test_parse_frames_skips_comments_and_blank_lines() {
    let input = "# recorded session\n\n{\"face_detected\": false}\n{\"face_detected\": true, \"landmarks\": [[0.1, 0.2, 0.0]]}\n";
    let frames = parse_frames(Cursor::new(input)).unwrap();

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], FaceFrame::no_face());
    assert!(frames[1].face_detected);
    assert_eq!(frames[1].landmarks, vec![Vec3::new(0.1, 0.2, 0.0)]);
}

#[test]
fn test_parse_frames_reports_bad_line() {
    let input = "{\"face_detected\": false}\nnot json\n";
    let err = parse_frames(Cursor::new(input)).unwrap_err();
    assert!(format!("{:#}", err).contains("line 2"));
}

#[test]
fn test_replay_without_loop_fails_at_end() {
    let mut provider = ReplayProvider::from_frames(vec![FaceFrame::no_face()], false);
    provider.initialize(logger()).unwrap();

    assert_eq!(provider.next_frame().unwrap(), Some(FaceFrame::no_face()));
    assert!(provider.next_frame().is_err());
}

#[test]
fn test_replay_loop_wraps_around() {
    let frames = vec![
        FaceFrame::no_face(),
        FaceFrame::detected(vec![Vec3::ZERO]),
    ];
    let mut provider = ReplayProvider::from_frames(frames.clone(), true);
    provider.initialize(logger()).unwrap();

    for i in 0..5 {
        let frame = provider.next_frame().unwrap().unwrap();
        assert_eq!(frame, frames[i % 2]);
    }
}

#[test]
fn test_replay_missing_file_fails_initialize() {
    let mut provider = ReplayProvider::new("does/not/exist.jsonl".into(), true);
    assert!(provider.initialize(logger()).is_err());
}

#[test]
fn test_udp_provider_keeps_newest_frame() {
    let mut provider = UdpProvider::new(0);
    provider.initialize(logger()).unwrap();
    let port = provider.local_port().unwrap();

    assert_eq!(provider.next_frame().unwrap(), None);

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    let target = format!("127.0.0.1:{}", port);
    sender.send_to(b"{\"face_detected\": false}", &target).unwrap();
    sender.send_to(b"garbage", &target).unwrap();
    sender
        .send_to(
            b"{\"face_detected\": true, \"landmarks\": [[0.5, 0.5, 0.0]]}",
            &target,
        )
        .unwrap();

    let mut frame = None;
    for _ in 0..50 {
        thread::sleep(Duration::from_millis(10));
        if let Some(f) = provider.next_frame().unwrap() {
            frame = Some(f);
            if frame.as_ref().is_some_and(|f| f.face_detected) {
                break;
            }
        }
    }

    let frame = frame.expect("no frame received");
    assert!(frame.face_detected);
    assert_eq!(frame.landmarks, vec![Vec3::new(0.5, 0.5, 0.0)]);
}
