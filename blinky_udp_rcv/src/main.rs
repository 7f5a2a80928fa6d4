use anyhow::Result;
use api::EngineSignal;
use log::debug;
use std::net::UdpSocket;

fn main() -> Result<()> {
    env_logger::init();

    let port = std::env::args()
        .nth(1)
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(9101);
    let addr = format!("0.0.0.0:{}", port);
    let socket = UdpSocket::bind(&addr)?;

    println!("Listening for blink signals on {}...", addr);

    let mut buf = [0u8; 65535]; // Max UDP size

    loop {
        match socket.recv_from(&mut buf) {
            Ok((amt, src)) => {
                let slice = &buf[..amt];
                debug!("Received {} bytes from {}", amt, src);

                match serde_json::from_slice::<EngineSignal>(slice) {
                    Ok(EngineSignal::StatsUpdate(stats)) => {
                        println!(
                            "[{}] stats: {} blinks, {}/min, last {:?} ms ago",
                            src,
                            stats.total_blinks,
                            stats.blinks_per_minute,
                            stats.time_since_last_blink_ms
                        );
                    }
                    Ok(signal) => {
                        println!("[{}] {}: {:?}", src, signal.kind(), signal);
                    }
                    Err(e) => {
                        eprintln!("Failed to deserialize packet from {}: {}", src, e);
                        if let Ok(s) = std::str::from_utf8(slice) {
                            eprintln!("Raw data: {}", s);
                        }
                    }
                }
            }
            Err(e) => {
                eprintln!("Error receiving data: {}", e);
            }
        }
    }
}
