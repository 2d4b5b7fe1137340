// Frame dump: decode a hex capture of the controller link, one JSON line per frame
//
// This tool only reads - nothing is sent to the link or the motors.
//
// Usage: echo "AA 00 01 40 00 EB 55" | cargo run --example frame_dump

use serde::Serialize;
use std::io::{self, BufRead, Write};

use rover_link::messages::Packet;
use rover_link::protocol::FrameDecoder;

#[derive(Serialize)]
#[serde(rename_all = "snake_case", tag = "result")]
enum Line {
    Packet { offset: usize, packet: Packet },
    Dropped { offset: usize, reason: String },
}

fn parse_hex(line: &str) -> Result<Vec<u8>, std::num::ParseIntError> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| u8::from_str_radix(s.trim_start_matches("0x"), 16))
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let mut decoder = FrameDecoder::new();
    let mut offset = 0;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in io::stdin().lock().lines() {
        let bytes = parse_hex(&line?)?;
        for byte in bytes {
            if let Some(result) = decoder.feed(byte) {
                let entry = match result {
                    Ok(packet) => Line::Packet { offset, packet },
                    Err(e) => Line::Dropped {
                        offset,
                        reason: e.to_string(),
                    },
                };
                writeln!(out, "{}", serde_json::to_string(&entry)?)?;
            }
            offset += 1;
        }
    }

    if decoder.overflows() > 0 {
        eprintln!("{} oversized frame(s) discarded", decoder.overflows());
    }
    Ok(())
}
