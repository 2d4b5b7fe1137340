// Keyboard teleop over the serial link: W/S drive, A/D spin, Q/E gentle turn,
// R/F throttle, Space emergency stop, Esc quit
//
// Usage: cargo run --example keyboard_teleop -- [port]

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use serialport::SerialPort;
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::info;

use rover_link::config::{DEFAULT_BAUDRATE, DEFAULT_PORT};
use rover_link::messages::{AXIS_COUNT, AxisId, ButtonId};
use rover_link::protocol::{encode_axis, encode_button, encode_emergency_stop};

// Trigger positions in [-1, 1]; -1 released, 1 fully pulled
const THROTTLE: [f32; 3] = [-0.5, 0.0, 1.0];
const INPUT_TIMEOUT_MS: u64 = 100; // Recenter sticks after this much time with no input
const RESEND_THRESHOLD: f32 = 0.1; // Send an axis only when it moved this much

type BoxResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

fn main() -> BoxResult<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let port_name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PORT.to_string());

    info!("Opening {}...", port_name);
    let mut port = serialport::new(&port_name, DEFAULT_BAUDRATE)
        .timeout(Duration::from_millis(100))
        .open()?;

    info!("Controls: W/S drive, A/D spin, Q/E turn, R/F throttle, Space stop, Esc quit");

    enable_raw_mode()?;
    let result = run_teleop(port.as_mut());
    disable_raw_mode()?;

    // Leave the base stopped whatever happened above
    port.write_all(&encode_emergency_stop())?;
    result
}

fn run_teleop(port: &mut dyn SerialPort) -> BoxResult<()> {
    let mut throttle_idx: usize = 0;
    let mut axes = [0.0f32; AXIS_COUNT];
    // Force the first pass to send everything
    let mut sent = [f32::NAN; AXIS_COUNT];
    let mut last_stick_input = Instant::now();

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                let mut stick = |axis: AxisId, value: f32| {
                    axes[axis.index()] = value;
                    last_stick_input = Instant::now();
                };

                match code {
                    KeyCode::Char('w') if pressed => stick(AxisId::LeftY, 1.0),
                    KeyCode::Char('s') if pressed => stick(AxisId::LeftY, -1.0),
                    KeyCode::Char('d') if pressed => stick(AxisId::LeftX, 1.0),
                    KeyCode::Char('a') if pressed => stick(AxisId::LeftX, -1.0),
                    KeyCode::Char('e') if pressed => stick(AxisId::RightX, 1.0),
                    KeyCode::Char('q') if pressed => stick(AxisId::RightX, -1.0),

                    KeyCode::Char('r') if pressed => {
                        throttle_idx = (throttle_idx + 1).min(THROTTLE.len() - 1);
                        info!("Throttle: {}", throttle_idx);
                    }
                    KeyCode::Char('f') if pressed => {
                        throttle_idx = throttle_idx.saturating_sub(1);
                        info!("Throttle: {}", throttle_idx);
                    }

                    KeyCode::Char(' ') if pressed => {
                        port.write_all(&encode_button(ButtonId::SELECT, true))?;
                        port.write_all(&encode_emergency_stop())?;
                        port.write_all(&encode_button(ButtonId::SELECT, false))?;
                        info!("Emergency stop sent");
                    }

                    KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        if last_stick_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            for axis in [AxisId::LeftX, AxisId::LeftY, AxisId::RightX] {
                axes[axis.index()] = 0.0;
            }
        }
        axes[AxisId::LeftTrigger.index()] = THROTTLE[throttle_idx];
        axes[AxisId::RightTrigger.index()] = -1.0;

        for axis in AxisId::ALL {
            let value = axes[axis.index()];
            let last = sent[axis.index()];
            if last.is_nan() || (value - last).abs() > RESEND_THRESHOLD {
                port.write_all(&encode_axis(axis, value))?;
                sent[axis.index()] = value;
            }
        }
        port.flush()?;
    }

    Ok(())
}
