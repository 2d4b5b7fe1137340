// End-to-end: bytes in, duties out

use std::time::Duration;

use rover_link::config::RuntimeConfig;
use rover_link::link::MemoryLink;
use rover_link::motor::RecordingMotors;
use rover_link::protocol::{encode_axis, encode_button, encode_emergency_stop};
use rover_link::{AxisId, ButtonId, LinkHealth, MotorCommand, Runtime};

fn fast_config() -> RuntimeConfig {
    RuntimeConfig {
        loop_hz: 1000,
        bytes_per_tick: 64,
        ..RuntimeConfig::default()
    }
}

// LeftY 0.5 goes over the wire as 16384 and comes back a hair above 0.5
fn half_forward() -> MotorCommand {
    let speed = (f64::from(16384.0f32 / 32767.0) * 65535.0) as u16;
    MotorCommand::new(speed, 0, speed, 0)
}

fn session() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&[0x55, 0x00, 0x13]); // line noise before the first frame
    bytes.extend_from_slice(&encode_axis(AxisId::LeftTrigger, 1.0));
    bytes.extend_from_slice(&encode_axis(AxisId::RightTrigger, -1.0));
    bytes.extend_from_slice(&encode_axis(AxisId::LeftY, 0.5));
    bytes.extend_from_slice(&encode_button(ButtonId::SELECT, true));
    bytes
}

#[test]
fn test_drive_then_emergency_stop() {
    let mut bytes = session();
    bytes.extend_from_slice(&encode_emergency_stop());

    let mut rt = Runtime::new(fast_config(), MemoryLink::from(&bytes[..]), RecordingMotors::new())
        .unwrap();
    rt.poll();

    let commands = &rt.motors().commands;
    assert!(commands.contains(&half_forward()));
    assert_eq!(commands.last(), Some(&MotorCommand::STOP));

    // The stop leaves the controller state alone
    assert!((rt.state().axes.get(AxisId::LeftY) - 0.5).abs() < 1.0 / 32767.0);
    assert!(rt.state().buttons.is_pressed(ButtonId::SELECT));
    assert_eq!(rt.stats().accepted, 5);
    assert_eq!(rt.health(), LinkHealth::Ok);
}

#[test]
fn test_corrupted_frame_changes_nothing() {
    let mut frame = encode_axis(AxisId::LeftY, 1.0);
    frame[3] ^= 0x04;

    let mut rt = Runtime::new(fast_config(), MemoryLink::from(&frame[..]), RecordingMotors::new())
        .unwrap();
    rt.poll();

    assert_eq!(rt.state().axes.get(AxisId::LeftY), 0.0);
    assert_eq!(rt.stats().corrupted, 1);
    assert_eq!(rt.motors().commands, vec![MotorCommand::STOP]);
}

#[tokio::test]
async fn test_run_until_stops_motors_on_shutdown() {
    let link = MemoryLink::from(&session()[..]);
    let rt = Runtime::new(fast_config(), link, RecordingMotors::new()).unwrap();

    let motors = rt
        .run_until(tokio::time::sleep(Duration::from_millis(50)))
        .await
        .unwrap();

    assert!(motors.commands.contains(&half_forward()));
    assert_eq!(motors.last(), Some(MotorCommand::STOP));
}
