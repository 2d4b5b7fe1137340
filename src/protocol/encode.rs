// Sender-side frame construction, the mirror of the decoder

use super::{AXIS_SCALE, PacketType, START, STOP};
use crate::messages::{AxisId, ButtonId, Packet};

/// XOR of every byte
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |acc, &b| acc ^ b)
}

/// Close a payload with its checksum and STOP
fn seal<const N: usize, const M: usize>(payload: [u8; N]) -> [u8; M] {
    debug_assert_eq!(N + 2, M);
    let mut frame = [0u8; M];
    frame[..N].copy_from_slice(&payload);
    frame[N] = checksum(&payload);
    frame[N + 1] = STOP;
    frame
}

/// Axis frame: [START, 0x00, id, value_hi, value_lo, checksum, STOP]
pub fn encode_axis(axis: AxisId, value: f32) -> [u8; 7] {
    let raw = (value.clamp(-1.0, 1.0) * AXIS_SCALE).round() as i16;
    let [hi, lo] = raw.to_be_bytes();
    seal([START, PacketType::Axis as u8, axis as u8, hi, lo])
}

/// Button frame: [START, 0x01, id, state, checksum, STOP]
pub fn encode_button(button: ButtonId, pressed: bool) -> [u8; 6] {
    seal([START, PacketType::Button as u8, button.get(), pressed as u8])
}

/// Emergency stop frame: [START, 0x02, 0x00, checksum, STOP]
pub fn encode_emergency_stop() -> [u8; 5] {
    seal([START, PacketType::EmergencyStop as u8, 0x00])
}

pub fn encode(packet: &Packet) -> Vec<u8> {
    match *packet {
        Packet::Axis { axis, value } => encode_axis(axis, value).to_vec(),
        Packet::Button { button, pressed } => encode_button(button, pressed).to_vec(),
        Packet::EmergencyStop => encode_emergency_stop().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_frame;

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0xAA, 0x00, 0x01, 0x40, 0x00]), 0xEB);
    }

    #[test]
    fn test_emergency_stop_bytes() {
        assert_eq!(encode_emergency_stop(), [0xAA, 0x02, 0x00, 0xA8, 0x55]);
    }

    #[test]
    fn test_axis_bytes() {
        assert_eq!(
            encode_axis(AxisId::LeftY, 16384.0 / 32767.0),
            [0xAA, 0x00, 0x01, 0x40, 0x00, 0xEB, 0x55]
        );
        // Out-of-range input is clamped before scaling
        assert_eq!(encode_axis(AxisId::LeftX, 3.0)[3..5], [0x7F, 0xFF]);
        assert_eq!(encode_axis(AxisId::LeftX, -3.0)[3..5], [0x80, 0x01]);
    }

    #[test]
    fn test_axis_value_survives_wire() {
        for step in -20..=20 {
            let value = step as f32 / 20.0;
            let frame = encode_axis(AxisId::RightTrigger, value);
            match parse_frame(&frame) {
                Ok(Packet::Axis { axis, value: decoded }) => {
                    assert_eq!(axis, AxisId::RightTrigger);
                    assert!(
                        (decoded - value).abs() <= 1.0 / 32767.0,
                        "{} decoded as {}",
                        value,
                        decoded
                    );
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn test_encode_matches_packet() {
        let packet = Packet::Button {
            button: ButtonId::SELECT,
            pressed: false,
        };
        assert_eq!(encode(&packet), encode_button(ButtonId::SELECT, false).to_vec());
        assert_eq!(parse_frame(&encode(&packet)), Ok(packet));
    }
}
