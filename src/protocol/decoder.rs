// Byte-at-a-time frame decoder
//
// Idle --0xAA--> Collecting --0x55--> validate --> Idle
//                Collecting --more than MAX_FRAME_LEN bytes--> Idle (silent)

use tracing::trace;

use super::{
    AXIS_SCALE, DecodeError, MAX_FRAME_LEN, MIN_FRAME_LEN, PacketType, Result, START, STOP,
    checksum,
};
use crate::messages::{AxisId, ButtonId, Packet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Idle,
    Collecting,
}

/// Reassembles frames from a byte stream
#[derive(Debug)]
pub struct FrameDecoder {
    state: DecoderState,
    buffer: Vec<u8>,
    overflows: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Idle,
            buffer: Vec::with_capacity(MAX_FRAME_LEN + 1),
            overflows: 0,
        }
    }

    /// Feed one received byte.
    ///
    /// Returns `None` while no frame has completed, including when an
    /// oversized frame is discarded. Once a STOP byte closes a frame the
    /// result of validating it is returned and the decoder goes back to idle.
    pub fn feed(&mut self, byte: u8) -> Option<Result<Packet>> {
        match self.state {
            DecoderState::Idle => {
                if byte == START {
                    self.buffer.clear();
                    self.buffer.push(byte);
                    self.state = DecoderState::Collecting;
                }
                None
            }
            DecoderState::Collecting => {
                self.buffer.push(byte);

                if byte == STOP {
                    let result = parse_frame(&self.buffer);
                    self.reset();
                    return Some(result);
                }

                if self.buffer.len() > MAX_FRAME_LEN {
                    trace!("Discarding {} bytes without STOP", self.buffer.len());
                    self.overflows += 1;
                    self.reset();
                }
                None
            }
        }
    }

    /// Whether a START has been seen and the frame is still open
    pub fn is_collecting(&self) -> bool {
        self.state == DecoderState::Collecting
    }

    /// Number of frames discarded for exceeding MAX_FRAME_LEN
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = DecoderState::Idle;
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a complete START..STOP frame and decode its packet
pub fn parse_frame(frame: &[u8]) -> Result<Packet> {
    let len = frame.len();
    if len < MIN_FRAME_LEN {
        return Err(DecodeError::TooShort { len });
    }

    if frame[0] != START || frame[len - 1] != STOP {
        return Err(DecodeError::Delimiter);
    }

    // Everything except the checksum and STOP
    let payload = &frame[..len - 2];
    let received = frame[len - 2];
    let computed = checksum(payload);
    if received != computed {
        return Err(DecodeError::Checksum { computed, received });
    }

    let type_byte = payload[1];
    match PacketType::from_byte(type_byte) {
        Some(PacketType::Axis) => {
            let &[_, _, id, hi, lo, ..] = payload else {
                return Err(DecodeError::Truncated {
                    kind: PacketType::Axis,
                    len,
                });
            };
            let axis = AxisId::from_wire(id).ok_or(DecodeError::AxisOutOfRange(id))?;
            let raw = i16::from_be_bytes([hi, lo]);
            Ok(Packet::Axis {
                axis,
                value: raw as f32 / AXIS_SCALE,
            })
        }
        Some(PacketType::Button) => {
            let &[_, _, id, state, ..] = payload else {
                return Err(DecodeError::Truncated {
                    kind: PacketType::Button,
                    len,
                });
            };
            let button = ButtonId::new(id).ok_or(DecodeError::ButtonOutOfRange(id))?;
            Ok(Packet::Button {
                button,
                pressed: state != 0,
            })
        }
        Some(PacketType::EmergencyStop) => Ok(Packet::EmergencyStop),
        None => Err(DecodeError::UnknownType(type_byte)),
    }
}
