// Controller link serial protocol
//
// Frame format: [0xAA, Type, Payload..., Checksum, 0x55]
// Checksum is the XOR of every byte from START through the end of the payload.
// Payload integers are big-endian.

pub mod decoder;
pub mod encode;

pub use decoder::{FrameDecoder, parse_frame};
pub use encode::{checksum, encode, encode_axis, encode_button, encode_emergency_stop};

/// Frame delimiters
pub const START: u8 = 0xAA;
pub const STOP: u8 = 0x55;

/// Longest byte run collected between START and STOP before it is discarded
pub const MAX_FRAME_LEN: usize = 20;

/// Shortest valid frame (EmergencyStop)
pub const MIN_FRAME_LEN: usize = 5;

/// Scale between normalized axis values and their wire integers
pub const AXIS_SCALE: f32 = 32767.0;

/// Packet type byte
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Axis = 0x00,
    Button = 0x01,
    EmergencyStop = 0x02,
}

impl PacketType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(PacketType::Axis),
            0x01 => Some(PacketType::Button),
            0x02 => Some(PacketType::EmergencyStop),
            _ => None,
        }
    }
}

/// Reasons a completed frame produced no packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Frame too short: {len} bytes")]
    TooShort { len: usize },

    #[error("Frame not delimited by 0xAA..0x55")]
    Delimiter,

    #[error("Checksum mismatch: computed 0x{computed:02X}, received 0x{received:02X}")]
    Checksum { computed: u8, received: u8 },

    #[error("{kind:?} frame truncated: {len} bytes")]
    Truncated { kind: PacketType, len: usize },

    #[error("Axis id {0} out of range")]
    AxisOutOfRange(u8),

    #[error("Button id {0} out of range")]
    ButtonOutOfRange(u8),

    #[error("Unknown packet type 0x{0:02X}")]
    UnknownType(u8),
}

impl DecodeError {
    /// True when the frame arrived corrupted rather than well-formed but unusable
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            DecodeError::TooShort { .. } | DecodeError::Delimiter | DecodeError::Checksum { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
