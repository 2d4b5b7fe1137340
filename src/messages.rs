// Message types flowing through the receiver: decoded packets, motor commands, link health

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of analog axes carried by the protocol
pub const AXIS_COUNT: usize = 6;

/// Number of buttons carried by the protocol
pub const BUTTON_COUNT: usize = 12;

/// Controller axes, in wire-id order
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisId {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
    LeftTrigger = 4,
    RightTrigger = 5,
}

impl AxisId {
    pub const ALL: [AxisId; AXIS_COUNT] = [
        AxisId::LeftX,
        AxisId::LeftY,
        AxisId::RightX,
        AxisId::RightY,
        AxisId::LeftTrigger,
        AxisId::RightTrigger,
    ];

    /// Validate a wire id
    pub fn from_wire(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            AxisId::LeftX => "LEFT_X",
            AxisId::LeftY => "LEFT_Y",
            AxisId::RightX => "RIGHT_X",
            AxisId::RightY => "RIGHT_Y",
            AxisId::LeftTrigger => "LT",
            AxisId::RightTrigger => "RT",
        }
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Display names for button ids; ids 2 and 9 have no label on the controller
const BUTTON_NAMES: [&str; BUTTON_COUNT] = [
    "A", "B", "BTN_2", "X", "Y", "RB", "LB", "RT", "LT", "BTN_9", "SELECT", "START",
];

/// A validated button id (0..12)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ButtonId(u8);

impl ButtonId {
    pub const SELECT: ButtonId = ButtonId(10);
    pub const START: ButtonId = ButtonId(11);

    pub fn new(id: u8) -> Option<Self> {
        ((id as usize) < BUTTON_COUNT).then_some(Self(id))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn name(self) -> &'static str {
        BUTTON_NAMES[self.index()]
    }
}

impl TryFrom<u8> for ButtonId {
    type Error = String;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id).ok_or_else(|| format!("button id {} out of range", id))
    }
}

impl From<ButtonId> for u8 {
    fn from(id: ButtonId) -> Self {
        id.0
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded controller message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Packet {
    Axis { axis: AxisId, value: f32 },
    Button { button: ButtonId, pressed: bool },
    EmergencyStop,
}

/// Duty values for the four PWM channels of a two-motor H-bridge
///
/// At most one direction per motor is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotorCommand {
    pub forward_a: u16,
    pub backward_a: u16,
    pub forward_b: u16,
    pub backward_b: u16,
}

impl MotorCommand {
    pub const STOP: MotorCommand = MotorCommand {
        forward_a: 0,
        backward_a: 0,
        forward_b: 0,
        backward_b: 0,
    };

    pub fn new(forward_a: u16, backward_a: u16, forward_b: u16, backward_b: u16) -> Self {
        Self {
            forward_a,
            backward_a,
            forward_b,
            backward_b,
        }
    }

    pub fn is_stop(&self) -> bool {
        *self == Self::STOP
    }

    /// Returns duties as array [forward_a, backward_a, forward_b, backward_b]
    pub fn as_array(&self) -> [u16; 4] {
        [self.forward_a, self.backward_a, self.forward_b, self.backward_b]
    }
}

/// Whether valid frames are still arriving
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkHealth {
    Ok,
    Stale,
}
