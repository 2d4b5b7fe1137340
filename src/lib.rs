// Receiving side of the handheld controller link for a two-motor base
//
// bytes -> protocol::FrameDecoder -> dispatcher -> state + motor::mix -> MotorOutput

pub mod config;
pub mod dispatcher;
pub mod link;
pub mod messages;
pub mod motor;
pub mod protocol;
pub mod runtime;
pub mod state;

pub use dispatcher::dispatch;
pub use messages::{AxisId, ButtonId, LinkHealth, MotorCommand, Packet};
pub use runtime::{LinkStats, Runtime, RuntimeError};
