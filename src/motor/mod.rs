// Motor control for the two-motor differential base
//
// Provides:
// - Stick/trigger to duty mixing
// - Motor output sinks (embedded-hal PWM, simulation, recording)
// - A guard that zeroes the outputs on every exit path

pub mod mixer;
mod output;

pub use mixer::{MAX_DUTY, base_speed, mix};
pub use output::{
    MotorError, MotorGuard, MotorOutput, PwmMotors, RecordingMotors, SimulatedMotors,
};
