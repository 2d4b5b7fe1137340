// Motor output sinks and the guard that stops them on the way out

use embedded_hal::pwm::SetDutyCycle;
use tracing::{debug, info, warn};

use super::mixer::MAX_DUTY;
use crate::messages::MotorCommand;

/// Error types for motor outputs
#[derive(Debug, thiserror::Error)]
pub enum MotorError {
    #[error("PWM channel {channel} rejected duty {duty}: {reason}")]
    Pwm {
        channel: &'static str,
        duty: u16,
        reason: String,
    },

    #[error("Motor output unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, MotorError>;

/// Anything that can apply four duty values to the H-bridge
pub trait MotorOutput {
    fn set_duties(&mut self, command: &MotorCommand) -> Result<()>;

    fn stop(&mut self) -> Result<()> {
        self.set_duties(&MotorCommand::STOP)
    }
}

impl<M: MotorOutput + ?Sized> MotorOutput for &mut M {
    fn set_duties(&mut self, command: &MotorCommand) -> Result<()> {
        (**self).set_duties(command)
    }
}

impl<M: MotorOutput + ?Sized> MotorOutput for Box<M> {
    fn set_duties(&mut self, command: &MotorCommand) -> Result<()> {
        (**self).set_duties(command)
    }
}

/// Four embedded-hal PWM channels wired to a dual H-bridge
pub struct PwmMotors<P> {
    forward_a: P,
    backward_a: P,
    forward_b: P,
    backward_b: P,
}

impl<P: SetDutyCycle> PwmMotors<P> {
    pub fn new(forward_a: P, backward_a: P, forward_b: P, backward_b: P) -> Self {
        Self {
            forward_a,
            backward_a,
            forward_b,
            backward_b,
        }
    }

    pub fn into_channels(self) -> [P; 4] {
        [self.forward_a, self.backward_a, self.forward_b, self.backward_b]
    }
}

fn apply<P: SetDutyCycle>(pin: &mut P, channel: &'static str, duty: u16) -> Result<()> {
    // Scale 0..=65535 onto the channel's own resolution
    pin.set_duty_cycle_fraction(duty, MAX_DUTY)
        .map_err(|e| MotorError::Pwm {
            channel,
            duty,
            reason: format!("{:?}", e),
        })
}

impl<P: SetDutyCycle> MotorOutput for PwmMotors<P> {
    fn set_duties(&mut self, command: &MotorCommand) -> Result<()> {
        // Release the inactive direction before driving the active one
        apply(&mut self.backward_a, "backward_a", command.backward_a)?;
        apply(&mut self.forward_a, "forward_a", command.forward_a)?;
        apply(&mut self.backward_b, "backward_b", command.backward_b)?;
        apply(&mut self.forward_b, "forward_b", command.forward_b)
    }
}

/// Logs duties instead of driving hardware (hosts without PWM)
#[derive(Debug, Default)]
pub struct SimulatedMotors {
    last: MotorCommand,
}

impl SimulatedMotors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> MotorCommand {
        self.last
    }
}

impl MotorOutput for SimulatedMotors {
    fn set_duties(&mut self, command: &MotorCommand) -> Result<()> {
        if *command != self.last {
            debug!(
                "Duties: fwd_a={}, bwd_a={}, fwd_b={}, bwd_b={}",
                command.forward_a, command.backward_a, command.forward_b, command.backward_b
            );
        }
        self.last = *command;
        Ok(())
    }
}

/// Keeps every command it receives, for tests and replay
#[derive(Debug, Default, Clone)]
pub struct RecordingMotors {
    pub commands: Vec<MotorCommand>,
}

impl RecordingMotors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<MotorCommand> {
        self.commands.last().copied()
    }
}

impl MotorOutput for RecordingMotors {
    fn set_duties(&mut self, command: &MotorCommand) -> Result<()> {
        self.commands.push(*command);
        Ok(())
    }
}

/// Owns a motor output and zeroes it when released or dropped
pub struct MotorGuard<M: MotorOutput> {
    motors: Option<M>,
}

impl<M: MotorOutput> MotorGuard<M> {
    /// Take ownership of the output, starting from a stopped state
    pub fn acquire(mut motors: M) -> Result<Self> {
        motors.stop()?;
        Ok(Self {
            motors: Some(motors),
        })
    }

    pub fn get_mut(&mut self) -> &mut M {
        // Only `release` empties the slot and it consumes the guard
        self.motors
            .as_mut()
            .unwrap_or_else(|| unreachable!("motor guard used after release"))
    }

    /// Stop the motors and hand back the output
    pub fn release(mut self) -> Result<M> {
        let mut motors = self
            .motors
            .take()
            .unwrap_or_else(|| unreachable!("motor guard released twice"));
        info!("Stopping all motors");
        motors.stop()?;
        Ok(motors)
    }
}

impl<M: MotorOutput> MotorOutput for MotorGuard<M> {
    fn set_duties(&mut self, command: &MotorCommand) -> Result<()> {
        self.get_mut().set_duties(command)
    }
}

impl<M: MotorOutput> Drop for MotorGuard<M> {
    fn drop(&mut self) {
        if let Some(motors) = self.motors.as_mut() {
            if let Err(e) = motors.stop() {
                warn!("Failed to stop motors on drop: {}", e);
            }
        }
    }
}
