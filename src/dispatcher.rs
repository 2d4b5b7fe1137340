// Routes decoded packets to state updates or the emergency stop

use tracing::{debug, info, warn};

use crate::messages::{MotorCommand, Packet};
use crate::motor::{MotorOutput, mix};
use crate::state::ControllerState;

/// Apply one packet.
///
/// Axis packets update the state and re-mix the motors, button packets only
/// update the state, and an emergency stop zeroes the outputs without
/// touching the axes. The stop does not latch: the next axis packet mixes as
/// usual.
pub fn dispatch<M: MotorOutput>(packet: Packet, state: &mut ControllerState, motors: &mut M) {
    match packet {
        Packet::Axis { axis, value } => {
            debug!("Axis {}: {:.2}", axis, value);
            state.axes.set(axis, value);
            apply(motors, &mix(&state.axes));
        }
        Packet::Button { button, pressed } => {
            debug!(
                "Button {}: {}",
                button,
                if pressed { "pressed" } else { "released" }
            );
            state.buttons.set(button, pressed);
        }
        Packet::EmergencyStop => {
            info!("Emergency stop");
            apply(motors, &MotorCommand::STOP);
        }
    }
}

fn apply<M: MotorOutput>(motors: &mut M, command: &MotorCommand) {
    if let Err(e) = motors.set_duties(command) {
        warn!("Failed to apply {:?}: {}", command, e);
    }
}
