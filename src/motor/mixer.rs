// Differential-drive mixer for a two-motor base
// Converts stick and trigger positions into four H-bridge duty values.

use crate::config::DEADZONE;
use crate::messages::{AxisId, MotorCommand};
use crate::state::AxisState;

/// Full-scale duty value
pub const MAX_DUTY: u16 = u16::MAX;

/// Map a trigger from [-1, 1] (released..pulled) to [0, 1]
fn normalize_trigger(t: f32) -> f64 {
    (f64::from(t) + 1.0) / 2.0
}

/// Speed ceiling set by whichever trigger is pulled further
///
/// Computed in f64 so the rounding is exact for every wire value.
pub fn base_speed(axes: &AxisState) -> u32 {
    let lt = normalize_trigger(axes.get(AxisId::LeftTrigger));
    let rt = normalize_trigger(axes.get(AxisId::RightTrigger));
    let base = (lt.max(rt) * f64::from(MAX_DUTY)).round();
    base.clamp(0.0, f64::from(MAX_DUTY)) as u32
}

/// Stick magnitude times base speed, truncated toward zero
fn scaled(magnitude: f32, base: u32) -> u32 {
    (f64::from(magnitude) * f64::from(base)) as u32
}

fn duty(speed: u32) -> u16 {
    speed.min(MAX_DUTY as u32) as u16
}

/// Compute motor duties from the current axis state
///
/// The first stick outside the deadzone wins, in this order:
/// 1. Left Y: straight drive, both motors the same direction
/// 2. Left X: spin in place, motors opposite
/// 3. Right X: gentle forward turn, inner motor at half of outer
/// 4. otherwise stop
pub fn mix(axes: &AxisState) -> MotorCommand {
    let base = base_speed(axes);
    let left_y = axes.get(AxisId::LeftY);
    let left_x = axes.get(AxisId::LeftX);
    let right_x = axes.get(AxisId::RightX);

    if left_y.abs() > DEADZONE {
        let speed = duty(scaled(left_y.abs(), base));
        if left_y > 0.0 {
            MotorCommand::new(speed, 0, speed, 0)
        } else {
            MotorCommand::new(0, speed, 0, speed)
        }
    } else if left_x.abs() > DEADZONE {
        let speed = duty(scaled(left_x.abs(), base));
        if left_x > 0.0 {
            // Turn right: A back, B forward
            MotorCommand::new(0, speed, speed, 0)
        } else {
            MotorCommand::new(speed, 0, 0, speed)
        }
    } else if right_x.abs() > DEADZONE {
        let speed = scaled(right_x.abs(), base) / 2;
        let (outer, inner) = (duty(speed), duty(speed / 2));
        if right_x > 0.0 {
            MotorCommand::new(inner, 0, outer, 0)
        } else {
            MotorCommand::new(outer, 0, inner, 0)
        }
    } else {
        MotorCommand::STOP
    }
}
