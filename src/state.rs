// Last-known controller state, written by the dispatcher and read by the mixer

use crate::messages::{AXIS_COUNT, AxisId, BUTTON_COUNT, ButtonId};

/// Normalized axis values in [-1.0, 1.0], all centered at startup
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisState {
    values: [f32; AXIS_COUNT],
}

impl AxisState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, axis: AxisId) -> f32 {
        self.values[axis.index()]
    }

    pub fn set(&mut self, axis: AxisId, value: f32) {
        self.values[axis.index()] = value;
    }

    /// Build a state from (axis, value) pairs, the rest centered
    pub fn with(pairs: &[(AxisId, f32)]) -> Self {
        let mut state = Self::new();
        for &(axis, value) in pairs {
            state.set(axis, value);
        }
        state
    }

    pub fn as_array(&self) -> [f32; AXIS_COUNT] {
        self.values
    }
}

/// Button states, all released at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    pressed: [bool; BUTTON_COUNT],
}

impl ButtonState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self, button: ButtonId) -> bool {
        self.pressed[button.index()]
    }

    pub fn set(&mut self, button: ButtonId, pressed: bool) {
        self.pressed[button.index()] = pressed;
    }

    /// Ids of every button currently held
    pub fn held(&self) -> impl Iterator<Item = ButtonId> + '_ {
        self.pressed
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p)
            .filter_map(|(i, _)| ButtonId::new(i as u8))
    }
}

/// Everything the controller has told us so far
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerState {
    pub axes: AxisState,
    pub buttons: ButtonState,
}

impl ControllerState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_rest() {
        let state = ControllerState::new();
        assert_eq!(state.axes.as_array(), [0.0; AXIS_COUNT]);
        assert_eq!(state.buttons.held().count(), 0);
    }

    #[test]
    fn test_set_and_read_back() {
        let mut state = ControllerState::new();
        state.axes.set(AxisId::RightTrigger, -0.25);
        state.buttons.set(ButtonId::SELECT, true);

        assert_eq!(state.axes.get(AxisId::RightTrigger), -0.25);
        assert_eq!(state.axes.get(AxisId::LeftX), 0.0);
        assert!(state.buttons.is_pressed(ButtonId::SELECT));
        assert_eq!(state.buttons.held().collect::<Vec<_>>(), vec![ButtonId::SELECT]);
    }
}
