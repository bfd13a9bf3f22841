//! Joystick slots.
//!
//! Joysticks occupy a fixed range of process-wide slots and are polled on
//! demand: device state is refreshed only when a query arrives, since some
//! platforms need an explicit OS call per refresh. No background thread
//! polls devices.

/// Number of joystick slots tracked by the library.
pub const JOYSTICK_COUNT: usize = 16;

/// State of one connected joystick, refreshed at query time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JoystickState {
    pub name: String,
    /// Normalized to -1.0..=1.0.
    pub axes: Vec<f32>,
    /// `true` means pressed.
    pub buttons: Vec<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_empty() {
        let state = JoystickState::default();
        assert!(state.axes.is_empty());
        assert!(state.buttons.is_empty());
        assert!(state.name.is_empty());
    }
}
