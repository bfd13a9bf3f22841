//! Per-window input state tracking.
//!
//! Backends feed normalized events through [`InputState::record_key`] and
//! friends; applications read the tables back through the `Library` query
//! functions. Sticky mode latches a press until it has been polled once,
//! independent of how quickly the release arrived.

use std::collections::{HashMap, HashSet};

use crate::event::{Action, Key, MouseButton};

/// Cursor behavior for a window.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum CursorMode {
    /// Visible cursor, free to leave the window.
    #[default]
    Normal,
    /// Invisible while over the window, otherwise unconstrained.
    Hidden,
    /// Hidden and captured; the reported position is a virtual, unbounded
    /// coordinate useful for camera-style input.
    Disabled,
}

#[derive(Debug, Default)]
pub(crate) struct InputState {
    keys: HashMap<Key, Action>,
    stuck_keys: HashSet<Key>,
    buttons: [Action; 8],
    stuck_buttons: [bool; 8],
    pub cursor_pos: (f64, f64),
    pub cursor_inside: bool,
    pub cursor_mode: CursorMode,
    pub sticky_keys: bool,
    pub sticky_buttons: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self { buttons: [Action::Release; 8], ..Self::default() }
    }

    pub fn record_key(&mut self, key: Key, action: Action) {
        if key == Key::Unknown {
            return;
        }
        if action == Action::Release && self.sticky_keys {
            self.stuck_keys.insert(key);
        }
        self.keys.insert(key, action);
    }

    /// Last known action of `key`, with sticky latching applied: a latched
    /// press reads as `Press` exactly once, then reverts to the real state.
    /// Repeats are folded into `Press`; this query never reports them.
    pub fn key(&mut self, key: Key) -> Action {
        if self.stuck_keys.remove(&key) {
            return Action::Press;
        }
        match self.keys.get(&key) {
            Some(Action::Press) | Some(Action::Repeat) => Action::Press,
            _ => Action::Release,
        }
    }

    pub fn record_button(&mut self, button: MouseButton, action: Action) {
        let index = button.index();
        if action == Action::Release && self.sticky_buttons {
            self.stuck_buttons[index] = true;
        }
        self.buttons[index] = action;
    }

    pub fn button(&mut self, button: MouseButton) -> Action {
        let index = button.index();
        if self.stuck_buttons[index] {
            self.stuck_buttons[index] = false;
            return Action::Press;
        }
        self.buttons[index]
    }

    /// Turning sticky mode off drops any latched state.
    pub fn set_sticky_keys(&mut self, enabled: bool) {
        if !enabled {
            self.stuck_keys.clear();
        }
        self.sticky_keys = enabled;
    }

    pub fn set_sticky_buttons(&mut self, enabled: bool) {
        if !enabled {
            self.stuck_buttons = [false; 8];
        }
        self.sticky_buttons = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_key_state_follows_events() {
        let mut input = InputState::new();
        assert_eq!(input.key(Key::A), Action::Release);
        input.record_key(Key::A, Action::Press);
        assert_eq!(input.key(Key::A), Action::Press);
        // Polling twice without sticky mode keeps reporting the held state.
        assert_eq!(input.key(Key::A), Action::Press);
        input.record_key(Key::A, Action::Release);
        assert_eq!(input.key(Key::A), Action::Release);
    }

    #[test]
    fn repeat_reads_as_press() {
        let mut input = InputState::new();
        input.record_key(Key::Space, Action::Press);
        input.record_key(Key::Space, Action::Repeat);
        assert_eq!(input.key(Key::Space), Action::Press);
    }

    #[test]
    fn sticky_key_latches_until_polled_once() {
        let mut input = InputState::new();
        input.set_sticky_keys(true);
        input.record_key(Key::X, Action::Press);
        input.record_key(Key::X, Action::Release);
        // Press and release both arrived before any poll; the press must
        // still be observable exactly once.
        assert_eq!(input.key(Key::X), Action::Press);
        assert_eq!(input.key(Key::X), Action::Release);
        assert_eq!(input.key(Key::X), Action::Release);
    }

    #[test]
    fn disabling_sticky_mode_clears_latches() {
        let mut input = InputState::new();
        input.set_sticky_keys(true);
        input.record_key(Key::X, Action::Press);
        input.record_key(Key::X, Action::Release);
        input.set_sticky_keys(false);
        assert_eq!(input.key(Key::X), Action::Release);
    }

    #[test]
    fn sticky_buttons_latch_independently() {
        let mut input = InputState::new();
        input.set_sticky_buttons(true);
        input.record_button(MouseButton::Left, Action::Press);
        input.record_button(MouseButton::Left, Action::Release);
        input.record_button(MouseButton::Right, Action::Press);
        assert_eq!(input.button(MouseButton::Left), Action::Press);
        assert_eq!(input.button(MouseButton::Left), Action::Release);
        assert_eq!(input.button(MouseButton::Right), Action::Press);
    }

    #[test]
    fn unknown_keys_are_not_tracked() {
        let mut input = InputState::new();
        input.record_key(Key::Unknown, Action::Press);
        assert_eq!(input.key(Key::Unknown), Action::Release);
    }
}
