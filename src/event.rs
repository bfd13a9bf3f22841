//! Platform-independent event and input token vocabulary.
//!
//! Platform backends translate native messages into these types; the
//! dispatch layer in [`Library`](crate::Library) drains them and invokes the
//! per-window callbacks.

use std::path::PathBuf;

use bitflags::bitflags;

/// The transition state of a key or mouse button.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum Action {
    #[default]
    Release,
    Press,
    /// Key repeat generated by the system while a key is held. Only keys
    /// report repeats, never mouse buttons.
    Repeat,
}

bitflags! {
    /// Modifier key state at the time an input event was generated.
    #[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
    pub struct Modifiers: u32 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
        const CAPS_LOCK = 1 << 4;
        const NUM_LOCK = 1 << 5;
    }
}

/// A mouse button. Eight buttons are tracked per window.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Button4,
    Button5,
    Button6,
    Button7,
    Button8,
}

impl MouseButton {
    /// All tracked buttons, in state-table order.
    pub const ALL: [MouseButton; 8] = [
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::Button4,
        MouseButton::Button5,
        MouseButton::Button6,
        MouseButton::Button7,
        MouseButton::Button8,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
            MouseButton::Button4 => 3,
            MouseButton::Button5 => 4,
            MouseButton::Button6 => 5,
            MouseButton::Button7 => 6,
            MouseButton::Button8 => 7,
        }
    }
}

/// A physical key, identified by a fixed platform-independent token.
///
/// The token names the key's position on a US-layout keyboard; the same
/// physical key maps to the same token on every backend regardless of the
/// active layout. Keys the backend cannot map are reported as [`Key::Unknown`]
/// with the native scancode preserved in the event.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Key {
    Space,
    Apostrophe,
    Comma,
    Minus,
    Period,
    Slash,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    Semicolon,
    Equal,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    LeftBracket,
    Backslash,
    RightBracket,
    GraveAccent,
    World1,
    World2,
    Escape,
    Enter,
    Tab,
    Backspace,
    Insert,
    Delete,
    Right,
    Left,
    Down,
    Up,
    PageUp,
    PageDown,
    Home,
    End,
    CapsLock,
    ScrollLock,
    NumLock,
    PrintScreen,
    Pause,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    F21,
    F22,
    F23,
    F24,
    F25,
    Kp0,
    Kp1,
    Kp2,
    Kp3,
    Kp4,
    Kp5,
    Kp6,
    Kp7,
    Kp8,
    Kp9,
    KpDecimal,
    KpDivide,
    KpMultiply,
    KpSubtract,
    KpAdd,
    KpEnter,
    KpEqual,
    LeftShift,
    LeftControl,
    LeftAlt,
    LeftSuper,
    RightShift,
    RightControl,
    RightAlt,
    RightSuper,
    Menu,
    /// A key the backend could not map to a token. The native scancode is
    /// still delivered with the event so applications can bind it.
    Unknown,
}

impl Key {
    /// The UTF-8 name of a printable key, independent of keyboard layout.
    ///
    /// Returns `None` for function and editing keys and for [`Key::Unknown`].
    pub fn name(self) -> Option<&'static str> {
        use Key::*;
        Some(match self {
            Space => " ",
            Apostrophe => "'",
            Comma => ",",
            Minus => "-",
            Period => ".",
            Slash => "/",
            Num0 => "0",
            Num1 => "1",
            Num2 => "2",
            Num3 => "3",
            Num4 => "4",
            Num5 => "5",
            Num6 => "6",
            Num7 => "7",
            Num8 => "8",
            Num9 => "9",
            Semicolon => ";",
            Equal => "=",
            A => "a",
            B => "b",
            C => "c",
            D => "d",
            E => "e",
            F => "f",
            G => "g",
            H => "h",
            I => "i",
            J => "j",
            K => "k",
            L => "l",
            M => "m",
            N => "n",
            O => "o",
            P => "p",
            Q => "q",
            R => "r",
            S => "s",
            T => "t",
            U => "u",
            V => "v",
            W => "w",
            X => "x",
            Y => "y",
            Z => "z",
            LeftBracket => "[",
            Backslash => "\\",
            RightBracket => "]",
            GraveAccent => "`",
            KpDecimal => ".",
            KpDivide => "/",
            KpMultiply => "*",
            KpSubtract => "-",
            KpAdd => "+",
            KpEqual => "=",
            Kp0 => "0",
            Kp1 => "1",
            Kp2 => "2",
            Kp3 => "3",
            Kp4 => "4",
            Kp5 => "5",
            Kp6 => "6",
            Kp7 => "7",
            Kp8 => "8",
            Kp9 => "9",
            _ => return None,
        })
    }
}

/// An event targeted at one window, already normalized by the active
/// platform backend.
#[derive(Clone, Debug, PartialEq)]
pub enum WindowEvent {
    /// The window content area moved to the given screen position.
    Moved(i32, i32),

    /// The window content area was resized, in logical pixels.
    Resized(u32, u32),

    /// The framebuffer was resized, in hardware pixels. Differs from
    /// [`WindowEvent::Resized`] under HiDPI scaling.
    FramebufferResized(u32, u32),

    /// The user requested the window to close. Only sets the should-close
    /// flag (subject to the close callback's veto); the window is never
    /// destroyed by the library.
    CloseRequested,

    /// The window contents were damaged and need to be redrawn.
    Refresh,

    Focused(bool),
    Iconified(bool),
    Maximized(bool),

    Key {
        key: Key,
        /// The native scancode, preserved even for [`Key::Unknown`].
        scancode: u32,
        action: Action,
        mods: Modifiers,
    },

    /// A Unicode code point produced by text input. Decoupled from [`Key`]
    /// transitions: one physical key may yield zero, one, or several of
    /// these depending on layout and dead-key composition.
    Char(char),

    MouseButton {
        button: MouseButton,
        action: Action,
        mods: Modifiers,
    },

    /// Cursor moved, in window-client-relative coordinates.
    CursorMoved(f64, f64),

    /// The cursor crossed the window boundary. Not inferable from position
    /// events alone.
    CursorEntered(bool),

    /// Scroll offsets along both axes.
    Scroll(f64, f64),

    /// One or more files were dropped onto the window.
    FileDropped(Vec<PathBuf>),
}

/// A monitor hot-plug notification, delivered via the monitor callback.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum MonitorEvent {
    Connected,
    /// The handle passed along with this event has already been invalidated
    /// by the registry; it exists only for bookkeeping on the application
    /// side.
    Disconnected,
}
