//! The purpose of this library is to provide windows, normalized input,
//! monitor enumeration, and OpenGL contexts behind one platform-independent
//! API.
//!
//! # Initialization
//!
//! Everything hangs off a [`Library`] instance: [`init`] selects and starts
//! exactly one platform backend, and dropping the instance (or calling
//! [`Library::terminate`]) destroys every remaining window and invalidates
//! all handles. Window and monitor handles are generational: using one
//! after its object is gone fails with [`ErrorKind::InvalidValue`] instead
//! of dangling.
//!
//! # Building a window
//!
//! A [`WindowBuilder`] carries the window, context, and framebuffer
//! configuration consumed by one creation call:
//!
//! ```no_run
//! use oriel::WindowBuilder;
//!
//! # fn main() -> oriel::Result<()> {
//! let mut lib = oriel::init()?;
//! let window = WindowBuilder::new()
//!     .with_size(800, 600)
//!     .with_title("example")
//!     .build(&mut lib)?;
//!
//! lib.make_context_current(Some(window))?;
//! while !lib.window_should_close(window)? {
//!     lib.swap_buffers(window)?;
//!     lib.poll_events()?;
//! }
//! lib.destroy_window(window)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Events
//!
//! [`Library::poll_events`] and [`Library::wait_events`] drain the event
//! queue and invoke the registered per-window callbacks synchronously on
//! the calling thread. Event processing is not reentrant: pumping from
//! inside a callback is an error.
//!
//! # Errors
//!
//! Every failing call invokes the error callback installed with
//! [`Library::set_error_callback`] and returns the same [`Error`]; nothing
//! panics on caller misuse and no call aborts the process.

#![deny(missing_debug_implementations)]

mod api;
mod config;
mod error;
mod event;
mod input;
mod joystick;
mod library;
mod monitor;
mod platform;
mod timer;
mod window;

pub mod os;

pub use crate::config::{
    Api, ClientApi, ContextCreationApi, GlRequest, PixelFormat, Profile, Robustness,
    WindowBuilder,
};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::event::{Action, Key, Modifiers, MonitorEvent, MouseButton, WindowEvent};
pub use crate::input::CursorMode;
pub use crate::joystick::{JoystickState, JOYSTICK_COUNT};
pub use crate::library::{ErrorCallback, Library, MonitorCallback};
pub use crate::monitor::{GammaRamp, MonitorId, VideoMode, GAMMA_RAMP_SIZE};
pub use crate::platform::Platform;
pub use crate::window::{
    CharCallback, CloseCallback, CursorEnterCallback, CursorPosCallback, DropCallback,
    FocusCallback, FramebufferSizeCallback, IconifyCallback, KeyCallback,
    MaximizeCallback, MouseButtonCallback, PosCallback, RefreshCallback, ScrollCallback,
    SizeCallback, WindowId,
};

#[cfg(feature = "osmesa")]
pub use crate::api::osmesa::is_available as osmesa_available;

pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Initializes the first viable platform backend.
///
/// Honors the `ORIEL_PLATFORM` environment variable (`headless`/`null`)
/// when set; an unknown or uncompiled platform name fails with
/// [`ErrorKind::PlatformUnavailable`].
pub fn init() -> Result<Library> {
    Library::init(Platform::Any)
}

/// Initializes a specific platform backend.
pub fn init_with(platform: Platform) -> Result<Library> {
    Library::init(platform)
}

/// The library version as a `(major, minor, patch)` triple.
pub fn version() -> (u32, u32, u32) {
    (VERSION_MAJOR, VERSION_MINOR, VERSION_PATCH)
}

#[cfg(test)]
mod tests {
    #[test]
    fn version_matches_the_manifest() {
        let (major, minor, patch) = super::version();
        let manifest = format!("{major}.{minor}.{patch}");
        assert_eq!(manifest, env!("CARGO_PKG_VERSION"));
    }
}
