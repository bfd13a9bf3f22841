//! Platform backends.
//!
//! Exactly one backend is selected and initialized by
//! [`init`](crate::init); the public API layer holds it as a single trait
//! object and never branches on the platform at call sites. Backends talk
//! to the OS (or, for the headless backend, to in-process state) and report
//! everything back as [`RawEvent`]s drained by the event pump.

pub(crate) mod headless;

use std::any::Any;
use std::time::Duration;

use crate::api::GlContextBackend;
use crate::config::{ContextConfig, FramebufferConfig, GlRequest, WindowConfig};
use crate::error::{Error, ErrorKind, Result};
use crate::event::{Key, WindowEvent};
use crate::input::CursorMode;
use crate::joystick::JoystickState;
use crate::monitor::MonitorDesc;
use crate::window::WindowId;

/// Selects which platform backend [`init_with`](crate::init_with) starts.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum Platform {
    /// Pick the first viable backend, honoring the `ORIEL_PLATFORM`
    /// environment variable when set.
    #[default]
    Any,
    /// The in-process backend: synthetic monitors, injected input, no
    /// display server required.
    Headless,
}

/// How [`PlatformBackend::pump`] should behave when no events are pending.
#[derive(Clone, Copy, Debug)]
pub(crate) enum PumpMode {
    /// Return immediately.
    Poll,
    /// Block until an event arrives, or until the timeout elapses when one
    /// is given.
    Wait(Option<Duration>),
}

/// An event as reported by a platform backend, before state tracking and
/// callback dispatch.
#[derive(Debug)]
pub(crate) enum RawEvent {
    Window(WindowId, WindowEvent),
    MonitorConnected(MonitorDesc),
    /// Carries the backend's stable native monitor id.
    MonitorDisconnected(u32),
    /// Produced by [`PlatformBackend::wake`]; terminates a wait without
    /// dispatching anything.
    Wakeup,
}

/// The capability interface one OS integration must provide.
pub(crate) trait PlatformBackend {
    fn name(&self) -> &'static str;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Monitors present at initialization. Later changes arrive as
    /// hot-plug [`RawEvent`]s through the pump.
    fn initial_monitors(&mut self) -> Vec<MonitorDesc>;

    fn create_window(&mut self, id: WindowId, config: &WindowConfig) -> Result<()>;
    fn destroy_window(&mut self, id: WindowId);
    fn set_window_title(&mut self, id: WindowId, title: &str) -> Result<()>;
    fn set_window_position(&mut self, id: WindowId, position: (i32, i32)) -> Result<()>;
    fn set_window_size(&mut self, id: WindowId, size: (u32, u32)) -> Result<()>;
    fn set_window_visible(&mut self, id: WindowId, visible: bool) -> Result<()>;
    fn set_window_iconified(&mut self, id: WindowId, iconified: bool) -> Result<()>;
    fn set_window_maximized(&mut self, id: WindowId, maximized: bool) -> Result<()>;
    fn focus_window(&mut self, id: WindowId) -> Result<()>;
    fn set_cursor_position(&mut self, id: WindowId, position: (f64, f64)) -> Result<()>;
    fn set_cursor_mode(&mut self, id: WindowId, mode: CursorMode) -> Result<()>;

    fn pump(&mut self, mode: PumpMode) -> Result<Vec<RawEvent>>;
    /// Posts a [`RawEvent::Wakeup`], interrupting a blocking pump.
    fn wake(&mut self);

    fn clipboard(&mut self) -> Result<String>;
    fn set_clipboard(&mut self, text: &str) -> Result<()>;

    /// Refreshes and returns one joystick slot. Called per query, never
    /// from a background thread.
    fn refresh_joystick(&mut self, slot: usize) -> Option<JoystickState>;

    /// The backend's native scancode for a key token, when one exists.
    fn key_scancode(&self, key: Key) -> Option<u32>;

    fn create_context(
        &mut self,
        request: GlRequest,
        config: &ContextConfig,
        framebuffer: &FramebufferConfig,
        size: (u32, u32),
    ) -> Result<Box<dyn GlContextBackend>>;
}

/// Resolves the requested platform and initializes its backend.
pub(crate) fn select(platform: Platform) -> Result<(Platform, Box<dyn PlatformBackend>)> {
    let resolved = match platform {
        Platform::Any => match std::env::var("ORIEL_PLATFORM") {
            Ok(name) => parse(&name)?,
            Err(_) => Platform::Headless,
        },
        explicit => explicit,
    };

    match resolved {
        Platform::Headless => Ok((resolved, Box::new(headless::HeadlessBackend::new()))),
        Platform::Any => Err(Error::new(
            ErrorKind::PlatformUnavailable,
            "no platform backend could be resolved",
        )),
    }
}

fn parse(name: &str) -> Result<Platform> {
    match name {
        "headless" | "null" => Ok(Platform::Headless),
        other => Err(Error::new(
            ErrorKind::PlatformUnavailable,
            format!("platform '{other}' is not compiled into this build"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_is_always_available() {
        let (platform, backend) = select(Platform::Headless).unwrap();
        assert_eq!(platform, Platform::Headless);
        assert_eq!(backend.name(), "headless");
    }

    #[test]
    fn unknown_platform_names_are_rejected() {
        let err = parse("x11").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PlatformUnavailable);
    }
}
