//! Additions to [`Library`] exposed by the headless backend.
//!
//! The headless backend has no OS to produce events, so this trait is its
//! event source: injected input and hot-plug notifications enter the same
//! queue OS messages would and are dispatched by the ordinary event pump.
//! It also exposes the software color buffer, the equivalent of an
//! off-screen context's read-back path.

use crate::error::{Error, ErrorKind, Result};
use crate::event::{Action, Key, Modifiers, WindowEvent};
use crate::joystick::{JoystickState, JOYSTICK_COUNT};
use crate::monitor::{MonitorId, VideoMode};
use crate::platform::headless::HeadlessBackend;
use crate::window::WindowId;
use crate::Library;

/// Headless-only operations. Importing the trait makes them available on
/// [`Library`]; they fail with
/// [`FeatureUnavailable`](crate::ErrorKind::FeatureUnavailable) when a
/// different backend is active.
pub trait HeadlessLibraryExt {
    /// Queues an event exactly as the OS translation layer would. It is
    /// delivered, with state tracking and callbacks, by the next event
    /// pump.
    fn inject_window_event(&mut self, window: WindowId, event: WindowEvent) -> Result<()>;

    /// Convenience for queueing a key event with the backend's scancode.
    fn inject_key(
        &mut self,
        window: WindowId,
        key: Key,
        action: Action,
        mods: Modifiers,
    ) -> Result<()>;

    /// Queues one Unicode code point of text input.
    fn inject_char(&mut self, window: WindowId, character: char) -> Result<()>;

    /// Simulates connecting a display; the connect callback fires during
    /// the next event pump.
    fn plug_monitor(&mut self, name: &str, mode: VideoMode) -> Result<()>;

    /// Simulates disconnecting a display; the handle is invalidated during
    /// the next event pump, before the disconnect callback runs.
    fn unplug_monitor(&mut self, monitor: MonitorId) -> Result<()>;

    /// Makes a virtual joystick visible in the given slot.
    fn attach_joystick(&mut self, slot: usize, state: JoystickState) -> Result<()>;

    fn detach_joystick(&mut self, slot: usize) -> Result<()>;

    /// A copy of the window's software color buffer and its dimensions.
    /// This is the read-back path of off-screen contexts; windows without
    /// a software-rendered context fail with
    /// [`FeatureUnavailable`](crate::ErrorKind::FeatureUnavailable).
    fn software_framebuffer(&mut self, window: WindowId) -> Result<(Vec<u32>, (u32, u32))>;
}

/// Resolves the active backend as headless, or reports
/// `FeatureUnavailable`. Split in two steps so the error path does not
/// overlap the backend borrow.
fn require_headless(library: &mut Library) -> Result<()> {
    let headless = library
        .backend_mut()
        .as_any_mut()
        .downcast_mut::<HeadlessBackend>()
        .is_some();
    if headless {
        Ok(())
    } else {
        library.report(Error::new(
            ErrorKind::FeatureUnavailable,
            "this operation needs the headless platform backend",
        ))
    }
}

fn backend(library: &mut Library) -> Option<&mut HeadlessBackend> {
    library.backend_mut().as_any_mut().downcast_mut::<HeadlessBackend>()
}

fn check_slot(library: &mut Library, slot: usize) -> Result<()> {
    if slot < JOYSTICK_COUNT {
        Ok(())
    } else {
        library.report(Error::new(
            ErrorKind::InvalidEnum,
            format!("joystick slot {slot} is out of range"),
        ))
    }
}

impl HeadlessLibraryExt for Library {
    fn inject_window_event(&mut self, window: WindowId, event: WindowEvent) -> Result<()> {
        if self.window_state(window).is_none() {
            return self.report(Error::new(
                ErrorKind::InvalidValue,
                "invalid or destroyed window handle",
            ));
        }
        require_headless(self)?;
        if let Some(backend) = backend(self) {
            backend.inject_window_event(window, event);
        }
        Ok(())
    }

    fn inject_key(
        &mut self,
        window: WindowId,
        key: Key,
        action: Action,
        mods: Modifiers,
    ) -> Result<()> {
        let scancode = self.key_scancode(key).unwrap_or(0);
        self.inject_window_event(window, WindowEvent::Key { key, scancode, action, mods })
    }

    fn inject_char(&mut self, window: WindowId, character: char) -> Result<()> {
        self.inject_window_event(window, WindowEvent::Char(character))
    }

    fn plug_monitor(&mut self, name: &str, mode: VideoMode) -> Result<()> {
        require_headless(self)?;
        if let Some(backend) = backend(self) {
            backend.plug_monitor(name, mode);
        }
        Ok(())
    }

    fn unplug_monitor(&mut self, monitor: MonitorId) -> Result<()> {
        let Some(native_id) = self.monitor_native_id(monitor) else {
            return self.report(Error::new(
                ErrorKind::InvalidValue,
                "invalid or disconnected monitor handle",
            ));
        };
        require_headless(self)?;
        if let Some(backend) = backend(self) {
            backend.unplug_monitor(native_id);
        }
        Ok(())
    }

    fn attach_joystick(&mut self, slot: usize, state: JoystickState) -> Result<()> {
        check_slot(self, slot)?;
        require_headless(self)?;
        if let Some(backend) = backend(self) {
            backend.set_joystick(slot, Some(state));
        }
        Ok(())
    }

    fn detach_joystick(&mut self, slot: usize) -> Result<()> {
        check_slot(self, slot)?;
        require_headless(self)?;
        if let Some(backend) = backend(self) {
            backend.set_joystick(slot, None);
        }
        Ok(())
    }

    fn software_framebuffer(&mut self, window: WindowId) -> Result<(Vec<u32>, (u32, u32))> {
        let read = match self.window_state(window) {
            None => Err(Error::new(
                ErrorKind::InvalidValue,
                "invalid or destroyed window handle",
            )),
            Some(state) => match state.context.as_ref() {
                None => Err(Error::new(
                    ErrorKind::NoWindowContext,
                    "the window was created without a context",
                )),
                Some(context) => match context.backend.color_buffer() {
                    Some(buffer) => Ok((buffer.to_vec(), state.framebuffer_size)),
                    None => Err(Error::new(
                        ErrorKind::FeatureUnavailable,
                        "the context does not render to client memory",
                    )),
                },
            },
        };
        match read {
            Ok(value) => Ok(value),
            Err(error) => self.report(error),
        }
    }
}
