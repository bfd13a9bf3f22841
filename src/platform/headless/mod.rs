//! The in-process reference backend.
//!
//! Provides the full platform contract without any display server: windows
//! are bookkeeping entries, monitors are synthetic and hot-pluggable, input
//! arrives by injection through the extension trait in
//! [`os::headless`](crate::os::headless), and contexts are software
//! rendered. The event queue is a bounded in-process queue guarded by a
//! mutex/condvar pair so that blocking waits honor their timeout contract.

use std::any::Any;
use std::collections::{HashSet, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::api::GlContextBackend;
use crate::config::{
    ContextConfig, ContextCreationApi, FramebufferConfig, GlRequest, WindowConfig,
};
use crate::error::{Error, ErrorKind, Result};
use crate::event::{Key, WindowEvent};
use crate::input::CursorMode;
use crate::joystick::{JoystickState, JOYSTICK_COUNT};
use crate::monitor::{MonitorDesc, VideoMode};
use crate::platform::{PlatformBackend, PumpMode, RawEvent};
use crate::window::WindowId;

/// Upper bound on undrained events; beyond it the oldest event is dropped.
const EVENT_QUEUE_LIMIT: usize = 1024;

/// Nominal pixel density used to derive physical sizes for synthetic
/// monitors.
const DPI: f64 = 141.0;

fn standard_modes() -> Vec<VideoMode> {
    [
        (640, 480, 60),
        (800, 600, 60),
        (1024, 768, 60),
        (1280, 720, 60),
        (1280, 1024, 60),
        (1600, 900, 60),
        (1920, 1080, 60),
        (1920, 1080, 144),
        (2560, 1440, 60),
    ]
    .into_iter()
    .map(|(width, height, refresh_rate)| VideoMode {
        width,
        height,
        red_bits: 8,
        green_bits: 8,
        blue_bits: 8,
        refresh_rate,
    })
    .collect()
}

fn physical_size(mode: &VideoMode) -> (u32, u32) {
    let to_mm = |pixels: u32| (f64::from(pixels) * 25.4 / DPI) as u32;
    (to_mm(mode.width), to_mm(mode.height))
}

pub(crate) struct HeadlessBackend {
    queue: Mutex<VecDeque<RawEvent>>,
    signal: Condvar,
    windows: HashSet<WindowId>,
    clipboard: Option<String>,
    joysticks: Vec<Option<JoystickState>>,
    next_monitor_id: u32,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            signal: Condvar::new(),
            windows: HashSet::new(),
            clipboard: None,
            joysticks: vec![None; JOYSTICK_COUNT],
            next_monitor_id: 1,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<RawEvent>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: RawEvent) {
        let mut queue = self.lock();
        if queue.len() >= EVENT_QUEUE_LIMIT {
            log::warn!("event queue overflow, dropping the oldest event");
            queue.pop_front();
        }
        queue.push_back(event);
        self.signal.notify_all();
    }

    /// Queues an event as if the OS had delivered it; drained and
    /// dispatched by the next event pump.
    pub fn inject_window_event(&self, id: WindowId, event: WindowEvent) {
        self.push(RawEvent::Window(id, event));
    }

    /// Simulates connecting a display whose preferred mode is `mode`.
    pub fn plug_monitor(&mut self, name: &str, mode: VideoMode) -> u32 {
        let native_id = self.next_monitor_id;
        self.next_monitor_id += 1;

        let mut modes = standard_modes();
        let current = match modes.iter().position(|candidate| *candidate == mode) {
            Some(index) => index,
            None => {
                modes.push(mode);
                modes.len() - 1
            },
        };

        self.push(RawEvent::MonitorConnected(MonitorDesc {
            native_id,
            name: name.to_owned(),
            position: (0, 0),
            physical_size: physical_size(&mode),
            modes,
            current_mode: current,
        }));
        native_id
    }

    /// Simulates unplugging the display with the given native id.
    pub fn unplug_monitor(&mut self, native_id: u32) {
        self.push(RawEvent::MonitorDisconnected(native_id));
    }

    /// Attaches, updates, or detaches a virtual joystick slot.
    pub fn set_joystick(&mut self, slot: usize, state: Option<JoystickState>) {
        if let Some(entry) = self.joysticks.get_mut(slot) {
            *entry = state;
        }
    }
}

impl PlatformBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn initial_monitors(&mut self) -> Vec<MonitorDesc> {
        let modes = standard_modes();
        let current = modes
            .iter()
            .position(|mode| (mode.width, mode.height, mode.refresh_rate) == (1920, 1080, 60))
            .unwrap_or(0);
        let physical = physical_size(&modes[current]);
        vec![MonitorDesc {
            native_id: 0,
            name: "Headless Display 0".to_owned(),
            position: (0, 0),
            physical_size: physical,
            modes,
            current_mode: current,
        }]
    }

    fn create_window(&mut self, id: WindowId, _config: &WindowConfig) -> Result<()> {
        self.windows.insert(id);
        Ok(())
    }

    fn destroy_window(&mut self, id: WindowId) {
        self.windows.remove(&id);
    }

    fn set_window_title(&mut self, _id: WindowId, _title: &str) -> Result<()> {
        Ok(())
    }

    fn set_window_position(&mut self, id: WindowId, position: (i32, i32)) -> Result<()> {
        self.push(RawEvent::Window(id, WindowEvent::Moved(position.0, position.1)));
        Ok(())
    }

    fn set_window_size(&mut self, id: WindowId, size: (u32, u32)) -> Result<()> {
        self.push(RawEvent::Window(id, WindowEvent::Resized(size.0, size.1)));
        self.push(RawEvent::Window(
            id,
            WindowEvent::FramebufferResized(size.0, size.1),
        ));
        Ok(())
    }

    fn set_window_visible(&mut self, _id: WindowId, _visible: bool) -> Result<()> {
        Ok(())
    }

    fn set_window_iconified(&mut self, id: WindowId, iconified: bool) -> Result<()> {
        self.push(RawEvent::Window(id, WindowEvent::Iconified(iconified)));
        if iconified {
            self.push(RawEvent::Window(id, WindowEvent::Focused(false)));
        }
        Ok(())
    }

    fn set_window_maximized(&mut self, id: WindowId, maximized: bool) -> Result<()> {
        self.push(RawEvent::Window(id, WindowEvent::Maximized(maximized)));
        Ok(())
    }

    fn focus_window(&mut self, id: WindowId) -> Result<()> {
        self.push(RawEvent::Window(id, WindowEvent::Focused(true)));
        Ok(())
    }

    fn set_cursor_position(&mut self, _id: WindowId, _position: (f64, f64)) -> Result<()> {
        Ok(())
    }

    fn set_cursor_mode(&mut self, _id: WindowId, _mode: CursorMode) -> Result<()> {
        Ok(())
    }

    fn pump(&mut self, mode: PumpMode) -> Result<Vec<RawEvent>> {
        let mut queue = self.lock();
        match mode {
            PumpMode::Poll => {},
            PumpMode::Wait(None) => {
                while queue.is_empty() {
                    queue = self
                        .signal
                        .wait(queue)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            },
            PumpMode::Wait(Some(timeout)) => {
                let deadline = Instant::now() + timeout;
                while queue.is_empty() {
                    let Some(remaining) = deadline.checked_duration_since(Instant::now())
                    else {
                        break;
                    };
                    queue = self
                        .signal
                        .wait_timeout(queue, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            },
        }
        Ok(queue.drain(..).collect())
    }

    fn wake(&mut self) {
        self.push(RawEvent::Wakeup);
    }

    fn clipboard(&mut self) -> Result<String> {
        match &self.clipboard {
            Some(text) => Ok(text.clone()),
            None => Err(Error::new(
                ErrorKind::FormatUnavailable,
                "the clipboard holds no UTF-8 text",
            )),
        }
    }

    fn set_clipboard(&mut self, text: &str) -> Result<()> {
        self.clipboard = Some(text.to_owned());
        Ok(())
    }

    fn refresh_joystick(&mut self, slot: usize) -> Option<JoystickState> {
        self.joysticks.get(slot).cloned().flatten()
    }

    fn key_scancode(&self, key: Key) -> Option<u32> {
        match key {
            Key::Unknown => None,
            // Stable synthetic numbering, offset like X11 keycodes.
            _ => Some(key as u32 + 8),
        }
    }

    fn create_context(
        &mut self,
        request: GlRequest,
        config: &ContextConfig,
        framebuffer: &FramebufferConfig,
        size: (u32, u32),
    ) -> Result<Box<dyn GlContextBackend>> {
        match config.creation_api {
            ContextCreationApi::Native => Ok(Box::new(crate::api::null::NullContext::new(
                request,
                config,
                framebuffer,
                size,
            )?)),
            #[cfg(feature = "osmesa")]
            ContextCreationApi::OsMesa => Ok(Box::new(
                crate::api::osmesa::OsMesaContext::new(request, config, framebuffer, size)?,
            )),
            #[cfg(not(feature = "osmesa"))]
            ContextCreationApi::OsMesa => Err(Error::new(
                ErrorKind::ApiUnavailable,
                "this build does not include the osmesa feature",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn poll_returns_immediately_when_empty() {
        let mut backend = HeadlessBackend::new();
        let events = backend.pump(PumpMode::Poll).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn wait_honors_the_timeout() {
        let mut backend = HeadlessBackend::new();
        let start = Instant::now();
        let events =
            backend.pump(PumpMode::Wait(Some(Duration::from_millis(20)))).unwrap();
        assert!(events.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn wake_interrupts_a_wait() {
        let mut backend = HeadlessBackend::new();
        backend.wake();
        let events = backend.pump(PumpMode::Wait(None)).unwrap();
        assert!(matches!(events.as_slice(), [RawEvent::Wakeup]));
    }

    #[test]
    fn queue_overflow_drops_the_oldest() {
        let backend = HeadlessBackend::new();
        for _ in 0..EVENT_QUEUE_LIMIT + 1 {
            backend.push(RawEvent::Wakeup);
        }
        assert_eq!(backend.lock().len(), EVENT_QUEUE_LIMIT);
    }

    #[test]
    fn clipboard_round_trip() {
        let mut backend = HeadlessBackend::new();
        let err = backend.clipboard().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatUnavailable);
        backend.set_clipboard("grüße").unwrap();
        assert_eq!(backend.clipboard().unwrap(), "grüße");
    }

    #[test]
    fn scancodes_are_stable_and_distinct() {
        let backend = HeadlessBackend::new();
        let a = backend.key_scancode(Key::A).unwrap();
        let b = backend.key_scancode(Key::B).unwrap();
        assert_ne!(a, b);
        assert_eq!(backend.key_scancode(Key::A).unwrap(), a);
        assert_eq!(backend.key_scancode(Key::Unknown), None);
    }
}
