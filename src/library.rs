//! The process-wide registry and public dispatch layer.
//!
//! A [`Library`] is created by [`init`](crate::init) and owns everything:
//! the selected platform backend, the window and monitor arenas, joystick
//! slots, global callbacks, and the timer. Every public operation validates
//! its arguments, reports failures through the error callback, and forwards
//! to the single active backend; nothing here branches on the platform.

use std::any::Any;
use std::fmt;
use std::time::Duration;

use slotmap::SlotMap;

use crate::api;
use crate::config::{ClientApi, PixelFormat, Profile, Robustness, WindowBuilder};
use crate::error::{Error, ErrorKind, Result};
use crate::event::{Action, Key, MonitorEvent, MouseButton, WindowEvent};
use crate::input::CursorMode;
use crate::joystick::JOYSTICK_COUNT;
use crate::monitor::{
    closest_video_mode, GammaRamp, Monitor, MonitorDesc, MonitorId, VideoMode,
};
use crate::platform::{self, Platform, PlatformBackend, PumpMode, RawEvent};
use crate::timer::Timer;
use crate::window::{
    CharCallback, CloseCallback, CursorEnterCallback, CursorPosCallback, DropCallback,
    FocusCallback, FramebufferSizeCallback, IconifyCallback, KeyCallback, MaximizeCallback,
    MouseButtonCallback, PosCallback, RefreshCallback, ScrollCallback, SizeCallback,
    WindowId, WindowState, WindowedRestore,
};

pub type ErrorCallback = Box<dyn FnMut(&Error)>;
pub type MonitorCallback = Box<dyn FnMut(&mut Library, MonitorId, MonitorEvent)>;

/// Takes a per-window callback out of its slot, invokes it with `&mut
/// Library`, and puts it back unless the window died or the callback
/// replaced itself meanwhile.
macro_rules! fire {
    ($self:ident, $id:ident, $slot:ident, |$cb:ident| $call:expr) => {
        if let Some(mut $cb) = $self.windows[$id].callbacks.$slot.take() {
            $call;
            if let Some(state) = $self.windows.get_mut($id) {
                if state.callbacks.$slot.is_none() {
                    state.callbacks.$slot = Some($cb);
                }
            }
        }
    };
}

/// The library instance: one initialized platform backend plus all state
/// hanging off it. Dropping it (or calling [`terminate`](Self::terminate))
/// destroys every remaining window and invalidates all handles.
pub struct Library {
    backend: Box<dyn PlatformBackend>,
    platform: Platform,
    windows: SlotMap<WindowId, WindowState>,
    monitors: SlotMap<MonitorId, Monitor>,
    /// Enumeration order; index 0 is the primary monitor.
    monitor_order: Vec<MonitorId>,
    error_callback: Option<ErrorCallback>,
    monitor_callback: Option<MonitorCallback>,
    last_error: Option<Error>,
    timer: Timer,
    dispatching: bool,
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("platform", &self.platform)
            .field("windows", &self.windows.len())
            .field("monitors", &self.monitor_order.len())
            .finish_non_exhaustive()
    }
}

impl Library {
    pub(crate) fn init(requested: Platform) -> Result<Self> {
        let (platform, mut backend) = platform::select(requested)?;
        log::debug!("initialized the {} platform backend", backend.name());

        let mut monitors = SlotMap::with_key();
        let mut monitor_order = Vec::new();
        for desc in backend.initial_monitors() {
            let id = monitors.insert(Monitor::new(desc));
            monitor_order.push(id);
        }

        Ok(Self {
            backend,
            platform,
            windows: SlotMap::with_key(),
            monitors,
            monitor_order,
            error_callback: None,
            monitor_callback: None,
            last_error: None,
            timer: Timer::new(),
            dispatching: false,
        })
    }

    /// The platform backend this instance runs on.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Destroys all remaining windows and releases the backend. Equivalent
    /// to dropping the instance, spelled out for call sites that want the
    /// teardown to be visible.
    pub fn terminate(self) {}

    // ---------------------------------------------------------------------
    // Error reporting.

    fn fail<T>(&mut self, error: Error) -> Result<T> {
        log::error!("{error}");
        self.last_error = Some(error.clone());
        if let Some(callback) = self.error_callback.as_mut() {
            callback(&error);
        }
        Err(error)
    }

    /// Installs the process-wide error callback, invoked synchronously by
    /// every failing call before it returns. Returns the previous one.
    pub fn set_error_callback(
        &mut self,
        callback: Option<ErrorCallback>,
    ) -> Option<ErrorCallback> {
        std::mem::replace(&mut self.error_callback, callback)
    }

    /// The most recent error, kept until overwritten by the next failure.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    fn ensure_window(&mut self, window: WindowId) -> Result<()> {
        if self.windows.contains_key(window) {
            Ok(())
        } else {
            self.fail(Error::new(
                ErrorKind::InvalidValue,
                "invalid or destroyed window handle",
            ))
        }
    }

    fn ensure_monitor(&mut self, monitor: MonitorId) -> Result<()> {
        if self.monitors.contains_key(monitor) {
            Ok(())
        } else {
            self.fail(Error::new(
                ErrorKind::InvalidValue,
                "invalid or disconnected monitor handle",
            ))
        }
    }

    fn ensure_not_dispatching(&mut self) -> Result<()> {
        if self.dispatching {
            self.fail(Error::new(
                ErrorKind::PlatformError,
                "event processing is not reentrant",
            ))
        } else {
            Ok(())
        }
    }

    // ---------------------------------------------------------------------
    // Window lifecycle.

    pub(crate) fn create_window(&mut self, builder: WindowBuilder) -> Result<WindowId> {
        let WindowBuilder { window: config, context, framebuffer, monitor, share } = builder;

        if config.size.0 == 0 || config.size.1 == 0 {
            return self.fail(Error::new(
                ErrorKind::InvalidValue,
                format!("invalid window size {}x{}", config.size.0, config.size.1),
            ));
        }
        if let Err(error) = crate::config::validate_context_config(&context) {
            return self.fail(error);
        }
        if let Some(monitor) = monitor {
            self.ensure_monitor(monitor)?;
        }

        let share_info = match share {
            Some(other) => {
                self.ensure_window(other)?;
                let info = self.windows[other]
                    .context
                    .as_ref()
                    .map(|context| (context.share_group, context.backend.api()));
                if info.is_none() {
                    return self.fail(Error::new(
                        ErrorKind::NoWindowContext,
                        "the share window has no context",
                    ));
                }
                info
            },
            None => None,
        };

        // The context is created before the window is registered so that a
        // failed negotiation leaves the live-window count untouched.
        let window_context = match context.request {
            None => None,
            Some(request) => {
                let backend_context = match self.backend.create_context(
                    request,
                    &context,
                    &framebuffer,
                    config.size,
                ) {
                    Ok(backend_context) => backend_context,
                    Err(error) => return self.fail(error),
                };
                if let Some((_, share_api)) = share_info {
                    if backend_context.api() != share_api {
                        return self.fail(Error::new(
                            ErrorKind::InvalidValue,
                            "contexts can only be shared within one client API family",
                        ));
                    }
                }
                Some(api::WindowContext::new(
                    backend_context,
                    share_info.map(|(group, _)| group),
                ))
            },
        };

        let id = self.windows.insert(WindowState::new(&config, window_context));
        if let Err(error) = self.backend.create_window(id, &config) {
            self.windows.remove(id);
            return self.fail(error);
        }

        if let Some(monitor) = monitor {
            if let Err(error) = self.enter_fullscreen(id, monitor, config.size, None) {
                self.backend.destroy_window(id);
                self.windows.remove(id);
                return self.fail(error);
            }
        }

        log::debug!(
            "created window {id:?} ({}x{}, fullscreen: {})",
            config.size.0,
            config.size.1,
            monitor.is_some()
        );
        Ok(id)
    }

    pub fn destroy_window(&mut self, window: WindowId) -> Result<()> {
        self.ensure_window(window)?;
        self.exit_fullscreen(window);
        // Dropping the state drops the context, which also clears any
        // current-thread binding it held.
        self.windows.remove(window);
        self.backend.destroy_window(window);
        log::debug!("destroyed window {window:?}");
        Ok(())
    }

    /// Number of live windows. Goes down only through
    /// [`destroy_window`](Self::destroy_window) or termination.
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    // ---------------------------------------------------------------------
    // Should-close and the veto contract.

    pub fn window_should_close(&mut self, window: WindowId) -> Result<bool> {
        self.ensure_window(window)?;
        Ok(self.windows[window].should_close)
    }

    pub fn set_window_should_close(&mut self, window: WindowId, value: bool) -> Result<()> {
        self.ensure_window(window)?;
        self.windows[window].should_close = value;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Window attributes.

    pub fn window_title(&mut self, window: WindowId) -> Result<String> {
        self.ensure_window(window)?;
        Ok(self.windows[window].title.clone())
    }

    pub fn set_window_title(&mut self, window: WindowId, title: &str) -> Result<()> {
        self.ensure_window(window)?;
        if let Err(error) = self.backend.set_window_title(window, title) {
            return self.fail(error);
        }
        self.windows[window].title = title.to_owned();
        Ok(())
    }

    pub fn window_position(&mut self, window: WindowId) -> Result<(i32, i32)> {
        self.ensure_window(window)?;
        Ok(self.windows[window].position)
    }

    pub fn set_window_position(&mut self, window: WindowId, x: i32, y: i32) -> Result<()> {
        self.ensure_window(window)?;
        if let Err(error) = self.backend.set_window_position(window, (x, y)) {
            return self.fail(error);
        }
        self.windows[window].position = (x, y);
        Ok(())
    }

    pub fn window_size(&mut self, window: WindowId) -> Result<(u32, u32)> {
        self.ensure_window(window)?;
        Ok(self.windows[window].size)
    }

    pub fn set_window_size(&mut self, window: WindowId, width: u32, height: u32) -> Result<()> {
        self.ensure_window(window)?;
        if width == 0 || height == 0 {
            return self.fail(Error::new(
                ErrorKind::InvalidValue,
                format!("invalid window size {width}x{height}"),
            ));
        }

        if let Some(monitor) = self.windows[window].monitor {
            // Fullscreen: the request updates the desired video mode.
            let Some(index) =
                closest_video_mode(&self.monitors[monitor].modes, width, height, None)
            else {
                return self.fail(Error::new(
                    ErrorKind::PlatformError,
                    "the monitor exposes no video modes",
                ));
            };
            self.monitors[monitor].current_mode = index;
            let mode = self.monitors[monitor].modes[index];
            self.resize_window_state(window, (mode.width, mode.height));
            let _ = self.backend.set_window_size(window, (mode.width, mode.height));
        } else {
            let size = self.windows[window].apply_size_constraints((width, height));
            if let Err(error) = self.backend.set_window_size(window, size) {
                return self.fail(error);
            }
            self.resize_window_state(window, size);
        }
        Ok(())
    }

    fn resize_window_state(&mut self, window: WindowId, size: (u32, u32)) {
        let state = &mut self.windows[window];
        state.size = size;
        state.framebuffer_size = size;
        if let Some(context) = state.context.as_mut() {
            context.backend.resize(size.0, size.1);
        }
    }

    pub fn framebuffer_size(&mut self, window: WindowId) -> Result<(u32, u32)> {
        self.ensure_window(window)?;
        Ok(self.windows[window].framebuffer_size)
    }

    pub fn set_window_size_limits(
        &mut self,
        window: WindowId,
        min: Option<(u32, u32)>,
        max: Option<(u32, u32)>,
    ) -> Result<()> {
        self.ensure_window(window)?;
        if let (Some(min), Some(max)) = (min, max) {
            if min.0 > max.0 || min.1 > max.1 {
                return self.fail(Error::new(
                    ErrorKind::InvalidValue,
                    "minimum window size exceeds the maximum",
                ));
            }
        }
        let state = &mut self.windows[window];
        state.size_limits.min = min;
        state.size_limits.max = max;
        let clamped = state.apply_size_constraints(state.size);
        if clamped != state.size && state.monitor.is_none() {
            self.resize_window_state(window, clamped);
            let _ = self.backend.set_window_size(window, clamped);
        }
        Ok(())
    }

    pub fn set_window_aspect_ratio(
        &mut self,
        window: WindowId,
        ratio: Option<(u32, u32)>,
    ) -> Result<()> {
        self.ensure_window(window)?;
        if let Some((numerator, denominator)) = ratio {
            if numerator == 0 || denominator == 0 {
                return self.fail(Error::new(
                    ErrorKind::InvalidValue,
                    "aspect ratio terms must be positive",
                ));
            }
        }
        self.windows[window].aspect_ratio = ratio;
        Ok(())
    }

    pub fn iconify_window(&mut self, window: WindowId) -> Result<()> {
        self.ensure_window(window)?;
        if let Err(error) = self.backend.set_window_iconified(window, true) {
            return self.fail(error);
        }
        self.windows[window].iconified = true;
        Ok(())
    }

    pub fn restore_window(&mut self, window: WindowId) -> Result<()> {
        self.ensure_window(window)?;
        if let Err(error) = self.backend.set_window_iconified(window, false) {
            return self.fail(error);
        }
        let state = &mut self.windows[window];
        state.iconified = false;
        if state.maximized {
            state.maximized = false;
            let _ = self.backend.set_window_maximized(window, false);
        }
        Ok(())
    }

    pub fn maximize_window(&mut self, window: WindowId) -> Result<()> {
        self.ensure_window(window)?;
        if self.windows[window].monitor.is_some() {
            // Maximizing is a windowed-mode concept.
            return Ok(());
        }
        if let Err(error) = self.backend.set_window_maximized(window, true) {
            return self.fail(error);
        }
        self.windows[window].maximized = true;
        Ok(())
    }

    pub fn show_window(&mut self, window: WindowId) -> Result<()> {
        self.ensure_window(window)?;
        if let Err(error) = self.backend.set_window_visible(window, true) {
            return self.fail(error);
        }
        self.windows[window].visible = true;
        Ok(())
    }

    pub fn hide_window(&mut self, window: WindowId) -> Result<()> {
        self.ensure_window(window)?;
        if let Err(error) = self.backend.set_window_visible(window, false) {
            return self.fail(error);
        }
        let state = &mut self.windows[window];
        state.visible = false;
        state.focused = false;
        Ok(())
    }

    pub fn focus_window(&mut self, window: WindowId) -> Result<()> {
        self.ensure_window(window)?;
        if !self.windows[window].visible {
            return self.fail(Error::new(
                ErrorKind::PlatformError,
                "a hidden window cannot take input focus",
            ));
        }
        if let Err(error) = self.backend.focus_window(window) {
            return self.fail(error);
        }
        // Focus is exclusive.
        for (id, state) in self.windows.iter_mut() {
            state.focused = id == window;
        }
        Ok(())
    }

    pub fn window_focused(&mut self, window: WindowId) -> Result<bool> {
        self.ensure_window(window)?;
        Ok(self.windows[window].focused)
    }

    pub fn window_iconified(&mut self, window: WindowId) -> Result<bool> {
        self.ensure_window(window)?;
        Ok(self.windows[window].iconified)
    }

    pub fn window_maximized(&mut self, window: WindowId) -> Result<bool> {
        self.ensure_window(window)?;
        Ok(self.windows[window].maximized)
    }

    pub fn window_visible(&mut self, window: WindowId) -> Result<bool> {
        self.ensure_window(window)?;
        Ok(self.windows[window].visible)
    }

    pub fn window_resizable(&mut self, window: WindowId) -> Result<bool> {
        self.ensure_window(window)?;
        Ok(self.windows[window].resizable)
    }

    pub fn window_decorated(&mut self, window: WindowId) -> Result<bool> {
        self.ensure_window(window)?;
        Ok(self.windows[window].decorated)
    }

    pub fn window_floating(&mut self, window: WindowId) -> Result<bool> {
        self.ensure_window(window)?;
        Ok(self.windows[window].floating)
    }

    pub fn window_auto_iconify(&mut self, window: WindowId) -> Result<bool> {
        self.ensure_window(window)?;
        Ok(self.windows[window].auto_iconify)
    }

    pub fn window_hovered(&mut self, window: WindowId) -> Result<bool> {
        self.ensure_window(window)?;
        Ok(self.windows[window].input.cursor_inside)
    }

    pub fn set_window_user_data(
        &mut self,
        window: WindowId,
        data: Option<Box<dyn Any>>,
    ) -> Result<Option<Box<dyn Any>>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(&mut self.windows[window].user_data, data))
    }

    pub fn window_user_data(&mut self, window: WindowId) -> Result<Option<&mut dyn Any>> {
        self.ensure_window(window)?;
        Ok(self.windows[window].user_data.as_deref_mut())
    }

    // ---------------------------------------------------------------------
    // Fullscreen transitions.

    pub fn window_monitor(&mut self, window: WindowId) -> Result<Option<MonitorId>> {
        self.ensure_window(window)?;
        Ok(self.windows[window].monitor)
    }

    /// Moves the window between windowed and exclusive fullscreen. Entering
    /// fullscreen switches the monitor to the video mode closest to `size`;
    /// leaving restores the mode the monitor held before, exactly.
    pub fn set_window_monitor(
        &mut self,
        window: WindowId,
        monitor: Option<MonitorId>,
        size: (u32, u32),
        refresh_rate: Option<u32>,
    ) -> Result<()> {
        self.ensure_window(window)?;
        if size.0 == 0 || size.1 == 0 {
            return self.fail(Error::new(
                ErrorKind::InvalidValue,
                format!("invalid window size {}x{}", size.0, size.1),
            ));
        }

        match monitor {
            Some(monitor) => {
                self.ensure_monitor(monitor)?;
                if self.windows[window].monitor.is_some() {
                    // Fullscreen to fullscreen: restore the old monitor
                    // first so only one mode switch is live at a time.
                    self.exit_fullscreen(window);
                }
                if let Err(error) = self.enter_fullscreen(window, monitor, size, refresh_rate)
                {
                    return self.fail(error);
                }
            },
            None => {
                self.exit_fullscreen(window);
                self.set_window_size(window, size.0, size.1)?;
            },
        }
        Ok(())
    }

    fn enter_fullscreen(
        &mut self,
        window: WindowId,
        monitor: MonitorId,
        size: (u32, u32),
        refresh_rate: Option<u32>,
    ) -> Result<()> {
        let Some(index) = closest_video_mode(
            &self.monitors[monitor].modes,
            size.0,
            size.1,
            refresh_rate,
        ) else {
            return Err(Error::new(
                ErrorKind::PlatformError,
                "the monitor exposes no video modes",
            ));
        };

        let previous_mode = self.monitors[monitor].current_mode;
        self.monitors[monitor].current_mode = index;
        let mode = self.monitors[monitor].modes[index];
        let monitor_position = self.monitors[monitor].position;

        let state = &mut self.windows[window];
        state.restore = Some(WindowedRestore {
            position: state.position,
            size: state.size,
            monitor_mode: previous_mode,
        });
        state.monitor = Some(monitor);
        state.position = monitor_position;
        self.resize_window_state(window, (mode.width, mode.height));
        Ok(())
    }

    /// Leaves fullscreen, restoring the monitor's prior video mode and the
    /// window's windowed geometry. No-op for windowed windows.
    fn exit_fullscreen(&mut self, window: WindowId) {
        let state = &mut self.windows[window];
        let Some(monitor) = state.monitor.take() else {
            return;
        };
        let Some(restore) = state.restore.take() else {
            return;
        };
        state.position = restore.position;
        self.resize_window_state(window, restore.size);
        if let Some(monitor) = self.monitors.get_mut(monitor) {
            monitor.current_mode = restore.monitor_mode;
        }
    }

    // ---------------------------------------------------------------------
    // Event pumping and dispatch.

    /// Processes pending events and returns immediately.
    pub fn poll_events(&mut self) -> Result<()> {
        self.pump(PumpMode::Poll)
    }

    /// Blocks until at least one event arrives, then processes everything
    /// pending.
    pub fn wait_events(&mut self) -> Result<()> {
        self.pump(PumpMode::Wait(None))
    }

    /// Like [`wait_events`](Self::wait_events) but returns without error
    /// once `timeout` elapses with no event.
    pub fn wait_events_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.pump(PumpMode::Wait(Some(timeout)))
    }

    /// Posts an empty event, causing a blocking wait to return.
    pub fn post_empty_event(&mut self) -> Result<()> {
        self.backend.wake();
        Ok(())
    }

    fn pump(&mut self, mode: PumpMode) -> Result<()> {
        self.ensure_not_dispatching()?;
        let events = match self.backend.pump(mode) {
            Ok(events) => events,
            Err(error) => return self.fail(error),
        };

        self.dispatching = true;
        for event in events {
            match event {
                RawEvent::Wakeup => {},
                RawEvent::MonitorConnected(desc) => self.monitor_connected(desc),
                RawEvent::MonitorDisconnected(native_id) => {
                    self.monitor_disconnected(native_id)
                },
                RawEvent::Window(id, event) => self.window_event(id, event),
            }
        }
        self.dispatching = false;
        Ok(())
    }

    fn monitor_connected(&mut self, desc: MonitorDesc) {
        log::debug!("monitor connected: {}", desc.name);
        let id = self.monitors.insert(Monitor::new(desc));
        self.monitor_order.push(id);
        if let Some(mut callback) = self.monitor_callback.take() {
            callback(self, id, MonitorEvent::Connected);
            if self.monitor_callback.is_none() {
                self.monitor_callback = Some(callback);
            }
        }
    }

    fn monitor_disconnected(&mut self, native_id: u32) {
        let Some(id) = self
            .monitors
            .iter()
            .find(|(_, monitor)| monitor.native_id == native_id)
            .map(|(id, _)| id)
        else {
            return;
        };

        // Fullscreen windows on the dying monitor fall back to windowed.
        let fullscreen: Vec<WindowId> = self
            .windows
            .iter()
            .filter(|(_, state)| state.monitor == Some(id))
            .map(|(window, _)| window)
            .collect();
        for window in fullscreen {
            self.exit_fullscreen(window);
        }

        // The handle is invalidated before the callback runs, so a stale
        // handle stored by the application is already detectable inside it.
        let monitor = self.monitors.remove(id);
        self.monitor_order.retain(|candidate| *candidate != id);
        if let Some(monitor) = monitor {
            log::debug!("monitor disconnected: {}", monitor.name);
        }
        if let Some(mut callback) = self.monitor_callback.take() {
            callback(self, id, MonitorEvent::Disconnected);
            if self.monitor_callback.is_none() {
                self.monitor_callback = Some(callback);
            }
        }
    }

    fn window_event(&mut self, id: WindowId, event: WindowEvent) {
        // Events queued before destruction must never reach a callback.
        if !self.windows.contains_key(id) {
            return;
        }

        match &event {
            WindowEvent::Moved(x, y) => self.windows[id].position = (*x, *y),
            WindowEvent::Resized(width, height) => {
                self.windows[id].size = (*width, *height);
            },
            WindowEvent::FramebufferResized(width, height) => {
                let state = &mut self.windows[id];
                state.framebuffer_size = (*width, *height);
                if let Some(context) = state.context.as_mut() {
                    context.backend.resize(*width, *height);
                }
            },
            WindowEvent::Focused(focused) => self.windows[id].focused = *focused,
            WindowEvent::Iconified(iconified) => self.windows[id].iconified = *iconified,
            WindowEvent::Maximized(maximized) => self.windows[id].maximized = *maximized,
            WindowEvent::Key { key, action, .. } => {
                self.windows[id].input.record_key(*key, *action);
            },
            WindowEvent::MouseButton { button, action, .. } => {
                self.windows[id].input.record_button(*button, *action);
            },
            WindowEvent::CursorMoved(x, y) => {
                self.windows[id].input.cursor_pos = (*x, *y);
            },
            WindowEvent::CursorEntered(inside) => {
                self.windows[id].input.cursor_inside = *inside;
            },
            WindowEvent::CloseRequested
            | WindowEvent::Refresh
            | WindowEvent::Char(_)
            | WindowEvent::Scroll(..)
            | WindowEvent::FileDropped(_) => {},
        }

        match event {
            WindowEvent::CloseRequested => {
                if self.windows[id].callbacks.close.is_some() {
                    fire!(self, id, close, |cb| {
                        let verdict = cb(self, id);
                        if let Some(state) = self.windows.get_mut(id) {
                            state.should_close = verdict;
                        }
                    });
                } else {
                    self.windows[id].should_close = true;
                }
            },
            WindowEvent::Moved(x, y) => {
                fire!(self, id, pos, |cb| cb(self, id, x, y));
            },
            WindowEvent::Resized(width, height) => {
                fire!(self, id, size, |cb| cb(self, id, width, height));
            },
            WindowEvent::FramebufferResized(width, height) => {
                fire!(self, id, framebuffer_size, |cb| cb(self, id, width, height));
            },
            WindowEvent::Refresh => {
                fire!(self, id, refresh, |cb| cb(self, id));
            },
            WindowEvent::Focused(focused) => {
                fire!(self, id, focus, |cb| cb(self, id, focused));
            },
            WindowEvent::Iconified(iconified) => {
                fire!(self, id, iconify, |cb| cb(self, id, iconified));
            },
            WindowEvent::Maximized(maximized) => {
                fire!(self, id, maximize, |cb| cb(self, id, maximized));
            },
            WindowEvent::Key { key, scancode, action, mods } => {
                fire!(self, id, key, |cb| cb(self, id, key, scancode, action, mods));
            },
            WindowEvent::Char(character) => {
                fire!(self, id, char, |cb| cb(self, id, character));
            },
            WindowEvent::MouseButton { button, action, mods } => {
                fire!(self, id, mouse_button, |cb| cb(self, id, button, action, mods));
            },
            WindowEvent::CursorMoved(x, y) => {
                fire!(self, id, cursor_pos, |cb| cb(self, id, x, y));
            },
            WindowEvent::CursorEntered(inside) => {
                fire!(self, id, cursor_enter, |cb| cb(self, id, inside));
            },
            WindowEvent::Scroll(x, y) => {
                fire!(self, id, scroll, |cb| cb(self, id, x, y));
            },
            WindowEvent::FileDropped(paths) => {
                fire!(self, id, drop, |cb| cb(self, id, &paths));
            },
        }
    }

    // ---------------------------------------------------------------------
    // Per-window callback registration. Each setter returns the previously
    // installed callback.

    pub fn set_window_pos_callback(
        &mut self,
        window: WindowId,
        callback: Option<PosCallback>,
    ) -> Result<Option<PosCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(&mut self.windows[window].callbacks.pos, callback))
    }

    pub fn set_window_size_callback(
        &mut self,
        window: WindowId,
        callback: Option<SizeCallback>,
    ) -> Result<Option<SizeCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(&mut self.windows[window].callbacks.size, callback))
    }

    pub fn set_framebuffer_size_callback(
        &mut self,
        window: WindowId,
        callback: Option<FramebufferSizeCallback>,
    ) -> Result<Option<FramebufferSizeCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(
            &mut self.windows[window].callbacks.framebuffer_size,
            callback,
        ))
    }

    pub fn set_window_close_callback(
        &mut self,
        window: WindowId,
        callback: Option<CloseCallback>,
    ) -> Result<Option<CloseCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(&mut self.windows[window].callbacks.close, callback))
    }

    pub fn set_window_refresh_callback(
        &mut self,
        window: WindowId,
        callback: Option<RefreshCallback>,
    ) -> Result<Option<RefreshCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(&mut self.windows[window].callbacks.refresh, callback))
    }

    pub fn set_window_focus_callback(
        &mut self,
        window: WindowId,
        callback: Option<FocusCallback>,
    ) -> Result<Option<FocusCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(&mut self.windows[window].callbacks.focus, callback))
    }

    pub fn set_window_iconify_callback(
        &mut self,
        window: WindowId,
        callback: Option<IconifyCallback>,
    ) -> Result<Option<IconifyCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(&mut self.windows[window].callbacks.iconify, callback))
    }

    pub fn set_window_maximize_callback(
        &mut self,
        window: WindowId,
        callback: Option<MaximizeCallback>,
    ) -> Result<Option<MaximizeCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(&mut self.windows[window].callbacks.maximize, callback))
    }

    pub fn set_key_callback(
        &mut self,
        window: WindowId,
        callback: Option<KeyCallback>,
    ) -> Result<Option<KeyCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(&mut self.windows[window].callbacks.key, callback))
    }

    pub fn set_char_callback(
        &mut self,
        window: WindowId,
        callback: Option<CharCallback>,
    ) -> Result<Option<CharCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(&mut self.windows[window].callbacks.char, callback))
    }

    pub fn set_mouse_button_callback(
        &mut self,
        window: WindowId,
        callback: Option<MouseButtonCallback>,
    ) -> Result<Option<MouseButtonCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(
            &mut self.windows[window].callbacks.mouse_button,
            callback,
        ))
    }

    pub fn set_cursor_pos_callback(
        &mut self,
        window: WindowId,
        callback: Option<CursorPosCallback>,
    ) -> Result<Option<CursorPosCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(&mut self.windows[window].callbacks.cursor_pos, callback))
    }

    pub fn set_cursor_enter_callback(
        &mut self,
        window: WindowId,
        callback: Option<CursorEnterCallback>,
    ) -> Result<Option<CursorEnterCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(
            &mut self.windows[window].callbacks.cursor_enter,
            callback,
        ))
    }

    pub fn set_scroll_callback(
        &mut self,
        window: WindowId,
        callback: Option<ScrollCallback>,
    ) -> Result<Option<ScrollCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(&mut self.windows[window].callbacks.scroll, callback))
    }

    pub fn set_drop_callback(
        &mut self,
        window: WindowId,
        callback: Option<DropCallback>,
    ) -> Result<Option<DropCallback>> {
        self.ensure_window(window)?;
        Ok(std::mem::replace(&mut self.windows[window].callbacks.drop, callback))
    }

    /// Installs the monitor hot-plug callback. Returns the previous one.
    pub fn set_monitor_callback(
        &mut self,
        callback: Option<MonitorCallback>,
    ) -> Option<MonitorCallback> {
        std::mem::replace(&mut self.monitor_callback, callback)
    }

    // ---------------------------------------------------------------------
    // Monitors.

    /// Connected monitors in stable enumeration order.
    pub fn monitors(&self) -> Vec<MonitorId> {
        self.monitor_order.clone()
    }

    pub fn primary_monitor(&self) -> Option<MonitorId> {
        self.monitor_order.first().copied()
    }

    pub fn monitor_name(&mut self, monitor: MonitorId) -> Result<String> {
        self.ensure_monitor(monitor)?;
        Ok(self.monitors[monitor].name.clone())
    }

    pub fn monitor_position(&mut self, monitor: MonitorId) -> Result<(i32, i32)> {
        self.ensure_monitor(monitor)?;
        Ok(self.monitors[monitor].position)
    }

    /// Physical size in millimetres.
    pub fn monitor_physical_size(&mut self, monitor: MonitorId) -> Result<(u32, u32)> {
        self.ensure_monitor(monitor)?;
        Ok(self.monitors[monitor].physical_size)
    }

    pub fn video_modes(&mut self, monitor: MonitorId) -> Result<Vec<VideoMode>> {
        self.ensure_monitor(monitor)?;
        Ok(self.monitors[monitor].modes.clone())
    }

    pub fn current_video_mode(&mut self, monitor: MonitorId) -> Result<VideoMode> {
        self.ensure_monitor(monitor)?;
        let monitor = &self.monitors[monitor];
        Ok(monitor.modes[monitor.current_mode])
    }

    /// Generates and installs a gamma ramp for the given exponent.
    pub fn set_gamma(&mut self, monitor: MonitorId, gamma: f32) -> Result<()> {
        self.ensure_monitor(monitor)?;
        let ramp = match GammaRamp::from_exponent(gamma) {
            Ok(ramp) => ramp,
            Err(error) => return self.fail(error),
        };
        self.monitors[monitor].gamma_ramp = ramp;
        Ok(())
    }

    pub fn set_gamma_ramp(&mut self, monitor: MonitorId, ramp: &GammaRamp) -> Result<()> {
        self.ensure_monitor(monitor)?;
        if let Err(error) = ramp.validate() {
            return self.fail(error);
        }
        self.monitors[monitor].gamma_ramp = ramp.clone();
        Ok(())
    }

    pub fn gamma_ramp(&mut self, monitor: MonitorId) -> Result<GammaRamp> {
        self.ensure_monitor(monitor)?;
        Ok(self.monitors[monitor].gamma_ramp.clone())
    }

    // ---------------------------------------------------------------------
    // Input state and modes.

    pub fn get_key(&mut self, window: WindowId, key: Key) -> Result<Action> {
        self.ensure_window(window)?;
        Ok(self.windows[window].input.key(key))
    }

    pub fn get_mouse_button(
        &mut self,
        window: WindowId,
        button: MouseButton,
    ) -> Result<Action> {
        self.ensure_window(window)?;
        Ok(self.windows[window].input.button(button))
    }

    pub fn set_sticky_keys(&mut self, window: WindowId, enabled: bool) -> Result<()> {
        self.ensure_window(window)?;
        self.windows[window].input.set_sticky_keys(enabled);
        Ok(())
    }

    pub fn sticky_keys(&mut self, window: WindowId) -> Result<bool> {
        self.ensure_window(window)?;
        Ok(self.windows[window].input.sticky_keys)
    }

    pub fn set_sticky_buttons(&mut self, window: WindowId, enabled: bool) -> Result<()> {
        self.ensure_window(window)?;
        self.windows[window].input.set_sticky_buttons(enabled);
        Ok(())
    }

    pub fn sticky_buttons(&mut self, window: WindowId) -> Result<bool> {
        self.ensure_window(window)?;
        Ok(self.windows[window].input.sticky_buttons)
    }

    pub fn set_cursor_mode(&mut self, window: WindowId, mode: CursorMode) -> Result<()> {
        self.ensure_window(window)?;
        if let Err(error) = self.backend.set_cursor_mode(window, mode) {
            return self.fail(error);
        }
        self.windows[window].input.cursor_mode = mode;
        Ok(())
    }

    pub fn cursor_mode(&mut self, window: WindowId) -> Result<CursorMode> {
        self.ensure_window(window)?;
        Ok(self.windows[window].input.cursor_mode)
    }

    /// Last reported cursor position, window-client-relative.
    pub fn cursor_position(&mut self, window: WindowId) -> Result<(f64, f64)> {
        self.ensure_window(window)?;
        Ok(self.windows[window].input.cursor_pos)
    }

    /// Warps the cursor. Does not generate a motion event.
    pub fn set_cursor_position(&mut self, window: WindowId, x: f64, y: f64) -> Result<()> {
        self.ensure_window(window)?;
        if !x.is_finite() || !y.is_finite() {
            return self.fail(Error::new(
                ErrorKind::InvalidValue,
                format!("invalid cursor position ({x}, {y})"),
            ));
        }
        if let Err(error) = self.backend.set_cursor_position(window, (x, y)) {
            return self.fail(error);
        }
        self.windows[window].input.cursor_pos = (x, y);
        Ok(())
    }

    /// The backend's native scancode for a key token.
    pub fn key_scancode(&self, key: Key) -> Option<u32> {
        self.backend.key_scancode(key)
    }

    // ---------------------------------------------------------------------
    // Joysticks.

    fn ensure_joystick(&mut self, slot: usize) -> Result<()> {
        if slot < JOYSTICK_COUNT {
            Ok(())
        } else {
            self.fail(Error::new(
                ErrorKind::InvalidEnum,
                format!("joystick slot {slot} is out of range"),
            ))
        }
    }

    pub fn joystick_present(&mut self, slot: usize) -> Result<bool> {
        self.ensure_joystick(slot)?;
        Ok(self.backend.refresh_joystick(slot).is_some())
    }

    pub fn joystick_name(&mut self, slot: usize) -> Result<Option<String>> {
        self.ensure_joystick(slot)?;
        Ok(self.backend.refresh_joystick(slot).map(|state| state.name))
    }

    pub fn joystick_axes(&mut self, slot: usize) -> Result<Option<Vec<f32>>> {
        self.ensure_joystick(slot)?;
        Ok(self.backend.refresh_joystick(slot).map(|state| state.axes))
    }

    pub fn joystick_buttons(&mut self, slot: usize) -> Result<Option<Vec<bool>>> {
        self.ensure_joystick(slot)?;
        Ok(self.backend.refresh_joystick(slot).map(|state| state.buttons))
    }

    // ---------------------------------------------------------------------
    // Clipboard.

    pub fn clipboard_string(&mut self, window: WindowId) -> Result<String> {
        self.ensure_window(window)?;
        match self.backend.clipboard() {
            Ok(text) => Ok(text),
            Err(error) => self.fail(error),
        }
    }

    pub fn set_clipboard_string(&mut self, window: WindowId, text: &str) -> Result<()> {
        self.ensure_window(window)?;
        match self.backend.set_clipboard(text) {
            Ok(()) => Ok(()),
            Err(error) => self.fail(error),
        }
    }

    // ---------------------------------------------------------------------
    // Timer.

    /// Seconds since initialization or the last [`set_time`](Self::set_time).
    pub fn get_time(&self) -> f64 {
        self.timer.get()
    }

    pub fn set_time(&mut self, time: f64) -> Result<()> {
        if let Err(error) = self.timer.set(time) {
            return self.fail(error);
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Contexts.

    /// Binds the window's context to the calling thread, or detaches the
    /// thread's current context when `window` is `None`. A context current
    /// on another thread cannot be taken over; the call fails instead.
    pub fn make_context_current(&mut self, window: Option<WindowId>) -> Result<()> {
        let Some(window) = window else {
            if let Some(context_id) = api::unbind() {
                if let Some(state) = self
                    .windows
                    .values_mut()
                    .find(|state| {
                        state.context.as_ref().map(|context| context.id) == Some(context_id)
                    })
                {
                    if let Some(context) = state.context.as_mut() {
                        let _ = context.backend.make_not_current();
                    }
                }
            }
            return Ok(());
        };

        self.ensure_window(window)?;
        let context_id = self.windows[window].context.as_ref().map(|context| context.id);
        let Some(context_id) = context_id else {
            return self.fail(Error::new(
                ErrorKind::NoWindowContext,
                "the window was created without a context",
            ));
        };

        if let Err(error) = api::bind(context_id) {
            return self.fail(error);
        }
        let bound = match self.windows[window].context.as_mut() {
            Some(context) => context.backend.make_current(),
            None => Ok(()),
        };
        if let Err(error) = bound {
            api::unbind();
            return self.fail(error);
        }
        Ok(())
    }

    /// The window whose context is current on the calling thread.
    pub fn current_context(&self) -> Option<WindowId> {
        let context_id = api::current()?;
        self.windows
            .iter()
            .find(|(_, state)| {
                state.context.as_ref().map(|context| context.id) == Some(context_id)
            })
            .map(|(window, _)| window)
    }

    pub fn swap_buffers(&mut self, window: WindowId) -> Result<()> {
        self.ensure_window(window)?;
        if self.windows[window].context.is_none() {
            return self.fail(Error::new(
                ErrorKind::NoWindowContext,
                "the window was created without a context",
            ));
        }
        let result = match self.windows[window].context.as_mut() {
            Some(context) => context.backend.swap_buffers(),
            None => Ok(()),
        };
        if let Err(error) = result {
            return self.fail(error);
        }
        Ok(())
    }

    /// Sets the swap interval of the context current on the calling thread.
    pub fn set_swap_interval(&mut self, interval: i32) -> Result<()> {
        let Some(window) = self.current_context() else {
            return self.fail(Error::new(
                ErrorKind::NoCurrentContext,
                "no context is current on this thread",
            ));
        };
        let result = match self.windows[window].context.as_mut() {
            Some(context) => context.backend.set_swap_interval(interval),
            None => Ok(()),
        };
        if let Err(error) = result {
            return self.fail(error);
        }
        Ok(())
    }

    /// Resolves a client API entry point through the current context.
    pub fn get_proc_address(&mut self, symbol: &str) -> Result<*const std::os::raw::c_void> {
        if symbol.is_empty() {
            return self.fail(Error::new(ErrorKind::InvalidValue, "empty symbol name"));
        }
        let Some(window) = self.current_context() else {
            return self.fail(Error::new(
                ErrorKind::NoCurrentContext,
                "no context is current on this thread",
            ));
        };
        Ok(self.windows[window]
            .context
            .as_ref()
            .map_or(std::ptr::null(), |context| context.backend.get_proc_address(symbol)))
    }

    /// Whether the current context supports the named extension.
    pub fn extension_supported(&mut self, extension: &str) -> Result<bool> {
        if extension.is_empty() {
            return self.fail(Error::new(ErrorKind::InvalidValue, "empty extension name"));
        }
        let Some(window) = self.current_context() else {
            return self.fail(Error::new(
                ErrorKind::NoCurrentContext,
                "no context is current on this thread",
            ));
        };
        Ok(self.windows[window]
            .context
            .as_ref()
            .map_or(false, |context| context.backend.extension_supported(extension)))
    }

    // ---------------------------------------------------------------------
    // Context attribute queries.

    pub fn window_client_api(&mut self, window: WindowId) -> Result<ClientApi> {
        self.ensure_window(window)?;
        Ok(self.windows[window]
            .context
            .as_ref()
            .map_or(ClientApi::None, api::WindowContext::client_api))
    }

    pub fn window_context_version(&mut self, window: WindowId) -> Result<(u8, u8)> {
        self.with_context(window, |context| context.backend.version())
    }

    pub fn window_context_profile(&mut self, window: WindowId) -> Result<Option<Profile>> {
        self.with_context(window, |context| context.backend.profile())
    }

    pub fn window_context_robustness(&mut self, window: WindowId) -> Result<Robustness> {
        self.with_context(window, |context| context.backend.robustness())
    }

    pub fn window_context_forward_compat(&mut self, window: WindowId) -> Result<bool> {
        self.with_context(window, |context| context.backend.forward_compat())
    }

    pub fn window_context_debug(&mut self, window: WindowId) -> Result<bool> {
        self.with_context(window, |context| context.backend.debug())
    }

    /// The framebuffer format actually selected at creation.
    pub fn window_pixel_format(&mut self, window: WindowId) -> Result<PixelFormat> {
        self.with_context(window, |context| context.backend.pixel_format().clone())
    }

    fn with_context<T>(
        &mut self,
        window: WindowId,
        read: impl FnOnce(&api::WindowContext) -> T,
    ) -> Result<T> {
        self.ensure_window(window)?;
        let value = self.windows[window].context.as_ref().map(read);
        match value {
            Some(value) => Ok(value),
            None => self.fail(Error::new(
                ErrorKind::NoWindowContext,
                "the window was created without a context",
            )),
        }
    }

    // ---------------------------------------------------------------------
    // Crate-internal access for the platform extension traits.

    pub(crate) fn backend_mut(&mut self) -> &mut dyn PlatformBackend {
        self.backend.as_mut()
    }

    pub(crate) fn window_state(&self, window: WindowId) -> Option<&WindowState> {
        self.windows.get(window)
    }

    pub(crate) fn monitor_native_id(&self, monitor: MonitorId) -> Option<u32> {
        self.monitors.get(monitor).map(|monitor| monitor.native_id)
    }

    pub(crate) fn report<T>(&mut self, error: Error) -> Result<T> {
        self.fail(error)
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        let windows: Vec<WindowId> = self.windows.keys().collect();
        for window in windows {
            self.exit_fullscreen(window);
            self.windows.remove(window);
            self.backend.destroy_window(window);
        }
        self.monitors.clear();
        self.monitor_order.clear();
        log::debug!("terminated the {} platform backend", self.backend.name());
    }
}
