//! Window state and per-window callbacks.

use std::any::Any;
use std::path::PathBuf;

use crate::api::WindowContext;
use crate::config::WindowConfig;
use crate::event::{Action, Key, Modifiers, MouseButton};
use crate::input::InputState;
use crate::monitor::MonitorId;
use crate::Library;

slotmap::new_key_type! {
    /// Handle to a live window. Goes stale once the window is destroyed;
    /// operations on a stale handle fail with
    /// [`InvalidValue`](crate::ErrorKind::InvalidValue).
    pub struct WindowId;
}

pub type PosCallback = Box<dyn FnMut(&mut Library, WindowId, i32, i32)>;
pub type SizeCallback = Box<dyn FnMut(&mut Library, WindowId, u32, u32)>;
pub type FramebufferSizeCallback = Box<dyn FnMut(&mut Library, WindowId, u32, u32)>;
/// The returned value becomes the window's new should-close flag, so a
/// close callback can veto the request by returning `false`.
pub type CloseCallback = Box<dyn FnMut(&mut Library, WindowId) -> bool>;
pub type RefreshCallback = Box<dyn FnMut(&mut Library, WindowId)>;
pub type FocusCallback = Box<dyn FnMut(&mut Library, WindowId, bool)>;
pub type IconifyCallback = Box<dyn FnMut(&mut Library, WindowId, bool)>;
pub type MaximizeCallback = Box<dyn FnMut(&mut Library, WindowId, bool)>;
pub type KeyCallback = Box<dyn FnMut(&mut Library, WindowId, Key, u32, Action, Modifiers)>;
pub type CharCallback = Box<dyn FnMut(&mut Library, WindowId, char)>;
pub type MouseButtonCallback =
    Box<dyn FnMut(&mut Library, WindowId, MouseButton, Action, Modifiers)>;
pub type CursorPosCallback = Box<dyn FnMut(&mut Library, WindowId, f64, f64)>;
pub type CursorEnterCallback = Box<dyn FnMut(&mut Library, WindowId, bool)>;
pub type ScrollCallback = Box<dyn FnMut(&mut Library, WindowId, f64, f64)>;
pub type DropCallback = Box<dyn FnMut(&mut Library, WindowId, &[PathBuf])>;

#[derive(Default)]
pub(crate) struct WindowCallbacks {
    pub pos: Option<PosCallback>,
    pub size: Option<SizeCallback>,
    pub framebuffer_size: Option<FramebufferSizeCallback>,
    pub close: Option<CloseCallback>,
    pub refresh: Option<RefreshCallback>,
    pub focus: Option<FocusCallback>,
    pub iconify: Option<IconifyCallback>,
    pub maximize: Option<MaximizeCallback>,
    pub key: Option<KeyCallback>,
    pub char: Option<CharCallback>,
    pub mouse_button: Option<MouseButtonCallback>,
    pub cursor_pos: Option<CursorPosCallback>,
    pub cursor_enter: Option<CursorEnterCallback>,
    pub scroll: Option<ScrollCallback>,
    pub drop: Option<DropCallback>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SizeLimits {
    pub min: Option<(u32, u32)>,
    pub max: Option<(u32, u32)>,
}

impl SizeLimits {
    pub fn clamp(&self, size: (u32, u32)) -> (u32, u32) {
        let (mut width, mut height) = size;
        if let Some((min_w, min_h)) = self.min {
            width = width.max(min_w);
            height = height.max(min_h);
        }
        if let Some((max_w, max_h)) = self.max {
            width = width.min(max_w);
            height = height.min(max_h);
        }
        (width, height)
    }
}

/// The windowed-mode geometry remembered across a fullscreen round trip.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WindowedRestore {
    pub position: (i32, i32),
    pub size: (u32, u32),
    /// Video mode index the monitor held before the switch.
    pub monitor_mode: usize,
}

pub(crate) struct WindowState {
    pub title: String,
    pub position: (i32, i32),
    pub size: (u32, u32),
    pub framebuffer_size: (u32, u32),
    pub size_limits: SizeLimits,
    pub aspect_ratio: Option<(u32, u32)>,
    pub visible: bool,
    pub resizable: bool,
    pub decorated: bool,
    pub focused: bool,
    pub iconified: bool,
    pub maximized: bool,
    pub floating: bool,
    pub auto_iconify: bool,
    pub should_close: bool,
    pub monitor: Option<MonitorId>,
    pub restore: Option<WindowedRestore>,
    pub input: InputState,
    pub callbacks: WindowCallbacks,
    pub user_data: Option<Box<dyn Any>>,
    pub context: Option<WindowContext>,
}

impl WindowState {
    pub fn new(config: &WindowConfig, context: Option<WindowContext>) -> Self {
        Self {
            title: config.title.clone(),
            position: config.position.unwrap_or((0, 0)),
            size: config.size,
            // The headless backend has no HiDPI scaling, so the two sizes
            // coincide until a backend reports otherwise.
            framebuffer_size: config.size,
            size_limits: SizeLimits::default(),
            aspect_ratio: None,
            visible: config.visible,
            resizable: config.resizable,
            decorated: config.decorated,
            focused: config.focused && config.visible,
            iconified: false,
            maximized: false,
            floating: config.floating,
            auto_iconify: config.auto_iconify,
            should_close: false,
            monitor: None,
            restore: None,
            input: InputState::new(),
            callbacks: WindowCallbacks::default(),
            user_data: None,
            context,
        }
    }

    pub fn apply_size_constraints(&self, size: (u32, u32)) -> (u32, u32) {
        let (width, mut height) = self.size_limits.clamp(size);
        if let Some((num, den)) = self.aspect_ratio {
            // Keep the width, derive the height from the ratio.
            if num > 0 && den > 0 && width > 0 {
                height = (u64::from(width) * u64::from(den) / u64::from(num)) as u32;
            }
        }
        (width.max(1), height.max(1))
    }
}
