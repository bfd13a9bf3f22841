//! Window, context, and framebuffer configuration.
//!
//! Configuration is consumed once, at window creation: a [`WindowBuilder`]
//! carries everything the next `build` call needs and has no effect on
//! windows that already exist. Hard constraints (stereo, client API family,
//! forward-compatibility, profile) must match exactly or creation fails;
//! the desktop GL version is a soft constraint and may be satisfied by a
//! newer compatible context, while the GL ES major version is hard.

use crate::error::{Error, ErrorKind, Result};
use crate::monitor::MonitorId;
use crate::window::WindowId;

/// A client API family.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Api {
    /// Desktop OpenGL.
    OpenGl,
    /// OpenGL ES. Major versions are not backward compatible.
    OpenGlEs,
}

/// Describes the requested OpenGL context version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlRequest {
    /// The latest version the backend supports.
    Latest,

    /// A specific version and API. For desktop GL the backend may return a
    /// newer compatible context; for GL ES the major version must match.
    Specific(Api, (u8, u8)),

    /// Try desktop GL first, then fall back to GL ES.
    GlThenGles {
        opengl_version: (u8, u8),
        opengles_version: (u8, u8),
    },
}

/// The OpenGL context profile.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Profile {
    Compatibility,
    Core,
}

/// The robustness strategy of an OpenGL context.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum Robustness {
    #[default]
    NotRobust,
    NoResetNotification,
    LoseContextOnReset,
}

/// Which API the backend should use to create the context.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum ContextCreationApi {
    /// The platform's native context path. On the headless backend this is
    /// the in-process software renderer.
    #[default]
    Native,
    /// Off-screen software rendering through the OSMesa library.
    OsMesa,
}

/// The client API a live window's context belongs to, as reported by the
/// window attribute query.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ClientApi {
    /// The window was created without a context.
    None,
    OpenGl,
    OpenGlEs,
}

#[derive(Clone, Debug)]
pub(crate) struct WindowConfig {
    pub title: String,
    pub size: (u32, u32),
    pub position: Option<(i32, i32)>,
    pub visible: bool,
    pub resizable: bool,
    pub decorated: bool,
    pub focused: bool,
    pub auto_iconify: bool,
    pub floating: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            size: (640, 480),
            position: None,
            visible: true,
            resizable: true,
            decorated: true,
            focused: true,
            auto_iconify: true,
            floating: false,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ContextConfig {
    /// `None` requests a window without any context.
    pub request: Option<GlRequest>,
    pub profile: Option<Profile>,
    pub forward_compat: bool,
    pub debug: bool,
    pub robustness: Robustness,
    pub creation_api: ContextCreationApi,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            request: Some(GlRequest::Latest),
            profile: None,
            forward_compat: false,
            debug: false,
            robustness: Robustness::NotRobust,
            creation_api: ContextCreationApi::Native,
        }
    }
}

/// Requested framebuffer attributes. `None` means "don't care".
#[derive(Clone, Debug, Default)]
pub(crate) struct FramebufferConfig {
    pub red_bits: Option<u8>,
    pub green_bits: Option<u8>,
    pub blue_bits: Option<u8>,
    pub alpha_bits: Option<u8>,
    pub depth_bits: Option<u8>,
    pub stencil_bits: Option<u8>,
    pub accum_red_bits: Option<u8>,
    pub accum_green_bits: Option<u8>,
    pub accum_blue_bits: Option<u8>,
    pub accum_alpha_bits: Option<u8>,
    pub samples: Option<u16>,
    pub stereo: bool,
    pub srgb: bool,
    pub double_buffer: bool,
}

impl FramebufferConfig {
    pub(crate) fn standard() -> Self {
        Self {
            red_bits: Some(8),
            green_bits: Some(8),
            blue_bits: Some(8),
            alpha_bits: Some(8),
            depth_bits: Some(24),
            stencil_bits: Some(8),
            double_buffer: true,
            ..Self::default()
        }
    }
}

/// The format actually selected for a created context's framebuffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelFormat {
    pub hardware_accelerated: bool,
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    pub alpha_bits: u8,
    pub depth_bits: u8,
    pub stencil_bits: u8,
    pub accum_red_bits: u8,
    pub accum_green_bits: u8,
    pub accum_blue_bits: u8,
    pub accum_alpha_bits: u8,
    pub stereo: bool,
    pub double_buffer: bool,
    pub multisampling: Option<u16>,
    pub srgb: bool,
}

/// What a context backend is able to create. Used by the shared negotiation
/// logic so every backend applies identical soft/hard constraint rules.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ContextCaps {
    pub max_gl: (u8, u8),
    /// Highest supported minor per ES major version.
    pub es_minors: &'static [(u8, u8)],
    pub supports_profiles: bool,
    pub supports_robustness: bool,
}

/// Rejects attributes a backend cannot honor at all. Matching these
/// exactly is part of the hard-constraint contract, so an unsupported
/// request fails instead of being dropped.
pub(crate) fn check_backend_support(config: &ContextConfig, caps: &ContextCaps) -> Result<()> {
    if config.robustness != Robustness::NotRobust && !caps.supports_robustness {
        return Err(Error::new(
            ErrorKind::FeatureUnavailable,
            "the context backend does not support robustness strategies",
        ));
    }
    if config.profile.is_some() && !caps.supports_profiles {
        return Err(Error::new(
            ErrorKind::FeatureUnavailable,
            "the context backend does not support context profiles",
        ));
    }
    Ok(())
}

/// Rejects nonsense version/profile/flag combinations before any backend
/// work happens. Mirrors the constraint set of the context attribute
/// contract: profiles exist from GL 3.2, forward-compatibility from GL 3.0,
/// and neither is defined for GL ES.
pub(crate) fn validate_context_config(config: &ContextConfig) -> Result<()> {
    let request = match config.request {
        Some(request) => request,
        // Without a context every context attribute is ignored.
        None => return Ok(()),
    };

    if let GlRequest::Specific(api, (major, minor)) = request {
        match api {
            Api::OpenGl => {
                let invalid = major < 1
                    || (major == 1 && minor > 5)
                    || (major == 2 && minor > 1)
                    || (major == 3 && minor > 3);
                if invalid {
                    return Err(Error::new(
                        ErrorKind::InvalidValue,
                        format!("invalid OpenGL version {major}.{minor}"),
                    ));
                }

                if config.profile.is_some() && (major < 3 || (major == 3 && minor < 2)) {
                    return Err(Error::new(
                        ErrorKind::InvalidValue,
                        "context profiles are only defined for OpenGL 3.2 and above",
                    ));
                }

                if config.forward_compat && major < 3 {
                    return Err(Error::new(
                        ErrorKind::InvalidValue,
                        "forward-compatibility is only defined for OpenGL 3.0 and above",
                    ));
                }
            },
            Api::OpenGlEs => {
                let invalid =
                    major < 1 || (major == 1 && minor > 1) || (major == 2 && minor > 0);
                if invalid {
                    return Err(Error::new(
                        ErrorKind::InvalidValue,
                        format!("invalid OpenGL ES version {major}.{minor}"),
                    ));
                }

                if config.profile.is_some() || config.forward_compat {
                    return Err(Error::new(
                        ErrorKind::InvalidValue,
                        "context profiles and forward-compatibility are not defined for OpenGL ES",
                    ));
                }
            },
        }
    }

    Ok(())
}

/// Applies the version negotiation rules against a backend's capabilities.
///
/// Desktop GL requests are soft: any compatible-or-newer version satisfies
/// them, and the backend grants the newest it has. GL ES requests are hard
/// on the major version since ES majors are not backward compatible.
pub(crate) fn negotiate_version(
    request: GlRequest,
    caps: &ContextCaps,
) -> Result<(Api, (u8, u8))> {
    match request {
        GlRequest::Latest => Ok((Api::OpenGl, caps.max_gl)),
        GlRequest::Specific(Api::OpenGl, version) => {
            if version <= caps.max_gl {
                Ok((Api::OpenGl, caps.max_gl))
            } else {
                Err(Error::new(
                    ErrorKind::VersionUnavailable,
                    format!(
                        "requested OpenGL {}.{}, newest available is {}.{}",
                        version.0, version.1, caps.max_gl.0, caps.max_gl.1
                    ),
                ))
            }
        },
        GlRequest::Specific(Api::OpenGlEs, (major, minor)) => {
            let supported =
                caps.es_minors.iter().find(|(m, _)| *m == major).map(|(_, max)| *max);
            match supported {
                Some(max_minor) if minor <= max_minor => {
                    Ok((Api::OpenGlEs, (major, max_minor)))
                },
                _ => Err(Error::new(
                    ErrorKind::VersionUnavailable,
                    format!("OpenGL ES {major}.{minor} is not supported"),
                )),
            }
        },
        GlRequest::GlThenGles { opengl_version, opengles_version } => {
            negotiate_version(GlRequest::Specific(Api::OpenGl, opengl_version), caps)
                .or_else(|_| {
                    negotiate_version(
                        GlRequest::Specific(Api::OpenGlEs, opengles_version),
                        caps,
                    )
                })
        },
    }
}

/// Picks the closest matching format from what the backend offers.
///
/// Stereo and double-buffering must match exactly. The remaining channels
/// are scored in three tiers: number of requested-but-missing channels,
/// then squared color channel difference, then squared difference over the
/// auxiliary channels plus an sRGB mismatch penalty. The candidate with the
/// lowest score wins, first tier most significant.
pub(crate) fn choose_pixel_format(
    desired: &FramebufferConfig,
    candidates: &[PixelFormat],
) -> Result<usize> {
    let mut best: Option<(usize, (u32, u32, u32))> = None;

    for (index, current) in candidates.iter().enumerate() {
        if current.stereo != desired.stereo || current.double_buffer != desired.double_buffer {
            continue;
        }

        let mut missing = 0u32;
        let requested_missing = |want: Option<u8>, have: u8| -> u32 {
            u32::from(matches!(want, Some(bits) if bits > 0) && have == 0)
        };
        missing += requested_missing(desired.alpha_bits, current.alpha_bits);
        missing += requested_missing(desired.depth_bits, current.depth_bits);
        missing += requested_missing(desired.stencil_bits, current.stencil_bits);
        if matches!(desired.samples, Some(samples) if samples > 0)
            && current.multisampling.is_none()
        {
            missing += 1;
        }

        let channel_diff = |want: Option<u8>, have: u8| -> u32 {
            match want {
                Some(bits) => {
                    let diff = i32::from(bits) - i32::from(have);
                    (diff * diff) as u32
                },
                None => 0,
            }
        };

        let color_diff = channel_diff(desired.red_bits, current.red_bits)
            + channel_diff(desired.green_bits, current.green_bits)
            + channel_diff(desired.blue_bits, current.blue_bits);

        let mut extra_diff = channel_diff(desired.alpha_bits, current.alpha_bits)
            + channel_diff(desired.depth_bits, current.depth_bits)
            + channel_diff(desired.stencil_bits, current.stencil_bits)
            + channel_diff(desired.accum_red_bits, current.accum_red_bits)
            + channel_diff(desired.accum_green_bits, current.accum_green_bits)
            + channel_diff(desired.accum_blue_bits, current.accum_blue_bits)
            + channel_diff(desired.accum_alpha_bits, current.accum_alpha_bits);
        if let Some(samples) = desired.samples {
            let have = current.multisampling.unwrap_or(0);
            let diff = i64::from(samples) - i64::from(have);
            extra_diff += (diff * diff) as u32;
        }
        if desired.srgb != current.srgb {
            extra_diff += 1;
        }

        let score = (missing, color_diff, extra_diff);
        if best.map_or(true, |(_, best_score)| score < best_score) {
            best = Some((index, score));
        }
    }

    match best {
        Some((index, _)) => Ok(index),
        None => Err(Error::new(
            ErrorKind::FormatUnavailable,
            "no framebuffer format matches the hard constraints",
        )),
    }
}

/// Builds windows and their contexts.
///
/// This is the "window hints" surface: all attributes the next window needs
/// are gathered here and consumed by [`build`](WindowBuilder::build).
///
/// # Example
///
/// ```no_run
/// use oriel::{GlRequest, Api, Profile, WindowBuilder};
///
/// # fn main() -> oriel::Result<()> {
/// let mut lib = oriel::init()?;
/// let window = WindowBuilder::new()
///     .with_size(800, 600)
///     .with_title("example")
///     .with_gl(GlRequest::Specific(Api::OpenGl, (3, 3)))
///     .with_profile(Profile::Core)
///     .build(&mut lib)?;
/// # let _ = window;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct WindowBuilder {
    pub(crate) window: WindowConfig,
    pub(crate) context: ContextConfig,
    pub(crate) framebuffer: FramebufferConfig,
    pub(crate) monitor: Option<MonitorId>,
    pub(crate) share: Option<WindowId>,
}

impl WindowBuilder {
    pub fn new() -> Self {
        Self { framebuffer: FramebufferConfig::standard(), ..Self::default() }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.window.size = (width, height);
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.window.position = Some((x, y));
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.window.visible = visible;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.window.resizable = resizable;
        self
    }

    pub fn with_decorated(mut self, decorated: bool) -> Self {
        self.window.decorated = decorated;
        self
    }

    pub fn with_focused(mut self, focused: bool) -> Self {
        self.window.focused = focused;
        self
    }

    pub fn with_auto_iconify(mut self, auto_iconify: bool) -> Self {
        self.window.auto_iconify = auto_iconify;
        self
    }

    pub fn with_floating(mut self, floating: bool) -> Self {
        self.window.floating = floating;
        self
    }

    /// Requests exclusive fullscreen on the given monitor. The monitor's
    /// video mode is switched to the closest match for the window size and
    /// restored exactly when the window leaves fullscreen or is destroyed.
    pub fn with_fullscreen(mut self, monitor: MonitorId) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Shares GL object namespaces with the given window's context. Both
    /// contexts must belong to the same client API family.
    pub fn with_shared_context(mut self, window: WindowId) -> Self {
        self.share = Some(window);
        self
    }

    pub fn with_gl(mut self, request: GlRequest) -> Self {
        self.context.request = Some(request);
        self
    }

    /// Requests a window without any context. Context operations on the
    /// window will fail with
    /// [`NoWindowContext`](crate::ErrorKind::NoWindowContext).
    pub fn with_no_api(mut self) -> Self {
        self.context.request = None;
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.context.profile = Some(profile);
        self
    }

    pub fn with_forward_compat(mut self, forward_compat: bool) -> Self {
        self.context.forward_compat = forward_compat;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.context.debug = debug;
        self
    }

    pub fn with_robustness(mut self, robustness: Robustness) -> Self {
        self.context.robustness = robustness;
        self
    }

    pub fn with_context_creation_api(mut self, api: ContextCreationApi) -> Self {
        self.context.creation_api = api;
        self
    }

    pub fn with_color_bits(mut self, red: u8, green: u8, blue: u8) -> Self {
        self.framebuffer.red_bits = Some(red);
        self.framebuffer.green_bits = Some(green);
        self.framebuffer.blue_bits = Some(blue);
        self
    }

    pub fn with_alpha_bits(mut self, alpha: u8) -> Self {
        self.framebuffer.alpha_bits = Some(alpha);
        self
    }

    pub fn with_depth_bits(mut self, depth: u8) -> Self {
        self.framebuffer.depth_bits = Some(depth);
        self
    }

    pub fn with_stencil_bits(mut self, stencil: u8) -> Self {
        self.framebuffer.stencil_bits = Some(stencil);
        self
    }

    pub fn with_accum_bits(mut self, red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        self.framebuffer.accum_red_bits = Some(red);
        self.framebuffer.accum_green_bits = Some(green);
        self.framebuffer.accum_blue_bits = Some(blue);
        self.framebuffer.accum_alpha_bits = Some(alpha);
        self
    }

    pub fn with_multisampling(mut self, samples: u16) -> Self {
        self.framebuffer.samples = Some(samples);
        self
    }

    pub fn with_stereo(mut self, stereo: bool) -> Self {
        self.framebuffer.stereo = stereo;
        self
    }

    pub fn with_srgb(mut self, srgb: bool) -> Self {
        self.framebuffer.srgb = srgb;
        self
    }

    pub fn with_double_buffer(mut self, double_buffer: bool) -> Self {
        self.framebuffer.double_buffer = double_buffer;
        self
    }

    /// Creates the window and, unless [`with_no_api`](Self::with_no_api)
    /// was used, its context. On success the context is current on no
    /// thread.
    pub fn build(self, library: &mut crate::Library) -> Result<WindowId> {
        library.create_window(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPS: ContextCaps = ContextCaps {
        max_gl: (4, 6),
        es_minors: &[(1, 1), (2, 0), (3, 2)],
        supports_profiles: true,
        supports_robustness: true,
    };

    #[test]
    fn desktop_version_is_soft() {
        let (api, version) =
            negotiate_version(GlRequest::Specific(Api::OpenGl, (3, 3)), &CAPS).unwrap();
        assert_eq!(api, Api::OpenGl);
        assert!(version >= (3, 3));
    }

    #[test]
    fn unsatisfiable_desktop_version_fails() {
        let err =
            negotiate_version(GlRequest::Specific(Api::OpenGl, (99, 0)), &CAPS).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VersionUnavailable);
    }

    #[test]
    fn es_major_is_hard() {
        // ES 2 must not be satisfied by an ES 3 context.
        let (api, version) =
            negotiate_version(GlRequest::Specific(Api::OpenGlEs, (2, 0)), &CAPS).unwrap();
        assert_eq!(api, Api::OpenGlEs);
        assert_eq!(version.0, 2);

        let err =
            negotiate_version(GlRequest::Specific(Api::OpenGlEs, (4, 0)), &CAPS).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::VersionUnavailable);
    }

    #[test]
    fn gl_then_gles_falls_back() {
        let request = GlRequest::GlThenGles {
            opengl_version: (99, 0),
            opengles_version: (3, 0),
        };
        let (api, _) = negotiate_version(request, &CAPS).unwrap();
        assert_eq!(api, Api::OpenGlEs);
    }

    #[test]
    fn profile_needs_gl_3_2() {
        let config = ContextConfig {
            request: Some(GlRequest::Specific(Api::OpenGl, (2, 1))),
            profile: Some(Profile::Core),
            ..ContextConfig::default()
        };
        let err = validate_context_config(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn forward_compat_needs_gl_3_0() {
        let config = ContextConfig {
            request: Some(GlRequest::Specific(Api::OpenGl, (2, 1))),
            forward_compat: true,
            ..ContextConfig::default()
        };
        assert!(validate_context_config(&config).is_err());
    }

    #[test]
    fn es_rejects_profile_and_forward_compat() {
        let config = ContextConfig {
            request: Some(GlRequest::Specific(Api::OpenGlEs, (3, 0))),
            forward_compat: true,
            ..ContextConfig::default()
        };
        assert!(validate_context_config(&config).is_err());
    }

    #[test]
    fn nonexistent_gl_point_release_is_invalid() {
        let config = ContextConfig {
            request: Some(GlRequest::Specific(Api::OpenGl, (2, 9))),
            ..ContextConfig::default()
        };
        assert!(validate_context_config(&config).is_err());
    }

    fn format(samples: Option<u16>, srgb: bool, stereo: bool) -> PixelFormat {
        PixelFormat {
            hardware_accelerated: false,
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 8,
            depth_bits: 24,
            stencil_bits: 8,
            accum_red_bits: 0,
            accum_green_bits: 0,
            accum_blue_bits: 0,
            accum_alpha_bits: 0,
            stereo,
            double_buffer: true,
            multisampling: samples,
            srgb,
        }
    }

    #[test]
    fn stereo_is_a_hard_constraint() {
        let candidates = [format(None, false, false)];
        let desired =
            FramebufferConfig { stereo: true, ..FramebufferConfig::standard() };
        let err = choose_pixel_format(&desired, &candidates).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatUnavailable);
    }

    #[test]
    fn picks_nearest_sample_count() {
        let candidates = [
            format(None, false, false),
            format(Some(4), false, false),
            format(Some(16), false, false),
        ];
        let desired = FramebufferConfig {
            samples: Some(8),
            ..FramebufferConfig::standard()
        };
        let index = choose_pixel_format(&desired, &candidates).unwrap();
        assert_eq!(candidates[index].multisampling, Some(4));
    }

    #[test]
    fn prefers_srgb_when_requested() {
        let candidates = [format(None, false, false), format(None, true, false)];
        let desired = FramebufferConfig { srgb: true, ..FramebufferConfig::standard() };
        let index = choose_pixel_format(&desired, &candidates).unwrap();
        assert!(candidates[index].srgb);
    }
}
