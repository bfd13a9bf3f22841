//! In-process software context backend.
//!
//! Backs the headless platform's native context path: rendering state is an
//! RGBA color buffer in process memory, retrievable through the headless
//! platform extension instead of being presented anywhere. Swapping and the
//! swap interval are no-ops, as for any off-screen software target.

use std::os::raw::c_void;

use crate::api::GlContextBackend;
use crate::config::{
    choose_pixel_format, negotiate_version, Api, ContextCaps, ContextConfig,
    FramebufferConfig, GlRequest, PixelFormat, Profile, Robustness,
};
use crate::error::Result;

pub(crate) const CAPS: ContextCaps = ContextCaps {
    max_gl: (4, 6),
    es_minors: &[(1, 1), (2, 0), (3, 2)],
    supports_profiles: true,
    supports_robustness: true,
};

const EXTENSIONS: &[&str] = &[
    "GL_ARB_multisample",
    "GL_ARB_framebuffer_sRGB",
    "GL_ARB_debug_output",
    "GL_ARB_robustness",
    "GL_KHR_debug",
];

/// The formats this backend can provide. All are 8-bit RGBA with a 24/8
/// depth/stencil attachment; stereo is never offered, which makes a stereo
/// request fail format selection rather than silently downgrade.
fn supported_pixel_formats() -> Vec<PixelFormat> {
    let base = PixelFormat {
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
        stereo: false,
        double_buffer: true,
        multisampling: None,
        srgb: false,
    };

    let mut formats = Vec::new();
    for double_buffer in [true, false] {
        for srgb in [false, true] {
            for samples in [None, Some(2), Some(4), Some(8), Some(16)] {
                formats.push(PixelFormat {
                    double_buffer,
                    srgb,
                    multisampling: samples,
                    ..base.clone()
                });
            }
        }
    }
    formats.push(PixelFormat {
        accum_red_bits: 16,
        accum_green_bits: 16,
        accum_blue_bits: 16,
        accum_alpha_bits: 16,
        ..base
    });
    formats
}

#[derive(Debug)]
pub(crate) struct NullContext {
    api: Api,
    version: (u8, u8),
    profile: Option<Profile>,
    robustness: Robustness,
    forward_compat: bool,
    debug: bool,
    format: PixelFormat,
    buffer: Vec<u32>,
    width: u32,
    height: u32,
    swap_interval: i32,
}

impl NullContext {
    pub fn new(
        request: GlRequest,
        config: &ContextConfig,
        framebuffer: &FramebufferConfig,
        size: (u32, u32),
    ) -> Result<Self> {
        crate::config::check_backend_support(config, &CAPS)?;
        let (api, version) = negotiate_version(request, &CAPS)?;

        let formats = supported_pixel_formats();
        let chosen = choose_pixel_format(framebuffer, &formats)?;

        let (width, height) = size;
        Ok(Self {
            api,
            version,
            profile: config.profile,
            robustness: config.robustness,
            forward_compat: config.forward_compat,
            debug: config.debug,
            format: formats[chosen].clone(),
            buffer: vec![0; width as usize * height as usize],
            width,
            height,
            swap_interval: 0,
        })
    }
}

impl GlContextBackend for NullContext {
    fn api(&self) -> Api {
        self.api
    }

    fn version(&self) -> (u8, u8) {
        self.version
    }

    fn profile(&self) -> Option<Profile> {
        self.profile
    }

    fn robustness(&self) -> Robustness {
        self.robustness
    }

    fn forward_compat(&self) -> bool {
        self.forward_compat
    }

    fn debug(&self) -> bool {
        self.debug
    }

    fn pixel_format(&self) -> &PixelFormat {
        &self.format
    }

    fn make_current(&mut self) -> Result<()> {
        Ok(())
    }

    fn make_not_current(&mut self) -> Result<()> {
        Ok(())
    }

    fn swap_buffers(&mut self) -> Result<()> {
        // Off-screen target, nothing to present.
        Ok(())
    }

    fn set_swap_interval(&mut self, interval: i32) -> Result<()> {
        self.swap_interval = interval;
        Ok(())
    }

    fn swap_interval(&self) -> i32 {
        self.swap_interval
    }

    fn get_proc_address(&self, _symbol: &str) -> *const c_void {
        // No GL entry points exist in process memory for this backend.
        std::ptr::null()
    }

    fn extension_supported(&self, extension: &str) -> bool {
        EXTENSIONS.contains(&extension)
    }

    fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.buffer = vec![0; width as usize * height as usize];
        }
    }

    fn color_buffer(&self) -> Option<&[u32]> {
        Some(&self.buffer)
    }
}
