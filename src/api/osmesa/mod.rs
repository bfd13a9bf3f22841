//! Off-screen software rendering through OSMesa.
//!
//! The OSMesa shared library is an optional capability: its entry points
//! are resolved lazily the first time a context asks for them, and a
//! missing library or symbol surfaces as
//! [`ApiUnavailable`](crate::ErrorKind::ApiUnavailable) at context creation
//! time rather than as a link failure. Rendering lands in a client memory
//! buffer; swapping buffers and the swap interval are no-ops.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_uchar, c_uint, c_void};
use std::ptr;

use once_cell::sync::Lazy;

use crate::api::GlContextBackend;
use crate::config::{
    check_backend_support, Api, ContextCaps, ContextConfig, FramebufferConfig, GlRequest,
    PixelFormat, Profile, Robustness,
};
use crate::error::{Error, ErrorKind, Result};

const CAPS: ContextCaps = ContextCaps {
    max_gl: (4, 6),
    es_minors: &[],
    supports_profiles: true,
    supports_robustness: false,
};

// From <GL/osmesa.h>.
const OSMESA_RGBA: c_int = 0x1908;
const OSMESA_FORMAT: c_int = 0x22;
const OSMESA_DEPTH_BITS: c_int = 0x30;
const OSMESA_STENCIL_BITS: c_int = 0x31;
const OSMESA_ACCUM_BITS: c_int = 0x32;
const OSMESA_PROFILE: c_int = 0x33;
const OSMESA_CORE_PROFILE: c_int = 0x34;
const OSMESA_COMPAT_PROFILE: c_int = 0x35;
const OSMESA_CONTEXT_MAJOR_VERSION: c_int = 0x36;
const OSMESA_CONTEXT_MINOR_VERSION: c_int = 0x37;

const GL_UNSIGNED_BYTE: c_uint = 0x1401;
const GL_VERSION: c_uint = 0x1F02;
const GL_EXTENSIONS: c_uint = 0x1F03;

type OsMesaNativeContext = *mut c_void;

type CreateContextAttribsFn =
    unsafe extern "C" fn(*const c_int, OsMesaNativeContext) -> OsMesaNativeContext;
type CreateContextExtFn = unsafe extern "C" fn(
    c_uint,
    c_int,
    c_int,
    c_int,
    OsMesaNativeContext,
) -> OsMesaNativeContext;
type DestroyContextFn = unsafe extern "C" fn(OsMesaNativeContext);
type MakeCurrentFn = unsafe extern "C" fn(
    OsMesaNativeContext,
    *mut c_void,
    c_uint,
    c_int,
    c_int,
) -> c_uchar;
type GetProcAddressFn = unsafe extern "C" fn(*const c_char) -> *mut c_void;
type GlGetStringFn = unsafe extern "C" fn(c_uint) -> *const c_uchar;

struct OsMesaFns {
    // Keeps the shared object mapped for as long as the symbols are used.
    _lib: libloading::Library,
    create_context_attribs: Option<CreateContextAttribsFn>,
    create_context_ext: Option<CreateContextExtFn>,
    destroy_context: DestroyContextFn,
    make_current: MakeCurrentFn,
    get_proc_address: GetProcAddressFn,
}

static OSMESA: Lazy<std::result::Result<OsMesaFns, String>> = Lazy::new(load);

fn load() -> std::result::Result<OsMesaFns, String> {
    const CANDIDATES: &[&str] = &[
        "libOSMesa.so.8",
        "libOSMesa.so.6",
        "libOSMesa.so",
        "libOSMesa.8.dylib",
        "libOSMesa.dylib",
        "osmesa.dll",
    ];

    let mut last_error = String::from("no candidate library name tried");
    for name in CANDIDATES {
        // Loading an arbitrary shared object runs its initializers.
        match unsafe { libloading::Library::new(name) } {
            Ok(lib) => {
                log::debug!("loaded OSMesa from {name}");
                return resolve(lib).map_err(|err| err.to_string());
            },
            Err(err) => last_error = format!("{name}: {err}"),
        }
    }
    Err(last_error)
}

fn resolve(lib: libloading::Library) -> std::result::Result<OsMesaFns, libloading::Error> {
    unsafe {
        let create_context_attribs = lib
            .get::<CreateContextAttribsFn>(b"OSMesaCreateContextAttribs\0")
            .ok()
            .map(|symbol| *symbol);
        let create_context_ext = lib
            .get::<CreateContextExtFn>(b"OSMesaCreateContextExt\0")
            .ok()
            .map(|symbol| *symbol);
        let destroy_context = *lib.get::<DestroyContextFn>(b"OSMesaDestroyContext\0")?;
        let make_current = *lib.get::<MakeCurrentFn>(b"OSMesaMakeCurrent\0")?;
        let get_proc_address = *lib.get::<GetProcAddressFn>(b"OSMesaGetProcAddress\0")?;

        Ok(OsMesaFns {
            _lib: lib,
            create_context_attribs,
            create_context_ext,
            destroy_context,
            make_current,
            get_proc_address,
        })
    }
}

fn fns() -> Result<&'static OsMesaFns> {
    OSMESA.as_ref().map_err(|message| {
        Error::new(
            ErrorKind::ApiUnavailable,
            format!("the OSMesa library could not be loaded: {message}"),
        )
    })
}

/// Whether the OSMesa library is present on this system. Creation fails
/// with [`ApiUnavailable`](crate::ErrorKind::ApiUnavailable) when it isn't.
pub fn is_available() -> bool {
    OSMESA.is_ok()
}

#[derive(Debug)]
pub(crate) struct OsMesaContext {
    context: OsMesaNativeContext,
    buffer: Vec<u32>,
    width: u32,
    height: u32,
    requested_version: (u8, u8),
    /// Filled in after the first successful bind, when the real version can
    /// be read back from the driver.
    granted_version: Option<(u8, u8)>,
    profile: Option<Profile>,
    forward_compat: bool,
    debug: bool,
    format: PixelFormat,
    swap_interval: i32,
}

impl OsMesaContext {
    pub fn new(
        request: GlRequest,
        config: &ContextConfig,
        framebuffer: &FramebufferConfig,
        size: (u32, u32),
    ) -> Result<Self> {
        let fns = fns()?;
        check_backend_support(config, &CAPS)?;

        let requested_version = match request {
            GlRequest::Latest => None,
            GlRequest::Specific(Api::OpenGl, version) => Some(version),
            GlRequest::GlThenGles { opengl_version, .. } => Some(opengl_version),
            GlRequest::Specific(Api::OpenGlEs, _) => {
                return Err(Error::new(
                    ErrorKind::ApiUnavailable,
                    "OSMesa only provides desktop OpenGL, not OpenGL ES",
                ));
            },
        };

        if framebuffer.stereo {
            return Err(Error::new(
                ErrorKind::FormatUnavailable,
                "OSMesa has no stereoscopic formats",
            ));
        }

        let depth_bits = c_int::from(framebuffer.depth_bits.unwrap_or(24));
        let stencil_bits = c_int::from(framebuffer.stencil_bits.unwrap_or(8));
        let accum_bits = c_int::from(framebuffer.accum_red_bits.unwrap_or(0));

        let context = if let Some(create) = fns.create_context_attribs {
            let mut attribs = vec![
                OSMESA_FORMAT,
                OSMESA_RGBA,
                OSMESA_DEPTH_BITS,
                depth_bits,
                OSMESA_STENCIL_BITS,
                stencil_bits,
                OSMESA_ACCUM_BITS,
                accum_bits,
            ];
            match config.profile {
                Some(Profile::Core) => {
                    attribs.extend_from_slice(&[OSMESA_PROFILE, OSMESA_CORE_PROFILE]);
                },
                Some(Profile::Compatibility) => {
                    attribs.extend_from_slice(&[OSMESA_PROFILE, OSMESA_COMPAT_PROFILE]);
                },
                None => {},
            }
            if let Some((major, minor)) = requested_version {
                attribs.extend_from_slice(&[
                    OSMESA_CONTEXT_MAJOR_VERSION,
                    c_int::from(major),
                    OSMESA_CONTEXT_MINOR_VERSION,
                    c_int::from(minor),
                ]);
            }
            attribs.push(0);
            unsafe { create(attribs.as_ptr(), ptr::null_mut()) }
        } else if let Some(create) = fns.create_context_ext {
            let versioned = requested_version.map_or(false, |version| version >= (3, 0));
            if config.profile == Some(Profile::Core) || versioned {
                return Err(Error::new(
                    ErrorKind::VersionUnavailable,
                    "this OSMesa build cannot create versioned or core profile contexts",
                ));
            }
            unsafe {
                create(
                    OSMESA_RGBA as c_uint,
                    depth_bits,
                    stencil_bits,
                    accum_bits,
                    ptr::null_mut(),
                )
            }
        } else {
            return Err(Error::new(
                ErrorKind::ApiUnavailable,
                "OSMesa exposes no known context creation entry point",
            ));
        };

        if context.is_null() {
            return Err(Error::new(
                ErrorKind::VersionUnavailable,
                "OSMesa rejected the requested context attributes",
            ));
        }

        let (width, height) = size;
        Ok(Self {
            context,
            buffer: vec![0; width as usize * height as usize],
            width,
            height,
            requested_version: requested_version.unwrap_or((2, 1)),
            granted_version: None,
            profile: config.profile,
            forward_compat: config.forward_compat,
            debug: config.debug,
            format: PixelFormat {
                hardware_accelerated: false,
                red_bits: 8,
                green_bits: 8,
                blue_bits: 8,
                alpha_bits: 8,
                depth_bits: framebuffer.depth_bits.unwrap_or(24),
                stencil_bits: framebuffer.stencil_bits.unwrap_or(8),
                accum_red_bits: framebuffer.accum_red_bits.unwrap_or(0),
                accum_green_bits: framebuffer.accum_green_bits.unwrap_or(0),
                accum_blue_bits: framebuffer.accum_blue_bits.unwrap_or(0),
                accum_alpha_bits: framebuffer.accum_alpha_bits.unwrap_or(0),
                stereo: false,
                double_buffer: false,
                multisampling: None,
                srgb: false,
            },
            swap_interval: 0,
        })
    }

    fn gl_string(&self, name: c_uint) -> Option<String> {
        let fns = fns().ok()?;
        let symbol = CString::new("glGetString").ok()?;
        let address = unsafe { (fns.get_proc_address)(symbol.as_ptr()) };
        if address.is_null() {
            return None;
        }
        let get_string: GlGetStringFn = unsafe { std::mem::transmute(address) };
        let raw = unsafe { get_string(name) };
        if raw.is_null() {
            return None;
        }
        let text = unsafe { CStr::from_ptr(raw.cast::<c_char>()) };
        Some(text.to_string_lossy().into_owned())
    }

    fn read_back_version(&mut self) {
        if self.granted_version.is_some() {
            return;
        }
        // "major.minor[.release] vendor-specific".
        let version = self.gl_string(GL_VERSION).and_then(|text| {
            let mut parts = text.split(['.', ' ']);
            let major = parts.next()?.parse().ok()?;
            let minor = parts.next()?.parse().ok()?;
            Some((major, minor))
        });
        if let Some(version) = version {
            self.granted_version = Some(version);
        }
    }
}

impl GlContextBackend for OsMesaContext {
    fn api(&self) -> Api {
        Api::OpenGl
    }

    fn version(&self) -> (u8, u8) {
        self.granted_version.unwrap_or(self.requested_version)
    }

    fn profile(&self) -> Option<Profile> {
        self.profile
    }

    fn robustness(&self) -> Robustness {
        Robustness::NotRobust
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
        let fns = fns()?;
        let bound = unsafe {
            (fns.make_current)(
                self.context,
                self.buffer.as_mut_ptr().cast::<c_void>(),
                GL_UNSIGNED_BYTE,
                self.width as c_int,
                self.height as c_int,
            )
        };
        if bound == 0 {
            return Err(Error::new(ErrorKind::PlatformError, "OSMesaMakeCurrent failed"));
        }
        self.read_back_version();
        Ok(())
    }

    fn make_not_current(&mut self) -> Result<()> {
        // OSMesa has no explicit unbind; dropping the thread binding in the
        // registry is all that is needed.
        Ok(())
    }

    fn swap_buffers(&mut self) -> Result<()> {
        Ok(())
    }

    fn set_swap_interval(&mut self, interval: i32) -> Result<()> {
        self.swap_interval = interval;
        Ok(())
    }

    fn swap_interval(&self) -> i32 {
        self.swap_interval
    }

    fn get_proc_address(&self, symbol: &str) -> *const c_void {
        let fns = match fns() {
            Ok(fns) => fns,
            Err(_) => return ptr::null(),
        };
        let Ok(symbol) = CString::new(symbol) else {
            return ptr::null();
        };
        unsafe { (fns.get_proc_address)(symbol.as_ptr()).cast_const() }
    }

    fn extension_supported(&self, extension: &str) -> bool {
        match self.gl_string(GL_EXTENSIONS) {
            Some(list) => list.split_ascii_whitespace().any(|entry| entry == extension),
            // Core profiles return nothing through the legacy query.
            None => false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            // Rebound to the context on the next make_current call.
            self.buffer = vec![0; width as usize * height as usize];
        }
    }

    fn color_buffer(&self) -> Option<&[u32]> {
        Some(&self.buffer)
    }
}

impl Drop for OsMesaContext {
    fn drop(&mut self) {
        if let Ok(fns) = fns() {
            unsafe { (fns.destroy_context)(self.context) };
        }
    }
}
