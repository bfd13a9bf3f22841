//! Context creation, negotiation, current-ness, and the software
//! framebuffer read-back path.

use oriel::os::headless::HeadlessLibraryExt;
use oriel::{
    Api, ClientApi, ContextCreationApi, ErrorKind, GlRequest, Platform, Profile,
    Robustness, WindowBuilder,
};

fn lib() -> oriel::Library {
    let _ = env_logger::builder().is_test(true).try_init();
    oriel::init_with(Platform::Headless).expect("headless backend must initialize")
}

#[test]
fn default_creation_yields_a_desktop_context() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();
    assert_eq!(lib.window_client_api(window).unwrap(), ClientApi::OpenGl);
    let version = lib.window_context_version(window).unwrap();
    assert!(version >= (1, 0));
}

#[test]
fn hard_constraints_are_honored_exactly() {
    let mut lib = lib();
    let window = WindowBuilder::new()
        .with_gl(GlRequest::Specific(Api::OpenGl, (3, 3)))
        .with_profile(Profile::Core)
        .with_forward_compat(true)
        .with_debug(true)
        .with_robustness(Robustness::LoseContextOnReset)
        .build(&mut lib)
        .unwrap();

    assert!(lib.window_context_version(window).unwrap() >= (3, 3));
    assert_eq!(lib.window_context_profile(window).unwrap(), Some(Profile::Core));
    assert!(lib.window_context_forward_compat(window).unwrap());
    assert!(lib.window_context_debug(window).unwrap());
    assert_eq!(
        lib.window_context_robustness(window).unwrap(),
        Robustness::LoseContextOnReset
    );
}

#[test]
fn es_major_versions_are_hard() {
    let mut lib = lib();
    let window = WindowBuilder::new()
        .with_gl(GlRequest::Specific(Api::OpenGlEs, (2, 0)))
        .build(&mut lib)
        .unwrap();
    assert_eq!(lib.window_client_api(window).unwrap(), ClientApi::OpenGlEs);
    assert_eq!(lib.window_context_version(window).unwrap().0, 2);
}

#[test]
fn profile_below_gl_3_2_is_invalid() {
    let mut lib = lib();
    let err = WindowBuilder::new()
        .with_gl(GlRequest::Specific(Api::OpenGl, (2, 1)))
        .with_profile(Profile::Core)
        .build(&mut lib)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    assert_eq!(lib.window_count(), 0);
}

#[test]
fn stereo_is_never_silently_downgraded() {
    let mut lib = lib();
    let err = WindowBuilder::new().with_stereo(true).build(&mut lib).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FormatUnavailable);
    assert_eq!(lib.window_count(), 0);
}

#[test]
fn selected_pixel_format_is_reported() {
    let mut lib = lib();
    let window = WindowBuilder::new()
        .with_multisampling(4)
        .with_srgb(true)
        .build(&mut lib)
        .unwrap();
    let format = lib.window_pixel_format(window).unwrap();
    assert_eq!(format.multisampling, Some(4));
    assert!(format.srgb);
    assert_eq!(
        (format.red_bits, format.green_bits, format.blue_bits, format.alpha_bits),
        (8, 8, 8, 8)
    );
}

#[test]
fn make_current_round_trip() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();
    assert_eq!(lib.current_context(), None);

    lib.make_context_current(Some(window)).unwrap();
    assert_eq!(lib.current_context(), Some(window));

    lib.make_context_current(None).unwrap();
    assert_eq!(lib.current_context(), None);
}

#[test]
fn rebinding_moves_currentness_between_windows() {
    let mut lib = lib();
    let first = WindowBuilder::new().build(&mut lib).unwrap();
    let second = WindowBuilder::new().build(&mut lib).unwrap();

    lib.make_context_current(Some(first)).unwrap();
    lib.make_context_current(Some(second)).unwrap();
    assert_eq!(lib.current_context(), Some(second));

    lib.make_context_current(None).unwrap();
}

#[test]
fn destroying_a_current_window_detaches_it() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();
    lib.make_context_current(Some(window)).unwrap();
    lib.destroy_window(window).unwrap();
    assert_eq!(lib.current_context(), None);
}

#[test]
fn swap_interval_needs_a_current_context() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();

    let err = lib.set_swap_interval(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoCurrentContext);

    lib.make_context_current(Some(window)).unwrap();
    lib.set_swap_interval(1).unwrap();
    lib.swap_buffers(window).unwrap();
    lib.make_context_current(None).unwrap();
}

#[test]
fn extension_queries_need_a_current_context() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();

    let err = lib.extension_supported("GL_KHR_debug").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoCurrentContext);

    lib.make_context_current(Some(window)).unwrap();
    assert!(lib.extension_supported("GL_KHR_debug").unwrap());
    assert!(!lib.extension_supported("GL_EXT_does_not_exist").unwrap());

    let err = lib.extension_supported("").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);

    // The software backend exposes no client API entry points.
    assert!(lib.get_proc_address("glClear").unwrap().is_null());
    lib.make_context_current(None).unwrap();
}

#[test]
fn contexts_share_only_within_one_api_family() {
    let mut lib = lib();
    let desktop = WindowBuilder::new().build(&mut lib).unwrap();

    let shared = WindowBuilder::new().with_shared_context(desktop).build(&mut lib);
    assert!(shared.is_ok());

    let err = WindowBuilder::new()
        .with_gl(GlRequest::Specific(Api::OpenGlEs, (2, 0)))
        .with_shared_context(desktop)
        .build(&mut lib)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);

    let bare = WindowBuilder::new().with_no_api().build(&mut lib).unwrap();
    let err = WindowBuilder::new().with_shared_context(bare).build(&mut lib).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoWindowContext);
}

#[test]
fn software_framebuffer_matches_the_window_size() {
    let mut lib = lib();
    let window = WindowBuilder::new().with_size(32, 16).build(&mut lib).unwrap();

    let (buffer, size) = lib.software_framebuffer(window).unwrap();
    assert_eq!(size, (32, 16));
    assert_eq!(buffer.len(), 32 * 16);

    lib.set_window_size(window, 8, 8).unwrap();
    let (buffer, size) = lib.software_framebuffer(window).unwrap();
    assert_eq!(size, (8, 8));
    assert_eq!(buffer.len(), 64);

    let bare = WindowBuilder::new().with_no_api().build(&mut lib).unwrap();
    let err = lib.software_framebuffer(bare).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoWindowContext);
}

#[cfg(feature = "osmesa")]
#[test]
fn osmesa_contexts_work_or_fail_loudly() {
    let mut lib = lib();
    let result = WindowBuilder::new()
        .with_size(64, 64)
        .with_context_creation_api(ContextCreationApi::OsMesa)
        .build(&mut lib);

    if oriel::osmesa_available() {
        let window = result.expect("OSMesa is present, creation must succeed");
        lib.make_context_current(Some(window)).unwrap();
        assert_eq!(lib.window_client_api(window).unwrap(), ClientApi::OpenGl);
        // Rendering goes to client memory, same read-back path as the
        // null context.
        let (buffer, size) = lib.software_framebuffer(window).unwrap();
        assert_eq!(size, (64, 64));
        assert_eq!(buffer.len(), 64 * 64);
        assert!(!lib.get_proc_address("glGetString").unwrap().is_null());
        lib.make_context_current(None).unwrap();
    } else {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ApiUnavailable);
        assert_eq!(lib.window_count(), 0);
    }
}
