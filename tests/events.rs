//! Event pumping, callback dispatch, and the close-veto contract.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use oriel::os::headless::HeadlessLibraryExt;
use oriel::{
    Action, ErrorKind, Key, Modifiers, Platform, WindowBuilder, WindowEvent,
};

fn lib() -> oriel::Library {
    let _ = env_logger::builder().is_test(true).try_init();
    oriel::init_with(Platform::Headless).expect("headless backend must initialize")
}

#[test]
fn injected_events_reach_callbacks_in_order() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();

    let seen: Rc<RefCell<Vec<(Key, u32, Action)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    lib.set_key_callback(
        window,
        Some(Box::new(move |_, _, key, scancode, action, _| {
            sink.borrow_mut().push((key, scancode, action));
        })),
    )
    .unwrap();

    lib.inject_key(window, Key::A, Action::Press, Modifiers::empty()).unwrap();
    lib.inject_key(window, Key::A, Action::Release, Modifiers::SHIFT).unwrap();
    assert!(seen.borrow().is_empty(), "nothing fires before the pump");

    lib.poll_events().unwrap();
    let events = seen.borrow();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0, Key::A);
    assert_eq!(events[0].2, Action::Press);
    assert_ne!(events[0].1, 0, "the scancode travels with the event");
    assert_eq!(events[1].2, Action::Release);
}

#[test]
fn close_request_without_callback_sets_the_flag() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();
    lib.inject_window_event(window, WindowEvent::CloseRequested).unwrap();
    lib.poll_events().unwrap();
    assert!(lib.window_should_close(window).unwrap());
}

#[test]
fn close_callback_vetoes_the_request() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();
    lib.set_window_close_callback(window, Some(Box::new(|_, _| false))).unwrap();

    lib.inject_window_event(window, WindowEvent::CloseRequested).unwrap();
    lib.poll_events().unwrap();
    assert!(!lib.window_should_close(window).unwrap(), "the veto holds");

    lib.set_window_close_callback(window, Some(Box::new(|_, _| true))).unwrap();
    lib.inject_window_event(window, WindowEvent::CloseRequested).unwrap();
    lib.poll_events().unwrap();
    assert!(lib.window_should_close(window).unwrap());
}

#[test]
fn callbacks_never_fire_for_destroyed_windows() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();

    let fired = Rc::new(RefCell::new(0u32));
    let sink = Rc::clone(&fired);
    lib.set_key_callback(
        window,
        Some(Box::new(move |_, _, _, _, _, _| *sink.borrow_mut() += 1)),
    )
    .unwrap();

    lib.inject_key(window, Key::Q, Action::Press, Modifiers::empty()).unwrap();
    lib.destroy_window(window).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(*fired.borrow(), 0);
}

#[test]
fn event_processing_is_not_reentrant() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();

    let observed = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&observed);
    lib.set_key_callback(
        window,
        Some(Box::new(move |lib, _, _, _, _, _| {
            *sink.borrow_mut() = Some(lib.poll_events().unwrap_err().kind());
        })),
    )
    .unwrap();

    lib.inject_key(window, Key::A, Action::Press, Modifiers::empty()).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(*observed.borrow(), Some(ErrorKind::PlatformError));
}

#[test]
fn callbacks_may_use_the_library() {
    let mut lib = lib();
    let window = WindowBuilder::new().with_title("before").build(&mut lib).unwrap();

    lib.set_key_callback(
        window,
        Some(Box::new(|lib, id, _, _, _, _| {
            lib.set_window_title(id, "after").unwrap();
        })),
    )
    .unwrap();

    lib.inject_key(window, Key::T, Action::Press, Modifiers::empty()).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(lib.window_title(window).unwrap(), "after");
}

#[test]
fn setters_return_the_previous_callback() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();

    let previous = lib.set_char_callback(window, Some(Box::new(|_, _, _| {}))).unwrap();
    assert!(previous.is_none());
    let previous = lib.set_char_callback(window, None).unwrap();
    assert!(previous.is_some());
}

#[test]
fn wait_with_timeout_returns_without_error() {
    let mut lib = lib();
    let start = Instant::now();
    lib.wait_events_timeout(Duration::from_millis(30)).unwrap();
    assert!(start.elapsed() >= Duration::from_millis(30));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn post_empty_event_interrupts_a_wait() {
    let mut lib = lib();
    lib.post_empty_event().unwrap();
    // Returns immediately because the wakeup is already queued.
    lib.wait_events().unwrap();
}

#[test]
fn wait_returns_early_when_events_are_pending() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();
    lib.inject_char(window, 'x').unwrap();

    let start = Instant::now();
    lib.wait_events_timeout(Duration::from_secs(30)).unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn error_callback_fires_synchronously_with_the_failure() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();
    lib.destroy_window(window).unwrap();

    let reported = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&reported);
    lib.set_error_callback(Some(Box::new(move |error| {
        sink.borrow_mut().push(error.kind());
    })));

    let err = lib.window_size(window).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
    assert_eq!(reported.borrow().as_slice(), &[ErrorKind::InvalidValue]);
    assert_eq!(lib.last_error().map(oriel::Error::kind), Some(ErrorKind::InvalidValue));
}

#[test]
fn state_tracking_updates_before_callbacks_run() {
    let mut lib = lib();
    let window = WindowBuilder::new().with_size(640, 480).build(&mut lib).unwrap();

    let sizes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&sizes);
    lib.set_window_size_callback(
        window,
        Some(Box::new(move |lib, id, width, height| {
            // The query already reflects the event being delivered.
            assert_eq!(lib.window_size(id).unwrap(), (width, height));
            sink.borrow_mut().push((width, height));
        })),
    )
    .unwrap();

    lib.inject_window_event(window, WindowEvent::Resized(1024, 768)).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(sizes.borrow().as_slice(), &[(1024, 768)]);
}
