//! Input normalization, sticky modes, and cursor state.

use std::cell::RefCell;
use std::rc::Rc;

use oriel::os::headless::HeadlessLibraryExt;
use oriel::{
    Action, CursorMode, ErrorKind, Key, Modifiers, MouseButton, Platform, WindowBuilder,
    WindowEvent,
};

fn lib() -> oriel::Library {
    let _ = env_logger::builder().is_test(true).try_init();
    oriel::init_with(Platform::Headless).expect("headless backend must initialize")
}

#[test]
fn key_state_follows_events() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();

    assert_eq!(lib.get_key(window, Key::W).unwrap(), Action::Release);
    lib.inject_key(window, Key::W, Action::Press, Modifiers::empty()).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(lib.get_key(window, Key::W).unwrap(), Action::Press);

    lib.inject_key(window, Key::W, Action::Release, Modifiers::empty()).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(lib.get_key(window, Key::W).unwrap(), Action::Release);
}

#[test]
fn sticky_keys_latch_a_missed_press_exactly_once() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();
    lib.set_sticky_keys(window, true).unwrap();
    assert!(lib.sticky_keys(window).unwrap());

    // Press and release both arrive before the application polls.
    lib.inject_key(window, Key::Space, Action::Press, Modifiers::empty()).unwrap();
    lib.inject_key(window, Key::Space, Action::Release, Modifiers::empty()).unwrap();
    lib.poll_events().unwrap();

    assert_eq!(lib.get_key(window, Key::Space).unwrap(), Action::Press);
    assert_eq!(lib.get_key(window, Key::Space).unwrap(), Action::Release);
    assert_eq!(lib.get_key(window, Key::Space).unwrap(), Action::Release);
}

#[test]
fn sticky_buttons_latch_like_sticky_keys() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();
    lib.set_sticky_buttons(window, true).unwrap();
    assert!(lib.sticky_buttons(window).unwrap());

    lib.inject_window_event(
        window,
        WindowEvent::MouseButton {
            button: MouseButton::Left,
            action: Action::Press,
            mods: Modifiers::empty(),
        },
    )
    .unwrap();
    lib.inject_window_event(
        window,
        WindowEvent::MouseButton {
            button: MouseButton::Left,
            action: Action::Release,
            mods: Modifiers::empty(),
        },
    )
    .unwrap();
    lib.poll_events().unwrap();

    assert_eq!(lib.get_mouse_button(window, MouseButton::Left).unwrap(), Action::Press);
    assert_eq!(lib.get_mouse_button(window, MouseButton::Left).unwrap(), Action::Release);
}

#[test]
fn modifiers_travel_with_button_events() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    lib.set_mouse_button_callback(
        window,
        Some(Box::new(move |_, _, button, action, mods| {
            sink.borrow_mut().push((button, action, mods));
        })),
    )
    .unwrap();

    lib.inject_window_event(
        window,
        WindowEvent::MouseButton {
            button: MouseButton::Right,
            action: Action::Press,
            mods: Modifiers::CONTROL | Modifiers::SHIFT,
        },
    )
    .unwrap();
    lib.poll_events().unwrap();

    let events = seen.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, MouseButton::Right);
    assert!(events[0].2.contains(Modifiers::CONTROL));
    assert!(events[0].2.contains(Modifiers::SHIFT));
}

#[test]
fn cursor_enter_and_position_are_distinct_events() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();

    let entered = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&entered);
    lib.set_cursor_enter_callback(
        window,
        Some(Box::new(move |_, _, inside| sink.borrow_mut().push(inside))),
    )
    .unwrap();

    assert!(!lib.window_hovered(window).unwrap());
    lib.inject_window_event(window, WindowEvent::CursorEntered(true)).unwrap();
    lib.inject_window_event(window, WindowEvent::CursorMoved(12.5, 34.25)).unwrap();
    lib.poll_events().unwrap();

    assert!(lib.window_hovered(window).unwrap());
    assert_eq!(lib.cursor_position(window).unwrap(), (12.5, 34.25));
    assert_eq!(entered.borrow().as_slice(), &[true]);

    lib.inject_window_event(window, WindowEvent::CursorEntered(false)).unwrap();
    lib.poll_events().unwrap();
    assert!(!lib.window_hovered(window).unwrap());
    assert_eq!(entered.borrow().as_slice(), &[true, false]);
}

#[test]
fn cursor_warps_do_not_generate_motion_events() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();

    let moved = Rc::new(RefCell::new(0u32));
    let sink = Rc::clone(&moved);
    lib.set_cursor_pos_callback(
        window,
        Some(Box::new(move |_, _, _, _| *sink.borrow_mut() += 1)),
    )
    .unwrap();

    lib.set_cursor_position(window, 100.0, 200.0).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(lib.cursor_position(window).unwrap(), (100.0, 200.0));
    assert_eq!(*moved.borrow(), 0);

    let err = lib.set_cursor_position(window, f64::NAN, 0.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidValue);
}

#[test]
fn cursor_modes_round_trip() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();
    assert_eq!(lib.cursor_mode(window).unwrap(), CursorMode::Normal);
    lib.set_cursor_mode(window, CursorMode::Disabled).unwrap();
    assert_eq!(lib.cursor_mode(window).unwrap(), CursorMode::Disabled);
    lib.set_cursor_mode(window, CursorMode::Hidden).unwrap();
    assert_eq!(lib.cursor_mode(window).unwrap(), CursorMode::Hidden);
}

#[test]
fn character_input_is_decoupled_from_key_events() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();

    let text = Rc::new(RefCell::new(String::new()));
    let sink = Rc::clone(&text);
    lib.set_char_callback(
        window,
        Some(Box::new(move |_, _, character| sink.borrow_mut().push(character))),
    )
    .unwrap();

    // One dead-key composition: two physical strokes, one code point.
    lib.inject_key(window, Key::GraveAccent, Action::Press, Modifiers::empty()).unwrap();
    lib.inject_key(window, Key::GraveAccent, Action::Release, Modifiers::empty()).unwrap();
    lib.inject_key(window, Key::E, Action::Press, Modifiers::empty()).unwrap();
    lib.inject_char(window, 'è').unwrap();
    lib.inject_key(window, Key::E, Action::Release, Modifiers::empty()).unwrap();
    lib.poll_events().unwrap();

    assert_eq!(text.borrow().as_str(), "è");
}

#[test]
fn unknown_keys_keep_their_scancode() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    lib.set_key_callback(
        window,
        Some(Box::new(move |_, _, key, scancode, _, _| {
            sink.borrow_mut().push((key, scancode));
        })),
    )
    .unwrap();

    lib.inject_window_event(
        window,
        WindowEvent::Key {
            key: Key::Unknown,
            scancode: 0x1D7,
            action: Action::Press,
            mods: Modifiers::empty(),
        },
    )
    .unwrap();
    lib.poll_events().unwrap();

    assert_eq!(seen.borrow().as_slice(), &[(Key::Unknown, 0x1D7)]);
    // Unknown keys have no state table entry.
    assert_eq!(lib.get_key(window, Key::Unknown).unwrap(), Action::Release);
}

#[test]
fn key_names_and_scancodes() {
    let lib = lib();
    assert_eq!(Key::A.name(), Some("a"));
    assert_eq!(Key::F5.name(), None);
    assert!(lib.key_scancode(Key::Escape).is_some());
    assert_eq!(lib.key_scancode(Key::Unknown), None);
}

#[test]
fn scroll_and_drop_events_are_delivered() {
    let mut lib = lib();
    let window = WindowBuilder::new().build(&mut lib).unwrap();

    let scrolls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&scrolls);
    lib.set_scroll_callback(
        window,
        Some(Box::new(move |_, _, x, y| sink.borrow_mut().push((x, y)))),
    )
    .unwrap();

    let drops = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&drops);
    lib.set_drop_callback(
        window,
        Some(Box::new(move |_, _, paths| {
            sink.borrow_mut().extend(paths.to_vec());
        })),
    )
    .unwrap();

    lib.inject_window_event(window, WindowEvent::Scroll(0.0, -3.0)).unwrap();
    lib.inject_window_event(
        window,
        WindowEvent::FileDropped(vec!["/tmp/shot.png".into()]),
    )
    .unwrap();
    lib.poll_events().unwrap();

    assert_eq!(scrolls.borrow().as_slice(), &[(0.0, -3.0)]);
    assert_eq!(drops.borrow().len(), 1);
}
