//! Key binding and character entry integration tests

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{log, mention, reasons, recording, step, Trigger};
use impress_suggest::{Controller, Key, KeyEvent, MatcherHandlers, MemoryDocument, Reason, Session};
use rstest::rstest;

fn counting(key: Key, count: &Rc<Cell<usize>>) -> MatcherHandlers<Trigger> {
    let count = Rc::clone(count);
    MatcherHandlers::new().bind_key(key, move |_| {
        count.set(count.get() + 1);
        true
    })
}

fn session_with(handlers: MatcherHandlers<Trigger>) -> Session<Trigger> {
    let controller = Controller::new().with_matcher(mention(), handlers).unwrap();
    Session::new(MemoryDocument::new(""), controller)
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(10)]
fn test_bound_key_fires_once_per_press(#[case] presses: usize) {
    let count = Rc::new(Cell::new(0));
    let mut session = session_with(counting(Key::ArrowDown, &count));
    session.type_text("@al");

    for _ in 0..presses {
        assert!(session.press_key(KeyEvent::new(Key::ArrowDown)));
    }
    assert_eq!(count.get(), presses);
    assert_eq!(session.doc().text(), "@al");
}

#[test]
fn test_router_sees_one_key_per_change_and_the_exit() {
    let log = log();
    let routed = Rc::new(Cell::new(0));
    let mut handlers = recording(&log);
    for key in "mention".chars().map(Key::Char).chain([Key::Space]) {
        let routed = Rc::clone(&routed);
        handlers = handlers.bind_key(key, move |_| {
            routed.set(routed.get() + 1);
            false
        });
    }
    let mut session = session_with(handlers);

    for c in "This @mention ".chars() {
        let key = if c == ' ' { Key::Space } else { Key::Char(c) };
        session.press_key(KeyEvent::new(key));
    }

    let changes = reasons(&log).iter().filter(|reason| **reason == Reason::Change).count();
    assert_eq!(changes, 6);
    assert_eq!(routed.get(), changes + 1);
    assert_eq!(session.doc().text(), "This @mention ");
    assert_eq!(reasons(&log).last(), Some(&Reason::Exit));
}

#[test]
fn test_keys_without_match_are_not_routed() {
    let count = Rc::new(Cell::new(0));
    let mut session = session_with(counting(Key::ArrowDown, &count));
    session.type_text("hello");

    assert!(!session.press_key(KeyEvent::new(Key::ArrowDown)));
    assert_eq!(count.get(), 0);
}

#[test]
fn test_unbound_key_falls_through() {
    let count = Rc::new(Cell::new(0));
    let mut session = session_with(counting(Key::ArrowDown, &count));
    session.type_text("@al");

    assert!(!session.press_key(KeyEvent::new(Key::Char('i'))));
    assert_eq!(session.doc().text(), "@ali");
    assert_eq!(session.controller().next().unwrap().query.full, "ali");
}

#[test]
fn test_handler_sees_key_and_match() {
    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    let handlers = MatcherHandlers::new().bind_key(Key::Tab, move |ctx| {
        *sink.borrow_mut() = Some((ctx.key.copied(), ctx.matched.matched.query.partial.clone()));
        false
    });
    let mut session = session_with(handlers);
    session.type_text("@alice");
    session.move_cursor(-2);

    // Returning false leaves the key to the host.
    assert!(!session.press_key(KeyEvent::shift(Key::Tab)));
    assert_eq!(
        seen.borrow().clone(),
        Some((Some(KeyEvent::shift(Key::Tab)), "ali".to_string()))
    );
}

#[test]
fn test_escape_dismisses_until_trigger_is_deleted() {
    let log = log();
    let handlers = recording(&log).bind_key(Key::Escape, |ctx| {
        ctx.dismiss();
        true
    });
    let mut session = session_with(handlers);
    session.type_text("@al");

    assert!(session.press_key(KeyEvent::new(Key::Escape)));
    assert_eq!(reasons(&log), vec![Reason::Start, Reason::Change, Reason::Exit]);
    assert!(session.decoration().is_none());

    // Still dismissed while the occurrence survives.
    session.type_text("i");
    assert!(session.controller().next().is_none());
    assert_eq!(log.borrow().len(), 3);

    for _ in 0..4 {
        session.backspace();
    }
    assert_eq!(session.doc().text(), "");

    session.type_text("@b");
    assert_eq!(
        reasons(&log),
        vec![Reason::Start, Reason::Change, Reason::Exit, Reason::Start]
    );
}

#[test]
fn test_exiting_match_receives_keys_until_dispatched() {
    let count = Rc::new(Cell::new(0));
    let mut controller = Controller::new()
        .with_matcher(mention(), counting(Key::Enter, &count))
        .unwrap();
    let mut doc = MemoryDocument::new("@al b");
    step(&mut controller, &mut doc, |doc| doc.set_cursor(3));

    let before = doc.clone();
    let edit = doc.set_cursor(5);
    controller.apply(&edit, &before, &doc);

    assert!(controller.handle_key_down(&KeyEvent::new(Key::Enter), &mut doc));
    controller.dispatch(&mut doc);
    assert!(!controller.handle_key_down(&KeyEvent::new(Key::Enter), &mut doc));
    assert_eq!(count.get(), 1);
}

// === Character entry ===

#[test]
fn test_character_entry_can_consume_input() {
    let entries = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&entries);
    let handlers = MatcherHandlers::new().on_character_entry(move |entry| {
        sink.borrow_mut()
            .push((entry.text.to_string(), entry.from, entry.to, entry.matched.matched.text.full.clone()));
        entry.text == "!"
    });
    let mut session = session_with(handlers);
    session.type_text("@al!x");

    assert_eq!(session.doc().text(), "@alx");
    assert_eq!(
        entries.borrow().as_slice(),
        &[
            ("l".to_string(), 2, 2, "@a".to_string()),
            ("!".to_string(), 3, 3, "@al".to_string()),
            ("x".to_string(), 3, 3, "@al".to_string()),
        ]
    );
}

#[test]
fn test_character_entry_without_match() {
    let called = Rc::new(Cell::new(false));
    let flag = Rc::clone(&called);
    let mut controller: Controller<Trigger> = Controller::new()
        .with_matcher(
            mention(),
            MatcherHandlers::new().on_character_entry(move |_| {
                flag.set(true);
                true
            }),
        )
        .unwrap();

    assert!(!controller.handle_text_input("x", 0, 0));
    assert!(!called.get());
}
