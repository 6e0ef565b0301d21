//! Dispatch, registration and propagation tests

use crate::*;
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn recorder(log: &Log, name: &str) -> Handler {
    let log = log.clone();
    let name = name.to_string();
    Handler::new(move |_| log.borrow_mut().push(name.clone()))
}

#[test]
fn test_dispatch_runs_highest_priority_first() {
    let emitter = Emitter::new();
    let log: Log = Rc::default();

    emitter.on("tick", &recorder(&log, "low"), None, -5).unwrap();
    emitter.on("tick", &recorder(&log, "high"), None, 10).unwrap();
    emitter.on("tick", &recorder(&log, "mid"), None, 0).unwrap();

    emitter.emit("tick", EventData::new());

    assert_eq!(*log.borrow(), vec!["high", "mid", "low"]);
}

#[test]
fn test_equal_priorities_run_in_registration_order() {
    let emitter = Emitter::new();
    let log: Log = Rc::default();

    emitter.on("tick", &recorder(&log, "first"), None, 0).unwrap();
    emitter.on("tick", &recorder(&log, "second"), None, 0).unwrap();
    emitter.on("tick", &recorder(&log, "third"), None, 0).unwrap();

    emitter.emit("tick", EventData::new());

    assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn test_prevent_default_halts_dispatch() {
    let emitter = Emitter::new();
    let log: Log = Rc::default();

    let blocker = {
        let log = log.clone();
        Handler::new(move |event| {
            log.borrow_mut().push("blocker".into());
            event.prevent_default();
        })
    };
    emitter.on("next", &blocker, None, 100).unwrap();
    emitter.on("next", &recorder(&log, "navigate"), None, 0).unwrap();

    let event = emitter.emit("next", EventData::new());

    assert!(event.default_prevented());
    assert_eq!(*log.borrow(), vec!["blocker"]);
}

#[test]
fn test_prevent_default_also_blocks_parent() {
    let parent = Emitter::new();
    let child = Emitter::child_of(&parent, None);
    let log: Log = Rc::default();

    child
        .on("activate", &Handler::new(|event| { event.prevent_default(); }), None, 0)
        .unwrap();
    parent.on("activate", &recorder(&log, "parent"), None, 0).unwrap();

    child.emit("activate", EventData::new());

    assert!(log.borrow().is_empty());
}

#[test]
fn test_event_bubbles_to_parent_chain() {
    let root = Emitter::new();
    let middle = Emitter::child_of(&root, None);
    let leaf = Emitter::child_of(&middle, None);
    let log: Log = Rc::default();

    root.on("ping", &recorder(&log, "root"), None, 0).unwrap();
    middle.on("ping", &recorder(&log, "middle"), None, 0).unwrap();
    leaf.on("ping", &recorder(&log, "leaf"), None, 0).unwrap();

    leaf.emit("ping", EventData::new());

    assert_eq!(*log.borrow(), vec!["leaf", "middle", "root"]);
}

#[test]
fn test_stop_propagation_keeps_event_local() {
    let parent = Emitter::new();
    let child = Emitter::child_of(&parent, None);
    let log: Log = Rc::default();

    let stopper = {
        let log = log.clone();
        Handler::new(move |event| {
            log.borrow_mut().push("child".into());
            event.stop_propagation();
        })
    };
    child.on("ping", &stopper, None, 0).unwrap();
    child.on("ping", &recorder(&log, "child-2"), None, -1).unwrap();
    parent.on("ping", &recorder(&log, "parent"), None, 0).unwrap();

    child.emit("ping", EventData::new());

    // Remaining local listeners still run; only bubbling stops.
    assert_eq!(*log.borrow(), vec!["child", "child-2"]);
}

#[test]
fn test_parent_sees_same_event_object() {
    let parent = Emitter::new();
    let context = ContextId::new();
    let child = Emitter::child_of(&parent, Some(context));
    let target = Rc::new(RefCell::new(None));

    let seen = target.clone();
    parent
        .on(
            "ping",
            &Handler::new(move |event| *seen.borrow_mut() = event.target()),
            None,
            0,
        )
        .unwrap();

    child.emit("ping", EventData::new().with("value", 1u8));

    assert_eq!(*target.borrow(), Some(context));
}

#[test]
fn test_parent_link_is_weak() {
    let child = {
        let parent = Emitter::new();
        Emitter::child_of(&parent, None)
    };
    assert!(child.parent().is_none());
    child.emit("ping", EventData::new());
}

#[test]
fn test_off_removes_matching_registration_and_type() {
    let emitter = Emitter::new();
    let log: Log = Rc::default();
    let handler = recorder(&log, "h");
    let owner = ContextId::new();

    emitter.on("tick", &handler, Some(owner), 3).unwrap();
    assert_eq!(emitter.listener_count("tick"), 1);

    // Wrong priority or context does not match.
    emitter.off("tick", &handler, Some(owner), 0);
    emitter.off("tick", &handler, None, 3);
    assert_eq!(emitter.listener_count("tick"), 1);

    emitter.off("tick", &handler, Some(owner), 3);
    assert_eq!(emitter.listener_count("tick"), 0);
    assert!(!emitter.has_listeners("tick"));
    assert!(emitter.event_types().is_empty());

    emitter.emit("tick", EventData::new());
    assert!(log.borrow().is_empty());
}

#[test]
fn test_off_unknown_registration_is_noop() {
    let emitter = Emitter::new();
    let handler = Handler::new(|_| {});
    emitter.off("missing", &handler, None, 0);
    emitter.off(["a", "b"], &handler, None, 0);
    assert!(emitter.event_types().is_empty());
}

#[test]
fn test_duplicate_registrations_are_independent() {
    let emitter = Emitter::new();
    let log: Log = Rc::default();
    let handler = recorder(&log, "dup");

    emitter.on("tick", &handler, None, 0).unwrap();
    emitter.on("tick", &handler, None, 0).unwrap();
    emitter.emit("tick", EventData::new());
    assert_eq!(log.borrow().len(), 2);

    emitter.off("tick", &handler, None, 0);
    emitter.emit("tick", EventData::new());
    assert_eq!(log.borrow().len(), 3);
}

#[test]
fn test_on_multiple_types() {
    let emitter = Emitter::new();
    let log: Log = Rc::default();
    let handler = recorder(&log, "mode");

    emitter
        .on(["slidemodeenter", "slidemodeexit"], &handler, None, 0)
        .unwrap();
    emitter.emit("slidemodeenter", EventData::new());
    emitter.emit("slidemodeexit", EventData::new());

    assert_eq!(log.borrow().len(), 2);
    assert_eq!(emitter.event_types(), vec!["slidemodeenter", "slidemodeexit"]);
}

#[test]
fn test_empty_type_is_invalid_argument() {
    let emitter = Emitter::new();
    let handler = Handler::new(|_| {});

    let result = emitter.on("", &handler, None, 0);
    assert!(matches!(result, Err(EventError::InvalidArgument(_))));

    let result = emitter.once("", &handler, None, 0);
    assert!(matches!(result, Err(EventError::InvalidArgument(_))));

    let no_types: [&str; 0] = [];
    assert!(emitter.on(no_types, &handler, None, 0).is_err());
}

#[test]
fn test_once_runs_exactly_once() {
    let emitter = Emitter::new();
    let log: Log = Rc::default();

    emitter.once("init", &recorder(&log, "once"), None, 0).unwrap();
    emitter.emit("init", EventData::new());
    emitter.emit("init", EventData::new());
    emitter.emit("init", EventData::new());

    assert_eq!(log.borrow().len(), 1);
    assert!(!emitter.has_listeners("init"));
}

#[test]
fn test_once_is_deregistered_before_callback_runs() {
    let emitter = Emitter::new();
    let count = Rc::new(RefCell::new(0));

    let reentrant = {
        let emitter = emitter.clone();
        let count = count.clone();
        Handler::new(move |_| {
            *count.borrow_mut() += 1;
            assert!(!emitter.has_listeners("init"));
            emitter.emit("init", EventData::new());
        })
    };
    emitter.once("init", &reentrant, None, 5).unwrap();
    emitter.emit("init", EventData::new());

    assert_eq!(*count.borrow(), 1);
}

#[test]
fn test_once_not_repeated_by_nested_emit_from_higher_priority() {
    let emitter = Emitter::new();
    let log: Log = Rc::default();

    let nested = {
        let emitter = emitter.clone();
        let fired = Rc::new(RefCell::new(false));
        Handler::new(move |_| {
            if !fired.replace(true) {
                emitter.emit("tick", EventData::new());
            }
        })
    };
    emitter.on("tick", &nested, None, 10).unwrap();
    emitter.once("tick", &recorder(&log, "once"), None, 0).unwrap();

    emitter.emit("tick", EventData::new());

    assert_eq!(*log.borrow(), vec!["once"]);
}

#[test]
fn test_listener_removed_mid_dispatch_is_skipped() {
    let emitter = Emitter::new();
    let log: Log = Rc::default();
    let victim = recorder(&log, "victim");

    let remover = {
        let emitter = emitter.clone();
        let victim = victim.clone();
        Handler::new(move |_| {
            emitter.off("tick", &victim, None, 0);
        })
    };
    emitter.on("tick", &remover, None, 1).unwrap();
    emitter.on("tick", &victim, None, 0).unwrap();

    emitter.emit("tick", EventData::new());

    assert!(log.borrow().is_empty());
}

#[test]
fn test_listener_added_mid_dispatch_misses_event_in_flight() {
    let emitter = Emitter::new();
    let log: Log = Rc::default();
    let late = recorder(&log, "late");

    let adder = {
        let emitter = emitter.clone();
        let late = late.clone();
        Handler::new(move |_| {
            emitter.on("tick", &late, None, 0).unwrap();
        })
    };
    emitter.once("tick", &adder, None, 0).unwrap();

    emitter.emit("tick", EventData::new());
    assert!(log.borrow().is_empty());

    emitter.emit("tick", EventData::new());
    assert_eq!(*log.borrow(), vec!["late"]);
}

#[test]
fn test_emit_event_dispatches_existing_event() {
    let emitter = Emitter::with_context(ContextId::new());
    let event = Event::new("custom", EventData::new().with("slide", "intro".to_string()));
    let seen = Rc::new(RefCell::new(String::new()));

    let sink = seen.clone();
    emitter
        .on(
            "custom",
            &Handler::new(move |event| {
                *sink.borrow_mut() = event.get::<String>("slide").cloned().unwrap_or_default();
            }),
            None,
            0,
        )
        .unwrap();
    emitter.emit_event("custom", &event);

    assert_eq!(*seen.borrow(), "intro");
    assert_eq!(event.target(), None);
}

#[test]
fn test_group_off_all_is_exact_and_idempotent() {
    let emitter = Emitter::new();
    let log: Log = Rc::default();
    let outside = recorder(&log, "outside");
    let inside = recorder(&log, "inside");

    emitter.on("tick", &outside, None, 0).unwrap();

    let group = emitter.group();
    group
        .on("tick", &inside, None, 0)
        .unwrap()
        .on(["tock", "tack"], &inside, None, 2)
        .unwrap();
    assert_eq!(group.len(), 3);

    group.off_all();
    assert!(group.is_empty());
    assert_eq!(emitter.event_types(), vec!["tick"]);

    group.off_all();
    assert_eq!(emitter.listener_count("tick"), 1);

    emitter.emit("tick", EventData::new());
    assert_eq!(*log.borrow(), vec!["outside"]);
}

#[test]
fn test_group_leaves_identical_outside_registration() {
    let emitter = Emitter::new();
    let handler = Handler::new(|_| {});

    emitter.on("tick", &handler, None, 0).unwrap();
    let group = emitter.group();
    group.on("tick", &handler, None, 0).unwrap();
    assert_eq!(emitter.listener_count("tick"), 2);

    group.off_all();
    assert_eq!(emitter.listener_count("tick"), 1);
}

#[test]
fn test_event_data_merge_and_lookup() {
    let mut data = EventData::new().with("index", 1usize).with("name", "a");
    data.merge(&EventData::new().with("index", 2usize));

    assert_eq!(data.get::<usize>("index"), Some(&2));
    assert_eq!(data.get::<&str>("name"), Some(&"a"));
    assert_eq!(data.get::<u32>("index"), None);
    assert!(data.contains("name"));
    assert_eq!(data.len(), 2);
}
