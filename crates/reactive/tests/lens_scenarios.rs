//! End-to-end cascade behaviour of lens trees.

use lenskit_reactive::{
    create_lens_routed, create_lens_with, transform, Adapter, AttachEvent, ImmediateScheduler,
    Key, Lens, LensConfig, ManualScheduler, MemoryRouter, Path, Router, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

fn setup(value: Value) -> (Rc<ManualScheduler>, Lens) {
    let scheduler = Rc::new(ManualScheduler::new());
    let lens = create_lens_with(value, LensConfig::new().with_scheduler(scheduler.clone()));
    (scheduler, lens)
}

/// Records every event delivered to `lens`.
fn record(lens: &Lens) -> Rc<RefCell<Vec<AttachEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let e = events.clone();
    lens.on(move |event, _| e.borrow_mut().push(event.clone()));
    events
}

fn path(text: &str) -> Path {
    Path::parse(text).unwrap()
}

#[test]
fn list_item_write_fires_only_on_path() {
    let (scheduler, root) = setup(Value::object([("list", Value::array([1, 2, 3]))]));
    let list = record(&root.go("list"));
    let first = record(&root.go("list").go(0));
    let second = record(&root.go("list").go(1));

    root.go("list").go(1).set(20);
    assert_eq!(root.get(), Value::object([("list", Value::array([1, 20, 3]))]));
    scheduler.tick();

    let list = list.borrow();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].diffs.len(), 1);
    assert_eq!(list[0].diffs[0].path, path("[1]"));
    assert_eq!(list[0].diffs[0].value, Value::from(20));
    assert!(list[0].current.is_none());

    assert!(first.borrow().is_empty());
    let second = second.borrow();
    assert_eq!(second.len(), 1);
    assert!(second[0].is_strict());
    assert_eq!(second[0].current.as_ref().unwrap().prev, Value::from(2));
}

#[test]
fn sibling_subtree_is_not_visited() {
    let (scheduler, root) = setup(Value::object([
        ("a", Value::object([("x", 1)])),
        ("b", Value::object([("y", 1)])),
    ]));
    let a = record(&root.go("a"));
    let b = record(&root.go("b"));

    root.go("a").go("x").set(2);
    scheduler.tick();

    assert!(b.borrow().is_empty());
    let a = a.borrow();
    assert_eq!(a.len(), 1);
    assert!(a[0].current.is_none());
    assert!(!a[0].diffs.is_empty());
    assert_eq!(a[0].state().value, Value::object([("x", 2)]));
    assert_eq!(a[0].state().prev, Value::object([("x", 1)]));
}

#[test]
fn sibling_writes_coalesce_into_one_cascade() {
    let (scheduler, root) = setup(Value::object([("a", 1), ("b", 1)]));
    let events = record(&root);

    root.go("a").set(2);
    root.go("b").set(3);
    assert_eq!(scheduler.tick(), 1);

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].diffs.len(), 2);
    assert_eq!(events[0].prev(), &Value::object([("a", 1), ("b", 1)]));
    assert_eq!(events[0].value(), &Value::object([("a", 2), ("b", 3)]));
}

#[test]
fn later_write_resets_flush_delay() {
    let scheduler = Rc::new(ManualScheduler::new());
    let root = create_lens_with(
        Value::object([("m", 0), ("n", 0)]),
        LensConfig::new()
            .with_scheduler(scheduler.clone())
            .with_delay(5),
    );
    let events = record(&root);

    root.go("n").set(1);
    scheduler.advance(3);
    root.go("m").set(2);
    scheduler.advance(3);
    assert!(events.borrow().is_empty());

    scheduler.advance(2);
    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].value(), &Value::object([("m", 2), ("n", 1)]));
    assert_eq!(events[0].prev(), &Value::object([("m", 0), ("n", 0)]));
}

#[test]
fn repeated_writes_from_one_node_are_deduplicated() {
    let (scheduler, root) = setup(Value::object([("n", 0)]));
    let events = record(&root);

    let n = root.go("n");
    n.set(1);
    n.set(2);
    n.set(3);
    scheduler.tick();

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].diffs.len(), 1);
    assert_eq!(events[0].diffs[0].value, Value::from(3));
}

#[test]
fn ancestor_write_subsumes_descendant_write() {
    let (scheduler, root) = setup(Value::object([("a", Value::object([("x", 1), ("y", 1)]))]));
    let events = record(&root);

    root.go("a").go("x").set(5);
    root.go("a").set(Value::object([("x", 6), ("y", 1)]));
    scheduler.tick();

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].diffs.len(), 1);
    assert_eq!(events[0].diffs[0].path, path("a.x"));
    assert_eq!(events[0].diffs[0].value, Value::from(6));
    assert_eq!(events[0].diffs[0].prev, Value::from(1));
}

#[test]
fn unchanged_root_discards_batch() {
    let original = Value::object([("a", 1)]);
    let (scheduler, root) = setup(original.clone());
    let events = record(&root);

    root.go("a").set(2);
    root.set(original);
    scheduler.tick();

    assert!(events.borrow().is_empty());
}

#[test]
fn equal_value_write_produces_no_cascade() {
    let (scheduler, root) = setup(Value::object([("a", 1)]));
    let events = record(&root);

    root.go("a").set(1);
    scheduler.tick();

    assert!(events.borrow().is_empty());
}

#[test]
fn replacing_a_node_reaches_all_cached_children() {
    let (scheduler, root) = setup(Value::object([("a", Value::object([("x", 1), ("y", 2)]))]));
    let x = record(&root.go("a").go("x"));
    let y = record(&root.go("a").go("y"));

    root.set(Value::object([("a", Value::object([("x", 1), ("y", 3), ("z", 0)]))]));
    scheduler.tick();

    // the key set of `a` changed, so the whole of `a` was replaced
    assert_eq!(x.borrow().len(), 1);
    assert!(x.borrow()[0].diffs.is_empty());
    assert!(!x.borrow()[0].is_strict());
    assert_eq!(y.borrow().len(), 1);
    assert_eq!(y.borrow()[0].value(), &Value::from(3));
}

#[test]
fn object_to_null_evicts_children() {
    let (scheduler, root) = setup(Value::object([("a", Value::object([("x", 1)]))]));
    let a = root.go("a");
    let stale = a.go("x");
    let a_events = record(&a);
    let stale_events = record(&stale);

    a.set(Value::Null);
    scheduler.tick();

    assert_eq!(a_events.borrow().len(), 1);
    assert!(stale_events.borrow().is_empty());
    assert!(!stale.is_attached());
    assert_eq!(stale.get(), Value::Null);
    assert_eq!(a.children().count(), 0);

    let fresh = a.go("x");
    assert_ne!(fresh, stale);
    let fresh_events = record(&fresh);

    // a later replacement reaches the new child only
    a.set(Value::object([("x", 2)]));
    scheduler.tick();
    assert_eq!(fresh_events.borrow().len(), 1);
    assert!(stale_events.borrow().is_empty());
    assert_eq!(fresh.get(), Value::from(2));
    // the stale handle still reads through its parent
    assert_eq!(stale.get(), Value::from(2));
}

#[test]
fn shrinking_sequence_evicts_out_of_range_children() {
    let (scheduler, root) = setup(Value::array([1, 2, 3]));
    let first = root.go(0);
    let last = root.go(2);

    root.set(Value::array([1, 2]));
    scheduler.tick();

    assert!(first.is_attached());
    assert!(!last.is_attached());
    let keys: Vec<Key> = root.children().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![Key::Index(0)]);
}

#[test]
fn growing_sequence_keeps_children() {
    let (scheduler, root) = setup(Value::array([1, 2]));
    let second = root.go(1);

    root.set(Value::array([1, 2, 3]));
    scheduler.tick();

    assert!(second.is_attached());
}

#[test]
fn stale_handle_writes_through() {
    let (scheduler, root) = setup(Value::object([("a", Value::object([("x", 1)]))]));
    let stale = root.go("a").go("x");
    root.go("a").set(0);
    scheduler.tick();
    assert!(!stale.is_attached());

    let events = record(&root);
    stale.set(7);
    scheduler.tick();

    assert_eq!(root.get(), Value::object([("a", Value::object([("x", 7)]))]));
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn chain_mirrors_base_cascade() {
    let (scheduler, root) = setup(Value::object([("n", 1)]));
    let base = root.go("n");
    let doubled = base.chain(&transform(
        |v| Value::from(v.as_f64().unwrap_or(0.0) * 2.0),
        |v, _| Value::from(v.as_f64().unwrap_or(0.0) / 2.0),
    ));
    let base_events = record(&base);
    let chain_events = record(&doubled);

    base.set(4);
    scheduler.tick();

    assert_eq!(doubled.get(), Value::from(8.0));
    let base_events = base_events.borrow();
    let chain_events = chain_events.borrow();
    assert_eq!(chain_events.len(), 1);
    assert_eq!(chain_events[0].diffs, base_events[0].diffs);
    assert_eq!(chain_events[0].value(), &Value::from(8.0));
    assert_eq!(chain_events[0].prev(), &Value::from(2.0));
}

#[test]
fn chain_writes_are_reported_by_base() {
    let (scheduler, root) = setup(Value::object([("n", 1)]));
    let base = root.go("n");
    let mapping = transform(|v| v.clone(), |v, _| v);
    let chained = base.chain(&mapping);
    let base_events = record(&base);
    let chain_events = record(&chained);

    chained.set(3);
    assert_eq!(chained.path(), path("n"));
    scheduler.tick();

    assert_eq!(root.get(), Value::object([("n", 3)]));
    assert_eq!(base_events.borrow().len(), 1);
    assert_eq!(chain_events.borrow().len(), 1);
}

#[test]
fn reentrant_write_forms_next_batch() {
    let (scheduler, root) = setup(Value::object([("a", 0), ("b", 0)]));
    let b_events = record(&root.go("b"));

    let b = root.go("b");
    root.go("a").on(move |event, _| {
        let n = event.value().as_i64().unwrap_or(0);
        b.set(n * 10);
    });

    root.go("a").set(1);
    scheduler.tick();
    assert_eq!(root.go("b").get(), Value::from(10));
    assert!(b_events.borrow().is_empty());

    scheduler.tick();
    assert_eq!(b_events.borrow().len(), 1);
    assert_eq!(b_events.borrow()[0].current.as_ref().unwrap().prev, Value::from(0));
}

#[test]
fn reentrant_write_with_inline_scheduler_does_not_recurse() {
    let root = create_lens_with(
        Value::object([("a", 0), ("b", 0)]),
        LensConfig::new().with_scheduler(Rc::new(ImmediateScheduler::new())),
    );
    let order = Rc::new(RefCell::new(Vec::new()));

    let b = root.go("b");
    let o = order.clone();
    root.go("a").on(move |event, _| {
        o.borrow_mut().push("a:start");
        b.set(event.value().clone());
        o.borrow_mut().push("a:end");
    });
    let o = order.clone();
    root.go("b").on(move |_, _| o.borrow_mut().push("b"));

    root.go("a").set(5);

    assert_eq!(*order.borrow(), vec!["a:start", "a:end", "b"]);
    assert_eq!(root.go("b").get(), Value::from(5));
}

#[test]
fn adapter_reshapes_root() {
    let router = Rc::new(MemoryRouter::new(Value::object([
        ("payload", Value::from(1)),
        ("meta", Value::from("x")),
    ])));
    let adapter = Adapter::new()
        .on_get(|stored| stored.get_key(&Key::from("payload")))
        .on_set(|value, stored| stored.with_key(&Key::from("payload"), value));
    let scheduler = Rc::new(ManualScheduler::new());
    let root = create_lens_routed(
        router.clone(),
        LensConfig::new()
            .with_scheduler(scheduler.clone())
            .with_adapter(adapter),
    );
    let events = record(&root);

    assert_eq!(root.get(), Value::from(1));
    root.set(2);
    scheduler.tick();

    assert_eq!(
        router.get(),
        Value::object([("payload", Value::from(2)), ("meta", Value::from("x"))])
    );
    assert_eq!(events.borrow().len(), 1);
    assert_eq!(events.borrow()[0].prev(), &Value::from(1));
}

#[test]
fn subscribers_fire_in_subscription_order() {
    let (scheduler, root) = setup(Value::from(0));
    let order = Rc::new(RefCell::new(Vec::new()));
    for i in 0..3 {
        let o = order.clone();
        root.on(move |_, _| o.borrow_mut().push(i));
    }

    root.set(1);
    scheduler.tick();
    assert_eq!(*order.borrow(), vec![0, 1, 2]);
}

#[test]
fn dropped_tree_flush_is_harmless() {
    let (scheduler, root) = setup(Value::from(0));
    root.set(1);
    drop(root);
    assert_eq!(scheduler.tick(), 1);
}

#[test]
fn numeric_text_key_builds_map_under_missing_value() {
    let (scheduler, root) = setup(Value::object([("users", Value::Null)]));
    root.go("users").go("42").set("bob");
    scheduler.tick();

    let users = root.go("users").get();
    assert!(users.is_object());
    assert_eq!(users, Value::object([("42", "bob")]));
    // the index form reaches the same entry and node
    assert_eq!(root.go("users").go(42).get(), Value::from("bob"));
    assert_eq!(root.go("users").go(42), root.go("users").go("42"));
}

#[test]
fn largest_numeric_key_writes_without_overflow() {
    let (scheduler, root) = setup(Value::Null);
    let text = usize::MAX.to_string();
    root.go("ids").go(text.as_str()).set(1);
    root.go("slots").go(usize::MAX).set(2);
    scheduler.tick();

    assert_eq!(
        root.get(),
        Value::object([
            ("ids", Value::object([(text.as_str(), 1)])),
            ("slots", Value::object([(text.as_str(), 2)])),
        ])
    );
}
