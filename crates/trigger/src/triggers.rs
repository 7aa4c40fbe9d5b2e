//! Event predicates.
//!
//! A trigger looks at a delivered event and answers with an `Option<bool>`:
//!
//! - `Some(true)`: accept, the callback should run
//! - `None`: no opinion; the next trigger of a `combine` decides
//! - `Some(false)`: interrupt, nothing after this trigger runs

use alloc::rc::Rc;
use alloc::vec::Vec;
use lenskit_core::Value;
use lenskit_reactive::{AttachEvent, Kind, Lens};

/// A predicate over a delivered event.
pub type Trigger = Rc<dyn Fn(&AttachEvent, &Lens) -> Option<bool>>;

/// Wraps a closure into a `Trigger`.
pub fn trigger<F>(f: F) -> Trigger
where
    F: Fn(&AttachEvent, &Lens) -> Option<bool> + 'static,
{
    Rc::new(f)
}

#[inline]
fn pass_if_false(accepted: bool) -> Option<bool> {
    accepted.then_some(true)
}

#[inline]
fn has_root_diff(event: &AttachEvent) -> bool {
    event.diffs.iter().any(|d| d.is_root())
}

/// Accepts when the node's own value changed: it was assigned, one of its
/// direct entries was replaced, a container appeared where there was none,
/// a sequence changed length, or a scalar changed.
pub fn object() -> Trigger {
    trigger(|event, _| pass_if_false(object_changed(event)))
}

fn object_changed(event: &AttachEvent) -> bool {
    if event.diffs.iter().any(|d| d.path.len() < 2) {
        return true;
    }

    let (value, prev) = (event.value(), event.prev());
    match (value.kind(), prev.kind()) {
        (Kind::Sequence, Kind::Sequence) => value.len() != prev.len(),
        (Kind::Sequence, _) | (Kind::Map, _) => prev.is_null(),
        _ if value.is_null() => false,
        _ => value != prev,
    }
}

/// `object`, and the new value is not absent.
pub fn object_defined() -> Trigger {
    trigger(|event, _| pass_if_false(object_changed(event) && !event.value().is_null()))
}

/// Accepts when the node itself was replaced.
pub fn strict() -> Trigger {
    trigger(|event, _| pass_if_false(has_root_diff(event)))
}

/// Accepts when the node was replaced, or when an ancestor was (the event
/// carries no diffs at all).
pub fn subtree() -> Trigger {
    trigger(|event, _| pass_if_false(has_root_diff(event) || event.diffs.is_empty()))
}

/// Accepts when the node lies on the path to a change.
pub fn on_path() -> Trigger {
    trigger(|event, _| pass_if_false(has_root_diff(event) || !event.diffs.is_empty()))
}

/// Accepts everything.
pub fn deep() -> Trigger {
    trigger(|_, _| Some(true))
}

/// The first trigger with an opinion decides.
pub fn combine(triggers: Vec<Trigger>) -> Trigger {
    trigger(move |event, lens| triggers.iter().find_map(|t| t(event, lens)))
}

/// Turns an interrupt into "no opinion".
pub fn pass(inner: Trigger) -> Trigger {
    trigger(move |event, lens| match inner(event, lens) {
        Some(true) => Some(true),
        _ => None,
    })
}

/// Turns "no opinion" into an interrupt.
pub fn interrupt(inner: Trigger) -> Trigger {
    trigger(move |event, lens| match inner(event, lens) {
        Some(true) => Some(true),
        _ => Some(false),
    })
}

/// Accepts when the node's new value satisfies `predicate`.
pub fn value<F>(predicate: F) -> Trigger
where
    F: Fn(&Value) -> bool + 'static,
{
    trigger(move |event, _| pass_if_false(predicate(event.value())))
}
