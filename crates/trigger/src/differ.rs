//! Field-level checks over an event.
//!
//! `check("a.b")` looks at one field inside the node's value, before and
//! after the change, and builds triggers from it. Unlike the predicates in
//! `triggers`, these answer `Some(false)` when the check fails, so inside a
//! `combine` a failed check stops the chain.

use crate::triggers::{trigger, Trigger};
use alloc::rc::Rc;
use alloc::vec::Vec;
use lenskit_core::{Path, Result, Value};
use lenskit_reactive::{AttachEvent, Lens, NodeDiff};

type Getter = Rc<dyn Fn(&AttachEvent, &Lens) -> NodeDiff>;

/// Builder of triggers over one field of the node's value.
#[derive(Clone)]
pub struct Check {
    getter: Getter,
}

/// Checks the field at `field` (a dotted path; empty for the node itself).
pub fn check(field: &str) -> Result<Check> {
    let path = Path::parse(field)?;
    Ok(Check {
        getter: Rc::new(move |event, _| {
            let state = event.state();
            if path.is_root() {
                return state;
            }
            NodeDiff::new(state.path, state.value.at(&path), state.prev.at(&path))
        }),
    })
}

/// Checks the diff produced by `getter`.
pub fn check_with<F>(getter: F) -> Check
where
    F: Fn(&AttachEvent, &Lens) -> NodeDiff + 'static,
{
    Check {
        getter: Rc::new(getter),
    }
}

impl Check {
    /// Builds a trigger from an arbitrary test of the field's diff.
    pub fn using<F>(&self, method: F) -> Trigger
    where
        F: Fn(&NodeDiff) -> bool + 'static,
    {
        let getter = Rc::clone(&self.getter);
        trigger(move |event, lens| Some(method(&getter(event, lens))))
    }

    /// The field's new value equals one of `values`.
    pub fn is<I, V>(&self, values: I) -> Trigger
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.using(move |diff| values.iter().any(|v| *v == diff.value))
    }

    /// The field's new value satisfies `predicate`.
    pub fn is_with<F>(&self, predicate: F) -> Trigger
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.using(move |diff| predicate(&diff.value))
    }

    /// The field's value changed.
    pub fn changed(&self) -> Trigger {
        self.using(|diff| diff.value != diff.prev)
    }

    /// With `true`: the field went from absent to present. With `false`: it
    /// went from present to absent.
    pub fn defined(&self, defined: bool) -> Trigger {
        self.using(move |diff| diff.prev.is_null() == defined && !diff.value.is_null() == defined)
    }
}
