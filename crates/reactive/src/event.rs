//! Events delivered to subscribers.

use crate::diff::NodeDiff;
use alloc::vec::Vec;
use lenskit_core::{Path, Value};

/// The event a subscriber receives once per cascade.
///
/// `diffs` holds every change under the receiving node, with paths relative
/// to it. `current` is set only when one of those changes replaced the node
/// itself (an empty path); it is absent when only descendants changed.
#[derive(Clone, Debug, PartialEq)]
pub struct AttachEvent {
    /// Changes relative to the receiving node
    pub diffs: Vec<NodeDiff>,
    /// The change at the node's own path, if any
    pub current: Option<NodeDiff>,
    value: Value,
    prev: Value,
}

impl AttachEvent {
    /// Creates an event, picking `current` out of `diffs`.
    pub fn new(diffs: Vec<NodeDiff>, value: Value, prev: Value) -> Self {
        let current = diffs.iter().find(|d| d.is_root()).cloned();
        Self {
            diffs,
            current,
            value,
            prev,
        }
    }

    /// Returns true if the receiving node itself was replaced.
    #[inline]
    pub fn is_strict(&self) -> bool {
        self.current.is_some()
    }

    /// The node's own change: `current` when present, otherwise a diff
    /// synthesized from the node's new and previous value.
    pub fn state(&self) -> NodeDiff {
        match &self.current {
            Some(current) => current.clone(),
            None => NodeDiff::new(Path::root(), self.value.clone(), self.prev.clone()),
        }
    }

    /// The node's value after the change.
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The node's value before the change.
    #[inline]
    pub fn prev(&self) -> &Value {
        &self.prev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use lenskit_core::Key;

    #[test]
    fn test_event_without_current() {
        let diffs = vec![NodeDiff::new(
            Path::from(vec![Key::from("x")]),
            Value::from(2),
            Value::from(1),
        )];
        let event = AttachEvent::new(diffs, Value::object([("x", 2)]), Value::object([("x", 1)]));

        assert!(event.current.is_none());
        assert!(!event.is_strict());
        let state = event.state();
        assert!(state.is_root());
        assert_eq!(state.value, Value::object([("x", 2)]));
    }

    #[test]
    fn test_event_with_current() {
        let diffs = vec![NodeDiff::new(Path::root(), Value::from(2), Value::from(1))];
        let event = AttachEvent::new(diffs, Value::from(2), Value::from(1));

        assert!(event.is_strict());
        assert_eq!(event.state().prev, Value::from(1));
    }
}
