//! Structural diff between two snapshots of a value tree.
//!
//! A `NodeDiff` names one changed location: its path, the new value and the
//! previous value there. The diff is shallow: it stops at the first
//! structural mismatch (different type tag, different sequence length,
//! different map key set) and reports the whole subtree as replaced. It is
//! not a minimal-edit diff.

use alloc::vec::Vec;
use lenskit_core::{Key, Path, Value};

/// One changed location in the value tree.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDiff {
    /// Path from the receiving node to the change
    pub path: Path,
    /// New value at `path`
    pub value: Value,
    /// Previous value at `path`
    pub prev: Value,
}

impl NodeDiff {
    /// Creates a new diff.
    pub fn new(path: Path, value: Value, prev: Value) -> Self {
        Self { path, value, prev }
    }

    /// Returns true if this diff replaces the receiving node itself.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    /// Returns true if the first key of this diff is `key`.
    #[inline]
    pub fn enters(&self, key: &Key) -> bool {
        self.path.first() == Some(key)
    }

    /// Returns this diff with its first key removed.
    pub fn strip(&self) -> Self {
        Self {
            path: self.path.tail(),
            value: self.value.clone(),
            prev: self.prev.clone(),
        }
    }
}

/// Computes the changes between `prev` and `next`.
pub fn diff(prev: &Value, next: &Value) -> Vec<NodeDiff> {
    diff_at(prev, next, &Path::root())
}

/// Computes the changes between `prev` and `next`, prefixing every emitted
/// path with `path`.
pub fn diff_at(prev: &Value, next: &Value, path: &Path) -> Vec<NodeDiff> {
    let mut diffs = Vec::new();
    let mut keys = path.keys().to_vec();
    collect(prev, next, &mut keys, &mut diffs);
    diffs
}

fn collect(prev: &Value, next: &Value, path: &mut Vec<Key>, diffs: &mut Vec<NodeDiff>) {
    if prev.tag() != next.tag() {
        diffs.push(replaced(path, prev, next));
        return;
    }

    match (prev, next) {
        (Value::Array(a), Value::Array(b)) => {
            if alloc::rc::Rc::ptr_eq(a, b) {
                return;
            }
            if a.len() != b.len() {
                diffs.push(replaced(path, prev, next));
                return;
            }
            for (i, (p, n)) in a.iter().zip(b.iter()).enumerate() {
                path.push(Key::Index(i));
                collect(p, n, path, diffs);
                path.pop();
            }
        }
        (Value::Object(a), Value::Object(b)) => {
            if alloc::rc::Rc::ptr_eq(a, b) {
                return;
            }
            // keys are kept sorted, so equal key sets compare equal in order
            if a.len() != b.len() || !a.keys().eq(b.keys()) {
                diffs.push(replaced(path, prev, next));
                return;
            }
            for ((key, p), n) in a.iter().zip(b.values()) {
                path.push(Key::field(key));
                collect(p, n, path, diffs);
                path.pop();
            }
        }
        _ => {
            if prev != next {
                diffs.push(replaced(path, prev, next));
            }
        }
    }
}

fn replaced(path: &[Key], prev: &Value, next: &Value) -> NodeDiff {
    NodeDiff::new(Path::from(path), next.clone(), prev.clone())
}

/// Keeps the diffs entering `key`, stripped of that key.
pub fn strip_diffs(key: &Key, diffs: &[NodeDiff]) -> Vec<NodeDiff> {
    diffs
        .iter()
        .filter(|d| d.enters(key))
        .map(NodeDiff::strip)
        .collect()
}

/// Applies every diff's new value at its path on top of `base`.
pub fn patch(base: &Value, diffs: &[NodeDiff]) -> Value {
    diffs
        .iter()
        .fold(base.clone(), |acc, d| acc.with_path(&d.path, d.value.clone()))
}
