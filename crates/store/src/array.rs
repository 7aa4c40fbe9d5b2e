//! The `ArrayStore` node flavour.

use crate::store::Store;
use alloc::vec::Vec;
use core::ops::Deref;
use lenskit_core::Value;
use lenskit_reactive::{Lens, LensNode};

/// A `Store` over a sequence, with list operations.
///
/// Operations that change the list write a fresh sequence through
/// `Store::set`; a `pop` or `remove` that finds nothing writes nothing. A
/// value that is not a sequence reads as empty.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayStore {
    store: Store,
}

impl LensNode for ArrayStore {
    fn from_lens(lens: Lens) -> Self {
        Self {
            store: Store::from_lens(lens),
        }
    }

    fn as_lens(&self) -> &Lens {
        self.store.as_lens()
    }
}

impl Deref for ArrayStore {
    type Target = Store;

    fn deref(&self) -> &Store {
        &self.store
    }
}

impl ArrayStore {
    fn to_vec(&self) -> Vec<Value> {
        self.get().as_array().map(<[Value]>::to_vec).unwrap_or_default()
    }

    /// Appends `value`, returning the new length.
    pub fn push(&self, value: impl Into<Value>) -> usize {
        let mut items = self.to_vec();
        items.push(value.into());
        let len = items.len();
        self.store.set(items);
        len
    }

    /// Removes and returns the last item.
    pub fn pop(&self) -> Option<Value> {
        let mut items = self.to_vec();
        let last = items.pop()?;
        self.store.set(items);
        Some(last)
    }

    /// Removes every item equal to `value`. Returns true if any was removed.
    pub fn remove(&self, value: impl Into<Value>) -> bool {
        let value = value.into();
        self.remove_where(|item| *item == value)
    }

    /// Removes every item matching `predicate`. Returns true if any was
    /// removed.
    pub fn remove_where<F>(&self, predicate: F) -> bool
    where
        F: Fn(&Value) -> bool,
    {
        let current = self.get();
        let items = match current.as_array() {
            Some(items) => items,
            None => return false,
        };
        let kept: Vec<Value> = items.iter().filter(|v| !predicate(*v)).cloned().collect();
        if kept.len() == items.len() {
            return false;
        }
        self.store.set(kept);
        true
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.get().as_array().map_or(0, <[Value]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
