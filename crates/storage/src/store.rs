//! Key-value backends.
//!
//! This module provides the `KeyValueStore` trait, the storage contract the
//! routers and adapters of this crate are written against, and an in-memory
//! implementation.

use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use hashbrown::HashMap;
use lenskit_core::{Result, Value};

/// A string-keyed store of values.
///
/// Backends report failures as `Error::Storage`. Callers in this crate log
/// them and fall back; they are never propagated into a lens tree.
pub trait KeyValueStore {
    /// Reads the value under `key`.
    fn get_item(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`.
    fn set_item(&self, key: &str, value: Value) -> Result<()>;

    /// Removes the value under `key`, returning it.
    fn remove_item(&self, key: &str) -> Result<Option<Value>>;
}

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    /// Key → stored value.
    items: RefCell<HashMap<String, Value>>,
}

impl MemoryKeyValueStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored items.
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Returns all keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.items.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Removes every item.
    pub fn clear(&self) {
        self.items.borrow_mut().clear();
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: Value) -> Result<()> {
        self.items.borrow_mut().insert(String::from(key), value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.items.borrow_mut().remove(key))
    }
}
