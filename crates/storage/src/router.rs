//! Router over a key-value backend.

use crate::store::KeyValueStore;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;
use lenskit_core::Value;
use lenskit_reactive::Router;
use tracing::warn;

/// Routes a root value to one key of a `KeyValueStore`.
///
/// Reads prefer the stored item. A missing or empty item (absent, or an
/// empty map) and a failing backend fall back to the router's own copy,
/// which starts as the initial data and follows every write.
pub struct KeyValueRouter {
    store: Rc<dyn KeyValueStore>,
    key: String,
    data: RefCell<Value>,
}

impl KeyValueRouter {
    /// Creates a router for `key`, with `initial` as fallback data.
    pub fn new(store: Rc<dyn KeyValueStore>, key: impl Into<String>, initial: impl Into<Value>) -> Self {
        Self {
            store,
            key: key.into(),
            data: RefCell::new(initial.into()),
        }
    }

    /// Returns the storage key.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }
}

pub(crate) fn is_empty_item(value: &Value) -> bool {
    value.is_null() || (value.is_object() && value.is_empty())
}

impl Router for KeyValueRouter {
    fn get(&self) -> Value {
        match self.store.get_item(&self.key) {
            Ok(Some(value)) if !is_empty_item(&value) => value,
            Ok(_) => self.data.borrow().clone(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "storage read failed, using fallback data");
                self.data.borrow().clone()
            }
        }
    }

    fn set(&self, value: Value) {
        *self.data.borrow_mut() = value.clone();
        if let Err(e) = self.store.set_item(&self.key, value) {
            warn!(key = %self.key, error = %e, "storage write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKeyValueStore;
    use lenskit_core::{Error, Object, Result};

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get_item(&self, key: &str) -> Result<Option<Value>> {
            Err(Error::storage(key, "backend offline"))
        }

        fn set_item(&self, key: &str, _value: Value) -> Result<()> {
            Err(Error::storage(key, "backend offline"))
        }

        fn remove_item(&self, key: &str) -> Result<Option<Value>> {
            Err(Error::storage(key, "backend offline"))
        }
    }

    #[test]
    fn test_router_falls_back_to_initial() {
        let store = Rc::new(MemoryKeyValueStore::new());
        let router = KeyValueRouter::new(store.clone(), "state", 1);
        assert_eq!(router.get(), Value::from(1));

        store.set_item("state", Value::from(Object::new())).unwrap();
        assert_eq!(router.get(), Value::from(1));
    }

    #[test]
    fn test_router_prefers_stored_item() {
        let store = Rc::new(MemoryKeyValueStore::new());
        store.set_item("state", Value::from("saved")).unwrap();
        let router = KeyValueRouter::new(store, "state", 1);
        assert_eq!(router.get(), Value::from("saved"));
    }

    #[test]
    fn test_router_writes_through() {
        let store = Rc::new(MemoryKeyValueStore::new());
        let router = KeyValueRouter::new(store.clone(), "state", Value::Null);
        router.set(Value::from(7));
        assert_eq!(store.get_item("state").unwrap(), Some(Value::from(7)));
        assert_eq!(router.key(), "state");
    }

    #[test]
    fn test_router_survives_broken_backend() {
        let router = KeyValueRouter::new(Rc::new(BrokenStore), "state", 1);
        assert_eq!(router.get(), Value::from(1));
        router.set(Value::from(2));
        assert_eq!(router.get(), Value::from(2));
    }
}
