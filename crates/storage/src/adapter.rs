//! Adapter persisting a root value under one key.

use crate::router::is_empty_item;
use crate::store::KeyValueStore;
use alloc::rc::Rc;
use alloc::string::String;
use lenskit_reactive::Adapter;
use tracing::warn;

/// Builds an `Adapter` that mirrors the root value into `store` under `key`.
///
/// Reads return the stored item when there is one, otherwise the value held
/// by the tree's router. Writes go to both.
pub fn key_value_adapter(store: Rc<dyn KeyValueStore>, key: impl Into<String>) -> Adapter {
    let key: Rc<str> = Rc::from(key.into());
    let (read_store, read_key) = (Rc::clone(&store), Rc::clone(&key));

    Adapter::new()
        .on_get(move |stored| match read_store.get_item(&read_key) {
            Ok(Some(value)) if !is_empty_item(&value) => value,
            Ok(_) => stored.clone(),
            Err(e) => {
                warn!(key = %read_key, error = %e, "storage read failed, using router value");
                stored.clone()
            }
        })
        .on_set(move |value, _| {
            if let Err(e) = store.set_item(&key, value.clone()) {
                warn!(key = %key, error = %e, "storage write failed");
            }
            value
        })
}
