//! Lenskit Storage - key-value persistence for lenskit lenses.
//!
//! This crate connects a lens tree's root value to a key-value backend:
//!
//! - `KeyValueStore`: the backend contract (`get_item` / `set_item`)
//! - `MemoryKeyValueStore`: in-memory backend
//! - `KeyValueRouter`: stores the root value itself under one key
//! - `key_value_adapter`: mirrors the root value into a backend on top of
//!   any router
//!
//! Backend failures are logged and answered with fallback data; they never
//! reach the lens tree.
//!
//! # Example
//!
//! ```rust
//! use lenskit_core::Value;
//! use lenskit_reactive::{create_lens_routed, LensConfig};
//! use lenskit_storage::{KeyValueRouter, KeyValueStore, MemoryKeyValueStore};
//! use std::rc::Rc;
//!
//! let store = Rc::new(MemoryKeyValueStore::new());
//! let router = Rc::new(KeyValueRouter::new(store.clone(), "settings", Value::object([("theme", "dark")])));
//! let settings = create_lens_routed(router, LensConfig::new());
//!
//! settings.go("theme").set("light");
//! assert_eq!(
//!     store.get_item("settings").unwrap(),
//!     Some(Value::object([("theme", "light")]))
//! );
//! ```

#![no_std]

extern crate alloc;

pub mod adapter;
pub mod router;
pub mod store;

pub use adapter::key_value_adapter;
pub use router::KeyValueRouter;
pub use store::{KeyValueStore, MemoryKeyValueStore};
