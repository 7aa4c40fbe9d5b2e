//! Lenskit Store - convenience node flavours over the lens engine.
//!
//! - `Store`: a lens with a write counter, store-typed navigation,
//!   `transform` projections and trigger-filtered subscriptions
//! - `ArrayStore`: a store over a sequence with `push`, `pop` and `remove`
//!
//! Both are `LensNode` flavours: they wrap a `Lens` and can be obtained from
//! any node with `go_as` or `cast`.
//!
//! # Example
//!
//! ```rust
//! use lenskit_core::Value;
//! use lenskit_store::create_store;
//!
//! let store = create_store(Value::object([("todos", Value::array(["write docs"]))]));
//! let todos = store.go_array("todos");
//!
//! todos.push("ship");
//! assert_eq!(todos.len(), 2);
//! assert_eq!(store.go("todos").go(1).get(), Value::from("ship"));
//! ```

#![no_std]

extern crate alloc;

mod array;
mod store;

pub use array::ArrayStore;
pub use store::{create_store, create_store_with, Store};
