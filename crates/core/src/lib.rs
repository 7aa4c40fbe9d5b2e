//! Lenskit Core - value tree, keys and paths for the lenskit reactive lens.
//!
//! This crate provides the foundational types every other lenskit crate
//! speaks:
//!
//! - `Value`: the tree a lens looks into (scalars, sequences, maps), with
//!   reference-counted containers so untouched subtrees are shared
//! - `Kind` / `Tag`: container kind and coarse type tag of a value
//! - `Key` / `Path`: navigation steps and textual paths (`list[1].name`)
//! - `Error`: errors raised at the edges (path parsing, storage backends)
//!
//! # Example
//!
//! ```rust
//! use lenskit_core::{Key, Path, Value};
//!
//! let value = Value::object([
//!     ("list", Value::array([1, 2, 3])),
//!     ("name", Value::from("lens")),
//! ]);
//!
//! let path = Path::parse("list[1]").unwrap();
//! assert_eq!(value.at(&path), Value::from(2));
//!
//! let next = value.with_path(&path, Value::from(20));
//! assert_eq!(next.at(&path), Value::from(20));
//! // the original snapshot is untouched
//! assert_eq!(value.at(&path), Value::from(2));
//! assert!(next.get_key(&Key::from("name")).same(&value.get_key(&Key::from("name"))));
//! ```

#![no_std]

extern crate alloc;

mod error;
mod key;
mod path;
mod value;

pub use error::{Error, Result};
pub use key::Key;
pub use path::Path;
pub use value::{Kind, Object, Tag, Value};
