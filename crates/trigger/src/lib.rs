//! Lenskit Trigger - event filters and callback factories for lenskit.
//!
//! Subscribers receive every cascade that passes through their node. The
//! helpers here decide which of those events a callback should act on.
//!
//! - `triggers`: predicates (`strict`, `subtree`, `on_path`, `object`, ...)
//!   and combinators (`combine`, `pass`, `interrupt`)
//! - `differ`: triggers over one field of the node's value
//! - `callbacks`: trigger-guarded and debounced callbacks
//!
//! # Example
//!
//! ```rust
//! use lenskit_core::Value;
//! use lenskit_reactive::{callback, create_lens_with, LensConfig, ManualScheduler};
//! use lenskit_trigger::callbacks;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let scheduler = Rc::new(ManualScheduler::new());
//! let root = create_lens_with(
//!     Value::object([("a", Value::object([("x", 1)]))]),
//!     LensConfig::new().with_scheduler(scheduler.clone()),
//! );
//!
//! let replaced = Rc::new(Cell::new(0));
//! let r = replaced.clone();
//! root.go("a").subscribe(callbacks::strict(vec![callback(move |_, _| r.set(r.get() + 1))]));
//!
//! // a change below `a` reaches it, but `a` itself was not replaced
//! root.go("a").go("x").set(2);
//! scheduler.tick();
//! assert_eq!(replaced.get(), 0);
//!
//! root.go("a").set(5);
//! scheduler.tick();
//! assert_eq!(replaced.get(), 1);
//! ```

#![no_std]

extern crate alloc;

pub mod callbacks;
pub mod differ;
pub mod triggers;

pub use callbacks::create_callback;
pub use differ::{check, check_with, Check};
pub use triggers::{trigger, Trigger};
