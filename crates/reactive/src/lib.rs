//! Lenskit Reactive - reactive lens engine.
//!
//! A lens tree is a set of addressable views (`Lens`) onto one root value.
//! Every view can be read, written and observed on its own. Writes travel up
//! to the root, are coalesced per scheduler tick, diffed once and cascaded
//! back down so that each subscriber learns exactly what changed below it.
//!
//! # Core Concepts
//!
//! - `Lens`: a node; `get`, `set`, `go`, `subscribe`, `chain`
//! - `NodeDiff` / `diff`: shallow structural diff between two snapshots
//! - `AttachEvent`: what a subscriber receives, once per cascade
//! - `Scheduler` / `Debounce`: when a pending batch is flushed
//! - `Router` / `Adapter`: where the root value is stored
//! - `Mapping` / `transform`: bidirectional projections for `chain`
//!
//! # Example
//!
//! ```rust
//! use lenskit_core::Value;
//! use lenskit_reactive::{create_lens_with, LensConfig, ManualScheduler};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let scheduler = Rc::new(ManualScheduler::new());
//! let root = create_lens_with(
//!     Value::object([("list", Value::array([1, 2, 3]))]),
//!     LensConfig::new().with_scheduler(scheduler.clone()),
//! );
//!
//! let fired = Rc::new(Cell::new(0));
//! let f = fired.clone();
//! root.go("list").on(move |event, _| {
//!     assert_eq!(event.diffs.len(), 1);
//!     f.set(f.get() + 1);
//! });
//!
//! root.go("list").go(1).set(20);
//! assert_eq!(root.get(), Value::object([("list", Value::array([1, 20, 3]))]));
//!
//! // subscribers run when the scheduler flushes the batch
//! assert_eq!(fired.get(), 0);
//! scheduler.tick();
//! assert_eq!(fired.get(), 1);
//! ```

#![no_std]

extern crate alloc;

mod cascade;
pub mod chain;
pub mod config;
pub mod diff;
pub mod event;
pub mod lens;
pub mod router;
pub mod scheduler;
pub mod subscription;
mod transaction;
mod tree;

pub use chain::{transform, Mapping, Transform};
pub use config::LensConfig;
pub use diff::{diff, diff_at, patch, strip_diffs, NodeDiff};
pub use event::AttachEvent;
pub use lens::{
    create_lens, create_lens_as, create_lens_as_with, create_lens_routed, create_lens_with, Lens,
    LensNode,
};
pub use router::{Adapter, MemoryRouter, Router};
pub use scheduler::{Debounce, ImmediateScheduler, ManualScheduler, Scheduler, Stamp, Task, TaskId};
pub use subscription::{callback, Callback, Subscription};

// Re-export commonly used types from dependencies
pub use lenskit_core::{Key, Kind, Path, Value};
