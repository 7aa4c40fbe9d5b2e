//! Transaction coordination.
//!
//! Writes are not diffed when they happen. Each `set` lands in the root slot
//! and then registers a transaction `(sender, path from root)` here. The
//! coordinator snapshots the root value once, before the first write of a
//! batch, and schedules a debounced flush. When the flush fires, the batch is
//! reduced to its outermost paths, diffed once against the snapshot and
//! cascaded from the root.

use crate::cascade::cascade;
use crate::diff::{diff_at, NodeDiff};
use crate::scheduler::Debounce;
use crate::tree::{NodeId, Tree, ROOT_ID};
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use lenskit_core::{Path, Value};
use tracing::{debug, trace, warn};

/// A pending write.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Transaction {
    pub sender: NodeId,
    pub path: Path,
}

/// Per-tree buffer of pending writes.
pub(crate) struct Coordinator {
    transactions: RefCell<Vec<Transaction>>,
    prev: RefCell<Option<Value>>,
    debounce: Debounce,
    flushing: Cell<bool>,
    rerun: Cell<bool>,
}

/// Clears the flushing flag even if a subscriber panics.
struct FlushGuard<'a>(&'a Coordinator);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.flushing.set(false);
    }
}

impl Coordinator {
    pub fn new(debounce: Debounce) -> Self {
        Self {
            transactions: RefCell::new(Vec::new()),
            prev: RefCell::new(None),
            debounce,
            flushing: Cell::new(false),
            rerun: Cell::new(false),
        }
    }

    #[inline]
    pub fn debounce(&self) -> &Debounce {
        &self.debounce
    }

    /// Snapshots the batch baseline unless one is already held.
    pub fn capture(&self, read: impl FnOnce() -> Value) {
        let mut prev = self.prev.borrow_mut();
        if prev.is_none() {
            *prev = Some(read());
        }
    }

    /// Returns the number of queued transactions.
    pub fn pending(&self) -> usize {
        self.transactions.borrow().len()
    }

    /// Registers a write and (re)schedules the flush.
    ///
    /// A write from the same sender as the most recently queued one is
    /// dropped: the flush reads the sender's latest value anyway.
    pub fn notify(tree: &Rc<Tree>, sender: NodeId, path: Path) {
        let co = &tree.coordinator;
        {
            let mut transactions = co.transactions.borrow_mut();
            if transactions.last().map(|t| t.sender) == Some(sender) {
                trace!(sender, "duplicate transaction dropped");
                return;
            }
            transactions.push(Transaction { sender, path });
        }
        // queued senders stay readable until their batch has run
        tree.retain(sender);

        let weak: Weak<Tree> = Rc::downgrade(tree);
        co.debounce.run(move |_| match weak.upgrade() {
            Some(tree) => Coordinator::flush(&tree),
            None => warn!("lens tree dropped before its pending batch was flushed"),
        });
    }

    /// Runs the pending batch now.
    ///
    /// Called while a flush is already running (a subscriber writing with an
    /// inline scheduler), the request is deferred until the running flush
    /// completes, so diffing never recurses.
    pub fn flush(tree: &Rc<Tree>) {
        let co = &tree.coordinator;
        if co.flushing.get() {
            co.rerun.set(true);
            return;
        }

        co.flushing.set(true);
        let _guard = FlushGuard(co);
        loop {
            run_batch(tree);
            if !co.rerun.replace(false) {
                break;
            }
        }
    }
}

fn run_batch(tree: &Rc<Tree>) {
    let co = &tree.coordinator;
    // Take the batch up front: writes made by subscribers form the next one.
    let batch = co.transactions.take();
    let prev = co.prev.take();
    let senders: Vec<NodeId> = batch.iter().map(|t| t.sender).collect();

    apply_batch(tree, batch, prev);

    for sender in senders {
        tree.release(sender);
    }
}

fn apply_batch(tree: &Rc<Tree>, batch: Vec<Transaction>, prev: Option<Value>) {
    let prev = match prev {
        Some(prev) if !batch.is_empty() => prev,
        _ => return,
    };

    let current = tree.read_root();
    if current.same(&prev) {
        debug!(transactions = batch.len(), "root unchanged, batch discarded");
        return;
    }

    let roots = reduce(batch);
    let mut diffs: Vec<NodeDiff> = Vec::new();
    for t in &roots {
        diffs.extend(diff_at(&prev.at(&t.path), &tree.value_of(t.sender), &t.path));
    }

    trace!(
        transactions = roots.len(),
        diffs = diffs.len(),
        "flushing batch"
    );

    if !diffs.is_empty() {
        cascade(tree, ROOT_ID, diffs, current, prev);
    }
}

/// Sorts transactions by path length and drops those lying under an
/// already kept path.
pub(crate) fn reduce(mut batch: Vec<Transaction>) -> Vec<Transaction> {
    batch.sort_by_key(|t| t.path.len());
    let mut roots: Vec<Transaction> = Vec::with_capacity(batch.len());
    for t in batch {
        if !roots.iter().any(|r| t.path.starts_with(&r.path)) {
            roots.push(t);
        }
    }
    roots
}
