//! Subscription management for lens nodes.
//!
//! Every node keeps an ordered set of callbacks. A callback is identified by
//! its `Rc` allocation, so subscribing the same `Callback` twice is a no-op
//! and `unsubscribe` takes the callback itself rather than an ID.

use crate::event::AttachEvent;
use crate::lens::Lens;
use crate::tree::{NodeId, Tree};
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;

/// Callback type for change notifications.
pub type Callback = Rc<dyn Fn(&AttachEvent, &Lens)>;

/// Wraps a closure into a `Callback`.
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&AttachEvent, &Lens) + 'static,
{
    Rc::new(f)
}

#[inline]
pub(crate) fn same_callback(a: &Callback, b: &Callback) -> bool {
    core::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// Ordered set of callbacks attached to one node.
#[derive(Default)]
pub(crate) struct Subscribers {
    entries: Vec<Callback>,
}

impl Subscribers {
    /// Adds `callback` unless it is already present.
    ///
    /// Returns true if it was added.
    pub fn subscribe(&mut self, callback: Callback) -> bool {
        if self.contains(&callback) {
            return false;
        }
        self.entries.push(callback);
        true
    }

    /// Removes `callback`.
    ///
    /// Returns true if it was found and removed.
    pub fn unsubscribe(&mut self, callback: &Callback) -> bool {
        let before = self.entries.len();
        self.entries.retain(|c| !same_callback(c, callback));
        self.entries.len() != before
    }

    pub fn contains(&self, callback: &Callback) -> bool {
        self.entries.iter().any(|c| same_callback(c, callback))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies the callbacks out so they can be fired without holding a borrow.
    pub fn snapshot(&self) -> Vec<Callback> {
        self.entries.clone()
    }
}

/// Handle returned by `Lens::subscribe`.
///
/// Dropping the handle keeps the subscription; call `unsubscribe` to remove
/// it. The handle keeps its node record but not the tree alive.
pub struct Subscription {
    tree: Weak<Tree>,
    node: NodeId,
    callback: Callback,
}

impl Subscription {
    pub(crate) fn new(tree: &Rc<Tree>, node: NodeId, callback: Callback) -> Self {
        tree.retain(node);
        Self {
            tree: Rc::downgrade(tree),
            node,
            callback,
        }
    }

    /// Returns the subscribed callback.
    #[inline]
    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    /// Returns true while the callback is still attached to its node.
    pub fn is_active(&self) -> bool {
        match self.tree.upgrade() {
            Some(tree) => tree.with(self.node, |r| r.subscribers.contains(&self.callback)),
            None => false,
        }
    }

    /// Removes the callback from its node.
    ///
    /// Returns true if it was attached.
    pub fn unsubscribe(self) -> bool {
        match self.tree.upgrade() {
            Some(tree) => tree.with_mut(self.node, |r| r.subscribers.unsubscribe(&self.callback)),
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(tree) = self.tree.upgrade() {
            tree.release(self.node);
        }
    }
}
