//! The lens node.
//!
//! A `Lens` is a cheap handle (`Rc` to its tree plus a node id) onto one
//! location of the root value. Reading walks from the root on every call;
//! writing merges the new value into fresh copies of the ancestors and then
//! registers a transaction with the tree's coordinator. Subscribers are only
//! called from the deferred flush, never from inside `set`.

use crate::config::LensConfig;
use crate::event::AttachEvent;
use crate::router::{MemoryRouter, Router};
use crate::scheduler::Scheduler;
use crate::subscription::{callback, Callback, Subscription};
use crate::transaction::Coordinator;
use crate::tree::{NodeId, Source, Tree, ROOT_ID};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;
use lenskit_core::{Key, Path, Value};

/// A node flavour: a richer type wrapping a `Lens`.
///
/// Navigation and creation functions take the flavour as a type parameter
/// (`go_as::<T>`, `create_lens_as::<T>`). The child cache is keyed by key
/// only, so asking for a different flavour of an existing child wraps the
/// same node.
pub trait LensNode: Clone + 'static {
    /// Wraps a lens.
    fn from_lens(lens: Lens) -> Self;

    /// Returns the wrapped lens.
    fn as_lens(&self) -> &Lens;
}

impl LensNode for Lens {
    fn from_lens(lens: Lens) -> Self {
        lens
    }

    fn as_lens(&self) -> &Lens {
        self
    }
}

/// A readable, writable and observable view onto one location of a value.
///
/// Each handle holds a reference on its node record, so an evicted node
/// stays usable for as long as a handle to it is alive.
pub struct Lens {
    tree: Rc<Tree>,
    id: NodeId,
}

/// Creates a root lens over an in-memory value with the default config.
pub fn create_lens(value: impl Into<Value>) -> Lens {
    create_lens_with(value, LensConfig::default())
}

/// Creates a root lens of flavour `T`.
pub fn create_lens_as<T: LensNode>(value: impl Into<Value>) -> T {
    create_lens_as_with(value, LensConfig::default())
}

/// Creates a root lens of flavour `T` with `config`.
pub fn create_lens_as_with<T: LensNode>(value: impl Into<Value>, config: LensConfig) -> T {
    let lens = create_lens_with(value, config);
    lens.mark_flavor::<T>();
    T::from_lens(lens)
}

/// Creates a root lens over an in-memory value.
pub fn create_lens_with(value: impl Into<Value>, config: LensConfig) -> Lens {
    create_lens_routed(Rc::new(MemoryRouter::new(value)), config)
}

/// Creates a root lens over an externally stored value.
pub fn create_lens_routed(router: Rc<dyn Router>, config: LensConfig) -> Lens {
    Lens::from_parts(Tree::new(router, config), ROOT_ID)
}

impl Lens {
    pub(crate) fn from_parts(tree: Rc<Tree>, id: NodeId) -> Self {
        tree.retain(id);
        Self { tree, id }
    }

    #[inline]
    pub(crate) fn tree(&self) -> &Rc<Tree> {
        &self.tree
    }

    #[inline]
    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    pub(crate) fn mark_flavor<T: 'static>(&self) {
        if TypeId::of::<T>() == TypeId::of::<Lens>() {
            return;
        }
        self.tree.with_mut(self.id, |r| {
            r.flavor.get_or_insert(core::any::type_name::<T>());
        });
    }

    // ---- Read / write ----

    /// Returns the current value at this node.
    pub fn get(&self) -> Value {
        self.tree.value_of(self.id)
    }

    /// Replaces the value at this node.
    ///
    /// Subscribers are notified on the next flush of the tree's scheduler.
    pub fn set(&self, value: impl Into<Value>) {
        self.tree.store(self.id, value.into());
        let (sender, path) = self.tree.locate(self.id);
        Coordinator::notify(&self.tree, sender, path);
    }

    /// Replaces the value at this node with `f(current)`.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        let next = f(&self.get());
        self.set(next);
    }

    // ---- Navigation ----

    /// Returns the child node at `key`, creating it on first use.
    pub fn go(&self, key: impl Into<Key>) -> Lens {
        let (id, _) = self.tree.child(self.id, &key.into());
        Lens::from_parts(Rc::clone(&self.tree), id)
    }

    /// Returns the child node at `key` wrapped in flavour `T`.
    ///
    /// A child that already exists is reused whatever flavour it was created
    /// with.
    pub fn go_as<T: LensNode>(&self, key: impl Into<Key>) -> T {
        let (id, created) = self.tree.child(self.id, &key.into());
        let lens = Lens::from_parts(Rc::clone(&self.tree), id);
        if created {
            lens.mark_flavor::<T>();
        }
        T::from_lens(lens)
    }

    /// Walks `path` from this node.
    pub fn go_path(&self, path: &Path) -> Lens {
        path.iter().fold(self.clone(), |lens, key| lens.go(key))
    }

    /// Wraps this node in flavour `T`.
    pub fn cast<T: LensNode>(&self) -> T {
        T::from_lens(self.clone())
    }

    /// Returns the flavour this node was created with, if not a plain lens.
    pub fn flavor(&self) -> Option<&'static str> {
        self.tree.with(self.id, |r| r.flavor)
    }

    // ---- Subscriptions ----

    /// Subscribes `callback` to this node's cascades.
    ///
    /// Subscribing a callback that is already attached changes nothing, and
    /// so does subscribing to an evicted node.
    pub fn subscribe(&self, callback: Callback) -> Subscription {
        self.tree.with_mut(self.id, |r| {
            if r.attached {
                r.subscribers.subscribe(callback.clone());
            }
        });
        Subscription::new(&self.tree, self.id, callback)
    }

    /// Subscribes a closure.
    pub fn on<F>(&self, f: F) -> Subscription
    where
        F: Fn(&AttachEvent, &Lens) + 'static,
    {
        self.subscribe(callback(f))
    }

    /// Removes `callback`. Returns true if it was subscribed.
    pub fn unsubscribe(&self, callback: &Callback) -> bool {
        self.tree
            .with_mut(self.id, |r| r.subscribers.unsubscribe(callback))
    }

    pub fn has_subscribed(&self, callback: &Callback) -> bool {
        self.tree.with(self.id, |r| r.subscribers.contains(callback))
    }

    /// Returns the subscribed callbacks in subscription order.
    pub fn subscribers(&self) -> Vec<Callback> {
        self.tree.with(self.id, |r| r.subscribers.snapshot())
    }

    // ---- Inspection ----

    /// Returns the cached children, sorted by key.
    ///
    /// Each call takes a fresh snapshot of the cache.
    pub fn children(&self) -> impl Iterator<Item = (Key, Lens)> {
        let tree = Rc::clone(&self.tree);
        self.tree
            .children(self.id)
            .into_iter()
            .map(move |(key, id)| (key, Lens::from_parts(Rc::clone(&tree), id)))
    }

    /// Returns one child node per key of the current value.
    pub fn items(&self) -> Vec<Lens> {
        self.get().keys().into_iter().map(|k| self.go(k)).collect()
    }

    /// Returns the key this node was reached by, if it is a child.
    pub fn key(&self) -> Option<Key> {
        match self.tree.source(self.id) {
            Source::Child { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Returns the parent node, if this is a child.
    pub fn parent(&self) -> Option<Lens> {
        match self.tree.source(self.id) {
            Source::Child { parent, .. } => Some(Lens::from_parts(Rc::clone(&self.tree), parent)),
            _ => None,
        }
    }

    /// Returns the root node of this tree.
    pub fn root(&self) -> Lens {
        Lens::from_parts(Rc::clone(&self.tree), ROOT_ID)
    }

    /// Returns the path of the location this node writes to, from the root.
    pub fn path(&self) -> Path {
        self.tree.locate(self.id).1
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }

    /// Returns false once the node has been evicted by a cascade.
    pub fn is_attached(&self) -> bool {
        self.tree.is_attached(self.id)
    }

    /// Runs the pending batch now instead of waiting for the scheduler.
    ///
    /// Returns true if there was a batch.
    pub fn flush(&self) -> bool {
        let co = &self.tree.coordinator;
        if co.pending() == 0 {
            return false;
        }
        co.debounce().cancel();
        Coordinator::flush(&self.tree);
        true
    }

    /// Returns the scheduler the tree flushes on.
    pub fn scheduler(&self) -> Rc<dyn Scheduler> {
        Rc::clone(self.tree.coordinator.debounce().scheduler())
    }

    /// Returns per-node state of type `S`, creating it on first use.
    ///
    /// Node flavours keep their own state here, keyed by type.
    pub fn extension<S: Any + Default>(&self) -> Rc<S> {
        let key = TypeId::of::<S>();
        let existing = self.tree.with(self.id, |r| r.extensions.get(&key).cloned());
        if let Some(Ok(state)) = existing.map(|e| e.downcast::<S>()) {
            return state;
        }
        let state = Rc::new(S::default());
        self.tree.with_mut(self.id, |r| {
            r.extensions.insert(key, state.clone() as Rc<dyn Any>)
        });
        state
    }
}

impl Clone for Lens {
    fn clone(&self) -> Self {
        Lens::from_parts(Rc::clone(&self.tree), self.id)
    }
}

impl Drop for Lens {
    fn drop(&mut self) {
        self.tree.release(self.id);
    }
}

impl PartialEq for Lens {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree) && self.id == other.id
    }
}

impl Eq for Lens {}

impl fmt::Debug for Lens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lens")
            .field("node", &self.id)
            .field("path", &self.path())
            .field("attached", &self.is_attached())
            .finish()
    }
}
