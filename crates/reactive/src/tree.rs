//! Node arena of one lens tree.
//!
//! Every node of a tree lives in a single arena addressed by `NodeId`.
//! Parents refer to children by id through their child cache and children
//! refer back through their `Source`, so there are no reference cycles
//! between nodes.
//!
//! Records are reference counted: each `Lens` handle, `Subscription`,
//! queued transaction and dependent record (a child or projection whose
//! source names it) holds one reference. Evicting a child removes it and its
//! cached subtree from the caches, marks them detached and drops their
//! subscribers. A detached record stays readable and writable while
//! something references it and its slot is reused once nothing does.

use crate::chain::Mapping;
use crate::config::LensConfig;
use crate::router::{Adapter, Router};
use crate::scheduler::Debounce;
use crate::subscription::Subscribers;
use crate::transaction::Coordinator;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::cell::RefCell;
use core::mem;
use hashbrown::HashMap;
use lenskit_core::{Key, Path, Value};
use tracing::trace;

/// Index of a node record in its tree.
pub(crate) type NodeId = usize;

/// Id of the root node of every tree.
pub(crate) const ROOT_ID: NodeId = 0;

/// Where a node reads its value from.
#[derive(Clone)]
pub(crate) enum Source {
    /// The root slot
    Root,
    /// Entry `key` of the parent's value
    Child { parent: NodeId, key: Key },
    /// Projection of another node through a mapping
    Chain {
        base: NodeId,
        mapping: Rc<dyn Mapping>,
    },
}

impl Source {
    /// The record this source reads through.
    fn owner(&self) -> Option<NodeId> {
        match self {
            Source::Root => None,
            Source::Child { parent, .. } => Some(*parent),
            Source::Chain { base, .. } => Some(*base),
        }
    }
}

pub(crate) struct NodeRecord {
    pub source: Source,
    pub attached: bool,
    refs: usize,
    pub children: HashMap<Key, NodeId>,
    pub subscribers: Subscribers,
    pub chain: Option<NodeId>,
    pub flavor: Option<&'static str>,
    pub extensions: HashMap<TypeId, Rc<dyn Any>>,
}

impl NodeRecord {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            attached: true,
            refs: 0,
            children: HashMap::new(),
            subscribers: Subscribers::default(),
            chain: None,
            flavor: None,
            extensions: HashMap::new(),
        }
    }

    /// A free slot. Only the root record has a `Root` source, so a detached
    /// record with one is vacant.
    fn vacant() -> Self {
        let mut record = Self::new(Source::Root);
        record.attached = false;
        record
    }

    #[inline]
    fn is_collectable(&self) -> bool {
        !self.attached && self.refs == 0 && !matches!(self.source, Source::Root)
    }
}

/// Shared state of one lens tree: the arena, the root slot and the
/// transaction coordinator.
pub(crate) struct Tree {
    nodes: RefCell<Vec<NodeRecord>>,
    vacant: RefCell<Vec<NodeId>>,
    router: Rc<dyn Router>,
    adapter: Adapter,
    pub coordinator: Coordinator,
}

impl Tree {
    pub fn new(router: Rc<dyn Router>, config: LensConfig) -> Rc<Self> {
        let debounce = Debounce::new(config.scheduler(), config.delay());
        let mut nodes = Vec::with_capacity(8);
        nodes.push(NodeRecord::new(Source::Root));
        Rc::new(Self {
            nodes: RefCell::new(nodes),
            vacant: RefCell::new(Vec::new()),
            router,
            adapter: config.adapter().clone(),
            coordinator: Coordinator::new(debounce),
        })
    }

    /// Runs `f` with a shared borrow of a record.
    ///
    /// `f` must not call back into the tree.
    #[inline]
    pub fn with<R>(&self, id: NodeId, f: impl FnOnce(&NodeRecord) -> R) -> R {
        f(&self.nodes.borrow()[id])
    }

    /// Runs `f` with an exclusive borrow of a record.
    #[inline]
    pub fn with_mut<R>(&self, id: NodeId, f: impl FnOnce(&mut NodeRecord) -> R) -> R {
        f(&mut self.nodes.borrow_mut()[id])
    }

    /// Stores a record in a free slot, returning its id. The record holds a
    /// reference on the node its source reads through.
    pub fn insert(&self, record: NodeRecord) -> NodeId {
        if let Some(owner) = record.source.owner() {
            self.retain(owner);
        }
        let mut nodes = self.nodes.borrow_mut();
        match self.vacant.borrow_mut().pop() {
            Some(id) => {
                nodes[id] = record;
                id
            }
            None => {
                nodes.push(record);
                nodes.len() - 1
            }
        }
    }

    /// Returns the number of live records.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len() - self.vacant.borrow().len()
    }

    /// Adds a reference to a record.
    #[inline]
    pub fn retain(&self, id: NodeId) {
        self.with_mut(id, |r| r.refs += 1);
    }

    /// Drops a reference to a record, freeing it if it is detached and no
    /// longer referenced.
    pub fn release(&self, id: NodeId) {
        // A handle dropped while the arena is borrowed (unwinding out of a
        // borrow) keeps its record.
        let collectable = match self.nodes.try_borrow_mut() {
            Ok(mut nodes) => {
                let record = &mut nodes[id];
                record.refs = record.refs.saturating_sub(1);
                record.is_collectable()
            }
            Err(_) => return,
        };
        if collectable {
            self.free(id);
        }
    }

    /// Frees `id` and every owner that becomes unreferenced with it.
    ///
    /// The records are dropped after the arena borrow ends: their callbacks
    /// may hold handles that release into this tree.
    fn free(&self, id: NodeId) {
        let mut freed = Vec::new();
        let mut pending = alloc::vec![id];
        while let Some(id) = pending.pop() {
            let record = {
                let mut nodes = self.nodes.borrow_mut();
                if !nodes[id].is_collectable() {
                    continue;
                }
                self.vacant.borrow_mut().push(id);
                mem::replace(&mut nodes[id], NodeRecord::vacant())
            };
            if let Some(owner) = record.source.owner() {
                let collectable = self.with_mut(owner, |r| {
                    r.refs = r.refs.saturating_sub(1);
                    r.is_collectable()
                });
                if collectable {
                    pending.push(owner);
                }
            }
            freed.push(record);
        }
        trace!(freed = freed.len(), "node records freed");
        drop(freed);
    }

    pub fn source(&self, id: NodeId) -> Source {
        self.with(id, |r| r.source.clone())
    }

    /// Reads the root value through the router and adapter.
    pub fn read_root(&self) -> Value {
        self.adapter.read(&*self.router)
    }

    /// Writes the root value, capturing the batch baseline first.
    pub fn store_root(&self, value: Value) {
        self.coordinator.capture(|| self.read_root());
        self.adapter.write(&*self.router, value);
    }

    /// Computes the current value of a node.
    pub fn value_of(&self, id: NodeId) -> Value {
        match self.source(id) {
            Source::Root => self.read_root(),
            Source::Child { parent, key } => self.value_of(parent).get_key(&key),
            Source::Chain { base, mapping } => mapping.forward(&self.value_of(base)),
        }
    }

    /// Writes the value of a node, merging it into fresh copies of its
    /// ancestors up to the root slot.
    pub fn store(&self, id: NodeId, value: Value) {
        match self.source(id) {
            Source::Root => self.store_root(value),
            Source::Child { parent, key } => {
                let next = self.value_of(parent).with_key(&key, value);
                self.store(parent, next);
            }
            Source::Chain { base, mapping } => {
                let current = self.value_of(base);
                self.store(base, mapping.inverse(value, &current));
            }
        }
    }

    /// Resolves the node that reports a write from `id`, and its path from
    /// the root.
    ///
    /// Projections do not register writes of their own: a write through a
    /// chain node (or any node below one) is reported by the chain's base.
    pub fn locate(&self, id: NodeId) -> (NodeId, Path) {
        let mut sender = id;
        let mut keys = Vec::new();
        let mut current = id;
        loop {
            match self.source(current) {
                Source::Root => break,
                Source::Child { parent, key } => {
                    keys.push(key);
                    current = parent;
                }
                Source::Chain { base, .. } => {
                    keys.clear();
                    sender = base;
                    current = base;
                }
            }
        }
        keys.reverse();
        (sender, Path::from(keys))
    }

    /// Returns true if `id` is still reachable from the root through the
    /// caches. Eviction detaches whole subtrees, so the record's own flag
    /// answers for its ancestors too.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.with(id, |r| r.attached)
    }

    /// Returns the cached child of `parent` at `key`, creating it if needed.
    ///
    /// The second element is true if the child was created by this call.
    /// Detached parents do not cache: each call yields a fresh detached child.
    pub fn child(&self, parent: NodeId, key: &Key) -> (NodeId, bool) {
        let (cached, attached) = self.with(parent, |r| (r.children.get(key).copied(), r.attached));
        if let Some(id) = cached {
            return (id, false);
        }
        let mut record = NodeRecord::new(Source::Child {
            parent,
            key: key.clone(),
        });
        record.attached = attached;
        let id = self.insert(record);
        if attached {
            self.with_mut(parent, |r| r.children.insert(key.clone(), id));
        }
        (id, true)
    }

    /// Returns true if `child` is still the cached child of `parent` at `key`.
    pub fn is_child(&self, parent: NodeId, key: &Key, child: NodeId) -> bool {
        self.with(parent, |r| r.children.get(key) == Some(&child))
    }

    /// Returns the cached children of `parent`, sorted by key.
    pub fn children(&self, parent: NodeId) -> Vec<(Key, NodeId)> {
        let mut children: Vec<(Key, NodeId)> = self.with(parent, |r| {
            r.children.iter().map(|(k, id)| (k.clone(), *id)).collect()
        });
        children.sort_by(|a, b| a.0.cmp(&b.0));
        children
    }

    /// Removes the children of `parent` matching `evict` from its cache and
    /// detaches them. Returns how many were evicted.
    pub fn evict(&self, parent: NodeId, evict: impl Fn(&Key) -> bool) -> usize {
        let removed: Vec<NodeId> = self.with_mut(parent, |r| {
            let keys: Vec<Key> = r.children.keys().filter(|k| evict(k)).cloned().collect();
            keys.iter().filter_map(|k| r.children.remove(k)).collect()
        });
        let count = removed.len();
        self.detach(removed);
        count
    }

    /// Detaches `roots` and their cached subtrees and projections, dropping
    /// their subscribers. Records nothing references any more are freed.
    pub fn detach(&self, roots: Vec<NodeId>) {
        let mut detached = Vec::new();
        let mut subscribers = Vec::new();
        let mut pending = roots;
        while let Some(id) = pending.pop() {
            let (children, chain, subs) = self.with_mut(id, |r| {
                r.attached = false;
                (
                    mem::take(&mut r.children),
                    r.chain.take(),
                    mem::take(&mut r.subscribers),
                )
            });
            pending.extend(children.into_values());
            pending.extend(chain);
            subscribers.push(subs);
            detached.push(id);
        }

        // children first: they hold references on their parents
        for id in detached.into_iter().rev() {
            if self.with(id, NodeRecord::is_collectable) {
                self.free(id);
            }
        }
        drop(subscribers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::MemoryRouter;

    fn tree(value: Value) -> Rc<Tree> {
        Tree::new(Rc::new(MemoryRouter::new(value)), LensConfig::new())
    }

    #[test]
    fn test_child_is_cached_per_key() {
        let tree = tree(Value::object([("a", 1)]));
        let (a, created) = tree.child(ROOT_ID, &Key::from("a"));
        assert!(created);
        assert_eq!(tree.child(ROOT_ID, &Key::from("a")), (a, false));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_index_and_numeric_field_share_child() {
        let tree = tree(Value::array([1, 2]));
        let (a, _) = tree.child(ROOT_ID, &Key::from(1usize));
        let (b, created) = tree.child(ROOT_ID, &Key::from("1"));
        assert_eq!(a, b);
        assert!(!created);
    }

    #[test]
    fn test_store_merges_upwards() {
        let tree = tree(Value::object([("list", Value::array([1, 2, 3]))]));
        let (list, _) = tree.child(ROOT_ID, &Key::from("list"));
        let (item, _) = tree.child(list, &Key::from(1usize));

        let before = tree.read_root();
        tree.store(item, Value::from(20));

        assert_eq!(
            tree.read_root(),
            Value::object([("list", Value::array([1, 20, 3]))])
        );
        // the previous snapshot is untouched
        assert_eq!(before.at(&[Key::from("list"), Key::from(1usize)]), Value::from(2));
        assert_eq!(tree.value_of(item), Value::from(20));
    }

    #[test]
    fn test_locate() {
        let tree = tree(Value::Null);
        let (a, _) = tree.child(ROOT_ID, &Key::from("a"));
        let (b, _) = tree.child(a, &Key::from(0usize));

        assert_eq!(tree.locate(ROOT_ID), (ROOT_ID, Path::root()));
        let (sender, path) = tree.locate(b);
        assert_eq!(sender, b);
        assert_eq!(path, Path::from(alloc::vec![Key::from("a"), Key::from(0usize)]));
    }

    #[test]
    fn test_evict_detaches_subtree() {
        let tree = tree(Value::object([("a", Value::object([("x", 1)]))]));
        let (a, _) = tree.child(ROOT_ID, &Key::from("a"));
        let (x, _) = tree.child(a, &Key::from("x"));
        tree.retain(x);

        assert!(tree.is_attached(x));
        assert_eq!(tree.evict(ROOT_ID, |_| true), 1);
        assert!(!tree.is_attached(a));
        assert!(!tree.is_attached(x));
        assert!(!tree.is_child(ROOT_ID, &Key::from("a"), a));
        // a referenced record stays, and keeps its parent
        assert_eq!(tree.value_of(x), Value::from(1));
        assert_eq!(tree.len(), 3);

        tree.release(x);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_evict_frees_unreferenced_records() {
        let tree = tree(Value::object([("a", Value::object([("x", 1)]))]));
        let (a, _) = tree.child(ROOT_ID, &Key::from("a"));
        tree.child(a, &Key::from("x"));
        assert_eq!(tree.len(), 3);

        tree.evict(ROOT_ID, |_| true);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let tree = tree(Value::Null);
        for _ in 0..100 {
            let (a, _) = tree.child(ROOT_ID, &Key::from("a"));
            tree.child(a, &Key::from("b"));
            tree.evict(ROOT_ID, |_| true);
        }
        assert_eq!(tree.len(), 1);
        assert!(tree.nodes.borrow().len() <= 3);
    }

    #[test]
    fn test_detached_parent_does_not_cache() {
        let tree = tree(Value::object([("a", Value::object([("x", 1)]))]));
        let (a, _) = tree.child(ROOT_ID, &Key::from("a"));
        tree.retain(a);
        tree.evict(ROOT_ID, |_| true);

        let (x, created) = tree.child(a, &Key::from("x"));
        assert!(created);
        assert!(!tree.is_attached(x));
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.value_of(x), Value::from(1));
    }
}
