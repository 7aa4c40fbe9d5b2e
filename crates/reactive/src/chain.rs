//! Projections of a node through a bidirectional mapping.
//!
//! A chained node reads `forward(base.get())` and writes by handing
//! `inverse(value, base.get())` to its base. It has no transaction of its
//! own: whatever cascade reaches the base is mirrored into the projection,
//! with the values mapped forward.

use crate::lens::{Lens, LensNode};
use crate::tree::{NodeRecord, Source};
use alloc::rc::Rc;
use lenskit_core::Value;

/// A forward/inverse value mapping.
pub trait Mapping {
    /// Maps a base value to the projected value.
    fn forward(&self, value: &Value) -> Value;

    /// Maps a projected value back, given the base's current value.
    fn inverse(&self, value: Value, current: &Value) -> Value;
}

/// `Mapping` built from two closures.
pub struct Transform<G, S> {
    to: G,
    from: S,
}

impl<G, S> Mapping for Transform<G, S>
where
    G: Fn(&Value) -> Value,
    S: Fn(Value, &Value) -> Value,
{
    fn forward(&self, value: &Value) -> Value {
        (self.to)(value)
    }

    fn inverse(&self, value: Value, current: &Value) -> Value {
        (self.from)(value, current)
    }
}

/// Builds a shareable mapping from a forward and an inverse closure.
///
/// Keep the returned `Rc` to get the cached projection back from
/// `Lens::chain`.
pub fn transform<G, S>(to: G, from: S) -> Rc<dyn Mapping>
where
    G: Fn(&Value) -> Value + 'static,
    S: Fn(Value, &Value) -> Value + 'static,
{
    Rc::new(Transform { to, from })
}

#[inline]
fn same_mapping(a: &Rc<dyn Mapping>, b: &Rc<dyn Mapping>) -> bool {
    core::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

impl Lens {
    /// Returns the projection of this node through `mapping`.
    ///
    /// The same mapping returns the cached projection. A different one
    /// replaces it; the old projection is detached and stops receiving
    /// cascades.
    pub fn chain(&self, mapping: &Rc<dyn Mapping>) -> Lens {
        let tree = self.tree();
        let id = self.id();

        let (existing, attached) = tree.with(id, |r| (r.chain, r.attached));
        if let Some(existing) = existing {
            if let Source::Chain { mapping: current, .. } = tree.source(existing) {
                if same_mapping(&current, mapping) {
                    return Lens::from_parts(Rc::clone(tree), existing);
                }
            }
            tree.with_mut(id, |r| r.chain = None);
            tree.detach(alloc::vec![existing]);
        }

        let mut record = NodeRecord::new(Source::Chain {
            base: id,
            mapping: Rc::clone(mapping),
        });
        // a detached base does not cache its projection
        record.attached = attached;
        let chained = tree.insert(record);
        if attached {
            tree.with_mut(id, |r| r.chain = Some(chained));
        }
        Lens::from_parts(Rc::clone(tree), chained)
    }

    /// Like `chain`, wrapping the projection in a node flavour.
    pub fn chain_as<T: LensNode>(&self, mapping: &Rc<dyn Mapping>) -> T {
        let lens = self.chain(mapping);
        lens.mark_flavor::<T>();
        T::from_lens(lens)
    }

    /// Returns the current projection, if any.
    pub fn chained(&self) -> Option<Lens> {
        self.tree()
            .with(self.id(), |r| r.chain)
            .map(|id| Lens::from_parts(Rc::clone(self.tree()), id))
    }

    /// Returns the node a projection reads from.
    pub fn base(&self) -> Option<Lens> {
        match self.tree().source(self.id()) {
            Source::Chain { base, .. } => Some(Lens::from_parts(Rc::clone(self.tree()), base)),
            _ => None,
        }
    }
}
