//! The `Store` node flavour.

use crate::array::ArrayStore;
use alloc::vec::Vec;
use core::cell::Cell;
use core::ops::Deref;
use lenskit_core::{Key, Value};
use lenskit_reactive::{
    create_lens_as, create_lens_as_with, transform, Callback, Lens, LensConfig, LensNode,
    Subscription,
};
use lenskit_trigger::{create_callback, triggers, Trigger};

/// Write counter kept per node.
#[derive(Default)]
struct Version(Cell<u64>);

/// A lens with a write counter and store-flavoured navigation.
///
/// Dereferences to `Lens` for everything it does not override.
#[derive(Clone, Debug, PartialEq)]
pub struct Store {
    lens: Lens,
}

impl LensNode for Store {
    fn from_lens(lens: Lens) -> Self {
        Self { lens }
    }

    fn as_lens(&self) -> &Lens {
        &self.lens
    }
}

impl Deref for Store {
    type Target = Lens;

    fn deref(&self) -> &Lens {
        &self.lens
    }
}

/// Creates a root store with the default config.
pub fn create_store(value: impl Into<Value>) -> Store {
    create_lens_as::<Store>(value)
}

/// Creates a root store.
pub fn create_store_with(value: impl Into<Value>, config: LensConfig) -> Store {
    create_lens_as_with::<Store>(value, config)
}

impl Store {
    /// Number of writes made through this node.
    pub fn version(&self) -> u64 {
        self.lens.extension::<Version>().0.get()
    }

    /// Replaces the value and bumps the version.
    pub fn set(&self, value: impl Into<Value>) {
        let version = self.lens.extension::<Version>();
        version.0.set(version.0.get() + 1);
        self.lens.set(value);
    }

    /// Replaces the value with `f(current)` and bumps the version.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        let next = f(&self.get());
        self.set(next);
    }

    /// Returns the child at `key` as a `Store`.
    pub fn go(&self, key: impl Into<Key>) -> Store {
        self.lens.go_as(key)
    }

    /// Returns the child at `key` as an `ArrayStore`.
    pub fn go_array(&self, key: impl Into<Key>) -> ArrayStore {
        self.lens.go_as(key)
    }

    /// Returns one child store per key of the current value.
    pub fn list(&self) -> Vec<Store> {
        self.lens.items().into_iter().map(Store::from_lens).collect()
    }

    /// Returns a projection of this store through `to` / `from`.
    ///
    /// Each call builds a new mapping, so it replaces any previous
    /// projection of this node.
    pub fn transform<G, S>(&self, to: G, from: S) -> Store
    where
        G: Fn(&Value) -> Value + 'static,
        S: Fn(Value, &Value) -> Value + 'static,
    {
        self.lens.chain_as(&transform(to, from))
    }

    /// Subscribes `callback`, filtered by the `object` trigger.
    pub fn on(&self, callback: Callback) -> Subscription {
        self.on_trigger(Some(triggers::object()), alloc::vec![callback])
    }

    /// Subscribes `callbacks` behind `trigger`; `None` lets every event
    /// through.
    pub fn on_trigger(&self, trigger: Option<Trigger>, callbacks: Vec<Callback>) -> Subscription {
        self.lens.subscribe(create_callback(trigger, callbacks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use lenskit_reactive::{callback, ManualScheduler};

    #[test]
    fn test_version_counts_writes() {
        let store = create_store(Value::object([("a", 1)]));
        assert_eq!(store.version(), 0);

        store.set(Value::object([("a", 2)]));
        store.update(|v| v.with_key(&Key::from("a"), Value::from(3)));
        assert_eq!(store.version(), 2);

        // child writes are counted on the child only
        store.go("a").set(4);
        assert_eq!(store.version(), 2);
        assert_eq!(store.go("a").version(), 1);
    }

    #[test]
    fn test_configured_root_records_flavor() {
        let store = create_store_with(1, LensConfig::new());
        assert_eq!(store.flavor(), create_store(1).flavor());
        assert!(store.flavor().is_some());
    }

    #[test]
    fn test_go_yields_stores() {
        let store = create_store(Value::object([("a", Value::object([("b", 1)]))]));
        let b = store.go("a").go("b");
        assert_eq!(b.get(), Value::from(1));
        assert_eq!(b.as_lens(), &store.as_lens().go("a").go("b"));
        assert!(store.flavor().is_some());
    }

    #[test]
    fn test_list() {
        let store = create_store(Value::array([10, 20]));
        let items = store.list();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].get(), Value::from(20));
    }

    #[test]
    fn test_transform() {
        let store = create_store(Value::from(2));
        let negated = store.transform(
            |v| Value::from(-v.as_f64().unwrap_or(0.0)),
            |v, _| Value::from(-v.as_f64().unwrap_or(0.0)),
        );
        assert_eq!(negated.get(), Value::from(-2.0));

        negated.set(5);
        assert_eq!(store.get(), Value::from(-5.0));
        assert_eq!(negated.version(), 1);
    }

    #[test]
    fn test_on_uses_object_trigger() {
        let scheduler = Rc::new(ManualScheduler::new());
        let store = create_store_with(
            Value::object([("a", Value::object([("b", 1)]))]),
            LensConfig::new().with_scheduler(scheduler.clone()),
        );
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        store.on(callback(move |_, _| c.set(c.get() + 1)));

        // two levels below the root: not an object-level change
        store.go("a").go("b").set(2);
        scheduler.tick();
        assert_eq!(count.get(), 0);

        // direct child replaced
        store.go("a").set(Value::object([("c", 3)]));
        scheduler.tick();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_on_trigger_without_filter() {
        let scheduler = Rc::new(ManualScheduler::new());
        let store = create_store_with(
            Value::object([("a", Value::object([("b", 1)]))]),
            LensConfig::new().with_scheduler(scheduler.clone()),
        );
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        store.on_trigger(None, alloc::vec![callback(move |_, _| c.set(c.get() + 1))]);

        store.go("a").go("b").set(2);
        scheduler.tick();
        assert_eq!(count.get(), 1);
    }
}
