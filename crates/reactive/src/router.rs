//! Root value storage.
//!
//! A lens tree keeps exactly one piece of mutable state: the root value.
//! Where that value lives is decided by a `Router`. The default is an
//! in-memory slot; storage crates route it to external backends. An
//! `Adapter` sits between the router and the tree and can reshape the value
//! on the way in and out.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;
use lenskit_core::Value;

/// Backing slot for a root value.
///
/// Each access calls the router exactly once.
pub trait Router {
    /// Reads the stored value.
    fn get(&self) -> Value;

    /// Replaces the stored value.
    fn set(&self, value: Value);
}

/// In-memory router.
#[derive(Debug, Default)]
pub struct MemoryRouter {
    slot: RefCell<Value>,
}

impl MemoryRouter {
    /// Creates a router holding `value`.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            slot: RefCell::new(value.into()),
        }
    }
}

impl Router for MemoryRouter {
    fn get(&self) -> Value {
        self.slot.borrow().clone()
    }

    fn set(&self, value: Value) {
        *self.slot.borrow_mut() = value;
    }
}

type OnGet = Rc<dyn Fn(&Value) -> Value>;
type OnSet = Rc<dyn Fn(Value, &Value) -> Value>;

/// Hooks applied at the root getter and setter.
///
/// `on_get` maps the stored value to the value the tree sees. `on_set`
/// receives the new value and the currently stored one and returns what to
/// store. Missing hooks pass values through unchanged.
#[derive(Clone, Default)]
pub struct Adapter {
    on_get: Option<OnGet>,
    on_set: Option<OnSet>,
}

impl Adapter {
    /// Creates the identity adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the read hook.
    pub fn on_get<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Value + 'static,
    {
        self.on_get = Some(Rc::new(f));
        self
    }

    /// Sets the write hook.
    pub fn on_set<F>(mut self, f: F) -> Self
    where
        F: Fn(Value, &Value) -> Value + 'static,
    {
        self.on_set = Some(Rc::new(f));
        self
    }

    /// Returns true if neither hook is set.
    pub fn is_identity(&self) -> bool {
        self.on_get.is_none() && self.on_set.is_none()
    }

    /// Reads through `router`, applying `on_get`.
    pub fn read(&self, router: &dyn Router) -> Value {
        let stored = router.get();
        match &self.on_get {
            Some(on_get) => on_get(&stored),
            None => stored,
        }
    }

    /// Writes through `router`, applying `on_set`.
    ///
    /// The stored value is only read when an `on_set` hook needs it.
    pub fn write(&self, router: &dyn Router, value: Value) {
        match &self.on_set {
            Some(on_set) => {
                let stored = router.get();
                router.set(on_set(value, &stored));
            }
            None => router.set(value),
        }
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("on_get", &self.on_get.is_some())
            .field("on_set", &self.on_set.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct CountingRouter {
        inner: MemoryRouter,
        gets: Cell<usize>,
        sets: Cell<usize>,
    }

    impl Router for CountingRouter {
        fn get(&self) -> Value {
            self.gets.set(self.gets.get() + 1);
            self.inner.get()
        }

        fn set(&self, value: Value) {
            self.sets.set(self.sets.get() + 1);
            self.inner.set(value);
        }
    }

    fn counting(value: impl Into<Value>) -> CountingRouter {
        CountingRouter {
            inner: MemoryRouter::new(value),
            gets: Cell::new(0),
            sets: Cell::new(0),
        }
    }

    #[test]
    fn test_memory_router() {
        let router = MemoryRouter::new(1);
        assert_eq!(router.get(), Value::from(1));
        router.set(Value::from("x"));
        assert_eq!(router.get(), Value::from("x"));
    }

    #[test]
    fn test_identity_adapter_touches_router_once() {
        let router = counting(1);
        let adapter = Adapter::new();
        assert!(adapter.is_identity());

        assert_eq!(adapter.read(&router), Value::from(1));
        adapter.write(&router, Value::from(2));

        assert_eq!(router.gets.get(), 1);
        assert_eq!(router.sets.get(), 1);
        assert_eq!(router.inner.get(), Value::from(2));
    }

    #[test]
    fn test_adapter_hooks() {
        let router = counting(Value::object([("count", 1)]));
        let adapter = Adapter::new()
            .on_get(|stored| stored.get_key(&"count".into()))
            .on_set(|value, stored| stored.with_key(&"count".into(), value));

        assert_eq!(adapter.read(&router), Value::from(1));
        adapter.write(&router, Value::from(5));

        assert_eq!(router.inner.get(), Value::object([("count", 5)]));
        assert_eq!(adapter.read(&router), Value::from(5));
    }
}
