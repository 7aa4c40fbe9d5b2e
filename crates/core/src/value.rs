//! Value type definitions for lenskit.
//!
//! This module defines the `Value` enum, the tree a lens looks into.
//! Containers are reference counted: writes rebuild only the spine from the
//! root to the written location and share every other subtree, so two
//! snapshots of the tree can be compared by identity before comparing by
//! content.

use crate::key::Key;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

/// A node of the value tree.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Absent value (covers both "null" and "missing")
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Number (stored as f64)
    Number(f64),
    /// String
    String(Rc<str>),
    /// Date-like scalar, Unix timestamp in milliseconds
    Date(i64),
    /// Ordered sequence
    Array(Rc<Vec<Value>>),
    /// Keyed map
    Object(Rc<Object>),
}

/// Container kind of a value, decided once per value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Ordered sequence addressed by index
    Sequence,
    /// Keyed map addressed by field
    Map,
    /// Anything without addressable children
    Scalar,
}

/// Coarse type tag used by the diff engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Absent,
    Bool,
    Number,
    String,
    Date,
    Sequence,
    Map,
}

/// A keyed map with keys kept sorted for binary search and deterministic
/// iteration.
#[derive(Clone, Debug, Default)]
pub struct Object {
    /// Entries stored sorted by key
    entries: Vec<(Rc<str>, Value)>,
}

impl Object {
    /// Creates a new empty Object.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates an Object with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the object is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> core::result::Result<usize, usize> {
        self.entries.binary_search_by(|(k, _)| (**k).cmp(key))
    }

    /// Gets a value by key using binary search. O(log n)
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.position(key).ok().map(|idx| &self.entries[idx].1)
    }

    /// Inserts a key-value pair, maintaining sorted order.
    pub fn insert(&mut self, key: impl Into<Rc<str>>, value: Value) {
        let key = key.into();
        match self.position(&key) {
            Ok(idx) => {
                self.entries[idx].1 = value;
            }
            Err(idx) => {
                self.entries.insert(idx, (key, value));
            }
        }
    }

    /// Removes a key and returns its value if present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.position(key).ok().map(|idx| self.entries.remove(idx).1)
    }

    /// Returns true if the object contains the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_ok()
    }

    /// Returns an iterator over the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| &**k)
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Returns an iterator over key-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (&**k, v))
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        self.entries
            .iter()
            .zip(other.entries.iter())
            .all(|((k1, v1), (k2, v2))| k1 == k2 && v1 == v2)
    }
}

impl<K: Into<Rc<str>>> FromIterator<(K, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut obj = Object::new();
        for (k, v) in iter {
            obj.insert(k, v);
        }
        obj
    }
}

impl Value {
    /// Builds a sequence value.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(Rc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Builds a map value.
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Rc<str>>,
        V: Into<Value>,
    {
        Value::Object(Rc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k, Into::<Value>::into(v)))
                .collect(),
        ))
    }

    /// Returns the container kind of this value.
    #[inline]
    pub fn kind(&self) -> Kind {
        match self {
            Value::Array(_) => Kind::Sequence,
            Value::Object(_) => Kind::Map,
            _ => Kind::Scalar,
        }
    }

    /// Returns the diff tag of this value.
    pub fn tag(&self) -> Tag {
        match self {
            Value::Null => Tag::Absent,
            Value::Bool(_) => Tag::Bool,
            Value::Number(_) => Tag::Number,
            Value::String(_) => Tag::String,
            Value::Date(_) => Tag::Date,
            Value::Array(_) => Tag::Sequence,
            Value::Object(_) => Tag::Map,
        }
    }

    /// Returns true if this is the absent value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value has addressable children.
    #[inline]
    pub fn is_container(&self) -> bool {
        self.kind() != Kind::Scalar
    }

    /// Returns true if this is a sequence.
    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Returns true if this is a map.
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Returns the boolean value if this is a Bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number value if this is a Number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number as i64 if this is a Number and it's an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => {
                let i = *n as i64;
                if (i as f64) == *n {
                    Some(i)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a String.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None,
        }
    }

    /// Returns the timestamp if this is a Date.
    pub fn as_date(&self) -> Option<i64> {
        match self {
            Value::Date(ms) => Some(*ms),
            _ => None,
        }
    }

    /// Returns the items if this is an Array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Returns a reference to the object if this is an Object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(&**obj),
            _ => None,
        }
    }

    /// Returns the number of direct children (0 for scalars).
    pub fn len(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Object(obj) => obj.len(),
            _ => 0,
        }
    }

    /// Returns true if this value has no direct children.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identity comparison: containers are the same when they share an
    /// allocation, scalars when they are equal.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Array(_), _) | (Value::Object(_), _) => false,
            (_, Value::Array(_)) | (_, Value::Object(_)) => false,
            _ => self == other,
        }
    }

    /// Returns the keys of this container in iteration order.
    pub fn keys(&self) -> Vec<Key> {
        match self {
            Value::Array(items) => (0..items.len()).map(Key::Index).collect(),
            Value::Object(obj) => obj.keys().map(Key::field).collect(),
            _ => Vec::new(),
        }
    }

    /// Returns a reference to the child at `key`, if present.
    pub fn child(&self, key: &Key) -> Option<&Value> {
        match (self, key) {
            (Value::Array(items), key) => key.as_index().and_then(|i| items.get(i)),
            (Value::Object(obj), key) => obj.get(&key.as_field()),
            _ => None,
        }
    }

    /// Returns the child at `key`, or `Null` when missing.
    pub fn get_key(&self, key: &Key) -> Value {
        self.child(key).cloned().unwrap_or_default()
    }

    /// Returns the descendant at `path`, or `Null` when any step is missing.
    pub fn at(&self, path: &[Key]) -> Value {
        let mut current = self;
        for key in path {
            match current.child(key) {
                Some(next) => current = next,
                None => return Value::Null,
            }
        }
        current.clone()
    }

    /// Returns a copy of this container with the child at `key` replaced.
    ///
    /// `self` is untouched. On a sequence, keys given as numbers may extend
    /// it, padding with `Null`; numeric text only replaces an entry or
    /// appends one. Any other key converts the sequence to a map keyed by
    /// position. On a missing or scalar value, a key given as a number starts
    /// a sequence and a text key starts a map.
    pub fn with_key(&self, key: &Key, value: Value) -> Value {
        match self {
            Value::Array(items) => {
                let slot = key
                    .as_index()
                    .filter(|i| key.is_index() || *i <= items.len())
                    .and_then(|i| Some((i, i.checked_add(1)?)));
                match slot {
                    Some((i, len)) => {
                        let mut items: Vec<Value> = (**items).clone();
                        if len > items.len() {
                            items.resize(len, Value::Null);
                        }
                        items[i] = value;
                        Value::Array(Rc::new(items))
                    }
                    None => {
                        let mut obj: Object = items
                            .iter()
                            .enumerate()
                            .map(|(i, v)| (Key::Index(i).as_field().into_owned(), v.clone()))
                            .collect();
                        obj.insert(key.as_field().into_owned(), value);
                        Value::Object(Rc::new(obj))
                    }
                }
            }
            Value::Object(obj) => {
                let mut obj: Object = (**obj).clone();
                obj.insert(key.as_field().into_owned(), value);
                Value::Object(Rc::new(obj))
            }
            _ => match key {
                Key::Index(i) if i.checked_add(1).is_some() => {
                    let mut items = Vec::with_capacity(*i + 1);
                    items.resize(*i, Value::Null);
                    items.push(value);
                    Value::Array(Rc::new(items))
                }
                _ => {
                    let mut obj = Object::with_capacity(1);
                    obj.insert(key.as_field().into_owned(), value);
                    Value::Object(Rc::new(obj))
                }
            },
        }
    }

    /// Returns a copy of this tree with the descendant at `path` replaced.
    pub fn with_path(&self, path: &[Key], value: Value) -> Value {
        match path.split_first() {
            None => value,
            Some((key, rest)) => {
                let child = self.get_key(key).with_path(rest, value);
                self.with_key(key, child)
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

// From implementations for convenient construction
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Number(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Rc::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Rc::from(v))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(Rc::new(v))
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(Rc::new(v))
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
