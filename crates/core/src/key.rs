//! Navigation keys.
//!
//! A `Key` is one step from a container into one of its entries: either a
//! sequence index or a map field. A field spelled as a canonical
//! non-negative integer compares, hashes and orders like the index, so `"1"`
//! and `1` address the same entry and the same cached child node. The key
//! still remembers it was given as text: writing through it into a missing
//! value creates a map, not a sequence.

use alloc::borrow::Cow;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

/// A single navigation step into a container value.
#[derive(Clone, Debug)]
pub enum Key {
    /// Position in a sequence
    Index(usize),
    /// Field of a keyed map
    Field(Rc<str>),
}

impl Key {
    /// Creates a key from field text.
    pub fn field(name: &str) -> Self {
        Key::Field(Rc::from(name))
    }

    /// Returns the sequence position this key addresses: the index, or a
    /// field spelled as a canonical integer.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Field(name) => parse_index(name),
        }
    }

    /// Returns true if the key was given as a number.
    #[inline]
    pub fn is_index(&self) -> bool {
        matches!(self, Key::Index(_))
    }

    fn canonical(&self) -> Canonical<'_> {
        match self.as_index() {
            Some(i) => Canonical::Index(i),
            None => Canonical::Field(match self {
                Key::Field(name) => name,
                Key::Index(_) => "",
            }),
        }
    }

    /// Returns the key spelled as a map field.
    pub fn as_field(&self) -> Cow<'_, str> {
        match self {
            Key::Index(i) => Cow::Owned(i.to_string()),
            Key::Field(name) => Cow::Borrowed(name),
        }
    }
}

/// Comparison form: numeric fields fold into indices.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Canonical<'a> {
    Index(usize),
    Field(&'a str),
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

/// Parses `text` as a canonical non-negative integer (no sign, no leading zero).
fn parse_index(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    text.parse().ok()
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Field(name) => f.write_str(name),
        }
    }
}

impl From<usize> for Key {
    fn from(v: usize) -> Self {
        Key::Index(v)
    }
}

impl From<u32> for Key {
    fn from(v: u32) -> Self {
        Key::Index(v as usize)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        if v >= 0 {
            Key::Index(v as usize)
        } else {
            Key::Field(Rc::from(v.to_string().as_str()))
        }
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::field(v)
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::field(&v)
    }
}

impl From<&String> for Key {
    fn from(v: &String) -> Self {
        Key::field(v)
    }
}

impl From<&Key> for Key {
    fn from(v: &Key) -> Self {
        v.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_field_matches_index() {
        assert_eq!(Key::from("1"), Key::Index(1));
        assert_eq!(Key::from(1), Key::Index(1));
        assert_eq!(Key::from("0"), Key::Index(0));
        assert_eq!(Key::from("1").as_index(), Some(1));

        let mut map = hashbrown::HashMap::new();
        map.insert(Key::from(7), "seven");
        assert_eq!(map.get(&Key::from("7")), Some(&"seven"));
    }

    #[test]
    fn test_numeric_field_remembers_text() {
        assert!(!Key::from("42").is_index());
        assert!(Key::from(42).is_index());
        assert!(matches!(Key::from("42"), Key::Field(_)));
        assert_eq!(Key::from(usize::MAX.to_string()).as_index(), Some(usize::MAX));
        assert_eq!(Key::from("999999999999999999999999").as_index(), None);
    }

    #[test]
    fn test_key_keeps_non_canonical_fields() {
        assert!(matches!(Key::from("01"), Key::Field(_)));
        assert!(matches!(Key::from("-1"), Key::Field(_)));
        assert!(matches!(Key::from(""), Key::Field(_)));
        assert!(matches!(Key::from(-3), Key::Field(_)));
        assert_eq!(Key::from("01").as_index(), None);
        assert_ne!(Key::from("01"), Key::Index(1));
    }

    #[test]
    fn test_key_as_field() {
        assert_eq!(Key::Index(7).as_field(), "7");
        assert_eq!(Key::from("name").as_field(), "name");
    }

    #[test]
    fn test_key_ordering_indices_first() {
        let mut keys = alloc::vec![Key::from("b"), Key::from(2), Key::from("a"), Key::from(0)];
        keys.sort();
        assert_eq!(
            keys,
            alloc::vec![Key::from(0), Key::from(2), Key::from("a"), Key::from("b")]
        );
    }
}
