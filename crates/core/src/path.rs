//! Paths into a value tree.
//!
//! Supports a small dotted syntax:
//! - `` (empty) or `$` - the root
//! - `a.b` - map fields
//! - `list.1` or `list[1]` - sequence indices
//! - `['odd.name']` or `["odd.name"]` - quoted fields

use crate::error::{Error, Result};
use crate::key::Key;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::ops::Deref;
use core::str::FromStr;

/// An ordered sequence of keys from some node down to a descendant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Key>);

impl Path {
    /// Creates the empty (root) path.
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Creates an empty path with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Parses a textual path.
    pub fn parse(input: &str) -> Result<Self> {
        Parser::new(input).parse()
    }

    /// Appends a key.
    #[inline]
    pub fn push(&mut self, key: impl Into<Key>) {
        self.0.push(key.into());
    }

    /// Returns a new path with `key` appended.
    pub fn join(&self, key: impl Into<Key>) -> Self {
        let mut keys = Vec::with_capacity(self.0.len() + 1);
        keys.extend_from_slice(&self.0);
        keys.push(key.into());
        Self(keys)
    }

    /// Returns a new path with `prefix` prepended.
    pub fn prefixed(&self, prefix: &[Key]) -> Self {
        let mut keys = Vec::with_capacity(prefix.len() + self.0.len());
        keys.extend_from_slice(prefix);
        keys.extend_from_slice(&self.0);
        Self(keys)
    }

    /// Returns the path without its first key.
    pub fn tail(&self) -> Self {
        Self(self.0.iter().skip(1).cloned().collect())
    }

    /// Returns true if this is the root path.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the keys as a slice.
    #[inline]
    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    /// Consumes the path, returning its keys.
    pub fn into_keys(self) -> Vec<Key> {
        self.0
    }
}

impl Deref for Path {
    type Target = [Key];

    fn deref(&self) -> &[Key] {
        &self.0
    }
}

impl From<Vec<Key>> for Path {
    fn from(keys: Vec<Key>) -> Self {
        Self(keys)
    }
}

impl From<&[Key]> for Path {
    fn from(keys: &[Key]) -> Self {
        Self(keys.to_vec())
    }
}

impl<K: Into<Key>> FromIterator<K> for Path {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for Path {
    type Item = Key;
    type IntoIter = alloc::vec::IntoIter<Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Key;
    type IntoIter = core::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            match key {
                Key::Index(index) => write!(f, "[{}]", index)?,
                Key::Field(name) if needs_quotes(name) => {
                    f.write_str("['")?;
                    for c in name.chars() {
                        if c == '\'' || c == '\\' {
                            f.write_str("\\")?;
                        }
                        write!(f, "{}", c)?;
                    }
                    f.write_str("']")?;
                }
                Key::Field(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
            }
        }
        Ok(())
    }
}

fn needs_quotes(name: &str) -> bool {
    name.is_empty() || name.contains(['.', '[', ']', '\'', '"'])
}

/// Parser state.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(c) => Err(Error::invalid_path(
                alloc::format!("Expected '{}', found '{}'", expected, c),
                self.pos,
            )),
            None => Err(Error::invalid_path(
                alloc::format!("Expected '{}', found end of input", expected),
                self.pos,
            )),
        }
    }

    fn parse(mut self) -> Result<Path> {
        let mut path = Path::root();

        if self.peek() == Some('$') {
            self.advance();
            if self.peek() == Some('.') {
                self.advance();
            }
        }

        if self.peek().is_none() {
            return Ok(path);
        }

        // A segment must follow the start of input or a separator.
        let mut expect_segment = true;

        while let Some(c) = self.peek() {
            match c {
                '[' => {
                    self.advance();
                    path.push(self.parse_bracket()?);
                    expect_segment = false;
                }
                '.' if !expect_segment => {
                    self.advance();
                    expect_segment = true;
                    if self.peek().is_none() {
                        return Err(Error::invalid_path("Trailing '.'", self.pos));
                    }
                }
                '.' => return Err(Error::invalid_path("Empty path segment", self.pos)),
                ']' => return Err(Error::invalid_path("Unexpected ']'", self.pos)),
                _ if expect_segment => {
                    let name = self.parse_identifier();
                    path.push(Key::field(name));
                    expect_segment = false;
                }
                _ => {
                    return Err(Error::invalid_path(
                        alloc::format!("Unexpected '{}'", c),
                        self.pos,
                    ))
                }
            }
        }

        Ok(path)
    }

    fn parse_identifier(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '.' || c == '[' || c == ']' {
                break;
            }
            self.advance();
        }
        &self.input[start..self.pos]
    }

    fn parse_bracket(&mut self) -> Result<Key> {
        match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.advance();
                let field = self.parse_string_literal(quote)?;
                self.expect(']')?;
                Ok(Key::field(&field))
            }
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
                let index = self.input[start..self.pos]
                    .parse::<usize>()
                    .map_err(|_| Error::invalid_path("Invalid index", start))?;
                self.expect(']')?;
                Ok(Key::Index(index))
            }
            Some(_) => Err(Error::invalid_path("Invalid bracket expression", self.pos)),
            None => Err(Error::invalid_path("Unterminated bracket", self.pos)),
        }
    }

    fn parse_string_literal(&mut self, quote: char) -> Result<String> {
        let start = self.pos;
        let mut result = String::new();
        while let Some(c) = self.peek() {
            if c == quote {
                self.advance();
                return Ok(result);
            }
            if c == '\\' {
                self.advance();
                match self.peek() {
                    Some(escaped) => result.push(escaped),
                    None => break,
                }
            } else {
                result.push(c);
            }
            self.advance();
        }
        Err(Error::invalid_path("Unterminated string", start))
    }
}
