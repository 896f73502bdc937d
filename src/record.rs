//! One decoded data line.
//!
//! A [`Record`] is an ordered sequence of `(field name, value)` pairs in the
//! order the `#fields` header declares them. It is a list of pairs rather
//! than a map because nothing in the log format stops a header from naming the
//! same field twice; both cells are kept, and lookups by name return the
//! first one.
//!
//! ## Examples
//!
//! ```rust
//! use brolog::{Record, Value};
//!
//! let mut record = Record::new();
//! record.push("proto".to_string(), Value::Enum("tcp".into()));
//! record.push("id.orig_p".to_string(), Value::Port(80));
//!
//! assert_eq!(record.len(), 2);
//! assert_eq!(record.get("id.orig_p"), Some(&Value::Port(80)));
//!
//! let names: Vec<_> = record.keys().collect();
//! assert_eq!(names, vec!["proto", "id.orig_p"]);
//! ```

use crate::Value;
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::ops::Index;

/// An ordered list of field names and decoded values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record(Vec<(String, Value)>);

impl Record {
    /// Creates an empty `Record`.
    #[must_use]
    pub fn new() -> Self {
        Record(Vec::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Record(Vec::with_capacity(capacity))
    }

    /// Appends a field, keeping any earlier field of the same name.
    pub fn push(&mut self, name: String, value: Value) {
        self.0.push((name, value));
    }

    /// Returns the value of the first field called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Returns every value stored under `name`, in field order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brolog::{Record, Value};
    ///
    /// let record: Record = vec![
    ///     ("x".to_string(), Value::Count(1)),
    ///     ("x".to_string(), Value::Count(2)),
    /// ]
    /// .into_iter()
    /// .collect();
    /// assert_eq!(record.get_all("x").count(), 2);
    /// assert_eq!(record.get("x"), Some(&Value::Count(1)));
    /// ```
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the field names, in field order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    /// Returns an iterator over the values, in field order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    /// Returns an iterator over the `(name, value)` pairs, in field order.
    pub fn iter(&self) -> std::slice::Iter<'_, (String, Value)> {
        self.0.iter()
    }

    /// Collapses the record into a map. When a name repeats, the first value
    /// wins, matching [`Record::get`].
    #[must_use]
    pub fn into_map(self) -> IndexMap<String, Value> {
        let mut map = IndexMap::with_capacity(self.0.len());
        for (k, v) in self.0 {
            map.entry(k).or_insert(v);
        }
        map
    }
}

impl Index<&str> for Record {
    type Output = Value;

    /// # Panics
    ///
    /// Panics if the record has no field called `name`.
    fn index(&self, name: &str) -> &Value {
        match self.get(name) {
            Some(value) => value,
            None => panic!("no field named {:?} in record", name),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a (String, Value);
    type IntoIter = std::slice::Iter<'a, (String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Record(Vec::from_iter(iter))
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
