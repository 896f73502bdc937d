//! Decoded cell values.
//!
//! This module provides the [`Value`] enum, the typed result of casting one raw
//! cell against its column descriptor.
//!
//! ## Core Types
//!
//! - [`Value`]: null, one of the scalar log types, a decomposed aggregate
//!   (`Set` or `Vector`), or the raw text of an aggregate left undecomposed
//! - [`ValueSet`]: the collection backing `set[...]` columns
//!
//! ## Equality and Hashing
//!
//! `Value` is `Eq + Hash` so that `set[...]` cells can be collected into a
//! native set. Doubles compare by bit pattern for this purpose, so `0.0` and
//! `-0.0` are distinct and `NaN` equals itself. Two sets are equal when they
//! contain the same elements, in any order.
//!
//! ## Examples
//!
//! ```rust
//! use brolog::Value;
//! use std::net::IpAddr;
//!
//! let addr: IpAddr = "192.168.1.1".parse().unwrap();
//! let value = Value::Addr(addr);
//! assert_eq!(value.as_addr(), Some(addr));
//! assert!(!value.is_null());
//!
//! let port = Value::Port(80);
//! assert_eq!(port.as_u64(), Some(80));
//! assert_eq!(port.to_string(), "80");
//! ```

use chrono::{Duration, NaiveDateTime};
use indexmap::IndexSet;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;

/// The collection type for decoded `set[...]` cells.
///
/// Insertion order is kept for display and iteration, but plays no part in
/// equality.
pub type ValueSet = IndexSet<Value>;

/// Format used when a timestamp is rendered as text.
pub(crate) const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A decoded log cell.
///
/// # Examples
///
/// ```rust
/// use brolog::{Value, ValueSet};
///
/// let tags: ValueSet = ["a", "b"].into_iter().map(Value::from).collect();
/// let value = Value::Set(tags);
/// assert!(value.is_aggregate());
/// assert_eq!(value.as_set().map(|s| s.len()), Some(2));
/// ```
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// The cell held the unset marker.
    #[default]
    Null,
    Addr(IpAddr),
    Bool(bool),
    Count(u64),
    Double(f64),
    Enum(String),
    Int(i64),
    Interval(Duration),
    Port(u16),
    String(String),
    Subnet {
        addr: IpAddr,
        prefix: u8,
    },
    /// Naive timestamp in the local timezone of the reading process.
    Time(NaiveDateTime),
    Set(ValueSet),
    Vector(Vec<Value>),
    /// An aggregate cell returned verbatim because decomposition is off.
    Raw(String),
}

impl Value {
    /// Returns `true` if the value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for decomposed `Set` and `Vector` values.
    #[inline]
    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(self, Value::Set(_) | Value::Vector(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the text of `String`, `Enum` and `Raw` values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brolog::Value;
    ///
    /// assert_eq!(Value::Enum("tcp".into()).as_str(), Some("tcp"));
    /// assert_eq!(Value::Count(1).as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) | Value::Raw(s) => Some(s),
            _ => None,
        }
    }

    /// Returns any non-negative integer value (`count`, `port`, `int`).
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Count(n) => Some(*n),
            Value::Port(p) => Some(u64::from(*p)),
            Value::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Returns any integer value that fits an `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Count(n) => i64::try_from(*n).ok(),
            Value::Port(p) => Some(i64::from(*p)),
            _ => None,
        }
    }

    /// Returns doubles as is and intervals as fractional seconds.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            Value::Interval(d) => Some(duration_secs(d)),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_addr(&self) -> Option<IpAddr> {
        match self {
            Value::Addr(addr) => Some(*addr),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_interval(&self) -> Option<Duration> {
        match self {
            Value::Interval(d) => Some(*d),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_time(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_set(&self) -> Option<&ValueSet> {
        match self {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_vector(&self) -> Option<&[Value]> {
        match self {
            Value::Vector(items) => Some(items),
            _ => None,
        }
    }
}

pub(crate) fn duration_secs(d: &Duration) -> f64 {
    match d.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => d.num_milliseconds() as f64 / 1_000.0,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Addr(a), Value::Addr(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Count(a), Value::Count(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Interval(a), Value::Interval(b)) => a == b,
            (Value::Port(a), Value::Port(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (
                Value::Subnet {
                    addr: a,
                    prefix: pa,
                },
                Value::Subnet {
                    addr: b,
                    prefix: pb,
                },
            ) => a == b && pa == pb,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Raw(a), Value::Raw(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Addr(addr) => addr.hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Count(n) => n.hash(state),
            Value::Double(f) => f.to_bits().hash(state),
            Value::Enum(s) | Value::String(s) | Value::Raw(s) => s.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Interval(d) => d.hash(state),
            Value::Port(p) => p.hash(state),
            Value::Subnet { addr, prefix } => {
                addr.hash(state);
                prefix.hash(state);
            }
            Value::Time(t) => t.hash(state),
            Value::Set(set) => {
                // Order-independent, to agree with set equality.
                let combined = set.iter().fold(0u64, |acc, item| {
                    let mut hasher = DefaultHasher::new();
                    item.hash(&mut hasher);
                    acc.wrapping_add(hasher.finish())
                });
                set.len().hash(state);
                combined.hash(state);
            }
            Value::Vector(items) => items.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Addr(addr) => write!(f, "{}", addr),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Count(n) => write!(f, "{}", n),
            Value::Double(d) => write!(f, "{}", d),
            Value::Int(i) => write!(f, "{}", i),
            Value::Interval(d) => write!(f, "{}", duration_secs(d)),
            Value::Port(p) => write!(f, "{}", p),
            Value::Enum(s) | Value::String(s) | Value::Raw(s) => write!(f, "{}", s),
            Value::Subnet { addr, prefix } => write!(f, "{}/{}", addr, prefix),
            Value::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            Value::Set(set) => write_items(f, set.iter(), '{', '}'),
            Value::Vector(items) => write_items(f, items.iter(), '[', ']'),
        }
    }
}

fn write_items<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
    open: char,
    close: char,
) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Count(n) => serializer.serialize_u64(*n),
            Value::Port(p) => serializer.serialize_u16(*p),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Double(d) => serializer.serialize_f64(*d),
            Value::Interval(d) => serializer.serialize_f64(duration_secs(d)),
            Value::Enum(s) | Value::String(s) | Value::Raw(s) => serializer.serialize_str(s),
            Value::Addr(_) | Value::Subnet { .. } | Value::Time(_) => {
                serializer.collect_str(self)
            }
            Value::Set(set) => {
                let mut seq = serializer.serialize_seq(Some(set.len()))?;
                for item in set {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Vector(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

// TryFrom implementations for extracting values
impl TryFrom<Value> for u64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_u64()
            .ok_or_else(|| crate::Error::custom(format!("expected unsigned integer, got {}", value)))
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| crate::Error::custom(format!("expected integer, got {}", value)))
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| crate::Error::custom(format!("expected bool, got {}", value)))
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) | Value::Enum(s) | Value::Raw(s) => Ok(s),
            other => Err(crate::Error::custom(format!(
                "expected string, got {}",
                other
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<IpAddr> for Value {
    fn from(value: IpAddr) -> Self {
        Value::Addr(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Vector(value)
    }
}

impl From<ValueSet> for Value {
    fn from(value: ValueSet) -> Self {
        Value::Set(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let ab: ValueSet = ["a", "b"].into_iter().map(Value::from).collect();
        let ba: ValueSet = ["b", "a"].into_iter().map(Value::from).collect();
        let left = Value::Set(ab);
        let right = Value::Set(ba);
        assert_eq!(left, right);
        assert_eq!(hash_of(&left), hash_of(&right));
    }

    #[test]
    fn test_set_collapses_duplicates() {
        let set: ValueSet = [Value::Count(1), Value::Count(2), Value::Count(1)]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_variants_do_not_cross_compare() {
        assert_ne!(Value::Enum("x".into()), Value::String("x".into()));
        assert_ne!(Value::Count(80), Value::Port(80));
        assert_ne!(Value::Raw("-".into()), Value::Null);
    }

    #[test]
    fn test_doubles_compare_by_bits() {
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_ne!(Value::Double(0.0), Value::Double(-0.0));
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Value::Port(443).as_i64(), Some(443));
        assert_eq!(Value::Int(-3).as_u64(), None);
        assert_eq!(Value::Count(u64::MAX).as_i64(), None);
        assert_eq!(
            Value::Interval(Duration::milliseconds(2500)).as_f64(),
            Some(2.5)
        );
    }

    #[test]
    fn test_display() {
        let vector = Value::Vector(vec![Value::Count(1), Value::Null, Value::Count(3)]);
        assert_eq!(vector.to_string(), "[1, null, 3]");

        let subnet = Value::Subnet {
            addr: "10.0.0.0".parse().unwrap(),
            prefix: 8,
        };
        assert_eq!(subnet.to_string(), "10.0.0.0/8");
    }

    #[test]
    fn test_tryfrom() {
        assert_eq!(u64::try_from(Value::Count(5)).unwrap(), 5);
        assert_eq!(i64::try_from(Value::Int(-5)).unwrap(), -5);
        assert!(bool::try_from(Value::Bool(true)).unwrap());
        assert_eq!(
            String::try_from(Value::Enum("udp".into())).unwrap(),
            "udp".to_string()
        );
        assert!(String::try_from(Value::Null).is_err());
    }
}
