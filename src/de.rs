//! Deserializing records into Rust types.
//!
//! [`from_record`] feeds a decoded [`Record`] through serde, so a log line can
//! land directly in a `#[derive(Deserialize)]` struct. Field names are used as
//! they appear in the header; use `#[serde(rename = "id.orig_h")]` for dotted
//! names.
//!
//! Values map onto serde's data model as follows:
//!
//! | Value | Visited as |
//! |-------|------------|
//! | `Null` | none / unit |
//! | `Bool` | bool |
//! | `Count`, `Port`, `Int` | integer |
//! | `Double` | f64 |
//! | `Interval` | f64 seconds |
//! | `String`, `Enum`, `Raw` | string (or a unit enum variant) |
//! | `Addr`, `Subnet`, `Time` | string in its textual form |
//! | `Set`, `Vector` | sequence |
//!
//! ## Examples
//!
//! ```rust
//! use brolog::{from_record, from_str};
//! use serde::Deserialize;
//! use std::net::IpAddr;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! #[serde(rename_all = "lowercase")]
//! enum Proto { Tcp, Udp }
//!
//! #[derive(Deserialize, Debug)]
//! struct Conn {
//!     #[serde(rename = "id.orig_h")]
//!     orig_h: IpAddr,
//!     #[serde(rename = "id.orig_p")]
//!     orig_p: Option<u16>,
//!     proto: Proto,
//! }
//!
//! let log = "#fields id.orig_h id.orig_p proto\n\
//!            #types addr port enum\n\
//!            10.0.0.1 53 udp\n";
//! let record = from_str(log).unwrap().next().unwrap().unwrap();
//! let conn: Conn = from_record(record).unwrap();
//! assert_eq!(conn.orig_p, Some(53));
//! assert_eq!(conn.proto, Proto::Udp);
//! ```

use crate::value::{duration_secs, TIME_FORMAT};
use crate::{Error, Record, Result, Value};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{de, forward_to_deserialize_any};

/// Deserializes a record into any `T: DeserializeOwned`.
///
/// # Errors
///
/// Returns an error if the record does not have the shape `T` expects.
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T> {
    T::deserialize(RecordDeserializer { record })
}

/// Deserializes a single value into any `T: DeserializeOwned`.
///
/// # Errors
///
/// Returns an error if the value does not have the shape `T` expects.
///
/// # Examples
///
/// ```rust
/// use brolog::{from_value, Value};
///
/// let ports: Vec<u16> = from_value(Value::Vector(vec![Value::Port(80), Value::Port(443)])).unwrap();
/// assert_eq!(ports, vec![80, 443]);
/// ```
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(ValueDeserializer::new(value))
}

struct RecordDeserializer {
    record: Record,
}

impl<'de> de::Deserializer<'de> for RecordDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(MapDeserializer::new(self.record))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

struct SeqDeserializer<I> {
    iter: I,
}

impl<I> SeqDeserializer<I>
where
    I: Iterator<Item = Value>,
{
    fn new(iter: I) -> Self {
        SeqDeserializer { iter }
    }
}

impl<'de, I> de::SeqAccess<'de> for SeqDeserializer<I>
where
    I: Iterator<Item = Value>,
{
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: std::vec::IntoIter<(String, Value)>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(record: Record) -> Self {
        MapDeserializer {
            iter: record.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(Value::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Count(n) => visitor.visit_u64(n),
            Value::Port(p) => visitor.visit_u16(p),
            Value::Int(i) => visitor.visit_i64(i),
            Value::Double(f) => visitor.visit_f64(f),
            Value::Interval(d) => visitor.visit_f64(duration_secs(&d)),
            Value::String(s) | Value::Enum(s) | Value::Raw(s) => visitor.visit_string(s),
            Value::Addr(addr) => visitor.visit_string(addr.to_string()),
            Value::Subnet { addr, prefix } => visitor.visit_string(format!("{}/{}", addr, prefix)),
            Value::Time(t) => visitor.visit_string(t.format(TIME_FORMAT).to_string()),
            Value::Set(set) => visitor.visit_seq(SeqDeserializer::new(set.into_iter())),
            Value::Vector(items) => visitor.visit_seq(SeqDeserializer::new(items.into_iter())),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::String(s) | Value::Enum(s) => visitor.visit_enum(s.into_deserializer()),
            other => Err(Error::custom(format!(
                "expected an enum or string value, got {}",
                other
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValueSet;
    use chrono::Duration;
    use serde::Deserialize;
    use std::collections::BTreeSet;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Dns {
        query: String,
        #[serde(rename = "AA")]
        aa: bool,
        ttls: Vec<f64>,
        answers: BTreeSet<String>,
        rcode: Option<u64>,
    }

    #[test]
    fn test_record_into_struct() {
        let answers: ValueSet = ["b.example", "a.example"]
            .into_iter()
            .map(Value::from)
            .collect();
        let record: Record = vec![
            ("query".to_string(), Value::from("example.com")),
            ("AA".to_string(), Value::Bool(false)),
            (
                "ttls".to_string(),
                Value::Vector(vec![Value::Interval(Duration::seconds(300))]),
            ),
            ("answers".to_string(), Value::Set(answers)),
            ("rcode".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();

        let dns: Dns = from_record(record).unwrap();
        assert_eq!(
            dns,
            Dns {
                query: "example.com".into(),
                aa: false,
                ttls: vec![300.0],
                answers: ["a.example", "b.example"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                rcode: None,
            }
        );
    }

    #[test]
    fn test_addr_and_subnet_as_strings() {
        let addr: std::net::IpAddr = from_value(Value::Addr("::1".parse().unwrap())).unwrap();
        assert_eq!(addr.to_string(), "::1");

        let subnet: String = from_value(Value::Subnet {
            addr: "192.168.0.0".parse().unwrap(),
            prefix: 16,
        })
        .unwrap();
        assert_eq!(subnet, "192.168.0.0/16");
    }

    #[test]
    fn test_time_round_trips_through_chrono() {
        let t = chrono::NaiveDate::from_ymd_opt(2020, 2, 29)
            .unwrap()
            .and_hms_micro_opt(23, 59, 58, 123_456)
            .unwrap();
        let back: chrono::NaiveDateTime = from_value(Value::Time(t)).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let record: Record = vec![("query".to_string(), Value::from("x"))]
            .into_iter()
            .collect();
        assert!(from_record::<Dns>(record).is_err());
    }
}
