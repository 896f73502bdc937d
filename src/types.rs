//! Column type descriptors and scalar casters.
//!
//! The `#types` header declares one descriptor per column. A descriptor is
//! either a scalar type name (`count`, `addr`, ...) or an aggregate of the
//! form `kind[element]`, where `kind` is `set` or `vector` and `element` is a
//! scalar type name. Descriptors are parsed once, when the header is read, so
//! decoding a data line dispatches on an enum rather than on strings.
//!
//! ## Examples
//!
//! ```rust
//! use brolog::types::{AggregateKind, ScalarType, TypeDescriptor};
//!
//! assert_eq!(
//!     TypeDescriptor::parse("set[addr]"),
//!     TypeDescriptor::Aggregate {
//!         kind: AggregateKind::Set,
//!         element: ScalarType::Addr,
//!     }
//! );
//! assert_eq!(TypeDescriptor::parse("port"), TypeDescriptor::Scalar(ScalarType::Port));
//! ```

use crate::error::CastError;
use crate::Value;
use chrono::{DateTime, Duration, Local, NaiveDateTime, Offset};
use std::fmt;
use std::net::IpAddr;

/// The literals accepted as `T` in a `bool` column.
pub const TRUE_LITERALS: [&str; 5] = ["1", "y", "Y", "t", "T"];
/// The literals accepted as `F` in a `bool` column.
pub const FALSE_LITERALS: [&str; 5] = ["0", "n", "N", "f", "F"];

const COUNT_RANGE: RangeCheck = RangeCheck::new(Some(0), None);
const PORT_RANGE: RangeCheck = RangeCheck::new(Some(0), Some(1 << 16));
const INT_RANGE: RangeCheck = RangeCheck::new(None, None);

/// A scalar column type.
///
/// Unrecognized names are kept as [`ScalarType::Other`] and decode to the raw
/// string, exactly like `string`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Addr,
    Bool,
    Count,
    Double,
    Enum,
    Int,
    Interval,
    Port,
    String,
    Subnet,
    Time,
    Other(String),
}

impl ScalarType {
    /// Looks up a scalar type by its header name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "addr" => ScalarType::Addr,
            "bool" => ScalarType::Bool,
            "count" => ScalarType::Count,
            "double" => ScalarType::Double,
            "enum" => ScalarType::Enum,
            "int" => ScalarType::Int,
            "interval" => ScalarType::Interval,
            "port" => ScalarType::Port,
            "string" => ScalarType::String,
            "subnet" => ScalarType::Subnet,
            "time" => ScalarType::Time,
            other => ScalarType::Other(other.to_string()),
        }
    }

    /// The header name of this type.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ScalarType::Addr => "addr",
            ScalarType::Bool => "bool",
            ScalarType::Count => "count",
            ScalarType::Double => "double",
            ScalarType::Enum => "enum",
            ScalarType::Int => "int",
            ScalarType::Interval => "interval",
            ScalarType::Port => "port",
            ScalarType::String => "string",
            ScalarType::Subnet => "subnet",
            ScalarType::Time => "time",
            ScalarType::Other(name) => name,
        }
    }

    /// Casts a raw cell to this type.
    ///
    /// The unset marker is handled by the caller; this only sees real values.
    ///
    /// # Errors
    ///
    /// Returns a [`CastError`] describing why `raw` is not a valid value of
    /// this type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brolog::types::ScalarType;
    /// use brolog::Value;
    ///
    /// assert_eq!(ScalarType::Port.cast("443").unwrap(), Value::Port(443));
    /// assert_eq!(ScalarType::Bool.cast("T").unwrap(), Value::Bool(true));
    /// assert!(ScalarType::Count.cast("-1").is_err());
    /// ```
    pub fn cast(&self, raw: &str) -> Result<Value, CastError> {
        match self {
            ScalarType::Addr => parse_addr(raw).map(Value::Addr),
            ScalarType::Bool => parse_bool(raw).map(Value::Bool),
            ScalarType::Count => {
                let n = COUNT_RANGE.check(raw)?;
                u64::try_from(n)
                    .map(Value::Count)
                    .map_err(|_| out_of_range(raw, "count"))
            }
            ScalarType::Double => parse_float(raw).map(Value::Double),
            ScalarType::Int => {
                let n = INT_RANGE.check(raw)?;
                i64::try_from(n)
                    .map(Value::Int)
                    .map_err(|_| out_of_range(raw, "int"))
            }
            ScalarType::Interval => parse_interval(raw).map(Value::Interval),
            ScalarType::Port => {
                let n = PORT_RANGE.check(raw)?;
                u16::try_from(n)
                    .map(Value::Port)
                    .map_err(|_| out_of_range(raw, "port"))
            }
            ScalarType::Subnet => parse_subnet(raw),
            ScalarType::Time => parse_time(raw).map(Value::Time),
            ScalarType::Enum => Ok(Value::Enum(raw.to_string())),
            ScalarType::String | ScalarType::Other(_) => Ok(Value::String(raw.to_string())),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The collection kind of an aggregate column.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    /// Unordered, duplicates collapse.
    Set,
    /// Ordered, duplicates kept.
    Vector,
    /// Any other `word[word]` descriptor. Rejected when a cell of this type
    /// has to be decomposed.
    Other(String),
}

impl AggregateKind {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "set" => AggregateKind::Set,
            "vector" => AggregateKind::Vector,
            other => AggregateKind::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            AggregateKind::Set => "set",
            AggregateKind::Vector => "vector",
            AggregateKind::Other(name) => name,
        }
    }
}

/// The declared type of one column.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Scalar(ScalarType),
    Aggregate {
        kind: AggregateKind,
        element: ScalarType,
    },
}

impl TypeDescriptor {
    /// Parses a descriptor from the `#types` header.
    ///
    /// Anything that is not exactly `word[word]` (word characters being ASCII
    /// alphanumerics and `_`) is treated as a scalar type name, so nested
    /// aggregates such as `vector[set[count]]` fall back to the raw string.
    #[must_use]
    pub fn parse(descriptor: &str) -> Self {
        let aggregate = descriptor
            .strip_suffix(']')
            .and_then(|rest| rest.split_once('['))
            .filter(|(kind, element)| is_word(kind) && is_word(element));

        match aggregate {
            Some((kind, element)) => TypeDescriptor::Aggregate {
                kind: AggregateKind::from_name(kind),
                element: ScalarType::from_name(element),
            },
            None => TypeDescriptor::Scalar(ScalarType::from_name(descriptor)),
        }
    }

    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(self, TypeDescriptor::Aggregate { .. })
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Scalar(scalar) => write!(f, "{}", scalar),
            TypeDescriptor::Aggregate { kind, element } => {
                write!(f, "{}[{}]", kind.name(), element)
            }
        }
    }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// An integer caster with an optional inclusive lower bound and an optional
/// exclusive upper bound.
///
/// # Examples
///
/// ```rust
/// use brolog::types::RangeCheck;
///
/// let port = RangeCheck::new(Some(0), Some(65536));
/// assert_eq!(port.check("80"), Ok(80));
/// assert!(port.check("65536").is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeCheck {
    pub min: Option<i128>,
    pub max: Option<i128>,
}

impl RangeCheck {
    #[must_use]
    pub const fn new(min: Option<i128>, max: Option<i128>) -> Self {
        RangeCheck { min, max }
    }

    /// Parses `raw` as an integer and checks it against both bounds.
    ///
    /// # Errors
    ///
    /// [`CastError::InvalidInteger`] when `raw` is not an integer, otherwise
    /// the error naming whichever bound was violated.
    pub fn check(&self, raw: &str) -> Result<i128, CastError> {
        let value: i128 = raw.parse().map_err(|_| CastError::InvalidInteger {
            value: raw.to_string(),
        })?;

        if let Some(min) = self.min {
            if value < min {
                return Err(CastError::BelowMinimum { value, min });
            }
        }
        if let Some(max) = self.max {
            if value >= max {
                return Err(CastError::NotBelowMaximum { value, max });
            }
        }
        Ok(value)
    }
}

fn out_of_range(raw: &str, target: &'static str) -> CastError {
    CastError::OutOfRange {
        value: raw.to_string(),
        target,
    }
}

fn parse_bool(raw: &str) -> Result<bool, CastError> {
    if TRUE_LITERALS.contains(&raw) {
        Ok(true)
    } else if FALSE_LITERALS.contains(&raw) {
        Ok(false)
    } else {
        Err(CastError::InvalidBool {
            value: raw.to_string(),
        })
    }
}

fn parse_addr(raw: &str) -> Result<IpAddr, CastError> {
    raw.parse().map_err(|_| CastError::InvalidAddr {
        value: raw.to_string(),
    })
}

fn parse_subnet(raw: &str) -> Result<Value, CastError> {
    let invalid = || CastError::InvalidSubnet {
        value: raw.to_string(),
    };

    let (addr, prefix) = raw.split_once('/').ok_or_else(invalid)?;
    let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    let max_prefix = if addr.is_ipv4() { 32 } else { 128 };
    if prefix > max_prefix {
        return Err(invalid());
    }
    Ok(Value::Subnet { addr, prefix })
}

fn parse_float(raw: &str) -> Result<f64, CastError> {
    raw.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .ok_or_else(|| CastError::InvalidNumber {
            value: raw.to_string(),
        })
}

/// Fractional seconds to whole microseconds, the resolution the log carries.
fn to_micros(raw: &str, target: &'static str) -> Result<i64, CastError> {
    let micros = (parse_float(raw)? * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros >= i64::MAX as f64 {
        return Err(out_of_range(raw, target));
    }
    Ok(micros as i64)
}

fn parse_interval(raw: &str) -> Result<Duration, CastError> {
    to_micros(raw, "interval").map(Duration::microseconds)
}

/// Epoch seconds to a naive timestamp in the local timezone.
///
/// Instants that leave the `NaiveDateTime` range once the local offset is
/// applied are out of range.
fn parse_time(raw: &str) -> Result<NaiveDateTime, CastError> {
    let micros = to_micros(raw, "time")?;
    DateTime::from_timestamp_micros(micros)
        .and_then(|utc| {
            let offset = utc.with_timezone(&Local).offset().fix();
            utc.naive_utc().checked_add_offset(offset)
        })
        .ok_or_else(|| out_of_range(raw, "time"))
}
