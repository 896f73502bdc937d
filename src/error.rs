//! Error types for reading Bro logs.
//!
//! Errors come in two layers:
//!
//! - [`CastError`]: a single raw cell could not be converted to its declared
//!   type. It carries no position information, since the value decoder is a
//!   pure function of the cell and the current header configuration.
//! - [`Error`]: everything the reader can report, each variant tagged with the
//!   1-based input line it was raised on. Cell failures are wrapped in
//!   [`Error::Decode`] together with the field name and the offending value.
//!
//! ## Examples
//!
//! ```rust
//! use brolog::{from_str, Error};
//!
//! let log = "#separator \\x09\n#fields\tp\n#types\tport\n70000\n";
//! let mut reader = from_str(log).unwrap();
//!
//! match reader.next() {
//!     Some(Err(Error::Decode { line, field, .. })) => {
//!         assert_eq!(line, 4);
//!         assert_eq!(field, "p");
//!     }
//!     other => panic!("expected a decode error, got {:?}", other),
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Failure to convert one raw cell into a typed [`Value`](crate::Value).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastError {
    /// The cell is not an integer at all.
    #[error("{value:?} is not an integer")]
    InvalidInteger { value: String },

    /// Integer below the inclusive lower bound.
    #[error("{value} is not greater than or equal to {min}")]
    BelowMinimum { value: i128, min: i128 },

    /// Integer at or above the exclusive upper bound.
    #[error("{value} is not less than {max}")]
    NotBelowMaximum { value: i128, max: i128 },

    /// The cell is not one of the accepted boolean literals.
    #[error("{value:?} is not bool-like")]
    InvalidBool { value: String },

    #[error("{value:?} is not an IPv4 or IPv6 address")]
    InvalidAddr { value: String },

    #[error("{value:?} is not a subnet in addr/prefix form")]
    InvalidSubnet { value: String },

    /// Interval, time and double cells must hold a finite float.
    #[error("{value:?} is not a finite number")]
    InvalidNumber { value: String },

    /// The float is finite but does not fit the target representation.
    #[error("{value:?} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("unknown aggregate type {kind:?}")]
    UnknownAggregate { kind: String },

    /// An aggregate must be split but no `set_separator` directive was seen.
    #[error("no set_separator has been declared")]
    MissingSetSeparator,
}

/// Represents all errors that can occur while reading a Bro log.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error while reading the underlying input
    #[error("IO error: {0}")]
    Io(String),

    /// A separator directive that does not resolve to exactly one character
    #[error("Format error at line {line}: {msg}")]
    Format { line: usize, msg: String },

    /// A metadata directive whose value cannot be interpreted
    #[error("Invalid #{key} header at line {line}: {msg}")]
    Header {
        line: usize,
        key: String,
        msg: String,
    },

    /// A data cell that cannot be cast to its declared type
    #[error("Decode error at line {line}, field {field:?}: {source}")]
    Decode {
        line: usize,
        field: String,
        value: String,
        #[source]
        source: CastError,
    },

    /// A data line that disagrees with the declared field list
    #[error("Decode error at line {line}: expected {expected} values, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A data line that cannot be decoded with the header seen so far
    #[error("State error at line {line}: {msg}")]
    State { line: usize, msg: String },

    /// A table sink backed by a database rejected an operation
    #[error("Database error: {0}")]
    Database(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a format error for an unusable separator directive.
    pub fn format(line: usize, msg: &str) -> Self {
        Error::Format {
            line,
            msg: msg.to_string(),
        }
    }

    /// Creates a header error for a directive whose value could not be parsed.
    pub fn header(line: usize, key: &str, msg: &str) -> Self {
        Error::Header {
            line,
            key: key.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Wraps a [`CastError`] with the position and field it was raised for.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brolog::{CastError, Error};
    ///
    /// let err = Error::decode(
    ///     7,
    ///     "id.resp_p",
    ///     "70000",
    ///     CastError::NotBelowMaximum { value: 70000, max: 65536 },
    /// );
    /// let msg = err.to_string();
    /// assert!(msg.contains("line 7"));
    /// assert!(msg.contains("70000 is not less than 65536"));
    /// ```
    pub fn decode(line: usize, field: &str, value: &str, source: CastError) -> Self {
        Error::Decode {
            line,
            field: field.to_string(),
            value: value.to_string(),
            source,
        }
    }

    /// Creates a state error for data that arrives before a usable header.
    pub fn state(line: usize, msg: &str) -> Self {
        Error::State {
            line,
            msg: msg.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brolog::Error;
    ///
    /// let err = Error::custom("table already exists");
    /// assert!(err.to_string().contains("table already exists"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates a database error from a storage backend failure.
    pub fn database<T: fmt::Display>(msg: T) -> Self {
        Error::Database(msg.to_string())
    }

    /// Creates an I/O error for input read failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// The input line the error was raised on, if it is tied to one.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Format { line, .. }
            | Error::Header { line, .. }
            | Error::Decode { line, .. }
            | Error::FieldCount { line, .. }
            | Error::State { line, .. } => Some(*line),
            Error::Io(_) | Error::Database(_) | Error::Custom(_) => None,
        }
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_messages_name_the_bound() {
        let low = CastError::BelowMinimum { value: -1, min: 0 };
        assert_eq!(low.to_string(), "-1 is not greater than or equal to 0");

        let high = CastError::NotBelowMaximum {
            value: 70000,
            max: 65536,
        };
        assert_eq!(high.to_string(), "70000 is not less than 65536");
    }

    #[test]
    fn test_line_accessor() {
        assert_eq!(Error::format(3, "bad").line(), Some(3));
        assert_eq!(Error::state(9, "no fields").line(), Some(9));
        assert_eq!(Error::io("gone").line(), None);
        assert_eq!(Error::database("locked").line(), None);
    }

    #[test]
    fn test_decode_error_keeps_source() {
        use std::error::Error as _;

        let err = Error::decode(
            2,
            "flag",
            "maybe",
            CastError::InvalidBool {
                value: "maybe".into(),
            },
        );
        assert!(err.source().is_some());
        assert!(err.to_string().contains("\"maybe\" is not bool-like"));
    }
}
