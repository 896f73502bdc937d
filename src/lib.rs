//! # brolog
//!
//! A reader for the self-describing ASCII logs written by the Bro (now Zeek)
//! network monitor.
//!
//! ## What is a Bro log?
//!
//! A Bro log is a separator-delimited text file whose header describes its own
//! layout. Header lines start with `#` and declare the separator, the markers
//! used for unset and empty values, the column names and a type for every
//! column. Each remaining line is one record.
//!
//! ```text
//! #separator \x09
//! #set_separator	,
//! #empty_field	(empty)
//! #unset_field	-
//! #path	conn
//! #fields	ts	id.orig_h	id.orig_p	proto	tunnel_parents
//! #types	time	addr	port	enum	set[string]
//! 1300475167.096535	141.142.220.202	5353	udp	(empty)
//! ```
//!
//! ## Key Features
//!
//! - **Typed values**: addresses, ports, counts, intervals, timestamps and
//!   booleans are decoded into Rust types, with range checks
//! - **Aggregates**: `set[...]` and `vector[...]` cells become native
//!   collections, or stay as raw text for relational consumers
//! - **Lazy**: records are decoded one line at a time as you iterate
//! - **Serde bridge**: records deserialize into your own structs and
//!   serialize to JSON
//! - **SQLite loading**: one table per log through [`loader::load_table`]
//!   and [`sqlite::load_logs`]
//!
//! ## Quick Start
//!
//! ```rust
//! use brolog::{from_str, Value};
//!
//! let log = "#separator \\x09\n\
//!            #fields\tid.orig_h\tid.orig_p\tproto\n\
//!            #types\taddr\tport\tenum\n\
//!            192.168.1.1\t80\ttcp\n";
//!
//! let mut reader = from_str(log).unwrap();
//! let record = reader.next().unwrap().unwrap();
//!
//! assert_eq!(record["id.orig_h"], Value::Addr("192.168.1.1".parse().unwrap()));
//! assert_eq!(record["id.orig_p"], Value::Port(80));
//! assert_eq!(record["proto"], Value::Enum("tcp".into()));
//! ```
//!
//! ## Errors
//!
//! Malformed input is never silently repaired. Each bad data line produces one
//! [`Error`] from the iterator, carrying the line number, and no record; the
//! caller decides whether to stop or keep reading. See [`error`] for details.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (`debug` for header and separator
//! changes, `trace` per directive). It never installs a subscriber.
//!
//! ## Format Reference
//!
//! See the [`format`] module for the details of the log format as this crate
//! reads it.

pub mod de;
pub mod decode;
pub mod error;
pub mod format;
pub mod header;
pub mod loader;
pub mod options;
pub mod reader;
pub mod record;
pub mod sqlite;
pub mod types;
pub mod value;

pub use de::{from_record, from_value};
pub use error::{CastError, Error, Result};
pub use header::{Directive, ParserState};
pub use options::ReaderOptions;
pub use reader::LogReader;
pub use record::Record;
pub use types::{AggregateKind, ScalarType, TypeDescriptor};
pub use value::{Value, ValueSet};

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Creates a reader over any `io::Read` with default options.
///
/// The header is read before this returns.
///
/// # Examples
///
/// ```rust
/// use brolog::from_reader;
/// use std::io::Cursor;
///
/// let input = Cursor::new("#fields n\n#types count\n1\n2\n");
/// let total: u64 = from_reader(input)
///     .unwrap()
///     .map(|r| r.unwrap()["n"].as_u64().unwrap())
///     .sum();
/// assert_eq!(total, 3);
/// ```
///
/// # Errors
///
/// Returns an error if reading the header fails or a directive is malformed.
pub fn from_reader<R>(reader: R) -> Result<LogReader<BufReader<R>>>
where
    R: io::Read,
{
    LogReader::new(BufReader::new(reader))
}

/// Creates a reader over a string with default options.
///
/// # Errors
///
/// Returns an error if a header directive is malformed.
pub fn from_str(s: &str) -> Result<LogReader<&[u8]>> {
    LogReader::new(s.as_bytes())
}

/// Opens a log file and creates a buffered reader over it.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or its header is malformed.
pub fn from_path<P: AsRef<Path>>(path: P) -> Result<LogReader<BufReader<File>>> {
    from_path_with_options(path, ReaderOptions::default())
}

/// Opens a log file with custom options.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or its header is malformed.
pub fn from_path_with_options<P: AsRef<Path>>(
    path: P,
    options: ReaderOptions,
) -> Result<LogReader<BufReader<File>>> {
    let path = path.as_ref();
    let file =
        File::open(path).map_err(|e| Error::io(&format!("{}: {}", path.display(), e)))?;
    LogReader::with_options(BufReader::new(file), options)
}

/// Reads every record of a log held in a string.
///
/// # Errors
///
/// Returns the first error encountered; no records are returned in that case.
pub fn read_all_str(s: &str) -> Result<Vec<Record>> {
    from_str(s)?.collect()
}
