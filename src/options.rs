//! Configuration options for reading Bro logs.
//!
//! ## Examples
//!
//! ```rust
//! use brolog::{LogReader, ReaderOptions};
//!
//! let log = "#set_separator\t,\n#fields\ttags\n#types\tset[string]\na,b\n";
//! let log = format!("#separator \\x09\n{}", log);
//!
//! // Keep aggregate cells as their original text, e.g. for a table loader
//! let options = ReaderOptions::new().with_decompose_aggregates(false);
//! let mut reader = LogReader::with_options(log.as_bytes(), options).unwrap();
//! let record = reader.next().unwrap().unwrap();
//! assert_eq!(record.get("tags").and_then(|v| v.as_str()), Some("a,b"));
//! ```

/// Configuration options for a [`LogReader`](crate::LogReader).
///
/// Options are fixed when the reader is constructed and apply to every line it
/// reads.
///
/// # Examples
///
/// ```rust
/// use brolog::ReaderOptions;
///
/// let options = ReaderOptions::new();
/// assert!(options.decompose_aggregates);
///
/// let options = ReaderOptions::passthrough();
/// assert!(!options.decompose_aggregates);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Decode `set[...]` and `vector[...]` cells into [`Value::Set`] and
    /// [`Value::Vector`]. When off, such cells come back as [`Value::Raw`]
    /// holding the original text.
    ///
    /// [`Value::Set`]: crate::Value::Set
    /// [`Value::Vector`]: crate::Value::Vector
    /// [`Value::Raw`]: crate::Value::Raw
    pub decompose_aggregates: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            decompose_aggregates: true,
        }
    }
}

impl ReaderOptions {
    /// Creates default options (aggregates are decomposed).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that leave aggregate cells undecoded.
    ///
    /// This is what relational consumers want, since a table column cannot
    /// hold a nested collection.
    #[must_use]
    pub fn passthrough() -> Self {
        ReaderOptions {
            decompose_aggregates: false,
        }
    }

    /// Sets whether aggregate cells are decomposed into collections.
    #[must_use]
    pub fn with_decompose_aggregates(mut self, decompose: bool) -> Self {
        self.decompose_aggregates = decompose;
        self
    }
}
