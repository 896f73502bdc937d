//! Loading logs into relational tables.
//!
//! A table cannot hold a nested collection, so [`load_table`] reads the log
//! with aggregate decomposition turned off: `set` and `vector` cells arrive
//! as their original text. Every record becomes one row of [`ColumnValue`]s,
//! with one column per header field.
//!
//! Storage is abstracted behind [`TableSink`]. [`MemoryDatabase`] is a simple
//! in-memory implementation.
//!
//! ## Examples
//!
//! ```rust
//! use brolog::loader::{load_table, ColumnValue, MemoryDatabase};
//!
//! let log = "#separator \\x09\n\
//!            #set_separator\t,\n\
//!            #unset_field\t-\n\
//!            #fields\tid.orig_h\tid.orig_p\tservices\n\
//!            #types\taddr\tport\tset[string]\n\
//!            10.0.0.1\t22\tssh,sftp\n\
//!            10.0.0.2\t-\t-\n";
//!
//! let mut db = MemoryDatabase::new();
//! let rows = load_table("conn", log.as_bytes(), &mut db).unwrap();
//! assert_eq!(rows, 2);
//!
//! let table = db.table("conn").unwrap();
//! assert_eq!(table.columns, vec!["id_orig_h", "id_orig_p", "services"]);
//! assert_eq!(table.rows[0][2], ColumnValue::Text("ssh,sftp".into()));
//! assert_eq!(table.rows[1][1], ColumnValue::Null);
//! ```

use crate::value::{duration_secs, TIME_FORMAT};
use crate::{Error, LogReader, ReaderOptions, Result, Value};
use indexmap::IndexMap;
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

/// The relational representation of a decoded value.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<&Value> for ColumnValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => ColumnValue::Null,
            Value::Bool(b) => ColumnValue::Integer(i64::from(*b)),
            Value::Port(p) => ColumnValue::Integer(i64::from(*p)),
            Value::Int(i) => ColumnValue::Integer(*i),
            // Counts above i64::MAX do not fit an integer column
            Value::Count(n) => match i64::try_from(*n) {
                Ok(i) => ColumnValue::Integer(i),
                Err(_) => ColumnValue::Text(n.to_string()),
            },
            Value::Double(f) => ColumnValue::Real(*f),
            Value::Interval(d) => ColumnValue::Real(duration_secs(d)),
            Value::Time(t) => ColumnValue::Text(t.format(TIME_FORMAT).to_string()),
            Value::String(s) | Value::Enum(s) | Value::Raw(s) => ColumnValue::Text(s.clone()),
            Value::Addr(_) | Value::Subnet { .. } | Value::Set(_) | Value::Vector(_) => {
                ColumnValue::Text(value.to_string())
            }
        }
    }
}

/// Destination for loaded logs.
pub trait TableSink {
    /// Creates a table with the given column names.
    ///
    /// # Errors
    ///
    /// Implementations report storage failures, e.g. an existing table.
    fn create_table(&mut self, name: &str, columns: &[String]) -> Result<()>;

    /// Appends one row, with values in column order.
    ///
    /// # Errors
    ///
    /// Implementations report storage failures.
    fn insert_row(&mut self, table: &str, row: Vec<ColumnValue>) -> Result<()>;
}

/// Turns a field name into a column name by replacing `.` with `_`.
///
/// # Examples
///
/// ```rust
/// assert_eq!(brolog::loader::column_name("id.orig_h"), "id_orig_h");
/// ```
#[must_use]
pub fn column_name(field: &str) -> String {
    field.replace('.', "_")
}

/// The table name for a log file: its file name without the extension.
///
/// # Examples
///
/// ```rust
/// use std::path::Path;
///
/// assert_eq!(
///     brolog::loader::table_name(Path::new("/var/log/zeek/conn.log")),
///     Some("conn".to_string())
/// );
/// ```
#[must_use]
pub fn table_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}

/// Reads a log from `input` and loads it into a new table called `name`.
///
/// Returns the number of rows inserted.
///
/// # Errors
///
/// Stops at the first header, decode or sink error. Rows inserted before
/// the error stay in the sink.
pub fn load_table<R, S>(name: &str, input: R, sink: &mut S) -> Result<usize>
where
    R: BufRead,
    S: TableSink + ?Sized,
{
    let reader = LogReader::with_options(input, ReaderOptions::passthrough())?;
    let columns: Vec<String> = reader
        .fields()
        .ok_or_else(|| Error::state(reader.line_number(), "log has no #fields header"))?
        .iter()
        .map(|f| column_name(f))
        .collect();

    sink.create_table(name, &columns)?;

    let mut rows = 0;
    for record in reader {
        let row = record?.values().map(ColumnValue::from).collect();
        sink.insert_row(name, row)?;
        rows += 1;
    }

    debug!(table = name, rows, "loaded table");
    Ok(rows)
}

/// An in-memory table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ColumnValue>>,
}

impl MemoryTable {
    /// Returns the values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &ColumnValue>> {
        let index = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().filter_map(move |row| row.get(index)))
    }
}

/// A [`TableSink`] that keeps tables in memory, in creation order.
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    tables: IndexMap<String, MemoryTable>,
}

impl MemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.get(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

impl TableSink for MemoryDatabase {
    fn create_table(&mut self, name: &str, columns: &[String]) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(Error::custom(format!("table {} already exists", name)));
        }
        self.tables.insert(
            name.to_string(),
            MemoryTable {
                columns: columns.to_vec(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    fn insert_row(&mut self, table: &str, row: Vec<ColumnValue>) -> Result<()> {
        let target = self
            .tables
            .get_mut(table)
            .ok_or_else(|| Error::custom(format!("no such table: {}", table)))?;
        if row.len() != target.columns.len() {
            return Err(Error::custom(format!(
                "table {} has {} columns, row has {} values",
                table,
                target.columns.len(),
                row.len()
            )));
        }
        target.rows.push(row);
        Ok(())
    }
}
