//! Loading logs into SQLite.
//!
//! [`TableSink`] is implemented for [`rusqlite::Connection`] and
//! [`rusqlite::Transaction`], so [`load_table`] can write straight into a
//! database. Each log becomes one table with untyped columns, and values are
//! stored with the storage class of their [`ColumnValue`]. Nulls stay `NULL`,
//! intervals are seconds as `REAL`, and addresses and times are `TEXT`.
//!
//! ## Examples
//!
//! ```rust
//! use brolog::loader::load_table;
//! use rusqlite::Connection;
//!
//! let log = "#separator \\x09\n\
//!            #unset_field\t-\n\
//!            #fields\tid.orig_h\tduration\n\
//!            #types\taddr\tinterval\n\
//!            10.0.0.1\t1.5\n\
//!            10.0.0.2\t-\n";
//!
//! let mut conn = Connection::open_in_memory().unwrap();
//! load_table("conn", log.as_bytes(), &mut conn).unwrap();
//!
//! let total: f64 = conn
//!     .query_row("SELECT sum(duration) FROM conn", [], |row| row.get(0))
//!     .unwrap();
//! assert_eq!(total, 1.5);
//! ```

use crate::loader::{load_table, table_name, ColumnValue, TableSink};
use crate::{Error, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, Transaction};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

impl From<ColumnValue> for SqlValue {
    fn from(value: ColumnValue) -> Self {
        match value {
            ColumnValue::Null => SqlValue::Null,
            ColumnValue::Integer(i) => SqlValue::Integer(i),
            ColumnValue::Real(f) => SqlValue::Real(f),
            ColumnValue::Text(s) => SqlValue::Text(s),
        }
    }
}

/// Quotes an SQL identifier.
fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn create_sql(name: &str, columns: &[String]) -> String {
    let columns: Vec<String> = columns.iter().map(|c| quote(c)).collect();
    format!("CREATE TABLE {} ({})", quote(name), columns.join(", "))
}

fn insert_sql(table: &str, width: usize) -> String {
    let params = vec!["?"; width].join(", ");
    format!("INSERT INTO {} VALUES ({})", quote(table), params)
}

fn create_in(conn: &Connection, name: &str, columns: &[String]) -> Result<()> {
    conn.execute(&create_sql(name, columns), [])
        .map_err(|e| Error::database(format!("failed to create table {}: {}", name, e)))?;
    Ok(())
}

fn insert_in(conn: &Connection, table: &str, row: Vec<ColumnValue>) -> Result<()> {
    let mut stmt = conn
        .prepare_cached(&insert_sql(table, row.len()))
        .map_err(|e| Error::database(format!("failed to prepare insert into {}: {}", table, e)))?;
    stmt.execute(params_from_iter(row.into_iter().map(SqlValue::from)))
        .map_err(|e| Error::database(format!("failed to insert into {}: {}", table, e)))?;
    Ok(())
}

impl TableSink for Connection {
    fn create_table(&mut self, name: &str, columns: &[String]) -> Result<()> {
        create_in(self, name, columns)
    }

    fn insert_row(&mut self, table: &str, row: Vec<ColumnValue>) -> Result<()> {
        insert_in(self, table, row)
    }
}

impl TableSink for Transaction<'_> {
    fn create_table(&mut self, name: &str, columns: &[String]) -> Result<()> {
        create_in(self, name, columns)
    }

    fn insert_row(&mut self, table: &str, row: Vec<ColumnValue>) -> Result<()> {
        insert_in(self, table, row)
    }
}

/// Loads each log file into its own table, named after the file stem.
///
/// Every file is loaded inside one transaction, which is committed only when
/// the whole file was read. Returns the total number of rows inserted.
///
/// # Errors
///
/// Stops at the first file that cannot be opened or loaded. Tables from
/// earlier files stay committed; the failing file leaves nothing behind.
pub fn load_logs<I, P>(conn: &mut Connection, paths: I) -> Result<usize>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut total = 0;
    for path in paths {
        let path = path.as_ref();
        let name = table_name(path)
            .ok_or_else(|| Error::custom(format!("{} has no file name", path.display())))?;
        let file =
            File::open(path).map_err(|e| Error::io(&format!("{}: {}", path.display(), e)))?;

        let mut tx = conn.transaction().map_err(Error::database)?;
        let rows = load_table(&name, BufReader::new(file), &mut tx)?;
        tx.commit().map_err(Error::database)?;

        debug!(path = %path.display(), table = %name, rows, "loaded log into sqlite");
        total += rows;
    }
    Ok(total)
}
