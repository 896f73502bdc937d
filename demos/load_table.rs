//! Loads one or more Bro logs into a SQLite database, one table per file.
//!
//! Run with: cargo run --example load_table -- conn.log dns.log
//!
//! Set `BROLOG_DB` to write to a database file instead of memory.

use brolog::loader::table_name;
use brolog::sqlite::load_logs;
use rusqlite::Connection;
use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        eprintln!("usage: load_table <log>...");
        std::process::exit(2);
    }

    let mut conn = match std::env::var("BROLOG_DB") {
        Ok(path) => Connection::open(path)?,
        Err(_) => Connection::open_in_memory()?,
    };
    let total = load_logs(&mut conn, &paths)?;
    println!("loaded {} rows", total);

    for path in &paths {
        if let Some(name) = table_name(path) {
            let rows: i64 = conn.query_row(
                &format!("SELECT count(*) FROM \"{}\"", name.replace('"', "\"\"")),
                [],
                |row| row.get(0),
            )?;
            println!("{}: {} rows", name, rows);
        }
    }
    Ok(())
}
