//! Record iteration.
//!
//! A [`LogReader`] is built in two phases. Construction reads every leading
//! metadata line, so the header (`fields`, `types`, `path`, `open`, ...) is
//! available before the first record is pulled. After that the reader is an
//! [`Iterator`] over `Result<Record>`, one item per data line.
//!
//! Metadata lines found between data lines are applied as they are reached
//! and yield nothing. A separator change therefore affects only the lines that
//! come after it.
//!
//! ## Errors
//!
//! A line that fails to decode yields a single `Err` and no record. The reader
//! stays usable: pulling again continues with the next line, so callers can
//! choose between stopping at the first error and skipping bad lines. An I/O
//! error ends iteration.
//!
//! ## Examples
//!
//! ```rust
//! use brolog::LogReader;
//!
//! let log = "\
//! #separator \\x09
//! #set_separator\t,
//! #empty_field\t(empty)
//! #unset_field\t-
//! #path\tconn
//! #fields\tid.orig_h\tid.orig_p\tproto
//! #types\taddr\tport\tenum
//! 192.168.1.1\t80\ttcp
//! 10.0.0.2\t-\tudp
//! ";
//!
//! let reader = LogReader::new(log.as_bytes()).unwrap();
//! assert_eq!(reader.path(), Some("conn"));
//! assert_eq!(reader.fields().map(|f| f.len()), Some(3));
//!
//! let records: Vec<_> = reader.collect::<Result<_, _>>().unwrap();
//! assert_eq!(records.len(), 2);
//! assert!(records[1]["id.orig_p"].is_null());
//! ```

use crate::decode::ValueDecoder;
use crate::header::MARKER;
use crate::types::TypeDescriptor;
use crate::{Error, ParserState, ReaderOptions, Record, Result};
use chrono::NaiveDateTime;
use std::io::{self, BufRead};
use tracing::debug;

/// A lazy, single-pass reader of Bro log records.
#[derive(Debug)]
pub struct LogReader<R> {
    lines: io::Lines<R>,
    line_no: usize,
    state: ParserState,
    options: ReaderOptions,
    /// The first data line, read while looking for the end of the header.
    pending: Option<String>,
    done: bool,
}

impl<R: BufRead> LogReader<R> {
    /// Creates a reader with default options and reads the header.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the input fails or a header directive is
    /// malformed.
    pub fn new(input: R) -> Result<Self> {
        Self::with_options(input, ReaderOptions::default())
    }

    /// Creates a reader with custom options and reads the header.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the input fails or a header directive is
    /// malformed.
    pub fn with_options(input: R, options: ReaderOptions) -> Result<Self> {
        let mut reader = LogReader {
            lines: input.lines(),
            line_no: 0,
            state: ParserState::new(),
            options,
            pending: None,
            done: false,
        };
        reader.read_header()?;
        debug!(
            lines = reader.line_no,
            path = ?reader.state.path(),
            fields = reader.state.fields().map_or(0, |f| f.len()),
            "read log header"
        );
        Ok(reader)
    }

    fn read_header(&mut self) -> Result<()> {
        while let Some(line) = self.next_line()? {
            if line.starts_with(MARKER) {
                self.state.apply_line(&line, self.line_no)?;
            } else {
                self.pending = Some(line);
                break;
            }
        }
        Ok(())
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next() {
            None => Ok(None),
            Some(Ok(line)) => {
                self.line_no += 1;
                Ok(Some(line))
            }
            Some(Err(e)) => Err(Error::io(&e.to_string())),
        }
    }

    fn next_record(&mut self) -> Result<Option<Record>> {
        loop {
            let line = match self.pending.take() {
                Some(line) => line,
                None => match self.next_line()? {
                    Some(line) => line,
                    None => return Ok(None),
                },
            };

            if line.starts_with(MARKER) {
                self.state.apply_line(&line, self.line_no)?;
            } else {
                return self.decode_line(&line).map(Some);
            }
        }
    }

    fn decode_line(&self, line: &str) -> Result<Record> {
        let line_no = self.line_no;
        let (fields, schema) = match (self.state.fields(), self.state.schema()) {
            (Some(fields), Some(schema)) if fields.len() == schema.len() => (fields, schema),
            (Some(fields), Some(schema)) => {
                return Err(Error::state(
                    line_no,
                    &format!(
                        "{} fields are declared but {} types",
                        fields.len(),
                        schema.len()
                    ),
                ))
            }
            (None, _) => {
                return Err(Error::state(
                    line_no,
                    "data line before the #fields header",
                ))
            }
            (_, None) => {
                return Err(Error::state(
                    line_no,
                    "data line before the #types header",
                ))
            }
        };

        let cells: Vec<&str> = line.split(self.state.separator()).collect();
        if cells.len() != fields.len() {
            return Err(Error::FieldCount {
                line: line_no,
                expected: fields.len(),
                found: cells.len(),
            });
        }

        let decoder = ValueDecoder::new(&self.state, self.options.decompose_aggregates);
        let mut record = Record::with_capacity(fields.len());
        for ((name, ty), raw) in fields.iter().zip(schema).zip(cells) {
            let value = decoder
                .decode(raw, ty)
                .map_err(|e| Error::decode(line_no, name, raw, e))?;
            record.push(name.clone(), value);
        }
        Ok(record)
    }
}

impl<R> LogReader<R> {
    /// All metadata parsed so far.
    #[must_use]
    pub fn metadata(&self) -> &ParserState {
        &self.state
    }

    /// The options this reader was built with.
    #[must_use]
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// The number of input lines consumed so far.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_no
    }

    #[must_use]
    pub fn fields(&self) -> Option<&[String]> {
        self.state.fields()
    }

    #[must_use]
    pub fn types(&self) -> Option<&[String]> {
        self.state.types()
    }

    #[must_use]
    pub fn schema(&self) -> Option<&[TypeDescriptor]> {
        self.state.schema()
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.state.path()
    }

    #[must_use]
    pub fn open(&self) -> Option<NaiveDateTime> {
        self.state.open()
    }

    /// The `#close` timestamp. Logs write it after the last record, so it is
    /// usually only known once iteration has finished.
    #[must_use]
    pub fn close(&self) -> Option<NaiveDateTime> {
        self.state.close()
    }
}

impl<R: BufRead> Iterator for LogReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                if matches!(e, Error::Io(_)) {
                    self.done = true;
                }
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CastError, Value};

    const HEADER: &str = "#separator \\x09\n\
                          #set_separator\t,\n\
                          #empty_field\t(empty)\n\
                          #unset_field\t-\n\
                          #fields\tuid\tdepth\n\
                          #types\tstring\tcount\n";

    fn read(log: &str) -> LogReader<&[u8]> {
        LogReader::new(log.as_bytes()).unwrap()
    }

    #[test]
    fn test_header_is_read_before_iteration() {
        let log = format!("{}C1\t1\n", HEADER);
        let reader = read(&log);
        assert_eq!(reader.line_number(), 7);
        assert_eq!(
            reader.fields(),
            Some(&["uid".to_string(), "depth".to_string()][..])
        );
        assert_eq!(
            reader.types(),
            Some(&["string".to_string(), "count".to_string()][..])
        );
    }

    #[test]
    fn test_header_only_log_yields_nothing() {
        let mut reader = read(HEADER);
        assert!(reader.next().is_none());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_close_is_known_after_iteration() {
        let log = format!("{}C1\t1\n#close\t2011-03-18-19-06-13\n", HEADER);
        let mut reader = read(&log);
        assert!(reader.close().is_none());
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().is_none());
        assert!(reader.close().is_some());
    }

    #[test]
    fn test_data_before_fields_is_a_state_error() {
        let mut reader = read("#types count\n1\n");
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(err, Error::State { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_data_before_types_is_a_state_error() {
        let mut reader = read("#fields n\n1\n");
        assert!(matches!(
            reader.next().unwrap(),
            Err(Error::State { line: 2, .. })
        ));
    }

    #[test]
    fn test_fields_and_types_length_mismatch() {
        let mut reader = read("#fields a b\n#types count\n1 2\n");
        assert!(matches!(
            reader.next().unwrap(),
            Err(Error::State { line: 3, .. })
        ));
    }

    #[test]
    fn test_wrong_number_of_cells() {
        let log = format!("{}C1\n", HEADER);
        let mut reader = read(&log);
        match reader.next().unwrap() {
            Err(Error::FieldCount {
                line,
                expected,
                found,
            }) => {
                assert_eq!((line, expected, found), (7, 2, 1));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_iteration_continues_after_a_bad_line() {
        let log = format!("{}C1\t1\nC2\t-5\nC3\t3\n", HEADER);
        let results: Vec<_> = read(&log).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        match &results[1] {
            Err(Error::Decode {
                line,
                field,
                value,
                source,
            }) => {
                assert_eq!(*line, 8);
                assert_eq!(field, "depth");
                assert_eq!(value, "-5");
                assert_eq!(*source, CastError::BelowMinimum { value: -5, min: 0 });
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            results[2].as_ref().unwrap().get("depth"),
            Some(&Value::Count(3))
        );
    }

    #[test]
    fn test_blank_line_is_a_data_line() {
        let log = format!("{}C1\t1\n\nC2\t2\n", HEADER);
        let results: Vec<_> = read(&log).collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(
            results[1],
            Err(Error::FieldCount {
                line: 8,
                expected: 2,
                found: 1
            })
        ));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_blank_line_under_single_string_column() {
        let log = "#separator \\x09\n#fields\tmsg\n#types\tstring\nhello\n\nworld\n";
        let records: Vec<_> = read(log).collect::<Result<_>>().unwrap();
        let messages: Vec<_> = records.iter().map(|r| r["msg"].clone()).collect();
        assert_eq!(
            messages,
            vec![
                Value::String("hello".into()),
                Value::String(String::new()),
                Value::String("world".into()),
            ]
        );
    }

    #[test]
    fn test_header_error_fails_construction() {
        let err = LogReader::new("#separator xy\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Format { line: 1, .. }));
    }

    #[test]
    fn test_late_header_error_is_reported_by_iteration() {
        let log = format!("{}C1\t1\n#separator\tnope\nC2\t2\n", HEADER);
        let results: Vec<_> = read(&log).collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(results[1], Err(Error::Format { line: 8, .. })));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_types_can_be_redeclared_mid_stream() {
        let log = format!(
            "{}C1\t1\n#fields\tflag\n#types\tbool\nT\n",
            HEADER
        );
        let records: Vec<_> = read(&log).collect::<Result<_>>().unwrap();
        assert_eq!(records[0].get("depth"), Some(&Value::Count(1)));
        assert_eq!(records[1].get("flag"), Some(&Value::Bool(true)));
        assert_eq!(records[1].len(), 1);
    }
}
