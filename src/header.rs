//! Metadata header parsing.
//!
//! Lines that start with [`MARKER`] are directives. Each one is split on the
//! separator in effect when the line is read; the first token names the
//! directive and the rest are its value. One value token is stored as a
//! [`Directive::Scalar`], any other number as a [`Directive::List`].
//!
//! A few directives get extra treatment:
//!
//! - `separator` and `set_separator` are backslash-unescaped (`\x09` is a tab)
//!   and must come out as exactly one character.
//! - `open` and `close` hold a `-`-separated calendar timestamp
//!   (`2019-04-02-13-05-59`).
//! - `types` is additionally parsed into [`TypeDescriptor`]s.
//!
//! Everything else, including `fields`, `unset_field`, `empty_field` and
//! `path`, is stored as split.
//!
//! ## Examples
//!
//! ```rust
//! use brolog::ParserState;
//!
//! let mut state = ParserState::new();
//! assert_eq!(state.separator(), ' ');
//!
//! state.apply_line("#separator \\x09", 1).unwrap();
//! assert_eq!(state.separator(), '\t');
//!
//! state.apply_line("#fields\tts\tuid", 2).unwrap();
//! assert_eq!(state.fields(), Some(&["ts".to_string(), "uid".to_string()][..]));
//! ```

use crate::types::TypeDescriptor;
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use tracing::{debug, trace};

/// The character that introduces a metadata line.
pub const MARKER: char = '#';

const DEFAULT_SEPARATOR: char = ' ';

/// The parsed value of one metadata directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Exactly one value token.
    Scalar(String),
    /// Zero or several value tokens, in order.
    List(Vec<String>),
    /// An unescaped `separator` or `set_separator`.
    Char(char),
    /// An `open` or `close` timestamp.
    Timestamp(NaiveDateTime),
}

impl Directive {
    /// Returns the value of a scalar directive.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Directive::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value tokens of a scalar or list directive.
    ///
    /// A scalar is seen as a one-element list, so a `#fields` header naming a
    /// single column still reads as a list of fields.
    #[must_use]
    pub fn values(&self) -> &[String] {
        match self {
            Directive::Scalar(s) => std::slice::from_ref(s),
            Directive::List(items) => items,
            Directive::Char(_) | Directive::Timestamp(_) => &[],
        }
    }

    #[must_use]
    pub fn as_char(&self) -> Option<char> {
        match self {
            Directive::Char(c) => Some(*c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Directive::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

/// Header configuration accumulated from the metadata lines read so far.
///
/// Directives are kept in the order they were first seen. A repeated directive
/// replaces the earlier value; nothing is ever removed.
#[derive(Clone, Debug, PartialEq)]
pub struct ParserState {
    directives: IndexMap<String, Directive>,
    schema: Option<Vec<TypeDescriptor>>,
}

impl Default for ParserState {
    fn default() -> Self {
        let mut directives = IndexMap::new();
        directives.insert("separator".to_string(), Directive::Char(DEFAULT_SEPARATOR));
        ParserState {
            directives,
            schema: None,
        }
    }
}

impl ParserState {
    /// Creates a state holding only the default `' '` separator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one metadata line and merges it into the state.
    ///
    /// `line` must not include its line terminator. Leading markers are
    /// stripped. `line_no` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// - [`Error::Format`] if a separator directive does not unescape to
    ///   exactly one character.
    /// - [`Error::Header`] if an `open`/`close` timestamp is malformed.
    pub fn apply_line(&mut self, line: &str, line_no: usize) -> Result<()> {
        let body = line.trim_start_matches(MARKER);
        let mut tokens = body.split(self.separator());
        let key = tokens.next().unwrap_or_default().to_string();
        let mut rest: Vec<String> = tokens.map(str::to_string).collect();

        let value = if rest.len() == 1 {
            Directive::Scalar(rest.remove(0))
        } else {
            Directive::List(rest)
        };

        let value = match key.as_str() {
            "separator" | "set_separator" => {
                let c = parse_separator(&value, line_no)?;
                debug!(directive = %key, separator = ?c, "separator changed");
                Directive::Char(c)
            }
            "open" | "close" => Directive::Timestamp(parse_timestamp(&key, &value, line_no)?),
            "types" => {
                self.schema = Some(
                    value
                        .values()
                        .iter()
                        .map(|t| TypeDescriptor::parse(t))
                        .collect(),
                );
                value
            }
            _ => value,
        };

        trace!(directive = %key, value = ?value, "applied directive");
        self.directives.insert(key, value);
        Ok(())
    }

    /// Looks up any directive by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Directive> {
        self.directives.get(key)
    }

    /// Iterates over all directives, in the order they were first seen.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Directive> {
        self.directives.iter()
    }

    /// The field separator in effect. Defaults to `' '`.
    #[must_use]
    pub fn separator(&self) -> char {
        self.get("separator")
            .and_then(Directive::as_char)
            .unwrap_or(DEFAULT_SEPARATOR)
    }

    /// The separator between elements of aggregate cells, if declared.
    #[must_use]
    pub fn set_separator(&self) -> Option<char> {
        self.get("set_separator").and_then(Directive::as_char)
    }

    /// The sentinel marking an absent value, if declared.
    #[must_use]
    pub fn unset_field(&self) -> Option<&str> {
        self.get("unset_field").and_then(Directive::as_str)
    }

    /// The sentinel marking an aggregate with no elements, if declared.
    #[must_use]
    pub fn empty_field(&self) -> Option<&str> {
        self.get("empty_field").and_then(Directive::as_str)
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.get("path").and_then(Directive::as_str)
    }

    #[must_use]
    pub fn open(&self) -> Option<NaiveDateTime> {
        self.get("open").and_then(Directive::as_timestamp)
    }

    #[must_use]
    pub fn close(&self) -> Option<NaiveDateTime> {
        self.get("close").and_then(Directive::as_timestamp)
    }

    /// The column names, as declared. May contain duplicates.
    #[must_use]
    pub fn fields(&self) -> Option<&[String]> {
        self.get("fields").map(Directive::values)
    }

    /// The column type names, as declared.
    #[must_use]
    pub fn types(&self) -> Option<&[String]> {
        self.get("types").map(Directive::values)
    }

    /// The column types, parsed.
    #[must_use]
    pub fn schema(&self) -> Option<&[TypeDescriptor]> {
        self.schema.as_deref()
    }

    /// Returns `true` once `fields` and `types` are both declared and agree in
    /// length, i.e. when data lines can be decoded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        match (self.fields(), self.schema()) {
            (Some(fields), Some(schema)) => fields.len() == schema.len(),
            _ => false,
        }
    }
}

fn parse_separator(value: &Directive, line_no: usize) -> Result<char> {
    let raw = value.as_str().ok_or_else(|| {
        Error::format(
            line_no,
            &format!("{:?} is not a valid separator", value.values()),
        )
    })?;
    let unescaped = unescape(raw).map_err(|msg| Error::format(line_no, &msg))?;

    let mut chars = unescaped.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::format(
            line_no,
            &format!("{:?} is not a valid separator", unescaped),
        )),
    }
}

fn parse_timestamp(key: &str, value: &Directive, line_no: usize) -> Result<NaiveDateTime> {
    let invalid = |msg: String| Error::header(line_no, key, &msg);

    let raw = value
        .as_str()
        .ok_or_else(|| invalid(format!("expected one value, found {:?}", value.values())))?;
    let parts = raw
        .split('-')
        .map(|p| p.parse::<u32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| invalid(format!("{:?} has a non-numeric component", raw)))?;

    if !(3..=7).contains(&parts.len()) {
        return Err(invalid(format!(
            "{:?} needs between 3 and 7 components, found {}",
            raw,
            parts.len()
        )));
    }
    let part = |i: usize| parts.get(i).copied().unwrap_or(0);
    let year = i32::try_from(parts[0])
        .map_err(|_| invalid(format!("{:?} has an invalid year", raw)))?;

    NaiveDate::from_ymd_opt(year, parts[1], parts[2])
        .and_then(|date| date.and_hms_micro_opt(part(3), part(4), part(5), part(6)))
        .ok_or_else(|| invalid(format!("{:?} is not a valid date and time", raw)))
}

/// Interprets backslash escape sequences.
///
/// Supports `\\`, `\'`, `\"`, `\a`, `\b`, `\f`, `\n`, `\r`, `\t`, `\v`,
/// octal `\ooo`, `\xHH`, `\uXXXX` and `\UXXXXXXXX`. Unknown escapes are kept
/// literally.
pub(crate) fn unescape(raw: &str) -> std::result::Result<String, String> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => result.push('\\'),
            Some('\'') => result.push('\''),
            Some('"') => result.push('"'),
            Some('a') => result.push('\u{0007}'),
            Some('b') => result.push('\u{0008}'),
            Some('f') => result.push('\u{000C}'),
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('v') => result.push('\u{000B}'),
            Some('x') => result.push(hex_escape(&mut chars, 2, raw)?),
            Some('u') => result.push(hex_escape(&mut chars, 4, raw)?),
            Some('U') => result.push(hex_escape(&mut chars, 8, raw)?),
            Some(d @ '0'..='7') => {
                let mut code = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(digit) => {
                            code = code * 8 + digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                result.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => return Err(format!("{:?} ends with a lone backslash", raw)),
        }
    }
    Ok(result)
}

fn hex_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    digits: usize,
    raw: &str,
) -> std::result::Result<char, String> {
    let mut hex = String::with_capacity(digits);
    for _ in 0..digits {
        match chars.next() {
            Some(ch) if ch.is_ascii_hexdigit() => hex.push(ch),
            _ => {
                return Err(format!(
                    "{:?} has a truncated escape (expected {} hex digits)",
                    raw, digits
                ))
            }
        }
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("{:?} escapes an invalid code point", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AggregateKind, ScalarType};

    fn state_with(lines: &[&str]) -> ParserState {
        let mut state = ParserState::new();
        for (i, line) in lines.iter().enumerate() {
            state.apply_line(line, i + 1).unwrap();
        }
        state
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("\\x09").unwrap(), "\t");
        assert_eq!(unescape("\\t").unwrap(), "\t");
        assert_eq!(unescape(",").unwrap(), ",");
        assert_eq!(unescape("\\u00e9").unwrap(), "é");
        assert_eq!(unescape("\\011").unwrap(), "\t");
        assert_eq!(unescape("\\q").unwrap(), "\\q");
        assert!(unescape("\\x0").is_err());
        assert!(unescape("\\").is_err());
    }

    #[test]
    fn test_scalar_and_list_values() {
        let state = state_with(&["#path conn", "#fields a b c", "#empty"]);
        assert_eq!(state.get("path"), Some(&Directive::Scalar("conn".into())));
        assert_eq!(state.path(), Some("conn"));
        assert_eq!(
            state.get("fields"),
            Some(&Directive::List(vec!["a".into(), "b".into(), "c".into()]))
        );
        assert_eq!(state.get("empty"), Some(&Directive::List(vec![])));
    }

    #[test]
    fn test_single_field_reads_as_list() {
        let state = state_with(&["#fields only"]);
        assert_eq!(state.fields(), Some(&["only".to_string()][..]));
    }

    #[test]
    fn test_separator_applies_from_next_line() {
        let state = state_with(&["#separator \\x09", "#set_separator\t,", "#unset_field\t-"]);
        assert_eq!(state.separator(), '\t');
        assert_eq!(state.set_separator(), Some(','));
        assert_eq!(state.unset_field(), Some("-"));
    }

    #[test]
    fn test_separator_must_be_one_char() {
        let mut state = ParserState::new();
        let err = state.apply_line("#separator ab", 1).unwrap_err();
        assert!(matches!(err, Error::Format { line: 1, .. }));

        let err = state.apply_line("#separator a b", 2).unwrap_err();
        assert!(matches!(err, Error::Format { line: 2, .. }));

        let err = state.apply_line("#set_separator \\x2c\\x2c", 3).unwrap_err();
        assert!(matches!(err, Error::Format { line: 3, .. }));

        // A failed directive leaves the state alone
        assert_eq!(state.separator(), ' ');
        assert_eq!(state.set_separator(), None);
    }

    #[test]
    fn test_open_close_timestamps() {
        let state = state_with(&["#open 2011-03-18-19-06-08", "#close 2011-03-18-19-06-08-5"]);
        let expected = NaiveDate::from_ymd_opt(2011, 3, 18)
            .unwrap()
            .and_hms_opt(19, 6, 8)
            .unwrap();
        assert_eq!(state.open(), Some(expected));
        assert_eq!(
            state.close(),
            Some(
                NaiveDate::from_ymd_opt(2011, 3, 18)
                    .unwrap()
                    .and_hms_micro_opt(19, 6, 8, 5)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_malformed_timestamps() {
        let mut state = ParserState::new();
        for (i, line) in [
            "#open 2011-03-xx",
            "#open 2011-03",
            "#open 2011-13-01",
            "#open 2011-03-18-25-00-00",
            "#close",
        ]
        .iter()
        .enumerate()
        {
            let err = state.apply_line(line, i + 1).unwrap_err();
            assert!(matches!(err, Error::Header { .. }), "{line}: {err}");
        }
        assert_eq!(state.open(), None);
    }

    #[test]
    fn test_types_build_schema() {
        let state = state_with(&["#fields ts tags", "#types time set[string]"]);
        assert_eq!(
            state.schema(),
            Some(
                &[
                    TypeDescriptor::Scalar(ScalarType::Time),
                    TypeDescriptor::Aggregate {
                        kind: AggregateKind::Set,
                        element: ScalarType::String,
                    },
                ][..]
            )
        );
        assert!(state.is_ready());
    }

    #[test]
    fn test_not_ready_until_lengths_agree() {
        let mut state = state_with(&["#fields a b"]);
        assert!(!state.is_ready());
        state.apply_line("#types count", 2).unwrap();
        assert!(!state.is_ready());
        state.apply_line("#types count count", 3).unwrap();
        assert!(state.is_ready());
    }

    #[test]
    fn test_repeated_markers_are_stripped() {
        let state = state_with(&["##path dns"]);
        assert_eq!(state.path(), Some("dns"));
    }
}
