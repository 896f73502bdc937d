//! Bro Log Format Reference
//!
//! This module documents the ASCII log format as read by this library.
//!
//! # Overview
//!
//! A log is a sequence of newline-terminated lines. Lines starting with `#`
//! are metadata directives; all others are data lines holding one record
//! each. The header normally precedes all data, and a trailing `#close`
//! directive marks a log that was closed cleanly.
//!
//! # Directives
//!
//! A directive line is split on the current field separator. The first token
//! is the directive name; the remaining tokens are its value.
//!
//! | Directive | Example value | Meaning |
//! |-----------|---------------|---------|
//! | `separator` | `\x09` | Field separator, backslash-escaped |
//! | `set_separator` | `,` | Separator between aggregate elements |
//! | `empty_field` | `(empty)` | An aggregate with no elements |
//! | `unset_field` | `-` | A value that is not set |
//! | `path` | `conn` | The log stream name |
//! | `open` | `2011-03-18-19-06-08` | When the log was opened |
//! | `close` | `2011-03-18-19-06-13` | When the log was closed |
//! | `fields` | `ts uid id.orig_h` | Column names |
//! | `types` | `time string addr` | Column types |
//!
//! **Rules**:
//! - The `separator` line itself is split on a space, the initial separator.
//!   A new separator takes effect on the following line.
//! - `separator` and `set_separator` must unescape to exactly one character.
//! - `open` and `close` are `-`-joined integers: year, month, day and
//!   optionally hour, minute, second and microsecond.
//! - Unknown directives are kept and can be looked up by name.
//! - Field names may contain dots (`id.orig_h`) and may repeat.
//!
//! # Types
//!
//! | Type | Decoded as | Accepted text |
//! |------|------------|---------------|
//! | `addr` | `IpAddr` | IPv4 or IPv6 address |
//! | `bool` | `bool` | `T`, `t`, `Y`, `y`, `1` / `F`, `f`, `N`, `n`, `0` |
//! | `count` | `u64` | Integer `>= 0` |
//! | `double` | `f64` | Finite decimal number |
//! | `enum` | `String` | Anything |
//! | `int` | `i64` | Integer |
//! | `interval` | `chrono::Duration` | Seconds as a decimal number |
//! | `port` | `u16` | Integer in `0..65536` |
//! | `string` | `String` | Anything |
//! | `subnet` | address + prefix | `addr/prefix` |
//! | `time` | `NaiveDateTime` | Epoch seconds as a decimal number |
//!
//! Any other type name is kept as a string.
//!
//! ## Aggregates
//!
//! `set[T]` and `vector[T]` hold zero or more elements of scalar type `T`,
//! joined by the set separator:
//!
//! ```text
//! #types	set[string]	vector[count]
//! http,ssl	1,2,3
//! (empty)	-
//! ```
//!
//! - The empty marker is an aggregate with no elements.
//! - The unset marker is null, for aggregates as for scalars. An element equal
//!   to the unset marker is a null element.
//! - Sets collapse duplicates; vectors keep them, in order.
//! - Aggregates do not nest.
//!
//! # Edge Cases
//!
//! - A data line before both `fields` and `types` are known, or when their
//!   lengths differ, is a state error.
//! - A data line with more or fewer cells than fields is a decode error.
//! - An empty line is a data line with a single empty cell.
//! - Trailing `\n` or `\r\n` terminators are stripped.

// This module contains only documentation; no implementation code
