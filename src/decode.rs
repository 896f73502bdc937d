//! Cell decoding.
//!
//! [`ValueDecoder`] turns one raw cell into a [`Value`] given its
//! [`TypeDescriptor`] and the markers declared by the header:
//!
//! 1. A cell equal to the `unset_field` marker is [`Value::Null`], whatever its
//!    type.
//! 2. An aggregate cell is returned verbatim as [`Value::Raw`] when
//!    decomposition is off. Otherwise the `empty_field` marker gives an empty
//!    collection, and anything else is split on `set_separator` with each
//!    element decoded as the element type.
//! 3. A scalar cell goes to [`ScalarType::cast`].
//!
//! ## Examples
//!
//! ```rust
//! use brolog::decode::ValueDecoder;
//! use brolog::types::TypeDescriptor;
//! use brolog::{ParserState, Value};
//!
//! let mut state = ParserState::new();
//! state.apply_line("#set_separator ,", 1).unwrap();
//! state.apply_line("#unset_field -", 2).unwrap();
//!
//! let decoder = ValueDecoder::new(&state, true);
//! let ty = TypeDescriptor::parse("vector[count]");
//! assert_eq!(
//!     decoder.decode("1,2,3", &ty).unwrap(),
//!     Value::Vector(vec![Value::Count(1), Value::Count(2), Value::Count(3)])
//! );
//! assert_eq!(decoder.decode("-", &ty).unwrap(), Value::Null);
//! ```

use crate::error::CastError;
use crate::types::{AggregateKind, ScalarType, TypeDescriptor};
use crate::{ParserState, Value, ValueSet};

/// Decodes raw cells using the markers of a [`ParserState`].
#[derive(Clone, Debug)]
pub struct ValueDecoder<'a> {
    unset_field: Option<&'a str>,
    empty_field: Option<&'a str>,
    set_separator: Option<char>,
    decompose_aggregates: bool,
}

impl<'a> ValueDecoder<'a> {
    /// Creates a decoder for the markers currently declared in `state`.
    ///
    /// Undeclared markers never match, so without an `unset_field` directive
    /// no cell decodes to null.
    #[must_use]
    pub fn new(state: &'a ParserState, decompose_aggregates: bool) -> Self {
        ValueDecoder {
            unset_field: state.unset_field(),
            empty_field: state.empty_field(),
            set_separator: state.set_separator(),
            decompose_aggregates,
        }
    }

    /// Decodes one cell.
    ///
    /// # Errors
    ///
    /// Returns a [`CastError`] when the cell, or one of its elements, is not a
    /// valid value of its declared type, or when an aggregate of an unknown
    /// kind has to be decomposed.
    pub fn decode(&self, raw: &str, ty: &TypeDescriptor) -> Result<Value, CastError> {
        if self.is_unset(raw) {
            return Ok(Value::Null);
        }

        match ty {
            TypeDescriptor::Scalar(scalar) => scalar.cast(raw),
            TypeDescriptor::Aggregate { kind, element } => {
                if !self.decompose_aggregates {
                    return Ok(Value::Raw(raw.to_string()));
                }
                self.decode_aggregate(raw, kind, element)
            }
        }
    }

    fn decode_aggregate(
        &self,
        raw: &str,
        kind: &AggregateKind,
        element: &ScalarType,
    ) -> Result<Value, CastError> {
        if let AggregateKind::Other(name) = kind {
            return Err(CastError::UnknownAggregate { kind: name.clone() });
        }

        let is_empty = self.empty_field == Some(raw);
        let items = if is_empty {
            Vec::new()
        } else {
            let separator = self
                .set_separator
                .ok_or(CastError::MissingSetSeparator)?;
            raw.split(separator)
                .map(|item| self.decode_element(item, element))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(match kind {
            AggregateKind::Set => Value::Set(items.into_iter().collect::<ValueSet>()),
            _ => Value::Vector(items),
        })
    }

    fn decode_element(&self, raw: &str, element: &ScalarType) -> Result<Value, CastError> {
        if self.is_unset(raw) {
            Ok(Value::Null)
        } else {
            element.cast(raw)
        }
    }

    fn is_unset(&self, raw: &str) -> bool {
        self.unset_field == Some(raw)
    }
}
