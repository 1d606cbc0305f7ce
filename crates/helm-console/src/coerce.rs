//! Conversion of raw argument text into typed values.
//!
//! Booleans are lenient: an unparseable boolean falls back to `false`.
//! Numeric and fallback types have no such default, so a bad value there
//! must reject the call.

use crate::value::{Value, ValueType};

/// Result of converting one raw token.
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    /// The text converted cleanly.
    Parsed(Value),
    /// The text did not convert. `fallback` is the type's zero value, if it has one.
    Unparsed { fallback: Option<Value> },
}

impl Coercion {
    /// The converted value, rejecting anything that did not parse.
    pub fn strict(self) -> Option<Value> {
        match self {
            Self::Parsed(v) => Some(v),
            Self::Unparsed { .. } => None,
        }
    }

    /// The converted value, or the type's fallback when it did not parse.
    pub fn lenient(self) -> Option<Value> {
        match self {
            Self::Parsed(v) => Some(v),
            Self::Unparsed { fallback } => fallback,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

/// Convert `raw` to `target`.
pub fn coerce(raw: &str, target: &ValueType) -> Coercion {
    let trimmed = raw.trim();
    match target {
        ValueType::Bool => match parse_bool(trimmed) {
            Some(b) => Coercion::Parsed(Value::Bool(b)),
            None => Coercion::Unparsed {
                fallback: Some(Value::Bool(false)),
            },
        },
        ValueType::Int32 => numeric(trimmed.parse().ok().map(Value::Int32), Value::Int32(0)),
        ValueType::UInt16 => numeric(trimmed.parse().ok().map(Value::UInt16), Value::UInt16(0)),
        ValueType::UInt32 => numeric(trimmed.parse().ok().map(Value::UInt32), Value::UInt32(0)),
        ValueType::Double => numeric(trimmed.parse().ok().map(Value::Double), Value::Double(0.0)),
        ValueType::String => Coercion::Parsed(Value::Str(raw.to_string())),
        ValueType::Parsed { convert, .. } => match convert(trimmed) {
            Some(v) => Coercion::Parsed(v),
            None => Coercion::Unparsed { fallback: None },
        },
    }
}

/// Lenient boolean conversion: anything unrecognised is `false`.
pub fn coerce_bool(raw: &str) -> bool {
    parse_bool(raw.trim()).unwrap_or(false)
}

fn numeric(parsed: Option<Value>, zero: Value) -> Coercion {
    match parsed {
        Some(v) => Coercion::Parsed(v),
        None => Coercion::Unparsed {
            fallback: Some(zero),
        },
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.is_empty() {
        return Some(false);
    }
    for (word, value) in [
        ("yes", true),
        ("on", true),
        ("true", true),
        ("no", false),
        ("off", false),
        ("false", false),
    ] {
        if text.eq_ignore_ascii_case(word) {
            return Some(value);
        }
    }
    None
}
