//! Identifier values and their three-way comparison.
//!
//! An [`IdValue`] is the key a source sorts its records by. Comparison follows
//! the ordering a document store applies to its primary key index: numbers of
//! any width compare by value, strings byte-wise, documents field by field.
//! Values of different shapes are never coerced; comparing them is an error.

use std::cmp::Ordering;
use std::fmt;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::ComparisonTypeError;

/// The shape of an identifier.
///
/// Two identifiers are mutually comparable only when they have the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Null,
    Number,
    String,
    Document,
    Array,
    Binary,
    ObjectId,
    Bool,
    DateTime,
    Timestamp,
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdKind::Null => "null",
            IdKind::Number => "number",
            IdKind::String => "string",
            IdKind::Document => "document",
            IdKind::Array => "array",
            IdKind::Binary => "binary",
            IdKind::ObjectId => "objectId",
            IdKind::Bool => "bool",
            IdKind::DateTime => "date",
            IdKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A single record identifier read from a source.
#[derive(Debug, Clone, PartialEq)]
pub enum IdValue {
    Null,
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    /// Embedded document, fields in stored order.
    Document(Vec<(String, IdValue)>),
    Array(Vec<IdValue>),
    Binary {
        subtype: u8,
        bytes: Vec<u8>,
    },
    ObjectId([u8; 12]),
    Bool(bool),
    /// Milliseconds since the Unix epoch.
    DateTime(i64),
    Timestamp {
        time: u32,
        increment: u32,
    },
}

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl IdValue {
    pub fn kind(&self) -> IdKind {
        match self {
            IdValue::Null => IdKind::Null,
            IdValue::Int32(_) | IdValue::Int64(_) | IdValue::Double(_) => IdKind::Number,
            IdValue::String(_) => IdKind::String,
            IdValue::Document(_) => IdKind::Document,
            IdValue::Array(_) => IdKind::Array,
            IdValue::Binary { .. } => IdKind::Binary,
            IdValue::ObjectId(_) => IdKind::ObjectId,
            IdValue::Bool(_) => IdKind::Bool,
            IdValue::DateTime(_) => IdKind::DateTime,
            IdValue::Timestamp { .. } => IdKind::Timestamp,
        }
    }

    fn as_number(&self) -> Option<Number> {
        match self {
            IdValue::Int32(i) => Some(Number::Int(i64::from(*i))),
            IdValue::Int64(i) => Some(Number::Int(*i)),
            IdValue::Double(d) => Some(Number::Float(*d)),
            _ => None,
        }
    }

    /// Three-way comparison.
    ///
    /// Fails with [`ComparisonTypeError`] when the two values (or two values
    /// nested at the same position inside documents or arrays) have different
    /// kinds.
    pub fn try_cmp(&self, other: &IdValue) -> Result<Ordering, ComparisonTypeError> {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return Ok(compare_numbers(a, b));
        }

        let ord = match (self, other) {
            (IdValue::Null, IdValue::Null) => Ordering::Equal,
            (IdValue::String(a), IdValue::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (IdValue::Document(a), IdValue::Document(b)) => compare_documents(a, b)?,
            (IdValue::Array(a), IdValue::Array(b)) => compare_arrays(a, b)?,
            (
                IdValue::Binary {
                    subtype: sa,
                    bytes: ba,
                },
                IdValue::Binary {
                    subtype: sb,
                    bytes: bb,
                },
            ) => ba
                .len()
                .cmp(&bb.len())
                .then(sa.cmp(sb))
                .then_with(|| ba.cmp(bb)),
            (IdValue::ObjectId(a), IdValue::ObjectId(b)) => a.cmp(b),
            (IdValue::Bool(a), IdValue::Bool(b)) => a.cmp(b),
            (IdValue::DateTime(a), IdValue::DateTime(b)) => a.cmp(b),
            (
                IdValue::Timestamp {
                    time: ta,
                    increment: ia,
                },
                IdValue::Timestamp {
                    time: tb,
                    increment: ib,
                },
            ) => (ta, ia).cmp(&(tb, ib)),
            _ => return Err(ComparisonTypeError::new(self, other)),
        };
        Ok(ord)
    }
}

fn compare_numbers(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x.cmp(&y),
        (Number::Float(x), Number::Float(y)) => compare_doubles(x, y),
        (Number::Int(x), Number::Float(y)) => compare_int_double(x, y),
        (Number::Float(x), Number::Int(y)) => compare_int_double(y, x).reverse(),
    }
}

// NaN sorts below every other number and equal to itself; -0.0 equals 0.0.
fn compare_doubles(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) if x == y => Ordering::Equal,
        (false, false) => x.total_cmp(&y),
    }
}

// Exact comparison without rounding x through f64.
fn compare_int_double(x: i64, y: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

    if y.is_nan() {
        return Ordering::Greater;
    }
    if y >= TWO_POW_63 {
        return Ordering::Less;
    }
    if y < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let floor = y.floor();
    match x.cmp(&(floor as i64)) {
        Ordering::Equal if y > floor => Ordering::Less,
        ord => ord,
    }
}

fn compare_documents(
    a: &[(String, IdValue)],
    b: &[(String, IdValue)],
) -> Result<Ordering, ComparisonTypeError> {
    // Element kind first, then field name, then value.
    for ((key_a, value_a), (key_b, value_b)) in a.iter().zip(b) {
        if value_a.kind() != value_b.kind() {
            return Err(ComparisonTypeError::new(value_a, value_b));
        }
        let ord = key_a.as_bytes().cmp(key_b.as_bytes());
        if ord != Ordering::Equal {
            return Ok(ord);
        }
        let ord = value_a.try_cmp(value_b)?;
        if ord != Ordering::Equal {
            return Ok(ord);
        }
    }
    Ok(a.len().cmp(&b.len()))
}

fn compare_arrays(a: &[IdValue], b: &[IdValue]) -> Result<Ordering, ComparisonTypeError> {
    for (value_a, value_b) in a.iter().zip(b) {
        if value_a.kind() != value_b.kind() {
            return Err(ComparisonTypeError::new(value_a, value_b));
        }
        let ord = value_a.try_cmp(value_b)?;
        if ord != Ordering::Equal {
            return Ok(ord);
        }
    }
    Ok(a.len().cmp(&b.len()))
}

/// Renders the value the way a document-store shell prints it, e.g.
/// `"abc"`, `NumberLong(7)`, `ObjectId("...")`.
impl fmt::Display for IdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdValue::Null => f.write_str("null"),
            IdValue::Int32(i) => write!(f, "{i}"),
            IdValue::Int64(i) => write!(f, "NumberLong({i})"),
            IdValue::Double(d) if d.is_nan() => f.write_str("NaN"),
            IdValue::Double(d) if d.is_infinite() && *d > 0.0 => f.write_str("Infinity"),
            IdValue::Double(d) if d.is_infinite() => f.write_str("-Infinity"),
            IdValue::Double(d) => write!(f, "{d}"),
            IdValue::String(s) => write!(f, "{}", serde_json::Value::from(s.as_str())),
            IdValue::Document(fields) => {
                if fields.is_empty() {
                    return f.write_str("{ }");
                }
                f.write_str("{ ")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} : {value}", serde_json::Value::from(key.as_str()))?;
                }
                f.write_str(" }")
            }
            IdValue::Array(items) => {
                if items.is_empty() {
                    return f.write_str("[ ]");
                }
                f.write_str("[ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(" ]")
            }
            IdValue::Binary { subtype, bytes } => write!(
                f,
                "BinData({subtype},\"{}\")",
                base64::engine::general_purpose::STANDARD.encode(bytes)
            ),
            IdValue::ObjectId(bytes) => {
                f.write_str("ObjectId(\"")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                f.write_str("\")")
            }
            IdValue::Bool(b) => write!(f, "{b}"),
            IdValue::DateTime(ms) => match DateTime::<Utc>::from_timestamp_millis(*ms) {
                Some(dt) => write!(f, "ISODate(\"{}\")", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
                None => write!(f, "new Date({ms})"),
            },
            IdValue::Timestamp { time, increment } => write!(f, "Timestamp({time}, {increment})"),
        }
    }
}

impl Serialize for IdValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<i32> for IdValue {
    fn from(i: i32) -> Self {
        IdValue::Int32(i)
    }
}

impl From<i64> for IdValue {
    fn from(i: i64) -> Self {
        IdValue::Int64(i)
    }
}

impl From<f64> for IdValue {
    fn from(d: f64) -> Self {
        IdValue::Double(d)
    }
}

impl From<&str> for IdValue {
    fn from(s: &str) -> Self {
        IdValue::String(s.to_string())
    }
}

impl From<String> for IdValue {
    fn from(s: String) -> Self {
        IdValue::String(s)
    }
}

impl From<bool> for IdValue {
    fn from(b: bool) -> Self {
        IdValue::Bool(b)
    }
}
