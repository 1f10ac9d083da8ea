//! # Value Module
//!
//! Runtime values exchanged with drivers and rendered into SQL, plus the
//! [`FieldType`] trait that connects typed struct fields to them.
//!
//! Rows coming back from a driver are plain [`Value`]s. They only become typed
//! model fields after passing through the column type's coercion and the
//! field's `FieldType::from_value`.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};

use crate::{
    column_type::ColumnType,
    errors::{Error, Result},
};

/// Text layout of timestamps inside SQL literals. Microseconds are the finest
/// precision PostgreSQL `TIMESTAMP` keeps.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Drops sub-microsecond precision so stored and re-read timestamps compare equal.
pub(crate) fn truncate_to_micros(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(ts.nanosecond() / 1_000 * 1_000).unwrap_or(ts)
}

/// Parses the timestamp layouts drivers hand back as text.
///
/// Accepts both a space and a `T` between date and time, with or without
/// fractional seconds.
pub(crate) fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, TIMESTAMP_PARSE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

// ============================================================================
// Value
// ============================================================================

/// A single SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    /// Only produced by drivers; no column type admits it.
    Real(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

/// The kind of a non-null [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Integer,
    Real,
    Text,
    Timestamp,
}

impl Value {
    /// Returns the kind of this value, or `None` for `NULL`.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(ValueKind::Boolean),
            Value::Integer(_) => Some(ValueKind::Integer),
            Value::Real(_) => Some(ValueKind::Real),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Timestamp(_) => Some(ValueKind::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(truncate_to_micros(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// ============================================================================
// FieldType
// ============================================================================

/// Maps a Rust field type onto a column.
///
/// The derive macro relies on this trait instead of inspecting type names:
/// the column type, the nullability and both directions of the value
/// conversion all come from here. `Option<T>` makes any supported type
/// nullable.
pub trait FieldType: Sized {
    /// Whether the column accepts `NULL`.
    const NULLABLE: bool = false;

    /// The column type used when this field is declared without overrides.
    fn column_type() -> ColumnType;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(expected: &str, value: &Value) -> Error {
    match value {
        Value::Null => Error::Validation(format!("expected {}, got NULL on a non-nullable field", expected)),
        other => Error::Validation(format!("expected {}, got {:?}", expected, other)),
    }
}

impl FieldType for bool {
    fn column_type() -> ColumnType {
        ColumnType::boolean()
    }

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(mismatch("a boolean", &other)),
        }
    }
}

impl FieldType for i64 {
    fn column_type() -> ColumnType {
        ColumnType::integer()
    }

    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(mismatch("an integer", &other)),
        }
    }
}

impl FieldType for i32 {
    fn column_type() -> ColumnType {
        ColumnType::integer()
    }

    fn to_value(&self) -> Value {
        Value::Integer(i64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => {
                i32::try_from(i).map_err(|_| Error::Validation(format!("integer {} does not fit in i32", i)))
            }
            other => Err(mismatch("an integer", &other)),
        }
    }
}

impl FieldType for String {
    fn column_type() -> ColumnType {
        ColumnType::string()
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch("a string", &other)),
        }
    }
}

impl FieldType for NaiveDateTime {
    fn column_type() -> ColumnType {
        ColumnType::datetime()
    }

    fn to_value(&self) -> Value {
        Value::from(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            other => Err(mismatch("a timestamp", &other)),
        }
    }
}

impl<T: FieldType> FieldType for Option<T> {
    const NULLABLE: bool = true;

    fn column_type() -> ColumnType {
        T::column_type()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
