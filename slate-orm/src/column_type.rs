//! # Column Type Module
//!
//! Describes what a column can hold and how it is spelled in each dialect.
//!
//! A [`ColumnType`] knows:
//!
//! - which value kinds it admits ([`ColumnType::validate`])
//! - how raw driver values are fixed up before validation ([`ColumnType::coerce`])
//! - its SQL keyword(s), including an optional `DEFAULT` clause ([`ColumnType::render_type`])
//! - how a value becomes a literal inside a statement ([`ColumnType::render_insert_value`])
//!
//! Defaults are [`DefaultValueProvider`]s and are rendered against the adapter
//! in use, so a "now" default produces `now()` on PostgreSQL and
//! `CURRENT_TIMESTAMP` on SQLite.

use std::{fmt, sync::Arc};

use crate::{
    adapter::SqlAdapter,
    errors::{Error, Result},
    value::{parse_timestamp, Value, ValueKind},
};

// ============================================================================
// Default Value Providers
// ============================================================================

/// Produces the SQL text that follows `DEFAULT` in a column definition.
///
/// Invoked every time the column SQL is generated, never at declaration time.
pub trait DefaultValueProvider: fmt::Debug + Send + Sync {
    fn render(&self, adapter: &dyn SqlAdapter) -> String;

    /// The constant behind this default, if it is one. Constants are checked
    /// against the column type before they are rendered.
    fn literal(&self) -> Option<&Value> {
        None
    }
}

/// A constant default, rendered as a dialect literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal(pub Value);

impl Literal {
    pub fn new(value: impl Into<Value>) -> Self {
        Literal(value.into())
    }
}

impl DefaultValueProvider for Literal {
    fn render(&self, adapter: &dyn SqlAdapter) -> String {
        adapter.render_literal(&self.0)
    }

    fn literal(&self) -> Option<&Value> {
        Some(&self.0)
    }
}

/// The current timestamp, spelled the way the dialect spells it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Now;

impl DefaultValueProvider for Now {
    fn render(&self, adapter: &dyn SqlAdapter) -> String {
        adapter.datetime_now().to_string()
    }
}

type DefaultSlot = Option<Arc<dyn DefaultValueProvider>>;

// ============================================================================
// Column Type
// ============================================================================

/// The type of a column.
#[derive(Debug, Clone)]
pub enum ColumnType {
    Boolean { default: DefaultSlot },
    Integer { default: DefaultSlot },
    /// `len` is honoured by dialects with a sized string type (`VARCHAR(len)`).
    String { len: usize, default: DefaultSlot },
    Datetime { default: DefaultSlot },
    PrimaryKey { inner: Box<ColumnType>, autoincrement: bool },
}

/// Length used for string columns declared without one.
pub const DEFAULT_STRING_LENGTH: usize = 255;

impl ColumnType {
    pub fn boolean() -> Self {
        ColumnType::Boolean { default: None }
    }

    pub fn integer() -> Self {
        ColumnType::Integer { default: None }
    }

    pub fn string() -> Self {
        ColumnType::String { len: DEFAULT_STRING_LENGTH, default: None }
    }

    pub fn datetime() -> Self {
        ColumnType::Datetime { default: None }
    }

    /// Wraps `inner` as the table's primary key.
    ///
    /// Whether `inner` may be auto-incremented is only checked when the SQL is
    /// generated, see [`ColumnType::render_type`].
    pub fn primary_key(inner: ColumnType, autoincrement: bool) -> Self {
        ColumnType::PrimaryKey { inner: Box::new(inner), autoincrement }
    }

    /// Sets the default value. On a primary key the default goes to the
    /// wrapped type.
    pub fn with_default(self, provider: impl DefaultValueProvider + 'static) -> Self {
        let provider: Arc<dyn DefaultValueProvider> = Arc::new(provider);
        self.set_default(Some(provider))
    }

    fn set_default(self, default: DefaultSlot) -> Self {
        match self {
            ColumnType::Boolean { .. } => ColumnType::Boolean { default },
            ColumnType::Integer { .. } => ColumnType::Integer { default },
            ColumnType::String { len, .. } => ColumnType::String { len, default },
            ColumnType::Datetime { .. } => ColumnType::Datetime { default },
            ColumnType::PrimaryKey { inner, autoincrement } => {
                ColumnType::PrimaryKey { inner: Box::new(inner.set_default(default)), autoincrement }
            }
        }
    }

    /// Changes the length of a string column. Other types are returned as is.
    pub fn with_length(self, len: usize) -> Self {
        match self {
            ColumnType::String { default, .. } => ColumnType::String { len, default },
            ColumnType::PrimaryKey { inner, autoincrement } => {
                ColumnType::PrimaryKey { inner: Box::new(inner.with_length(len)), autoincrement }
            }
            other => other,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self, ColumnType::PrimaryKey { .. })
    }

    /// True for a primary key whose values the database generates.
    pub fn is_autoincrement(&self) -> bool {
        match self {
            ColumnType::PrimaryKey { inner, autoincrement } => *autoincrement && inner.supports_autoincrement(),
            _ => false,
        }
    }

    fn supports_autoincrement(&self) -> bool {
        matches!(self, ColumnType::Integer { .. })
    }

    fn default(&self) -> Option<&Arc<dyn DefaultValueProvider>> {
        match self {
            ColumnType::Boolean { default }
            | ColumnType::Integer { default }
            | ColumnType::String { default, .. }
            | ColumnType::Datetime { default } => default.as_ref(),
            ColumnType::PrimaryKey { .. } => None,
        }
    }

    /// The value kinds this type accepts.
    pub fn admissible(&self) -> &'static [ValueKind] {
        match self {
            ColumnType::Boolean { .. } => &[ValueKind::Boolean],
            ColumnType::Integer { .. } => &[ValueKind::Integer],
            ColumnType::String { .. } => &[ValueKind::Text],
            ColumnType::Datetime { .. } => &[ValueKind::Timestamp],
            ColumnType::PrimaryKey { inner, .. } => inner.admissible(),
        }
    }

    /// True iff the value's kind is admissible. `NULL` is never valid here;
    /// nullability belongs to the column.
    pub fn validate(&self, value: &Value) -> bool {
        value.kind().is_some_and(|kind| self.admissible().contains(&kind))
    }

    /// Fixes up a raw driver value before validation.
    ///
    /// Booleans arrive as `0`/`1` from SQLite and timestamps as text, so both
    /// are converted here. An integer other than `0` or `1` headed for a
    /// boolean column is rejected rather than guessed.
    pub fn coerce(&self, value: Value) -> Result<Value> {
        match (self, value) {
            (ColumnType::PrimaryKey { inner, .. }, value) => inner.coerce(value),
            (ColumnType::Boolean { .. }, Value::Integer(i)) => match i {
                0 => Ok(Value::Boolean(false)),
                1 => Ok(Value::Boolean(true)),
                other => Err(Error::Validation(format!("integer {} is not a boolean (expected 0 or 1)", other))),
            },
            (ColumnType::Boolean { .. }, Value::Text(text)) => match text.as_str() {
                "t" | "true" | "TRUE" => Ok(Value::Boolean(true)),
                "f" | "false" | "FALSE" => Ok(Value::Boolean(false)),
                _ => Ok(Value::Text(text)),
            },
            (ColumnType::Datetime { .. }, Value::Text(text)) => match parse_timestamp(&text) {
                Some(ts) => Ok(Value::Timestamp(ts)),
                None => Ok(Value::Text(text)),
            },
            (_, value) => Ok(value),
        }
    }

    /// Renders the type keyword(s), followed by `DEFAULT ...` when a default
    /// is configured.
    ///
    /// # Errors
    ///
    /// `AutoincrementType` when an autoincrement primary key wraps anything
    /// other than an integer, `Validation` when a constant default does not fit
    /// the type.
    pub fn render_type(&self, adapter: &dyn SqlAdapter) -> Result<String> {
        let mut sql = match self {
            ColumnType::Boolean { .. } => adapter.boolean_column().to_string(),
            ColumnType::Integer { .. } => adapter.integer_column().to_string(),
            ColumnType::String { len, .. } => adapter.string_column(*len),
            ColumnType::Datetime { .. } => adapter.timestamp_column().to_string(),
            ColumnType::PrimaryKey { inner, autoincrement } => {
                if *autoincrement && !inner.supports_autoincrement() {
                    return Err(Error::AutoincrementType(format!(
                        "autoincrement primary key must wrap an integer, got {}",
                        inner.describe()
                    )));
                }

                // An empty keyword leaves the column on its own type, which is
                // how SQLite spells a rowid alias.
                let head = match adapter.autoincrement() {
                    keyword if *autoincrement && !keyword.is_empty() => keyword.to_string(),
                    _ => inner.render_type(adapter)?,
                };
                return Ok(format!("{} {}", head, adapter.primary_key()));
            }
        };

        if let Some(default) = self.default() {
            if let Some(value) = default.literal().filter(|v| !v.is_null() && !self.validate(v)) {
                return Err(Error::Validation(format!(
                    "default {:?} is not valid for a {} column",
                    value,
                    self.describe()
                )));
            }
            sql.push(' ');
            sql.push_str(adapter.default_keyword());
            sql.push(' ');
            sql.push_str(&default.render(adapter));
        }

        Ok(sql)
    }

    /// Renders `value` as a literal for this column.
    ///
    /// A `NULL` for an autoincrement primary key becomes the dialect's
    /// "generate it" token.
    pub fn render_insert_value(&self, value: &Value, adapter: &dyn SqlAdapter) -> Result<String> {
        if value.is_null() && self.is_autoincrement() {
            return Ok(adapter.autoincrement_default().to_string());
        }

        if !value.is_null() && !self.validate(value) {
            return Err(Error::Validation(format!("value {:?} is not valid for a {} column", value, self.describe())));
        }

        Ok(adapter.render_literal(value))
    }

    fn describe(&self) -> &'static str {
        match self {
            ColumnType::Boolean { .. } => "boolean",
            ColumnType::Integer { .. } => "integer",
            ColumnType::String { .. } => "string",
            ColumnType::Datetime { .. } => "datetime",
            ColumnType::PrimaryKey { .. } => "primary key",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{PostgresAdapter, SqliteAdapter};
    use chrono::NaiveDate;

    fn adapters() -> Vec<Box<dyn SqlAdapter>> {
        vec![Box::new(PostgresAdapter), Box::new(SqliteAdapter)]
    }

    fn samples() -> Vec<(ColumnType, Value)> {
        let ts = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        vec![
            (ColumnType::boolean(), Value::Boolean(true)),
            (ColumnType::integer(), Value::Integer(42)),
            (ColumnType::string(), Value::from("it's")),
            (ColumnType::datetime(), Value::Timestamp(ts)),
            (ColumnType::primary_key(ColumnType::integer(), true), Value::Integer(7)),
        ]
    }

    #[test]
    fn test_valid_values_render_as_adapter_literals() {
        for adapter in adapters() {
            for (column_type, value) in samples() {
                assert!(column_type.validate(&value));
                assert_eq!(
                    column_type.render_insert_value(&value, adapter.as_ref()).unwrap(),
                    adapter.render_literal(&value)
                );
            }
        }
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        let adapter = PostgresAdapter;
        let wrong = [
            (ColumnType::boolean(), Value::from("yes")),
            (ColumnType::integer(), Value::Boolean(true)),
            (ColumnType::string(), Value::Integer(1)),
            (ColumnType::datetime(), Value::from("2023-01-02")),
            (ColumnType::primary_key(ColumnType::integer(), false), Value::from("1")),
        ];
        for (column_type, value) in wrong {
            assert!(!column_type.validate(&value));
            let err = column_type.render_insert_value(&value, &adapter).unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{:?}", err);
        }
    }

    #[test]
    fn test_null_renders_null_keyword() {
        let adapter = SqliteAdapter;
        assert_eq!(ColumnType::integer().render_insert_value(&Value::Null, &adapter).unwrap(), "NULL");
    }

    #[test]
    fn test_autoincrement_requires_integer() {
        let adapter = PostgresAdapter;
        let ok = ColumnType::primary_key(ColumnType::integer(), true);
        assert_eq!(ok.render_type(&adapter).unwrap(), "SERIAL PRIMARY KEY");

        let bad = ColumnType::primary_key(ColumnType::string(), true);
        assert!(matches!(bad.render_type(&adapter), Err(Error::AutoincrementType(_))));
    }

    #[test]
    fn test_primary_key_rendering_per_dialect() {
        let serial = ColumnType::primary_key(ColumnType::integer(), true);
        assert_eq!(serial.render_type(&SqliteAdapter).unwrap(), "INTEGER PRIMARY KEY");

        let natural = ColumnType::primary_key(ColumnType::string().with_length(36), false);
        assert_eq!(natural.render_type(&PostgresAdapter).unwrap(), "VARCHAR(36) PRIMARY KEY");
        assert_eq!(natural.render_type(&SqliteAdapter).unwrap(), "TEXT PRIMARY KEY");
    }

    #[test]
    fn test_autoincrement_null_uses_dialect_token() {
        let pk = ColumnType::primary_key(ColumnType::integer(), true);
        assert_eq!(pk.render_insert_value(&Value::Null, &PostgresAdapter).unwrap(), "DEFAULT");
        assert_eq!(pk.render_insert_value(&Value::Null, &SqliteAdapter).unwrap(), "NULL");
    }

    #[test]
    fn test_boolean_default_parity() {
        let column_type = ColumnType::boolean().with_default(Literal::new(true));
        assert_eq!(column_type.render_type(&PostgresAdapter).unwrap(), "BOOLEAN DEFAULT 't'");
        assert_eq!(column_type.render_type(&SqliteAdapter).unwrap(), "INTEGER DEFAULT 1");
    }

    #[test]
    fn test_now_default_is_rendered_per_dialect() {
        let column_type = ColumnType::datetime().with_default(Now);
        assert_eq!(column_type.render_type(&PostgresAdapter).unwrap(), "TIMESTAMP DEFAULT now()");
        assert_eq!(column_type.render_type(&SqliteAdapter).unwrap(), "TIMESTAMP DEFAULT CURRENT_TIMESTAMP");
    }

    #[test]
    fn test_string_default_and_length() {
        let column_type = ColumnType::string().with_length(1).with_default(Literal::new("s"));
        assert_eq!(column_type.render_type(&PostgresAdapter).unwrap(), "VARCHAR(1) DEFAULT 's'");
    }

    #[test]
    fn test_default_must_match_column_type() {
        let mismatched = [
            ColumnType::integer().with_default(Literal::new("x")),
            ColumnType::boolean().with_default(Literal::new(3i64)),
            ColumnType::string().with_default(Literal::new(true)),
            ColumnType::datetime().with_default(Literal::new("tomorrow")),
        ];
        for column_type in mismatched {
            for adapter in adapters() {
                assert!(matches!(column_type.render_type(adapter.as_ref()), Err(Error::Validation(_))));
            }
        }

        let null = ColumnType::integer().with_default(Literal(Value::Null));
        assert_eq!(null.render_type(&PostgresAdapter).unwrap(), "INT DEFAULT NULL");
    }

    #[test]
    fn test_boolean_coercion_boundaries() {
        let column_type = ColumnType::boolean();
        assert_eq!(column_type.coerce(Value::Integer(0)).unwrap(), Value::Boolean(false));
        assert_eq!(column_type.coerce(Value::Integer(1)).unwrap(), Value::Boolean(true));
        // Anything else used to be read as `false`; it is now an error.
        assert!(matches!(column_type.coerce(Value::Integer(5)), Err(Error::Validation(_))));
        assert!(matches!(column_type.coerce(Value::Integer(-1)), Err(Error::Validation(_))));
        assert_eq!(column_type.coerce(Value::Boolean(true)).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_datetime_coercion_parses_text() {
        let coerced = ColumnType::datetime().coerce(Value::from("2024-05-06 07:08:09")).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(7, 8, 9).unwrap();
        assert_eq!(coerced, Value::Timestamp(expected));

        let untouched = ColumnType::datetime().coerce(Value::from("soon")).unwrap();
        assert_eq!(untouched, Value::from("soon"));
    }

    #[test]
    fn test_integer_coercion_is_identity() {
        assert_eq!(ColumnType::integer().coerce(Value::Integer(9)).unwrap(), Value::Integer(9));
    }
}
