//! # Model Module
//!
//! This module defines the [`Model`] trait and the structures that describe a
//! table at runtime.
//!
//! ## Overview
//!
//! A model is a plain struct whose fields are the table's columns. Its table
//! layout is a [`Schema`], built once per type by [`Model::describe`] and cached
//! in a process-wide registry keyed by `TypeId`. Nothing is discovered by
//! scanning members at runtime.
//!
//! Moving data between a struct and the database always goes through a
//! [`Record`], an ordered value store bound to the schema. Every assignment to
//! a record checks nullability and the column type, so a record never holds a
//! value its column would reject.
//!
//! ## Automatic Implementation
//!
//! The `Model` trait is normally implemented with `#[derive(Model)]`:
//!
//! ```rust,ignore
//! use chrono::NaiveDateTime;
//! use slate_orm::Model;
//!
//! #[derive(Model, Debug, Clone, PartialEq)]
//! #[orm(table = "user")]
//! struct User {
//!     #[orm(primary_key, autoincrement)]
//!     id: Option<i64>,
//!
//!     #[orm(size = 120, unique)]
//!     email: String,
//!
//!     #[orm(default = 18)]
//!     age: Option<i64>,
//!
//!     #[orm(default_now)]
//!     create_at: Option<NaiveDateTime>,
//! }
//!
//! #[derive(Model, Debug, Clone, PartialEq)]
//! struct Project {
//!     #[orm(primary_key, autoincrement)]
//!     id: Option<i64>,
//!
//!     #[orm(foreign_key = "user::id", on_delete = "cascade")]
//!     user_id: i64,
//! }
//! ```
//!
//! ## Supported ORM Attributes
//!
//! - `#[orm(table = "name")]` - Table name (struct level, default: snake_case struct name)
//! - `#[orm(primary_key)]` - Marks the field as primary key
//! - `#[orm(autoincrement)]` - Lets the database generate the primary key
//! - `#[orm(unique)]` - Adds a UNIQUE constraint
//! - `#[orm(size = N)]` - Sets the VARCHAR size for string fields
//! - `#[orm(default = literal)]` - Constant default value
//! - `#[orm(default_now)]` - Current timestamp as default value
//! - `#[orm(name = "column")]` - Column name, when it differs from the field
//! - `#[orm(foreign_key = "table::column")]` - Foreign key to a parent table
//! - `#[orm(on_delete = "...")]`, `#[orm(on_update = "...")]` - Referential actions

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{
    any::TypeId,
    collections::{hash_map::Entry, BTreeMap, HashMap},
    sync::{OnceLock, PoisonError, RwLock},
};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    column::{Column, ForeignKey},
    errors::{Error, Result},
    value::{FieldType, Value},
};

// ============================================================================
// Schema
// ============================================================================

/// The layout of one table: ordered columns plus foreign keys.
#[derive(Debug, Clone)]
pub struct Schema {
    pub table_name: String,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self { table_name: table_name.into(), columns: Vec::new(), foreign_keys: Vec::new() }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Looks a column up by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// The first column whose type is a primary key.
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_primary_key())
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

// ============================================================================
// Schema Registry
// ============================================================================

type Registry = RwLock<HashMap<TypeId, &'static Schema>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Default::default)
}

/// Returns the cached schema of `M`, building it on first use.
///
/// Schemas live for the rest of the process; there is one per model type.
fn schema_of<M: Model>() -> &'static Schema {
    let id = TypeId::of::<M>();
    if let Some(schema) = registry().read().unwrap_or_else(PoisonError::into_inner).get(&id) {
        return *schema;
    }

    // Built outside the lock: a hand-written describe() may consult other models.
    let schema = M::describe();
    let mut guard = registry().write().unwrap_or_else(PoisonError::into_inner);
    match guard.entry(id) {
        Entry::Occupied(entry) => *entry.get(),
        Entry::Vacant(entry) => *entry.insert(Box::leak(Box::new(schema))),
    }
}

// ============================================================================
// Record
// ============================================================================

/// Ordered field values of one row, bound to a schema.
#[derive(Debug, Clone)]
pub struct Record {
    schema: &'static Schema,
    values: Vec<Value>,
}

impl Record {
    /// A record with every field set to `NULL`.
    pub fn new(schema: &'static Schema) -> Self {
        Self { schema, values: vec![Value::Null; schema.columns.len()] }
    }

    /// Builds a record from a driver row in column order.
    ///
    /// Each value goes through its column type's coercion first, so `0`/`1`
    /// booleans and textual timestamps arrive as proper values.
    pub fn from_row(schema: &'static Schema, row: Vec<Value>) -> Result<Self> {
        if row.len() != schema.columns.len() {
            return Err(Error::Conversion(format!(
                "row for table {} has {} values, expected {}",
                schema.table_name,
                row.len(),
                schema.columns.len()
            )));
        }

        let mut record = Record::new(schema);
        for (column, value) in schema.columns.iter().zip(row) {
            let value = column.column_type.coerce(value)?;
            record.set(&column.name, value)?;
        }
        Ok(record)
    }

    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Assigns a field.
    ///
    /// # Errors
    ///
    /// `Validation` when the column is unknown, when `NULL` goes to a
    /// non-nullable column, or when the value's kind is not admitted by the
    /// column type.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let index = self.schema.column_index(name).ok_or_else(|| {
            Error::Validation(format!("table {} has no column {}", self.schema.table_name, name))
        })?;
        let column = &self.schema.columns[index];

        if value.is_null() {
            if !column.nullable {
                return Err(Error::Validation(format!(
                    "column {}.{} is not nullable",
                    self.schema.table_name, column.name
                )));
            }
        } else if !column.column_type.validate(&value) {
            return Err(Error::Validation(format!(
                "value {:?} is not valid for column {}.{}",
                value, self.schema.table_name, column.name
            )));
        }

        self.values[index] = value;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.column_index(name).map(|index| &self.values[index])
    }

    /// Reads a field as a typed value.
    pub fn field<T: FieldType>(&self, name: &str) -> Result<T> {
        let value = self.get(name).cloned().ok_or_else(|| {
            Error::Validation(format!("table {} has no column {}", self.schema.table_name, name))
        })?;

        T::from_value(value).map_err(|err| match err {
            Error::Validation(msg) => Error::Validation(format!("{}.{}: {}", self.schema.table_name, name, msg)),
            other => other,
        })
    }

    /// Column name to value, for comparisons and debugging.
    pub fn as_map(&self) -> BTreeMap<String, Value> {
        self.schema.columns.iter().map(|c| c.name.clone()).zip(self.values.iter().cloned()).collect()
    }
}

// ============================================================================
// Model Trait
// ============================================================================

/// A struct mapped to a database table.
///
/// # Required Methods
///
/// * `describe()` - Builds the table schema (called once per type)
/// * `to_record()` - Copies the fields into a validated [`Record`]
/// * `from_record()` - Builds an instance from a [`Record`]
///
/// Everything else is provided on top of these.
///
/// # Example Manual Implementation
///
/// ```rust,ignore
/// use slate_orm::{Column, ColumnType, Model, Record, Result, Schema};
///
/// struct Tag {
///     id: Option<i64>,
///     label: String,
/// }
///
/// impl Model for Tag {
///     fn describe() -> Schema {
///         Schema::new("tag")
///             .with_column(Column::new("id", ColumnType::primary_key(ColumnType::integer(), true)))
///             .with_column(Column::new("label", ColumnType::string()).nullable(false))
///     }
///
///     fn to_record(&self) -> Result<Record> {
///         let mut record = Record::new(Self::schema());
///         record.set("id", self.id)?;
///         record.set("label", self.label.as_str())?;
///         Ok(record)
///     }
///
///     fn from_record(record: &Record) -> Result<Self> {
///         Ok(Tag { id: record.field("id")?, label: record.field("label")? })
///     }
/// }
/// ```
pub trait Model: Sized + 'static {
    /// Builds the table schema. Prefer [`Model::schema`], which caches it.
    fn describe() -> Schema;

    fn to_record(&self) -> Result<Record>;

    fn from_record(record: &Record) -> Result<Self>;

    fn schema() -> &'static Schema {
        schema_of::<Self>()
    }

    fn table_name() -> &'static str {
        &Self::schema().table_name
    }

    fn columns() -> &'static [Column] {
        &Self::schema().columns
    }

    fn foreign_keys() -> &'static [ForeignKey] {
        &Self::schema().foreign_keys
    }

    fn primary_key_column() -> Option<&'static Column> {
        Self::schema().primary_key()
    }

    /// Builds an instance from column name/value pairs, validating each.
    /// Missing columns are `NULL`.
    fn from_values<I, K, V>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = Record::new(Self::schema());
        for (name, value) in values {
            record.set(name.as_ref(), value)?;
        }
        Self::from_record(&record)
    }

    fn as_map(&self) -> Result<BTreeMap<String, Value>> {
        Ok(self.to_record()?.as_map())
    }
}

// ============================================================================
// Entity
// ============================================================================

/// Object-safe view of a model instance.
///
/// Lets one insert batch carry `&dyn Entity` items and still detect when they
/// are of different concrete types.
pub trait Entity {
    fn model_type(&self) -> TypeId;

    fn entity_schema(&self) -> &'static Schema;

    fn record(&self) -> Result<Record>;
}

impl<M: Model> Entity for M {
    fn model_type(&self) -> TypeId {
        TypeId::of::<M>()
    }

    fn entity_schema(&self) -> &'static Schema {
        M::schema()
    }

    fn record(&self) -> Result<Record> {
        self.to_record()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_type::{ColumnType, Literal};

    #[derive(Debug, PartialEq)]
    struct Tag {
        id: Option<i64>,
        label: String,
        pinned: Option<bool>,
    }

    impl Model for Tag {
        fn describe() -> Schema {
            Schema::new("tag")
                .with_column(Column::new("id", ColumnType::primary_key(ColumnType::integer(), true)))
                .with_column(Column::new("label", ColumnType::string().with_length(40)).nullable(false))
                .with_column(Column::new("pinned", ColumnType::boolean().with_default(Literal::new(false))))
        }

        fn to_record(&self) -> Result<Record> {
            let mut record = Record::new(Self::schema());
            record.set("id", self.id)?;
            record.set("label", self.label.as_str())?;
            record.set("pinned", self.pinned)?;
            Ok(record)
        }

        fn from_record(record: &Record) -> Result<Self> {
            Ok(Tag { id: record.field("id")?, label: record.field("label")?, pinned: record.field("pinned")? })
        }
    }

    #[test]
    fn test_schema_is_cached() {
        assert!(std::ptr::eq(Tag::schema(), Tag::schema()));
        assert_eq!(Tag::table_name(), "tag");
        assert_eq!(Tag::primary_key_column().map(|c| c.name.as_str()), Some("id"));
        assert!(Tag::foreign_keys().is_empty());
    }

    #[test]
    fn test_record_rejects_bad_assignments() {
        let mut record = Record::new(Tag::schema());
        assert!(matches!(record.set("label", Value::Null), Err(Error::Validation(_))));
        assert!(matches!(record.set("label", 5i64), Err(Error::Validation(_))));
        assert!(matches!(record.set("nope", 1i64), Err(Error::Validation(_))));
        record.set("label", "ok").unwrap();
        assert_eq!(record.get("label"), Some(&Value::from("ok")));
    }

    #[test]
    fn test_from_row_coerces_driver_values() {
        let row = vec![Value::Integer(4), Value::from("rust"), Value::Integer(1)];
        let tag = Tag::from_record(&Record::from_row(Tag::schema(), row).unwrap()).unwrap();
        assert_eq!(tag, Tag { id: Some(4), label: "rust".to_string(), pinned: Some(true) });

        let short = vec![Value::Integer(4)];
        assert!(matches!(Record::from_row(Tag::schema(), short), Err(Error::Conversion(_))));
    }

    #[test]
    fn test_from_values_and_as_map() {
        let tag = Tag::from_values([("label", Value::from("db")), ("pinned", Value::Boolean(true))]).unwrap();
        assert_eq!(tag.id, None);

        let map = tag.as_map().unwrap();
        assert_eq!(map["label"], Value::from("db"));
        assert_eq!(map["id"], Value::Null);

        let missing = Tag::from_values(Vec::<(&str, Value)>::new()).unwrap_err();
        assert!(missing.to_string().contains("tag.label"), "{}", missing);
    }

    #[derive(crate::Model, Debug, PartialEq)]
    struct Note {
        #[orm(primary_key)]
        code: String,
        #[orm(name = "body_text", default = "")]
        body: Option<String>,
    }

    #[test]
    fn test_derived_model_inside_crate() {
        use crate::adapter::PostgresAdapter;

        assert_eq!(Note::table_name(), "note");
        assert_eq!(note_fields::BODY_TEXT, "body_text");

        let sql = Note::columns().iter().map(|c| c.render_sql(&PostgresAdapter).unwrap()).collect::<Vec<_>>();
        assert_eq!(sql, vec![r#""code" VARCHAR(255) PRIMARY KEY"#, r#""body_text" VARCHAR(255) DEFAULT ''"#]);

        let note = Note { code: "n1".to_string(), body: None };
        assert_eq!(Note::from_record(&note.to_record().unwrap()).unwrap(), note);
    }

    #[test]
    fn test_entity_reports_concrete_type() {
        let tag = Tag { id: None, label: "x".to_string(), pinned: None };
        let entity: &dyn Entity = &tag;
        assert_eq!(entity.model_type(), TypeId::of::<Tag>());
        assert_eq!(entity.entity_schema().table_name, "tag");
    }
}
