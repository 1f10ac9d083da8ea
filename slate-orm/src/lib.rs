//! # Slate ORM
//!
//! A small, blocking object-relational mapper for PostgreSQL and SQLite.
//!
//! Tables are declared as structs with `#[derive(Model)]`. The library turns
//! their schemas into DDL, builds select/insert/update/delete statements with
//! the values embedded as escaped literals, and runs them through a driver
//! connection. Everything dialect-specific sits behind [`SqlAdapter`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use slate_orm::{DbUrl, Engine, Model, Op};
//!
//! #[derive(Model, Debug, Clone, PartialEq)]
//! struct User {
//!     #[orm(primary_key, autoincrement)]
//!     id: Option<i64>,
//!     #[orm(unique)]
//!     email: String,
//!     #[orm(default = 18)]
//!     age: Option<i64>,
//! }
//!
//! let mut engine = Engine::builder(DbUrl::sqlite_memory())
//!     .version(1)
//!     .on_create(|create| {
//!         create.create::<User>()?;
//!         Ok(())
//!     })
//!     .connect()?;
//!
//! let mut session = engine.session()?;
//! let user = User { id: None, email: "a@x.io".into(), age: Some(30) };
//! let ids = session.insert_item(&user).commit()?;
//! let adults = session.query::<User>().filter("age", Op::Ge, 18).all()?;
//! ```

// Lets `#[derive(Model)]` refer to `::slate_orm` from inside this crate.
extern crate self as slate_orm;

pub use slate_orm_macro::Model;

pub mod adapter;
pub mod column;
pub mod column_type;
pub mod dml;
pub mod drivers;
pub mod engine;
pub mod errors;
pub mod migration;
pub mod model;
pub mod session;
pub mod value;

pub use adapter::{ColumnInfo, ConstraintInfo, PostgresAdapter, SqlAdapter, SqliteAdapter};
pub use column::{Column, ForeignKey, ReferentialAction};
pub use column_type::{ColumnType, DefaultValueProvider, Literal, Now};
pub use dml::{Delete, Insert, Op, Query, TableInfo, Update};
pub use drivers::{Connection, DbUrl, Driver};
pub use engine::{Engine, EngineBuilder, EngineState, OrmDbVersion};
pub use errors::{Error, Result};
pub use migration::{CreateTable, Migration};
pub use model::{Entity, Model, Record, Schema};
pub use session::{Executor, Session};
pub use value::{FieldType, Value, ValueKind};
