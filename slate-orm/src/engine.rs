//! # Engine Module
//!
//! The entry point: owns the connection and the dialect, and brings the
//! database schema to the application's version when it connects.
//!
//! ## Version Bootstrap
//!
//! The schema version lives in a one-row table, `orm_db_version`. On connect
//! the engine:
//!
//! 1. creates `orm_db_version` if it is missing
//! 2. when it holds no row, runs the create callback and stores the target version
//! 3. when the stored version differs from the target, runs the update
//!    callback with `(stored, target)` and stores the target version
//!
//! Callback errors are returned as they are. Work the callback already
//! committed stays committed.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use slate_orm::{DbUrl, Engine};
//!
//! let mut engine = Engine::builder(DbUrl::sqlite("app.db"))
//!     .version(1)
//!     .on_create(|create| {
//!         create.create::<User>()?;
//!         Ok(())
//!     })
//!     .connect()?;
//!
//! let users = engine.with_session(|session| session.query::<User>().all())?;
//! ```

use std::fmt;

use crate::{
    adapter::SqlAdapter,
    column::Column,
    column_type::ColumnType,
    drivers::{self, Connection, DbUrl, Driver},
    errors::Result,
    migration::{CreateTable, Migration},
    model::{Model, Record, Schema},
    session::{Executor, Session},
};

// ============================================================================
// Version Table
// ============================================================================

/// The single row of `orm_db_version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrmDbVersion {
    pub value: i64,
}

impl Model for OrmDbVersion {
    fn describe() -> Schema {
        Schema::new("orm_db_version").with_column(Column::new("value", ColumnType::integer()).nullable(false))
    }

    fn to_record(&self) -> Result<Record> {
        let mut record = Record::new(Self::schema());
        record.set("value", self.value)?;
        Ok(record)
    }

    fn from_record(record: &Record) -> Result<Self> {
        Ok(OrmDbVersion { value: record.field("value")? })
    }
}

// ============================================================================
// State
// ============================================================================

/// Where the engine is in its startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Disconnected,
    Connected,
    VersionTableEnsured,
    Migrated,
}

type CreateHook<'a> = Box<dyn FnOnce(&mut CreateTable<'_>) -> Result<()> + 'a>;
type UpdateHook<'a> = Box<dyn FnOnce(&mut Migration<'_>, i64, i64) -> Result<()> + 'a>;

// ============================================================================
// Builder
// ============================================================================

/// Configures and connects an [`Engine`].
pub struct EngineBuilder<'a> {
    url: DbUrl,
    version: i64,
    on_create: Option<CreateHook<'a>>,
    on_update: Option<UpdateHook<'a>>,
}

impl<'a> EngineBuilder<'a> {
    /// Target schema version. Defaults to `0`.
    pub fn version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    /// Called once, on a database without a stored version.
    pub fn on_create<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut CreateTable<'_>) -> Result<()> + 'a,
    {
        self.on_create = Some(Box::new(f));
        self
    }

    /// Called with `(stored, target)` when the stored version differs.
    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut Migration<'_>, i64, i64) -> Result<()> + 'a,
    {
        self.on_update = Some(Box::new(f));
        self
    }

    /// Connects and runs the version bootstrap.
    pub fn connect(self) -> Result<Engine> {
        let EngineBuilder { url, version, on_create, on_update } = self;

        let connection = drivers::connect(&url)?;
        let adapter = drivers::adapter_for(url.driver);
        let mut engine = Engine { url, version, state: EngineState::Disconnected, adapter, connection };
        engine.set_state(EngineState::Connected);

        engine.with_session(|session| {
            session.create_table().create::<OrmDbVersion>()?;
            Ok(())
        })?;
        engine.set_state(EngineState::VersionTableEnsured);

        engine.with_session(|session| {
            let stored = match session.query::<OrmDbVersion>().first()? {
                Some(row) => row.value,
                None => {
                    log::info!("No schema version stored, creating schema version {}", version);
                    if let Some(on_create) = on_create {
                        on_create(&mut session.create_table())?;
                    }
                    session.insert_item(&OrmDbVersion { value: version }).commit()?;
                    version
                }
            };

            if stored != version {
                log::info!("Migrating schema from version {} to {}", stored, version);
                if let Some(on_update) = on_update {
                    on_update(&mut session.migration(), stored, version)?;
                }
                session.update::<OrmDbVersion>().set("value", version).commit()?;
            }
            Ok(())
        })?;
        engine.set_state(EngineState::Migrated);

        Ok(engine)
    }
}

// ============================================================================
// Engine
// ============================================================================

/// A connected database at a known schema version.
pub struct Engine {
    url: DbUrl,
    version: i64,
    state: EngineState,
    adapter: Box<dyn SqlAdapter>,
    connection: Box<dyn Connection>,
}

impl Engine {
    pub fn builder<'a>(url: DbUrl) -> EngineBuilder<'a> {
        EngineBuilder { url, version: 0, on_create: None, on_update: None }
    }

    /// Connects at version `0` without callbacks.
    pub fn connect(url: DbUrl) -> Result<Engine> {
        Engine::builder(url).connect()
    }

    fn set_state(&mut self, state: EngineState) {
        log::info!("Engine state {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn driver(&self) -> Driver {
        self.url.driver
    }

    pub fn url(&self) -> &DbUrl {
        &self.url
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn adapter(&self) -> &dyn SqlAdapter {
        self.adapter.as_ref()
    }

    /// A connected session. Dropping it rolls back anything uncommitted.
    pub fn session(&mut self) -> Result<Session<'_>> {
        let mut session = Session::new(self.connection.as_mut(), self.adapter.as_ref());
        session.connect()?;
        Ok(session)
    }

    /// Runs `f` in a fresh session and disconnects afterwards.
    pub fn with_session<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session<'_>) -> Result<T>,
    {
        let mut session = self.session()?;
        let output = f(&mut session)?;
        session.disconnect()?;
        Ok(output)
    }

    /// Creates the given tables, in order.
    pub fn create_tables(&mut self, schemas: &[&Schema]) -> Result<()> {
        self.with_session(|session| {
            let mut create = session.create_table();
            for schema in schemas {
                create.create_schema(schema)?;
            }
            Ok(())
        })
    }

    /// Drops every user table, `orm_db_version` included.
    pub fn drop_all_tables(&mut self) -> Result<()> {
        self.with_session(|session| {
            let tables = session.migration().table_list()?;
            for sql in session.adapter().clear_database(&tables) {
                session.execute(&sql)?;
                session.commit()?;
            }
            log::info!("Dropped {} tables", tables.len());
            Ok(())
        })
    }

    /// Closes the connection.
    pub fn disconnect(mut self) -> Result<()> {
        self.set_state(EngineState::Disconnected);
        log::info!("Disconnecting from {}", self.url);
        self.connection.close()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("url", &self.url.to_string())
            .field("version", &self.version)
            .field("state", &self.state)
            .field("adapter", &self.adapter)
            .finish()
    }
}
