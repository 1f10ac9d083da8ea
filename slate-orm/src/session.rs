//! # Session Module
//!
//! A [`Session`] is the unit of work over one connection and one SQL dialect.
//! It is the factory for every statement builder.
//!
//! ## Transactions
//!
//! Sessions follow the DB-API convention: the first statement after a commit
//! implicitly opens a transaction, and nothing is durable until
//! [`Executor::commit`]. The builders commit after each operation, so
//! multi-step work is not atomic. Disconnecting, or dropping the session,
//! rolls back whatever is still pending.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut session = engine.session()?;
//! let adults = session.query::<User>().filter("age", Op::Ge, 18).all()?;
//! session.update::<User>().set("age", 30).equals("email", "a@x.io").commit()?;
//! ```

use crate::{
    adapter::SqlAdapter,
    dml::{Delete, Insert, Query, TableInfo, Update},
    drivers::Connection,
    errors::{Error, Result},
    migration::{CreateTable, Migration},
    model::{Entity, Model},
    value::Value,
};

// ============================================================================
// Executor
// ============================================================================

/// What statement builders need from a session.
pub trait Executor {
    fn execute(&mut self, sql: &str) -> Result<u64>;

    fn commit(&mut self) -> Result<()>;

    /// First row of the result, if any.
    fn fetch_one(&mut self, sql: &str) -> Result<Option<Vec<Value>>>;

    fn fetch_all(&mut self, sql: &str) -> Result<Vec<Vec<Value>>>;
}

// ============================================================================
// Session
// ============================================================================

pub struct Session<'e> {
    connection: &'e mut dyn Connection,
    adapter: &'e dyn SqlAdapter,
    connected: bool,
    in_transaction: bool,
    pending_writes: bool,
}

impl<'e> Session<'e> {
    /// A disconnected session. Call [`Session::connect`] before use.
    pub fn new(connection: &'e mut dyn Connection, adapter: &'e dyn SqlAdapter) -> Self {
        Self { connection, adapter, connected: false, in_transaction: false, pending_writes: false }
    }

    /// Marks the session usable. Connecting twice is a no-op.
    pub fn connect(&mut self) -> Result<()> {
        if !self.connected {
            self.connected = true;
            log::info!("Session connected ({})", self.adapter.name());
        }
        Ok(())
    }

    /// Ends the session, rolling back uncommitted work. Idempotent.
    pub fn disconnect(&mut self) -> Result<()> {
        if !self.connected {
            return Ok(());
        }

        if self.in_transaction {
            if self.pending_writes {
                log::warn!("Session disconnected with uncommitted changes, rolling back");
            }
            self.in_transaction = false;
            self.pending_writes = false;
            self.connection.rollback()?;
        }

        self.connected = false;
        log::info!("Session disconnected ({})", self.adapter.name());
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub fn adapter(&self) -> &'e dyn SqlAdapter {
        self.adapter
    }

    fn begin_if_needed(&mut self) -> Result<()> {
        if !self.connected {
            return Err(Error::invalid_argument("session is not connected"));
        }
        if !self.in_transaction {
            self.connection.begin()?;
            self.in_transaction = true;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Builders
    // ------------------------------------------------------------------------

    pub fn query<M: Model>(&mut self) -> Query<'_, M> {
        let adapter = self.adapter;
        Query::new(adapter, self)
    }

    pub fn insert_item(&mut self, item: &dyn Entity) -> Insert<'_> {
        let adapter = self.adapter;
        Insert::new(adapter, self).add_item(item)
    }

    pub fn insert_items<'i, E, I>(&mut self, items: I) -> Insert<'_>
    where
        E: Entity + ?Sized + 'i,
        I: IntoIterator<Item = &'i E>,
    {
        let adapter = self.adapter;
        Insert::new(adapter, self).add_items(items)
    }

    pub fn delete<M: Model>(&mut self) -> Delete<'_, M> {
        let adapter = self.adapter;
        Delete::new(adapter, self)
    }

    /// An update; give the new values with `set` or `values`.
    pub fn update<M: Model>(&mut self) -> Update<'_, M> {
        let adapter = self.adapter;
        Update::new(adapter, self)
    }

    pub fn create_table(&mut self) -> CreateTable<'_> {
        let adapter = self.adapter;
        CreateTable::new(adapter, self)
    }

    pub fn table_info<M: Model>(&mut self) -> TableInfo<'_, M> {
        let adapter = self.adapter;
        TableInfo::new(adapter, self)
    }

    pub fn migration(&mut self) -> Migration<'_> {
        let adapter = self.adapter;
        Migration::new(adapter, self)
    }
}

impl Executor for Session<'_> {
    fn execute(&mut self, sql: &str) -> Result<u64> {
        self.begin_if_needed()?;
        self.pending_writes = true;
        self.connection.execute(sql)
    }

    fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            self.in_transaction = false;
            self.pending_writes = false;
            self.connection.commit()?;
        }
        Ok(())
    }

    fn fetch_one(&mut self, sql: &str) -> Result<Option<Vec<Value>>> {
        self.begin_if_needed()?;
        self.connection.fetch_optional(sql)
    }

    fn fetch_all(&mut self, sql: &str) -> Result<Vec<Vec<Value>>> {
        self.begin_if_needed()?;
        self.connection.fetch_all(sql)
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.disconnect() {
            log::warn!("Failed to disconnect session: {}", err);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
