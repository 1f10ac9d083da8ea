//! PostgreSQL dialect.
//!
//! The [`SqlAdapter`] provided methods already speak PostgreSQL, so this type
//! only names the dialect.

use super::SqlAdapter;

/// Adapter for PostgreSQL and wire-compatible servers.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresAdapter;

impl SqlAdapter for PostgresAdapter {
    fn name(&self) -> &'static str {
        "postgres"
    }
}
