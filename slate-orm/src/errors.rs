//! # Error Handling Module
//!
//! This module defines the error types used throughout Slate ORM.
//!
//! ## Error Types
//!
//! - **Validation**: a value does not match its column type or nullability
//! - **AutoincrementType**: an autoincrement primary key wraps an unsupported type
//! - **DifferentModelsType**: an insert batch mixes concrete model types
//! - **UnknownDriver**: the driver identifier does not name a supported backend
//! - **DatabaseError**: wrapped sqlx errors, propagated unmodified
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use slate_orm::Error;
//!
//! match session.insert_item(&user).commit() {
//!     Ok(ids) => println!("Inserted: {:?}", ids),
//!     Err(Error::Validation(msg)) => eprintln!("Rejected value: {}", msg),
//!     Err(Error::DatabaseError(e)) => eprintln!("Database error: {}", e),
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// Error Enum Definition
// ============================================================================

/// The main error type for Slate ORM operations.
///
/// Every failure is surfaced to the caller as soon as it is detected. Nothing
/// in the library retries, recovers or compensates for a partial failure.
#[derive(Error, Debug)]
pub enum Error {
    /// A value does not match its column's declared type, or a `NULL` was
    /// written to a non-nullable column.
    ///
    /// Raised when a value is assigned to a record, rendered into a statement,
    /// or decoded from a driver row.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A primary key requested autoincrement over a type that cannot be
    /// auto-incremented. Raised when the column SQL is generated.
    #[error("Autoincrement type error: {0}")]
    AutoincrementType(String),

    /// A multi-item insert mixed concrete model types. Raised by
    /// `Insert::commit` before any SQL is sent.
    #[error("Different models type error: {0}")]
    DifferentModelsType(String),

    /// The driver identifier does not select any known connection or adapter.
    #[error("Unknown driver {0}")]
    UnknownDriver(String),

    /// Invalid arguments passed to a builder or factory method.
    ///
    /// Typical causes are a column name that the model does not declare or a
    /// condition chain that starts with `and`/`or`.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Type conversion error.
    ///
    /// Used when a driver returns something the library cannot turn into a
    /// [`Value`](crate::Value), or when introspected metadata cannot be decoded.
    #[error("Type conversion error: {0}")]
    Conversion(String),

    /// Database operation error.
    ///
    /// This variant wraps errors from the underlying sqlx library. Connection
    /// failures, constraint violations and syntax errors all arrive here
    /// untouched, via `?` on any sqlx call.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// The blocking runtime that drives a driver connection could not start.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Helper Functions
// ============================================================================

impl Error {
    /// Creates a `Validation` error from a string slice.
    pub fn validation(msg: &str) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Creates an `InvalidArgument` error from a string slice.
    pub fn invalid_argument(msg: &str) -> Self {
        Error::InvalidArgument(msg.to_string())
    }

    /// Creates a `Conversion` error from a string slice.
    pub fn conversion(msg: &str) -> Self {
        Error::Conversion(msg.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
