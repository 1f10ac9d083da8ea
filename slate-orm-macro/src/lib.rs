//! # Slate ORM Procedural Macros
//!
//! This crate provides the `#[derive(Model)]` macro for Slate ORM. It is not
//! meant to be used directly; `slate-orm` re-exports the derive next to the
//! `Model` trait:
//!
//! ```rust,ignore
//! use slate_orm::Model;
//!
//! #[derive(Model)]
//! #[orm(table = "user")]
//! struct User {
//!     #[orm(primary_key, autoincrement)]
//!     id: Option<i64>,
//!     #[orm(size = 120, unique)]
//!     email: String,
//! }
//! ```
//!
//! ## Supported Attributes
//!
//! On the struct:
//!
//! * `table = "name"` - Table name. Defaults to the snake_case struct name.
//!
//! On fields:
//!
//! * `primary_key` - Wraps the column type in a primary key
//! * `autoincrement` - Lets the database generate the key (requires `primary_key`)
//! * `unique` - Adds a UNIQUE constraint
//! * `size = N` - Length of a string column
//! * `default = <bool | integer | string>` - Constant default value, checked against
//!   the column type when the column SQL is rendered
//! * `default_now` - Current timestamp as default value
//! * `name = "column"` - Column name, when it differs from the field name
//! * `foreign_key = "table::column"` - References `column` of `table`
//! * `on_delete = "..."`, `on_update = "..."` - `cascade`, `restrict`,
//!   `set null`, `set default` or `no action`
//!
//! The column type and nullability come from the field's Rust type through
//! `slate_orm::FieldType`; wrap a type in `Option` to make its column nullable.
//!
//! ## Generated Code
//!
//! * `impl slate_orm::Model` with `describe`, `to_record` and `from_record`
//! * a `<snake_struct>_fields` module with one `&str` constant per column

// ============================================================================
// External Crate Imports
// ============================================================================

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

// ============================================================================
// Module Declarations
// ============================================================================

mod derive_model;

// ============================================================================
// Procedural Macro Definitions
// ============================================================================

/// Derives `slate_orm::Model` for a struct with named fields.
///
/// Malformed `#[orm(...)]` attributes are reported as compile errors on the
/// offending tokens.
#[proc_macro_derive(Model, attributes(orm))]
pub fn model_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    derive_model::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}
