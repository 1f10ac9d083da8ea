//! # Model Derive Macro Implementation
//!
//! Expands `#[derive(Model)]`.
//!
//! ## Overview
//!
//! 1. **Attribute Parsing**: reads `#[orm(...)]` on the struct and on each field
//! 2. **Schema Generation**: builds `describe()`, one `Column` per field, with
//!    the column type taken from `FieldType` and adjusted by the attributes
//! 3. **Record Conversion**: generates `to_record()` / `from_record()`
//! 4. **Field Constants**: emits the `<snake_struct>_fields` module
//!
//! ## Example
//!
//! ```rust,ignore
//! // Input struct:
//! #[derive(Model)]
//! struct Project {
//!     #[orm(primary_key, autoincrement)]
//!     id: Option<i64>,
//!     #[orm(foreign_key = "user::id", on_delete = "cascade")]
//!     user_id: i64,
//! }
//!
//! // Generated (abridged):
//! impl slate_orm::Model for Project {
//!     fn describe() -> slate_orm::Schema {
//!         slate_orm::Schema::new("project")
//!             .with_column(/* "id" SERIAL PRIMARY KEY */)
//!             .with_column(/* "user_id" INT NOT NULL */)
//!             .with_foreign_key(/* fk_project_user_id */)
//!     }
//!     // to_record / from_record
//! }
//!
//! pub mod project_fields {
//!     pub const ID: &str = "id";
//!     pub const USER_ID: &str = "user_id";
//! }
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use heck::{ToShoutySnakeCase, ToSnakeCase};
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{ext::IdentExt, Data, DeriveInput, Field, Fields, Ident, Lit, LitStr};

// ============================================================================
// Field Attributes
// ============================================================================

#[derive(Default)]
struct ColumnAttrs {
    primary_key: bool,
    autoincrement: bool,
    unique: bool,
    size: Option<usize>,
    default: Option<Lit>,
    default_now: bool,
    name: Option<String>,
    foreign_key: Option<(String, String)>,
    on_delete: Option<Ident>,
    on_update: Option<Ident>,
}

fn referential_action(lit: &LitStr) -> syn::Result<Ident> {
    let variant = match lit.value().to_lowercase().replace('_', " ").as_str() {
        "cascade" => "Cascade",
        "restrict" => "Restrict",
        "set null" => "SetNull",
        "set default" => "SetDefault",
        "no action" => "NoAction",
        _ => {
            return Err(syn::Error::new_spanned(
                lit,
                "unknown referential action, expected cascade, restrict, set null, set default or no action",
            ));
        }
    };
    Ok(Ident::new(variant, lit.span()))
}

fn parse_field_attrs(field: &Field) -> syn::Result<ColumnAttrs> {
    let mut attrs = ColumnAttrs::default();

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("orm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("primary_key") {
                attrs.primary_key = true;
            } else if meta.path.is_ident("autoincrement") {
                attrs.autoincrement = true;
            } else if meta.path.is_ident("unique") {
                attrs.unique = true;
            } else if meta.path.is_ident("size") {
                let value: syn::LitInt = meta.value()?.parse()?;
                attrs.size = Some(value.base10_parse::<usize>()?);
            } else if meta.path.is_ident("default") {
                let value: Lit = meta.value()?.parse()?;
                match value {
                    Lit::Bool(_) | Lit::Int(_) | Lit::Str(_) => attrs.default = Some(value),
                    other => return Err(syn::Error::new_spanned(other, "default must be a bool, integer or string")),
                }
            } else if meta.path.is_ident("default_now") {
                attrs.default_now = true;
            } else if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.name = Some(value.value());
            } else if meta.path.is_ident("foreign_key") {
                let value: LitStr = meta.value()?.parse()?;
                let target = value.value();
                match target.split_once("::") {
                    Some((table, column)) if !table.is_empty() && !column.is_empty() && !column.contains("::") => {
                        attrs.foreign_key = Some((table.to_string(), column.to_string()));
                    }
                    _ => return Err(meta.error("invalid format for foreign_key, use \"table::column\"")),
                }
            } else if meta.path.is_ident("on_delete") {
                attrs.on_delete = Some(referential_action(&meta.value()?.parse()?)?);
            } else if meta.path.is_ident("on_update") {
                attrs.on_update = Some(referential_action(&meta.value()?.parse()?)?);
            } else {
                return Err(meta.error("unsupported orm attribute"));
            }
            Ok(())
        })?;
    }

    if attrs.autoincrement && !attrs.primary_key {
        return Err(syn::Error::new_spanned(field, "autoincrement requires primary_key"));
    }
    if attrs.default.is_some() && attrs.default_now {
        return Err(syn::Error::new_spanned(field, "default and default_now are mutually exclusive"));
    }
    if (attrs.on_delete.is_some() || attrs.on_update.is_some()) && attrs.foreign_key.is_none() {
        return Err(syn::Error::new_spanned(field, "on_delete/on_update require foreign_key"));
    }

    Ok(attrs)
}

fn table_name(ast: &DeriveInput) -> syn::Result<String> {
    let mut table = None;
    for attr in ast.attrs.iter().filter(|a| a.path().is_ident("orm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                table = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported orm attribute, expected table = \"...\""))
            }
        })?;
    }
    Ok(table.unwrap_or_else(|| ast.ident.unraw().to_string().to_snake_case()))
}

fn default_tokens(lit: &Lit) -> TokenStream {
    match lit {
        Lit::Bool(b) => quote! { ::slate_orm::Value::Boolean(#b) },
        Lit::Int(i) => quote! { ::slate_orm::Value::Integer(#i) },
        _ => quote! { ::slate_orm::Value::from(#lit) },
    }
}

// ============================================================================
// Macro Expansion Function
// ============================================================================

/// Expands the derive for one struct.
pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let struct_name = &ast.ident;

    let fields = match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => return Err(syn::Error::new_spanned(struct_name, "Model must have named fields")),
        },
        _ => return Err(syn::Error::new_spanned(struct_name, "Model must be a struct")),
    };

    let table = table_name(&ast)?;

    let mut columns = Vec::new();
    let mut foreign_keys = Vec::new();
    let mut set_fields = Vec::new();
    let mut get_fields = Vec::new();
    let mut constants = Vec::new();

    for field in fields {
        let attrs = parse_field_attrs(field)?;
        let Some(ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "Model fields must be named"));
        };
        let ty = &field.ty;
        let column = attrs.name.clone().unwrap_or_else(|| ident.unraw().to_string());

        // --------------------------------------------------------------------
        // Column Definition
        // --------------------------------------------------------------------
        let size = attrs.size.map(|n| quote! { let column_type = column_type.with_length(#n); });
        let default = match (&attrs.default, attrs.default_now) {
            (Some(lit), _) => {
                let value = default_tokens(lit);
                Some(quote! { let column_type = column_type.with_default(::slate_orm::Literal(#value)); })
            }
            (None, true) => Some(quote! { let column_type = column_type.with_default(::slate_orm::Now); }),
            (None, false) => None,
        };
        let primary_key = attrs.primary_key.then(|| {
            let autoincrement = attrs.autoincrement;
            quote! { let column_type = ::slate_orm::ColumnType::primary_key(column_type, #autoincrement); }
        });
        let unique = attrs.unique;

        columns.push(quote! {
            .with_column({
                let column_type = <#ty as ::slate_orm::FieldType>::column_type();
                #size
                #default
                #primary_key
                ::slate_orm::Column::new(#column, column_type)
                    .unique(#unique)
                    .nullable(<#ty as ::slate_orm::FieldType>::NULLABLE)
            })
        });

        // --------------------------------------------------------------------
        // Foreign Key
        // --------------------------------------------------------------------
        if let Some((parent_table, parent_column)) = &attrs.foreign_key {
            let fk_name = format!("fk_{}_{}", table, column);
            let on_delete = attrs.on_delete.iter();
            let on_update = attrs.on_update.iter();
            foreign_keys.push(quote! {
                .with_foreign_key(
                    ::slate_orm::ForeignKey::new(#fk_name, #column, #parent_table, #parent_column)
                        #(.on_delete(::slate_orm::ReferentialAction::#on_delete))*
                        #(.on_update(::slate_orm::ReferentialAction::#on_update))*
                )
            });
        }

        // --------------------------------------------------------------------
        // Record Conversion
        // --------------------------------------------------------------------
        set_fields.push(quote! {
            record.set(#column, ::slate_orm::FieldType::to_value(&self.#ident))?;
        });
        get_fields.push(quote! {
            #ident: record.field(#column)?,
        });

        let constant = Ident::new(&column.to_shouty_snake_case(), Span::call_site());
        constants.push(quote! { pub const #constant: &str = #column; });
    }

    let vis = &ast.vis;
    let fields_module = format_ident!("{}_fields", struct_name.unraw().to_string().to_snake_case());
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::slate_orm::Model for #struct_name #ty_generics #where_clause {
            fn describe() -> ::slate_orm::Schema {
                ::slate_orm::Schema::new(#table)
                    #(#columns)*
                    #(#foreign_keys)*
            }

            fn to_record(&self) -> ::slate_orm::Result<::slate_orm::Record> {
                let mut record = ::slate_orm::Record::new(<Self as ::slate_orm::Model>::schema());
                #(#set_fields)*
                Ok(record)
            }

            fn from_record(record: &::slate_orm::Record) -> ::slate_orm::Result<Self> {
                Ok(Self {
                    #(#get_fields)*
                })
            }
        }

        /// Column names of the table.
        #[allow(dead_code)]
        #vis mod #fields_module {
            #(#constants)*
        }
    })
}
