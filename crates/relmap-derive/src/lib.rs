// SPDX-License-Identifier: MIT

#![doc = include_str!("../README.md")]
#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

mod db_enum;
mod entity;

use proc_macro::TokenStream;

/// Derive `relmap_core::Entity` for a named struct.
///
/// # Entity Attribute
///
/// | Attribute | Required | Default | Description |
/// |-----------|----------|---------|-------------|
/// | `#[entity(table = "…")]` | No | bare type name | Storage table name |
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `#[key]` | Primary key; at most one per entity |
/// | `#[serial]` | Auto-generated column, excluded from INSERT lists |
/// | `#[not_null]` | NOT NULL constraint |
/// | `#[unique]` | UNIQUE constraint |
/// | `#[references(Other)]` | Foreign key to `Other`'s table; integer fields only |
///
/// # Field Types
///
/// | Rust type | Semantic type | Column type |
/// |-----------|---------------|-------------|
/// | `i32` | integer | `INTEGER` (or `SERIAL`) |
/// | `i64` | long integer | `BIGINT` |
/// | `bool` | boolean | `BOOLEAN` |
/// | `String` | text | `VARCHAR(255)` |
/// | `chrono::NaiveDateTime` | timestamp | `TIMESTAMP` |
/// | any other path type | enumerated reference | its `DbEnum` type name |
///
/// Any non-primitive field type must implement `relmap_core::DbEnum`
/// (usually via [`derive@DbEnum`]); its values travel as symbolic names with
/// an explicit enum cast in the generated SQL.
///
/// # Example
///
/// ```rust,ignore
/// use relmap::{DbEnum, Entity};
///
/// #[derive(DbEnum)]
/// #[db_enum(name = "mood_type")]
/// enum Mood { Happy, Grumpy }
///
/// #[derive(Entity)]
/// #[entity(table = "person")]
/// struct Person {
///     #[key]
///     #[serial]
///     id: i32,
///     #[not_null]
///     name: String,
///     #[unique]
///     email: String,
///     mood: Mood,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(entity, key, serial, not_null, unique, references))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive(input)
}

/// Derive `relmap_core::DbEnum` for a fieldless enum.
///
/// # Attributes
///
/// | Attribute | Required | Default | Description |
/// |-----------|----------|---------|-------------|
/// | `#[db_enum(name = "…")]` | No | bare type name | Database enum type name |
///
/// Symbols are the variant names, in declaration order; parsing stored text
/// back is strict and fails with a data error on unknown symbols.
///
/// # Example
///
/// ```rust,ignore
/// use relmap::DbEnum;
///
/// #[derive(DbEnum)]
/// #[db_enum(name = "mood_type")]
/// enum Mood { Happy, Grumpy }
/// ```
#[proc_macro_derive(DbEnum, attributes(db_enum))]
pub fn derive_db_enum(input: TokenStream) -> TokenStream {
    db_enum::derive(input)
}
