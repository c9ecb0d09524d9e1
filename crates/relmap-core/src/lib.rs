// SPDX-License-Identifier: MIT

#![doc = include_str!("../README.md")]
#![warn(
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rust_2018_idioms
)]
#![deny(unsafe_code)]

//! # Module Map
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`params`] | Named-parameter rewriting, exact/best-effort binding |
//! | [`meta`] | Entity metadata model, [`Entity`]/[`DbEnum`] traits, process-wide cache |
//! | [`statement`] | CRUD statement builder |
//! | [`session`] | Statement executor over the [`Connection`] collaborator traits |
//! | [`schema`] | Dependency-ordered DROP/CREATE schema export |
//! | [`value`] | Runtime column values |
//! | [`error`] | Error taxonomy |
//!
//! # Data Flow
//!
//! ```text
//! meta ──► statement ──► session      (runtime path)
//! meta ──► schema                     (migration path)
//! params ◄── statement, session      (rewriting + binding)
//! ```

pub mod error;
pub mod meta;
pub mod params;
pub mod schema;
pub mod session;
pub mod statement;
pub mod value;

pub use error::MapperError;
pub use meta::{DbEnum, Entity, EntityMeta, EnumMeta, FieldKind, FieldMeta, column_expr, describe};
pub use params::{ArgBuffer, ParamMap, rewrite};
pub use schema::SchemaExport;
pub use session::{Connection, ResultCursor, RowAccess, Session, Statement};
pub use statement::{Operation, SqlTemplate, build};
pub use value::Value;
