// SPDX-License-Identifier: MIT

//! Error taxonomy for the mapping layer.
//!
//! Errors fall into four fatal categories plus a backend passthrough:
//!
//! | Category | Variants | Raised by |
//! |----------|----------|-----------|
//! | Configuration | [`MissingKey`](MapperError::MissingKey), [`InvalidReference`](MapperError::InvalidReference) | metadata derivation, schema export |
//! | Binding | [`UnknownParameter`](MapperError::UnknownParameter) | exact parameter binding |
//! | Data | [`UnknownSymbol`](MapperError::UnknownSymbol), [`MissingColumn`](MapperError::MissingColumn), [`TypeMismatch`](MapperError::TypeMismatch), [`EmptyReturn`](MapperError::EmptyReturn) | row extraction |
//! | Cycle | [`CircularReference`](MapperError::CircularReference) | schema export |
//!
//! Cardinality failures (UPDATE/DELETE affecting a row count other than one)
//! are deliberately *not* errors; the session reports them as a `false`
//! result so callers can implement optimistic-concurrency checks.

use thiserror::Error;

/// Errors produced by the mapping layer.
///
/// Configuration errors indicate a programming mistake in entity
/// declarations and are never retried. Binding and data errors are fatal to
/// the calling operation. Backend errors wrap whatever the driver behind the
/// [`Connection`](crate::session::Connection) trait reports.
#[derive(Debug, Error)]
pub enum MapperError {
    /// No field of the entity is marked as the primary key.
    #[error("no primary key declared on entity {entity}")]
    MissingKey {
        /// Entity type name.
        entity: &'static str
    },

    /// Exact binding referenced a parameter name absent from the template.
    #[error("parameter not found: {name}")]
    UnknownParameter {
        /// The missing parameter name.
        name: String
    },

    /// A stored enum text matched no symbol of the target enum type.
    #[error("'{value}' is not a symbol of enum {enum_type}")]
    UnknownSymbol {
        /// Database enum type name.
        enum_type: &'static str,
        /// The offending stored text.
        value:     String
    },

    /// A foreign-key field is not of the integer semantic type.
    #[error("referencing field type must be integer: {table}.{field}")]
    InvalidReference {
        /// Table of the offending field.
        table: &'static str,
        /// Field name.
        field: &'static str
    },

    /// The table dependency graph contains a cycle; no schema script can be
    /// ordered.
    #[error("circular reference among tables: {tables:?}")]
    CircularReference {
        /// Tables remaining unordered when the free set came up empty.
        tables: Vec<String>
    },

    /// A column expected by the entity is absent from the result row.
    #[error("column not in result row: {column}")]
    MissingColumn {
        /// Column name.
        column: String
    },

    /// A column value has the wrong runtime type for its field.
    #[error("column {column}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Column name.
        column:   String,
        /// Expected value kind.
        expected: &'static str,
        /// Kind actually present.
        found:    &'static str
    },

    /// An INSERT with RETURNING produced no row.
    #[error("create returned no row for entity {entity}")]
    EmptyReturn {
        /// Entity type name.
        entity: &'static str
    },

    /// Error reported by the database driver.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>)
}

impl MapperError {
    /// Wrap a driver error in [`MapperError::Backend`].
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static
    {
        Self::Backend(Box::new(err))
    }
}
