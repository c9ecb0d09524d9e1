// SPDX-License-Identifier: MIT

//! CRUD statement builder.
//!
//! Combines entity metadata with the named-parameter rewriter to produce
//! ready-to-bind templates for the five operations:
//!
//! | Operation | SQL shape |
//! |-----------|-----------|
//! | [`Operation::Read`] | `SELECT * FROM t WHERE key=:key` |
//! | [`Operation::ReadAll`] | `SELECT * FROM t` |
//! | [`Operation::Create`] | `INSERT INTO t (…) VALUES (…) RETURNING *` |
//! | [`Operation::Update`] | `UPDATE t SET … WHERE key=:key` |
//! | [`Operation::Delete`] | `DELETE FROM t WHERE key=:key` |
//!
//! Column order inside a template always matches metadata field order, which
//! keeps generated SQL deterministic. Serial columns are excluded from both
//! INSERT lists; the database fills them and `RETURNING *` carries them
//! back. Enum columns use the cast-decorated placeholder from
//! [`column_expr`].

use crate::{
    error::MapperError,
    meta::{EntityMeta, column_expr},
    params::{ParamMap, rewrite}
};

/// The five generated statement kinds, also the cache key suffix inside a
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `INSERT … RETURNING *`.
    Create,
    /// `SELECT` by primary key.
    Read,
    /// Unfiltered `SELECT`.
    ReadAll,
    /// `UPDATE` by primary key.
    Update,
    /// `DELETE` by primary key.
    Delete
}

/// A rewritten, ready-to-prepare SQL template plus its parameter map.
#[derive(Debug, Clone)]
pub struct SqlTemplate {
    /// Positional SQL text.
    pub sql:    String,
    /// Name → positions mapping for binding.
    pub params: ParamMap
}

/// Build the template for one operation on one entity type.
///
/// # Errors
///
/// [`MapperError::MissingKey`] for key-based operations on an entity with no
/// primary key.
pub fn build(meta: &EntityMeta, operation: Operation) -> Result<SqlTemplate, MapperError> {
    let text = match operation {
        Operation::Read => {
            let key = meta.key_field()?;
            format!(
                "SELECT * FROM {} WHERE {}={}",
                meta.table,
                key.name,
                column_expr(key)
            )
        }
        Operation::ReadAll => format!("SELECT * FROM {}", meta.table),
        Operation::Create => {
            let columns: Vec<&str> = meta
                .fields
                .iter()
                .filter(|f| !f.is_serial)
                .map(|f| f.name)
                .collect();
            let values: Vec<String> = meta
                .fields
                .iter()
                .filter(|f| !f.is_serial)
                .map(column_expr)
                .collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
                meta.table,
                columns.join(", "),
                values.join(", ")
            )
        }
        Operation::Update => {
            let key = meta.key_field()?;
            let assignments: Vec<String> = meta
                .fields
                .iter()
                .filter(|f| !f.is_key)
                .map(|f| format!("{}={}", f.name, column_expr(f)))
                .collect();
            format!(
                "UPDATE {} SET {} WHERE {}={}",
                meta.table,
                assignments.join(", "),
                key.name,
                column_expr(key)
            )
        }
        Operation::Delete => {
            let key = meta.key_field()?;
            format!(
                "DELETE FROM {} WHERE {}={}",
                meta.table,
                key.name,
                column_expr(key)
            )
        }
    };

    let (sql, params) = rewrite(&text);
    Ok(SqlTemplate { sql, params })
}
