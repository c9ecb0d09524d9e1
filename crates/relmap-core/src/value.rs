// SPDX-License-Identifier: MIT

//! Runtime column values.
//!
//! [`Value`] is the unit of exchange between entities and the driver behind
//! the [`Connection`](crate::session::Connection) trait: field values are
//! bound into positional slots as `Value`s and result columns come back as
//! `Value`s. Enumerated fields travel as [`Value::Text`] carrying the
//! symbolic name; the enum cast in the SQL template (`:col::enum_type`)
//! tells the database how to interpret it.

use chrono::NaiveDateTime;

use crate::error::MapperError;

/// A bound or extracted column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL, also the initial content of unbound slots.
    Null,
    /// 32-bit integer (`INTEGER`).
    Int(i32),
    /// 64-bit integer (`BIGINT`).
    Long(i64),
    /// Boolean (`BOOLEAN`).
    Bool(bool),
    /// Text (`VARCHAR`), also the wire form of enum symbols.
    Text(String),
    /// Timestamp without time zone (`TIMESTAMP`).
    Timestamp(NaiveDateTime)
}

impl Value {
    /// Name of the value kind, used in [`MapperError::TypeMismatch`].
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "integer",
            Self::Long(_) => "bigint",
            Self::Bool(_) => "boolean",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp"
        }
    }

    /// Extract an `i32`, failing with column context otherwise.
    pub fn into_int(self, column: &str) -> Result<i32, MapperError> {
        match self {
            Self::Int(v) => Ok(v),
            other => Err(mismatch(column, "integer", &other))
        }
    }

    /// Extract an `i64`, failing with column context otherwise.
    pub fn into_long(self, column: &str) -> Result<i64, MapperError> {
        match self {
            Self::Long(v) => Ok(v),
            other => Err(mismatch(column, "bigint", &other))
        }
    }

    /// Extract a `bool`, failing with column context otherwise.
    pub fn into_bool(self, column: &str) -> Result<bool, MapperError> {
        match self {
            Self::Bool(v) => Ok(v),
            other => Err(mismatch(column, "boolean", &other))
        }
    }

    /// Extract text, failing with column context otherwise.
    pub fn into_text(self, column: &str) -> Result<String, MapperError> {
        match self {
            Self::Text(v) => Ok(v),
            other => Err(mismatch(column, "text", &other))
        }
    }

    /// Extract a timestamp, failing with column context otherwise.
    pub fn into_timestamp(self, column: &str) -> Result<NaiveDateTime, MapperError> {
        match self {
            Self::Timestamp(v) => Ok(v),
            other => Err(mismatch(column, "timestamp", &other))
        }
    }
}

fn mismatch(column: &str, expected: &'static str, found: &Value) -> MapperError {
    MapperError::TypeMismatch {
        column: column.to_string(),
        expected,
        found: found.kind()
    }
}
