// SPDX-License-Identifier: MIT

//! Entity metadata: field descriptors, the [`Entity`] and [`DbEnum`]
//! contracts, and the process-wide metadata cache.
//!
//! Metadata is declarative. The `relmap-derive` macros generate [`Entity`]
//! and [`DbEnum`] implementations from struct and enum definitions, but both
//! traits can just as well be implemented by hand — the contract (ordered
//! field list plus constraint flags) is what the rest of the engine
//! consumes, not the discovery mechanism.
//!
//! # Caching
//!
//! [`describe`] computes the descriptor set for a type on first access and
//! caches it for the lifetime of the process, keyed by [`TypeId`]. Types are
//! static for the process, so there is no invalidation path. Concurrent
//! first-time access to the *same* type is serialized by the map's per-key
//! entry guard; unrelated types never contend on a global lock.

use std::{any::TypeId, sync::Arc};

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::{error::MapperError, session::RowAccess, value::Value};

/// Metadata of a database-level enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumMeta {
    /// Name of the `CREATE TYPE … AS ENUM` type.
    pub type_name: &'static str,
    /// Symbolic names, in declaration order.
    pub symbols:   &'static [&'static str]
}

/// Semantic type of a persistent field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 32-bit integer, `INTEGER`.
    Integer,
    /// 64-bit integer, `BIGINT`.
    BigInt,
    /// Boolean, `BOOLEAN`.
    Boolean,
    /// Text, `VARCHAR(255)`.
    Text,
    /// Timestamp without time zone, `TIMESTAMP`.
    Timestamp,
    /// Reference to a database enum type.
    Enum(EnumMeta)
}

/// Descriptor of one persistent field of an entity.
#[derive(Debug, Clone)]
pub struct FieldMeta {
    /// Field (and column) name, unique within the entity.
    pub name:       &'static str,
    /// Semantic type.
    pub kind:       FieldKind,
    /// Primary key flag; at most one per entity.
    pub is_key:     bool,
    /// Auto-generated (serial) column, excluded from INSERT lists.
    pub is_serial:  bool,
    /// NOT NULL constraint.
    pub not_null:   bool,
    /// UNIQUE constraint.
    pub is_unique:  bool,
    /// Table name of the referenced entity, when this field is a foreign
    /// key. Only legal on [`FieldKind::Integer`] fields.
    pub references: Option<&'static str>
}

/// Full descriptor of an entity type: its table name and ordered fields.
///
/// Field order is declaration order and determines column order in every
/// generated statement.
#[derive(Debug, Clone)]
pub struct EntityMeta {
    /// Entity type name, for diagnostics.
    pub entity: &'static str,
    /// Storage table name.
    pub table:  &'static str,
    /// Field descriptors in declaration order.
    pub fields: Vec<FieldMeta>
}

impl EntityMeta {
    /// The field marked as primary key.
    ///
    /// # Errors
    ///
    /// [`MapperError::MissingKey`] when no field carries the flag — a
    /// configuration error in the entity declaration, not a runtime data
    /// error.
    pub fn key_field(&self) -> Result<&FieldMeta, MapperError> {
        self.fields
            .iter()
            .find(|f| f.is_key)
            .ok_or(MapperError::MissingKey {
                entity: self.entity
            })
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Placeholder expression for a field in a SQL template.
///
/// Enumerated fields get an explicit cast to their database type
/// (`:mood::mood_type`) so the rewritten template still binds by name while
/// PostgreSQL enum casts are honoured; every other field is a bare `:name`.
pub fn column_expr(field: &FieldMeta) -> String {
    match field.kind {
        FieldKind::Enum(enum_meta) => format!(":{}::{}", field.name, enum_meta.type_name),
        _ => format!(":{}", field.name)
    }
}

/// A record shape mapped to one storage table.
///
/// Implemented by `#[derive(Entity)]` or by hand. The engine reaches
/// entities only through this trait: metadata for statement generation,
/// [`value`](Entity::value) for binding and [`from_row`](Entity::from_row)
/// for extraction.
pub trait Entity: Sized + 'static {
    /// Entity type name, used in diagnostics and cache bookkeeping.
    fn entity_name() -> &'static str;

    /// Storage table name: the declared override, or the bare type name.
    fn table() -> &'static str;

    /// Field descriptors in declaration order.
    ///
    /// Called once per process per type by [`describe`]; implementations
    /// need not cache.
    fn describe() -> Vec<FieldMeta>;

    /// Current value of the named field.
    ///
    /// Enumerated fields yield their symbolic name as [`Value::Text`].
    /// Unknown names yield [`Value::Null`].
    fn value(&self, field: &str) -> Value;

    /// Build an instance from a result row, reading columns by name.
    ///
    /// # Errors
    ///
    /// Data errors: a missing column, a type mismatch, or enum text that
    /// matches no symbol.
    fn from_row(row: &dyn RowAccess) -> Result<Self, MapperError>;
}

/// A Rust enum mapped to a database enum type.
///
/// Implemented by `#[derive(DbEnum)]`. Values travel as their symbolic name
/// in text form; [`from_symbol`](DbEnum::from_symbol) is the single place
/// where stored text is validated against the known symbols.
pub trait DbEnum: Sized {
    /// Database type name and symbol list.
    fn enum_meta() -> EnumMeta;

    /// Symbolic name of this value.
    fn symbol(&self) -> &'static str;

    /// Parse stored text back into a value.
    ///
    /// # Errors
    ///
    /// [`MapperError::UnknownSymbol`] when the text matches no symbol.
    fn from_symbol(symbol: &str) -> Result<Self, MapperError>;
}

static METADATA: Lazy<DashMap<TypeId, Arc<EntityMeta>>> = Lazy::new(DashMap::new);

/// Entity metadata for `T`, computed on first access and cached for the
/// lifetime of the process.
pub fn describe<T: Entity>() -> Arc<EntityMeta> {
    if let Some(meta) = METADATA.get(&TypeId::of::<T>()) {
        return Arc::clone(&meta);
    }
    let entry = METADATA
        .entry(TypeId::of::<T>())
        .or_insert_with(|| {
            Arc::new(EntityMeta {
                entity: T::entity_name(),
                table:  T::table(),
                fields: T::describe()
            })
        });
    Arc::clone(entry.value())
}
