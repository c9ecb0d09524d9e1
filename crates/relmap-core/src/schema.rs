// SPDX-License-Identifier: MIT

//! Dependency-ordered schema export.
//!
//! [`SchemaExport`] collects entity types and emits a full DROP/CREATE
//! script for them: tables for the entities, `CREATE TYPE … AS ENUM` for
//! every enum type their columns reference. Tables are ordered with Kahn's
//! algorithm over the foreign-key dependency graph, so no table is created
//! before the tables it references and drops run in the reverse order. Enum
//! types carry no graph edges (a column's enum type is a type dependency,
//! not a table dependency) and are created before any table.
//!
//! A dependency cycle makes the script impossible to order; export fails
//! with [`MapperError::CircularReference`] and produces no output, so a
//! broken migration can never ship silently.
//!
//! The exporter's only output is the script text; writing it to a file or
//! applying it to a live database is the caller's business.

use std::{
    collections::{BTreeSet, HashSet},
    sync::Arc
};

use crate::{
    error::MapperError,
    meta::{Entity, EntityMeta, EnumMeta, FieldKind, FieldMeta, describe}
};

/// Collects entity types and exports their schema script.
///
/// ```rust,ignore
/// let script = SchemaExport::new()
///     .entity::<Account>()
///     .entity::<Transfer>()
///     .export()?;
/// ```
#[derive(Default)]
pub struct SchemaExport {
    metas: Vec<Arc<EntityMeta>>
}

impl SchemaExport {
    /// An empty export set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity type to the export set.
    #[must_use]
    pub fn entity<T: Entity>(mut self) -> Self {
        self.metas.push(describe::<T>());
        self
    }

    /// Emit the full DROP/CREATE script.
    ///
    /// Layout: table drops in reverse dependency order, a blank separator,
    /// enum type drops, a blank separator, then enum type creates followed
    /// by table creates in forward dependency order.
    ///
    /// # Errors
    ///
    /// [`MapperError::InvalidReference`] for a foreign key on a non-integer
    /// field, [`MapperError::CircularReference`] for a dependency cycle.
    pub fn export(&self) -> Result<String, MapperError> {
        let enums = self.collect_enums()?;
        let order = self.table_order()?;

        let mut script: Vec<String> = Vec::new();

        for table in order.iter().rev() {
            script.push(format!("DROP TABLE IF EXISTS {table};"));
        }
        script.push(String::new());
        for enum_meta in &enums {
            script.push(format!("DROP TYPE IF EXISTS {};", enum_meta.type_name));
        }
        script.push(String::new());
        for enum_meta in &enums {
            let symbols: Vec<String> = enum_meta
                .symbols
                .iter()
                .map(|s| format!("'{s}'"))
                .collect();
            script.push(format!(
                "CREATE TYPE {} AS ENUM ({});\n",
                enum_meta.type_name,
                symbols.join(", ")
            ));
        }
        for table in &order {
            // table_order only emits names taken from the metas
            if let Some(meta) = self.metas.iter().find(|m| m.table == *table) {
                script.push(create_table(meta));
            }
        }

        Ok(script.join("\n"))
    }

    /// Distinct enum types referenced by any column, in first-seen order.
    /// Also validates foreign-key field kinds, which is an export-time
    /// configuration check.
    fn collect_enums(&self) -> Result<Vec<EnumMeta>, MapperError> {
        let mut enums: Vec<EnumMeta> = Vec::new();
        for meta in &self.metas {
            for field in &meta.fields {
                if field.references.is_some() && field.kind != FieldKind::Integer {
                    return Err(MapperError::InvalidReference {
                        table: meta.table,
                        field: field.name
                    });
                }
                if let FieldKind::Enum(enum_meta) = field.kind
                    && !enums.iter().any(|e| e.type_name == enum_meta.type_name)
                {
                    enums.push(enum_meta);
                }
            }
        }
        Ok(enums)
    }

    /// Dependency-first table order (Kahn's algorithm).
    ///
    /// Each round extracts the free set — remaining tables with no
    /// unresolved outgoing edge — sorted for determinism, then drops every
    /// edge pointing into it. An empty free set with tables remaining means
    /// a cycle.
    fn table_order(&self) -> Result<Vec<String>, MapperError> {
        let mut remaining: BTreeSet<String> =
            self.metas.iter().map(|m| m.table.to_string()).collect();

        // edges run from the referencing table to the referenced one;
        // targets outside the export set cannot be ordered and carry no edge
        let mut edges: Vec<(String, String)> = Vec::new();
        for meta in &self.metas {
            for field in &meta.fields {
                if let Some(target) = field.references
                    && remaining.contains(target)
                {
                    edges.push((meta.table.to_string(), target.to_string()));
                }
            }
        }

        let mut order = Vec::with_capacity(remaining.len());
        while !remaining.is_empty() {
            let blocked: HashSet<&str> =
                edges.iter().map(|(from, _)| from.as_str()).collect();
            let free: Vec<String> = remaining
                .iter()
                .filter(|table| !blocked.contains(table.as_str()))
                .cloned()
                .collect();

            if free.is_empty() {
                return Err(MapperError::CircularReference {
                    tables: remaining.into_iter().collect()
                });
            }

            for table in &free {
                remaining.remove(table);
            }
            edges.retain(|(_, to)| !free.contains(to));
            order.extend(free);
        }
        Ok(order)
    }
}

/// Render one CREATE TABLE statement.
fn create_table(meta: &EntityMeta) -> String {
    let columns: Vec<String> = meta.fields.iter().map(export_column).collect();
    format!("CREATE TABLE {} (\n{}\n);\n", meta.table, columns.join(",\n"))
}

/// Render one column definition: type keyword (SERIAL for auto-generated
/// columns), then NOT NULL / UNIQUE / REFERENCES per the declared
/// constraints.
fn export_column(field: &FieldMeta) -> String {
    let mut opts: Vec<String> = Vec::new();

    if field.is_serial {
        opts.push("SERIAL".to_string());
    } else {
        opts.push(type_keyword(field.kind));
    }
    if field.not_null {
        opts.push("NOT NULL".to_string());
    }
    if field.is_unique {
        opts.push("UNIQUE".to_string());
    }
    if let Some(target) = field.references {
        opts.push(format!("REFERENCES {target}"));
    }

    format!("    {} {}", field.name, opts.join(" "))
}

fn type_keyword(kind: FieldKind) -> String {
    match kind {
        FieldKind::Integer => "INTEGER".to_string(),
        FieldKind::BigInt => "BIGINT".to_string(),
        FieldKind::Boolean => "BOOLEAN".to_string(),
        FieldKind::Text => "VARCHAR(255)".to_string(),
        FieldKind::Timestamp => "TIMESTAMP".to_string(),
        FieldKind::Enum(enum_meta) => enum_meta.type_name.to_string()
    }
}
