// SPDX-License-Identifier: MIT

//! Statement executor and session-scoped statement cache.
//!
//! The executor never talks to a database directly. It consumes the three
//! collaborator traits below, which any driver (single connection, pooled
//! connection, prepared-statement cache) can sit behind:
//!
//! - [`Connection`] — prepares SQL and closes.
//! - [`Statement`] — executes with positional arguments, as a query
//!   (yielding a cursor) or an update (yielding an affected-row count).
//! - [`ResultCursor`] / [`RowAccess`] — `advance` plus typed access to the
//!   current row's columns *by name*; the executor never reads by position.
//!
//! [`Session`] owns one cached statement per (entity type, operation),
//! lazily prepared on first use and released in [`Session::close`]. A
//! session is single-caller: bind-then-execute-then-read on one cached
//! statement must complete atomically from the caller's perspective, so
//! concurrent use of one session must be serialized externally.
//!
//! Connection acquisition policy, pooling, retries, transactions and
//! cancellation all stay with the driver; the session is synchronous,
//! one call in, one result out.

use std::{
    any::TypeId,
    collections::{HashMap, hash_map::Entry}
};

use tracing::{debug, error};

use crate::{
    error::MapperError,
    meta::{Entity, describe},
    params::{ArgBuffer, ParamMap},
    statement::{Operation, SqlTemplate, build},
    value::Value
};

/// Typed access to the current row's columns, by name.
pub trait RowAccess {
    /// Value of the named column in the current row.
    ///
    /// # Errors
    ///
    /// [`MapperError::MissingColumn`] when the column is absent, or a
    /// backend error from the driver.
    fn get(&self, column: &str) -> Result<Value, MapperError>;
}

/// A forward-only result cursor.
pub trait ResultCursor: RowAccess {
    /// Move to the next row; `false` when the result set is exhausted.
    ///
    /// # Errors
    ///
    /// Backend errors from the driver.
    fn advance(&mut self) -> Result<bool, MapperError>;
}

/// A prepared statement handle supplied by the driver.
pub trait Statement {
    /// Cursor type over this statement's results.
    type Cursor<'a>: ResultCursor
    where
        Self: 'a;

    /// Execute as a query with the given positional arguments.
    ///
    /// # Errors
    ///
    /// Backend errors from the driver.
    fn query(&mut self, args: &[Value]) -> Result<Self::Cursor<'_>, MapperError>;

    /// Execute as an INSERT/UPDATE/DELETE, returning the affected-row count.
    ///
    /// # Errors
    ///
    /// Backend errors from the driver.
    fn update(&mut self, args: &[Value]) -> Result<u64, MapperError>;

    /// Release the statement.
    ///
    /// # Errors
    ///
    /// Backend errors from the driver.
    fn close(self) -> Result<(), MapperError>;
}

/// A live database connection supplied by the driver.
pub trait Connection {
    /// Prepared statement type of this driver.
    type Statement: Statement;

    /// Prepare a positional SQL template.
    ///
    /// # Errors
    ///
    /// Backend errors from the driver.
    fn prepare(&mut self, sql: &str) -> Result<Self::Statement, MapperError>;

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Backend errors from the driver.
    fn close(&mut self) -> Result<(), MapperError>;
}

/// A prepared template plus its parameter map, cached per
/// (entity type, operation).
struct CachedStatement<S> {
    stmt:   S,
    params: ParamMap
}

/// Executes CRUD operations for entity types over one connection.
///
/// Statements are prepared lazily on first use per (entity type, operation)
/// and live until [`close`](Session::close); dropping a session without
/// closing leaks driver-side statement handles, which is a resource leak,
/// not a correctness bug.
pub struct Session<C: Connection> {
    conn:       C,
    statements: HashMap<(TypeId, Operation), CachedStatement<C::Statement>>
}

impl<C: Connection> Session<C> {
    /// Wrap a connection.
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            statements: HashMap::new()
        }
    }

    /// Access the underlying connection, e.g. for raw statements.
    pub fn connection(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Insert an entity, extracting the `RETURNING *` row into a new
    /// instance (serial columns filled by the database).
    ///
    /// # Errors
    ///
    /// Backend errors, data errors from row extraction, or
    /// [`MapperError::EmptyReturn`] when the insert produced no row.
    pub fn create<T: Entity>(&mut self, item: &T) -> Result<T, MapperError> {
        let meta = describe::<T>();
        let cached = self.cached::<T>(Operation::Create)?;
        let args = bind_fields(item, meta.fields.iter().map(|f| f.name), &cached.params);

        let mut cursor = cached.stmt.query(args.as_slice())?;
        if cursor.advance()? {
            let created = T::from_row(&cursor)?;
            debug!(entity = meta.entity, "create");
            Ok(created)
        } else {
            error!(entity = meta.entity, "create returned no row");
            Err(MapperError::EmptyReturn {
                entity: meta.entity
            })
        }
    }

    /// Fetch an entity by primary key; `Ok(None)` when no row matches.
    ///
    /// # Errors
    ///
    /// Configuration errors (no key field), backend errors, or data errors
    /// from row extraction.
    pub fn read<T: Entity>(&mut self, key: Value) -> Result<Option<T>, MapperError> {
        let meta = describe::<T>();
        let key_name = meta.key_field()?.name;
        let cached = self.cached::<T>(Operation::Read)?;

        let mut args = ArgBuffer::new(&cached.params);
        args.set(&cached.params, key_name, key)?;

        let mut cursor = cached.stmt.query(args.as_slice())?;
        if cursor.advance()? {
            let item = T::from_row(&cursor)?;
            debug!(entity = meta.entity, "read hit");
            Ok(Some(item))
        } else {
            debug!(entity = meta.entity, "read miss");
            Ok(None)
        }
    }

    /// Fetch every row of the entity's table, in storage order.
    ///
    /// One bad row aborts the whole batch: partial results with an
    /// unreported gap are worse than no results.
    ///
    /// # Errors
    ///
    /// Backend errors, or data errors from row extraction.
    pub fn read_all<T: Entity>(&mut self) -> Result<Vec<T>, MapperError> {
        let meta = describe::<T>();
        let cached = self.cached::<T>(Operation::ReadAll)?;

        let args = ArgBuffer::new(&cached.params);
        let mut cursor = cached.stmt.query(args.as_slice())?;
        let mut items = Vec::new();
        while cursor.advance()? {
            items.push(T::from_row(&cursor)?);
        }
        debug!(entity = meta.entity, rows = items.len(), "read_all");
        Ok(items)
    }

    /// Update an entity's non-key columns by primary key.
    ///
    /// Returns `true` when exactly one row was affected. Any other count is
    /// logged and reported as `false` — advisory, never an error — so
    /// callers can implement optimistic-concurrency checks.
    ///
    /// # Errors
    ///
    /// Configuration errors (no key field) or backend errors.
    pub fn update<T: Entity>(&mut self, item: &T) -> Result<bool, MapperError> {
        let meta = describe::<T>();
        let cached = self.cached::<T>(Operation::Update)?;
        let args = bind_fields(item, meta.fields.iter().map(|f| f.name), &cached.params);

        let rows = cached.stmt.update(args.as_slice())?;
        if rows == 1 {
            debug!(entity = meta.entity, "update");
            Ok(true)
        } else {
            error!(entity = meta.entity, rows, "update affected row count != 1");
            Ok(false)
        }
    }

    /// Delete an entity by primary key.
    ///
    /// Same cardinality contract as [`update`](Session::update).
    ///
    /// # Errors
    ///
    /// Configuration errors (no key field) or backend errors.
    pub fn delete<T: Entity>(&mut self, key: Value) -> Result<bool, MapperError> {
        let meta = describe::<T>();
        let key_name = meta.key_field()?.name;
        let cached = self.cached::<T>(Operation::Delete)?;

        let mut args = ArgBuffer::new(&cached.params);
        args.set(&cached.params, key_name, key)?;

        let rows = cached.stmt.update(args.as_slice())?;
        if rows == 1 {
            debug!(entity = meta.entity, "delete");
            Ok(true)
        } else {
            error!(entity = meta.entity, rows, "delete affected row count != 1");
            Ok(false)
        }
    }

    /// Release every cached statement, then close the connection.
    ///
    /// # Errors
    ///
    /// Backend errors from statement or connection release.
    pub fn close(mut self) -> Result<(), MapperError> {
        for (_, cached) in self.statements.drain() {
            cached.stmt.close()?;
        }
        self.conn.close()
    }

    /// The cached statement for (T, operation), preparing it on first use.
    fn cached<T: Entity>(
        &mut self,
        operation: Operation
    ) -> Result<&mut CachedStatement<C::Statement>, MapperError> {
        match self.statements.entry((TypeId::of::<T>(), operation)) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(slot) => {
                let meta = describe::<T>();
                let SqlTemplate { sql, params } = build(&meta, operation)?;
                let stmt = self.conn.prepare(&sql)?;
                debug!(entity = meta.entity, ?operation, %sql, "prepared");
                Ok(slot.insert(CachedStatement { stmt, params }))
            }
        }
    }
}

/// Best-effort bind of the named fields of an entity into a template's
/// slots. Fields absent from the template (enum columns in a DELETE, the
/// serial key in an INSERT) are skipped silently.
fn bind_fields<'a, T: Entity>(
    item: &T,
    fields: impl Iterator<Item = &'a str>,
    params: &ParamMap
) -> ArgBuffer {
    let mut args = ArgBuffer::new(params);
    for name in fields {
        args.set_loose(params, name, item.value(name));
    }
    args
}

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        collections::{HashMap, VecDeque},
        rc::Rc
    };

    use super::*;
    use crate::meta::{FieldKind, FieldMeta};

    type Row = Vec<(&'static str, Value)>;

    #[derive(Clone)]
    enum Reply {
        Rows(Vec<Row>),
        Affected(u64)
    }

    #[derive(Default)]
    struct DriverLog {
        prepared: Vec<String>,
        executed: Vec<(String, Vec<Value>)>,
        stmts_closed: usize,
        conn_closed: bool
    }

    struct FakeConnection {
        replies: HashMap<String, Reply>,
        log:     Rc<RefCell<DriverLog>>
    }

    struct FakeStatement {
        sql:   String,
        reply: Reply,
        log:   Rc<RefCell<DriverLog>>
    }

    struct FakeCursor {
        rows:    VecDeque<Row>,
        current: Option<Row>
    }

    impl RowAccess for FakeCursor {
        fn get(&self, column: &str) -> Result<Value, MapperError> {
            let row = self.current.as_ref().ok_or_else(|| MapperError::MissingColumn {
                column: column.to_string()
            })?;
            row.iter()
                .find(|(name, _)| *name == column)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| MapperError::MissingColumn {
                    column: column.to_string()
                })
        }
    }

    impl ResultCursor for FakeCursor {
        fn advance(&mut self) -> Result<bool, MapperError> {
            self.current = self.rows.pop_front();
            Ok(self.current.is_some())
        }
    }

    impl Statement for FakeStatement {
        type Cursor<'a>
            = FakeCursor
        where
            Self: 'a;

        fn query(&mut self, args: &[Value]) -> Result<FakeCursor, MapperError> {
            self.log
                .borrow_mut()
                .executed
                .push((self.sql.clone(), args.to_vec()));
            let rows = match &self.reply {
                Reply::Rows(rows) => rows.clone(),
                Reply::Affected(_) => Vec::new()
            };
            Ok(FakeCursor {
                rows:    rows.into(),
                current: None
            })
        }

        fn update(&mut self, args: &[Value]) -> Result<u64, MapperError> {
            self.log
                .borrow_mut()
                .executed
                .push((self.sql.clone(), args.to_vec()));
            match &self.reply {
                Reply::Affected(count) => Ok(*count),
                Reply::Rows(_) => Ok(0)
            }
        }

        fn close(self) -> Result<(), MapperError> {
            self.log.borrow_mut().stmts_closed += 1;
            Ok(())
        }
    }

    impl Connection for FakeConnection {
        type Statement = FakeStatement;

        fn prepare(&mut self, sql: &str) -> Result<FakeStatement, MapperError> {
            self.log.borrow_mut().prepared.push(sql.to_string());
            let reply = self
                .replies
                .get(sql)
                .cloned()
                .unwrap_or(Reply::Rows(Vec::new()));
            Ok(FakeStatement {
                sql: sql.to_string(),
                reply,
                log: Rc::clone(&self.log)
            })
        }

        fn close(&mut self) -> Result<(), MapperError> {
            self.log.borrow_mut().conn_closed = true;
            Ok(())
        }
    }

    #[derive(Debug, PartialEq)]
    struct Gadget {
        id:   i32,
        name: String
    }

    impl Entity for Gadget {
        fn entity_name() -> &'static str {
            "Gadget"
        }

        fn table() -> &'static str {
            "gadget"
        }

        fn describe() -> Vec<FieldMeta> {
            vec![
                FieldMeta {
                    name:       "id",
                    kind:       FieldKind::Integer,
                    is_key:     true,
                    is_serial:  true,
                    not_null:   false,
                    is_unique:  false,
                    references: None
                },
                FieldMeta {
                    name:       "name",
                    kind:       FieldKind::Text,
                    is_key:     false,
                    is_serial:  false,
                    not_null:   true,
                    is_unique:  false,
                    references: None
                },
            ]
        }

        fn value(&self, field: &str) -> Value {
            match field {
                "id" => Value::Int(self.id),
                "name" => Value::Text(self.name.clone()),
                _ => Value::Null
            }
        }

        fn from_row(row: &dyn RowAccess) -> Result<Self, MapperError> {
            Ok(Self {
                id:   row.get("id")?.into_int("id")?,
                name: row.get("name")?.into_text("name")?
            })
        }
    }

    fn session_with(
        replies: &[(&str, Reply)]
    ) -> (Session<FakeConnection>, Rc<RefCell<DriverLog>>) {
        let log = Rc::new(RefCell::new(DriverLog::default()));
        let conn = FakeConnection {
            replies: replies
                .iter()
                .map(|(sql, reply)| (sql.to_string(), reply.clone()))
                .collect(),
            log:     Rc::clone(&log)
        };
        (Session::new(conn), log)
    }

    fn gadget_row(id: i32, name: &str) -> Row {
        vec![
            ("id", Value::Int(id)),
            ("name", Value::Text(name.to_string())),
        ]
    }

    #[test]
    fn read_extracts_the_first_row() {
        let (mut session, _log) = session_with(&[(
            "SELECT * FROM gadget WHERE id=?",
            Reply::Rows(vec![gadget_row(7, "wrench")])
        )]);
        let found: Option<Gadget> = session.read(Value::Int(7)).unwrap();
        assert_eq!(
            found,
            Some(Gadget {
                id:   7,
                name: "wrench".to_string()
            })
        );
    }

    #[test]
    fn read_miss_is_none_not_an_error() {
        let (mut session, _log) =
            session_with(&[("SELECT * FROM gadget WHERE id=?", Reply::Rows(vec![]))]);
        let found: Option<Gadget> = session.read(Value::Int(1)).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn statements_are_prepared_once_per_operation() {
        let (mut session, log) = session_with(&[(
            "SELECT * FROM gadget WHERE id=?",
            Reply::Rows(vec![gadget_row(1, "a")])
        )]);
        let _: Option<Gadget> = session.read(Value::Int(1)).unwrap();
        let _: Option<Gadget> = session.read(Value::Int(2)).unwrap();
        assert_eq!(log.borrow().prepared.len(), 1);
        assert_eq!(log.borrow().executed.len(), 2);
    }

    #[test]
    fn update_reports_cardinality() {
        let (mut session, _log) = session_with(&[(
            "UPDATE gadget SET name=? WHERE id=?",
            Reply::Affected(1)
        )]);
        let item = Gadget {
            id:   3,
            name: "bolt".to_string()
        };
        assert!(session.update(&item).unwrap());

        let (mut session, _log) = session_with(&[(
            "UPDATE gadget SET name=? WHERE id=?",
            Reply::Affected(0)
        )]);
        assert!(!session.update(&item).unwrap());
    }

    #[test]
    fn update_binds_fields_then_key() {
        let (mut session, log) = session_with(&[(
            "UPDATE gadget SET name=? WHERE id=?",
            Reply::Affected(1)
        )]);
        let item = Gadget {
            id:   3,
            name: "bolt".to_string()
        };
        session.update(&item).unwrap();
        let log = log.borrow();
        let (_, args) = &log.executed[0];
        assert_eq!(args, &[Value::Text("bolt".to_string()), Value::Int(3)]);
    }

    #[test]
    fn create_returns_the_database_row() {
        let (mut session, log) = session_with(&[(
            "INSERT INTO gadget (name) VALUES (?) RETURNING *",
            Reply::Rows(vec![gadget_row(42, "hammer")])
        )]);
        let created = session
            .create(&Gadget {
                id:   0,
                name: "hammer".to_string()
            })
            .unwrap();
        assert_eq!(created.id, 42);
        // the serial id is not in the INSERT parameter list
        let log = log.borrow();
        let (_, args) = &log.executed[0];
        assert_eq!(args, &[Value::Text("hammer".to_string())]);
    }

    #[test]
    fn create_with_no_returned_row_is_an_error() {
        let (mut session, _log) = session_with(&[(
            "INSERT INTO gadget (name) VALUES (?) RETURNING *",
            Reply::Rows(vec![])
        )]);
        let err = session
            .create(&Gadget {
                id:   0,
                name: "x".to_string()
            })
            .unwrap_err();
        assert!(matches!(err, MapperError::EmptyReturn { entity: "Gadget" }));
    }

    #[test]
    fn read_all_collects_every_row() {
        let (mut session, _log) = session_with(&[(
            "SELECT * FROM gadget",
            Reply::Rows(vec![gadget_row(1, "a"), gadget_row(2, "b")])
        )]);
        let items: Vec<Gadget> = session.read_all().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].name, "b");
    }

    #[test]
    fn bad_row_aborts_read_all() {
        let (mut session, _log) = session_with(&[(
            "SELECT * FROM gadget",
            Reply::Rows(vec![
                gadget_row(1, "a"),
                vec![("id", Value::Int(2))], // name column missing
            ])
        )]);
        let result: Result<Vec<Gadget>, _> = session.read_all();
        assert!(matches!(
            result.unwrap_err(),
            MapperError::MissingColumn { column } if column == "name"
        ));
    }

    #[test]
    fn close_releases_statements_and_connection() {
        let (mut session, log) = session_with(&[(
            "DELETE FROM gadget WHERE id=?",
            Reply::Affected(1)
        )]);
        assert!(session.delete::<Gadget>(Value::Int(1)).unwrap());
        session.close().unwrap();
        let log = log.borrow();
        assert_eq!(log.stmts_closed, 1);
        assert!(log.conn_closed);
    }
}
