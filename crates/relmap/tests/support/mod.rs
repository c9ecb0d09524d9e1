// SPDX-License-Identifier: MIT

//! Scriptable in-memory driver: each prepared SQL string is answered with a
//! canned [`Reply`], and every driver call is recorded in a shared log.

#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    rc::Rc
};

use relmap::{Connection, MapperError, ResultCursor, RowAccess, Statement, Value};

pub type Row = Vec<(&'static str, Value)>;

#[derive(Clone)]
pub enum Reply {
    Rows(Vec<Row>),
    Affected(u64)
}

#[derive(Default)]
pub struct DriverLog {
    pub prepared:     Vec<String>,
    pub executed:     Vec<(String, Vec<Value>)>,
    pub stmts_closed: usize,
    pub conn_closed:  bool
}

pub struct ScriptedConnection {
    replies: HashMap<String, Reply>,
    log:     Rc<RefCell<DriverLog>>
}

pub struct ScriptedStatement {
    sql:   String,
    reply: Reply,
    log:   Rc<RefCell<DriverLog>>
}

pub struct ScriptedCursor {
    rows:    VecDeque<Row>,
    current: Option<Row>
}

pub fn connection_with(
    replies: &[(&str, Reply)]
) -> (ScriptedConnection, Rc<RefCell<DriverLog>>) {
    let log = Rc::new(RefCell::new(DriverLog::default()));
    let conn = ScriptedConnection {
        replies: replies
            .iter()
            .map(|(sql, reply)| (sql.to_string(), reply.clone()))
            .collect(),
        log:     Rc::clone(&log)
    };
    (conn, log)
}

impl RowAccess for ScriptedCursor {
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

impl ResultCursor for ScriptedCursor {
    fn advance(&mut self) -> Result<bool, MapperError> {
        self.current = self.rows.pop_front();
        Ok(self.current.is_some())
    }
}

impl Statement for ScriptedStatement {
    type Cursor<'a>
        = ScriptedCursor
    where
        Self: 'a;

    fn query(&mut self, args: &[Value]) -> Result<ScriptedCursor, MapperError> {
        self.log
            .borrow_mut()
            .executed
            .push((self.sql.clone(), args.to_vec()));
        let rows = match &self.reply {
            Reply::Rows(rows) => rows.clone(),
            Reply::Affected(_) => Vec::new()
        };
        Ok(ScriptedCursor {
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

impl Connection for ScriptedConnection {
    type Statement = ScriptedStatement;

    fn prepare(&mut self, sql: &str) -> Result<ScriptedStatement, MapperError> {
        self.log.borrow_mut().prepared.push(sql.to_string());
        let reply = self
            .replies
            .get(sql)
            .cloned()
            .unwrap_or(Reply::Rows(Vec::new()));
        Ok(ScriptedStatement {
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
