//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a table name, a row map and a condition.
//! Values never appear in the SQL text; every one is pushed to `QueryBuf::params` behind a `?`.

use crate::error::AppError;
use serde_json::{Map, Value};

/// One result row or one row to write: column name -> value.
pub type Row = Map<String, Value>;

/// Quote identifier for SQLite. Embedded double quotes are doubled.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }
}

/// WHERE clause: SQL using only anonymous `?` placeholders, plus the values bound to them in order.
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    clause: String,
    params: Vec<Value>,
}

impl Condition {
    /// Matches every row.
    pub fn always() -> Self {
        Condition {
            clause: "1 = 1".into(),
            params: Vec::new(),
        }
    }

    /// `column = ?`, or `column IS NULL` for a null value.
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if value.is_null() {
            return Condition {
                clause: format!("{} IS NULL", quoted(column)),
                params: Vec::new(),
            };
        }
        Condition {
            clause: format!("{} = ?", quoted(column)),
            params: vec![value],
        }
    }

    /// Every pair must match (AND). No pairs matches every row.
    pub fn all<K, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        pairs
            .into_iter()
            .map(|(k, v)| Condition::eq(k.as_ref(), v))
            .reduce(Condition::and)
            .unwrap_or_else(Condition::always)
    }

    /// Hand-written clause. Must use `?` for every value; `params` are bound in order.
    pub fn raw(clause: impl Into<String>, params: Vec<Value>) -> Self {
        Condition {
            clause: clause.into(),
            params,
        }
    }

    pub fn and(mut self, other: Condition) -> Self {
        self.clause = format!("({}) AND ({})", self.clause, other.clause);
        self.params.extend(other.params);
        self
    }

    pub fn clause(&self) -> &str {
        &self.clause
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

fn check_table(table: &str) -> Result<(), AppError> {
    if table.trim().is_empty() {
        return Err(AppError::BadRequest("table name must not be empty".into()));
    }
    Ok(())
}

/// INSERT: one placeholder per column in `row`. Empty row inserts DEFAULT VALUES.
pub fn insert(table: &str, row: &Row) -> Result<QueryBuf, AppError> {
    check_table(table)?;
    let mut q = QueryBuf::new();
    if row.is_empty() {
        q.sql = format!("INSERT INTO {} DEFAULT VALUES", quoted(table));
        return Ok(q);
    }
    let mut cols = Vec::with_capacity(row.len());
    for (name, val) in row {
        cols.push(quoted(name));
        q.params.push(val.clone());
    }
    let placeholders = vec!["?"; cols.len()].join(", ");
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted(table),
        cols.join(", "),
        placeholders
    );
    Ok(q)
}

/// UPDATE: SET every column in `row`, WHERE `condition`. SET params come before WHERE params.
pub fn update(table: &str, row: &Row, condition: &Condition) -> Result<QueryBuf, AppError> {
    check_table(table)?;
    if row.is_empty() {
        return Err(AppError::BadRequest("update requires at least one column".into()));
    }
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(row.len());
    for (name, val) in row {
        sets.push(format!("{} = ?", quoted(name)));
        q.params.push(val.clone());
    }
    q.params.extend(condition.params().iter().cloned());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {}",
        quoted(table),
        sets.join(", "),
        condition.clause()
    );
    Ok(q)
}

/// DELETE rows matching `condition`.
pub fn delete(table: &str, condition: &Condition) -> Result<QueryBuf, AppError> {
    check_table(table)?;
    let mut q = QueryBuf::new();
    q.params.extend(condition.params().iter().cloned());
    q.sql = format!("DELETE FROM {} WHERE {}", quoted(table), condition.clause());
    Ok(q)
}

/// SELECT * matching `condition`, ordered by rowid so results are stable.
pub fn select_where(table: &str, condition: &Condition) -> Result<QueryBuf, AppError> {
    check_table(table)?;
    let mut q = QueryBuf::new();
    q.params.extend(condition.params().iter().cloned());
    q.sql = format!(
        "SELECT * FROM {} WHERE {} ORDER BY rowid",
        quoted(table),
        condition.clause()
    );
    Ok(q)
}
