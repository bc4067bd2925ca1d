//! CRUD façade over one SQLite store.

use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::schema::{default_tables, ensure_tables, TableDescriptor, KV_TABLE};
use crate::sql::{delete, insert, quoted, select_where, update, Condition, QueryBuf, Row, SqliteBindValue};
use crate::store::Store;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::Connection;
use std::path::Path;

/// Owns the store and runs the default-table bootstrap before the first statement.
///
/// Every method takes `&mut self`: there is no internal locking, callers sharing a
/// `Database` across tasks serialize access themselves (see [`crate::state::SharedDatabase`]).
pub struct Database {
    store: Store,
    tables: Vec<TableDescriptor>,
    bootstrap: bool,
    bootstrapped: bool,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        Ok(Self::from_store(Store::open(path)?))
    }

    pub fn open_with(config: &DatabaseConfig) -> Result<Self, AppError> {
        let mut db = Self::from_store(Store::open_with(config)?);
        db.bootstrap = config.bootstrap;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self, AppError> {
        Ok(Self::from_store(Store::in_memory()?))
    }

    pub fn from_store(store: Store) -> Self {
        Database {
            store,
            tables: default_tables(),
            bootstrap: true,
            bootstrapped: false,
        }
    }

    /// Register extra tables for the bootstrap. Takes effect on the next bootstrap run.
    pub fn with_tables(mut self, tables: impl IntoIterator<Item = TableDescriptor>) -> Self {
        self.tables.extend(tables);
        self.bootstrapped = false;
        self
    }

    pub fn path(&self) -> &str {
        self.store.path()
    }

    /// Create the registered tables now. Safe to call any number of times.
    pub async fn bootstrap(&mut self) -> Result<(), AppError> {
        let conn = self.store.connection().await?;
        ensure_tables(conn, &self.tables).await?;
        self.bootstrapped = true;
        Ok(())
    }

    async fn conn(&mut self) -> Result<&mut SqliteConnection, AppError> {
        if self.bootstrap && !self.bootstrapped {
            self.bootstrap().await?;
        }
        self.store.connection().await
    }

    /// Insert one row. Returns the new rowid.
    pub async fn insert(&mut self, table: &str, row: &Row) -> Result<i64, AppError> {
        let q = insert(table, row)?;
        tracing::debug!(sql = %q.sql, params = q.params.len(), "insert");
        let conn = self.conn().await?;
        let result = bind_all(&q).execute(&mut *conn).await?;
        Ok(result.last_insert_rowid())
    }

    /// Insert rows in one transaction; any failure rolls back every row. Returns rowids in input order.
    pub async fn insert_many(&mut self, table: &str, rows: &[Row]) -> Result<Vec<i64>, AppError> {
        let queries = rows.iter().map(|row| insert(table, row)).collect::<Result<Vec<_>, _>>()?;
        let conn = self.conn().await?;
        let mut tx = conn.begin().await?;
        tracing::debug!(table, rows = queries.len(), "insert_many");
        let mut ids = Vec::with_capacity(queries.len());
        for q in &queries {
            let result = bind_all(q).execute(&mut *tx).await?;
            ids.push(result.last_insert_rowid());
        }
        tx.commit().await?;
        Ok(ids)
    }

    /// Update rows matching `condition`. Returns the affected count; zero is not an error.
    pub async fn update(&mut self, table: &str, row: &Row, condition: &Condition) -> Result<u64, AppError> {
        let q = update(table, row, condition)?;
        self.run(&q).await
    }

    /// Delete rows matching `condition`. Returns the affected count; zero is not an error.
    pub async fn delete(&mut self, table: &str, condition: &Condition) -> Result<u64, AppError> {
        let q = delete(table, condition)?;
        self.run(&q).await
    }

    /// All rows of `table` matching `condition`, in rowid order.
    pub async fn select(&mut self, table: &str, condition: &Condition) -> Result<Vec<Row>, AppError> {
        let q = select_where(table, condition)?;
        self.query_many(&q).await
    }

    pub async fn fetch_one(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>, AppError> {
        let q = QueryBuf {
            sql: sql.to_string(),
            params: params.to_vec(),
        };
        tracing::debug!(sql = %q.sql, params = q.params.len(), "query");
        let conn = self.conn().await?;
        let row = bind_all(&q).fetch_optional(&mut *conn).await?;
        Ok(row.as_ref().map(row_to_json))
    }

    pub async fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, AppError> {
        let q = QueryBuf {
            sql: sql.to_string(),
            params: params.to_vec(),
        };
        self.query_many(&q).await
    }

    /// Run any statement. Returns the affected count.
    pub async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, AppError> {
        let q = QueryBuf {
            sql: sql.to_string(),
            params: params.to_vec(),
        };
        self.run(&q).await
    }

    /// Upsert into the key-value table. The value is stored as JSON text.
    pub async fn kv_set(&mut self, key: &str, value: &Value) -> Result<(), AppError> {
        let sql = format!(
            "INSERT INTO {} (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            quoted(KV_TABLE)
        );
        self.execute(&sql, &[Value::from(key), Value::from(value.to_string())]).await?;
        Ok(())
    }

    pub async fn kv_get(&mut self, key: &str) -> Result<Option<Value>, AppError> {
        let sql = format!("SELECT value FROM {} WHERE key = ?", quoted(KV_TABLE));
        let row = self.fetch_one(&sql, &[Value::from(key)]).await?;
        Ok(row.and_then(|mut r| r.remove("value")).map(decode_kv_value))
    }

    pub async fn kv_delete(&mut self, key: &str) -> Result<u64, AppError> {
        self.delete(KV_TABLE, &Condition::eq("key", key)).await
    }

    /// Every (key, value) pair, ordered by key. Keys not stored as TEXT are read back as text.
    pub async fn kv_list(&mut self) -> Result<Vec<(String, Value)>, AppError> {
        let sql = format!(
            "SELECT CAST(key AS TEXT) AS key, value FROM {} ORDER BY key",
            quoted(KV_TABLE)
        );
        let rows = self.fetch_all(&sql, &[]).await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut r| {
                let key = match r.remove("key") {
                    Some(Value::String(k)) => k,
                    Some(Value::Null) | None => {
                        tracing::warn!(table = KV_TABLE, "skipping row with NULL key");
                        return None;
                    }
                    Some(other) => other.to_string(),
                };
                let value = r.remove("value").map(decode_kv_value).unwrap_or(Value::Null);
                Some((key, value))
            })
            .collect())
    }

    /// `SELECT 1` on the live handle.
    pub async fn ping(&mut self) -> Result<(), AppError> {
        let conn = self.store.connection().await?;
        sqlx::query("SELECT 1").fetch_optional(&mut *conn).await?;
        Ok(())
    }

    pub async fn close(self) -> Result<(), AppError> {
        self.store.close().await
    }

    async fn run(&mut self, q: &QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = q.params.len(), "execute");
        let conn = self.conn().await?;
        let result = bind_all(q).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    async fn query_many(&mut self, q: &QueryBuf) -> Result<Vec<Row>, AppError> {
        tracing::debug!(sql = %q.sql, params = q.params.len(), "query");
        let conn = self.conn().await?;
        let rows = bind_all(q).fetch_all(&mut *conn).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

fn bind_all(q: &QueryBuf) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    q.params
        .iter()
        .fold(sqlx::query(&q.sql), |query, p| query.bind(SqliteBindValue::from_json(p)))
}

/// Values written by `kv_set` are JSON; anything else written directly comes back as a string.
fn decode_kv_value(v: Value) -> Value {
    match v {
        Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
        other => other,
    }
}

fn row_to_json(row: &SqliteRow) -> Row {
    use sqlx::Column;
    use sqlx::Row as _;
    let mut map = Row::new();
    for col in row.columns() {
        map.insert(col.name().to_string(), cell_to_value(row, col.ordinal()));
    }
    map
}

/// Decode by the value's runtime storage class, not the declared column type.
fn cell_to_value(row: &SqliteRow, idx: usize) -> Value {
    use sqlx::Row as _;
    use sqlx::{TypeInfo, ValueRef};
    let Ok(raw) = row.try_get_raw(idx) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }
    let storage = raw.type_info().name().to_string();
    match storage.as_str() {
        "INTEGER" => row.try_get::<i64, _>(idx).map(Value::from).unwrap_or(Value::Null),
        "REAL" => row
            .try_get::<f64, _>(idx)
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(idx)
            .map(|bytes| Value::Array(bytes.into_iter().map(Value::from).collect()))
            .unwrap_or(Value::Null),
        _ => row.try_get::<String, _>(idx).map(Value::String).unwrap_or(Value::Null),
    }
}
