//! Default table DDL. Every statement is `CREATE TABLE IF NOT EXISTS`, so running the
//! bootstrap against an initialized store changes nothing.

use crate::error::AppError;
use crate::sql::quoted;
use sqlx::sqlite::SqliteConnection;
use sqlx::Connection;

pub const USERS_TABLE: &str = "users";
pub const KV_TABLE: &str = "app_data";

/// Table name plus ordered (column, declared type) pairs. Used only for bootstrap DDL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<(String, String)>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, decl: impl Into<String>) -> Self {
        self.columns.push((name.into(), decl.into()));
        self
    }

    pub fn create_sql(&self) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|(name, decl)| format!("{} {}", quoted(name), decl))
            .collect();
        format!("CREATE TABLE IF NOT EXISTS {} ({})", quoted(&self.name), cols.join(", "))
    }
}

/// `users` and the generic key-value `app_data` table.
pub fn default_tables() -> Vec<TableDescriptor> {
    vec![
        TableDescriptor::new(USERS_TABLE)
            .column("id", "INTEGER PRIMARY KEY AUTOINCREMENT")
            .column("username", "TEXT UNIQUE NOT NULL")
            .column("email", "TEXT UNIQUE NOT NULL")
            .column("created_at", "TIMESTAMP DEFAULT CURRENT_TIMESTAMP"),
        TableDescriptor::new(KV_TABLE)
            .column("key", "TEXT PRIMARY KEY")
            .column("value", "TEXT")
            .column("created_at", "TIMESTAMP DEFAULT CURRENT_TIMESTAMP")
            .column("updated_at", "TIMESTAMP DEFAULT CURRENT_TIMESTAMP"),
    ]
}

/// Create every table in one transaction.
pub async fn ensure_tables(conn: &mut SqliteConnection, tables: &[TableDescriptor]) -> Result<(), AppError> {
    let mut tx = conn.begin().await?;
    for table in tables {
        if table.columns.is_empty() {
            return Err(AppError::BadRequest(format!("table {} has no columns", table.name)));
        }
        let ddl = table.create_sql();
        tracing::debug!(sql = %ddl, "bootstrap");
        sqlx::query(&ddl).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::info!(tables = tables.len(), "schema bootstrap complete");
    Ok(())
}
