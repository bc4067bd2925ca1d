//! Connection manager: one SQLite file, one lazily opened handle per `Store`.
//!
//! The handle is created on the first call to [`Store::connection`] and lives until
//! [`Store::close`] or until the `Store` is dropped, whichever comes first.

use crate::config::DatabaseConfig;
use crate::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const MEMORY_PATH: &str = ":memory:";

pub struct Store {
    path: String,
    options: SqliteConnectOptions,
    conn: Option<SqliteConnection>,
}

impl Store {
    /// Open a store at `path` with default options. The file is created if missing;
    /// fails with `StorageUnavailable` when it cannot be created or written.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let config = DatabaseConfig {
            path: path.as_ref().to_string_lossy().into_owned(),
            ..DatabaseConfig::default()
        };
        Self::open_with(&config)
    }

    pub fn open_with(config: &DatabaseConfig) -> Result<Self, AppError> {
        if config.path == MEMORY_PATH {
            return Self::in_memory();
        }
        let path = Path::new(&config.path);
        ensure_writable(path)?;
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .disable_statement_logging();
        Ok(Self {
            path: config.path.clone(),
            options,
            conn: None,
        })
    }

    /// Private in-memory database; contents vanish when the handle is released.
    pub fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true)
            .disable_statement_logging();
        Ok(Self {
            path: MEMORY_PATH.into(),
            options,
            conn: None,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Borrow the live handle, connecting first if needed. The borrow is tied to `&mut self`,
    /// so the handle cannot escape the store.
    pub async fn connection(&mut self) -> Result<&mut SqliteConnection, AppError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                let conn = self.options.connect().await.map_err(|e| AppError::StorageUnavailable {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?;
                tracing::debug!(path = %self.path, "sqlite connection opened");
                conn
            }
        };
        Ok(self.conn.insert(conn))
    }

    /// Release the handle gracefully. Dropping the store releases it as well.
    pub async fn close(mut self) -> Result<(), AppError> {
        if let Some(conn) = self.conn.take() {
            conn.close().await?;
            tracing::debug!(path = %self.path, "sqlite connection closed");
        }
        Ok(())
    }
}

/// Probe that the file can be created and opened for writing.
fn ensure_writable(path: &Path) -> Result<(), AppError> {
    let unavailable = |reason: String| AppError::StorageUnavailable {
        path: path.display().to_string(),
        reason,
    };
    if path.as_os_str().is_empty() {
        return Err(unavailable("empty path".into()));
    }
    if path.is_dir() {
        return Err(unavailable("path is a directory".into()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(unavailable(format!("parent directory {} does not exist", parent.display())));
        }
    }
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| unavailable(e.to_string()))
}
