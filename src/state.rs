//! Shared application state for the database-backed routes.

use crate::service::Database;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One `Database` shared across handlers. The mutex is what serializes access to the single
/// SQLite handle; `Database` itself does no locking.
pub type SharedDatabase = Arc<Mutex<Database>>;

#[derive(Clone)]
pub struct AppState {
    pub db: SharedDatabase,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }
}
