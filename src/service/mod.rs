//! Database: CRUD façade built on the safe SQL builder.

mod crud;
pub use crud::Database;
