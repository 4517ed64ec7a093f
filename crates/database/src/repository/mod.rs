use crate::connection::Database;

mod animals;
mod farms;
mod fincas;
mod users;
mod usuarios;

pub use fincas::FincaWithCount;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and the explicit mapping
/// between rows and the `core-types` entities.
///
/// Methods are grouped per entity in the submodules of this module.
#[derive(Debug, Clone)]
pub struct DbRepository {
    db: Database,
}

impl DbRepository {
    /// Creates a new `DbRepository` on top of a shared database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
