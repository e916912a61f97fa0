//! Owning connection lifecycle.
//!
//! [`SqliteDatabase`] follows a two-phase lifecycle: construct with a config,
//! then `initialize` to open the physical connection. Runners created from an
//! uninitialized database fail their executions with
//! [`RunnerError::ConnectionNotInitialized`].

use std::sync::{Arc, Mutex, OnceLock};

use rusqlite::Connection;
use tracing::info;

use crate::config::SqliteConfig;
use crate::error::{Result, RunnerError};
use crate::events::EventBroadcaster;
use crate::logger::QueryLogger;
use crate::runner::SqliteQueryRunner;

/// Owns the single physical SQLite connection.
pub struct SqliteDatabase {
    config: SqliteConfig,
    connection: OnceLock<Arc<Mutex<Connection>>>,
}

impl SqliteDatabase {
    /// Create the database without touching the filesystem.
    pub fn new(config: SqliteConfig) -> Self {
        Self {
            config,
            connection: OnceLock::new(),
        }
    }

    /// Open the physical connection. Idempotent.
    pub fn initialize(&self) -> Result<()> {
        if self.connection.get().is_some() {
            return Ok(());
        }
        info!(path = %self.config.path, "opening sqlite database");
        let connection =
            Connection::open(&self.config.path).map_err(|source| RunnerError::OpenFailed {
                path: self.config.path.clone(),
                source,
            })?;
        // A concurrent initialize may have won the race; the extra
        // connection is dropped.
        let _ = self.connection.set(Arc::new(Mutex::new(connection)));
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.connection.get().is_some()
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// The shared handle, or `ConnectionNotInitialized` before `initialize`.
    pub(crate) fn connection(&self) -> Result<Arc<Mutex<Connection>>> {
        self.connection
            .get()
            .cloned()
            .ok_or(RunnerError::ConnectionNotInitialized)
    }

    /// Build a runner bound to this database with injected collaborators.
    pub fn create_runner(
        self: &Arc<Self>,
        broadcaster: Arc<EventBroadcaster>,
        logger: Arc<dyn QueryLogger>,
    ) -> SqliteQueryRunner {
        SqliteQueryRunner::new(Arc::clone(self), broadcaster, logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_idempotent() {
        let database = SqliteDatabase::new(SqliteConfig::in_memory());
        assert!(!database.is_initialized());
        database.initialize().unwrap();
        database.initialize().unwrap();
        assert!(database.is_initialized());
    }

    #[test]
    fn connection_before_initialize_fails() {
        let database = SqliteDatabase::new(SqliteConfig::in_memory());
        assert!(matches!(
            database.connection(),
            Err(RunnerError::ConnectionNotInitialized)
        ));
    }
}
