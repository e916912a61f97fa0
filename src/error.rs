//! Error taxonomy for the query runner.

use thiserror::Error;

use crate::value::Value;

/// Failures surfaced by the runner and its owning database.
///
/// Busy-lock driver errors are handled internally by the retry controller and
/// only reach the caller wrapped in [`RunnerError::QueryFailed`] once retry is
/// disabled or the failure is not transient.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The runner was released; the state transition is one-way.
    #[error("query runner is already released")]
    RunnerAlreadyReleased,

    /// The owning database has not completed initialization.
    #[error("database connection is not initialized")]
    ConnectionNotInitialized,

    /// Opening the database file failed.
    #[error("failed to open sqlite database at {path}")]
    OpenFailed {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// The driver rejected the statement; carries full context for diagnosis.
    #[error("query failed: {query}")]
    QueryFailed {
        query: String,
        parameters: Vec<Value>,
        #[source]
        source: rusqlite::Error,
    },
}

pub type Result<T> = std::result::Result<T, RunnerError>;
