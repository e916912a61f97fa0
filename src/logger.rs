//! Logging interface for executed, slow, and failed queries.

use std::time::Duration;

use crate::value::Value;

/// Receives structured notifications around query execution.
///
/// Implementations must be cheap: the runner calls these synchronously on the
/// execution path.
pub trait QueryLogger: Send + Sync {
    /// A query is about to be executed.
    fn log_query(&self, query: &str, parameters: &[Value]);
    /// An execution exceeded the configured slow-query threshold.
    fn log_query_slow(&self, elapsed: Duration, query: &str, parameters: &[Value]);
    /// The driver rejected a query.
    fn log_query_error(&self, error: &rusqlite::Error, query: &str, parameters: &[Value]);
}

/// Default logger emitting `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingQueryLogger;

impl QueryLogger for TracingQueryLogger {
    fn log_query(&self, query: &str, parameters: &[Value]) {
        tracing::debug!(query, parameters = ?parameters, "executing query");
    }

    fn log_query_slow(&self, elapsed: Duration, query: &str, parameters: &[Value]) {
        tracing::warn!(
            elapsed_ms = elapsed.as_millis() as u64,
            query,
            parameters = ?parameters,
            "query exceeded maximum execution time"
        );
    }

    fn log_query_error(&self, error: &rusqlite::Error, query: &str, parameters: &[Value]) {
        tracing::error!(error = %error, query, parameters = ?parameters, "query failed");
    }
}

/// Logger that drops everything. Useful in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopQueryLogger;

impl QueryLogger for NoopQueryLogger {
    fn log_query(&self, _query: &str, _parameters: &[Value]) {}
    fn log_query_slow(&self, _elapsed: Duration, _query: &str, _parameters: &[Value]) {}
    fn log_query_error(&self, _error: &rusqlite::Error, _query: &str, _parameters: &[Value]) {}
}
