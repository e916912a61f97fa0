//! Database and runner configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration consumed by [`crate::SqliteDatabase`] and its runners.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SqliteConfig {
    /// Path to the SQLite database file. `:memory:` opens an in-memory
    /// database.
    pub path: String,
    /// Fixed delay between attempts when the database reports a busy lock.
    /// Zero disables retry entirely.
    #[serde(default)]
    pub busy_error_retry_delay_ms: u64,
    /// Threshold above which an execution is logged as slow. Absent disables
    /// slow-query logging. Observational only, never aborts the driver call.
    #[serde(default)]
    pub max_query_execution_time_ms: Option<u64>,
}

impl SqliteConfig {
    /// Create a config for a file-backed database with retry and slow-query
    /// logging disabled.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            busy_error_retry_delay_ms: 0,
            max_query_execution_time_ms: None,
        }
    }

    /// Create a config for an in-memory database.
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    pub fn with_busy_error_retry_delay_ms(mut self, delay_ms: u64) -> Self {
        self.busy_error_retry_delay_ms = delay_ms;
        self
    }

    pub fn with_max_query_execution_time_ms(mut self, threshold_ms: u64) -> Self {
        self.max_query_execution_time_ms = Some(threshold_ms);
        self
    }

    /// Retry delay, or `None` when retry is disabled.
    pub(crate) fn retry_delay(&self) -> Option<Duration> {
        if self.busy_error_retry_delay_ms > 0 {
            Some(Duration::from_millis(self.busy_error_retry_delay_ms))
        } else {
            None
        }
    }

    /// Slow-query threshold, or `None` when slow-query logging is disabled.
    pub(crate) fn slow_query_threshold(&self) -> Option<Duration> {
        self.max_query_execution_time_ms.map(Duration::from_millis)
    }
}
