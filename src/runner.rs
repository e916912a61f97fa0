//! The query runner: classification, execution, busy retry, and lifecycle
//! notifications around one owned connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rusqlite::{params_from_iter, Connection, ErrorCode};

use crate::database::SqliteDatabase;
use crate::error::{Result, RunnerError};
use crate::events::{BroadcasterResult, EventBroadcaster, QueryResultEvent};
use crate::logger::QueryLogger;
use crate::result::{ExecutionResult, QueryOutcome};
use crate::value::{Row, Value};

/// Statement kind derived from the query text prefix.
///
/// Classification is case- and space-sensitive: the literal prefixes
/// `"INSERT "`, `"DELETE "`, and `"UPDATE "` select the mutating executor,
/// everything else runs through the read executor. The kind is recomputed per
/// call and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    ReadOrOther,
}

impl StatementKind {
    pub fn classify(query: &str) -> Self {
        if query.starts_with("INSERT ") {
            StatementKind::Insert
        } else if query.starts_with("DELETE ") {
            StatementKind::Delete
        } else if query.starts_with("UPDATE ") {
            StatementKind::Update
        } else {
            StatementKind::ReadOrOther
        }
    }

    pub fn is_mutating(self) -> bool {
        !matches!(self, StatementKind::ReadOrOther)
    }
}

/// Output of one driver attempt.
enum AttemptOutput {
    Mutated { last_insert_id: i64, affected: u64 },
    Rows(Vec<Row>),
}

/// True for the transient lock-contention failure signature.
fn is_busy_error(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

/// Single-connection query execution engine.
///
/// Exclusively owns its database's connection for the runner's lifetime; one
/// outstanding execution at a time. `release` is a one-way transition after
/// which every execution fails synchronously.
pub struct SqliteQueryRunner {
    database: Arc<SqliteDatabase>,
    broadcaster: Arc<EventBroadcaster>,
    logger: Arc<dyn QueryLogger>,
    released: AtomicBool,
}

impl SqliteQueryRunner {
    pub(crate) fn new(
        database: Arc<SqliteDatabase>,
        broadcaster: Arc<EventBroadcaster>,
        logger: Arc<dyn QueryLogger>,
    ) -> Self {
        Self {
            database,
            broadcaster,
            logger,
            released: AtomicBool::new(false),
        }
    }

    /// Acquire the shared connection handle. Idempotent while the runner is
    /// active.
    pub fn connect(&self) -> Result<Arc<Mutex<Connection>>> {
        if self.is_released() {
            return Err(RunnerError::RunnerAlreadyReleased);
        }
        self.database.connection()
    }

    /// One-way transition to the released state.
    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Execute a query with positional parameters.
    ///
    /// Fires one before-event and, once the driver has been reached, one
    /// after-event per call; the broadcaster completion token is awaited
    /// last on every exit path. Busy-lock failures are retried on a fixed
    /// delay while retry is configured, with no attempt cap; intermediate
    /// attempts are observationally invisible.
    ///
    /// With `structured` the caller receives the full [`ExecutionResult`],
    /// otherwise just the raw payload.
    ///
    /// The released check is synchronous and happens before any broadcast.
    /// The connection-initialized check happens after the before-broadcast,
    /// so a before-event is observable even for a call that fails it.
    pub async fn execute(
        &self,
        query: &str,
        parameters: &[Value],
        structured: bool,
    ) -> Result<QueryOutcome> {
        if self.is_released() {
            return Err(RunnerError::RunnerAlreadyReleased);
        }
        let kind = StatementKind::classify(query);
        let mut broadcast = BroadcasterResult::new();
        self.broadcaster
            .broadcast_before_query(&mut broadcast, query, parameters);
        let outcome = self
            .execute_with_retry(kind, query, parameters, structured, &mut broadcast)
            .await;
        broadcast.wait().await;
        outcome
    }

    /// Toggle referential integrity off for a migration batch.
    pub async fn before_migration(&self) -> Result<()> {
        self.execute("PRAGMA foreign_keys = OFF", &[], false).await?;
        Ok(())
    }

    /// Re-enable referential integrity after a migration batch.
    pub async fn after_migration(&self) -> Result<()> {
        self.execute("PRAGMA foreign_keys = ON", &[], false).await?;
        Ok(())
    }

    async fn execute_with_retry(
        &self,
        kind: StatementKind,
        query: &str,
        parameters: &[Value],
        structured: bool,
        broadcast: &mut BroadcasterResult,
    ) -> Result<QueryOutcome> {
        let connection = self.connect()?;
        let started = Instant::now();
        self.logger.log_query(query, parameters);
        let retry_delay = self.database.config().retry_delay();

        loop {
            match Self::run_attempt(&connection, kind, query, parameters) {
                Ok(output) => {
                    let elapsed = started.elapsed();
                    self.check_slow_query(elapsed, query, parameters);
                    let result = Self::build_result(kind, output);
                    self.broadcaster.broadcast_after_query(
                        broadcast,
                        QueryResultEvent {
                            query: query.to_string(),
                            parameters: parameters.to_vec(),
                            success: true,
                            execution_time: Some(elapsed),
                            raw: Some(result.raw.clone()),
                            error: None,
                        },
                    );
                    return Ok(if structured {
                        QueryOutcome::Structured(result)
                    } else {
                        QueryOutcome::Raw(result.raw)
                    });
                }
                Err(error) => {
                    if let Some(delay) = retry_delay {
                        if is_busy_error(&error) {
                            // Transient lock contention: resubmit the same
                            // text and parameters after the configured delay.
                            // No log, no broadcast for this attempt.
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                    let elapsed = started.elapsed();
                    self.check_slow_query(elapsed, query, parameters);
                    self.logger.log_query_error(&error, query, parameters);
                    self.broadcaster.broadcast_after_query(
                        broadcast,
                        QueryResultEvent {
                            query: query.to_string(),
                            parameters: parameters.to_vec(),
                            success: false,
                            execution_time: None,
                            raw: None,
                            error: Some(error.to_string()),
                        },
                    );
                    return Err(RunnerError::QueryFailed {
                        query: query.to_string(),
                        parameters: parameters.to_vec(),
                        source: error,
                    });
                }
            }
        }
    }

    fn check_slow_query(&self, elapsed: Duration, query: &str, parameters: &[Value]) {
        if let Some(threshold) = self.database.config().slow_query_threshold() {
            if elapsed > threshold {
                self.logger.log_query_slow(elapsed, query, parameters);
            }
        }
    }

    /// One driver attempt. The connection lock is held only for the duration
    /// of the attempt, never across the retry delay.
    fn run_attempt(
        connection: &Mutex<Connection>,
        kind: StatementKind,
        query: &str,
        parameters: &[Value],
    ) -> rusqlite::Result<AttemptOutput> {
        let conn = connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if kind.is_mutating() {
            let affected = conn.execute(query, params_from_iter(parameters.iter()))?;
            Ok(AttemptOutput::Mutated {
                last_insert_id: conn.last_insert_rowid(),
                affected: affected as u64,
            })
        } else {
            let mut stmt = conn.prepare(query)?;
            let columns: Vec<String> = stmt
                .column_names()
                .iter()
                .map(|name| name.to_string())
                .collect();
            let mut rows = stmt.query(params_from_iter(parameters.iter()))?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Row::new();
                for (idx, name) in columns.iter().enumerate() {
                    record.insert(name.clone(), Value::from(row.get_ref(idx)?));
                }
                records.push(record);
            }
            Ok(AttemptOutput::Rows(records))
        }
    }

    fn build_result(kind: StatementKind, output: AttemptOutput) -> ExecutionResult {
        match output {
            AttemptOutput::Mutated {
                last_insert_id,
                affected,
            } => {
                let id = (kind == StatementKind::Insert).then_some(last_insert_id);
                ExecutionResult::mutated(id, affected)
            }
            AttemptOutput::Rows(rows) => ExecutionResult::rows(rows),
        }
    }
}
