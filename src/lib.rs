//! Single-connection SQLite query execution engine.
//!
//! # Intention
//!
//! - Execute SQL text with positional parameters against one owned connection.
//! - Classify statements by prefix to pick the execution primitive and result
//!   shape.
//! - Retry transiently-busy executions, log slow and failed queries, and
//!   notify lifecycle subscribers before and after every execution.
//!
//! # Architectural Boundaries
//!
//! - No connection pooling, SQL generation, or migration orchestration here;
//!   those live upstream and are consumed through narrow interfaces.
//! - Collaborators (broadcaster, logger) are injected at construction, never
//!   reached through globals.

pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod logger;
pub mod result;
pub mod runner;
pub mod value;

pub use config::SqliteConfig;
pub use database::SqliteDatabase;
pub use error::{Result, RunnerError};
pub use events::{
    BroadcasterResult, EventBroadcaster, QueryEvent, QueryResultEvent, QuerySubscriber,
};
pub use logger::{NoopQueryLogger, QueryLogger, TracingQueryLogger};
pub use result::{ExecutionResult, QueryOutcome, RawPayload};
pub use runner::{SqliteQueryRunner, StatementKind};
pub use value::{Row, Value};
