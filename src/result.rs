//! Normalized execution results.

use crate::value::Row;

/// Raw payload of an execution, shaped by the statement kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// Last-inserted rowid, reported for `INSERT` statements.
    LastInsertId(i64),
    /// Row set, reported by the read executor.
    Rows(Vec<Row>),
    /// `UPDATE`/`DELETE`: the driver reports counts only, no payload.
    Empty,
}

impl RawPayload {
    /// The rows of a row-shaped payload.
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            RawPayload::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// The last-inserted rowid of an insert payload.
    pub fn last_insert_id(&self) -> Option<i64> {
        match self {
            RawPayload::LastInsertId(id) => Some(*id),
            _ => None,
        }
    }
}

/// Full structured result of one execution.
///
/// `records` is present only when the underlying payload is row-shaped;
/// `affected` only for mutating statements.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub raw: RawPayload,
    pub records: Option<Vec<Row>>,
    pub affected: Option<u64>,
}

impl ExecutionResult {
    /// Result of a mutating statement. `last_insert_id` is `Some` only for
    /// inserts.
    pub(crate) fn mutated(last_insert_id: Option<i64>, affected: u64) -> Self {
        Self {
            raw: match last_insert_id {
                Some(id) => RawPayload::LastInsertId(id),
                None => RawPayload::Empty,
            },
            records: None,
            affected: Some(affected),
        }
    }

    /// Result of a read (or other row-returning) statement.
    pub(crate) fn rows(rows: Vec<Row>) -> Self {
        Self {
            raw: RawPayload::Rows(rows.clone()),
            records: Some(rows),
            affected: None,
        }
    }
}

/// What the caller gets back, depending on the structured-result preference.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Raw(RawPayload),
    Structured(ExecutionResult),
}

impl QueryOutcome {
    /// The raw payload, regardless of shape preference.
    pub fn raw(&self) -> &RawPayload {
        match self {
            QueryOutcome::Raw(raw) => raw,
            QueryOutcome::Structured(result) => &result.raw,
        }
    }

    pub fn into_structured(self) -> Option<ExecutionResult> {
        match self {
            QueryOutcome::Structured(result) => Some(result),
            QueryOutcome::Raw(_) => None,
        }
    }
}
