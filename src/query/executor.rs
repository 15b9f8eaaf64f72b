//! Gated query execution.
//!
//! Provides the single path through which generated SQL reaches the
//! database: safety gate, then result-size shaping, then execution, then
//! row formatting. Every engine goes through this executor; no statement is
//! executed without passing the gate first.

use std::sync::Arc;
use std::time::Duration;

use crate::db::DatabaseClient;
use crate::error::{Result, SageError};
use crate::query::shaper::{format_rows, shape_for_execution, RowObject, DEFAULT_ROW_LIMIT};
use crate::safety;
use tracing::{debug, warn};

/// Query executor that gates, shapes, and runs generated statements.
pub struct QueryExecutor {
    db: Arc<dyn DatabaseClient>,
    row_limit: usize,
}

impl QueryExecutor {
    /// Creates a new executor over the given database client.
    pub fn new(db: Arc<dyn DatabaseClient>) -> Self {
        Self {
            db,
            row_limit: DEFAULT_ROW_LIMIT,
        }
    }

    /// Overrides the default row limit applied to unbounded statements.
    pub fn with_row_limit(mut self, row_limit: usize) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Returns the database client this executor runs against.
    pub fn db(&self) -> &Arc<dyn DatabaseClient> {
        &self.db
    }

    /// Gates and executes a candidate statement.
    ///
    /// Returns `SageError::UnsafeQuery` when the gate rejects the candidate;
    /// execution and formatting errors keep their own kinds so callers can
    /// tell a rejection from a failure.
    pub async fn execute(&self, candidate: &str) -> Result<ExecutionOutcome> {
        if let Some(reason) = safety::rejection_reason(candidate) {
            warn!("Rejected generated statement: {}", reason);
            return Err(SageError::unsafe_query(reason));
        }

        let sql = shape_for_execution(candidate, self.row_limit);
        debug!("Executing: {}", sql);

        let result = self.db.execute_query(&sql).await?;
        let columns = result.column_names();
        let data = format_rows(&result);

        Ok(ExecutionOutcome {
            sql,
            columns,
            row_count: data.len(),
            data,
            execution_time: result.execution_time,
        })
    }

    /// Checks a candidate's syntax without executing it.
    ///
    /// The gate runs first; syntactically valid but unsafe statements are
    /// still rejected.
    pub async fn validate(&self, candidate: &str) -> Result<()> {
        if let Some(reason) = safety::rejection_reason(candidate) {
            return Err(SageError::unsafe_query(reason));
        }
        self.db.validate_syntax(candidate).await
    }
}

/// Successful execution outcome in wire form.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// The statement as actually executed (after shaping).
    pub sql: String,
    /// Ordered column names.
    pub columns: Vec<String>,
    /// Stringified rows.
    pub data: Vec<RowObject>,
    /// Number of rows returned.
    pub row_count: usize,
    /// Time the database spent executing.
    pub execution_time: Duration,
}
