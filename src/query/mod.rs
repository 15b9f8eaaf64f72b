//! Query shaping and execution for Sage.
//!
//! This module isolates the read-only execution policy: bounding result size,
//! gating generated statements, and formatting result rows for API clients.

pub mod executor;
pub mod shaper;

pub use executor::{ExecutionOutcome, QueryExecutor};
pub use shaper::{format_row, format_rows, shape_for_execution, RowObject, DEFAULT_ROW_LIMIT};
