//! Database abstraction layer for Sage.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends (and mocks in tests) to be used
//! interchangeably.

mod mock;
mod postgres;
mod schema;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use schema::{Column, ForeignKey, Index, Schema, Table};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::DatabaseConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Creates a database client for the given configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &DatabaseConfig) -> Result<Box<dyn DatabaseClient>> {
    let client = PostgresClient::connect(config).await?;
    Ok(Box::new(client))
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with SageError.
/// Implementations must be thread-safe; one client is shared across requests.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Introspects the database schema, returning table and relationship information.
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Checks that a statement is syntactically valid by running `EXPLAIN`
    /// against it, without executing the statement itself.
    async fn validate_syntax(&self, sql: &str) -> Result<()>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
