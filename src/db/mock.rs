//! Mock database clients for testing.
//!
//! Provides in-memory implementations of `DatabaseClient` so engines can be
//! exercised without a running PostgreSQL instance. The mock records every
//! statement it executes, letting tests assert that rejected statements never
//! reach the database.

use super::{Column, ColumnInfo, DatabaseClient, ForeignKey, QueryResult, Schema, Table, Value};
use crate::error::{Result, SageError};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// A mock database client that returns predefined results.
pub struct MockDatabaseClient {
    schema: Schema,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with the sample store schema.
    pub fn new() -> Self {
        Self {
            schema: sample_schema(),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Creates a new mock database client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Returns every statement executed so far, in order.
    pub fn executed_statements(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    /// Drains the execution log, returning what was recorded.
    ///
    /// Useful to discard setup traffic before the assertions of interest.
    pub fn take_executed_statements(&self) -> Vec<String> {
        std::mem::take(&mut *self.executed.lock().unwrap())
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.executed.lock().unwrap().push(sql.to_string());

        let columns = vec![
            ColumnInfo::new("id", "integer"),
            ColumnInfo::new("name", "varchar"),
            ColumnInfo::new("total_amount", "numeric"),
        ];
        let rows = vec![
            vec![
                Value::Int(1),
                Value::String("Alice Kim".to_string()),
                Value::String("1500000.00".to_string()),
            ],
            vec![
                Value::Int(2),
                Value::String("Bob Park".to_string()),
                Value::Null,
            ],
        ];

        Ok(QueryResult::with_data(columns, rows)
            .with_execution_time(Duration::from_millis(1)))
    }

    async fn validate_syntax(&self, _sql: &str) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A mock database client whose executions always fail.
///
/// Used to test the error path through engines and the executor.
pub struct FailingDatabaseClient;

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(sample_schema())
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(SageError::query("relation \"customers\" does not exist"))
    }

    async fn validate_syntax(&self, _sql: &str) -> Result<()> {
        Err(SageError::query("syntax error at or near \"FROM\""))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// The sample store schema used across tests: customers, products, orders.
fn sample_schema() -> Schema {
    Schema {
        tables: vec![
            Table {
                name: "customers".to_string(),
                columns: vec![
                    Column::new("id", "integer").nullable(false),
                    Column::new("name", "varchar(100)").nullable(false),
                    Column::new("email", "varchar(100)").nullable(false),
                    Column::new("phone", "varchar(20)"),
                ],
                primary_key: vec!["id".to_string()],
                indexes: vec![],
            },
            Table {
                name: "products".to_string(),
                columns: vec![
                    Column::new("id", "integer").nullable(false),
                    Column::new("name", "varchar(100)").nullable(false),
                    Column::new("price", "numeric(10,2)").nullable(false),
                    Column::new("category", "varchar(50)"),
                    Column::new("stock_quantity", "integer").with_default("0"),
                ],
                primary_key: vec!["id".to_string()],
                indexes: vec![],
            },
            Table {
                name: "orders".to_string(),
                columns: vec![
                    Column::new("id", "integer").nullable(false),
                    Column::new("customer_id", "integer"),
                    Column::new("product_id", "integer"),
                    Column::new("quantity", "integer").nullable(false),
                    Column::new("total_amount", "numeric(10,2)").nullable(false),
                    Column::new("order_date", "timestamp").with_default("CURRENT_TIMESTAMP"),
                ],
                primary_key: vec!["id".to_string()],
                indexes: vec![],
            },
        ],
        foreign_keys: vec![
            ForeignKey::new(
                "orders",
                vec!["customer_id".to_string()],
                "customers",
                vec!["id".to_string()],
            ),
            ForeignKey::new(
                "orders",
                vec!["product_id".to_string()],
                "products",
                vec!["id".to_string()],
            ),
        ],
    }
}
