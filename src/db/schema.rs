//! Database schema types for Sage.
//!
//! Represents the structure of a database including tables, columns, foreign
//! keys, and indexes, plus the textual renditions fed to the language model
//! and indexed for retrieval.

use serde::{Deserialize, Serialize};

/// Represents the complete schema of a database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    /// All tables in the schema.
    pub tables: Vec<Table>,

    /// Foreign key relationships between tables.
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Formats the whole schema for inclusion in a generation prompt.
    pub fn format_for_llm(&self) -> String {
        let tables_text = self
            .tables
            .iter()
            .map(|table| format!("{}\n", table.describe(&self.foreign_keys)))
            .collect::<Vec<_>>()
            .join("");

        format!("Database Schema:\n\n{}", tables_text)
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Represents a database table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in the table.
    pub columns: Vec<Column>,

    /// Column names that form the primary key.
    pub primary_key: Vec<String>,

    /// Indexes on the table.
    pub indexes: Vec<Index>,
}

impl Table {
    /// Creates a new table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Produces a human-readable description of the table.
    ///
    /// Used both as prompt context and as the document text indexed for
    /// schema retrieval. Lists columns with PK/NOT NULL annotations, then
    /// any foreign keys leaving this table, then unique indexes.
    pub fn describe(&self, foreign_keys: &[ForeignKey]) -> String {
        let mut description = format!("Table: {}\n", self.name);
        description.push_str("Columns:\n");

        for column in &self.columns {
            description.push_str(&format!("- {} ({})", column.name, column.data_type));
            if self.primary_key.contains(&column.name) {
                description.push_str(" [Primary Key]");
            }
            if !column.is_nullable {
                description.push_str(" [Not Null]");
            }
            if let Some(default) = &column.default {
                description.push_str(&format!(" [Default {}]", default));
            }
            description.push('\n');
        }

        let own_fks: Vec<&ForeignKey> = foreign_keys
            .iter()
            .filter(|fk| fk.from_table == self.name)
            .collect();
        if !own_fks.is_empty() {
            description.push_str("\nForeign Keys:\n");
            for fk in own_fks {
                description.push_str(&format!(
                    "- {} -> {}.{}\n",
                    fk.from_columns.join(", "),
                    fk.to_table,
                    fk.to_columns.join(", ")
                ));
            }
        }

        let unique_indexes: Vec<&Index> =
            self.indexes.iter().filter(|idx| idx.is_unique).collect();
        if !unique_indexes.is_empty() {
            description.push_str("\nUnique Indexes:\n");
            for idx in unique_indexes {
                description.push_str(&format!("- {} ({})\n", idx.name, idx.columns.join(", ")));
            }
        }

        description
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Data type (e.g., "integer", "varchar(255)").
    pub data_type: String,

    /// Whether the column allows NULL values.
    pub is_nullable: bool,

    /// Default value expression, if any.
    pub default: Option<String>,
}

impl Column {
    /// Creates a new column with the given name and data type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default: None,
        }
    }

    /// Sets whether the column is nullable.
    pub fn nullable(self, nullable: bool) -> Self {
        Self {
            is_nullable: nullable,
            ..self
        }
    }

    /// Sets the default value.
    pub fn with_default(self, default: impl Into<String>) -> Self {
        Self {
            default: Some(default.into()),
            ..self
        }
    }
}

/// Represents a foreign key relationship between tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Source table name.
    pub from_table: String,

    /// Source column names.
    pub from_columns: Vec<String>,

    /// Target table name.
    pub to_table: String,

    /// Target column names.
    pub to_columns: Vec<String>,
}

impl ForeignKey {
    /// Creates a new foreign key relationship.
    pub fn new(
        from_table: impl Into<String>,
        from_columns: Vec<String>,
        to_table: impl Into<String>,
        to_columns: Vec<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_columns,
            to_table: to_table.into(),
            to_columns,
        }
    }
}

/// Represents an index on a table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,

    /// Column names included in the index.
    pub columns: Vec<String>,

    /// Whether this is a unique index.
    pub is_unique: bool,
}

impl Index {
    /// Creates a new index with the given name and columns.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            is_unique: false,
        }
    }

    /// Sets whether the index is unique.
    pub fn unique(self, unique: bool) -> Self {
        Self {
            is_unique: unique,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
                    indexes: vec![Index::new(
                        "customers_email_key",
                        vec!["email".to_string()],
                    )
                    .unique(true)],
                },
                Table {
                    name: "orders".to_string(),
                    columns: vec![
                        Column::new("id", "integer").nullable(false),
                        Column::new("customer_id", "integer"),
                        Column::new("total_amount", "numeric(10,2)").nullable(false),
                        Column::new("order_date", "timestamp").with_default("CURRENT_TIMESTAMP"),
                    ],
                    primary_key: vec!["id".to_string()],
                    indexes: vec![],
                },
            ],
            foreign_keys: vec![ForeignKey::new(
                "orders",
                vec!["customer_id".to_string()],
                "customers",
                vec!["id".to_string()],
            )],
        }
    }

    #[test]
    fn test_describe_lists_columns_with_annotations() {
        let schema = sample_schema();
        let description = schema.tables[0].describe(&schema.foreign_keys);

        assert!(description.contains("Table: customers"));
        assert!(description.contains("- id (integer) [Primary Key] [Not Null]"));
        assert!(description.contains("- email (varchar(100)) [Not Null]"));
        assert!(description.contains("- phone (varchar(20))"));
        assert!(description.contains("Unique Indexes:"));
        assert!(description.contains("customers_email_key (email)"));
    }

    #[test]
    fn test_describe_includes_foreign_keys() {
        let schema = sample_schema();
        let description = schema.tables[1].describe(&schema.foreign_keys);

        assert!(description.contains("Foreign Keys:"));
        assert!(description.contains("- customer_id -> customers.id"));
        assert!(description.contains("[Default CURRENT_TIMESTAMP]"));
    }

    #[test]
    fn test_describe_omits_unrelated_foreign_keys() {
        let schema = sample_schema();
        let description = schema.tables[0].describe(&schema.foreign_keys);
        assert!(!description.contains("Foreign Keys:"));
    }

    #[test]
    fn test_format_for_llm_contains_all_tables() {
        let schema = sample_schema();
        let formatted = schema.format_for_llm();

        assert!(formatted.starts_with("Database Schema:"));
        assert!(formatted.contains("Table: customers"));
        assert!(formatted.contains("Table: orders"));
    }

    #[test]
    fn test_table_lookup() {
        let schema = sample_schema();
        assert!(schema.table("orders").is_some());
        assert!(schema.table("missing").is_none());
    }

    #[test]
    fn test_column_builder() {
        let col = Column::new("email", "varchar(255)")
            .nullable(false)
            .with_default("''");
        assert_eq!(col.name, "email");
        assert!(!col.is_nullable);
        assert_eq!(col.default, Some("''".to_string()));
    }
}
