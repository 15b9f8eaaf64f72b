//! Context retrieval for question answering.
//!
//! Maintains the knowledge base — live table schemas, a business-term
//! glossary, and worked SQL examples — as three partitions of an embedded
//! vector index, and answers similarity searches over them when a question
//! comes in.

pub mod index;
pub mod seeds;

pub use index::{ScoredDocument, StoredDocument, VectorIndex};

use std::path::PathBuf;
use std::sync::Arc;

use crate::db::DatabaseClient;
use crate::error::Result;
use crate::llm::EmbeddingClient;
use crate::query::shaper::format_rows;
use serde::Serialize;
use tracing::{info, warn};

/// Partition holding table-schema documents.
pub const TABLE_SCHEMAS: &str = "table_schemas";

/// Partition holding business-term glossary documents.
pub const BUSINESS_TERMS: &str = "business_terms";

/// Partition holding worked SQL examples.
pub const SQL_EXAMPLES: &str = "sql_examples";

/// Default retrieval depth per partition.
pub const DEFAULT_TOP_K: usize = 3;

/// Sample rows appended to each schema document.
const SAMPLE_ROWS: usize = 3;

/// Context retrieved for a question, one hit list per partition.
#[derive(Debug, Default)]
pub struct RetrievedContext {
    pub table_schemas: Vec<ScoredDocument>,
    pub business_terms: Vec<ScoredDocument>,
    pub sql_examples: Vec<ScoredDocument>,
}

impl RetrievedContext {
    /// Document texts of the schema hits, best first.
    pub fn schema_texts(&self) -> Vec<String> {
        self.table_schemas.iter().map(|d| d.text.clone()).collect()
    }

    /// Document texts of the glossary hits, best first.
    pub fn term_texts(&self) -> Vec<String> {
        self.business_terms.iter().map(|d| d.text.clone()).collect()
    }

    /// Document texts of the example hits, best first.
    pub fn example_texts(&self) -> Vec<String> {
        self.sql_examples.iter().map(|d| d.text.clone()).collect()
    }

    /// The best `k` documents across all partitions, joined for prompt use.
    pub fn concatenated(&self, k: usize) -> String {
        let mut all: Vec<&ScoredDocument> = self
            .table_schemas
            .iter()
            .chain(self.business_terms.iter())
            .chain(self.sql_examples.iter())
            .collect();
        all.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        all.into_iter()
            .take(k)
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Total number of retrieved documents.
    pub fn len(&self) -> usize {
        self.table_schemas.len() + self.business_terms.len() + self.sql_examples.len()
    }

    /// True when nothing was retrieved.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Document counts per partition, for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionStats {
    pub name: String,
    pub count: usize,
}

/// Knowledge-base retriever over the vector index.
pub struct Retriever {
    index: VectorIndex,
    embeddings: Arc<dyn EmbeddingClient>,
    persist_path: Option<PathBuf>,
}

impl Retriever {
    /// Creates a retriever, loading a previously persisted index when one
    /// exists at the configured path.
    pub fn new(embeddings: Arc<dyn EmbeddingClient>, persist_path: Option<PathBuf>) -> Self {
        let index = match &persist_path {
            Some(path) if path.exists() => match VectorIndex::load(path) {
                Ok(index) => {
                    info!("Loaded vector index from {}", path.display());
                    index
                }
                Err(e) => {
                    warn!("Could not load vector index ({}), starting empty", e);
                    VectorIndex::new()
                }
            },
            _ => VectorIndex::new(),
        };

        Self {
            index,
            embeddings,
            persist_path,
        }
    }

    /// (Re)builds the knowledge base: live schema descriptions plus the
    /// seeded glossary and SQL examples.
    ///
    /// Returns the total number of documents indexed.
    pub async fn initialize(&self, db: &dyn DatabaseClient) -> Result<usize> {
        let mut total = 0;

        total += self.index_table_schemas(db).await?;
        total += self.index_business_terms().await?;
        total += self.index_sql_examples().await?;

        if let Some(path) = &self.persist_path {
            self.index.save(path)?;
        }

        info!("Knowledge base initialized with {} documents", total);
        Ok(total)
    }

    /// Searches every partition for the question, `top_k` hits each.
    pub async fn search_context(&self, question: &str, top_k: usize) -> Result<RetrievedContext> {
        let query_embedding = self.embeddings.embed(question).await?;

        Ok(RetrievedContext {
            table_schemas: self.index.search(TABLE_SCHEMAS, &query_embedding, top_k),
            business_terms: self.index.search(BUSINESS_TERMS, &query_embedding, top_k),
            sql_examples: self.index.search(SQL_EXAMPLES, &query_embedding, top_k),
        })
    }

    /// Returns document counts per partition.
    pub fn stats(&self) -> Vec<PartitionStats> {
        [TABLE_SCHEMAS, BUSINESS_TERMS, SQL_EXAMPLES]
            .iter()
            .map(|name| PartitionStats {
                name: name.to_string(),
                count: self.index.count(name),
            })
            .collect()
    }

    /// Indexes a description of every user table in the target database.
    async fn index_table_schemas(&self, db: &dyn DatabaseClient) -> Result<usize> {
        let schema = db.introspect_schema().await?;

        let mut documents = Vec::with_capacity(schema.tables.len());
        let mut texts = Vec::with_capacity(schema.tables.len());

        for table in &schema.tables {
            let mut text = table.describe(&schema.foreign_keys);
            if let Some(samples) = self.fetch_sample_rows(db, &table.name).await {
                text.push_str(&samples);
            }

            texts.push(text.clone());
            documents.push((
                format!("table_{}", table.name),
                text,
                serde_json::json!({
                    "type": "table_schema",
                    "table_name": table.name,
                    "column_count": table.columns.len(),
                    "has_foreign_keys": schema
                        .foreign_keys
                        .iter()
                        .any(|fk| fk.from_table == table.name),
                }),
            ));
        }

        self.replace_partition(TABLE_SCHEMAS, documents, &texts)
            .await
    }

    /// Indexes the seeded business-term glossary.
    async fn index_business_terms(&self) -> Result<usize> {
        let mut documents = Vec::new();
        let mut texts = Vec::new();

        for term in seeds::business_terms() {
            let text = term.to_document_text();
            texts.push(text.clone());
            documents.push((
                format!("term_{}", term.term),
                text,
                serde_json::json!({
                    "type": "business_term",
                    "term": term.term,
                    "category": term.category,
                }),
            ));
        }

        self.replace_partition(BUSINESS_TERMS, documents, &texts)
            .await
    }

    /// Indexes the seeded SQL examples.
    async fn index_sql_examples(&self) -> Result<usize> {
        let mut documents = Vec::new();
        let mut texts = Vec::new();

        for (i, example) in seeds::sql_examples().iter().enumerate() {
            let text = example.to_document_text();
            texts.push(text.clone());
            documents.push((
                format!("sql_example_{}", i),
                text,
                serde_json::json!({
                    "type": "sql_example",
                    "complexity": example.complexity,
                    "question": example.question,
                }),
            ));
        }

        self.replace_partition(SQL_EXAMPLES, documents, &texts)
            .await
    }

    /// Embeds the texts and swaps the partition's contents.
    async fn replace_partition(
        &self,
        partition: &str,
        documents: Vec<(String, String, serde_json::Value)>,
        texts: &[String],
    ) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embeddings.embed_batch(texts).await?;

        let stored: Vec<StoredDocument> = documents
            .into_iter()
            .zip(embeddings)
            .map(|((id, text, metadata), embedding)| StoredDocument {
                id,
                text,
                metadata,
                embedding,
            })
            .collect();

        let count = stored.len();
        self.index.clear_partition(partition);
        self.index.add_documents(partition, stored);
        info!("Indexed {} documents into {}", count, partition);
        Ok(count)
    }

    /// Fetches a few sample rows to enrich a schema document.
    ///
    /// Failures are logged and skipped; sample data is best-effort.
    async fn fetch_sample_rows(&self, db: &dyn DatabaseClient, table: &str) -> Option<String> {
        let sql = format!("SELECT * FROM {} LIMIT {}", table, SAMPLE_ROWS);
        match db.execute_query(&sql).await {
            Ok(result) if !result.is_empty() => {
                let mut text = format!("\nSample data (first {} rows):\n", result.row_count);
                for (i, row) in format_rows(&result).iter().enumerate() {
                    let rendered = serde_json::to_string(row).unwrap_or_default();
                    text.push_str(&format!("Row {}: {}\n", i + 1, rendered));
                }
                Some(text)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Could not fetch sample rows for {}: {}", table, e);
                None
            }
        }
    }
}
