//! In-process vector index.
//!
//! Stores embedded documents in named partitions and answers top-K cosine
//! similarity searches. The whole index lives in memory and can be persisted
//! to a JSON file between runs; corpus sizes here are tens of documents, so
//! a linear scan per query is the right tool.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use crate::error::{Result, SageError};

/// A document stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Stable identifier, unique within its partition.
    pub id: String,
    /// The indexed text.
    pub text: String,
    /// Arbitrary metadata carried alongside the document.
    pub metadata: serde_json::Value,
    /// Embedding vector for the text.
    pub embedding: Vec<f32>,
}

/// A search hit: a document plus its similarity score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub id: String,
    pub text: String,
    pub metadata: serde_json::Value,
    pub score: f32,
}

/// Named-partition vector index with cosine-similarity search.
#[derive(Debug, Default)]
pub struct VectorIndex {
    partitions: RwLock<HashMap<String, Vec<StoredDocument>>>,
}

impl VectorIndex {
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds documents to a partition, creating it if needed.
    ///
    /// A document whose id already exists in the partition replaces the old
    /// entry.
    pub fn add_documents(&self, partition: &str, documents: Vec<StoredDocument>) {
        let mut partitions = self.partitions.write().unwrap();
        let entries = partitions.entry(partition.to_string()).or_default();

        for document in documents {
            if let Some(existing) = entries.iter_mut().find(|d| d.id == document.id) {
                *existing = document;
            } else {
                entries.push(document);
            }
        }
    }

    /// Removes every document from a partition.
    pub fn clear_partition(&self, partition: &str) {
        let mut partitions = self.partitions.write().unwrap();
        partitions.remove(partition);
    }

    /// Returns the top-K most similar documents in a partition.
    ///
    /// An unknown partition yields an empty result rather than an error;
    /// searches may run before the knowledge base is initialized.
    pub fn search(&self, partition: &str, query_embedding: &[f32], k: usize) -> Vec<ScoredDocument> {
        let partitions = self.partitions.read().unwrap();
        let Some(entries) = partitions.get(partition) else {
            return Vec::new();
        };

        let mut scored: Vec<ScoredDocument> = entries
            .iter()
            .map(|doc| ScoredDocument {
                id: doc.id.clone(),
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
                score: cosine_similarity(query_embedding, &doc.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }

    /// Returns the number of documents in a partition.
    pub fn count(&self, partition: &str) -> usize {
        let partitions = self.partitions.read().unwrap();
        partitions.get(partition).map(|p| p.len()).unwrap_or(0)
    }

    /// Returns the names of all partitions, sorted.
    pub fn partition_names(&self) -> Vec<String> {
        let partitions = self.partitions.read().unwrap();
        let mut names: Vec<String> = partitions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Persists the index to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SageError::retrieval(format!("Failed to create index directory: {e}"))
            })?;
        }

        let partitions = self.partitions.read().unwrap();
        let json = serde_json::to_string(&*partitions)
            .map_err(|e| SageError::retrieval(format!("Failed to serialize index: {e}")))?;

        std::fs::write(path, json)
            .map_err(|e| SageError::retrieval(format!("Failed to write index file: {e}")))
    }

    /// Loads an index from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SageError::retrieval(format!("Failed to read index file: {e}")))?;

        let partitions: HashMap<String, Vec<StoredDocument>> = serde_json::from_str(&content)
            .map_err(|e| SageError::retrieval(format!("Failed to parse index file: {e}")))?;

        Ok(Self {
            partitions: RwLock::new(partitions),
        })
    }
}

/// Computes the cosine similarity between two vectors.
///
/// Mismatched lengths compare over the shorter prefix; zero vectors score 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, embedding: Vec<f32>) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            text: format!("document {id}"),
            metadata: serde_json::json!({"type": "test"}),
            embedding,
        }
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let index = VectorIndex::new();
        index.add_documents(
            "docs",
            vec![
                doc("aligned", vec![1.0, 0.0]),
                doc("orthogonal", vec![0.0, 1.0]),
                doc("diagonal", vec![1.0, 1.0]),
            ],
        );

        let hits = index.search("docs", &[1.0, 0.0], 3);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, "aligned");
        assert_eq!(hits[1].id, "diagonal");
        assert_eq!(hits[2].id, "orthogonal");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_search_truncates_to_k() {
        let index = VectorIndex::new();
        index.add_documents(
            "docs",
            (0..10).map(|i| doc(&format!("d{i}"), vec![1.0, i as f32])).collect(),
        );

        assert_eq!(index.search("docs", &[1.0, 0.0], 3).len(), 3);
    }

    #[test]
    fn test_search_unknown_partition_is_empty() {
        let index = VectorIndex::new();
        assert!(index.search("missing", &[1.0], 5).is_empty());
    }

    #[test]
    fn test_add_replaces_same_id() {
        let index = VectorIndex::new();
        index.add_documents("docs", vec![doc("a", vec![1.0, 0.0])]);
        index.add_documents("docs", vec![doc("a", vec![0.0, 1.0])]);

        assert_eq!(index.count("docs"), 1);
        let hits = index.search("docs", &[0.0, 1.0], 1);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_clear_partition() {
        let index = VectorIndex::new();
        index.add_documents("docs", vec![doc("a", vec![1.0])]);
        index.clear_partition("docs");
        assert_eq!(index.count("docs"), 0);
    }

    #[test]
    fn test_partition_names_sorted() {
        let index = VectorIndex::new();
        index.add_documents("zeta", vec![doc("a", vec![1.0])]);
        index.add_documents("alpha", vec![doc("b", vec![1.0])]);
        assert_eq!(index.partition_names(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = VectorIndex::new();
        index.add_documents("docs", vec![doc("a", vec![0.5, 0.5])]);
        index.save(&path).unwrap();

        let loaded = VectorIndex::load(&path).unwrap();
        assert_eq!(loaded.count("docs"), 1);
        let hits = loaded.search("docs", &[0.5, 0.5], 1);
        assert_eq!(hits[0].id, "a");
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
