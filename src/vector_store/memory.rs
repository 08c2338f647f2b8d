//! In-memory vector store implementation.
//!
//! Upload sets live for one session, so the index never touches disk.

use super::{cosine_similarity, Document, SearchResult, VectorStore};
use crate::error::{HjelperError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> HjelperError {
    HjelperError::VectorStore("index lock poisoned".to_string())
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.documents.write().map_err(poisoned)?;
        for doc in docs {
            store.insert(doc.id.to_string(), doc.clone());
        }
        Ok(docs.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let docs = self.documents.read().map_err(poisoned)?;

        let mut results: Vec<SearchResult> = docs
            .values()
            .map(|doc| SearchResult {
                document: doc.clone(),
                score: cosine_similarity(query_embedding, &doc.embedding),
            })
            .collect();

        // Ties fall back to chunk order so results are stable
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.document.chunk_order.cmp(&b.document.chunk_order))
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn document_count(&self) -> Result<usize> {
        let docs = self.documents.read().map_err(poisoned)?;
        Ok(docs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ContentChunk;

    fn doc(content: &str, order: usize, embedding: Vec<f32>) -> Document {
        Document::from_chunk(
            ContentChunk {
                content: content.to_string(),
                source: "test.pdf".to_string(),
                page: 0,
                order,
            },
            embedding,
        )
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store
            .upsert_batch(&[
                doc("Hello world", 0, vec![1.0, 0.0, 0.0]),
                doc("Goodbye world", 1, vec![0.0, 1.0, 0.0]),
                doc("Hello again", 2, vec![0.9, 0.1, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.document_count().await.unwrap(), 3);

        let results = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document.content, "Hello world");
        assert_eq!(results[1].document.content, "Hello again");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_equal_scores_ordered_by_chunk() {
        let store = MemoryVectorStore::new();
        store
            .upsert_batch(&[
                doc("second", 1, vec![1.0, 0.0]),
                doc("first", 0, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results[0].document.content, "first");
        assert_eq!(results[1].document.content, "second");
    }

    #[test]
    fn test_search_empty_store() {
        let store = MemoryVectorStore::new();
        let results = tokio_test::block_on(store.search(&[1.0, 0.0], 4)).unwrap();
        assert!(results.is_empty());
    }
}
