//! Retrieval tool over uploaded PDFs.

use super::{parse_query, query_schema, Tool, PDF_SEARCH};
use crate::chunking::{split_documents, RecursiveCharacterSplitter};
use crate::embedding::Embedder;
use crate::error::{HjelperError, Result};
use crate::loader::{fingerprint_all, load_pdfs, SourceDocument, UploadedFile};
use crate::vector_store::{Document, MemoryVectorStore, VectorStore};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// Similarity search over an index built from the uploaded PDFs.
pub struct PdfSearchTool {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    k: usize,
    description: String,
    fingerprint: String,
}

impl PdfSearchTool {
    /// Build the index from PDF uploads.
    ///
    /// Every file is parsed; a malformed PDF aborts the whole build.
    #[instrument(skip_all, fields(files = files.len()))]
    pub async fn from_uploads(
        files: &[UploadedFile],
        embedder: Arc<dyn Embedder>,
        splitter: &RecursiveCharacterSplitter,
        k: usize,
        description: &str,
        temp_dir: &Path,
    ) -> Result<Self> {
        if files.is_empty() {
            return Err(HjelperError::InvalidInput(
                "PDF search needs at least one uploaded file".to_string(),
            ));
        }

        let documents = load_pdfs(files, temp_dir).await?;
        let mut tool = Self::from_documents(&documents, embedder, splitter, k, description).await?;
        tool.fingerprint = fingerprint_all(files);
        Ok(tool)
    }

    /// Build the index from already extracted pages.
    pub async fn from_documents(
        documents: &[SourceDocument],
        embedder: Arc<dyn Embedder>,
        splitter: &RecursiveCharacterSplitter,
        k: usize,
        description: &str,
    ) -> Result<Self> {
        let chunks = split_documents(splitter, documents);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        let docs: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Document::from_chunk(chunk, embedding))
            .collect();

        let store = Arc::new(MemoryVectorStore::new());
        let indexed = store.upsert_batch(&docs).await?;
        info!("Indexed {} chunks from {} pages", indexed, documents.len());

        Ok(Self {
            store,
            embedder,
            k,
            description: description.to_string(),
            fingerprint: String::new(),
        })
    }

    /// Fingerprint of the uploads the index was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Number of indexed chunks.
    pub async fn chunk_count(&self) -> Result<usize> {
        self.store.document_count().await
    }

    /// Return the contents of the `k` chunks closest to the query.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<String>> {
        let embedding = self.embedder.embed(query).await?;
        let results = self.store.search(&embedding, self.k).await?;
        Ok(results.into_iter().map(|r| r.document.content).collect())
    }
}

#[async_trait]
impl Tool for PdfSearchTool {
    fn name(&self) -> &str {
        PDF_SEARCH
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> serde_json::Value {
        query_schema("query to look up in retriever")
    }

    async fn call(&self, arguments: &str) -> Result<String> {
        let query = parse_query(arguments)?;
        Ok(self.retrieve(&query).await?.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkingConfig;
    use crate::embedding::testing::LetterEmbedder;

    fn splitter() -> RecursiveCharacterSplitter {
        RecursiveCharacterSplitter::new(ChunkingConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_retrieves_closest_chunk_first() {
        let docs = vec![
            SourceDocument::new("zzzz zzzz", "a.pdf", 0),
            SourceDocument::new("aaaa bbbb", "a.pdf", 1),
            SourceDocument::new("xxxx yyyy", "b.pdf", 0),
        ];

        let tool = PdfSearchTool::from_documents(&docs, Arc::new(LetterEmbedder), &splitter(), 2, "pdf")
            .await
            .unwrap();
        assert_eq!(tool.chunk_count().await.unwrap(), 3);

        let hits = tool.retrieve("abab").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0], "aaaa bbbb");
    }

    #[tokio::test]
    async fn test_call_joins_chunks_with_blank_lines() {
        let docs = vec![
            SourceDocument::new("aaaa", "a.pdf", 0),
            SourceDocument::new("aaab", "a.pdf", 1),
        ];
        let tool = PdfSearchTool::from_documents(&docs, Arc::new(LetterEmbedder), &splitter(), 4, "pdf")
            .await
            .unwrap();

        let observation = tool.call(r#"{"query": "a"}"#).await.unwrap();
        assert_eq!(observation, "aaaa\n\naaab");
        assert_eq!(tool.name(), PDF_SEARCH);
    }

    #[tokio::test]
    async fn test_empty_upload_list_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = PdfSearchTool::from_uploads(&[], Arc::new(LetterEmbedder), &splitter(), 4, "pdf", dir.path())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, HjelperError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_malformed_pdf_aborts_build() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![UploadedFile::new("bad.pdf", b"garbage".to_vec())];
        let result =
            PdfSearchTool::from_uploads(&files, Arc::new(LetterEmbedder), &splitter(), 4, "pdf", dir.path()).await;
        assert!(matches!(result, Err(HjelperError::Pdf(_))));
    }
}
