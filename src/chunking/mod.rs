//! Content chunking for breaking extracted document text into searchable windows.

mod recursive;

pub use recursive::RecursiveCharacterSplitter;

use crate::loader::SourceDocument;
use serde::{Deserialize, Serialize};

/// A chunk of text from an uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentChunk {
    /// Text content of this chunk.
    pub content: String,
    /// File name the chunk came from.
    pub source: String,
    /// Zero-based page number within the source.
    pub page: usize,
    /// Order of this chunk across the whole upload set.
    pub order: usize,
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl From<&crate::config::ChunkingSettings> for ChunkingConfig {
    fn from(settings: &crate::config::ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}

/// Split page-level documents into chunks, keeping page metadata.
pub fn split_documents(
    splitter: &RecursiveCharacterSplitter,
    documents: &[SourceDocument],
) -> Vec<ContentChunk> {
    let mut chunks = Vec::new();
    for doc in documents {
        for content in splitter.split_text(&doc.content) {
            chunks.push(ContentChunk {
                content,
                source: doc.source.clone(),
                page: doc.page,
                order: chunks.len(),
            });
        }
    }
    chunks
}
