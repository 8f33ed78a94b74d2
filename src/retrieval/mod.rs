//! Semantic retrieval service client and types.
//!
//! The vector index itself (embeddings, similarity search, chunk
//! ingestion) lives in a separate service; the pipeline only issues
//! `(query, k)` searches through the [`SemanticIndex`] trait and reads
//! back scored chunks with their ingestion-time metadata.

mod client;

pub use client::HttpSemanticIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalResult;

/// A candidate chunk returned by the semantic index.
///
/// `distance` is a similarity metric in `[0, 1]`, lower = more similar,
/// consistent with a cosine-based index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// Chunk text content.
    pub text: String,
    /// Ingestion-time metadata.
    pub metadata: ChunkMetadata,
    /// Raw similarity distance (lower = more similar).
    pub distance: f64,
}

/// Metadata attached to a chunk by the ingestion collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source document label.
    #[serde(default = "unknown_source")]
    pub source: String,
    /// Position of the chunk within its source document.
    #[serde(default)]
    pub chunk_id: u32,
    /// Content-type flag set by ingestion; read-only here.
    #[serde(rename = "type", default)]
    pub chunk_type: ChunkType,
}

fn unknown_source() -> String {
    "Unknown".to_string()
}

/// Content-type flag distinguishing priority summary chunks from
/// ordinary content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    /// Ordinary document content.
    #[default]
    Content,
    /// Priority chunk consolidating key facts from tabular or listed
    /// source content.
    StructuredSummary,
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkType::Content => write!(f, "content"),
            ChunkType::StructuredSummary => write!(f, "structured_summary"),
        }
    }
}

/// Nearest-neighbor search against the external semantic index.
///
/// Returns up to `k` chunks ordered by ascending distance; may return
/// fewer if the corpus is smaller, or an error on transport failure.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Search for the `k` nearest chunks to `query`.
    async fn search(&self, query: &str, k: usize) -> RetrievalResult<Vec<ScoredChunk>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_type_deserialization() {
        let chunk: ScoredChunk = serde_json::from_str(
            r#"{"text":"t","metadata":{"source":"a.pdf","chunk_id":3,"type":"structured_summary"},"distance":0.12}"#,
        )
        .unwrap();
        assert_eq!(chunk.metadata.chunk_type, ChunkType::StructuredSummary);
        assert_eq!(chunk.metadata.source, "a.pdf");
    }

    #[test]
    fn test_metadata_defaults() {
        // Ingestion may omit fields; the pipeline must not care.
        let chunk: ScoredChunk =
            serde_json::from_str(r#"{"text":"t","metadata":{},"distance":0.5}"#).unwrap();
        assert_eq!(chunk.metadata.chunk_type, ChunkType::Content);
        assert_eq!(chunk.metadata.source, "Unknown");
        assert_eq!(chunk.metadata.chunk_id, 0);
    }

    #[test]
    fn test_chunk_type_display() {
        assert_eq!(ChunkType::StructuredSummary.to_string(), "structured_summary");
        assert_eq!(ChunkType::Content.to_string(), "content");
    }
}
