//! Core data models used throughout Career Chat.
//!
//! These types represent the documents, chunks, and search results that flow
//! through the indexing and retrieval pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A source document as read from disk, before chunking.
///
/// One per markdown file found under the documents directory. Discarded
/// after chunking; only the `source_path` survives (as chunk metadata) for
/// attribution in formatted context.
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub source_path: String,
}

/// A bounded-length segment of a document's text, with overlap to its
/// neighbors from the same source.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Metadata carried by every chunk. `source` is always the originating
/// document's path, inherited unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ChunkMetadata {
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            extra: BTreeMap::new(),
        }
    }
}

/// A single hit returned by [`crate::store::VectorStore::similarity_search`].
///
/// Ephemeral: produced per query and never persisted. `distance` is cosine
/// distance (`1 - cosine_similarity`), so smaller means more similar.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub document: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
    pub id: String,
}

/// Snapshot of engine state reported by [`crate::engine::RagEngine::get_stats`].
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub documents_loaded: usize,
    pub collection_name: String,
    pub model: String,
}
