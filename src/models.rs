//! Core data models used throughout the assistant.
//!
//! These types represent the documents, chunks, query matches, and
//! conversation turns that flow through the ingestion and answer pipeline.

use serde::{Deserialize, Serialize};

/// Plain-text rendition of one source file, produced by the loader.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_path: String,
    pub content: String,
    /// Lower-cased extension including the dot, e.g. `".pdf"`.
    pub file_type: String,
}

/// Metadata stored alongside every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkMetadata {
    pub file_path: String,
    pub file_type: String,
    pub chunk_index: i64,
    pub total_chunks: i64,
}

/// A retrievable slice of a document.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// `"{file_path}_{document_index}_{chunk_index}"`.
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    /// SHA-256 of `text`.
    pub hash: String,
}

/// A stored chunk returned from a similarity query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryMatch {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    /// `1 - cosine_similarity`; smaller is closer.
    pub distance: f64,
}

/// Summary of the persistent collection.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionInfo {
    pub collection_name: String,
    pub document_count: i64,
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}
