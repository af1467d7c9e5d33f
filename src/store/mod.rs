//! Embedding store adapter.
//!
//! The [`VectorStore`] trait is the only way the rest of the crate touches
//! stored chunks: add, similarity query, count, and clear. Texts are
//! embedded by the store's [`Embedder`](crate::embedding::Embedder), so
//! callers deal in plain strings.
//!
//! | Implementation | Backing |
//! |----------------|---------|
//! | [`SqliteStore`] | SQLite file under `db.dir`, durable across restarts |
//! | [`InMemoryStore`] | process memory, for tests and throwaway sessions |
//!
//! Both rank by brute-force cosine similarity and report
//! `distance = 1 - similarity`, ascending.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::embedding::{cosine_similarity, Embedder};
use crate::error::StoreError;
use crate::models::{Chunk, ChunkMetadata, CollectionInfo, QueryMatch};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store chunks whose ids are not present yet. Returns how many were inserted.
    async fn add(&self, chunks: &[Chunk]) -> Result<usize, StoreError>;

    /// Up to `k` stored chunks nearest to `text`, closest first.
    async fn query(&self, text: &str, k: usize) -> Result<Vec<QueryMatch>, StoreError>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<i64, StoreError>;

    /// Remove every stored chunk.
    async fn clear(&self) -> Result<(), StoreError>;

    /// Name, size, and location of the collection.
    async fn info(&self) -> Result<CollectionInfo, StoreError>;
}

/// Embed `texts` in slices of at most `batch_size`.
pub(crate) async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, StoreError> {
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let embedded = embedder
            .embed(batch)
            .await
            .map_err(|e| StoreError::Embedding(format!("{:#}", e)))?;
        if embedded.len() != batch.len() {
            return Err(StoreError::Embedding(format!(
                "expected {} vectors, got {}",
                batch.len(),
                embedded.len()
            )));
        }
        vectors.extend(embedded);
    }
    Ok(vectors)
}

pub(crate) async fn embed_one(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>, StoreError> {
    crate::embedding::embed_query(embedder, text)
        .await
        .map_err(|e| StoreError::Embedding(format!("{:#}", e)))
}

/// A stored row considered for ranking.
pub(crate) struct Candidate {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub vector: Vec<f32>,
}

/// Rank candidates by cosine distance to `query_vec`, keeping the `k` closest.
///
/// The sort is stable, so equal distances keep insertion order. Vectors of
/// a different dimensionality (left over from another model) are skipped.
pub(crate) fn rank(query_vec: &[f32], candidates: Vec<Candidate>, k: usize) -> Vec<QueryMatch> {
    let mut matches: Vec<QueryMatch> = candidates
        .into_iter()
        .filter(|c| {
            let same = c.vector.len() == query_vec.len();
            if !same {
                tracing::debug!(id = %c.id, "skipping vector with mismatched dimensions");
            }
            same
        })
        .map(|c| {
            let similarity = cosine_similarity(query_vec, &c.vector) as f64;
            QueryMatch {
                id: c.id,
                content: c.content,
                metadata: c.metadata,
                distance: 1.0 - similarity,
            }
        })
        .collect();

    matches.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches.truncate(k);
    matches
}
