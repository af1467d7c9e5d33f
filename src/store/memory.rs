//! In-memory [`VectorStore`] for tests and throwaway sessions.
//!
//! Entries live in a `Vec` behind `std::sync::RwLock`, kept in insertion
//! order. Nothing survives the process.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{embed_in_batches, embed_one, rank, Candidate, VectorStore};
use crate::embedding::Embedder;
use crate::error::StoreError;
use crate::models::{Chunk, ChunkMetadata, CollectionInfo, QueryMatch};

struct Entry {
    id: String,
    content: String,
    metadata: ChunkMetadata,
    vector: Vec<f32>,
}

pub struct InMemoryStore {
    embedder: Arc<dyn Embedder>,
    collection: String,
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_collection(embedder, "documents")
    }

    pub fn with_collection(embedder: Arc<dyn Embedder>, collection: &str) -> Self {
        Self {
            embedder,
            collection: collection.to_string(),
            entries: RwLock::new(Vec::new()),
        }
    }

    fn known_ids(&self) -> Result<HashSet<String>, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.iter().map(|e| e.id.clone()).collect())
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn add(&self, chunks: &[Chunk]) -> Result<usize, StoreError> {
        let mut seen = self.known_ids()?;
        let fresh: Vec<&Chunk> = chunks.iter().filter(|c| seen.insert(c.id.clone())).collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = fresh.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_in_batches(self.embedder.as_ref(), &texts, texts.len()).await?;

        let mut entries = self.entries.write().map_err(poisoned)?;
        let mut inserted = 0;
        for (chunk, vector) in fresh.into_iter().zip(vectors) {
            // Another writer may have raced us between the id check and here.
            if entries.iter().any(|e| e.id == chunk.id) {
                continue;
            }
            entries.push(Entry {
                id: chunk.id.clone(),
                content: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                vector,
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<QueryMatch>, StoreError> {
        if k == 0 || self.count().await? == 0 {
            return Ok(Vec::new());
        }

        let query_vec = embed_one(self.embedder.as_ref(), text).await?;

        let candidates: Vec<Candidate> = {
            let entries = self.entries.read().map_err(poisoned)?;
            entries
                .iter()
                .map(|e| Candidate {
                    id: e.id.clone(),
                    content: e.content.clone(),
                    metadata: e.metadata.clone(),
                    vector: e.vector.clone(),
                })
                .collect()
        };

        Ok(rank(&query_vec, candidates, k))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.len() as i64)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }

    async fn info(&self) -> Result<CollectionInfo, StoreError> {
        Ok(CollectionInfo {
            collection_name: self.collection.clone(),
            document_count: self.count().await?,
            location: "memory".to_string(),
        })
    }
}
