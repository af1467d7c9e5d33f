//! SQLite-backed [`VectorStore`].
//!
//! One row per chunk in the `chunks` table: text, metadata columns, and
//! the embedding as a little-endian f32 BLOB. Similarity search loads all
//! vectors and ranks them in memory.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::{embed_in_batches, embed_one, rank, Candidate, VectorStore};
use crate::config::Config;
use crate::db;
use crate::embedding::{blob_to_vec, vec_to_blob, Embedder};
use crate::error::StoreError;
use crate::migrate;
use crate::models::{Chunk, ChunkMetadata, CollectionInfo, QueryMatch};

/// Stays under SQLite's default limit of 999 bound parameters.
const ID_LOOKUP_BATCH: usize = 500;

pub struct SqliteStore {
    pool: SqlitePool,
    embedder: Arc<dyn Embedder>,
    collection: String,
    location: String,
    batch_size: usize,
}

impl SqliteStore {
    /// Open the configured collection, creating the schema if needed.
    pub async fn open(config: &Config, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let pool = db::connect(&config.db).await?;
        migrate::run_migrations(&pool).await?;

        Ok(Self::new(
            pool,
            embedder,
            config.db.collection.clone(),
            config.db.database_path().display().to_string(),
            config.embedding.batch_size,
        ))
    }

    /// Wrap an already migrated pool.
    pub fn new(
        pool: SqlitePool,
        embedder: Arc<dyn Embedder>,
        collection: String,
        location: String,
        batch_size: usize,
    ) -> Self {
        Self {
            pool,
            embedder,
            collection,
            location,
            batch_size,
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Ids among `chunks` that are already stored, one `IN (...)` lookup
    /// per [`ID_LOOKUP_BATCH`] ids.
    async fn existing_ids(&self, chunks: &[Chunk]) -> Result<HashSet<String>, StoreError> {
        let mut existing = HashSet::new();
        for batch in chunks.chunks(ID_LOOKUP_BATCH) {
            let mut query = QueryBuilder::<Sqlite>::new("SELECT id FROM chunks WHERE id IN (");
            let mut ids = query.separated(", ");
            for chunk in batch {
                ids.push_bind(chunk.id.as_str());
            }
            ids.push_unseparated(")");

            let found: Vec<String> = query.build_query_scalar().fetch_all(&self.pool).await?;
            existing.extend(found);
        }
        Ok(existing)
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn add(&self, chunks: &[Chunk]) -> Result<usize, StoreError> {
        let existing = self.existing_ids(chunks).await?;

        let mut seen = HashSet::new();
        let fresh: Vec<&Chunk> = chunks
            .iter()
            .filter(|c| !existing.contains(&c.id) && seen.insert(c.id.as_str()))
            .collect();

        let skipped = chunks.len() - fresh.len();
        if skipped > 0 {
            tracing::warn!(skipped, "ignoring chunks whose ids already exist");
        }
        if fresh.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = fresh.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_in_batches(self.embedder.as_ref(), &texts, self.batch_size).await?;

        let now = chrono::Utc::now().timestamp();
        let model = self.embedder.model_name().to_string();
        let mut inserted = 0usize;
        let mut tx = self.pool.begin().await?;

        for (chunk, vector) in fresh.iter().zip(vectors.iter()) {
            let result = sqlx::query(
                r#"
                INSERT INTO chunks (id, content, file_path, file_type, chunk_index,
                                    total_chunks, hash, embedding, model, dims, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO NOTHING
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.text)
            .bind(&chunk.metadata.file_path)
            .bind(&chunk.metadata.file_type)
            .bind(chunk.metadata.chunk_index)
            .bind(chunk.metadata.total_chunks)
            .bind(&chunk.hash)
            .bind(vec_to_blob(vector))
            .bind(&model)
            .bind(vector.len() as i64)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;
        tracing::debug!(inserted, collection = %self.collection, "chunks stored");
        Ok(inserted)
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<QueryMatch>, StoreError> {
        if k == 0 || self.count().await? == 0 {
            return Ok(Vec::new());
        }

        let query_vec = embed_one(self.embedder.as_ref(), text).await?;

        let rows = sqlx::query(
            r#"
            SELECT id, content, file_path, file_type, chunk_index, total_chunks, embedding
            FROM chunks
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let candidates = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                Candidate {
                    id: row.get("id"),
                    content: row.get("content"),
                    metadata: ChunkMetadata {
                        file_path: row.get("file_path"),
                        file_type: row.get("file_type"),
                        chunk_index: row.get("chunk_index"),
                        total_chunks: row.get("total_chunks"),
                    },
                    vector: blob_to_vec(&blob),
                }
            })
            .collect();

        Ok(rank(&query_vec, candidates, k))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM chunks").execute(&self.pool).await?;
        tracing::info!(
            removed = result.rows_affected(),
            collection = %self.collection,
            "collection cleared"
        );
        Ok(())
    }

    async fn info(&self) -> Result<CollectionInfo, StoreError> {
        Ok(CollectionInfo {
            collection_name: self.collection.clone(),
            document_count: self.count().await?,
            location: self.location.clone(),
        })
    }
}
