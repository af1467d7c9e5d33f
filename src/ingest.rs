//! Ingestion: loader → chunker → vector store.
//!
//! `edu ingest` reads documents (the configured folder or explicit paths),
//! splits each into overlapping chunks, and adds them to the collection.
//! Chunk ids are derived from the file path and position, so re-ingesting
//! the same files inserts nothing new.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::chunk::{chunk_document, ChunkSettings};
use crate::config::Config;
use crate::error::StoreError;
use crate::loader::DocumentLoader;
use crate::models::Document;
use crate::store::VectorStore;

/// Counts reported after an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub documents: usize,
    pub chunks: usize,
    pub inserted: usize,
}

/// Chunk `documents` and add the chunks to `store`.
pub async fn add_documents(
    store: &dyn VectorStore,
    documents: &[Document],
    settings: ChunkSettings,
) -> Result<IngestSummary, StoreError> {
    let chunks: Vec<_> = documents
        .iter()
        .enumerate()
        .flat_map(|(i, doc)| chunk_document(doc, i, settings))
        .collect();

    tracing::info!(
        documents = documents.len(),
        chunks = chunks.len(),
        "adding chunks to collection"
    );

    let inserted = if chunks.is_empty() {
        0
    } else {
        store.add(&chunks).await?
    };

    Ok(IngestSummary {
        documents: documents.len(),
        chunks: chunks.len(),
        inserted,
    })
}

/// Run `edu ingest`: optionally clear, then load, chunk, and store.
pub async fn run_ingest(
    config: &Config,
    store: &dyn VectorStore,
    paths: &[PathBuf],
    clear: bool,
) -> Result<IngestSummary> {
    let settings = config.chunking.settings()?;

    if clear {
        store
            .clear()
            .await
            .context("Failed to clear collection before ingest")?;
    }

    let loader = DocumentLoader::new(&config.loader);
    let documents = if paths.is_empty() {
        loader.load_documents(None)
    } else {
        loader.load_documents(Some(paths))
    };

    if documents.is_empty() {
        tracing::warn!(folder = %config.loader.folder.display(), "no documents to ingest");
    }

    let summary = add_documents(store, &documents, settings)
        .await
        .context("Failed to add documents to collection")?;
    let info = store.info().await?;

    println!("ingest {}", info.collection_name);
    println!("  documents loaded: {}", summary.documents);
    println!("  chunks created: {}", summary.chunks);
    println!("  chunks inserted: {}", summary.inserted);
    println!("  collection size: {}", info.document_count);
    println!("  location: {}", info.location);
    println!("ok");

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedder;
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        fn model_name(&self) -> &str {
            "length"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| vec![t.chars().count() as f32, 1.0])
                .collect())
        }
    }

    fn doc(path: &str, content: &str) -> Document {
        Document {
            file_path: path.to_string(),
            content: content.to_string(),
            file_type: ".txt".to_string(),
        }
    }

    #[tokio::test]
    async fn adds_every_chunk_once() {
        let store = InMemoryStore::new(Arc::new(LengthEmbedder));
        let settings = ChunkSettings::new(10, 2).unwrap();
        let docs = vec![doc("a.txt", "short"), doc("b.txt", "abcdefghijklmnopqrst")];

        let first = add_documents(&store, &docs, settings).await.unwrap();
        assert_eq!(first.documents, 2);
        assert!(first.chunks >= 3);
        assert_eq!(first.inserted, first.chunks);

        let again = add_documents(&store, &docs, settings).await.unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(store.count().await.unwrap() as usize, first.chunks);
    }

    #[tokio::test]
    async fn no_documents_means_no_store_call() {
        let store = InMemoryStore::new(Arc::new(crate::embedding::DisabledEmbedder));
        let summary = add_documents(&store, &[], ChunkSettings::default())
            .await
            .unwrap();
        assert_eq!(summary, IngestSummary::default());
    }

    #[tokio::test]
    async fn run_ingest_scans_folder_and_clears_first() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("course.txt"), "Python 기초 과정. 8주 과정입니다.").unwrap();

        let mut config = Config::default();
        config.loader.folder = tmp.path().to_path_buf();

        let store = InMemoryStore::new(Arc::new(LengthEmbedder));
        let first = run_ingest(&config, &store, &[], false).await.unwrap();
        assert_eq!(first.documents, 1);
        assert_eq!(first.inserted, 1);

        let cleared = run_ingest(&config, &store, &[], true).await.unwrap();
        assert_eq!(cleared.inserted, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
