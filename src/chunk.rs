//! Sliding-window text chunker.
//!
//! Splits document text into overlapping windows of at most `chunk_size`
//! characters. A window is cut after the last `.` or `\n` it contains so
//! chunks tend to end on sentence or line boundaries; without such a
//! boundary the window is cut hard at `chunk_size`. Consecutive windows
//! share `overlap` characters of context.
//!
//! Offsets are counted in `char`s, so multi-byte text (Korean course
//! material, for instance) is never split inside a code point.
//!
//! Each chunk receives a deterministic id derived from its source path,
//! document index, and chunk index, plus a SHA-256 hash of its text.

use sha2::{Digest, Sha256};

use crate::error::ChunkConfigError;
use crate::models::{Chunk, ChunkMetadata, Document};

/// Validated window parameters. `overlap < chunk_size` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSettings {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkSettings {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkConfigError> {
        if chunk_size == 0 {
            return Err(ChunkConfigError::ZeroChunkSize);
        }
        if overlap >= chunk_size {
            return Err(ChunkConfigError::OverlapTooLarge {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

/// Split `text` into trimmed, non-empty windows.
pub fn split_text(text: &str, settings: ChunkSettings) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let ChunkSettings {
        chunk_size,
        overlap,
    } = settings;

    if len <= chunk_size {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        return vec![trimmed.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < len {
        let mut end = start + chunk_size;

        if end < len {
            let boundary = chars[start..end]
                .iter()
                .rposition(|c| *c == '.' || *c == '\n')
                .map(|pos| start + pos);
            if let Some(pos) = boundary {
                if pos > start {
                    end = pos + 1;
                }
            }
        }

        let piece: String = chars[start..end.min(len)].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }

        // A boundary close to `start` can leave `end - overlap` behind the
        // current window; fall back to no overlap so the window always moves.
        let next = end.saturating_sub(overlap);
        start = if next > start { next } else { end };
    }

    chunks
}

/// Chunk a loaded document. `document_index` is the document's position in
/// the ingested batch and becomes part of every chunk id.
pub fn chunk_document(doc: &Document, document_index: usize, settings: ChunkSettings) -> Vec<Chunk> {
    let pieces = split_text(&doc.content, settings);
    let total = pieces.len() as i64;

    pieces
        .into_iter()
        .enumerate()
        .map(|(i, text)| make_chunk(doc, document_index, i as i64, total, text))
        .collect()
}

fn make_chunk(doc: &Document, document_index: usize, index: i64, total: i64, text: String) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: format!("{}_{}_{}", doc.file_path, document_index, index),
        text,
        metadata: ChunkMetadata {
            file_path: doc.file_path.clone(),
            file_type: doc.file_type.clone(),
            chunk_index: index,
            total_chunks: total,
        },
        hash,
    }
}
