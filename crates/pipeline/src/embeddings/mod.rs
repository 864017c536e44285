//! Embedding of preprocessed chunks.
//!
//! The pipeline itself never embeds; this module reads finished chunks and
//! hands their text to a provider in batches.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use crate::io::write_atomic;
use crate::types::{Chunk, ChunkType};
use catalog_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One embedded chunk, as written to the JSON lines output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkEmbedding {
    pub chunk_id: String,
    pub company_id: String,
    pub chunk_type: ChunkType,
    pub embedding: Vec<f32>,
}

/// Embed the text of every chunk, `batch_size` texts per provider call.
pub async fn embed_chunks(
    provider: &dyn EmbeddingProvider,
    chunks: &[Chunk],
    batch_size: usize,
) -> AppResult<Vec<ChunkEmbedding>> {
    let batch_size = batch_size.max(1);
    let mut records = Vec::with_capacity(chunks.len());

    tracing::info!(
        "Embedding {} chunks with provider '{}' (model: {})",
        chunks.len(),
        provider.provider_name(),
        provider.model_name()
    );

    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = provider.embed_batch(&texts).await?;

        if embeddings.len() != batch.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} embeddings for {} texts",
                embeddings.len(),
                batch.len()
            )));
        }

        records.extend(batch.iter().zip(embeddings).map(|(chunk, embedding)| {
            ChunkEmbedding {
                chunk_id: chunk.chunk_id.clone(),
                company_id: chunk.company_id.clone(),
                chunk_type: chunk.chunk_type,
                embedding,
            }
        }));

        tracing::debug!("Embedded {}/{} chunks", records.len(), chunks.len());
    }

    Ok(records)
}

/// Read a chunk array written by the pipeline or the merge step.
pub fn load_chunks(path: &Path) -> AppResult<Vec<Chunk>> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        AppError::Serialization(format!("Failed to parse chunks in {}: {}", path.display(), e))
    })
}

/// Write embeddings as JSON lines.
pub fn save_embeddings(records: &[ChunkEmbedding], path: &Path) -> AppResult<()> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    write_atomic(path, out.as_bytes())?;
    tracing::info!("Saved {} embeddings to {}", records.len(), path.display());
    Ok(())
}
