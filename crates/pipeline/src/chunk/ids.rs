//! Chunk identifier strategies.

use crate::types::{ChunkType, EntityKeys};
use catalog_core::AppError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// How chunk ids are generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkIdStrategy {
    /// Random UUID v4 per chunk
    #[default]
    Random,

    /// SHA-256 of the chunk's position and identity, stable across runs
    Deterministic,
}

impl ChunkIdStrategy {
    /// Id for the chunk at `position` in the emission order of one company.
    pub fn chunk_id(&self, keys: &EntityKeys, chunk_type: ChunkType, position: usize) -> String {
        match self {
            ChunkIdStrategy::Random => uuid::Uuid::new_v4().to_string(),
            ChunkIdStrategy::Deterministic => {
                let seed = format!(
                    "{}|{}|{}|{}|{}|{}",
                    keys.company_id,
                    position,
                    chunk_type,
                    keys.product_id.as_deref().unwrap_or(""),
                    keys.sub_product_id.as_deref().unwrap_or(""),
                    keys.variant_id.as_deref().unwrap_or("")
                );
                calculate_hash(&seed)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkIdStrategy::Random => "random",
            ChunkIdStrategy::Deterministic => "deterministic",
        }
    }
}

impl fmt::Display for ChunkIdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkIdStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(ChunkIdStrategy::Random),
            "deterministic" => Ok(ChunkIdStrategy::Deterministic),
            other => Err(AppError::Config(format!(
                "Unknown chunk id strategy: '{}'. Expected random or deterministic",
                other
            ))),
        }
    }
}

/// Hex-encoded SHA-256 of `text`.
fn calculate_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
