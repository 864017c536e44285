//! Insurance catalog preprocessing pipeline.
//!
//! Turns one company record into an ordered list of retrieval chunks:
//! validate → normalize → build chunks → reconcile. A run either yields the
//! complete chunk sequence plus its diagnostics or fails with a
//! [`StructuralError`] before anything is produced.

pub mod aggregate;
pub mod chunk;
pub mod diagnostics;
pub mod embeddings;
pub mod error;
pub mod flatten;
pub mod io;
pub mod normalize;
pub mod reconcile;
pub mod schema;
pub mod types;
pub mod validate;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunk::{ChunkBuilder, ChunkIdStrategy, Renderer};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{RenderError, StructuralError};
pub use reconcile::ReconciliationWarning;
pub use schema::SchemaDescriptor;
pub use types::{Chunk, ChunkType, EntityKeys, EntityLevel};

use catalog_core::{AppConfig, AppResult};
use serde_json::Value;

/// A configured pipeline for one schema family.
///
/// Holds no per-run state, so one instance can process many records,
/// including concurrently.
#[derive(Debug)]
pub struct Pipeline {
    schema: SchemaDescriptor,
    renderer: Renderer,
    id_strategy: ChunkIdStrategy,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub company_id: String,
    pub chunks: Vec<Chunk>,
    pub diagnostics: Diagnostics,
    pub reconciliation: Vec<ReconciliationWarning>,
}

impl Pipeline {
    pub fn new(schema: SchemaDescriptor) -> AppResult<Self> {
        schema.validate()?;
        let renderer = Renderer::new(&schema)?;
        Ok(Self {
            schema,
            renderer,
            id_strategy: ChunkIdStrategy::default(),
        })
    }

    /// Build a pipeline from application config: an explicit schema file wins
    /// over the named built-in family.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let schema = match &config.schema_file {
            Some(path) => SchemaDescriptor::load(path)?,
            None => SchemaDescriptor::builtin(&config.schema)?,
        };
        let id_strategy = config.id_strategy.parse()?;
        Ok(Self::new(schema)?.with_id_strategy(id_strategy))
    }

    pub fn with_id_strategy(mut self, id_strategy: ChunkIdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Process one company record.
    pub fn run(&self, record: &Value) -> Result<PipelineOutput, StructuralError> {
        let mut diagnostics = Diagnostics::new();

        validate::validate(record, &self.schema, &mut diagnostics)?;
        let catalog = normalize::normalize(record, &self.schema)?;

        let chunks = ChunkBuilder::new(&self.schema, &self.renderer, self.id_strategy)
            .build(&catalog, &mut diagnostics);

        let reconciliation =
            reconcile::reconcile(record, &self.schema, &chunks, &mut diagnostics);

        tracing::info!(
            "Processed company {}: {} chunks, {} diagnostics",
            catalog.company_id,
            chunks.len(),
            diagnostics.len()
        );

        Ok(PipelineOutput {
            company_id: catalog.company_id,
            chunks,
            diagnostics,
            reconciliation,
        })
    }
}
