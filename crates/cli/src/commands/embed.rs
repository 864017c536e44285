//! Embed command handler.

use catalog_core::{config::AppConfig, AppResult};
use catalog_pipeline::embeddings::{create_provider, embed_chunks, load_chunks, save_embeddings};
use clap::Args;
use std::path::{Path, PathBuf};

/// Embed chunk texts and write them as JSON lines
#[derive(Args, Debug)]
pub struct EmbedCommand {
    /// Chunk file produced by preprocess or merge
    pub chunks: PathBuf,

    /// Output file (default: <chunks stem>_embeddings.jsonl next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Embedding provider (mock, http)
    #[arg(long, env = "CATALOG_EMBEDDING_PROVIDER")]
    pub provider: Option<String>,

    /// Embedding service URL for the http provider
    #[arg(long, env = "CATALOG_EMBEDDING_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EmbedCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing embed command for {:?}", self.chunks);

        let mut config = config.clone();
        if let Some(provider) = &self.provider {
            config.embedding.provider = provider.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.embedding.endpoint = Some(endpoint.clone());
        }
        config.validate()?;

        let chunks = load_chunks(&self.chunks)?;
        let provider = create_provider(&config.embedding)?;
        let records =
            embed_chunks(provider.as_ref(), &chunks, config.embedding.batch_size).await?;

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| default_output(&self.chunks));
        save_embeddings(&records, &output)?;

        if self.json {
            let summary = serde_json::json!({
                "input": self.chunks,
                "output": output,
                "provider": provider.provider_name(),
                "dimensions": provider.dimensions(),
                "embedded": records.len(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!(
                "Embedded {} chunks ({} dimensions) into {}",
                records.len(),
                provider.dimensions(),
                output.display()
            );
        }

        Ok(())
    }
}

fn default_output(chunks: &Path) -> PathBuf {
    let stem = chunks
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "chunks".to_string());
    chunks.with_file_name(format!("{}_embeddings.jsonl", stem))
}
