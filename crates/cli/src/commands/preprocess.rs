//! Preprocess command handler.
//!
//! Runs the pipeline over each input file and writes one chunk file per
//! company. Inputs are independent: a failure in one never affects another.

use catalog_core::{config::AppConfig, AppError, AppResult};
use catalog_pipeline::io::{process_file, RunSummary};
use catalog_pipeline::Pipeline;
use clap::Args;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;

/// Convert company records into retrieval chunks
#[derive(Args, Debug)]
pub struct PreprocessCommand {
    /// Company record JSON files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Built-in schema family (flat-product, nested-product, alt-facet)
    #[arg(long, env = "CATALOG_SCHEMA")]
    pub schema: Option<String>,

    /// Custom schema descriptor (YAML); overrides --schema
    #[arg(long)]
    pub schema_file: Option<PathBuf>,

    /// Directory for the per-company output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PreprocessCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing preprocess command for {} inputs", self.inputs.len());

        let mut config = config.clone();
        if let Some(schema) = &self.schema {
            config.schema = schema.clone();
        }
        if let Some(schema_file) = &self.schema_file {
            config.schema_file = Some(schema_file.clone());
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        config.validate()?;
        config.ensure_output_dir()?;

        let pipeline = Arc::new(Pipeline::from_config(&config)?);
        tracing::debug!(
            "Using schema '{}' with output dir {:?}",
            pipeline.schema().family,
            config.output_dir
        );

        let tasks = self.inputs.iter().cloned().map(|input| {
            let pipeline = Arc::clone(&pipeline);
            let output_dir = config.output_dir.clone();
            tokio::task::spawn_blocking(move || process_file(&pipeline, &input, &output_dir))
        });
        let results = join_all(tasks).await;

        let mut summaries: Vec<RunSummary> = Vec::new();
        let mut failures: Vec<(PathBuf, String)> = Vec::new();

        for (input, result) in self.inputs.iter().zip(results) {
            match result {
                Ok(Ok(summary)) => summaries.push(summary),
                Ok(Err(e)) => {
                    tracing::error!("Failed to process {}: {}", input.display(), e);
                    failures.push((input.clone(), e.to_string()));
                }
                Err(e) => {
                    tracing::error!("Worker for {} panicked: {}", input.display(), e);
                    failures.push((input.clone(), e.to_string()));
                }
            }
        }

        if self.json {
            let failed: Vec<serde_json::Value> = failures
                .iter()
                .map(|(input, error)| serde_json::json!({"input": input, "error": error}))
                .collect();
            let output = serde_json::json!({
                "processed": summaries,
                "failed": failed,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            for summary in &summaries {
                println!(
                    "{} → {} ({} chunks, {} diagnostics, {} reconciliation warnings)",
                    summary.input.display(),
                    summary.output.display(),
                    summary.chunk_count,
                    summary.diagnostics.len(),
                    summary.reconciliation.len()
                );
            }
            for (input, error) in &failures {
                println!("{} failed: {}", input.display(), error);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AppError::Other(format!(
                "{} of {} inputs failed",
                failures.len(),
                self.inputs.len()
            )))
        }
    }
}
