//! Merge command handler.

use catalog_core::{config::AppConfig, AppResult};
use catalog_pipeline::aggregate::{merge_outputs, MERGED_FILE_NAME};
use clap::Args;
use std::path::PathBuf;

/// Combine per-company chunk files into one
#[derive(Args, Debug)]
pub struct MergeCommand {
    /// Directory holding *_preprocessed.json files (default: output dir)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Merged output file (default: <dir>/all_companies_preprocessed.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl MergeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let dir = self.dir.clone().unwrap_or_else(|| config.output_dir.clone());
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| dir.join(MERGED_FILE_NAME));

        tracing::info!("Executing merge command for {:?}", dir);

        let report = merge_outputs(&dir, &output)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!(
                "Merged {} chunks from {} files into {}",
                report.total_chunks,
                report.merged_files.len(),
                report.output.display()
            );
            for skipped in &report.skipped_files {
                println!("Skipped {}", skipped.display());
            }
        }

        Ok(())
    }
}
