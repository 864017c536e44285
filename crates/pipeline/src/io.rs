//! Record loading and chunk output files.

use crate::diagnostics::Diagnostic;
use crate::reconcile::ReconciliationWarning;
use crate::types::{Chunk, ChunkType};
use crate::Pipeline;
use catalog_core::{AppError, AppResult};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix of per-company output files.
pub const OUTPUT_SUFFIX: &str = "_preprocessed.json";

/// Outcome of processing one input file.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub company_id: String,
    pub chunk_count: usize,
    pub counts: BTreeMap<ChunkType, usize>,
    pub diagnostics: Vec<Diagnostic>,
    pub reconciliation: Vec<ReconciliationWarning>,
}

/// Read and parse one company record.
pub fn load_record(path: &Path) -> AppResult<Value> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        AppError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

/// Output path for `input` inside `output_dir`.
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(format!("{}{}", stem, OUTPUT_SUFFIX))
}

/// Write chunks as pretty JSON. The file appears only once fully written.
pub fn save_chunks(chunks: &[Chunk], path: &Path) -> AppResult<()> {
    let json = serde_json::to_string_pretty(chunks)?;
    write_atomic(path, json.as_bytes())?;
    tracing::info!("Saved {} chunks to {}", chunks.len(), path.display());
    Ok(())
}

/// Write `bytes` to a temp file next to `path`, then rename it into place.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> AppResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(path).map_err(|e| AppError::Io(e.error))?;
    Ok(())
}

/// Load `input`, run the pipeline and save the chunks into `output_dir`.
pub fn process_file(pipeline: &Pipeline, input: &Path, output_dir: &Path) -> AppResult<RunSummary> {
    tracing::debug!("Processing {}", input.display());

    let record = load_record(input)?;
    let output = pipeline.run(&record)?;

    let path = output_path_for(input, output_dir);
    save_chunks(&output.chunks, &path)?;

    let mut counts = BTreeMap::new();
    for chunk in &output.chunks {
        *counts.entry(chunk.chunk_type).or_insert(0) += 1;
    }

    Ok(RunSummary {
        input: input.to_path_buf(),
        output: path,
        company_id: output.company_id,
        chunk_count: output.chunks.len(),
        counts,
        diagnostics: output.diagnostics.into_events(),
        reconciliation: output.reconciliation,
    })
}
