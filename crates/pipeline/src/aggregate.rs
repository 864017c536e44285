//! Merging per-company outputs into one file.

use crate::io::{write_atomic, OUTPUT_SUFFIX};
use catalog_core::AppResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Default name of the merged output file.
pub const MERGED_FILE_NAME: &str = "all_companies_preprocessed.json";

/// Outcome of a merge.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub output: PathBuf,
    pub merged_files: Vec<PathBuf>,
    pub skipped_files: Vec<PathBuf>,
    pub total_chunks: usize,
    pub generated_at: DateTime<Utc>,
}

/// Concatenate every `*_preprocessed.json` array in `dir` into `output`.
///
/// Files are taken in name order. The output file itself is never an input.
/// Files that fail to parse or do not hold a JSON array are skipped.
pub fn merge_outputs(dir: &Path, output: &Path) -> AppResult<MergeReport> {
    let output_key = comparable_path(output);

    let mut inputs: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(OUTPUT_SUFFIX))
        .filter(|entry| comparable_path(entry.path()) != output_key)
        .map(|entry| entry.into_path())
        .collect();
    inputs.sort();

    let mut merged = Vec::new();
    let mut merged_files = Vec::new();
    let mut skipped_files = Vec::new();

    for path in inputs {
        match read_chunk_array(&path) {
            Ok(chunks) => {
                tracing::debug!("Merging {} chunks from {}", chunks.len(), path.display());
                merged.extend(chunks);
                merged_files.push(path);
            }
            Err(reason) => {
                tracing::warn!("Skipping {}: {}", path.display(), reason);
                skipped_files.push(path);
            }
        }
    }

    let json = serde_json::to_string_pretty(&merged)?;
    write_atomic(output, json.as_bytes())?;

    tracing::info!(
        "Merged {} chunks from {} files into {}",
        merged.len(),
        merged_files.len(),
        output.display()
    );

    Ok(MergeReport {
        output: output.to_path_buf(),
        merged_files,
        skipped_files,
        total_chunks: merged.len(),
        generated_at: Utc::now(),
    })
}

/// Canonical form of `path` for identity checks. A file that does not exist
/// yet is resolved through its parent directory.
fn comparable_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }

    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    match (std::fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

fn read_chunk_array(path: &Path) -> Result<Vec<Value>, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    match serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())? {
        Value::Array(chunks) => Ok(chunks),
        _ => Err("not a JSON array".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_merges_in_name_order_and_skips_bad_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write(dir, "jubilee_preprocessed.json", &json!([{"chunk_id": "j1"}]).to_string());
        write(
            dir,
            "britam_preprocessed.json",
            &json!([{"chunk_id": "b1"}, {"chunk_id": "b2"}]).to_string(),
        );
        write(dir, "madison_preprocessed.json", "{\"not\": \"a list\"}");
        write(dir, "broken_preprocessed.json", "[{");
        write(dir, "notes.json", "[1, 2, 3]");

        let output = dir.join(MERGED_FILE_NAME);
        let report = merge_outputs(dir, &output).unwrap();

        assert_eq!(report.total_chunks, 3);
        assert_eq!(report.merged_files.len(), 2);
        assert_eq!(report.skipped_files.len(), 2);

        let merged: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        let ids: Vec<&str> = merged.iter().map(|c| c["chunk_id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["b1", "b2", "j1"]);
    }

    #[test]
    fn test_previous_merge_output_is_not_an_input() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write(dir, "britam_preprocessed.json", &json!([{"chunk_id": "b1"}]).to_string());

        let output = dir.join(MERGED_FILE_NAME);
        merge_outputs(dir, &output).unwrap();
        let second = merge_outputs(dir, &output).unwrap();

        assert_eq!(second.total_chunks, 1);
        assert_eq!(second.merged_files, vec![dir.join("britam_preprocessed.json")]);
    }

    #[test]
    fn test_output_recognised_through_differently_spelled_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        std::fs::create_dir(dir.join("nested")).unwrap();
        write(dir, "britam_preprocessed.json", &json!([{"chunk_id": "b1"}]).to_string());

        let scan_dir = dir.join("nested").join("..");
        let output = dir.join(MERGED_FILE_NAME);
        merge_outputs(&scan_dir, &output).unwrap();
        let second = merge_outputs(&scan_dir, &output).unwrap();

        assert_eq!(second.total_chunks, 1);
        assert_eq!(second.merged_files.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_output_recognised_with_relative_dir_and_absolute_output() {
        let temp = TempDir::new().unwrap();
        let dir = std::fs::canonicalize(temp.path()).unwrap();
        write(&dir, "britam_preprocessed.json", &json!([{"chunk_id": "b1"}]).to_string());

        let cwd = std::env::current_dir().unwrap();
        let up: PathBuf = cwd.components().skip(1).map(|_| "..").collect();
        let relative_dir = up.join(dir.strip_prefix("/").unwrap());
        let output = dir.join(MERGED_FILE_NAME);

        assert_eq!(merge_outputs(&relative_dir, &output).unwrap().total_chunks, 1);
        let second = merge_outputs(&relative_dir, &output).unwrap();
        assert_eq!(second.total_chunks, 1);
        assert_eq!(second.merged_files.len(), 1);
    }
}
