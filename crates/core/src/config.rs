//! Configuration management for the catalog chunker.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`catalog.yaml` in the current directory, or `CATALOG_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources take precedence over earlier ones.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default config file name looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "catalog.yaml";

/// Chunk id strategies understood by the pipeline.
pub const ID_STRATEGIES: [&str; 2] = ["random", "deterministic"];

/// Embedding providers understood by the pipeline.
pub const EMBEDDING_PROVIDERS: [&str; 2] = ["mock", "http"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Directory that receives `<insurer>_preprocessed.json` files
    pub output_dir: PathBuf,

    /// Built-in schema family used when no schema file is given
    pub schema: String,

    /// Custom schema descriptor file (overrides `schema`)
    pub schema_file: Option<PathBuf>,

    /// Chunk id strategy ("random" or "deterministic")
    pub id_strategy: String,

    /// Embedding collaborator settings
    pub embedding: EmbeddingSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Settings for the external embedding service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider name ("mock" or "http")
    pub provider: String,

    /// Base URL of the embedding service (http provider only)
    pub endpoint: Option<String>,

    /// Expected vector dimensionality
    pub dimensions: usize,

    /// Number of texts sent per batch
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            endpoint: None,
            dimensions: 384,
            batch_size: 32,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    pipeline: Option<PipelineSection>,
    embedding: Option<EmbeddingSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineSection {
    output_dir: Option<String>,
    schema: Option<String>,
    schema_file: Option<String>,
    id_strategy: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingSection {
    provider: Option<String>,
    endpoint: Option<String>,
    dimensions: Option<usize>,
    batch_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            output_dir: PathBuf::from("data/preprocessed"),
            schema: "flat-product".to_string(),
            schema_file: None,
            id_strategy: "random".to_string(),
            embedding: EmbeddingSettings::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `CATALOG_CONFIG`: Path to config file
    /// - `CATALOG_OUTPUT_DIR`: Output directory
    /// - `CATALOG_SCHEMA`: Built-in schema family
    /// - `CATALOG_ID_STRATEGY`: Chunk id strategy
    /// - `CATALOG_EMBEDDING_PROVIDER`: Embedding provider
    /// - `CATALOG_EMBEDDING_ENDPOINT`: Embedding service URL
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use catalog_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Output dir: {:?}", config.output_dir);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(std::env::var("CATALOG_CONFIG").ok().map(PathBuf::from))
    }

    /// Like [`AppConfig::load`], with an explicit config file path.
    ///
    /// Without a path, `catalog.yaml` in the current directory is used when it exists.
    pub fn load_from(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self {
            config_file,
            ..Self::default()
        };

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(output_dir) = std::env::var("CATALOG_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(output_dir);
        }

        if let Ok(schema) = std::env::var("CATALOG_SCHEMA") {
            config.schema = schema;
        }

        if let Ok(strategy) = std::env::var("CATALOG_ID_STRATEGY") {
            config.id_strategy = strategy;
        }

        if let Ok(provider) = std::env::var("CATALOG_EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }

        if let Ok(endpoint) = std::env::var("CATALOG_EMBEDDING_ENDPOINT") {
            config.embedding.endpoint = Some(endpoint);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Loaded config file {:?}", path);

        Ok(self.clone().merge_file(config_file))
    }

    fn merge_file(mut self, file: ConfigFile) -> Self {
        if let Some(pipeline) = file.pipeline {
            if let Some(dir) = pipeline.output_dir {
                self.output_dir = PathBuf::from(dir);
            }
            if let Some(schema) = pipeline.schema {
                self.schema = schema;
            }
            if let Some(schema_file) = pipeline.schema_file {
                self.schema_file = Some(PathBuf::from(schema_file));
            }
            if let Some(strategy) = pipeline.id_strategy {
                self.id_strategy = strategy;
            }
        }

        if let Some(embedding) = file.embedding {
            if let Some(provider) = embedding.provider {
                self.embedding.provider = provider;
            }
            if embedding.endpoint.is_some() {
                self.embedding.endpoint = embedding.endpoint;
            }
            if let Some(dimensions) = embedding.dimensions {
                self.embedding.dimensions = dimensions;
            }
            if let Some(batch_size) = embedding.batch_size {
                self.embedding.batch_size = batch_size;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        self
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the
    /// config file.
    pub fn with_overrides(
        mut self,
        output_dir: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(output_dir) = output_dir {
            self.output_dir = output_dir;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Ensure the output directory exists.
    pub fn ensure_output_dir(&self) -> AppResult<()> {
        if !self.output_dir.exists() {
            std::fs::create_dir_all(&self.output_dir).map_err(|e| {
                AppError::Config(format!(
                    "Failed to create output directory {:?}: {}",
                    self.output_dir, e
                ))
            })?;
        }
        Ok(())
    }

    /// Validate the configured strategies and providers.
    pub fn validate(&self) -> AppResult<()> {
        if !ID_STRATEGIES.contains(&self.id_strategy.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown id strategy: {}. Supported: {}",
                self.id_strategy,
                ID_STRATEGIES.join(", ")
            )));
        }

        let provider = self.embedding.provider.as_str();
        if !EMBEDDING_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if provider == "http" && self.embedding.endpoint.is_none() {
            return Err(AppError::Config(
                "The http embedding provider requires an endpoint".to_string(),
            ));
        }

        if self.embedding.dimensions == 0 || self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding dimensions and batch size must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
