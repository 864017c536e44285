//! Catalog Chunker CLI
//!
//! Main entry point for the catalog-chunker command-line tool.
//! Turns insurer catalog records into retrieval chunks, merges them and embeds them.

mod commands;

use catalog_core::{config::AppConfig, logging, AppResult};
use clap::{Parser, Subcommand};
use commands::{EmbedCommand, MergeCommand, PreprocessCommand, SchemaCommand};
use std::path::PathBuf;

/// Catalog Chunker - insurance catalog preprocessing for retrieval
#[derive(Parser, Debug)]
#[command(name = "catalog-chunker")]
#[command(about = "Insurance catalog preprocessing for retrieval", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "CATALOG_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert company records into chunks
    Preprocess(PreprocessCommand),

    /// Merge per-company chunk files
    Merge(MergeCommand),

    /// Embed chunk texts
    Embed(EmbedCommand),

    /// Inspect schema families
    Schema(SchemaCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(None, cli.log_level, cli.verbose, cli.no_color);

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Catalog chunker starting");
    tracing::debug!("Output dir: {:?}", config.output_dir);
    tracing::debug!("Schema: {}", config.schema);

    let command_name = match &cli.command {
        Commands::Preprocess(_) => "preprocess",
        Commands::Merge(_) => "merge",
        Commands::Embed(_) => "embed",
        Commands::Schema(_) => "schema",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Preprocess(cmd) => cmd.execute(&config).await,
        Commands::Merge(cmd) => cmd.execute(&config).await,
        Commands::Embed(cmd) => cmd.execute(&config).await,
        Commands::Schema(cmd) => cmd.execute().await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
