//! Command handlers for the catalog chunker CLI.

pub mod embed;
pub mod merge;
pub mod preprocess;
pub mod schema;

pub use embed::EmbedCommand;
pub use merge::MergeCommand;
pub use preprocess::PreprocessCommand;
pub use schema::SchemaCommand;
