//! Chunk building: emission order, template rendering and chunk ids.

mod builder;
mod ids;
mod render;

pub use builder::ChunkBuilder;
pub use ids::ChunkIdStrategy;
pub use render::{display_value, Renderer};
