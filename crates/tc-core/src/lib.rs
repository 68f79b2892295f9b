pub mod color;
pub mod error;
pub mod filter;
pub mod id;
pub mod model;
pub mod snapshot;
pub mod templates;

pub use color::{Color, parse_color};
pub use error::{CoreError, CoreResult};
pub use filter::{
    FilterBackend, FilterCache, FilterKind, FilterParams, FilterPipeline, FilterPreset, Raster,
};
pub use id::NodeId;
pub use model::*;
pub use snapshot::{LayerDocument, NodeDocument, Snapshot, capture, restore};
pub use templates::TemplateId;

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
