//! Rendering-side helpers for the scene graph: geometry queries used by
//! pointer input, and a CPU implementation of the image filter pipeline.

pub mod filter;
pub mod hit;

pub use filter::CpuFilters;
pub use hit::{hit_test, hit_test_rect, node_bounds};
