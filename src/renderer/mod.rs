//! WebGPU rendering module
//!
//! Colored triangles built on the CPU from a `FrameSnapshot` each frame.

pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use pipeline::{RenderError, RenderState};
pub use shapes::snapshot_vertices;
pub use vertex::Vertex;
