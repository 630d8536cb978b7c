//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for game elements
pub mod colors {
    pub const SKY: [f32; 4] = [0.53, 0.78, 0.92, 1.0];
    pub const PLATFORM: [f32; 4] = [0.45, 0.3, 0.18, 1.0];
    pub const PLATFORM_TOP: [f32; 4] = [0.35, 0.65, 0.25, 1.0];
    pub const CAT: [f32; 4] = [0.95, 0.6, 0.2, 1.0];
    pub const REMOTE_CAT: [f32; 4] = [0.6, 0.6, 0.7, 1.0];
    pub const CAT_EAR: [f32; 4] = [0.3, 0.2, 0.15, 1.0];
    pub const FISH: [f32; 4] = [0.3, 0.55, 0.95, 1.0];
    pub const FISH_TAIL: [f32; 4] = [0.2, 0.4, 0.8, 1.0];
    pub const POST: [f32; 4] = [0.8, 0.7, 0.5, 1.0];
    pub const POST_ROPE: [f32; 4] = [0.6, 0.5, 0.35, 1.0];
    pub const DIM: [f32; 4] = [0.0, 0.0, 0.0, 0.35];
}
