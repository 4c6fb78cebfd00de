//! Host-side mesh data
//!
//! [`Vertex`] is the exact layout the simple shader reads from vertex buffer
//! binding 0. [`MeshBuilder`] collects vertices and indices on the CPU before
//! they are uploaded into a [`MeshResource`](crate::render::mesh_resource::MeshResource).

use ash::vk;
use std::mem;
use std::path::Path;

use crate::assets::obj_loader::{ObjError, ObjLoader};
use crate::foundation::math::Vec3;

/// Vertex with position, color, normal and texture coordinates
///
/// `#[repr(C)]` with only `f32` arrays, so the struct is 44 bytes with no
/// padding and can be uploaded as raw bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],

    /// Per-vertex color, multiplied by the object color in the shader
    pub color: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub uv: [f32; 2],
}

// Safe to implement Pod and Zeroable for Vertex since it only contains f32 arrays
unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

impl Vertex {
    /// Vertex with a position and a color, zero normal and uv
    pub fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self {
            position,
            color,
            ..Self::default()
        }
    }

    /// Vertex buffer binding: one tightly packed vertex per element at binding 0
    pub fn binding_descriptions() -> Vec<vk::VertexInputBindingDescription> {
        vec![vk::VertexInputBindingDescription {
            binding: 0,
            stride: mem::size_of::<Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }]
    }

    /// Attribute layout matching shader locations 0 to 3
    pub fn attribute_descriptions() -> Vec<vk::VertexInputAttributeDescription> {
        let float3 = mem::size_of::<[f32; 3]>() as u32;
        vec![
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: float3,
            },
            vk::VertexInputAttributeDescription {
                location: 2,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: float3 * 2,
            },
            vk::VertexInputAttributeDescription {
                location: 3,
                binding: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: float3 * 3,
            },
        ]
    }
}

/// Vertices and optional indices waiting to be uploaded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuilder {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Triangle list indices; empty for non-indexed meshes
    pub indices: Vec<u32>,
}

impl MeshBuilder {
    /// Create from raw vertex and index data
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Load an OBJ file
    pub fn from_obj_file(path: impl AsRef<Path>) -> Result<Self, ObjError> {
        ObjLoader::load(path)
    }

    /// Unit cube centered on `offset`, one flat color per face
    ///
    /// 4 vertices per face and 2 triangles each: 24 vertices, 36 indices.
    pub fn cube(offset: Vec3) -> Self {
        const WHITE: [f32; 3] = [0.9, 0.9, 0.9];
        const YELLOW: [f32; 3] = [0.8, 0.8, 0.1];
        const ORANGE: [f32; 3] = [0.9, 0.6, 0.1];
        const RED: [f32; 3] = [0.8, 0.1, 0.1];
        const BLUE: [f32; 3] = [0.1, 0.1, 0.8];
        const GREEN: [f32; 3] = [0.1, 0.8, 0.1];

        // Y points down, so the -Y face is the top
        let faces: [([[f32; 3]; 4], [f32; 3]); 6] = [
            // left
            ([[-0.5, -0.5, -0.5], [-0.5, 0.5, 0.5], [-0.5, -0.5, 0.5], [-0.5, 0.5, -0.5]], WHITE),
            // right
            ([[0.5, -0.5, -0.5], [0.5, 0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, -0.5]], YELLOW),
            // top
            ([[-0.5, -0.5, -0.5], [0.5, -0.5, 0.5], [-0.5, -0.5, 0.5], [0.5, -0.5, -0.5]], ORANGE),
            // bottom
            ([[-0.5, 0.5, -0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5], [0.5, 0.5, -0.5]], RED),
            // nose
            ([[-0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5], [0.5, -0.5, 0.5]], BLUE),
            // tail
            ([[-0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [-0.5, 0.5, -0.5], [0.5, -0.5, -0.5]], GREEN),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (corners, color) in faces {
            let base = vertices.len() as u32;
            for corner in corners {
                let position = Vec3::from(corner) + offset;
                vertices.push(Vertex::new(position.into(), color));
            }
            indices.extend([0, 1, 2, 0, 3, 1].iter().map(|i| base + i));
        }

        Self { vertices, indices }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of indices
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}
