//! # Mesh
//!
//! The `mesh` module defines the vertex layout shared by the CPU-side mesh data and the
//! vertex shader, together with the static colored cube drawn by the application.
//!
//! ## Overview
//!
//! - [`Vertex`]: a position and an RGB color, laid out with `#[repr(C)]` so the data can
//!   be cast to bytes with `bytemuck` and uploaded directly into a vertex buffer.
//! - [`Mesh`]: interleaved vertices plus a triangle-list index buffer.
//! - [`Mesh::cube`]: the 24-vertex cube. Each face owns its four vertices so every face can
//!   carry a flat color without any blending across edges.
//!
//! ## Layout
//!
//! | Location | Attribute  | Format      |
//! |----------|------------|-------------|
//! | 0        | `position` | `Float32x3` |
//! | 1        | `color`    | `Float32x3` |
//!
//! The shader in `shader_source.wgsl` must declare the same locations.

use crate::error::{RenderError, Result};

/// A single vertex of a mesh.
///
/// Both attributes are three-component float vectors; the homogeneous `w` coordinate and
/// the alpha channel are filled in by the vertex shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position `[x, y, z]`.
    pub position: [f32; 3],

    /// Linear RGB color `[r, g, b]`.
    pub color: [f32; 3],
}

impl Vertex {
    /// Returns the attribute list matching the shader's `@location` bindings.
    pub fn vertex_attributes() -> Vec<wgpu::VertexAttribute> {
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3].to_vec()
    }

    /// Builds the vertex buffer layout used by the render pipeline.
    ///
    /// The attribute slice is borrowed rather than owned, so callers keep the vector
    /// returned by [`Vertex::vertex_attributes`] alive while the pipeline is created.
    pub fn description(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// Number of floats per position and per color in the flat attribute arrays.
const COMPONENTS: usize = 3;

// v0-v1-v2-v3 front, v0-v3-v4-v5 right, v0-v5-v6-v1 up,
// v1-v6-v7-v2 left, v7-v4-v3-v2 down, v4-v7-v6-v5 back
#[rustfmt::skip]
const CUBE_POSITIONS: [f32; 72] = [
     1.0,  1.0,  1.0,  -1.0,  1.0,  1.0,  -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,
     1.0,  1.0,  1.0,   1.0, -1.0,  1.0,   1.0, -1.0, -1.0,   1.0,  1.0, -1.0,
     1.0,  1.0,  1.0,   1.0,  1.0, -1.0,  -1.0,  1.0, -1.0,  -1.0,  1.0,  1.0,
    -1.0,  1.0,  1.0,  -1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,
    -1.0, -1.0, -1.0,   1.0, -1.0, -1.0,   1.0, -1.0,  1.0,  -1.0, -1.0,  1.0,
     1.0, -1.0, -1.0,  -1.0, -1.0, -1.0,  -1.0,  1.0, -1.0,   1.0,  1.0, -1.0,
];

/// One color per face, repeated for that face's four vertices.
const CUBE_FACE_COLORS: [[f32; 3]; 6] = [
    [0.4, 0.4, 1.0], // front, blue
    [0.4, 1.0, 0.4], // right, green
    [1.0, 0.4, 0.4], // up, red
    [1.0, 1.0, 0.4], // left, yellow
    [0.9, 0.4, 0.2], // down, orange
    [0.4, 1.0, 1.0], // back, cyan
];

#[rustfmt::skip]
const CUBE_INDICES: [u16; 36] = [
     0,  1,  2,   0,  2,  3, // front
     4,  5,  6,   4,  6,  7, // right
     8,  9, 10,   8, 10, 11, // up
    12, 13, 14,  12, 14, 15, // left
    16, 17, 18,  16, 18, 19, // down
    20, 21, 22,  20, 22, 23, // back
];

/// Geometry ready to be uploaded to the GPU: interleaved vertices and triangle-list indices.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// The colored cube spanning `[-1, 1]` on every axis.
    pub fn cube() -> Self {
        let colors: Vec<f32> = CUBE_FACE_COLORS
            .iter()
            .flat_map(|color| std::iter::repeat(color).take(4))
            .flatten()
            .copied()
            .collect();

        Self {
            vertices: interleave(&CUBE_POSITIONS, &colors),
            indices: CUBE_INDICES.to_vec(),
        }
    }

    /// Assembles a mesh from flat position and color arrays (three floats per vertex each)
    /// and a triangle-list index array.
    ///
    /// Rejects empty meshes, mismatched attribute lengths, index counts that do not form
    /// whole triangles and indices that point past the last vertex.
    pub fn from_attributes(positions: &[f32], colors: &[f32], indices: &[u16]) -> Result<Self> {
        if positions.is_empty() || indices.is_empty() {
            return Err(RenderError::MeshUpload("mesh has no geometry".into()));
        }
        if positions.len() % COMPONENTS != 0 {
            return Err(RenderError::MeshUpload(format!(
                "position array length {} is not a multiple of {COMPONENTS}",
                positions.len()
            )));
        }
        if colors.len() != positions.len() {
            return Err(RenderError::MeshUpload(format!(
                "{} color components for {} position components",
                colors.len(),
                positions.len()
            )));
        }

        let mesh = Self {
            vertices: interleave(positions, colors),
            indices: indices.to_vec(),
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Checks that the mesh can be drawn as an indexed triangle list.
    pub fn validate(&self) -> Result<()> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(RenderError::MeshUpload("mesh has no geometry".into()));
        }
        if self.indices.len() % 3 != 0 {
            return Err(RenderError::MeshUpload(format!(
                "{} indices do not form whole triangles",
                self.indices.len()
            )));
        }
        if let Some(&index) = self
            .indices
            .iter()
            .find(|&&index| usize::from(index) >= self.vertices.len())
        {
            return Err(RenderError::MeshUpload(format!(
                "index {index} out of range for {} vertices",
                self.vertices.len()
            )));
        }
        Ok(())
    }

    /// Element count passed to the draw call.
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

fn interleave(positions: &[f32], colors: &[f32]) -> Vec<Vertex> {
    positions
        .chunks_exact(COMPONENTS)
        .zip(colors.chunks_exact(COMPONENTS))
        .map(|(position, color)| Vertex {
            position: [position[0], position[1], position[2]],
            color: [color[0], color[1], color[2]],
        })
        .collect()
}
