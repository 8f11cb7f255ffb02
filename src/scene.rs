//! # Scene
//!
//! GPU resources for drawing the cube: the render pipeline built from
//! [`SHADER_SOURCE`](crate::SHADER_SOURCE), the MVP uniform binding and, once uploaded, the
//! vertex and index buffers of the mesh.
//!
//! ## Lifecycle
//!
//! 1. [`Scene::new`] compiles the shader and builds the pipeline inside a validation error
//!    scope. A WGSL or pipeline error is returned as [`RenderError::ShaderInit`] rather than
//!    reaching the device's uncaptured error handler, which would panic.
//! 2. [`Scene::upload`] validates a [`Mesh`] and copies it into static GPU buffers.
//! 3. Each frame, [`Scene::set_mvp`] rewrites the uniform and [`Scene::render`] records the
//!    indexed draw into the caller's render pass.
//!
//! Drawing before a mesh is uploaded records nothing.

use crate::error::{RenderError, Result};
use crate::mesh::{Mesh, Vertex};
use crate::renderer::Renderer;
use crate::uniform::UniformBinding;
use crate::SHADER_SOURCE;

/// Vertex and index buffers of an uploaded mesh.
struct MeshBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

pub struct Scene {
    pipeline: wgpu::RenderPipeline,

    uniform: UniformBinding,

    mesh: Option<MeshBuffers>,
}

impl Scene {
    pub async fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Result<Self> {
        let uniform = UniformBinding::new(device);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = Self::create_pipeline(device, surface_format, &uniform);
        if let Some(error) = device.pop_error_scope().await {
            return Err(RenderError::ShaderInit(error.to_string()));
        }

        Ok(Self {
            pipeline,
            uniform,
            mesh: None,
        })
    }

    /// Copies `mesh` into static GPU buffers, replacing any previous mesh, and returns its
    /// index count.
    pub fn upload(&mut self, device: &wgpu::Device, mesh: &Mesh) -> Result<u32> {
        mesh.validate()?;

        let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Cube Vertex Buffer"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );

        let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Cube Index Buffer"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            },
        );

        let index_count = mesh.index_count();
        log::info!(
            "Uploaded mesh: {} vertices, {index_count} indices",
            mesh.vertices.len()
        );

        self.mesh = Some(MeshBuffers {
            vertex_buffer,
            index_buffer,
            index_count,
        });
        Ok(index_count)
    }

    pub fn set_mvp(&self, queue: &wgpu::Queue, mvp: &nalgebra_glm::Mat4) {
        self.uniform.write(queue, mvp);
    }

    /// Records the draw of the first `index_count` indices, clamped to the uploaded mesh.
    pub fn render(&self, renderpass: &mut wgpu::RenderPass<'_>, index_count: u32) {
        let Some(mesh) = self.mesh.as_ref() else {
            return;
        };

        renderpass.set_pipeline(&self.pipeline);
        renderpass.set_bind_group(0, &self.uniform.bind_group, &[]);

        renderpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        renderpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

        renderpass.draw_indexed(0..index_count.min(mesh.index_count), 0, 0..1);
    }

    fn create_pipeline(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        uniform: &UniformBinding,
    ) -> wgpu::RenderPipeline {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Cube Shader"),
            source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(SHADER_SOURCE)),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Cube Pipeline Layout"),
            bind_group_layouts: &[&uniform.bind_group_layout],
            push_constant_ranges: &[],
        });

        let attributes = Vertex::vertex_attributes();

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Cube Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: Some("vertex_main"),
                buffers: &[Vertex::description(&attributes)],
                compilation_options: Default::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
                unclipped_depth: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: Renderer::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: Some("fragment_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            multiview: None,
            cache: None,
        })
    }
}
