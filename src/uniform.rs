//! # Uniforms
//!
//! GPU-side storage for the model-view-projection matrix.
//!
//! [`MvpUniform`] mirrors the WGSL `Uniforms` struct byte for byte and [`UniformBinding`]
//! owns the buffer plus the bind group (group 0, binding 0, vertex stage) through which the
//! shader reads it. The buffer is rewritten once per frame with `Queue::write_buffer`.

/// CPU copy of the shader's uniform block.
///
/// `nalgebra_glm::Mat4` is column-major, which is also what WGSL expects for `mat4x4<f32>`,
/// so the matrix is uploaded without transposing.
#[repr(C)]
#[derive(Default, Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MvpUniform {
    pub mvp: nalgebra_glm::Mat4,
}

/// The uniform buffer and the bind group exposing it to the vertex shader.
pub struct UniformBinding {
    pub buffer: wgpu::Buffer,

    pub bind_group: wgpu::BindGroup,

    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl UniformBinding {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("MVP Uniform Buffer"),
                contents: bytemuck::cast_slice(&[MvpUniform {
                    mvp: nalgebra_glm::Mat4::identity(),
                }]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<MvpUniform>() as wgpu::BufferAddress,
                    ),
                },
                count: None,
            }],
            label: Some("mvp_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("mvp_bind_group"),
        });

        Self {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Queues a write of `mvp` into the buffer; it lands before the next submitted pass.
    pub fn write(&self, queue: &wgpu::Queue, mvp: &nalgebra_glm::Mat4) {
        queue.write_buffer(
            &self.buffer,
            0,
            bytemuck::cast_slice(&[MvpUniform { mvp: *mvp }]),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_one_column_major_matrix() {
        assert_eq!(std::mem::size_of::<MvpUniform>(), 64);

        let mvp = nalgebra_glm::translation(&nalgebra_glm::vec3(1.0, 2.0, 3.0));
        let uniform = MvpUniform { mvp };
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&uniform));
        // Translation occupies the fourth column, i.e. floats 12..15.
        assert_eq!(&floats[12..15], &[1.0, 2.0, 3.0]);
    }
}
