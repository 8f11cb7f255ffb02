//! # `renderer.rs` - Renderer Module
//!
//! The `renderer.rs` module contains the [`Renderer`], the wgpu-backed implementation of
//! [`RenderContext`]. It owns the GPU context, the depth attachment, the cube [`Scene`] and
//! the `egui_wgpu` renderer used for the control panel overlay.
//!
//! ## Frame Composition
//!
//! A frame is one render pass that:
//!
//! 1. clears color and depth,
//! 2. draws the cube with the matrix set by [`RenderContext::set_uniform_matrix`],
//! 3. draws the egui overlay prepared for this frame with [`Renderer::prepare_gui`], if any.
//!
//! ## Errors
//!
//! Construction fails with [`RenderError::ContextAcquisition`] or
//! [`RenderError::ShaderInit`]. Once running, a lost or outdated surface is reconfigured and
//! the frame is skipped; no error escapes [`RenderContext::clear_and_draw`].
//!
//! [`RenderError::ContextAcquisition`]: crate::RenderError::ContextAcquisition
//! [`RenderError::ShaderInit`]: crate::RenderError::ShaderInit

use crate::error::Result;
use crate::frame_loop::RenderContext;
use crate::gpu::Gpu;
use crate::mesh::Mesh;
use crate::scene::Scene;

/// Tessellated egui output waiting to be drawn over the next frame.
pub struct GuiFrame {
    pub screen_descriptor: egui_wgpu::ScreenDescriptor,
    pub paint_jobs: Vec<egui::epaint::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
}

/// Where egui textures live between frames.
trait GuiTextures {
    fn free_texture(&mut self, id: &egui::TextureId);
}

impl GuiTextures for egui_wgpu::Renderer {
    fn free_texture(&mut self, id: &egui::TextureId) {
        egui_wgpu::Renderer::free_texture(self, id);
    }
}

/// Frees the textures egui retired in `gui_frame`, whether or not the frame reached the
/// screen.
fn release_textures(textures: &mut impl GuiTextures, gui_frame: Option<GuiFrame>) {
    let Some(gui) = gui_frame else {
        return;
    };
    for id in &gui.textures_delta.free {
        textures.free_texture(id);
    }
}

pub struct Renderer {
    gpu: Gpu,

    depth_texture_view: wgpu::TextureView,

    egui_renderer: egui_wgpu::Renderer,

    scene: Scene,

    gui_frame: Option<GuiFrame>,
}

impl Renderer {
    /// Format of the depth attachment. 32-bit float depth is available on every backend,
    /// including WebGL2.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Background behind the cube.
    pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    /// Acquires the rendering context for `window` and builds the cube pipeline.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let gpu = Gpu::new_async(window, width, height).await?;

        let depth_texture_view = gpu.create_depth_texture(width, height);

        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.surface_config.format,
            Some(Self::DEPTH_FORMAT),
            1,
            false,
        );

        let scene = Scene::new(&gpu.device, gpu.surface_format).await?;

        Ok(Self {
            gpu,
            depth_texture_view,
            egui_renderer,
            scene,
            gui_frame: None,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.depth_texture_view = self.gpu.create_depth_texture(width, height);
    }

    /// Queues egui output to be composited over the next drawn frame.
    pub fn prepare_gui(&mut self, gui_frame: GuiFrame) {
        self.gui_frame = Some(gui_frame);
    }

    fn acquire_surface_texture(&self) -> Option<wgpu::SurfaceTexture> {
        match self.gpu.surface.get_current_texture() {
            Ok(texture) => Some(texture),
            Err(error @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface {error}; reconfiguring and skipping frame");
                self.gpu.reconfigure();
                None
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory acquiring surface texture; skipping frame");
                None
            }
            Err(error) => {
                log::warn!("Failed to acquire surface texture: {error}; skipping frame");
                None
            }
        }
    }
}

impl RenderContext for Renderer {
    fn upload_static_mesh(&mut self, mesh: &Mesh) -> Result<u32> {
        self.scene.upload(&self.gpu.device, mesh)
    }

    fn set_uniform_matrix(&mut self, mvp: &nalgebra_glm::Mat4) {
        self.scene.set_mvp(&self.gpu.queue, mvp);
    }

    fn clear_and_draw(&mut self, index_count: u32) {
        let gui_frame = self.gui_frame.take();

        // Texture uploads and frees must not be lost with a skipped frame; egui sends the font
        // atlas once.
        if let Some(gui) = gui_frame.as_ref() {
            for (id, image_delta) in &gui.textures_delta.set {
                self.egui_renderer
                    .update_texture(&self.gpu.device, &self.gpu.queue, *id, image_delta);
            }
        }

        self.draw(index_count, gui_frame.as_ref());
        release_textures(&mut self.egui_renderer, gui_frame);
    }

    fn aspect_ratio(&self) -> f32 {
        self.gpu.aspect_ratio()
    }
}

impl Renderer {
    fn draw(&mut self, index_count: u32, gui_frame: Option<&GuiFrame>) {
        let Some(surface_texture) = self.acquire_surface_texture() else {
            return;
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        if let Some(gui) = gui_frame {
            self.egui_renderer.update_buffers(
                &self.gpu.device,
                &self.gpu.queue,
                &mut encoder,
                &gui.paint_jobs,
                &gui.screen_descriptor,
            );
        }

        let surface_texture_view =
            surface_texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor {
                    format: Some(self.gpu.surface_format),
                    ..Default::default()
                });

        encoder.insert_debug_marker("Render cube");

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(Self::CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.scene.render(&mut render_pass, index_count);

            if let Some(gui) = gui_frame {
                self.egui_renderer.render(
                    &mut render_pass.forget_lifetime(),
                    &gui.paint_jobs,
                    &gui.screen_descriptor,
                );
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FreedTextures(Vec<egui::TextureId>);

    impl GuiTextures for FreedTextures {
        fn free_texture(&mut self, id: &egui::TextureId) {
            self.0.push(*id);
        }
    }

    fn gui_frame(free: Vec<egui::TextureId>) -> GuiFrame {
        GuiFrame {
            screen_descriptor: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [800, 800],
                pixels_per_point: 1.0,
            },
            paint_jobs: Vec::new(),
            textures_delta: egui::TexturesDelta {
                free,
                ..Default::default()
            },
        }
    }

    #[test]
    fn retired_textures_are_freed_for_every_gui_frame() {
        let mut textures = FreedTextures::default();
        let retired = vec![egui::TextureId::Managed(3), egui::TextureId::User(7)];

        release_textures(&mut textures, Some(gui_frame(retired.clone())));

        assert_eq!(textures.0, retired);
    }

    #[test]
    fn no_gui_frame_frees_nothing() {
        let mut textures = FreedTextures::default();
        release_textures(&mut textures, None);
        assert!(textures.0.is_empty());
    }
}
