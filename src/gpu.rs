//! # GPU Management Module
//!
//! The `gpu` module acquires and owns the rendering context: the surface presented to the
//! window or canvas, the logical device and its queue, and the surface configuration.
//!
//! ## Overview
//!
//! [`Gpu::new_async`] walks the usual bootstrap sequence (instance, surface, adapter,
//! device, surface configuration). Any step that can fail maps to
//! [`RenderError::ContextAcquisition`], so a missing WebGL2 context, an unsupported adapter
//! or a rejected device request all surface as one startup error instead of a panic.
//!
//! ## Features
//!
//! - **Dynamic Surface Resizing**: reconfigures the surface when the window or canvas changes size.
//! - **Aspect Ratio Calculation**: exposes the surface aspect ratio for the projection matrix.
//! - **Depth Texture Creation**: creates the depth attachment used for hidden surface removal.
//! - **Asynchronous Initialization**: the same `async` path serves desktop (driven by
//!   `pollster`) and the browser (driven by `wasm-bindgen-futures`).
//!
//! ## Example Usage
//!
//! ```ignore
//! let gpu = Gpu::new_async(window, width, height).await?;
//! let depth = gpu.create_depth_texture(width, height);
//! ```

use wgpu::InstanceDescriptor;

use crate::error::{RenderError, Result};

/// The device context every other GPU resource is created from.
pub struct Gpu {
    /// Presentation surface backed by the window or HTML canvas.
    pub surface: wgpu::Surface<'static>,

    /// Logical device used to create buffers, textures and pipelines.
    pub device: wgpu::Device,

    /// Submission queue for command buffers and buffer writes.
    pub queue: wgpu::Queue,

    /// Current surface configuration; width and height track the window size.
    pub surface_config: wgpu::SurfaceConfiguration,

    /// Color format of the surface textures and of the pipeline's color target.
    pub surface_format: wgpu::TextureFormat,
}

impl Gpu {
    /// Width over height of the surface. The height is clamped to 1 so a minimized window
    /// never yields an infinite ratio.
    pub fn aspect_ratio(&self) -> f32 {
        self.surface_config.width as f32 / self.surface_config.height.max(1) as f32
    }

    /// Reconfigures the surface for a new size. Zero-sized requests (minimized windows) are
    /// ignored because a surface cannot be configured with an empty extent.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("Ignoring zero-sized resize ({width}, {height})");
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Re-applies the current configuration after the surface was lost or became outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.surface_config);
    }

    pub fn create_depth_texture(&self, width: u32, height: u32) -> wgpu::TextureView {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: crate::renderer::Renderer::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Acquires the rendering context for `window`.
    pub async fn new_async(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&InstanceDescriptor::default());

        let surface = instance
            .create_surface(window)
            .map_err(|err| RenderError::ContextAcquisition(err.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| {
                RenderError::ContextAcquisition("no compatible graphics adapter".into())
            })?;

        log::info!("WGPU Adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("WGPU Device"),
                    memory_hints: wgpu::MemoryHints::default(),
                    required_features: wgpu::Features::default(),
                    #[cfg(not(target_arch = "wasm32"))]
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    #[cfg(all(target_arch = "wasm32", feature = "webgpu"))]
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    #[cfg(all(target_arch = "wasm32", not(feature = "webgpu")))]
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|err| RenderError::ContextAcquisition(err.to_string()))?;

        let surface_capabilities = surface.get_capabilities(&adapter);

        // egui wants a non-srgb surface texture
        let surface_format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| {
                RenderError::ContextAcquisition("surface is not supported by the adapter".into())
            })?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: surface_capabilities
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            surface_format,
        })
    }
}
