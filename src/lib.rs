//! # Spinning Cube
//!
//! A real-time 3D demo that uploads a static colored cube to the GPU and rotates it every
//! frame. It runs natively in a winit window or in the browser on a `<canvas>` through
//! WebGL2 or WebGPU, all on top of `wgpu`.
//!
//! ## Modules
//!
//! - [`animation`]: the animation driver; advances the rotation angle from elapsed time and
//!   derives the model-view-projection matrix.
//! - [`transform`]: camera, rotation profiles and MVP composition.
//! - [`config`]: the demo configuration and its presets.
//! - [`mesh`]: vertex layout and the cube geometry.
//! - [`frame_loop`]: the rendering-context and scheduler boundaries and the loop that ties
//!   them to the driver.
//! - `app`, `renderer`, `scene`, `gpu`, `uniform`: the winit/wgpu host.
//!
//! ## Usage
//!
//! The animation logic is independent of any GPU and can be driven directly:
//!
//! ```
//! use cube_core::{AnimationDriver, DemoConfig};
//! use web_time::{Duration, Instant};
//!
//! let start = Instant::now();
//! let mut driver = AnimationDriver::new(DemoConfig::default(), start);
//! let frame = driver.tick(start + Duration::from_secs(1), 1.0);
//! assert!((frame.angle - 50.0).abs() < 1e-4);
//! ```
//!
//! The full application is started with [`run`].
//!
//! ## Dependencies
//!
//! - `wgpu`: device, surface, pipelines and buffers.
//! - `winit`: window and event loop; each `RedrawRequested` runs one [`PresentationTick`].
//! - `egui`, `egui-wgpu`, `egui-winit`: the control panel overlay.
//! - `nalgebra-glm`: matrix and vector math.
//! - `log` with `env_logger` (desktop) or `console_log` (web): logging.
//! - `thiserror`: the startup error type.

pub mod animation;
mod app;
pub mod config;
pub mod error;
pub mod frame_loop;
mod gpu;
pub mod mesh;
mod renderer;
mod scene;
pub mod transform;
mod uniform;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub use crate::animation::{advance_angle, update, AnimationDriver, AnimationState, FrameUpdate};
pub use crate::app::App;
pub use crate::config::{DemoConfig, Preset};
pub use crate::error::{RenderError, Result};
pub use crate::frame_loop::{
    FrameLoop, FrameScheduler, ManualScheduler, PresentationTick, RenderContext,
};
pub use crate::mesh::{Mesh, Vertex};
pub use crate::renderer::{GuiFrame, Renderer};
pub use crate::transform::{compute_mvp, Camera, RotationProfile};

/// WGSL source for the cube pipeline.
///
/// The vertex stage (`vertex_main`) reads `@location(0) position` and `@location(1) color`
/// as `vec3<f32>` and multiplies the position by the `mvp` matrix at `@group(0)
/// @binding(0)`. The fragment stage (`fragment_main`) writes the interpolated color with
/// full opacity.
pub const SHADER_SOURCE: &str = include_str!("shader_source.wgsl");

/// Validates `config` for `preset`, creates the event loop and runs the application.
///
/// On desktop this blocks until the window is closed and returns the error that stopped
/// startup, if any. On the web it hands the application to the browser's event loop and
/// returns immediately; startup failures there are only logged.
///
/// Every error is logged once before it is returned.
pub fn run(preset: Preset, config: DemoConfig) -> Result<()> {
    config.validate().inspect_err(|err| log::error!("{err}"))?;
    log::info!("Starting with preset {}", preset.label());

    let event_loop = winit::event_loop::EventLoop::new()
        .map_err(|err| RenderError::Platform(err.to_string()))
        .inspect_err(|err| log::error!("{err}"))?;
    let app = App::new(preset, config);

    #[cfg(not(target_arch = "wasm32"))]
    {
        let mut app = app;
        event_loop
            .run_app(&mut app)
            .map_err(|err| RenderError::Platform(err.to_string()))
            .inspect_err(|err| log::error!("{err}"))?;
        // Logged where it happened.
        if let Some(err) = app.take_startup_error() {
            return Err(err);
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::EventLoopExtWebSys;
        event_loop.spawn_app(app);
    }

    Ok(())
}

/// Browser entry point: installs console logging and starts the default preset.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> std::result::Result<(), JsValue> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::warn!("Logger already initialized");
    }
    let preset = Preset::default();
    run(preset, preset.config()).map_err(|err| JsValue::from_str(&err.to_string()))
}
