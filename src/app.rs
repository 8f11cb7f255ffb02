//! # Application Core (`app.rs`)
//!
//! The [`App`] is the host of the animation loop. It implements winit's
//! [`ApplicationHandler`] and is responsible for:
//!
//! - **Window Management**: creating the window (or binding the `<canvas id="canvas">`
//!   element on the web) and forwarding resizes to the renderer.
//! - **Renderer Startup**: acquiring the rendering context and starting the [`FrameLoop`].
//!   Desktop blocks on the async initialization with `pollster`; the web spawns it with
//!   `wasm-bindgen-futures` and receives the result through a `oneshot` channel. A failed
//!   startup is logged once and no frame is ever drawn.
//! - **Frame Scheduling**: while the frame loop is running every event ends with
//!   `request_redraw`, so `RedrawRequested` fires once per display refresh
//!   (`requestAnimationFrame` in the browser) and ticks the frame loop through a
//!   [`PresentationTick`]. Without a running loop no redraw is ever requested.
//! - **Control Panel**: an egui window to switch presets, change the step rate and pause.
//!
//! ## Platform-Specific Notes
//!
//! - **Desktop**: `Escape` closes the window; a startup failure exits the event loop and is
//!   returned from [`run`](crate::run).
//! - **WebAssembly**: the canvas size is read from the element attributes; logging goes to
//!   the browser console.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use std::sync::Arc;

use web_time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Theme, Window, WindowId},
};

use crate::animation::AnimationDriver;
use crate::config::{DemoConfig, Preset};
use crate::error::{RenderError, Result};
use crate::frame_loop::{FrameLoop, PresentationTick};
use crate::mesh::Mesh;
use crate::renderer::{GuiFrame, Renderer};

/// Settings edited through the control panel, applied to the driver after the GUI pass.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PanelState {
    preset: Preset,
    step_rate: f32,
    paused: bool,
}

pub struct App {
    window: Option<Arc<Window>>,

    frame_loop: Option<FrameLoop<Renderer>>,

    gui_state: Option<egui_winit::State>,

    /// Delivers the asynchronously created renderer on the web.
    #[cfg(target_arch = "wasm32")]
    renderer_receiver: Option<futures::channel::oneshot::Receiver<Result<Renderer>>>,

    /// Window or canvas size in physical pixels.
    last_size: (u32, u32),

    config: DemoConfig,

    panel: PanelState,

    /// Why startup failed, if it did.
    startup_error: Option<RenderError>,
}

impl App {
    pub fn new(preset: Preset, config: DemoConfig) -> Self {
        Self {
            window: None,
            frame_loop: None,
            gui_state: None,
            #[cfg(target_arch = "wasm32")]
            renderer_receiver: None,
            last_size: (0, 0),
            config,
            panel: PanelState {
                preset,
                step_rate: config.step_rate,
                paused: false,
            },
            startup_error: None,
        }
    }

    /// Takes the error that stopped the application from starting.
    pub fn take_startup_error(&mut self) -> Option<RenderError> {
        self.startup_error.take()
    }

    /// Frames are only re-armed for a running loop; a failed or pending startup schedules
    /// nothing.
    fn wants_frames(&self) -> bool {
        self.frame_loop.is_some()
    }

    /// Finishes startup with the outcome of context acquisition. Returns whether the loop
    /// is running.
    fn start_frame_loop(&mut self, context: Result<Renderer>) -> bool {
        let mut driver = AnimationDriver::new(self.config, Instant::now());
        driver.set_paused(self.panel.paused);
        match FrameLoop::start(context, &Mesh::cube(), driver) {
            Ok(frame_loop) => {
                self.frame_loop = Some(frame_loop);
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
                true
            }
            // Already logged by FrameLoop::start.
            Err(err) => {
                self.startup_error = Some(err);
                false
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn poll_renderer(&mut self) {
        let Some(receiver) = self.renderer_receiver.as_mut() else {
            return;
        };
        match receiver.try_recv() {
            Ok(Some(context)) => {
                self.renderer_receiver = None;
                self.start_frame_loop(context);
            }
            Ok(None) => {}
            Err(_) => {
                log::error!("Renderer initialization task was dropped");
                self.renderer_receiver = None;
                self.startup_error = Some(RenderError::ContextAcquisition(
                    "renderer initialization task was dropped".into(),
                ));
            }
        }
    }

    /// Applies panel edits to the configuration and the running driver.
    fn apply_panel(&mut self, edited: PanelState) {
        let previous = self.panel;
        self.panel = edited;

        if edited.preset != previous.preset {
            log::info!("Switching to preset {}", edited.preset.label());
            self.config = edited.preset.config();
            self.panel.step_rate = self.config.step_rate;
        } else if edited.step_rate != previous.step_rate {
            self.config.step_rate = edited.step_rate;
        }

        if let Some(frame_loop) = self.frame_loop.as_mut() {
            let driver = frame_loop.driver_mut();
            driver.set_config(self.config);
            driver.set_paused(self.panel.paused);
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Preset::default(), DemoConfig::default())
    }
}

fn backend_label() -> &'static str {
    if cfg!(feature = "webgpu") {
        "Rust/Wgpu/Webgpu"
    } else if cfg!(feature = "webgl") {
        "Rust/Wgpu/Webgl"
    } else {
        "Rust/Wgpu"
    }
}

#[cfg(target_arch = "wasm32")]
fn find_canvas() -> Option<wgpu::web_sys::HtmlCanvasElement> {
    wgpu::web_sys::window()?
        .document()?
        .get_element_by_id("canvas")?
        .dyn_into::<wgpu::web_sys::HtmlCanvasElement>()
        .ok()
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut attributes = Window::default_attributes();

        #[cfg(not(target_arch = "wasm32"))]
        {
            attributes = attributes
                .with_title("Spinning Cube")
                .with_inner_size(PhysicalSize::new(800, 800));
        }

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            let Some(canvas) = find_canvas() else {
                let err = RenderError::ContextAcquisition(
                    "no <canvas id=\"canvas\"> element".into(),
                );
                log::error!("{err}");
                self.startup_error = Some(err);
                return;
            };
            self.last_size = (canvas.width(), canvas.height());
            log::info!("Canvas dimensions: ({} x {})", canvas.width(), canvas.height());
            attributes = attributes.with_canvas(Some(canvas));
        }

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                let err = RenderError::Platform(format!("failed to create window: {err}"));
                log::error!("{err}");
                self.startup_error = Some(err);
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let gui_context = egui::Context::default();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let inner_size = window.inner_size();
            self.last_size = (inner_size.width, inner_size.height);
        }

        #[cfg(target_arch = "wasm32")]
        {
            gui_context.set_pixels_per_point(window.scale_factor() as f32);
        }

        let viewport_id = gui_context.viewport_id();
        self.gui_state = Some(egui_winit::State::new(
            gui_context,
            viewport_id,
            &window,
            Some(window.scale_factor() as _),
            Some(Theme::Dark),
            None,
        ));

        let (width, height) = self.last_size;

        #[cfg(not(target_arch = "wasm32"))]
        {
            let context = pollster::block_on(Renderer::new(window.clone(), width, height));
            if !self.start_frame_loop(context) {
                event_loop.exit();
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let (sender, receiver) = futures::channel::oneshot::channel();
            self.renderer_receiver = Some(receiver);
            wasm_bindgen_futures::spawn_local(async move {
                let context = Renderer::new(window.clone(), width, height).await;
                if sender.send(context).is_err() {
                    log::error!("Failed to send renderer to the application!");
                    return;
                }
                // One wake-up to receive the outcome; only a running loop re-arms frames.
                window.request_redraw();
            });
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        #[cfg(target_arch = "wasm32")]
        self.poll_renderer();

        let Some(window) = self.window.clone() else {
            return;
        };

        if let Some(gui_state) = self.gui_state.as_mut() {
            if gui_state.on_window_event(&window, &event).consumed {
                if self.wants_frames() {
                    window.request_redraw();
                }
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: winit::event::ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match key_code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space => {
                    let edited = PanelState {
                        paused: !self.panel.paused,
                        ..self.panel
                    };
                    self.apply_panel(edited);
                }
                _ => {}
            },
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                log::info!("Resizing renderer surface to: ({width}, {height})");
                if let Some(frame_loop) = self.frame_loop.as_mut() {
                    frame_loop.context_mut().resize(width, height);
                }
                self.last_size = (width, height);
            }
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting...");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => self.redraw(&window),
            _ => (),
        }

        if self.wants_frames() {
            window.request_redraw();
        }
    }
}

impl App {
    /// Runs the GUI pass and ticks the frame loop once.
    fn redraw(&mut self, window: &Window) {
        let (Some(gui_state), Some(frame_loop)) =
            (self.gui_state.as_mut(), self.frame_loop.as_mut())
        else {
            return;
        };

        let mut edited = self.panel;
        let angle = frame_loop.driver().angle();

        let gui_input = gui_state.take_egui_input(window);
        gui_state.egui_ctx().begin_pass(gui_input);

        egui::Window::new(backend_label()).show(gui_state.egui_ctx(), |ui| {
            egui::ComboBox::from_label("Preset")
                .selected_text(edited.preset.label())
                .show_ui(ui, |ui| {
                    for preset in Preset::ALL {
                        ui.selectable_value(&mut edited.preset, preset, preset.label());
                    }
                });
            ui.add(egui::Slider::new(&mut edited.step_rate, -360.0..=360.0).text("Step rate (°/s)"));
            ui.checkbox(&mut edited.paused, "Paused");
            ui.label(format!("Angle: {angle:.1}°"));
        });

        let egui::FullOutput {
            textures_delta,
            shapes,
            pixels_per_point,
            platform_output,
            ..
        } = gui_state.egui_ctx().end_pass();

        gui_state.handle_platform_output(window, platform_output);

        let paint_jobs = gui_state.egui_ctx().tessellate(shapes, pixels_per_point);

        let (width, height) = self.last_size;
        frame_loop.context_mut().prepare_gui(GuiFrame {
            screen_descriptor: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [width, height],
                pixels_per_point: window.scale_factor() as f32,
            },
            paint_jobs,
            textures_delta,
        });

        frame_loop.run(&mut PresentationTick::now());

        if edited != self.panel {
            self.apply_panel(edited);
        }
    }
}
