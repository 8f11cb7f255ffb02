//! # Frame Loop
//!
//! Ties the [`AnimationDriver`] to a rendering backend. One tick advances the driver, hands
//! the new matrix to the backend and asks it to clear and draw the mesh.
//!
//! The backend is reached only through [`RenderContext`], and ticks are requested through
//! [`FrameScheduler`]:
//!
//! - [`PresentationTick`]: one frame stamped with the time it was presented. The application
//!   runs the loop with one of these on every winit `RedrawRequested`, which the event loop
//!   re-arms with `request_redraw` (`requestAnimationFrame` in the browser).
//! - [`ManualScheduler`]: replays a fixed list of frame intervals synchronously.

use std::collections::VecDeque;

use nalgebra_glm::Mat4;
use web_time::{Duration, Instant};

use crate::animation::{AnimationDriver, FrameUpdate};
use crate::error::Result;
use crate::mesh::Mesh;

/// The operations the frame loop needs from a graphics backend.
pub trait RenderContext {
    /// Uploads immutable mesh data and returns the index count to draw with.
    fn upload_static_mesh(&mut self, mesh: &Mesh) -> Result<u32>;

    /// Sets the model-view-projection matrix used by the next draw.
    fn set_uniform_matrix(&mut self, mvp: &Mat4);

    /// Clears color and depth, then draws `index_count` indices of the uploaded mesh.
    fn clear_and_draw(&mut self, index_count: u32);

    /// Width over height of the render target.
    fn aspect_ratio(&self) -> f32 {
        1.0
    }
}

/// Source of frame timestamps. `None` means the host stopped scheduling frames.
pub trait FrameScheduler {
    fn next_frame(&mut self) -> Option<Instant>;
}

/// A single frame, yielded once and then exhausted.
pub struct PresentationTick {
    at: Option<Instant>,
}

impl PresentationTick {
    pub fn at(now: Instant) -> Self {
        Self { at: Some(now) }
    }

    /// A frame stamped with the current time.
    pub fn now() -> Self {
        Self::at(Instant::now())
    }
}

impl FrameScheduler for PresentationTick {
    fn next_frame(&mut self) -> Option<Instant> {
        self.at.take()
    }
}

/// Replays a fixed sequence of frame intervals starting from a given instant.
pub struct ManualScheduler {
    now: Instant,
    intervals: VecDeque<Duration>,
}

impl ManualScheduler {
    pub fn new(start: Instant, intervals: impl IntoIterator<Item = Duration>) -> Self {
        Self {
            now: start,
            intervals: intervals.into_iter().collect(),
        }
    }

    /// `count` frames spaced `interval` apart.
    pub fn uniform(start: Instant, interval: Duration, count: usize) -> Self {
        Self::new(start, std::iter::repeat(interval).take(count))
    }
}

impl FrameScheduler for ManualScheduler {
    fn next_frame(&mut self) -> Option<Instant> {
        let interval = self.intervals.pop_front()?;
        self.now += interval;
        Some(self.now)
    }
}

/// A started animation loop: an initialized context with the mesh already uploaded.
pub struct FrameLoop<C: RenderContext> {
    context: C,
    driver: AnimationDriver,
    index_count: u32,
}

impl<C: RenderContext> FrameLoop<C> {
    /// Runs the startup sequence.
    ///
    /// `context` is the outcome of context acquisition. On failure, or if the mesh cannot be
    /// uploaded, the error is logged once and returned; no frame is ever drawn.
    pub fn start(context: Result<C>, mesh: &Mesh, driver: AnimationDriver) -> Result<Self> {
        let started = context.and_then(|mut context| {
            let index_count = context.upload_static_mesh(mesh)?;
            Ok(Self {
                context,
                driver,
                index_count,
            })
        });

        match &started {
            Ok(frame_loop) => log::info!(
                "Frame loop started with {} indices",
                frame_loop.index_count
            ),
            Err(err) => log::error!("{err}"),
        }
        started
    }

    /// One animation tick at `now`.
    pub fn tick(&mut self, now: Instant) -> FrameUpdate {
        let update = self.driver.tick(now, self.context.aspect_ratio());
        self.context.set_uniform_matrix(&update.mvp);
        self.context.clear_and_draw(self.index_count);
        update
    }

    /// Ticks once for every timestamp the scheduler yields and returns the frame count.
    pub fn run(&mut self, scheduler: &mut impl FrameScheduler) -> usize {
        let mut frames = 0;
        while let Some(now) = scheduler.next_frame() {
            self.tick(now);
            frames += 1;
        }
        frames
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut AnimationDriver {
        &mut self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_scheduler_accumulates_intervals() {
        let start = Instant::now();
        let mut scheduler = ManualScheduler::new(
            start,
            [Duration::from_millis(10), Duration::from_millis(20)],
        );
        assert_eq!(scheduler.next_frame(), Some(start + Duration::from_millis(10)));
        assert_eq!(scheduler.next_frame(), Some(start + Duration::from_millis(30)));
        assert_eq!(scheduler.next_frame(), None);
    }

    #[test]
    fn uniform_scheduler_yields_count_frames() {
        let mut scheduler =
            ManualScheduler::uniform(Instant::now(), Duration::from_millis(16), 4);
        let frames = std::iter::from_fn(|| scheduler.next_frame()).count();
        assert_eq!(frames, 4);
    }

    #[test]
    fn presentation_tick_yields_exactly_one_frame() {
        let now = Instant::now();
        let mut tick = PresentationTick::at(now);
        assert_eq!(tick.next_frame(), Some(now));
        assert_eq!(tick.next_frame(), None);
    }
}
