//! # Animation Driver
//!
//! Advances the cube's rotation angle from wall-clock time and derives the frame's
//! model-view-projection matrix.
//!
//! ## State
//!
//! The only mutable state is [`AnimationState`]: the current angle and the instant of the
//! previous update. It is passed into [`update`] and a new value is returned, so the whole
//! per-tick computation can be exercised without a window, a GPU or a real clock.
//! [`AnimationDriver`] is a thin owner of that state used by the frame loop.
//!
//! ## Angle
//!
//! `new_angle = (angle + step_rate * elapsed_seconds) mod 360`, using the Euclidean
//! remainder so the result stays in `[0, 360)` for negative step rates as well. A clock that
//! goes backwards counts as zero elapsed time.

use nalgebra_glm::Mat4;
use web_time::Instant;

use crate::config::DemoConfig;
use crate::transform::compute_mvp;

/// Advances `angle` by `step_rate` degrees per second over `elapsed_secs`, wrapped into
/// `[0, 360)`.
///
/// If the product overflows into a non-finite value the previous angle is kept.
pub fn advance_angle(angle: f32, step_rate: f32, elapsed_secs: f32) -> f32 {
    let advanced = angle + step_rate * elapsed_secs;
    if !advanced.is_finite() {
        return angle;
    }

    let wrapped = advanced.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Rotation angle plus the time it was last advanced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
    /// Current angle in degrees, in `[0, 360)`.
    pub angle: f32,
    pub last_update: Instant,
}

impl AnimationState {
    /// The "not yet started" state: angle zero, clock starting at `now`.
    pub fn started_at(now: Instant) -> Self {
        Self {
            angle: 0.0,
            last_update: now,
        }
    }

    /// Moves the state to `now`, advancing the angle at `step_rate` degrees per second.
    pub fn advance(self, step_rate: f32, now: Instant) -> Self {
        let elapsed = now.saturating_duration_since(self.last_update);
        Self {
            angle: advance_angle(self.angle, step_rate, elapsed.as_secs_f32()),
            last_update: now,
        }
    }
}

/// Per-tick update: returns the advanced state and the transform for the new angle.
pub fn update(
    state: AnimationState,
    config: &DemoConfig,
    now: Instant,
    aspect_ratio: f32,
) -> (AnimationState, Mat4) {
    let next = state.advance(config.step_rate, now);
    let mvp = compute_mvp(&config.camera, &config.rotation, aspect_ratio, next.angle);
    (next, mvp)
}

/// Output of one tick, consumed by the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameUpdate {
    pub angle: f32,
    pub mvp: Mat4,
}

/// Owns the animation state between ticks.
pub struct AnimationDriver {
    config: DemoConfig,
    state: AnimationState,
    paused: bool,
}

impl AnimationDriver {
    pub fn new(config: DemoConfig, now: Instant) -> Self {
        Self {
            config,
            state: AnimationState::started_at(now),
            paused: false,
        }
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    /// Replaces the configuration; the current angle carries over.
    pub fn set_config(&mut self, config: DemoConfig) {
        self.config = config;
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn angle(&self) -> f32 {
        self.state.angle
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// While paused the angle is frozen but the clock keeps moving, so resuming does not
    /// jump by the paused duration.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn tick(&mut self, now: Instant, aspect_ratio: f32) -> FrameUpdate {
        let config = if self.paused {
            DemoConfig {
                step_rate: 0.0,
                ..self.config
            }
        } else {
            self.config
        };

        let (state, mvp) = update(self.state, &config, now, aspect_ratio);
        self.state = state;
        log::trace!("tick: angle={:.3}", state.angle);

        FrameUpdate {
            angle: state.angle,
            mvp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;
    use web_time::Duration;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn wraps_past_full_turn() {
        assert_eq!(advance_angle(350.0, 50.0, 1.0), 40.0);
    }

    #[test]
    fn zero_elapsed_is_a_no_op() {
        for angle in [0.0, 12.5, 359.9] {
            assert_eq!(advance_angle(angle, 50.0, 0.0), angle);
        }
    }

    #[test]
    fn result_always_in_range() {
        let rates = [-720.0, -50.0, 0.0, 0.1, 50.0, 1000.0, 1.0e6];
        let elapsed = [0.0, 0.001, 0.016, 1.0, 7.3, 3600.0];
        let starts = [0.0, 90.0, 359.999];
        for &rate in &rates {
            for &e in &elapsed {
                for &start in &starts {
                    let angle = advance_angle(start, rate, e);
                    assert!((0.0..360.0).contains(&angle), "{start} + {rate} * {e} = {angle}");
                }
            }
        }
    }

    #[test]
    fn tiny_negative_step_does_not_land_on_360() {
        let angle = advance_angle(0.0, -1.0e-9, 1.0);
        assert!((0.0..360.0).contains(&angle));
    }

    #[test]
    fn non_finite_advance_keeps_angle() {
        assert_eq!(advance_angle(10.0, f32::INFINITY, 1.0), 10.0);
        assert_eq!(advance_angle(10.0, f32::MAX, f32::MAX), 10.0);
    }

    #[test]
    fn state_advances_by_elapsed_time() {
        let start = Instant::now();
        let state = AnimationState::started_at(start);
        assert_eq!(state.angle, 0.0);

        let next = state.advance(90.0, start + Duration::from_millis(500));
        assert!((next.angle - 45.0).abs() < EPSILON);
        assert_eq!(next.last_update, start + Duration::from_millis(500));
    }

    #[test]
    fn clock_going_backwards_counts_as_zero_elapsed() {
        let start = Instant::now() + Duration::from_secs(1);
        let state = AnimationState {
            angle: 20.0,
            last_update: start,
        };
        let earlier = start - Duration::from_millis(300);
        assert_eq!(state.advance(50.0, earlier).angle, 20.0);
    }

    #[test]
    fn update_is_deterministic() {
        let start = Instant::now();
        let config = Preset::Tumble.config();
        let state = AnimationState {
            angle: 123.0,
            last_update: start,
        };
        let now = start + Duration::from_millis(16);

        let (a, mvp_a) = update(state, &config, now, 1.0);
        let (b, mvp_b) = update(state, &config, now, 1.0);
        assert_eq!(a, b);
        assert_eq!(mvp_a, mvp_b);
    }

    #[test]
    fn driver_ticks_at_step_rate() {
        let start = Instant::now();
        let mut driver = AnimationDriver::new(DemoConfig::default(), start);

        let mut previous = driver.angle();
        for frame in 1..=3 {
            let update = driver.tick(start + Duration::from_millis(16 * frame), 1.0);
            assert!(update.angle > previous);
            assert!((update.angle - previous - 0.8).abs() < EPSILON);
            previous = update.angle;
        }
        assert!((driver.angle() - 2.4).abs() < EPSILON);
    }

    #[test]
    fn paused_driver_holds_angle_and_resumes_smoothly() {
        let start = Instant::now();
        let mut driver = AnimationDriver::new(DemoConfig::default(), start);
        driver.tick(start + Duration::from_secs(1), 1.0);
        assert!((driver.angle() - 50.0).abs() < EPSILON);

        driver.set_paused(true);
        driver.tick(start + Duration::from_secs(5), 1.0);
        assert!((driver.angle() - 50.0).abs() < EPSILON);

        driver.set_paused(false);
        driver.tick(start + Duration::from_secs(6), 1.0);
        assert!((driver.angle() - 100.0).abs() < EPSILON);
    }

    #[test]
    fn changing_preset_keeps_angle() {
        let start = Instant::now();
        let mut driver = AnimationDriver::new(DemoConfig::default(), start);
        driver.tick(start + Duration::from_secs(2), 1.0);

        driver.set_config(Preset::Overview.config());
        assert!((driver.angle() - 100.0).abs() < EPSILON);
        assert_eq!(driver.config().step_rate, 68.75);
    }
}
