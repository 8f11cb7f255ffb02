//! Demo configuration and the named presets the control panel switches between.

use nalgebra_glm::Vec3;

use crate::error::{RenderError, Result};
use crate::transform::{Camera, RotationProfile};

/// Everything the animation driver needs besides the clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DemoConfig {
    /// Angular velocity in degrees per second. Negative values spin backwards.
    pub step_rate: f32,
    pub camera: Camera,
    pub rotation: RotationProfile,
}

impl DemoConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(RenderError::InvalidConfig(reason));

        if !self.step_rate.is_finite() {
            return invalid(format!("step rate {} is not finite", self.step_rate));
        }

        let camera = &self.camera;
        if !(camera.fov_y_degrees > 0.0 && camera.fov_y_degrees < 180.0) {
            return invalid(format!(
                "field of view {}° outside (0, 180)",
                camera.fov_y_degrees
            ));
        }
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return invalid(format!(
                "clip planes near={} far={} must satisfy 0 < near < far",
                camera.near, camera.far
            ));
        }

        let forward = camera.target - camera.eye;
        if forward.norm() == 0.0 {
            return invalid("camera eye and target coincide".into());
        }
        if nalgebra_glm::cross(&forward, &camera.up).norm() == 0.0 {
            return invalid("camera up vector is parallel to the view direction".into());
        }

        match self.rotation {
            RotationProfile::AboutAxis { axis } if axis.norm() == 0.0 || !is_finite(&axis) => {
                invalid("rotation axis must be a finite, non-zero vector".into())
            }
            RotationProfile::Weighted { x, y, z }
                if !(x.is_finite() && y.is_finite() && z.is_finite()) =>
            {
                invalid("rotation weights must be finite".into())
            }
            _ => Ok(()),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Preset::default().config()
    }
}

fn is_finite(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// The three variants of the demo, expressed as configurations of the same driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "wasm32"), derive(clap::ValueEnum))]
pub enum Preset {
    /// Tilted single-axis spin at 50°/s, narrow lens.
    #[default]
    Classic,
    /// Full angle about X, half about Y, a tenth about Z.
    Tumble,
    /// Wide lens looking down from above, equal spin about X and Y.
    Overview,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Classic, Preset::Tumble, Preset::Overview];

    pub fn label(self) -> &'static str {
        match self {
            Preset::Classic => "Classic",
            Preset::Tumble => "Tumble",
            Preset::Overview => "Overview",
        }
    }

    pub fn config(self) -> DemoConfig {
        match self {
            Preset::Classic => DemoConfig {
                step_rate: 50.0,
                camera: Camera::default(),
                rotation: RotationProfile::default(),
            },
            Preset::Tumble => DemoConfig {
                step_rate: 60.0,
                camera: Camera::default(),
                rotation: RotationProfile::Weighted {
                    x: 1.0,
                    y: 0.5,
                    z: 0.1,
                },
            },
            // 0.02 rad per frame at 60 Hz.
            Preset::Overview => DemoConfig {
                step_rate: 68.75,
                camera: Camera {
                    fov_y_degrees: 70.0,
                    near: 0.1,
                    far: 100.0,
                    eye: nalgebra_glm::vec3(0.0, 10.0, 10.0),
                    target: Vec3::zeros(),
                    up: Vec3::y(),
                },
                rotation: RotationProfile::Weighted {
                    x: 1.0,
                    y: 1.0,
                    z: 0.0,
                },
            },
        }
    }
}
