//! # Transform
//!
//! Builds the model-view-projection matrix uploaded to the vertex shader every frame.
//!
//! The matrix is always recomputed from scratch: a right-handed perspective projection with
//! zero-to-one depth (the clip space `wgpu` expects on every backend, WebGL included), a
//! look-at view from the [`Camera`], and the model rotation produced by a
//! [`RotationProfile`] for the current angle. Nothing is accumulated between frames, so the
//! same inputs always give a bit-identical matrix.

use nalgebra_glm::{Mat4, Vec3};

/// Perspective and placement of the viewer.
///
/// The aspect ratio is deliberately absent: it is read from the surface size each frame so
/// that window and canvas resizes are honoured without touching the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Camera {
    pub fn projection(&self, aspect_ratio: f32) -> Mat4 {
        nalgebra_glm::perspective_rh_zo(
            aspect_ratio,
            self.fov_y_degrees.to_radians(),
            self.near,
            self.far,
        )
    }

    pub fn view(&self) -> Mat4 {
        nalgebra_glm::look_at_rh(&self.eye, &self.target, &self.up)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_y_degrees: 30.0,
            near: 1.0,
            far: 100.0,
            eye: nalgebra_glm::vec3(0.0, 0.0, 10.0),
            target: Vec3::zeros(),
            up: Vec3::y(),
        }
    }
}

/// How the animation angle turns into a model rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RotationProfile {
    /// A single rotation by the full angle about `axis`. The axis does not need to be
    /// normalized, but it must not be zero.
    AboutAxis { axis: Vec3 },

    /// Rotations about X, then Y, then Z, each by `angle * weight`.
    Weighted { x: f32, y: f32, z: f32 },
}

impl RotationProfile {
    /// Model matrix for `angle_degrees`.
    pub fn model(&self, angle_degrees: f32) -> Mat4 {
        let angle = angle_degrees.to_radians();
        let identity = Mat4::identity();
        match *self {
            RotationProfile::AboutAxis { axis } => nalgebra_glm::rotate(&identity, angle, &axis),
            RotationProfile::Weighted { x, y, z } => {
                let model = nalgebra_glm::rotate_x(&identity, angle * x);
                let model = nalgebra_glm::rotate_y(&model, angle * y);
                nalgebra_glm::rotate_z(&model, angle * z)
            }
        }
    }
}

impl Default for RotationProfile {
    fn default() -> Self {
        RotationProfile::AboutAxis {
            axis: nalgebra_glm::vec3(1.0, 1.0, 0.0),
        }
    }
}

/// `projection * view * model` for the given camera, rotation and angle.
pub fn compute_mvp(
    camera: &Camera,
    rotation: &RotationProfile,
    aspect_ratio: f32,
    angle_degrees: f32,
) -> Mat4 {
    camera.projection(aspect_ratio) * camera.view() * rotation.model(angle_degrees)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn zero_angle_is_identity_model() {
        let profiles = [
            RotationProfile::default(),
            RotationProfile::Weighted {
                x: 1.0,
                y: 0.5,
                z: 0.1,
            },
        ];
        for profile in profiles {
            assert!((profile.model(0.0) - Mat4::identity()).norm() < EPSILON);
        }
    }

    #[test]
    fn full_turn_returns_to_identity() {
        let model = RotationProfile::AboutAxis { axis: Vec3::y() }.model(360.0);
        assert!((model - Mat4::identity()).norm() < 1e-4);
    }

    #[test]
    fn quarter_turn_about_y_maps_x_to_minus_z() {
        let model = RotationProfile::AboutAxis { axis: Vec3::y() }.model(90.0);
        let p = model * nalgebra_glm::vec4(1.0, 0.0, 0.0, 1.0);
        assert!(approx_eq(p.x, 0.0));
        assert!(approx_eq(p.z, -1.0));
    }

    #[test]
    fn unnormalized_axis_matches_normalized_axis() {
        let raw = RotationProfile::AboutAxis {
            axis: nalgebra_glm::vec3(1.0, 1.0, 0.0),
        };
        let unit = RotationProfile::AboutAxis {
            axis: nalgebra_glm::normalize(&nalgebra_glm::vec3(1.0, 1.0, 0.0)),
        };
        assert!((raw.model(42.0) - unit.model(42.0)).norm() < EPSILON);
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = Camera::default();
        let mvp = compute_mvp(&camera, &RotationProfile::default(), 1.0, 123.0);
        let clip = mvp * nalgebra_glm::vec4(0.0, 0.0, 0.0, 1.0);

        assert!(approx_eq(clip.x, 0.0));
        assert!(approx_eq(clip.y, 0.0));
        // Distance from the eye to the origin.
        assert!(approx_eq(clip.w, 10.0));
        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0);
    }

    #[test]
    fn cube_corners_stay_inside_the_frustum() {
        let camera = Camera::default();
        let profile = RotationProfile::default();
        for angle in [0.0, 45.0, 137.0, 300.0] {
            let mvp = compute_mvp(&camera, &profile, 1.0, angle);
            for vertex in crate::mesh::Mesh::cube().vertices {
                let [x, y, z] = vertex.position;
                let clip = mvp * nalgebra_glm::vec4(x, y, z, 1.0);
                let ndc = clip.xyz() / clip.w;
                assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
                assert!((0.0..=1.0).contains(&ndc.z));
            }
        }
    }

    #[test]
    fn composition_is_deterministic() {
        let camera = Camera::default();
        let profile = RotationProfile::Weighted {
            x: 1.0,
            y: 0.5,
            z: 0.1,
        };
        let first = compute_mvp(&camera, &profile, 1.5, 77.7);
        let second = compute_mvp(&camera, &profile, 1.5, 77.7);
        assert_eq!(first, second);
    }
}
