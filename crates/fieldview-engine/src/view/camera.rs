use glam::{Mat4, Vec3};

use crate::options::Options;

/// Smallest near plane distance, as a fraction of the far plane.
const MIN_NEAR_RATIO: f32 = 1e-3;
/// Widest vertical field of view after portrait widening, in radians.
const MAX_FOVY: f32 = 179.0 * std::f32::consts::PI / 180.0;

/// Camera transforms for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraMatrices {
    pub model_view: Mat4,
    pub projection: Mat4,
}

impl CameraMatrices {
    /// Resolves the camera options for a framebuffer of the given aspect
    /// ratio (width / height).
    pub fn from_options(options: &Options, aspect_ratio: f32) -> Self {
        let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 { aspect_ratio } else { 1.0 };

        let eye = options.camera_position();
        let target = options.center_position();
        let model_view = look_at(eye, target, options.up_vector());

        let (min, max) = options.bounding_box();
        let center = (min + max) * 0.5;
        let radius = ((max - min).length() * 0.5).max(f32::EPSILON);
        let distance = eye.distance(center);

        let fov = options.vertical_field_of_view();
        let projection = if fov > 0.0 {
            let far = (distance + radius).max(radius);
            let near = (distance - radius).max(far * MIN_NEAR_RATIO);
            Mat4::perspective_rh(vertical_fov(fov.to_radians(), aspect), aspect, near, far)
        } else {
            // The visible box keeps the bounding sphere on screen.
            let (half_w, half_h) = if aspect >= 1.0 {
                (radius * aspect, radius)
            } else {
                (radius, radius / aspect)
            };
            let near = distance - radius * 1.01;
            let far = distance + radius * 1.01;
            Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, near, far)
        };

        Self {
            model_view,
            projection,
        }
    }

    /// Light position in view space for a light placed at `world`.
    #[inline]
    pub fn light_position(&self, world: Vec3) -> Vec3 {
        self.model_view.transform_point3(world)
    }
}

/// Widens `fovy` for portrait framebuffers so the horizontal extent matches
/// what a square framebuffer would show.
fn vertical_fov(fovy: f32, aspect: f32) -> f32 {
    if aspect >= 1.0 {
        return fovy;
    }
    (2.0 * ((fovy * 0.5).tan() / aspect).atan()).min(MAX_FOVY)
}

/// `look_at_rh` with fallbacks for degenerate input.
fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let forward = target - eye;
    if forward.length_squared() <= f32::EPSILON {
        return Mat4::from_translation(-eye);
    }
    let up = if forward.cross(up).length_squared() <= f32::EPSILON {
        // up is parallel to the view direction
        if forward.cross(Vec3::Y).length_squared() > f32::EPSILON { Vec3::Y } else { Vec3::Z }
    } else {
        up
    };
    Mat4::look_at_rh(eye, target, up)
}
