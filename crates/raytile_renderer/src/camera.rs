//! Camera for primary ray generation.

use raytile_core::CameraRig;
use raytile_math::{Ray, Vec2, Vec3};

/// Pinhole perspective camera that turns NDC positions into rays.
#[derive(Debug, Clone)]
pub struct Camera {
    center: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    half_height: f32,
    half_width: f32,
}

impl Camera {
    /// Build a camera from its placement and the output aspect ratio
    /// (width / height).
    pub fn new(rig: &CameraRig, aspect: f32) -> Self {
        let half_height = (rig.vfov.to_radians() / 2.0).tan();
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };

        // Calculate camera basis vectors
        let w = (rig.position - rig.look_at).normalize_or_zero();
        let u = rig.up.cross(w).normalize_or_zero();
        let v = w.cross(u);

        Self {
            center: rig.position,
            u,
            v,
            w,
            half_height,
            half_width: half_height * aspect,
        }
    }

    /// Camera for an image of `width` x `height` pixels.
    pub fn for_image(rig: &CameraRig, width: u32, height: u32) -> Self {
        Self::new(rig, width as f32 / height.max(1) as f32)
    }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        self.center
    }

    /// Ray through `ndc` in [-1, 1]^2, with +y pointing up.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let direction = self.u * (ndc.x * self.half_width) + self.v * (ndc.y * self.half_height) - self.w;
        Ray::new(self.center, direction)
    }
}
