//! Primary ray evaluation and recursive mirror shading.
//!
//! A pixel's color is built up in one accumulator: each mirror level
//! recurses first and then adds its own direct light divided by its
//! recursion depth. A level that sees no light at all overwrites the
//! accumulator with the background, including whatever deeper bounces
//! had already added.

use raytile_core::{Color, Scene, SceneResult};
use raytile_math::{Ray, Vec2, Vec3};

use crate::camera::Camera;
use crate::hittable::{Intersection, IntersectionOracle};
use crate::job::ShadingParams;
use crate::lighting::LightRig;

/// Scale a color down so its largest channel is at most 1, keeping hue.
pub fn tone_map(color: Color) -> Color {
    let max = color.max_element();
    if max > 1.0 {
        color / max
    } else {
        color
    }
}

/// Mirror direction of the view ray arriving at `point` from `eye`.
pub fn reflect_view(eye: Vec3, point: Vec3, normal: Vec3) -> Vec3 {
    let to_eye = (eye - point).normalize_or_zero();
    (normal * (2.0 * normal.dot(to_eye)) - to_eye).normalize_or_zero()
}

/// Everything needed to turn a primary ray into a color.
pub struct Shader<'a, O: IntersectionOracle + ?Sized> {
    oracle: &'a O,
    camera: Camera,
    lights: LightRig,
    params: ShadingParams,
}

impl<'a> Shader<'a, Scene> {
    /// Shader for `scene` rendered at `width` x `height`.
    ///
    /// Fails if the scene does not carry enough lights.
    pub fn for_scene(scene: &'a Scene, width: u32, height: u32, params: ShadingParams) -> SceneResult<Self> {
        scene.validate()?;
        let lights = LightRig::new(&scene.lights)?;
        let camera = Camera::for_image(&scene.camera, width, height);
        Ok(Self::new(scene, camera, lights, params))
    }
}

impl<'a, O: IntersectionOracle + ?Sized> Shader<'a, O> {
    pub fn new(oracle: &'a O, camera: Camera, lights: LightRig, params: ShadingParams) -> Self {
        Self {
            oracle,
            camera,
            lights,
            params,
        }
    }

    pub fn params(&self) -> &ShadingParams {
        &self.params
    }

    /// Color seen through `ndc` ([-1, 1]^2, +y up), tone-mapped.
    pub fn evaluate_primary_ray(&self, ndc: Vec2) -> Color {
        let ray = self.camera.ray_from_ndc(ndc);
        let Some(hit) = self.oracle.nearest(&ray) else {
            return self.params.background();
        };

        if !self.params.lit() {
            return hit.material().color;
        }

        let normal = hit.normal();
        let direction = reflect_view(self.camera.position(), hit.point, normal);
        let mut color = Color::ZERO;
        self.shade(&mut color, normal, 1, &hit, hit.point, direction);
        tone_map(color)
    }

    /// Accumulate the light leaving `origin` toward the viewer into `color`.
    ///
    /// `depth` starts at 1 for the primary hit. Mirror bounces are only
    /// followed while `depth <= max_recursion_depth`; direct lighting is
    /// evaluated at every level.
    pub fn shade(
        &self,
        color: &mut Color,
        normal: Vec3,
        depth: u32,
        hit: &Intersection<'_>,
        origin: Vec3,
        direction: Vec3,
    ) {
        let material = hit.material();
        let params = &self.params;

        if material.mirror && params.use_mirrors && params.lit() && depth <= params.max_recursion_depth {
            if let Some(next) = self.oracle.nearest(&Ray::new(origin, direction)) {
                let next_normal = next.normal();
                let next_direction = reflect_view(origin, next.point, next_normal);
                self.shade(color, next_normal, depth + 1, &next, next.point, next_direction);
            }
        }

        match self
            .lights
            .direct(self.oracle, origin, normal, direction, material, params)
        {
            Some(light) => *color += light / depth as f32,
            None => *color = params.background(),
        }
    }
}
