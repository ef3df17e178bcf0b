//! Direct lighting: shadow tests plus diffuse and specular terms.
//!
//! The model reads four lights. Each light is either fully visible or
//! fully shadowed; there are no soft shadows.

use raytile_core::{Color, Light, Material, SceneError, SceneResult, REQUIRED_LIGHTS};
use raytile_math::{Ray, Vec3};

use crate::hittable::IntersectionOracle;
use crate::job::ShadingParams;

/// Wraps the diffuse cosine so faces turned away still get some light.
const DIFFUSE_WRAP: f32 = 0.95;

const SPECULAR_SCALE: f32 = 0.4;
const SPECULAR_GAIN: f32 = 0.39;

/// Per-light tint applied to the specular term, in light order.
pub const SPECULAR_WEIGHTS: [Vec3; REQUIRED_LIGHTS] = [
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(1.0, 0.9, 0.1),
    Vec3::new(1.0, 0.9, 0.1),
    Vec3::new(1.0, 1.0, 1.0),
];

/// Specular tint in single-light mode.
pub const SINGLE_LIGHT_WEIGHT: Vec3 = Vec3::new(1.0, 0.9, 0.1);

/// The part of a light the shading code needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub position: Vec3,
    pub intensity: f32,
}

impl LightSource {
    pub fn new(position: Vec3, intensity: f32) -> Self {
        Self { position, intensity }
    }

    /// Unit vector from `origin` toward the light.
    pub fn direction_from(&self, origin: Vec3) -> Vec3 {
        (self.position - origin).normalize_or_zero()
    }

    /// Inverse-square falloff at `origin`.
    pub fn attenuation(&self, origin: Vec3) -> f32 {
        1.0 / (self.position - origin).length_squared()
    }

    /// True if nothing lies between `origin` and the light, at any distance
    /// along the shadow ray.
    pub fn visible_from<O: IntersectionOracle + ?Sized>(&self, oracle: &O, origin: Vec3) -> bool {
        !oracle.occluded(&Ray::towards(origin, self.position))
    }

    /// Wrapped Lambert term: `1/d^2 * I * (0.95 * N.L + 1) / 2`.
    pub fn diffuse(&self, origin: Vec3, normal: Vec3) -> f32 {
        let cos = normal.dot(self.direction_from(origin));
        self.attenuation(origin) * self.intensity * ((DIFFUSE_WRAP * cos + 1.0) / 2.0)
    }

    /// Phong-like highlight along the reflected view `direction`.
    ///
    /// Zero when the reflected ray points away from the light.
    pub fn specular(&self, origin: Vec3, direction: Vec3, shininess: f32, phong_magnitude: f32) -> f32 {
        let cos = direction.dot(self.direction_from(origin));
        if cos <= 0.0 {
            return 0.0;
        }
        let lobe = cos.powf(shininess);
        let spec = phong_magnitude * (SPECULAR_SCALE * lobe) * SPECULAR_GAIN * ((lobe + 1.0) / 2.0);
        self.attenuation(origin) * self.intensity * spec
    }
}

/// Contribution of one light at one surface point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LightSample {
    pub visible: bool,
    pub diffuse: f32,
    pub specular: f32,
}

/// The four lights used for shading, in scene order.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    lights: [LightSource; REQUIRED_LIGHTS],
}

impl LightRig {
    /// Take the first four lights of a scene.
    pub fn new(lights: &[Light]) -> SceneResult<Self> {
        let sources: Vec<LightSource> = lights
            .iter()
            .take(REQUIRED_LIGHTS)
            .map(|l| LightSource::new(l.position(), l.intensity))
            .collect();

        let lights: [LightSource; REQUIRED_LIGHTS] = sources
            .try_into()
            .map_err(|_| SceneError::InsufficientLights {
                found: lights.len(),
                required: REQUIRED_LIGHTS,
            })?;
        Ok(Self { lights })
    }

    pub fn from_sources(lights: [LightSource; REQUIRED_LIGHTS]) -> Self {
        Self { lights }
    }

    pub fn lights(&self) -> &[LightSource; REQUIRED_LIGHTS] {
        &self.lights
    }

    /// Shadow test and enabled terms for light `index`.
    pub fn sample<O: IntersectionOracle + ?Sized>(
        &self,
        index: usize,
        oracle: &O,
        origin: Vec3,
        normal: Vec3,
        direction: Vec3,
        material: &Material,
        params: &ShadingParams,
    ) -> LightSample {
        let light = &self.lights[index];
        if !light.visible_from(oracle, origin) {
            return LightSample::default();
        }

        LightSample {
            visible: true,
            diffuse: if params.calc_diffuse {
                light.diffuse(origin, normal)
            } else {
                0.0
            },
            specular: if params.calc_phong {
                light.specular(origin, direction, material.shininess, params.phong_magnitude)
            } else {
                0.0
            },
        }
    }

    /// Direct light reaching `origin`, before the recursion-depth weight.
    ///
    /// Returns `None` when every light taken into account is shadowed.
    pub fn direct<O: IntersectionOracle + ?Sized>(
        &self,
        oracle: &O,
        origin: Vec3,
        normal: Vec3,
        direction: Vec3,
        material: &Material,
        params: &ShadingParams,
    ) -> Option<Color> {
        if !params.all_lights {
            let sample = self.sample(0, oracle, origin, normal, direction, material, params);
            if !sample.visible {
                return None;
            }
            return Some(material.color * sample.diffuse + SINGLE_LIGHT_WEIGHT * sample.specular);
        }

        let samples: [LightSample; REQUIRED_LIGHTS] =
            std::array::from_fn(|i| self.sample(i, oracle, origin, normal, direction, material, params));
        if samples.iter().all(|s| !s.visible) {
            return None;
        }

        let diffuse = samples.iter().map(|s| s.diffuse).sum::<f32>() / REQUIRED_LIGHTS as f32;
        let specular = samples
            .iter()
            .zip(SPECULAR_WEIGHTS)
            .fold(Color::ZERO, |acc, (s, weight)| acc + weight * s.specular);

        Some(material.color * diffuse + specular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hittable::Intersection;

    /// Oracle that blocks nothing.
    struct Open;

    impl IntersectionOracle for Open {
        fn intersect(&self, _ray: &Ray) -> Vec<Intersection<'_>> {
            Vec::new()
        }
    }

    /// Oracle that blocks rays going in the +x half space.
    struct WallAtPlusX;

    impl IntersectionOracle for WallAtPlusX {
        fn intersect(&self, _ray: &Ray) -> Vec<Intersection<'_>> {
            Vec::new()
        }

        fn occluded(&self, ray: &Ray) -> bool {
            ray.direction.x > 0.0
        }
    }

    fn rig() -> LightRig {
        LightRig::from_sources([
            LightSource::new(Vec3::new(0.0, 10.0, 0.0), 100.0),
            LightSource::new(Vec3::new(10.0, 0.0, 0.0), 100.0),
            LightSource::new(Vec3::new(-10.0, 0.0, 0.0), 100.0),
            LightSource::new(Vec3::new(0.0, 0.0, 10.0), 100.0),
        ])
    }

    fn params() -> ShadingParams {
        ShadingParams::default()
    }

    #[test]
    fn test_diffuse_formula() {
        let light = LightSource::new(Vec3::new(0.0, 4.0, 0.0), 32.0);
        let d = light.diffuse(Vec3::ZERO, Vec3::Y);
        // 1/16 * 32 * (0.95 + 1) / 2
        assert!((d - 2.0 * 0.975).abs() < 1e-6);

        // Facing away still gets the wrapped remainder.
        let back = light.diffuse(Vec3::ZERO, -Vec3::Y);
        assert!((back - 2.0 * 0.025).abs() < 1e-6);
    }

    #[test]
    fn test_specular_formula() {
        let light = LightSource::new(Vec3::new(0.0, 2.0, 0.0), 4.0);
        let s = light.specular(Vec3::ZERO, Vec3::Y, 10.0, 50.0);
        // attenuation 1/4 * intensity 4 * 50 * 0.4 * 0.39 * 1
        assert!((s - 50.0 * 0.4 * 0.39).abs() < 1e-4);
    }

    #[test]
    fn test_specular_zero_when_facing_away() {
        let light = LightSource::new(Vec3::new(0.0, 2.0, 0.0), 4.0);
        assert_eq!(light.specular(Vec3::ZERO, -Vec3::Y, 3.0, 50.0), 0.0);
        assert_eq!(light.specular(Vec3::ZERO, Vec3::X, 3.0, 50.0), 0.0);
    }

    #[test]
    fn test_zero_length_vectors_do_not_panic() {
        let light = LightSource::new(Vec3::new(0.0, 2.0, 0.0), 1.0);
        let d = light.diffuse(Vec3::ZERO, Vec3::ZERO);
        let s = light.specular(Vec3::ZERO, Vec3::ZERO, 150.0, 50.0);
        assert!((d - 0.125).abs() < 1e-6);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_rig_needs_four_lights() {
        let lights: Vec<Light> = (0..3)
            .map(|i| Light::point(Vec3::splat(i as f32), Color::ONE, 1.0))
            .collect();

        assert_eq!(
            LightRig::new(&lights),
            Err(SceneError::InsufficientLights {
                found: 3,
                required: 4
            })
        );
    }

    #[test]
    fn test_rig_uses_first_four() {
        let lights: Vec<Light> = (0..6)
            .map(|i| Light::point(Vec3::splat(i as f32), Color::ONE, i as f32))
            .collect();

        let rig = LightRig::new(&lights).unwrap();
        assert_eq!(rig.lights()[3].intensity, 3.0);
    }

    #[test]
    fn test_all_lights_averages_diffuse_over_four() {
        let material = Material::new("white", Color::ONE, 10.0);
        let mut params = params();
        params.calc_phong = false;

        let direct = rig()
            .direct(&Open, Vec3::ZERO, Vec3::Y, Vec3::Y, &material, &params)
            .unwrap();

        let expected: f32 = rig().lights().iter().map(|l| l.diffuse(Vec3::ZERO, Vec3::Y)).sum::<f32>() / 4.0;
        assert!((direct - Color::splat(expected)).abs().max_element() < 1e-6);
    }

    #[test]
    fn test_shadowed_light_contributes_nothing() {
        let material = Material::new("white", Color::ONE, 10.0);
        let mut params = params();
        params.calc_phong = false;

        // Light 1 sits at +x and is blocked.
        let direct = rig()
            .direct(&WallAtPlusX, Vec3::ZERO, Vec3::Y, Vec3::Y, &material, &params)
            .unwrap();

        let lights = rig();
        let expected = [0, 2, 3]
            .iter()
            .map(|&i| lights.lights()[i].diffuse(Vec3::ZERO, Vec3::Y))
            .sum::<f32>()
            / 4.0;
        assert!((direct.x - expected).abs() < 1e-6);
    }

    #[test]
    fn test_specular_weights_tint_lights_two_and_three() {
        let material = Material::new("black", Color::ZERO, 1.0);
        let mut params = params();
        params.calc_diffuse = false;

        // Reflected direction toward light 1 (+x): only it contributes.
        let direct = rig()
            .direct(&Open, Vec3::ZERO, Vec3::X, Vec3::X, &material, &params)
            .unwrap();
        let spec = rig().lights()[1].specular(Vec3::ZERO, Vec3::X, 1.0, params.phong_magnitude);

        assert!((direct - Vec3::new(1.0, 0.9, 0.1) * spec).abs().max_element() < 1e-5);
    }

    #[test]
    fn test_single_light_mode_ignores_other_lights() {
        let material = Material::new("white", Color::new(1.0, 0.5, 0.25), 10.0);
        let mut params = params();
        params.all_lights = false;
        params.calc_phong = false;

        let direct = rig()
            .direct(&Open, Vec3::ZERO, Vec3::Y, Vec3::Y, &material, &params)
            .unwrap();
        let d = rig().lights()[0].diffuse(Vec3::ZERO, Vec3::Y);
        assert!((direct - material.color * d).abs().max_element() < 1e-6);
    }

    #[test]
    fn test_single_light_shadowed_is_none() {
        let rig = LightRig::from_sources([
            LightSource::new(Vec3::new(10.0, 0.0, 0.0), 1.0),
            LightSource::new(Vec3::new(-10.0, 0.0, 0.0), 1.0),
            LightSource::new(Vec3::new(-10.0, 0.0, 0.0), 1.0),
            LightSource::new(Vec3::new(-10.0, 0.0, 0.0), 1.0),
        ]);
        let mut params = params();
        params.all_lights = false;
        let material = Material::default();

        assert!(rig
            .direct(&WallAtPlusX, Vec3::ZERO, Vec3::Y, Vec3::Y, &material, &params)
            .is_none());

        params.all_lights = true;
        assert!(rig
            .direct(&WallAtPlusX, Vec3::ZERO, Vec3::Y, Vec3::Y, &material, &params)
            .is_some());
    }
}
