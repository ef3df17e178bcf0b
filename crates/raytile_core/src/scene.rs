//! Scene types for raytile.
//!
//! A scene is a flat list of primitives plus the light rig and camera
//! placement. Everything here is immutable for the duration of a frame;
//! workers share one `Arc<Scene>` read-only.

use std::sync::Arc;

use raytile_math::{Mat3, Mat4, Mat4Ext, Quat, Vec3};
use thiserror::Error;

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Number of lights the lighting model reads.
pub const REQUIRED_LIGHTS: usize = 4;

/// Errors raised when a scene cannot be rendered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("scene has {found} lights, the lighting model needs {required}")]
    InsufficientLights { found: usize, required: usize },
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Convert a `0xRRGGBB` value into a 0-1 color.
pub fn color_from_hex(hex: u32) -> Color {
    Color::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Surface description used by the shading code.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    /// Material name, for logs
    pub name: String,

    /// Base color (RGB, 0-1)
    pub color: Color,

    /// Specular exponent
    pub shininess: f32,

    /// Whether mirror bounces are traced off this surface
    pub mirror: bool,

    /// Reflectivity of mirror surfaces (carried with the material, the
    /// lighting formula does not weight bounces by it)
    pub reflectivity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Color::ONE,
            shininess: 30.0,
            mirror: false,
            reflectivity: 0.0,
        }
    }
}

impl Material {
    /// Create an opaque material from a name, color and shininess.
    pub fn new(name: impl Into<String>, color: Color, shininess: f32) -> Self {
        Self {
            name: name.into(),
            color,
            shininess,
            ..Default::default()
        }
    }

    /// Turn this material into a mirror with the given reflectivity.
    pub fn with_mirror(mut self, reflectivity: f32) -> Self {
        self.mirror = true;
        self.reflectivity = reflectivity;
        self
    }
}

/// Transform components that can be composed into a matrix.
#[derive(Clone, Debug)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Set an XYZ euler rotation (radians).
    pub fn with_euler(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Quat::from_euler(raytile_math::EulerRot::XYZ, x, y, z);
        self
    }

    /// Set a uniform scale.
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// The two primitive kinds the renderer understands, in object space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    /// Sphere centred on the object origin.
    Sphere { radius: f32 },
    /// Box centred on the object origin with the given full extents.
    Cuboid { size: Vec3 },
}

/// A placed primitive with its material.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub name: String,
    pub geometry: Geometry,
    pub material: Arc<Material>,
    world: Mat4,
    inverse: Mat4,
    normal_matrix: Mat3,
}

impl SceneObject {
    /// Place `geometry` in the world with `transform`.
    pub fn new(
        name: impl Into<String>,
        geometry: Geometry,
        transform: &Transform,
        material: Arc<Material>,
    ) -> Self {
        let world = transform.to_matrix();
        Self {
            name: name.into(),
            geometry,
            material,
            world,
            inverse: world.inverse(),
            normal_matrix: world.normal_matrix(),
        }
    }

    /// World-to-object matrix.
    pub fn inverse_matrix(&self) -> Mat4 {
        self.inverse
    }

    /// World-space position of the object origin.
    pub fn position(&self) -> Vec3 {
        self.world.position()
    }

    /// World-space unit normal at `point`.
    ///
    /// `face_normal` is the object-space normal of the face that was hit;
    /// spheres derive their normal from the centre instead.
    pub fn world_normal(&self, point: Vec3, face_normal: Vec3) -> Vec3 {
        match self.geometry {
            Geometry::Sphere { .. } => (point - self.position()).normalize_or_zero(),
            Geometry::Cuboid { .. } => (self.normal_matrix * face_normal).normalize_or_zero(),
        }
    }
}

/// Point lights and spot lights shade identically; the kind is kept for
/// scene descriptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Point,
    Spot,
}

/// A light source. Its position is the translation of its transform.
#[derive(Clone, Debug)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
    pub transform: Mat4,
}

impl Light {
    /// Create a point light at `position`.
    pub fn point(position: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Point,
            color,
            intensity,
            transform: Mat4::from_translation(position),
        }
    }

    /// Create a spot light at `position`.
    pub fn spot(position: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Spot,
            ..Self::point(position, color, intensity)
        }
    }

    /// World-space position.
    pub fn position(&self) -> Vec3 {
        self.transform.position()
    }
}

/// Perspective camera placement.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraRig {
    pub position: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub vfov: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 600.0),
            look_at: Vec3::new(0.0, 0.0, 599.0),
            up: Vec3::Y,
            vfov: 60.0,
        }
    }
}

/// A complete scene: primitives, lights and camera.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub name: String,
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
    pub camera: CameraRig,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Check the scene can be shaded.
    ///
    /// The lighting model reads exactly [`REQUIRED_LIGHTS`] lights. Fewer
    /// is an error; extra lights are ignored with a warning.
    pub fn validate(&self) -> SceneResult<()> {
        let found = self.lights.len();
        if found < REQUIRED_LIGHTS {
            return Err(SceneError::InsufficientLights {
                found,
                required: REQUIRED_LIGHTS,
            });
        }
        if found > REQUIRED_LIGHTS {
            log::warn!(
                "Scene '{}' has {} lights, only the first {} are used",
                self.name,
                found,
                REQUIRED_LIGHTS
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_at(x: f32) -> Light {
        Light::point(Vec3::new(x, 0.0, 0.0), Color::ONE, 1.0)
    }

    #[test]
    fn test_validate_rejects_three_lights() {
        let mut scene = Scene::new("dim");
        for i in 0..3 {
            scene.add_light(light_at(i as f32));
        }

        assert_eq!(
            scene.validate(),
            Err(SceneError::InsufficientLights {
                found: 3,
                required: 4
            })
        );
    }

    #[test]
    fn test_validate_accepts_four_or_more() {
        let mut scene = Scene::new("lit");
        for i in 0..4 {
            scene.add_light(light_at(i as f32));
        }
        assert!(scene.validate().is_ok());

        scene.add_light(light_at(9.0));
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(color_from_hex(0xff0000), Color::new(1.0, 0.0, 0.0));
        assert_eq!(color_from_hex(0x00ff00), Color::new(0.0, 1.0, 0.0));
        assert!((color_from_hex(0x808080).x - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_normal_points_away_from_center() {
        let sphere = SceneObject::new(
            "ball",
            Geometry::Sphere { radius: 1.0 },
            &Transform::from_translation(Vec3::new(0.0, 5.0, 0.0)),
            Arc::new(Material::default()),
        );

        let n = sphere.world_normal(Vec3::new(0.0, 6.0, 0.0), Vec3::ZERO);
        assert!((n - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_cuboid_normal_follows_rotation() {
        let cube = SceneObject::new(
            "crate",
            Geometry::Cuboid { size: Vec3::ONE },
            &Transform::default().with_euler(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            Arc::new(Material::default()),
        );

        // +X face rotated a quarter turn about Y ends up facing -Z.
        let n = cube.world_normal(Vec3::ZERO, Vec3::X);
        assert!((n - -Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_light_position_from_transform() {
        let light = Light::spot(Vec3::new(280.0, 250.0, 2.0), Color::ONE, 10.0);
        assert_eq!(light.kind, LightKind::Spot);
        assert_eq!(light.position(), Vec3::new(280.0, 250.0, 2.0));
    }

    #[test]
    fn test_transform_matrix_srt_order() {
        let transform = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)).with_uniform_scale(2.0);
        let p = transform.to_matrix().transform_point3(Vec3::X);
        assert_eq!(p, Vec3::new(3.0, 2.0, 3.0));
    }
}
