//! Intersection oracle: ray queries against the scene.
//!
//! The shading code only talks to [`IntersectionOracle`], so tests can
//! swap in scripted oracles. [`Scene`] implements it for the two
//! primitive kinds by moving the ray into each object's local frame.

use raytile_core::{Geometry, Material, Scene, SceneObject};
use raytile_math::{Aabb, Interval, Ray, Vec3};

/// Rays start this far along their direction before they can hit
/// anything, so surfaces do not shadow or reflect themselves.
pub const RAY_EPSILON: f32 = 0.01;

/// A ray-object intersection.
#[derive(Debug, Clone, Copy)]
pub struct Intersection<'a> {
    /// World-space hit point
    pub point: Vec3,
    /// Distance along the ray
    pub distance: f32,
    /// Object-space normal of the face that was hit (boxes only)
    pub face_normal: Vec3,
    /// The object that was hit
    pub object: &'a SceneObject,
}

impl<'a> Intersection<'a> {
    /// World-space unit normal at the hit point.
    pub fn normal(&self) -> Vec3 {
        self.object.world_normal(self.point, self.face_normal)
    }

    pub fn material(&self) -> &'a Material {
        let object: &'a SceneObject = self.object;
        &object.material
    }
}

/// Anything that can answer ray queries.
pub trait IntersectionOracle: Send + Sync {
    /// All intersections along `ray`, nearest first.
    fn intersect(&self, ray: &Ray) -> Vec<Intersection<'_>>;

    /// The nearest intersection along `ray`.
    fn nearest(&self, ray: &Ray) -> Option<Intersection<'_>> {
        self.intersect(ray).into_iter().next()
    }

    /// True if `ray` hits anything at any distance.
    fn occluded(&self, ray: &Ray) -> bool {
        self.nearest(ray).is_some()
    }
}

/// Intersect a single object, returning (distance, object-space face normal).
pub fn hit_object(object: &SceneObject, ray: &Ray, ray_t: Interval) -> Option<(f32, Vec3)> {
    // Keep the local direction unnormalized so t is the world distance.
    let inverse = object.inverse_matrix();
    let local = Ray {
        origin: inverse.transform_point3(ray.origin),
        direction: inverse.transform_vector3(ray.direction),
    };

    match object.geometry {
        Geometry::Sphere { radius } => hit_sphere(radius, &local, ray_t).map(|t| (t, Vec3::ZERO)),
        Geometry::Cuboid { size } => Aabb::centered(size).intersect(&local, ray_t),
    }
}

/// Quadratic sphere test against a sphere at the origin.
fn hit_sphere(radius: f32, ray: &Ray, ray_t: Interval) -> Option<f32> {
    let oc = -ray.origin;
    let a = ray.direction.length_squared();
    if a == 0.0 {
        return None;
    }
    let h = ray.direction.dot(oc);
    let c = oc.length_squared() - radius * radius;

    let discriminant = h * h - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrtd = discriminant.sqrt();

    // Find the nearest root in the acceptable range
    let mut root = (h - sqrtd) / a;
    if !ray_t.surrounds(root) {
        root = (h + sqrtd) / a;
        if !ray_t.surrounds(root) {
            return None;
        }
    }
    Some(root)
}

fn ray_range() -> Interval {
    Interval::new(RAY_EPSILON, f32::INFINITY)
}

impl IntersectionOracle for Scene {
    fn intersect(&self, ray: &Ray) -> Vec<Intersection<'_>> {
        let mut hits: Vec<Intersection<'_>> = self
            .objects
            .iter()
            .filter_map(|object| {
                hit_object(object, ray, ray_range()).map(|(t, face_normal)| Intersection {
                    point: ray.at(t),
                    distance: t,
                    face_normal,
                    object,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits
    }

    fn nearest(&self, ray: &Ray) -> Option<Intersection<'_>> {
        let mut closest: Option<Intersection<'_>> = None;
        let mut closest_so_far = f32::INFINITY;

        for object in &self.objects {
            let interval = Interval::new(RAY_EPSILON, closest_so_far);
            if let Some((t, face_normal)) = hit_object(object, ray, interval) {
                closest_so_far = t;
                closest = Some(Intersection {
                    point: ray.at(t),
                    distance: t,
                    face_normal,
                    object,
                });
            }
        }

        closest
    }

    fn occluded(&self, ray: &Ray) -> bool {
        self.objects
            .iter()
            .any(|object| hit_object(object, ray, ray_range()).is_some())
    }
}
