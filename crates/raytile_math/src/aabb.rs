use crate::{Interval, Ray, Vec3};

/// Axis-aligned bounding box, defined by one interval per axis.
///
/// Used in object space by the box primitive: a transformed cube is an
/// AABB once the ray is taken into the cube's local frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

/// Boxes thinner than this along an axis are padded so rays still hit them.
const MIN_EXTENT: f32 = 0.0001;

impl Aabb {
    /// Create an AABB centred on the origin with the given full extents.
    pub fn centered(size: Vec3) -> Self {
        let half = size.abs().max(Vec3::splat(MIN_EXTENT)) * 0.5;
        Self {
            x: Interval::new(-half.x, half.x),
            y: Interval::new(-half.y, half.y),
            z: Interval::new(-half.z, half.z),
        }
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Slab test returning the nearest parameter inside `ray_t` and the
    /// outward normal of the face crossed there.
    ///
    /// When the ray starts inside the box the exit face is reported.
    pub fn intersect(&self, r: &Ray, ray_t: Interval) -> Option<(f32, Vec3)> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut enter_normal = Vec3::ZERO;
        let mut exit_normal = Vec3::ZERO;

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let orig = r.origin[axis];
            let dir = r.direction[axis];

            if dir == 0.0 {
                // Parallel to the slab: inside it or never.
                if orig < slab.min || orig > slab.max {
                    return None;
                }
                continue;
            }

            let adinv = 1.0 / dir;
            let mut t0 = (slab.min - orig) * adinv;
            let mut t1 = (slab.max - orig) * adinv;
            let mut n0 = -Vec3::AXES[axis];
            let mut n1 = Vec3::AXES[axis];
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
                std::mem::swap(&mut n0, &mut n1);
            }

            if t0 > t_enter {
                t_enter = t0;
                enter_normal = n0;
            }
            if t1 < t_exit {
                t_exit = t1;
                exit_normal = n1;
            }
            if t_exit <= t_enter {
                return None;
            }
        }

        if ray_t.surrounds(t_enter) {
            Some((t_enter, enter_normal))
        } else if ray_t.surrounds(t_exit) {
            Some((t_exit, exit_normal))
        } else {
            None
        }
    }
}
