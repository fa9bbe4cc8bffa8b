//! Ray casting against scene nodes
//!
//! Rays are tested in each node's local space, so rotated and scaled shapes
//! are handled without special cases. The local-space direction is left
//! unnormalized, which keeps the hit parameter `t` equal to the world-space
//! distance along the (normalized) world ray.

use vrview_math::{mat4, Mat4, Vec3};

use crate::graph::{NodeKey, SceneGraph, Shape};

/// A half-line with a normalized direction
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray; `direction` is normalized
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalized(),
        }
    }

    /// Ray from a world matrix: origin at its translation, pointing down its local -Z
    pub fn from_world_matrix(world: Mat4) -> Self {
        let rotation = mat4::extract_rotation(world);
        Self::new(
            mat4::get_position(world),
            mat4::transform_direction(rotation, Vec3::FORWARD),
        )
    }

    /// Point at parameter `t`
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A ray hit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// The node that was hit
    pub node: NodeKey,
    /// World-space distance from the ray origin
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
}

/// Ray intersection queries against a set of nodes
#[derive(Clone, Copy, Debug)]
pub struct Raycaster {
    /// Hits closer than this are ignored
    pub near: f32,
    /// Hits farther than this are ignored
    pub far: f32,
}

impl Default for Raycaster {
    fn default() -> Self {
        Self {
            near: 0.0,
            far: f32::INFINITY,
        }
    }
}

impl Raycaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intersect `ray` with `objects`, nearest hit first
    ///
    /// Only the listed nodes are tested, not their descendants. Missing keys
    /// and nodes without a solid shape are skipped.
    pub fn intersect_objects(
        &self,
        graph: &SceneGraph,
        ray: &Ray,
        objects: &[NodeKey],
    ) -> Vec<Intersection> {
        let mut hits: Vec<Intersection> = objects
            .iter()
            .filter_map(|&key| self.intersect_object(graph, ray, key))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Intersect `ray` with a single node
    pub fn intersect_object(&self, graph: &SceneGraph, ray: &Ray, key: NodeKey) -> Option<Intersection> {
        let node = graph.get(key)?;
        let shape = node.shape.as_ref()?;

        let inverse = mat4::inverse(graph.world_matrix(key))?;
        let local_origin = mat4::transform_point(inverse, ray.origin);
        let local_dir = mat4::transform_direction(inverse, ray.direction);

        let t = match shape {
            Shape::Sphere { radius } => intersect_sphere(local_origin, local_dir, *radius),
            Shape::Cuboid { half_extents } => intersect_box(local_origin, local_dir, *half_extents),
            Shape::Line { .. } => None,
        }?;

        if t < self.near || t > self.far {
            return None;
        }

        Some(Intersection {
            node: key,
            distance: t,
            point: ray.at(t),
        })
    }
}

/// Smallest non-negative `t` where `origin + t * dir` hits the sphere
fn intersect_sphere(origin: Vec3, dir: Vec3, radius: f32) -> Option<f32> {
    let a = dir.dot(dir);
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * origin.dot(dir);
    let c = origin.dot(origin) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t0 = (-b - sqrt_d) / (2.0 * a);
    let t1 = (-b + sqrt_d) / (2.0 * a);

    if t0 >= 0.0 {
        Some(t0)
    } else if t1 >= 0.0 {
        // origin inside the sphere
        Some(t1)
    } else {
        None
    }
}

/// Slab test against a box centred on the origin
fn intersect_box(origin: Vec3, dir: Vec3, half: Vec3) -> Option<f32> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for (o, d, h) in [
        (origin.x, dir.x, half.x),
        (origin.y, dir.y, half.y),
        (origin.z, dir.z, half.z),
    ] {
        if d.abs() < f32::EPSILON {
            if o < -h || o > h {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (t0, t1) = {
            let a = (-h - o) * inv;
            let b = (h - o) * inv;
            if a < b { (a, b) } else { (b, a) }
        };
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }

    if t_max < 0.0 {
        None
    } else if t_min >= 0.0 {
        Some(t_min)
    } else {
        Some(t_max)
    }
}
