//! Collidable registry and ray queries.
//!
//! Model meshes are tested triangle by triangle behind an AABB broadphase;
//! target spheres are tested analytically at their current scene position.

use glam::Vec3;
use househunt_common::{Aabb, EntityId, Ray};
use std::collections::BTreeMap;

use crate::model::ModelMesh;
use crate::scene::Scene;

const EPSILON: f32 = 1e-7;

/// World-space triangles of one model mesh plus their bounds.
#[derive(Debug, Clone)]
pub struct CollisionMesh {
    triangles: Vec<[Vec3; 3]>,
    bounds: Aabb,
    double_sided: bool,
}

impl CollisionMesh {
    /// `None` when the mesh has no usable triangles.
    pub fn from_model_mesh(mesh: &ModelMesh) -> Option<Self> {
        let triangles: Vec<[Vec3; 3]> = mesh.triangles().collect();
        let bounds = Aabb::from_points(triangles.iter().flatten().copied())?;
        Some(Self {
            triangles,
            bounds,
            double_sided: mesh.double_sided,
        })
    }

    pub fn triangles(&self) -> &[[Vec3; 3]] {
        &self.triangles
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Whether back faces block rays too.
    pub fn double_sided(&self) -> bool {
        self.double_sided
    }

    /// Nearest hit distance along `ray`, if any lies within `max_distance`.
    pub fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<f32> {
        match ray_aabb(ray, &self.bounds) {
            Some(entry) if entry <= max_distance => {}
            _ => return None,
        }
        self.triangles
            .iter()
            .filter_map(|tri| ray_triangle(ray, tri, self.double_sided))
            .filter(|t| *t <= max_distance)
            .min_by(f32::total_cmp)
    }
}

/// Shape registered for a collidable node.
#[derive(Debug, Clone)]
pub enum Collider {
    Mesh(CollisionMesh),
    /// Sphere centered on the node's scene position.
    Sphere { radius: f32 },
}

/// Nearest intersection returned by a ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: EntityId,
    pub distance: f32,
}

/// Every node that blocks camera movement.
#[derive(Debug, Clone, Default)]
pub struct CollisionRegistry {
    colliders: BTreeMap<EntityId, Collider>,
}

impl CollisionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collider. Re-registering an id replaces its shape, so a
    /// node is never present twice.
    pub fn insert(&mut self, id: EntityId, collider: Collider) {
        self.colliders.insert(id, collider);
    }

    pub fn remove(&mut self, id: EntityId) -> bool {
        self.colliders.remove(&id).is_some()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.colliders.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn clear(&mut self) {
        self.colliders.clear();
    }

    /// Nearest collider hit by `ray` within `max_distance` (inclusive).
    /// Spheres whose node has left the scene are ignored.
    pub fn raycast(&self, scene: &Scene, ray: &Ray, max_distance: f32) -> Option<RayHit> {
        self.colliders
            .iter()
            .filter_map(|(id, collider)| {
                let distance = match collider {
                    Collider::Mesh(mesh) => mesh.raycast(ray, max_distance)?,
                    Collider::Sphere { radius } => {
                        let center = scene.position(*id)?;
                        ray_sphere(ray, center, *radius).filter(|t| *t <= max_distance)?
                    }
                };
                Some(RayHit {
                    entity: *id,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

/// Möller-Trumbore ray/triangle test. Front faces wind counter-clockwise;
/// back faces only count when `double_sided` is set.
pub fn ray_triangle(ray: &Ray, [a, b, c]: &[Vec3; 3], double_sided: bool) -> Option<f32> {
    let e1 = *b - *a;
    let e2 = *c - *a;
    let p = ray.direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPSILON || (!double_sided && det < 0.0) {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - *a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

/// Distance to the outside of a sphere. A ray starting inside the sphere
/// does not hit it, so the player can always walk out of a target.
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let c = oc.length_squared() - radius * radius;
    if c < 0.0 {
        return None;
    }
    let b = oc.dot(ray.direction);
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

/// Slab test. Returns the entry distance, or zero when the origin is inside.
pub fn ray_aabb(ray: &Ray, bounds: &Aabb) -> Option<f32> {
    let dir = ray.direction;
    let inv = |d: f32| if d.abs() > 1e-6 { 1.0 / d } else { f32::MAX };
    let inv_dir = Vec3::new(inv(dir.x), inv(dir.y), inv(dir.z));

    let t1 = (bounds.min - ray.origin) * inv_dir;
    let t2 = (bounds.max - ray.origin) * inv_dir;
    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 || tmin > tmax {
        return None;
    }
    Some(tmin.max(0.0))
}
