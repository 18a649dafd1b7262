//! Ray casts against baked world-space triangle soups.
//!
//! Each loaded mesh is baked once into world-space triangles with its AABB.
//! Casts test the AABB first (slab method) and only then walk the triangles.

use bevy::prelude::*;

use super::bounds::SceneBounds;

const EPSILON: f32 = 1e-7;

/// Result of a ground query: where the ray hit and how far it travelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    pub point: Vec3,
    pub distance: f32,
}

/// Anything that can answer "what is below this point".
///
/// The player controller only sees this trait so it can be stepped against
/// hand-built floors in tests and benches.
pub trait GroundQuery {
    /// Nearest surface straight below `origin` within `max_distance`.
    fn cast_down(&self, origin: Vec3, max_distance: f32) -> Option<GroundHit>;

    /// Whether any ground surface is registered at all.
    fn has_ground(&self) -> bool;
}

/// Slab-method ray–AABB intersection, returns Some(t) or None
#[must_use]
pub fn ray_aabb_hit_t(ray_origin: Vec3, ray_direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = Vec3::new(
        if ray_direction.x != 0.0 { 1.0 / ray_direction.x } else { f32::INFINITY },
        if ray_direction.y != 0.0 { 1.0 / ray_direction.y } else { f32::INFINITY },
        if ray_direction.z != 0.0 { 1.0 / ray_direction.z } else { f32::INFINITY },
    );

    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;
    for axis in 0..3 {
        let (o, i) = (ray_origin[axis], inv[axis]);
        if i.is_infinite() {
            // Parallel to this slab: inside or never.
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let (mut t0, mut t1) = ((min[axis] - o) * i, (max[axis] - o) * i);
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        tmin = tmin.max(t0);
        tmax = tmax.min(t1);
        if tmin > tmax {
            return None;
        }
    }

    if tmax < 0.0 {
        return None;
    }
    Some(if tmin >= 0.0 { tmin } else { tmax })
}

/// Möller–Trumbore ray–triangle intersection, two-sided.
#[must_use]
pub fn ray_triangle_hit_t(origin: Vec3, dir: Vec3, tri: &[Vec3; 3]) -> Option<f32> {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - tri[0];
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

/// One mesh baked into world space.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    pub entity: Entity,
    pub triangles: Vec<[Vec3; 3]>,
    pub bounds: SceneBounds,
}

impl SurfaceMesh {
    #[must_use]
    pub fn new(entity: Entity, triangles: Vec<[Vec3; 3]>) -> Self {
        let bounds = SceneBounds::from_points(triangles.iter().flatten().copied());
        Self { entity, triangles, bounds }
    }

    /// Closest hit distance along `dir` (unit length) up to `max_distance`.
    #[must_use]
    pub fn cast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<f32> {
        if !self.bounds.is_valid() {
            return None;
        }
        let entry = ray_aabb_hit_t(origin, dir, self.bounds.min, self.bounds.max)?;
        if entry > max_distance {
            return None;
        }
        self.triangles
            .iter()
            .filter_map(|tri| ray_triangle_hit_t(origin, dir, tri))
            .filter(|t| *t <= max_distance)
            .min_by(f32::total_cmp)
    }
}

/// Every mesh the player can stand on.
#[derive(Resource, Default, Debug)]
pub struct GroundSet {
    surfaces: Vec<SurfaceMesh>,
}

impl GroundSet {
    pub fn insert(&mut self, surface: SurfaceMesh) {
        self.surfaces.push(surface);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn clear(&mut self) {
        self.surfaces.clear();
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.surfaces.iter().map(|s| s.triangles.len()).sum()
    }

    /// Combined bounds of all surfaces (invalid when empty).
    #[must_use]
    pub fn bounds(&self) -> SceneBounds {
        let mut b = SceneBounds::empty();
        for s in &self.surfaces {
            b.union(&s.bounds);
        }
        b
    }

    /// Closest hit over all surfaces. `dir` need not be normalized.
    #[must_use]
    pub fn cast_ray(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<GroundHit> {
        let dir = dir.try_normalize()?;
        if !origin.is_finite() {
            return None;
        }
        self.surfaces
            .iter()
            .filter_map(|s| s.cast(origin, dir, max_distance))
            .min_by(f32::total_cmp)
            .map(|distance| GroundHit { point: origin + dir * distance, distance })
    }
}

impl GroundQuery for GroundSet {
    fn cast_down(&self, origin: Vec3, max_distance: f32) -> Option<GroundHit> {
        self.cast_ray(origin, Vec3::NEG_Y, max_distance)
    }

    fn has_ground(&self) -> bool {
        !self.is_empty()
    }
}

/// Two triangles spanning `[min_x, max_x] x [min_z, max_z]` at height `y`.
#[must_use]
pub fn floor_quad(min_x: f32, max_x: f32, min_z: f32, max_z: f32, y: f32) -> Vec<[Vec3; 3]> {
    let a = Vec3::new(min_x, y, min_z);
    let b = Vec3::new(max_x, y, min_z);
    let c = Vec3::new(max_x, y, max_z);
    let d = Vec3::new(min_x, y, max_z);
    vec![[a, b, c], [a, c, d]]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor_at(y: f32) -> GroundSet {
        let mut g = GroundSet::default();
        g.insert(SurfaceMesh::new(Entity::PLACEHOLDER, floor_quad(-5.0, 5.0, -5.0, 5.0, y)));
        g
    }

    #[test]
    fn aabb_hit_from_above() {
        let t = ray_aabb_hit_t(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(t, Some(4.0));
    }

    #[test]
    fn aabb_miss_when_outside_parallel_slab() {
        let t = ray_aabb_hit_t(Vec3::new(3.0, 5.0, 0.0), Vec3::NEG_Y, Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(t, None);
    }

    #[test]
    fn triangle_hit_is_two_sided() {
        let tri = [Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0)];
        assert!(ray_triangle_hit_t(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Y, &tri).is_some());
        assert!(ray_triangle_hit_t(Vec3::new(0.0, -2.0, 0.0), Vec3::Y, &tri).is_some());
        assert!(ray_triangle_hit_t(Vec3::new(0.0, 2.0, 0.0), Vec3::Y, &tri).is_none());
    }

    #[test]
    fn cast_down_finds_nearest_floor() {
        let mut g = floor_at(0.0);
        g.insert(SurfaceMesh::new(Entity::PLACEHOLDER, floor_quad(-1.0, 1.0, -1.0, 1.0, 1.0)));
        let hit = g.cast_down(Vec3::new(0.0, 3.0, 0.0), 10.0).unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert!((hit.point.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cast_down_respects_max_distance() {
        let g = floor_at(0.0);
        assert!(g.cast_down(Vec3::new(0.0, 3.0, 0.0), 2.5).is_none());
        assert!(g.cast_down(Vec3::new(9.0, 3.0, 0.0), 10.0).is_none());
    }

    #[test]
    fn empty_set_has_no_ground() {
        let g = GroundSet::default();
        assert!(!g.has_ground());
        assert!(g.cast_down(Vec3::ZERO, 100.0).is_none());
        assert!(!g.bounds().is_valid());
    }

    #[test]
    fn non_finite_origin_misses() {
        let g = floor_at(0.0);
        assert!(g.cast_down(Vec3::new(f32::NAN, 1.0, 0.0), 10.0).is_none());
    }
}
