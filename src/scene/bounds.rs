//! Axis-aligned bounds of the loaded model in world space.
use bevy::prelude::*;

/// World-space AABB. Starts inverted (`empty`) so the first extension sets it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for SceneBounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl SceneBounds {
    #[must_use]
    pub fn empty() -> Self {
        Self { min: Vec3::splat(f32::INFINITY), max: Vec3::splat(f32::NEG_INFINITY) }
    }

    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut b = Self::empty();
        for p in points {
            b.extend_point(p);
        }
        b
    }

    pub fn extend_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&mut self, other: &SceneBounds) {
        if other.is_valid() {
            self.extend_point(other.min);
            self.extend_point(other.max);
        }
    }

    /// False until at least one point has been added.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Player spawn: horizontal centre, eye height above the lowest point.
    #[must_use]
    pub fn spawn_point(&self, eye_height: f32) -> Vec3 {
        let c = self.center();
        Vec3::new(c.x, self.min.y + eye_height, c.z)
    }

    /// True if `p` lies within the XZ footprint (inclusive).
    #[must_use]
    pub fn contains_xz(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.z && p.z <= self.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bounds_are_invalid_until_extended() {
        let mut b = SceneBounds::empty();
        assert!(!b.is_valid());
        b.extend_point(Vec3::ONE);
        assert!(b.is_valid());
        assert_eq!(b.size(), Vec3::ZERO);
    }

    #[test]
    fn spawn_point_is_centre_at_eye_height() {
        let b = SceneBounds::from_points([Vec3::new(-10.0, -2.0, 0.0), Vec3::new(30.0, 12.0, 8.0)]);
        assert!(b.spawn_point(1.6).distance(Vec3::new(10.0, -0.4, 4.0)) < 1e-5);
    }

    #[test]
    fn union_ignores_empty() {
        let mut a = SceneBounds::from_points([Vec3::ZERO, Vec3::ONE]);
        a.union(&SceneBounds::empty());
        assert_eq!(a, SceneBounds::from_points([Vec3::ZERO, Vec3::ONE]));
    }
}
