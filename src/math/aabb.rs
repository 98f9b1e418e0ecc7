use glam::{Mat4, Vec3};

/// Axis-aligned bounding box
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box containing nothing; the identity for `union`
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Tightest box around a set of points (empty box for no points)
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points
            .into_iter()
            .fold(Self::empty(), |bounds, p| bounds.including(p))
    }

    pub fn including(&self, point: Vec3) -> AABB {
        AABB {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    pub fn union(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// No point has been included yet
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Encloses zero volume (a point, segment or flat patch)
    pub fn is_degenerate(&self) -> bool {
        !self.is_empty() && self.size().min_element() <= 0.0
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Bounds of this box after an affine transform (all eight corners)
    pub fn transformed(&self, transform: &Mat4) -> AABB {
        if self.is_empty() {
            return *self;
        }

        let corners = (0..8).map(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        });

        Self::from_points(corners.map(|c| transform.transform_point3(c)))
    }
}

impl Default for AABB {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_center() {
        let aabb = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(aabb.center(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_aabb_center_negative() {
        let aabb = AABB::new(Vec3::new(-2.0, -4.0, -6.0), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(aabb.center(), Vec3::ZERO);
    }

    #[test]
    fn test_empty_box() {
        let aabb = AABB::empty();
        assert!(aabb.is_empty());
        assert!(!aabb.is_degenerate());
        assert!(!aabb.center().is_finite());
    }

    #[test]
    fn test_from_points() {
        let aabb = AABB::from_points([
            Vec3::new(-1.0, -2.0, -3.0),
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 0.0, 0.0),
        ]);

        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 3.0));
        assert!(!aabb.is_degenerate());
    }

    #[test]
    fn test_single_point_is_degenerate() {
        let aabb = AABB::from_points([Vec3::new(10.0, 5.0, 5.0)]);
        assert!(!aabb.is_empty());
        assert!(aabb.is_degenerate());
        assert_eq!(aabb.center(), Vec3::new(10.0, 5.0, 5.0));
    }

    #[test]
    fn test_flat_box_is_degenerate() {
        let aabb = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 1.0));
        assert!(aabb.is_degenerate());
    }

    #[test]
    fn test_aabb_union_overlapping() {
        let aabb1 = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let aabb2 = AABB::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        let union = aabb1.union(&aabb2);
        assert_eq!(union.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(union.max, Vec3::new(3.0, 3.0, 3.0));
    }

    #[test]
    fn test_union_with_empty_is_identity() {
        let aabb = AABB::new(Vec3::new(-3.0, -3.0, -3.0), Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.union(&AABB::empty()), aabb);
        assert_eq!(AABB::empty().union(&aabb), aabb);
    }

    #[test]
    fn test_transformed_by_translation() {
        let aabb = AABB::new(Vec3::ZERO, Vec3::ONE);
        let moved = aabb.transformed(&Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(moved.min, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(moved.max, Vec3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn test_transformed_by_rotation_stays_enclosing() {
        let aabb = AABB::new(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(1.0, 1.0, 2.0));
        let rotated = aabb.transformed(&Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2));
        assert!((rotated.size().x - 4.0).abs() < 1e-5);
        assert!((rotated.size().z - 2.0).abs() < 1e-5);
    }
}
