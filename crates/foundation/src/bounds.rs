use crate::math::Vec2;

/// Axis-aligned bounding box in 2-D world space.
///
/// An empty box has `min > max` on both axes; extending it with the first point
/// collapses it onto that point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn empty() -> Self {
        Aabb2 {
            min: [f64::INFINITY; 2],
            max: [f64::NEG_INFINITY; 2],
        }
    }

    /// Box spanned by two arbitrary corners.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Aabb2 {
            min: [a.x.min(b.x), a.y.min(b.y)],
            max: [a.x.max(b.x), a.y.max(b.y)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    pub fn extend(&mut self, p: Vec2) {
        self.min[0] = self.min[0].min(p.x);
        self.min[1] = self.min[1].min(p.y);
        self.max[0] = self.max[0].max(p.x);
        self.max[1] = self.max[1].max(p.y);
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    /// Midpoint, halved before summing so extreme finite bounds stay finite.
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.min[0] * 0.5 + self.max[0] * 0.5,
            self.min[1] * 0.5 + self.max[1] * 0.5,
        )
    }

    /// Inclusive containment on both axes.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min[0] && p.x <= self.max[0] && p.y >= self.min[1] && p.y <= self.max[1]
    }

    /// Grows any axis with zero extent by `margin` on each side.
    pub fn pad_degenerate(mut self, margin: f64) -> Self {
        for axis in 0..2 {
            if self.max[axis] - self.min[axis] <= 0.0 {
                self.min[axis] -= margin;
                self.max[axis] += margin;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;
    use crate::math::Vec2;

    #[test]
    fn extend_from_empty() {
        let mut b = Aabb2::empty();
        assert!(b.is_empty());
        b.extend(Vec2::new(1.0, 2.0));
        assert!(!b.is_empty());
        b.extend(Vec2::new(-1.0, 4.0));
        assert_eq!(b, Aabb2::new([-1.0, 2.0], [1.0, 4.0]));
        assert_eq!(b.center(), Vec2::new(0.0, 3.0));
    }

    #[test]
    fn contains_is_inclusive() {
        let b = Aabb2::from_corners(Vec2::new(2.0, 2.0), Vec2::new(-1.0, -1.0));
        assert!(b.contains(Vec2::new(-1.0, -1.0)));
        assert!(b.contains(Vec2::new(2.0, 0.5)));
        assert!(!b.contains(Vec2::new(2.0001, 0.5)));
    }

    #[test]
    fn center_of_extreme_bounds_is_finite() {
        let b = Aabb2::new([1e308, -1.7e308], [1.7e308, 1.7e308]);
        let c = b.center();
        assert!(c.x.is_finite() && c.y.is_finite());
        assert!((c.x / 1.35e308 - 1.0).abs() < 1e-12);
        assert_eq!(c.y, 0.0);
    }

    #[test]
    fn pads_only_degenerate_axes() {
        let b = Aabb2::new([3.0, 0.0], [3.0, 10.0]).pad_degenerate(1.0);
        assert_eq!(b, Aabb2::new([2.0, 0.0], [4.0, 10.0]));
    }
}
