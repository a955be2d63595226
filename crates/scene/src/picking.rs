use foundation::PointId;
use foundation::math::Vec2;

use crate::points::Point;
use crate::viewport::Projection;

/// Default pick radius in CSS pixels.
pub const DEFAULT_HIT_RADIUS_PX: f64 = 6.0;

/// Screen-space point picking.
///
/// Ordering contract:
/// - Returns the first point, in slice order, whose projected position lies
///   within `radius_px` of `pointer`. Overlapping candidates are not ranked.
///
/// Distances are measured in screen pixels so the radius means the same thing
/// at every zoom level. Runs on every pointer move and does not allocate.
pub fn hit_test(
    pointer: Vec2,
    points: &[Point],
    projection: &Projection,
    radius_px: f64,
) -> Option<PointId> {
    hit_test_index(pointer, points, projection, radius_px).map(|i| points[i].id)
}

/// Same as [`hit_test`] but returns the slice index of the hit.
pub fn hit_test_index(
    pointer: Vec2,
    points: &[Point],
    projection: &Projection,
    radius_px: f64,
) -> Option<usize> {
    if !pointer.is_finite() || !(radius_px >= 0.0) {
        return None;
    }
    let r2 = radius_px * radius_px;

    // Cull in world space first; the projection is uniform so a world-space
    // square of half-size radius/scale bounds every candidate.
    let world = projection.screen_to_world(pointer);
    let reach = radius_px / projection.scale();

    points.iter().position(|p| {
        if (p.x - world.x).abs() > reach || (p.y - world.y).abs() > reach {
            return false;
        }
        projection.world_to_screen(p.position()).distance_sq(pointer) <= r2
    })
}

#[cfg(test)]
mod tests {
    use super::hit_test;
    use crate::points::Point;
    use crate::viewport::{Projection, ViewState, ViewportSize};
    use foundation::PointId;
    use foundation::math::Vec2;

    fn projection(zoom: f64) -> Projection {
        let view = ViewState {
            zoom,
            ..ViewState::default()
        };
        Projection::new(&view, ViewportSize::new(100.0, 100.0))
    }

    #[test]
    fn hits_within_screen_radius() {
        let pts = vec![Point::new(1, 0.0, 0.0), Point::new(2, 10.0, 0.0)];
        let proj = projection(0.0);
        // World (10, 0) sits at screen (60, 50).
        assert_eq!(hit_test(Vec2::new(63.0, 54.0), &pts, &proj, 5.0), Some(PointId(2)));
        assert_eq!(hit_test(Vec2::new(63.0, 55.0), &pts, &proj, 5.0), None);
    }

    #[test]
    fn radius_is_resolution_independent() {
        let pts = vec![Point::new(1, 1.0, 0.0)];
        // At zoom 3 one world unit is 8px: a 5px radius no longer reaches from center.
        assert_eq!(hit_test(Vec2::new(50.0, 50.0), &pts, &projection(0.0), 5.0), Some(PointId(1)));
        assert_eq!(hit_test(Vec2::new(50.0, 50.0), &pts, &projection(3.0), 5.0), None);
    }

    #[test]
    fn first_match_wins_on_overlap() {
        let pts = vec![
            Point::new(7, 0.5, 0.0),
            Point::new(3, 0.0, 0.0),
        ];
        assert_eq!(hit_test(Vec2::new(50.0, 50.0), &pts, &projection(0.0), 4.0), Some(PointId(7)));
    }

    #[test]
    fn empty_or_invalid_input_misses() {
        let proj = projection(0.0);
        assert_eq!(hit_test(Vec2::new(50.0, 50.0), &[], &proj, 4.0), None);
        let pts = vec![Point::new(1, 0.0, 0.0)];
        assert_eq!(hit_test(Vec2::new(f64::NAN, 50.0), &pts, &proj, 4.0), None);
        assert_eq!(hit_test(Vec2::new(50.0, 50.0), &pts, &proj, -1.0), None);
    }
}
