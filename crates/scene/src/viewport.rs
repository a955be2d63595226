//! Orthographic 2-D camera for the scatter view.
//!
//! `zoom` is log2 of pixels per world unit, so zoom 0 maps one unit to one
//! pixel and every +1 doubles the scale. Screen space has its origin at the
//! top-left corner and both axes grow in the same direction as world space.

use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::points::Point;

pub const MIN_ZOOM_ALLOWED: f64 = -20.0;
pub const MAX_ZOOM_ALLOWED: f64 = 20.0;
/// World units added on each side of an axis with zero extent.
pub const DEGENERATE_AXIS_PAD: f64 = 1.0;
/// Fraction of the viewport left empty around the fitted data.
pub const FIT_MARGIN: f64 = 0.1;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub target: [f64; 3],
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            target: [0.0, 0.0, 0.0],
            zoom: 0.0,
            min_zoom: MIN_ZOOM_ALLOWED,
            max_zoom: MAX_ZOOM_ALLOWED,
        }
    }
}

impl ViewState {
    pub fn target_2d(&self) -> Vec2 {
        Vec2::new(self.target[0], self.target[1])
    }

    pub fn scale(&self) -> f64 {
        self.zoom.exp2()
    }

    fn clamp_zoom(&self, zoom: f64) -> f64 {
        let lo = self.min_zoom.max(MIN_ZOOM_ALLOWED);
        let hi = self.max_zoom.min(MAX_ZOOM_ALLOWED).max(lo);
        if zoom.is_finite() { zoom.clamp(lo, hi) } else { lo }
    }
}

/// World/screen conversion for one view state and viewport.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    target: Vec2,
    scale: f64,
    center: Vec2,
}

impl Projection {
    pub fn new(view: &ViewState, size: ViewportSize) -> Self {
        Self {
            target: view.target_2d(),
            scale: view.scale(),
            center: size.center(),
        }
    }

    /// Pixels per world unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// World position drawn at the viewport center.
    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Viewport center in screen pixels.
    pub fn center(&self) -> Vec2 {
        self.center
    }

    #[inline]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.target) * self.scale + self.center
    }

    #[inline]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.center) / self.scale + self.target
    }
}

/// Fits every point into `size`.
///
/// An empty slice yields the default view. Axes with zero extent are padded by
/// [`DEGENERATE_AXIS_PAD`] and the zoom is clamped to the allowed range.
pub fn compute_initial_view(points: &[Point], size: ViewportSize) -> ViewState {
    let mut bounds = Aabb2::empty();
    for p in points {
        bounds.extend(p.position());
    }
    if bounds.is_empty() {
        return ViewState::default();
    }
    fit_bounds(bounds, size)
}

pub fn fit_bounds(bounds: Aabb2, size: ViewportSize) -> ViewState {
    let bounds = bounds.pad_degenerate(DEGENERATE_AXIS_PAD);
    let center = bounds.center();
    let size = if size.is_usable() { size } else { ViewportSize::default() };

    let usable = 1.0 - FIT_MARGIN;
    let sx = size.width * usable / bounds.width();
    let sy = size.height * usable / bounds.height();
    let view = ViewState::default();
    let zoom = view.clamp_zoom(sx.min(sy).log2());

    ViewState {
        target: [center.x, center.y, 0.0],
        zoom,
        ..view
    }
}

/// Owns the view state across data loads and user navigation.
///
/// The initial fit runs once when the dataset first becomes non-empty; later
/// page arrivals leave the camera alone. An empty dataset resets the
/// controller so the next data fits again.
#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    size: ViewportSize,
    view: Option<ViewState>,
}

impl ViewportController {
    pub fn new(size: ViewportSize) -> Self {
        Self { size, view: None }
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    pub fn view(&self) -> Option<&ViewState> {
        self.view.as_ref()
    }

    pub fn projection(&self) -> Option<Projection> {
        self.view.as_ref().map(|v| Projection::new(v, self.size))
    }

    /// Feeds the current point set. Returns `true` when the view was (re)fitted.
    pub fn observe(&mut self, points: &[Point]) -> bool {
        if points.is_empty() {
            if self.view.take().is_some() {
                debug!("viewport reset: dataset empty");
            }
            return false;
        }
        if self.view.is_some() {
            return false;
        }
        let view = compute_initial_view(points, self.size);
        debug!(
            zoom = view.zoom,
            target_x = view.target[0],
            target_y = view.target[1],
            "viewport fitted"
        );
        self.view = Some(view);
        true
    }

    pub fn resize(&mut self, size: ViewportSize) {
        if size.is_usable() {
            self.size = size;
        }
    }

    /// Replaces the view from an external source (e.g. the renderer's controller).
    ///
    /// Non-finite targets are rejected; zoom is clamped.
    pub fn set_view_state(&mut self, view: ViewState) -> bool {
        if !view.target.iter().all(|c| c.is_finite()) {
            return false;
        }
        let zoom = view.clamp_zoom(view.zoom);
        self.view = Some(ViewState { zoom, ..view });
        true
    }

    /// Moves the camera so content follows a pointer drag of `(dx, dy)` pixels.
    pub fn pan_by_pixels(&mut self, dx: f64, dy: f64) -> bool {
        let Some(view) = self.view.as_mut() else {
            return false;
        };
        let scale = view.scale();
        view.target[0] -= dx / scale;
        view.target[1] -= dy / scale;
        true
    }

    /// Zooms by `delta` levels keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Vec2, delta: f64) -> bool {
        let size = self.size;
        let Some(view) = self.view.as_mut() else {
            return false;
        };
        let before = Projection::new(view, size);
        let anchored_world = before.screen_to_world(anchor);

        let zoom = view.clamp_zoom(view.zoom + delta);
        if zoom == view.zoom {
            return false;
        }
        view.zoom = zoom;
        let target = anchored_world - (anchor - size.center()) / view.scale();
        view.target[0] = target.x;
        view.target[1] = target.y;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{
        MAX_ZOOM_ALLOWED, MIN_ZOOM_ALLOWED, Projection, ViewState, ViewportController,
        ViewportSize, compute_initial_view,
    };
    use crate::points::Point;
    use foundation::math::Vec2;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn fits_square_bounds_around_center() {
        let pts = vec![Point::new(1, 0.0, 0.0), Point::new(2, 10.0, 10.0)];
        let view = compute_initial_view(&pts, ViewportSize::default());
        assert_eq!(view.target, [5.0, 5.0, 0.0]);
        assert!(view.zoom >= MIN_ZOOM_ALLOWED && view.zoom <= MAX_ZOOM_ALLOWED);
        // 600px * 0.9 / 10 units limits the scale.
        assert!(approx(view.scale(), 54.0));
    }

    #[test]
    fn single_point_gets_padded_not_infinite_zoom() {
        let pts = vec![Point::new(1, 3.0, -2.0)];
        let view = compute_initial_view(&pts, ViewportSize::default());
        assert_eq!(view.target, [3.0, -2.0, 0.0]);
        assert!(view.zoom.is_finite());
        assert!(approx(view.scale(), 270.0));
    }

    #[test]
    fn huge_and_tiny_extents_are_clamped() {
        let tiny = vec![Point::new(1, 0.0, 0.0), Point::new(2, 1e-12, 1e-12)];
        assert_eq!(compute_initial_view(&tiny, ViewportSize::default()).zoom, MAX_ZOOM_ALLOWED);
        let huge = vec![Point::new(1, -1e300, -1e300), Point::new(2, 1e300, 1e300)];
        assert_eq!(compute_initial_view(&huge, ViewportSize::default()).zoom, MIN_ZOOM_ALLOWED);
    }

    #[test]
    fn same_sign_extreme_bounds_keep_a_finite_target() {
        let pts = vec![Point::new(1, 1e308, 1e308), Point::new(2, 1.7e308, 1.7e308)];
        let view = compute_initial_view(&pts, ViewportSize::default());
        assert!(view.target.iter().all(|c| c.is_finite()));
        assert_eq!(view.zoom, MIN_ZOOM_ALLOWED);

        let proj = Projection::new(&view, ViewportSize::default());
        let screen = proj.world_to_screen(Vec2::new(1.35e308, 1.35e308));
        assert!(screen.x.is_finite() && screen.y.is_finite());
    }

    #[test]
    fn controller_fits_once_and_resets_on_empty() {
        let mut c = ViewportController::new(ViewportSize::default());
        assert!(!c.observe(&[]));
        assert!(c.observe(&[Point::new(1, 0.0, 0.0), Point::new(2, 10.0, 10.0)]));
        let first = *c.view().unwrap();

        // Next page arrives: camera must stay put.
        assert!(!c.observe(&[Point::new(1, 0.0, 0.0), Point::new(3, 100.0, 100.0)]));
        assert_eq!(*c.view().unwrap(), first);

        assert!(!c.observe(&[]));
        assert!(c.view().is_none());
        assert!(c.observe(&[Point::new(4, 50.0, 50.0)]));
        assert_eq!(c.view().unwrap().target, [50.0, 50.0, 0.0]);
    }

    #[test]
    fn projection_round_trips_viewport_center() {
        let view = ViewState {
            target: [5.0, 5.0, 0.0],
            zoom: 1.0,
            ..ViewState::default()
        };
        let proj = Projection::new(&view, ViewportSize::new(100.0, 50.0));
        assert_eq!(proj.world_to_screen(Vec2::new(5.0, 5.0)), Vec2::new(50.0, 25.0));
        assert_eq!(proj.world_to_screen(Vec2::new(6.0, 5.0)), Vec2::new(52.0, 25.0));
        assert_eq!(proj.screen_to_world(Vec2::new(52.0, 25.0)), Vec2::new(6.0, 5.0));
    }

    #[test]
    fn pan_moves_target_against_drag() {
        let mut c = ViewportController::new(ViewportSize::new(100.0, 100.0));
        c.set_view_state(ViewState {
            zoom: 1.0,
            ..ViewState::default()
        });
        assert!(c.pan_by_pixels(10.0, -4.0));
        assert_eq!(c.view().unwrap().target, [-5.0, 2.0, 0.0]);
    }

    #[test]
    fn zoom_keeps_anchor_fixed_and_clamps() {
        let mut c = ViewportController::new(ViewportSize::new(100.0, 100.0));
        c.set_view_state(ViewState::default());
        let anchor = Vec2::new(80.0, 20.0);
        let world_before = c.projection().unwrap().screen_to_world(anchor);

        assert!(c.zoom_at(anchor, 2.0));
        let world_after = c.projection().unwrap().screen_to_world(anchor);
        assert!(approx(world_before.x, world_after.x));
        assert!(approx(world_before.y, world_after.y));

        c.zoom_at(anchor, 1000.0);
        assert_eq!(c.view().unwrap().zoom, MAX_ZOOM_ALLOWED);
        assert!(!c.zoom_at(anchor, 1.0));
    }

    #[test]
    fn set_view_state_rejects_non_finite_target() {
        let mut c = ViewportController::default();
        assert!(!c.set_view_state(ViewState {
            target: [f64::NAN, 0.0, 0.0],
            ..ViewState::default()
        }));
        assert!(c.set_view_state(ViewState {
            zoom: f64::INFINITY,
            ..ViewState::default()
        }));
        assert_eq!(c.view().unwrap().zoom, MIN_ZOOM_ALLOWED);
    }
}
