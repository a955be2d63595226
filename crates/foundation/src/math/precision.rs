//! Precision policy.
//!
//! World coordinates stay `f64` on the CPU. Anything handed to an `f32`
//! consumer (instance buffers) is first expressed relative to the view target,
//! so embeddings with large absolute coordinates keep their local detail.

use super::Vec2;

/// GPU-friendly, camera-relative position in `f32`.
pub type CameraRelativeF32 = [f32; 2];

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraRelative {
    pub origin: Vec2,
}

impl CameraRelative {
    pub fn new(origin: Vec2) -> Self {
        Self { origin }
    }

    #[inline]
    pub fn to_f32(self, world: Vec2) -> CameraRelativeF32 {
        let d = world - self.origin;
        [d.x as f32, d.y as f32]
    }
}
