//! Instanced backend: per-layer batches ready for a GPU vertex buffer.
//!
//! Positions are camera-relative `f32` so embeddings with large absolute
//! coordinates keep sub-pixel precision. Each layer becomes its own batch and
//! batches must be drawn in order with depth testing disabled.

use foundation::math::Vec2;
use foundation::math::precision::CameraRelative;
use scene::points::Point;
use scene::viewport::Projection;

use crate::compositor::{LayerContent, LayerRenderer, RenderLayer};
use crate::layer::{DEFAULT_POINT_RADIUS_PX, LayerKind};
use crate::symbology::Palette;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointInstance {
    /// World position minus the view target.
    pub offset: [f32; 2],
    pub radius_px: f32,
    pub stroke_width_px: f32,
    pub fill: [f32; 4],
    pub stroke: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RectInstance {
    pub min: [f32; 2],
    pub max: [f32; 2],
    pub fill: [f32; 4],
    pub stroke: [f32; 4],
    pub stroke_width_px: f32,
    pub _pad: [f32; 3],
}

/// Uniforms shared by every batch of a frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniforms {
    /// Pixels per world unit.
    pub scale: f32,
    pub _pad: f32,
    pub viewport_center: [f32; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceBatch {
    pub kind: LayerKind,
    pub depth_test: bool,
    pub points: Vec<PointInstance>,
    pub rect: Option<RectInstance>,
}

impl InstanceBatch {
    pub fn point_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.points)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.rect.is_none()
    }
}

#[derive(Debug, Default)]
pub struct InstanceBuilder {
    origin: Option<CameraRelative>,
    uniforms: Option<ViewUniforms>,
    batches: Vec<InstanceBatch>,
}

impl InstanceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uniforms(&self) -> Option<ViewUniforms> {
        self.uniforms
    }

    pub fn batches(&self) -> &[InstanceBatch] {
        &self.batches
    }

    pub fn uniform_bytes(&self) -> Vec<u8> {
        self.uniforms
            .map(|u| bytemuck::bytes_of(&u).to_vec())
            .unwrap_or_default()
    }
}

impl LayerRenderer for InstanceBuilder {
    fn begin(&mut self, projection: &Projection) {
        let center = projection.center();
        self.origin = Some(CameraRelative::new(projection.target()));
        self.uniforms = Some(ViewUniforms {
            scale: projection.scale() as f32,
            _pad: 0.0,
            viewport_center: [center.x as f32, center.y as f32],
        });
        self.batches.clear();
    }

    fn draw_layer(&mut self, layer: &RenderLayer, points: &[Point], palette: &Palette) {
        let Some(origin) = self.origin else {
            return;
        };
        let style = layer.style;
        let mut batch = InstanceBatch {
            kind: layer.kind,
            depth_test: style.depth_test,
            points: Vec::new(),
            rect: None,
        };

        match &layer.content {
            LayerContent::Points(indices) => {
                batch.points.reserve(indices.len());
                for &i in indices {
                    let Some(p) = points.get(i) else {
                        continue;
                    };
                    let base = p.radius.map(|r| r as f32).unwrap_or(DEFAULT_POINT_RADIUS_PX);
                    batch.points.push(PointInstance {
                        offset: origin.to_f32(p.position()),
                        radius_px: base + style.radius_delta,
                        stroke_width_px: style.stroke_width,
                        fill: style.fill_override.unwrap_or_else(|| palette.color(p.color)),
                        stroke: style.stroke_color,
                    });
                }
            }
            LayerContent::Rect(bounds) => {
                batch.rect = Some(RectInstance {
                    min: origin.to_f32(Vec2::from(bounds.min)),
                    max: origin.to_f32(Vec2::from(bounds.max)),
                    fill: style.fill_override.unwrap_or([0.0; 4]),
                    stroke: style.stroke_color,
                    stroke_width_px: style.stroke_width,
                    _pad: [0.0; 3],
                });
            }
        }
        self.batches.push(batch);
    }
}

#[cfg(test)]
mod tests {
    use super::{InstanceBuilder, PointInstance, RectInstance, ViewUniforms};
    use crate::compositor::{compose, partition, render};
    use crate::layer::LayerKind;
    use crate::symbology::Palette;
    use foundation::PointId;
    use scene::points::Point;
    use scene::selection::SelectionSet;
    use scene::viewport::{Projection, ViewState, ViewportSize};
    use std::collections::HashSet;

    #[test]
    fn instance_layouts_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<PointInstance>(), 48);
        assert_eq!(std::mem::size_of::<RectInstance>(), 64);
        assert_eq!(std::mem::size_of::<ViewUniforms>(), 16);
    }

    #[test]
    fn large_coordinates_stay_precise_relative_to_target() {
        let far = 1.0e9;
        let pts = vec![Point::new(1, far + 0.25, far - 0.5), Point::new(2, far, far)];
        let view = ViewState {
            target: [far, far, 0.0],
            ..ViewState::default()
        };
        let proj = Projection::new(&view, ViewportSize::default());
        let part = partition(&pts, &SelectionSet::new(), &HashSet::new(), Some(PointId(2)), None);

        let mut builder = InstanceBuilder::new();
        render(&mut builder, &compose(&part, None), &pts, &Palette::default(), &proj);

        let batches = builder.batches();
        assert_eq!(batches.len(), 5);
        assert_eq!(batches[0].kind, LayerKind::Base);
        assert_eq!(batches[0].points[0].offset, [0.25, -0.5]);
        assert_eq!(batches[3].kind, LayerKind::Active);
        assert_eq!(batches[3].points[0].offset, [0.0, 0.0]);
        assert!(batches.iter().all(|b| !b.depth_test));
        assert_eq!(batches[0].point_bytes().len(), 48);
        assert_eq!(builder.uniform_bytes().len(), 16);
    }
}
