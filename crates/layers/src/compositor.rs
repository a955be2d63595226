//! Bucketing points into render layers.
//!
//! Stacking is decided entirely here: every point lands in exactly one of the
//! base/filtered/selected/active buckets, and layers are emitted in a fixed
//! order so a painter's-algorithm backend gets the right result with depth
//! testing off.

use std::collections::HashSet;

use foundation::PointId;
use foundation::bounds::Aabb2;
use scene::points::Point;
use scene::selection::{SelectionRectangle, SelectionSet};
use scene::viewport::Projection;

use crate::layer::{LayerKind, LayerStyle};
use crate::symbology::Palette;

/// Indices into the point slice, grouped by render bucket.
///
/// Invariants:
/// - `base`, `filtered`, `selected` and `active` are pairwise disjoint and
///   together cover every index exactly once.
/// - `hovered` holds at most one index and may repeat one from another bucket.
/// - Within a bucket, indices ascend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub base: Vec<usize>,
    pub filtered: Vec<usize>,
    pub selected: Vec<usize>,
    pub active: Vec<usize>,
    pub hovered: Vec<usize>,
}

impl Partition {
    pub fn bucket(&self, kind: LayerKind) -> &[usize] {
        match kind {
            LayerKind::Base => &self.base,
            LayerKind::Filtered => &self.filtered,
            LayerKind::Selected => &self.selected,
            LayerKind::Active => &self.active,
            LayerKind::Hovered => &self.hovered,
            LayerKind::SelectionRect => &[],
        }
    }
}

/// Buckets `points` by precedence: active > selected > filtered > base.
///
/// Ids that are not in `points` contribute nothing.
pub fn partition(
    points: &[Point],
    selection: &SelectionSet,
    filtered: &HashSet<PointId>,
    active: Option<PointId>,
    hovered: Option<PointId>,
) -> Partition {
    let mut out = Partition {
        base: Vec::with_capacity(points.len()),
        ..Partition::default()
    };

    for (i, p) in points.iter().enumerate() {
        if active == Some(p.id) {
            out.active.push(i);
        } else if selection.contains(p.id) {
            out.selected.push(i);
        } else if filtered.contains(&p.id) {
            out.filtered.push(i);
        } else {
            out.base.push(i);
        }
    }

    if let Some(h) = hovered
        && let Some(i) = points.iter().position(|p| p.id == h)
    {
        out.hovered.push(i);
    }

    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerContent {
    Points(Vec<usize>),
    /// World-space rectangle.
    Rect(Aabb2),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderLayer {
    pub kind: LayerKind,
    pub style: LayerStyle,
    pub content: LayerContent,
}

/// Orders a partition into drawable layers.
///
/// All five point layers are always present (possibly empty) so consumers can
/// rely on positions; the rectangle layer is appended only while a drag is live.
pub fn compose(partition: &Partition, rect: Option<&SelectionRectangle>) -> Vec<RenderLayer> {
    let mut layers: Vec<RenderLayer> = LayerKind::DRAW_ORDER
        .iter()
        .copied()
        .filter(|k| *k != LayerKind::SelectionRect)
        .map(|kind| RenderLayer {
            kind,
            style: kind.style(),
            content: LayerContent::Points(partition.bucket(kind).to_vec()),
        })
        .collect();

    if let Some(rect) = rect {
        layers.push(RenderLayer {
            kind: LayerKind::SelectionRect,
            style: LayerKind::SelectionRect.style(),
            content: LayerContent::Rect(rect.bounds()),
        });
    }
    layers
}

/// Backend seam: canvas-style and instanced renderers both consume layers in order.
pub trait LayerRenderer {
    fn begin(&mut self, projection: &Projection);
    fn draw_layer(&mut self, layer: &RenderLayer, points: &[Point], palette: &Palette);
    fn finish(&mut self) {}
}

/// Feeds `layers` to `renderer` in the order given.
pub fn render<R: LayerRenderer + ?Sized>(
    renderer: &mut R,
    layers: &[RenderLayer],
    points: &[Point],
    palette: &Palette,
    projection: &Projection,
) {
    renderer.begin(projection);
    for layer in layers {
        renderer.draw_layer(layer, points, palette);
    }
    renderer.finish();
}
