//! Canvas-style 2-D backend.
//!
//! Records immediate-mode draw calls in screen pixels; a host replays them onto
//! whatever 2-D surface it owns. Useful on its own for snapshot tests.

use foundation::PointId;
use foundation::math::Vec2;
use scene::points::Point;
use scene::viewport::Projection;

use crate::compositor::{LayerContent, LayerRenderer, RenderLayer};
use crate::layer::{DEFAULT_POINT_RADIUS_PX, LayerKind};
use crate::symbology::{Palette, Rgba};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear,
    Circle {
        layer: LayerKind,
        id: PointId,
        center: Vec2,
        radius: f32,
        fill: Rgba,
        stroke: Option<(Rgba, f32)>,
    },
    Rect {
        min: Vec2,
        max: Vec2,
        fill: Option<Rgba>,
        stroke: (Rgba, f32),
    },
}

#[derive(Debug, Default)]
pub struct RecordingCanvas {
    projection: Option<Projection>,
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl LayerRenderer for RecordingCanvas {
    fn begin(&mut self, projection: &Projection) {
        self.projection = Some(*projection);
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn draw_layer(&mut self, layer: &RenderLayer, points: &[Point], palette: &Palette) {
        let Some(proj) = self.projection else {
            return;
        };
        let style = layer.style;
        let stroke = (style.stroke_width > 0.0).then_some((style.stroke_color, style.stroke_width));

        match &layer.content {
            LayerContent::Points(indices) => {
                for &i in indices {
                    let Some(p) = points.get(i) else {
                        continue;
                    };
                    let base = p.radius.map(|r| r as f32).unwrap_or(DEFAULT_POINT_RADIUS_PX);
                    self.commands.push(DrawCommand::Circle {
                        layer: layer.kind,
                        id: p.id,
                        center: proj.world_to_screen(p.position()),
                        radius: base + style.radius_delta,
                        fill: style.fill_override.unwrap_or_else(|| palette.color(p.color)),
                        stroke,
                    });
                }
            }
            LayerContent::Rect(bounds) => {
                let a = proj.world_to_screen(Vec2::from(bounds.min));
                let b = proj.world_to_screen(Vec2::from(bounds.max));
                self.commands.push(DrawCommand::Rect {
                    min: Vec2::new(a.x.min(b.x), a.y.min(b.y)),
                    max: Vec2::new(a.x.max(b.x), a.y.max(b.y)),
                    fill: style.fill_override,
                    stroke: (style.stroke_color, style.stroke_width.max(1.0)),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DrawCommand, RecordingCanvas};
    use crate::compositor::{compose, partition, render};
    use crate::layer::LayerKind;
    use crate::symbology::Palette;
    use foundation::PointId;
    use foundation::math::Vec2;
    use scene::points::Point;
    use scene::selection::{SelectionRectangle, SelectionSet};
    use scene::viewport::{Projection, ViewState, ViewportSize};
    use std::collections::HashSet;

    fn circles(cmds: &[DrawCommand]) -> Vec<(LayerKind, u64)> {
        cmds.iter()
            .filter_map(|c| match c {
                DrawCommand::Circle { layer, id, .. } => Some((*layer, id.get())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn active_point_is_painted_last() {
        let pts: Vec<Point> = (0..4).map(|i| Point::new(i, 0.0, 0.0)).collect();
        let selection: SelectionSet = [PointId(0), PointId(1)].into_iter().collect();
        let part = partition(&pts, &selection, &HashSet::new(), Some(PointId(0)), Some(PointId(3)));
        let proj = Projection::new(&ViewState::default(), ViewportSize::new(100.0, 100.0));

        let mut canvas = RecordingCanvas::new();
        render(&mut canvas, &compose(&part, None), &pts, &Palette::default(), &proj);

        assert_eq!(canvas.commands()[0], DrawCommand::Clear);
        assert_eq!(
            circles(canvas.commands()),
            vec![
                (LayerKind::Base, 2),
                (LayerKind::Base, 3),
                (LayerKind::Selected, 1),
                (LayerKind::Active, 0),
                (LayerKind::Hovered, 3),
            ]
        );
    }

    #[test]
    fn rectangle_is_drawn_in_screen_space_on_top() {
        let pts = vec![Point::new(1, 0.0, 0.0)];
        let part = partition(&pts, &SelectionSet::new(), &HashSet::new(), None, None);
        let proj = Projection::new(&ViewState::default(), ViewportSize::new(100.0, 100.0));
        let mut rect = SelectionRectangle::new(Vec2::new(10.0, 10.0));
        rect.current = Vec2::new(-10.0, 0.0);

        let mut canvas = RecordingCanvas::new();
        render(&mut canvas, &compose(&part, Some(&rect)), &pts, &Palette::default(), &proj);

        match canvas.commands().last() {
            Some(DrawCommand::Rect { min, max, .. }) => {
                assert_eq!(*min, Vec2::new(40.0, 50.0));
                assert_eq!(*max, Vec2::new(60.0, 60.0));
            }
            other => panic!("expected rect last, got {other:?}"),
        }
    }
}
