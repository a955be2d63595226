use serde::{Deserialize, Serialize};

use crate::symbology::Rgba;

/// Render layers in draw order.
///
/// Ordering contract:
/// - `Ord` follows draw order, so sorting layers by kind yields the painter's
///   order: base, filtered, selected, active, hovered, selection rectangle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    Base,
    Filtered,
    Selected,
    Active,
    Hovered,
    SelectionRect,
}

impl LayerKind {
    pub const DRAW_ORDER: [LayerKind; 6] = [
        LayerKind::Base,
        LayerKind::Filtered,
        LayerKind::Selected,
        LayerKind::Active,
        LayerKind::Hovered,
        LayerKind::SelectionRect,
    ];

    pub fn style(self) -> LayerStyle {
        match self {
            LayerKind::Base => BASE_STYLE,
            LayerKind::Filtered => FILTERED_STYLE,
            LayerKind::Selected => SELECTED_STYLE,
            LayerKind::Active => ACTIVE_STYLE,
            LayerKind::Hovered => HOVERED_STYLE,
            LayerKind::SelectionRect => SELECTION_RECT_STYLE,
        }
    }
}

/// Fixed per-layer drawing parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerStyle {
    /// Added to the point radius, in pixels.
    pub radius_delta: f32,
    pub stroke_width: f32,
    pub stroke_color: Rgba,
    /// Replaces the category color when set.
    pub fill_override: Option<Rgba>,
    /// Always `false`: stacking comes from draw order alone.
    pub depth_test: bool,
}

impl LayerStyle {
    pub const fn new(
        radius_delta: f32,
        stroke_width: f32,
        stroke_color: Rgba,
        fill_override: Option<Rgba>,
    ) -> Self {
        Self {
            radius_delta,
            stroke_width,
            stroke_color,
            fill_override,
            depth_test: false,
        }
    }
}

/// Default point radius in pixels when the record carries none.
pub const DEFAULT_POINT_RADIUS_PX: f32 = 3.0;

const TRANSPARENT: Rgba = [0.0, 0.0, 0.0, 0.0];

pub const BASE_STYLE: LayerStyle = LayerStyle::new(0.0, 0.0, TRANSPARENT, None);
pub const FILTERED_STYLE: LayerStyle = LayerStyle::new(1.0, 1.0, [0.15, 0.15, 0.15, 0.9], None);
pub const SELECTED_STYLE: LayerStyle = LayerStyle::new(1.5, 2.0, [0.1, 0.45, 0.95, 1.0], None);
pub const ACTIVE_STYLE: LayerStyle = LayerStyle::new(3.0, 2.5, [1.0, 0.55, 0.0, 1.0], None);
pub const HOVERED_STYLE: LayerStyle =
    LayerStyle::new(2.0, 1.5, [1.0, 1.0, 1.0, 1.0], Some([1.0, 1.0, 1.0, 0.35]));
pub const SELECTION_RECT_STYLE: LayerStyle =
    LayerStyle::new(0.0, 1.0, [0.1, 0.45, 0.95, 1.0], Some([0.1, 0.45, 0.95, 0.15]));

#[cfg(test)]
mod tests {
    use super::LayerKind;

    #[test]
    fn draw_order_matches_ord() {
        let mut sorted = LayerKind::DRAW_ORDER;
        sorted.sort();
        assert_eq!(sorted, LayerKind::DRAW_ORDER);
        assert_eq!(LayerKind::DRAW_ORDER.last(), Some(&LayerKind::SelectionRect));
    }

    #[test]
    fn no_layer_depth_tests() {
        assert!(LayerKind::DRAW_ORDER.iter().all(|k| !k.style().depth_test));
    }

    #[test]
    fn emphasis_grows_with_precedence() {
        let r = |k: LayerKind| k.style().radius_delta;
        assert!(r(LayerKind::Base) < r(LayerKind::Filtered));
        assert!(r(LayerKind::Filtered) < r(LayerKind::Selected));
        assert!(r(LayerKind::Selected) < r(LayerKind::Active));
    }
}
