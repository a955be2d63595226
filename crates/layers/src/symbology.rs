//! Record to point mapping and categorical coloring.
//!
//! Everything here is pure: re-running the mapper after a class-field change
//! needs no network access and yields the same colors for the same categories,
//! whatever subset of the dataset is loaded.

use scene::points::{ColorSlot, Point, RawPoint};
use scene::settings::ScatterSettings;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Linear RGBA, each channel in `[0, 1]`.
pub type Rgba = [f32; 4];

pub const DEFAULT_POINT_COLOR: Rgba = [0.62, 0.62, 0.66, 1.0];

/// Ten well-separated categorical colors.
pub const CATEGORY10: [Rgba; 10] = [
    [0.122, 0.467, 0.706, 1.0],
    [1.000, 0.498, 0.055, 1.0],
    [0.173, 0.627, 0.173, 1.0],
    [0.839, 0.153, 0.157, 1.0],
    [0.580, 0.404, 0.741, 1.0],
    [0.549, 0.337, 0.294, 1.0],
    [0.890, 0.467, 0.761, 1.0],
    [0.498, 0.498, 0.498, 1.0],
    [0.737, 0.741, 0.133, 1.0],
    [0.090, 0.745, 0.812, 1.0],
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<Rgba>,
    default: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(CATEGORY10.to_vec(), DEFAULT_POINT_COLOR)
    }
}

impl Palette {
    /// Palettes longer than `u16::MAX` entries are truncated.
    pub fn new(mut colors: Vec<Rgba>, default: Rgba) -> Self {
        colors.truncate(u16::MAX as usize);
        Self { colors, default }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Slot for a category; no category (or an empty palette) maps to the default slot.
    pub fn slot_for(&self, category: Option<&str>) -> ColorSlot {
        match category {
            Some(c) if !self.colors.is_empty() => {
                ColorSlot::Category(palette_index(c, self.colors.len()) as u16)
            }
            _ => ColorSlot::Default,
        }
    }

    pub fn color(&self, slot: ColorSlot) -> Rgba {
        match slot {
            ColorSlot::Default => self.default,
            ColorSlot::Category(i) => self.colors.get(i as usize).copied().unwrap_or(self.default),
        }
    }
}

/// Polynomial string hash over UTF-16 code units.
///
/// `h = h * 31 + unit` with 32-bit wrapping arithmetic, then the magnitude.
/// Matches the hash web clients compute for the same category text, so a
/// category keeps its color across clients.
pub fn category_hash(s: &str) -> u32 {
    let mut h: i32 = 0;
    for unit in s.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(unit as i32);
    }
    h.unsigned_abs()
}

/// `len` must be non-zero.
pub fn palette_index(category: &str, len: usize) -> usize {
    category_hash(category) as usize % len
}

/// Maps raw records to renderable points.
///
/// Records without finite numeric coordinates are dropped; the caller keeps
/// the raw records, so a later mapping with different settings can bring
/// them back.
pub fn map_points<'a, I>(raw: I, settings: &ScatterSettings, palette: &Palette) -> Vec<Point>
where
    I: IntoIterator<Item = &'a RawPoint>,
{
    let mut dropped = 0usize;
    let out: Vec<Point> = raw
        .into_iter()
        .filter_map(|r| {
            let mapped = Point::from_raw(r, settings);
            if mapped.is_none() {
                dropped += 1;
            }
            mapped
        })
        .map(|mut p| {
            p.color = palette.slot_for(p.class_value.as_deref());
            p
        })
        .collect();
    if dropped > 0 {
        debug!(dropped, kept = out.len(), "records without finite coordinates skipped");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{Palette, category_hash, map_points, palette_index};
    use pretty_assertions::assert_eq;
    use scene::points::{ColorSlot, RawPoint};
    use scene::settings::ScatterSettings;
    use serde_json::json;

    #[test]
    fn hash_is_polynomial_over_utf16() {
        assert_eq!(category_hash(""), 0);
        assert_eq!(category_hash("a"), 97);
        assert_eq!(category_hash("ab"), 97 * 31 + 98);
        assert_eq!(category_hash("cat"), 98262);
        // Astral characters hash as their two surrogate units.
        assert_eq!(category_hash("😀"), 0xD83D * 31 + 0xDE00);
    }

    #[test]
    fn hash_wraps_and_takes_magnitude() {
        let long = "the quick brown fox jumps over the lazy dog";
        let h = category_hash(long);
        assert_eq!(h, category_hash(long));
        // A string long enough to overflow still lands inside the palette.
        assert!(palette_index(long, 10) < 10);
    }

    #[test]
    fn drops_non_finite_or_missing_coordinates() {
        let raw = vec![
            RawPoint::new(1, 1.0, 2.0),
            RawPoint::new(2, json!("abc"), 0.0),
            RawPoint::new(3, json!(null), 0.0),
            RawPoint::new(4, 0.0, json!({"v": 1})),
            RawPoint::new(5, -3.5, 0.0),
        ];
        let pts = map_points(&raw, &ScatterSettings::default(), &Palette::default());
        let ids: Vec<u64> = pts.iter().map(|p| p.id.get()).collect();
        assert_eq!(ids, vec![1, 5]);
    }

    #[test]
    fn colors_are_stable_across_subsets() {
        let settings = ScatterSettings::default();
        let palette = Palette::default();
        let raw: Vec<RawPoint> = ["cat", "dog", "bird", "cat"]
            .iter()
            .enumerate()
            .map(|(i, c)| RawPoint::new(i as u64, i as f64, 0.0).with_field("class", *c))
            .collect();

        let all = map_points(&raw, &settings, &palette);
        let subset = map_points(raw.iter().skip(2), &settings, &palette);

        assert_eq!(all[0].color, all[3].color);
        assert_eq!(all[2].color, subset[0].color);
        assert_eq!(all[3].color, subset[1].color);
        assert_eq!(all[0].color, ColorSlot::Category((98262 % 10) as u16));
    }

    #[test]
    fn missing_category_uses_default_slot() {
        let raw = vec![
            RawPoint::new(1, 0.0, 0.0),
            RawPoint::new(2, 0.0, 0.0).with_field("class", json!(null)),
            RawPoint::new(3, 0.0, 0.0).with_field("class", ""),
        ];
        let pts = map_points(&raw, &ScatterSettings::default(), &Palette::default());
        assert_eq!(pts[0].color, ColorSlot::Default);
        assert_eq!(pts[1].color, ColorSlot::Default);
        // An empty string is a category of its own, not "no category".
        assert_eq!(pts[2].color, ColorSlot::Category(0));
    }

    #[test]
    fn class_field_change_remaps_without_refetch() {
        let raw = vec![
            RawPoint::new(1, 0.0, 0.0)
                .with_field("class", "a")
                .with_field("sentiment", "positive"),
        ];
        let palette = Palette::default();
        let by_class = map_points(&raw, &ScatterSettings::default(), &palette);
        let by_sentiment = map_points(
            &raw,
            &ScatterSettings::default().with_class_field("sentiment"),
            &palette,
        );
        assert_eq!(by_class[0].class_value.as_deref(), Some("a"));
        assert_eq!(by_sentiment[0].class_value.as_deref(), Some("positive"));
        assert_eq!(by_sentiment[0].color, palette.slot_for(Some("positive")));
    }

    #[test]
    fn empty_palette_falls_back_to_default() {
        let palette = Palette::new(Vec::new(), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(palette.slot_for(Some("x")), ColorSlot::Default);

        let raw = vec![RawPoint::new(1, 0.0, 0.0).with_field("class", "x")];
        let pts = map_points(&raw, &ScatterSettings::default(), &palette);
        assert_eq!(pts[0].color, ColorSlot::Default);
        assert_eq!(palette.color(pts[0].color), [0.0, 0.0, 0.0, 1.0]);
    }
}
