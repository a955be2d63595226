use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDateTime};
use foundation::PointId;
use foundation::math::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::settings::ScatterSettings;

/// A task record exactly as the backend returned it.
///
/// Coordinates are kept as raw JSON values: a record with a non-numeric `x`
/// or `y` stays in the dataset and is only skipped when mapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub id: PointId,
    #[serde(default)]
    pub x: Value,
    #[serde(default)]
    pub y: Value,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl RawPoint {
    pub fn new(id: u64, x: impl Into<Value>, y: impl Into<Value>) -> Self {
        Self {
            id: PointId(id),
            x: x.into(),
            y: y.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }
}

/// Palette slot assigned by the color mapper.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorSlot {
    /// Points without a category.
    #[default]
    Default,
    Category(u16),
}

/// A renderable point: finite coordinates plus resolved attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub x: f64,
    pub y: f64,
    pub class_value: Option<String>,
    pub radius: Option<f64>,
    pub label: Option<String>,
    pub timestamp: Option<f64>,
    pub color: ColorSlot,
}

impl Point {
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id: PointId(id),
            x,
            y,
            class_value: None,
            radius: None,
            label: None,
            timestamp: None,
            color: ColorSlot::Default,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Resolves a raw record against `settings`.
    ///
    /// Returns `None` when either coordinate is missing, non-numeric or not
    /// finite. The color slot is left at `Default`; the mapper assigns it.
    pub fn from_raw(raw: &RawPoint, settings: &ScatterSettings) -> Option<Self> {
        let x = finite_number(&raw.x)?;
        let y = finite_number(&raw.y)?;

        let class_value = raw.field(&settings.class_field).and_then(category_text);
        let radius = lookup(raw, settings.radius_field.as_deref(), "r")
            .and_then(finite_number)
            .filter(|r| *r > 0.0);
        let label = lookup(raw, settings.text_field.as_deref(), "text").and_then(category_text);
        let timestamp =
            lookup(raw, settings.time_field.as_deref(), "time").and_then(timestamp_seconds);

        Some(Self {
            id: raw.id,
            x,
            y,
            class_value,
            radius,
            label,
            timestamp,
            color: ColorSlot::Default,
        })
    }
}

fn lookup<'a>(raw: &'a RawPoint, key: Option<&str>, alias: &str) -> Option<&'a Value> {
    key.and_then(|k| raw.field(k)).or_else(|| raw.field(alias))
}

fn finite_number(v: &Value) -> Option<f64> {
    v.as_f64().filter(|n| n.is_finite())
}

/// Seconds since the Unix epoch.
///
/// Accepts numbers, numeric strings and date-time strings as the backend
/// renders database columns such as `created_at` (RFC 3339, or ISO 8601
/// without an offset, read as UTC).
pub fn timestamp_seconds(v: &Value) -> Option<f64> {
    let Value::String(s) = v else {
        return finite_number(v);
    };
    let s = s.trim();
    if let Ok(n) = s.parse::<f64>() {
        return Some(n).filter(|n| n.is_finite());
    }
    let utc = match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => dt.to_utc(),
        Err(_) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()?
            .and_utc(),
    };
    Some(utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_micros()) / 1e6)
}

/// Text form of a category value.
///
/// Strings are used verbatim, scalars use their JSON text, `null` means no
/// category, and containers fall back to compact JSON.
pub fn category_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// The mapped, renderable point set with an id index.
///
/// Duplicate ids keep their first occurrence in the index; every occurrence is
/// still rendered.
#[derive(Debug, Clone, Default)]
pub struct PointSet {
    points: Vec<Point>,
    index: HashMap<PointId, usize>,
}

impl PointSet {
    pub fn new(points: Vec<Point>) -> Self {
        let mut index = HashMap::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            index.entry(p.id).or_insert(i);
        }
        Self { points, index }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: PointId) -> Option<&Point> {
        self.index.get(&id).map(|&i| &self.points[i])
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> + '_ {
        self.points.iter()
    }

    /// Appends points, indexing only ids not seen before.
    pub fn extend(&mut self, points: impl IntoIterator<Item = Point>) {
        for p in points {
            self.index.entry(p.id).or_insert(self.points.len());
            self.points.push(p);
        }
    }
}

impl FromIterator<Point> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
