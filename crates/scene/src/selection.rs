use std::collections::BTreeSet;

use foundation::PointId;
use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use serde::{Deserialize, Serialize};

/// Deterministic set of manually selected point ids.
///
/// Ordering contract:
/// - Iteration yields ids in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet {
    ids: BTreeSet<PointId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.ids.contains(&id)
    }

    /// Inserts `id` into the set.
    ///
    /// Returns `true` if the set changed.
    pub fn insert(&mut self, id: PointId) -> bool {
        self.ids.insert(id)
    }

    /// Removes `id` from the set.
    ///
    /// Returns `true` if the set changed.
    pub fn remove(&mut self, id: PointId) -> bool {
        self.ids.remove(&id)
    }

    /// Flips membership of `id`. Returns `true` if `id` is now selected.
    pub fn toggle(&mut self, id: PointId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Iterates selected ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = PointId> + '_ {
        self.ids.iter().copied()
    }
}

impl FromIterator<PointId> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = PointId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Rubber-band rectangle in world coordinates.
///
/// `start` is fixed at drag-start; `current` follows the pointer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionRectangle {
    pub start: Vec2,
    pub current: Vec2,
}

impl SelectionRectangle {
    pub fn new(start: Vec2) -> Self {
        Self {
            start,
            current: start,
        }
    }

    pub fn bounds(&self) -> Aabb2 {
        Aabb2::from_corners(self.start, self.current)
    }

    /// Inclusive on every edge.
    pub fn contains(&self, p: Vec2) -> bool {
        self.bounds().contains(p)
    }
}

#[cfg(test)]
mod tests {
    use super::{SelectionRectangle, SelectionSet};
    use foundation::PointId;
    use foundation::math::Vec2;

    fn ids(raw: &[u64]) -> SelectionSet {
        raw.iter().map(|&r| PointId(r)).collect()
    }

    #[test]
    fn insert_remove_contains_and_len() {
        let mut s = SelectionSet::new();
        assert!(s.is_empty());
        assert!(!s.contains(PointId(1)));

        assert!(s.insert(PointId(1)));
        assert!(s.contains(PointId(1)));
        assert_eq!(s.len(), 1);
        assert!(!s.insert(PointId(1)));

        assert!(s.remove(PointId(1)));
        assert!(!s.contains(PointId(1)));
        assert!(!s.remove(PointId(1)));
    }

    #[test]
    fn toggle_flips_membership() {
        let mut s = SelectionSet::new();
        assert!(s.toggle(PointId(4)));
        assert!(!s.toggle(PointId(4)));
        assert!(s.is_empty());
    }

    #[test]
    fn iter_is_sorted() {
        let s = ids(&[10, 2, 65]);
        let got: Vec<u64> = s.iter().map(PointId::get).collect();
        assert_eq!(got, vec![2, 10, 65]);
    }

    #[test]
    fn rectangle_normalizes_drag_direction() {
        let mut r = SelectionRectangle::new(Vec2::new(2.0, 2.0));
        r.current = Vec2::new(-1.0, -1.0);
        assert!(r.contains(Vec2::new(0.0, 0.0)));
        assert!(r.contains(Vec2::new(2.0, -1.0)));
        assert!(!r.contains(Vec2::new(5.0, 5.0)));
    }
}
