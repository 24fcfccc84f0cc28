//! Compact set of chunk coordinates.
//!
//! Each z row stores sorted, non-overlapping, non-adjacent `[start, end]`
//! spans of x. Raster-ordered inserts extend the last span in place, so
//! filling a rectangle costs one span per row.

use std::collections::BTreeMap;

use crate::pos::Pos2i;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pos2iSet {
    rows: BTreeMap<i32, Vec<(i32, i32)>>,
    len: usize,
}

impl Pos2iSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert `p`; returns `false` if it was already present.
    pub fn insert(&mut self, p: Pos2i) -> bool {
        let spans = self.rows.entry(p.z).or_default();
        let x = i64::from(p.x);

        if let Some(last) = spans.last_mut() {
            if i64::from(last.1) + 1 == x {
                last.1 = p.x;
                self.len += 1;
                return true;
            }
        }

        let idx = spans.partition_point(|s| s.0 <= p.x);
        if idx > 0 && spans[idx - 1].1 >= p.x {
            return false;
        }
        let merge_left = idx > 0 && i64::from(spans[idx - 1].1) + 1 == x;
        let merge_right = idx < spans.len() && i64::from(spans[idx].0) - 1 == x;
        match (merge_left, merge_right) {
            (true, true) => {
                spans[idx - 1].1 = spans[idx].1;
                spans.remove(idx);
            }
            (true, false) => spans[idx - 1].1 = p.x,
            (false, true) => spans[idx].0 = p.x,
            (false, false) => spans.insert(idx, (p.x, p.x)),
        }
        self.len += 1;
        true
    }

    pub fn contains(&self, p: Pos2i) -> bool {
        let Some(spans) = self.rows.get(&p.z) else {
            return false;
        };
        let idx = spans.partition_point(|s| s.0 <= p.x);
        idx > 0 && spans[idx - 1].1 >= p.x
    }

    /// Number of spans held, mostly useful for checking compaction.
    pub fn span_count(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    /// Iterate in row-major order: ascending z, then ascending x.
    pub fn iter(&self) -> impl Iterator<Item = Pos2i> + '_ {
        self.rows.iter().flat_map(|(&z, spans)| {
            spans
                .iter()
                .flat_map(move |&(start, end)| (start..=end).map(move |x| Pos2i::new(x, z)))
        })
    }

    /// Inclusive bounding box `(min, max)`, if non-empty.
    pub fn bounds(&self) -> Option<(Pos2i, Pos2i)> {
        let mut min_x = i32::MAX;
        let mut max_x = i32::MIN;
        for spans in self.rows.values() {
            if let (Some(first), Some(last)) = (spans.first(), spans.last()) {
                min_x = min_x.min(first.0);
                max_x = max_x.max(last.1);
            }
        }
        let min_z = *self.rows.keys().next()?;
        let max_z = *self.rows.keys().next_back()?;
        Some((Pos2i::new(min_x, min_z), Pos2i::new(max_x, max_z)))
    }
}

impl FromIterator<Pos2i> for Pos2iSet {
    fn from_iter<I: IntoIterator<Item = Pos2i>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Pos2i> for Pos2iSet {
    fn extend<I: IntoIterator<Item = Pos2i>>(&mut self, iter: I) {
        for p in iter {
            self.insert(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_is_one_span_per_row() {
        let mut set = Pos2iSet::new();
        for z in 0..4 {
            for x in -3..5 {
                assert!(set.insert(Pos2i::new(x, z)));
            }
        }
        assert_eq!(set.len(), 32);
        assert_eq!(set.span_count(), 4);
        assert!(set.contains(Pos2i::new(-3, 2)));
        assert!(!set.contains(Pos2i::new(5, 2)));
        assert!(!set.contains(Pos2i::new(0, 4)));
    }

    #[test]
    fn out_of_order_inserts_merge() {
        let mut set = Pos2iSet::new();
        set.insert(Pos2i::new(5, 0));
        set.insert(Pos2i::new(1, 0));
        set.insert(Pos2i::new(3, 0));
        assert_eq!(set.span_count(), 3);
        set.insert(Pos2i::new(2, 0));
        assert_eq!(set.span_count(), 2);
        set.insert(Pos2i::new(4, 0));
        assert_eq!(set.span_count(), 1);
        assert!(!set.insert(Pos2i::new(3, 0)));
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn iteration_is_row_major() {
        let set: Pos2iSet = [Pos2i::new(1, 1), Pos2i::new(0, 1), Pos2i::new(7, -2)]
            .into_iter()
            .collect();
        let order: Vec<_> = set.iter().collect();
        assert_eq!(
            order,
            vec![Pos2i::new(7, -2), Pos2i::new(0, 1), Pos2i::new(1, 1)]
        );
        assert_eq!(
            set.bounds(),
            Some((Pos2i::new(0, -2), Pos2i::new(7, 1)))
        );
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let mut set = Pos2iSet::new();
        assert!(set.insert(Pos2i::new(i32::MAX, 0)));
        assert!(set.insert(Pos2i::new(i32::MIN, 0)));
        assert!(set.insert(Pos2i::new(i32::MAX - 1, 0)));
        assert_eq!(set.span_count(), 2);
        assert!(set.contains(Pos2i::new(i32::MAX, 0)));
    }
}
