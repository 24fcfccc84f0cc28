//! Axis-aligned inclusive block boxes, used for structure bounds.

use crate::pos::{Pos2i, Pos3i};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Volume {
    pub start: Pos3i,
    pub end: Pos3i,
}

fn axis(p: Pos3i, a: usize) -> i32 {
    match a {
        0 => p.x,
        1 => p.y,
        _ => p.z,
    }
}

fn set_axis(p: &mut Pos3i, a: usize, v: i32) {
    match a {
        0 => p.x = v,
        1 => p.y = v,
        _ => p.z = v,
    }
}

impl Volume {
    /// Build a volume from two corners in any order.
    pub fn new(a: Pos3i, b: Pos3i) -> Self {
        Self {
            start: Pos3i::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            end: Pos3i::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    pub fn contains(&self, p: Pos3i) -> bool {
        (self.start.x..=self.end.x).contains(&p.x)
            && (self.start.y..=self.end.y).contains(&p.y)
            && (self.start.z..=self.end.z).contains(&p.z)
    }

    pub fn size(&self) -> Pos3i {
        self.end - self.start + Pos3i::new(1, 1, 1)
    }

    pub fn intersection(&self, other: &Volume) -> Option<Volume> {
        let start = Pos3i::new(
            self.start.x.max(other.start.x),
            self.start.y.max(other.start.y),
            self.start.z.max(other.start.z),
        );
        let end = Pos3i::new(
            self.end.x.min(other.end.x),
            self.end.y.min(other.end.y),
            self.end.z.min(other.end.z),
        );
        (start.x <= end.x && start.y <= end.y && start.z <= end.z).then_some(Volume { start, end })
    }

    /// Split into per-chunk pieces, ordered by chunk z then x.
    pub fn split_by_chunk(&self) -> Vec<(Pos2i, Volume)> {
        let min = self.start.chunk();
        let max = self.end.chunk();
        let mut out = Vec::new();
        for cz in min.z..=max.z {
            for cx in min.x..=max.x {
                let column = Volume::new(
                    Pos3i::new(cx * 16, self.start.y, cz * 16),
                    Pos3i::new(cx * 16 + 15, self.end.y, cz * 16 + 15),
                );
                if let Some(piece) = self.intersection(&column) {
                    out.push((Pos2i::new(cx, cz), piece));
                }
            }
        }
        out
    }

    /// Merge volumes that touch face-to-face along one axis and share the
    /// same cross-section, repeated per axis until nothing changes.
    pub fn connect(volumes: &mut Vec<Volume>) {
        loop {
            let before = volumes.len();
            for a in 0..3 {
                connect_along(volumes, a);
            }
            if volumes.len() == before {
                break;
            }
        }
        volumes.sort();
    }
}

fn connect_along(volumes: &mut Vec<Volume>, a: usize) {
    let (b, c) = match a {
        0 => (1, 2),
        1 => (0, 2),
        _ => (0, 1),
    };
    let key = |v: &Volume| {
        (
            axis(v.start, b),
            axis(v.end, b),
            axis(v.start, c),
            axis(v.end, c),
            axis(v.start, a),
        )
    };
    volumes.sort_by_key(key);
    volumes.dedup();

    let mut merged: Vec<Volume> = Vec::with_capacity(volumes.len());
    for v in volumes.drain(..) {
        if let Some(last) = merged.last_mut() {
            let same_section = axis(last.start, b) == axis(v.start, b)
                && axis(last.end, b) == axis(v.end, b)
                && axis(last.start, c) == axis(v.start, c)
                && axis(last.end, c) == axis(v.end, c);
            if same_section && i64::from(axis(last.end, a)) + 1 >= i64::from(axis(v.start, a)) {
                let end = axis(last.end, a).max(axis(v.end, a));
                set_axis(&mut last.end, a, end);
                continue;
            }
        }
        merged.push(v);
    }
    *volumes = merged;
}
