//! A 3×3 window of lazily loaded chunks that slides across a region.

use std::sync::Arc;

use mc_conv_world::{Pos2i, Pos2iSet};
use once_cell::unsync::OnceCell;

use crate::error::Result;

const WIDTH: i32 = 3;
const SLOTS: usize = (WIDTH * WIDTH) as usize;

/// Produces the chunk at a position, `Ok(None)` when it does not exist.
pub type Loader<T> = Arc<dyn Fn(Pos2i) -> Result<Option<T>> + Send + Sync>;

pub struct ChunkCache<T> {
    center: Pos2i,
    slots: [OnceCell<Option<Arc<T>>>; SLOTS],
    loader: Loader<T>,
}

impl<T> ChunkCache<T> {
    pub fn new(center: Pos2i, loader: Loader<T>) -> Self {
        Self {
            center,
            slots: Default::default(),
            loader,
        }
    }

    pub fn center(&self) -> Pos2i {
        self.center
    }

    fn slot(&self, chunk: Pos2i) -> Option<usize> {
        let d = chunk - self.center;
        ((-1..=1).contains(&d.x) && (-1..=1).contains(&d.z)).then(|| ((d.z + 1) * WIDTH + d.x + 1) as usize)
    }

    pub fn contains(&self, chunk: Pos2i) -> bool {
        self.slot(chunk).is_some()
    }

    /// Load on first access. Positions outside the window read as absent.
    /// Load failures are returned and not cached, so a later access retries.
    pub fn load(&self, chunk: Pos2i) -> Result<Option<&T>> {
        let Some(i) = self.slot(chunk) else {
            return Ok(None);
        };
        let loaded = self.slots[i].get_or_try_init(|| (self.loader)(chunk).map(|c| c.map(Arc::new)))?;
        Ok(loaded.as_deref())
    }

    /// Like [`load`](Self::load) but failures read as absent; neighbour
    /// lookups during terraform treat a broken chunk as missing.
    pub fn get(&self, chunk: Pos2i) -> Option<&T> {
        self.load(chunk).ok().flatten()
    }

    pub fn loaded_count(&self) -> usize {
        self.slots.iter().filter(|s| s.get().is_some()).count()
    }

    /// Move the window, keeping every chunk that is still inside it.
    pub fn make_relocated(self, center: Pos2i) -> Self {
        let mut next = Self::new(center, Arc::clone(&self.loader));
        for (i, slot) in self.slots.into_iter().enumerate() {
            let Some(chunk) = slot.into_inner() else { continue };
            let i = i as i32;
            let pos = self.center + Pos2i::new(i % WIDTH - 1, i / WIDTH - 1);
            if let Some(j) = next.slot(pos) {
                let _ = next.slots[j].set(chunk);
            }
        }
        next
    }
}

/// Row-major order reversing X on every other row, so consecutive chunks
/// are usually neighbours and the window slides by one.
pub fn boustrophedon(chunks: &Pos2iSet) -> Vec<Pos2i> {
    let mut out = Vec::with_capacity(chunks.len());
    let mut row: Vec<Pos2i> = Vec::new();
    let mut flip = false;
    let mut current_z = None;
    for p in chunks.iter() {
        if current_z != Some(p.z) {
            flush_row(&mut out, &mut row, flip);
            if current_z.is_some() {
                flip = !flip;
            }
            current_z = Some(p.z);
        }
        row.push(p);
    }
    flush_row(&mut out, &mut row, flip);
    out
}

fn flush_row(out: &mut Vec<Pos2i>, row: &mut Vec<Pos2i>, reversed: bool) {
    if reversed {
        out.extend(row.drain(..).rev());
    } else {
        out.append(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use crate::here;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_loader(counter: Arc<AtomicUsize>) -> Loader<Pos2i> {
        Arc::new(move |p: Pos2i| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok((p.x >= 0).then_some(p))
        })
    }

    #[test]
    fn lazy_and_bounded() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = ChunkCache::new(Pos2i::new(5, 5), counting_loader(Arc::clone(&loads)));
        assert_eq!(cache.get(Pos2i::new(4, 6)), Some(&Pos2i::new(4, 6)));
        assert_eq!(cache.get(Pos2i::new(4, 6)), Some(&Pos2i::new(4, 6)));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(Pos2i::new(7, 5)), None);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn absent_chunks_are_cached_too() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = ChunkCache::new(Pos2i::new(0, 0), counting_loader(Arc::clone(&loads)));
        assert_eq!(cache.get(Pos2i::new(-1, 0)), None);
        assert_eq!(cache.get(Pos2i::new(-1, 0)), None);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn relocation_keeps_overlap() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = ChunkCache::new(Pos2i::new(1, 1), counting_loader(Arc::clone(&loads)));
        for z in 0..3 {
            for x in 0..3 {
                cache.get(Pos2i::new(x, z));
            }
        }
        assert_eq!(loads.load(Ordering::SeqCst), 9);
        let cache = cache.make_relocated(Pos2i::new(2, 1));
        assert_eq!(cache.loaded_count(), 6);
        for z in 0..3 {
            for x in 1..4 {
                assert_eq!(cache.get(Pos2i::new(x, z)), Some(&Pos2i::new(x, z)));
            }
        }
        assert_eq!(loads.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn failures_are_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let loader: Loader<u8> = Arc::new(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ConvertError::invalid("flaky", here!()))
            } else {
                Ok(Some(1))
            }
        });
        let cache = ChunkCache::new(Pos2i::new(0, 0), loader);
        assert!(cache.load(Pos2i::new(0, 0)).is_err());
        assert_eq!(cache.load(Pos2i::new(0, 0)).unwrap(), Some(&1));
    }

    #[test]
    fn snake_order() {
        let set: Pos2iSet = [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (5, 2)]
            .into_iter()
            .map(|(x, z)| Pos2i::new(x, z))
            .collect();
        let order: Vec<(i32, i32)> = boustrophedon(&set).into_iter().map(|p| (p.x, p.z)).collect();
        assert_eq!(order, vec![(0, 0), (1, 0), (2, 0), (1, 1), (0, 1), (5, 2)]);
    }
}
