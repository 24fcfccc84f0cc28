//! Per-unit accumulator for the Bedrock conversion.
//!
//! Entity links need no cross-chunk pass in this direction: unique ids
//! come from UUIDs and knot ids from fence positions. What remains world
//! level is the structure boxes, which may reach into chunks converted by
//! another worker.

use std::collections::BTreeMap;

use mc_conv_world::{Dimension, Pos2i, Pos2iSet};

use super::structures::{self, StructureMap};

#[derive(Debug, Default)]
pub struct Context {
    pub structures: BTreeMap<Dimension, StructureMap>,
    /// Chunks written to the store.
    pub written: BTreeMap<Dimension, Pos2iSet>,
    pub skipped_chunks: u64,
    pub actors: u64,
    /// Tick written into pending tick records.
    pub current_tick: i64,
}

impl Context {
    pub fn make(&self) -> Self {
        Self {
            current_tick: self.current_tick,
            ..Self::default()
        }
    }

    pub fn merge_into(self, parent: &mut Context) {
        for (dim, map) in self.structures {
            structures::merge(map, parent.structures.entry(dim).or_default());
        }
        for (dim, chunks) in self.written {
            let set = parent.written.entry(dim).or_default();
            for chunk in chunks.iter() {
                set.insert(chunk);
            }
        }
        parent.skipped_chunks += self.skipped_chunks;
        parent.actors += self.actors;
    }

    pub fn mark_written(&mut self, dim: Dimension, chunk: Pos2i) {
        self.written.entry(dim).or_default().insert(chunk);
    }

    pub fn written_count(&self) -> usize {
        self.written.values().map(Pos2iSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_conv_world::{Pos3i, Volume};

    #[test]
    fn merge_sums_and_unions() {
        let mut parent = Context {
            current_tick: 500,
            ..Context::default()
        };
        let mut a = parent.make();
        assert_eq!(a.current_tick, 500);
        a.mark_written(Dimension::Overworld, Pos2i::new(0, 0));
        a.actors = 3;
        a.structures
            .entry(Dimension::Overworld)
            .or_default()
            .entry(Pos2i::new(0, 0))
            .or_default()
            .entry(structures::StructureKind::Monument)
            .or_default()
            .push(Volume::new(Pos3i::new(0, 40, 0), Pos3i::new(15, 60, 15)));
        let mut b = parent.make();
        b.mark_written(Dimension::Overworld, Pos2i::new(1, 0));
        b.mark_written(Dimension::End, Pos2i::new(1, 0));
        b.skipped_chunks = 1;

        a.merge_into(&mut parent);
        b.merge_into(&mut parent);
        assert_eq!(parent.written_count(), 3);
        assert_eq!(parent.actors, 3);
        assert_eq!(parent.skipped_chunks, 1);
        assert_eq!(parent.structures[&Dimension::Overworld].len(), 1);
    }
}
