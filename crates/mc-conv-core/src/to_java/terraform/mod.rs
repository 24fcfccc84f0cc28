//! Recompute the block properties Bedrock leaves implicit.
//!
//! Every pass reads neighbours from the untouched source view and writes
//! into the output chunk, so results do not depend on pass order or on
//! the scan order of chunks. A missing neighbour counts as absent.

mod connect;
mod door;
mod misc;
mod note_block;
mod piston;
mod plants;
mod redstone;
pub mod solid;
mod stairs;

use std::sync::Arc;

use mc_conv_nbt::NbtCompound;
use mc_conv_world::{Block, JavaChunk, Pos2i, Pos3i};

use super::block_property::BlockPropertyAccessor;
use super::source::SourceChunk;
use crate::chunk_cache::ChunkCache;

pub use redstone::{normalize_wire, WireSide};

/// Read access to translated source blocks around the chunk being built.
pub trait BlockAccessor {
    /// Translated block before terraform; `None` outside the window.
    fn block_at(&self, x: i32, y: i32, z: i32) -> Option<&Arc<Block>>;

    /// Bedrock block entity at a position.
    fn source_block_entity(&self, pos: Pos3i) -> Option<&NbtCompound>;

    fn block(&self, pos: Pos3i) -> Option<&Arc<Block>> {
        self.block_at(pos.x, pos.y, pos.z)
    }

    /// Local name of the block at `pos`, empty when absent.
    fn name(&self, pos: Pos3i) -> &str {
        self.block(pos).map_or("", |b| b.local_name())
    }
}

impl BlockAccessor for ChunkCache<SourceChunk> {
    fn block_at(&self, x: i32, y: i32, z: i32) -> Option<&Arc<Block>> {
        self.get(Pos2i::chunk_of_block(x, z))?.java.block_at(x, y, z)
    }

    fn source_block_entity(&self, pos: Pos3i) -> Option<&NbtCompound> {
        self.get(pos.chunk())?.bedrock.block_entity_at(pos)
    }
}

/// Run every pass over `out`.
pub fn run(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    stairs::apply(out, src, acc);
    connect::apply(out, src, acc);
    redstone::apply(out, src, acc);
    door::apply(out, src, acc);
    plants::apply(out, src, acc);
    note_block::apply(out, src, acc);
    piston::apply(out, src, acc);
    misc::apply(out, src, acc);
}

fn current(out: &JavaChunk, pos: Pos3i) -> Option<Arc<Block>> {
    out.block_at(pos.x, pos.y, pos.z).cloned()
}

fn replace(out: &mut JavaChunk, pos: Pos3i, block: Block) {
    out.set_block_at(pos.x, pos.y, pos.z, Arc::new(block));
}

/// Override properties on the output cell, leaving it alone when unchanged.
fn set_properties(out: &mut JavaChunk, pos: Pos3i, overrides: &[(&str, &str)]) {
    let Some(block) = current(out, pos) else { return };
    if overrides.iter().all(|&(k, v)| block.property(k) == Some(v)) {
        return;
    }
    replace(out, pos, block.with_properties(overrides));
}
