//! Convert one source chunk into its Java terrain and entity records.

use std::sync::Arc;

use mc_conv_nbt::{CompoundExt, NbtCompound};
use mc_conv_world::{Block, BlockState, Dimension, JavaChunk, Pos2i};
use tracing::trace;

use super::block_property::BlockPropertyAccessor;
use super::chunk_store::ChunkStore;
use super::context::Context;
use super::entity::convert_entity;
use super::poi;
use super::source::SourceChunk;
use super::terraform;
use super::tile_entity::{convert_block_entity, Converted};
use crate::block_map::bedrock_to_java;
use crate::chunk_cache::ChunkCache;
use crate::error::{ChainExt, Result};
use crate::here;

/// Build the Java chunk at `pos` from the cache window centred on it.
///
/// Returns `Ok(false)` when the store holds no chunk there. Load errors
/// propagate so the caller can decide whether to skip the chunk.
pub fn convert_chunk(
    cache: &ChunkCache<SourceChunk>,
    pos: Pos2i,
    dim: Dimension,
    store: &ChunkStore,
    ctx: &mut Context,
) -> Result<bool> {
    let Some(src) = cache.load(pos).chain(here!("chunk {pos}"))? else {
        return Ok(false);
    };
    let mut out = src.java.clone();
    let mut entities = Vec::new();

    for (&p, te) in &src.bedrock.block_entities {
        let state = src.bedrock.block_at(p.x, p.y, p.z);
        let block = src.java.block_at(p.x, p.y, p.z).map(Arc::as_ref);
        match convert_block_entity(te, p, state.as_ref(), block) {
            Converted::BlockEntity(c) => {
                out.block_entities.insert(p, c);
            }
            Converted::Entity(e) => {
                out.set_block_at(p.x, p.y, p.z, Arc::new(Block::air()));
                entities.push(e);
            }
            Converted::Dropped => {}
        }
    }

    let acc = BlockPropertyAccessor::new(&out);
    terraform::run(&mut out, cache, &acc);

    convert_ticks(&mut out, &src.bedrock.pending_ticks, src.bedrock.current_tick);

    for actor in &src.bedrock.entities {
        if let Some(e) = convert_entity(actor, dim, pos, ctx) {
            entities.push(e);
        }
    }

    poi::collect(&out, dim, ctx);
    trace!(%pos, %dim, entities = entities.len(), "converted chunk");

    store.put_terrain(dim, pos, &out.to_nbt()).chain(here!())?;
    store.put_entities(dim, pos, entities).chain(here!())?;
    ctx.mark_written(dim, pos);
    Ok(true)
}

fn is_fluid(block: &Block) -> bool {
    matches!(block.local_name(), "water" | "lava" | "flowing_water" | "flowing_lava")
}

/// Bedrock ticks carry an absolute game time; Java wants ticks from now.
fn convert_ticks(out: &mut JavaChunk, ticks: &[NbtCompound], current_tick: i64) {
    for tick in ticks {
        let Some(state) = tick.get_compound("blockState").and_then(BlockState::from_nbt) else {
            continue;
        };
        let (Some(x), Some(y), Some(z)) = (tick.get_int("x"), tick.get_int("y"), tick.get_int("z")) else {
            continue;
        };
        let block = bedrock_to_java(&state);
        let delay = tick.get_integer("time").unwrap_or(current_tick) - current_tick;
        let mut t = NbtCompound::new();
        t.put("i", block.name.as_str());
        t.put("x", x);
        t.put("y", y);
        t.put("z", z);
        t.put("t", delay.clamp(0, i64::from(i32::MAX)) as i32);
        t.put("p", 0);
        if is_fluid(&block) {
            let fluid = block.local_name().trim_start_matches("flowing_");
            t.put("i", format!("minecraft:{fluid}"));
            out.fluid_ticks.push(t);
        } else {
            out.block_ticks.push(t);
        }
    }
}

#[cfg(test)]
mod tests {
    use mc_conv_nbt::NbtTag;
    use mc_conv_world::{BedrockChunk, Pos3i};

    use super::*;
    use crate::chunk_cache::Loader;

    fn tick(name: &str, x: i32, time: i64) -> NbtCompound {
        let mut t = NbtCompound::new();
        t.put("blockState", BlockState::new(name).to_nbt());
        t.put("x", x);
        t.put("y", 64);
        t.put("z", 2);
        t.put("time", time);
        t
    }

    #[test]
    fn ticks_are_relative_and_split_by_kind() {
        let mut chunk = JavaChunk::new(Pos2i::new(0, 0), Dimension::Overworld);
        let ticks = [tick("flowing_water", 1, 110), tick("redstone_wire", 2, 103), tick("stone", 3, 90)];
        convert_ticks(&mut chunk, &ticks, 100);
        assert_eq!(chunk.fluid_ticks.len(), 1);
        assert_eq!(chunk.fluid_ticks[0].get_str("i"), Some("minecraft:water"));
        assert_eq!(chunk.fluid_ticks[0].get_int("t"), Some(10));
        assert_eq!(chunk.block_ticks.len(), 2);
        assert_eq!(chunk.block_ticks[0].get_int("t"), Some(3));
        assert_eq!(chunk.block_ticks[1].get_int("t"), Some(0));
    }

    #[test]
    fn frames_become_entities_and_chunk_is_stored() {
        let pos = Pos2i::new(0, 0);
        let mut bedrock = BedrockChunk::new(pos, Dimension::Overworld);
        let mut frame = NbtCompound::new();
        frame.put("id", "ItemFrame");
        frame.put("x", 3);
        frame.put("y", 5);
        frame.put("z", 7);
        bedrock.block_entities.insert(Pos3i::new(3, 5, 7), frame);
        let mut pig = NbtCompound::new();
        pig.put("identifier", "minecraft:pig");
        pig.put("UniqueID", 99i64);
        pig.put("Pos", NbtTag::List(vec![NbtTag::Float(1.0), NbtTag::Float(5.0), NbtTag::Float(1.0)]));
        bedrock.entities.push(pig);

        let source = Arc::new(SourceChunk::from_bedrock(bedrock));
        let loader: Loader<SourceChunk> = {
            let source = Arc::clone(&source);
            Arc::new(move |p: Pos2i| {
                Ok((p == pos).then(|| SourceChunk::from_bedrock(source.bedrock.clone())))
            })
        };
        let cache = ChunkCache::new(pos, loader);
        let store = ChunkStore::create(&std::env::temp_dir()).unwrap();
        let mut ctx = Context::default();
        assert!(convert_chunk(&cache, pos, Dimension::Overworld, &store, &mut ctx).unwrap());
        assert!(!convert_chunk(&cache, Pos2i::new(1, 0), Dimension::Overworld, &store, &mut ctx).unwrap());

        let entities = store.entities(Dimension::Overworld, pos).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].get_str("id"), Some("minecraft:item_frame"));
        assert!(store.terrain(Dimension::Overworld, pos).unwrap().is_some());
        assert_eq!(ctx.written_count(), 1);
        assert!(ctx.entities.contains_key(&99));
    }
}
