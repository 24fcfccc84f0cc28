//! Convert one Java chunk into its Bedrock records.

use std::collections::BTreeMap;

use bytes::BufMut;
use mc_conv_nbt::{to_le_bytes, CompoundExt, NbtCompound, NbtTag};
use mc_conv_world::bedrock_chunk::encode_data_3d;
use mc_conv_world::sub_chunk::encode_sub_chunk;
use mc_conv_world::{keys, Block, BlockState, Dimension, Facing6, JavaChunk, KvStore, Pos2i, Pos3i};
use tracing::trace;

use super::context::Context;
use super::entity::{convert_entity, EntityEnv};
use super::section::{biome_section, convert_section, heightmap, is_empty, Overrides};
use super::structures;
use super::tile_entity::{bookshelf_slot, convert_block_entity};
use crate::block_map::items::item_to_bedrock;
use crate::block_map::{encode_dir, java_to_bedrock, FACING_DIRECTIONS};
use crate::error::{Result, ResultExt};
use crate::here;

// ─── Item frames ────────────────────────────────────────────────────────────

fn is_item_frame(entity: &NbtCompound) -> Option<bool> {
    match entity.get_str("id")? {
        "minecraft:item_frame" => Some(false),
        "minecraft:glow_item_frame" => Some(true),
        _ => None,
    }
}

/// Bedrock frame block and block entity for a Java item frame entity.
fn item_frame(entity: &NbtCompound, glow: bool) -> Option<(Pos3i, BlockState, NbtCompound)> {
    let pos = Pos3i::new(entity.get_int("TileX")?, entity.get_int("TileY")?, entity.get_int("TileZ")?);
    let facing = entity
        .get_integer("Facing")
        .and_then(|f| Facing6::from_java_3d_data(f as i32))
        .unwrap_or(Facing6::Up);
    let item = entity.get_compound("Item");
    let is_map = item
        .and_then(|i| i.get_str("id"))
        .is_some_and(|id| id == "minecraft:filled_map");
    let state = BlockState::new(if glow { "glow_frame" } else { "frame" })
        .with("facing_direction", encode_dir(&FACING_DIRECTIONS, &facing))
        .with("item_frame_map_bit", is_map)
        .with("item_frame_photo_bit", false);

    let mut te = NbtCompound::new();
    te.put("id", if glow { "GlowItemFrame" } else { "ItemFrame" });
    te.put("x", pos.x);
    te.put("y", pos.y);
    te.put("z", pos.z);
    te.put("isMovable", true);
    if let Some(item) = item.and_then(item_to_bedrock) {
        te.put("Item", item);
        let rotation = entity.get_integer("ItemRotation").unwrap_or(0);
        te.put("ItemRotation", (rotation.rem_euclid(8) * 45) as f32);
        te.put("ItemDropChance", entity.get_float("ItemDropChance").unwrap_or(1.0));
    }
    Some((pos, state, te))
}

fn inside(pos: Pos3i, chunk: Pos2i) -> bool {
    pos.chunk() == chunk
}

// ─── Ticks ──────────────────────────────────────────────────────────────────

/// Java ticks count down from now; Bedrock stores the absolute game time.
fn pending_ticks(java: &JavaChunk, current_tick: i64) -> Option<NbtCompound> {
    let mut list = Vec::new();
    for tick in java.block_ticks.iter().chain(&java.fluid_ticks) {
        let Some(name) = tick.get_str("i") else { continue };
        let (Some(x), Some(y), Some(z)) = (tick.get_int("x"), tick.get_int("y"), tick.get_int("z")) else {
            continue;
        };
        let mut t = NbtCompound::new();
        t.put("blockState", java_to_bedrock(&Block::new(name)).to_nbt());
        t.put("x", x);
        t.put("y", y);
        t.put("z", z);
        t.put("time", current_tick + tick.get_integer("t").unwrap_or(0));
        list.push(NbtTag::Compound(t));
    }
    if list.is_empty() {
        return None;
    }
    let mut root = NbtCompound::new();
    root.put("currentTick", current_tick as i32);
    root.put("tickList", NbtTag::List(list));
    Some(root)
}

// ─── Chunk ──────────────────────────────────────────────────────────────────

/// Write every record of `java` to `store`. `entities` are the chunk's
/// entities from the entity region file.
pub fn convert_chunk(
    java: &JavaChunk,
    entities: Vec<NbtCompound>,
    dim: Dimension,
    store: &dyn KvStore,
    env: &EntityEnv<'_>,
    ctx: &mut Context,
) -> Result<()> {
    let pos = java.pos;
    let mut overrides = Overrides::new();
    let mut block_entities: BTreeMap<Pos3i, NbtCompound> = BTreeMap::new();
    let mut actors_src = Vec::new();

    for e in entities.into_iter().chain(java.entities.iter().cloned()) {
        match is_item_frame(&e) {
            Some(glow) => {
                let Some((p, state, te)) = item_frame(&e, glow) else { continue };
                if inside(p, pos) {
                    overrides.insert(p, state);
                    block_entities.insert(p, te);
                }
            }
            None => actors_src.push(e),
        }
    }

    for (&p, te) in &java.block_entities {
        if te.get_str("id") == Some("minecraft:chiseled_bookshelf") {
            if let Some(block) = java.block_at(p.x, p.y, p.z) {
                let state = java_to_bedrock(block).with("last_interacted_slot", bookshelf_slot(te));
                overrides.insert(p, state);
            }
        }
        if let Some(c) = convert_block_entity(te, p) {
            block_entities.entry(p).or_insert(c);
        }
    }

    // Terrain.
    let mut subs = BTreeMap::new();
    for sy in dim.bedrock_sections() {
        let Some(section) = java.sections.get(&sy) else { continue };
        let origin = Pos3i::new(pos.x * 16, sy * 16, pos.z * 16);
        let sub = convert_section(section, origin, &overrides);
        if is_empty(&sub) {
            continue;
        }
        store
            .put(&keys::sub_chunk_key(pos, dim, sy as i8), &encode_sub_chunk(&sub))
            .wrap_with(|| here!("sub-chunk {sy} of {pos}"))?;
        subs.insert(sy as i8, sub);
    }
    let biomes: Vec<_> = dim.bedrock_sections().map(|sy| biome_section(java, dim, sy)).collect();
    store
        .put(
            &keys::chunk_key(pos, dim, keys::TAG_DATA_3D),
            &encode_data_3d(&heightmap(&subs, dim), &biomes),
        )
        .wrap_with(|| here!("data 3d of {pos}"))?;

    if !block_entities.is_empty() {
        let mut data = Vec::new();
        for te in block_entities.values() {
            data.extend_from_slice(&to_le_bytes(te));
        }
        store
            .put(&keys::chunk_key(pos, dim, keys::TAG_BLOCK_ENTITY), &data)
            .wrap_with(|| here!("block entities of {pos}"))?;
    }

    // Entities, one record each plus the chunk's digest.
    let mut actors = Vec::new();
    for e in &actors_src {
        convert_entity(e, env, &mut actors);
    }
    let mut digest = Vec::with_capacity(actors.len() * 8);
    for actor in &actors {
        let Some(uid) = actor.get_long("UniqueID") else { continue };
        store
            .put(&keys::actor_key(uid), &to_le_bytes(actor))
            .wrap_with(|| here!("actor {uid} in {pos}"))?;
        digest.put_i64_le(uid);
    }
    if !digest.is_empty() {
        store
            .put(&keys::digest_key(pos, dim), &digest)
            .wrap_with(|| here!("digest of {pos}"))?;
    }
    ctx.actors += (digest.len() / 8) as u64;

    if let Some(ticks) = pending_ticks(java, ctx.current_tick) {
        store
            .put(&keys::chunk_key(pos, dim, keys::TAG_PENDING_TICKS), &to_le_bytes(&ticks))
            .wrap_with(|| here!("pending ticks of {pos}"))?;
    }

    store
        .put(&keys::chunk_key(pos, dim, keys::TAG_FINALIZED_STATE), &keys::FINALIZED_DONE.to_le_bytes())
        .wrap(here!())?;
    // Written last: readers treat the version record as "chunk exists".
    store
        .put(&keys::chunk_key(pos, dim, keys::TAG_VERSION), &[keys::CHUNK_VERSION])
        .wrap(here!())?;

    structures::collect(&java.structure_starts, ctx.structures.entry(dim).or_default());
    ctx.mark_written(dim, pos);
    trace!(%pos, %dim, sections = subs.len(), actors = actors.len(), "converted chunk");
    Ok(())
}
