//! Fixtures shared by the integration tests: a scratch directory and a
//! small Java world written with the same region code the engine reads.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mc_conv_core::level::write_java_level_dat;
use mc_conv_core::DataDirectory;
use mc_conv_nbt::{CompoundExt, NbtCompound, NbtTag};
use mc_conv_world::java_chunk::entity_chunk_to_nbt;
use mc_conv_world::region::RegionWriter;
use mc_conv_world::{Block, Dimension, JavaChunk, Pos2i};

/// Directory under the system temp dir, removed on drop.
pub struct Scratch {
    pub path: PathBuf,
}

impl Scratch {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("mc_conv_{name}_{:016x}", rand::random::<u64>()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn join(&self, p: &str) -> PathBuf {
        self.path.join(p)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.path).ok();
    }
}

pub fn block(s: &str) -> Arc<Block> {
    Arc::new(Block::parse(s).unwrap())
}

pub fn doubles(v: [f64; 3]) -> NbtTag {
    NbtTag::List(v.iter().map(|&d| NbtTag::Double(d)).collect())
}

pub fn entity(id: &str, uuid: [i32; 4], pos: [f64; 3]) -> NbtCompound {
    let mut e = NbtCompound::new();
    e.put("id", id);
    e.insert("UUID".into(), NbtTag::IntArray(uuid.to_vec()));
    e.put("Pos", doubles(pos));
    e
}

pub const PIG: [i32; 4] = [1, 0, 0, 1];
pub const CHICKEN: [i32; 4] = [2, 0, 0, 2];
pub const COW: [i32; 4] = [3, 0, 0, 3];
pub const KNOT: [i32; 4] = [4, 0, 0, 4];

/// Fence post the cow is leashed to.
pub const FENCE: [i32; 3] = [5, 64, 5];

/// A pig carrying a chicken, and a cow leashed to a knot on a fence.
pub fn farm_entities() -> Vec<NbtCompound> {
    let mut pig = entity("minecraft:pig", PIG, [2.5, 64.0, 2.5]);
    let chicken = entity("minecraft:chicken", CHICKEN, [2.5, 64.9, 2.5]);
    pig.put("Passengers", NbtTag::List(vec![NbtTag::Compound(chicken)]));

    let mut cow = entity("minecraft:cow", COW, [7.5, 64.0, 7.5]);
    cow.insert("leash".into(), NbtTag::IntArray(FENCE.to_vec()));

    let mut knot = entity("minecraft:leash_knot", KNOT, [5.5, 64.5, 5.5]);
    knot.put("TileX", FENCE[0]);
    knot.put("TileY", FENCE[1]);
    knot.put("TileZ", FENCE[2]);
    vec![pig, cow, knot]
}

/// A fortress start in chunk (0, 0) whose box reaches into chunk (1, 0).
pub fn fortress_start() -> NbtCompound {
    let mut start = NbtCompound::new();
    start.put("id", "minecraft:fortress");
    start.insert("BB".into(), NbtTag::IntArray(vec![4, 60, 4, 20, 70, 10]));
    let mut starts = NbtCompound::new();
    starts.put("minecraft:fortress", start);
    starts
}

/// Overworld chunks (0,0), (1,0) and (-1,0); the last sits in another
/// region file.
pub fn farm_chunks() -> Vec<JavaChunk> {
    let mut home = JavaChunk::new(Pos2i::new(0, 0), Dimension::Overworld);
    home.set_block_at(1, 64, 1, block("stone"));
    home.set_block_at(FENCE[0], FENCE[1], FENCE[2], block("oak_fence[east=false,north=false,south=false,waterlogged=false,west=false]"));
    home.set_block_at(3, 63, 3, block("stone_slab[type=bottom,waterlogged=true]"));
    home.structure_starts = fortress_start();

    let mut east = JavaChunk::new(Pos2i::new(1, 0), Dimension::Overworld);
    east.set_block_at(17, 64, 1, block("dirt"));

    let mut west = JavaChunk::new(Pos2i::new(-1, 0), Dimension::Overworld);
    west.set_block_at(-3, 10, 4, block("cobblestone"));
    vec![home, east, west]
}

/// Write `chunks` to `region/` and `entities` to `entities/`.
pub fn write_java_world(root: &Path, chunks: &[JavaChunk], entities: &[(Pos2i, Vec<NbtCompound>)], level: NbtCompound) {
    let dir = DataDirectory::new(root);
    let mut terrain: BTreeMap<Pos2i, RegionWriter> = BTreeMap::new();
    for c in chunks {
        terrain
            .entry(c.pos.region())
            .or_insert_with(|| RegionWriter::new(c.pos.region()))
            .put(c.pos, &c.to_nbt())
            .unwrap();
    }
    for w in terrain.values() {
        w.write_to(&dir.region_dir(Dimension::Overworld)).unwrap();
    }

    let mut by_region: BTreeMap<Pos2i, RegionWriter> = BTreeMap::new();
    for (pos, list) in entities {
        by_region
            .entry(pos.region())
            .or_insert_with(|| RegionWriter::new(pos.region()))
            .put(*pos, &entity_chunk_to_nbt(*pos, list))
            .unwrap();
    }
    for w in by_region.values() {
        w.write_to(&dir.entities_dir(Dimension::Overworld)).unwrap();
    }
    write_java_level_dat(&dir.level_dat(), level).unwrap();
}

pub fn level_dat() -> NbtCompound {
    let mut data = NbtCompound::new();
    data.put("LevelName", "Farm");
    data.put("Time", 5000i64);
    data.put("DayTime", 1200i64);
    data.put("SpawnX", 1);
    data.put("SpawnY", 65);
    data.put("SpawnZ", 1);
    data
}

/// The farm world: terrain, entities in chunk (0, 0) and a level.dat.
pub fn write_farm(root: &Path) {
    write_java_world(root, &farm_chunks(), &[(Pos2i::new(0, 0), farm_entities())], level_dat());
}
