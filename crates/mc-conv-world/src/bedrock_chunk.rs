//! Bedrock chunk model, loaded from the per-chunk records of a store.

use std::collections::BTreeMap;

use bytes::{Buf, BufMut};
use mc_conv_nbt::{read_nbt_le, read_nbt_le_multi, CompoundExt, NbtCompound};

use crate::bedrock_block::BlockState;
use crate::dimension::Dimension;
use crate::error::ChunkError;
use crate::keys;
use crate::pos::{Pos2i, Pos3i};
use crate::store::KvStore;
use crate::sub_chunk::{
    bits_per_block, decode_sub_chunk, pack_words, unpack_words, PalettedStorage, SubChunk,
};

/// Biome ids for one 16³ section, XZY like block storage.
pub type BiomeStorage = PalettedStorage<i32>;

/// Header byte meaning "same as the section below".
const BIOME_COPY_PREVIOUS: u8 = 0xFF;

// ─── Data3D ─────────────────────────────────────────────────────────────────

/// Encode Data3D: a 16×16 heightmap (i16 LE, index `z * 16 + x`) followed
/// by one biome section per sub-chunk from the bottom up.
pub fn encode_data_3d(heightmap: &[i16; 256], sections: &[BiomeStorage]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(512 + sections.len() * 8);
    for h in heightmap {
        buf.put_i16_le(*h);
    }
    let mut previous: Option<&BiomeStorage> = None;
    for section in sections {
        if previous.is_some_and(|p| p == section) {
            buf.put_u8(BIOME_COPY_PREVIOUS);
            continue;
        }
        previous = Some(section);
        if section.is_uniform() {
            buf.put_u8(1);
            buf.put_i32_le(section.get_at(0).copied().unwrap_or(0));
            continue;
        }
        let bits = bits_per_block(section.palette.len());
        buf.put_u8((bits << 1) | 1);
        pack_words(&mut buf, &section.indices, bits);
        buf.put_i32_le(section.palette.len() as i32);
        for id in &section.palette {
            buf.put_i32_le(*id);
        }
    }
    buf
}

/// Decode Data3D into a heightmap and biome sections (bottom-up).
pub fn decode_data_3d(data: &[u8]) -> Result<([i16; 256], Vec<BiomeStorage>), ChunkError> {
    let mut buf = data;
    if buf.remaining() < 512 {
        return Err(ChunkError::Malformed("Data3D shorter than its heightmap".into()));
    }
    let mut heightmap = [0i16; 256];
    for h in heightmap.iter_mut() {
        *h = buf.get_i16_le();
    }

    let mut sections: Vec<BiomeStorage> = Vec::new();
    while buf.has_remaining() {
        let header = buf.get_u8();
        if header == BIOME_COPY_PREVIOUS {
            let copy = sections
                .last()
                .cloned()
                .ok_or_else(|| ChunkError::Malformed("Data3D copies a missing section".into()))?;
            sections.push(copy);
            continue;
        }
        let bits = header >> 1;
        if bits == 0 {
            if buf.remaining() < 4 {
                return Err(ChunkError::Malformed("Data3D truncated".into()));
            }
            sections.push(BiomeStorage::filled(buf.get_i32_le()));
            continue;
        }
        if !matches!(bits, 1..=6 | 8 | 16) {
            return Err(ChunkError::Malformed(format!("Data3D bits per value {bits}")));
        }
        let indices = unpack_words(&mut buf, bits)
            .map_err(|e| ChunkError::Malformed(format!("Data3D: {e}")))?;
        if buf.remaining() < 4 {
            return Err(ChunkError::Malformed("Data3D truncated".into()));
        }
        let len = buf.get_i32_le().max(0) as usize;
        if buf.remaining() < len * 4 {
            return Err(ChunkError::Malformed("Data3D palette truncated".into()));
        }
        let palette = (0..len).map(|_| buf.get_i32_le()).collect();
        sections.push(BiomeStorage { palette, indices });
    }
    Ok((heightmap, sections))
}

/// Decode the older Data2D record into one uniform-height biome section.
fn decode_data_2d(data: &[u8]) -> Option<BiomeStorage> {
    let biomes = data.get(512..768)?;
    let mut storage = BiomeStorage::filled(i32::from(biomes[0]));
    for x in 0..16 {
        for z in 0..16 {
            let id = i32::from(biomes[z * 16 + x]);
            for y in 0..16 {
                storage.set(x, y, z, id);
            }
        }
    }
    Some(storage)
}

// ─── Chunk ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct BedrockChunk {
    pub pos: Pos2i,
    pub dim: Dimension,
    pub version: u8,
    pub sub_chunks: BTreeMap<i8, SubChunk>,
    /// Biome sections keyed by section y. Sections above the last stored
    /// one repeat the topmost.
    pub biomes: BTreeMap<i32, BiomeStorage>,
    pub block_entities: BTreeMap<Pos3i, NbtCompound>,
    pub entities: Vec<NbtCompound>,
    pub pending_ticks: Vec<NbtCompound>,
    pub current_tick: i64,
}

impl BedrockChunk {
    pub fn new(pos: Pos2i, dim: Dimension) -> Self {
        Self {
            pos,
            dim,
            version: keys::CHUNK_VERSION,
            sub_chunks: BTreeMap::new(),
            biomes: BTreeMap::new(),
            block_entities: BTreeMap::new(),
            entities: Vec::new(),
            pending_ticks: Vec::new(),
            current_tick: 0,
        }
    }

    /// Load a chunk; `Ok(None)` when the chunk has no version record.
    pub fn load(pos: Pos2i, dim: Dimension, store: &dyn KvStore) -> Result<Option<Self>, ChunkError> {
        let version = match store.get(&keys::chunk_key(pos, dim, keys::TAG_VERSION))? {
            Some(v) => v,
            None => match store.get(&keys::chunk_key(pos, dim, keys::TAG_LEGACY_VERSION))? {
                Some(v) => v,
                None => return Ok(None),
            },
        };
        let mut chunk = Self::new(pos, dim);
        chunk.version = version.first().copied().unwrap_or(0);

        for y in dim.bedrock_sections() {
            let y = y as i8;
            let Some(data) = store.get(&keys::sub_chunk_key(pos, dim, y))? else {
                continue;
            };
            let sub = decode_sub_chunk(&data, y).map_err(|source| ChunkError::SubChunk { y, source })?;
            chunk.sub_chunks.insert(y, sub);
        }

        let min_y = *dim.bedrock_sections().start();
        if let Some(data) = store.get(&keys::chunk_key(pos, dim, keys::TAG_DATA_3D))? {
            let (_, sections) = decode_data_3d(&data)?;
            for (i, s) in sections.into_iter().enumerate() {
                chunk.biomes.insert(min_y + i as i32, s);
            }
        } else if let Some(data) = store.get(&keys::chunk_key(pos, dim, keys::TAG_DATA_2D))? {
            if let Some(s) = decode_data_2d(&data) {
                chunk.biomes.insert(min_y, s);
            }
        }

        if let Some(data) = store.get(&keys::chunk_key(pos, dim, keys::TAG_BLOCK_ENTITY))? {
            for root in read_nbt_le_multi(&mut data.as_slice())? {
                let c = root.compound;
                if let (Some(x), Some(y), Some(z)) = (c.get_int("x"), c.get_int("y"), c.get_int("z")) {
                    chunk.block_entities.insert(Pos3i::new(x, y, z), c);
                }
            }
        }

        if let Some(data) = store.get(&keys::chunk_key(pos, dim, keys::TAG_ENTITY))? {
            chunk
                .entities
                .extend(read_nbt_le_multi(&mut data.as_slice())?.into_iter().map(|r| r.compound));
        }
        if let Some(digest) = store.get(&keys::digest_key(pos, dim))? {
            let mut ids = digest.as_slice();
            while ids.remaining() >= 8 {
                let id = ids.get_i64_le();
                if let Some(data) = store.get(&keys::actor_key(id))? {
                    chunk.entities.push(read_nbt_le(&mut data.as_slice())?.compound);
                }
            }
        }

        if let Some(data) = store.get(&keys::chunk_key(pos, dim, keys::TAG_PENDING_TICKS))? {
            let root = read_nbt_le(&mut data.as_slice())?.compound;
            chunk.current_tick = root.get_integer("currentTick").unwrap_or(0);
            if let Some(list) = root.get_list("tickList") {
                chunk.pending_ticks = list.iter().filter_map(|t| t.as_compound().cloned()).collect();
            }
        }
        Ok(Some(chunk))
    }

    fn local(&self, x: i32, y: i32, z: i32) -> Option<(i8, usize, usize, usize)> {
        let lx = x - self.pos.x * 16;
        let lz = z - self.pos.z * 16;
        if !(0..16).contains(&lx) || !(0..16).contains(&lz) {
            return None;
        }
        let sy = i8::try_from(y.div_euclid(16)).ok()?;
        Some((sy, lx as usize, y.rem_euclid(16) as usize, lz as usize))
    }

    /// Layer-0 block at world coordinates. Sections that are absent read
    /// as air; coordinates outside the chunk read as `None`.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Option<BlockState> {
        let (sy, lx, ly, lz) = self.local(x, y, z)?;
        match self.sub_chunks.get(&sy) {
            Some(sub) => sub.block(lx, ly, lz).cloned(),
            None => Some(BlockState::air()),
        }
    }

    /// Liquid-layer block, if the section stores one for this cell.
    pub fn liquid_at(&self, x: i32, y: i32, z: i32) -> Option<&BlockState> {
        let (sy, lx, ly, lz) = self.local(x, y, z)?;
        self.sub_chunks
            .get(&sy)?
            .liquid(lx, ly, lz)
            .filter(|b| !b.is_air())
    }

    pub fn biome_at(&self, x: i32, y: i32, z: i32) -> Option<i32> {
        let (_, lx, ly, lz) = self.local(x, y, z)?;
        let sy = y.div_euclid(16);
        let section = self
            .biomes
            .range(..=sy)
            .next_back()
            .or_else(|| self.biomes.iter().next())?
            .1;
        section.get(lx, ly, lz).copied()
    }

    pub fn block_entity_at(&self, pos: Pos3i) -> Option<&NbtCompound> {
        self.block_entities.get(&pos)
    }

    /// Distinct layer-0 states across every section.
    pub fn palette(&self) -> impl Iterator<Item = &BlockState> {
        self.sub_chunks
            .values()
            .filter_map(|s| s.layers.first())
            .flat_map(|l| l.palette.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::sub_chunk::encode_sub_chunk;
    use mc_conv_nbt::{to_le_bytes, NbtTag};

    #[test]
    fn data_3d_roundtrip_with_copy_marker() {
        let mut varied = BiomeStorage::filled(1);
        varied.set(3, 4, 5, 2);
        let sections = vec![BiomeStorage::filled(7), varied.clone(), varied.clone(), BiomeStorage::filled(1)];
        let mut heightmap = [0i16; 256];
        heightmap[17] = 64;
        let data = encode_data_3d(&heightmap, &sections);
        assert_eq!(data[512], 1, "uniform header");
        assert!(data.contains(&BIOME_COPY_PREVIOUS));

        let (h, decoded) = decode_data_3d(&data).unwrap();
        assert_eq!(h[17], 64);
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded[0].get(0, 0, 0), Some(&7));
        assert_eq!(decoded[2].get(3, 4, 5), Some(&2));
        assert_eq!(decoded[2].get(3, 4, 6), Some(&1));
    }

    #[test]
    fn data_3d_copy_without_previous_is_malformed() {
        let mut data = vec![0u8; 512];
        data.push(BIOME_COPY_PREVIOUS);
        assert!(decode_data_3d(&data).is_err());
    }

    #[test]
    fn absent_chunk_loads_as_none() {
        let store = MemoryStore::new();
        assert!(BedrockChunk::load(Pos2i::new(0, 0), Dimension::Overworld, &store)
            .unwrap()
            .is_none());
    }

    #[test]
    fn load_blocks_entities_and_ticks() {
        let store = MemoryStore::new();
        let pos = Pos2i::new(-1, 2);
        let dim = Dimension::Nether;
        store.put(&keys::chunk_key(pos, dim, keys::TAG_VERSION), &[keys::CHUNK_VERSION]).unwrap();

        let mut sub = SubChunk::new(1);
        sub.layers[0].set(2, 3, 4, BlockState::new("netherrack"));
        store.put(&keys::sub_chunk_key(pos, dim, 1), &encode_sub_chunk(&sub)).unwrap();

        let mut chest = NbtCompound::new();
        chest.put("id", "Chest");
        chest.put("x", -14);
        chest.put("y", 19);
        chest.put("z", 36);
        store.put(&keys::chunk_key(pos, dim, keys::TAG_BLOCK_ENTITY), &to_le_bytes(&chest)).unwrap();

        let mut pig = NbtCompound::new();
        pig.put("identifier", "minecraft:pig");
        pig.put("UniqueID", 42i64);
        store.put(&keys::actor_key(42), &to_le_bytes(&pig)).unwrap();
        store.put(&keys::digest_key(pos, dim), &42i64.to_le_bytes()).unwrap();

        let mut tick = NbtCompound::new();
        tick.put("time", 5i64);
        let mut ticks = NbtCompound::new();
        ticks.put("currentTick", 3i32);
        ticks.put("tickList", NbtTag::List(vec![NbtTag::Compound(tick)]));
        store.put(&keys::chunk_key(pos, dim, keys::TAG_PENDING_TICKS), &to_le_bytes(&ticks)).unwrap();

        let chunk = BedrockChunk::load(pos, dim, &store).unwrap().unwrap();
        assert_eq!(chunk.block_at(-14, 19, 36).unwrap().local_name(), "netherrack");
        assert!(chunk.block_at(-13, 19, 36).unwrap().is_air());
        assert!(chunk.block_at(-14, 100, 36).unwrap().is_air(), "missing section reads as air");
        assert!(chunk.block_at(0, 19, 36).is_none());
        assert!(chunk.block_entity_at(Pos3i::new(-14, 19, 36)).is_some());
        assert_eq!(chunk.entities.len(), 1);
        assert_eq!(chunk.pending_ticks.len(), 1);
        assert_eq!(chunk.current_tick, 3);
    }

    #[test]
    fn corrupt_sub_chunk_is_reported() {
        let store = MemoryStore::new();
        let pos = Pos2i::new(0, 0);
        let dim = Dimension::Overworld;
        store.put(&keys::chunk_key(pos, dim, keys::TAG_VERSION), &[keys::CHUNK_VERSION]).unwrap();
        store.put(&keys::sub_chunk_key(pos, dim, 0), &[2, 0, 0]).unwrap();
        let err = BedrockChunk::load(pos, dim, &store).unwrap_err();
        assert!(matches!(err, ChunkError::SubChunk { y: 0, .. }));
        assert!(err.is_malformed());
    }

    #[test]
    fn biome_lookup_uses_section() {
        let mut chunk = BedrockChunk::new(Pos2i::new(0, 0), Dimension::Overworld);
        chunk.biomes.insert(-4, BiomeStorage::filled(1));
        chunk.biomes.insert(-3, BiomeStorage::filled(2));
        assert_eq!(chunk.biome_at(0, -64, 0), Some(1));
        assert_eq!(chunk.biome_at(0, -48, 0), Some(2));
        assert_eq!(chunk.biome_at(0, 300, 0), Some(2));
    }
}
