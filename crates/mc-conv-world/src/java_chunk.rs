//! Java chunk model: block/biome sections plus the attached records.
//!
//! Reads the 1.18+ flat layout and the older `Level`-wrapped layout;
//! always writes the flat layout. Section cells are in YZX order
//! (`(y * 16 + z) * 16 + x`); biome cells are 4×4×4 in the same order.

use std::collections::BTreeMap;
use std::sync::Arc;

use mc_conv_nbt::{CompoundExt, NbtCompound, NbtTag};

use crate::biome;
use crate::block::Block;
use crate::dimension::Dimension;
use crate::error::ChunkError;
use crate::pos::{Pos2i, Pos3i};

/// Data version written into converted chunks (1.21).
pub const JAVA_DATA_VERSION: i32 = 3953;

/// Oldest data version whose packed arrays never span two longs.
const NON_SPANNING_DATA_VERSION: i32 = 2529;

/// First data version with the flat (un-wrapped) chunk layout.
pub const FLAT_LAYOUT_DATA_VERSION: i32 = 2844;

const CELLS: usize = 4096;
const BIOME_CELLS: usize = 64;

// ─── Long-array packing ─────────────────────────────────────────────────────

fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

/// Bits per block index for a palette of `len` entries (minimum 4).
pub fn block_bits(len: usize) -> u32 {
    ceil_log2(len).max(4)
}

/// Bits per biome index for a palette of `len` entries (minimum 1).
pub fn biome_bits(len: usize) -> u32 {
    ceil_log2(len).max(1)
}

/// Pack indices into longs without letting a value span two longs.
pub fn pack_longs(indices: &[u16], bits: u32) -> Vec<i64> {
    let per_long = (64 / bits) as usize;
    let mask = (1u64 << bits) - 1;
    indices
        .chunks(per_long)
        .map(|chunk| {
            let mut v = 0u64;
            for (slot, &index) in chunk.iter().enumerate() {
                v |= (u64::from(index) & mask) << (slot as u32 * bits);
            }
            v as i64
        })
        .collect()
}

/// Inverse of [`pack_longs`]. Missing longs read as index 0.
pub fn unpack_longs(data: &[i64], bits: u32, count: usize) -> Vec<u16> {
    let per_long = (64 / bits) as usize;
    let mask = (1u64 << bits) - 1;
    (0..count)
        .map(|i| {
            let word = data.get(i / per_long).copied().unwrap_or(0) as u64;
            ((word >> ((i % per_long) as u32 * bits)) & mask) as u16
        })
        .collect()
}

/// Unpack the pre-1.16 layout where values continue into the next long.
pub fn unpack_longs_spanning(data: &[i64], bits: u32, count: usize) -> Vec<u16> {
    let mask = (1u64 << bits) - 1;
    (0..count)
        .map(|i| {
            let bit = i * bits as usize;
            let (word, offset) = (bit / 64, (bit % 64) as u32);
            let lo = data.get(word).copied().unwrap_or(0) as u64 >> offset;
            let hi = if offset + bits > 64 {
                (data.get(word + 1).copied().unwrap_or(0) as u64) << (64 - offset)
            } else {
                0
            };
            ((lo | hi) & mask) as u16
        })
        .collect()
}

// ─── Section ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct JavaSection {
    pub y: i32,
    pub palette: Vec<Arc<Block>>,
    pub indices: Box<[u16; CELLS]>,
    pub biome_palette: Vec<String>,
    pub biomes: [u8; BIOME_CELLS],
}

impl JavaSection {
    pub fn new(y: i32, fill: Arc<Block>, biome: &str) -> Self {
        Self {
            y,
            palette: vec![fill],
            indices: Box::new([0; CELLS]),
            biome_palette: vec![biome.to_string()],
            biomes: [0; BIOME_CELLS],
        }
    }

    pub fn index(x: usize, y: usize, z: usize) -> usize {
        (y * 16 + z) * 16 + x
    }

    pub fn block(&self, x: usize, y: usize, z: usize) -> Option<&Arc<Block>> {
        let p = self.indices[Self::index(x, y, z)];
        self.palette.get(p as usize)
    }

    pub fn set_block(&mut self, x: usize, y: usize, z: usize, block: Arc<Block>) {
        let p = match self.palette.iter().position(|b| Arc::ptr_eq(b, &block) || **b == *block) {
            Some(p) => p as u16,
            None => {
                self.palette.push(block);
                (self.palette.len() - 1) as u16
            }
        };
        self.indices[Self::index(x, y, z)] = p;
    }

    /// Biome of the 4×4×4 cell containing the local block position.
    pub fn biome(&self, x: usize, y: usize, z: usize) -> Option<&str> {
        let i = ((y / 4) * 4 + z / 4) * 4 + x / 4;
        self.biome_palette.get(self.biomes[i] as usize).map(String::as_str)
    }

    /// Set the biome of a 4×4×4 cell (cell coordinates 0..4).
    pub fn set_biome_cell(&mut self, cx: usize, cy: usize, cz: usize, name: &str) {
        let p = match self.biome_palette.iter().position(|b| b == name) {
            Some(p) => p,
            None => {
                self.biome_palette.push(name.to_string());
                self.biome_palette.len() - 1
            }
        };
        self.biomes[(cy * 4 + cz) * 4 + cx] = p as u8;
    }

    pub fn is_all_air(&self) -> bool {
        self.indices
            .iter()
            .all(|&i| self.palette.get(i as usize).is_some_and(|b| b.is_air()))
    }

    /// Palette restricted to used entries, merged by value, with remapped
    /// indices. Entry order follows first use in the old palette.
    fn compacted(&self) -> (Vec<Arc<Block>>, Vec<u16>) {
        let mut used = vec![false; self.palette.len()];
        for &i in self.indices.iter() {
            if let Some(u) = used.get_mut(i as usize) {
                *u = true;
            }
        }
        let mut palette: Vec<Arc<Block>> = Vec::new();
        let mut remap = vec![0u16; self.palette.len()];
        for (old, block) in self.palette.iter().enumerate() {
            if !used[old] {
                continue;
            }
            remap[old] = match palette.iter().position(|b| **b == **block) {
                Some(p) => p as u16,
                None => {
                    palette.push(Arc::clone(block));
                    (palette.len() - 1) as u16
                }
            };
        }
        if palette.is_empty() {
            palette.push(Arc::new(Block::air()));
        }
        let indices = self
            .indices
            .iter()
            .map(|&i| remap.get(i as usize).copied().unwrap_or(0))
            .collect();
        (palette, indices)
    }

    pub fn to_nbt(&self) -> NbtCompound {
        let mut c = NbtCompound::new();
        c.put("Y", self.y as i8);

        let (palette, indices) = self.compacted();
        let mut states = NbtCompound::new();
        if palette.len() > 1 {
            states.put("data", NbtTag::LongArray(pack_longs(&indices, block_bits(palette.len()))));
        }
        states.put(
            "palette",
            NbtTag::List(palette.iter().map(|b| NbtTag::Compound(b.to_nbt())).collect()),
        );
        c.put("block_states", states);

        let mut used = [false; 256];
        for &b in &self.biomes {
            used[b as usize] = true;
        }
        let mut biome_palette = Vec::new();
        let mut remap = [0u16; 256];
        for (old, name) in self.biome_palette.iter().enumerate().take(256) {
            if used[old] {
                remap[old] = biome_palette.len() as u16;
                biome_palette.push(name.clone());
            }
        }
        let biome_indices: Vec<u16> = self.biomes.iter().map(|&b| remap[b as usize]).collect();
        let mut biomes = NbtCompound::new();
        if biome_palette.len() > 1 {
            biomes.put(
                "data",
                NbtTag::LongArray(pack_longs(&biome_indices, biome_bits(biome_palette.len()))),
            );
        }
        biomes.put(
            "palette",
            NbtTag::List(biome_palette.into_iter().map(NbtTag::String).collect()),
        );
        c.put("biomes", biomes);
        c
    }

    fn parse_palette(list: &[NbtTag]) -> Result<Vec<Arc<Block>>, ChunkError> {
        list.iter()
            .map(|t| {
                t.as_compound()
                    .and_then(Block::from_nbt)
                    .map(Arc::new)
                    .ok_or_else(|| ChunkError::Malformed("invalid block palette entry".into()))
            })
            .collect()
    }

    fn fill_indices(&mut self, data: Option<&[i64]>, spanning: bool) {
        let Some(data) = data else { return };
        let bits = block_bits(self.palette.len());
        let values = if spanning {
            unpack_longs_spanning(data, bits, CELLS)
        } else {
            unpack_longs(data, bits, CELLS)
        };
        self.indices.copy_from_slice(&values);
    }

    fn from_flat_nbt(c: &NbtCompound) -> Result<Self, ChunkError> {
        let y = i32::from(c.get_byte("Y").ok_or(ChunkError::MissingField("Y"))?);
        let mut section = Self::new(y, Arc::new(Block::air()), "minecraft:plains");

        if let Some(states) = c.get_compound("block_states") {
            let palette = states.get_list("palette").ok_or(ChunkError::MissingField("palette"))?;
            section.palette = Self::parse_palette(palette)?;
            if section.palette.is_empty() {
                section.palette.push(Arc::new(Block::air()));
            }
            section.fill_indices(states.get_long_array("data"), false);
        }

        if let Some(biomes) = c.get_compound("biomes") {
            let names: Vec<String> = biomes
                .get_list("palette")
                .unwrap_or_default()
                .iter()
                .filter_map(|t| t.as_string().map(str::to_string))
                .collect();
            if !names.is_empty() {
                if let Some(data) = biomes.get_long_array("data") {
                    let values = unpack_longs(data, biome_bits(names.len()), BIOME_CELLS);
                    for (dst, v) in section.biomes.iter_mut().zip(values) {
                        *dst = v as u8;
                    }
                }
                section.biome_palette = names;
            }
        }
        Ok(section)
    }
}

// ─── Chunk ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct JavaChunk {
    pub pos: Pos2i,
    pub data_version: i32,
    pub status: String,
    pub sections: BTreeMap<i32, JavaSection>,
    pub block_entities: BTreeMap<Pos3i, NbtCompound>,
    /// Entities embedded in legacy chunks; newer worlds keep them in
    /// separate entity region files.
    pub entities: Vec<NbtCompound>,
    pub block_ticks: Vec<NbtCompound>,
    pub fluid_ticks: Vec<NbtCompound>,
    /// Structure starts keyed by structure id.
    pub structure_starts: NbtCompound,
    pub last_update: i64,
    pub inhabited_time: i64,
}

impl JavaChunk {
    /// An all-air chunk covering the dimension's full Java height.
    pub fn new(pos: Pos2i, dim: Dimension) -> Self {
        let air = Arc::new(Block::air());
        let sections = dim
            .java_sections()
            .map(|y| (y, JavaSection::new(y, Arc::clone(&air), dim.default_biome())))
            .collect();
        Self {
            pos,
            data_version: JAVA_DATA_VERSION,
            status: "minecraft:full".to_string(),
            sections,
            block_entities: BTreeMap::new(),
            entities: Vec::new(),
            block_ticks: Vec::new(),
            fluid_ticks: Vec::new(),
            structure_starts: NbtCompound::new(),
            last_update: 0,
            inhabited_time: 0,
        }
    }

    fn local(&self, x: i32, z: i32) -> Option<(usize, usize)> {
        let lx = x - self.pos.x * 16;
        let lz = z - self.pos.z * 16;
        ((0..16).contains(&lx) && (0..16).contains(&lz)).then_some((lx as usize, lz as usize))
    }

    /// Block at world coordinates; `None` outside this chunk.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> Option<&Arc<Block>> {
        let (lx, lz) = self.local(x, z)?;
        let section = self.sections.get(&y.div_euclid(16))?;
        section.block(lx, y.rem_euclid(16) as usize, lz)
    }

    /// Set a block at world coordinates; ignored outside the chunk's sections.
    pub fn set_block_at(&mut self, x: i32, y: i32, z: i32, block: Arc<Block>) {
        let Some((lx, lz)) = self.local(x, z) else {
            return;
        };
        if let Some(section) = self.sections.get_mut(&y.div_euclid(16)) {
            section.set_block(lx, y.rem_euclid(16) as usize, lz, block);
        }
    }

    pub fn biome_at(&self, x: i32, y: i32, z: i32) -> Option<&str> {
        let (lx, lz) = self.local(x, z)?;
        let section = self.sections.get(&y.div_euclid(16))?;
        section.biome(lx, y.rem_euclid(16) as usize, lz)
    }

    pub fn block_entity_at(&self, pos: Pos3i) -> Option<&NbtCompound> {
        self.block_entities.get(&pos)
    }

    pub fn min_section_y(&self) -> i32 {
        self.sections.keys().next().copied().unwrap_or(0)
    }

    /// Parse either chunk layout.
    pub fn from_nbt(root: &NbtCompound, dim: Dimension) -> Result<Self, ChunkError> {
        let data_version = root.get_int("DataVersion").unwrap_or(0);
        match root.get_compound("Level") {
            Some(level) => Self::from_legacy(level, data_version, dim),
            None => Self::from_flat(root, data_version, dim),
        }
    }

    fn from_flat(root: &NbtCompound, data_version: i32, dim: Dimension) -> Result<Self, ChunkError> {
        let x = root.get_int("xPos").ok_or(ChunkError::MissingField("xPos"))?;
        let z = root.get_int("zPos").ok_or(ChunkError::MissingField("zPos"))?;
        let mut chunk = Self::new(Pos2i::new(x, z), dim);
        chunk.data_version = data_version;
        chunk.read_common(root, "block_entities", "block_ticks", "fluid_ticks");

        for tag in root.get_list("sections").unwrap_or_default() {
            let Some(c) = tag.as_compound() else { continue };
            let section = JavaSection::from_flat_nbt(c)?;
            if c.contains_key("block_states") {
                chunk.sections.insert(section.y, section);
            }
        }
        if let Some(starts) = root
            .get_compound("structures")
            .and_then(|s| s.get_compound("starts"))
        {
            chunk.structure_starts = starts.clone();
        }
        Ok(chunk)
    }

    fn from_legacy(level: &NbtCompound, data_version: i32, dim: Dimension) -> Result<Self, ChunkError> {
        let x = level.get_int("xPos").ok_or(ChunkError::MissingField("xPos"))?;
        let z = level.get_int("zPos").ok_or(ChunkError::MissingField("zPos"))?;
        let mut chunk = Self::new(Pos2i::new(x, z), dim);
        chunk.data_version = data_version;
        chunk.read_common(level, "TileEntities", "TileTicks", "LiquidTicks");
        let spanning = data_version < NON_SPANNING_DATA_VERSION;

        for tag in level.get_list("Sections").unwrap_or_default() {
            let Some(c) = tag.as_compound() else { continue };
            if c.contains_key("Blocks") {
                return Err(ChunkError::Malformed("pre-flattening chunk".into()));
            }
            let Some(palette) = c.get_list("Palette") else { continue };
            let y = i32::from(c.get_byte("Y").ok_or(ChunkError::MissingField("Y"))?);
            let mut section = JavaSection::new(y, Arc::new(Block::air()), dim.default_biome());
            section.palette = JavaSection::parse_palette(palette)?;
            if section.palette.is_empty() {
                continue;
            }
            section.fill_indices(c.get_long_array("BlockStates"), spanning);
            chunk.sections.insert(y, section);
        }

        if let Some(ids) = level.get_int_array("Biomes") {
            chunk.apply_legacy_biomes(ids);
        }
        chunk.entities = compounds(level.get_list("Entities"));
        if let Some(starts) = level
            .get_compound("Structures")
            .and_then(|s| s.get_compound("Starts"))
        {
            chunk.structure_starts = starts.clone();
        }
        Ok(chunk)
    }

    fn read_common(&mut self, c: &NbtCompound, block_entities: &str, block_ticks: &str, fluid_ticks: &str) {
        for be in compounds(c.get_list(block_entities)) {
            let pos = (be.get_int("x"), be.get_int("y"), be.get_int("z"));
            if let (Some(x), Some(y), Some(z)) = pos {
                self.block_entities.insert(Pos3i::new(x, y, z), be);
            }
        }
        self.block_ticks = compounds(c.get_list(block_ticks));
        self.fluid_ticks = compounds(c.get_list(fluid_ticks));
        self.status = c.get_str("Status").unwrap_or("minecraft:full").to_string();
        self.last_update = c.get_long("LastUpdate").unwrap_or(0);
        self.inhabited_time = c.get_long("InhabitedTime").unwrap_or(0);
    }

    /// 1024 entries are 4×4×4 cells over y 0..256; 256 entries are the
    /// older per-column layout.
    fn apply_legacy_biomes(&mut self, ids: &[i32]) {
        let name_of = |id: i32| biome::java_name_for_legacy_id(id).unwrap_or_else(|| "minecraft:plains".into());
        for section in self.sections.values_mut() {
            for cy in 0..4 {
                for cz in 0..4 {
                    for cx in 0..4 {
                        let id = match ids.len() {
                            1024 => {
                                let y4 = section.y * 4 + cy as i32;
                                if !(0..64).contains(&y4) {
                                    continue;
                                }
                                ids[(y4 as usize * 4 + cz) * 4 + cx]
                            }
                            256 => ids[(cz * 4) * 16 + cx * 4],
                            _ => return,
                        };
                        section.set_biome_cell(cx, cy, cz, &name_of(id));
                    }
                }
            }
        }
    }

    /// Serialize in the flat 1.18+ layout.
    pub fn to_nbt(&self) -> NbtCompound {
        let mut root = NbtCompound::new();
        root.put("DataVersion", JAVA_DATA_VERSION);
        root.put("xPos", self.pos.x);
        root.put("zPos", self.pos.z);
        root.put("yPos", self.min_section_y());
        root.put("Status", "minecraft:full");
        root.put("LastUpdate", self.last_update);
        root.put("InhabitedTime", self.inhabited_time);
        root.put("isLightOn", false);
        root.put(
            "sections",
            NbtTag::List(self.sections.values().map(|s| NbtTag::Compound(s.to_nbt())).collect()),
        );
        root.put(
            "block_entities",
            NbtTag::List(
                self.block_entities
                    .iter()
                    .map(|(pos, be)| {
                        let mut be = be.clone();
                        be.put("x", pos.x);
                        be.put("y", pos.y);
                        be.put("z", pos.z);
                        NbtTag::Compound(be)
                    })
                    .collect(),
            ),
        );
        root.put("block_ticks", compound_list(&self.block_ticks));
        root.put("fluid_ticks", compound_list(&self.fluid_ticks));
        let mut structures = NbtCompound::new();
        structures.put("starts", self.structure_starts.clone());
        structures.put("References", NbtCompound::new());
        root.put("structures", structures);
        root
    }
}

fn compounds(list: Option<&[NbtTag]>) -> Vec<NbtCompound> {
    list.unwrap_or_default()
        .iter()
        .filter_map(|t| t.as_compound().cloned())
        .collect()
}

fn compound_list(items: &[NbtCompound]) -> NbtTag {
    NbtTag::List(items.iter().cloned().map(NbtTag::Compound).collect())
}

// ─── Entity chunks ──────────────────────────────────────────────────────────

/// Root record of an `entities/` region chunk.
pub fn entity_chunk_to_nbt(pos: Pos2i, entities: &[NbtCompound]) -> NbtCompound {
    let mut root = NbtCompound::new();
    root.put("DataVersion", JAVA_DATA_VERSION);
    root.insert("Position".into(), NbtTag::IntArray(vec![pos.x, pos.z]));
    root.put("Entities", compound_list(entities));
    root
}

pub fn entities_from_nbt(root: &NbtCompound) -> Vec<NbtCompound> {
    compounds(root.get_list("Entities"))
}
