//! Palette-compressed 16×16×16 storage and the on-disk sub-chunk codec.
//!
//! Cells are indexed in XZY order: `(x * 16 + z) * 16 + y`. Indices are
//! packed LSB-first into little-endian u32 words; an index never spans
//! two words, so the tail bits of each word are padding.
//!
//! Record layout (version 9):
//! `[9][layer_count][y:i8]` then per layer
//! `[bits << 1][words: u32_le...][palette_len: i32_le][palette: LE NBT...]`.

use bytes::{Buf, BufMut};
use mc_conv_nbt::{read_nbt_le, write_nbt_le, NbtError, NbtRoot};
use thiserror::Error;

use crate::bedrock_block::BlockState;

/// Cells per section.
pub const CELLS: usize = 4096;

/// Sub-chunk format version written by the encoder.
pub const SUB_CHUNK_VERSION: u8 = 9;

#[derive(Debug, Error)]
pub enum SubChunkError {
    #[error("sub-chunk record truncated")]
    Truncated,
    #[error("unsupported sub-chunk version {0}")]
    UnsupportedVersion(u8),
    #[error("invalid bits per block: {0}")]
    InvalidBitsPerBlock(u8),
    #[error("runtime-id palette in saved sub-chunk")]
    RuntimePalette,
    #[error("negative palette length {0}")]
    NegativePaletteLength(i32),
    #[error("palette entry is not a block state")]
    InvalidPaletteEntry,
    #[error("NBT: {0}")]
    Nbt(#[from] NbtError),
}

/// Minimum bits needed to address `palette_len` entries.
///
/// Only the widths Bedrock accepts are returned: 1, 2, 3, 4, 5, 6, 8, 16.
pub fn bits_per_block(palette_len: usize) -> u8 {
    match palette_len {
        0..=2 => 1,
        3..=4 => 2,
        5..=8 => 3,
        9..=16 => 4,
        17..=32 => 5,
        33..=64 => 6,
        65..=256 => 8,
        _ => 16,
    }
}

fn is_valid_bits(bits: u8) -> bool {
    matches!(bits, 1 | 2 | 3 | 4 | 5 | 6 | 8 | 16)
}

fn word_count(bits: u8) -> usize {
    CELLS.div_ceil(32 / bits as usize)
}

/// Append packed indices to `buf` as little-endian u32 words.
pub fn pack_words(buf: &mut impl BufMut, indices: &[u16; CELLS], bits: u8) {
    let per_word = 32 / bits as usize;
    let mask = (1u32 << bits) - 1;
    for chunk in indices.chunks(per_word) {
        let mut word = 0u32;
        for (slot, &index) in chunk.iter().enumerate() {
            word |= (u32::from(index) & mask) << (bits as usize * slot);
        }
        buf.put_u32_le(word);
    }
}

/// Read packed indices written by [`pack_words`].
pub fn unpack_words(buf: &mut impl Buf, bits: u8) -> Result<Box<[u16; CELLS]>, SubChunkError> {
    let words = word_count(bits);
    if buf.remaining() < words * 4 {
        return Err(SubChunkError::Truncated);
    }
    let per_word = 32 / bits as usize;
    let mask = (1u32 << bits) - 1;
    let mut indices = Box::new([0u16; CELLS]);
    for w in 0..words {
        let word = buf.get_u32_le();
        for slot in 0..per_word {
            let i = w * per_word + slot;
            if i >= CELLS {
                break;
            }
            indices[i] = ((word >> (bits as usize * slot)) & mask) as u16;
        }
    }
    Ok(indices)
}

fn read_i32(buf: &mut impl Buf) -> Result<i32, SubChunkError> {
    if buf.remaining() < 4 {
        return Err(SubChunkError::Truncated);
    }
    Ok(buf.get_i32_le())
}

fn read_u8(buf: &mut impl Buf) -> Result<u8, SubChunkError> {
    if !buf.has_remaining() {
        return Err(SubChunkError::Truncated);
    }
    Ok(buf.get_u8())
}

// ─── Paletted storage ───────────────────────────────────────────────────────

/// A 4096-cell section holding palette indices.
///
/// Indices may point past the palette after decoding a damaged record;
/// lookups return `None` for those cells instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub struct PalettedStorage<T> {
    pub palette: Vec<T>,
    pub indices: Box<[u16; CELLS]>,
}

/// One layer of block states.
pub type BlockStorage = PalettedStorage<BlockState>;

impl<T: Clone + PartialEq> PalettedStorage<T> {
    /// Every cell set to `value`.
    pub fn filled(value: T) -> Self {
        Self {
            palette: vec![value],
            indices: Box::new([0u16; CELLS]),
        }
    }

    pub fn index(x: usize, y: usize, z: usize) -> usize {
        (x * 16 + z) * 16 + y
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&T> {
        self.get_at(Self::index(x, y, z))
    }

    pub fn get_at(&self, index: usize) -> Option<&T> {
        let p = *self.indices.get(index)?;
        self.palette.get(p as usize)
    }

    /// Set a cell, reusing an equal palette entry when one exists.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) {
        self.set_at(Self::index(x, y, z), value);
    }

    pub fn set_at(&mut self, index: usize, value: T) {
        let p = match self.palette.iter().position(|v| *v == value) {
            Some(p) => p as u16,
            None => self.push_palette(value),
        };
        self.indices[index] = p;
    }

    /// Append to the palette without looking for duplicates.
    pub fn push_palette(&mut self, value: T) -> u16 {
        self.palette.push(value);
        (self.palette.len() - 1) as u16
    }

    /// Merge equal palette entries and drop unreferenced ones. Surviving
    /// entries keep their relative order.
    pub fn resolve_duplication(&mut self) {
        let mut used = vec![false; self.palette.len()];
        for &i in self.indices.iter() {
            if let Some(u) = used.get_mut(i as usize) {
                *u = true;
            }
        }

        let mut compact: Vec<T> = Vec::new();
        let mut remap: Vec<u16> = vec![0; self.palette.len()];
        for (old, value) in self.palette.iter().enumerate() {
            if !used[old] {
                continue;
            }
            remap[old] = match compact.iter().position(|v| v == value) {
                Some(p) => p as u16,
                None => {
                    compact.push(value.clone());
                    (compact.len() - 1) as u16
                }
            };
        }

        for i in self.indices.iter_mut() {
            if let Some(&r) = remap.get(*i as usize) {
                *i = r;
            }
        }
        if compact.is_empty() {
            if let Some(first) = self.palette.first() {
                compact.push(first.clone());
            }
        }
        self.palette = compact;
    }

    /// Swap the first entry matching `pred` into palette slot 0.
    pub fn move_to_front(&mut self, pred: impl Fn(&T) -> bool) {
        let Some(found) = self.palette.iter().position(pred) else {
            return;
        };
        if found == 0 {
            return;
        }
        self.palette.swap(0, found);
        let found = found as u16;
        for i in self.indices.iter_mut() {
            if *i == 0 {
                *i = found;
            } else if *i == found {
                *i = 0;
            }
        }
    }

    /// `true` when every cell refers to the same palette entry.
    pub fn is_uniform(&self) -> bool {
        let first = self.indices[0];
        self.indices.iter().all(|&i| i == first)
    }
}

impl BlockStorage {
    /// Canonical form before encoding: duplicates merged, air at index 0.
    /// A layer with no air cell still carries an air entry in slot 0.
    pub fn normalize(&mut self) {
        self.resolve_duplication();
        if !self.palette.iter().any(BlockState::is_air) {
            self.palette.insert(0, BlockState::air());
            for i in self.indices.iter_mut() {
                *i = i.saturating_add(1);
            }
        }
        self.move_to_front(BlockState::is_air);
    }

    pub fn is_all_air(&self) -> bool {
        self.indices
            .iter()
            .all(|&i| self.palette.get(i as usize).is_some_and(BlockState::is_air))
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        let bits = bits_per_block(self.palette.len());
        buf.put_u8(bits << 1);
        pack_words(buf, &self.indices, bits);
        buf.put_i32_le(self.palette.len() as i32);
        for state in &self.palette {
            write_nbt_le(buf, &NbtRoot::unnamed(state.to_nbt()));
        }
    }

    fn decode(buf: &mut &[u8]) -> Result<Self, SubChunkError> {
        let header = read_u8(buf)?;
        if header & 1 == 1 {
            return Err(SubChunkError::RuntimePalette);
        }
        let bits = header >> 1;
        let indices = if bits == 0 {
            Box::new([0u16; CELLS])
        } else if is_valid_bits(bits) {
            unpack_words(buf, bits)?
        } else {
            return Err(SubChunkError::InvalidBitsPerBlock(bits));
        };

        let len = read_i32(buf)?;
        let len = usize::try_from(len).map_err(|_| SubChunkError::NegativePaletteLength(len))?;
        let mut palette = Vec::with_capacity(len.min(CELLS));
        for _ in 0..len {
            let root = read_nbt_le(buf)?;
            let state =
                BlockState::from_nbt(&root.compound).ok_or(SubChunkError::InvalidPaletteEntry)?;
            palette.push(state);
        }
        Ok(Self { palette, indices })
    }
}

// ─── Sub-chunk ──────────────────────────────────────────────────────────────

/// A vertical 16³ section. Layer 0 holds blocks; layer 1, when present,
/// holds the liquid sharing the cell (waterlogging).
#[derive(Debug, Clone, PartialEq)]
pub struct SubChunk {
    pub y: i8,
    pub layers: Vec<BlockStorage>,
}

impl SubChunk {
    pub fn new(y: i8) -> Self {
        Self {
            y,
            layers: vec![BlockStorage::filled(BlockState::air())],
        }
    }

    /// Block in layer 0.
    pub fn block(&self, x: usize, y: usize, z: usize) -> Option<&BlockState> {
        self.layers.first()?.get(x, y, z)
    }

    /// Block in the liquid layer, if the section has one.
    pub fn liquid(&self, x: usize, y: usize, z: usize) -> Option<&BlockState> {
        self.layers.get(1)?.get(x, y, z)
    }

    /// Normalize every layer and drop a trailing liquid layer that is all air.
    pub fn normalize(&mut self) {
        for layer in &mut self.layers {
            layer.normalize();
        }
        while self.layers.len() > 1 && self.layers.last().is_some_and(BlockStorage::is_all_air) {
            self.layers.pop();
        }
    }
}

/// Encode a sub-chunk record (version 9).
pub fn encode_sub_chunk(sub: &SubChunk) -> Vec<u8> {
    let mut buf = Vec::with_capacity(3 + sub.layers.len() * 600);
    buf.put_u8(SUB_CHUNK_VERSION);
    buf.put_u8(sub.layers.len() as u8);
    buf.put_i8(sub.y);
    for layer in &sub.layers {
        layer.encode(&mut buf);
    }
    buf
}

/// Decode a sub-chunk record. Versions 1, 8 and 9 are understood; `y`
/// is used for versions that do not store their own index.
pub fn decode_sub_chunk(data: &[u8], y: i8) -> Result<SubChunk, SubChunkError> {
    let mut buf = data;
    let version = read_u8(&mut buf)?;
    let (count, y) = match version {
        1 => (1, y),
        8 => (read_u8(&mut buf)?, y),
        9 => {
            let count = read_u8(&mut buf)?;
            (count, read_u8(&mut buf)? as i8)
        }
        other => return Err(SubChunkError::UnsupportedVersion(other)),
    };
    let mut layers = Vec::with_capacity(count as usize);
    for _ in 0..count {
        layers.push(BlockStorage::decode(&mut buf)?);
    }
    Ok(SubChunk { y, layers })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stone() -> BlockState {
        BlockState::new("stone")
    }

    #[test]
    fn xzy_index_order() {
        assert_eq!(BlockStorage::index(0, 1, 0), 1);
        assert_eq!(BlockStorage::index(0, 0, 1), 16);
        assert_eq!(BlockStorage::index(1, 0, 0), 256);
        assert_eq!(BlockStorage::index(15, 15, 15), 4095);
    }

    #[test]
    fn bits_table() {
        assert_eq!(bits_per_block(1), 1);
        assert_eq!(bits_per_block(2), 1);
        assert_eq!(bits_per_block(3), 2);
        assert_eq!(bits_per_block(9), 4);
        assert_eq!(bits_per_block(33), 6);
        assert_eq!(bits_per_block(65), 8);
        assert_eq!(bits_per_block(257), 16);
    }

    #[test]
    fn words_do_not_span() {
        assert_eq!(word_count(3), 410);
        assert_eq!(word_count(5), 683);
        assert_eq!(word_count(6), 820);
        let mut indices = Box::new([0u16; CELLS]);
        for (i, v) in indices.iter_mut().enumerate() {
            *v = (i % 5) as u16;
        }
        let mut buf = Vec::new();
        pack_words(&mut buf, &indices, 3);
        assert_eq!(buf.len(), 410 * 4);
        let word0 = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        assert_eq!(word0 >> 30, 0, "two padding bits stay clear");
        assert_eq!(unpack_words(&mut &buf[..], 3).unwrap(), indices);
    }

    #[test]
    fn header_has_persistence_bit_clear() {
        let mut sub = SubChunk::new(-2);
        sub.layers[0].set(1, 2, 3, stone());
        let data = encode_sub_chunk(&sub);
        assert_eq!(&data[..3], &[9, 1, 0xFE]);
        assert_eq!(data[3], 1 << 1);
    }

    #[test]
    fn roundtrip_two_layers() {
        let mut sub = SubChunk::new(5);
        sub.layers[0].set(0, 0, 0, stone());
        sub.layers[0].set(15, 15, 15, BlockState::new("oak_fence"));
        let mut water = BlockStorage::filled(BlockState::air());
        water.set(15, 15, 15, BlockState::new("water").with("liquid_depth", 0));
        sub.layers.push(water);
        sub.normalize();

        let decoded = decode_sub_chunk(&encode_sub_chunk(&sub), 0).unwrap();
        assert_eq!(decoded.y, 5);
        assert_eq!(decoded.layers.len(), 2);
        assert_eq!(decoded.block(0, 0, 0), Some(&stone()));
        assert_eq!(decoded.block(1, 0, 0).map(|b| b.is_air()), Some(true));
        assert_eq!(decoded.liquid(15, 15, 15).map(|b| b.local_name()), Some("water"));
        assert!(decoded.layers[0].palette[0].is_air());
    }

    #[test]
    fn air_moves_to_index_zero() {
        let mut storage = BlockStorage::filled(stone());
        storage.set(3, 3, 3, BlockState::air());
        storage.normalize();
        assert!(storage.palette[0].is_air());
        assert_eq!(storage.get(3, 3, 3), Some(&BlockState::air()));
        assert_eq!(storage.get(0, 0, 0), Some(&stone()));
    }

    #[test]
    fn solid_layer_keeps_air_in_slot_zero() {
        let mut sub = SubChunk::new(-4);
        sub.layers[0] = BlockStorage::filled(stone());
        sub.normalize();
        assert_eq!(sub.layers[0].palette, vec![BlockState::air(), stone()]);
        assert_eq!(sub.block(7, 7, 7), Some(&stone()));

        let decoded = decode_sub_chunk(&encode_sub_chunk(&sub), 0).unwrap();
        assert!(decoded.layers[0].palette[0].is_air());
        assert!(decoded.layers[0].indices.iter().all(|&i| i == 1));
        assert_eq!(decoded.block(0, 0, 0), Some(&stone()));
    }

    #[test]
    fn flooded_liquid_layer_is_air_then_water() {
        let water = BlockState::new("water").with("liquid_depth", 0);
        let mut sub = SubChunk::new(0);
        sub.layers[0] = BlockStorage::filled(BlockState::new("seagrass"));
        sub.layers.push(BlockStorage::filled(water.clone()));
        sub.normalize();
        assert_eq!(sub.layers.len(), 2);
        assert_eq!(sub.layers[1].palette, vec![BlockState::air(), water.clone()]);

        let decoded = decode_sub_chunk(&encode_sub_chunk(&sub), 0).unwrap();
        assert_eq!(decoded.layers[1].palette, vec![BlockState::air(), water.clone()]);
        assert_eq!(decoded.liquid(15, 0, 15), Some(&water));
    }

    #[test]
    fn duplicates_and_unused_entries_collapse() {
        let mut storage = BlockStorage::filled(BlockState::air());
        let a = storage.push_palette(stone());
        let b = storage.push_palette(stone());
        storage.push_palette(BlockState::new("dirt"));
        storage.indices[0] = a;
        storage.indices[1] = b;
        storage.resolve_duplication();
        assert_eq!(storage.palette.len(), 2);
        assert_eq!(storage.indices[0], storage.indices[1]);
        assert_eq!(bits_per_block(storage.palette.len()), 1);
    }

    #[test]
    fn empty_liquid_layer_is_dropped() {
        let mut sub = SubChunk::new(0);
        sub.layers.push(BlockStorage::filled(BlockState::air()));
        sub.normalize();
        assert_eq!(sub.layers.len(), 1);
    }

    #[test]
    fn version_8_uses_supplied_y() {
        let mut sub = SubChunk::new(0);
        sub.layers[0].set(4, 4, 4, stone());
        let mut data = encode_sub_chunk(&sub);
        data.remove(2);
        data[0] = 8;
        let decoded = decode_sub_chunk(&data, 7).unwrap();
        assert_eq!(decoded.y, 7);
        assert_eq!(decoded.block(4, 4, 4), Some(&stone()));
    }

    #[test]
    fn zero_bits_layer_is_uniform() {
        let mut data = vec![9, 1, 3, 0];
        data.extend_from_slice(&1i32.to_le_bytes());
        write_nbt_le(&mut data, &NbtRoot::unnamed(stone().to_nbt()));
        let decoded = decode_sub_chunk(&data, 0).unwrap();
        assert_eq!(decoded.block(9, 9, 9), Some(&stone()));
    }

    #[test]
    fn out_of_range_index_reads_as_none() {
        let mut storage = BlockStorage::filled(stone());
        storage.indices[7] = 9;
        assert_eq!(storage.get_at(7), None);
        assert_eq!(storage.get_at(8), Some(&stone()));
    }

    #[test]
    fn malformed_records() {
        assert!(matches!(decode_sub_chunk(&[], 0), Err(SubChunkError::Truncated)));
        assert!(matches!(
            decode_sub_chunk(&[7, 1], 0),
            Err(SubChunkError::UnsupportedVersion(7))
        ));
        assert!(matches!(
            decode_sub_chunk(&[9, 1, 0, 7 << 1], 0),
            Err(SubChunkError::InvalidBitsPerBlock(7))
        ));
        assert!(matches!(
            decode_sub_chunk(&[9, 1, 0, 1], 0),
            Err(SubChunkError::RuntimePalette)
        ));
        let mut truncated = encode_sub_chunk(&SubChunk::new(0));
        truncated.truncate(40);
        assert!(decode_sub_chunk(&truncated, 0).is_err());
    }
}
