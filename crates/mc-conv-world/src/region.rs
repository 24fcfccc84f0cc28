//! Anvil region files (`r.X.Z.mca`): 32×32 chunks behind a 4 KiB
//! location table and a 4 KiB timestamp table.
//!
//! Each chunk occupies whole 4 KiB sectors: `[len:u32_be][compression:u8]`
//! then `len - 1` bytes of compressed big-endian NBT.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use mc_conv_nbt::{read_nbt_be, to_be_bytes, NbtCompound, NbtError};
use thiserror::Error;

use crate::pos::Pos2i;

const SECTOR: usize = 4096;
const HEADER: usize = 2 * SECTOR;

const COMPRESSION_GZIP: u8 = 1;
const COMPRESSION_ZLIB: u8 = 2;
const COMPRESSION_NONE: u8 = 3;

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("NBT: {0}")]
    Nbt(#[from] NbtError),
    #[error("region header truncated")]
    TruncatedHeader,
    #[error("chunk {0} points outside the file")]
    ChunkOutOfBounds(Pos2i),
    #[error("chunk {chunk} uses unsupported compression {scheme}")]
    UnsupportedCompression { chunk: Pos2i, scheme: u8 },
    #[error("chunk {0} is too large for a region file")]
    ChunkTooLarge(Pos2i),
}

pub fn region_file_name(region: Pos2i) -> String {
    format!("r.{}.{}.mca", region.x, region.z)
}

/// Parse `r.X.Z.mca`.
pub fn parse_region_file_name(name: &str) -> Option<Pos2i> {
    let rest = name.strip_prefix("r.")?.strip_suffix(".mca")?;
    let (x, z) = rest.split_once('.')?;
    Some(Pos2i::new(x.parse().ok()?, z.parse().ok()?))
}

fn slot(chunk: Pos2i) -> usize {
    (chunk.x.rem_euclid(32) + chunk.z.rem_euclid(32) * 32) as usize
}

/// A region file held in memory for reading.
pub struct RegionFile {
    region: Pos2i,
    data: Vec<u8>,
}

impl RegionFile {
    pub fn open(path: &Path, region: Pos2i) -> Result<Self, RegionError> {
        Self::from_bytes(std::fs::read(path)?, region)
    }

    pub fn from_bytes(data: Vec<u8>, region: Pos2i) -> Result<Self, RegionError> {
        // Zero-length files are what the game leaves for empty regions.
        if !data.is_empty() && data.len() < HEADER {
            return Err(RegionError::TruncatedHeader);
        }
        Ok(Self { region, data })
    }

    /// Chunks present in the file at `path`, reading only its header.
    pub fn chunk_positions(path: &Path, region: Pos2i) -> Result<Vec<Pos2i>, RegionError> {
        let mut header = Vec::with_capacity(HEADER);
        std::fs::File::open(path)?.take(HEADER as u64).read_to_end(&mut header)?;
        Ok(Self::from_bytes(header, region)?.chunks())
    }

    pub fn region(&self) -> Pos2i {
        self.region
    }

    fn location(&self, index: usize) -> Option<(usize, usize)> {
        let entry = self.data.get(index * 4..index * 4 + 4)?;
        let offset = (usize::from(entry[0]) << 16) | (usize::from(entry[1]) << 8) | usize::from(entry[2]);
        let sectors = usize::from(entry[3]);
        (offset >= 2 && sectors > 0).then_some((offset * SECTOR, sectors * SECTOR))
    }

    /// Absolute coordinates of every chunk present, in slot order.
    pub fn chunks(&self) -> Vec<Pos2i> {
        (0..1024)
            .filter(|&i| self.location(i).is_some())
            .map(|i| {
                Pos2i::new(
                    self.region.x * 32 + (i % 32) as i32,
                    self.region.z * 32 + (i / 32) as i32,
                )
            })
            .collect()
    }

    /// Read and decompress one chunk; `None` if the slot is empty.
    pub fn read_chunk(&self, chunk: Pos2i) -> Result<Option<NbtCompound>, RegionError> {
        let Some((start, _)) = self.location(slot(chunk)) else {
            return Ok(None);
        };
        let head = self
            .data
            .get(start..start + 5)
            .ok_or(RegionError::ChunkOutOfBounds(chunk))?;
        let len = u32::from_be_bytes([head[0], head[1], head[2], head[3]]) as usize;
        let scheme = head[4];
        let body = self
            .data
            .get(start + 5..(start + 4 + len).max(start + 5))
            .ok_or(RegionError::ChunkOutOfBounds(chunk))?;

        let raw = match scheme {
            COMPRESSION_GZIP => {
                let mut out = Vec::new();
                GzDecoder::new(body).read_to_end(&mut out)?;
                out
            }
            COMPRESSION_ZLIB => {
                let mut out = Vec::new();
                ZlibDecoder::new(body).read_to_end(&mut out)?;
                out
            }
            COMPRESSION_NONE => body.to_vec(),
            other => {
                return Err(RegionError::UnsupportedCompression {
                    chunk,
                    scheme: other,
                })
            }
        };
        Ok(Some(read_nbt_be(&mut raw.as_slice())?.compound))
    }
}

/// Accumulates chunks and writes a region file in slot order with zero
/// timestamps, so identical input gives identical bytes.
pub struct RegionWriter {
    region: Pos2i,
    chunks: BTreeMap<usize, Vec<u8>>,
}

impl RegionWriter {
    pub fn new(region: Pos2i) -> Self {
        Self {
            region,
            chunks: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Compress and store a chunk; replaces an earlier one at the same slot.
    pub fn put(&mut self, chunk: Pos2i, nbt: &NbtCompound) -> Result<(), RegionError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&to_be_bytes(nbt))?;
        let compressed = encoder.finish()?;
        if (compressed.len() + 5).div_ceil(SECTOR) > 255 {
            return Err(RegionError::ChunkTooLarge(chunk));
        }
        self.chunks.insert(slot(chunk), compressed);
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; HEADER];
        let mut sector = 2usize;
        for (&index, payload) in &self.chunks {
            let sectors = (payload.len() + 5).div_ceil(SECTOR);
            out[index * 4] = (sector >> 16) as u8;
            out[index * 4 + 1] = (sector >> 8) as u8;
            out[index * 4 + 2] = sector as u8;
            out[index * 4 + 3] = sectors as u8;

            out.extend_from_slice(&((payload.len() + 1) as u32).to_be_bytes());
            out.push(COMPRESSION_ZLIB);
            out.extend_from_slice(payload);
            out.resize((sector + sectors) * SECTOR, 0);
            sector += sectors;
        }
        out
    }

    /// Write to `dir/r.X.Z.mca`. Nothing is written for an empty region.
    pub fn write_to(&self, dir: &Path) -> Result<(), RegionError> {
        if self.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join(region_file_name(self.region)), self.to_bytes())?;
        Ok(())
    }
}
