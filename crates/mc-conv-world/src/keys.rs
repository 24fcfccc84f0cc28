//! Key layout of the Bedrock key-value store.
//!
//! Chunk records: `[x:i32_le][z:i32_le]([dim:i32_le] if dim != 0)[tag]`,
//! followed by a signed y byte for sub-chunk records.

use crate::dimension::Dimension;
use crate::pos::Pos2i;

// ─── Chunk record tags ──────────────────────────────────────────────────────

pub const TAG_DATA_3D: u8 = 0x2B;
pub const TAG_VERSION: u8 = 0x2C;
pub const TAG_DATA_2D: u8 = 0x2D;
pub const TAG_SUB_CHUNK: u8 = 0x2F;
pub const TAG_BLOCK_ENTITY: u8 = 0x31;
pub const TAG_ENTITY: u8 = 0x32;
pub const TAG_PENDING_TICKS: u8 = 0x33;
pub const TAG_FINALIZED_STATE: u8 = 0x36;
pub const TAG_STRUCTURE_BOUNDS: u8 = 0x39;
pub const TAG_LEGACY_VERSION: u8 = 0x76;

/// Chunk format version written to [`TAG_VERSION`].
pub const CHUNK_VERSION: u8 = 40;

/// Finalized-state value for fully generated chunks.
pub const FINALIZED_DONE: i32 = 2;

pub const LOCAL_PLAYER_KEY: &[u8] = b"~local_player";

/// Build a chunk record key.
pub fn chunk_key(pos: Pos2i, dim: Dimension, tag: u8) -> Vec<u8> {
    let id = dim.bedrock_id();
    let mut key = Vec::with_capacity(if id == 0 { 9 } else { 13 });
    key.extend_from_slice(&pos.x.to_le_bytes());
    key.extend_from_slice(&pos.z.to_le_bytes());
    if id != 0 {
        key.extend_from_slice(&id.to_le_bytes());
    }
    key.push(tag);
    key
}

pub fn sub_chunk_key(pos: Pos2i, dim: Dimension, y: i8) -> Vec<u8> {
    let mut key = chunk_key(pos, dim, TAG_SUB_CHUNK);
    key.push(y as u8);
    key
}

/// Key of the per-chunk entity digest (`digp`), listing actor ids.
pub fn digest_key(pos: Pos2i, dim: Dimension) -> Vec<u8> {
    let mut key = b"digp".to_vec();
    key.extend_from_slice(&pos.x.to_le_bytes());
    key.extend_from_slice(&pos.z.to_le_bytes());
    if dim != Dimension::Overworld {
        key.extend_from_slice(&dim.bedrock_id().to_le_bytes());
    }
    key
}

/// Key of a single actor record.
pub fn actor_key(unique_id: i64) -> Vec<u8> {
    let mut key = b"actorprefix".to_vec();
    key.extend_from_slice(&unique_id.to_le_bytes());
    key
}

/// Player record key for a non-local player.
pub fn player_key(server_id: &str) -> Vec<u8> {
    format!("player_server_{server_id}").into_bytes()
}

/// A decoded chunk record key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkKey {
    pub pos: Pos2i,
    pub dim: Dimension,
    pub tag: u8,
    /// Sub-chunk y, for [`TAG_SUB_CHUNK`] keys.
    pub y: Option<i8>,
}

/// Parse a chunk record key; other keys (digests, actors, players,
/// global records) yield `None`.
pub fn parse_chunk_key(key: &[u8]) -> Option<ChunkKey> {
    let le_i32 = |at: usize| i32::from_le_bytes([key[at], key[at + 1], key[at + 2], key[at + 3]]);
    let (dim, tag_at) = match key.len() {
        9 | 10 => (Dimension::Overworld, 8),
        13 | 14 => (Dimension::from_bedrock_id(le_i32(8))?, 12),
        _ => return None,
    };
    let tag = key[tag_at];
    let has_y = key.len() == tag_at + 2;
    if has_y != (tag == TAG_SUB_CHUNK) || !is_chunk_tag(tag) {
        return None;
    }
    Some(ChunkKey {
        pos: Pos2i::new(le_i32(0), le_i32(4)),
        dim,
        tag,
        y: has_y.then(|| key[tag_at + 1] as i8),
    })
}

fn is_chunk_tag(tag: u8) -> bool {
    (0x2B..=0x3B).contains(&tag) || tag == TAG_LEGACY_VERSION
}

/// Parse a `digp` key.
pub fn parse_digest_key(key: &[u8]) -> Option<(Pos2i, Dimension)> {
    let rest = key.strip_prefix(b"digp")?;
    let le_i32 = |at: usize| i32::from_le_bytes([rest[at], rest[at + 1], rest[at + 2], rest[at + 3]]);
    let dim = match rest.len() {
        8 => Dimension::Overworld,
        12 => Dimension::from_bedrock_id(le_i32(8))?,
        _ => return None,
    };
    Some((Pos2i::new(le_i32(0), le_i32(4)), dim))
}
