//! Errors raised while decoding chunk records of either edition.

use thiserror::Error;

use mc_conv_nbt::NbtError;

use crate::region::RegionError;
use crate::store::StoreError;
use crate::sub_chunk::SubChunkError;

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("malformed chunk: {0}")]
    Malformed(String),
    #[error("sub-chunk {y}: {source}")]
    SubChunk {
        y: i8,
        #[source]
        source: SubChunkError,
    },
    #[error("NBT: {0}")]
    Nbt(#[from] NbtError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("region: {0}")]
    Region(#[from] RegionError),
}

impl ChunkError {
    /// `true` for errors caused by the record contents rather than I/O,
    /// which the converters skip instead of aborting on.
    pub fn is_malformed(&self) -> bool {
        match self {
            ChunkError::Store(_) => false,
            ChunkError::Region(RegionError::Io(_)) => false,
            _ => true,
        }
    }
}
