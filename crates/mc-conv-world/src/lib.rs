//! World-format primitives shared by both conversion directions.

pub mod bedrock_block;
pub mod bedrock_chunk;
pub mod biome;
pub mod block;
pub mod dimension;
pub mod error;
pub mod java_chunk;
pub mod keys;
pub mod pos;
pub mod pos2i_set;
pub mod region;
pub mod store;
pub mod sub_chunk;
pub mod volume;

pub use bedrock_block::BlockState;
pub use bedrock_chunk::BedrockChunk;
pub use block::Block;
pub use dimension::Dimension;
pub use error::ChunkError;
pub use java_chunk::{JavaChunk, JavaSection};
pub use pos::{Facing4, Facing6, Pos2i, Pos3i};
pub use pos2i_set::Pos2iSet;
pub use store::{KvStore, LevelDbStore, MemoryStore, StoreError};
pub use sub_chunk::{BlockStorage, SubChunk};
pub use volume::Volume;
