//! Conversion engine between Java region worlds and Bedrock LevelDB worlds.
//!
//! [`to_java`] reads a Bedrock key-value store and writes region files;
//! [`to_bedrock`] does the reverse. Both run chunk work in parallel over
//! [`parallel::Parallel`] and report errors as [`ConvertError`] chains.

pub mod block_map;
pub mod chunk_cache;
pub mod error;
pub mod level;
pub mod options;
pub mod parallel;
pub mod to_bedrock;
pub mod to_java;

pub use error::{ConvertError, ErrorKind, Result};
pub use options::{DataDirectory, NoProgress, Options, Progress, Schedule};
