//! Conversion errors with a chain of source-location frames.
//!
//! Errors are created at the failure site with [`here!`] and gain one
//! frame per layer they pass through via [`ResultExt::wrap`].

use std::fmt;

use mc_conv_nbt::NbtError;
use mc_conv_world::region::RegionError;
use mc_conv_world::store::StoreError;
use mc_conv_world::sub_chunk::SubChunkError;
use mc_conv_world::ChunkError;
use thiserror::Error;

/// One step of the propagation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub file: &'static str,
    pub line: u32,
    pub message: Option<String>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)?;
        if let Some(m) = &self.message {
            write!(f, " ({m})")?;
        }
        Ok(())
    }
}

/// Capture the current source location as a [`Frame`].
#[macro_export]
macro_rules! here {
    () => {
        $crate::error::Frame {
            file: file!(),
            line: line!(),
            message: None,
        }
    };
    ($($arg:tt)+) => {
        $crate::error::Frame {
            file: file!(),
            line: line!(),
            message: Some(format!($($arg)+)),
        }
    };
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("NBT: {0}")]
    Nbt(#[from] NbtError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("region file: {0}")]
    Region(#[from] RegionError),
    #[error("chunk: {0}")]
    Chunk(#[from] ChunkError),
    #[error("sub-chunk: {0}")]
    SubChunk(#[from] SubChunkError),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug)]
pub struct ConvertError {
    pub kind: ErrorKind,
    pub frames: Vec<Frame>,
}

impl ConvertError {
    pub fn new(kind: impl Into<ErrorKind>, frame: Frame) -> Self {
        Self {
            kind: kind.into(),
            frames: vec![frame],
        }
    }

    pub fn invalid(message: impl Into<String>, frame: Frame) -> Self {
        Self::new(ErrorKind::Invalid(message.into()), frame)
    }

    pub fn cancelled(frame: Frame) -> Self {
        Self::new(ErrorKind::Cancelled, frame)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// A chunk whose contents could not be parsed; the converters skip
    /// those instead of aborting.
    pub fn is_malformed_chunk(&self) -> bool {
        match &self.kind {
            ErrorKind::Chunk(e) => e.is_malformed(),
            ErrorKind::Nbt(_) | ErrorKind::SubChunk(_) => true,
            ErrorKind::Region(e) => !matches!(e, RegionError::Io(_)),
            _ => false,
        }
    }

    pub fn push(mut self, frame: Frame) -> Self {
        self.frames.push(frame);
        self
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for frame in &self.frames {
            write!(f, "\n    at {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

/// Attach frames to errors as they propagate.
pub trait ResultExt<T> {
    fn wrap(self, frame: Frame) -> Result<T>;
    fn wrap_with(self, frame: impl FnOnce() -> Frame) -> Result<T>;
}

impl<T, E: Into<ErrorKind>> ResultExt<T> for std::result::Result<T, E> {
    fn wrap(self, frame: Frame) -> Result<T> {
        self.map_err(|e| ConvertError::new(e, frame))
    }

    fn wrap_with(self, frame: impl FnOnce() -> Frame) -> Result<T> {
        self.map_err(|e| ConvertError::new(e, frame()))
    }
}

/// Re-wrapping an existing chain appends a frame instead of starting over.
pub trait ChainExt<T> {
    fn chain(self, frame: Frame) -> Result<T>;
}

impl<T> ChainExt<T> for Result<T> {
    fn chain(self, frame: Frame) -> Result<T> {
        self.map_err(|e| e.push(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::here;

    fn open_missing() -> Result<Vec<u8>> {
        std::fs::read("/definitely/not/here").wrap(here!("reading input"))
    }

    fn outer() -> Result<Vec<u8>> {
        open_missing().chain(here!())
    }

    #[test]
    fn frames_accumulate_in_order() {
        let err = outer().unwrap_err();
        assert_eq!(err.frames.len(), 2);
        assert_eq!(err.frames[0].message.as_deref(), Some("reading input"));
        assert!(err.frames[0].line < err.frames[1].line);
        assert!(err.frames.iter().all(|f| f.file.ends_with("error.rs")));
        let text = err.to_string();
        assert!(text.starts_with("I/O:"));
        assert_eq!(text.matches("\n    at ").count(), 2);
    }

    #[test]
    fn cancellation_is_distinguishable() {
        let err = ConvertError::cancelled(here!());
        assert!(err.is_cancelled());
        assert!(!err.is_malformed_chunk());
    }

    #[test]
    fn malformed_chunk_classification() {
        let err = ConvertError::new(ChunkError::Malformed("x".into()), here!());
        assert!(err.is_malformed_chunk());
        let err = ConvertError::new(StoreError::Closed, here!());
        assert!(!err.is_malformed_chunk());
    }
}
