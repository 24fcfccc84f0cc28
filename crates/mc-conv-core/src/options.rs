//! Options shared by both conversion directions.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use mc_conv_world::{Dimension, Pos2i, Pos2iSet};

/// How work is split between workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// One region per work item.
    #[default]
    Region,
    /// One chunk per work item; neighbouring chunks are never converted
    /// at the same time.
    Chunk,
}

#[derive(Debug, Clone)]
pub struct Options {
    /// Worker count; 0 means the available parallelism.
    pub concurrency: usize,
    /// Scratch space for intermediate chunk files.
    pub temp_dir: PathBuf,
    pub schedule: Schedule,
    /// Only these dimensions are converted; empty means all.
    pub dimensions: BTreeSet<Dimension>,
    /// Only these chunks are converted; `None` means all.
    pub chunks: Option<Pos2iSet>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            concurrency: 0,
            temp_dir: std::env::temp_dir(),
            schedule: Schedule::Region,
            dimensions: BTreeSet::new(),
            chunks: None,
        }
    }
}

impl Options {
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency > 0 {
            self.concurrency
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    pub fn includes_dimension(&self, dim: Dimension) -> bool {
        self.dimensions.is_empty() || self.dimensions.contains(&dim)
    }

    pub fn includes_chunk(&self, dim: Dimension, chunk: Pos2i) -> bool {
        self.includes_dimension(dim) && self.chunks.as_ref().map_or(true, |set| set.contains(chunk))
    }
}

/// Layout of a Java world directory.
#[derive(Debug, Clone)]
pub struct DataDirectory {
    root: PathBuf,
}

impl DataDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dimension_root(&self, dim: Dimension) -> PathBuf {
        match dim.java_directory() {
            "" => self.root.clone(),
            sub => self.root.join(sub),
        }
    }

    pub fn region_dir(&self, dim: Dimension) -> PathBuf {
        self.dimension_root(dim).join("region")
    }

    pub fn entities_dir(&self, dim: Dimension) -> PathBuf {
        self.dimension_root(dim).join("entities")
    }

    pub fn poi_dir(&self, dim: Dimension) -> PathBuf {
        self.dimension_root(dim).join("poi")
    }

    pub fn level_dat(&self) -> PathBuf {
        self.root.join("level.dat")
    }
}

/// Receives `(done, total)` chunk counts; returning `false` cancels.
pub trait Progress: Sync {
    fn report(&self, done: u64, total: u64) -> bool;
}

impl<F: Fn(u64, u64) -> bool + Sync> Progress for F {
    fn report(&self, done: u64, total: u64) -> bool {
        self(done, total)
    }
}

/// Progress sink that never cancels.
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&self, _done: u64, _total: u64) -> bool {
        true
    }
}
