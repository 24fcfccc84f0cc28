//! Intermediate per-chunk files.
//!
//! Workers write converted terrain and entities here instead of straight
//! into region files: entity files are rewritten by the resolver after
//! every chunk is known, and regions are packed from the finished files.
//! Layout: `<temp>/mc-conv-<random>/<dimension>/{c,e}.X.Z.nbt`.

use std::fs;
use std::path::{Path, PathBuf};

use mc_conv_nbt::{read_nbt_be, to_be_bytes, CompoundExt, NbtCompound, NbtTag};
use mc_conv_world::{Dimension, Pos2i};
use tracing::{debug, warn};

use crate::error::{Result, ResultExt};
use crate::here;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Terrain,
    Entities,
}

impl Kind {
    fn prefix(self) -> char {
        match self {
            Kind::Terrain => 'c',
            Kind::Entities => 'e',
        }
    }
}

pub struct ChunkStore {
    root: PathBuf,
}

impl ChunkStore {
    /// Create an empty store in a fresh directory under `temp_dir`.
    pub fn create(temp_dir: &Path) -> Result<Self> {
        let root = temp_dir.join(format!("mc-conv-{:016x}", rand::random::<u64>()));
        for dim in Dimension::ALL {
            fs::create_dir_all(root.join(dim_dir(dim))).wrap_with(|| here!("creating {}", root.display()))?;
        }
        debug!(path = %root.display(), "created intermediate chunk store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, dim: Dimension, kind: Kind, chunk: Pos2i) -> PathBuf {
        self.root
            .join(dim_dir(dim))
            .join(format!("{}.{}.{}.nbt", kind.prefix(), chunk.x, chunk.z))
    }

    fn write(&self, path: &Path, root: &NbtCompound) -> Result<()> {
        fs::write(path, to_be_bytes(root)).wrap_with(|| here!("writing {}", path.display()))
    }

    fn read(&self, path: &Path) -> Result<Option<NbtCompound>> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).wrap(here!("reading {}", path.display())),
        };
        let root = read_nbt_be(&mut bytes.as_slice()).wrap_with(|| here!("parsing {}", path.display()))?;
        Ok(Some(root.compound))
    }

    pub fn put_terrain(&self, dim: Dimension, chunk: Pos2i, nbt: &NbtCompound) -> Result<()> {
        self.write(&self.path(dim, Kind::Terrain, chunk), nbt)
    }

    pub fn terrain(&self, dim: Dimension, chunk: Pos2i) -> Result<Option<NbtCompound>> {
        self.read(&self.path(dim, Kind::Terrain, chunk))
    }

    pub fn put_entities(&self, dim: Dimension, chunk: Pos2i, entities: Vec<NbtCompound>) -> Result<()> {
        let path = self.path(dim, Kind::Entities, chunk);
        if entities.is_empty() {
            return match fs::remove_file(&path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                    Err(e).wrap(here!("removing {}", path.display()))
                }
                _ => Ok(()),
            };
        }
        let mut root = NbtCompound::new();
        root.put("Entities", NbtTag::List(entities.into_iter().map(NbtTag::Compound).collect()));
        self.write(&path, &root)
    }

    /// Entities of a chunk; empty when the chunk has none.
    pub fn entities(&self, dim: Dimension, chunk: Pos2i) -> Result<Vec<NbtCompound>> {
        let Some(root) = self.read(&self.path(dim, Kind::Entities, chunk))? else {
            return Ok(Vec::new());
        };
        Ok(root
            .get_list("Entities")
            .unwrap_or_default()
            .iter()
            .filter_map(|t| t.as_compound().cloned())
            .collect())
    }

    /// Read-modify-write the entity list of one chunk.
    pub fn update_entities<R>(
        &self,
        dim: Dimension,
        chunk: Pos2i,
        f: impl FnOnce(&mut Vec<NbtCompound>) -> R,
    ) -> Result<R> {
        let mut entities = self.entities(dim, chunk)?;
        let out = f(&mut entities);
        self.put_entities(dim, chunk, entities)?;
        Ok(out)
    }
}

impl Drop for ChunkStore {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.root) {
            warn!(path = %self.root.display(), "could not remove intermediate chunk store: {e}");
        }
    }
}

fn dim_dir(dim: Dimension) -> &'static str {
    match dim {
        Dimension::Overworld => "overworld",
        Dimension::Nether => "nether",
        Dimension::End => "end",
    }
}
