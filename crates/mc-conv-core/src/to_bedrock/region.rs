//! Per-region conversion.

use std::collections::BTreeMap;
use std::path::PathBuf;

use mc_conv_nbt::NbtCompound;
use mc_conv_world::java_chunk::entities_from_nbt;
use mc_conv_world::region::RegionFile;
use mc_conv_world::{ChunkError, Dimension, JavaChunk, KvStore, Pos2i, Pos2iSet};
use tracing::{debug, warn};

use super::chunk::convert_chunk;
use super::context::Context;
use super::entity::EntityEnv;
use super::unique_id::UniqueIdRegistry;
use crate::error::{ChainExt, ConvertError, Result, ResultExt};
use crate::here;
use crate::parallel::Parallel;

/// One unit of work: a terrain region file and its entity sibling.
#[derive(Debug, Clone)]
pub struct RegionJob {
    pub dim: Dimension,
    pub region: Pos2i,
    pub terrain: PathBuf,
    pub entities: Option<PathBuf>,
    pub chunks: Pos2iSet,
}

/// Entities of every chunk in the entity region; an unreadable file
/// costs the entities, not the terrain.
fn read_entities(job: &RegionJob) -> BTreeMap<Pos2i, Vec<NbtCompound>> {
    let mut out = BTreeMap::new();
    let Some(path) = &job.entities else {
        return out;
    };
    let file = match RegionFile::open(path, job.region) {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %path.display(), "skipping entity region: {e}");
            return out;
        }
    };
    for chunk in job.chunks.iter() {
        match file.read_chunk(chunk) {
            Ok(Some(root)) => {
                out.insert(chunk, entities_from_nbt(&root));
            }
            Ok(None) => {}
            Err(e) => warn!(%chunk, dim = %job.dim, "skipping malformed entity chunk: {e}"),
        }
    }
    out
}

fn convert_one(
    file: &RegionFile,
    chunk: Pos2i,
    job: &RegionJob,
    entities: Vec<NbtCompound>,
    store: &dyn KvStore,
    env: &EntityEnv<'_>,
    ctx: &mut Context,
) -> Result<bool> {
    let Some(root) = file.read_chunk(chunk).wrap_with(|| here!("chunk {chunk}"))? else {
        return Ok(false);
    };
    let java = JavaChunk::from_nbt(&root, job.dim).wrap_with(|| here!("chunk {chunk}"))?;
    if java.pos != chunk {
        let e = ChunkError::Malformed(format!("chunk claims position {}", java.pos));
        return Err(ConvertError::new(e, here!("chunk {chunk}")));
    }
    convert_chunk(&java, entities, job.dim, store, env, ctx).chain(here!())?;
    Ok(true)
}

/// Convert every listed chunk of one region in slot order.
pub fn convert_region(
    job: RegionJob,
    store: &dyn KvStore,
    ids: &UniqueIdRegistry,
    parallel: &Parallel<'_>,
    ctx: &mut Context,
) -> Result<()> {
    debug!(region = %job.region, dim = %job.dim, chunks = job.chunks.len(), "converting region");
    let file = match RegionFile::open(&job.terrain, job.region) {
        Ok(f) => f,
        Err(e) => {
            let e = ConvertError::new(e, here!("{}", job.terrain.display()));
            if !e.is_malformed_chunk() {
                return Err(e);
            }
            warn!(path = %job.terrain.display(), "skipping malformed region: {e}");
            ctx.skipped_chunks += job.chunks.len() as u64;
            return Ok(());
        }
    };
    let mut entities = read_entities(&job);
    let env = EntityEnv { dim: job.dim, ids };

    for chunk in job.chunks.iter() {
        if parallel.is_cancelled() {
            return Err(ConvertError::cancelled(here!()));
        }
        let list = entities.remove(&chunk).unwrap_or_default();
        match convert_one(&file, chunk, &job, list, store, &env, ctx) {
            Ok(true) => parallel.chunk_done(),
            Ok(false) => {}
            Err(e) if e.is_malformed_chunk() => {
                warn!(%chunk, dim = %job.dim, "skipping malformed chunk: {e}");
                ctx.skipped_chunks += 1;
            }
            Err(e) => return Err(e.push(here!("region {}", job.region))),
        }
    }
    debug!(region = %job.region, dim = %job.dim, "region done");
    Ok(())
}
