//! Per-region conversion and packing.

use std::collections::BTreeMap;
use std::sync::Arc;

use mc_conv_world::java_chunk::entity_chunk_to_nbt;
use mc_conv_world::region::RegionWriter;
use mc_conv_world::{Dimension, KvStore, Pos2i, Pos2iSet, Pos3i};
use tracing::{debug, warn};

use super::chunk::convert_chunk;
use super::chunk_store::ChunkStore;
use super::context::{Context, PoiRecord};
use super::poi::poi_chunk_nbt;
use super::source::SourceChunk;
use crate::chunk_cache::{boustrophedon, ChunkCache, Loader};
use crate::error::{ChainExt, ConvertError, Result, ResultExt};
use crate::here;
use crate::options::DataDirectory;
use crate::parallel::Parallel;

pub fn source_loader(store: Arc<dyn KvStore>, dim: Dimension) -> Loader<SourceChunk> {
    Arc::new(move |pos| SourceChunk::load(pos, dim, store.as_ref()))
}

/// Convert one chunk, skipping it when its records cannot be parsed.
fn convert_or_skip(
    cache: &ChunkCache<SourceChunk>,
    chunk: Pos2i,
    dim: Dimension,
    out: &ChunkStore,
    parallel: &Parallel<'_>,
    ctx: &mut Context,
) -> Result<()> {
    match convert_chunk(cache, chunk, dim, out, ctx) {
        Ok(true) => parallel.chunk_done(),
        Ok(false) => {}
        Err(e) if e.is_malformed_chunk() => {
            warn!(%chunk, %dim, "skipping malformed chunk: {e}");
            ctx.skipped_chunks += 1;
        }
        Err(e) => return Err(e.push(here!())),
    }
    Ok(())
}

/// Convert every listed chunk of one region, sliding the cache window in
/// boustrophedon order.
pub fn convert_region(
    loader: &Loader<SourceChunk>,
    dim: Dimension,
    region: Pos2i,
    chunks: &Pos2iSet,
    out: &ChunkStore,
    parallel: &Parallel<'_>,
    ctx: &mut Context,
) -> Result<()> {
    debug!(%region, %dim, chunks = chunks.len(), "converting region");
    let order = boustrophedon(chunks);
    let Some(&first) = order.first() else {
        return Ok(());
    };
    let mut cache = ChunkCache::new(first, Arc::clone(loader));
    for chunk in order {
        if parallel.is_cancelled() {
            return Err(ConvertError::cancelled(here!()));
        }
        if chunk != cache.center() {
            cache = cache.make_relocated(chunk);
        }
        convert_or_skip(&cache, chunk, dim, out, parallel, ctx).chain(here!("region {region}"))?;
    }
    debug!(%region, %dim, "region done");
    Ok(())
}

/// Chunk-schedule unit: a fresh window around a single chunk.
pub fn convert_single(
    loader: &Loader<SourceChunk>,
    dim: Dimension,
    chunk: Pos2i,
    out: &ChunkStore,
    parallel: &Parallel<'_>,
    ctx: &mut Context,
) -> Result<()> {
    let cache = ChunkCache::new(chunk, Arc::clone(loader));
    convert_or_skip(&cache, chunk, dim, out, parallel, ctx)
}

/// Points of interest of one dimension grouped by chunk.
pub fn poi_by_chunk(records: &BTreeMap<Pos3i, PoiRecord>) -> BTreeMap<Pos2i, BTreeMap<Pos3i, PoiRecord>> {
    let mut out: BTreeMap<Pos2i, BTreeMap<Pos3i, PoiRecord>> = BTreeMap::new();
    for (&pos, record) in records {
        out.entry(pos.chunk()).or_default().insert(pos, record.clone());
    }
    out
}

/// Write the terrain, entity and POI region files of one region from the
/// finished intermediate chunks.
pub fn pack_region(
    store: &ChunkStore,
    dim: Dimension,
    region: Pos2i,
    chunks: &Pos2iSet,
    poi: &BTreeMap<Pos2i, BTreeMap<Pos3i, PoiRecord>>,
    dir: &DataDirectory,
) -> Result<()> {
    let mut terrain = RegionWriter::new(region);
    let mut entities = RegionWriter::new(region);
    let mut points = RegionWriter::new(region);
    for chunk in chunks.iter() {
        if let Some(nbt) = store.terrain(dim, chunk)? {
            terrain.put(chunk, &nbt).wrap_with(|| here!("packing terrain {chunk}"))?;
        }
        let list = store.entities(dim, chunk)?;
        if !list.is_empty() {
            entities
                .put(chunk, &entity_chunk_to_nbt(chunk, &list))
                .wrap_with(|| here!("packing entities {chunk}"))?;
        }
        if let Some(records) = poi.get(&chunk) {
            points
                .put(chunk, &poi_chunk_nbt(records.iter()))
                .wrap_with(|| here!("packing poi {chunk}"))?;
        }
    }
    terrain.write_to(&dir.region_dir(dim)).wrap(here!("region {region}"))?;
    entities.write_to(&dir.entities_dir(dim)).wrap(here!("entities {region}"))?;
    points.write_to(&dir.poi_dir(dim)).wrap(here!("poi {region}"))?;
    debug!(%region, %dim, "packed region");
    Ok(())
}
