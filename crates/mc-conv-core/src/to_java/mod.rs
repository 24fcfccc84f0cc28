//! Bedrock world (LevelDB) to Java world (region files).
//!
//! Chunks are converted in parallel into an intermediate per-chunk store,
//! cross-chunk entity links are resolved single-threaded, then the
//! finished chunks are packed into `region/`, `entities/` and `poi/`.

pub mod block_property;
pub mod chunk;
pub mod chunk_store;
pub mod context;
pub mod entity;
pub mod level;
pub mod poi;
pub mod region;
pub mod resolver;
pub mod source;
pub mod terraform;
pub mod tile_entity;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use mc_conv_nbt::{read_nbt_le, CompoundExt, NbtCompound};
use mc_conv_world::keys::{self, parse_chunk_key};
use mc_conv_world::{Dimension, KvStore, LevelDbStore, Pos2i, Pos2iSet};
use tracing::{info, warn};

use self::chunk_store::ChunkStore;
use self::context::Context;
use self::resolver::ResolveStats;
use crate::chunk_cache::boustrophedon;
use crate::error::{ChainExt, Result, ResultExt};
use crate::here;
use crate::level::{read_bedrock_level_dat, read_level_name, write_java_level_dat};
use crate::options::{DataDirectory, NoProgress, Options, Progress, Schedule};
use crate::parallel::Parallel;

/// Chunks to convert: dimension → region → chunks.
pub type WorkList = BTreeMap<Dimension, BTreeMap<Pos2i, Pos2iSet>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub chunks: u64,
    pub skipped: u64,
    pub links: ResolveStats,
}

/// List every chunk the store holds a version record for, filtered by
/// the options.
pub fn scan(store: &dyn KvStore, options: &Options) -> Result<WorkList> {
    let mut work = WorkList::new();
    for key in store.keys().wrap(here!("listing keys"))? {
        let Some(k) = parse_chunk_key(&key) else { continue };
        if k.tag != keys::TAG_VERSION && k.tag != keys::TAG_LEGACY_VERSION {
            continue;
        }
        if !options.includes_chunk(k.dim, k.pos) {
            continue;
        }
        work.entry(k.dim).or_default().entry(k.pos.region()).or_default().insert(k.pos);
    }
    for (dim, regions) in &work {
        let chunks: usize = regions.values().map(Pos2iSet::len).sum();
        info!(%dim, regions = regions.len(), chunks, "scanned world");
    }
    Ok(work)
}

fn local_player(store: &dyn KvStore) -> Result<Option<NbtCompound>> {
    let Some(data) = store.get(keys::LOCAL_PLAYER_KEY).wrap(here!())? else {
        return Ok(None);
    };
    let root = read_nbt_le(&mut data.as_slice()).wrap(here!("parsing local player"))?;
    Ok(Some(root.compound))
}

/// Convert the Bedrock world at `input` into a Java world at `output`.
pub fn convert_world(input: &Path, output: &Path, options: &Options, progress: &dyn Progress) -> Result<Summary> {
    let dat_path = input.join("level.dat");
    let level_dat = if dat_path.exists() {
        read_bedrock_level_dat(&dat_path)?
    } else {
        warn!(path = %dat_path.display(), "no level.dat, using defaults");
        NbtCompound::new()
    };
    let name = read_level_name(input, &level_dat);
    let store: Arc<dyn KvStore> = Arc::new(LevelDbStore::open(&input.join("db")).wrap(here!("opening source"))?);
    convert_store(store, &level_dat, &name, &DataDirectory::new(output), options, progress).chain(here!())
}

/// Convert from an already opened store; `level_dat` is the Bedrock
/// `level.dat` tree.
pub fn convert_store(
    store: Arc<dyn KvStore>,
    level_dat: &NbtCompound,
    level_name: &str,
    output: &DataDirectory,
    options: &Options,
    progress: &dyn Progress,
) -> Result<Summary> {
    let work = scan(store.as_ref(), options)?;
    let total: u64 = work.values().flat_map(|r| r.values()).map(|c| c.len() as u64).sum();
    let player = local_player(store.as_ref())?;

    let mut ctx = Context::default();
    ctx.local_player = player.as_ref().and_then(|p| p.get_long("UniqueID"));
    let seed = ctx.make();

    let chunks = ChunkStore::create(&options.temp_dir)?;
    let parallel = Parallel::new(options.effective_concurrency(), total, progress);
    let loaders: BTreeMap<Dimension, _> =
        work.keys().map(|&dim| (dim, region::source_loader(Arc::clone(&store), dim))).collect();

    match options.schedule {
        Schedule::Region => {
            let items: Vec<(Dimension, Pos2i, &Pos2iSet)> = work
                .iter()
                .flat_map(|(&dim, regions)| regions.iter().map(move |(&r, c)| (dim, r, c)))
                .collect();
            parallel.reduce(
                items,
                &mut ctx,
                || seed.make(),
                |(dim, r, c), child| match loaders.get(&dim) {
                    Some(loader) => region::convert_region(loader, dim, r, c, &chunks, &parallel, child),
                    None => Ok(()),
                },
                Context::merge_into,
            )?;
        }
        Schedule::Chunk => {
            for (&dim, regions) in &work {
                let Some(loader) = loaders.get(&dim) else { continue };
                let order: Vec<Pos2i> = regions.values().flat_map(boustrophedon).collect();
                parallel.reduce_chunks(
                    order,
                    &mut ctx,
                    || seed.make(),
                    |c, child| region::convert_single(loader, dim, c, &chunks, &parallel, child),
                    Context::merge_into,
                )?;
            }
        }
    }
    drop(loaders);
    info!(
        converted = parallel.done(),
        skipped = ctx.skipped_chunks,
        "chunk conversion finished"
    );

    let links = resolver::resolve(&mut ctx, &chunks)?;
    pack(&ctx, &chunks, output, options)?;

    let data = level::convert_level(level_dat, level_name, player.as_ref(), ctx.root_vehicle.as_ref());
    write_java_level_dat(&output.level_dat(), data)?;

    Ok(Summary {
        chunks: parallel.done(),
        skipped: ctx.skipped_chunks,
        links,
    })
}

/// Pack every written chunk into region files, one region per item.
fn pack(ctx: &Context, chunks: &ChunkStore, output: &DataDirectory, options: &Options) -> Result<()> {
    let mut items = Vec::new();
    for (&dim, written) in &ctx.written {
        let mut regions: BTreeMap<Pos2i, Pos2iSet> = BTreeMap::new();
        for c in written.iter() {
            regions.entry(c.region()).or_default().insert(c);
        }
        let poi = ctx.poi.get(&dim).map(region::poi_by_chunk).unwrap_or_default();
        let poi = Arc::new(poi);
        items.extend(regions.into_iter().map(|(r, c)| (dim, r, c, Arc::clone(&poi))));
    }
    let parallel = Parallel::new(options.effective_concurrency(), 0, &NoProgress);
    parallel
        .reduce(
            items,
            &mut (),
            || (),
            |(dim, r, c, poi), _| region::pack_region(chunks, dim, r, &c, &poi, output),
            |_, _| {},
        )
        .chain(here!("packing regions"))
}
