//! Java world (region files) to Bedrock world (LevelDB).
//!
//! Java chunks convert independently of their neighbours, so every region
//! is one work item and nothing needs a second pass except the structure
//! boxes, which are written once all regions are done.

pub mod chunk;
pub mod context;
pub mod entity;
pub mod level;
pub mod region;
pub mod section;
pub mod structures;
pub mod tile_entity;
pub mod unique_id;

use std::fs;
use std::path::Path;

use mc_conv_nbt::{CompoundExt, NbtCompound};
use mc_conv_world::region::{parse_region_file_name, region_file_name, RegionFile};
use mc_conv_world::{Dimension, KvStore, LevelDbStore, Pos2iSet};
use tracing::{debug, info, warn};

use self::context::Context;
use self::region::RegionJob;
use self::unique_id::UniqueIdRegistry;
use crate::error::{ChainExt, Result, ResultExt};
use crate::here;
use crate::level::{read_java_level_dat, write_bedrock_level_dat};
use crate::options::{DataDirectory, Options, Progress};
use crate::parallel::Parallel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub chunks: u64,
    pub skipped: u64,
    pub actors: u64,
    /// Chunks that received a structure bounds record.
    pub structures: usize,
}

/// Every region file of the included dimensions with the chunks to
/// convert from it, in dimension then file-name order.
pub fn scan(input: &DataDirectory, options: &Options) -> Result<Vec<RegionJob>> {
    let mut jobs = Vec::new();
    for dim in Dimension::ALL {
        if !options.includes_dimension(dim) {
            continue;
        }
        let dir = input.region_dir(dim);
        if !dir.is_dir() {
            debug!(%dim, path = %dir.display(), "no region directory");
            continue;
        }
        let mut regions = Vec::new();
        for entry in fs::read_dir(&dir).wrap_with(|| here!("listing {}", dir.display()))? {
            let entry = entry.wrap(here!())?;
            if let Some(region) = entry.file_name().to_str().and_then(parse_region_file_name) {
                regions.push(region);
            }
        }
        regions.sort();

        let mut chunks_total = 0;
        let before = jobs.len();
        for region in regions {
            let terrain = dir.join(region_file_name(region));
            let positions = match RegionFile::chunk_positions(&terrain, region) {
                Ok(p) => p,
                Err(e) => {
                    warn!(path = %terrain.display(), "skipping unreadable region: {e}");
                    continue;
                }
            };
            let chunks: Pos2iSet = positions.into_iter().filter(|&c| options.includes_chunk(dim, c)).collect();
            if chunks.is_empty() {
                continue;
            }
            chunks_total += chunks.len();
            let entities = input.entities_dir(dim).join(region_file_name(region));
            jobs.push(RegionJob {
                dim,
                region,
                terrain,
                entities: entities.is_file().then_some(entities),
                chunks,
            });
        }
        info!(%dim, regions = jobs.len() - before, chunks = chunks_total, "scanned world");
    }
    Ok(jobs)
}

/// Convert the Java world at `input` into a Bedrock world at `output`.
/// The output database is deleted again when the conversion fails.
pub fn convert_world(input: &Path, output: &Path, options: &Options, progress: &dyn Progress) -> Result<Summary> {
    let dat_path = input.join("level.dat");
    let level_dat = if dat_path.exists() {
        read_java_level_dat(&dat_path)?
    } else {
        warn!(path = %dat_path.display(), "no level.dat, using defaults");
        NbtCompound::new()
    };
    let name = level_dat.get_str("LevelName").unwrap_or("world").to_string();

    fs::create_dir_all(output).wrap_with(|| here!("creating {}", output.display()))?;
    let store = LevelDbStore::open(&output.join("db")).wrap(here!("opening output"))?;
    let summary = match convert_store(&DataDirectory::new(input), &store, &level_dat, options, progress) {
        Ok(s) => s,
        Err(e) => {
            store.abandon();
            return Err(e.push(here!()));
        }
    };
    store
        .close(|step, total| info!(step, total, "closing output database"))
        .wrap(here!("closing output"))?;

    write_bedrock_level_dat(&output.join("level.dat"), &level::convert_level(&level_dat, &name))?;
    fs::write(output.join("levelname.txt"), &name).wrap(here!("writing levelname.txt"))?;
    Ok(summary)
}

/// Convert into an already opened store; `level_dat` is the `Data`
/// compound of the Java `level.dat`.
pub fn convert_store(
    input: &DataDirectory,
    store: &dyn KvStore,
    level_dat: &NbtCompound,
    options: &Options,
    progress: &dyn Progress,
) -> Result<Summary> {
    let jobs = scan(input, options)?;
    let total: u64 = jobs.iter().map(|j| j.chunks.len() as u64).sum();
    let ids = UniqueIdRegistry::new();

    let mut ctx = Context {
        current_tick: level_dat.get_integer("Time").unwrap_or(0),
        ..Context::default()
    };
    let seed = ctx.make();
    let parallel = Parallel::new(options.effective_concurrency(), total, progress);
    parallel
        .reduce(
            jobs,
            &mut ctx,
            || seed.make(),
            |job, child| region::convert_region(job, store, &ids, &parallel, child),
            Context::merge_into,
        )
        .chain(here!())?;
    info!(
        converted = parallel.done(),
        skipped = ctx.skipped_chunks,
        actors = ctx.actors,
        "chunk conversion finished"
    );

    let mut bounds = 0;
    for (dim, map) in &ctx.structures {
        if let Some(written) = ctx.written.get(dim) {
            bounds += structures::write_all(store, *dim, map, written)?;
        }
    }
    debug!(chunks = bounds, "wrote structure bounds");

    if let Some(player) = level_dat.get_compound("Player") {
        let (record, uid) = level::convert_player(player, &ids);
        level::write_player(store, &record)?;
        let dim = record
            .get_int("DimensionId")
            .and_then(Dimension::from_bedrock_id)
            .unwrap_or(Dimension::Overworld);
        ctx.actors += level::write_root_vehicle(player, uid, store, &ids, ctx.written.get(&dim))? as u64;
    }
    store.flush().wrap(here!())?;

    Ok(Summary {
        chunks: parallel.done(),
        skipped: ctx.skipped_chunks,
        actors: ctx.actors,
        structures: bounds,
    })
}
