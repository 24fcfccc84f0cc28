mod common;

use mc_conv_core::{to_bedrock, DataDirectory, NoProgress, Options, Schedule};
use mc_conv_nbt::{read_nbt_le, CompoundExt, NbtCompound, NbtTag};
use mc_conv_world::{keys, BedrockChunk, Dimension, KvStore, MemoryStore, Pos2i, Pos2iSet};

use common::*;

fn options(concurrency: usize) -> Options {
    Options {
        concurrency,
        ..Options::default()
    }
}

fn convert(root: &std::path::Path, options: &Options) -> (MemoryStore, to_bedrock::Summary) {
    let store = MemoryStore::new();
    let summary = to_bedrock::convert_store(&DataDirectory::new(root), &store, &level_dat(), options, &NoProgress).unwrap();
    (store, summary)
}

fn by_identifier<'a>(chunk: &'a BedrockChunk, id: &str) -> &'a NbtCompound {
    chunk
        .entities
        .iter()
        .find(|e| e.get_str("identifier") == Some(id))
        .unwrap_or_else(|| panic!("no {id} in chunk"))
}

#[test]
fn converts_terrain_and_links() {
    let world = Scratch::new("j2b_links");
    write_farm(&world.path);
    let (store, summary) = convert(&world.path, &options(1));
    assert_eq!(summary.chunks, 3);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.actors, 4);

    let home = BedrockChunk::load(Pos2i::new(0, 0), Dimension::Overworld, &store).unwrap().unwrap();
    assert_eq!(home.block_at(1, 64, 1).unwrap().name, "minecraft:stone");
    assert!(home.liquid_at(3, 63, 3).is_some_and(|l| l.name == "minecraft:water"));

    let pig = by_identifier(&home, "minecraft:pig");
    let chicken = by_identifier(&home, "minecraft:chicken");
    let links = pig.get_list("LinksTag").unwrap();
    assert_eq!(links.len(), 1);
    let link = links[0].as_compound().unwrap();
    assert_eq!(link.get_long("entityID"), chicken.get_long("UniqueID"));
    assert_eq!(link.get_int("LinkID"), Some(0));

    let cow = by_identifier(&home, "minecraft:cow");
    let knot = by_identifier(&home, "minecraft:leash_knot");
    assert_eq!(cow.get_long("LeasherID"), knot.get_long("UniqueID"));
    assert_eq!(pig.get_long("LeasherID"), Some(-1));

    let west = BedrockChunk::load(Pos2i::new(-1, 0), Dimension::Overworld, &store).unwrap().unwrap();
    assert_eq!(west.block_at(-3, 10, 4).unwrap().name, "minecraft:cobblestone");
    assert!(west.entities.is_empty());
}

#[test]
fn structure_bounds_follow_the_box() {
    let world = Scratch::new("j2b_structures");
    write_farm(&world.path);
    let (store, summary) = convert(&world.path, &options(2));
    assert_eq!(summary.structures, 2);

    let bounds = |x| store.get(&keys::chunk_key(Pos2i::new(x, 0), Dimension::Overworld, keys::TAG_STRUCTURE_BOUNDS)).unwrap();
    let east = bounds(1).unwrap();
    assert_eq!(i32::from_le_bytes(east[..4].try_into().unwrap()), 1);
    let ints: Vec<i32> = east[4..28].chunks(4).map(|b| i32::from_le_bytes(b.try_into().unwrap())).collect();
    assert_eq!(ints, vec![16, 60, 4, 20, 70, 10]);
    assert_eq!(east[28], 1, "fortress");
    assert!(bounds(0).is_some());
    assert!(bounds(-1).is_none());
}

#[test]
fn output_does_not_depend_on_concurrency() {
    let world = Scratch::new("j2b_determinism");
    write_farm(&world.path);
    let (serial, _) = convert(&world.path, &options(1));
    let (parallel, _) = convert(&world.path, &options(4));
    // Schedule::Chunk still runs one item per region in this direction.
    let (chunked, _) = convert(
        &world.path,
        &Options {
            schedule: Schedule::Chunk,
            ..options(3)
        },
    );
    assert_eq!(serial.snapshot(), parallel.snapshot());
    assert_eq!(serial.snapshot(), chunked.snapshot());
}

#[test]
fn chunk_filter_limits_output() {
    let world = Scratch::new("j2b_filter");
    write_farm(&world.path);
    let options = Options {
        chunks: Some(Pos2iSet::from_iter([Pos2i::new(0, 0)])),
        ..options(2)
    };
    let (store, summary) = convert(&world.path, &options);
    assert_eq!(summary.chunks, 1);
    assert!(BedrockChunk::load(Pos2i::new(1, 0), Dimension::Overworld, &store).unwrap().is_none());
    assert!(BedrockChunk::load(Pos2i::new(-1, 0), Dimension::Overworld, &store).unwrap().is_none());
    // The fortress box only lands in converted chunks.
    assert_eq!(summary.structures, 1);
}

#[test]
fn excluded_dimension_writes_nothing() {
    let world = Scratch::new("j2b_dims");
    write_farm(&world.path);
    let options = Options {
        dimensions: [Dimension::Nether].into_iter().collect(),
        ..options(1)
    };
    let (store, summary) = convert(&world.path, &options);
    assert_eq!(summary.chunks, 0);
    assert!(store.is_empty());
}

#[test]
fn player_and_root_vehicle() {
    let world = Scratch::new("j2b_player");
    let mut level = level_dat();
    let mut player = entity("minecraft:player", [9, 9, 9, 9], [2.5, 64.0, 2.5]);
    player.put("Dimension", "minecraft:overworld");
    player.put("playerGameType", 1);
    let boat = entity("minecraft:oak_boat", [8, 8, 8, 8], [2.5, 64.0, 2.5]);
    let mut vehicle = NbtCompound::new();
    vehicle.insert("Attach".into(), NbtTag::IntArray(vec![8, 8, 8, 8]));
    vehicle.put("Entity", boat);
    player.put("RootVehicle", vehicle);
    level.put("Player", player);
    write_java_world(&world.path, &farm_chunks(), &[], level.clone());

    let store = MemoryStore::new();
    let summary = to_bedrock::convert_store(&DataDirectory::new(&world.path), &store, &level, &options(1), &NoProgress).unwrap();
    assert_eq!(summary.actors, 1, "the boat");

    let raw = store.get(keys::LOCAL_PLAYER_KEY).unwrap().unwrap();
    let local = read_nbt_le(&mut raw.as_slice()).unwrap().compound;
    assert_eq!(local.get_int("PlayerGameMode"), Some(1));

    let home = BedrockChunk::load(Pos2i::new(0, 0), Dimension::Overworld, &store).unwrap().unwrap();
    let boat = by_identifier(&home, "minecraft:boat");
    let link = boat.get_list("LinksTag").unwrap()[0].as_compound().unwrap();
    assert_eq!(link.get_long("entityID"), local.get_long("UniqueID"));
}

#[test]
fn cancellation_stops_the_run() {
    let world = Scratch::new("j2b_cancel");
    write_farm(&world.path);
    let store = MemoryStore::new();
    let cancel_after_first = |done: u64, _total: u64| done < 1;
    let err = to_bedrock::convert_store(&DataDirectory::new(&world.path), &store, &level_dat(), &options(1), &cancel_after_first)
        .unwrap_err();
    assert!(err.is_cancelled(), "{err}");
}

#[test]
fn unreadable_chunks_are_skipped() {
    let world = Scratch::new("j2b_broken");
    let mut chunks = farm_chunks();
    // A chunk record stored under the wrong slot is malformed.
    chunks[1].pos = Pos2i::new(2, 0);
    let mut bad = chunks[1].to_nbt();
    bad.put("xPos", 9);
    let dir = DataDirectory::new(&world.path);
    write_java_world(&world.path, &chunks[..1], &[], level_dat());
    let mut writer = mc_conv_world::region::RegionWriter::new(Pos2i::new(0, 0));
    writer.put(Pos2i::new(0, 0), &chunks[0].to_nbt()).unwrap();
    writer.put(Pos2i::new(2, 0), &bad).unwrap();
    writer.write_to(&dir.region_dir(Dimension::Overworld)).unwrap();

    let (store, summary) = convert(&world.path, &options(1));
    assert_eq!(summary.chunks, 1);
    assert_eq!(summary.skipped, 1);
    assert!(BedrockChunk::load(Pos2i::new(0, 0), Dimension::Overworld, &store).unwrap().is_some());
}
