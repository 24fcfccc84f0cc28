//! Java `level.dat` to the Bedrock `level.dat` and local player.

use bytes::BufMut;
use mc_conv_nbt::{to_le_bytes, CompoundExt, NbtCompound, NbtTag};
use mc_conv_world::{keys, Dimension, KvStore, Pos2iSet};
use tracing::{debug, warn};

use super::entity::{block_pos, convert, convert_entity, empty_item, EntityEnv};
use super::unique_id::{entity_uuid, UniqueIdRegistry};
use crate::block_map::items::item_to_bedrock;
use crate::error::{Result, ResultExt};
use crate::here;
use crate::level::{is_inverted_rule, BEDROCK_STORAGE_VERSION, GAME_RULES};

/// Eye height Bedrock adds to the stored player position.
const PLAYER_EYE_HEIGHT: f64 = 1.62;

/// Version the converted world claims to have been last opened with.
const LAST_OPENED_WITH: [i32; 5] = [1, 21, 0, 0, 0];

fn game_rules(src: Option<&NbtCompound>, out: &mut NbtCompound) {
    let Some(src) = src else { return };
    for &(bedrock, java) in GAME_RULES {
        let Some(value) = src.get_str(java) else { continue };
        match value {
            "true" | "false" => out.put(bedrock, (value == "true") != is_inverted_rule(bedrock)),
            other => match other.parse::<i32>() {
                Ok(v) => out.put(bedrock, v),
                Err(_) => continue,
            },
        }
    }
}

fn seed(src: &NbtCompound) -> i64 {
    src.get_compound("WorldGenSettings")
        .and_then(|s| s.get_long("seed"))
        .or_else(|| src.get_long("RandomSeed"))
        .unwrap_or(0)
}

/// 1 for infinite worlds, 2 for superflat.
fn generator(src: &NbtCompound) -> i32 {
    let kind = src
        .get_compound("WorldGenSettings")
        .and_then(|s| s.get_compound("dimensions"))
        .and_then(|d| d.get_compound("minecraft:overworld"))
        .and_then(|o| o.get_compound("generator"))
        .and_then(|g| g.get_str("type"));
    if kind == Some("minecraft:flat") {
        2
    } else {
        1
    }
}

/// The Bedrock `level.dat` tree from the Java `Data` compound.
pub fn convert_level(src: &NbtCompound, level_name: &str) -> NbtCompound {
    let mut out = NbtCompound::new();
    out.put("StorageVersion", BEDROCK_STORAGE_VERSION);
    out.put("LevelName", level_name);
    out.put("SpawnX", src.get_int("SpawnX").unwrap_or(0));
    out.put("SpawnY", src.get_int("SpawnY").unwrap_or(64));
    out.put("SpawnZ", src.get_int("SpawnZ").unwrap_or(0));
    out.put("currentTick", src.get_integer("Time").unwrap_or(0));
    out.put("Time", src.get_integer("DayTime").unwrap_or(0));
    out.put("LastPlayed", src.get_integer("LastPlayed").unwrap_or(0) / 1000);
    out.put("GameType", src.get_integer("GameType").unwrap_or(0) as i32);
    out.put("Difficulty", src.get_integer("Difficulty").unwrap_or(2) as i32);
    out.put("RandomSeed", seed(src));
    out.put("Generator", generator(src));
    out.put("IsHardcore", src.get_bool("hardcore").unwrap_or(false));
    out.put("commandsEnabled", src.get_bool("allowCommands").unwrap_or(false));
    let raining = src.get_bool("raining").unwrap_or(false);
    let thundering = src.get_bool("thundering").unwrap_or(false);
    out.put("rainLevel", if raining { 1.0f32 } else { 0.0 });
    out.put("rainTime", src.get_integer("rainTime").unwrap_or(0) as i32);
    out.put("lightningLevel", if thundering { 1.0f32 } else { 0.0 });
    out.put("lightningTime", src.get_integer("thunderTime").unwrap_or(0) as i32);
    out.put(
        "lastOpenedWithVersion",
        NbtTag::List(LAST_OPENED_WITH.iter().map(|&v| NbtTag::Int(v)).collect()),
    );
    game_rules(src.get_compound("GameRules"), &mut out);
    out
}

// ─── Player ─────────────────────────────────────────────────────────────────

/// Dimension of the Java player: a name since 1.16, a number before.
fn player_dimension(src: &NbtCompound) -> Dimension {
    if let Some(name) = src.get_str("Dimension") {
        return Dimension::from_java_name(name).unwrap_or(Dimension::Overworld);
    }
    match src.get_integer("Dimension") {
        Some(-1) => Dimension::Nether,
        Some(1) => Dimension::End,
        _ => Dimension::Overworld,
    }
}

fn bedrock_item(item: &NbtCompound, slot: Option<i64>) -> Option<NbtTag> {
    let mut out = item_to_bedrock(item)?;
    if let Some(slot) = slot {
        out.put("Slot", slot as i8);
    }
    Some(NbtTag::Compound(out))
}

/// Bedrock `~local_player` record and its unique id.
pub fn convert_player(src: &NbtCompound, ids: &UniqueIdRegistry) -> (NbtCompound, i64) {
    let dim = player_dimension(src);
    let env = EntityEnv { dim, ids };
    let uid = ids.id_for(entity_uuid(src).unwrap_or([0, 0, 0, 0]));
    let mut player = src.clone();
    player.put("id", "minecraft:player");
    let mut out = convert(&player, uid, &env).unwrap_or_default();
    if let Some(NbtTag::List(pos)) = out.get_mut("Pos") {
        if let Some(NbtTag::Float(y)) = pos.get_mut(1) {
            *y = (f64::from(*y) + PLAYER_EYE_HEIGHT) as f32;
        }
    }
    out.put("DimensionId", dim.bedrock_id());
    out.put("PlayerGameMode", src.get_integer("playerGameType").unwrap_or(0) as i32);
    out.put("SelectedInventorySlot", src.get_integer("SelectedItemSlot").unwrap_or(0) as i32);
    out.put("PlayerLevel", src.get_integer("XpLevel").unwrap_or(0) as i32);
    out.put("PlayerLevelProgress", src.get_float("XpP").unwrap_or(0.0));

    let mut inventory = Vec::new();
    let mut armor = vec![empty_item(); 4];
    let mut offhand = vec![empty_item()];
    for item in src.get_list("Inventory").unwrap_or_default().iter().filter_map(|t| t.as_compound()) {
        match item.get_integer("Slot") {
            Some(slot @ 0..=35) => inventory.extend(bedrock_item(item, Some(slot))),
            // Java armor slots 100 (feet) to 103 (head); Bedrock is head first.
            Some(slot @ 100..=103) => {
                if let Some(tag) = bedrock_item(item, None) {
                    armor[(103 - slot) as usize] = tag;
                }
            }
            Some(-106) => {
                if let Some(tag) = bedrock_item(item, None) {
                    offhand[0] = tag;
                }
            }
            _ => {}
        }
    }
    out.put("Inventory", NbtTag::List(inventory));
    out.put("Armor", NbtTag::List(armor));
    out.put("Offhand", NbtTag::List(offhand));
    let ender: Vec<NbtTag> = src
        .get_list("EnderItems")
        .unwrap_or_default()
        .iter()
        .filter_map(|t| t.as_compound())
        .filter_map(|item| bedrock_item(item, item.get_integer("Slot")))
        .collect();
    out.put("EnderChestInventory", NbtTag::List(ender));

    if let (Some(x), Some(y), Some(z)) = (src.get_int("SpawnX"), src.get_int("SpawnY"), src.get_int("SpawnZ")) {
        out.put("SpawnX", x);
        out.put("SpawnY", y);
        out.put("SpawnZ", z);
    }
    (out, uid)
}

/// Put the vehicle stack the player rides back into the world, linking
/// the player from the entity it sits on. Returns the actors written;
/// stacks standing in chunks that were not converted are dropped.
pub fn write_root_vehicle(
    player: &NbtCompound,
    player_uid: i64,
    store: &dyn KvStore,
    ids: &UniqueIdRegistry,
    written: Option<&Pos2iSet>,
) -> Result<usize> {
    let Some(root) = player.get_compound("RootVehicle") else {
        return Ok(0);
    };
    let Some(entity) = root.get_compound("Entity") else {
        return Ok(0);
    };
    let dim = player_dimension(player);
    let Some(chunk) = block_pos(entity).map(|p| p.chunk()) else {
        warn!("root vehicle without a position, dropped");
        return Ok(0);
    };
    if !written.is_some_and(|w| w.contains(chunk)) {
        debug!(%chunk, %dim, "root vehicle outside the converted chunks, dropped");
        return Ok(0);
    }
    let env = EntityEnv { dim, ids };
    let mut actors = Vec::new();
    convert_entity(entity, &env, &mut actors);

    let attach = match root.get_int_array("Attach") {
        Some(&[a, b, c, d]) => Some(ids.id_for([a, b, c, d])),
        _ => None,
    };
    let seat = actors
        .iter()
        .position(|a| attach.is_some() && a.get_long("UniqueID") == attach)
        .unwrap_or(0);
    if let Some(mount) = actors.get_mut(seat) {
        let mut links = match mount.remove("LinksTag") {
            Some(NbtTag::List(l)) => l,
            _ => Vec::new(),
        };
        let mut link = NbtCompound::new();
        link.put("entityID", player_uid);
        link.put("LinkID", links.len() as i32);
        links.push(NbtTag::Compound(link));
        mount.put("LinksTag", NbtTag::List(links));
    }

    let digest_key = keys::digest_key(chunk, dim);
    let mut digest = store.get(&digest_key).wrap(here!())?.unwrap_or_default();
    for actor in &actors {
        let Some(uid) = actor.get_long("UniqueID") else { continue };
        store
            .put(&keys::actor_key(uid), &to_le_bytes(actor))
            .wrap_with(|| here!("root vehicle actor {uid}"))?;
        digest.put_i64_le(uid);
    }
    store.put(&digest_key, &digest).wrap(here!("digest of {chunk}"))?;
    Ok(actors.len())
}

/// Write the local player record.
pub fn write_player(store: &dyn KvStore, player: &NbtCompound) -> Result<()> {
    store
        .put(keys::LOCAL_PLAYER_KEY, &to_le_bytes(player))
        .wrap(here!("local player"))
}

#[cfg(test)]
mod tests {
    use mc_conv_world::{MemoryStore, Pos2i};

    use super::*;

    fn item(id: &str, slot: i8) -> NbtTag {
        let mut i = NbtCompound::new();
        i.put("id", id);
        i.put("count", 1);
        i.put("Slot", slot);
        NbtTag::Compound(i)
    }

    fn doubles(v: [f64; 3]) -> NbtTag {
        NbtTag::List(v.iter().map(|&d| NbtTag::Double(d)).collect())
    }

    #[test]
    fn level_fields() {
        let mut rules = NbtCompound::new();
        rules.put("keepInventory", "true");
        rules.put("reducedDebugInfo", "true");
        rules.put("randomTickSpeed", "3");
        let mut settings = NbtCompound::new();
        settings.put("seed", 42i64);
        let mut src = NbtCompound::new();
        src.put("Time", 900i64);
        src.put("DayTime", 6000i64);
        src.put("LastPlayed", 1_700_000_000_000i64);
        src.put("GameRules", rules);
        src.put("WorldGenSettings", settings);

        let out = convert_level(&src, "Test");
        assert_eq!(out.get_int("StorageVersion"), Some(BEDROCK_STORAGE_VERSION));
        assert_eq!(out.get_long("currentTick"), Some(900));
        assert_eq!(out.get_long("Time"), Some(6000));
        assert_eq!(out.get_long("LastPlayed"), Some(1_700_000_000));
        assert_eq!(out.get_long("RandomSeed"), Some(42));
        assert_eq!(out.get_bool("keepinventory"), Some(true));
        assert_eq!(out.get_bool("showcoordinates"), Some(false));
        assert_eq!(out.get_int("randomtickspeed"), Some(3));
        assert_eq!(out.get_int("Generator"), Some(1));
    }

    #[test]
    fn player_inventory_and_height() {
        let mut src = NbtCompound::new();
        src.insert("UUID".into(), NbtTag::IntArray(vec![1, 2, 3, 4]));
        src.put("Pos", doubles([0.5, 64.0, 0.5]));
        src.put("Dimension", "minecraft:the_end");
        src.put(
            "Inventory",
            NbtTag::List(vec![item("minecraft:apple", 3), item("minecraft:iron_helmet", 103), item("minecraft:shield", -106)]),
        );
        let ids = UniqueIdRegistry::new();
        let (player, uid) = convert_player(&src, &ids);
        assert_eq!(uid, ids.id_for([1, 2, 3, 4]));
        assert_eq!(player.get_long("UniqueID"), Some(uid));
        assert_eq!(player.get_int("DimensionId"), Some(2));
        let y = player.get_list("Pos").unwrap()[1].as_float().unwrap();
        assert!((f64::from(y) - 65.62).abs() < 1e-3);
        assert_eq!(player.get_list("Inventory").unwrap().len(), 1);
        let armor = player.get_list("Armor").unwrap();
        assert_eq!(armor[0].as_compound().unwrap().get_str("Name"), Some("minecraft:iron_helmet"));
        assert_eq!(armor[3].as_compound().unwrap().get_str("Name"), Some(""));
        let offhand = player.get_list("Offhand").unwrap();
        assert_eq!(offhand[0].as_compound().unwrap().get_str("Name"), Some("minecraft:shield"));
    }

    #[test]
    fn root_vehicle_links_the_player() {
        let mut boat = NbtCompound::new();
        boat.put("id", "minecraft:oak_boat");
        boat.insert("UUID".into(), NbtTag::IntArray(vec![9, 9, 9, 9]));
        boat.put("Pos", doubles([20.0, 63.0, 5.0]));
        let mut root = NbtCompound::new();
        root.insert("Attach".into(), NbtTag::IntArray(vec![9, 9, 9, 9]));
        root.put("Entity", boat);
        let mut player = NbtCompound::new();
        player.put("RootVehicle", root);

        let store = MemoryStore::new();
        let ids = UniqueIdRegistry::new();
        let chunk = Pos2i::new(1, 0);
        let digest_key = keys::digest_key(chunk, Dimension::Overworld);
        store.put(&digest_key, &5i64.to_le_bytes()).unwrap();

        assert_eq!(write_root_vehicle(&player, -3, &store, &ids, None).unwrap(), 0);
        let written: Pos2iSet = [chunk].into_iter().collect();
        assert_eq!(write_root_vehicle(&player, -3, &store, &ids, Some(&written)).unwrap(), 1);

        let digest = store.get(&digest_key).unwrap().unwrap();
        assert_eq!(digest.len(), 16, "appended to the existing digest");
        let boat_id = ids.id_for([9, 9, 9, 9]);
        let data = store.get(&keys::actor_key(boat_id)).unwrap().unwrap();
        let actor = mc_conv_nbt::read_nbt_le(&mut data.as_slice()).unwrap().compound;
        let link = actor.get_list("LinksTag").unwrap()[0].as_compound().unwrap().clone();
        assert_eq!(link.get_long("entityID"), Some(-3));
    }
}
