//! Bedrock `level.dat` and local player to the Java `level.dat`.

use mc_conv_nbt::{CompoundExt, NbtCompound, NbtTag};
use mc_conv_world::java_chunk::JAVA_DATA_VERSION;
use mc_conv_world::Dimension;

use super::context::RootVehicle;
use super::entity::{convert, slotted_items, uuid_tag};
use crate::block_map::items::item_to_java;
use crate::level::{is_inverted_rule, GAME_RULES, JAVA_VERSION_NAME};

/// Eye height Bedrock adds to the stored player position.
const PLAYER_EYE_HEIGHT: f64 = 1.62;

fn game_rules(src: &NbtCompound) -> NbtCompound {
    let mut rules = NbtCompound::new();
    for &(bedrock, java) in GAME_RULES {
        let Some(tag) = src.get(bedrock) else { continue };
        let value = match tag {
            NbtTag::Byte(b) => {
                let on = (*b != 0) != is_inverted_rule(bedrock);
                on.to_string()
            }
            other => match other.as_integer() {
                Some(v) => v.to_string(),
                None => continue,
            },
        };
        rules.put(java, value);
    }
    rules
}

fn noise(settings: &str, biome_source: NbtCompound) -> NbtCompound {
    let mut generator = NbtCompound::new();
    generator.put("type", "minecraft:noise");
    generator.put("settings", format!("minecraft:{settings}"));
    generator.put("biome_source", biome_source);
    generator
}

fn multi_noise(preset: &str) -> NbtCompound {
    let mut source = NbtCompound::new();
    source.put("type", "minecraft:multi_noise");
    source.put("preset", format!("minecraft:{preset}"));
    source
}

fn flat() -> NbtCompound {
    let layer = |block: &str, height: i32| {
        let mut l = NbtCompound::new();
        l.put("block", format!("minecraft:{block}"));
        l.put("height", height);
        NbtTag::Compound(l)
    };
    let mut settings = NbtCompound::new();
    settings.put("biome", "minecraft:plains");
    settings.put("lakes", false);
    settings.put("features", false);
    settings.put("layers", NbtTag::List(vec![layer("bedrock", 1), layer("dirt", 2), layer("grass_block", 1)]));
    let mut generator = NbtCompound::new();
    generator.put("type", "minecraft:flat");
    generator.put("settings", settings);
    generator
}

fn world_gen_settings(src: &NbtCompound) -> NbtCompound {
    let mut dimensions = NbtCompound::new();
    for dim in Dimension::ALL {
        let generator = match dim {
            Dimension::Overworld if src.get_int("Generator") == Some(2) => flat(),
            Dimension::Overworld => noise("overworld", multi_noise("overworld")),
            Dimension::Nether => noise("nether", multi_noise("nether")),
            Dimension::End => {
                let mut source = NbtCompound::new();
                source.put("type", "minecraft:the_end");
                noise("end", source)
            }
        };
        let mut entry = NbtCompound::new();
        entry.put("type", dim.java_name());
        entry.put("generator", generator);
        dimensions.put(dim.java_name(), entry);
    }
    let mut settings = NbtCompound::new();
    settings.put("seed", src.get_long("RandomSeed").unwrap_or(0));
    settings.put("generate_features", true);
    settings.put("bonus_chest", src.get_bool("bonusChestEnabled").unwrap_or(false));
    settings.put("dimensions", dimensions);
    settings
}

fn version() -> NbtCompound {
    let mut v = NbtCompound::new();
    v.put("Id", JAVA_DATA_VERSION);
    v.put("Name", JAVA_VERSION_NAME);
    v.put("Series", "main");
    v.put("Snapshot", false);
    v
}

/// Java player record from the Bedrock `~local_player` actor.
pub fn convert_player(src: &NbtCompound, root_vehicle: Option<&RootVehicle>) -> NbtCompound {
    let mut out = convert(src, "minecraft:player".to_string());
    out.remove("id");
    if let Some(NbtTag::List(pos)) = out.get_mut("Pos") {
        if let Some(NbtTag::Double(y)) = pos.get_mut(1) {
            *y -= PLAYER_EYE_HEIGHT;
        }
    }
    let dim = src
        .get_integer("DimensionId")
        .and_then(|d| Dimension::from_bedrock_id(d as i32))
        .unwrap_or(Dimension::Overworld);
    out.put("Dimension", dim.java_name());
    out.put("playerGameType", src.get_integer("PlayerGameMode").unwrap_or(0) as i32);
    out.put("SelectedItemSlot", src.get_integer("SelectedInventorySlot").unwrap_or(0) as i32);
    out.put("XpLevel", src.get_integer("PlayerLevel").unwrap_or(0) as i32);
    out.put("XpP", src.get_float("PlayerLevelProgress").unwrap_or(0.0));

    let mut inventory = match slotted_items(src, "Inventory", 0) {
        NbtTag::List(l) => l,
        _ => Vec::new(),
    };
    // Bedrock armor is head to feet; Java slots 103 (head) to 100 (feet).
    let armor = src.get_list("Armor").unwrap_or_default();
    for (i, item) in armor.iter().take(4).enumerate() {
        if let Some(mut java) = item.as_compound().and_then(item_to_java) {
            java.put("Slot", (103 - i as i32) as i8);
            inventory.push(NbtTag::Compound(java));
        }
    }
    let offhand = src.get_list("Offhand").unwrap_or_default();
    if let Some(mut java) = offhand.first().and_then(|t| t.as_compound()).and_then(item_to_java) {
        java.put("Slot", -106i8);
        inventory.push(NbtTag::Compound(java));
    }
    out.put("Inventory", NbtTag::List(inventory));
    out.put("EnderItems", slotted_items(src, "EnderChestInventory", 0));

    if let (Some(x), Some(y), Some(z)) = (src.get_int("SpawnX"), src.get_int("SpawnY"), src.get_int("SpawnZ")) {
        if y != i32::MIN && y != 32767 {
            out.put("SpawnX", x);
            out.put("SpawnY", y);
            out.put("SpawnZ", z);
            out.put("SpawnForced", false);
        }
    }
    if let Some(root) = root_vehicle {
        let mut vehicle = NbtCompound::new();
        vehicle.put("Attach", uuid_tag(root.attach));
        vehicle.put("Entity", root.entity.clone());
        out.put("RootVehicle", vehicle);
    }
    out
}

/// The `Data` compound of the Java `level.dat`.
pub fn convert_level(
    src: &NbtCompound,
    level_name: &str,
    player: Option<&NbtCompound>,
    root_vehicle: Option<&RootVehicle>,
) -> NbtCompound {
    let mut data = NbtCompound::new();
    data.put("DataVersion", JAVA_DATA_VERSION);
    data.put("version", 19133);
    data.put("initialized", true);
    data.put("LevelName", level_name);
    data.put("SpawnX", src.get_int("SpawnX").unwrap_or(0));
    data.put("SpawnY", src.get_int("SpawnY").filter(|&y| y != 32767).unwrap_or(64));
    data.put("SpawnZ", src.get_int("SpawnZ").unwrap_or(0));
    data.put("SpawnAngle", 0.0f32);
    data.put("Time", src.get_integer("currentTick").unwrap_or(0));
    data.put("DayTime", src.get_integer("Time").unwrap_or(0));
    data.put("LastPlayed", src.get_integer("LastPlayed").unwrap_or(0) * 1000);
    data.put("GameType", src.get_integer("GameType").unwrap_or(0) as i32);
    data.put("Difficulty", src.get_integer("Difficulty").unwrap_or(2) as i8);
    data.put("hardcore", src.get_bool("IsHardcore").unwrap_or(false));
    data.put("allowCommands", src.get_bool("commandsEnabled").unwrap_or(false));
    let raining = src.get_float("rainLevel").unwrap_or(0.0) > 0.0;
    let thundering = src.get_float("lightningLevel").unwrap_or(0.0) > 0.0;
    data.put("raining", raining);
    data.put("rainTime", src.get_integer("rainTime").unwrap_or(0) as i32);
    data.put("thundering", thundering);
    data.put("thunderTime", src.get_integer("lightningTime").unwrap_or(0) as i32);
    data.put("clearWeatherTime", 0);
    data.put("GameRules", game_rules(src));
    data.put("WorldGenSettings", world_gen_settings(src));
    data.put("Version", version());
    if let Some(p) = player {
        data.put("Player", convert_player(p, root_vehicle));
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_java::entity::java_uuid;

    fn item(name: &str, slot: i8) -> NbtTag {
        let mut i = NbtCompound::new();
        i.put("Name", name);
        i.put("Count", 1i8);
        i.put("Slot", slot);
        NbtTag::Compound(i)
    }

    #[test]
    fn level_fields() {
        let mut src = NbtCompound::new();
        src.put("SpawnX", 12);
        src.put("SpawnY", 32767);
        src.put("RandomSeed", 99i64);
        src.put("currentTick", 500i64);
        src.put("keepinventory", 1i8);
        src.put("showcoordinates", 1i8);
        src.put("randomtickspeed", 3);
        src.put("Generator", 2);

        let data = convert_level(&src, "My World", None, None);
        assert_eq!(data.get_str("LevelName"), Some("My World"));
        assert_eq!(data.get_int("SpawnY"), Some(64));
        assert_eq!(data.get_long("Time"), Some(500));
        let rules = data.get_compound("GameRules").unwrap();
        assert_eq!(rules.get_str("keepInventory"), Some("true"));
        assert_eq!(rules.get_str("reducedDebugInfo"), Some("false"));
        assert_eq!(rules.get_str("randomTickSpeed"), Some("3"));
        let gen = data.get_compound("WorldGenSettings").unwrap();
        assert_eq!(gen.get_long("seed"), Some(99));
        let overworld = gen.get_compound("dimensions").unwrap().get_compound("minecraft:overworld").unwrap();
        assert_eq!(overworld.get_compound("generator").unwrap().get_str("type"), Some("minecraft:flat"));
        assert!(data.get("Player").is_none());
    }

    #[test]
    fn player_with_vehicle() {
        let mut src = NbtCompound::new();
        src.put("identifier", "minecraft:player");
        src.put("UniqueID", -4i64);
        src.put("Pos", NbtTag::List(vec![NbtTag::Float(0.5), NbtTag::Float(65.62), NbtTag::Float(0.5)]));
        src.put("DimensionId", 1);
        src.put("Inventory", NbtTag::List(vec![item("minecraft:apple", 3)]));
        src.put("Armor", NbtTag::List(vec![item("minecraft:iron_helmet", 0), item("", 0)]));
        src.put("Offhand", NbtTag::List(vec![item("minecraft:shield", 0)]));

        let mut boat = NbtCompound::new();
        boat.put("id", "minecraft:oak_boat");
        let root = RootVehicle {
            attach: java_uuid(10),
            entity: boat,
        };
        let player = convert_player(&src, Some(&root));
        assert!(player.get("id").is_none());
        let y = player.get_list("Pos").unwrap()[1].as_double().unwrap();
        assert!((y - 64.0).abs() < 1e-4);
        assert_eq!(player.get_str("Dimension"), Some("minecraft:the_nether"));
        let slots: Vec<i8> = player
            .get_list("Inventory")
            .unwrap()
            .iter()
            .filter_map(|t| t.as_compound()?.get_byte("Slot"))
            .collect();
        assert_eq!(slots, vec![3, 103, -106]);
        let vehicle = player.get_compound("RootVehicle").unwrap();
        assert_eq!(vehicle.get_int_array("Attach"), Some(&java_uuid(10)[..]));
    }
}
