//! Java block entities to Bedrock block entities.

use std::collections::HashMap;

use mc_conv_nbt::{CompoundExt, NbtCompound, NbtTag};
use mc_conv_world::Pos3i;
use once_cell::sync::Lazy;

use super::entity::{plain_text, slotted_items};
use crate::block_map::entities::bedrock_entity_id;
use crate::block_map::items::item_to_bedrock;
use crate::to_java::tile_entity::{BEACON_EFFECTS, CONTAINERS, SIGN_COLORS, SIMPLE};

/// Java local id to Bedrock id, for block entities without extra fields.
static SIMPLE_IDS: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| SIMPLE.iter().map(|&(bedrock, java)| (java, bedrock)).collect());
static CONTAINER_IDS: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| CONTAINERS.iter().map(|&(bedrock, java)| (java, bedrock)).collect());

fn header(id: &str, pos: Pos3i) -> NbtCompound {
    let mut out = NbtCompound::new();
    out.put("id", id);
    out.put("x", pos.x);
    out.put("y", pos.y);
    out.put("z", pos.z);
    out.put("isMovable", true);
    out
}

fn custom_name(te: &NbtCompound, out: &mut NbtCompound) {
    if let Some(name) = te.get_str("CustomName") {
        let text = plain_text(name);
        if !text.is_empty() {
            out.put("CustomName", text);
        }
    }
}

fn dye_color(name: &str) -> i32 {
    SIGN_COLORS
        .iter()
        .find(|(_, n)| *n == name)
        .map_or(0xFF00_0000u32, |&(argb, _)| argb) as i32
}

fn sign_side(side: Option<&NbtCompound>) -> NbtCompound {
    let lines: Vec<String> = side
        .and_then(|s| s.get_list("messages"))
        .unwrap_or_default()
        .iter()
        .filter_map(|t| t.as_string())
        .map(plain_text)
        .collect();
    let mut text = lines.join("\n");
    while text.ends_with('\n') {
        text.pop();
    }
    let mut out = NbtCompound::new();
    out.put("Text", text);
    out.put("TextOwner", "");
    out.put("SignTextColor", dye_color(side.and_then(|s| s.get_str("color")).unwrap_or("black")));
    out.put("IgnoreLighting", side.and_then(|s| s.get_bool("has_glowing_text")).unwrap_or(false));
    out.put("HideGlowOutline", false);
    out.put("PersistFormatting", true);
    out
}

/// Pre-1.20 signs keep `Text1`..`Text4` and one colour on the compound.
fn legacy_sign_side(te: &NbtCompound) -> NbtCompound {
    let mut side = NbtCompound::new();
    let messages = (1..=4)
        .map(|i| NbtTag::String(te.get_str(&format!("Text{i}")).unwrap_or("").to_string()))
        .collect();
    side.put("messages", NbtTag::List(messages));
    side.put("color", te.get_str("Color").unwrap_or("black"));
    side.put("has_glowing_text", te.get_bool("GlowingText").unwrap_or(false));
    side
}

fn sign(te: &NbtCompound, out: &mut NbtCompound) {
    match te.get_compound("front_text") {
        Some(front) => out.put("FrontText", sign_side(Some(front))),
        None => out.put("FrontText", sign_side(Some(&legacy_sign_side(te)))),
    }
    out.put("BackText", sign_side(te.get_compound("back_text")));
    out.put("IsWaxed", te.get_bool("is_waxed").unwrap_or(false));
}

fn beacon(te: &NbtCompound, out: &mut NbtCompound) {
    for (from, to) in [("primary_effect", "primary"), ("secondary_effect", "secondary")] {
        let id = te
            .get_str(from)
            .map(|n| n.strip_prefix("minecraft:").unwrap_or(n))
            .and_then(|n| BEACON_EFFECTS.iter().find(|(_, name)| *name == n))
            .map_or(0, |&(id, _)| id);
        out.put(to, id);
    }
}

fn spawner(te: &NbtCompound, out: &mut NbtCompound) {
    let id = te
        .get_compound("SpawnData")
        .and_then(|d| d.get_compound("entity"))
        .and_then(|e| e.get_str("id"));
    if let Some(id) = id {
        out.put("EntityIdentifier", bedrock_entity_id(id).0);
    }
    for (key, default) in [
        ("Delay", 20),
        ("MinSpawnDelay", 200),
        ("MaxSpawnDelay", 800),
        ("SpawnCount", 4),
        ("MaxNearbyEntities", 6),
        ("RequiredPlayerRange", 16),
        ("SpawnRange", 4),
    ] {
        out.put(key, te.get_integer(key).unwrap_or(default) as i16);
    }
}

fn campfire(te: &NbtCompound, out: &mut NbtCompound) {
    for item in te.get_list("Items").unwrap_or_default().iter().filter_map(|t| t.as_compound()) {
        let Some(slot) = item.get_integer("Slot").filter(|s| (0..4).contains(s)) else {
            continue;
        };
        if let Some(stack) = item_to_bedrock(item) {
            out.put(&format!("Item{}", slot + 1), stack);
        }
    }
    let times = te.get_int_array("CookingTimes").unwrap_or_default();
    for slot in 0..4 {
        out.put(&format!("ItemTime{}", slot + 1), times.get(slot).copied().unwrap_or(0));
    }
}

fn lectern(te: &NbtCompound, out: &mut NbtCompound) {
    let book = te.get_compound("Book").and_then(item_to_bedrock);
    out.put("hasBook", book.is_some());
    if let Some(book) = book {
        out.put("book", book);
        out.put("page", te.get_integer("Page").unwrap_or(0) as i32);
    }
}

fn jukebox(te: &NbtCompound, out: &mut NbtCompound) {
    if let Some(record) = te.get_compound("RecordItem").and_then(item_to_bedrock) {
        out.put("RecordItem", record);
    }
}

fn comparator(te: &NbtCompound, out: &mut NbtCompound) {
    out.put("OutputSignal", te.get_integer("OutputSignal").unwrap_or(0) as i32);
}

fn container(bedrock: &str, te: &NbtCompound, out: &mut NbtCompound) {
    custom_name(te, out);
    out.put("Items", slotted_items(te, "Items", 0));
    if let Some(lock) = te.get_str("Lock").filter(|l| !l.is_empty()) {
        out.put("Lock", lock);
    }
    match bedrock {
        "Furnace" | "BlastFurnace" | "Smoker" => {
            out.put("BurnTime", te.get_integer("BurnTime").unwrap_or(0) as i16);
            out.put("CookTime", te.get_integer("CookTime").unwrap_or(0) as i16);
            out.put("CookTimeTotal", te.get_integer("CookTimeTotal").unwrap_or(200) as i16);
        }
        "BrewingStand" => {
            out.put("CookTime", te.get_integer("BrewTime").unwrap_or(0) as i16);
            out.put("FuelAmount", te.get_integer("Fuel").unwrap_or(0) as i16);
        }
        "Hopper" => out.put("TransferCooldown", te.get_integer("TransferCooldown").unwrap_or(0) as i32),
        "ChiseledBookshelf" => out.put("LastInteractedSlot", bookshelf_slot(te)),
        _ => {}
    }
}

/// Bedrock's `last_interacted_slot`: 0 for none, then slots 1 to 6.
pub fn bookshelf_slot(te: &NbtCompound) -> i32 {
    te.get_integer("last_interacted_slot").map_or(0, |s| (s as i32 + 1).clamp(0, 6))
}

/// Convert the Java block entity at `pos`; `None` when Bedrock has no
/// counterpart.
pub fn convert_block_entity(te: &NbtCompound, pos: Pos3i) -> Option<NbtCompound> {
    let id = te.get_str("id")?;
    let local = id.strip_prefix("minecraft:").unwrap_or(id);
    let bedrock = match local {
        "trapped_chest" => "Chest",
        "sign" => "Sign",
        "hanging_sign" => "HangingSign",
        "beacon" => "Beacon",
        "comparator" => "Comparator",
        "mob_spawner" => "MobSpawner",
        "campfire" => "Campfire",
        "lectern" => "Lectern",
        "jukebox" => "Jukebox",
        _ => match CONTAINER_IDS.get(local).or_else(|| SIMPLE_IDS.get(local)) {
            Some(&b) => b,
            None => {
                tracing::debug!(id, x = pos.x, y = pos.y, z = pos.z, "unknown block entity dropped");
                return None;
            }
        },
    };
    let mut out = header(bedrock, pos);
    match local {
        "sign" | "hanging_sign" => sign(te, &mut out),
        "beacon" => beacon(te, &mut out),
        "comparator" => comparator(te, &mut out),
        "mob_spawner" => spawner(te, &mut out),
        "campfire" => campfire(te, &mut out),
        "lectern" => lectern(te, &mut out),
        "jukebox" => jukebox(te, &mut out),
        "trapped_chest" => container("Chest", te, &mut out),
        _ if CONTAINER_IDS.contains_key(local) => container(bedrock, te, &mut out),
        _ => custom_name(te, &mut out),
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn te(id: &str) -> NbtCompound {
        let mut c = NbtCompound::new();
        c.put("id", id);
        c
    }

    #[test]
    fn chest_items_and_name() {
        let mut chest = te("minecraft:chest");
        chest.put("CustomName", r#"{"text":"Loot"}"#);
        let mut item = NbtCompound::new();
        item.put("id", "minecraft:diamond");
        item.put("count", 3);
        item.put("Slot", 5i8);
        chest.put("Items", NbtTag::List(vec![NbtTag::Compound(item)]));

        let out = convert_block_entity(&chest, Pos3i::new(1, 2, 3)).unwrap();
        assert_eq!(out.get_str("id"), Some("Chest"));
        assert_eq!(out.get_int("y"), Some(2));
        assert_eq!(out.get_str("CustomName"), Some("Loot"));
        let items = out.get_list("Items").unwrap();
        let first = items[0].as_compound().unwrap();
        assert_eq!(first.get_str("Name"), Some("minecraft:diamond"));
        assert_eq!(first.get_byte("Slot"), Some(5));
        assert_eq!(first.get_byte("Count"), Some(3));
    }

    #[test]
    fn sign_text_joined() {
        let mut sign = te("minecraft:sign");
        let mut front = NbtCompound::new();
        front.put(
            "messages",
            NbtTag::List(
                [r#"{"text":"Hello"}"#, r#""World""#, r#"{"text":""}"#, r#"{"text":""}"#]
                    .iter()
                    .map(|&s| NbtTag::String(s.to_string()))
                    .collect(),
            ),
        );
        front.put("color", "red");
        front.put("has_glowing_text", true);
        sign.put("front_text", front);
        let out = convert_block_entity(&sign, Pos3i::new(0, 0, 0)).unwrap();
        let front = out.get_compound("FrontText").unwrap();
        assert_eq!(front.get_str("Text"), Some("Hello\nWorld"));
        assert_eq!(front.get_int("SignTextColor"), Some(0xFFB0_2E26u32 as i32));
        assert_eq!(front.get_bool("IgnoreLighting"), Some(true));
        assert_eq!(out.get_compound("BackText").unwrap().get_str("Text"), Some(""));
    }

    #[test]
    fn legacy_sign() {
        let mut sign = te("minecraft:sign");
        sign.put("Text1", r#"{"text":"Old"}"#);
        let out = convert_block_entity(&sign, Pos3i::new(0, 0, 0)).unwrap();
        assert_eq!(out.get_compound("FrontText").unwrap().get_str("Text"), Some("Old"));
    }

    #[test]
    fn bookshelf_slot_is_shifted() {
        let mut shelf = te("minecraft:chiseled_bookshelf");
        shelf.put("last_interacted_slot", 2);
        let out = convert_block_entity(&shelf, Pos3i::new(0, 0, 0)).unwrap();
        assert_eq!(out.get_str("id"), Some("ChiseledBookshelf"));
        assert_eq!(out.get_int("LastInteractedSlot"), Some(3));
        assert_eq!(bookshelf_slot(&te("minecraft:chiseled_bookshelf")), 0);
    }

    #[test]
    fn beacon_and_spawner() {
        let mut beacon = te("minecraft:beacon");
        beacon.put("primary_effect", "minecraft:haste");
        let out = convert_block_entity(&beacon, Pos3i::new(0, 0, 0)).unwrap();
        assert_eq!(out.get_int("primary"), Some(3));
        assert_eq!(out.get_int("secondary"), Some(0));

        let mut spawner = te("minecraft:mob_spawner");
        let mut entity = NbtCompound::new();
        entity.put("id", "minecraft:zombified_piglin");
        let mut data = NbtCompound::new();
        data.put("entity", entity);
        spawner.put("SpawnData", data);
        let out = convert_block_entity(&spawner, Pos3i::new(0, 0, 0)).unwrap();
        assert_eq!(out.get_str("EntityIdentifier"), Some("minecraft:zombie_pigman"));
        assert_eq!(out.get_short("Delay"), Some(20));
    }

    #[test]
    fn unknown_is_dropped() {
        assert!(convert_block_entity(&te("minecraft:no_such_thing"), Pos3i::new(0, 0, 0)).is_none());
    }
}
