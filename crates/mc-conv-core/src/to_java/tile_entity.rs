//! Bedrock block entities to Java block entities.

use std::collections::HashMap;

use mc_conv_nbt::{CompoundExt, NbtCompound, NbtTag};
use mc_conv_world::{Block, BlockState, Facing6, Pos3i};
use once_cell::sync::Lazy;

use super::entity::{java_uuid, slotted_items, text_component, uuid_tag};
use crate::block_map::entities::java_entity_id;
use crate::block_map::items::item_to_java;
use crate::block_map::{decode_dir, FACING_DIRECTIONS};

#[derive(Debug, Clone, PartialEq)]
pub enum Converted {
    BlockEntity(NbtCompound),
    /// Stored as a block entity in Bedrock but an entity in Java.
    Entity(NbtCompound),
    /// No Java counterpart, or handled by a terraform pass.
    Dropped,
}

/// Bedrock ids whose Java block entity only needs the shared fields.
pub(crate) const SIMPLE: &[(&str, &str)] = &[
    ("Bed", "bed"),
    ("Bell", "bell"),
    ("EnderChest", "ender_chest"),
    ("EnchantTable", "enchanting_table"),
    ("Conduit", "conduit"),
    ("Skull", "skull"),
    ("Banner", "banner"),
    ("DaylightDetector", "daylight_detector"),
    ("EndPortal", "end_portal"),
    ("EndGateway", "end_gateway"),
    ("SculkSensor", "sculk_sensor"),
    ("CalibratedSculkSensor", "calibrated_sculk_sensor"),
    ("SculkCatalyst", "sculk_catalyst"),
    ("SculkShrieker", "sculk_shrieker"),
    ("DecoratedPot", "decorated_pot"),
    ("BrushableBlock", "brushable_block"),
    ("Beehive", "beehive"),
    ("TrialSpawner", "trial_spawner"),
    ("Vault", "vault"),
    ("CommandBlock", "command_block"),
    ("StructureBlock", "structure_block"),
];

/// Bedrock ids of containers with an `Items` list.
pub(crate) const CONTAINERS: &[(&str, &str)] = &[
    ("Chest", "chest"),
    ("Barrel", "barrel"),
    ("ShulkerBox", "shulker_box"),
    ("Furnace", "furnace"),
    ("BlastFurnace", "blast_furnace"),
    ("Smoker", "smoker"),
    ("Hopper", "hopper"),
    ("Dispenser", "dispenser"),
    ("Dropper", "dropper"),
    ("BrewingStand", "brewing_stand"),
    ("Crafter", "crafter"),
    ("ChiseledBookshelf", "chiseled_bookshelf"),
];

/// Handled by terraform passes or absent from Java.
const DROPPED: &[&str] = &[
    "Music",
    "PistonArm",
    "MovingBlock",
    "Cauldron",
    "FlowerPot",
    "NetherReactor",
    "Lodestone",
    "JigsawBlock",
];

static SIMPLE_IDS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| SIMPLE.iter().copied().collect());
static CONTAINER_IDS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| CONTAINERS.iter().copied().collect());

pub(crate) const BEACON_EFFECTS: &[(i32, &str)] = &[
    (1, "speed"),
    (3, "haste"),
    (5, "strength"),
    (8, "jump_boost"),
    (10, "regeneration"),
    (11, "resistance"),
];

/// Dye colours as Bedrock stores sign text colour (ARGB).
pub(crate) const SIGN_COLORS: [(u32, &str); 16] = [
    (0xFFF0_F0F0, "white"),
    (0xFFF9_801D, "orange"),
    (0xFFC7_4EBD, "magenta"),
    (0xFF3A_B3DA, "light_blue"),
    (0xFFFE_D83D, "yellow"),
    (0xFF80_C71F, "lime"),
    (0xFFF3_8BAA, "pink"),
    (0xFF47_4F52, "gray"),
    (0xFF9D_9D97, "light_gray"),
    (0xFF16_9C9C, "cyan"),
    (0xFF89_32B8, "purple"),
    (0xFF3C_44AA, "blue"),
    (0xFF83_5432, "brown"),
    (0xFF5E_7C16, "green"),
    (0xFFB0_2E26, "red"),
    (0xFF1D_1D21, "black"),
];

fn nearest_dye(argb: u32) -> &'static str {
    let channel = |v: u32, shift: u32| ((v >> shift) & 0xFF) as i32;
    SIGN_COLORS
        .iter()
        .min_by_key(|(c, _)| {
            [16, 8, 0]
                .iter()
                .map(|&s| (channel(*c, s) - channel(argb, s)).pow(2))
                .sum::<i32>()
        })
        .map_or("black", |&(_, name)| name)
}

fn header(id: &str, pos: Pos3i) -> NbtCompound {
    let mut out = NbtCompound::new();
    out.put("id", format!("minecraft:{id}"));
    out.put("x", pos.x);
    out.put("y", pos.y);
    out.put("z", pos.z);
    out.put("keepPacked", false);
    out
}

fn custom_name(te: &NbtCompound, out: &mut NbtCompound) {
    if let Some(name) = te.get_str("CustomName").filter(|n| !n.is_empty()) {
        out.put("CustomName", text_component(name));
    }
}

fn sign_side(side: Option<&NbtCompound>) -> NbtCompound {
    let text = side.and_then(|s| s.get_str("Text")).unwrap_or("");
    let mut lines: Vec<NbtTag> = text
        .split('\n')
        .take(4)
        .map(|l| NbtTag::String(text_component(l)))
        .collect();
    lines.resize(4, NbtTag::String(text_component("")));
    let color = side
        .and_then(|s| s.get_integer("SignTextColor"))
        .map_or("black", |c| nearest_dye(c as u32));
    let mut out = NbtCompound::new();
    out.put("messages", NbtTag::List(lines));
    out.put("color", color);
    out.put("has_glowing_text", side.and_then(|s| s.get_bool("IgnoreLighting")).unwrap_or(false));
    out
}

fn sign(te: &NbtCompound, out: &mut NbtCompound) {
    // Old worlds keep a single `Text` on the compound itself.
    let front = te.get_compound("FrontText").or(Some(te));
    out.put("front_text", sign_side(front));
    out.put("back_text", sign_side(te.get_compound("BackText")));
    out.put("is_waxed", te.get_bool("IsWaxed").unwrap_or(false));
}

fn beacon(te: &NbtCompound, out: &mut NbtCompound) {
    for (from, to) in [("primary", "primary_effect"), ("secondary", "secondary_effect")] {
        let effect = te
            .get_integer(from)
            .and_then(|id| BEACON_EFFECTS.iter().find(|(n, _)| i64::from(*n) == id));
        if let Some((_, name)) = effect {
            out.put(to, format!("minecraft:{name}"));
        }
    }
}

fn spawner(te: &NbtCompound, out: &mut NbtCompound) {
    if let Some(id) = te.get_str("EntityIdentifier").filter(|i| !i.is_empty()) {
        let mut entity = NbtCompound::new();
        entity.put("id", java_entity_id(id, 0));
        let mut data = NbtCompound::new();
        data.put("entity", entity);
        out.put("SpawnData", data);
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
    let mut items = Vec::new();
    let mut times = Vec::with_capacity(4);
    for slot in 1..=4 {
        if let Some(mut item) = te.get_compound(&format!("Item{slot}")).and_then(item_to_java) {
            item.put("Slot", (slot - 1) as i8);
            items.push(NbtTag::Compound(item));
        }
        times.push(te.get_integer(&format!("ItemTime{slot}")).unwrap_or(0) as i32);
    }
    out.put("Items", NbtTag::List(items));
    out.put("CookingTimes", NbtTag::IntArray(times));
    out.put("CookingTotalTimes", NbtTag::IntArray(vec![600; 4]));
}

fn lectern(te: &NbtCompound, out: &mut NbtCompound) {
    if let Some(book) = te.get_compound("book").and_then(item_to_java) {
        out.put("Book", book);
        out.put("Page", te.get_integer("page").unwrap_or(0) as i32);
    }
}

fn jukebox(te: &NbtCompound, out: &mut NbtCompound) {
    if let Some(record) = te.get_compound("RecordItem").and_then(item_to_java) {
        out.put("RecordItem", record);
    }
}

fn comparator(te: &NbtCompound, out: &mut NbtCompound) {
    out.put("OutputSignal", te.get_integer("OutputSignal").unwrap_or(0) as i32);
}

fn container(te: &NbtCompound, out: &mut NbtCompound) {
    custom_name(te, out);
    out.put("Items", slotted_items(te, "Items", 0));
    if let Some(lock) = te.get_str("Lock").filter(|l| !l.is_empty()) {
        out.put("Lock", lock);
    }
    match te.get_str("id") {
        Some("Furnace" | "BlastFurnace" | "Smoker") => {
            out.put("BurnTime", te.get_integer("BurnTime").unwrap_or(0) as i16);
            out.put("CookTime", te.get_integer("CookTime").unwrap_or(0) as i16);
            out.put("CookTimeTotal", te.get_integer("CookTimeTotal").unwrap_or(200) as i16);
        }
        Some("BrewingStand") => {
            out.put("BrewTime", te.get_integer("CookTime").unwrap_or(0) as i16);
            out.put("Fuel", te.get_integer("FuelAmount").unwrap_or(0) as i8);
        }
        Some("Hopper") => out.put("TransferCooldown", te.get_integer("TransferCooldown").unwrap_or(0) as i32),
        Some("ChiseledBookshelf") => {
            let slot = te.get_integer("LastInteractedSlot").unwrap_or(0) as i32;
            out.put("last_interacted_slot", slot - 1);
        }
        _ => {}
    }
}

/// Item frames are blocks with a block entity in Bedrock and hanging
/// entities in Java. `state` is the Bedrock frame block at `pos`.
fn item_frame(te: &NbtCompound, pos: Pos3i, state: Option<&BlockState>, glow: bool) -> NbtCompound {
    let facing = decode_dir(&FACING_DIRECTIONS, state.and_then(|s| s.get_int("facing_direction")), Facing6::Up);
    let v = facing.vec();
    let offset = 0.468_75;
    let mut out = NbtCompound::new();
    out.put("id", if glow { "minecraft:glow_item_frame" } else { "minecraft:item_frame" });
    let centre = [
        f64::from(pos.x) + 0.5 - f64::from(v.x) * offset,
        f64::from(pos.y) + 0.5 - f64::from(v.y) * offset,
        f64::from(pos.z) + 0.5 - f64::from(v.z) * offset,
    ];
    out.put("Pos", NbtTag::List(centre.iter().map(|&c| NbtTag::Double(c)).collect()));
    out.put("Motion", NbtTag::List(vec![NbtTag::Double(0.0); 3]));
    out.put("Rotation", NbtTag::List(vec![NbtTag::Float(0.0); 2]));
    out.put("Facing", facing.to_java_3d_data() as i8);
    out.put("TileX", pos.x);
    out.put("TileY", pos.y);
    out.put("TileZ", pos.z);
    let seed = (i64::from(pos.x) << 38) ^ (i64::from(pos.z) << 12) ^ i64::from(pos.y) ^ 0x00F2_A3E0;
    out.put("UUID", uuid_tag(java_uuid(seed)));
    if let Some(item) = te.get_compound("Item").and_then(item_to_java) {
        out.put("Item", item);
    }
    let rotation = te.get_float("ItemRotation").unwrap_or(0.0);
    out.put("ItemRotation", ((rotation / 45.0).round() as i32).rem_euclid(8) as i8);
    out.put("ItemDropChance", te.get_float("ItemDropChance").unwrap_or(1.0));
    out.put("Fixed", false);
    out.put("Invisible", false);
    out
}

/// Convert the block entity at `pos`. `state` is the Bedrock block there
/// and `block` its Java translation.
pub fn convert_block_entity(te: &NbtCompound, pos: Pos3i, state: Option<&BlockState>, block: Option<&Block>) -> Converted {
    let Some(id) = te.get_str("id") else {
        return Converted::Dropped;
    };
    if DROPPED.contains(&id) {
        return Converted::Dropped;
    }
    let java_id = match id {
        "ItemFrame" => return Converted::Entity(item_frame(te, pos, state, false)),
        "GlowItemFrame" => return Converted::Entity(item_frame(te, pos, state, true)),
        "Chest" if block.is_some_and(|b| b.local_name() == "trapped_chest") => "trapped_chest",
        "Sign" => "sign",
        "HangingSign" => "hanging_sign",
        "Beacon" => "beacon",
        "Comparator" => "comparator",
        "MobSpawner" => "mob_spawner",
        "Campfire" => "campfire",
        "Lectern" => "lectern",
        "Jukebox" => "jukebox",
        _ => match CONTAINER_IDS.get(id).or_else(|| SIMPLE_IDS.get(id)) {
            Some(&java) => java,
            None => {
                tracing::debug!(id, x = pos.x, y = pos.y, z = pos.z, "unknown block entity dropped");
                return Converted::Dropped;
            }
        },
    };
    let mut out = header(java_id, pos);
    match id {
        "Sign" | "HangingSign" => sign(te, &mut out),
        "Beacon" => beacon(te, &mut out),
        "Comparator" => comparator(te, &mut out),
        "MobSpawner" => spawner(te, &mut out),
        "Campfire" => campfire(te, &mut out),
        "Lectern" => lectern(te, &mut out),
        "Jukebox" => jukebox(te, &mut out),
        _ if CONTAINER_IDS.contains_key(id) => container(te, &mut out),
        _ => custom_name(te, &mut out),
    }
    Converted::BlockEntity(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn te(id: &str) -> NbtCompound {
        let mut c = NbtCompound::new();
        c.put("id", id);
        c
    }

    fn stack(name: &str, slot: i8) -> NbtTag {
        let mut item = NbtCompound::new();
        item.put("Name", name);
        item.put("Count", 3i8);
        item.put("Slot", slot);
        NbtTag::Compound(item)
    }

    #[test]
    fn chest_contents() {
        let mut chest = te("Chest");
        chest.put("Items", NbtTag::List(vec![stack("minecraft:diamond", 4), stack("minecraft:air", 5)]));
        chest.put("CustomName", "Loot");
        let trapped = Block::new("trapped_chest");
        let Converted::BlockEntity(out) = convert_block_entity(&chest, Pos3i::new(1, 2, 3), None, Some(&trapped))
        else {
            panic!("chest should stay a block entity");
        };
        assert_eq!(out.get_str("id"), Some("minecraft:trapped_chest"));
        assert_eq!(out.get_int("y"), Some(2));
        let items = out.get_list("Items").unwrap();
        assert_eq!(items.len(), 1);
        let item = items[0].as_compound().unwrap();
        assert_eq!(item.get_byte("Slot"), Some(4));
        assert_eq!(item.get_str("id"), Some("minecraft:diamond"));
        assert_eq!(out.get_str("CustomName"), Some(r#"{"text":"Loot"}"#));
    }

    #[test]
    fn frame_becomes_entity() {
        let mut frame = te("ItemFrame");
        frame.put("ItemRotation", 90.0f32);
        let state = BlockState::new("frame").with("facing_direction", 2);
        let Converted::Entity(out) = convert_block_entity(&frame, Pos3i::new(10, 64, 10), Some(&state), None) else {
            panic!("frame should become an entity");
        };
        assert_eq!(out.get_str("id"), Some("minecraft:item_frame"));
        assert_eq!(out.get_byte("Facing"), Some(2));
        assert_eq!(out.get_byte("ItemRotation"), Some(2));
        let z = out.get_list("Pos").unwrap()[2].as_double().unwrap();
        assert!((z - 10.96875).abs() < 1e-9);
    }

    #[test]
    fn sign_text_and_colour() {
        let mut front = NbtCompound::new();
        front.put("Text", "Hello\nWorld");
        front.put("SignTextColor", 0xFFB0_2E26u32 as i32);
        let mut s = te("Sign");
        s.put("FrontText", front);
        let Converted::BlockEntity(out) = convert_block_entity(&s, Pos3i::new(0, 0, 0), None, None) else {
            panic!();
        };
        let front = out.get_compound("front_text").unwrap();
        let messages = front.get_list("messages").unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].as_string(), Some(r#"{"text":"World"}"#));
        assert_eq!(front.get_str("color"), Some("red"));
    }

    #[test]
    fn terraform_owned_entities_are_dropped() {
        for id in ["Music", "PistonArm", "MovingBlock", "SomethingNew"] {
            assert_eq!(convert_block_entity(&te(id), Pos3i::new(0, 0, 0), None, None), Converted::Dropped);
        }
    }
}
