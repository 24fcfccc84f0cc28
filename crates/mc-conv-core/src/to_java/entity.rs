//! Bedrock actors to Java entities.
//!
//! Every entity goes through a base conversion followed by the ordered
//! behaviors registered for its Java id. Cross-chunk references (leashes,
//! riders) are only recorded here; the resolver wires them up once every
//! chunk has been converted.

use std::collections::HashMap;

use mc_conv_nbt::{CompoundExt, NbtCompound, NbtTag};
use mc_conv_world::{Dimension, Pos2i, Pos3i};
use once_cell::sync::Lazy;

use super::context::{Context, Leash, Vehicle};
use crate::block_map::entities::java_entity_id;
use crate::block_map::items::item_to_java;

/// A mutation applied after the base conversion: `(bedrock, java)`.
pub type Behavior = fn(&NbtCompound, &mut NbtCompound);

// ─── Ids ────────────────────────────────────────────────────────────────────

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Java UUID derived from a Bedrock unique id. The same id always yields
/// the same UUID, so references between entities survive conversion.
pub fn java_uuid(unique_id: i64) -> [i32; 4] {
    let hi = splitmix64(unique_id as u64);
    let lo = splitmix64(hi);
    // Version 4, IETF variant.
    let hi = (hi & !0xF000) | 0x4000;
    let lo = (lo & !(0xC000_0000_0000_0000)) | 0x8000_0000_0000_0000;
    [(hi >> 32) as i32, hi as i32, (lo >> 32) as i32, lo as i32]
}

pub fn uuid_tag(uuid: [i32; 4]) -> NbtTag {
    NbtTag::IntArray(uuid.to_vec())
}

pub fn has_uuid(entity: &NbtCompound, uuid: [i32; 4]) -> bool {
    entity.get_int_array("UUID") == Some(&uuid[..])
}

// ─── Base ───────────────────────────────────────────────────────────────────

fn floats(src: &NbtCompound, key: &str) -> Option<Vec<f32>> {
    let list = src.get_list(key)?;
    list.iter().map(|t| t.as_number().map(|v| v as f32)).collect()
}

fn doubles(values: &[f32]) -> NbtTag {
    NbtTag::List(values.iter().map(|&v| NbtTag::Double(f64::from(v))).collect())
}

/// Entity position rounded down to the block it stands in.
pub fn block_pos(src: &NbtCompound) -> Option<Pos3i> {
    let p = floats(src, "Pos")?;
    match p.as_slice() {
        [x, y, z] => Some(Pos3i::new(x.floor() as i32, y.floor() as i32, z.floor() as i32)),
        _ => None,
    }
}

/// Plain text as a JSON text component.
pub fn text_component(text: &str) -> String {
    serde_json::json!({ "text": text }).to_string()
}

fn base(src: &NbtCompound, id: String) -> NbtCompound {
    let mut out = NbtCompound::new();
    out.put("id", id);
    let pos = floats(src, "Pos").filter(|p| p.len() == 3).unwrap_or_else(|| vec![0.0; 3]);
    out.put("Pos", doubles(&pos));
    let motion = floats(src, "Motion").filter(|p| p.len() == 3).unwrap_or_else(|| vec![0.0; 3]);
    out.put("Motion", doubles(&motion));
    let rotation = floats(src, "Rotation").filter(|p| p.len() == 2).unwrap_or_else(|| vec![0.0; 2]);
    out.put("Rotation", NbtTag::List(rotation.into_iter().map(NbtTag::Float).collect()));
    if let Some(uid) = src.get_long("UniqueID") {
        out.put("UUID", uuid_tag(java_uuid(uid)));
    }
    out.put("OnGround", src.get_bool("OnGround").unwrap_or(false));
    out.put("Invulnerable", src.get_bool("Invulnerable").unwrap_or(false));
    out.put("Fire", src.get_integer("Fire").unwrap_or(-1) as i16);
    out.put("Air", src.get_integer("Air").unwrap_or(300) as i16);
    out.put("FallDistance", src.get_float("FallDistance").unwrap_or(0.0));
    if let Some(name) = src.get_str("CustomName").filter(|n| !n.is_empty()) {
        out.put("CustomName", text_component(name));
        out.put("CustomNameVisible", src.get_bool("CustomNameVisible").unwrap_or(false));
    }
    out
}

// ─── Behaviors ──────────────────────────────────────────────────────────────

fn items(src: &NbtCompound, key: &str, len: usize) -> NbtTag {
    let list = src.get_list(key).unwrap_or_default();
    NbtTag::List(
        (0..len)
            .map(|i| {
                let item = list.get(i).and_then(|t| t.as_compound()).and_then(item_to_java);
                NbtTag::Compound(item.unwrap_or_default())
            })
            .collect(),
    )
}

fn living(src: &NbtCompound, out: &mut NbtCompound) {
    let health = src
        .get_list("Attributes")
        .unwrap_or_default()
        .iter()
        .filter_map(|t| t.as_compound())
        .find(|a| a.get_str("Name") == Some("minecraft:health"))
        .and_then(|a| a.get_float("Current"));
    if let Some(h) = health {
        out.put("Health", h);
    }
    out.put("PersistenceRequired", src.get_bool("Persistent").unwrap_or(false));
    out.put("LeftHanded", false);
    // Bedrock armor is head to feet, Java is feet to head.
    let armor = items(src, "Armor", 4);
    if let NbtTag::List(mut list) = armor {
        list.reverse();
        out.put("ArmorItems", NbtTag::List(list));
    }
    let mut hands = Vec::with_capacity(2);
    for key in ["Mainhand", "Offhand"] {
        if let NbtTag::List(mut l) = items(src, key, 1) {
            hands.append(&mut l);
        }
    }
    out.put("HandItems", NbtTag::List(hands));
}

fn breedable(src: &NbtCompound, out: &mut NbtCompound) {
    let baby = src.get_bool("IsBaby").unwrap_or(false);
    out.put("Age", if baby { -24000 } else { 0 });
    out.put("InLove", 0);
}

fn zombie_like(src: &NbtCompound, out: &mut NbtCompound) {
    out.put("IsBaby", src.get_bool("IsBaby").unwrap_or(false));
}

fn tameable(src: &NbtCompound, out: &mut NbtCompound) {
    if let Some(owner) = src.get_long("OwnerNew").filter(|&o| o != -1) {
        out.put("Owner", uuid_tag(java_uuid(owner)));
    }
    out.put("Sitting", src.get_bool("Sitting").unwrap_or(false));
}

fn collar(src: &NbtCompound, out: &mut NbtCompound) {
    out.put("CollarColor", src.get_integer("Color").unwrap_or(14) as i8);
}

fn sheep(src: &NbtCompound, out: &mut NbtCompound) {
    out.put("Color", src.get_integer("Color").unwrap_or(0) as i8);
    out.put("Sheared", src.get_bool("Sheared").unwrap_or(false));
}

fn saddle(src: &NbtCompound, out: &mut NbtCompound) {
    out.put("Saddle", src.get_bool("Saddled").unwrap_or(false));
}

fn horse(src: &NbtCompound, out: &mut NbtCompound) {
    out.put("Tame", src.get_bool("IsTamed").unwrap_or(false));
    let variant = src.get_integer("Variant").unwrap_or(0) + src.get_integer("MarkVariant").unwrap_or(0) * 256;
    out.put("Variant", variant as i32);
    if src.get_bool("Saddled").unwrap_or(false) {
        let mut item = NbtCompound::new();
        item.put("id", "minecraft:saddle");
        item.put("count", 1);
        out.put("SaddleItem", item);
    }
}

fn chested(src: &NbtCompound, out: &mut NbtCompound) {
    let chested = src.get_bool("Chested").unwrap_or(false);
    out.put("ChestedHorse", chested);
    if chested {
        out.put("Items", slotted_items(src, "ChestItems", 2));
    }
}

/// Container contents keyed by `Slot`, shifted by `offset` for entities
/// whose first slots hold equipment.
pub fn slotted_items(src: &NbtCompound, key: &str, offset: i64) -> NbtTag {
    let list = src.get_list(key).unwrap_or_default();
    NbtTag::List(
        list.iter()
            .filter_map(|t| t.as_compound())
            .filter_map(|item| {
                let slot = item.get_integer("Slot")?;
                let mut java = item_to_java(item)?;
                java.put("Slot", (slot + offset) as i8);
                Some(NbtTag::Compound(java))
            })
            .collect(),
    )
}

pub(crate) const PROFESSIONS: [&str; 15] = [
    "none",
    "farmer",
    "fisherman",
    "shepherd",
    "fletcher",
    "librarian",
    "cartographer",
    "cleric",
    "armorer",
    "weaponsmith",
    "toolsmith",
    "butcher",
    "leatherworker",
    "mason",
    "nitwit",
];

pub(crate) const VILLAGER_TYPES: [&str; 7] = ["plains", "desert", "jungle", "savanna", "snow", "swamp", "taiga"];

fn villager(src: &NbtCompound, out: &mut NbtCompound) {
    let pick = |table: &[&'static str], key: &str| {
        usize::try_from(src.get_integer(key).unwrap_or(0))
            .ok()
            .and_then(|i| table.get(i).copied())
            .unwrap_or(table[0])
    };
    let mut data = NbtCompound::new();
    data.put("profession", format!("minecraft:{}", pick(&PROFESSIONS, "Variant")));
    data.put("type", format!("minecraft:{}", pick(&VILLAGER_TYPES, "MarkVariant")));
    data.put("level", (src.get_integer("TradeTier").unwrap_or(0) + 1) as i32);
    out.put("VillagerData", data);
    out.put("Xp", src.get_integer("TradeExperience").unwrap_or(0) as i32);
}

fn item(src: &NbtCompound, out: &mut NbtCompound) {
    if let Some(stack) = src.get_compound("Item").and_then(item_to_java) {
        out.put("Item", stack);
    }
    out.put("Age", src.get_integer("Age").unwrap_or(0) as i16);
    out.put("PickupDelay", 0i16);
}

/// `BurningSkull` → `burning_skull`.
fn snake_case(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for (i, c) in camel.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn hanging(src: &NbtCompound, out: &mut NbtCompound) {
    if let Some(p) = block_pos(src) {
        out.put("TileX", p.x);
        out.put("TileY", p.y);
        out.put("TileZ", p.z);
    }
}

fn painting(src: &NbtCompound, out: &mut NbtCompound) {
    hanging(src, out);
    let motive = src.get_str("Motive").unwrap_or("Kebab");
    out.put("variant", format!("minecraft:{}", snake_case(motive)));
    out.put("facing", src.get_integer("Direction").unwrap_or(0) as i8);
}

fn put_variant(src: &NbtCompound, out: &mut NbtCompound, key: &str) {
    out.put(key, src.get_integer("Variant").unwrap_or(0) as i32);
}

fn parrot(src: &NbtCompound, out: &mut NbtCompound) {
    put_variant(src, out, "Variant");
}

fn rabbit(src: &NbtCompound, out: &mut NbtCompound) {
    put_variant(src, out, "RabbitType");
}

fn llama(src: &NbtCompound, out: &mut NbtCompound) {
    put_variant(src, out, "Variant");
    out.put("Strength", src.get_integer("Strength").unwrap_or(1) as i32);
}

fn fox(src: &NbtCompound, out: &mut NbtCompound) {
    out.put("Type", if src.get_integer("Variant") == Some(1) { "snow" } else { "red" });
}

pub(crate) const CATS: [&str; 11] = [
    "white",
    "tabby",
    "red",
    "siamese",
    "british_shorthair",
    "calico",
    "persian",
    "ragdoll",
    "jellie",
    "black",
    "all_black",
];

fn cat(src: &NbtCompound, out: &mut NbtCompound) {
    let i = usize::try_from(src.get_integer("Variant").unwrap_or(1)).unwrap_or(1);
    out.put("variant", format!("minecraft:{}", CATS.get(i).copied().unwrap_or("tabby")));
}

// ─── Registry ───────────────────────────────────────────────────────────────

const MOB: &[Behavior] = &[living];
const ANIMAL: &[Behavior] = &[living, breedable];
const ZOMBIE: &[Behavior] = &[living, zombie_like];
const RIDEABLE: &[Behavior] = &[living, breedable, saddle];
const HORSE: &[Behavior] = &[living, breedable, horse];
const PACK_HORSE: &[Behavior] = &[living, breedable, horse, chested];
const LLAMA: &[Behavior] = &[living, breedable, horse, chested, llama];
const SHEEP: &[Behavior] = &[living, breedable, sheep];
const WOLF: &[Behavior] = &[living, breedable, tameable, collar];
const CAT: &[Behavior] = &[living, breedable, tameable, collar, cat];
const PARROT: &[Behavior] = &[living, tameable, parrot];
const RABBIT: &[Behavior] = &[living, breedable, rabbit];
const FOX: &[Behavior] = &[living, breedable, fox];
const VILLAGER: &[Behavior] = &[living, breedable, villager];
const ITEM: &[Behavior] = &[item];
const PAINTING: &[Behavior] = &[painting];
const LEASH_KNOT: &[Behavior] = &[hanging];

static BEHAVIORS: Lazy<HashMap<&'static str, &'static [Behavior]>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static [Behavior]> = HashMap::new();
    for id in [
        "cow", "mooshroom", "chicken", "goat", "turtle", "bee", "panda", "polar_bear", "hoglin", "sniffer", "armadillo",
        "ocelot", "frog", "axolotl", "camel",
    ] {
        m.insert(id, ANIMAL);
    }
    for id in [
        "skeleton", "stray", "creeper", "spider", "cave_spider", "enderman", "witch", "blaze", "ghast", "slime",
        "magma_cube", "guardian", "elder_guardian", "shulker", "phantom", "pillager", "vindicator", "evoker", "ravager",
        "vex", "silverfish", "endermite", "wither_skeleton", "iron_golem", "snow_golem", "squid", "glow_squid", "bat",
        "dolphin", "cod", "salmon", "pufferfish", "tropical_fish", "wither", "ender_dragon", "warden", "allay", "tadpole",
        "breeze", "wandering_trader", "armor_stand",
    ] {
        m.insert(id, MOB);
    }
    for id in ["zombie", "husk", "drowned", "zombified_piglin", "zombie_villager", "piglin", "piglin_brute"] {
        m.insert(id, ZOMBIE);
    }
    for id in ["pig", "strider"] {
        m.insert(id, RIDEABLE);
    }
    for id in ["horse", "skeleton_horse", "zombie_horse"] {
        m.insert(id, HORSE);
    }
    for id in ["donkey", "mule"] {
        m.insert(id, PACK_HORSE);
    }
    for id in ["llama", "trader_llama"] {
        m.insert(id, LLAMA);
    }
    m.insert("sheep", SHEEP);
    m.insert("wolf", WOLF);
    m.insert("cat", CAT);
    m.insert("parrot", PARROT);
    m.insert("rabbit", RABBIT);
    m.insert("fox", FOX);
    m.insert("villager", VILLAGER);
    m.insert("item", ITEM);
    m.insert("painting", PAINTING);
    m.insert("leash_knot", LEASH_KNOT);
    m
});

/// Run the base conversion and every behavior registered for `java_id`.
pub fn convert(src: &NbtCompound, java_id: String) -> NbtCompound {
    let local = java_id.strip_prefix("minecraft:").unwrap_or(&java_id).to_string();
    let mut out = base(src, java_id);
    if let Some(behaviors) = BEHAVIORS.get(local.as_str()) {
        for behave in behaviors.iter() {
            behave(src, &mut out);
        }
    }
    out
}

// ─── Collection ─────────────────────────────────────────────────────────────

/// Convert one actor of `chunk`, recording its cross-references in `ctx`.
/// Returns `None` for actors that have no Java entity.
pub fn convert_entity(src: &NbtCompound, dim: Dimension, chunk: Pos2i, ctx: &mut Context) -> Option<NbtCompound> {
    let identifier = src.get_str("identifier")?;
    if identifier == "minecraft:player" {
        return None;
    }
    let variant = src.get_integer("Variant").unwrap_or(0) as i32;
    let java_id = java_entity_id(identifier, variant);
    let uid = src.get_long("UniqueID");

    if let Some(uid) = uid {
        ctx.entities.insert(uid, (dim, chunk));
        if java_id == "minecraft:leash_knot" {
            if let Some(p) = block_pos(src) {
                ctx.leash_knots.insert(uid, p);
            }
        }
        if let Some(leasher) = src.get_long("LeasherID").filter(|&l| l != -1 && l != 0) {
            ctx.leashes.insert(uid, Leash { dim, chunk, leasher });
        }
        let passengers: std::collections::BTreeMap<i32, i64> = src
            .get_list("LinksTag")
            .unwrap_or_default()
            .iter()
            .filter_map(|t| t.as_compound())
            .enumerate()
            .filter_map(|(i, link)| {
                let seat = link.get_integer("LinkID").unwrap_or(i as i64) as i32;
                Some((seat, link.get_long("entityID")?))
            })
            .collect();
        if !passengers.is_empty() {
            for &p in passengers.values() {
                ctx.parents.insert(p, uid);
            }
            ctx.vehicles.insert(uid, Vehicle { dim, chunk, passengers });
        }
    }
    Some(convert(src, java_id))
}
