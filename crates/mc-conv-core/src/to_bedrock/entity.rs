//! Java entities to Bedrock actors.
//!
//! Mirrors the Bedrock-to-Java pipeline: a base conversion, then the
//! behaviors registered for the entity's id. Java nests riders inside
//! their vehicle; Bedrock stores each actor separately and links riders
//! from the vehicle's `LinksTag`, so a stack is flattened here.

use std::collections::HashMap;

use mc_conv_nbt::{CompoundExt, NbtCompound, NbtTag};
use mc_conv_world::{Dimension, Pos3i};
use once_cell::sync::Lazy;
use serde_json::Value;

use super::unique_id::{entity_uuid, knot_uuid, UniqueIdRegistry};
use crate::block_map::entities::bedrock_entity_id;
use crate::block_map::items::item_to_bedrock;
use crate::to_java::entity::{CATS, PROFESSIONS, VILLAGER_TYPES};

/// A mutation applied after the base conversion: `(java, bedrock)`.
pub type Behavior = fn(&NbtCompound, &mut NbtCompound);

/// Marker in the first word of UUIDs made up for entities without one.
const ANONYMOUS_MARK: i32 = 0x414E_4F4E;

/// What entity conversion needs besides the entity itself.
pub struct EntityEnv<'a> {
    pub dim: Dimension,
    pub ids: &'a UniqueIdRegistry,
}

// ─── Text ───────────────────────────────────────────────────────────────────

fn flatten(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts.iter().map(flatten).collect(),
        Value::Object(o) => {
            let mut s = o.get("text").and_then(Value::as_str).unwrap_or("").to_string();
            if let Some(Value::Array(extra)) = o.get("extra") {
                for e in extra {
                    s.push_str(&flatten(e));
                }
            }
            s
        }
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Plain text of a JSON text component. Strings that are not JSON are
/// returned as they are.
pub fn plain_text(json: &str) -> String {
    match serde_json::from_str::<Value>(json) {
        Ok(v) => flatten(&v),
        Err(_) => json.to_string(),
    }
}

// ─── Base ───────────────────────────────────────────────────────────────────

fn numbers(src: &NbtCompound, key: &str) -> Option<Vec<f64>> {
    src.get_list(key)?.iter().map(NbtTag::as_number).collect()
}

fn floats(values: &[f64]) -> NbtTag {
    NbtTag::List(values.iter().map(|&v| NbtTag::Float(v as f32)).collect())
}

/// Block the entity stands in.
pub fn block_pos(src: &NbtCompound) -> Option<Pos3i> {
    match numbers(src, "Pos")?.as_slice() {
        [x, y, z] => Some(Pos3i::new(x.floor() as i32, y.floor() as i32, z.floor() as i32)),
        _ => None,
    }
}

fn hanging_pos(src: &NbtCompound) -> Option<Pos3i> {
    match (src.get_int("TileX"), src.get_int("TileY"), src.get_int("TileZ")) {
        (Some(x), Some(y), Some(z)) => Some(Pos3i::new(x, y, z)),
        _ => block_pos(src),
    }
}

fn anonymous_uuid(src: &NbtCompound) -> [i32; 4] {
    let pos = numbers(src, "Pos").unwrap_or_default();
    let bits = |i: usize| pos.get(i).map_or(0, |v| v.to_bits() as i32 ^ (v.to_bits() >> 32) as i32);
    [ANONYMOUS_MARK, bits(0), bits(1), bits(2)]
}

/// Unique id the actor converted from `src` will carry.
pub fn unique_id(src: &NbtCompound, env: &EntityEnv<'_>) -> i64 {
    let local = src.get_str("id").map(|id| id.strip_prefix("minecraft:").unwrap_or(id));
    if local == Some("leash_knot") {
        if let Some(pos) = hanging_pos(src) {
            return env.ids.id_for(knot_uuid(env.dim, pos));
        }
    }
    env.ids.id_for(entity_uuid(src).unwrap_or_else(|| anonymous_uuid(src)))
}

fn leasher(src: &NbtCompound, env: &EntityEnv<'_>) -> Option<i64> {
    // 1.21 writes `leash`; older versions `Leash`.
    let tag = src.get("leash").or_else(|| src.get("Leash"))?;
    if let Some(&[x, y, z]) = tag.as_int_array() {
        return Some(env.ids.id_for(knot_uuid(env.dim, Pos3i::new(x, y, z))));
    }
    let c = tag.as_compound()?;
    if let (Some(x), Some(y), Some(z)) = (c.get_int("X"), c.get_int("Y"), c.get_int("Z")) {
        return Some(env.ids.id_for(knot_uuid(env.dim, Pos3i::new(x, y, z))));
    }
    entity_uuid(c).map(|uuid| env.ids.id_for(uuid))
}

fn base(src: &NbtCompound, identifier: &str, uid: i64, env: &EntityEnv<'_>) -> NbtCompound {
    let mut out = NbtCompound::new();
    out.put("identifier", identifier);
    let local = identifier.strip_prefix("minecraft:").unwrap_or(identifier);
    out.put("definitions", NbtTag::List(vec![NbtTag::String(format!("+minecraft:{local}"))]));
    let pos = numbers(src, "Pos").filter(|p| p.len() == 3).unwrap_or_else(|| vec![0.0; 3]);
    out.put("Pos", floats(&pos));
    let motion = numbers(src, "Motion").filter(|p| p.len() == 3).unwrap_or_else(|| vec![0.0; 3]);
    out.put("Motion", floats(&motion));
    let rotation = numbers(src, "Rotation").filter(|p| p.len() == 2).unwrap_or_else(|| vec![0.0; 2]);
    out.put("Rotation", floats(&rotation));
    out.put("UniqueID", uid);
    out.put("OnGround", src.get_bool("OnGround").unwrap_or(false));
    out.put("Invulnerable", src.get_bool("Invulnerable").unwrap_or(false));
    out.put("Fire", src.get_integer("Fire").unwrap_or(0).max(0) as i16);
    out.put("Air", src.get_integer("Air").unwrap_or(300) as i16);
    out.put("FallDistance", src.get_float("FallDistance").unwrap_or(0.0));
    if let Some(name) = src.get_str("CustomName").map(plain_text).filter(|n| !n.is_empty()) {
        out.put("CustomName", name);
        out.put("CustomNameVisible", src.get_bool("CustomNameVisible").unwrap_or(false));
    }
    if let Some(owner) = src.get("Owner").and_then(NbtTag::as_int_array) {
        if let &[a, b, c, d] = owner {
            out.put("OwnerNew", env.ids.id_for([a, b, c, d]));
        }
    }
    out.put("LeasherID", leasher(src, env).unwrap_or(-1));
    out
}

// ─── Behaviors ──────────────────────────────────────────────────────────────

pub(crate) fn empty_item() -> NbtTag {
    let mut item = NbtCompound::new();
    item.put("Name", "");
    item.put("Count", 0i8);
    item.put("Damage", 0i16);
    NbtTag::Compound(item)
}

fn items(list: &[NbtTag], len: usize) -> Vec<NbtTag> {
    (0..len)
        .map(|i| {
            list.get(i)
                .and_then(|t| t.as_compound())
                .and_then(item_to_bedrock)
                .map_or_else(empty_item, NbtTag::Compound)
        })
        .collect()
}

/// Container contents with their `Slot`, shifted by `offset`.
pub fn slotted_items(src: &NbtCompound, key: &str, offset: i64) -> NbtTag {
    let list = src.get_list(key).unwrap_or_default();
    NbtTag::List(
        list.iter()
            .filter_map(|t| t.as_compound())
            .filter_map(|item| {
                let slot = item.get_integer("Slot")? + offset;
                if slot < 0 {
                    return None;
                }
                let mut bedrock = item_to_bedrock(item)?;
                bedrock.put("Slot", slot as i8);
                Some(NbtTag::Compound(bedrock))
            })
            .collect(),
    )
}

fn living(src: &NbtCompound, out: &mut NbtCompound) {
    let health = src.get_float("Health").unwrap_or(20.0);
    let mut attribute = NbtCompound::new();
    attribute.put("Name", "minecraft:health");
    attribute.put("Base", health.max(20.0));
    attribute.put("Current", health);
    attribute.put("Max", health.max(20.0));
    out.put("Attributes", NbtTag::List(vec![NbtTag::Compound(attribute)]));
    out.put("Persistent", src.get_bool("PersistenceRequired").unwrap_or(false));
    // Java armor is feet to head, Bedrock head to feet.
    let mut armor = items(src.get_list("ArmorItems").unwrap_or_default(), 4);
    armor.reverse();
    out.put("Armor", NbtTag::List(armor));
    let hands = items(src.get_list("HandItems").unwrap_or_default(), 2);
    let mut hands = hands.into_iter();
    out.put("Mainhand", NbtTag::List(hands.next().into_iter().collect()));
    out.put("Offhand", NbtTag::List(hands.next().into_iter().collect()));
}

fn breedable(src: &NbtCompound, out: &mut NbtCompound) {
    out.put("IsBaby", src.get_integer("Age").unwrap_or(0) < 0);
}

fn zombie_like(src: &NbtCompound, out: &mut NbtCompound) {
    out.put("IsBaby", src.get_bool("IsBaby").unwrap_or(false));
}

fn tameable(src: &NbtCompound, out: &mut NbtCompound) {
    out.put("Sitting", src.get_bool("Sitting").unwrap_or(false));
    out.put("IsTamed", src.contains_key("Owner"));
}

fn collar(src: &NbtCompound, out: &mut NbtCompound) {
    out.put("Color", src.get_integer("CollarColor").unwrap_or(14) as i8);
}

fn sheep(src: &NbtCompound, out: &mut NbtCompound) {
    out.put("Color", src.get_integer("Color").unwrap_or(0) as i8);
    out.put("Sheared", src.get_bool("Sheared").unwrap_or(false));
}

fn saddle(src: &NbtCompound, out: &mut NbtCompound) {
    out.put("Saddled", src.get_bool("Saddle").unwrap_or(false));
}

fn horse(src: &NbtCompound, out: &mut NbtCompound) {
    out.put("IsTamed", src.get_bool("Tame").unwrap_or(false));
    let variant = src.get_integer("Variant").unwrap_or(0);
    out.put("Variant", (variant & 0xFF) as i32);
    out.put("MarkVariant", (variant >> 8) as i32);
    out.put("Saddled", src.get_compound("SaddleItem").is_some());
}

fn chested(src: &NbtCompound, out: &mut NbtCompound) {
    let chested = src.get_bool("ChestedHorse").unwrap_or(false);
    out.put("Chested", chested);
    if chested {
        out.put("ChestItems", slotted_items(src, "Items", -2));
    }
}

fn index_of(table: &[&str], value: Option<&str>) -> i32 {
    let value = value.map(|v| v.strip_prefix("minecraft:").unwrap_or(v));
    table.iter().position(|t| Some(*t) == value).unwrap_or(0) as i32
}

fn villager(src: &NbtCompound, out: &mut NbtCompound) {
    let data = src.get_compound("VillagerData");
    out.put("Variant", index_of(&PROFESSIONS, data.and_then(|d| d.get_str("profession"))));
    out.put("MarkVariant", index_of(&VILLAGER_TYPES, data.and_then(|d| d.get_str("type"))));
    let level = data.and_then(|d| d.get_integer("level")).unwrap_or(1);
    out.put("TradeTier", (level - 1).max(0) as i32);
    out.put("TradeExperience", src.get_integer("Xp").unwrap_or(0) as i32);
}

fn item(src: &NbtCompound, out: &mut NbtCompound) {
    if let Some(stack) = src.get_compound("Item").and_then(item_to_bedrock) {
        out.put("Item", stack);
    }
    out.put("Age", src.get_integer("Age").unwrap_or(0) as i16);
}

/// `burning_skull` → `BurningSkull`.
fn camel_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(c) => c.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn painting(src: &NbtCompound, out: &mut NbtCompound) {
    let variant = src.get_str("variant").or_else(|| src.get_str("Motive")).unwrap_or("kebab");
    out.put("Motive", camel_case(variant.strip_prefix("minecraft:").unwrap_or(variant)));
    let facing = src.get_integer("facing").or_else(|| src.get_integer("Facing")).unwrap_or(0);
    out.put("Direction", facing as i8);
}

fn put_variant(src: &NbtCompound, out: &mut NbtCompound, key: &str) {
    out.put("Variant", src.get_integer(key).unwrap_or(0) as i32);
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
    out.put("Variant", i32::from(src.get_str("Type") == Some("snow")));
}

fn cat(src: &NbtCompound, out: &mut NbtCompound) {
    let variant = src.get_str("variant");
    let i = if variant.is_some() { index_of(&CATS, variant) } else { 1 };
    out.put("Variant", i);
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

/// Keyed by Java local id.
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
    m
});

/// Convert one entity without its riders.
pub fn convert(src: &NbtCompound, uid: i64, env: &EntityEnv<'_>) -> Option<NbtCompound> {
    let java_id = src.get_str("id")?;
    let local = java_id.strip_prefix("minecraft:").unwrap_or(java_id);
    let (identifier, variant) = bedrock_entity_id(java_id);
    let mut out = base(src, &identifier, uid, env);
    if let Some(behaviors) = BEHAVIORS.get(local) {
        for behave in behaviors.iter() {
            behave(src, &mut out);
        }
    }
    if let Some(v) = variant {
        out.put("Variant", v);
    }
    Some(out)
}

/// Convert an entity and every rider nested in it. Actors are appended to
/// `out` vehicle first; returns the vehicle's unique id.
pub fn convert_entity(src: &NbtCompound, env: &EntityEnv<'_>, out: &mut Vec<NbtCompound>) -> Option<i64> {
    let uid = unique_id(src, env);
    let mut actor = convert(src, uid, env)?;
    let mut riders = Vec::new();
    let mut links = Vec::new();
    for (seat, passenger) in src
        .get_list("Passengers")
        .unwrap_or_default()
        .iter()
        .filter_map(|t| t.as_compound())
        .enumerate()
    {
        if let Some(id) = convert_entity(passenger, env, &mut riders) {
            let mut link = NbtCompound::new();
            link.put("entityID", id);
            link.put("LinkID", seat as i32);
            links.push(NbtTag::Compound(link));
        }
    }
    if !links.is_empty() {
        actor.put("LinksTag", NbtTag::List(links));
    }
    out.push(actor);
    out.append(&mut riders);
    Some(uid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, uuid: [i32; 4]) -> NbtCompound {
        let mut e = NbtCompound::new();
        e.put("id", id);
        e.insert("UUID".into(), NbtTag::IntArray(uuid.to_vec()));
        e.put("Pos", NbtTag::List(vec![NbtTag::Double(1.5), NbtTag::Double(64.0), NbtTag::Double(-3.5)]));
        e
    }

    fn env(ids: &UniqueIdRegistry) -> EntityEnv<'_> {
        EntityEnv {
            dim: Dimension::Overworld,
            ids,
        }
    }

    #[test]
    fn text_components() {
        assert_eq!(plain_text(r#"{"text":"Bob"}"#), "Bob");
        assert_eq!(plain_text(r#"{"text":"a","extra":[{"text":"b"},"c"]}"#), "abc");
        assert_eq!(plain_text(r#""quoted""#), "quoted");
        assert_eq!(plain_text("raw name"), "raw name");
    }

    #[test]
    fn base_fields() {
        let ids = UniqueIdRegistry::new();
        let mut cow = entity("minecraft:cow", [1, 2, 3, 4]);
        cow.put("CustomName", r#"{"text":"Daisy"}"#);
        cow.put("Age", -100);
        cow.put("Health", 7.0f32);
        let mut out = Vec::new();
        let uid = convert_entity(&cow, &env(&ids), &mut out).unwrap();
        assert_eq!(uid, ids.id_for([1, 2, 3, 4]));
        let actor = &out[0];
        assert_eq!(actor.get_str("identifier"), Some("minecraft:cow"));
        assert_eq!(actor.get_long("UniqueID"), Some(uid));
        assert_eq!(actor.get_str("CustomName"), Some("Daisy"));
        assert_eq!(actor.get_bool("IsBaby"), Some(true));
        assert_eq!(actor.get_long("LeasherID"), Some(-1));
        let pos = actor.get_list("Pos").unwrap();
        assert_eq!(pos[0].as_float(), Some(1.5));
        assert_eq!(actor.get_list("Armor").unwrap().len(), 4);
    }

    #[test]
    fn passengers_are_flattened() {
        let ids = UniqueIdRegistry::new();
        let mut top = entity("minecraft:zombie", [0, 0, 0, 3]);
        top.put("IsBaby", true);
        let mut middle = entity("minecraft:chicken", [0, 0, 0, 2]);
        middle.put("Passengers", NbtTag::List(vec![NbtTag::Compound(top)]));
        let mut boat = entity("minecraft:oak_boat", [0, 0, 0, 1]);
        boat.put(
            "Passengers",
            NbtTag::List(vec![NbtTag::Compound(middle), NbtTag::Compound(entity("minecraft:pig", [0, 0, 0, 4]))]),
        );

        let mut out = Vec::new();
        convert_entity(&boat, &env(&ids), &mut out).unwrap();
        let names: Vec<_> = out.iter().map(|a| a.get_str("identifier").unwrap()).collect();
        assert_eq!(names, ["minecraft:boat", "minecraft:chicken", "minecraft:zombie", "minecraft:pig"]);
        assert_eq!(out[0].get_int("Variant"), Some(0));

        let links = out[0].get_list("LinksTag").unwrap();
        let linked: Vec<(i64, i32)> = links
            .iter()
            .map(|l| {
                let l = l.as_compound().unwrap();
                (l.get_long("entityID").unwrap(), l.get_int("LinkID").unwrap())
            })
            .collect();
        assert_eq!(linked, vec![(ids.id_for([0, 0, 0, 2]), 0), (ids.id_for([0, 0, 0, 4]), 1)]);
        let chicken_links = out[1].get_list("LinksTag").unwrap();
        assert_eq!(chicken_links.len(), 1);
        assert!(out[2].get("LinksTag").is_none());
    }

    #[test]
    fn leash_points_at_knot() {
        let ids = UniqueIdRegistry::new();
        let mut knot = entity("minecraft:leash_knot", [7, 7, 7, 7]);
        knot.put("TileX", 10);
        knot.put("TileY", 65);
        knot.put("TileZ", -4);
        let mut dog = entity("minecraft:wolf", [8, 8, 8, 8]);
        dog.insert("leash".into(), NbtTag::IntArray(vec![10, 65, -4]));

        let mut out = Vec::new();
        let knot_id = convert_entity(&knot, &env(&ids), &mut out).unwrap();
        convert_entity(&dog, &env(&ids), &mut out).unwrap();
        assert_eq!(out[1].get_long("LeasherID"), Some(knot_id));

        let mut held = entity("minecraft:cow", [9, 9, 9, 9]);
        let mut holder = NbtCompound::new();
        holder.insert("UUID".into(), NbtTag::IntArray(vec![8, 8, 8, 8]));
        held.put("leash", holder);
        convert_entity(&held, &env(&ids), &mut out).unwrap();
        assert_eq!(out[2].get_long("LeasherID"), Some(ids.id_for([8, 8, 8, 8])));
    }

    #[test]
    fn villager_and_painting() {
        let ids = UniqueIdRegistry::new();
        let mut v = entity("minecraft:villager", [1, 1, 1, 1]);
        let mut data = NbtCompound::new();
        data.put("profession", "minecraft:librarian");
        data.put("type", "minecraft:snow");
        data.put("level", 3);
        v.put("VillagerData", data);
        let mut p = entity("minecraft:painting", [2, 2, 2, 2]);
        p.put("variant", "minecraft:burning_skull");
        p.put("facing", 2i8);

        let mut out = Vec::new();
        convert_entity(&v, &env(&ids), &mut out).unwrap();
        convert_entity(&p, &env(&ids), &mut out).unwrap();
        assert_eq!(out[0].get_str("identifier"), Some("minecraft:villager_v2"));
        assert_eq!(out[0].get_int("Variant"), Some(5));
        assert_eq!(out[0].get_int("MarkVariant"), Some(4));
        assert_eq!(out[0].get_int("TradeTier"), Some(2));
        assert_eq!(out[1].get_str("Motive"), Some("BurningSkull"));
        assert_eq!(out[1].get_byte("Direction"), Some(2));
    }
}
