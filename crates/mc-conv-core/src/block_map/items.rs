//! Item stacks: Java `{id, count, components}` and Bedrock
//! `{Name, Count, Damage, WasPickedUp}`.

use std::collections::HashMap;

use mc_conv_nbt::{CompoundExt, NbtCompound};
use once_cell::sync::Lazy;

/// `(bedrock, java)` item names that differ.
const ITEM_PAIRS: &[(&str, &str)] = &[
    ("wooden_door", "oak_door"),
    ("fence_gate", "oak_fence_gate"),
    ("trapdoor", "oak_trapdoor"),
    ("wooden_button", "oak_button"),
    ("wooden_pressure_plate", "oak_pressure_plate"),
    ("web", "cobweb"),
    ("waterlily", "lily_pad"),
    ("slime", "slime_block"),
    ("brick_block", "bricks"),
    ("melon_block", "melon"),
    ("lit_pumpkin", "jack_o_lantern"),
    ("yellow_flower", "dandelion"),
    ("reeds", "sugar_cane"),
    ("deadbush", "dead_bush"),
    ("magma", "magma_block"),
    ("noteblock", "note_block"),
    ("frame", "item_frame"),
    ("glow_frame", "glow_item_frame"),
    ("fireworks", "firework_rocket"),
    ("muttoncooked", "cooked_mutton"),
    ("muttonraw", "mutton"),
    ("netherstar", "nether_star"),
    ("speckled_melon", "glistering_melon_slice"),
    ("appleenchanted", "enchanted_golden_apple"),
    ("zombie_pigman_spawn_egg", "zombified_piglin_spawn_egg"),
];

static TO_JAVA: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| ITEM_PAIRS.iter().copied().collect());
static TO_BEDROCK: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| ITEM_PAIRS.iter().map(|&(b, j)| (j, b)).collect());

fn local(name: &str) -> &str {
    name.strip_prefix("minecraft:").unwrap_or(name)
}

pub fn java_item_name(bedrock: &str) -> String {
    let l = local(bedrock);
    format!("minecraft:{}", TO_JAVA.get(l).copied().unwrap_or(l))
}

pub fn bedrock_item_name(java: &str) -> String {
    let l = local(java);
    format!("minecraft:{}", TO_BEDROCK.get(l).copied().unwrap_or(l))
}

/// `None` for empty stacks.
pub fn item_to_java(item: &NbtCompound) -> Option<NbtCompound> {
    let name = item.get_str("Name").filter(|n| !n.is_empty())?;
    let count = item.get_integer("Count").unwrap_or(1);
    if count <= 0 || local(name) == "air" {
        return None;
    }
    let mut out = NbtCompound::new();
    out.put("id", java_item_name(name));
    out.put("count", count as i32);
    let damage = item.get_integer("Damage").unwrap_or(0);
    let mut components = NbtCompound::new();
    if damage > 0 {
        components.put("minecraft:damage", damage as i32);
    }
    if let Some(tag) = item.get_compound("tag") {
        if let Some(name) = tag.get_compound("display").and_then(|d| d.get_str("Name")) {
            components.put("minecraft:custom_name", name);
        }
    }
    if !components.is_empty() {
        out.put("components", components);
    }
    Some(out)
}

pub fn item_to_bedrock(item: &NbtCompound) -> Option<NbtCompound> {
    let id = item.get_str("id").filter(|n| !n.is_empty())?;
    let count = item.get_integer("count").or_else(|| item.get_integer("Count")).unwrap_or(1);
    if count <= 0 || local(id) == "air" {
        return None;
    }
    let mut out = NbtCompound::new();
    out.put("Name", bedrock_item_name(id));
    out.put("Count", count.clamp(0, 127) as i8);
    let components = item.get_compound("components");
    let damage = components.and_then(|c| c.get_int("minecraft:damage")).unwrap_or(0);
    out.put("Damage", damage.clamp(0, i16::MAX as i32) as i16);
    out.put("WasPickedUp", false);
    if let Some(name) = components.and_then(|c| c.get_str("minecraft:custom_name")) {
        let mut display = NbtCompound::new();
        display.put("Name", name);
        let mut tag = NbtCompound::new();
        tag.put("display", display);
        out.put("tag", tag);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_translated() {
        assert_eq!(java_item_name("minecraft:wooden_door"), "minecraft:oak_door");
        assert_eq!(bedrock_item_name("minecraft:firework_rocket"), "minecraft:fireworks");
        assert_eq!(java_item_name("minecraft:diamond"), "minecraft:diamond");
    }

    #[test]
    fn stack_roundtrip() {
        let mut bedrock = NbtCompound::new();
        bedrock.put("Name", "minecraft:diamond_sword");
        bedrock.put("Count", 1i8);
        bedrock.put("Damage", 12i16);
        let java = item_to_java(&bedrock).unwrap();
        assert_eq!(java.get_str("id"), Some("minecraft:diamond_sword"));
        assert_eq!(java.get_compound("components").and_then(|c| c.get_int("minecraft:damage")), Some(12));
        let back = item_to_bedrock(&java).unwrap();
        assert_eq!(back.get_short("Damage"), Some(12));
        assert_eq!(back.get_byte("Count"), Some(1));
    }

    #[test]
    fn empty_stacks_vanish() {
        let mut air = NbtCompound::new();
        air.put("Name", "minecraft:air");
        air.put("Count", 0i8);
        assert!(item_to_java(&air).is_none());
        assert!(item_to_java(&NbtCompound::new()).is_none());
    }
}
