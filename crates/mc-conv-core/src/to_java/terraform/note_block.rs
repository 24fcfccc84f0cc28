//! Note block instrument and pitch.

use mc_conv_nbt::CompoundExt;
use mc_conv_world::JavaChunk;

use super::{set_properties, BlockAccessor};
use crate::block_map::is_log;
use crate::to_java::block_property::{BlockProperty, BlockPropertyAccessor};

/// Instrument selected by the block underneath.
fn instrument_below(name: &str) -> &'static str {
    match name {
        "gold_block" => "bell",
        "clay" => "flute",
        "packed_ice" => "chime",
        "bone_block" => "xylophone",
        "iron_block" => "iron_xylophone",
        "soul_sand" => "cow_bell",
        "pumpkin" => "didgeridoo",
        "emerald_block" => "bit",
        "hay_block" => "banjo",
        "glowstone" => "pling",
        "sand" | "red_sand" | "gravel" | "suspicious_sand" | "suspicious_gravel" => "snare",
        "glass" | "tinted_glass" | "sea_lantern" | "beacon" => "hat",
        "stone" | "cobblestone" | "deepslate" | "netherrack" | "obsidian" | "bedrock" | "end_stone" | "basalt"
        | "blackstone" | "tuff" | "calcite" | "granite" | "diorite" | "andesite" | "prismarine" | "magma_block"
        | "respawn_anchor" | "crying_obsidian" | "dripstone_block" | "sandstone" | "red_sandstone" | "quartz_block"
        | "nether_bricks" | "bricks" | "stone_bricks" | "mud_bricks" => "basedrum",
        _ if name.ends_with("_wool") => "guitar",
        _ if name.ends_with("_concrete_powder") => "snare",
        _ if name.ends_with("_stained_glass") => "hat",
        _ if name.ends_with("_planks") || is_log(name) || name.ends_with("_fence") || name == "bookshelf" => "bass",
        _ if name.ends_with("_ore") || name.ends_with("_terracotta") || name.ends_with("_concrete") => "basedrum",
        _ if name.ends_with("_bricks") || name.starts_with("cobbled_") || name.starts_with("polished_") => "basedrum",
        _ => "harp",
    }
}

/// Mob heads on top take precedence over the block below.
fn instrument_above(name: &str) -> Option<&'static str> {
    Some(match name {
        "zombie_head" => "zombie",
        "skeleton_skull" => "skeleton",
        "creeper_head" => "creeper",
        "dragon_head" => "dragon",
        "wither_skeleton_skull" => "wither_skeleton",
        "piglin_head" => "piglin",
        "player_head" => "custom_head",
        _ => return None,
    })
}

pub fn apply(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for pos in acc.positions(BlockProperty::NoteBlock) {
        let instrument = instrument_above(src.name(pos.up())).unwrap_or_else(|| instrument_below(src.name(pos.down())));
        let note = src
            .source_block_entity(pos)
            .and_then(|te| te.get_integer("note"))
            .unwrap_or(0)
            .clamp(0, 24)
            .to_string();
        set_properties(out, pos, &[("instrument", instrument), ("note", note.as_str())]);
    }
}
