//! Block shape predicates shared by the connection passes.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Full-cube blocks matched by exact name; families are matched by suffix
/// in [`is_full_solid`].
static FULL_SOLID: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "stone", "granite", "polished_granite", "diorite", "polished_diorite", "andesite", "polished_andesite",
        "deepslate", "cobbled_deepslate", "polished_deepslate", "calcite", "tuff", "dripstone_block", "grass_block",
        "dirt", "coarse_dirt", "rooted_dirt", "podzol", "mycelium", "mud", "packed_mud", "clay", "cobblestone",
        "mossy_cobblestone", "bedrock", "sand", "red_sand", "gravel", "sandstone", "chiseled_sandstone",
        "cut_sandstone", "smooth_sandstone", "red_sandstone", "chiseled_red_sandstone", "cut_red_sandstone",
        "smooth_red_sandstone", "obsidian", "crying_obsidian", "netherrack", "soul_soil", "basalt",
        "polished_basalt", "smooth_basalt", "blackstone", "polished_blackstone", "gilded_blackstone", "end_stone",
        "purpur_block", "purpur_pillar", "prismarine", "dark_prismarine", "sea_lantern", "glowstone", "magma_block",
        "bone_block", "hay_block", "note_block", "jukebox", "crafting_table", "cartography_table",
        "fletching_table", "smithing_table", "loom", "barrel", "furnace", "blast_furnace", "smoker", "dispenser",
        "dropper", "observer", "target", "redstone_lamp", "bookshelf", "chiseled_bookshelf", "tnt", "sponge",
        "wet_sponge", "pumpkin", "carved_pumpkin", "jack_o_lantern", "melon", "honeycomb_block", "slime_block",
        "honey_block", "snow_block", "ice", "packed_ice", "blue_ice", "glass", "tinted_glass", "quartz_block",
        "chiseled_quartz_block", "quartz_pillar", "smooth_quartz", "quartz_bricks", "amethyst_block",
        "budding_amethyst", "iron_block", "gold_block", "diamond_block", "emerald_block", "lapis_block",
        "redstone_block", "coal_block", "copper_block", "netherite_block", "raw_iron_block", "raw_gold_block",
        "raw_copper_block", "ancient_debris", "respawn_anchor", "lodestone", "beehive", "bee_nest", "spawner",
        "command_block", "chain_command_block", "repeating_command_block", "structure_block", "reinforced_deepslate",
        "sculk", "sculk_catalyst", "moss_block", "shroomlight", "nether_wart_block", "warped_wart_block",
        "mushroom_stem", "brown_mushroom_block", "red_mushroom_block", "dried_kelp_block", "terracotta",
        "ochre_froglight", "verdant_froglight", "pearlescent_froglight", "crafter",
    ]
    .into_iter()
    .collect()
});

/// Connecting to these fails even though they are full cubes.
fn is_connection_exception(name: &str) -> bool {
    name.ends_with("_leaves")
        || name.ends_with("shulker_box")
        || matches!(name, "barrier" | "pumpkin" | "carved_pumpkin" | "jack_o_lantern" | "melon")
}

/// Sturdy full cube that fences, walls and panes attach to.
pub fn is_full_solid(name: &str) -> bool {
    if name.is_empty() || is_connection_exception(name) || name.ends_with("melon_stem") || name.ends_with("pumpkin_stem") {
        return false;
    }
    FULL_SOLID.contains(name)
        || [
            "_planks", "_log", "_wood", "_stem", "_hyphae", "_bricks", "_concrete", "_wool", "_terracotta", "_ore",
            "_glass", "_tiles", "_froglight", "_copper", "_block",
        ]
        .iter()
        .any(|suffix| name.ends_with(suffix))
        || name.starts_with("infested_")
}

/// Whether a block carries redstone power through it. Some opaque blocks
/// like glowstone do not; shulker boxes do even though they are not
/// connection targets.
pub fn is_redstone_conductor(name: &str) -> bool {
    if name.ends_with("shulker_box") {
        return true;
    }
    if matches!(
        name,
        "glowstone" | "sea_lantern" | "glass" | "tinted_glass" | "ice" | "slime_block" | "honey_block" | "observer"
            | "redstone_block" | "target" | "beacon"
    ) || name.ends_with("_glass")
        || name.ends_with("_leaves")
    {
        return false;
    }
    is_full_solid(name) || matches!(name, "pumpkin" | "carved_pumpkin" | "jack_o_lantern" | "melon")
}
