//! Block identifiers that differ between the two editions.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// `(bedrock, java)` local names; both directions use these.
const PAIRS: &[(&str, &str)] = &[
    ("wooden_door", "oak_door"),
    ("trapdoor", "oak_trapdoor"),
    ("fence_gate", "oak_fence_gate"),
    ("wooden_button", "oak_button"),
    ("wooden_pressure_plate", "oak_pressure_plate"),
    ("unpowered_repeater", "repeater"),
    ("unpowered_comparator", "comparator"),
    ("noteblock", "note_block"),
    ("piston_arm_collision", "piston_head"),
    ("moving_block", "moving_piston"),
    ("snow_layer", "snow"),
    ("snow", "snow_block"),
    ("trip_wire", "tripwire"),
    ("normal_stone_stairs", "stone_stairs"),
    ("stone_stairs", "cobblestone_stairs"),
    ("end_brick_stairs", "end_stone_brick_stairs"),
    ("prismarine_bricks_stairs", "prismarine_brick_stairs"),
    ("normal_stone_slab", "stone_slab"),
    ("lit_pumpkin", "jack_o_lantern"),
    ("web", "cobweb"),
    ("waterlily", "lily_pad"),
    ("slime", "slime_block"),
    ("brick_block", "bricks"),
    ("nether_brick", "nether_bricks"),
    ("red_nether_brick", "red_nether_bricks"),
    ("end_bricks", "end_stone_bricks"),
    ("golden_rail", "powered_rail"),
    ("melon_block", "melon"),
    ("quartz_ore", "nether_quartz_ore"),
    ("stonecutter_block", "stonecutter"),
    ("mob_spawner", "spawner"),
    ("yellow_flower", "dandelion"),
    ("reeds", "sugar_cane"),
    ("deadbush", "dead_bush"),
    ("magma", "magma_block"),
    ("azalea_leaves_flowered", "flowering_azalea_leaves"),
    ("frame", "item_frame"),
    ("glow_frame", "glow_item_frame"),
    ("bed", "red_bed"),
];

/// Bedrock-only spellings that collapse onto a Java name; the state
/// translators recover the distinguishing property.
const BEDROCK_ALIASES: &[(&str, &str)] = &[
    ("powered_repeater", "repeater"),
    ("powered_comparator", "comparator"),
    ("sticky_piston_arm_collision", "piston_head"),
    ("lit_redstone_lamp", "redstone_lamp"),
    ("lit_furnace", "furnace"),
    ("lit_smoker", "smoker"),
    ("lit_blast_furnace", "blast_furnace"),
    ("lit_redstone_ore", "redstone_ore"),
    ("lit_deepslate_redstone_ore", "deepslate_redstone_ore"),
    ("unlit_redstone_torch", "redstone_torch"),
    ("flowing_water", "water"),
    ("flowing_lava", "lava"),
    ("grass", "grass_block"),
    ("tallgrass", "short_grass"),
    ("cave_vines_body_with_berries", "cave_vines_plant"),
    ("cave_vines_head_with_berries", "cave_vines"),
];

static TO_JAVA: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| PAIRS.iter().chain(BEDROCK_ALIASES).copied().collect());

static TO_BEDROCK: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| PAIRS.iter().map(|&(b, j)| (j, b)).collect());

/// Java local name for a Bedrock local name; unknown names pass through.
pub fn java_name(bedrock: &str) -> &str {
    TO_JAVA.get(bedrock).copied().unwrap_or(bedrock)
}

/// Bedrock local name for a Java local name; unknown names pass through.
pub fn bedrock_name(java: &str) -> &str {
    TO_BEDROCK.get(java).copied().unwrap_or(java)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_invertible() {
        for &(b, j) in PAIRS {
            assert_eq!(java_name(b), j);
            assert_eq!(bedrock_name(j), b);
        }
    }

    #[test]
    fn swapped_names_do_not_chain() {
        assert_eq!(java_name("snow"), "snow_block");
        assert_eq!(java_name("snow_layer"), "snow");
        assert_eq!(bedrock_name("snow"), "snow_layer");
        assert_eq!(java_name("stone_stairs"), "cobblestone_stairs");
        assert_eq!(bedrock_name("stone_stairs"), "normal_stone_stairs");
    }

    #[test]
    fn aliases_and_passthrough() {
        assert_eq!(java_name("powered_repeater"), "repeater");
        assert_eq!(java_name("flowing_water"), "water");
        assert_eq!(java_name("diamond_block"), "diamond_block");
        assert_eq!(bedrock_name("diamond_block"), "diamond_block");
    }
}
