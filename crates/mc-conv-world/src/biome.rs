//! Biome identifiers for both editions.
//!
//! Bedrock stores biomes as numeric ids; Java 1.18+ stores namespaced
//! names, and older Java chunks store their own numeric ids. Retired
//! "hills" variants collapse onto the biome that replaced them.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Bedrock id ↔ modern Java name. The first row for a name wins when
/// mapping Java → Bedrock.
static BIOMES: &[(i32, &str)] = &[
    (0, "ocean"),
    (1, "plains"),
    (2, "desert"),
    (3, "windswept_hills"),
    (4, "forest"),
    (5, "taiga"),
    (6, "swamp"),
    (7, "river"),
    (8, "nether_wastes"),
    (9, "the_end"),
    (11, "frozen_river"),
    (12, "snowy_plains"),
    (14, "mushroom_fields"),
    (16, "beach"),
    (21, "jungle"),
    (23, "sparse_jungle"),
    (24, "deep_ocean"),
    (25, "stony_shore"),
    (26, "snowy_beach"),
    (27, "birch_forest"),
    (29, "dark_forest"),
    (30, "snowy_taiga"),
    (32, "old_growth_pine_taiga"),
    (34, "windswept_forest"),
    (35, "savanna"),
    (36, "savanna_plateau"),
    (37, "badlands"),
    (38, "wooded_badlands"),
    (40, "warm_ocean"),
    (42, "lukewarm_ocean"),
    (43, "deep_lukewarm_ocean"),
    (44, "cold_ocean"),
    (45, "deep_cold_ocean"),
    (46, "frozen_ocean"),
    (47, "deep_frozen_ocean"),
    (48, "bamboo_jungle"),
    (129, "sunflower_plains"),
    (131, "windswept_gravelly_hills"),
    (132, "flower_forest"),
    (140, "ice_spikes"),
    (155, "old_growth_birch_forest"),
    (160, "old_growth_spruce_taiga"),
    (163, "windswept_savanna"),
    (165, "eroded_badlands"),
    (178, "soul_sand_valley"),
    (179, "crimson_forest"),
    (180, "warped_forest"),
    (181, "basalt_deltas"),
    (182, "jagged_peaks"),
    (183, "frozen_peaks"),
    (184, "snowy_slopes"),
    (185, "grove"),
    (186, "meadow"),
    (187, "lush_caves"),
    (188, "dripstone_caves"),
    (189, "stony_peaks"),
    (190, "deep_dark"),
    (191, "mangrove_swamp"),
    (192, "cherry_grove"),
    (193, "pale_garden"),
    // Retired Bedrock variants.
    (10, "frozen_ocean"),
    (13, "snowy_plains"),
    (15, "mushroom_fields"),
    (17, "desert"),
    (18, "forest"),
    (19, "taiga"),
    (20, "windswept_hills"),
    (22, "jungle"),
    (28, "birch_forest"),
    (31, "snowy_taiga"),
    (33, "old_growth_pine_taiga"),
    (39, "wooded_badlands"),
    (41, "warm_ocean"),
    (49, "bamboo_jungle"),
    (130, "desert"),
    (149, "jungle"),
    (151, "sparse_jungle"),
    (156, "old_growth_birch_forest"),
    (157, "dark_forest"),
    (158, "snowy_taiga"),
    (161, "old_growth_spruce_taiga"),
    (162, "windswept_gravelly_hills"),
    (164, "savanna_plateau"),
    (166, "wooded_badlands"),
    (167, "badlands"),
];

/// Pre-1.18 Java numeric ids that differ from Bedrock's.
static JAVA_LEGACY: &[(i32, &str)] = &[
    (40, "small_end_islands"),
    (41, "end_midlands"),
    (42, "end_highlands"),
    (43, "end_barrens"),
    (44, "warm_ocean"),
    (45, "lukewarm_ocean"),
    (46, "cold_ocean"),
    (47, "deep_warm_ocean"),
    (48, "deep_lukewarm_ocean"),
    (49, "deep_cold_ocean"),
    (50, "deep_frozen_ocean"),
    (127, "the_void"),
    (168, "bamboo_jungle"),
    (169, "bamboo_jungle"),
    (170, "soul_sand_valley"),
    (171, "crimson_forest"),
    (172, "warped_forest"),
    (173, "basalt_deltas"),
    (174, "dripstone_caves"),
    (175, "lush_caves"),
];

/// End sub-biomes and `the_void` have no Bedrock counterpart.
static JAVA_ONLY: &[(&str, i32)] = &[
    ("small_end_islands", 9),
    ("end_midlands", 9),
    ("end_highlands", 9),
    ("end_barrens", 9),
    ("the_void", 1),
    ("deep_warm_ocean", 41),
];

static BY_BEDROCK: Lazy<HashMap<i32, &'static str>> =
    Lazy::new(|| BIOMES.iter().map(|&(id, name)| (id, name)).collect());

static BY_JAVA: Lazy<HashMap<&'static str, i32>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for &(id, name) in BIOMES {
        map.entry(name).or_insert(id);
    }
    for &(name, id) in JAVA_ONLY {
        map.entry(name).or_insert(id);
    }
    map
});

fn strip(name: &str) -> &str {
    name.strip_prefix("minecraft:").unwrap_or(name)
}

/// Namespaced Java biome for a Bedrock id, or `None` if unknown.
pub fn java_name_for_bedrock(id: i32) -> Option<String> {
    BY_BEDROCK.get(&id).map(|n| format!("minecraft:{n}"))
}

/// Bedrock id for a Java biome name (with or without namespace).
pub fn bedrock_id_for_java(name: &str) -> Option<i32> {
    BY_JAVA.get(strip(name)).copied()
}

/// Modern Java biome name for a pre-1.18 numeric Java id.
pub fn java_name_for_legacy_id(id: i32) -> Option<String> {
    JAVA_LEGACY
        .iter()
        .find(|&&(legacy, _)| legacy == id)
        .map(|&(_, n)| n)
        .or_else(|| BY_BEDROCK.get(&id).copied())
        .map(|n| format!("minecraft:{n}"))
}
