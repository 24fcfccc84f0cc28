//! Entity identifiers and boat variants.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// `(bedrock, java)` entity identifiers that differ.
const ENTITY_PAIRS: &[(&str, &str)] = &[
    ("zombie_pigman", "zombified_piglin"),
    ("evocation_illager", "evoker"),
    ("villager_v2", "villager"),
    ("zombie_villager_v2", "zombie_villager"),
    ("ender_crystal", "end_crystal"),
    ("fireworks_rocket", "firework_rocket"),
    ("xp_orb", "experience_orb"),
    ("xp_bottle", "experience_bottle"),
    ("splash_potion", "potion"),
    ("tripod_camera", "marker"),
    ("npc", "villager"),
];

static TO_JAVA: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| ENTITY_PAIRS.iter().copied().collect());
static TO_BEDROCK: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    for &(b, j) in ENTITY_PAIRS {
        m.entry(j).or_insert(b);
    }
    m
});

/// Boat wood types by Bedrock `Variant`.
pub const BOAT_WOODS: &[&str] = &["oak", "spruce", "birch", "jungle", "acacia", "dark_oak", "mangrove", "bamboo", "cherry"];

fn local(id: &str) -> &str {
    let id = id.strip_prefix("minecraft:").unwrap_or(id);
    // Bedrock identifiers may carry a spawn event suffix: `minecraft:cow<>`.
    id.split('<').next().unwrap_or(id)
}

/// Java id for a Bedrock identifier; boats need their variant.
pub fn java_entity_id(bedrock: &str, variant: i32) -> String {
    let l = local(bedrock);
    match l {
        "boat" | "chest_boat" => {
            let wood = usize::try_from(variant)
                .ok()
                .and_then(|v| BOAT_WOODS.get(v))
                .copied()
                .unwrap_or("oak");
            let kind = if wood == "bamboo" { "raft" } else { "boat" };
            if l == "chest_boat" {
                format!("minecraft:{wood}_chest_{kind}")
            } else {
                format!("minecraft:{wood}_{kind}")
            }
        }
        _ => format!("minecraft:{}", TO_JAVA.get(l).copied().unwrap_or(l)),
    }
}

/// Bedrock identifier and boat variant for a Java id.
pub fn bedrock_entity_id(java: &str) -> (String, Option<i32>) {
    let l = local(java);
    for (variant, wood) in BOAT_WOODS.iter().enumerate() {
        for (suffix, base) in [("_chest_boat", "chest_boat"), ("_chest_raft", "chest_boat"), ("_boat", "boat"), ("_raft", "boat")] {
            if l.strip_suffix(suffix) == Some(wood) {
                return (format!("minecraft:{base}"), Some(variant as i32));
            }
        }
    }
    (format!("minecraft:{}", TO_BEDROCK.get(l).copied().unwrap_or(l)), None)
}
