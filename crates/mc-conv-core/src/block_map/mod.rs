//! Block, item and entity identifier tables for both editions.
//!
//! Block states are translated per family. Names without a family keep
//! their identifier and lose their properties.

pub mod entities;
pub mod items;
pub mod names;
pub mod to_bedrock;
pub mod to_java;

use mc_conv_world::{Facing4, Facing6};

pub use to_bedrock::java_to_bedrock;
pub use to_java::bedrock_to_java;

// ─── Direction encodings ────────────────────────────────────────────────────

/// `direction` of beds, fence gates, bells and most legacy blocks.
pub const LEGACY_DIRECTIONS: [Facing4; 4] = [Facing4::South, Facing4::West, Facing4::North, Facing4::East];

/// `direction` of doors.
pub const DOOR_DIRECTIONS: [Facing4; 4] = [Facing4::East, Facing4::South, Facing4::West, Facing4::North];

/// `weirdo_direction` of stairs, also `direction` of trapdoors.
pub const STAIRS_DIRECTIONS: [Facing4; 4] = [Facing4::East, Facing4::West, Facing4::South, Facing4::North];

/// `direction` of repeaters and comparators, as the Java `facing`.
pub const DIODE_DIRECTIONS: [Facing4; 4] = [Facing4::North, Facing4::East, Facing4::South, Facing4::West];

/// `facing_direction` of buttons, item frames and most six-way blocks.
pub const FACING_DIRECTIONS: [Facing6; 6] = [
    Facing6::Down,
    Facing6::Up,
    Facing6::North,
    Facing6::South,
    Facing6::West,
    Facing6::East,
];

/// `facing_direction` of pistons and their heads; horizontals are mirrored.
pub const PISTON_DIRECTIONS: [Facing6; 6] = [
    Facing6::Down,
    Facing6::Up,
    Facing6::South,
    Facing6::North,
    Facing6::East,
    Facing6::West,
];

pub fn decode_dir<T: Copy>(table: &[T], value: Option<i32>, fallback: T) -> T {
    value
        .and_then(|v| usize::try_from(v).ok())
        .and_then(|v| table.get(v).copied())
        .unwrap_or(fallback)
}

pub fn encode_dir<T: PartialEq>(table: &[T], value: &T) -> i32 {
    table.iter().position(|t| t == value).unwrap_or(0) as i32
}

// ─── Families (Java local names) ────────────────────────────────────────────

pub fn is_stairs(name: &str) -> bool {
    name.ends_with("_stairs")
}

pub fn is_slab(name: &str) -> bool {
    name.ends_with("_slab")
}

pub fn is_fence(name: &str) -> bool {
    name.ends_with("_fence")
}

pub fn is_fence_gate(name: &str) -> bool {
    name.ends_with("fence_gate")
}

pub fn is_wall(name: &str) -> bool {
    name.ends_with("_wall")
}

pub fn is_pane(name: &str) -> bool {
    name == "glass_pane" || name == "iron_bars" || name.ends_with("_stained_glass_pane")
}

pub fn is_door(name: &str) -> bool {
    name.ends_with("_door")
}

pub fn is_trapdoor(name: &str) -> bool {
    name.ends_with("trapdoor")
}

pub fn is_leaves(name: &str) -> bool {
    name.ends_with("_leaves")
}

pub fn is_button(name: &str) -> bool {
    name.ends_with("_button")
}

pub fn is_pressure_plate(name: &str) -> bool {
    name.ends_with("_pressure_plate")
}

pub fn is_weighted_plate(name: &str) -> bool {
    name.ends_with("weighted_pressure_plate")
}

pub fn is_bed(name: &str) -> bool {
    name.ends_with("_bed")
}

pub fn is_log(name: &str) -> bool {
    if name.ends_with("melon_stem") || name.ends_with("pumpkin_stem") || name == "mushroom_stem" {
        return false;
    }
    name.ends_with("_log") || name.ends_with("_wood") || name.ends_with("_stem") || name.ends_with("_hyphae")
}

/// Blocks Java stores as inherently waterlogged.
pub fn is_always_waterlogged(name: &str) -> bool {
    matches!(name, "kelp" | "kelp_plant" | "seagrass" | "tall_seagrass" | "bubble_column")
}
