//! Bedrock block states to Java block states.

use mc_conv_world::{BlockState, Block, Facing4, Facing6};

use super::names::java_name;
use super::*;

fn flag(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

fn cardinal(state: &BlockState) -> Option<Facing4> {
    state.get_str("minecraft:cardinal_direction").and_then(Facing4::from_name)
}

fn six_way(state: &BlockState) -> Facing6 {
    match state.get_str("minecraft:facing_direction") {
        Some(name) => Facing6::from_name(name).unwrap_or(Facing6::Down),
        None => decode_dir(&FACING_DIRECTIONS, state.get_int("facing_direction"), Facing6::Down),
    }
}

fn legacy_direction(state: &BlockState) -> Facing4 {
    cardinal(state).unwrap_or_else(|| decode_dir(&LEGACY_DIRECTIONS, state.get_int("direction"), Facing4::South))
}

/// Translate one palette entry. The result never carries
/// `waterlogged=true`; the water layer is applied separately.
pub fn bedrock_to_java(state: &BlockState) -> Block {
    let local = state.local_name();
    if local.ends_with("_double_slab") {
        let single = local.replace("_double_slab", "_slab");
        return Block::new(java_name(&single))
            .with("type", "double")
            .with("waterlogged", "false");
    }
    let name = java_name(local);
    let block = Block::new(name);
    let b = |v: &str| state.get_bool(v).unwrap_or(false);

    match local {
        "air" => Block::air(),
        "frame" | "glow_frame" => Block::air(),
        "redstone_wire" => {
            let power = state.get_int("redstone_signal").unwrap_or(0);
            block
                .with("power", power.to_string())
                .with("north", "none")
                .with("east", "none")
                .with("south", "none")
                .with("west", "none")
        }
        "unpowered_repeater" | "powered_repeater" => block
            .with("facing", decode_dir(&DIODE_DIRECTIONS, state.get_int("direction"), Facing4::North).name())
            .with("delay", (state.get_int("repeater_delay").unwrap_or(0).clamp(0, 3) + 1).to_string())
            .with("locked", "false")
            .with("powered", flag(local == "powered_repeater")),
        "unpowered_comparator" | "powered_comparator" => block
            .with("facing", decode_dir(&DIODE_DIRECTIONS, state.get_int("direction"), Facing4::North).name())
            .with("mode", if b("output_subtract_bit") { "subtract" } else { "compare" })
            .with("powered", flag(local == "powered_comparator" || b("output_lit_bit"))),
        "observer" => block
            .with("facing", six_way(state).name())
            .with("powered", flag(b("powered_bit"))),
        "lever" => {
            let (face, facing) = match state.get_str("lever_direction").unwrap_or("north") {
                "down_east_west" => ("ceiling", "west"),
                "down_north_south" => ("ceiling", "north"),
                "up_east_west" => ("floor", "west"),
                "up_north_south" => ("floor", "north"),
                side => ("wall", Facing4::from_name(side).map_or("north", Facing4::name)),
            };
            block
                .with("face", face)
                .with("facing", facing)
                .with("powered", flag(b("open_bit")))
        }
        "torch" | "soul_torch" | "redstone_torch" | "unlit_redstone_torch" => torch(local, state),
        "piston" | "sticky_piston" => block
            .with("facing", decode_dir(&PISTON_DIRECTIONS, state.get_int("facing_direction"), Facing6::Up).name())
            .with("extended", "false"),
        "piston_arm_collision" | "sticky_piston_arm_collision" => block
            .with("facing", decode_dir(&PISTON_DIRECTIONS, state.get_int("facing_direction"), Facing6::Up).name())
            .with("short", "false")
            .with("type", if local.starts_with("sticky") { "sticky" } else { "normal" }),
        "moving_block" => block.with("facing", "north").with("type", "normal"),
        "chorus_plant" => ["down", "up", "north", "east", "south", "west"]
            .into_iter()
            .fold(block, |blk, side| blk.with(side, "false")),
        "chorus_flower" => block.with("age", state.get_int("age").unwrap_or(0).to_string()),
        "snow_layer" => block.with("layers", (state.get_int("height").unwrap_or(0).clamp(0, 7) + 1).to_string()),
        "grass_block" | "grass" | "podzol" | "mycelium" => block.with("snowy", "false"),
        "noteblock" => block
            .with("instrument", "harp")
            .with("note", "0")
            .with("powered", "false"),
        "cave_vines" | "cave_vines_head_with_berries" | "cave_vines_body_with_berries" => {
            let berries = local != "cave_vines";
            let blk = block.with("berries", flag(berries));
            if local == "cave_vines_body_with_berries" {
                blk
            } else {
                blk.with("age", state.get_int("growing_plant_age").unwrap_or(0).to_string())
            }
        }
        "weeping_vines" => block.with("age", state.get_int("weeping_vines_age").unwrap_or(0).to_string()),
        "twisting_vines" => block.with("age", state.get_int("twisting_vines_age").unwrap_or(0).to_string()),
        "kelp" => block.with("age", state.get_int("kelp_age").unwrap_or(0).to_string()),
        "campfire" | "soul_campfire" => block
            .with("facing", legacy_direction(state).name())
            .with("lit", flag(!b("extinguished")))
            .with("signal_fire", "false")
            .with("waterlogged", "false"),
        "trip_wire" => block
            .with("attached", flag(b("attached_bit")))
            .with("disarmed", flag(b("disarmed_bit")))
            .with("powered", flag(b("powered_bit")))
            .with("north", "false")
            .with("east", "false")
            .with("south", "false")
            .with("west", "false"),
        "tripwire_hook" => block
            .with("facing", legacy_direction(state).name())
            .with("attached", flag(b("attached_bit")))
            .with("powered", flag(b("powered_bit"))),
        "chest" | "trapped_chest" => block
            .with("facing", cardinal(state).unwrap_or(Facing4::North).name())
            .with("type", "single")
            .with("waterlogged", "false"),
        "ender_chest" => block
            .with("facing", cardinal(state).unwrap_or(Facing4::North).name())
            .with("waterlogged", "false"),
        "bed" => block
            .with("facing", legacy_direction(state).name())
            .with("part", if b("head_piece_bit") { "head" } else { "foot" })
            .with("occupied", flag(b("occupied_bit"))),
        "bell" => block
            .with(
                "attachment",
                match state.get_str("attachment").unwrap_or("standing") {
                    "hanging" => "ceiling",
                    "side" => "single_wall",
                    "multiple" => "double_wall",
                    _ => "floor",
                },
            )
            .with("facing", legacy_direction(state).name())
            .with("powered", flag(b("toggle_bit"))),
        "chiseled_bookshelf" => {
            let stored = state.get_int("books_stored").unwrap_or(0);
            (0..6).fold(block.with("facing", legacy_direction(state).name()), |blk, i| {
                blk.with(&format!("slot_{i}_occupied"), flag(stored & (1 << i) != 0))
            })
        }
        "water" | "flowing_water" | "lava" | "flowing_lava" => {
            block.with("level", state.get_int("liquid_depth").unwrap_or(0).clamp(0, 15).to_string())
        }
        "redstone_lamp" | "lit_redstone_lamp" | "redstone_ore" | "lit_redstone_ore" | "deepslate_redstone_ore"
        | "lit_deepslate_redstone_ore" => block.with("lit", flag(local.starts_with("lit_"))),
        "furnace" | "lit_furnace" | "smoker" | "lit_smoker" | "blast_furnace" | "lit_blast_furnace" => block
            .with("facing", cardinal(state).unwrap_or(Facing4::North).name())
            .with("lit", flag(local.starts_with("lit_"))),
        _ => family(name, state, block),
    }
}

fn torch(local: &str, state: &BlockState) -> Block {
    let redstone = local.contains("redstone");
    let lit = local != "unlit_redstone_torch";
    let side = state
        .get_str("torch_facing_direction")
        .and_then(Facing4::from_name);
    let (standing, wall) = match local {
        "soul_torch" => ("soul_torch", "soul_wall_torch"),
        "torch" => ("torch", "wall_torch"),
        _ => ("redstone_torch", "redstone_wall_torch"),
    };
    let block = match side {
        Some(side) => Block::new(wall).with("facing", side.opposite().name()),
        None => Block::new(standing),
    };
    if redstone {
        block.with("lit", flag(lit))
    } else {
        block
    }
}

/// Families matched by name pattern rather than by exact identifier.
fn family(name: &str, state: &BlockState, block: Block) -> Block {
    let b = |v: &str| state.get_bool(v).unwrap_or(false);
    if is_stairs(name) {
        return block
            .with("facing", decode_dir(&STAIRS_DIRECTIONS, state.get_int("weirdo_direction"), Facing4::East).name())
            .with("half", if b("upside_down_bit") { "top" } else { "bottom" })
            .with("shape", "straight")
            .with("waterlogged", "false");
    }
    if is_slab(name) {
        let half = state.get_str("minecraft:vertical_half").unwrap_or(if b("top_slot_bit") { "top" } else { "bottom" });
        return block.with("type", half).with("waterlogged", "false");
    }
    if is_fence_gate(name) {
        return block
            .with("facing", legacy_direction(state).name())
            .with("open", flag(b("open_bit")))
            .with("in_wall", flag(b("in_wall_bit")))
            .with("powered", "false");
    }
    if is_fence(name) || is_pane(name) {
        return block
            .with("north", "false")
            .with("east", "false")
            .with("south", "false")
            .with("west", "false")
            .with("waterlogged", "false");
    }
    if is_wall(name) {
        let side = |key: &str| match state.get_str(key) {
            Some("short") => "low",
            Some("tall") => "tall",
            _ => "none",
        };
        return block
            .with("north", side("wall_connection_type_north"))
            .with("east", side("wall_connection_type_east"))
            .with("south", side("wall_connection_type_south"))
            .with("west", side("wall_connection_type_west"))
            .with("up", flag(b("wall_post_bit")))
            .with("waterlogged", "false");
    }
    if is_door(name) {
        let facing = cardinal(state)
            .unwrap_or_else(|| decode_dir(&DOOR_DIRECTIONS, state.get_int("direction"), Facing4::East));
        return block
            .with("facing", facing.name())
            .with("half", if b("upper_block_bit") { "upper" } else { "lower" })
            .with("hinge", if b("door_hinge_bit") { "right" } else { "left" })
            .with("open", flag(b("open_bit")))
            .with("powered", "false");
    }
    if is_trapdoor(name) {
        return block
            .with("facing", decode_dir(&STAIRS_DIRECTIONS, state.get_int("direction"), Facing4::East).name())
            .with("half", if b("upside_down_bit") { "top" } else { "bottom" })
            .with("open", flag(b("open_bit")))
            .with("powered", "false")
            .with("waterlogged", "false");
    }
    if is_leaves(name) {
        return block
            .with("distance", "7")
            .with("persistent", flag(b("persistent_bit")))
            .with("waterlogged", "false");
    }
    if is_button(name) {
        let facing = six_way(state);
        let (face, dir) = match facing {
            Facing6::Down => ("ceiling", Facing4::North),
            Facing6::Up => ("floor", Facing4::North),
            other => ("wall", other.horizontal().unwrap_or(Facing4::North)),
        };
        return block
            .with("face", face)
            .with("facing", dir.name())
            .with("powered", flag(b("button_pressed_bit")));
    }
    if is_pressure_plate(name) {
        let signal = state.get_int("redstone_signal").unwrap_or(0).clamp(0, 15);
        return if is_weighted_plate(name) {
            block.with("power", signal.to_string())
        } else {
            block.with("powered", flag(signal > 0))
        };
    }
    let mut block = block;
    if let Some(axis) = state.get_str("pillar_axis") {
        block = block.with("axis", axis);
    }
    if let Some(facing) = cardinal(state) {
        block = block.with("facing", facing.name());
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stairs_carry_facing_and_half() {
        let s = BlockState::new("oak_stairs")
            .with("weirdo_direction", 2)
            .with("upside_down_bit", true);
        assert_eq!(
            bedrock_to_java(&s),
            Block::parse("oak_stairs[facing=south,half=top,shape=straight,waterlogged=false]").unwrap()
        );
    }

    #[test]
    fn double_slab_collapses() {
        let s = BlockState::new("normal_stone_double_slab").with("minecraft:vertical_half", "bottom");
        assert_eq!(bedrock_to_java(&s), Block::parse("stone_slab[type=double,waterlogged=false]").unwrap());
    }

    #[test]
    fn door_prefers_cardinal_direction() {
        let s = BlockState::new("wooden_door")
            .with("minecraft:cardinal_direction", "west")
            .with("direction", 0)
            .with("upper_block_bit", true)
            .with("door_hinge_bit", true);
        let j = bedrock_to_java(&s);
        assert_eq!(j.name, "minecraft:oak_door");
        assert_eq!(j.property("facing"), Some("west"));
        assert_eq!(j.property("half"), Some("upper"));
        assert_eq!(j.property("hinge"), Some("right"));
    }

    #[test]
    fn wall_torch_faces_away_from_support() {
        let s = BlockState::new("torch").with("torch_facing_direction", "west");
        assert_eq!(bedrock_to_java(&s), Block::parse("wall_torch[facing=east]").unwrap());
        let s = BlockState::new("unlit_redstone_torch").with("torch_facing_direction", "top");
        assert_eq!(bedrock_to_java(&s), Block::parse("redstone_torch[lit=false]").unwrap());
    }

    #[test]
    fn repeater_delay_and_power() {
        let s = BlockState::new("powered_repeater")
            .with("direction", 1)
            .with("repeater_delay", 2);
        assert_eq!(
            bedrock_to_java(&s),
            Block::parse("repeater[delay=3,facing=east,locked=false,powered=true]").unwrap()
        );
    }

    #[test]
    fn piston_facing_is_mirrored() {
        let s = BlockState::new("sticky_piston").with("facing_direction", 2);
        assert_eq!(
            bedrock_to_java(&s),
            Block::parse("sticky_piston[extended=false,facing=south]").unwrap()
        );
        let s = BlockState::new("sticky_piston_arm_collision").with("facing_direction", 4);
        let head = bedrock_to_java(&s);
        assert_eq!(head.name, "minecraft:piston_head");
        assert_eq!(head.property("type"), Some("sticky"));
        assert_eq!(head.property("facing"), Some("east"));
    }

    #[test]
    fn chiseled_bookshelf_bits() {
        let s = BlockState::new("chiseled_bookshelf").with("books_stored", 0b100101).with("direction", 2);
        let j = bedrock_to_java(&s);
        assert_eq!(j.property("facing"), Some("north"));
        assert_eq!(j.property("slot_0_occupied"), Some("true"));
        assert_eq!(j.property("slot_1_occupied"), Some("false"));
        assert_eq!(j.property("slot_5_occupied"), Some("true"));
    }

    #[test]
    fn unknown_blocks_pass_through_without_properties() {
        let s = BlockState::new("mod_block").with("color", "red");
        assert_eq!(bedrock_to_java(&s), Block::new("mod_block"));
    }

    #[test]
    fn logs_keep_axis() {
        let s = BlockState::new("oak_log").with("pillar_axis", "x");
        assert_eq!(bedrock_to_java(&s), Block::parse("oak_log[axis=x]").unwrap());
    }
}
