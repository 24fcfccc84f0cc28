//! Java block states to Bedrock block states.

use mc_conv_world::{Block, BlockState, Facing4, Facing6};

use super::names::bedrock_name;
use super::*;

fn facing4(block: &Block) -> Facing4 {
    block.property("facing").and_then(Facing4::from_name).unwrap_or(Facing4::North)
}

fn facing6(block: &Block) -> Facing6 {
    block.property("facing").and_then(Facing6::from_name).unwrap_or(Facing6::Up)
}

fn is_true(block: &Block, key: &str) -> bool {
    block.property(key) == Some("true")
}

fn int(block: &Block, key: &str) -> i32 {
    block.property(key).and_then(|v| v.parse().ok()).unwrap_or(0)
}

/// Translate one Java block state. `waterlogged` is dropped here; the
/// section encoder turns it into the second storage layer.
pub fn java_to_bedrock(block: &Block) -> BlockState {
    let local = block.local_name();
    let name = bedrock_name(local);
    let state = BlockState::new(name);

    match local {
        "air" | "cave_air" | "void_air" => BlockState::air(),
        "redstone_wire" => state.with("redstone_signal", int(block, "power")),
        "repeater" => BlockState::new(if is_true(block, "powered") { "powered_repeater" } else { "unpowered_repeater" })
            .with("direction", encode_dir(&DIODE_DIRECTIONS, &facing4(block)))
            .with("repeater_delay", (int(block, "delay") - 1).clamp(0, 3)),
        "comparator" => {
            BlockState::new(if is_true(block, "powered") { "powered_comparator" } else { "unpowered_comparator" })
                .with("direction", encode_dir(&DIODE_DIRECTIONS, &facing4(block)))
                .with("output_subtract_bit", block.property("mode") == Some("subtract"))
                .with("output_lit_bit", is_true(block, "powered"))
        }
        "observer" => state
            .with("minecraft:facing_direction", facing6(block).name())
            .with("powered_bit", is_true(block, "powered")),
        "lever" => {
            let facing = facing4(block);
            let direction = match block.property("face").unwrap_or("wall") {
                "ceiling" if facing.is_x_axis() => "down_east_west",
                "ceiling" => "down_north_south",
                "floor" if facing.is_x_axis() => "up_east_west",
                "floor" => "up_north_south",
                _ => facing.name(),
            };
            state
                .with("lever_direction", direction)
                .with("open_bit", is_true(block, "powered"))
        }
        "torch" | "soul_torch" => state.with("torch_facing_direction", "top"),
        "wall_torch" | "soul_wall_torch" => BlockState::new(local.replace("wall_", "").as_str())
            .with("torch_facing_direction", facing4(block).opposite().name()),
        "redstone_torch" | "redstone_wall_torch" => {
            let lit = block.property("lit") != Some("false");
            let side = if local == "redstone_torch" {
                "top"
            } else {
                facing4(block).opposite().name()
            };
            BlockState::new(if lit { "redstone_torch" } else { "unlit_redstone_torch" })
                .with("torch_facing_direction", side)
        }
        "piston" | "sticky_piston" => state.with("facing_direction", encode_dir(&PISTON_DIRECTIONS, &facing6(block))),
        "piston_head" => {
            let sticky = block.property("type") == Some("sticky");
            BlockState::new(if sticky { "sticky_piston_arm_collision" } else { "piston_arm_collision" })
                .with("facing_direction", encode_dir(&PISTON_DIRECTIONS, &facing6(block)))
        }
        "moving_piston" => state,
        "chorus_flower" => state.with("age", int(block, "age")),
        "snow" => state
            .with("height", (int(block, "layers") - 1).clamp(0, 7))
            .with("covered_bit", false),
        "cave_vines" | "cave_vines_plant" => {
            let berries = is_true(block, "berries");
            let name = match (local, berries) {
                ("cave_vines", true) => "cave_vines_head_with_berries",
                ("cave_vines_plant", true) => "cave_vines_body_with_berries",
                _ => "cave_vines",
            };
            BlockState::new(name).with("growing_plant_age", int(block, "age"))
        }
        "weeping_vines" | "weeping_vines_plant" => {
            BlockState::new("weeping_vines").with("weeping_vines_age", int(block, "age"))
        }
        "twisting_vines" | "twisting_vines_plant" => {
            BlockState::new("twisting_vines").with("twisting_vines_age", int(block, "age"))
        }
        "kelp" | "kelp_plant" => BlockState::new("kelp").with("kelp_age", int(block, "age")),
        "campfire" | "soul_campfire" => state
            .with("minecraft:cardinal_direction", facing4(block).name())
            .with("extinguished", !is_true(block, "lit")),
        "tripwire" => state
            .with("attached_bit", is_true(block, "attached"))
            .with("disarmed_bit", is_true(block, "disarmed"))
            .with("powered_bit", is_true(block, "powered"))
            .with("suspended_bit", false),
        "tripwire_hook" => state
            .with("direction", encode_dir(&LEGACY_DIRECTIONS, &facing4(block)))
            .with("attached_bit", is_true(block, "attached"))
            .with("powered_bit", is_true(block, "powered")),
        "chest" | "trapped_chest" | "ender_chest" => {
            state.with("minecraft:cardinal_direction", facing4(block).name())
        }
        "bell" => state
            .with(
                "attachment",
                match block.property("attachment").unwrap_or("floor") {
                    "ceiling" => "hanging",
                    "single_wall" => "side",
                    "double_wall" => "multiple",
                    _ => "standing",
                },
            )
            .with("direction", encode_dir(&LEGACY_DIRECTIONS, &facing4(block)))
            .with("toggle_bit", is_true(block, "powered")),
        "chiseled_bookshelf" => {
            let stored = (0..6)
                .filter(|i| is_true(block, &format!("slot_{i}_occupied")))
                .fold(0i32, |acc, i| acc | (1 << i));
            state
                .with("direction", encode_dir(&LEGACY_DIRECTIONS, &facing4(block)))
                .with("books_stored", stored)
                .with("last_interacted_slot", 0)
        }
        "item_frame" | "glow_item_frame" => state
            .with("facing_direction", encode_dir(&FACING_DIRECTIONS, &facing6(block)))
            .with("item_frame_map_bit", false)
            .with("item_frame_photo_bit", false),
        "water" | "lava" => state.with("liquid_depth", int(block, "level")),
        "redstone_lamp" | "redstone_ore" | "deepslate_redstone_ore" if is_true(block, "lit") => {
            BlockState::new(&format!("lit_{local}"))
        }
        "furnace" | "smoker" | "blast_furnace" => {
            let name = if is_true(block, "lit") { format!("lit_{local}") } else { local.to_string() };
            BlockState::new(&name).with("minecraft:cardinal_direction", facing4(block).name())
        }
        _ => family(local, block, state),
    }
}

fn family(local: &str, block: &Block, state: BlockState) -> BlockState {
    if is_stairs(local) {
        return state
            .with("weirdo_direction", encode_dir(&STAIRS_DIRECTIONS, &facing4(block)))
            .with("upside_down_bit", block.property("half") == Some("top"));
    }
    if is_slab(local) {
        return match block.property("type").unwrap_or("bottom") {
            "double" => {
                let double = bedrock_name(local).replace("_slab", "_double_slab");
                BlockState::new(&double).with("minecraft:vertical_half", "bottom")
            }
            half => state.with("minecraft:vertical_half", half),
        };
    }
    if is_fence_gate(local) {
        return state
            .with("direction", encode_dir(&LEGACY_DIRECTIONS, &facing4(block)))
            .with("open_bit", is_true(block, "open"))
            .with("in_wall_bit", is_true(block, "in_wall"));
    }
    if is_wall(local) {
        let side = |key: &str| match block.property(key) {
            Some("low") => "short",
            Some("tall") => "tall",
            _ => "none",
        };
        return state
            .with("wall_connection_type_north", side("north"))
            .with("wall_connection_type_east", side("east"))
            .with("wall_connection_type_south", side("south"))
            .with("wall_connection_type_west", side("west"))
            .with("wall_post_bit", is_true(block, "up"));
    }
    if is_door(local) {
        return state
            .with("minecraft:cardinal_direction", facing4(block).name())
            .with("upper_block_bit", block.property("half") == Some("upper"))
            .with("door_hinge_bit", block.property("hinge") == Some("right"))
            .with("open_bit", is_true(block, "open"));
    }
    if is_trapdoor(local) {
        return state
            .with("direction", encode_dir(&STAIRS_DIRECTIONS, &facing4(block)))
            .with("open_bit", is_true(block, "open"))
            .with("upside_down_bit", block.property("half") == Some("top"));
    }
    if is_leaves(local) {
        return state
            .with("persistent_bit", is_true(block, "persistent"))
            .with("update_bit", false);
    }
    if is_button(local) {
        let facing = match block.property("face").unwrap_or("wall") {
            "ceiling" => Facing6::Down,
            "floor" => Facing6::Up,
            _ => Facing6::from(facing4(block)),
        };
        return state
            .with("facing_direction", encode_dir(&FACING_DIRECTIONS, &facing))
            .with("button_pressed_bit", is_true(block, "powered"));
    }
    if is_pressure_plate(local) {
        let signal = if is_weighted_plate(local) {
            int(block, "power")
        } else if is_true(block, "powered") {
            15
        } else {
            0
        };
        return state.with("redstone_signal", signal);
    }
    if is_bed(local) {
        return BlockState::new("bed")
            .with("direction", encode_dir(&LEGACY_DIRECTIONS, &facing4(block)))
            .with("head_piece_bit", block.property("part") == Some("head"))
            .with("occupied_bit", is_true(block, "occupied"));
    }
    let mut state = state;
    if let Some(axis) = block.property("axis") {
        state = state.with("pillar_axis", axis);
    }
    if let Some(facing) = block.property("facing").and_then(Facing4::from_name) {
        state = state.with("minecraft:cardinal_direction", facing.name());
    }
    state
}
