//! Redstone wire side connections.

use mc_conv_world::{Block, Facing4, JavaChunk, Pos3i};

use super::solid::{is_full_solid, is_redstone_conductor};
use super::{set_properties, BlockAccessor};
use crate::block_map::{is_button, is_pressure_plate};
use crate::to_java::block_property::{BlockProperty, BlockPropertyAccessor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireSide {
    None,
    Side,
    Up,
}

impl WireSide {
    fn name(self) -> &'static str {
        match self {
            WireSide::None => "none",
            WireSide::Side => "side",
            WireSide::Up => "up",
        }
    }
}

/// Sides in `Facing4::ALL` order. A single connection is extended through
/// to the opposite side and an isolated wire connects on all four.
pub fn normalize_wire(mut sides: [WireSide; 4]) -> [WireSide; 4] {
    let connected: Vec<usize> = (0..4).filter(|&i| sides[i] != WireSide::None).collect();
    match connected.as_slice() {
        [] => sides = [WireSide::Side; 4],
        [only] => sides[(only + 2) % 4] = WireSide::Side,
        _ => {}
    }
    sides
}

fn is_wire(block: Option<&Block>) -> bool {
    block.is_some_and(|b| b.local_name() == "redstone_wire")
}

/// Whether the wire reaches sideways to `neighbour`, which lies on `side`.
fn connects_to(neighbour: &Block, side: Facing4) -> bool {
    let name = neighbour.local_name();
    let facing = || neighbour.property("facing").and_then(Facing4::from_name);
    match name {
        "redstone_wire" => true,
        "repeater" => facing().is_some_and(|f| f.is_x_axis() == side.is_x_axis()),
        "observer" => facing() == Some(side),
        "redstone_torch" | "redstone_wall_torch" | "redstone_block" | "lever" | "comparator" | "daylight_detector"
        | "target" | "tripwire_hook" | "trapped_chest" | "detector_rail" | "lectern" | "sculk_sensor"
        | "calibrated_sculk_sensor" | "lightning_rod" => true,
        _ => is_button(name) || is_pressure_plate(name),
    }
}

fn side_state(src: &dyn BlockAccessor, pos: Pos3i, side: Facing4, open_above: bool) -> WireSide {
    let next = pos.horizontal(side);
    let neighbour = src.block(next);
    let name = src.name(next);
    if open_above && is_full_solid(name) && is_wire(src.block(next.up()).map(|b| &**b)) {
        return WireSide::Up;
    }
    if neighbour.is_some_and(|n| connects_to(n, side)) {
        return WireSide::Side;
    }
    if !is_redstone_conductor(name) && is_wire(src.block(next.down()).map(|b| &**b)) {
        return WireSide::Side;
    }
    WireSide::None
}

pub fn apply(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for pos in acc.positions(BlockProperty::RedstoneWire) {
        let open_above = !is_redstone_conductor(src.name(pos.up()));
        let mut sides = [WireSide::None; 4];
        for (i, side) in Facing4::ALL.into_iter().enumerate() {
            sides[i] = side_state(src, pos, side, open_above);
        }
        let sides = normalize_wire(sides);
        let overrides: Vec<(&str, &str)> = Facing4::ALL
            .iter()
            .zip(sides)
            .map(|(f, s)| (f.name(), s.name()))
            .collect();
        set_properties(out, pos, &overrides);
    }
}
