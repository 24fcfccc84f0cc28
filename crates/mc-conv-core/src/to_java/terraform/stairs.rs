//! Stairs `shape` from the stairs in front of and behind each block.

use mc_conv_world::{Block, Facing4, JavaChunk, Pos3i};

use super::{current, set_properties, BlockAccessor};
use crate::block_map::is_stairs;
use crate::to_java::block_property::{BlockProperty, BlockPropertyAccessor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stair {
    facing: Facing4,
    top: bool,
}

impl Stair {
    fn of(block: &Block) -> Option<Self> {
        if !is_stairs(block.local_name()) {
            return None;
        }
        Some(Self {
            facing: block.property("facing").and_then(Facing4::from_name)?,
            top: block.property("half") == Some("top"),
        })
    }
}

fn stair_at(src: &dyn BlockAccessor, pos: Pos3i) -> Option<Stair> {
    src.block(pos).and_then(|b| Stair::of(b))
}

/// A corner may only form toward `side` when the block there is not a
/// stair continuing the same run.
fn can_take_shape(this: Stair, src: &dyn BlockAccessor, pos: Pos3i, side: Facing4) -> bool {
    match stair_at(src, pos.horizontal(side)) {
        Some(other) => other.facing != this.facing || other.top != this.top,
        None => true,
    }
}

fn shape(this: Stair, src: &dyn BlockAccessor, pos: Pos3i) -> &'static str {
    let facing = this.facing;
    if let Some(back) = stair_at(src, pos.horizontal(facing)) {
        if back.top == this.top
            && back.facing.is_x_axis() != facing.is_x_axis()
            && can_take_shape(this, src, pos, back.facing.opposite())
        {
            return if back.facing == facing.counter_clockwise() {
                "outer_left"
            } else {
                "outer_right"
            };
        }
    }
    if let Some(front) = stair_at(src, pos.horizontal(facing.opposite())) {
        if front.top == this.top
            && front.facing.is_x_axis() != facing.is_x_axis()
            && can_take_shape(this, src, pos, front.facing)
        {
            return if front.facing == facing.counter_clockwise() {
                "inner_left"
            } else {
                "inner_right"
            };
        }
    }
    "straight"
}

pub fn apply(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for pos in acc.positions(BlockProperty::Stairs) {
        let Some(this) = current(out, pos).and_then(|b| Stair::of(&b)) else {
            continue;
        };
        set_properties(out, pos, &[("shape", shape(this, src, pos))]);
    }
}
