//! Plant shapes: vine and kelp segments, chorus connections, leaf
//! distances and snowy ground.

use std::collections::{HashMap, VecDeque};

use mc_conv_world::{Facing6, JavaChunk, Pos3i};

use super::{current, replace, set_properties, BlockAccessor};
use crate::block_map::{is_leaves, is_log};
use crate::to_java::block_property::{BlockProperty, BlockPropertyAccessor};

/// Leaves further than this from a log decay.
const MAX_LEAF_DISTANCE: u8 = 7;

// ─── Vines and kelp ─────────────────────────────────────────────────────────

struct Climber {
    property: BlockProperty,
    tip: &'static str,
    body: &'static str,
    /// Direction the plant grows toward; the tip is the last block that way.
    grows: Facing6,
}

const CLIMBERS: [Climber; 4] = [
    Climber { property: BlockProperty::CaveVines, tip: "cave_vines", body: "cave_vines_plant", grows: Facing6::Down },
    Climber {
        property: BlockProperty::WeepingVines,
        tip: "weeping_vines",
        body: "weeping_vines_plant",
        grows: Facing6::Down,
    },
    Climber {
        property: BlockProperty::TwistingVines,
        tip: "twisting_vines",
        body: "twisting_vines_plant",
        grows: Facing6::Up,
    },
    Climber { property: BlockProperty::Kelp, tip: "kelp", body: "kelp_plant", grows: Facing6::Up },
];

fn climbers(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for climber in &CLIMBERS {
        for pos in acc.positions(climber.property) {
            let Some(block) = current(out, pos) else { continue };
            let next = src.name(pos.facing(climber.grows));
            let continues = next == climber.tip || next == climber.body;
            let shaped = if continues {
                let body = block.renamed(climber.body).without(&["age"]);
                if climber.body == "cave_vines_plant" {
                    body.with("berries", block.property("berries").unwrap_or("false"))
                } else {
                    body
                }
            } else {
                let tip = block.renamed(climber.tip);
                let age = block.property("age").unwrap_or("0").to_string();
                tip.with("age", age)
            };
            if shaped != *block {
                replace(out, pos, shaped);
            }
        }
    }
}

// ─── Chorus ─────────────────────────────────────────────────────────────────

fn chorus(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for pos in acc.positions(BlockProperty::ChorusPlant) {
        let sides: Vec<(&str, &str)> = Facing6::ALL
            .into_iter()
            .map(|side| {
                let name = src.name(pos.facing(side));
                let joined = matches!(name, "chorus_plant" | "chorus_flower")
                    || (side == Facing6::Down && name == "end_stone");
                (side.name(), if joined { "true" } else { "false" })
            })
            .collect();
        set_properties(out, pos, &sides);
    }
}

// ─── Leaves ─────────────────────────────────────────────────────────────────

/// Multi-source breadth-first search from every log near the chunk.
fn leaf_distances(src: &dyn BlockAccessor, min: Pos3i, max: Pos3i) -> HashMap<Pos3i, u8> {
    let mut dist = HashMap::new();
    let mut queue = VecDeque::new();
    for y in min.y..=max.y {
        for z in min.z..=max.z {
            for x in min.x..=max.x {
                let pos = Pos3i::new(x, y, z);
                if is_log(src.name(pos)) {
                    dist.insert(pos, 0u8);
                    queue.push_back(pos);
                }
            }
        }
    }
    let inside = |p: Pos3i| {
        (min.x..=max.x).contains(&p.x) && (min.y..=max.y).contains(&p.y) && (min.z..=max.z).contains(&p.z)
    };
    while let Some(pos) = queue.pop_front() {
        let d = dist[&pos];
        if d + 1 >= MAX_LEAF_DISTANCE {
            continue;
        }
        for side in Facing6::ALL {
            let next = pos.facing(side);
            if !inside(next) || dist.contains_key(&next) || !is_leaves(src.name(next)) {
                continue;
            }
            dist.insert(next, d + 1);
            queue.push_back(next);
        }
    }
    dist
}

fn leaves(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    let positions = acc.positions(BlockProperty::Leaves);
    let (Some(low), Some(high)) = (positions.iter().map(|p| p.y).min(), positions.iter().map(|p| p.y).max()) else {
        return;
    };
    let reach = MAX_LEAF_DISTANCE as i32 - 1;
    let (bx, bz) = (out.pos.x * 16, out.pos.z * 16);
    let min = Pos3i::new(bx - reach, low - reach, bz - reach);
    let max = Pos3i::new(bx + 15 + reach, high + reach, bz + 15 + reach);
    let dist = leaf_distances(src, min, max);
    for pos in positions {
        let d = dist.get(&pos).copied().unwrap_or(MAX_LEAF_DISTANCE);
        set_properties(out, pos, &[("distance", d.to_string().as_str())]);
    }
}

// ─── Snowy ground ───────────────────────────────────────────────────────────

fn snowy(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for pos in acc.positions(BlockProperty::SnowyBlock) {
        let covered = matches!(src.name(pos.up()), "snow" | "snow_block" | "powder_snow");
        set_properties(out, pos, &[("snowy", if covered { "true" } else { "false" })]);
    }
}

pub fn apply(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    climbers(out, src, acc);
    chorus(out, src, acc);
    leaves(out, src, acc);
    snowy(out, src, acc);
}
