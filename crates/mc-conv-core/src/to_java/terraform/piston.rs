//! Pistons in motion.
//!
//! Bedrock keeps the piston block in place and records motion in the
//! `PistonArm` block entity (`State`: 0 idle, 1 extending, 2 retracting,
//! 3 extended with the arm out). Extending and retracting pistons only set
//! `extended`; state 3 turns the piston into `moving_piston` with a
//! `minecraft:piston` block entity holding the captured block.

use mc_conv_nbt::{CompoundExt, NbtCompound};
use mc_conv_world::{Block, BlockState, Facing6, JavaChunk, Pos3i};

use super::{current, replace, set_properties, BlockAccessor};
use crate::block_map::bedrock_to_java;
use crate::to_java::block_property::{BlockProperty, BlockPropertyAccessor};

const STATE_EXTENDING: i64 = 1;
const STATE_RETRACTING: i64 = 2;
const STATE_MOVING: i64 = 3;

struct Arm {
    state: i64,
    progress: f32,
}

impl Arm {
    fn read(src: &dyn BlockAccessor, pos: Pos3i) -> Option<Self> {
        let te = src.source_block_entity(pos)?;
        Some(Self {
            state: te.get_integer("State").unwrap_or(0),
            progress: te.get_float("LastProgress").unwrap_or(0.0).clamp(0.0, 1.0),
        })
    }
}

struct Motion<'a> {
    captured: &'a Block,
    facing: Facing6,
    progress: f32,
    extending: bool,
    source: bool,
}

fn piston_type(name: &str) -> &'static str {
    if name.starts_with("sticky") {
        "sticky"
    } else {
        "normal"
    }
}

fn facing_of(block: &Block) -> Facing6 {
    block.property("facing").and_then(Facing6::from_name).unwrap_or(Facing6::Up)
}

/// Replace `pos` with `moving_piston` and attach its block entity.
fn make_moving(out: &mut JavaChunk, pos: Pos3i, kind: &str, motion: Motion) {
    let block = Block::new("moving_piston")
        .with("facing", motion.facing.name())
        .with("type", kind);
    replace(out, pos, block);

    let mut te = NbtCompound::new();
    te.put("id", "minecraft:piston");
    te.put("x", pos.x);
    te.put("y", pos.y);
    te.put("z", pos.z);
    te.put("keepPacked", false);
    te.put("blockState", motion.captured.to_nbt());
    te.put("facing", motion.facing.to_java_3d_data());
    te.put("progress", motion.progress);
    te.put("extending", motion.extending);
    te.put("source", motion.source);
    out.block_entities.insert(pos, te);
}

fn pistons(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for pos in acc.positions(BlockProperty::Piston) {
        let Some(block) = current(out, pos) else { continue };
        let Some(arm) = Arm::read(src, pos) else { continue };
        match arm.state {
            STATE_EXTENDING => set_properties(out, pos, &[("extended", "true")]),
            STATE_RETRACTING => set_properties(out, pos, &[("extended", "false")]),
            STATE_MOVING => {
                let captured = block.with_properties(&[("extended", "false")]);
                let motion = Motion {
                    captured: &captured,
                    facing: facing_of(&block),
                    progress: arm.progress,
                    extending: false,
                    source: true,
                };
                make_moving(out, pos, piston_type(block.local_name()), motion);
            }
            _ => set_properties(out, pos, &[("extended", "false")]),
        }
    }
}

/// Cells Bedrock marks as `moving_block` carry the captured block and a
/// back-reference to the piston pushing them.
fn moving_blocks(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for pos in acc.positions(BlockProperty::MovingPiston) {
        let Some(te) = src.source_block_entity(pos) else { continue };
        let captured = te
            .get_compound("movingBlock")
            .and_then(BlockState::from_nbt)
            .map_or_else(Block::air, |state| bedrock_to_java(&state));
        let origin = match (te.get_int("pistonPosX"), te.get_int("pistonPosY"), te.get_int("pistonPosZ")) {
            (Some(x), Some(y), Some(z)) => Some(Pos3i::new(x, y, z)),
            _ => None,
        };
        let piston = origin.and_then(|p| {
            let block = src.block(p)?;
            let arm = Arm::read(src, p)?;
            matches!(block.local_name(), "piston" | "sticky_piston").then_some((block, arm))
        });
        match piston {
            Some((block, arm)) => {
                let motion = Motion {
                    captured: &captured,
                    facing: facing_of(block),
                    progress: arm.progress,
                    extending: arm.state == STATE_EXTENDING,
                    source: false,
                };
                make_moving(out, pos, piston_type(block.local_name()), motion);
            }
            None => {
                tracing::debug!(x = pos.x, y = pos.y, z = pos.z, "moving block without piston, placing captured block");
                replace(out, pos, captured);
            }
        }
    }
}

/// Arm collision cells move only while the piston behind them extends.
fn heads(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for pos in acc.positions(BlockProperty::PistonHead) {
        let Some(head) = current(out, pos) else { continue };
        let facing = facing_of(&head);
        let Some(arm) = Arm::read(src, pos.facing(facing.opposite())) else {
            continue;
        };
        if arm.state != STATE_EXTENDING {
            continue;
        }
        let kind = head.property("type").unwrap_or("normal").to_string();
        let motion = Motion {
            captured: &head,
            facing,
            progress: arm.progress,
            extending: true,
            source: false,
        };
        make_moving(out, pos, &kind, motion);
    }
}

pub fn apply(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    if !acc.has_any(&[BlockProperty::Piston, BlockProperty::PistonHead, BlockProperty::MovingPiston]) {
        return;
    }
    pistons(out, src, acc);
    moving_blocks(out, src, acc);
    heads(out, src, acc);
}
