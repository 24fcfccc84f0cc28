//! Per-chunk block classification for the terraform passes.
//!
//! The palette of every section is classified once. Chunk flags let a
//! pass return immediately when its family is absent; the per-cell table
//! replaces string matching inside the passes.

use std::collections::BTreeMap;

use mc_conv_world::{Block, JavaChunk, JavaSection, Pos3i};

use crate::block_map::{is_door, is_fence, is_leaves, is_pane, is_stairs, is_wall};

const CELLS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum BlockProperty {
    #[default]
    None,
    Stairs,
    Fence,
    Wall,
    GlassPane,
    RedstoneWire,
    Door,
    CaveVines,
    WeepingVines,
    TwistingVines,
    Kelp,
    ChorusPlant,
    Leaves,
    SnowyBlock,
    NoteBlock,
    Piston,
    PistonHead,
    MovingPiston,
    Beacon,
    Campfire,
    Tripwire,
    Chest,
    Bed,
}

impl BlockProperty {
    pub fn of(block: &Block) -> Self {
        let name = block.local_name();
        match name {
            "redstone_wire" => Self::RedstoneWire,
            "cave_vines" | "cave_vines_plant" => Self::CaveVines,
            "weeping_vines" | "weeping_vines_plant" => Self::WeepingVines,
            "twisting_vines" | "twisting_vines_plant" => Self::TwistingVines,
            "kelp" | "kelp_plant" => Self::Kelp,
            "chorus_plant" => Self::ChorusPlant,
            "grass_block" | "podzol" | "mycelium" => Self::SnowyBlock,
            "note_block" => Self::NoteBlock,
            "piston" | "sticky_piston" => Self::Piston,
            "piston_head" => Self::PistonHead,
            "moving_piston" => Self::MovingPiston,
            "beacon" => Self::Beacon,
            "campfire" | "soul_campfire" => Self::Campfire,
            "tripwire" => Self::Tripwire,
            "chest" | "trapped_chest" => Self::Chest,
            _ if is_stairs(name) => Self::Stairs,
            _ if is_fence(name) => Self::Fence,
            _ if is_wall(name) => Self::Wall,
            _ if is_pane(name) => Self::GlassPane,
            _ if is_door(name) => Self::Door,
            _ if is_leaves(name) => Self::Leaves,
            _ if name.ends_with("_bed") => Self::Bed,
            _ => Self::None,
        }
    }

    fn bit(self) -> u32 {
        1 << self as u8
    }
}

pub struct BlockPropertyAccessor {
    origin: Pos3i,
    flags: u32,
    sections: BTreeMap<i32, Box<[BlockProperty; CELLS]>>,
}

impl BlockPropertyAccessor {
    pub fn new(chunk: &JavaChunk) -> Self {
        let origin = Pos3i::new(chunk.pos.x * 16, 0, chunk.pos.z * 16);
        let mut flags = 0;
        let mut sections = BTreeMap::new();
        for (&y, section) in &chunk.sections {
            let classes: Vec<BlockProperty> = section.palette.iter().map(|b| BlockProperty::of(b)).collect();
            let present = classes.iter().fold(0, |acc, p| acc | p.bit()) & !BlockProperty::None.bit();
            if present == 0 {
                continue;
            }
            flags |= present;
            let mut cells = Box::new([BlockProperty::None; CELLS]);
            for (cell, &p) in cells.iter_mut().zip(section.indices.iter()) {
                *cell = classes.get(p as usize).copied().unwrap_or_default();
            }
            sections.insert(y, cells);
        }
        Self { origin, flags, sections }
    }

    /// Chunk-level gate: whether any cell may hold this family.
    pub fn has(&self, property: BlockProperty) -> bool {
        self.flags & property.bit() != 0
    }

    pub fn has_any(&self, properties: &[BlockProperty]) -> bool {
        properties.iter().any(|&p| self.has(p))
    }

    /// Classification of the cell at world coordinates.
    pub fn property(&self, x: i32, y: i32, z: i32) -> BlockProperty {
        let lx = x - self.origin.x;
        let lz = z - self.origin.z;
        if !(0..16).contains(&lx) || !(0..16).contains(&lz) {
            return BlockProperty::None;
        }
        self.sections
            .get(&y.div_euclid(16))
            .map_or(BlockProperty::None, |cells| {
                cells[JavaSection::index(lx as usize, y.rem_euclid(16) as usize, lz as usize)]
            })
    }

    /// World positions of every cell classified as `property`, in section
    /// then YZX order.
    pub fn positions(&self, property: BlockProperty) -> Vec<Pos3i> {
        if !self.has(property) {
            return Vec::new();
        }
        let mut out = Vec::new();
        for (&sy, cells) in &self.sections {
            for (i, &p) in cells.iter().enumerate() {
                if p == property {
                    let (x, z, y) = (i % 16, (i / 16) % 16, i / 256);
                    out.push(Pos3i::new(self.origin.x + x as i32, sy * 16 + y as i32, self.origin.z + z as i32));
                }
            }
        }
        out
    }
}
