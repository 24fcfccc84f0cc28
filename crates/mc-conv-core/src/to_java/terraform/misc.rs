//! Single-block fixes that read one or two neighbours or the source block
//! entity: beacon level, campfire smoke, tripwire, chest pairing, bed colour.

use mc_conv_nbt::{CompoundExt, NbtCompound};
use mc_conv_world::{Facing4, JavaChunk, Pos2i, Pos3i};

use super::{current, replace, set_properties, BlockAccessor};
use crate::to_java::block_property::{BlockProperty, BlockPropertyAccessor};

pub const DYE_COLORS: [&str; 16] = [
    "white",
    "orange",
    "magenta",
    "light_blue",
    "yellow",
    "lime",
    "pink",
    "gray",
    "light_gray",
    "cyan",
    "purple",
    "blue",
    "brown",
    "green",
    "red",
    "black",
];

const MAX_BEACON_LEVEL: i32 = 4;

fn is_beacon_base(name: &str) -> bool {
    matches!(name, "iron_block" | "gold_block" | "diamond_block" | "emerald_block" | "netherite_block")
}

/// Number of complete pyramid layers under the beacon.
pub fn beacon_levels(src: &dyn BlockAccessor, pos: Pos3i) -> i32 {
    for level in 1..=MAX_BEACON_LEVEL {
        let y = pos.y - level;
        for x in pos.x - level..=pos.x + level {
            for z in pos.z - level..=pos.z + level {
                if !is_beacon_base(src.name(Pos3i::new(x, y, z))) {
                    return level - 1;
                }
            }
        }
    }
    MAX_BEACON_LEVEL
}

fn beacons(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for pos in acc.positions(BlockProperty::Beacon) {
        let levels = beacon_levels(src, pos);
        let te = out.block_entities.entry(pos).or_insert_with(|| {
            let mut te = NbtCompound::new();
            te.put("id", "minecraft:beacon");
            te.put("x", pos.x);
            te.put("y", pos.y);
            te.put("z", pos.z);
            te
        });
        te.put("Levels", levels);
    }
}

fn campfires(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for pos in acc.positions(BlockProperty::Campfire) {
        let signal = src.name(pos.down()) == "hay_block";
        set_properties(out, pos, &[("signal_fire", if signal { "true" } else { "false" })]);
    }
}

fn tripwires(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for pos in acc.positions(BlockProperty::Tripwire) {
        let sides: Vec<(&str, &str)> = Facing4::ALL
            .into_iter()
            .map(|side| {
                let joined = src.block(pos.horizontal(side)).is_some_and(|n| match n.local_name() {
                    "tripwire" => true,
                    "tripwire_hook" => n.property("facing").and_then(Facing4::from_name) == Some(side.opposite()),
                    _ => false,
                });
                (side.name(), if joined { "true" } else { "false" })
            })
            .collect();
        set_properties(out, pos, &sides);
    }
}

/// Bedrock pairs chests through `pairx`/`pairz` on the block entity.
fn chests(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for pos in acc.positions(BlockProperty::Chest) {
        let Some(block) = current(out, pos) else { continue };
        let Some(facing) = block.property("facing").and_then(Facing4::from_name) else {
            continue;
        };
        let partner = src.source_block_entity(pos).and_then(|te| {
            let offset = Pos2i::new(te.get_int("pairx")? - pos.x, te.get_int("pairz")? - pos.z);
            Facing4::from_vec(offset)
        });
        let kind = match partner {
            Some(dir) if dir == facing.clockwise() => "left",
            Some(dir) if dir == facing.counter_clockwise() => "right",
            _ => "single",
        };
        set_properties(out, pos, &[("type", kind)]);
    }
}

fn beds(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    for pos in acc.positions(BlockProperty::Bed) {
        let Some(block) = current(out, pos) else { continue };
        let Some(color) = src
            .source_block_entity(pos)
            .and_then(|te| te.get_integer("color"))
            .and_then(|c| DYE_COLORS.get(usize::try_from(c).ok()?))
        else {
            continue;
        };
        let name = format!("{color}_bed");
        if block.local_name() != name {
            replace(out, pos, block.renamed(&name));
        }
    }
}

pub fn apply(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    beacons(out, src, acc);
    campfires(out, src, acc);
    tripwires(out, src, acc);
    chests(out, src, acc);
    beds(out, src, acc);
}

#[cfg(test)]
mod tests {
    use mc_conv_nbt::{CompoundExt, NbtCompound};
    use mc_conv_world::Pos3i;

    use super::super::testing::{at, Blocks};
    use super::*;

    #[test]
    fn beacon_counts_full_layers() {
        let mut w = Blocks::default();
        w.put(8, 70, 8, "beacon");
        for (level, block) in [(1, "iron_block"), (2, "emerald_block")] {
            for x in 8 - level..=8 + level {
                for z in 8 - level..=8 + level {
                    w.put(x, 70 - level, z, block);
                }
            }
        }
        w.put(5, 67, 5, "diamond_block");
        assert_eq!(beacon_levels(&w, Pos3i::new(8, 70, 8)), 2);
        let out = w.terraform();
        assert_eq!(out.block_entities[&Pos3i::new(8, 70, 8)].get_int("Levels"), Some(2));
    }

    #[test]
    fn campfire_over_hay_signals() {
        let mut w = Blocks::default();
        w.put(1, 64, 1, "campfire[facing=north,lit=true,signal_fire=false,waterlogged=false]");
        w.put(1, 63, 1, "hay_block[axis=y]");
        assert_eq!(at(&w.terraform(), 1, 64, 1).property("signal_fire"), Some("true"));
    }

    #[test]
    fn tripwire_attaches_to_facing_hooks() {
        let mut w = Blocks::default();
        w.put(3, 64, 3, "tripwire[attached=false,disarmed=false,east=false,north=false,powered=false,south=false,west=false]");
        w.put(4, 64, 3, "tripwire[attached=false,disarmed=false,east=false,north=false,powered=false,south=false,west=false]");
        w.put(2, 64, 3, "tripwire_hook[attached=true,facing=east,powered=false]");
        w.put(3, 64, 2, "tripwire_hook[attached=true,facing=east,powered=false]");
        let b = at(&w.terraform(), 3, 64, 3);
        assert_eq!(b.property("east"), Some("true"));
        assert_eq!(b.property("west"), Some("true"));
        assert_eq!(b.property("north"), Some("false"));
    }

    #[test]
    fn chest_pair_sides() {
        let mut w = Blocks::default();
        w.put(3, 64, 3, "chest[facing=north,type=single,waterlogged=false]");
        w.put(4, 64, 3, "chest[facing=north,type=single,waterlogged=false]");
        let pair = |x: i32| {
            let mut te = NbtCompound::new();
            te.put("id", "Chest");
            te.put("pairx", x);
            te.put("pairz", 3);
            te
        };
        w.entities.insert(Pos3i::new(3, 64, 3), pair(4));
        w.entities.insert(Pos3i::new(4, 64, 3), pair(3));
        let out = w.terraform();
        assert_eq!(at(&out, 3, 64, 3).property("type"), Some("left"));
        assert_eq!(at(&out, 4, 64, 3).property("type"), Some("right"));
    }

    #[test]
    fn bed_takes_color_from_block_entity() {
        let mut w = Blocks::default();
        w.put(1, 64, 1, "red_bed[facing=south,occupied=false,part=head]");
        let mut te = NbtCompound::new();
        te.put("id", "Bed");
        te.put("color", 11i8);
        w.entities.insert(Pos3i::new(1, 64, 1), te);
        let b = at(&w.terraform(), 1, 64, 1);
        assert_eq!(b.name, "minecraft:blue_bed");
        assert_eq!(b.property("part"), Some("head"));
    }
}
