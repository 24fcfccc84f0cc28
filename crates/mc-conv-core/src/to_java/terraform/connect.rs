//! Fence, wall and pane connections.

use mc_conv_world::{Facing4, JavaChunk, Pos3i};

use super::solid::is_full_solid;
use super::{current, set_properties, BlockAccessor};
use crate::block_map::{is_fence, is_fence_gate, is_pane, is_slab, is_stairs, is_wall};
use crate::to_java::block_property::{BlockProperty, BlockPropertyAccessor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    WoodenFence,
    NetherFence,
    Wall,
    Pane,
}

impl Kind {
    fn of(name: &str) -> Option<Self> {
        if name == "nether_brick_fence" {
            Some(Kind::NetherFence)
        } else if is_fence(name) {
            Some(Kind::WoodenFence)
        } else if is_wall(name) {
            Some(Kind::Wall)
        } else if is_pane(name) {
            Some(Kind::Pane)
        } else {
            None
        }
    }

    fn joins(self, other: Kind) -> bool {
        match (self, other) {
            (Kind::Wall, Kind::Pane) | (Kind::Pane, Kind::Wall) => true,
            (a, b) => a == b,
        }
    }
}

/// Whether a `kind` block connects toward `side` given its neighbour there.
fn connects(kind: Kind, src: &dyn BlockAccessor, pos: Pos3i, side: Facing4) -> bool {
    let Some(neighbour) = src.block(pos.horizontal(side)) else {
        return false;
    };
    let name = neighbour.local_name();
    if is_full_solid(name) {
        return true;
    }
    if let Some(other) = Kind::of(name) {
        return kind.joins(other);
    }
    if is_stairs(name) {
        // The back of a stair is a full face.
        return neighbour.property("facing").and_then(Facing4::from_name) == Some(side.opposite());
    }
    if is_slab(name) {
        return neighbour.property("type") == Some("double");
    }
    if is_fence_gate(name) && matches!(kind, Kind::WoodenFence | Kind::Wall) {
        return neighbour
            .property("facing")
            .and_then(Facing4::from_name)
            .is_some_and(|f| f.is_x_axis() != side.is_x_axis());
    }
    false
}

pub fn apply(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    if !acc.has_any(&[BlockProperty::Fence, BlockProperty::Wall, BlockProperty::GlassPane]) {
        return;
    }
    for property in [BlockProperty::Fence, BlockProperty::GlassPane, BlockProperty::Wall] {
        for pos in acc.positions(property) {
            let Some(block) = current(out, pos) else { continue };
            let Some(kind) = Kind::of(block.local_name()) else {
                continue;
            };
            let mut sides: Vec<(&str, &str)> = Vec::with_capacity(4);
            for side in Facing4::ALL {
                let joined = connects(kind, src, pos, side);
                let value = match (kind, joined) {
                    (Kind::Wall, false) => "none",
                    (Kind::Wall, true) if block.property(side.name()) == Some("tall") => "tall",
                    (Kind::Wall, true) => "low",
                    (_, j) => {
                        if j {
                            "true"
                        } else {
                            "false"
                        }
                    }
                };
                sides.push((side.name(), value));
            }
            set_properties(out, pos, &sides);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{at, Blocks};

    #[test]
    fn fence_joins_fences_solids_and_gates() {
        let mut w = Blocks::default();
        w.put(5, 1, 5, "oak_fence[east=false,north=false,south=false,west=false,waterlogged=false]");
        w.put(6, 1, 5, "spruce_fence[east=false,north=false,south=false,west=false,waterlogged=false]");
        w.put(4, 1, 5, "stone");
        w.put(5, 1, 4, "oak_fence_gate[facing=east,in_wall=false,open=false,powered=false]");
        w.put(5, 1, 6, "nether_brick_fence[east=false,north=false,south=false,west=false,waterlogged=false]");
        let out = w.terraform();
        let b = at(&out, 5, 1, 5);
        assert_eq!(b.property("east"), Some("true"));
        assert_eq!(b.property("west"), Some("true"));
        assert_eq!(b.property("north"), Some("true"));
        assert_eq!(b.property("south"), Some("false"));
    }

    #[test]
    fn gate_along_connection_axis_does_not_join() {
        let mut w = Blocks::default();
        w.put(5, 1, 5, "oak_fence[east=false,north=false,south=false,west=false,waterlogged=false]");
        w.put(5, 1, 4, "oak_fence_gate[facing=north,in_wall=false,open=false,powered=false]");
        let out = w.terraform();
        assert_eq!(at(&out, 5, 1, 5).property("north"), Some("false"));
    }

    #[test]
    fn stairs_join_only_by_their_back() {
        let mut w = Blocks::default();
        w.put(5, 1, 5, "glass_pane[east=false,north=false,south=false,west=false,waterlogged=false]");
        w.put(6, 1, 5, "oak_stairs[facing=west,half=bottom,shape=straight]");
        w.put(4, 1, 5, "oak_stairs[facing=west,half=bottom,shape=straight]");
        w.put(5, 1, 6, "oak_slab[type=bottom]");
        w.put(5, 1, 4, "oak_slab[type=double]");
        let out = w.terraform();
        let b = at(&out, 5, 1, 5);
        assert_eq!(b.property("east"), Some("true"));
        assert_eq!(b.property("west"), Some("false"));
        assert_eq!(b.property("south"), Some("false"));
        assert_eq!(b.property("north"), Some("true"));
    }

    #[test]
    fn walls_keep_tall_sides_and_join_panes() {
        let mut w = Blocks::default();
        w.put(5, 1, 5, "cobblestone_wall[east=tall,north=none,south=none,up=true,waterlogged=false,west=none]");
        w.put(6, 1, 5, "stone");
        w.put(4, 1, 5, "iron_bars[east=false,north=false,south=false,west=false,waterlogged=false]");
        let out = w.terraform();
        let b = at(&out, 5, 1, 5);
        assert_eq!(b.property("east"), Some("tall"));
        assert_eq!(b.property("west"), Some("low"));
        assert_eq!(b.property("north"), Some("none"));
        assert_eq!(at(&out, 4, 1, 5).property("east"), Some("true"));
    }
}
