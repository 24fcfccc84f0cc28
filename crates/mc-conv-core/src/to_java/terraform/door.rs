//! Door halves share state: the lower half owns facing and open, the upper
//! half owns the hinge.

use mc_conv_world::JavaChunk;

use super::{current, set_properties, BlockAccessor};
use crate::to_java::block_property::{BlockProperty, BlockPropertyAccessor};

pub fn apply(out: &mut JavaChunk, src: &dyn BlockAccessor, acc: &BlockPropertyAccessor) {
    if !acc.has(BlockProperty::Door) {
        return;
    }
    for pos in acc.positions(BlockProperty::Door) {
        let Some(block) = current(out, pos) else { continue };
        let (lower_pos, upper_pos) = match block.property("half") {
            Some("upper") => (pos.down(), pos),
            _ => (pos, pos.up()),
        };
        let (Some(lower), Some(upper)) = (src.block(lower_pos), src.block(upper_pos)) else {
            continue;
        };
        if lower.name != upper.name || lower.property("half") != Some("lower") || upper.property("half") != Some("upper") {
            continue;
        }
        let merged = [
            ("facing", lower.property("facing").unwrap_or("north")),
            ("open", lower.property("open").unwrap_or("false")),
            ("hinge", upper.property("hinge").unwrap_or("left")),
            ("powered", "false"),
        ];
        set_properties(out, pos, &merged);
    }
}
