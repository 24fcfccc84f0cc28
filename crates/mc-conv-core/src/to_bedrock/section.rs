//! Java sections to Bedrock sub-chunks.
//!
//! Layer 0 holds the translated blocks. Waterlogged cells get a second
//! layer that is air everywhere except for still water in those cells.

use std::collections::BTreeMap;

use mc_conv_world::bedrock_chunk::BiomeStorage;
use mc_conv_world::{biome, BlockState, BlockStorage, Dimension, JavaChunk, JavaSection, Pos3i, SubChunk};

use crate::block_map::{is_always_waterlogged, java_to_bedrock};

/// Block states that replace the translated block at a position, for
/// blocks whose Bedrock state depends on an entity or block entity.
pub type Overrides = BTreeMap<Pos3i, BlockState>;

pub fn still_water() -> BlockState {
    BlockState::new("water").with("liquid_depth", 0)
}

/// Convert one section. `origin` is the block position of the section's
/// lowest corner.
pub fn convert_section(section: &JavaSection, origin: Pos3i, overrides: &Overrides) -> SubChunk {
    // Translate each palette entry once.
    let translated: Vec<(BlockState, bool)> = section
        .palette
        .iter()
        .map(|b| (java_to_bedrock(b), b.is_waterlogged() || is_always_waterlogged(b.local_name())))
        .collect();

    let mut blocks = BlockStorage::filled(BlockState::air());
    blocks.palette.clear();
    for (state, _) in &translated {
        blocks.push_palette(state.clone());
    }
    if blocks.palette.is_empty() {
        blocks.push_palette(BlockState::air());
    }
    let mut liquid: Option<BlockStorage> = None;

    for y in 0..16 {
        for z in 0..16 {
            for x in 0..16 {
                let p = section.indices[JavaSection::index(x, y, z)] as usize;
                let cell = BlockStorage::index(x, y, z);
                // Out-of-range indices read as the first entry.
                let p = if p < translated.len() { p } else { 0 };
                blocks.indices[cell] = p as u16;
                if translated.get(p).is_some_and(|(_, wet)| *wet) {
                    liquid
                        .get_or_insert_with(|| BlockStorage::filled(BlockState::air()))
                        .set_at(cell, still_water());
                }
            }
        }
    }

    for (pos, state) in overrides.range(origin..=origin.offset(15, 15, 15)) {
        let local = *pos - origin;
        if !(0..16).contains(&local.x) || !(0..16).contains(&local.y) || !(0..16).contains(&local.z) {
            continue;
        }
        blocks.set(local.x as usize, local.y as usize, local.z as usize, state.clone());
    }

    let mut sub = SubChunk {
        y: section.y as i8,
        layers: vec![blocks],
    };
    if let Some(l) = liquid {
        sub.layers.push(l);
    }
    sub.normalize();
    sub
}

/// Biome section for Bedrock section `sy`, falling back to the
/// dimension's default outside the Java sections.
pub fn biome_section(chunk: &JavaChunk, dim: Dimension, sy: i32) -> BiomeStorage {
    let fallback = biome::bedrock_id_for_java(dim.default_biome()).unwrap_or(1);
    let Some(section) = chunk.sections.get(&sy) else {
        return BiomeStorage::filled(fallback);
    };
    let mut storage = BiomeStorage::filled(fallback);
    let mut ids: BTreeMap<&str, i32> = BTreeMap::new();
    for y in 0..16 {
        for z in 0..16 {
            for x in 0..16 {
                let Some(name) = section.biome(x, y, z) else { continue };
                let id = *ids
                    .entry(name)
                    .or_insert_with(|| biome::bedrock_id_for_java(name).unwrap_or(fallback));
                storage.set(x, y, z, id);
            }
        }
    }
    storage.resolve_duplication();
    storage
}

/// Height above the dimension floor of the first non-air block in each
/// column (`z * 16 + x`), 0 for empty columns.
pub fn heightmap(subs: &BTreeMap<i8, SubChunk>, dim: Dimension) -> [i16; 256] {
    let mut heights = [0i16; 256];
    let floor = dim.min_block_y();
    for z in 0..16 {
        for x in 0..16 {
            let top = subs.iter().rev().find_map(|(&sy, sub)| {
                let layer = sub.layers.first()?;
                (0..16)
                    .rev()
                    .find(|&y| layer.get(x, y, z).is_some_and(|b| !b.is_air()))
                    .map(|y| i32::from(sy) * 16 + y as i32)
            });
            if let Some(top) = top {
                heights[z * 16 + x] = (top - floor + 1) as i16;
            }
        }
    }
    heights
}

/// `true` when the section holds nothing worth storing.
pub fn is_empty(sub: &SubChunk) -> bool {
    sub.layers.len() == 1 && sub.layers[0].is_all_air()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_conv_world::sub_chunk::{decode_sub_chunk, encode_sub_chunk};
    use mc_conv_world::{Block, Pos2i};
    use std::sync::Arc;

    fn j(s: &str) -> Arc<Block> {
        Arc::new(Block::parse(s).unwrap())
    }

    fn section() -> JavaSection {
        let mut s = JavaSection::new(0, j("stone"), "minecraft:plains");
        s.set_block(0, 0, 0, j("air"));
        s.set_block(1, 2, 3, j("oak_fence[east=false,north=false,south=false,waterlogged=true,west=false]"));
        s.set_block(4, 4, 4, j("seagrass"));
        s
    }

    #[test]
    fn layers_and_roundtrip() {
        let sub = convert_section(&section(), Pos3i::new(0, 0, 0), &Overrides::new());
        assert_eq!(sub.layers.len(), 2);
        assert!(sub.layers[0].palette[0].is_air(), "air at index 0");
        assert!(sub.layers[1].palette[0].is_air());
        assert_eq!(sub.block(5, 5, 5).unwrap().name, "minecraft:stone");
        assert_eq!(sub.block(1, 2, 3).unwrap().name, "minecraft:oak_fence");
        assert_eq!(sub.liquid(1, 2, 3), Some(&still_water()));
        assert_eq!(sub.liquid(4, 4, 4), Some(&still_water()));
        assert!(sub.liquid(5, 5, 5).unwrap().is_air());

        let data = encode_sub_chunk(&sub);
        assert_eq!(data[1], 2, "layer count");
        let back = decode_sub_chunk(&data, 0).unwrap();
        for (x, y, z) in [(0, 0, 0), (1, 2, 3), (4, 4, 4), (15, 15, 15)] {
            assert_eq!(back.block(x, y, z), sub.block(x, y, z));
            assert_eq!(back.liquid(x, y, z), sub.liquid(x, y, z));
        }
    }

    #[test]
    fn dry_section_has_one_layer_and_minimal_bits() {
        let mut s = JavaSection::new(2, j("stone"), "minecraft:plains");
        s.set_block(3, 3, 3, j("dirt"));
        s.set_block(3, 4, 3, j("air"));
        let sub = convert_section(&s, Pos3i::new(0, 32, 0), &Overrides::new());
        assert_eq!(sub.layers.len(), 1);
        assert_eq!(sub.y, 2);
        assert_eq!(sub.layers[0].palette.len(), 3);
        let data = encode_sub_chunk(&sub);
        // 3 entries fit in 2 bits per block.
        assert_eq!(data[3] >> 1, 2);
    }

    #[test]
    fn deep_stone_section_still_starts_with_air() {
        let s = JavaSection::new(-3, j("stone"), "minecraft:plains");
        let sub = convert_section(&s, Pos3i::new(0, -48, 0), &Overrides::new());
        assert_eq!(sub.layers.len(), 1);
        assert!(!is_empty(&sub));
        let back = decode_sub_chunk(&encode_sub_chunk(&sub), 0).unwrap();
        assert!(back.layers[0].palette[0].is_air());
        assert_eq!(back.block(8, 8, 8).unwrap().name, "minecraft:stone");
    }

    #[test]
    fn kelp_forest_liquid_layer_is_air_then_water() {
        let s = JavaSection::new(3, j("kelp_plant"), "minecraft:ocean");
        let sub = convert_section(&s, Pos3i::new(0, 48, 0), &Overrides::new());
        assert_eq!(sub.layers.len(), 2);
        assert_eq!(sub.layers[1].palette, vec![BlockState::air(), still_water()]);
        assert!(sub.layers[1].indices.iter().all(|&i| i == 1));
        let back = decode_sub_chunk(&encode_sub_chunk(&sub), 0).unwrap();
        assert_eq!(back.liquid(0, 15, 0), Some(&still_water()));
    }

    #[test]
    fn overrides_replace_cells_in_range() {
        let s = JavaSection::new(0, j("air"), "minecraft:plains");
        let mut overrides = Overrides::new();
        let frame = BlockState::new("frame").with("facing_direction", 2);
        overrides.insert(Pos3i::new(17, 3, 18), frame.clone());
        overrides.insert(Pos3i::new(40, 3, 18), BlockState::new("stone"));
        let sub = convert_section(&s, Pos3i::new(16, 0, 16), &overrides);
        assert_eq!(sub.block(1, 3, 2), Some(&frame));
        assert_eq!(sub.layers[0].palette.len(), 2);
        assert!(sub.layers[0].palette[0].is_air());
    }

    #[test]
    fn biomes_and_heights() {
        let mut chunk = JavaChunk::new(Pos2i::new(0, 0), Dimension::Overworld);
        if let Some(s) = chunk.sections.get_mut(&0) {
            s.set_biome_cell(0, 0, 0, "minecraft:desert");
        }
        chunk.set_block_at(2, 5, 1, j("stone"));
        let b = biome_section(&chunk, Dimension::Overworld, 0);
        assert_eq!(b.get(0, 0, 0), Some(&2));
        assert_eq!(b.get(8, 8, 8), Some(&1));
        assert_eq!(biome_section(&chunk, Dimension::Overworld, 40).get(0, 0, 0), Some(&1));

        let mut subs = BTreeMap::new();
        subs.insert(0, convert_section(&chunk.sections[&0], Pos3i::new(0, 0, 0), &Overrides::new()));
        let h = heightmap(&subs, Dimension::Overworld);
        assert_eq!(h[16 + 2], 5 + 64 + 1);
        assert_eq!(h[0], 0);
    }
}
