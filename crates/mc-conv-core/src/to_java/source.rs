//! Source chunks as the windowed cache holds them: the Bedrock record
//! plus its blocks already translated to Java states.

use std::collections::HashMap;
use std::sync::Arc;

use mc_conv_world::{biome, BedrockChunk, Block, BlockState, BlockStorage, Dimension, JavaChunk, JavaSection, KvStore, Pos2i};

use crate::block_map::bedrock_to_java;
use crate::error::{Result, ResultExt};
use crate::here;

pub struct SourceChunk {
    pub bedrock: BedrockChunk,
    /// Translated blocks and biomes before any terraform pass.
    pub java: JavaChunk,
}

impl SourceChunk {
    pub fn load(pos: Pos2i, dim: Dimension, store: &dyn KvStore) -> Result<Option<Self>> {
        let bedrock = BedrockChunk::load(pos, dim, store).wrap_with(|| here!("loading chunk {pos} in {dim}"))?;
        Ok(bedrock.map(Self::from_bedrock))
    }

    pub fn from_bedrock(bedrock: BedrockChunk) -> Self {
        let mut java = JavaChunk::new(bedrock.pos, bedrock.dim);
        for (&y, sub) in &bedrock.sub_chunks {
            let Some(section) = java.sections.get_mut(&i32::from(y)) else {
                continue;
            };
            let Some(blocks) = sub.layers.first() else {
                continue;
            };
            translate_section(section, blocks, sub.layers.get(1));
        }
        translate_biomes(&mut java, &bedrock);
        Self { bedrock, java }
    }
}

fn is_water(state: &BlockState) -> bool {
    matches!(state.local_name(), "water" | "flowing_water")
}

/// Fill a Java section from the block layer and the optional liquid layer.
fn translate_section(
    section: &mut JavaSection,
    blocks: &BlockStorage,
    liquid: Option<&BlockStorage>,
) {
    let translated: Vec<Arc<Block>> = blocks.palette.iter().map(|s| Arc::new(bedrock_to_java(s))).collect();
    let air = Arc::new(Block::air());
    let water = Arc::new(Block::new("water").with("level", "0"));

    // (block palette index, waterlogged) -> Java palette index
    let mut remap: HashMap<(u16, bool), u16> = HashMap::new();
    section.palette.clear();

    for x in 0..16 {
        for z in 0..16 {
            for y in 0..16 {
                let bi = BlockStorage::index(x, y, z);
                let p = blocks.indices[bi];
                let wet = liquid.and_then(|l| l.get_at(bi)).is_some_and(is_water);
                let key = (p, wet);
                let java_index = match remap.get(&key) {
                    Some(&i) => i,
                    None => {
                        let base = translated.get(p as usize).unwrap_or(&air);
                        let block = if !wet {
                            Arc::clone(base)
                        } else if base.is_air() {
                            Arc::clone(&water)
                        } else if base.property("waterlogged").is_some() {
                            Arc::new(base.with_properties(&[("waterlogged", "true")]))
                        } else {
                            Arc::clone(base)
                        };
                        section.palette.push(block);
                        let i = (section.palette.len() - 1) as u16;
                        remap.insert(key, i);
                        i
                    }
                };
                section.indices[JavaSection::index(x, y, z)] = java_index;
            }
        }
    }
}

/// Sample the Bedrock 3D biomes at the corner of every 4×4×4 cell.
fn translate_biomes(java: &mut JavaChunk, bedrock: &BedrockChunk) {
    if bedrock.biomes.is_empty() {
        return;
    }
    let base = Pos2i::new(bedrock.pos.x * 16, bedrock.pos.z * 16);
    let fallback = bedrock.dim.default_biome();
    for section in java.sections.values_mut() {
        for cy in 0..4 {
            for cz in 0..4 {
                for cx in 0..4 {
                    let y = section.y * 16 + cy as i32 * 4;
                    let name = bedrock
                        .biome_at(base.x + cx as i32 * 4, y, base.z + cz as i32 * 4)
                        .and_then(biome::java_name_for_bedrock)
                        .unwrap_or_else(|| fallback.to_string());
                    section.set_biome_cell(cx, cy, cz, &name);
                }
            }
        }
    }
}
