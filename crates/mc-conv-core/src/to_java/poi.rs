//! Points of interest: villager beds, bells, job sites and the other
//! blocks Java tracks in the `poi/` regions.

use std::collections::BTreeMap;

use mc_conv_nbt::{CompoundExt, NbtCompound, NbtTag};
use mc_conv_world::java_chunk::JAVA_DATA_VERSION;
use mc_conv_world::{Block, Dimension, JavaChunk, Pos3i};

use super::context::{Context, PoiRecord};

fn job_site(name: &str) -> Option<&'static str> {
    Some(match name {
        "blast_furnace" => "armorer",
        "smoker" => "butcher",
        "cartography_table" => "cartographer",
        "brewing_stand" => "cleric",
        "composter" => "farmer",
        "barrel" => "fisherman",
        "fletching_table" => "fletcher",
        "cauldron" | "water_cauldron" | "lava_cauldron" | "powder_snow_cauldron" => "leatherworker",
        "lectern" => "librarian",
        "stonecutter" => "mason",
        "loom" => "shepherd",
        "smithing_table" => "toolsmith",
        "grindstone" => "weaponsmith",
        _ => return None,
    })
}

/// POI type and free tickets for a block, if it is one.
pub fn poi_of(block: &Block) -> Option<PoiRecord> {
    let name = block.local_name();
    let (kind, free_tickets) = match name {
        "bell" => ("meeting", 32),
        "nether_portal" => ("nether_portal", 0),
        "beehive" => ("beehive", 0),
        "bee_nest" => ("bee_nest", 0),
        "lodestone" => ("lodestone", 0),
        "lightning_rod" => ("lightning_rod", 0),
        _ if name.ends_with("_bed") => {
            if block.property("part") != Some("head") {
                return None;
            }
            ("home", 1)
        }
        _ => (job_site(name)?, 1),
    };
    Some(PoiRecord { kind, free_tickets })
}

/// Record every POI block of a converted chunk.
pub fn collect(chunk: &JavaChunk, dim: Dimension, ctx: &mut Context) {
    let base = (chunk.pos.x * 16, chunk.pos.z * 16);
    for (&sy, section) in &chunk.sections {
        let kinds: Vec<Option<PoiRecord>> = section.palette.iter().map(|b| poi_of(b)).collect();
        if kinds.iter().all(Option::is_none) {
            continue;
        }
        for (i, &p) in section.indices.iter().enumerate() {
            let Some(Some(record)) = kinds.get(p as usize) else {
                continue;
            };
            let (x, z, y) = (i % 16, (i / 16) % 16, i / 256);
            let pos = Pos3i::new(base.0 + x as i32, sy * 16 + y as i32, base.1 + z as i32);
            ctx.poi.entry(dim).or_default().insert(pos, record.clone());
        }
    }
}

/// `poi/` region record for one chunk column.
pub fn poi_chunk_nbt<'a>(records: impl Iterator<Item = (&'a Pos3i, &'a PoiRecord)>) -> NbtCompound {
    let mut sections: BTreeMap<i32, Vec<NbtTag>> = BTreeMap::new();
    for (pos, record) in records {
        let mut r = NbtCompound::new();
        r.insert("pos".into(), NbtTag::IntArray(pos.to_int_array()));
        r.put("type", format!("minecraft:{}", record.kind));
        r.put("free_tickets", record.free_tickets);
        sections.entry(pos.y.div_euclid(16)).or_default().push(NbtTag::Compound(r));
    }
    let mut out = NbtCompound::new();
    for (y, list) in sections {
        let mut section = NbtCompound::new();
        section.put("Valid", true);
        section.put("Records", NbtTag::List(list));
        out.put(&y.to_string(), section);
    }
    let mut root = NbtCompound::new();
    root.put("DataVersion", JAVA_DATA_VERSION);
    root.put("Sections", out);
    root
}
