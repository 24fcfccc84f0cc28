//! Structure bounds for hard-coded Bedrock spawns.
//!
//! Java keeps structure starts in the chunk where a structure begins.
//! Bedrock wants, in every chunk a structure touches, the boxes inside
//! that chunk tagged with a spawn type:
//! `[count:i32le]` then per box `[min xyz:i32le][max xyz:i32le][type:u8]`.

use std::collections::BTreeMap;

use bytes::BufMut;
use mc_conv_nbt::{CompoundExt, NbtCompound};
use mc_conv_world::{keys, Dimension, KvStore, Pos2i, Pos2iSet, Pos3i, Volume};

use crate::error::{Result, ResultExt};
use crate::here;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StructureKind {
    Fortress = 1,
    WitchHut = 2,
    Monument = 3,
    PillagerOutpost = 5,
}

impl StructureKind {
    pub fn from_java(id: &str) -> Option<Self> {
        match id.strip_prefix("minecraft:").unwrap_or(id) {
            "fortress" => Some(Self::Fortress),
            "swamp_hut" => Some(Self::WitchHut),
            "monument" => Some(Self::Monument),
            "pillager_outpost" => Some(Self::PillagerOutpost),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

/// Boxes per chunk and kind.
pub type StructureMap = BTreeMap<Pos2i, BTreeMap<StructureKind, Vec<Volume>>>;

fn bounding_box(c: &NbtCompound) -> Option<Volume> {
    match c.get_int_array("BB")? {
        &[x0, y0, z0, x1, y1, z1] => Some(Volume::new(Pos3i::new(x0, y0, z0), Pos3i::new(x1, y1, z1))),
        _ => None,
    }
}

/// Split the structure starts of one Java chunk into per-chunk boxes.
pub fn collect(starts: &NbtCompound, out: &mut StructureMap) {
    for (key, start) in starts {
        let Some(start) = start.as_compound() else { continue };
        let id = start.get_str("id").unwrap_or(key.as_str());
        if id == "INVALID" {
            continue;
        }
        let Some(kind) = StructureKind::from_java(id) else { continue };
        let mut boxes: Vec<Volume> = start
            .get_list("Children")
            .unwrap_or_default()
            .iter()
            .filter_map(|t| t.as_compound())
            .filter_map(bounding_box)
            .collect();
        if boxes.is_empty() {
            boxes.extend(bounding_box(start));
        }
        for b in boxes {
            for (chunk, piece) in b.split_by_chunk() {
                out.entry(chunk).or_default().entry(kind).or_default().push(piece);
            }
        }
    }
}

pub fn merge(from: StructureMap, into: &mut StructureMap) {
    for (chunk, kinds) in from {
        let target = into.entry(chunk).or_default();
        for (kind, mut boxes) in kinds {
            target.entry(kind).or_default().append(&mut boxes);
        }
    }
}

/// Encode one chunk's record, joining adjacent boxes of the same kind.
pub fn encode(kinds: &BTreeMap<StructureKind, Vec<Volume>>) -> Vec<u8> {
    let mut entries: Vec<(Volume, StructureKind)> = Vec::new();
    for (&kind, boxes) in kinds {
        let mut boxes = boxes.clone();
        Volume::connect(&mut boxes);
        entries.extend(boxes.into_iter().map(|b| (b, kind)));
    }
    let mut buf = Vec::with_capacity(4 + entries.len() * 25);
    buf.put_i32_le(entries.len() as i32);
    for (b, kind) in entries {
        for v in [b.start.x, b.start.y, b.start.z, b.end.x, b.end.y, b.end.z] {
            buf.put_i32_le(v);
        }
        buf.put_u8(kind.id());
    }
    buf
}

/// Write the records of every converted chunk; returns how many were
/// written. Boxes reaching into chunks that were not converted are dropped.
pub fn write_all(store: &dyn KvStore, dim: Dimension, map: &StructureMap, written: &Pos2iSet) -> Result<usize> {
    let mut count = 0;
    for (&chunk, kinds) in map {
        if !written.contains(chunk) {
            continue;
        }
        store
            .put(&keys::chunk_key(chunk, dim, keys::TAG_STRUCTURE_BOUNDS), &encode(kinds))
            .wrap_with(|| here!("structure bounds {chunk}"))?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mc_conv_nbt::NbtTag;

    fn piece(bb: [i32; 6]) -> NbtTag {
        let mut c = NbtCompound::new();
        c.insert("BB".into(), NbtTag::IntArray(bb.to_vec()));
        NbtTag::Compound(c)
    }

    fn starts() -> NbtCompound {
        let mut fortress = NbtCompound::new();
        fortress.put("id", "minecraft:fortress");
        fortress.put(
            "Children",
            NbtTag::List(vec![piece([0, 40, 0, 7, 50, 15]), piece([8, 40, 0, 20, 50, 15])]),
        );
        let mut village = NbtCompound::new();
        village.put("id", "minecraft:village_plains");
        village.put("Children", NbtTag::List(vec![piece([0, 60, 0, 5, 70, 5])]));
        let mut invalid = NbtCompound::new();
        invalid.put("id", "INVALID");
        let mut s = NbtCompound::new();
        s.put("minecraft:fortress", fortress);
        s.put("minecraft:village_plains", village);
        s.put("minecraft:monument", invalid);
        s
    }

    #[test]
    fn split_and_connect() {
        let mut map = StructureMap::new();
        collect(&starts(), &mut map);
        assert_eq!(map.len(), 2, "only the fortress, across two chunks");
        let first = &map[&Pos2i::new(0, 0)][&StructureKind::Fortress];
        assert_eq!(first.len(), 2);

        let data = encode(&map[&Pos2i::new(0, 0)]);
        assert_eq!(i32::from_le_bytes([data[0], data[1], data[2], data[3]]), 1, "joined into one box");
        assert_eq!(data.len(), 4 + 25);
        let end_x = i32::from_le_bytes([data[16], data[17], data[18], data[19]]);
        assert_eq!(end_x, 15);
        assert_eq!(data[28], 1);

        let second = &map[&Pos2i::new(1, 0)][&StructureKind::Fortress];
        assert_eq!(second, &vec![Volume::new(Pos3i::new(16, 40, 0), Pos3i::new(20, 50, 15))]);
    }

    #[test]
    fn merge_is_order_independent() {
        let mut a = StructureMap::new();
        collect(&starts(), &mut a);
        let mut b = StructureMap::new();
        let mut hut = NbtCompound::new();
        hut.put("id", "minecraft:swamp_hut");
        hut.insert("BB".into(), NbtTag::IntArray(vec![2, 64, 2, 8, 70, 8]));
        let mut s = NbtCompound::new();
        s.put("minecraft:swamp_hut", hut);
        collect(&s, &mut b);

        let mut left = StructureMap::new();
        merge(a.clone(), &mut left);
        merge(b.clone(), &mut left);
        let mut right = StructureMap::new();
        merge(b, &mut right);
        merge(a, &mut right);
        let encoded = |m: &StructureMap| m.values().map(encode).collect::<Vec<_>>();
        assert_eq!(encoded(&left), encoded(&right));
        assert_eq!(StructureKind::from_java("minecraft:swamp_hut"), Some(StructureKind::WitchHut));
    }

    #[test]
    fn written_filter() {
        let store = mc_conv_world::MemoryStore::new();
        let mut map = StructureMap::new();
        collect(&starts(), &mut map);
        let mut written = Pos2iSet::new();
        written.insert(Pos2i::new(1, 0));
        assert_eq!(write_all(&store, Dimension::Nether, &map, &written).unwrap(), 1);
        let key = keys::chunk_key(Pos2i::new(1, 0), Dimension::Nether, keys::TAG_STRUCTURE_BOUNDS);
        assert!(store.get(&key).unwrap().is_some());
    }
}
