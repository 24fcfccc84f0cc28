//! Java UUIDs to Bedrock numeric unique ids.
//!
//! Ids are a hash of the UUID, so the same entity gets the same id no
//! matter which worker converts it. A hash already taken by a different
//! UUID is rehashed until it is free.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use mc_conv_nbt::{CompoundExt, NbtCompound};
use mc_conv_world::{Dimension, Pos3i};

/// Marker in the first word of UUIDs synthesized for leash knots.
const KNOT_MARK: i32 = 0x4B4E_4F54;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

fn hash(uuid: [i32; 4]) -> i64 {
    let hi = (u64::from(uuid[0] as u32) << 32) | u64::from(uuid[1] as u32);
    let lo = (u64::from(uuid[2] as u32) << 32) | u64::from(uuid[3] as u32);
    splitmix64(hi ^ splitmix64(lo)) as i64
}

/// `-1` means "no entity" in Bedrock records.
fn usable(id: i64) -> bool {
    id != -1 && id != 0
}

#[derive(Default)]
struct Inner {
    by_uuid: HashMap<[i32; 4], i64>,
    taken: HashMap<i64, [i32; 4]>,
}

/// Shared by every worker of one conversion.
#[derive(Default)]
pub struct UniqueIdRegistry {
    inner: Mutex<Inner>,
}

impl UniqueIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unique id for `uuid`, assigning one on first use.
    pub fn id_for(&self, uuid: [i32; 4]) -> i64 {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&id) = inner.by_uuid.get(&uuid) {
            return id;
        }
        let mut id = hash(uuid);
        while !usable(id) || inner.taken.get(&id).is_some_and(|owner| *owner != uuid) {
            id = splitmix64(id as u64) as i64;
        }
        inner.by_uuid.insert(uuid, id);
        inner.taken.insert(id, uuid);
        id
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).by_uuid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// UUID of a Java entity: the 1.16+ int array or the older long pair.
pub fn entity_uuid(entity: &NbtCompound) -> Option<[i32; 4]> {
    if let Some(&[a, b, c, d]) = entity.get_int_array("UUID") {
        return Some([a, b, c, d]);
    }
    let most = entity.get_long("UUIDMost")?;
    let least = entity.get_long("UUIDLeast")?;
    Some([(most >> 32) as i32, most as i32, (least >> 32) as i32, least as i32])
}

/// Stand-in UUID for the knot tied to the fence at `pos`. Java keeps
/// knots as entities without a stable link to the leashed mob, so both
/// sides derive the knot id from the fence position.
pub fn knot_uuid(dim: Dimension, pos: Pos3i) -> [i32; 4] {
    [KNOT_MARK, pos.x, (dim.bedrock_id() << 16) | (pos.y & 0xFFFF), pos.z]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_uuid_same_id() {
        let ids = UniqueIdRegistry::new();
        let a = ids.id_for([1, 2, 3, 4]);
        let b = ids.id_for([5, 6, 7, 8]);
        assert_ne!(a, b);
        assert_eq!(ids.id_for([1, 2, 3, 4]), a);
        assert_eq!(ids.len(), 2);
        // Independent of registration order.
        let other = UniqueIdRegistry::new();
        assert_eq!(other.id_for([5, 6, 7, 8]), b);
    }

    #[test]
    fn collision_is_rehashed() {
        let ids = UniqueIdRegistry::new();
        let uuid = [9, 9, 9, 9];
        let clash = hash(uuid);
        {
            let mut inner = ids.inner.lock().unwrap();
            inner.taken.insert(clash, [0, 0, 0, 1]);
        }
        let id = ids.id_for(uuid);
        assert_ne!(id, clash);
        assert_eq!(id, splitmix64(clash as u64) as i64);
    }

    #[test]
    fn legacy_uuid_pair() {
        let mut e = NbtCompound::new();
        e.put("UUIDMost", 0x0000_0001_0000_0002i64);
        e.put("UUIDLeast", -1i64);
        assert_eq!(entity_uuid(&e), Some([1, 2, -1, -1]));
        e.insert("UUID".into(), mc_conv_nbt::NbtTag::IntArray(vec![4, 3, 2, 1]));
        assert_eq!(entity_uuid(&e), Some([4, 3, 2, 1]));
    }

    #[test]
    fn knots_differ_by_dimension() {
        let p = Pos3i::new(10, -20, 30);
        assert_ne!(knot_uuid(Dimension::Overworld, p), knot_uuid(Dimension::Nether, p));
    }
}
