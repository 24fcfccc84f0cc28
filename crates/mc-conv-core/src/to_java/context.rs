//! Per-unit accumulator for the Java conversion.
//!
//! Workers convert chunks into a private [`Context`] from [`Context::make`]
//! and the driver folds it into the world context with
//! [`Context::merge_into`]. Every map is keyed by a stable id or position
//! owned by exactly one chunk, so merging is a plain union and the result
//! does not depend on which worker finished first.

use std::collections::BTreeMap;

use mc_conv_nbt::NbtCompound;
use mc_conv_world::{Dimension, Pos2i, Pos2iSet, Pos3i};

/// A leashed entity waiting for its holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leash {
    pub dim: Dimension,
    /// Chunk whose entity file holds the leashed entity.
    pub chunk: Pos2i,
    /// Bedrock unique id of the holder: a knot or another entity.
    pub leasher: i64,
}

/// A vehicle waiting for its passengers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    pub dim: Dimension,
    pub chunk: Pos2i,
    /// Seat index to passenger unique id.
    pub passengers: BTreeMap<i32, i64>,
}

/// The vehicle stack the local player rides, detached from the world and
/// stored in the player record instead.
#[derive(Debug, Clone, PartialEq)]
pub struct RootVehicle {
    /// Java UUID of the entity the player sits on directly.
    pub attach: [i32; 4],
    /// Bottom of the stack with every other passenger nested inside.
    pub entity: NbtCompound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoiRecord {
    pub kind: &'static str,
    pub free_tickets: i32,
}

#[derive(Debug, Default)]
pub struct Context {
    pub leashes: BTreeMap<i64, Leash>,
    pub vehicles: BTreeMap<i64, Vehicle>,
    /// Passenger unique id to vehicle unique id.
    pub parents: BTreeMap<i64, i64>,
    /// Knot unique id to the fence it is tied to.
    pub leash_knots: BTreeMap<i64, Pos3i>,
    /// Every converted entity: unique id to the chunk holding it.
    pub entities: BTreeMap<i64, (Dimension, Pos2i)>,
    pub local_player: Option<i64>,
    pub root_vehicle: Option<RootVehicle>,
    pub poi: BTreeMap<Dimension, BTreeMap<Pos3i, PoiRecord>>,
    /// Chunks written to the intermediate store.
    pub written: BTreeMap<Dimension, Pos2iSet>,
    pub skipped_chunks: u64,
}

impl Context {
    /// Child accumulator for one unit of work. Only world-level facts
    /// needed during conversion are copied down.
    pub fn make(&self) -> Self {
        Self {
            local_player: self.local_player,
            ..Self::default()
        }
    }

    pub fn merge_into(self, parent: &mut Context) {
        parent.leashes.extend(self.leashes);
        parent.vehicles.extend(self.vehicles);
        parent.parents.extend(self.parents);
        parent.leash_knots.extend(self.leash_knots);
        parent.entities.extend(self.entities);
        for (dim, records) in self.poi {
            parent.poi.entry(dim).or_default().extend(records);
        }
        for (dim, chunks) in self.written {
            let set = parent.written.entry(dim).or_default();
            for chunk in chunks.iter() {
                set.insert(chunk);
            }
        }
        if parent.root_vehicle.is_none() {
            parent.root_vehicle = self.root_vehicle;
        }
        parent.skipped_chunks += self.skipped_chunks;
    }

    pub fn mark_written(&mut self, dim: Dimension, chunk: Pos2i) {
        self.written.entry(dim).or_default().insert(chunk);
    }

    pub fn written_count(&self) -> usize {
        self.written.values().map(Pos2iSet::len).sum()
    }
}
