//! Entity cross-references that span chunks: leashes, vehicles and the
//! stack the local player rides.
//!
//! Runs single-threaded after every chunk is in the intermediate store.
//! Each step drains what it resolves from the context, so running the
//! resolver again on the same context changes nothing.

use std::collections::BTreeMap;

use mc_conv_nbt::{CompoundExt, NbtCompound, NbtTag};
use mc_conv_world::{Dimension, Pos2i};
use tracing::{debug, info, warn};

use super::chunk_store::ChunkStore;
use super::context::{Context, RootVehicle, Vehicle};
use super::entity::{has_uuid, java_uuid, uuid_tag};
use crate::error::{ChainExt, Result};
use crate::here;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolveStats {
    pub leashes: usize,
    pub dropped_leashes: usize,
    pub passengers: usize,
    pub dropped_passengers: usize,
    pub root_vehicle: bool,
}

pub fn resolve(ctx: &mut Context, store: &ChunkStore) -> Result<ResolveStats> {
    let mut stats = ResolveStats::default();
    resolve_leashes(ctx, store, &mut stats).chain(here!("resolving leashes"))?;
    let rider = resolve_vehicles(ctx, store, &mut stats).chain(here!("resolving vehicles"))?;
    if let Some(vehicle) = rider {
        stats.root_vehicle = drain_root_vehicle(ctx, store, vehicle).chain(here!("detaching root vehicle"))?;
    }
    ctx.parents.clear();
    info!(
        leashes = stats.leashes,
        dropped_leashes = stats.dropped_leashes,
        passengers = stats.passengers,
        dropped_passengers = stats.dropped_passengers,
        root_vehicle = stats.root_vehicle,
        "resolved entity links"
    );
    Ok(stats)
}

/// Remove and return the entity with `uid` from its chunk file.
fn take_entity(ctx: &Context, store: &ChunkStore, uid: i64) -> Result<Option<NbtCompound>> {
    let Some(&(dim, chunk)) = ctx.entities.get(&uid) else {
        return Ok(None);
    };
    let uuid = java_uuid(uid);
    store.update_entities(dim, chunk, |list| {
        let i = list.iter().position(|e| has_uuid(e, uuid))?;
        Some(list.remove(i))
    })
}

// ─── Leashes ────────────────────────────────────────────────────────────────

fn resolve_leashes(ctx: &mut Context, store: &ChunkStore, stats: &mut ResolveStats) -> Result<()> {
    let mut by_chunk: BTreeMap<(Dimension, Pos2i), Vec<(i64, NbtTag)>> = BTreeMap::new();
    for (uid, leash) in std::mem::take(&mut ctx.leashes) {
        let target = if let Some(knot) = ctx.leash_knots.get(&leash.leasher) {
            NbtTag::IntArray(knot.to_int_array())
        } else if ctx.entities.contains_key(&leash.leasher) {
            let mut holder = NbtCompound::new();
            holder.put("UUID", uuid_tag(java_uuid(leash.leasher)));
            NbtTag::Compound(holder)
        } else {
            debug!(uid, leasher = leash.leasher, "leash holder not found");
            stats.dropped_leashes += 1;
            continue;
        };
        by_chunk.entry((leash.dim, leash.chunk)).or_default().push((uid, target));
    }

    for ((dim, chunk), leashes) in by_chunk {
        let attached = store.update_entities(dim, chunk, |list| {
            let mut attached = 0;
            for (uid, target) in leashes {
                let uuid = java_uuid(uid);
                if let Some(entity) = list.iter_mut().find(|e| has_uuid(e, uuid)) {
                    entity.insert("leash".into(), target);
                    attached += 1;
                }
            }
            attached
        })?;
        stats.leashes += attached;
    }
    Ok(())
}

// ─── Vehicles ───────────────────────────────────────────────────────────────

/// Nest every passenger into its vehicle, innermost vehicles first so a
/// vehicle that is itself a passenger carries its riders along.
///
/// Returns the vehicle the local player sits on, if any.
fn resolve_vehicles(ctx: &mut Context, store: &ChunkStore, stats: &mut ResolveStats) -> Result<Option<i64>> {
    let mut pending = std::mem::take(&mut ctx.vehicles);
    let mut rider = None;
    while !pending.is_empty() {
        let ready: Vec<i64> = pending
            .iter()
            .filter(|(_, v)| v.passengers.values().all(|p| !pending.contains_key(p)))
            .map(|(&uid, _)| uid)
            .collect();
        if ready.is_empty() {
            warn!(vehicles = pending.len(), "dropping cyclic vehicle links");
            stats.dropped_passengers += pending.values().map(|v| v.passengers.len()).sum::<usize>();
            break;
        }
        for uid in ready {
            let Some(vehicle) = pending.remove(&uid) else {
                continue;
            };
            if attach_passengers(ctx, store, uid, &vehicle, stats)? {
                rider = Some(uid);
            }
        }
    }
    Ok(rider)
}

/// Returns whether the local player is one of the passengers.
///
/// Passengers of a vehicle missing from its chunk stay where they are.
fn attach_passengers(
    ctx: &Context,
    store: &ChunkStore,
    uid: i64,
    vehicle: &Vehicle,
    stats: &mut ResolveStats,
) -> Result<bool> {
    let uuid = java_uuid(uid);
    let carries_player = ctx.local_player.is_some_and(|p| vehicle.passengers.values().any(|&v| v == p));
    let vehicle_present = store
        .entities(vehicle.dim, vehicle.chunk)?
        .iter()
        .any(|e| has_uuid(e, uuid));
    if !vehicle_present {
        let left = vehicle.passengers.values().filter(|&&p| Some(p) != ctx.local_player).count();
        debug!(vehicle = uid, passengers = left, "vehicle entity missing, passengers left unmounted");
        stats.dropped_passengers += left;
        return Ok(carries_player);
    }

    let mut riders = Vec::new();
    for &passenger in vehicle.passengers.values() {
        if Some(passenger) == ctx.local_player {
            continue;
        }
        match take_entity(ctx, store, passenger)? {
            Some(entity) => riders.push(NbtTag::Compound(entity)),
            None => {
                debug!(vehicle = uid, passenger, "passenger not found");
                stats.dropped_passengers += 1;
            }
        }
    }
    if riders.is_empty() {
        return Ok(carries_player);
    }

    let count = riders.len();
    let placed = store.update_entities(vehicle.dim, vehicle.chunk, |list| {
        let Some(entity) = list.iter_mut().find(|e| has_uuid(e, uuid)) else {
            return false;
        };
        match entity.get_mut("Passengers").and_then(NbtTag::as_list_mut) {
            Some(existing) => existing.extend(riders),
            None => entity.put("Passengers", NbtTag::List(riders)),
        }
        true
    })?;
    if placed {
        stats.passengers += count;
    } else {
        debug!(vehicle = uid, "vehicle entity missing, passengers dropped");
        stats.dropped_passengers += count;
    }
    Ok(carries_player)
}

// ─── Root vehicle ───────────────────────────────────────────────────────────

/// Detach the bottom of the stack the local player rides and keep it for
/// the player record. Returns whether a stack was detached.
fn drain_root_vehicle(ctx: &mut Context, store: &ChunkStore, vehicle: i64) -> Result<bool> {
    if ctx.root_vehicle.is_some() {
        return Ok(false);
    }
    let mut root = vehicle;
    let mut steps = 0;
    while let Some(&parent) = ctx.parents.get(&root) {
        root = parent;
        steps += 1;
        if steps > ctx.parents.len() {
            warn!(vehicle, "vehicle chain loops; player stays unmounted");
            return Ok(false);
        }
    }
    let Some(entity) = take_entity(ctx, store, root)? else {
        debug!(root, "root vehicle entity missing");
        return Ok(false);
    };
    ctx.root_vehicle = Some(RootVehicle {
        attach: java_uuid(vehicle),
        entity,
    });
    Ok(true)
}

#[cfg(test)]
mod tests {
    use mc_conv_world::Pos3i;

    use super::*;
    use crate::to_java::context::Leash;

    fn entity(uid: i64, id: &str) -> NbtCompound {
        let mut e = NbtCompound::new();
        e.put("id", format!("minecraft:{id}"));
        e.put("UUID", uuid_tag(java_uuid(uid)));
        e
    }

    fn place(ctx: &mut Context, store: &ChunkStore, chunk: Pos2i, list: Vec<NbtCompound>, uids: &[i64]) {
        for &uid in uids {
            ctx.entities.insert(uid, (Dimension::Overworld, chunk));
        }
        store.put_entities(Dimension::Overworld, chunk, list).unwrap();
    }

    fn vehicle(chunk: Pos2i, passengers: &[i64]) -> Vehicle {
        Vehicle {
            dim: Dimension::Overworld,
            chunk,
            passengers: passengers.iter().enumerate().map(|(i, &p)| (i as i32, p)).collect(),
        }
    }

    #[test]
    fn cross_chunk_passenger_moves_into_vehicle() {
        let store = ChunkStore::create(&std::env::temp_dir()).unwrap();
        let mut ctx = Context::default();
        let (c1, c2) = (Pos2i::new(0, 0), Pos2i::new(1, 0));
        place(&mut ctx, &store, c1, vec![entity(1, "minecart")], &[1]);
        place(&mut ctx, &store, c2, vec![entity(2, "pig"), entity(3, "cow")], &[2, 3]);
        ctx.vehicles.insert(1, vehicle(c1, &[2]));
        ctx.parents.insert(2, 1);

        let stats = resolve(&mut ctx, &store).unwrap();
        assert_eq!(stats.passengers, 1);

        let first = store.entities(Dimension::Overworld, c1).unwrap();
        let riders = first[0].get_list("Passengers").unwrap();
        assert_eq!(riders.len(), 1);
        assert_eq!(riders[0].as_compound(), Some(&entity(2, "pig")));
        let second = store.entities(Dimension::Overworld, c2).unwrap();
        assert_eq!(second, vec![entity(3, "cow")]);
    }

    #[test]
    fn riders_of_a_missing_vehicle_stay_in_their_chunk() {
        let store = ChunkStore::create(&std::env::temp_dir()).unwrap();
        let mut ctx = Context::default();
        let (c1, c2) = (Pos2i::new(0, 0), Pos2i::new(1, 0));
        place(&mut ctx, &store, c1, vec![entity(5, "cow")], &[]);
        place(&mut ctx, &store, c2, vec![entity(2, "pig"), entity(3, "zombie")], &[2, 3]);
        // Vehicle 1 was recorded in c1 but its entity never made it there.
        ctx.entities.insert(1, (Dimension::Overworld, c1));
        ctx.vehicles.insert(1, vehicle(c1, &[2, 3]));
        ctx.parents.extend([(2, 1), (3, 1)]);

        let stats = resolve(&mut ctx, &store).unwrap();
        assert_eq!((stats.passengers, stats.dropped_passengers), (0, 2));
        assert_eq!(store.entities(Dimension::Overworld, c2).unwrap(), vec![entity(2, "pig"), entity(3, "zombie")]);
        assert_eq!(store.entities(Dimension::Overworld, c1).unwrap(), vec![entity(5, "cow")]);
    }

    #[test]
    fn nested_stack_resolves_innermost_first() {
        let store = ChunkStore::create(&std::env::temp_dir()).unwrap();
        let mut ctx = Context::default();
        let c = Pos2i::new(0, 0);
        place(&mut ctx, &store, c, vec![entity(1, "boat"), entity(2, "pig"), entity(3, "chicken")], &[1, 2, 3]);
        ctx.vehicles.insert(1, vehicle(c, &[2]));
        ctx.vehicles.insert(2, vehicle(c, &[3]));
        ctx.parents.extend([(2, 1), (3, 2)]);

        resolve(&mut ctx, &store).unwrap();
        let list = store.entities(Dimension::Overworld, c).unwrap();
        assert_eq!(list.len(), 1);
        let pig = list[0].get_list("Passengers").unwrap()[0].as_compound().unwrap();
        assert!(has_uuid(pig, java_uuid(2)));
        let chicken = pig.get_list("Passengers").unwrap()[0].as_compound().unwrap();
        assert!(has_uuid(chicken, java_uuid(3)));
    }

    #[test]
    fn leashes_resolve_once() {
        let store = ChunkStore::create(&std::env::temp_dir()).unwrap();
        let mut ctx = Context::default();
        let c = Pos2i::new(0, 0);
        place(&mut ctx, &store, c, vec![entity(1, "horse"), entity(2, "wolf"), entity(9, "leash_knot")], &[1, 2, 9]);
        ctx.leash_knots.insert(9, Pos3i::new(4, 70, 5));
        let leash = |leasher| Leash {
            dim: Dimension::Overworld,
            chunk: c,
            leasher,
        };
        ctx.leashes.insert(1, leash(9));
        ctx.leashes.insert(2, leash(1));
        ctx.leashes.insert(3, leash(404));

        let stats = resolve(&mut ctx, &store).unwrap();
        assert_eq!((stats.leashes, stats.dropped_leashes), (2, 1));
        let before = store.entities(Dimension::Overworld, c).unwrap();
        assert_eq!(before[0].get_int_array("leash"), Some(&[4, 70, 5][..]));
        let holder = before[1].get_compound("leash").unwrap();
        assert!(has_uuid(holder, java_uuid(1)));

        let again = resolve(&mut ctx, &store).unwrap();
        assert_eq!(again, ResolveStats::default());
        assert_eq!(store.entities(Dimension::Overworld, c).unwrap(), before);
    }

    #[test]
    fn player_stack_is_detached() {
        let store = ChunkStore::create(&std::env::temp_dir()).unwrap();
        let mut ctx = Context::default();
        let c = Pos2i::new(0, 0);
        place(&mut ctx, &store, c, vec![entity(1, "boat"), entity(2, "pig")], &[1, 2]);
        ctx.local_player = Some(77);
        ctx.vehicles.insert(1, vehicle(c, &[2]));
        ctx.vehicles.insert(2, vehicle(c, &[77]));
        ctx.parents.extend([(2, 1), (77, 2)]);

        let stats = resolve(&mut ctx, &store).unwrap();
        assert!(stats.root_vehicle);
        assert!(store.entities(Dimension::Overworld, c).unwrap().is_empty());
        let root = ctx.root_vehicle.as_ref().unwrap();
        assert_eq!(root.attach, java_uuid(2));
        assert!(has_uuid(&root.entity, java_uuid(1)));
    }
}
