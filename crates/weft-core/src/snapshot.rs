//! Snapshot type, world-state map, and canonical hash computation.
//!
//! Determinism contract
//! - The chain hash is a BLAKE3 digest over a canonical byte stream:
//!   parent hash, tick number, then the full state map.
//! - Ordering is explicit and stable: the state map is a `BTreeMap`, so
//!   slots are encoded in ascending `EntityRef` order.
//! - Encoding is fixed-size and architecture-independent: the parent hash
//!   is 32 raw bytes, the tick is 8-byte little-endian, and every key and
//!   value is prefixed by an 8-byte little-endian length.
//! - The genesis snapshot links to [`crate::constants::BLAKE3_EMPTY`].
//!
//! Changing any of these rules changes snapshot identity and breaks
//! timeline continuity for existing anchor stores; treat the encoding as
//! frozen.
use blake3::Hasher;
use bytes::Bytes;
use std::collections::BTreeMap;

use crate::ident::{EntityRef, Hash, SnapshotId};

/// Anchor classification of a snapshot.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnchorKind {
    /// Ordinary committed snapshot; reclaimable.
    Soft,
    /// Snapshot pinned by the host; not reclaimed but not a restore target.
    Hard,
    /// Snapshot marked safe for slow-path restoration.
    Immutable,
}

/// World state at a tick boundary: a map from entity keys to opaque slot
/// values.
///
/// Slot encoding is caller-defined and opaque to the engine; only the
/// kernel contract interprets it. The map is a `BTreeMap` so iteration
/// (and therefore hashing) is deterministic.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct WorldState {
    slots: BTreeMap<EntityRef, Bytes>,
}

impl WorldState {
    /// Creates an empty state map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored at `entity`, when present.
    #[must_use]
    pub fn slot(&self, entity: &EntityRef) -> Option<&Bytes> {
        self.slots.get(entity)
    }

    /// Inserts or replaces the value at `entity`, returning the previous
    /// value when one existed.
    pub fn set_slot(&mut self, entity: EntityRef, value: Bytes) -> Option<Bytes> {
        self.slots.insert(entity, value)
    }

    /// Removes the value at `entity`, returning it when one existed.
    pub fn remove_slot(&mut self, entity: &EntityRef) -> Option<Bytes> {
        self.slots.remove(entity)
    }

    /// Number of populated slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when no slot is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates slots in ascending `EntityRef` order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityRef, &Bytes)> {
        self.slots.iter()
    }
}

impl FromIterator<(EntityRef, Bytes)> for WorldState {
    fn from_iter<I: IntoIterator<Item = (EntityRef, Bytes)>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

/// Canonical or candidate world state at a tick boundary.
///
/// Snapshots are value types: mutation always produces a new snapshot via
/// copy-on-write, and a snapshot handed to a caller is never mutated in
/// place.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Snapshot {
    /// Stable identifier within the timeline.
    pub id: SnapshotId,
    /// Monotonic tick number this snapshot was produced at.
    pub tick: u64,
    /// The state map itself.
    pub state: WorldState,
    /// Timeline chain hash; stamped at commit, absent on candidates.
    pub hash32: Option<Hash>,
    /// Anchor classification.
    pub anchor_kind: AnchorKind,
}

fn update_with_state(hasher: &mut Hasher, state: &WorldState) {
    hasher.update(&(state.len() as u64).to_le_bytes());
    for (entity, value) in state.iter() {
        let key = entity.as_str().as_bytes();
        hasher.update(&(key.len() as u64).to_le_bytes());
        hasher.update(key);
        hasher.update(&(value.len() as u64).to_le_bytes());
        hasher.update(value);
    }
}

/// Computes the canonical hash of a state map alone (no chain linkage).
#[must_use]
pub fn compute_state_hash(state: &WorldState) -> Hash {
    let mut hasher = Hasher::new();
    update_with_state(&mut hasher, state);
    hasher.finalize().into()
}

/// Computes the timeline chain hash for a snapshot with the given parent
/// link.
#[must_use]
pub fn compute_chain_hash(parent: &Hash, tick: u64, state: &WorldState) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(parent);
    hasher.update(&tick.to_le_bytes());
    update_with_state(&mut hasher, state);
    hasher.finalize().into()
}
