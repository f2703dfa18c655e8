//! Anchor store contract and the canonical in-memory implementation.
//!
//! The anchor store owns snapshot persistence and the timeline hash
//! chain. The runtime consumes it through the [`AnchorStore`] trait:
//! continuity is checked at every tick start, committed snapshots are
//! hashed and appended, and the last immutable anchor is the slow-path
//! rollback target.
use thiserror::Error;

use crate::constants::BLAKE3_EMPTY;
use crate::ident::{Hash, SnapshotId};
use crate::snapshot::{compute_chain_hash, AnchorKind, Snapshot, WorldState};

/// Errors produced by an anchor store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnchorError {
    /// The store holds no snapshots at all.
    #[error("anchor store is empty")]
    Empty,
    /// No snapshot in the store is marked immutable.
    #[error("no immutable anchor recorded")]
    NoImmutableAnchor,
    /// A snapshot was appended without its chain hash stamped.
    #[error("snapshot {0} is missing its chain hash")]
    MissingHash(SnapshotId),
    /// A snapshot's stamped hash does not extend the chain.
    #[error("hash chain mismatch at tick {tick}: expected {expected}, found {found}")]
    ChainMismatch {
        /// Tick of the offending snapshot.
        tick: u64,
        /// Hex-encoded hash the chain required.
        expected: String,
        /// Hex-encoded hash the snapshot carried.
        found: String,
    },
}

/// Persistence and timeline-continuity backing store.
pub trait AnchorStore {
    /// Loads the snapshot the runtime starts from.
    ///
    /// # Errors
    /// Returns [`AnchorError::Empty`] when the store holds nothing.
    fn load_initial_snapshot(&self) -> Result<Snapshot, AnchorError>;

    /// Loads the most recent snapshot marked [`AnchorKind::Immutable`];
    /// the slow-path rollback target.
    ///
    /// # Errors
    /// Returns [`AnchorError::NoImmutableAnchor`] when none exists.
    fn load_last_immutable_anchor(&self) -> Result<Snapshot, AnchorError>;

    /// Computes the chain hash a snapshot would carry if appended now.
    fn compute_hash(&self, snapshot: &Snapshot) -> Hash;

    /// Appends a committed snapshot to the timeline.
    ///
    /// # Errors
    /// Implementations may refuse snapshots that do not extend the chain.
    fn append_snapshot(&mut self, snapshot: Snapshot) -> Result<(), AnchorError>;

    /// True when the stored timeline's hash chain verifies end to end.
    fn timeline_hash_ok(&self) -> bool;
}

/// In-memory anchor store: a hash-chained vector of snapshots.
///
/// The genesis snapshot is created by [`MemoryAnchorStore::new`] from the
/// supplied initial state, marked immutable, and linked to the canonical
/// empty digest.
#[derive(Debug)]
pub struct MemoryAnchorStore {
    chain: Vec<Snapshot>,
}

impl MemoryAnchorStore {
    /// Builds a store whose genesis anchor holds `initial_state`.
    #[must_use]
    pub fn new(initial_state: WorldState) -> Self {
        let hash = compute_chain_hash(&BLAKE3_EMPTY, 0, &initial_state);
        let genesis = Snapshot {
            id: SnapshotId::for_tick(0),
            tick: 0,
            state: initial_state,
            hash32: Some(hash),
            anchor_kind: AnchorKind::Immutable,
        };
        Self {
            chain: vec![genesis],
        }
    }

    /// Number of snapshots in the timeline, genesis included.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    /// The most recently appended snapshot.
    #[must_use]
    pub fn tip(&self) -> Option<&Snapshot> {
        self.chain.last()
    }

    fn chain_parent(&self) -> Hash {
        self.chain
            .last()
            .and_then(|s| s.hash32)
            .unwrap_or(*BLAKE3_EMPTY)
    }
}

impl AnchorStore for MemoryAnchorStore {
    fn load_initial_snapshot(&self) -> Result<Snapshot, AnchorError> {
        self.chain.first().cloned().ok_or(AnchorError::Empty)
    }

    fn load_last_immutable_anchor(&self) -> Result<Snapshot, AnchorError> {
        self.chain
            .iter()
            .rev()
            .find(|s| s.anchor_kind == AnchorKind::Immutable)
            .cloned()
            .ok_or(AnchorError::NoImmutableAnchor)
    }

    fn compute_hash(&self, snapshot: &Snapshot) -> Hash {
        compute_chain_hash(&self.chain_parent(), snapshot.tick, &snapshot.state)
    }

    fn append_snapshot(&mut self, snapshot: Snapshot) -> Result<(), AnchorError> {
        let Some(found) = snapshot.hash32 else {
            return Err(AnchorError::MissingHash(snapshot.id.clone()));
        };
        let expected = self.compute_hash(&snapshot);
        if found != expected {
            return Err(AnchorError::ChainMismatch {
                tick: snapshot.tick,
                expected: hex::encode(expected),
                found: hex::encode(found),
            });
        }
        self.chain.push(snapshot);
        Ok(())
    }

    fn timeline_hash_ok(&self) -> bool {
        let mut parent = *BLAKE3_EMPTY;
        for snapshot in &self.chain {
            let Some(stored) = snapshot.hash32 else {
                return false;
            };
            if stored != compute_chain_hash(&parent, snapshot.tick, &snapshot.state) {
                return false;
            }
            parent = stored;
        }
        true
    }
}
