//! Delta: an atomic, causally-scoped mutation request.
use std::collections::BTreeMap;

use bytes::Bytes;
use thiserror::Error;

use crate::ident::{DeltaId, EntityRef, SourceId};

/// Maximum number of causal-ancestor ids a delta may carry; more is a
/// structural-validity violation.
pub const MAX_PARENT_IDS: usize = 64;

/// Scale factor for temporal-index normalization: indices are rounded to
/// six decimal digits on ingestion so sorting is deterministic regardless
/// of how producers computed them.
const TEMPORAL_INDEX_SCALE: f64 = 1_000_000.0;

/// Inclusive logical-time interval a delta claims to cover.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TemporalScope {
    /// Start of the interval.
    pub start: f64,
    /// End of the interval; must not precede `start`.
    pub end: f64,
}

impl TemporalScope {
    /// Builds a scope covering `[start, end]`.
    #[must_use]
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Builds a degenerate scope covering a single instant.
    #[must_use]
    pub fn at(instant: f64) -> Self {
        Self {
            start: instant,
            end: instant,
        }
    }

    /// True when the interval is inverted (`start > end`).
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

/// Structural faults that cause a delta to be rejected during ingestion.
///
/// Rejection is local and non-fatal: the offending delta is moved to the
/// rejected queue and the tick proceeds.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeltaFault {
    /// The delta id is empty.
    #[error("empty delta id")]
    EmptyId,
    /// The producer id is empty.
    #[error("empty source id")]
    EmptySourceId,
    /// The targeted entity key is empty.
    #[error("empty entity ref")]
    EmptyEntityRef,
    /// The temporal scope ends before it starts.
    #[error("inverted temporal scope")]
    InvertedScope,
    /// The causal ancestor list exceeds [`MAX_PARENT_IDS`].
    #[error("too many parent ids: {0} (limit {MAX_PARENT_IDS})")]
    TooManyParents(usize),
}

/// Atomic mutation request targeting one slot of world state.
///
/// The `payload` is opaque to the engine and interpreted only by the
/// kernel contract; `metadata` is never interpreted at all.
#[derive(Clone, PartialEq, Debug)]
pub struct Delta {
    /// Unique identifier, non-empty.
    pub id: DeltaId,
    /// Identifier of the producer, non-empty.
    pub source_id: SourceId,
    /// Key of the state slot this delta targets, non-empty.
    pub entity_ref: EntityRef,
    /// Logical time used as the primary ordering key.
    pub temporal_index: f64,
    /// Inclusive interval the delta claims to cover.
    pub temporal_scope: TemporalScope,
    /// Ordered causal ancestors, at most [`MAX_PARENT_IDS`] entries.
    pub parent_ids: Vec<DeltaId>,
    /// Opaque mutation payload, interpreted by the kernel contract.
    pub payload: Bytes,
    /// Opaque annotations, carried but never interpreted.
    pub metadata: BTreeMap<String, String>,
}

impl Delta {
    /// Number of recorded causal ancestors; ordering tie-break after the
    /// temporal index (shallower first).
    #[must_use]
    pub fn causal_depth(&self) -> usize {
        self.parent_ids.len()
    }

    /// Checks the structural-validity rules applied during ingestion.
    ///
    /// # Errors
    /// Returns the first [`DeltaFault`] found, in field order.
    pub fn check_structure(&self) -> Result<(), DeltaFault> {
        if self.id.as_str().is_empty() {
            return Err(DeltaFault::EmptyId);
        }
        if self.source_id.as_str().is_empty() {
            return Err(DeltaFault::EmptySourceId);
        }
        if self.entity_ref.as_str().is_empty() {
            return Err(DeltaFault::EmptyEntityRef);
        }
        if self.temporal_scope.is_inverted() {
            return Err(DeltaFault::InvertedScope);
        }
        if self.parent_ids.len() > MAX_PARENT_IDS {
            return Err(DeltaFault::TooManyParents(self.parent_ids.len()));
        }
        Ok(())
    }

    /// Normalizes the delta for deterministic downstream processing.
    ///
    /// Rounds `temporal_index` to six decimal digits. Deltas are owned by
    /// the context once ingested, so normalization plus the ownership
    /// transfer gives the pipeline freedom from aliasing with caller data.
    pub fn normalize(&mut self) {
        self.temporal_index = round_temporal_index(self.temporal_index);
    }
}

/// Rounds a temporal index to six decimal digits.
pub(crate) fn round_temporal_index(index: f64) -> f64 {
    (index * TEMPORAL_INDEX_SCALE).round() / TEMPORAL_INDEX_SCALE
}
