//! Deterministic temporal ordering of ingested deltas.
//!
//! Ordering invariant:
//! - Deltas sort ascending by `(temporal_index, causal_depth, source_id, id)`.
//! - The temporal index is compared with `f64::total_cmp`, so adversarial
//!   inputs (equal indices, NaN) still yield one reproducible order.
//! - The sort is stable, though the four-component key is already total
//!   for structurally valid deltas (ids are unique).
use std::cmp::Ordering;

use crate::delta::Delta;

/// Comparison implementing the canonical ordering key.
pub(crate) fn temporal_order(a: &Delta, b: &Delta) -> Ordering {
    a.temporal_index
        .total_cmp(&b.temporal_index)
        .then_with(|| a.causal_depth().cmp(&b.causal_depth()))
        .then_with(|| a.source_id.cmp(&b.source_id))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts deltas into canonical order in place.
pub(crate) fn sort_deltas(deltas: &mut [Delta]) {
    deltas.sort_by(temporal_order);
}
