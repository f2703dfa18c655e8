//! Arbiter contract: conflict preflight and snapshot finalization.
//!
//! This is a defined but currently bypassed stage. The pipeline promotes
//! the ordered delta set to the accepted set unconditionally; an attached
//! arbiter is held by the runtime as an extension point for the
//! preflight/finalize steps (4, 5, and 8) and is never invoked today. The
//! per-call millisecond budgets come from
//! [`RuntimeConfig`](crate::config::RuntimeConfig).
use crate::delta::Delta;
use crate::snapshot::Snapshot;

/// Verdict returned by arbiter evaluation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ApVerdict {
    /// The candidate may proceed.
    Accept,
    /// The candidate must be discarded.
    Reject,
    /// The candidate needs arbitration into a replacement.
    Arbitrate,
    /// Evaluation exhausted its budget.
    Timeout,
}

/// Policy engine evaluated around delta application.
pub trait ArbiterEngine {
    /// Judges one delta against the tick's input snapshot.
    fn preflight_delta(&mut self, snapshot: &Snapshot, delta: &Delta, ms_budget: u32)
        -> ApVerdict;

    /// Produces a replacement for a delta that needs arbitration, or
    /// `None` to drop it.
    fn arbitrate_delta(
        &mut self,
        snapshot: &Snapshot,
        delta: &Delta,
        ms_budget: u32,
    ) -> Option<Delta>;

    /// Judges a fully-mutated candidate snapshot.
    fn finalize_snapshot(&mut self, snapshot: &Snapshot, ms_budget: u32) -> ApVerdict;

    /// Produces a replacement for a snapshot that needs arbitration, or
    /// `None` to discard it.
    fn arbitrate_snapshot(&mut self, snapshot: &Snapshot, ms_budget: u32) -> Option<Snapshot>;
}
