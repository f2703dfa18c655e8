//! Kernel contract: the domain plugin that interprets delta payloads.
use thiserror::Error;

use crate::delta::Delta;
use crate::ident::DeltaId;
use crate::snapshot::WorldState;

/// Errors a kernel may signal while applying a delta.
///
/// Any error surfacing through [`DeltaKernel::apply`] during the pipeline
/// is treated as an external breach and triggers rollback.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KernelError {
    /// The delta payload did not decode under the kernel's schema.
    #[error("malformed payload on delta {0}")]
    MalformedPayload(DeltaId),
    /// The payload decoded but requested an operation the kernel does not
    /// support.
    #[error("unsupported operation on delta {0}")]
    UnsupportedOp(DeltaId),
    /// The kernel refused the delta for a domain-specific reason.
    #[error("kernel rejected delta {0}: {1}")]
    Rejected(DeltaId, String),
}

/// Domain kernel operating on a narrow state slice.
///
/// The engine never inspects payload semantics; everything it knows about
/// a delta's effect goes through this contract. Implementations must be
/// pure, deterministic functions of their inputs — the engine imposes this
/// requirement but cannot enforce it.
pub trait DeltaKernel {
    /// Computes the compensating delta for `delta` against the current
    /// (possibly already-mutated) state, or `None` when no inverse exists.
    ///
    /// An absent inverse is a fatal breach for the tick: mutation stops
    /// immediately and rollback runs.
    fn compute_inverse(&self, state: &WorldState, delta: &Delta) -> Option<Delta>;

    /// Applies `delta` destructively to `state`.
    ///
    /// # Errors
    /// A [`KernelError`] aborts the remaining deltas and breaches the tick.
    fn apply(&self, state: &mut WorldState, delta: &Delta) -> Result<(), KernelError>;

    /// Validates a fully-mutated state; `false` is a fatal breach.
    fn validate(&self, state: &WorldState) -> bool;
}
