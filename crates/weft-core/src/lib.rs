//! weft-core: deterministic tick pipeline engine.
//!
//! The runtime ingests causally-tagged deltas, orders them
//! deterministically, applies them to an immutable snapshot through a
//! pluggable kernel contract, and recovers from validation breaches via a
//! two-tier (fast/slow) rollback protocol backed by an anchor store's
//! timeline hash chain.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::redundant_pub_crate
)]

mod anchor;
mod arbiter;
mod config;
mod constants;
mod context;
mod delta;
pub mod demo;
mod engine_impl;
mod ident;
mod kernel;
mod ordering;
mod payload;
mod performer;
mod snapshot;
mod telemetry;
mod views;

// Re-exports for stable public API
pub use anchor::{AnchorError, AnchorStore, MemoryAnchorStore};
pub use arbiter::{ApVerdict, ArbiterEngine};
pub use config::{ConfigError, RuntimeConfig};
pub use constants::BLAKE3_EMPTY;
pub use context::{
    Alert, Severity, TickContext, STEP_APPLY, STEP_HYDRATE, STEP_INGEST, STEP_INIT, STEP_ORDER,
    STEP_SCHEDULE,
};
pub use delta::{Delta, DeltaFault, TemporalScope, MAX_PARENT_IDS};
pub use demo::adjust::{
    build_adjust_demo_runtime, build_adjust_demo_runtime_with, AdjustKernel, DEMO_VALUE_SLOT,
};
pub use engine_impl::{Runtime, RuntimeError};
pub use ident::{DeltaId, EntityRef, Hash, SnapshotId, SourceId};
pub use kernel::{DeltaKernel, KernelError};
pub use payload::{
    decode_adjust_payload, decode_slot_value, encode_adjust_payload, encode_slot_value, OP_ADD,
};
pub use performer::{
    NoopPerformanceSink, PerformError, PerformanceSink, PerformanceTask, PerformerHook, TaskKind,
};
pub use snapshot::{compute_chain_hash, compute_state_hash, AnchorKind, Snapshot, WorldState};
pub use views::{DomainViews, HydrateError, ViewHydrator};
