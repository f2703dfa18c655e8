//! Demo adjust kernel: signed additions on integer world slots.
use crate::anchor::MemoryAnchorStore;
use crate::config::RuntimeConfig;
use crate::delta::Delta;
use crate::engine_impl::{Runtime, RuntimeError};
use crate::ident::{DeltaId, EntityRef};
use crate::kernel::{DeltaKernel, KernelError};
use crate::payload::{
    decode_adjust_payload, decode_slot_value, encode_adjust_payload, encode_slot_value,
};
use crate::snapshot::WorldState;

/// Entity key the demo runtime seeds with an integer slot.
pub const DEMO_VALUE_SLOT: &str = "world/value";

/// Minimal kernel over integer slots.
///
/// Slots hold canonical 8-byte little-endian `i64` values; delta payloads
/// carry a signed adjustment. The inverse of an adjustment is its
/// negation, so replaying inverses in reverse order undoes an applied
/// sequence exactly.
#[derive(Debug, Default, Clone, Copy)]
pub struct AdjustKernel;

impl DeltaKernel for AdjustKernel {
    fn compute_inverse(&self, _state: &WorldState, delta: &Delta) -> Option<Delta> {
        let amount = decode_adjust_payload(&delta.payload)?;
        Some(Delta {
            id: DeltaId::new(format!("inv_{}", delta.id)),
            source_id: delta.source_id.clone(),
            entity_ref: delta.entity_ref.clone(),
            temporal_index: delta.temporal_index,
            temporal_scope: delta.temporal_scope,
            parent_ids: Vec::new(),
            payload: encode_adjust_payload(amount.checked_neg()?),
            metadata: delta.metadata.clone(),
        })
    }

    fn apply(&self, state: &mut WorldState, delta: &Delta) -> Result<(), KernelError> {
        let amount = decode_adjust_payload(&delta.payload)
            .ok_or_else(|| KernelError::MalformedPayload(delta.id.clone()))?;
        let current = state
            .slot(&delta.entity_ref)
            .and_then(decode_slot_value)
            .unwrap_or(0);
        state.set_slot(
            delta.entity_ref.clone(),
            encode_slot_value(current.wrapping_add(amount)),
        );
        Ok(())
    }

    fn validate(&self, state: &WorldState) -> bool {
        state.iter().all(|(_, value)| decode_slot_value(value).is_some())
    }
}

/// Builds a runtime over an in-memory anchor store seeded with
/// `world/value = 0` and the adjust kernel.
///
/// # Errors
/// Propagates [`RuntimeError`] from construction (none are expected with
/// the default configuration).
pub fn build_adjust_demo_runtime() -> Result<Runtime, RuntimeError> {
    build_adjust_demo_runtime_with(RuntimeConfig::default())
}

/// Same as [`build_adjust_demo_runtime`] with an explicit configuration.
///
/// # Errors
/// Propagates [`RuntimeError`] from construction.
pub fn build_adjust_demo_runtime_with(config: RuntimeConfig) -> Result<Runtime, RuntimeError> {
    let mut state = WorldState::new();
    state.set_slot(EntityRef::new(DEMO_VALUE_SLOT), encode_slot_value(0));
    Runtime::new(
        Box::new(MemoryAnchorStore::new(state)),
        Box::new(AdjustKernel),
        config,
    )
}
