#![allow(dead_code)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use bytes::Bytes;
use weft_core::{
    build_adjust_demo_runtime, build_adjust_demo_runtime_with, decode_slot_value, AdjustKernel,
    AnchorError, AnchorStore, Delta, DeltaId, DeltaKernel, DomainViews, EntityRef, Hash,
    HydrateError, KernelError, MemoryAnchorStore, PerformError, PerformanceSink, PerformanceTask,
    PerformerHook, Runtime, RuntimeConfig, Snapshot, SourceId, TaskKind, TemporalScope,
    TickContext, ViewHydrator, WorldState, DEMO_VALUE_SLOT,
};

pub fn adjust_delta(id: &str, temporal_index: f64, amount: i64) -> Delta {
    adjust_delta_from("user", id, temporal_index, amount)
}

pub fn adjust_delta_from(source: &str, id: &str, temporal_index: f64, amount: i64) -> Delta {
    Delta {
        id: DeltaId::new(id),
        source_id: SourceId::new(source),
        entity_ref: EntityRef::new(DEMO_VALUE_SLOT),
        temporal_index,
        temporal_scope: TemporalScope::at(temporal_index),
        parent_ids: Vec::new(),
        payload: weft_core::encode_adjust_payload(amount),
        metadata: BTreeMap::new(),
    }
}

pub fn demo_runtime() -> Runtime {
    build_adjust_demo_runtime().expect("demo runtime")
}

pub fn demo_runtime_with_limit(max_deltas_per_tick: usize) -> Runtime {
    build_adjust_demo_runtime_with(RuntimeConfig {
        max_deltas_per_tick,
        ..RuntimeConfig::default()
    })
    .expect("demo runtime")
}

pub fn ids(deltas: &[Delta]) -> Vec<String> {
    deltas.iter().map(|d| d.id.as_str().to_owned()).collect()
}

pub fn value_slot(state: &WorldState) -> i64 {
    state
        .slot(&EntityRef::new(DEMO_VALUE_SLOT))
        .and_then(decode_slot_value)
        .expect("value slot")
}

pub fn current_value(runtime: &Runtime) -> i64 {
    value_slot(&runtime.current_snapshot().state)
}

pub fn output_value(ctx: &TickContext) -> i64 {
    value_slot(&ctx.snapshot_out.as_ref().expect("snapshot out").state)
}

/// Kernel whose validation always fails; everything else delegates to the
/// demo adjust kernel.
pub struct RejectingKernel;

impl DeltaKernel for RejectingKernel {
    fn compute_inverse(&self, state: &WorldState, delta: &Delta) -> Option<Delta> {
        AdjustKernel.compute_inverse(state, delta)
    }

    fn apply(&self, state: &mut WorldState, delta: &Delta) -> Result<(), KernelError> {
        AdjustKernel.apply(state, delta)
    }

    fn validate(&self, _state: &WorldState) -> bool {
        false
    }
}

/// Kernel that cannot invert one specific delta.
pub struct BrokenInverseKernel {
    pub fail_on: &'static str,
}

impl DeltaKernel for BrokenInverseKernel {
    fn compute_inverse(&self, state: &WorldState, delta: &Delta) -> Option<Delta> {
        if delta.id.as_str() == self.fail_on {
            return None;
        }
        AdjustKernel.compute_inverse(state, delta)
    }

    fn apply(&self, state: &mut WorldState, delta: &Delta) -> Result<(), KernelError> {
        AdjustKernel.apply(state, delta)
    }

    fn validate(&self, state: &WorldState) -> bool {
        AdjustKernel.validate(state)
    }
}

/// Anchor store wrapper whose continuity verdict is scripted through a
/// shared flag, so tests can break the timeline mid-run.
pub struct ScriptedAnchorStore {
    inner: MemoryAnchorStore,
    ok: Rc<Cell<bool>>,
}

impl ScriptedAnchorStore {
    pub fn with_value_slot(initial: i64) -> (Self, Rc<Cell<bool>>) {
        let mut state = WorldState::new();
        state.set_slot(
            EntityRef::new(DEMO_VALUE_SLOT),
            weft_core::encode_slot_value(initial),
        );
        let ok = Rc::new(Cell::new(true));
        (
            Self {
                inner: MemoryAnchorStore::new(state),
                ok: Rc::clone(&ok),
            },
            ok,
        )
    }
}

impl AnchorStore for ScriptedAnchorStore {
    fn load_initial_snapshot(&self) -> Result<Snapshot, AnchorError> {
        self.inner.load_initial_snapshot()
    }

    fn load_last_immutable_anchor(&self) -> Result<Snapshot, AnchorError> {
        self.inner.load_last_immutable_anchor()
    }

    fn compute_hash(&self, snapshot: &Snapshot) -> Hash {
        self.inner.compute_hash(snapshot)
    }

    fn append_snapshot(&mut self, snapshot: Snapshot) -> Result<(), AnchorError> {
        self.inner.append_snapshot(snapshot)
    }

    fn timeline_hash_ok(&self) -> bool {
        self.ok.get()
    }
}

/// Anchor store whose continuity check passes once (at tick init) and
/// fails on every later call, so rollback re-queries see a broken chain.
pub struct FlipFlopAnchorStore {
    inner: MemoryAnchorStore,
    checks: Cell<u32>,
}

impl FlipFlopAnchorStore {
    pub fn with_value_slot(initial: i64) -> Self {
        let mut state = WorldState::new();
        state.set_slot(
            EntityRef::new(DEMO_VALUE_SLOT),
            weft_core::encode_slot_value(initial),
        );
        Self {
            inner: MemoryAnchorStore::new(state),
            checks: Cell::new(0),
        }
    }
}

impl AnchorStore for FlipFlopAnchorStore {
    fn load_initial_snapshot(&self) -> Result<Snapshot, AnchorError> {
        self.inner.load_initial_snapshot()
    }

    fn load_last_immutable_anchor(&self) -> Result<Snapshot, AnchorError> {
        self.inner.load_last_immutable_anchor()
    }

    fn compute_hash(&self, snapshot: &Snapshot) -> Hash {
        self.inner.compute_hash(snapshot)
    }

    fn append_snapshot(&mut self, snapshot: Snapshot) -> Result<(), AnchorError> {
        self.inner.append_snapshot(snapshot)
    }

    fn timeline_hash_ok(&self) -> bool {
        let seen = self.checks.get();
        self.checks.set(seen + 1);
        seen == 0
    }
}

/// Anchor store that refuses every append, simulating a persistence
/// failure at commit.
pub struct AppendRefusingStore {
    inner: MemoryAnchorStore,
}

impl AppendRefusingStore {
    pub fn with_value_slot(initial: i64) -> Self {
        let mut state = WorldState::new();
        state.set_slot(
            EntityRef::new(DEMO_VALUE_SLOT),
            weft_core::encode_slot_value(initial),
        );
        Self {
            inner: MemoryAnchorStore::new(state),
        }
    }
}

impl AnchorStore for AppendRefusingStore {
    fn load_initial_snapshot(&self) -> Result<Snapshot, AnchorError> {
        self.inner.load_initial_snapshot()
    }

    fn load_last_immutable_anchor(&self) -> Result<Snapshot, AnchorError> {
        self.inner.load_last_immutable_anchor()
    }

    fn compute_hash(&self, snapshot: &Snapshot) -> Hash {
        self.inner.compute_hash(snapshot)
    }

    fn append_snapshot(&mut self, snapshot: Snapshot) -> Result<(), AnchorError> {
        Err(AnchorError::ChainMismatch {
            tick: snapshot.tick,
            expected: "00".to_owned(),
            found: "ff".to_owned(),
        })
    }

    fn timeline_hash_ok(&self) -> bool {
        self.inner.timeline_hash_ok()
    }
}

/// Anchor store that has lost its immutable anchor.
pub struct AnchorlessStore {
    inner: MemoryAnchorStore,
}

impl AnchorlessStore {
    pub fn with_value_slot(initial: i64) -> Self {
        let mut state = WorldState::new();
        state.set_slot(
            EntityRef::new(DEMO_VALUE_SLOT),
            weft_core::encode_slot_value(initial),
        );
        Self {
            inner: MemoryAnchorStore::new(state),
        }
    }
}

impl AnchorStore for AnchorlessStore {
    fn load_initial_snapshot(&self) -> Result<Snapshot, AnchorError> {
        self.inner.load_initial_snapshot()
    }

    fn load_last_immutable_anchor(&self) -> Result<Snapshot, AnchorError> {
        Err(AnchorError::NoImmutableAnchor)
    }

    fn compute_hash(&self, snapshot: &Snapshot) -> Hash {
        self.inner.compute_hash(snapshot)
    }

    fn append_snapshot(&mut self, snapshot: Snapshot) -> Result<(), AnchorError> {
        self.inner.append_snapshot(snapshot)
    }

    fn timeline_hash_ok(&self) -> bool {
        self.inner.timeline_hash_ok()
    }
}

/// Performer that emits one render task per domain view.
pub struct ViewCountPerformer;

impl PerformerHook for ViewCountPerformer {
    fn step(
        &mut self,
        tick_id: u64,
        _delta_time: f64,
        views: &DomainViews,
    ) -> Result<Vec<PerformanceTask>, PerformError> {
        Ok(views
            .iter()
            .map(|(name, payload)| PerformanceTask {
                id: format!("task_{name}_{tick_id}"),
                tick_id,
                scene_time: 0.0,
                kind: TaskKind::Render,
                payload: payload.clone(),
                priority: 1,
            })
            .collect())
    }
}

/// Performer whose step always fails.
pub struct FailingPerformer;

impl PerformerHook for FailingPerformer {
    fn step(
        &mut self,
        _tick_id: u64,
        _delta_time: f64,
        _views: &DomainViews,
    ) -> Result<Vec<PerformanceTask>, PerformError> {
        Err(PerformError::Step("scene track offline".to_owned()))
    }
}

/// Sink recording `(tick_id, task_count)` pairs into shared storage.
pub struct RecordingSink {
    pub scheduled: Rc<std::cell::RefCell<Vec<(u64, usize)>>>,
}

impl RecordingSink {
    pub fn new() -> (Self, Rc<std::cell::RefCell<Vec<(u64, usize)>>>) {
        let scheduled = Rc::new(std::cell::RefCell::new(Vec::new()));
        (
            Self {
                scheduled: Rc::clone(&scheduled),
            },
            scheduled,
        )
    }
}

impl PerformanceSink for RecordingSink {
    fn schedule_performance(
        &mut self,
        tick_id: u64,
        tasks: &[PerformanceTask],
    ) -> Result<(), PerformError> {
        self.scheduled.borrow_mut().push((tick_id, tasks.len()));
        Ok(())
    }
}

/// Sink that refuses every schedule call.
pub struct FailingSink;

impl PerformanceSink for FailingSink {
    fn schedule_performance(
        &mut self,
        tick_id: u64,
        _tasks: &[PerformanceTask],
    ) -> Result<(), PerformError> {
        Err(PerformError::Sink(tick_id, "bridge down".to_owned()))
    }
}

/// Hydrator publishing the demo value slot as a `value_view`.
pub struct SlotHydrator;

impl ViewHydrator for SlotHydrator {
    fn hydrate(&self, state: &WorldState, _tick_id: u64) -> Result<DomainViews, HydrateError> {
        let mut views = DomainViews::new();
        if let Some(value) = state.slot(&EntityRef::new(DEMO_VALUE_SLOT)) {
            views.insert("value_view", value.clone());
        }
        Ok(views)
    }
}

/// Hydrator that always fails.
pub struct FailingHydrator;

impl ViewHydrator for FailingHydrator {
    fn hydrate(&self, _state: &WorldState, _tick_id: u64) -> Result<DomainViews, HydrateError> {
        Err(HydrateError::Failed("projection table missing".to_owned()))
    }
}

pub fn caller_views(entries: &[(&str, &'static [u8])]) -> DomainViews {
    let mut views = DomainViews::new();
    for (name, payload) in entries {
        views.insert(*name, Bytes::from_static(payload));
    }
    views
}
