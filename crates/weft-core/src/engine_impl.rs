//! Tick runtime: the eleven-step pipeline driver and rollback machine.
//!
//! One `run_tick` call fully completes — including any rollback — before
//! another may begin. The runtime exclusively owns the current snapshot
//! between ticks; within a tick the working state copy is exclusively
//! owned by the mutation step until it is committed or discarded. Every
//! collaborator call is a blocking synchronous call and there is no
//! cancellation: once a tick starts it runs to completion.
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::anchor::{AnchorError, AnchorStore};
use crate::arbiter::ArbiterEngine;
use crate::config::{ConfigError, RuntimeConfig};
use crate::context::{
    Severity, TickContext, STEP_APPLY, STEP_HYDRATE, STEP_INGEST, STEP_INIT, STEP_SCHEDULE,
};
use crate::delta::Delta;
use crate::ident::{DeltaId, SnapshotId};
use crate::kernel::DeltaKernel;
use crate::ordering;
use crate::performer::{NoopPerformanceSink, PerformanceSink, PerformerHook};
use crate::snapshot::{AnchorKind, Snapshot};
use crate::views::{DomainViews, ViewHydrator};

/// Inclusive step window within which fast-path rollback may be attempted.
const FAST_ROLLBACK_WINDOW: std::ops::RangeInclusive<u8> = 2..=7;

/// Errors emitted while constructing a [`Runtime`].
///
/// `run_tick` itself never fails: every in-tick failure is converted into
/// the breach/rollback state machine and reported on the returned context.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The supplied configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The anchor store could not supply the initial snapshot.
    #[error("anchor store failed to supply the initial snapshot: {0}")]
    InitialSnapshot(#[source] AnchorError),
}

/// Breach-class failure detected during a tick.
#[derive(Debug, Error)]
enum BreachKind {
    /// Timeline continuity failed at tick start.
    #[error("timeline hash mismatch at tick init")]
    Continuity,
    /// The kernel could not invert a delta.
    #[error("cannot compute inverse for delta {0}")]
    InverseUnavailable(DeltaId),
    /// Post-mutation state validation failed.
    #[error("state validation failed after mutation")]
    ValidationFailed,
    /// A collaborator signalled a hard failure during the pipeline.
    #[error("runtime breach: {0}")]
    External(String),
}

struct Breach {
    kind: BreachKind,
    /// Pipeline step the breach was detected at; `None` when it occurred
    /// outside any numbered step (e.g. at commit).
    step: Option<u8>,
}

impl Breach {
    fn at(step: u8, kind: BreachKind) -> Self {
        Self {
            kind,
            step: Some(step),
        }
    }

    fn external(err: impl std::fmt::Display) -> Self {
        Self {
            kind: BreachKind::External(err.to_string()),
            step: None,
        }
    }
}

/// The tick engine.
///
/// Owns the current canonical snapshot and orchestrates the pipeline:
/// ingestion, ordering, mutation through the kernel contract, hydration,
/// performance scheduling, and commit-or-rollback. Collaborators are
/// injected at construction; the performer, hydrator, and arbiter are
/// optional, and the sink defaults to [`NoopPerformanceSink`].
pub struct Runtime {
    anchor_store: Box<dyn AnchorStore>,
    kernel: Box<dyn DeltaKernel>,
    hydrator: Option<Box<dyn ViewHydrator>>,
    performer: Option<Box<dyn PerformerHook>>,
    sink: Box<dyn PerformanceSink>,
    arbiter: Option<Box<dyn ArbiterEngine>>,
    config: RuntimeConfig,
    tick_counter: u64,
    current_snapshot: Snapshot,
    last_tick_at: Option<Instant>,
}

impl Runtime {
    /// Constructs a runtime over the given anchor store and kernel.
    ///
    /// # Errors
    /// Returns [`RuntimeError::Config`] when the configuration is invalid,
    /// or [`RuntimeError::InitialSnapshot`] when the store cannot supply a
    /// starting snapshot.
    pub fn new(
        anchor_store: Box<dyn AnchorStore>,
        kernel: Box<dyn DeltaKernel>,
        config: RuntimeConfig,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;
        let current_snapshot = anchor_store
            .load_initial_snapshot()
            .map_err(RuntimeError::InitialSnapshot)?;
        Ok(Self {
            anchor_store,
            kernel,
            hydrator: None,
            performer: None,
            sink: Box::new(NoopPerformanceSink),
            arbiter: None,
            config,
            tick_counter: 0,
            current_snapshot,
            last_tick_at: None,
        })
    }

    /// Attaches a view hydrator.
    #[must_use]
    pub fn with_hydrator(mut self, hydrator: Box<dyn ViewHydrator>) -> Self {
        self.hydrator = Some(hydrator);
        self
    }

    /// Attaches a performer hook.
    #[must_use]
    pub fn with_performer(mut self, performer: Box<dyn PerformerHook>) -> Self {
        self.performer = Some(performer);
        self
    }

    /// Replaces the performance sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn PerformanceSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Attaches an arbiter engine.
    ///
    /// The arbiter stage is currently bypassed by the pipeline; the engine
    /// holds the instance as an extension point only.
    #[must_use]
    pub fn with_arbiter(mut self, arbiter: Box<dyn ArbiterEngine>) -> Self {
        self.arbiter = Some(arbiter);
        self
    }

    /// The snapshot the next tick will start from.
    #[must_use]
    pub fn current_snapshot(&self) -> &Snapshot {
        &self.current_snapshot
    }

    /// Number of ticks executed so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// The validated configuration the runtime was built with.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The attached arbiter, when one was supplied.
    #[must_use]
    pub fn arbiter(&self) -> Option<&dyn ArbiterEngine> {
        self.arbiter.as_deref()
    }

    /// Executes one tick of the pipeline.
    ///
    /// `delta_time` defaults to the wall-clock delta since the previous
    /// call (0 on the first); callers override it for deterministic
    /// replay. The returned context is the tick's complete audit record —
    /// this method never fails, all internal failures are converted into
    /// the breach/rollback machine.
    pub fn run_tick(
        &mut self,
        pending_deltas: Vec<Delta>,
        domain_views: Option<DomainViews>,
        delta_time: Option<f64>,
    ) -> TickContext {
        let mut ctx = self.step1_init(pending_deltas, domain_views, delta_time);

        if !ctx.breached {
            if let Err(breach) = self.drive(&mut ctx) {
                mark_breach(&mut ctx, &breach);
            }
        }
        if ctx.breached {
            self.rollback(&mut ctx);
        }
        ctx
    }

    fn drive(&mut self, ctx: &mut TickContext) -> Result<(), Breach> {
        self.step2_ingest(ctx);
        Self::step3_temporal_order(ctx);

        // Steps 4/5/8 (arbiter preflight/finalize) are bypassed: the
        // ordered set becomes the accepted set unconditionally.
        ctx.deltas_accepted = ctx.deltas_ordered.clone();

        self.step6_apply_deltas(ctx)?;
        self.step10_hydrate_views(ctx);
        self.step11_schedule_performance(ctx);
        self.commit(ctx)
    }

    fn step1_init(
        &mut self,
        pending_deltas: Vec<Delta>,
        domain_views: Option<DomainViews>,
        explicit_delta_time: Option<f64>,
    ) -> TickContext {
        self.tick_counter += 1;

        let delta_time = match explicit_delta_time {
            Some(dt) => dt.max(0.0),
            None => self
                .last_tick_at
                .map_or(0.0, |at| at.elapsed().as_secs_f64()),
        };
        self.last_tick_at = Some(Instant::now());

        let mut ctx = TickContext::new(
            self.tick_counter,
            unix_ts(),
            delta_time,
            self.current_snapshot.clone(),
            domain_views.unwrap_or_default(),
        );
        ctx.deltas_in = pending_deltas;

        ctx.timeline_hash_ok = self.anchor_store.timeline_hash_ok();
        if !ctx.timeline_hash_ok {
            mark_breach(&mut ctx, &Breach::at(STEP_INIT, BreachKind::Continuity));
        }
        ctx
    }

    fn step2_ingest(&mut self, ctx: &mut TickContext) {
        let limit = self.config.max_deltas_per_tick;
        if ctx.deltas_in.len() > limit {
            let overflow = ctx.deltas_in.len() - limit;
            ctx.deltas_in.truncate(limit);
            ctx.fenced = true;
            ctx.alert(
                Severity::Warning,
                STEP_INGEST,
                format!("temporal fence: {overflow} deltas deferred to the next tick"),
            );
        }

        let incoming = std::mem::take(&mut ctx.deltas_in);
        let mut survivors = Vec::with_capacity(incoming.len());
        for mut delta in incoming {
            match delta.check_structure() {
                Ok(()) => {
                    delta.normalize();
                    survivors.push(delta);
                }
                Err(fault) => {
                    ctx.alert(
                        Severity::Warning,
                        STEP_INGEST,
                        format!("rejected malformed delta {}: {fault}", delta.id),
                    );
                    ctx.deltas_rejected.push(delta);
                }
            }
        }
        ctx.deltas_in = survivors;
    }

    fn step3_temporal_order(ctx: &mut TickContext) {
        let mut ordered = ctx.deltas_in.clone();
        ordering::sort_deltas(&mut ordered);
        ctx.deltas_ordered = ordered;
    }

    fn step6_apply_deltas(&mut self, ctx: &mut TickContext) -> Result<(), Breach> {
        // Copy-on-write clone of the input state; exclusively owned here
        // until committed or discarded.
        let mut state = ctx.snapshot_in.state.clone();

        for delta in &ctx.deltas_accepted {
            let Some(inverse) = self.kernel.compute_inverse(&state, delta) else {
                return Err(Breach::at(
                    STEP_APPLY,
                    BreachKind::InverseUnavailable(delta.id.clone()),
                ));
            };
            if let Err(err) = self.kernel.apply(&mut state, delta) {
                return Err(Breach::at(
                    STEP_APPLY,
                    BreachKind::External(err.to_string()),
                ));
            }
            ctx.inverse_deltas.push(inverse);
        }

        if !self.kernel.validate(&state) {
            return Err(Breach::at(STEP_APPLY, BreachKind::ValidationFailed));
        }

        ctx.snapshot_out = Some(Snapshot {
            id: SnapshotId::for_tick(ctx.tick_id),
            tick: ctx.tick_id,
            state,
            hash32: None,
            anchor_kind: AnchorKind::Soft,
        });
        Ok(())
    }

    fn step10_hydrate_views(&mut self, ctx: &mut TickContext) {
        let Some(hydrator) = self.hydrator.as_deref() else {
            return;
        };
        let Some(snapshot_out) = ctx.snapshot_out.as_ref() else {
            return;
        };
        // Views are derived from the NEW state so the performer sees
        // post-mutation truth; derived views win on key collision.
        match hydrator.hydrate(&snapshot_out.state, ctx.tick_id) {
            Ok(derived) => ctx.domain_views.merge_over(derived),
            Err(err) => ctx.alert(
                Severity::Error,
                STEP_HYDRATE,
                format!("domain view hydration failed: {err}"),
            ),
        }
    }

    fn step11_schedule_performance(&mut self, ctx: &mut TickContext) {
        let Some(performer) = self.performer.as_deref_mut() else {
            ctx.alert(
                Severity::Info,
                STEP_SCHEDULE,
                "tick complete (no performer attached; performance no-op)",
            );
            return;
        };

        match performer.step(ctx.tick_id, ctx.delta_time, &ctx.domain_views) {
            Ok(tasks) => {
                ctx.performance_tasks = tasks;
                if let Err(err) = self
                    .sink
                    .schedule_performance(ctx.tick_id, &ctx.performance_tasks)
                {
                    ctx.alert(
                        Severity::Error,
                        STEP_SCHEDULE,
                        format!("performance scheduling failed: {err}"),
                    );
                } else {
                    ctx.alert(
                        Severity::Info,
                        STEP_SCHEDULE,
                        format!(
                            "tick complete (performer scheduled {} tasks)",
                            ctx.performance_tasks.len()
                        ),
                    );
                }
            }
            Err(err) => ctx.alert(
                Severity::Error,
                STEP_SCHEDULE,
                format!("performer step failed: {err}"),
            ),
        }
    }

    /// Stamps the chain hash on the output snapshot, appends it to the
    /// anchor store, and installs it as current.
    fn commit(&mut self, ctx: &mut TickContext) -> Result<(), Breach> {
        let Some(mut out) = ctx.snapshot_out.take() else {
            return Ok(());
        };
        out.hash32 = Some(self.anchor_store.compute_hash(&out));
        if let Err(err) = self.anchor_store.append_snapshot(out.clone()) {
            // Keep the uncommitted candidate on the context for the audit
            // trail; the previous snapshot remains authoritative.
            ctx.snapshot_out = Some(out);
            return Err(Breach::external(err));
        }
        ctx.snapshot_out = Some(out.clone());
        self.current_snapshot = out;
        Ok(())
    }

    /// Two-tier rollback: replay recorded inverses when the timeline is
    /// intact and the breach fell inside the mutation window, otherwise
    /// restore the last immutable anchor.
    fn rollback(&mut self, ctx: &mut TickContext) {
        let step = ctx.breach_step.unwrap_or(0);
        ctx.timeline_hash_ok = self.anchor_store.timeline_hash_ok();

        let mut fast = ctx.timeline_hash_ok
            && FAST_ROLLBACK_WINDOW.contains(&step)
            && !ctx.inverse_deltas.is_empty();

        if fast {
            let mut state = self.current_snapshot.state.clone();
            let mut failure: Option<String> = None;
            for inverse in ctx.inverse_deltas.iter().rev() {
                if let Err(err) = self.kernel.apply(&mut state, inverse) {
                    failure = Some(format!(
                        "fast-path rollback failed applying inverse {}: {err}; falling back to anchor restore",
                        inverse.id
                    ));
                    break;
                }
            }
            if let Some(message) = failure {
                ctx.alert(Severity::Critical, step, message);
                fast = false;
            } else if !self.kernel.validate(&state) {
                ctx.alert(
                    Severity::Critical,
                    step,
                    "fast-path rollback validation failed; falling back to anchor restore",
                );
                fast = false;
            } else {
                let prior = &self.current_snapshot;
                self.current_snapshot = Snapshot {
                    id: prior.id.clone(),
                    tick: prior.tick,
                    state,
                    hash32: prior.hash32,
                    anchor_kind: prior.anchor_kind,
                };
                ctx.alert(
                    Severity::Info,
                    step,
                    "fast-path rollback applied via inverse deltas",
                );
            }
        }

        if !fast {
            match self.anchor_store.load_last_immutable_anchor() {
                Ok(anchor) => {
                    self.current_snapshot = anchor;
                    ctx.alert(
                        Severity::Info,
                        step,
                        "slow-path rollback: restored last immutable anchor",
                    );
                }
                Err(err) => ctx.alert(
                    Severity::Critical,
                    step,
                    format!("slow-path rollback unavailable: {err}; retaining current snapshot"),
                ),
            }
        }
    }
}

fn mark_breach(ctx: &mut TickContext, breach: &Breach) {
    ctx.breached = true;
    ctx.breach_step = breach.step;
    ctx.alert(
        Severity::Critical,
        breach.step.unwrap_or(0),
        breach.kind.to_string(),
    );
}

fn unix_ts() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
