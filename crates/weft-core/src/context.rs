//! Per-tick execution context and the alert log it carries.
use crate::delta::Delta;
use crate::performer::PerformanceTask;
use crate::snapshot::Snapshot;
use crate::telemetry;
use crate::views::DomainViews;

/// Pipeline step: tick initialization and continuity check.
pub const STEP_INIT: u8 = 1;
/// Pipeline step: delta queue ingestion (fencing + structural validation).
pub const STEP_INGEST: u8 = 2;
/// Pipeline step: deterministic temporal ordering.
pub const STEP_ORDER: u8 = 3;
/// Pipeline step: delta application and inverse recording.
pub const STEP_APPLY: u8 = 6;
/// Pipeline step: domain-view hydration from the post-mutation state.
pub const STEP_HYDRATE: u8 = 10;
/// Pipeline step: performance pass scheduling.
pub const STEP_SCHEDULE: u8 = 11;

/// Severity attached to an alert entry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    /// Informational progress marker.
    Info,
    /// Local, recovered anomaly (rejection, fencing).
    Warning,
    /// Non-fatal collaborator failure (hydration, scheduling).
    Error,
    /// Breach-class failure; rollback will run before the tick returns.
    Critical,
}

impl Severity {
    /// Stable lowercase label, used by the telemetry emitter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

/// One entry of the tick's audit trail.
#[derive(Clone, PartialEq, Debug)]
pub struct Alert {
    /// Severity class.
    pub severity: Severity,
    /// Pipeline step the alert was raised from; 0 when outside any
    /// numbered step.
    pub step: u8,
    /// Human-readable description.
    pub message: String,
    /// Tick the alert belongs to.
    pub tick: u64,
    /// Wall-clock timestamp of the tick, in seconds since the Unix epoch.
    pub ts: f64,
}

/// The working record of one tick's execution.
///
/// Created fresh at tick start, exclusively owned by the runtime while the
/// tick runs, and returned to the caller read-only afterwards. A context
/// never outlives the tick it was created for; its `alerts` and flags are
/// the tick's audit trail.
#[derive(Debug)]
pub struct TickContext {
    /// Monotonic tick number, starting at 1.
    pub tick_id: u64,
    /// Wall-clock timestamp captured at tick start.
    pub wall_clock_ts: f64,
    /// Seconds of simulated time covered by this tick.
    pub delta_time: f64,
    /// Snapshot the tick started from.
    pub snapshot_in: Snapshot,
    /// Snapshot produced by mutation; `None` until step 6 succeeds, and
    /// committed only when the tick finishes breach-free.
    pub snapshot_out: Option<Snapshot>,
    /// Deltas surviving ingestion (fenced, validated, normalized).
    pub deltas_in: Vec<Delta>,
    /// Deltas in deterministic temporal order.
    pub deltas_ordered: Vec<Delta>,
    /// Deltas accepted for application this tick.
    pub deltas_accepted: Vec<Delta>,
    /// Deltas rejected during structural validation.
    pub deltas_rejected: Vec<Delta>,
    /// Compensating deltas recorded during application; `inverse_deltas[i]`
    /// undoes `deltas_accepted[i]`.
    pub inverse_deltas: Vec<Delta>,
    /// Audit trail for the tick.
    pub alerts: Vec<Alert>,
    /// True when excess deltas were fenced off to a later tick.
    pub fenced: bool,
    /// True when a breach was detected; rollback has run by the time the
    /// context is returned.
    pub breached: bool,
    /// Step the breach was detected at, when one occurred inside a
    /// numbered step.
    pub breach_step: Option<u8>,
    /// Result of the anchor store's timeline continuity check.
    pub timeline_hash_ok: bool,
    /// Domain views visible to the performer: caller-supplied, overlaid by
    /// views derived from the post-mutation state.
    pub domain_views: DomainViews,
    /// Tasks produced by the performer hook this tick.
    pub performance_tasks: Vec<PerformanceTask>,
}

impl TickContext {
    pub(crate) fn new(
        tick_id: u64,
        wall_clock_ts: f64,
        delta_time: f64,
        snapshot_in: Snapshot,
        domain_views: DomainViews,
    ) -> Self {
        Self {
            tick_id,
            wall_clock_ts,
            delta_time,
            snapshot_in,
            snapshot_out: None,
            deltas_in: Vec::new(),
            deltas_ordered: Vec::new(),
            deltas_accepted: Vec::new(),
            deltas_rejected: Vec::new(),
            inverse_deltas: Vec::new(),
            alerts: Vec::new(),
            fenced: false,
            breached: false,
            breach_step: None,
            timeline_hash_ok: true,
            domain_views,
            performance_tasks: Vec::new(),
        }
    }

    /// Appends an alert to the audit trail (and to the telemetry stream
    /// when that feature is enabled).
    pub(crate) fn alert(&mut self, severity: Severity, step: u8, message: impl Into<String>) {
        let alert = Alert {
            severity,
            step,
            message: message.into(),
            tick: self.tick_id,
            ts: self.wall_clock_ts,
        };
        telemetry::emit(&alert);
        self.alerts.push(alert);
    }

    /// Returns the alerts recorded at the given severity.
    pub fn alerts_at(&self, severity: Severity) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(move |a| a.severity == severity)
    }
}
