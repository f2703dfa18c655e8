//! Performer step contract and the performance scheduling sink.
use bytes::Bytes;
use thiserror::Error;

use crate::views::DomainViews;

/// Presentation channel a performance task targets.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskKind {
    /// Visual rendering work.
    Render,
    /// Music and sound effects.
    Audio,
    /// Spoken or written dialogue.
    Dialogue,
    /// Skeletal or procedural animation.
    Animation,
    /// Camera moves and framing.
    Camera,
    /// Particles and other transient effects.
    Fx,
}

/// One unit of presentation work emitted by the performer for a tick.
///
/// The payload is opaque to the engine; only the receiving platform layer
/// interprets it.
#[derive(Clone, PartialEq, Debug)]
pub struct PerformanceTask {
    /// Stable identifier of the task.
    pub id: String,
    /// Tick the task was produced for.
    pub tick_id: u64,
    /// Scene-local time the task starts at, in seconds.
    pub scene_time: f64,
    /// Presentation channel.
    pub kind: TaskKind,
    /// Opaque task payload.
    pub payload: Bytes,
    /// Scheduling priority; higher runs first within a channel.
    pub priority: i32,
}

/// Errors from the performer layer; non-fatal to the tick.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PerformError {
    /// The performer step itself failed.
    #[error("performer step failed: {0}")]
    Step(String),
    /// The scheduling sink refused the tick's tasks.
    #[error("performance sink rejected tick {0}: {1}")]
    Sink(u64, String),
}

/// Turns hydrated domain views into presentation tasks, one step per tick.
pub trait PerformerHook {
    /// Produces the tick's performance tasks from the merged views.
    ///
    /// # Errors
    /// A [`PerformError`] is logged as an alert; the tick proceeds.
    fn step(
        &mut self,
        tick_id: u64,
        delta_time: f64,
        views: &DomainViews,
    ) -> Result<Vec<PerformanceTask>, PerformError>;
}

/// Receives the tick's scheduled tasks for execution by the platform.
pub trait PerformanceSink {
    /// Forwards tasks for the given tick.
    ///
    /// # Errors
    /// A [`PerformError`] is logged as an alert; the tick proceeds.
    fn schedule_performance(
        &mut self,
        tick_id: u64,
        tasks: &[PerformanceTask],
    ) -> Result<(), PerformError>;
}

/// Safe default sink: discards every task.
///
/// Lets the runtime run with no renderer or audio attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPerformanceSink;

impl PerformanceSink for NoopPerformanceSink {
    fn schedule_performance(
        &mut self,
        _tick_id: u64,
        _tasks: &[PerformanceTask],
    ) -> Result<(), PerformError> {
        Ok(())
    }
}
