#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use common::{
    adjust_delta, caller_views, current_value, demo_runtime, FailingHydrator, FailingPerformer,
    FailingSink, ViewCountPerformer,
};
use weft_core::{Severity, STEP_HYDRATE, STEP_SCHEDULE};

#[test]
fn hydration_failure_is_logged_and_the_tick_commits() {
    let mut runtime = demo_runtime().with_hydrator(Box::new(FailingHydrator));

    let views = caller_views(&[("camera_view", b"pan")]);
    let ctx = runtime.run_tick(vec![adjust_delta("d1", 1.0, 6)], Some(views), Some(0.0));

    assert!(!ctx.breached);
    assert_eq!(current_value(&runtime), 6);
    // The caller-supplied views survive untouched.
    assert!(ctx.domain_views.get("camera_view").is_some());
    assert!(ctx
        .alerts_at(Severity::Error)
        .any(|a| a.step == STEP_HYDRATE && a.message.contains("hydration failed")));
}

#[test]
fn performer_failure_is_logged_and_the_tick_commits() {
    let mut runtime = demo_runtime().with_performer(Box::new(FailingPerformer));

    let ctx = runtime.run_tick(vec![adjust_delta("d1", 1.0, 2)], None, Some(0.0));

    assert!(!ctx.breached);
    assert!(ctx.performance_tasks.is_empty());
    assert_eq!(current_value(&runtime), 2);
    assert!(ctx
        .alerts_at(Severity::Error)
        .any(|a| a.step == STEP_SCHEDULE && a.message.contains("performer step failed")));
}

#[test]
fn sink_failure_is_logged_and_tasks_stay_on_the_context() {
    let mut runtime = demo_runtime()
        .with_performer(Box::new(ViewCountPerformer))
        .with_sink(Box::new(FailingSink));

    let views = caller_views(&[("narrative_view", b"line")]);
    let ctx = runtime.run_tick(vec![adjust_delta("d1", 1.0, 1)], Some(views), Some(0.0));

    assert!(!ctx.breached);
    assert_eq!(ctx.performance_tasks.len(), 1);
    assert_eq!(current_value(&runtime), 1);
    assert!(ctx
        .alerts_at(Severity::Error)
        .any(|a| a.step == STEP_SCHEDULE && a.message.contains("performance scheduling failed")));
}
