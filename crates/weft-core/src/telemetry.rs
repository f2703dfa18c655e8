#![allow(missing_docs)]

use crate::context::Alert;

#[cfg(feature = "telemetry")]
#[derive(serde::Serialize)]
struct Event<'a> {
    timestamp_micros: u128,
    tick: u64,
    step: u8,
    severity: &'a str,
    message: &'a str,
}

#[cfg(feature = "telemetry")]
fn ts_micros() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros())
        .unwrap_or_default()
}

#[cfg(feature = "telemetry")]
pub(crate) fn emit(alert: &Alert) {
    let ev = Event {
        timestamp_micros: ts_micros(),
        tick: alert.tick,
        step: alert.step,
        severity: alert.severity.as_str(),
        message: &alert.message,
    };
    // Intentionally ignore errors; stdout is best-effort in dev builds.
    let _ = serde_json::to_writer(std::io::stdout(), &ev);
    let _ = std::io::Write::write_all(&mut std::io::stdout(), b"\n");
}

#[cfg(not(feature = "telemetry"))]
pub(crate) fn emit(_alert: &Alert) {}
