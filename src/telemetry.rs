//! One-way telemetry emission
//!
//! After each published tick the engine hands the snapshot and event list
//! to a sink. The sink is optional: the engine is fully functional with the
//! collaborator absent, and a sink can never fail the tick.

use crate::sim::events::EngineEvent;
use crate::sim::snapshot::TickSnapshot;

/// Receiver for per-tick output
pub trait TelemetrySink: Send + Sync {
    fn on_tick(&self, snapshot: &TickSnapshot, events: &[EngineEvent]);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn on_tick(&self, _snapshot: &TickSnapshot, _events: &[EngineEvent]) {}
}

/// Logs a one-line tick summary through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn on_tick(&self, snapshot: &TickSnapshot, events: &[EngineEvent]) {
        tracing::info!(
            tick = snapshot.tick,
            zones = snapshot.rankings.len(),
            assignments = snapshot.manifest.len(),
            events = events.len(),
            "tick published"
        );
    }
}
