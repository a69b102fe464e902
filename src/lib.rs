//! Firebreak - Grid Priority & Dispatch Engine
//!
//! Converts per-cell environmental signals into a deterministic wildfire
//! risk index, aggregates cells into zones, ranks zones by a time-varying
//! priority score, and assigns a finite pool of delivery assets to the
//! highest-priority zones under capacity, trip, and energy constraints,
//! recomputed every simulation tick.

pub mod core;
pub mod dispatch;
pub mod grid;
pub mod risk;
pub mod sim;
pub mod telemetry;
