//! Disturbances consumed by the engine and events it emits
//!
//! Disturbance events arrive from an external feed; engine events are
//! returned by each tick for operator display and telemetry.

use serde::{Deserialize, Serialize};

use crate::core::types::{AssetId, CellId, Tick, ZoneId};

/// Kind of disturbance that resets a zone's recovery count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisturbanceKind {
    Fire,
    Mowing,
}

/// One record from the external disturbance feed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisturbanceEvent {
    pub zone: ZoneId,
    pub kind: DisturbanceKind,
    pub tick: Tick,
}

/// Events generated during one engine tick
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A zone received deliveries this tick
    ZoneServiced {
        zone: ZoneId,
        delivered_liters: f64,
        trips: u32,
    },
    /// A zone's remaining demand found no qualifying asset
    ZoneUnmet { zone: ZoneId, unmet_liters: f64 },
    /// An asset aborted its mission to save the return leg
    AssetAborted { asset: AssetId, zone: ZoneId },
    /// A cell's signals went out of range and it sat out the tick
    CellInvalidated { cell: CellId },
    /// A disturbance reset a zone's recovery count
    DisturbanceApplied { zone: ZoneId, kind: DisturbanceKind },
}
