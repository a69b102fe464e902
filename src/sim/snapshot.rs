//! Published tick snapshots
//!
//! The snapshot is the engine's only output surface: ranked zones, the
//! assignment manifest, the compliance report, and the full cell/zone state
//! needed to restore or replay. Snapshots are immutable once published and
//! versioned so any persisted form round-trips losslessly.

use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::types::{CellId, Tick, ZoneId};
use crate::dispatch::assigner::Assignment;
use crate::grid::cell::Cell;
use crate::grid::patch::Zone;

/// Bump when the serialized layout changes
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// One entry of the ranked zone list
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneRank {
    pub zone: ZoneId,
    pub score: f64,
}

/// One row of the defensible-space compliance report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRow {
    pub cell: CellId,
    pub distance_to_structure_m: f64,
    pub required_max_height_cm: f64,
    pub observed_height_cm: f64,
    pub compliant: bool,
}

/// Immutable result of one engine tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub version: u32,
    pub tick: Tick,
    /// Zones in dispatch order (descending score, ties by ascending id)
    pub rankings: Vec<ZoneRank>,
    /// Assignment manifest in planning order
    pub manifest: Vec<Assignment>,
    /// Cells inside a defensible ring, flagged when grass exceeds the limit
    pub compliance: Vec<ComplianceRow>,
    /// Cell state, ascending id
    pub cells: Vec<Cell>,
    /// Zone state, ascending id
    pub zones: Vec<Zone>,
}

impl TickSnapshot {
    /// Snapshot published before the first tick runs
    pub fn empty() -> Self {
        Self {
            version: SNAPSHOT_FORMAT_VERSION,
            tick: 0,
            rankings: Vec::new(),
            manifest: Vec::new(),
            compliance: Vec::new(),
            cells: Vec::new(),
            zones: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reload a persisted snapshot, rejecting unknown format versions
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_FORMAT_VERSION {
            return Err(EngineError::CorruptSnapshot(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_FORMAT_VERSION
            )));
        }
        Ok(snapshot)
    }
}
