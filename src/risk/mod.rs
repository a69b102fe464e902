pub mod band;
pub mod index;

pub use band::{required_max_height_cm, BandRule, RiskBand};
pub use index::{recompute_indices, risk_index, IndexDelta, RiskWeights, ScoringStrategy};
