pub mod cell;
pub mod patch;
pub mod store;

pub use cell::{Cell, CellSample};
pub use patch::{apply_index_deltas, recompute_zone_aggregate, Zone};
pub use store::GridStore;
