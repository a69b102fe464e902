pub mod asset;
pub mod assigner;
pub mod energy;
pub mod scheduler;

pub use asset::{Asset, AssetKind, AssetPool, AssetStatus, MissionOutcome};
pub use assigner::{plan_assignments, required_trips, Assignment, AssignmentStatus};
pub use energy::{is_feasible, mission_energy_j, return_cost_j, MissionProfile};
pub use scheduler::{priority_score, PriorityScheduler};
