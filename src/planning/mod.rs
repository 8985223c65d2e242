//! Turn planning: areas, route search, objectives and allocation

pub mod allocation;
pub mod area;
pub mod clade;
pub mod cost;
pub mod garrison;
pub mod generators;
pub mod merge;
pub mod objective;
pub mod projection;
pub mod route;
pub mod search;
pub mod session;

pub use allocation::{AllocationOutcome, Allocator, Commitments, Placement};
pub use area::{compute_smart_area, compute_smart_areas, Area};
pub use garrison::GarrisonMap;
pub use objective::{Objective, ObjectiveKind, ObjectiveTarget};
pub use route::{Route, RoutePlan};
pub use session::PlanningSession;
