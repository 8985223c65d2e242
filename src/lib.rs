//! Conquest Planner - objective planning and army allocation for
//! territory-control strategy games

pub mod board;
pub mod core;
pub mod execution;
pub mod host;
pub mod planning;
pub mod sim;

pub use crate::board::{Board, BoardView};
pub use crate::core::{PlannerConfig, PlannerError, PlayerId, RegionId, Result, TerritoryId};
pub use crate::host::{play_turn, AttackOutcome, GameHost};
pub use crate::planning::PlanningSession;
