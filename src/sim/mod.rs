//! Simulated games: a dice-rolling host and planner-driven skirmishes

pub mod host;
pub mod skirmish;

pub use host::{card_cash_value, SimHost};
pub use skirmish::{Skirmish, SkirmishConfig, SkirmishOutput, TurnReport};
