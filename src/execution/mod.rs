//! Turn execution: attack driving and post-combat redistribution

pub mod driver;
pub mod redistribution;

pub use driver::{AttackOrder, Driver};
pub use redistribution::{plan_redistribution, Transfer};
