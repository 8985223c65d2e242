//! Objective records
//!
//! An objective is a costed, scored candidate action for the turn. Each
//! kind carries its own typed data; all of them are rebuilt from their
//! `ObjectiveTarget` whenever the projection changes.

use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::{PlayerId, RegionId, TerritoryId};
use crate::planning::route::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveKind {
    Denial,
    Takeover,
    Expansion,
    Elimination,
}

impl fmt::Display for ObjectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectiveKind::Denial => "denial",
            ObjectiveKind::Takeover => "takeover",
            ObjectiveKind::Expansion => "expansion",
            ObjectiveKind::Elimination => "elimination",
        };
        f.write_str(name)
    }
}

/// What an objective is aimed at; enough to regenerate it from scratch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveTarget {
    Denial(RegionId),
    /// Index into the session's smart areas
    Takeover(usize),
    Expansion,
    Elimination(PlayerId),
}

impl ObjectiveTarget {
    pub fn kind(&self) -> ObjectiveKind {
        match self {
            ObjectiveTarget::Denial(_) => ObjectiveKind::Denial,
            ObjectiveTarget::Takeover(_) => ObjectiveKind::Takeover,
            ObjectiveTarget::Expansion => ObjectiveKind::Expansion,
            ObjectiveTarget::Elimination(_) => ObjectiveKind::Elimination,
        }
    }
}

/// Break a hostile player's hold on a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenialObjective {
    pub region: RegionId,
    pub owner: PlayerId,
    pub route: Route,
    pub cost: u32,
    pub score: f64,
    pub summary: String,
}

/// Conquer and hold a whole smart area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeoverObjective {
    pub area: usize,
    /// Territories still to conquer, entry hops included
    pub hostile: BTreeSet<TerritoryId>,
    /// Synthetic entry route when nothing inside the area is ours yet
    pub entry: Option<Route>,
    /// Armies missing from border garrisons
    pub shortfall: u32,
    pub cost: u32,
    pub score: f64,
    pub summary: String,
}

/// Best greedy land-grab walk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionObjective {
    pub route: Route,
    pub cost: u32,
    pub score: f64,
    pub summary: String,
}

/// Wipe out a weak player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliminationObjective {
    pub player: PlayerId,
    /// Contiguous groups of the player's territories
    pub clusters: Vec<BTreeSet<TerritoryId>>,
    pub cost: u32,
    pub score: f64,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Objective {
    Denial(DenialObjective),
    Takeover(TakeoverObjective),
    Expansion(ExpansionObjective),
    Elimination(EliminationObjective),
}

impl Objective {
    pub fn kind(&self) -> ObjectiveKind {
        self.target().kind()
    }

    pub fn target(&self) -> ObjectiveTarget {
        match self {
            Objective::Denial(o) => ObjectiveTarget::Denial(o.region),
            Objective::Takeover(o) => ObjectiveTarget::Takeover(o.area),
            Objective::Expansion(_) => ObjectiveTarget::Expansion,
            Objective::Elimination(o) => ObjectiveTarget::Elimination(o.player),
        }
    }

    pub fn cost(&self) -> u32 {
        match self {
            Objective::Denial(o) => o.cost,
            Objective::Takeover(o) => o.cost,
            Objective::Expansion(o) => o.cost,
            Objective::Elimination(o) => o.cost,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            Objective::Denial(o) => o.score,
            Objective::Takeover(o) => o.score,
            Objective::Expansion(o) => o.score,
            Objective::Elimination(o) => o.score,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            Objective::Denial(o) => &o.summary,
            Objective::Takeover(o) => &o.summary,
            Objective::Expansion(o) => &o.summary,
            Objective::Elimination(o) => &o.summary,
        }
    }
}

/// Sort best first; equal scores keep generation order
pub fn sort_by_score(objectives: &mut [Objective]) {
    objectives.sort_by_key(|o| Reverse(OrderedFloat(o.score())));
}

/// Score shared by every kind: value gained per army spent
pub fn value_per_cost(scale: f64, value: f64, cost: u32) -> f64 {
    scale * value / cost.max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expansion(score: f64) -> Objective {
        Objective::Expansion(ExpansionObjective {
            route: Route::single(TerritoryId(0)),
            cost: 1,
            score,
            summary: String::new(),
        })
    }

    fn denial(region: u32, score: f64) -> Objective {
        Objective::Denial(DenialObjective {
            region: RegionId(region),
            owner: PlayerId(1),
            route: Route::single(TerritoryId(0)),
            cost: 1,
            score,
            summary: String::new(),
        })
    }

    #[test]
    fn test_sort_is_descending_and_stable() {
        let mut objectives = vec![denial(0, 1.0), expansion(3.0), denial(1, 3.0), denial(2, 2.0)];
        sort_by_score(&mut objectives);
        let targets: Vec<ObjectiveTarget> = objectives.iter().map(|o| o.target()).collect();
        assert_eq!(
            targets,
            vec![
                ObjectiveTarget::Expansion,
                ObjectiveTarget::Denial(RegionId(1)),
                ObjectiveTarget::Denial(RegionId(2)),
                ObjectiveTarget::Denial(RegionId(0)),
            ]
        );
    }

    #[test]
    fn test_zero_cost_is_clamped() {
        assert_eq!(value_per_cost(10.0, 2.0, 0), 20.0);
        assert_eq!(value_per_cost(10.0, 2.0, 4), 5.0);
    }
}
