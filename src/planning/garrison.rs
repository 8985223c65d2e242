//! Boundary garrisons
//!
//! Border territories of an area we mean to hold keep a reserve of armies.
//! The ideal size comes from a bounded threat search over the territories
//! behind the border; the reserved size grows toward it by at most a fixed
//! fraction of income per turn.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::board::view::BoardView;
use crate::core::config::PlannerConfig;
use crate::core::types::{PlayerId, TerritoryId};
use crate::planning::cost::card_value;

/// Reserved and ideal garrison sizes per border territory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GarrisonMap {
    reserved: BTreeMap<TerritoryId, u32>,
    ideal: BTreeMap<TerritoryId, u32>,
    /// Borders already grown this turn
    #[serde(skip)]
    grown: BTreeSet<TerritoryId>,
}

impl GarrisonMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserved(&self, territory: TerritoryId) -> u32 {
        self.reserved.get(&territory).copied().unwrap_or(0)
    }

    pub fn ideal(&self, territory: TerritoryId) -> u32 {
        self.ideal.get(&territory).copied().unwrap_or(0)
    }

    pub fn contains(&self, territory: TerritoryId) -> bool {
        self.reserved.contains_key(&territory)
    }

    pub fn territories(&self) -> impl Iterator<Item = TerritoryId> + '_ {
        self.reserved.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.reserved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reserved.is_empty()
    }

    /// Garrison the border could hold after this turn's growth
    pub fn capped(&self, territory: TerritoryId, ideal: u32, growth: u32) -> u32 {
        if self.grown.contains(&territory) {
            return self.reserved(territory).min(ideal);
        }
        ideal.min(self.reserved(territory) + growth)
    }

    /// Record a border's ideal and grow its reserve toward it
    ///
    /// Growth applies once per turn; later calls in the same turn only
    /// refresh the ideal.
    pub fn record(&mut self, territory: TerritoryId, ideal: u32, growth: u32) -> u32 {
        let reserved = self.capped(territory, ideal, growth);
        self.grown.insert(territory);
        self.reserved.insert(territory, reserved);
        self.ideal.insert(territory, ideal);
        reserved
    }

    /// Start a new turn
    ///
    /// Territories we lost are dropped, and reserves snap down to the armies
    /// actually present.
    pub fn reset_for_turn<B: BoardView>(&mut self, board: &B, player: PlayerId) {
        self.reserved.retain(|&t, _| board.owner(t) == Some(player));
        self.ideal.retain(|&t, _| board.owner(t) == Some(player));
        for (&t, reserved) in self.reserved.iter_mut() {
            *reserved = (*reserved).min(board.armies(t));
        }
        self.grown.clear();
    }
}

/// Per-turn reserve growth allowed by `player`'s income
pub fn garrison_growth<B: BoardView>(board: &B, player: PlayerId, config: &PlannerConfig) -> u32 {
    (board.income(player) as f64 * config.garrison_income_fraction).floor() as u32
}

/// Ideal garrison for `border` of `area`
pub fn ideal_strength<B: BoardView>(
    board: &B,
    border: TerritoryId,
    area: &BTreeSet<TerritoryId>,
    player: PlayerId,
    config: &PlannerConfig,
) -> u32 {
    let threat = threat(board, border, area, player, config);
    (config.garrison_multiplier * threat).round() as u32
}

/// Largest threat any single path of hostile territories poses to `border`
///
/// The search walks incoming links outside `area` up to the configured
/// depth. Each owner counts once per path, at the first territory of theirs
/// met; a hostile owner contributes its armies there plus its income and
/// card value, less the armies already crossed on the way and the distance.
pub fn threat<B: BoardView>(
    board: &B,
    border: TerritoryId,
    area: &BTreeSet<TerritoryId>,
    player: PlayerId,
    config: &PlannerConfig,
) -> f64 {
    let cash = board.next_card_cash().unwrap_or(config.default_card_cash);
    let search = ThreatSearch {
        board,
        area,
        player,
        max_depth: config.threat_depth,
        cash,
    };
    let counted: BTreeSet<PlayerId> = [player].into_iter().collect();
    search.walk(border, 0, vec![border], counted, 0)
}

struct ThreatSearch<'a, B: BoardView> {
    board: &'a B,
    area: &'a BTreeSet<TerritoryId>,
    player: PlayerId,
    max_depth: usize,
    cash: u32,
}

impl<B: BoardView> ThreatSearch<'_, B> {
    fn walk(
        &self,
        territory: TerritoryId,
        depth: usize,
        path: Vec<TerritoryId>,
        mut counted: BTreeSet<PlayerId>,
        crossed: u32,
    ) -> f64 {
        let mut contribution = 0.0;
        let mut crossed = crossed;

        if depth > 0 {
            if let Some(owner) = self.board.owner(territory) {
                if counted.insert(owner) && !self.board.is_allied(self.player, owner) {
                    let strength = self.board.armies(territory) as f64
                        + self.board.income(owner) as f64
                        + card_value(self.board.cards(owner), self.cash);
                    contribution = (strength - crossed as f64 - depth as f64).max(0.0);
                }
            }
            crossed += self.board.armies(territory);
        }

        if depth >= self.max_depth {
            return contribution;
        }

        let deepest = self
            .board
            .incoming(territory)
            .iter()
            .copied()
            .filter(|p| !self.area.contains(p) && !path.contains(p))
            .map(|p| {
                let mut branch = path.clone();
                branch.push(p);
                self.walk(p, depth + 1, branch, counted.clone(), crossed)
            })
            .fold(0.0, f64::max);

        contribution + deepest
    }
}
