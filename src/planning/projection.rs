//! Projected ownership
//!
//! Planning treats every territory the current plan intends to conquer as
//! already owned, so later objectives neither re-target it nor count it as
//! an obstacle. Armies placed earlier in the same allocation pass are
//! likewise counted as present.

use std::collections::{BTreeMap, BTreeSet};

use crate::board::view::BoardView;
use crate::core::types::{PlayerId, TerritoryId};

/// Board as it will look if the current plan succeeds
pub struct Projection<'a, B: BoardView> {
    pub board: &'a B,
    pub player: PlayerId,
    claimed: &'a BTreeSet<TerritoryId>,
    placed: &'a BTreeMap<TerritoryId, u32>,
}

impl<'a, B: BoardView> Projection<'a, B> {
    pub fn new(
        board: &'a B,
        player: PlayerId,
        claimed: &'a BTreeSet<TerritoryId>,
        placed: &'a BTreeMap<TerritoryId, u32>,
    ) -> Self {
        Self {
            board,
            player,
            claimed,
            placed,
        }
    }

    /// Owner once the plan has played out
    pub fn owner(&self, territory: TerritoryId) -> Option<PlayerId> {
        if self.claimed.contains(&territory) {
            Some(self.player)
        } else {
            self.board.owner(territory)
        }
    }

    pub fn is_mine(&self, territory: TerritoryId) -> bool {
        self.owner(territory) == Some(self.player)
    }

    /// Owned on the live board, ignoring the plan
    pub fn is_owned_now(&self, territory: TerritoryId) -> bool {
        self.board.owner(territory) == Some(self.player)
    }

    /// Projected owner is an enemy or nobody
    pub fn is_hostile(&self, territory: TerritoryId) -> bool {
        self.board.is_hostile_owner(self.player, self.owner(territory))
    }

    /// Armies present now plus those placed earlier this pass
    pub fn armies(&self, territory: TerritoryId) -> u32 {
        self.board.armies(territory) + self.placed.get(&territory).copied().unwrap_or(0)
    }

    pub fn placed(&self, territory: TerritoryId) -> u32 {
        self.placed.get(&territory).copied().unwrap_or(0)
    }

    pub fn claimed(&self) -> &BTreeSet<TerritoryId> {
        self.claimed
    }

    /// Income of every alive player that is neither us nor an ally
    pub fn hostile_income(&self) -> f64 {
        self.board
            .player_ids()
            .into_iter()
            .filter(|&p| p != self.player && self.board.is_alive(p))
            .filter(|&p| !self.board.is_allied(self.player, p))
            .map(|p| self.board.income(p) as f64)
            .sum()
    }

    /// Income of every alive player other than us
    pub fn others_income(&self) -> f64 {
        self.board
            .player_ids()
            .into_iter()
            .filter(|&p| p != self.player && self.board.is_alive(p))
            .map(|p| self.board.income(p) as f64)
            .sum()
    }

    /// Fraction of hostile income earned by `owner` (zero for nobody)
    ///
    /// Allies are measured against everyone else's income instead, since
    /// they are excluded from the hostile total.
    pub fn income_share(&self, owner: Option<PlayerId>) -> f64 {
        let Some(owner) = owner else {
            return 0.0;
        };
        if owner == self.player {
            return 0.0;
        }
        let total = if self.board.is_allied(self.player, owner) {
            self.others_income()
        } else {
            self.hostile_income()
        };
        if total <= 0.0 {
            return 0.0;
        }
        self.board.income(owner) as f64 / total
    }
}
