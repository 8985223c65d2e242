//! Read-only view of the host's board
//!
//! The planner never owns the board. Every phase re-reads it through this
//! trait, so hosts can back it with whatever game state they keep.

use crate::core::types::{PlayerId, RegionId, TerritoryId, Turn};

/// Queryable board state supplied by the host
///
/// Territory, region and player ids are dense: territory ids run from zero
/// to `territory_count() - 1`, and likewise for regions and players.
pub trait BoardView {
    fn territory_count(&self) -> usize;

    /// Current owner, `None` for unclaimed territory
    fn owner(&self, territory: TerritoryId) -> Option<PlayerId>;

    fn armies(&self, territory: TerritoryId) -> u32;

    fn region_of(&self, territory: TerritoryId) -> RegionId;

    /// Territories this one can attack or fortify into
    fn neighbors(&self, territory: TerritoryId) -> &[TerritoryId];

    /// Territories that can attack or fortify into this one
    fn incoming(&self, territory: TerritoryId) -> &[TerritoryId];

    fn territory_name(&self, territory: TerritoryId) -> &str;

    fn region_count(&self) -> usize;

    fn region_bonus(&self, region: RegionId) -> u32;

    fn region_members(&self, region: RegionId) -> &[TerritoryId];

    fn player_count(&self) -> usize;

    fn income(&self, player: PlayerId) -> u32;

    fn cards(&self, player: PlayerId) -> u32;

    fn is_alive(&self, player: PlayerId) -> bool;

    /// Whether `a` treats `b` as non-hostile. A player is not its own ally.
    fn is_allied(&self, a: PlayerId, b: PlayerId) -> bool;

    /// Armies the next set of cards would cash for, if the host knows it
    fn next_card_cash(&self) -> Option<u32>;

    fn turn(&self) -> Turn;

    // === Provided queries ===

    fn territory_ids(&self) -> TerritoryIds {
        TerritoryIds {
            next: 0,
            end: self.territory_count() as u32,
        }
    }

    fn region_ids(&self) -> Vec<RegionId> {
        (0..self.region_count() as u32).map(RegionId).collect()
    }

    fn player_ids(&self) -> Vec<PlayerId> {
        (0..self.player_count() as u32).map(PlayerId).collect()
    }

    fn region_size(&self, region: RegionId) -> usize {
        self.region_members(region).len()
    }

    /// The single player owning every territory of `region`, if any
    fn region_owner(&self, region: RegionId) -> Option<PlayerId> {
        let members = self.region_members(region);
        let first = self.owner(*members.first()?)?;
        members
            .iter()
            .all(|&t| self.owner(t) == Some(first))
            .then_some(first)
    }

    fn owned_by(&self, player: PlayerId) -> Vec<TerritoryId> {
        self.territory_ids()
            .filter(|&t| self.owner(t) == Some(player))
            .collect()
    }

    fn total_armies(&self, player: PlayerId) -> u32 {
        self.territory_ids()
            .filter(|&t| self.owner(t) == Some(player))
            .map(|t| self.armies(t))
            .sum()
    }

    /// Whether `owner` is neither `player` nor one of its allies
    fn is_hostile_owner(&self, player: PlayerId, owner: Option<PlayerId>) -> bool {
        match owner {
            Some(o) => o != player && !self.is_allied(player, o),
            None => true,
        }
    }
}

/// Iterator over every territory id of a board
#[derive(Debug, Clone)]
pub struct TerritoryIds {
    next: u32,
    end: u32,
}

impl Iterator for TerritoryIds {
    type Item = TerritoryId;

    fn next(&mut self) -> Option<TerritoryId> {
        if self.next >= self.end {
            return None;
        }
        let id = TerritoryId(self.next);
        self.next += 1;
        Some(id)
    }
}
