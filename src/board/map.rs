//! In-memory board
//!
//! A concrete `BoardView` used by the simulated host, the CLI and tests.
//! Hosts that already keep their own game state can implement `BoardView`
//! directly instead.

use serde::{Deserialize, Serialize};

use crate::board::view::BoardView;
use crate::core::types::{PlayerId, RegionId, TerritoryId, Turn};

/// A single territory on the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Territory {
    pub id: TerritoryId,
    pub name: String,
    pub region: RegionId,
    pub owner: Option<PlayerId>,
    pub armies: u32,
    pub neighbors: Vec<TerritoryId>,
    /// Derived from every other territory's `neighbors`
    pub incoming: Vec<TerritoryId>,
}

/// A bonus-granting group of territories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub bonus: u32,
    pub members: Vec<TerritoryId>,
}

/// Per-seat player state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub cards: u32,
    pub allies: Vec<PlayerId>,
    /// Fixed income reported instead of the derived one
    pub income_override: Option<u32>,
}

/// The whole board: territory graph, regions and players
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub territories: Vec<Territory>,
    pub regions: Vec<Region>,
    pub players: Vec<PlayerState>,
    pub turn: Turn,
    pub card_cash: Option<u32>,
}

impl Board {
    /// Assign a territory. Owned territories always hold at least one army.
    pub fn set_owner(&mut self, territory: TerritoryId, owner: Option<PlayerId>, armies: u32) {
        let t = &mut self.territories[territory.index()];
        t.owner = owner;
        t.armies = if owner.is_some() { armies.max(1) } else { armies };
    }

    pub fn set_armies(&mut self, territory: TerritoryId, armies: u32) {
        let t = &mut self.territories[territory.index()];
        t.armies = if t.owner.is_some() { armies.max(1) } else { armies };
    }

    pub fn add_armies(&mut self, territory: TerritoryId, amount: u32) {
        self.territories[territory.index()].armies += amount;
    }

    pub fn set_income(&mut self, player: PlayerId, income: u32) {
        self.players[player.index()].income_override = Some(income);
    }

    pub fn set_cards(&mut self, player: PlayerId, cards: u32) {
        self.players[player.index()].cards = cards;
    }

    /// Make two players mutual allies
    pub fn ally(&mut self, a: PlayerId, b: PlayerId) {
        if a == b {
            return;
        }
        if !self.players[a.index()].allies.contains(&b) {
            self.players[a.index()].allies.push(b);
        }
        if !self.players[b.index()].allies.contains(&a) {
            self.players[b.index()].allies.push(a);
        }
    }

    /// Seat a new player with no territories
    pub fn add_player(&mut self, name: &str) -> PlayerId {
        let id = PlayerId(self.players.len() as u32);
        self.players.push(PlayerState {
            id,
            name: name.to_string(),
            cards: 0,
            allies: Vec::new(),
            income_override: None,
        });
        id
    }

    /// Income derived from territory count and fully owned regions
    pub fn derived_income(&self, player: PlayerId) -> u32 {
        let owned = self
            .territories
            .iter()
            .filter(|t| t.owner == Some(player))
            .count() as u32;
        if owned == 0 {
            return 0;
        }
        let bonuses: u32 = self
            .regions
            .iter()
            .filter(|r| self.region_owner(r.id) == Some(player))
            .map(|r| r.bonus)
            .sum();
        (owned / 3).max(3) + bonuses
    }

    /// Find a territory by name
    pub fn territory_by_name(&self, name: &str) -> Option<TerritoryId> {
        self.territories.iter().find(|t| t.name == name).map(|t| t.id)
    }

    /// Recompute every territory's incoming list from the neighbor lists
    pub fn rebuild_incoming(&mut self) {
        for t in &mut self.territories {
            t.incoming.clear();
        }
        let edges: Vec<(TerritoryId, TerritoryId)> = self
            .territories
            .iter()
            .flat_map(|t| t.neighbors.iter().map(move |&n| (t.id, n)))
            .collect();
        for (from, to) in edges {
            self.territories[to.index()].incoming.push(from);
        }
        for t in &mut self.territories {
            t.incoming.sort();
            t.incoming.dedup();
        }
    }
}

impl BoardView for Board {
    fn territory_count(&self) -> usize {
        self.territories.len()
    }

    fn owner(&self, territory: TerritoryId) -> Option<PlayerId> {
        self.territories[territory.index()].owner
    }

    fn armies(&self, territory: TerritoryId) -> u32 {
        self.territories[territory.index()].armies
    }

    fn region_of(&self, territory: TerritoryId) -> RegionId {
        self.territories[territory.index()].region
    }

    fn neighbors(&self, territory: TerritoryId) -> &[TerritoryId] {
        &self.territories[territory.index()].neighbors
    }

    fn incoming(&self, territory: TerritoryId) -> &[TerritoryId] {
        &self.territories[territory.index()].incoming
    }

    fn territory_name(&self, territory: TerritoryId) -> &str {
        &self.territories[territory.index()].name
    }

    fn region_count(&self) -> usize {
        self.regions.len()
    }

    fn region_bonus(&self, region: RegionId) -> u32 {
        self.regions[region.index()].bonus
    }

    fn region_members(&self, region: RegionId) -> &[TerritoryId] {
        &self.regions[region.index()].members
    }

    fn player_count(&self) -> usize {
        self.players.len()
    }

    fn income(&self, player: PlayerId) -> u32 {
        self.players[player.index()]
            .income_override
            .unwrap_or_else(|| self.derived_income(player))
    }

    fn cards(&self, player: PlayerId) -> u32 {
        self.players[player.index()].cards
    }

    fn is_alive(&self, player: PlayerId) -> bool {
        self.territories.iter().any(|t| t.owner == Some(player))
    }

    fn is_allied(&self, a: PlayerId, b: PlayerId) -> bool {
        a != b && self.players[a.index()].allies.contains(&b)
    }

    fn next_card_cash(&self) -> Option<u32> {
        self.card_cash
    }

    fn turn(&self) -> Turn {
        self.turn
    }
}

/// Incremental construction of a `Board`
#[derive(Debug, Default)]
pub struct BoardBuilder {
    territories: Vec<Territory>,
    regions: Vec<Region>,
    players: Vec<PlayerState>,
}

impl BoardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(&mut self, name: &str, bonus: u32) -> RegionId {
        let id = RegionId(self.regions.len() as u32);
        self.regions.push(Region {
            id,
            name: name.to_string(),
            bonus,
            members: Vec::new(),
        });
        id
    }

    pub fn territory(&mut self, name: &str, region: RegionId) -> TerritoryId {
        let id = TerritoryId(self.territories.len() as u32);
        self.territories.push(Territory {
            id,
            name: name.to_string(),
            region,
            owner: None,
            armies: 0,
            neighbors: Vec::new(),
            incoming: Vec::new(),
        });
        self.regions[region.index()].members.push(id);
        id
    }

    pub fn player(&mut self, name: &str) -> PlayerId {
        let id = PlayerId(self.players.len() as u32);
        self.players.push(PlayerState {
            id,
            name: name.to_string(),
            cards: 0,
            allies: Vec::new(),
            income_override: None,
        });
        id
    }

    /// Two-way link
    pub fn connect(&mut self, a: TerritoryId, b: TerritoryId) {
        self.connect_one_way(a, b);
        self.connect_one_way(b, a);
    }

    /// Link that only allows moving from `from` into `to`
    pub fn connect_one_way(&mut self, from: TerritoryId, to: TerritoryId) {
        if from == to {
            return;
        }
        let neighbors = &mut self.territories[from.index()].neighbors;
        if !neighbors.contains(&to) {
            neighbors.push(to);
        }
    }

    pub fn build(self) -> Board {
        let mut board = Board {
            territories: self.territories,
            regions: self.regions,
            players: self.players,
            turn: 0,
            card_cash: None,
        };
        for t in &mut board.territories {
            t.neighbors.sort();
        }
        board.rebuild_incoming();
        board
    }
}
