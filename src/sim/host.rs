//! Dice-rolling host over an in-memory board

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::board::map::Board;
use crate::board::view::BoardView;
use crate::core::types::{PlayerId, RegionId, TerritoryId, Turn};
use crate::host::{AttackOutcome, GameHost};

/// Armies paid out for the `n`th set cashed in (zero based)
pub fn card_cash_value(n: u32) -> u32 {
    match n {
        0..=4 => 4 + 2 * n,
        _ => 15 + 5 * (n - 5),
    }
}

/// Simulated game engine: classic three-versus-two dice and escalating
/// card sets
pub struct SimHost {
    pub board: Board,
    /// Random number generator (deterministic)
    pub rng: ChaCha8Rng,
    sets_cashed: u32,
}

impl SimHost {
    pub fn new(mut board: Board, seed: u64) -> Self {
        board.card_cash = Some(card_cash_value(0));
        Self {
            board,
            rng: ChaCha8Rng::seed_from_u64(seed),
            sets_cashed: 0,
        }
    }

    pub fn sets_cashed(&self) -> u32 {
        self.sets_cashed
    }

    /// Trade three of `player`'s cards for armies; 0 if it holds fewer
    pub fn cash_set(&mut self, player: PlayerId) -> u32 {
        let cards = self.board.cards(player);
        if cards < 3 {
            return 0;
        }
        self.board.set_cards(player, cards - 3);
        let value = self.board.card_cash.unwrap_or_else(|| card_cash_value(self.sets_cashed));
        self.sets_cashed += 1;
        self.board.card_cash = Some(card_cash_value(self.sets_cashed));
        tracing::debug!("Player {} cashes a set for {} armies", player, value);
        value
    }

    /// One round of dice; returns (attacker losses, defender losses)
    fn roll(&mut self, attack_dice: u32, defend_dice: u32) -> (u32, u32) {
        let mut attack: Vec<u32> = (0..attack_dice).map(|_| self.rng.gen_range(1..=6)).collect();
        let mut defend: Vec<u32> = (0..defend_dice).map(|_| self.rng.gen_range(1..=6)).collect();
        attack.sort_unstable_by(|a, b| b.cmp(a));
        defend.sort_unstable_by(|a, b| b.cmp(a));

        let mut losses = (0, 0);
        for (a, d) in attack.iter().zip(defend.iter()) {
            if a > d {
                losses.1 += 1;
            } else {
                losses.0 += 1;
            }
        }
        losses
    }

    /// Hand the loser's cards to the conqueror, who must cash down to four
    /// once it holds six or more
    fn take_cards(&mut self, conqueror: PlayerId, loser: PlayerId) -> u32 {
        let taken = self.board.cards(loser);
        self.board.set_cards(loser, 0);
        let held = self.board.cards(conqueror) + taken;
        self.board.set_cards(conqueror, held);

        let mut bonus = 0;
        if held >= 6 {
            while self.board.cards(conqueror) > 4 {
                bonus += self.cash_set(conqueror);
            }
        }
        bonus
    }
}

impl BoardView for SimHost {
    fn territory_count(&self) -> usize {
        self.board.territory_count()
    }

    fn owner(&self, territory: TerritoryId) -> Option<PlayerId> {
        self.board.owner(territory)
    }

    fn armies(&self, territory: TerritoryId) -> u32 {
        self.board.armies(territory)
    }

    fn region_of(&self, territory: TerritoryId) -> RegionId {
        self.board.region_of(territory)
    }

    fn neighbors(&self, territory: TerritoryId) -> &[TerritoryId] {
        self.board.neighbors(territory)
    }

    fn incoming(&self, territory: TerritoryId) -> &[TerritoryId] {
        self.board.incoming(territory)
    }

    fn territory_name(&self, territory: TerritoryId) -> &str {
        self.board.territory_name(territory)
    }

    fn region_count(&self) -> usize {
        self.board.region_count()
    }

    fn region_bonus(&self, region: RegionId) -> u32 {
        self.board.region_bonus(region)
    }

    fn region_members(&self, region: RegionId) -> &[TerritoryId] {
        self.board.region_members(region)
    }

    fn player_count(&self) -> usize {
        self.board.player_count()
    }

    fn income(&self, player: PlayerId) -> u32 {
        self.board.income(player)
    }

    fn cards(&self, player: PlayerId) -> u32 {
        self.board.cards(player)
    }

    fn is_alive(&self, player: PlayerId) -> bool {
        self.board.is_alive(player)
    }

    fn is_allied(&self, a: PlayerId, b: PlayerId) -> bool {
        self.board.is_allied(a, b)
    }

    fn next_card_cash(&self) -> Option<u32> {
        self.board.next_card_cash()
    }

    fn turn(&self) -> Turn {
        self.board.turn()
    }
}

impl GameHost for SimHost {
    fn place_armies(&mut self, territory: TerritoryId, amount: u32) {
        self.board.add_armies(territory, amount);
    }

    fn attack(&mut self, from: TerritoryId, to: TerritoryId, all_out: bool) -> AttackOutcome {
        let (Some(attacker), defender) = (self.board.owner(from), self.board.owner(to)) else {
            return AttackOutcome::default();
        };
        if defender == Some(attacker) || !self.board.neighbors(from).contains(&to) {
            tracing::warn!("Refusing attack {} -> {}", from, to);
            return AttackOutcome::default();
        }

        while self.board.armies(from) > 1 && self.board.armies(to) > 0 {
            let attack_dice = (self.board.armies(from) - 1).min(3);
            let defend_dice = self.board.armies(to).min(2);
            let (lost, killed) = self.roll(attack_dice, defend_dice);
            let t = &mut self.board.territories;
            t[from.index()].armies -= lost;
            t[to.index()].armies -= killed;
            if !all_out {
                break;
            }
        }
        if self.board.armies(to) > 0 {
            return AttackOutcome::default();
        }

        self.board.set_owner(to, Some(attacker), 1);
        let left = self.board.armies(from) - 1;
        self.board.set_armies(from, left);

        let mut outcome = AttackOutcome {
            conquered: true,
            ..AttackOutcome::default()
        };
        if let Some(loser) = defender.filter(|&d| !self.board.is_alive(d)) {
            outcome.eliminated = Some(loser);
            outcome.bonus_armies = self.take_cards(attacker, loser);
        }
        outcome
    }

    fn move_armies(&mut self, from: TerritoryId, to: TerritoryId, amount: u32) {
        let amount = amount.min(self.board.armies(from).saturating_sub(1));
        if amount == 0 || self.board.owner(from) != self.board.owner(to) {
            return;
        }
        let left = self.board.armies(from) - amount;
        self.board.set_armies(from, left);
        self.board.add_armies(to, amount);
    }

    fn fortify(&mut self, from: TerritoryId, to: TerritoryId, amount: u32) -> bool {
        let owner = self.board.owner(from);
        if owner.is_none()
            || self.board.owner(to) != owner
            || !self.board.neighbors(from).contains(&to)
            || amount == 0
            || self.board.armies(from) <= amount
        {
            return false;
        }
        let left = self.board.armies(from) - amount;
        self.board.set_armies(from, left);
        self.board.add_armies(to, amount);
        true
    }
}
