//! Objective generation and scoring
//!
//! Four generators, each a pure function of the projected board, the
//! remaining budget and the garrison map: region denial, area takeover,
//! greedy expansion and player elimination.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use crate::board::view::BoardView;
use crate::core::config::PlannerConfig;
use crate::core::error::{PlannerError, Result};
use crate::core::types::{PlayerId, RegionId, TerritoryId};
use crate::planning::area::{territory_clusters, Area};
use crate::planning::cost::{card_value, estimate_traversal_cost, path_cost, quick_hop_cost};
use crate::planning::garrison::{garrison_growth, ideal_strength, GarrisonMap};
use crate::planning::objective::{
    value_per_cost, DenialObjective, EliminationObjective, ExpansionObjective, Objective, ObjectiveTarget,
    TakeoverObjective,
};
use crate::planning::projection::Projection;
use crate::planning::route::Route;
use crate::planning::search::cheapest_route_to_area;

/// Everything an objective is scored against
pub struct ObjectiveGenerator<'a, B: BoardView> {
    pub proj: Projection<'a, B>,
    pub config: &'a PlannerConfig,
    pub garrisons: &'a GarrisonMap,
    pub areas: &'a [Area],
    /// Armies still unplaced this allocation pass
    pub budget: u32,
}

impl<'a, B: BoardView> ObjectiveGenerator<'a, B> {
    /// Every target worth generating, in generation order
    pub fn targets(&self) -> Vec<ObjectiveTarget> {
        let board = self.proj.board;
        let mut targets: Vec<ObjectiveTarget> = board.region_ids().into_iter().map(ObjectiveTarget::Denial).collect();
        targets.extend((0..self.areas.len()).map(ObjectiveTarget::Takeover));
        targets.push(ObjectiveTarget::Expansion);
        targets.extend(
            board
                .player_ids()
                .into_iter()
                .filter(|&p| p != self.proj.player)
                .map(ObjectiveTarget::Elimination),
        );
        targets
    }

    pub fn generate_all(&self) -> Vec<Objective> {
        self.regenerate(&self.targets())
    }

    /// Rebuild each target; vacuous and unpriceable ones are dropped
    pub fn regenerate(&self, targets: &[ObjectiveTarget]) -> Vec<Objective> {
        let mut objectives = Vec::with_capacity(targets.len());
        for &target in targets {
            match self.generate(target) {
                Ok(Some(objective)) => {
                    tracing::debug!(
                        "{} objective scored {:.3} at cost {}: {}",
                        objective.kind(),
                        objective.score(),
                        objective.cost(),
                        objective.summary()
                    );
                    objectives.push(objective);
                }
                Ok(None) => {}
                Err(e) => tracing::debug!("Skipping {:?}: {}", target, e),
            }
        }
        objectives
    }

    pub fn generate(&self, target: ObjectiveTarget) -> Result<Option<Objective>> {
        match target {
            ObjectiveTarget::Denial(region) => self.denial(region),
            ObjectiveTarget::Takeover(area) => self.takeover(area),
            ObjectiveTarget::Expansion => self.expansion(),
            ObjectiveTarget::Elimination(player) => self.elimination(player),
        }
    }

    fn denial(&self, region: RegionId) -> Result<Option<Objective>> {
        let board = self.proj.board;
        if region.index() >= board.region_count() {
            return Err(PlannerError::UnknownRegion(region));
        }
        let Some(owner) = board.region_owner(region) else {
            return Ok(None);
        };
        if !board.is_hostile_owner(self.proj.player, Some(owner)) {
            return Ok(None);
        }
        let members = board.region_members(region);
        if members.iter().any(|t| self.proj.claimed().contains(t)) {
            return Ok(None);
        }

        let area: BTreeSet<TerritoryId> = members.iter().copied().collect();
        let route = cheapest_route_to_area(&self.proj, &area, true)?;
        if !route.is_attack() {
            return Ok(None);
        }

        let cost = path_cost(board, route.territories()).max(1);
        let country_gain: f64 = route
            .targets()
            .iter()
            .map(|&t| self.proj.income_share(board.owner(t)))
            .sum();
        let continent_gain = board.region_bonus(region) as f64 * self.proj.income_share(Some(owner));
        let score = value_per_cost(self.config.score_scale, country_gain + continent_gain, cost);

        let summary = format!(
            "deny {} (bonus {}) to {} from {} in {} hops",
            region,
            board.region_bonus(region),
            owner,
            board.territory_name(route.start()),
            route.targets().len()
        );
        Ok(Some(Objective::Denial(DenialObjective {
            region,
            owner,
            route,
            cost,
            score,
            summary,
        })))
    }

    fn takeover(&self, index: usize) -> Result<Option<Objective>> {
        let area = self.areas.get(index).ok_or(PlannerError::UnknownArea(index))?;
        let board = self.proj.board;
        let player = self.proj.player;

        let growth = garrison_growth(board, player, self.config);
        let mut shortfall = 0u32;
        let mut unguarded: BTreeSet<TerritoryId> = BTreeSet::new();
        for border in area.borders(board) {
            let ideal = ideal_strength(board, border, &area.territories, player, self.config);
            let present = if self.proj.is_owned_now(border) {
                self.proj.armies(border)
            } else {
                0
            };
            shortfall += ideal.saturating_sub(present);
            if self.garrisons.capped(border, ideal, growth) < ideal {
                unguarded.insert(border);
            }
        }

        let inside: BTreeSet<TerritoryId> = area
            .territories
            .iter()
            .copied()
            .filter(|&t| !self.proj.is_mine(t))
            .collect();

        if inside.is_empty() {
            // Already ours: only worth anything while the garrisons are short
            if shortfall == 0 {
                return Ok(None);
            }
            let score = self.takeover_score(area.bonus as f64, shortfall);
            return Ok(Some(Objective::Takeover(TakeoverObjective {
                area: index,
                hostile: BTreeSet::new(),
                entry: None,
                shortfall,
                cost: shortfall,
                score,
                summary: format!(
                    "reinforce area of {} ({} armies short)",
                    area_label(board, area),
                    shortfall
                ),
            })));
        }

        let mut hostile = inside;
        let holds_inside = area.territories.iter().any(|&t| self.proj.is_mine(t));
        let entry = if holds_inside {
            None
        } else {
            let route = cheapest_route_to_area(&self.proj, &area.territories, false)?;
            hostile.extend(route.targets().iter().copied().filter(|&t| !area.contains(t)));
            Some(route)
        };

        let cost = (estimate_traversal_cost(board, hostile.iter().copied()) + shortfall).max(1);
        let territory_gain: f64 = hostile
            .iter()
            .map(|&t| {
                let keep = if !area.contains(t) || unguarded.contains(&t) {
                    self.config.keep_chance
                } else {
                    1.0
                };
                self.config.territory_value * keep
            })
            .sum();
        let (enemy_loss, ally_loss) = self.losses(&hostile);
        let value = area.bonus as f64 + territory_gain + enemy_loss - ally_loss;
        let score = self.takeover_score(value, cost);

        let summary = format!(
            "take area of {} ({} to conquer, {} garrison short)",
            area_label(board, area),
            hostile.len(),
            shortfall
        );
        Ok(Some(Objective::Takeover(TakeoverObjective {
            area: index,
            hostile,
            entry,
            shortfall,
            cost,
            score,
            summary,
        })))
    }

    /// Value per army, damped when the cost spans several turns of income
    fn takeover_score(&self, value: f64, cost: u32) -> f64 {
        let income = self.proj.board.income(self.proj.player).max(1) as f64;
        let turns = (cost.max(1) as f64 / income).max(1.0);
        value_per_cost(self.config.score_scale, value, cost) / turns.sqrt()
    }

    /// Income-weighted losses inflicted on (enemies, allies) by conquering
    /// `territories`
    fn losses(&self, territories: &BTreeSet<TerritoryId>) -> (f64, f64) {
        let board = self.proj.board;
        let mut by_owner: BTreeMap<PlayerId, usize> = BTreeMap::new();
        for &t in territories {
            if let Some(owner) = board.owner(t) {
                if owner != self.proj.player {
                    *by_owner.entry(owner).or_insert(0) += 1;
                }
            }
        }

        let mut enemy_loss = 0.0;
        let mut ally_loss = 0.0;
        for (owner, lost) in by_owner {
            let broken: u32 = board
                .region_ids()
                .into_iter()
                .filter(|&r| board.region_owner(r) == Some(owner))
                .filter(|&r| board.region_members(r).iter().any(|t| territories.contains(t)))
                .map(|r| board.region_bonus(r))
                .sum();
            let loss = self.proj.income_share(Some(owner))
                * (lost as f64 * self.config.territory_value + broken as f64);
            if board.is_allied(self.proj.player, owner) {
                ally_loss += loss;
            } else {
                enemy_loss += loss;
            }
        }
        (enemy_loss, ally_loss)
    }

    fn expansion(&self) -> Result<Option<Objective>> {
        if self.budget == 0 {
            return Ok(None);
        }
        let board = self.proj.board;
        let pressure = self.region_pressures();
        let neighbour_pressure = self.neighbour_pressures(&pressure);

        let mut best: Option<ExpansionObjective> = None;
        for seed in board.territory_ids().filter(|&t| self.proj.is_mine(t)) {
            let route = self.greedy_walk(seed);
            if !route.is_attack() {
                continue;
            }
            let cost = path_cost(board, route.territories()).max(1);
            let gain: f64 = route
                .targets()
                .iter()
                .map(|&t| self.expansion_gain(t, &pressure, &neighbour_pressure))
                .sum();
            let score = value_per_cost(self.config.score_scale, gain, cost);
            if best.as_ref().map_or(true, |b| score > b.score) {
                let summary = format!(
                    "expand from {} through {} territories",
                    board.territory_name(seed),
                    route.targets().len()
                );
                best = Some(ExpansionObjective {
                    route,
                    cost,
                    score,
                    summary,
                });
            }
        }
        Ok(best.map(Objective::Expansion))
    }

    /// Walk to the weakest hostile neighbour until the budget runs out
    fn greedy_walk(&self, seed: TerritoryId) -> Route {
        let board = self.proj.board;
        let mut path = vec![seed];
        let mut remaining = self.budget;
        let mut current = seed;
        loop {
            let next = board
                .neighbors(current)
                .iter()
                .copied()
                .filter(|&n| self.proj.is_hostile(n) && !path.contains(&n))
                .min_by_key(|&n| {
                    let owner_income = board.owner(n).map_or(0, |o| board.income(o));
                    (board.armies(n), Reverse(owner_income), n)
                });
            let Some(next) = next else {
                break;
            };
            let hop = quick_hop_cost(board.armies(next));
            if hop > remaining {
                break;
            }
            remaining -= hop;
            path.push(next);
            current = next;
        }
        Route::new(path)
    }

    /// Free hostile armies per territory, per region
    fn region_pressures(&self) -> Vec<f64> {
        let board = self.proj.board;
        board
            .region_ids()
            .into_iter()
            .map(|r| {
                let members = board.region_members(r);
                if members.is_empty() {
                    return 0.0;
                }
                let free: u32 = members
                    .iter()
                    .filter(|&&t| self.proj.owner(t).is_some() && self.proj.is_hostile(t))
                    .map(|&t| board.armies(t).saturating_sub(1))
                    .sum();
                free as f64 / members.len() as f64
            })
            .collect()
    }

    /// Mean pressure of each region's adjacent regions
    fn neighbour_pressures(&self, pressure: &[f64]) -> Vec<f64> {
        let board = self.proj.board;
        board
            .region_ids()
            .into_iter()
            .map(|r| {
                let adjacent: BTreeSet<RegionId> = board
                    .region_members(r)
                    .iter()
                    .flat_map(|&t| board.neighbors(t).iter().map(|&n| board.region_of(n)))
                    .filter(|&other| other != r)
                    .collect();
                if adjacent.is_empty() {
                    return 0.0;
                }
                adjacent.iter().map(|a| pressure[a.index()]).sum::<f64>() / adjacent.len() as f64
            })
            .collect()
    }

    fn expansion_gain(&self, territory: TerritoryId, pressure: &[f64], neighbour_pressure: &[f64]) -> f64 {
        let board = self.proj.board;
        let region = board.region_of(territory);
        let size = board.region_size(region).max(1) as f64;
        let density = 1.0 + board.region_bonus(region) as f64 / size;
        let resistance = 1.0
            + pressure[region.index()]
            + self.config.neighbour_pressure_weight * neighbour_pressure[region.index()];
        self.config.territory_value * density / resistance
    }

    fn elimination(&self, player: PlayerId) -> Result<Option<Objective>> {
        let board = self.proj.board;
        if player.index() >= board.player_count() {
            return Err(PlannerError::UnknownPlayer(player));
        }
        if player == self.proj.player || !board.is_alive(player) || board.is_allied(self.proj.player, player) {
            return Ok(None);
        }

        let territories: BTreeSet<TerritoryId> = board
            .owned_by(player)
            .into_iter()
            .filter(|t| !self.proj.claimed().contains(t))
            .collect();
        if territories.is_empty() {
            return Ok(None);
        }
        let strength: u32 = territories.iter().map(|&t| board.armies(t)).sum();
        if strength >= self.budget {
            return Ok(None);
        }

        let clusters = territory_clusters(board, &territories);
        let mut swept: BTreeSet<TerritoryId> = BTreeSet::new();
        for cluster in &clusters {
            let entry = cheapest_route_to_area(&self.proj, cluster, false)?;
            swept.extend(entry.targets().iter().copied());
            swept.extend(cluster.iter().copied());
        }

        let cost = estimate_traversal_cost(board, swept.iter().copied()).max(1);
        let cash = board.next_card_cash().unwrap_or(self.config.default_card_cash);
        let gain = swept.len() as f64 * self.config.territory_value * self.config.keep_chance
            + card_value(board.cards(player), cash);
        let enemy_loss = self.proj.income_share(Some(player)) * board.income(player) as f64;
        let score = value_per_cost(self.config.score_scale, gain + enemy_loss, cost);

        let summary = format!(
            "eliminate {} ({} armies in {} clusters)",
            player,
            strength,
            clusters.len()
        );
        Ok(Some(Objective::Elimination(EliminationObjective {
            player,
            clusters,
            cost,
            score,
            summary,
        })))
    }
}

fn area_label<B: BoardView>(board: &B, area: &Area) -> String {
    match area.seed_region {
        Some(region) => format!("{} (bonus {})", region, area.bonus),
        None => format!(
            "{} territories around {}",
            area.len(),
            area.territories
                .iter()
                .next()
                .map_or("nowhere", |&t| board.territory_name(t))
        ),
    }
}
