//! Greedy allocation of the reinforcement budget
//!
//! The allocator scores every objective, commits the best one to the route
//! plan, places the armies its routes need, rescores what is left against
//! the updated projection and repeats until the budget or the objectives
//! run out.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::board::view::BoardView;
use crate::core::config::PlannerConfig;
use crate::core::types::{PlayerId, TerritoryId};
use crate::planning::area::{area_borders, Area};
use crate::planning::clade::{clade_reserve, root_start};
use crate::planning::garrison::{garrison_growth, ideal_strength, GarrisonMap};
use crate::planning::generators::ObjectiveGenerator;
use crate::planning::merge::pick_covering_routes;
use crate::planning::objective::{sort_by_score, Objective, ObjectiveKind, ObjectiveTarget};
use crate::planning::projection::Projection;
use crate::planning::route::{Route, RoutePlan};
use crate::planning::search::enumerate_area_routes;

/// Armies to add to one territory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub territory: TerritoryId,
    pub amount: u32,
}

/// Record of an objective the allocator committed to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedObjective {
    pub kind: ObjectiveKind,
    pub score: f64,
    pub cost: u32,
    pub placed: u32,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationOutcome {
    pub placements: Vec<Placement>,
    pub accepted: Vec<AcceptedObjective>,
    /// Armies spread over route starts once no objective wanted them
    pub residual: u32,
}

impl AllocationOutcome {
    pub fn total_placed(&self) -> u32 {
        self.placements.iter().map(|p| p.amount).sum()
    }
}

/// The plan a player has committed to this turn
#[derive(Debug, Clone, Default)]
pub struct Commitments {
    pub plan: RoutePlan,
    /// Territories the plan will conquer; treated as ours while planning
    pub claimed: BTreeSet<TerritoryId>,
    pub garrisons: GarrisonMap,
}

impl Commitments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the route plan and its claims; garrisons are kept
    pub fn clear_plan(&mut self) {
        self.plan.clear();
        self.claimed.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllocationState {
    Idle,
    Scoring,
    Selecting,
    Placing(Objective),
    Recomputing,
    Done,
}

pub struct Allocator<'a, B: BoardView> {
    board: &'a B,
    player: PlayerId,
    config: &'a PlannerConfig,
    areas: &'a [Area],
    commitments: &'a mut Commitments,
    /// Armies placed by this pass, not yet on the board
    placed: BTreeMap<TerritoryId, u32>,
    remaining: u32,
    initial: bool,
    objectives: Vec<Objective>,
    /// Consecutive denials pushed to the back of the queue
    deferred: usize,
    expansion_retired: bool,
    state: AllocationState,
    outcome: AllocationOutcome,
}

impl<'a, B: BoardView> Allocator<'a, B> {
    pub fn new(
        board: &'a B,
        player: PlayerId,
        config: &'a PlannerConfig,
        areas: &'a [Area],
        commitments: &'a mut Commitments,
        budget: u32,
        initial: bool,
    ) -> Self {
        Self {
            board,
            player,
            config,
            areas,
            commitments,
            placed: BTreeMap::new(),
            remaining: budget,
            initial,
            objectives: Vec::new(),
            deferred: 0,
            expansion_retired: false,
            state: AllocationState::Idle,
            outcome: AllocationOutcome::default(),
        }
    }

    pub fn state(&self) -> &AllocationState {
        &self.state
    }

    /// Drive the state machine to completion
    pub fn run(mut self) -> AllocationOutcome {
        while self.state != AllocationState::Done {
            self.step();
        }
        self.spread_residual();
        self.outcome
    }

    /// Advance by one state transition
    pub fn step(&mut self) {
        let state = std::mem::replace(&mut self.state, AllocationState::Done);
        self.state = match state {
            AllocationState::Idle => AllocationState::Scoring,
            AllocationState::Scoring => {
                let generated = self.generator().generate_all();
                self.objectives = generated;
                sort_by_score(&mut self.objectives);
                AllocationState::Selecting
            }
            AllocationState::Selecting => self.select(),
            AllocationState::Placing(objective) => {
                self.place(objective);
                AllocationState::Recomputing
            }
            AllocationState::Recomputing => {
                let targets: Vec<ObjectiveTarget> = self
                    .objectives
                    .iter()
                    .map(|o| o.target())
                    .filter(|t| !(self.expansion_retired && *t == ObjectiveTarget::Expansion))
                    .collect();
                let regenerated = self.generator().regenerate(&targets);
                self.objectives = regenerated;
                sort_by_score(&mut self.objectives);
                AllocationState::Selecting
            }
            AllocationState::Done => AllocationState::Done,
        };
    }

    fn generator(&self) -> ObjectiveGenerator<'_, B> {
        ObjectiveGenerator {
            proj: Projection::new(self.board, self.player, &self.commitments.claimed, &self.placed),
            config: self.config,
            garrisons: &self.commitments.garrisons,
            areas: self.areas,
            budget: self.remaining,
        }
    }

    fn select(&mut self) -> AllocationState {
        if self.remaining == 0 || self.objectives.is_empty() {
            return AllocationState::Done;
        }

        // Expensive denials wait behind cheaper work, but once every
        // candidate has been passed over in a row the top one goes ahead
        if let Objective::Denial(denial) = &self.objectives[0] {
            if !self.initial && denial.cost > self.remaining && self.deferred < self.objectives.len() {
                tracing::debug!("Deferring {} (cost {} > {})", denial.summary, denial.cost, self.remaining);
                self.objectives.rotate_left(1);
                self.deferred += 1;
                return AllocationState::Selecting;
            }
        }

        self.deferred = 0;
        AllocationState::Placing(self.objectives.remove(0))
    }

    fn place(&mut self, objective: Objective) {
        let routes = self.routes_for(&objective);
        let placed = self.commit_routes(routes);

        tracing::info!(
            "Player {} accepts {} (score {:.3}, cost {}): {}; placed {}, {} left",
            self.player,
            objective.kind(),
            objective.score(),
            objective.cost(),
            objective.summary(),
            placed,
            self.remaining
        );
        self.outcome.accepted.push(AcceptedObjective {
            kind: objective.kind(),
            score: objective.score(),
            cost: objective.cost(),
            placed,
            summary: objective.summary().to_string(),
        });

        if let Objective::Expansion(_) = objective {
            if placed == 0 {
                self.expansion_retired = true;
            } else {
                // Rescored next round against the smaller budget
                self.objectives.push(objective);
            }
        }
    }

    /// Turn an objective into concrete routes, recording garrisons for the
    /// borders of any area it takes
    fn routes_for(&mut self, objective: &Objective) -> Vec<Route> {
        match objective {
            Objective::Denial(denial) => vec![denial.route.clone()],
            Objective::Expansion(expansion) => vec![expansion.route.clone()],
            Objective::Takeover(takeover) => {
                let areas = self.areas;
                let Some(area) = areas.get(takeover.area) else {
                    return Vec::new();
                };
                let borders: BTreeSet<TerritoryId> = area.borders(self.board).into_iter().collect();
                let routes = {
                    let proj = Projection::new(self.board, self.player, &self.commitments.claimed, &self.placed);
                    let enumerated = enumerate_area_routes(&proj, &area.territories, self.config.enumeration_cap);
                    pick_covering_routes(&enumerated, &borders)
                };
                let growth = garrison_growth(self.board, self.player, self.config);
                for &border in &borders {
                    let ideal = ideal_strength(self.board, border, &area.territories, self.player, self.config);
                    self.commitments.garrisons.record(border, ideal, growth);
                }
                routes
            }
            Objective::Elimination(elimination) => {
                let proj = Projection::new(self.board, self.player, &self.commitments.claimed, &self.placed);
                let mut borders: BTreeSet<TerritoryId> = BTreeSet::new();
                let mut enumerated: Vec<Route> = Vec::new();
                for cluster in &elimination.clusters {
                    borders.extend(area_borders(self.board, cluster));
                    enumerated.extend(enumerate_area_routes(&proj, cluster, self.config.enumeration_cap));
                }
                // Clusters reached over the same hops must share them as forks
                pick_covering_routes(&enumerated, &borders)
            }
        }
    }

    /// Append routes to the plan, claim their targets and place armies at
    /// the root of each route's clade; returns the armies placed
    fn commit_routes(&mut self, routes: Vec<Route>) -> u32 {
        for route in &routes {
            self.commitments.claimed.extend(route.targets().iter().copied());
        }
        self.commitments.plan.extend(routes.iter().cloned());

        let mut placed = 0;
        for route in &routes {
            if self.remaining == 0 {
                break;
            }
            let root = root_start(&self.commitments.plan, route.start());
            if self.board.owner(root) != Some(self.player) {
                tracing::debug!("Route root {} is not ours yet, nothing to place", root);
                continue;
            }
            let demand = self.commitments.garrisons.reserved(root).max(1)
                + clade_reserve(self.board, root, &self.commitments.plan, &self.commitments.garrisons);
            let present = self.board.armies(root) + self.placed.get(&root).copied().unwrap_or(0);
            let amount = demand.saturating_sub(present).min(self.remaining);
            placed += self.place_armies(root, amount);
        }
        placed
    }

    fn place_armies(&mut self, territory: TerritoryId, amount: u32) -> u32 {
        let amount = amount.min(self.remaining);
        if amount == 0 {
            return 0;
        }
        *self.placed.entry(territory).or_insert(0) += amount;
        self.remaining -= amount;
        self.outcome.placements.push(Placement { territory, amount });
        amount
    }

    /// Spread leftover budget over the starts of planned attacks
    fn spread_residual(&mut self) {
        if self.remaining == 0 {
            return;
        }
        let leftover = self.remaining;
        let starts: Vec<TerritoryId> = self
            .commitments
            .plan
            .iter()
            .filter(|r| r.is_attack() && self.board.owner(r.start()) == Some(self.player))
            .map(|r| r.start())
            .collect();

        if starts.is_empty() {
            if let Some(fallback) = self.residual_fallback() {
                self.place_armies(fallback, leftover);
            }
        } else {
            let share = leftover / starts.len() as u32;
            let extra = leftover as usize % starts.len();
            for (i, &start) in starts.iter().enumerate() {
                let amount = share + u32::from(i < extra);
                self.place_armies(start, amount);
            }
        }

        self.outcome.residual = leftover - self.remaining;
        if self.outcome.residual > 0 {
            tracing::debug!("Player {} spread {} residual armies", self.player, self.outcome.residual);
        }
    }

    /// Largest garrison shortfall, else the first territory facing an
    /// enemy, else anything we own
    fn residual_fallback(&self) -> Option<TerritoryId> {
        let owned = self.board.owned_by(self.player);
        let shortfall = |t: TerritoryId| {
            let present = self.board.armies(t) + self.placed.get(&t).copied().unwrap_or(0);
            self.commitments.garrisons.ideal(t).saturating_sub(present)
        };
        let short = owned
            .iter()
            .copied()
            .filter(|&t| shortfall(t) > 0)
            .max_by_key(|&t| (shortfall(t), Reverse(t)));
        if short.is_some() {
            return short;
        }
        owned
            .iter()
            .copied()
            .find(|&t| {
                self.board
                    .neighbors(t)
                    .iter()
                    .any(|&n| self.board.is_hostile_owner(self.player, self.board.owner(n)))
            })
            .or_else(|| owned.first().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map::{Board, BoardBuilder};
    use crate::core::types::RegionId;
    use crate::planning::area::compute_smart_areas;
    use crate::planning::objective::{DenialObjective, ExpansionObjective};

    const ME: PlayerId = PlayerId(0);
    const FOE: PlayerId = PlayerId(1);

    fn ring_board() -> Board {
        let mut b = BoardBuilder::new();
        let west = b.region("West", 2);
        let east = b.region("East", 3);
        let ids: Vec<_> = (0..6)
            .map(|i| b.territory(&format!("T{}", i), if i < 3 { west } else { east }))
            .collect();
        for i in 0..6 {
            b.connect(ids[i], ids[(i + 1) % 6]);
        }
        b.player("me");
        b.player("foe");
        let mut board = b.build();
        for (i, &t) in ids.iter().enumerate() {
            let owner = if i < 2 { ME } else { FOE };
            board.set_owner(t, Some(owner), 2);
        }
        board
    }

    fn run(board: &Board, commitments: &mut Commitments, budget: u32, initial: bool) -> AllocationOutcome {
        let config = PlannerConfig::default();
        let areas = compute_smart_areas(board, ME, &config);
        Allocator::new(board, ME, &config, &areas, commitments, budget, initial).run()
    }

    #[test]
    fn test_placements_never_exceed_budget() {
        let board = ring_board();
        for budget in [0, 1, 3, 7, 20] {
            let mut commitments = Commitments::new();
            let outcome = run(&board, &mut commitments, budget, false);
            assert!(outcome.total_placed() <= budget);
            for p in &outcome.placements {
                assert_eq!(board.owner(p.territory), Some(ME));
            }
        }
    }

    #[test]
    fn test_budget_is_spent_when_objectives_exist() {
        let board = ring_board();
        let mut commitments = Commitments::new();
        let outcome = run(&board, &mut commitments, 10, false);
        assert_eq!(outcome.total_placed(), 10);
        assert!(!outcome.accepted.is_empty());
        assert!(!commitments.plan.is_empty());
        // Everything the plan conquers is claimed
        for t in commitments.plan.targets() {
            assert!(commitments.claimed.contains(&t));
        }
    }

    #[test]
    fn test_zero_budget_plans_nothing() {
        let board = ring_board();
        let mut commitments = Commitments::new();
        let outcome = run(&board, &mut commitments, 0, false);
        assert_eq!(outcome, AllocationOutcome::default());
        assert!(commitments.plan.is_empty());
    }

    #[test]
    fn test_residual_goes_to_enemy_facing_territory_without_routes() {
        // A lone territory with nothing hostile in reach
        let mut b = BoardBuilder::new();
        let r = b.region("Island", 1);
        let a = b.territory("A", r);
        let c = b.territory("C", r);
        b.connect(a, c);
        b.player("me");
        let mut board = b.build();
        board.set_owner(a, Some(ME), 1);
        board.set_owner(c, Some(ME), 1);

        let mut commitments = Commitments::new();
        let outcome = run(&board, &mut commitments, 5, false);
        assert_eq!(outcome.total_placed(), 5);
        assert_eq!(outcome.residual, 5);
        assert_eq!(outcome.placements, vec![Placement { territory: a, amount: 5 }]);
    }

    #[test]
    fn test_stepping_starts_idle_and_ends_done() {
        let board = ring_board();
        let config = PlannerConfig::default();
        let areas = compute_smart_areas(&board, ME, &config);
        let mut commitments = Commitments::new();
        let mut allocator = Allocator::new(&board, ME, &config, &areas, &mut commitments, 4, false);
        assert_eq!(allocator.state(), &AllocationState::Idle);
        allocator.step();
        assert_eq!(allocator.state(), &AllocationState::Scoring);
        allocator.step();
        assert_eq!(allocator.state(), &AllocationState::Selecting);
        let mut steps = 0;
        while allocator.state() != &AllocationState::Done {
            allocator.step();
            steps += 1;
            assert!(steps < 1_000);
        }
    }

    fn route(ids: &[u32]) -> Route {
        Route::new(ids.iter().map(|&i| TerritoryId(i)).collect())
    }

    fn denial(cost: u32, score: f64) -> Objective {
        Objective::Denial(DenialObjective {
            region: RegionId(1),
            owner: FOE,
            route: route(&[1, 2]),
            cost,
            score,
            summary: "deny East".to_string(),
        })
    }

    fn expansion(ids: &[u32], cost: u32, score: f64) -> Objective {
        Objective::Expansion(ExpansionObjective {
            route: route(ids),
            cost,
            score,
            summary: "expand".to_string(),
        })
    }

    fn selected_kind(allocator: &mut Allocator<'_, Board>) -> ObjectiveKind {
        for _ in 0..10 {
            match allocator.select() {
                AllocationState::Placing(objective) => return objective.kind(),
                AllocationState::Selecting => continue,
                other => panic!("unexpected state {:?}", other),
            }
        }
        panic!("selection did not settle");
    }

    #[test]
    fn test_expensive_denial_waits_behind_cheaper_work() {
        let board = ring_board();
        let config = PlannerConfig::default();
        let mut commitments = Commitments::new();
        let mut allocator = Allocator::new(&board, ME, &config, &[], &mut commitments, 3, false);
        allocator.objectives = vec![denial(10, 9.0), expansion(&[1, 2], 2, 5.0)];
        assert_eq!(selected_kind(&mut allocator), ObjectiveKind::Expansion);
        // The denial is still queued behind it
        assert_eq!(allocator.objectives.len(), 1);
        assert_eq!(allocator.objectives[0].kind(), ObjectiveKind::Denial);
    }

    #[test]
    fn test_initial_placement_takes_expensive_denial_first() {
        let board = ring_board();
        let config = PlannerConfig::default();
        let mut commitments = Commitments::new();
        let mut allocator = Allocator::new(&board, ME, &config, &[], &mut commitments, 3, true);
        allocator.objectives = vec![denial(10, 9.0), expansion(&[1, 2], 2, 5.0)];
        assert_eq!(selected_kind(&mut allocator), ObjectiveKind::Denial);
    }

    #[test]
    fn test_denials_all_deferred_still_accept_the_front() {
        let board = ring_board();
        let config = PlannerConfig::default();
        let mut commitments = Commitments::new();
        let mut allocator = Allocator::new(&board, ME, &config, &[], &mut commitments, 3, false);
        allocator.objectives = vec![denial(10, 9.0), denial(12, 8.0)];
        assert_eq!(selected_kind(&mut allocator), ObjectiveKind::Denial);
        assert_eq!(allocator.objectives.len(), 1);
    }

    #[test]
    fn test_expansion_is_rescored_not_removed() {
        let board = ring_board();
        let config = PlannerConfig::default();
        let mut commitments = Commitments::new();
        let mut allocator = Allocator::new(&board, ME, &config, &[], &mut commitments, 10, false);

        // T1 holds 2 armies, the walk into T2 needs more
        allocator.place(expansion(&[1, 2], 4, 5.0));
        assert!(allocator.outcome.accepted[0].placed > 0);
        assert!(!allocator.expansion_retired);
        assert_eq!(allocator.objectives.len(), 1);
        assert_eq!(allocator.objectives[0].target(), ObjectiveTarget::Expansion);
    }

    #[test]
    fn test_expansion_placing_nothing_is_retired() {
        let mut board = ring_board();
        board.set_armies(TerritoryId(1), 50);
        let config = PlannerConfig::default();
        let mut commitments = Commitments::new();
        let mut allocator = Allocator::new(&board, ME, &config, &[], &mut commitments, 10, false);

        allocator.place(expansion(&[1, 2], 4, 5.0));
        assert_eq!(allocator.outcome.accepted[0].placed, 0);
        assert!(allocator.expansion_retired);
        assert!(allocator.objectives.is_empty());
    }

    #[test]
    fn test_residual_split_over_route_starts_earliest_first() {
        let board = ring_board();
        let config = PlannerConfig::default();
        let mut commitments = Commitments::new();
        commitments.plan.push(route(&[1, 2]));
        commitments.plan.push(route(&[0, 5]));
        commitments.plan.push(route(&[0]));
        let mut allocator = Allocator::new(&board, ME, &config, &[], &mut commitments, 5, false);

        allocator.spread_residual();
        assert_eq!(allocator.outcome.residual, 5);
        assert_eq!(
            allocator.outcome.placements,
            vec![
                Placement { territory: TerritoryId(1), amount: 3 },
                Placement { territory: TerritoryId(0), amount: 2 },
            ]
        );
    }

    /// Me(0) - X(1, a strong third player) - {C1(2), C2(3)}, C1 and C2 are
    /// separate foe clusters reached only through X
    fn shared_entry_board() -> Board {
        let mut b = BoardBuilder::new();
        let r = b.region("Pass", 2);
        let me_t = b.territory("Me", r);
        let x = b.territory("X", r);
        let c1 = b.territory("C1", r);
        let c2 = b.territory("C2", r);
        b.connect(me_t, x);
        b.connect(x, c1);
        b.connect(x, c2);
        b.player("me");
        b.player("foe");
        b.player("other");
        let mut board = b.build();
        board.set_owner(me_t, Some(ME), 2);
        board.set_owner(x, Some(PlayerId(2)), 35);
        board.set_owner(c1, Some(FOE), 1);
        board.set_owner(c2, Some(FOE), 1);
        board
    }

    #[test]
    fn test_elimination_clusters_share_entry_as_fork() {
        let board = shared_entry_board();
        let config = PlannerConfig::default();
        let mut commitments = Commitments::new();
        let mut allocator = Allocator::new(&board, ME, &config, &[], &mut commitments, 30, false);

        let objective = allocator
            .generator()
            .generate(ObjectiveTarget::Elimination(FOE))
            .unwrap()
            .unwrap();
        let Objective::Elimination(elimination) = &objective else {
            panic!("expected an elimination");
        };
        assert_eq!(elimination.clusters.len(), 2);

        let routes = allocator.routes_for(&objective);
        assert_eq!(routes, vec![route(&[0, 1, 2]), route(&[1, 3])]);

        let mut counts: BTreeMap<TerritoryId, usize> = BTreeMap::new();
        for r in &routes {
            for &t in r.targets() {
                *counts.entry(t).or_insert(0) += 1;
            }
        }
        assert!(counts.values().all(|&c| c == 1));
    }
}
