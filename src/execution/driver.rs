//! Route execution
//!
//! The driver hands the host one attack at a time. It walks the route plan
//! hop by hop, keeping back enough armies on every launch territory for its
//! garrison and for the forks still waiting to leave from it. Once the plan
//! is spent, idle armies sweep up weak neighbours.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::board::view::BoardView;
use crate::core::config::PlannerConfig;
use crate::core::error::PlannerError;
use crate::core::types::{PlayerId, TerritoryId};
use crate::planning::allocation::Commitments;
use crate::planning::clade::clade_cost;
use crate::planning::garrison::GarrisonMap;
use crate::planning::route::{Route, RoutePlan};

/// One attack request for the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOrder {
    pub from: TerritoryId,
    pub to: TerritoryId,
    /// Keep rolling until the territory falls or the attacker is spent
    pub all_out: bool,
}

#[derive(Debug, Clone, Copy)]
struct IssuedAttack {
    from: TerritoryId,
    to: TerritoryId,
    reserve: u32,
}

#[derive(Debug, Clone, Default)]
struct MopUp {
    fronts: Vec<TerritoryId>,
    attacks: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Driver {
    /// Route being walked; an owned copy, so replanning cannot change it
    current: Option<Route>,
    next_hop: usize,
    last: Option<IssuedAttack>,
    mop_up: Option<MopUp>,
}

impl Driver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Route currently being walked, if any
    pub fn current_route(&self) -> Option<&Route> {
        self.current.as_ref()
    }

    pub fn is_mopping_up(&self) -> bool {
        self.mop_up.is_some()
    }

    /// Next attack to make, or `None` when the turn's fighting is over
    pub fn next_attack<B: BoardView>(
        &mut self,
        board: &B,
        player: PlayerId,
        commitments: &mut Commitments,
        config: &PlannerConfig,
    ) -> Option<AttackOrder> {
        let previous = self.last.take();
        if let (Some(mop_up), Some(previous)) = (self.mop_up.as_mut(), previous) {
            if board.owner(previous.to) == Some(player) {
                if let Some(front) = mop_up.fronts.iter_mut().find(|f| **f == previous.from) {
                    *front = previous.to;
                }
            }
        }

        if let Some(order) = self.next_route_attack(board, player, commitments) {
            return Some(order);
        }

        if self.mop_up.is_none() {
            let fronts: Vec<TerritoryId> = board
                .owned_by(player)
                .into_iter()
                .filter(|&t| !commitments.garrisons.contains(t) && board.armies(t) > 1)
                .collect();
            tracing::debug!("Player {} starts mop-up from {} fronts", player, fronts.len());
            self.mop_up = Some(MopUp { fronts, attacks: 0 });
        }
        self.next_mop_up_attack(board, player, config)
    }

    /// Armies to move into `conquered` after the last attack took it
    pub fn armies_to_move<B: BoardView>(&self, board: &B, conquered: TerritoryId) -> u32 {
        match self.last {
            Some(attack) if attack.to == conquered => board.armies(attack.from).saturating_sub(attack.reserve.max(1)),
            _ => 0,
        }
    }

    fn next_route_attack<B: BoardView>(
        &mut self,
        board: &B,
        player: PlayerId,
        commitments: &mut Commitments,
    ) -> Option<AttackOrder> {
        loop {
            if self.current.is_none() {
                let route = commitments.plan.pop_front()?;
                if !route.is_attack() {
                    continue;
                }
                if board.owner(route.start()) != Some(player) {
                    tracing::warn!(
                        "Dropping route from {}: launch territory is not ours",
                        board.territory_name(route.start())
                    );
                    continue;
                }
                self.current = Some(route);
                self.next_hop = 1;
            }

            let (from, to) = match &self.current {
                Some(route) if self.next_hop < route.len() => {
                    let hops = route.territories();
                    (hops[self.next_hop - 1], hops[self.next_hop])
                }
                _ => {
                    self.current = None;
                    continue;
                }
            };

            if board.owner(from) != Some(player) {
                let stale = PlannerError::StaleRoute {
                    from,
                    to,
                    reason: "launch territory lost",
                };
                tracing::warn!("{}; abandoning the rest of the route", stale);
                self.current = None;
                continue;
            }
            if !board.is_hostile_owner(player, board.owner(to)) {
                let stale = PlannerError::StaleRoute {
                    from,
                    to,
                    reason: "target no longer hostile",
                };
                tracing::warn!("{}; skipping hop", stale);
                self.next_hop += 1;
                continue;
            }

            let reserve = launch_reserve(board, from, &commitments.plan, &commitments.garrisons);
            if board.armies(from) <= reserve.max(1) {
                let stale = PlannerError::StaleRoute {
                    from,
                    to,
                    reason: "not enough armies beyond the reserve",
                };
                tracing::warn!("{}; abandoning the rest of the route", stale);
                self.current = None;
                continue;
            }

            self.next_hop += 1;
            self.last = Some(IssuedAttack { from, to, reserve });
            return Some(AttackOrder { from, to, all_out: true });
        }
    }

    fn next_mop_up_attack<B: BoardView>(
        &mut self,
        board: &B,
        player: PlayerId,
        config: &PlannerConfig,
    ) -> Option<AttackOrder> {
        let limit = board.territory_count() * 4;
        let mop_up = self.mop_up.as_mut()?;

        while let Some(&front) = mop_up.fronts.first() {
            if mop_up.attacks >= limit {
                mop_up.fronts.clear();
                break;
            }
            if board.owner(front) != Some(player) {
                mop_up.fronts.remove(0);
                continue;
            }

            let free = board.armies(front).saturating_sub(1);
            let target = board
                .neighbors(front)
                .iter()
                .copied()
                .filter(|&n| board.is_hostile_owner(player, board.owner(n)))
                .min_by_key(|&n| {
                    let owner_income = board.owner(n).map_or(0, |o| board.income(o));
                    (board.armies(n), Reverse(owner_income), n)
                });

            match target {
                Some(to) if free as f64 > board.armies(to) as f64 * config.mop_up_odds => {
                    mop_up.attacks += 1;
                    self.last = Some(IssuedAttack {
                        from: front,
                        to,
                        reserve: 0,
                    });
                    return Some(AttackOrder {
                        from: front,
                        to,
                        all_out: true,
                    });
                }
                _ => {
                    mop_up.fronts.remove(0);
                }
            }
        }
        None
    }
}

/// Armies that must stay on `territory`: its garrison plus the clade cost
/// of every pending route launched from it
pub fn launch_reserve<B: BoardView>(
    board: &B,
    territory: TerritoryId,
    plan: &RoutePlan,
    garrisons: &GarrisonMap,
) -> u32 {
    garrisons.reserved(territory)
        + plan
            .forks_from(territory)
            .map(|fork| clade_cost(board, fork, plan, garrisons))
            .sum::<u32>()
}
