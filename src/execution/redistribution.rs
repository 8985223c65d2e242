//! Post-combat redistribution
//!
//! Two passes over a local copy of our army counts. First, exterior border
//! territories that touch each other even out their fill against the ideal
//! garrison. Then every interior territory with armies to spare sends them
//! toward the nearest front or the emptiest border.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::board::view::BoardView;
use crate::core::config::PlannerConfig;
use crate::core::types::{PlayerId, TerritoryId};
use crate::planning::area::{territory_clusters, Area};
use crate::planning::garrison::{ideal_strength, GarrisonMap};

/// Move `amount` armies along `path`, one hop at a time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub path: Vec<TerritoryId>,
    pub amount: u32,
}

impl Transfer {
    pub fn from(&self) -> Option<TerritoryId> {
        self.path.first().copied()
    }

    pub fn to(&self) -> Option<TerritoryId> {
        self.path.last().copied()
    }
}

/// Plan the redistribution moves for `player`
pub fn plan_redistribution<B: BoardView>(
    board: &B,
    player: PlayerId,
    areas: &[Area],
    garrisons: &GarrisonMap,
    config: &PlannerConfig,
) -> Vec<Transfer> {
    let ideals = exterior_borders(board, player, areas, garrisons, config);
    let exterior: BTreeSet<TerritoryId> = ideals.keys().copied().collect();
    let mut armies: BTreeMap<TerritoryId, u32> = board
        .owned_by(player)
        .into_iter()
        .map(|t| (t, board.armies(t)))
        .collect();

    let mut transfers = Vec::new();
    for group in territory_clusters(board, &exterior) {
        if group.len() > 1 {
            equalise_group(board, &group, &ideals, &mut armies, &mut transfers);
        }
    }
    let equalised = transfers.len();

    route_surplus(board, player, &exterior, &ideals, garrisons, &mut armies, &mut transfers);

    tracing::debug!(
        "Player {} redistribution: {} equalising moves, {} surplus moves",
        player,
        equalised,
        transfers.len() - equalised
    );
    transfers
}

/// Borders of our fully held areas that no other held area encloses,
/// with their ideal garrisons
fn exterior_borders<B: BoardView>(
    board: &B,
    player: PlayerId,
    areas: &[Area],
    garrisons: &GarrisonMap,
    config: &PlannerConfig,
) -> BTreeMap<TerritoryId, u32> {
    let held: Vec<(&Area, BTreeSet<TerritoryId>)> = areas
        .iter()
        .filter(|a| !a.is_empty() && a.territories.iter().all(|&t| board.owner(t) == Some(player)))
        .map(|a| (a, a.borders(board).into_iter().collect()))
        .collect();

    let mut ideals = BTreeMap::new();
    for (i, (area, borders)) in held.iter().enumerate() {
        for &border in borders {
            let enclosed = held
                .iter()
                .enumerate()
                .any(|(j, (other, other_borders))| j != i && other.contains(border) && !other_borders.contains(&border));
            if enclosed || ideals.contains_key(&border) {
                continue;
            }
            let ideal = if garrisons.contains(border) {
                garrisons.ideal(border)
            } else {
                ideal_strength(board, border, &area.territories, player, config)
            };
            ideals.insert(border, ideal);
        }
    }
    ideals
}

/// Even out fill ratios inside one contiguous group of borders
fn equalise_group<B: BoardView>(
    board: &B,
    group: &BTreeSet<TerritoryId>,
    ideals: &BTreeMap<TerritoryId, u32>,
    armies: &mut BTreeMap<TerritoryId, u32>,
    transfers: &mut Vec<Transfer>,
) {
    let want = |t: &TerritoryId| ideals.get(t).copied().unwrap_or(0).max(1) as f64;
    let total_armies: u32 = group.iter().map(|t| armies.get(t).copied().unwrap_or(0)).sum();
    let total_ideal: f64 = group.iter().map(want).sum();
    let ratio = total_armies as f64 / total_ideal;

    // Every move lowers the summed squared excess
    let max_moves = total_armies as usize + group.len();
    for _ in 0..max_moves {
        let excess = |t: &TerritoryId, armies: &BTreeMap<TerritoryId, u32>| {
            armies.get(t).copied().unwrap_or(0) as f64 - ratio * want(t)
        };

        let mut best: Option<(i64, TerritoryId, TerritoryId)> = None;
        for &from in group {
            for &to in board.neighbors(from) {
                if !group.contains(&to) {
                    continue;
                }
                let gap = (excess(&from, armies) - excess(&to, armies)).floor() as i64;
                if gap >= 2 && best.map_or(true, |(g, _, _)| gap > g) {
                    best = Some((gap, from, to));
                }
            }
        }
        let Some((gap, from, to)) = best else {
            break;
        };

        let available = armies.get(&from).copied().unwrap_or(0).saturating_sub(1);
        let amount = ((gap / 2) as u32).min(available);
        if amount == 0 {
            break;
        }
        *armies.entry(from).or_insert(0) -= amount;
        *armies.entry(to).or_insert(0) += amount;
        transfers.push(Transfer {
            path: vec![from, to],
            amount,
        });
    }
}

/// Send every interior surplus to the best of the nearest front and the
/// exterior borders
fn route_surplus<B: BoardView>(
    board: &B,
    player: PlayerId,
    exterior: &BTreeSet<TerritoryId>,
    ideals: &BTreeMap<TerritoryId, u32>,
    garrisons: &GarrisonMap,
    armies: &mut BTreeMap<TerritoryId, u32>,
    transfers: &mut Vec<Transfer>,
) {
    let fronts: BTreeSet<TerritoryId> = armies
        .keys()
        .copied()
        .filter(|&t| {
            board
                .neighbors(t)
                .iter()
                .any(|&n| board.is_hostile_owner(player, board.owner(n)))
        })
        .collect();

    let sources: Vec<TerritoryId> = armies
        .keys()
        .copied()
        .filter(|t| !exterior.contains(t) && !fronts.contains(t))
        .collect();

    for source in sources {
        let keep = garrisons.ideal(source).max(1);
        let surplus = armies.get(&source).copied().unwrap_or(0).saturating_sub(keep);
        if surplus == 0 {
            continue;
        }

        let (order, parents) = owned_bfs(board, player, source);
        let mut best: Option<(f64, TerritoryId)> = None;
        let mut front_seen = false;
        for &(t, len) in &order {
            if len == 0 {
                continue;
            }
            let len_sq = (len * len) as f64;
            let mut score = None;
            if fronts.contains(&t) && !front_seen {
                front_seen = true;
                score = Some(1.0 / len_sq);
            }
            if exterior.contains(&t) {
                let ideal = ideals.get(&t).copied().unwrap_or(0) as f64;
                let present = armies.get(&t).copied().unwrap_or(0).max(1) as f64;
                let fitness = ((ideal + 1.0) / present) / len_sq;
                score = Some(score.map_or(fitness, |s: f64| s.max(fitness)));
            }
            if let Some(score) = score {
                if best.map_or(true, |(b, _)| score > b) {
                    best = Some((score, t));
                }
            }
        }

        let Some((_, destination)) = best else {
            continue;
        };
        let mut path = vec![destination];
        let mut current = destination;
        while let Some(&parent) = parents.get(&current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();

        *armies.entry(source).or_insert(0) -= surplus;
        *armies.entry(destination).or_insert(0) += surplus;
        transfers.push(Transfer { path, amount: surplus });
    }
}

/// Breadth-first order over our territories from `start`, with hop counts
/// and parent links
fn owned_bfs<B: BoardView>(
    board: &B,
    player: PlayerId,
    start: TerritoryId,
) -> (Vec<(TerritoryId, usize)>, BTreeMap<TerritoryId, TerritoryId>) {
    let mut order = vec![(start, 0)];
    let mut parents = BTreeMap::new();
    let mut seen: BTreeSet<TerritoryId> = [start].into_iter().collect();
    let mut queue = VecDeque::from([(start, 0usize)]);
    while let Some((t, len)) = queue.pop_front() {
        for &n in board.neighbors(t) {
            if board.owner(n) == Some(player) && seen.insert(n) {
                parents.insert(n, t);
                order.push((n, len + 1));
                queue.push_back((n, len + 1));
            }
        }
    }
    (order, parents)
}
