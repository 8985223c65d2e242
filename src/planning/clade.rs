//! Clade costs over forking routes
//!
//! A route and every route forking off its conquests form a clade. Whoever
//! launches the route must carry enough armies to pay for its own battles,
//! leave each conquered territory's garrison behind and still hand every
//! fork its own clade cost.

use crate::board::view::BoardView;
use crate::core::types::TerritoryId;
use crate::planning::cost::path_cost;
use crate::planning::garrison::GarrisonMap;
use crate::planning::route::{Route, RoutePlan};

/// Armies needed to walk `route` and supply every fork launched from it
pub fn clade_cost<B: BoardView>(board: &B, route: &Route, plan: &RoutePlan, garrisons: &GarrisonMap) -> u32 {
    clade_cost_bounded(board, route, plan, garrisons, plan.len())
}

/// Armies that must stay on `territory` to launch its pending forks
pub fn clade_reserve<B: BoardView>(
    board: &B,
    territory: TerritoryId,
    plan: &RoutePlan,
    garrisons: &GarrisonMap,
) -> u32 {
    clade_reserve_bounded(board, territory, plan, garrisons, plan.len())
}

// Every fork starts strictly later on its parent, so the walk never needs
// more levels than the plan has routes; the depth bound makes that explicit.
fn clade_cost_bounded<B: BoardView>(
    board: &B,
    route: &Route,
    plan: &RoutePlan,
    garrisons: &GarrisonMap,
    depth: usize,
) -> u32 {
    let mut total = path_cost(board, route.territories());
    if depth == 0 {
        return total;
    }
    for &conquered in route.targets() {
        total += garrisons.reserved(conquered);
        total += clade_reserve_bounded(board, conquered, plan, garrisons, depth - 1);
    }
    total
}

fn clade_reserve_bounded<B: BoardView>(
    board: &B,
    territory: TerritoryId,
    plan: &RoutePlan,
    garrisons: &GarrisonMap,
    depth: usize,
) -> u32 {
    if depth == 0 {
        return 0;
    }
    plan.forks_from(territory)
        .map(|fork| clade_cost_bounded(board, fork, plan, garrisons, depth - 1))
        .sum()
}

/// The territory whose armies ultimately launch the clade containing
/// `territory`: walk up through the routes that conquer it
pub fn root_start(plan: &RoutePlan, territory: TerritoryId) -> TerritoryId {
    let mut current = territory;
    for _ in 0..=plan.len() {
        match plan.conqueror_of(current) {
            Some(parent) if parent.start() != current => current = parent.start(),
            _ => break,
        }
    }
    current
}
