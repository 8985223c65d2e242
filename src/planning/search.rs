//! Route finding over the territory graph
//!
//! Two searches: a Dijkstra-style cheapest route from our territory into a
//! target area, and a bounded exhaustive enumeration of attack routes that
//! sweep an area.

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};

use ahash::{AHashMap, AHashSet};

use crate::board::view::BoardView;
use crate::core::error::{PlannerError, Result};
use crate::core::types::TerritoryId;
use crate::planning::area::area_borders;
use crate::planning::projection::Projection;
use crate::planning::route::Route;

/// Node in the search frontier
#[derive(Debug, Clone)]
struct FrontierNode {
    territory: TerritoryId,
    cost: i64,
    /// Insertion order, so equal costs pop first-in first-out
    seq: u64,
}

impl PartialEq for FrontierNode {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}

impl Eq for FrontierNode {}

impl Ord for FrontierNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Area territories an attacker can enter through: borders, plus any
/// territory reachable from outside over a one-way link
fn entry_points<B: BoardView>(board: &B, area: &BTreeSet<TerritoryId>) -> Vec<TerritoryId> {
    let mut seeds: BTreeSet<TerritoryId> = area_borders(board, area).into_iter().collect();
    seeds.extend(
        area.iter()
            .copied()
            .filter(|&t| board.incoming(t).iter().any(|p| !area.contains(p))),
    );
    seeds.into_iter().collect()
}

/// Cheapest route from a projected-owned territory into `area`
///
/// The search runs backwards from the area's entry points. Each traversed
/// territory adds its armies to the running cost, or credits them when it is
/// ours; the first of our territories to leave the frontier launches the
/// route. If we already hold part of the area the route is that territory
/// alone.
pub fn cheapest_route_to_area<B: BoardView>(
    proj: &Projection<'_, B>,
    area: &BTreeSet<TerritoryId>,
    count_border_strength: bool,
) -> Result<Route> {
    if let Some(&owned) = area.iter().find(|&&t| proj.is_mine(t)) {
        return Ok(Route::single(owned));
    }

    let board = proj.board;
    let seeds = entry_points(board, area);
    let mut frontier = BinaryHeap::new();
    let mut best: AHashMap<TerritoryId, i64> = AHashMap::new();
    let mut came_from: AHashMap<TerritoryId, TerritoryId> = AHashMap::new();
    let mut settled: AHashSet<TerritoryId> = AHashSet::new();
    let mut seq = 0u64;

    for &seed in &seeds {
        let cost = if count_border_strength {
            proj.armies(seed) as i64
        } else {
            0
        };
        best.insert(seed, cost);
        frontier.push(FrontierNode {
            territory: seed,
            cost,
            seq,
        });
        seq += 1;
    }

    while let Some(current) = frontier.pop() {
        if !settled.insert(current.territory) {
            continue;
        }

        if proj.is_mine(current.territory) {
            return Ok(reconstruct_route(&came_from, current.territory));
        }

        for &prev in board.incoming(current.territory) {
            if settled.contains(&prev) {
                continue;
            }
            let armies = proj.armies(prev) as i64;
            let step = if proj.is_mine(prev) { -armies } else { armies };
            let tentative = current.cost + step;
            if best.get(&prev).map_or(true, |&known| tentative < known) {
                best.insert(prev, tentative);
                came_from.insert(prev, current.territory);
                frontier.push(FrontierNode {
                    territory: prev,
                    cost: tentative,
                    seq,
                });
                seq += 1;
            }
        }
    }

    Err(PlannerError::RouteNotFound { seeds: seeds.len() })
}

/// Follow predecessor links from the launch point down into the area
fn reconstruct_route(came_from: &AHashMap<TerritoryId, TerritoryId>, launch: TerritoryId) -> Route {
    let mut path = vec![launch];
    let mut current = launch;
    while let Some(&next) = came_from.get(&current) {
        path.push(next);
        current = next;
    }
    Route::new(path)
}

/// Every maximal attack route sweeping `area`
///
/// Routes start from each of our territories inside the area, or from the
/// cheapest entry route when we hold none of it, and extend through area
/// territories that are neither ours nor already on the route. At most
/// `cap` terminal routes are recorded per pass; when the cap cuts a pass
/// short, the territories it never reached are enumerated again as a
/// residual area. One single-territory route per territory we hold in the
/// area is appended last, marking garrison placements.
pub fn enumerate_area_routes<B: BoardView>(
    proj: &Projection<'_, B>,
    area: &BTreeSet<TerritoryId>,
    cap: usize,
) -> Vec<Route> {
    let cap = cap.max(1);
    let (mut routes, truncated) = sweep(proj, area, cap);

    if truncated {
        let mut uncovered = area.iter().filter(|&&t| !proj.is_mine(t)).count();
        loop {
            let covered: BTreeSet<TerritoryId> =
                routes.iter().flat_map(|r| r.targets().to_vec()).collect();
            let residual: BTreeSet<TerritoryId> = area
                .iter()
                .copied()
                .filter(|&t| !proj.is_mine(t) && !covered.contains(&t))
                .collect();
            if residual.is_empty() || residual.len() >= uncovered {
                break;
            }
            tracing::debug!(
                "Route enumeration hit cap {}, re-enumerating {} uncovered territories",
                cap,
                residual.len()
            );
            uncovered = residual.len();
            routes.extend(sweep(proj, &residual, cap).0);
        }
    }

    routes.extend(
        area.iter()
            .copied()
            .filter(|&t| proj.is_mine(t))
            .map(Route::single),
    );
    routes
}

/// One depth-first pass; the flag is set when the cap cut it short
fn sweep<B: BoardView>(
    proj: &Projection<'_, B>,
    area: &BTreeSet<TerritoryId>,
    cap: usize,
) -> (Vec<Route>, bool) {
    let board = proj.board;
    let owned_inside: Vec<TerritoryId> = area.iter().copied().filter(|&t| proj.is_mine(t)).collect();
    let prefixes: Vec<Vec<TerritoryId>> = if owned_inside.is_empty() {
        match cheapest_route_to_area(proj, area, false) {
            Ok(entry) => vec![entry.0],
            Err(e) => {
                tracing::debug!("No entry into area of {} territories: {}", area.len(), e);
                return (Vec::new(), false);
            }
        }
    } else {
        owned_inside.iter().map(|&t| vec![t]).collect()
    };

    let mut routes: Vec<Route> = Vec::new();

    for prefix in prefixes {
        // Each stack entry owns its path, so sibling branches never share
        // visited state
        let mut stack: Vec<Vec<TerritoryId>> = vec![prefix];
        while let Some(path) = stack.pop() {
            let tip = path[path.len() - 1];
            let extensions: Vec<TerritoryId> = board
                .neighbors(tip)
                .iter()
                .copied()
                .filter(|&n| area.contains(&n) && !proj.is_mine(n) && !path.contains(&n))
                .collect();

            if extensions.is_empty() {
                if path.len() > 1 {
                    routes.push(Route::new(path));
                    if routes.len() >= cap {
                        return (routes, true);
                    }
                }
                continue;
            }

            for &next in extensions.iter().rev() {
                let mut branch = path.clone();
                branch.push(next);
                stack.push(branch);
            }
        }
    }

    (routes, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map::{Board, BoardBuilder};
    use crate::core::types::PlayerId;
    use std::collections::BTreeMap;

    const ME: PlayerId = PlayerId(0);
    const FOE: PlayerId = PlayerId(1);

    /// me(0) - a(1) - b(2) - [c(3) - d(4)] with a second, stronger approach
    /// me(0) - e(5) - c(3)
    fn line_board() -> Board {
        let mut b = BoardBuilder::new();
        let home = b.region("Home", 1);
        let target = b.region("Target", 2);
        let me_t = b.territory("Me", home);
        let a = b.territory("A", home);
        let bb = b.territory("B", home);
        let c = b.territory("C", target);
        let d = b.territory("D", target);
        let e = b.territory("E", home);
        b.connect(me_t, a);
        b.connect(a, bb);
        b.connect(bb, c);
        b.connect(c, d);
        b.connect(me_t, e);
        b.connect(e, c);
        b.player("me");
        b.player("foe");
        let mut board = b.build();
        board.set_owner(me_t, Some(ME), 5);
        board.set_owner(a, Some(FOE), 1);
        board.set_owner(bb, Some(FOE), 1);
        board.set_owner(c, Some(FOE), 2);
        board.set_owner(d, Some(FOE), 2);
        board.set_owner(e, Some(FOE), 6);
        board
    }

    fn target_area() -> BTreeSet<TerritoryId> {
        [TerritoryId(3), TerritoryId(4)].into_iter().collect()
    }

    #[test]
    fn test_cheapest_route_prefers_weak_path() {
        let board = line_board();
        let claimed = BTreeSet::new();
        let placed = BTreeMap::new();
        let proj = Projection::new(&board, ME, &claimed, &placed);

        let route = cheapest_route_to_area(&proj, &target_area(), false).unwrap();
        assert_eq!(
            route.territories(),
            &[TerritoryId(0), TerritoryId(1), TerritoryId(2), TerritoryId(3)]
        );
    }

    #[test]
    fn test_owned_territory_in_area_is_trivial_route() {
        let mut board = line_board();
        board.set_owner(TerritoryId(4), Some(ME), 1);
        let claimed = BTreeSet::new();
        let placed = BTreeMap::new();
        let proj = Projection::new(&board, ME, &claimed, &placed);

        let route = cheapest_route_to_area(&proj, &target_area(), true).unwrap();
        assert_eq!(route, Route::single(TerritoryId(4)));
    }

    #[test]
    fn test_one_way_trap_is_not_found() {
        let mut b = BoardBuilder::new();
        let r = b.region("R", 1);
        let mine = b.territory("Mine", r);
        let trap = b.territory("Trap", r);
        b.connect_one_way(trap, mine);
        b.player("me");
        b.player("foe");
        let mut board = b.build();
        board.set_owner(mine, Some(ME), 3);
        board.set_owner(trap, Some(FOE), 1);

        let claimed = BTreeSet::new();
        let placed = BTreeMap::new();
        let proj = Projection::new(&board, ME, &claimed, &placed);
        let area: BTreeSet<_> = [trap].into_iter().collect();
        assert!(matches!(
            cheapest_route_to_area(&proj, &area, false),
            Err(PlannerError::RouteNotFound { .. })
        ));
    }

    #[test]
    fn test_enumeration_from_entry_route() {
        let board = line_board();
        let claimed = BTreeSet::new();
        let placed = BTreeMap::new();
        let proj = Projection::new(&board, ME, &claimed, &placed);

        let routes = enumerate_area_routes(&proj, &target_area(), 100);
        assert_eq!(routes.len(), 1);
        assert_eq!(
            routes[0].territories(),
            &[TerritoryId(0), TerritoryId(1), TerritoryId(2), TerritoryId(3), TerritoryId(4)]
        );
    }

    #[test]
    fn test_enumeration_appends_garrison_markers() {
        let mut board = line_board();
        board.set_owner(TerritoryId(3), Some(ME), 4);
        let claimed = BTreeSet::new();
        let placed = BTreeMap::new();
        let proj = Projection::new(&board, ME, &claimed, &placed);

        let routes = enumerate_area_routes(&proj, &target_area(), 100);
        assert_eq!(
            routes,
            vec![
                Route::new(vec![TerritoryId(3), TerritoryId(4)]),
                Route::single(TerritoryId(3)),
            ]
        );
    }

    #[test]
    fn test_enumeration_cap_recovers_residual() {
        // Star: hub owned, four spokes, each spoke with its own leaf
        let mut b = BoardBuilder::new();
        let r = b.region("Star", 4);
        let hub = b.territory("Hub", r);
        let mut area = BTreeSet::new();
        let mut spokes = Vec::new();
        for i in 0..4 {
            let spoke = b.territory(&format!("S{}", i), r);
            let leaf = b.territory(&format!("L{}", i), r);
            b.connect(hub, spoke);
            b.connect(spoke, leaf);
            area.insert(spoke);
            area.insert(leaf);
            spokes.push(spoke);
        }
        area.insert(hub);
        b.player("me");
        b.player("foe");
        let mut board = b.build();
        for t in board.territory_ids().collect::<Vec<_>>() {
            board.set_owner(t, Some(FOE), 1);
        }
        board.set_owner(hub, Some(ME), 10);

        let claimed = BTreeSet::new();
        let placed = BTreeMap::new();
        let proj = Projection::new(&board, ME, &claimed, &placed);

        let routes = enumerate_area_routes(&proj, &area, 2);
        let covered: BTreeSet<TerritoryId> =
            routes.iter().flat_map(|r| r.targets().to_vec()).collect();
        let hostile: BTreeSet<TerritoryId> = area.iter().copied().filter(|&t| t != hub).collect();
        assert_eq!(covered, hostile);
        assert_eq!(routes.last(), Some(&Route::single(hub)));
    }
}
