//! Route-set merging
//!
//! Reduces an exhaustive route set to a covering forest: every target is
//! conquered by exactly one route and shared prefixes appear once, as forks.

use std::collections::BTreeSet;

use crate::core::types::TerritoryId;
use crate::planning::route::Route;

/// Pick a minimal set of routes covering every target of `routes`
///
/// The longest remaining route is taken first (ties: one ending on a border,
/// then the earliest). It is cut to start at its last territory shared with
/// a route already chosen, which turns it into a fork of that route.
/// Candidates whose final territory is already covered are discarded.
/// Single-territory garrison markers are passed through at the end.
pub fn pick_covering_routes(routes: &[Route], borders: &BTreeSet<TerritoryId>) -> Vec<Route> {
    let (mut candidates, markers): (Vec<Route>, Vec<Route>) =
        routes.iter().filter(|r| !r.is_empty()).cloned().partition(|r| r.is_attack());

    let mut uncovered: BTreeSet<TerritoryId> = candidates
        .iter()
        .flat_map(|r| r.targets().iter().copied())
        .collect();
    let mut chosen_territories: BTreeSet<TerritoryId> = BTreeSet::new();
    let mut chosen: Vec<Route> = Vec::new();

    while !uncovered.is_empty() && !candidates.is_empty() {
        let best = candidates
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| {
                a.len()
                    .cmp(&b.len())
                    .then_with(|| borders.contains(&a.end()).cmp(&borders.contains(&b.end())))
                    .then_with(|| ib.cmp(ia))
            })
            .map(|(i, _)| i);
        let Some(best) = best else {
            break;
        };

        let route = candidates.remove(best);
        let cut = route
            .territories()
            .iter()
            .rposition(|t| chosen_territories.contains(t))
            .unwrap_or(0);
        let piece = Route::new(route.territories()[cut..].to_vec());

        if piece.is_attack() {
            for &t in piece.targets() {
                uncovered.remove(&t);
            }
            chosen_territories.extend(piece.territories().iter().copied());
            chosen.push(piece);
        }

        candidates.retain(|c| !chosen_territories.contains(&c.end()));
    }

    chosen.extend(markers);
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn route(ids: &[u32]) -> Route {
        Route::new(ids.iter().map(|&i| TerritoryId(i)).collect())
    }

    fn coverage(routes: &[Route]) -> BTreeMap<TerritoryId, usize> {
        let mut counts = BTreeMap::new();
        for r in routes {
            for &t in r.targets() {
                *counts.entry(t).or_insert(0) += 1;
            }
        }
        counts
    }

    #[test]
    fn test_shared_prefix_becomes_fork() {
        // 0 -> 1 -> 2 -> 3 and 0 -> 1 -> 4
        let input = vec![route(&[0, 1, 2, 3]), route(&[0, 1, 4]), route(&[0])];
        let merged = pick_covering_routes(&input, &BTreeSet::new());
        assert_eq!(merged, vec![route(&[0, 1, 2, 3]), route(&[1, 4]), route(&[0])]);
    }

    #[test]
    fn test_each_target_covered_exactly_once() {
        let input = vec![
            route(&[0, 1, 2]),
            route(&[0, 1, 3, 4]),
            route(&[0, 5, 3, 4]),
            route(&[0, 5, 6]),
            route(&[0, 1, 3, 2]),
        ];
        let merged = pick_covering_routes(&input, &BTreeSet::new());
        let counts = coverage(&merged);
        let expected: BTreeSet<TerritoryId> = (1..=6).map(TerritoryId).collect();
        assert_eq!(counts.keys().copied().collect::<BTreeSet<_>>(), expected);
        assert!(counts.values().all(|&c| c == 1));
    }

    #[test]
    fn test_border_ending_breaks_length_ties() {
        let input = vec![route(&[0, 1, 2]), route(&[0, 3, 4])];
        let borders: BTreeSet<TerritoryId> = [TerritoryId(4)].into_iter().collect();
        let merged = pick_covering_routes(&input, &borders);
        assert_eq!(merged[0], route(&[0, 3, 4]));
    }

    #[test]
    fn test_merging_is_deterministic() {
        let input = vec![
            route(&[7, 1, 2]),
            route(&[7, 1, 3]),
            route(&[7, 4]),
            route(&[7]),
        ];
        let borders: BTreeSet<TerritoryId> = [TerritoryId(3)].into_iter().collect();
        let first = pick_covering_routes(&input, &borders);
        let second = pick_covering_routes(&input, &borders);
        assert_eq!(first, second);
        // Re-merging a merged forest changes nothing
        assert_eq!(pick_covering_routes(&first, &borders), first);
    }
}
