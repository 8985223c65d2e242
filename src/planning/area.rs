//! Areas and smart-area construction
//!
//! An area is the unit of takeover planning: usually one region, sometimes a
//! region plus a ring of neighbours when holding the larger set needs fewer
//! defended borders.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::board::view::BoardView;
use crate::core::config::PlannerConfig;
use crate::core::types::{PlayerId, RegionId, TerritoryId};

/// A planning set of territories, possibly spanning several regions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub territories: BTreeSet<TerritoryId>,
    /// Regions wholly inside the area
    pub regions: Vec<RegionId>,
    /// Sum of the contained regions' bonuses
    pub bonus: u32,
    /// Region the area was grown from, if any
    pub seed_region: Option<RegionId>,
}

impl Area {
    pub fn from_territories<B: BoardView>(board: &B, territories: BTreeSet<TerritoryId>) -> Self {
        let regions: Vec<RegionId> = board
            .region_ids()
            .into_iter()
            .filter(|&r| {
                let members = board.region_members(r);
                !members.is_empty() && members.iter().all(|t| territories.contains(t))
            })
            .collect();
        let bonus = regions.iter().map(|&r| board.region_bonus(r)).sum();
        Self {
            territories,
            regions,
            bonus,
            seed_region: None,
        }
    }

    pub fn from_region<B: BoardView>(board: &B, region: RegionId) -> Self {
        let territories = board.region_members(region).iter().copied().collect();
        let mut area = Self::from_territories(board, territories);
        area.seed_region = Some(region);
        area
    }

    pub fn contains(&self, territory: TerritoryId) -> bool {
        self.territories.contains(&territory)
    }

    pub fn len(&self) -> usize {
        self.territories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }

    pub fn borders<B: BoardView>(&self, board: &B) -> Vec<TerritoryId> {
        area_borders(board, &self.territories)
    }
}

/// Territories of `set` with at least one neighbour outside it
pub fn area_borders<B: BoardView>(board: &B, set: &BTreeSet<TerritoryId>) -> Vec<TerritoryId> {
    set.iter()
        .copied()
        .filter(|&t| board.neighbors(t).iter().any(|n| !set.contains(n)))
        .collect()
}

/// Remove added territories that do not help consolidate the grown set
///
/// An added territory goes if it is itself a border and touches at most one
/// non-border member; this repeats until nothing changes. Territories of
/// `original` are never removed, and since each removal trades one border
/// for at most one new border the border count never grows.
pub fn prune_added_territories<B: BoardView>(
    board: &B,
    grown: &BTreeSet<TerritoryId>,
    original: &BTreeSet<TerritoryId>,
) -> (BTreeSet<TerritoryId>, usize) {
    let mut set = grown.clone();
    loop {
        let borders: BTreeSet<TerritoryId> = area_borders(board, &set).into_iter().collect();
        let removable = set
            .iter()
            .copied()
            .filter(|t| !original.contains(t) && borders.contains(t))
            .find(|&t| interior_contacts(board, &set, &borders, t) <= 1);
        match removable {
            Some(t) => {
                set.remove(&t);
            }
            None => return (set, borders.len()),
        }
    }
}

/// Non-border members of `set` adjacent to `territory` in either direction
fn interior_contacts<B: BoardView>(
    board: &B,
    set: &BTreeSet<TerritoryId>,
    borders: &BTreeSet<TerritoryId>,
    territory: TerritoryId,
) -> usize {
    set.iter()
        .filter(|&&u| u != territory && !borders.contains(&u))
        .filter(|&&u| board.neighbors(u).contains(&territory) || board.neighbors(territory).contains(&u))
        .count()
}

/// Territories of regions wholly held by an ally of `player`
fn ally_blacklist<B: BoardView>(board: &B, player: PlayerId, exempt: RegionId) -> BTreeSet<TerritoryId> {
    board
        .region_ids()
        .into_iter()
        .filter(|&r| r != exempt)
        .filter(|&r| matches!(board.region_owner(r), Some(o) if board.is_allied(player, o)))
        .flat_map(|r| board.region_members(r).to_vec())
        .collect()
}

/// Grow `region` into the area with the fewest borders worth holding
pub fn compute_smart_area<B: BoardView>(
    board: &B,
    region: RegionId,
    player: PlayerId,
    config: &PlannerConfig,
) -> Area {
    let original: BTreeSet<TerritoryId> = board.region_members(region).iter().copied().collect();
    let original_borders = area_borders(board, &original).len();
    if original_borders == 0 || original.is_empty() {
        return Area::from_region(board, region);
    }

    let blacklist = ally_blacklist(board, player, region);
    let original_size = original.len() as f64;

    // (territories, border count, layer); layer 0 is the plain region
    let mut candidates: Vec<(BTreeSet<TerritoryId>, usize, usize)> =
        vec![(original.clone(), original_borders, 0)];
    let mut current = original.clone();

    for layer in 1..=config.smart_area_layers {
        let added: BTreeSet<TerritoryId> = area_borders(board, &current)
            .into_iter()
            .flat_map(|b| board.neighbors(b).to_vec())
            .filter(|t| !current.contains(t) && !blacklist.contains(t))
            .collect();
        if added.is_empty() {
            break;
        }

        let mut grown = current.clone();
        grown.extend(added);
        let (pruned, border_count) = prune_added_territories(board, &grown, &original);
        if pruned == current {
            break;
        }

        let ratio = (border_count as f64 / original_borders as f64)
            / (original_size / pruned.len() as f64);
        tracing::trace!(
            "Region {} layer {}: {} territories, {} borders, ratio {:.3}",
            region,
            layer,
            pruned.len(),
            border_count,
            ratio
        );
        if ratio < config.smart_area_ratio_limit {
            candidates.push((pruned.clone(), border_count, layer));
        }
        current = pruned;
    }

    let best = candidates
        .into_iter()
        .min_by_key(|(_, borders, layer)| (*borders, *layer))
        .map(|(set, _, _)| set)
        .unwrap_or(original);

    let mut area = Area::from_territories(board, best);
    area.seed_region = Some(region);
    area
}

/// Smart areas for every region not wholly held by an ally, deduplicated
pub fn compute_smart_areas<B: BoardView>(board: &B, player: PlayerId, config: &PlannerConfig) -> Vec<Area> {
    let mut areas: Vec<Area> = Vec::new();
    for region in board.region_ids() {
        if matches!(board.region_owner(region), Some(o) if board.is_allied(player, o)) {
            continue;
        }
        let area = compute_smart_area(board, region, player, config);
        if areas.iter().any(|a| a.territories == area.territories) {
            continue;
        }
        areas.push(area);
    }
    areas
}

/// Split `territories` into groups connected by links in either direction
pub fn territory_clusters<B: BoardView>(board: &B, territories: &BTreeSet<TerritoryId>) -> Vec<BTreeSet<TerritoryId>> {
    let mut seen: BTreeSet<TerritoryId> = BTreeSet::new();
    let mut clusters = Vec::new();
    for &start in territories {
        if !seen.insert(start) {
            continue;
        }
        let mut cluster = BTreeSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(t) = queue.pop_front() {
            cluster.insert(t);
            for &n in board.neighbors(t).iter().chain(board.incoming(t)) {
                if territories.contains(&n) && seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        clusters.push(cluster);
    }
    clusters
}
