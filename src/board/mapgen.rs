//! Procedural board generation
//!
//! Regions are small chains of territories with a few internal shortcuts,
//! arranged in a ring with occasional cross links. Territories are dealt
//! round-robin to the players with one army each.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::board::map::{Board, BoardBuilder};
use crate::core::types::{PlayerId, TerritoryId};

const REGION_NAMES: [&str; 10] = [
    "Aldmark", "Brenhold", "Corvale", "Dunreach", "Eastmere", "Fallowmoor", "Greywater",
    "Highcairn", "Ironvale", "Jadecoast",
];

/// Parameters for `generate_board`
#[derive(Debug, Clone, Copy)]
pub struct MapGenParams {
    pub regions: usize,
    pub players: usize,
    pub min_region_size: usize,
    pub max_region_size: usize,
    /// Chance of an extra internal link per territory
    pub shortcut_chance: f64,
    /// Chance of a cross link from each region to a random other region
    pub cross_link_chance: f64,
}

impl Default for MapGenParams {
    fn default() -> Self {
        Self {
            regions: 6,
            players: 3,
            min_region_size: 3,
            max_region_size: 6,
            shortcut_chance: 0.3,
            cross_link_chance: 0.35,
        }
    }
}

/// Generate a connected board and deal it to the players
pub fn generate_board(seed: u64, params: MapGenParams) -> Board {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut builder = BoardBuilder::new();
    let mut members: Vec<Vec<TerritoryId>> = Vec::new();

    for r in 0..params.regions.max(1) {
        let base = REGION_NAMES[r % REGION_NAMES.len()];
        let name = if r < REGION_NAMES.len() {
            base.to_string()
        } else {
            format!("{} {}", base, r / REGION_NAMES.len() + 1)
        };
        // Bonus is patched in once the border count is known
        let region = builder.region(&name, 0);
        let min_size = params.min_region_size.max(1);
        let size = rng.gen_range(min_size..=params.max_region_size.max(min_size));
        let ids: Vec<TerritoryId> = (0..size)
            .map(|i| builder.territory(&format!("{} {}", name, i + 1), region))
            .collect();

        for pair in ids.windows(2) {
            builder.connect(pair[0], pair[1]);
        }
        for i in 0..ids.len() {
            if ids.len() > 2 && rng.gen_bool(params.shortcut_chance) {
                let j = rng.gen_range(0..ids.len());
                builder.connect(ids[i], ids[j]);
            }
        }
        members.push(ids);
    }

    let mut gateways: Vec<Vec<TerritoryId>> = vec![Vec::new(); members.len()];
    let region_count = members.len();
    let mut link = |rng: &mut ChaCha8Rng, builder: &mut BoardBuilder, a: usize, b: usize| {
        let from = *members[a].choose(rng).unwrap_or(&members[a][0]);
        let to = *members[b].choose(rng).unwrap_or(&members[b][0]);
        builder.connect(from, to);
        gateways[a].push(from);
        gateways[b].push(to);
    };

    if region_count > 1 {
        for r in 0..region_count {
            let next = (r + 1) % region_count;
            if region_count == 2 && r == 1 {
                break;
            }
            link(&mut rng, &mut builder, r, next);
            if region_count > 3 && rng.gen_bool(params.cross_link_chance) {
                let other = rng.gen_range(0..region_count);
                if other != r && other != next {
                    link(&mut rng, &mut builder, r, other);
                }
            }
        }
    }

    for p in 0..params.players {
        builder.player(&format!("Player {}", p + 1));
    }

    let mut board = builder.build();
    for (r, region) in board.regions.iter_mut().enumerate() {
        let mut borders = gateways[r].clone();
        borders.sort();
        borders.dedup();
        region.bonus = ((region.members.len() as u32).saturating_sub(1) + borders.len() as u32 / 2).max(1);
    }

    deal_territories(&mut board, &mut rng);

    tracing::debug!(
        "Generated board: {} regions, {} territories (seed {})",
        board.regions.len(),
        board.territories.len(),
        seed
    );
    board
}

/// Shuffle the territories and deal them round-robin to the board's
/// players, one army each
pub fn deal_territories<R: Rng>(board: &mut Board, rng: &mut R) {
    let players = board.players.len();
    if players == 0 {
        return;
    }
    let mut deal: Vec<TerritoryId> = board.territories.iter().map(|t| t.id).collect();
    deal.shuffle(rng);
    for (i, territory) in deal.into_iter().enumerate() {
        let owner = PlayerId((i % players) as u32);
        board.set_owner(territory, Some(owner), 1);
    }
}
