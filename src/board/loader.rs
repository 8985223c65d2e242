//! Map file loading
//!
//! Maps are TOML documents listing regions (with their territories) and the
//! links between territories. Players and a starting position are optional.

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use serde::Deserialize;

use crate::board::map::{Board, BoardBuilder};
use crate::core::error::{PlannerError, Result};
use crate::core::types::{PlayerId, TerritoryId};

#[derive(Debug, Deserialize)]
struct MapFile {
    #[serde(default)]
    name: String,
    regions: Vec<RegionEntry>,
    #[serde(default)]
    links: Vec<LinkEntry>,
    #[serde(default)]
    players: Vec<String>,
    #[serde(default)]
    start: Vec<StartEntry>,
}

#[derive(Debug, Deserialize)]
struct RegionEntry {
    name: String,
    bonus: u32,
    territories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LinkEntry {
    from: String,
    to: String,
    #[serde(default)]
    one_way: bool,
}

#[derive(Debug, Deserialize)]
struct StartEntry {
    territory: String,
    owner: String,
    armies: u32,
}

/// Load a board from a TOML map file
pub fn load_map(path: impl AsRef<Path>) -> Result<Board> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_map(&contents)
}

/// Parse a board from TOML map text
pub fn parse_map(contents: &str) -> Result<Board> {
    let file: MapFile = toml::from_str(contents)?;
    let mut builder = BoardBuilder::new();
    let mut by_name: AHashMap<String, TerritoryId> = AHashMap::new();

    for entry in &file.regions {
        let region = builder.region(&entry.name, entry.bonus);
        for name in &entry.territories {
            if by_name.contains_key(name) {
                return Err(PlannerError::InvalidMap(format!(
                    "territory '{}' listed twice in map '{}'",
                    name, file.name
                )));
            }
            let id = builder.territory(name, region);
            by_name.insert(name.clone(), id);
        }
    }

    let lookup = |name: &str| {
        by_name
            .get(name)
            .copied()
            .ok_or_else(|| PlannerError::InvalidMap(format!("unknown territory '{}'", name)))
    };

    for link in &file.links {
        let from = lookup(&link.from)?;
        let to = lookup(&link.to)?;
        if link.one_way {
            builder.connect_one_way(from, to);
        } else {
            builder.connect(from, to);
        }
    }

    let mut players: AHashMap<String, PlayerId> = AHashMap::new();
    for name in &file.players {
        players.insert(name.clone(), builder.player(name));
    }

    let mut board = builder.build();
    for start in &file.start {
        let territory = lookup(&start.territory)?;
        let owner = players.get(&start.owner).copied().ok_or_else(|| {
            PlannerError::InvalidMap(format!("unknown player '{}'", start.owner))
        })?;
        board.set_owner(territory, Some(owner), start.armies);
    }

    tracing::debug!(
        "Loaded map '{}': {} territories, {} regions",
        file.name,
        board.territories.len(),
        board.regions.len()
    );
    Ok(board)
}
