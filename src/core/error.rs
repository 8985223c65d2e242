use thiserror::Error;

use crate::core::types::{PlayerId, RegionId, TerritoryId};

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("No route reaches target area (seeded from {seeds} border territories)")]
    RouteNotFound { seeds: usize },

    #[error("Stale route hop {from} -> {to}: {reason}")]
    StaleRoute {
        from: TerritoryId,
        to: TerritoryId,
        reason: &'static str,
    },

    #[error("Unknown region target: {0}")]
    UnknownRegion(RegionId),

    #[error("Unknown player target: {0}")]
    UnknownPlayer(PlayerId),

    #[error("Unknown area target: {0}")]
    UnknownArea(usize),

    #[error("Invalid map: {0}")]
    InvalidMap(String),

    #[error("Invalid planner config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
