//! Board graph: the read-only view the planner consumes, plus an in-memory
//! implementation with TOML loading and procedural generation.

pub mod loader;
pub mod map;
pub mod mapgen;
pub mod view;

pub use loader::{load_map, parse_map};
pub use map::{Board, BoardBuilder, PlayerState, Region, Territory};
pub use mapgen::{deal_territories, generate_board, MapGenParams};
pub use view::BoardView;
