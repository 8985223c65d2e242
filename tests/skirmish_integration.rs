//! End-to-end skirmishes between planner-driven players

use conquest_planner::board::{deal_territories, generate_board, load_map, BoardView, MapGenParams};
use conquest_planner::core::{PlannerConfig, PlayerId};
use conquest_planner::sim::{Skirmish, SkirmishConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn planner() -> PlannerConfig {
    PlannerConfig {
        enumeration_cap: 2_000,
        ..PlannerConfig::default()
    }
}

#[test]
fn test_skirmish_is_reproducible() {
    let config = SkirmishConfig {
        seed: 9,
        max_turns: 30,
        ..SkirmishConfig::default()
    };
    let board = generate_board(9, MapGenParams::default());
    let a = Skirmish::new(board.clone(), planner(), config.clone()).run();
    let b = Skirmish::new(board, planner(), config).run();

    assert_eq!(a.winner, b.winner);
    assert_eq!(a.turns, b.turns);
    assert_eq!(a.reports, b.reports);
    assert!(a.turns <= 30);
}

#[test]
fn test_reports_track_each_turn() {
    let config = SkirmishConfig {
        seed: 3,
        max_turns: 12,
        ..SkirmishConfig::default()
    };
    let board = generate_board(3, MapGenParams::default());
    let output = Skirmish::new(board, planner(), config).run();

    for (i, report) in output.reports.iter().enumerate() {
        assert_eq!(report.turn, i as u32 + 1);
        assert!(report.placed >= report.income + report.cashed);
        assert!(report.conquered <= report.attacks);
    }
    if let Some(winner) = output.winner {
        let last = output.reports.last().unwrap();
        assert_eq!(last.player, winner);
    }

    let json = serde_json::to_string(&output).unwrap();
    assert!(json.contains("\"reports\""));
}

#[test]
fn test_shipped_map_plays() {
    let mut board = load_map(concat!(env!("CARGO_MANIFEST_DIR"), "/data/maps/twin_continents.toml")).unwrap();
    for p in 0..3 {
        board.add_player(&format!("Player {}", p + 1));
    }
    deal_territories(&mut board, &mut ChaCha8Rng::seed_from_u64(4));
    assert!(board.territory_ids().all(|t| board.owner(t).is_some()));

    let config = SkirmishConfig {
        seed: 4,
        max_turns: 15,
        ..SkirmishConfig::default()
    };
    let output = Skirmish::new(board, planner(), config).run();
    assert!(!output.reports.is_empty());
    assert!(output.reports.iter().all(|r| r.player.index() < 3));
    assert!(output.winner.map_or(true, |w| w < PlayerId(3)));
}
