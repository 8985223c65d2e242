//! Conquest Planner - skirmish runner
//!
//! Plays planner-controlled players against each other on a generated or
//! loaded map and prints a per-turn report.

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use conquest_planner::board::{deal_territories, generate_board, load_map, Board, BoardView, MapGenParams};
use conquest_planner::core::error::Result;
use conquest_planner::core::PlannerConfig;
use conquest_planner::sim::{Skirmish, SkirmishConfig, SkirmishOutput};

/// Run planner-versus-planner skirmishes
#[derive(Parser, Debug)]
#[command(name = "conquest-planner")]
#[command(about = "Simulate a territory-control game between planner-driven players")]
struct Args {
    /// Random seed for map generation and dice
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of players
    #[arg(long, default_value_t = 3)]
    players: usize,

    /// Regions on a generated map
    #[arg(long, default_value_t = 6)]
    regions: usize,

    /// Player turns before the game is called a draw
    #[arg(long, default_value_t = 200)]
    turns: u32,

    /// Extra armies each player places before the first turn
    #[arg(long, default_value_t = 10)]
    initial_armies: u32,

    /// TOML map file to play on instead of a generated map
    #[arg(long)]
    map: Option<String>,

    /// TOML planner tuning file
    #[arg(long)]
    config: Option<String>,

    /// Print the full result as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn build_board(args: &Args) -> Result<Board> {
    let Some(path) = &args.map else {
        let params = MapGenParams {
            regions: args.regions,
            players: args.players,
            ..MapGenParams::default()
        };
        return Ok(generate_board(args.seed, params));
    };

    let mut board = load_map(path)?;
    let dealt = board.territory_ids().any(|t| board.owner(t).is_some());
    if !dealt {
        if board.players.is_empty() {
            for p in 0..args.players {
                board.add_player(&format!("Player {}", p + 1));
            }
        }
        let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
        deal_territories(&mut board, &mut rng);
    }
    Ok(board)
}

fn print_summary(board: &Board, output: &SkirmishOutput) {
    println!("=== CONQUEST PLANNER ===");
    for report in &output.reports {
        let eliminated = if report.eliminated.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = report
                .eliminated
                .iter()
                .map(|p| board.players[p.index()].name.as_str())
                .collect();
            format!(", eliminated {}", names.join(", "))
        };
        println!(
            "turn {:>3} {:<10} income {:>2} cards {:>2} | {:>2} attacks {:>2} taken{} | {:>2} territories {:>3} armies",
            report.turn,
            board.players[report.player.index()].name,
            report.income,
            report.cashed,
            report.attacks,
            report.conquered,
            eliminated,
            report.territories,
            report.armies
        );
    }
    match output.winner {
        Some(p) => println!("\n{} wins after {} turns", board.players[p.index()].name, output.turns),
        None => println!("\nNo winner after {} turns", output.turns),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("conquest_planner=info")),
        )
        .init();

    let args = Args::parse();

    let planner = match &args.config {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };
    let board = build_board(&args)?;
    tracing::info!(
        "Board ready: {} territories, {} regions, {} players",
        board.territory_count(),
        board.region_count(),
        board.player_count()
    );

    let skirmish_config = SkirmishConfig {
        seed: args.seed,
        max_turns: args.turns,
        initial_armies: args.initial_armies,
        ..SkirmishConfig::default()
    };
    let skirmish = Skirmish::new(board, planner, skirmish_config);
    let names = skirmish.board().clone();
    let output = skirmish.run();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&names, &output);
    }
    Ok(())
}
