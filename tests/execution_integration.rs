//! Integration tests for turn execution against the simulated host

use conquest_planner::board::{generate_board, Board, BoardBuilder, BoardView, MapGenParams};
use conquest_planner::core::{PlannerConfig, PlayerId, TerritoryId};
use conquest_planner::host::{play_turn, GameHost};
use conquest_planner::planning::PlanningSession;
use conquest_planner::sim::SimHost;

const ME: PlayerId = PlayerId(0);
const FOE: PlayerId = PlayerId(1);

fn small_config() -> PlannerConfig {
    PlannerConfig {
        enumeration_cap: 2_000,
        ..PlannerConfig::default()
    }
}

#[test]
fn test_turns_on_generated_boards_keep_board_valid() {
    for seed in 0..3 {
        let board = generate_board(seed, MapGenParams::default());
        let mut host = SimHost::new(board, seed);
        let mut sessions: Vec<PlanningSession> = host
            .player_ids()
            .into_iter()
            .map(|p| PlanningSession::new(p, small_config()))
            .collect();

        for _round in 0..3 {
            for session in &mut sessions {
                let player = session.player();
                if !host.is_alive(player) {
                    continue;
                }
                host.board.turn += 1;
                let income = host.income(player);
                let summary = play_turn(&mut host, session, income);
                assert_eq!(summary.placed, income);
                assert!(summary.conquered <= summary.attacks);

                for t in host.territory_ids() {
                    if host.owner(t).is_some() {
                        assert!(host.armies(t) >= 1, "{} left empty", t);
                    }
                }
            }
        }
    }
}

/// Home(0, 12 armies) - Near(1) - Far(2), all of Near and Far enemy held
fn corridor() -> Board {
    let mut b = BoardBuilder::new();
    let r = b.region("Corridor", 2);
    let home = b.territory("Home", r);
    let near = b.territory("Near", r);
    let far = b.territory("Far", r);
    b.connect(home, near);
    b.connect(near, far);
    b.player("me");
    b.player("foe");
    let mut board = b.build();
    board.set_owner(home, Some(ME), 12);
    board.set_owner(near, Some(FOE), 1);
    board.set_owner(far, Some(FOE), 1);
    board
}

#[test]
fn test_attack_orders_follow_the_planned_route() {
    let mut host = SimHost::new(corridor(), 11);
    let mut session = PlanningSession::new(ME, PlannerConfig::default());
    let outcome = session.plan_placement(&host, 4, false);
    for p in &outcome.placements {
        host.place_armies(p.territory, p.amount);
    }

    let order = session.next_attack(&host).unwrap();
    assert_eq!(order.from, TerritoryId(0));
    assert_eq!(order.to, TerritoryId(1));
    assert!(order.all_out);

    // Nothing to move into a territory that was not the last target
    assert_eq!(session.armies_to_move(&host, TerritoryId(2)), 0);

    let result = host.attack(order.from, order.to, order.all_out);
    if result.conquered {
        let amount = session.armies_to_move(&host, TerritoryId(1));
        assert!(amount < host.armies(TerritoryId(0)));
        host.move_armies(order.from, order.to, amount);
        let next = session.next_attack(&host).unwrap();
        assert_eq!((next.from, next.to), (TerritoryId(1), TerritoryId(2)));
    }
}

#[test]
fn test_redistribution_transfers_are_legal_moves() {
    // Everything is ours except a far enemy corner; the core holds a pile
    let mut b = BoardBuilder::new();
    let home = b.region("Home", 3);
    let out = b.region("Out", 1);
    let core = b.territory("Core", home);
    let mid = b.territory("Mid", home);
    let edge = b.territory("Edge", home);
    let enemy = b.territory("Enemy", out);
    b.connect(core, mid);
    b.connect(mid, edge);
    b.connect(edge, enemy);
    b.player("me");
    b.player("foe");
    let mut board = b.build();
    board.set_owner(core, Some(ME), 9);
    board.set_owner(mid, Some(ME), 1);
    board.set_owner(edge, Some(ME), 2);
    board.set_owner(enemy, Some(FOE), 3);

    let mut host = SimHost::new(board, 5);
    let mut session = PlanningSession::new(ME, PlannerConfig::default());
    let transfers = session.plan_redistribution(&host);
    assert!(!transfers.is_empty());

    let before = host.total_armies(ME);
    for transfer in &transfers {
        assert!(transfer.amount > 0);
        for hop in transfer.path.windows(2) {
            assert!(host.neighbors(hop[0]).contains(&hop[1]));
            assert!(host.fortify(hop[0], hop[1], transfer.amount));
        }
    }
    assert_eq!(host.total_armies(ME), before);
    assert_eq!(host.armies(core), 1);
    assert_eq!(host.armies(edge), 10);
}
