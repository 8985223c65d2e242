//! Per-player planning session
//!
//! The session owns everything a player carries between phase calls: the
//! smart areas for the turn, the route plan and its claims, the garrison
//! maps and the execution driver. Every phase call re-reads the board.

use crate::board::view::BoardView;
use crate::core::config::PlannerConfig;
use crate::core::types::{PlayerId, TerritoryId, Turn};
use crate::execution::driver::{AttackOrder, Driver};
use crate::execution::redistribution::{plan_redistribution, Transfer};
use crate::planning::allocation::{AllocationOutcome, Allocator, Commitments};
use crate::planning::area::{compute_smart_areas, Area};
use crate::planning::garrison::GarrisonMap;
use crate::planning::route::RoutePlan;

#[derive(Debug, Clone)]
pub struct PlanningSession {
    player: PlayerId,
    config: PlannerConfig,
    turn: Option<Turn>,
    areas: Vec<Area>,
    commitments: Commitments,
    driver: Driver,
}

impl PlanningSession {
    pub fn new(player: PlayerId, config: PlannerConfig) -> Self {
        Self {
            player,
            config,
            turn: None,
            areas: Vec::new(),
            commitments: Commitments::new(),
            driver: Driver::new(),
        }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn plan(&self) -> &RoutePlan {
        &self.commitments.plan
    }

    pub fn garrisons(&self) -> &GarrisonMap {
        &self.commitments.garrisons
    }

    pub fn is_claimed(&self, territory: TerritoryId) -> bool {
        self.commitments.claimed.contains(&territory)
    }

    /// Reset per-turn state the first time a new turn is seen
    pub fn begin_turn<B: BoardView>(&mut self, board: &B) {
        if self.turn == Some(board.turn()) {
            return;
        }
        self.turn = Some(board.turn());
        self.commitments.garrisons.reset_for_turn(board, self.player);
        self.commitments.clear_plan();
        self.driver.reset();
        self.areas = compute_smart_areas(board, self.player, &self.config);
        tracing::debug!(
            "Player {} begins turn {} with {} areas and {} garrisons",
            self.player,
            board.turn(),
            self.areas.len(),
            self.commitments.garrisons.len()
        );
    }

    /// Spend `budget` reinforcements
    ///
    /// May be called again mid-turn (for example after an elimination hands
    /// over cards); the route plan is then rebuilt against the live board
    /// while the driver finishes the route it is walking.
    pub fn plan_placement<B: BoardView>(&mut self, board: &B, budget: u32, initial: bool) -> AllocationOutcome {
        self.begin_turn(board);
        self.commitments.clear_plan();
        let outcome = Allocator::new(
            board,
            self.player,
            &self.config,
            &self.areas,
            &mut self.commitments,
            budget,
            initial,
        )
        .run();
        tracing::info!(
            "Player {} placed {} of {} armies over {} objectives; {} routes planned",
            self.player,
            outcome.total_placed(),
            budget,
            outcome.accepted.len(),
            self.commitments.plan.len()
        );
        outcome
    }

    pub fn next_attack<B: BoardView>(&mut self, board: &B) -> Option<AttackOrder> {
        self.begin_turn(board);
        self.driver
            .next_attack(board, self.player, &mut self.commitments, &self.config)
    }

    pub fn armies_to_move<B: BoardView>(&self, board: &B, conquered: TerritoryId) -> u32 {
        self.driver.armies_to_move(board, conquered)
    }

    pub fn plan_redistribution<B: BoardView>(&mut self, board: &B) -> Vec<Transfer> {
        self.begin_turn(board);
        plan_redistribution(
            board,
            self.player,
            &self.areas,
            &self.commitments.garrisons,
            &self.config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::map::{Board, BoardBuilder};

    fn duel_board() -> Board {
        let mut b = BoardBuilder::new();
        let r = b.region("Line", 2);
        let ts: Vec<_> = (0..4).map(|i| b.territory(&format!("L{}", i), r)).collect();
        for w in ts.windows(2) {
            b.connect(w[0], w[1]);
        }
        b.player("me");
        b.player("foe");
        let mut board = b.build();
        board.set_owner(ts[0], Some(PlayerId(0)), 3);
        board.set_owner(ts[1], Some(PlayerId(1)), 1);
        board.set_owner(ts[2], Some(PlayerId(1)), 1);
        board.set_owner(ts[3], Some(PlayerId(1)), 1);
        board
    }

    #[test]
    fn test_turn_change_clears_plan() {
        let mut board = duel_board();
        let mut session = PlanningSession::new(PlayerId(0), PlannerConfig::default());
        let outcome = session.plan_placement(&board, 6, false);
        assert_eq!(outcome.total_placed(), 6);
        assert!(!session.plan().is_empty());
        assert!(session.is_claimed(TerritoryId(1)));

        board.turn += 1;
        session.begin_turn(&board);
        assert!(session.plan().is_empty());
        assert!(!session.is_claimed(TerritoryId(1)));
    }

    #[test]
    fn test_first_attack_follows_plan() {
        let mut board = duel_board();
        let mut session = PlanningSession::new(PlayerId(0), PlannerConfig::default());
        let outcome = session.plan_placement(&board, 6, false);
        for p in &outcome.placements {
            board.add_armies(p.territory, p.amount);
        }
        let order = session.next_attack(&board).unwrap();
        assert_eq!(order.from, TerritoryId(0));
        assert_eq!(order.to, TerritoryId(1));
    }

    /// L0 - L1 - L2 in a line with X hanging off L0; X starts ours
    fn branch_board() -> Board {
        let mut b = BoardBuilder::new();
        let r = b.region("Branch", 2);
        let l0 = b.territory("L0", r);
        let l1 = b.territory("L1", r);
        let l2 = b.territory("L2", r);
        let x = b.territory("X", r);
        b.connect(l0, l1);
        b.connect(l1, l2);
        b.connect(l0, x);
        b.player("me");
        b.player("foe");
        let mut board = b.build();
        board.set_owner(l0, Some(PlayerId(0)), 10);
        board.set_owner(l1, Some(PlayerId(1)), 1);
        board.set_owner(l2, Some(PlayerId(1)), 1);
        board.set_owner(x, Some(PlayerId(0)), 1);
        board
    }

    #[test]
    fn test_replanning_mid_route_finishes_route_in_flight() {
        let me = PlayerId(0);
        let x = TerritoryId(3);
        let mut board = branch_board();
        let mut session = PlanningSession::new(me, PlannerConfig::default());
        let outcome = session.plan_placement(&board, 4, false);
        for p in &outcome.placements {
            board.add_armies(p.territory, p.amount);
        }

        let order = session.next_attack(&board).unwrap();
        assert_eq!((order.from, order.to), (TerritoryId(0), TerritoryId(1)));
        let in_flight = session.driver.current_route().cloned().unwrap();
        assert!(!in_flight.contains(x));

        // L1 falls, then X is lost before bonus armies arrive
        board.set_owner(TerritoryId(1), Some(me), 8);
        board.set_owner(x, Some(PlayerId(1)), 1);
        board.set_armies(TerritoryId(0), 20);

        let outcome = session.plan_placement(&board, 20, false);
        for p in &outcome.placements {
            board.add_armies(p.territory, p.amount);
        }
        assert_eq!(session.driver.current_route(), Some(&in_flight));
        assert!(session.plan().targets().any(|t| t == x));

        // The old route is walked to its end first
        for hop in in_flight.territories()[1..].windows(2) {
            let order = session.next_attack(&board).unwrap();
            assert_eq!((order.from, order.to), (hop[0], hop[1]));
            board.set_owner(order.to, Some(me), 6);
        }

        // Then the rebuilt plan takes over
        let order = session.next_attack(&board).unwrap();
        assert_eq!((order.from, order.to), (TerritoryId(0), x));
        assert!(!session.driver.is_mopping_up());
    }
}
