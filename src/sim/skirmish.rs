//! Planner-versus-planner games on one board

use serde::{Deserialize, Serialize};

use crate::board::map::Board;
use crate::board::view::BoardView;
use crate::core::config::PlannerConfig;
use crate::core::types::{PlayerId, Turn};
use crate::host::{place_initial, play_turn};
use crate::planning::session::PlanningSession;
use crate::sim::host::SimHost;

/// Skirmish parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkirmishConfig {
    pub seed: u64,
    /// Player turns before the game is called a draw
    pub max_turns: u32,
    /// Extra armies each player places before the first turn
    pub initial_armies: u32,
    /// Hand size that forces a player to cash a set at turn start
    pub forced_cash_hand: u32,
}

impl Default for SkirmishConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_turns: 200,
            initial_armies: 10,
            forced_cash_hand: 5,
        }
    }
}

/// One player's turn, as reported by the skirmish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn: Turn,
    pub player: PlayerId,
    pub income: u32,
    pub cashed: u32,
    pub placed: u32,
    pub attacks: usize,
    pub conquered: usize,
    pub eliminated: Vec<PlayerId>,
    pub fortified: u32,
    pub territories: usize,
    pub armies: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkirmishOutput {
    pub winner: Option<PlayerId>,
    pub turns: Turn,
    pub reports: Vec<TurnReport>,
}

pub struct Skirmish {
    pub host: SimHost,
    sessions: Vec<PlanningSession>,
    config: SkirmishConfig,
    next_seat: usize,
}

impl Skirmish {
    pub fn new(board: Board, planner: PlannerConfig, config: SkirmishConfig) -> Self {
        let sessions = board
            .player_ids()
            .into_iter()
            .map(|p| PlanningSession::new(p, planner.clone()))
            .collect();
        Self {
            host: SimHost::new(board, config.seed),
            sessions,
            config,
            next_seat: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.host.board
    }

    /// The last player standing, if only one is left
    pub fn winner(&self) -> Option<PlayerId> {
        let mut alive = self.host.player_ids().into_iter().filter(|&p| self.host.is_alive(p));
        let first = alive.next()?;
        alive.next().is_none().then_some(first)
    }

    /// Every player places its starting armies
    pub fn setup(&mut self) {
        for session in &mut self.sessions {
            if self.host.is_alive(session.player()) {
                place_initial(&mut self.host, session, self.config.initial_armies);
            }
        }
    }

    /// Play the next living player's turn
    pub fn play_next_turn(&mut self) -> Option<TurnReport> {
        let seats = self.sessions.len();
        let seat = (0..seats)
            .map(|i| (self.next_seat + i) % seats)
            .find(|&s| self.host.is_alive(self.sessions[s].player()))?;
        self.next_seat = (seat + 1) % seats;

        let player = self.sessions[seat].player();
        self.host.board.turn += 1;

        let income = self.host.income(player);
        let mut cashed = 0;
        while self.host.cards(player) >= self.config.forced_cash_hand.max(3) {
            cashed += self.host.cash_set(player);
        }

        let summary = play_turn(&mut self.host, &mut self.sessions[seat], income + cashed);
        if summary.conquered > 0 {
            let cards = self.host.cards(player);
            self.host.board.set_cards(player, cards + 1);
        }

        Some(TurnReport {
            turn: self.host.turn(),
            player,
            income,
            cashed,
            placed: summary.placed,
            attacks: summary.attacks,
            conquered: summary.conquered,
            eliminated: summary.eliminated,
            fortified: summary.fortified,
            territories: self.host.owned_by(player).len(),
            armies: self.host.total_armies(player),
        })
    }

    /// Set up and play until someone wins or the turn limit is reached
    pub fn run(mut self) -> SkirmishOutput {
        self.setup();
        let mut reports = Vec::new();
        while self.winner().is_none() && self.host.turn() < self.config.max_turns {
            match self.play_next_turn() {
                Some(report) => reports.push(report),
                None => break,
            }
        }

        let winner = self.winner();
        match winner {
            Some(p) => tracing::info!("Player {} wins after {} turns", p, self.host.turn()),
            None => tracing::info!("No winner after {} turns", self.host.turn()),
        }
        SkirmishOutput {
            winner,
            turns: self.host.turn(),
            reports,
        }
    }
}
