//! Host integration
//!
//! `GameHost` is the write side of the board: the game engine applies
//! placements, resolves attacks and moves armies. `play_turn` runs one full
//! turn for a planner-controlled player against any host.

use serde::{Deserialize, Serialize};

use crate::board::view::BoardView;
use crate::core::types::{PlayerId, TerritoryId};
use crate::planning::allocation::AllocationOutcome;
use crate::planning::session::PlanningSession;

/// Result of one attack as resolved by the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub conquered: bool,
    /// Player knocked out of the game by this conquest
    pub eliminated: Option<PlayerId>,
    /// Armies the attacker must place right away (cards taken on elimination)
    pub bonus_armies: u32,
}

/// Game engine operations the planner drives
pub trait GameHost: BoardView {
    fn place_armies(&mut self, territory: TerritoryId, amount: u32);

    /// Resolve an attack. A conquering host moves the minimum occupying
    /// force itself; any further move is requested with `move_armies`.
    fn attack(&mut self, from: TerritoryId, to: TerritoryId, all_out: bool) -> AttackOutcome;

    /// Advance armies into a territory conquered this turn
    fn move_armies(&mut self, from: TerritoryId, to: TerritoryId, amount: u32);

    /// Move armies between two adjacent owned territories; false if refused
    fn fortify(&mut self, from: TerritoryId, to: TerritoryId, amount: u32) -> bool;
}

/// What happened during one planner-driven turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    pub player: Option<PlayerId>,
    pub placed: u32,
    pub attacks: usize,
    pub conquered: usize,
    pub eliminated: Vec<PlayerId>,
    pub fortified: u32,
}

fn apply_placements<H: GameHost>(host: &mut H, outcome: &AllocationOutcome) -> u32 {
    for placement in &outcome.placements {
        host.place_armies(placement.territory, placement.amount);
    }
    outcome.total_placed()
}

/// Initial placement: spend `budget` with denial deferral switched off
pub fn place_initial<H: GameHost>(host: &mut H, session: &mut PlanningSession, budget: u32) -> u32 {
    let outcome = session.plan_placement(&*host, budget, true);
    apply_placements(host, &outcome)
}

/// Play a whole turn: placement, combat, then redistribution
pub fn play_turn<H: GameHost>(host: &mut H, session: &mut PlanningSession, budget: u32) -> TurnSummary {
    let player = session.player();
    let mut summary = TurnSummary {
        player: Some(player),
        ..TurnSummary::default()
    };

    let outcome = session.plan_placement(&*host, budget, false);
    summary.placed += apply_placements(host, &outcome);

    let attack_limit = host.territory_count() * 8 + 16;
    while summary.attacks < attack_limit {
        let Some(order) = session.next_attack(&*host) else {
            break;
        };
        summary.attacks += 1;
        let result = host.attack(order.from, order.to, order.all_out);
        if !result.conquered {
            continue;
        }

        summary.conquered += 1;
        let amount = session.armies_to_move(&*host, order.to);
        if amount > 0 {
            host.move_armies(order.from, order.to, amount);
        }
        if let Some(loser) = result.eliminated {
            tracing::info!("Player {} eliminated player {}", player, loser);
            summary.eliminated.push(loser);
        }
        if result.bonus_armies > 0 {
            let outcome = session.plan_placement(&*host, result.bonus_armies, false);
            summary.placed += apply_placements(host, &outcome);
        }
    }
    if summary.attacks >= attack_limit {
        tracing::warn!("Player {} hit the attack limit of {}", player, attack_limit);
    }

    for transfer in session.plan_redistribution(&*host) {
        let mut moved = true;
        for hop in transfer.path.windows(2) {
            if !host.fortify(hop[0], hop[1], transfer.amount) {
                tracing::debug!(
                    "Fortify {} -> {} refused; stopping transfer",
                    host.territory_name(hop[0]),
                    host.territory_name(hop[1])
                );
                moved = false;
                break;
            }
        }
        if moved {
            summary.fortified += transfer.amount;
        }
    }

    tracing::info!(
        "Player {} turn {}: placed {}, {} attacks, {} conquests, fortified {}",
        player,
        host.turn(),
        summary.placed,
        summary.attacks,
        summary.conquered,
        summary.fortified
    );
    summary
}
