//! Battle cost model
//!
//! Closed-form estimates of the attacking armies needed to win a battle with
//! roughly 78% confidence. A hop in the middle of a route only has to break
//! through; the last hop must also leave an occupying army behind, so it uses
//! the steeper terminal curve.

use crate::board::view::BoardView;
use crate::core::types::{PlayerId, TerritoryId};

/// Attackers lost per defender in a long battle
const ATTRITION: f64 = 7161.0 / 8391.0;

const TRANSIT_SCALE: f64 = 1.3316;
const TRANSIT_EXPONENT: f64 = 0.4665;

const TERMINAL_SCALE: f64 = 1.7273;
const TERMINAL_EXPONENT: f64 = 0.4301;

/// Armies needed to take a territory held by `defenders`
///
/// Empty territory is priced as if it held one army, since conquering it
/// still requires moving a unit in.
pub fn battle_cost(defenders: u32, terminal: bool) -> u32 {
    let d = defenders.max(1) as f64;
    let cost = if terminal {
        ATTRITION * d + TERMINAL_SCALE * d.powf(TERMINAL_EXPONENT)
    } else {
        ATTRITION * d + TRANSIT_SCALE * d.powf(TRANSIT_EXPONENT)
    };
    cost.round() as u32
}

/// Cost of attacking along a sequence of defender counts (last is terminal)
pub fn defenders_cost(defenders: &[u32]) -> u32 {
    let Some((last, rest)) = defenders.split_last() else {
        return 0;
    };
    rest.iter().map(|&d| battle_cost(d, false)).sum::<u32>() + battle_cost(*last, true)
}

/// Cost of walking `route`; the first territory is the launch point and
/// costs nothing
pub fn path_cost<B: BoardView>(board: &B, route: &[TerritoryId]) -> u32 {
    if route.len() < 2 {
        return 0;
    }
    let defenders: Vec<u32> = route[1..].iter().map(|&t| board.armies(t)).collect();
    defenders_cost(&defenders)
}

/// Cost of conquering an unordered set of territories in one sweep
///
/// Territories are taken in ascending id order with the last one terminal,
/// which makes the estimate independent of how the set was collected.
pub fn estimate_traversal_cost<B: BoardView>(
    board: &B,
    territories: impl IntoIterator<Item = TerritoryId>,
) -> u32 {
    let mut ids: Vec<TerritoryId> = territories.into_iter().collect();
    ids.sort();
    ids.dedup();
    let defenders: Vec<u32> = ids.iter().map(|&t| board.armies(t)).collect();
    defenders_cost(&defenders)
}

/// Half-army-plus-one hop estimate used by the greedy expansion walk
pub fn quick_hop_cost(defenders: u32) -> u32 {
    defenders / 2 + 1
}

/// Army value of a player's hand of cards
///
/// A full set of three cashes for `cash` armies; partial hands are worth the
/// matching fraction.
pub fn card_value(cards: u32, cash: u32) -> f64 {
    cards as f64 / 3.0 * cash as f64
}

/// Income plus card value, the reinforcement a player can bring next turn
pub fn reinforcement_potential<B: BoardView>(board: &B, player: PlayerId, default_cash: u32) -> f64 {
    let cash = board.next_card_cash().unwrap_or(default_cash);
    board.income(player) as f64 + card_value(board.cards(player), cash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battle_cost_known_values() {
        assert_eq!(battle_cost(1, false), 2);
        assert_eq!(battle_cost(1, true), 3);
        assert_eq!(battle_cost(3, false), 5);
        assert_eq!(battle_cost(3, true), 5);
        assert_eq!(battle_cost(4, true), 7);
        // Empty territory is priced like a single defender
        assert_eq!(battle_cost(0, true), battle_cost(1, true));
    }

    #[test]
    fn test_defenders_cost_uses_terminal_curve_last() {
        assert_eq!(defenders_cost(&[]), 0);
        assert_eq!(defenders_cost(&[1]), 3);
        assert_eq!(defenders_cost(&[1, 1]), 2 + 3);
        assert_eq!(defenders_cost(&[4, 1]), battle_cost(4, false) + 3);
    }

    #[test]
    fn test_card_value() {
        assert_eq!(card_value(3, 6), 6.0);
        assert_eq!(card_value(0, 10), 0.0);
        assert!((card_value(1, 6) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_quick_hop_cost() {
        assert_eq!(quick_hop_cost(1), 1);
        assert_eq!(quick_hop_cost(5), 3);
    }
}
