use std::collections::HashMap;

use crate::hltreplay::{Frame, Order};
use crate::types::{Direction, PlayerId, ShipId};

/// Move orders one player issued in one turn, keyed by ship.
pub type MoveSet = HashMap<ShipId, Direction>;

/// Extracts a player's move orders from one frame.
///
/// Only move-type orders become actions. Spawn and construct orders change
/// state that the reconstructed rosters already carry, and other players'
/// orders are not part of this perspective.
pub fn player_moves(frame: &Frame, player: PlayerId) -> MoveSet {
    frame
        .moves
        .get(&player)
        .map(|orders| {
            orders
                .iter()
                .filter_map(|order| match order {
                    Order::Move { id, direction } => Some((*id, *direction)),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
