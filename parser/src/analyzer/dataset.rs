use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::Rc;
use crate::error::ReplayResult;
use crate::hltreplay::Replay;
use crate::types::{Direction, Dropoff, Ship, ShipId};

use super::actions::player_moves;
use super::identity::{PlayerIdentity, resolve_player, resolve_winner};
use super::snapshot::{MapSnapshot, Reconstructor};

/// One fully-materialized training example: everything the perspective
/// player could observe at a turn, plus the move orders they issued.
#[derive(Debug, Clone, Serialize)]
pub struct TurnRecord {
    pub map: MapSnapshot,
    pub moves: HashMap<ShipId, Direction>,
    pub own_ships: HashMap<ShipId, Ship>,
    pub other_ships: HashMap<ShipId, Ship>,
    pub own_dropoffs: Rc<[Dropoff]>,
    pub other_dropoffs: Rc<[Dropoff]>,
}

/// Reconstructs a whole match from one player's perspective, one record per
/// turn in turn order.
///
/// A move order naming a ship missing from that turn's roster is a
/// data-quality problem in the replay; it is logged and dropped so the rest
/// of the file still yields training data. Any reconstruction error aborts
/// the file with no partial output.
pub fn build_dataset(replay: &Replay, identity: &PlayerIdentity) -> ReplayResult<Vec<TurnRecord>> {
    let mut reconstructor = Reconstructor::new(replay, identity);
    let mut records = Vec::with_capacity(replay.full_frames.len());
    let mut dangling = 0usize;

    for (turn, frame) in replay.full_frames.iter().enumerate() {
        let state = reconstructor.advance(frame)?;
        let mut moves = player_moves(frame, identity.player_id);
        moves.retain(|ship, _| {
            let known = state.own_ships.contains_key(ship);
            if !known {
                warn!(turn, %ship, "move order for a ship missing from the roster; dropping");
                dangling += 1;
            }
            known
        });

        records.push(TurnRecord {
            map: state.map,
            moves,
            own_ships: state.own_ships,
            other_ships: state.other_ships,
            own_dropoffs: state.own_dropoffs,
            other_dropoffs: state.other_dropoffs,
        });
    }

    if dangling > 0 {
        warn!(count = dangling, "dropped dangling move orders in this replay");
    }
    debug!(turns = records.len(), "assembled dataset");
    Ok(records)
}

/// Parses one replay file from the winner's perspective.
///
/// Convention for training data: the winner's moves are the ones worth
/// imitating, so the winner is resolved first and then fed back in as the
/// perspective player.
pub fn parse_replay(path: &Path) -> ReplayResult<Vec<TurnRecord>> {
    let replay = Replay::from_file(path)?;
    let winner = resolve_winner(&replay)?;
    let identity = resolve_player(&replay, &winner.name)?;
    build_dataset(&replay, &identity)
}
