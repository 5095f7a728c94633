use serde::Serialize;
use tracing::debug;

use crate::error::{ErrorKind, ReplayResult};
use crate::hltreplay::Replay;
use crate::types::{Dropoff, PlayerId, StructureId};

/// Resolved perspective for one player: their numeric id, their home
/// shipyard, and every opponent's initial shipyard. Shipyards carry
/// [`StructureId::SENTINEL`] because the record never numbers them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerIdentity {
    pub player_id: PlayerId,
    pub shipyard: Dropoff,
    pub opponent_shipyards: Vec<Dropoff>,
}

/// The rank-1 player of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Winner {
    pub player_id: PlayerId,
    pub name: String,
}

/// Returns the first whitespace-delimited token of a player name. Names
/// often carry a version suffix ("MyBot v7") that changes between matches,
/// so only the leading token identifies the bot.
fn name_token(name: &str) -> Option<&str> {
    name.split_whitespace().next()
}

/// Resolves a player by display name and builds their initial shipyard
/// roster.
///
/// Matching compares the leading name token on both sides. Zero matches is
/// [`ErrorKind::IdentityNotFound`]; more than one is
/// [`ErrorKind::AmbiguousIdentity`] rather than an arbitrary pick.
pub fn resolve_player(replay: &Replay, name: &str) -> ReplayResult<PlayerIdentity> {
    let target = name_token(name).ok_or_else(|| ErrorKind::IdentityNotFound {
        name: name.to_owned(),
    })?;

    let mut matches = replay
        .players
        .iter()
        .filter(|p| name_token(&p.name) == Some(target));
    let player = matches.next().ok_or_else(|| ErrorKind::IdentityNotFound {
        name: name.to_owned(),
    })?;
    if matches.next().is_some() {
        return Err(ErrorKind::AmbiguousIdentity {
            name: name.to_owned(),
        });
    }

    let shipyard = Dropoff {
        owner: player.player_id,
        id: StructureId::SENTINEL,
        position: player.factory_location,
    };
    let opponent_shipyards = replay
        .players
        .iter()
        .filter(|p| p.player_id != player.player_id)
        .map(|p| Dropoff {
            owner: p.player_id,
            id: StructureId::SENTINEL,
            position: p.factory_location,
        })
        .collect();

    debug!(player_id = %player.player_id, name = %player.name, "resolved perspective player");

    Ok(PlayerIdentity {
        player_id: player.player_id,
        shipyard,
        opponent_shipyards,
    })
}

/// Resolves the match winner by joining the final rankings with the player
/// roster on player_id.
pub fn resolve_winner(replay: &Replay) -> ReplayResult<Winner> {
    let ranked = replay
        .game_statistics
        .player_statistics
        .iter()
        .find(|s| s.rank == 1)
        .ok_or(ErrorKind::WinnerNotFound)?;
    let player = replay
        .players
        .iter()
        .find(|p| p.player_id == ranked.player_id)
        .ok_or(ErrorKind::WinnerNotFound)?;

    Ok(Winner {
        player_id: player.player_id,
        name: player.name.clone(),
    })
}
