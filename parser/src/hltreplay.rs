use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ErrorKind, ReplayResult};
use crate::types::{Direction, PlayerId, Position, ShipId};

/// A fully-decoded Halite III replay document.
///
/// `.hlt` files are zstd-compressed JSON. Everything downstream of
/// [`Replay::from_json`] works on this typed tree; malformed input is
/// rejected here rather than checked ad hoc during reconstruction.
#[derive(Debug, Clone, Deserialize)]
pub struct Replay {
    pub players: Vec<PlayerInfo>,
    pub production_map: ProductionMap,
    pub full_frames: Vec<Frame>,
    pub game_statistics: GameStatistics,
}

/// Roster entry for one participant.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerInfo {
    pub player_id: PlayerId,
    /// Display name, possibly with a version suffix ("MyBot v7").
    pub name: String,
    /// Where this player's home shipyard sits for the whole match.
    pub factory_location: Position,
}

/// The initial halite field. `grid[x][y]` holds the energy at (x, y).
#[derive(Debug, Clone, Deserialize)]
pub struct ProductionMap {
    pub width: usize,
    pub height: usize,
    pub grid: Vec<Vec<CellEnergy>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CellEnergy {
    pub energy: u32,
}

/// One turn's worth of deltas. Every field is sparse: a player with no
/// orders or no ships this turn simply has no entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Frame {
    /// Cells whose halite changed this turn. Unmentioned cells are unchanged.
    #[serde(default)]
    pub cells: Vec<CellUpdate>,
    /// Orders submitted this turn, keyed by player.
    #[serde(default)]
    pub moves: HashMap<PlayerId, Vec<Order>>,
    /// Full ship rosters this turn, keyed by player then ship.
    #[serde(default)]
    pub entities: HashMap<PlayerId, HashMap<ShipId, EntityState>>,
    /// Discrete events (spawns, dropoff construction, wrecks).
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Sparse overwrite of one cell's halite.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CellUpdate {
    pub x: i32,
    pub y: i32,
    pub production: u32,
}

/// An order submitted by a player. Only `Move` carries a direction; spawn
/// and construct orders show up in training data via events and rosters,
/// not as actions.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Order {
    #[serde(rename = "m")]
    Move { id: ShipId, direction: Direction },
    #[serde(rename = "g")]
    Spawn,
    #[serde(rename = "c")]
    Construct { id: ShipId },
    /// Order kinds this parser does not model.
    #[serde(other)]
    Unknown,
}

/// A ship's observed state at one turn.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EntityState {
    pub x: i32,
    pub y: i32,
    pub energy: u32,
}

/// A discrete game event recorded in a frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A ship was converted into a permanent dropoff.
    #[serde(rename = "construct")]
    Construct {
        owner_id: PlayerId,
        location: Position,
    },
    /// A new ship left the shipyard.
    #[serde(rename = "spawn")]
    Spawn {
        owner_id: PlayerId,
        location: Position,
    },
    /// Ships collided and sank.
    #[serde(rename = "shipwreck")]
    Shipwreck { location: Position },
    /// Event kinds this parser does not model.
    #[serde(other)]
    Unknown,
}

/// End-of-game aggregates.
#[derive(Debug, Clone, Deserialize)]
pub struct GameStatistics {
    pub number_turns: u32,
    pub player_statistics: Vec<PlayerStatistics>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerStatistics {
    pub player_id: PlayerId,
    /// Final placement; 1 is the winner.
    pub rank: u32,
}

impl Replay {
    /// Reads and decodes a `.hlt` replay file.
    pub fn from_file(path: &Path) -> ReplayResult<Replay> {
        let raw = std::fs::read(path)?;
        Self::from_compressed(&raw)
    }

    /// Decodes a zstd-compressed replay document.
    pub fn from_compressed(raw: &[u8]) -> ReplayResult<Replay> {
        let json = zstd::decode_all(raw)?;
        Self::from_json(&json)
    }

    /// Decodes an uncompressed replay document and validates its shape.
    pub fn from_json(bytes: &[u8]) -> ReplayResult<Replay> {
        let replay: Replay = serde_json::from_slice(bytes)?;
        replay.validate_grid()?;
        if replay.game_statistics.number_turns as usize != replay.full_frames.len() {
            debug!(
                declared = replay.game_statistics.number_turns,
                actual = replay.full_frames.len(),
                "number_turns disagrees with frame count; trusting the frames"
            );
        }
        Ok(replay)
    }

    fn validate_grid(&self) -> ReplayResult<()> {
        let map = &self.production_map;
        let shape_ok =
            map.grid.len() == map.width && map.grid.iter().all(|col| col.len() == map.height);
        if !shape_ok {
            return Err(ErrorKind::GridShapeMismatch {
                width: map.width,
                height: map.height,
            });
        }
        Ok(())
    }
}
