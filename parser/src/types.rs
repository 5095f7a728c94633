use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

/// Numeric player identifier assigned by the game engine. Small and dense
/// (0..player count), but treated as opaque here.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i32);

impl PlayerId {
    pub fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PlayerId {
    fn from(v: i32) -> Self {
        PlayerId(v)
    }
}

impl From<i64> for PlayerId {
    fn from(v: i64) -> Self {
        PlayerId(v as i32)
    }
}

/// Per-match ship identifier. The engine assigns these from a single
/// counter, so a ship id is unique across all players within one match.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipId(pub i64);

impl ShipId {
    pub fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ShipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ShipId {
    fn from(v: i64) -> Self {
        ShipId(v)
    }
}

impl From<i32> for ShipId {
    fn from(v: i32) -> Self {
        ShipId(v as i64)
    }
}

/// Structure identifier for shipyards and dropoffs. The replay never assigns
/// the home shipyard a real id, so it carries [`StructureId::SENTINEL`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructureId(pub i64);

impl StructureId {
    /// Placeholder id for structures the record leaves unnumbered.
    pub const SENTINEL: StructureId = StructureId(-1);

    pub fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer coordinates on the toroidal game grid. The grid's width and
/// height are fixed for the whole match.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A move order's direction token. `Still` ("o") keeps the ship in place
/// and collects halite from the cell under it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum Direction {
    #[serde(rename = "n")]
    #[strum(serialize = "n")]
    North,
    #[serde(rename = "s")]
    #[strum(serialize = "s")]
    South,
    #[serde(rename = "e")]
    #[strum(serialize = "e")]
    East,
    #[serde(rename = "w")]
    #[strum(serialize = "w")]
    West,
    #[serde(rename = "o")]
    #[strum(serialize = "o")]
    Still,
}

/// One grid cell with its remaining halite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapCell {
    pub position: Position,
    pub halite: u32,
}

/// A player-owned ship as observed at one turn. Rosters are replaced
/// wholesale each turn; a ship absent from a turn's entity table has been
/// destroyed or not yet spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ship {
    pub owner: PlayerId,
    pub id: ShipId,
    pub position: Position,
    pub halite: u32,
}

/// A resource-banking structure: the starting shipyard or a constructed
/// dropoff. Permanent once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dropoff {
    pub owner: PlayerId,
    pub id: StructureId,
    pub position: Position,
}
