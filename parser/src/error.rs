use thiserror::Error;

use crate::types::Position;

/// Typed failures for decoding a replay and reconstructing its turns.
/// All variants are local to a single replay file.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// I/O error reading or decompressing the replay file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The decompressed document is not a well-formed replay.
    #[error("malformed replay document: {0}")]
    Decode(#[from] serde_json::Error),

    /// The production map grid does not match its declared dimensions.
    #[error("production map grid does not match its declared {width}x{height} size")]
    GridShapeMismatch { width: usize, height: usize },

    /// No player in the roster matches the requested name.
    #[error("no player named {name:?} in this replay")]
    IdentityNotFound { name: String },

    /// More than one player matches the requested name.
    #[error("player name {name:?} is ambiguous in this replay")]
    AmbiguousIdentity { name: String },

    /// No rank-1 entry in the game statistics, or its player_id is not in
    /// the player roster.
    #[error("replay has no resolvable rank-1 player")]
    WinnerNotFound,

    /// A frame's cell update names a coordinate outside the grid.
    #[error("turn {turn}: cell update at {position} is outside the {width}x{height} grid")]
    DimensionMismatch {
        turn: usize,
        position: Position,
        width: usize,
        height: usize,
    },
}

pub type ReplayResult<T> = Result<T, ErrorKind>;
