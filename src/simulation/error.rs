//! Error types for the traffic simulation.
//!
//! [`MapError`] covers everything that can go wrong while turning a map
//! description into a world; it is always fatal at construction.
//! [`SimError`] covers runtime grid operations. Ordinary blocking and
//! unreachable destinations are car states, never errors.

use super::types::{CarId, Coord};

/// Errors raised while loading or validating a map description.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The map has no rows or no columns.
    #[error("map is empty")]
    EmptyMap,

    /// A text row is shorter or longer than the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// The cell list does not match `width * height`.
    #[error("map declares {expected} cells but holds {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// A character that is neither in the dictionary nor a fixed marker.
    #[error("unknown map symbol '{symbol}' at row {row}, column {col}")]
    UnknownSymbol { symbol: char, row: usize, col: usize },

    /// Dictionary metadata that is neither a direction nor a period.
    #[error("invalid metadata for symbol '{symbol}': {value}")]
    InvalidMetadata { symbol: String, value: String },

    /// A cell declared as both obstacle and road.
    #[error("cell {0} has both an obstacle and a road")]
    ObstacleOnRoad(Coord),

    /// A traffic light that would never toggle.
    #[error("traffic light at {0} has a zero period")]
    ZeroPeriod(Coord),

    /// A traffic light with no neighboring road to take a direction from.
    #[error("traffic light at {0} has no adjacent road")]
    IsolatedLight(Coord),

    /// A coordinate outside the declared map bounds.
    #[error("coordinate {0} is outside the map")]
    OutOfBounds(Coord),

    #[error("dictionary error: {0}")]
    Dictionary(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by grid and world operations during a run.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A car tried to enter a cell that already holds an active car.
    #[error("car {car:?} cannot enter {to}: cell is held by car {holder:?}")]
    OccupancyConflict { car: CarId, to: Coord, holder: CarId },

    /// A car was expected in a cell but is not there.
    #[error("car {car:?} is not present at {at}")]
    MissingOccupant { car: CarId, at: Coord },

    #[error("coordinate {0} is out of bounds")]
    OutOfBounds(Coord),

    /// A static marker that would break a cell invariant.
    #[error("cannot place marker at {at}: {reason}")]
    InvalidPlacement { at: Coord, reason: &'static str },

    /// A spawn was requested into a cell held by an active car.
    #[error("entry cell {0} is already occupied")]
    EntryOccupied(Coord),
}

impl SimError {
    /// True for internal invariant violations, which a correct car state
    /// machine never produces.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            SimError::OccupancyConflict { .. } | SimError::MissingOccupant { .. }
        )
    }
}
