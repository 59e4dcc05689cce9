//! Core types for the traffic simulation
//!
//! Grid coordinates, travel directions and the tunable constants shared by
//! the router, the cars and the spawner.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique identifier for a car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CarId(pub usize);

/// An integer cell coordinate. `y` grows upwards, so `Up` is `y + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighboring cell one step in `direction`
    pub fn step(self, direction: Direction) -> Coord {
        let (dx, dy) = direction.delta();
        Coord::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Coord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Direction of a single orthogonal step from `self` to `to`
    pub fn direction_to(self, to: Coord) -> Option<Direction> {
        Direction::from_delta(to.x - self.x, to.y - self.y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal travel direction of a road cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        match (dx, dy) {
            (0, 1) => Some(Direction::Up),
            (0, -1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// The two lane-change directions
    pub fn perpendicular(self) -> [Direction; 2] {
        match self {
            Direction::Up | Direction::Down => [Direction::Left, Direction::Right],
            Direction::Left | Direction::Right => [Direction::Up, Direction::Down],
        }
    }

    /// Forward first, then both lane changes. Reversing is never a candidate.
    pub fn forward_moves(self) -> [Direction; 3] {
        let [a, b] = self.perpendicular();
        [self, a, b]
    }

    pub fn from_name(name: &str) -> Option<Direction> {
        match name {
            "Up" => Some(Direction::Up),
            "Down" => Some(Direction::Down),
            "Left" => Some(Direction::Left),
            "Right" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Arrow glyph used by the terminal map
    pub fn glyph(self) -> char {
        match self {
            Direction::Up => '^',
            Direction::Down => 'v',
            Direction::Left => '<',
            Direction::Right => '>',
        }
    }
}

/// Ticks between spawn cycles
pub const DEFAULT_SPAWN_INTERVAL: u64 = 10;

/// Cars created per spawn cycle
pub const DEFAULT_CARS_PER_SPAWN: usize = 2;

/// Seed of the simulation's random source
pub const DEFAULT_SEED: u64 = 42;

/// A car blocked by another car looks for an alternate route every this many ticks
pub const DEFAULT_REPLAN_INTERVAL: u32 = 5;

/// Upper bound on A* node expansions per search
pub const DEFAULT_MAX_EXPANSIONS: usize = 10_000;

/// Largest cost a single red light may add to an edge
pub const DEFAULT_RED_LIGHT_PENALTY_CAP: f32 = 10.0;

/// Preferred minimum Manhattan distance between a spawn point and its destination
pub const DEFAULT_MIN_TRIP_DISTANCE: u32 = 5;

/// Cost of one step into a free cell
pub const BASE_STEP_COST: f32 = 1.0;

/// Extra cost of stepping into a cell held by an active car
pub const OCCUPIED_CELL_PENALTY: f32 = 3.0;
