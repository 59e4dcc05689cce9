//! Grid city traffic simulation
//!
//! Cars spawn at the map corners, route over a directed road graph with
//! live costs, obey traffic lights and never share a cell with another
//! moving car. Everything here is deterministic for a given map and seed.

mod car;
mod config;
mod error;
mod grid;
mod map;
mod road_network;
mod router;
mod snapshot;
mod spawner;
mod stats;
mod traffic_light;
mod types;
mod world;

pub use car::{BlockReason, CarStatus, CarUpdateResult, SimCar, TickContext};
pub use config::SimConfig;
pub use error::{MapError, SimError};
pub use grid::{GridWorld, Occupant};
pub use map::{
    CellSpec, LightSpec, MapDescription, SymbolDictionary, SymbolMeta, DESTINATION_SYMBOL,
    EMPTY_SYMBOL, OBSTACLE_SYMBOL,
};
pub use road_network::{RoadNetwork, INTERSECTION_DIRECTION_THRESHOLD};
pub use router::{Route, Router};
pub use snapshot::{CellSnapshot, OccupantView, WorldSnapshot};
pub use spawner::{SpawnManager, SpawnOutcome};
pub use stats::SimulationStats;
pub use traffic_light::{LightState, TrafficLight, TrafficLightController};
pub use types::{
    CarId, Coord, Direction, BASE_STEP_COST, DEFAULT_CARS_PER_SPAWN, DEFAULT_MAX_EXPANSIONS,
    DEFAULT_MIN_TRIP_DISTANCE, DEFAULT_RED_LIGHT_PENALTY_CAP, DEFAULT_REPLAN_INTERVAL,
    DEFAULT_SEED, DEFAULT_SPAWN_INTERVAL, OCCUPIED_CELL_PENALTY,
};
pub use world::{SimWorld, TickReport, DEMO_DICTIONARY, DEMO_MAP};
