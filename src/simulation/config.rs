//! Construction-time parameters of a simulation run

use super::types::{
    DEFAULT_CARS_PER_SPAWN, DEFAULT_MAX_EXPANSIONS, DEFAULT_MIN_TRIP_DISTANCE,
    DEFAULT_RED_LIGHT_PENALTY_CAP, DEFAULT_REPLAN_INTERVAL, DEFAULT_SEED, DEFAULT_SPAWN_INTERVAL,
};

/// Parameters supplied when a [`SimWorld`](super::SimWorld) is built
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Cars created per spawn cycle
    pub cars_per_spawn: usize,
    /// Seed of the single random source (spawn choices and tick shuffles)
    pub seed: u64,
    /// Ticks between spawn cycles
    pub spawn_interval: u64,
    /// Blocked-by-car ticks between re-plan attempts
    pub replan_interval: u32,
    /// A* expansion cap
    pub max_expansions: usize,
    /// Upper bound of the red light edge penalty
    pub red_light_penalty_cap: f32,
    /// Preferred minimum trip length for spawned cars
    pub min_trip_distance: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cars_per_spawn: DEFAULT_CARS_PER_SPAWN,
            seed: DEFAULT_SEED,
            spawn_interval: DEFAULT_SPAWN_INTERVAL,
            replan_interval: DEFAULT_REPLAN_INTERVAL,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
            red_light_penalty_cap: DEFAULT_RED_LIGHT_PENALTY_CAP,
            min_trip_distance: DEFAULT_MIN_TRIP_DISTANCE,
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_cars_per_spawn(mut self, cars_per_spawn: usize) -> Self {
        self.cars_per_spawn = cars_per_spawn;
        self
    }

    pub fn with_spawn_interval(mut self, spawn_interval: u64) -> Self {
        // zero would divide by zero in the clock
        self.spawn_interval = spawn_interval.max(1);
        self
    }

    pub fn with_replan_interval(mut self, replan_interval: u32) -> Self {
        self.replan_interval = replan_interval.max(1);
        self
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub fn with_red_light_penalty_cap(mut self, cap: f32) -> Self {
        self.red_light_penalty_cap = cap.max(0.0);
        self
    }

    pub fn with_min_trip_distance(mut self, min_trip_distance: u32) -> Self {
        self.min_trip_distance = min_trip_distance;
        self
    }
}
