//! Car spawning for the traffic simulation
//!
//! Cars enter the map at its corners. Entry corners are cycled round-robin
//! and each new car gets a destination drawn from the world's seeded RNG.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use super::car::SimCar;
use super::config::SimConfig;
use super::error::SimError;
use super::grid::{GridWorld, Occupant};
use super::road_network::RoadNetwork;
use super::types::{CarId, Coord};

/// Cars created by one spawn cycle
#[derive(Debug, Default)]
pub struct SpawnOutcome {
    pub cars: Vec<SimCar>,
    /// Iterations that found their corner held by a car
    pub skipped: usize,
}

/// Creates cars at corner entry cells on spawn-interval boundaries
#[derive(Debug, Clone)]
pub struct SpawnManager {
    entry_cells: Vec<Coord>,
    destinations: Vec<Coord>,
    next_entry: usize,
    spawn_interval: u64,
    cars_per_spawn: usize,
    min_trip_distance: u32,
}

impl SpawnManager {
    pub fn new(network: &RoadNetwork, config: &SimConfig) -> Self {
        let entry_cells = Self::corner_entries(network);
        let destinations: Vec<Coord> = network.destinations().collect();

        if entry_cells.is_empty() {
            log::warn!("no road cells found at map corners, cars cannot be spawned");
        }
        if destinations.is_empty() {
            log::warn!("map has no destinations, cars cannot be spawned");
        }

        Self {
            entry_cells,
            destinations,
            next_entry: 0,
            spawn_interval: config.spawn_interval.max(1),
            cars_per_spawn: config.cars_per_spawn,
            min_trip_distance: config.min_trip_distance,
        }
    }

    /// Corner cells that carry a map road whose forward neighbor is on the
    /// map, in the order bottom-left, bottom-right, top-left, top-right.
    /// Traffic lights on a corner are not entries.
    pub fn corner_entries(network: &RoadNetwork) -> Vec<Coord> {
        let right = network.width() as i32 - 1;
        let top = network.height() as i32 - 1;
        let corners = [
            Coord::new(0, 0),
            Coord::new(right, 0),
            Coord::new(0, top),
            Coord::new(right, top),
        ];

        let mut entries: Vec<Coord> = Vec::new();
        for corner in corners {
            let leads_inward = network.has_road_marker(corner)
                && network
                    .direction_of(corner)
                    .is_some_and(|direction| network.is_in_bounds(corner.step(direction)));
            // 1xN maps repeat corners
            if leads_inward && !entries.contains(&corner) {
                entries.push(corner);
            }
        }
        entries
    }

    pub fn entry_cells(&self) -> &[Coord] {
        &self.entry_cells
    }

    pub fn is_spawn_tick(&self, tick: u64) -> bool {
        tick > 0 && tick % self.spawn_interval == 0
    }

    /// Pick a destination, preferring ones farther than the minimum trip
    /// distance from `entry`
    pub fn choose_destination(&self, entry: Coord, rng: &mut StdRng) -> Option<Coord> {
        let far: Vec<Coord> = self
            .destinations
            .iter()
            .copied()
            .filter(|destination| destination.manhattan(entry) > self.min_trip_distance)
            .collect();
        if let Some(&destination) = far.choose(rng) {
            return Some(destination);
        }

        let any: Vec<Coord> = self
            .destinations
            .iter()
            .copied()
            .filter(|&destination| destination != entry)
            .collect();
        any.choose(rng).copied()
    }

    /// Run one spawn cycle, placing the new cars on the grid
    pub fn spawn_cycle(
        &mut self,
        tick: u64,
        grid: &mut GridWorld,
        rng: &mut StdRng,
        mut next_id: impl FnMut() -> CarId,
    ) -> Result<SpawnOutcome, SimError> {
        let mut outcome = SpawnOutcome::default();
        if self.entry_cells.is_empty() || self.destinations.is_empty() {
            return Ok(outcome);
        }

        for _ in 0..self.cars_per_spawn {
            let entry = self.entry_cells[self.next_entry % self.entry_cells.len()];
            self.next_entry = (self.next_entry + 1) % self.entry_cells.len();

            if grid.has_active_car(entry) {
                outcome.skipped += 1;
                continue;
            }

            let Some(destination) = self.choose_destination(entry, rng) else {
                outcome.skipped += 1;
                continue;
            };

            let id = next_id();
            grid.place(Occupant::Car { id, arrived: false }, entry)?;
            outcome.cars.push(SimCar::new(id, entry, destination, tick));
        }

        if !outcome.cars.is_empty() {
            log::info!(
                "tick {}: spawned {} cars ({} skipped)",
                tick,
                outcome.cars.len(),
                outcome.skipped
            );
        }

        Ok(outcome)
    }
}
