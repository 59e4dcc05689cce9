//! Main simulation world that ties everything together
//!
//! [`SimWorld`] owns the grid, the static road network, the lights, the
//! active cars and the single seeded random source, and advances them one
//! tick at a time.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::car::{BlockReason, CarStatus, CarUpdateResult, SimCar, TickContext};
use super::config::SimConfig;
use super::error::SimError;
use super::grid::{GridWorld, Occupant};
use super::map::{MapDescription, SymbolDictionary};
use super::road_network::RoadNetwork;
use super::router::Router;
use super::snapshot::WorldSnapshot;
use super::spawner::SpawnManager;
use super::stats::SimulationStats;
use super::traffic_light::{LightState, TrafficLightController};
use super::types::{CarId, Coord};

/// Text of the built-in demo city
pub const DEMO_MAP: &str = include_str!("../../maps/demo.txt");
/// Symbol dictionary of the built-in demo city
pub const DEMO_DICTIONARY: &str = include_str!("../../maps/dictionary.json");

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub lights_toggled: usize,
    pub moved: usize,
    pub blocked: usize,
    /// Cars that entered their destination this tick
    pub arrived: usize,
    /// Arrived cars taken off the grid this tick
    pub removed: usize,
    pub spawned: usize,
}

/// The main simulation world
pub struct SimWorld {
    config: SimConfig,
    grid: GridWorld,
    network: RoadNetwork,
    lights: TrafficLightController,
    router: Router,
    spawner: SpawnManager,

    /// Active cars, keyed by id so iteration order never depends on hashing
    cars: BTreeMap<CarId, SimCar>,

    rng: StdRng,
    next_id: usize,

    /// Ticks completed so far; 0 before the first tick
    tick: u64,

    stats: SimulationStats,
}

impl SimWorld {
    /// Build a world from a parsed map. Fails fast on any map defect.
    pub fn new(map: &MapDescription, config: SimConfig) -> Result<Self> {
        let network = RoadNetwork::from_map(map).context("failed to build road network")?;
        let grid = GridWorld::from_map(map, |coord| network.direction_of(coord))
            .context("failed to populate grid")?;
        let lights = TrafficLightController::from_map(map);
        let router = Router::new(config.max_expansions, config.red_light_penalty_cap);
        let spawner = SpawnManager::new(&network, &config);

        log::info!(
            "loaded {}x{} map: {} road cells, {} lights, {} entry corners",
            map.width(),
            map.height(),
            network.road_count(),
            lights.len(),
            spawner.entry_cells().len()
        );

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            grid,
            network,
            lights,
            router,
            spawner,
            cars: BTreeMap::new(),
            next_id: 0,
            tick: 0,
            stats: SimulationStats::default(),
        })
    }

    /// Build a world from map text and a JSON symbol dictionary
    pub fn from_text(map_text: &str, dictionary_json: &str, config: SimConfig) -> Result<Self> {
        let dictionary =
            SymbolDictionary::from_json(dictionary_json).context("invalid symbol dictionary")?;
        let map = MapDescription::parse(map_text, &dictionary).context("invalid map")?;
        Self::new(&map, config)
    }

    /// Build a world from a map file and a dictionary file
    pub fn load(
        map_path: impl AsRef<Path>,
        dictionary_path: impl AsRef<Path>,
        config: SimConfig,
    ) -> Result<Self> {
        let map_path = map_path.as_ref();
        let map = MapDescription::load(map_path, dictionary_path)
            .with_context(|| format!("failed to load map {}", map_path.display()))?;
        Self::new(&map, config)
    }

    /// The built-in demo city
    pub fn demo(config: SimConfig) -> Result<Self> {
        Self::from_text(DEMO_MAP, DEMO_DICTIONARY, config)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn grid(&self) -> &GridWorld {
        &self.grid
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    pub fn lights(&self) -> &TrafficLightController {
        &self.lights
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn cars(&self) -> impl Iterator<Item = &SimCar> {
        self.cars.values()
    }

    pub fn car(&self, id: CarId) -> Option<&SimCar> {
        self.cars.get(&id)
    }

    pub fn active_car_count(&self) -> usize {
        self.cars.len()
    }

    fn next_car_id(&mut self) -> CarId {
        let id = CarId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Put a car on the map directly, bypassing the corner spawner
    pub fn spawn_car(&mut self, entry: Coord, destination: Coord) -> Result<CarId, SimError> {
        if !self.grid.is_in_bounds(entry) {
            return Err(SimError::OutOfBounds(entry));
        }
        if !self.grid.is_in_bounds(destination) {
            return Err(SimError::OutOfBounds(destination));
        }
        if self.network.direction_of(entry).is_none() {
            return Err(SimError::InvalidPlacement {
                at: entry,
                reason: "entry cell carries no road",
            });
        }
        if !self.network.is_destination(destination)
            && self.network.direction_of(destination).is_none()
        {
            return Err(SimError::InvalidPlacement {
                at: destination,
                reason: "destination is neither a destination nor a road cell",
            });
        }
        if self.grid.has_active_car(entry) {
            return Err(SimError::EntryOccupied(entry));
        }

        let id = self.next_car_id();
        self.grid.place(Occupant::Car { id, arrived: false }, entry)?;
        self.cars
            .insert(id, SimCar::new(id, entry, destination, self.tick));
        self.stats.total_cars_spawned += 1;
        self.stats.active_cars = self.cars.len() as u64;
        Ok(id)
    }

    /// Main simulation tick
    ///
    /// Lights toggle first, then every car updates once in a freshly
    /// shuffled order, then the spawner runs on spawn-interval boundaries.
    /// Grid changes made by one car are visible to the cars after it.
    pub fn tick(&mut self) -> Result<TickReport, SimError> {
        self.tick += 1;
        let tick = self.tick;
        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };

        report.lights_toggled = self.lights.update(tick);

        let mut order: Vec<CarId> = self.cars.keys().copied().collect();
        order.shuffle(&mut self.rng);

        let mut removed = Vec::new();
        {
            let mut ctx = TickContext {
                tick,
                grid: &mut self.grid,
                network: &self.network,
                lights: &self.lights,
                router: &self.router,
                replan_interval: self.config.replan_interval,
            };

            for id in order {
                let Some(car) = self.cars.get_mut(&id) else {
                    continue;
                };

                match car.update(&mut ctx)? {
                    CarUpdateResult::Moved { arrived, .. } => {
                        report.moved += 1;
                        if arrived {
                            report.arrived += 1;
                            self.stats.record_arrival(tick - car.spawned_at);
                        }
                    }
                    CarUpdateResult::Blocked(reason) => {
                        report.blocked += 1;
                        self.stats.blocked_car_ticks += 1;
                        if reason == BlockReason::NoPath {
                            self.stats.no_path_events += 1;
                        }
                    }
                    CarUpdateResult::Removed => removed.push(id),
                }
            }
        }

        report.removed = removed.len();
        for id in removed {
            self.cars.remove(&id);
        }

        if self.spawner.is_spawn_tick(tick) {
            let next_id = &mut self.next_id;
            let outcome = self
                .spawner
                .spawn_cycle(tick, &mut self.grid, &mut self.rng, || {
                    let id = CarId(*next_id);
                    *next_id += 1;
                    id
                })?;

            report.spawned = outcome.cars.len();
            self.stats.total_cars_spawned += outcome.cars.len() as u64;
            self.stats.spawns_skipped += outcome.skipped as u64;
            for car in outcome.cars {
                self.cars.insert(car.id, car);
            }
        }

        self.stats.active_cars = self.cars.len() as u64;

        log::debug!(
            "tick {}: moved={} blocked={} arrived={} removed={} spawned={} active={}",
            tick,
            report.moved,
            report.blocked,
            report.arrived,
            report.removed,
            report.spawned,
            self.cars.len()
        );

        Ok(report)
    }

    /// Run `ticks` ticks, stopping at the first invariant violation
    pub fn run(&mut self, ticks: u64) -> Result<(), SimError> {
        for _ in 0..ticks {
            self.tick()?;
        }
        Ok(())
    }

    /// Occupancy snapshot for visualization
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self.tick, &self.grid, &self.network, &self.lights, &self.cars)
    }

    /// Draw the world as text, top row first
    pub fn render_ascii(&self) -> String {
        let mut out = String::new();
        for y in (0..self.grid.height() as i32).rev() {
            for x in 0..self.grid.width() as i32 {
                out.push(self.glyph_at(Coord::new(x, y)));
            }
            out.push('\n');
        }
        out
    }

    fn glyph_at(&self, coord: Coord) -> char {
        let occupants = self.grid.occupant_at(coord);
        if let Some(car) = occupants.iter().find_map(|o| match o {
            Occupant::Car { id, .. } => self.cars.get(id),
            _ => None,
        }) {
            return match car.status {
                CarStatus::Arrived => 'A',
                CarStatus::Blocked => 'B',
                CarStatus::Routing | CarStatus::Moving => 'C',
            };
        }
        if self.grid.has_obstacle(coord) {
            return '#';
        }
        if self.grid.is_destination(coord) {
            return 'D';
        }
        match self.lights.state_at(coord) {
            Some(LightState::Red) => return 'R',
            Some(LightState::Green) => return 'G',
            None => {}
        }
        self.grid
            .road_direction(coord)
            .map(|direction| direction.glyph())
            .unwrap_or(' ')
    }

    /// Log the run statistics
    pub fn print_summary(&self) {
        self.stats.log_summary(self.tick);
    }
}
