//! Car movement logic for the traffic simulation
//!
//! A car is a small state machine (`Routing -> Moving <-> Blocked -> Arrived`)
//! that advances at most one cell per tick along a cached route.

use serde::Serialize;

use super::error::SimError;
use super::grid::GridWorld;
use super::road_network::RoadNetwork;
use super::router::Router;
use super::traffic_light::TrafficLightController;
use super::types::{CarId, Coord, Direction};

/// Lifecycle state of a car
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CarStatus {
    /// Waiting for its first route
    Routing,
    Moving,
    Blocked,
    /// Sitting on its destination, removed on its next update
    Arrived,
}

/// Why a car did not move this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    NoPath,
    RedLight,
    Occupied(CarId),
    Obstacle,
}

/// Result of a car update indicating what action should be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarUpdateResult {
    Moved { from: Coord, to: Coord, arrived: bool },
    Blocked(BlockReason),
    /// Car has left the grid and should be dropped from the active set
    Removed,
}

/// Everything a car reads or writes during its update
pub struct TickContext<'a> {
    pub tick: u64,
    pub grid: &'a mut GridWorld,
    pub network: &'a RoadNetwork,
    pub lights: &'a TrafficLightController,
    pub router: &'a Router,
    /// Blocked-by-car ticks between re-plan attempts
    pub replan_interval: u32,
}

/// A car in the traffic simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimCar {
    pub id: CarId,
    pub position: Coord,
    pub destination: Coord,
    /// Cached route, including the cell the car was on when it was planned
    pub path: Vec<Coord>,
    /// Index of `position` in `path`
    pub cursor: usize,
    pub last_direction: Option<Direction>,
    pub status: CarStatus,
    /// Consecutive ticks spent behind another car
    pub blocked_ticks: u32,
    pub spawned_at: u64,
}

impl SimCar {
    pub fn new(id: CarId, position: Coord, destination: Coord, spawned_at: u64) -> Self {
        Self {
            id,
            position,
            destination,
            path: Vec::new(),
            cursor: 0,
            last_direction: None,
            status: CarStatus::Routing,
            blocked_ticks: 0,
            spawned_at,
        }
    }

    /// Cell the car will try to enter next, if it has a usable route
    pub fn next_cell(&self) -> Option<Coord> {
        if self.path.get(self.cursor) != Some(&self.position) {
            return None;
        }
        self.path.get(self.cursor + 1).copied()
    }

    /// Update car movement logic for one tick
    pub fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<CarUpdateResult, SimError> {
        if self.status == CarStatus::Arrived || self.position == self.destination {
            ctx.grid.vacate_car(self.id, self.position)?;
            self.status = CarStatus::Arrived;
            log::debug!("car {:?} left the grid at {}", self.id, self.position);
            return Ok(CarUpdateResult::Removed);
        }

        if !self.sync_cursor() && !self.replan(ctx) {
            return Ok(self.block(BlockReason::NoPath));
        }

        let next = match self.next_cell() {
            Some(next) => next,
            // Route ends short of the destination
            None => match self.replan(ctx).then(|| self.next_cell()).flatten() {
                Some(next) => next,
                None => return Ok(self.block(BlockReason::NoPath)),
            },
        };

        if next != self.destination && ctx.lights.is_red_at(next) {
            self.blocked_ticks = 0;
            return Ok(self.block(BlockReason::RedLight));
        }

        if ctx.grid.has_obstacle(next) {
            self.blocked_ticks = 0;
            self.path.clear();
            self.replan(ctx);
            return Ok(self.block(BlockReason::Obstacle));
        }

        if let Some(holder) = ctx.grid.active_car_at(next) {
            self.blocked_ticks += 1;
            if self.blocked_ticks % ctx.replan_interval.max(1) == 0 {
                log::trace!(
                    "car {:?} stuck behind {:?} for {} ticks, re-planning",
                    self.id,
                    holder,
                    self.blocked_ticks
                );
                self.replan(ctx);
            }
            return Ok(self.block(BlockReason::Occupied(holder)));
        }

        let from = self.position;
        ctx.grid.move_car(self.id, from, next)?;
        self.position = next;
        self.cursor += 1;
        self.blocked_ticks = 0;
        if let Some(direction) = from.direction_to(next) {
            self.last_direction = Some(direction);
        }

        let arrived = next == self.destination;
        if arrived {
            ctx.grid.mark_arrived(self.id, next)?;
            self.status = CarStatus::Arrived;
            log::debug!("car {:?} arrived at {} on tick {}", self.id, next, ctx.tick);
        } else {
            self.status = CarStatus::Moving;
        }

        Ok(CarUpdateResult::Moved {
            from,
            to: next,
            arrived,
        })
    }

    /// Point the cursor at the current cell. Returns false when the cached
    /// path is empty or no longer contains the car's position.
    fn sync_cursor(&mut self) -> bool {
        if self.path.get(self.cursor) == Some(&self.position) {
            return true;
        }
        match self.path.iter().position(|&cell| cell == self.position) {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => {
                if !self.path.is_empty() {
                    log::debug!("car {:?} desynced from its route at {}", self.id, self.position);
                }
                false
            }
        }
    }

    /// Ask the router for a fresh route. On failure the cached route is
    /// dropped so the next tick tries again.
    fn replan(&mut self, ctx: &TickContext<'_>) -> bool {
        let path = ctx.router.find_path(
            self.position,
            self.destination,
            ctx.network,
            &*ctx.grid,
            ctx.lights,
        );
        if path.len() < 2 {
            log::debug!(
                "car {:?} found no path from {} to {}",
                self.id,
                self.position,
                self.destination
            );
            self.path.clear();
            self.cursor = 0;
            return false;
        }
        self.path = path;
        self.cursor = 0;
        true
    }

    fn block(&mut self, reason: BlockReason) -> CarUpdateResult {
        self.status = CarStatus::Blocked;
        CarUpdateResult::Blocked(reason)
    }
}
