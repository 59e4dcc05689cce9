//! A* routing over the road network with live edge costs
//!
//! Edge costs are read from the grid and the lights at search time, so the
//! same query can return different routes as traffic and signals change.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use ordered_float::OrderedFloat;

use super::grid::GridWorld;
use super::road_network::RoadNetwork;
use super::traffic_light::TrafficLightController;
use super::types::{
    Coord, BASE_STEP_COST, DEFAULT_MAX_EXPANSIONS, DEFAULT_RED_LIGHT_PENALTY_CAP,
    OCCUPIED_CELL_PENALTY,
};

/// A planned route
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Ordered cells, starting with the start cell and ending at the goal
    pub cells: Vec<Coord>,
    /// Sum of edge costs at search time
    pub cost: f32,
    /// Nodes expanded by the search
    pub expansions: usize,
}

/// Open-list key: lowest `f` first, then least red-light penalty paid so
/// far, then earliest insertion
type OpenEntry = Reverse<(OrderedFloat<f32>, OrderedFloat<f32>, u64, Coord)>;

/// Shortest path search with a bounded number of expansions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Router {
    max_expansions: usize,
    red_light_penalty_cap: f32,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EXPANSIONS, DEFAULT_RED_LIGHT_PENALTY_CAP)
    }
}

impl Router {
    pub fn new(max_expansions: usize, red_light_penalty_cap: f32) -> Self {
        Self {
            max_expansions,
            red_light_penalty_cap: red_light_penalty_cap.max(0.0),
        }
    }

    pub fn max_expansions(&self) -> usize {
        self.max_expansions
    }

    /// Extra cost of entering a red light with the given period. Grows with
    /// the period (expected wait) and saturates at the configured cap.
    pub fn red_light_penalty(&self, period: u32) -> f32 {
        (period as f32 / 2.0).min(self.red_light_penalty_cap)
    }

    /// Cost of stepping into `to` given the current traffic state
    pub fn edge_cost(&self, to: Coord, grid: &GridWorld, lights: &TrafficLightController) -> f32 {
        let mut cost = BASE_STEP_COST;
        if grid.has_active_car(to) {
            cost += OCCUPIED_CELL_PENALTY;
        }
        cost + self.red_light_cost(to, lights)
    }

    /// Red light share of [`Router::edge_cost`]; zero unless `to` is red
    fn red_light_cost(&self, to: Coord, lights: &TrafficLightController) -> f32 {
        match lights.light_at(to) {
            Some(light) if light.is_red() => self.red_light_penalty(light.period),
            _ => 0.0,
        }
    }

    /// Cell sequence from `start` to `goal`; empty when no path was found
    pub fn find_path(
        &self,
        start: Coord,
        goal: Coord,
        network: &RoadNetwork,
        grid: &GridWorld,
        lights: &TrafficLightController,
    ) -> Vec<Coord> {
        self.plan(start, goal, network, grid, lights)
            .map(|route| route.cells)
            .unwrap_or_default()
    }

    /// Run the A* search and return the full route, or `None` if the goal
    /// is unreachable or the expansion cap was hit
    pub fn plan(
        &self,
        start: Coord,
        goal: Coord,
        network: &RoadNetwork,
        grid: &GridWorld,
        lights: &TrafficLightController,
    ) -> Option<Route> {
        if !network.is_in_bounds(start) || !network.is_in_bounds(goal) {
            return None;
        }
        if start == goal {
            return Some(Route {
                cells: vec![start],
                cost: 0.0,
                expansions: 0,
            });
        }

        let heuristic = |coord: Coord| coord.manhattan(goal) as f32;

        let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
        let mut g_score: HashMap<Coord, f32> = HashMap::new();
        // Among equal-cost routes, the one through fewer red lights wins
        let mut red_score: HashMap<Coord, f32> = HashMap::new();
        let mut came_from: HashMap<Coord, Coord> = HashMap::new();
        let mut closed: HashSet<Coord> = HashSet::new();
        let mut sequence: u64 = 0;
        let mut expansions = 0;

        g_score.insert(start, 0.0);
        red_score.insert(start, 0.0);
        open.push(Reverse((
            OrderedFloat(heuristic(start)),
            OrderedFloat(0.0),
            sequence,
            start,
        )));

        while let Some(Reverse((_, _, _, current))) = open.pop() {
            if !closed.insert(current) {
                continue;
            }

            if current == goal {
                let cells = reconstruct_path(&came_from, start, goal);
                let cost = g_score.get(&goal).copied().unwrap_or_default();
                log::trace!(
                    "route {} -> {}: {} cells, cost {:.1}, {} expansions",
                    start,
                    goal,
                    cells.len(),
                    cost,
                    expansions
                );
                return Some(Route {
                    cells,
                    cost,
                    expansions,
                });
            }

            expansions += 1;
            if expansions > self.max_expansions {
                log::debug!(
                    "route {} -> {}: gave up after {} expansions",
                    start,
                    goal,
                    self.max_expansions
                );
                return None;
            }

            let current_g = g_score.get(&current).copied().unwrap_or(f32::INFINITY);
            let current_red = red_score.get(&current).copied().unwrap_or_default();
            for (next, _) in network.successors(current) {
                if closed.contains(&next) {
                    continue;
                }
                let tentative = current_g + self.edge_cost(next, grid, lights);
                let tentative_red = current_red + self.red_light_cost(next, lights);
                let known_g = g_score.get(&next).copied().unwrap_or(f32::INFINITY);
                let known_red = red_score.get(&next).copied().unwrap_or(f32::INFINITY);
                if tentative < known_g || (tentative == known_g && tentative_red < known_red) {
                    came_from.insert(next, current);
                    g_score.insert(next, tentative);
                    red_score.insert(next, tentative_red);
                    sequence += 1;
                    open.push(Reverse((
                        OrderedFloat(tentative + heuristic(next)),
                        OrderedFloat(tentative_red),
                        sequence,
                        next,
                    )));
                }
            }
        }

        log::debug!("route {} -> {}: unreachable", start, goal);
        None
    }
}

fn reconstruct_path(came_from: &HashMap<Coord, Coord>, start: Coord, goal: Coord) -> Vec<Coord> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&previous) => {
                path.push(previous);
                current = previous;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
