//! Road network graph for pathfinding
//!
//! Built once from a [`MapDescription`] and never mutated afterwards. Every
//! road or destination cell is a node; an edge `a -> b` exists when a car on
//! `a` may legally step into `b` (forward or lane change, never reversing).

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use super::error::MapError;
use super::map::MapDescription;
use super::types::{Coord, Direction};

/// Neighbor road directions needed for a cell to count as an intersection
pub const INTERSECTION_DIRECTION_THRESHOLD: usize = 2;

/// Static directed road graph
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    width: usize,
    height: usize,

    /// Travel direction of every road cell, including inferred light cells
    directions: HashMap<Coord, Direction>,

    /// Light cells whose direction came from the roads around them
    inferred: BTreeSet<Coord>,

    destinations: BTreeSet<Coord>,
    obstacles: BTreeSet<Coord>,

    /// Legal single-step moves, weighted by the move direction
    graph: DiGraph<Coord, Direction>,

    coord_to_node: HashMap<Coord, NodeIndex>,
}

impl RoadNetwork {
    /// Derive the network from a validated map
    pub fn from_map(map: &MapDescription) -> Result<Self, MapError> {
        map.validate()?;

        let mut directions = HashMap::new();
        let mut destinations = BTreeSet::new();
        let mut obstacles = BTreeSet::new();

        for (coord, cell) in map.cells() {
            if let Some(direction) = cell.road {
                directions.insert(coord, direction);
            }
            if cell.destination {
                destinations.insert(coord);
            }
            if cell.obstacle {
                obstacles.insert(coord);
            }
        }

        // Lights without their own direction take one from the roads around them
        let mut inferred = BTreeSet::new();
        for (coord, cell) in map.cells() {
            if cell.light.is_some() && cell.road.is_none() {
                let direction = infer_light_direction(map, coord)
                    .ok_or(MapError::IsolatedLight(coord))?;
                directions.insert(coord, direction);
                inferred.insert(coord);
            }
        }

        let mut network = Self {
            width: map.width(),
            height: map.height(),
            directions,
            inferred,
            destinations,
            obstacles,
            graph: DiGraph::new(),
            coord_to_node: HashMap::new(),
        };
        network.build_graph();

        log::debug!(
            "road network: {} road cells, {} destinations, {} legal moves",
            network.directions.len(),
            network.destinations.len(),
            network.graph.edge_count()
        );

        Ok(network)
    }

    fn build_graph(&mut self) {
        // Row-major node order keeps edge iteration deterministic
        let mut nodes: Vec<Coord> = self
            .directions
            .keys()
            .chain(self.destinations.iter())
            .copied()
            .collect();
        nodes.sort_by_key(|coord| (coord.y, coord.x));
        nodes.dedup();

        for coord in nodes {
            let node = self.graph.add_node(coord);
            self.coord_to_node.insert(coord, node);
        }

        let mut edges = Vec::new();
        for (&from, &road) in &self.directions {
            for direction in road.forward_moves() {
                let to = from.step(direction);
                if self.is_admissible(direction, to) {
                    edges.push((from, to, direction));
                }
            }
        }
        edges.sort_by_key(|&(from, to, _)| ((from.y, from.x), (to.y, to.x)));

        for (from, to, direction) in edges {
            let a = self.coord_to_node[&from];
            let b = self.coord_to_node[&to];
            self.graph.add_edge(a, b, direction);
        }
    }

    /// Whether a car moving in `direction` may enter `to`
    fn is_admissible(&self, direction: Direction, to: Coord) -> bool {
        if !self.is_in_bounds(to) || self.obstacles.contains(&to) {
            return false;
        }
        if self.destinations.contains(&to) {
            return true;
        }
        match self.direction_of(to) {
            Some(neighbor) => Self::compatible_entry(direction, neighbor),
            None => false,
        }
    }

    /// Entering a road whose direction is the exact reverse of the move
    /// would be a head-on entry into oncoming traffic.
    pub fn compatible_entry(move_direction: Direction, neighbor_direction: Direction) -> bool {
        neighbor_direction != move_direction.opposite()
    }

    pub fn is_in_bounds(&self, coord: Coord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    pub fn direction_of(&self, coord: Coord) -> Option<Direction> {
        self.directions.get(&coord).copied()
    }

    /// Whether the map itself declares a road here, as opposed to a light
    /// cell with an inferred direction
    pub fn has_road_marker(&self, coord: Coord) -> bool {
        self.directions.contains_key(&coord) && !self.inferred.contains(&coord)
    }

    /// True when the four neighbors carry at least
    /// [`INTERSECTION_DIRECTION_THRESHOLD`] distinct road directions
    pub fn is_intersection(&self, coord: Coord) -> bool {
        let distinct: BTreeSet<Direction> = Direction::ALL
            .iter()
            .filter_map(|&direction| self.direction_of(coord.step(direction)))
            .collect();
        distinct.len() >= INTERSECTION_DIRECTION_THRESHOLD
    }

    pub fn is_destination(&self, coord: Coord) -> bool {
        self.destinations.contains(&coord)
    }

    pub fn is_obstacle(&self, coord: Coord) -> bool {
        self.obstacles.contains(&coord)
    }

    /// Destination cells in row-major order
    pub fn destinations(&self) -> impl Iterator<Item = Coord> + '_ {
        let mut ordered: Vec<Coord> = self.destinations.iter().copied().collect();
        ordered.sort_by_key(|coord| (coord.y, coord.x));
        ordered.into_iter()
    }

    /// Cells a car on `coord` may step into, with the move direction
    pub fn successors(&self, coord: Coord) -> impl Iterator<Item = (Coord, Direction)> + '_ {
        self.coord_to_node
            .get(&coord)
            .into_iter()
            .flat_map(move |&node| {
                self.graph
                    .edges(node)
                    .map(move |edge| (self.graph[edge.target()], *edge.weight()))
            })
    }

    /// Whether the single step `from -> to` is a legal move
    pub fn is_legal_move(&self, from: Coord, to: Coord) -> bool {
        self.successors(from).any(|(next, _)| next == to)
    }

    /// The underlying graph, for analysis and verification
    pub fn graph(&self) -> &DiGraph<Coord, Direction> {
        &self.graph
    }

    pub fn node_of(&self, coord: Coord) -> Option<NodeIndex> {
        self.coord_to_node.get(&coord).copied()
    }

    pub fn road_count(&self) -> usize {
        self.directions.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

/// A road pointing into the light wins; otherwise the first neighboring road
fn infer_light_direction(map: &MapDescription, coord: Coord) -> Option<Direction> {
    let neighbor_road = |direction: Direction| {
        map.cell(coord.step(direction)).and_then(|cell| cell.road)
    };

    Direction::ALL
        .iter()
        .find_map(|&side| {
            neighbor_road(side).filter(|&road| coord.step(side).step(road) == coord)
        })
        .or_else(|| Direction::ALL.iter().find_map(|&side| neighbor_road(side)))
}
