//! Per-tick world snapshots for visualization front ends
//!
//! A snapshot lists every occupied cell with the display-relevant attributes
//! of its occupants. It knows nothing about how it will be drawn.

use std::collections::BTreeMap;

use serde::Serialize;

use super::car::{CarStatus, SimCar};
use super::grid::{GridWorld, Occupant};
use super::road_network::RoadNetwork;
use super::traffic_light::{LightState, TrafficLightController};
use super::types::{CarId, Coord, Direction};

/// Display view of one occupant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum OccupantView {
    Road {
        direction: Direction,
        intersection: bool,
    },
    TrafficLight {
        state: LightState,
        period: u32,
    },
    Obstacle,
    Destination,
    Car {
        id: CarId,
        status: CarStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellSnapshot {
    pub coord: Coord,
    pub occupants: Vec<OccupantView>,
}

/// Occupied cells of the world at the end of a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub width: usize,
    pub height: usize,
    pub cells: Vec<CellSnapshot>,
}

impl WorldSnapshot {
    pub fn capture(
        tick: u64,
        grid: &GridWorld,
        network: &RoadNetwork,
        lights: &TrafficLightController,
        cars: &BTreeMap<CarId, SimCar>,
    ) -> Self {
        let cells = grid
            .occupied_cells()
            .map(|(coord, occupants)| CellSnapshot {
                coord,
                occupants: occupants
                    .iter()
                    .filter_map(|occupant| view_of(coord, occupant, network, lights, cars))
                    .collect(),
            })
            .collect();

        Self {
            tick,
            width: grid.width(),
            height: grid.height(),
            cells,
        }
    }

    /// Every car in the snapshot with its cell
    pub fn car_positions(&self) -> Vec<(CarId, Coord)> {
        self.cells
            .iter()
            .flat_map(|cell| {
                cell.occupants.iter().filter_map(move |occupant| match occupant {
                    OccupantView::Car { id, .. } => Some((*id, cell.coord)),
                    _ => None,
                })
            })
            .collect()
    }

    /// Largest number of non-arrived cars found in a single cell
    pub fn max_moving_cars_per_cell(&self) -> usize {
        self.cells
            .iter()
            .map(|cell| {
                cell.occupants
                    .iter()
                    .filter(|occupant| {
                        matches!(occupant, OccupantView::Car { status, .. } if *status != CarStatus::Arrived)
                    })
                    .count()
            })
            .max()
            .unwrap_or(0)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn view_of(
    coord: Coord,
    occupant: &Occupant,
    network: &RoadNetwork,
    lights: &TrafficLightController,
    cars: &BTreeMap<CarId, SimCar>,
) -> Option<OccupantView> {
    let view = match *occupant {
        Occupant::Road(direction) => OccupantView::Road {
            direction,
            intersection: network.is_intersection(coord),
        },
        Occupant::TrafficLight => {
            let light = lights.light_at(coord)?;
            OccupantView::TrafficLight {
                state: light.state,
                period: light.period,
            }
        }
        Occupant::Obstacle => OccupantView::Obstacle,
        Occupant::Destination => OccupantView::Destination,
        Occupant::Car { id, arrived } => {
            let status = match cars.get(&id) {
                Some(car) => car.status,
                None if arrived => CarStatus::Arrived,
                None => return None,
            };
            OccupantView::Car { id, status }
        }
    };
    Some(view)
}
