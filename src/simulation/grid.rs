//! Cell grid and occupancy for the traffic simulation
//!
//! The grid is an arena of cells indexed by coordinate. Cars only ever hold
//! a [`Coord`] into it; all occupancy changes go through [`GridWorld::place`],
//! [`GridWorld::vacate_car`] and [`GridWorld::move_car`].

use super::error::SimError;
use super::map::MapDescription;
use super::types::{CarId, Coord, Direction};

/// Something that sits in a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    Road(Direction),
    TrafficLight,
    Obstacle,
    Destination,
    /// A car. Arrived cars stay in their destination cell until removed
    /// and never block anybody.
    Car { id: CarId, arrived: bool },
}

impl Occupant {
    /// The car id of an active (not arrived) car
    pub fn active_car(&self) -> Option<CarId> {
        match *self {
            Occupant::Car { id, arrived: false } => Some(id),
            _ => None,
        }
    }

    fn same_kind(&self, other: &Occupant) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

#[derive(Debug, Clone, Default)]
struct Cell {
    occupants: Vec<Occupant>,
}

/// The city grid
#[derive(Debug, Clone)]
pub struct GridWorld {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl GridWorld {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width * height],
        }
    }

    /// A grid holding the static markers of `map`. Road markers come from
    /// `road_direction`, which lets the road network supply inferred
    /// directions for traffic light cells.
    pub fn from_map(
        map: &MapDescription,
        road_direction: impl Fn(Coord) -> Option<Direction>,
    ) -> Result<Self, SimError> {
        let mut grid = Self::new(map.width(), map.height());
        for (coord, cell) in map.cells() {
            if cell.obstacle {
                grid.place(Occupant::Obstacle, coord)?;
            }
            if let Some(direction) = road_direction(coord) {
                grid.place(Occupant::Road(direction), coord)?;
            }
            if cell.light.is_some() {
                grid.place(Occupant::TrafficLight, coord)?;
            }
            if cell.destination {
                grid.place(Occupant::Destination, coord)?;
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_in_bounds(&self, coord: Coord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
    }

    fn index_of(&self, coord: Coord) -> Option<usize> {
        self.is_in_bounds(coord)
            .then(|| coord.y as usize * self.width + coord.x as usize)
    }

    fn cell_mut(&mut self, coord: Coord) -> Result<&mut Cell, SimError> {
        let index = self.index_of(coord).ok_or(SimError::OutOfBounds(coord))?;
        Ok(&mut self.cells[index])
    }

    /// Everything in the cell; empty for out-of-bounds coordinates
    pub fn occupant_at(&self, coord: Coord) -> &[Occupant] {
        match self.index_of(coord) {
            Some(index) => &self.cells[index].occupants,
            None => &[],
        }
    }

    /// Add an occupant to a cell
    ///
    /// Cars fail with [`SimError::OccupancyConflict`] if an active car is
    /// already there. Static markers fail if the cell already holds one of
    /// the same kind, or if a road and an obstacle would share the cell.
    pub fn place(&mut self, occupant: Occupant, coord: Coord) -> Result<(), SimError> {
        let cell = self.cell_mut(coord)?;

        match occupant {
            Occupant::Car { id, arrived } => {
                if !arrived {
                    if let Some(holder) = cell.occupants.iter().find_map(Occupant::active_car) {
                        return Err(SimError::OccupancyConflict {
                            car: id,
                            to: coord,
                            holder,
                        });
                    }
                }
            }
            _ => {
                if cell.occupants.iter().any(|o| o.same_kind(&occupant)) {
                    return Err(SimError::InvalidPlacement {
                        at: coord,
                        reason: "duplicate static marker",
                    });
                }
                let blocked = cell.occupants.iter().any(|o| {
                    matches!(
                        (o, &occupant),
                        (Occupant::Obstacle, Occupant::Road(_))
                            | (Occupant::Road(_), Occupant::Obstacle)
                    )
                });
                if blocked {
                    return Err(SimError::InvalidPlacement {
                        at: coord,
                        reason: "road and obstacle cannot share a cell",
                    });
                }
            }
        }

        cell.occupants.push(occupant);
        Ok(())
    }

    /// Remove a car from a cell, whether it is active or arrived
    pub fn vacate_car(&mut self, car: CarId, coord: Coord) -> Result<(), SimError> {
        let cell = self.cell_mut(coord)?;
        let position = cell
            .occupants
            .iter()
            .position(|o| matches!(o, Occupant::Car { id, .. } if *id == car))
            .ok_or(SimError::MissingOccupant { car, at: coord })?;
        cell.occupants.remove(position);
        Ok(())
    }

    /// Move an active car between cells. Either both halves happen or
    /// neither does.
    pub fn move_car(&mut self, car: CarId, from: Coord, to: Coord) -> Result<(), SimError> {
        if let Some(holder) = self.active_car_at(to) {
            return Err(SimError::OccupancyConflict { car, to, holder });
        }
        if !self.is_in_bounds(to) {
            return Err(SimError::OutOfBounds(to));
        }
        self.vacate_car(car, from)?;
        self.place(
            Occupant::Car {
                id: car,
                arrived: false,
            },
            to,
        )
    }

    /// Flag a car as arrived so it stops counting as an obstacle
    pub fn mark_arrived(&mut self, car: CarId, coord: Coord) -> Result<(), SimError> {
        let cell = self.cell_mut(coord)?;
        let occupant = cell
            .occupants
            .iter_mut()
            .find(|o| matches!(o, Occupant::Car { id, .. } if *id == car))
            .ok_or(SimError::MissingOccupant { car, at: coord })?;
        *occupant = Occupant::Car {
            id: car,
            arrived: true,
        };
        Ok(())
    }

    pub fn active_car_at(&self, coord: Coord) -> Option<CarId> {
        self.occupant_at(coord)
            .iter()
            .find_map(Occupant::active_car)
    }

    pub fn has_active_car(&self, coord: Coord) -> bool {
        self.active_car_at(coord).is_some()
    }

    pub fn has_obstacle(&self, coord: Coord) -> bool {
        self.occupant_at(coord).contains(&Occupant::Obstacle)
    }

    pub fn is_destination(&self, coord: Coord) -> bool {
        self.occupant_at(coord).contains(&Occupant::Destination)
    }

    pub fn has_traffic_light(&self, coord: Coord) -> bool {
        self.occupant_at(coord).contains(&Occupant::TrafficLight)
    }

    pub fn road_direction(&self, coord: Coord) -> Option<Direction> {
        self.occupant_at(coord).iter().find_map(|o| match o {
            Occupant::Road(direction) => Some(*direction),
            _ => None,
        })
    }

    /// Number of cars (active or arrived) in a cell
    pub fn car_count(&self, coord: Coord) -> usize {
        self.occupant_at(coord)
            .iter()
            .filter(|o| matches!(o, Occupant::Car { .. }))
            .count()
    }

    /// Occupied cells in row-major order, bottom row first
    pub fn occupied_cells(&self) -> impl Iterator<Item = (Coord, &[Occupant])> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.occupants.is_empty())
            .map(move |(index, cell)| {
                let coord = Coord::new((index % self.width) as i32, (index / self.width) as i32);
                (coord, cell.occupants.as_slice())
            })
    }
}
