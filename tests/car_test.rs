//! Car state machine tests, driven one update at a time

mod common;

use city_traffic::simulation::{
    BlockReason, CarId, CarStatus, CarUpdateResult, Coord, GridWorld, Occupant, RoadNetwork,
    Router, SimCar, TickContext, TrafficLightController,
};

struct Fixture {
    grid: GridWorld,
    network: RoadNetwork,
    lights: TrafficLightController,
    router: Router,
}

impl Fixture {
    fn new(text: &str) -> Self {
        let map = common::parse_map(text);
        let network = RoadNetwork::from_map(&map).unwrap();
        let grid = GridWorld::from_map(&map, |coord| network.direction_of(coord)).unwrap();
        Self {
            grid,
            lights: TrafficLightController::from_map(&map),
            network,
            router: Router::default(),
        }
    }

    fn add_car(&mut self, id: usize, at: Coord, destination: Coord) -> SimCar {
        let id = CarId(id);
        self.grid
            .place(Occupant::Car { id, arrived: false }, at)
            .unwrap();
        SimCar::new(id, at, destination, 0)
    }

    fn update(&mut self, car: &mut SimCar, replan_interval: u32) -> CarUpdateResult {
        let mut ctx = TickContext {
            tick: 1,
            grid: &mut self.grid,
            network: &self.network,
            lights: &self.lights,
            router: &self.router,
            replan_interval,
        };
        car.update(&mut ctx).unwrap()
    }
}

#[test]
fn test_new_car_routes_then_moves() {
    let mut fx = Fixture::new(">>>D\n");
    let mut car = fx.add_car(0, Coord::new(0, 0), Coord::new(3, 0));
    assert_eq!(car.status, CarStatus::Routing);
    assert_eq!(car.next_cell(), None);

    let result = fx.update(&mut car, 5);

    assert_eq!(
        result,
        CarUpdateResult::Moved {
            from: Coord::new(0, 0),
            to: Coord::new(1, 0),
            arrived: false
        }
    );
    assert_eq!(car.status, CarStatus::Moving);
    assert_eq!(car.position, Coord::new(1, 0));
    assert_eq!(car.next_cell(), Some(Coord::new(2, 0)));
    assert_eq!(fx.grid.active_car_at(Coord::new(1, 0)), Some(car.id));
    assert!(!fx.grid.has_active_car(Coord::new(0, 0)));
}

/// Test that arrival is immediate and removal happens on the next update
#[test]
fn test_arrival_then_removal() {
    let mut fx = Fixture::new(">>D\n");
    let goal = Coord::new(2, 0);
    let mut car = fx.add_car(0, Coord::new(1, 0), goal);

    let result = fx.update(&mut car, 5);
    assert_eq!(
        result,
        CarUpdateResult::Moved {
            from: Coord::new(1, 0),
            to: goal,
            arrived: true
        }
    );
    assert_eq!(car.status, CarStatus::Arrived);
    assert_eq!(fx.grid.car_count(goal), 1);
    assert!(!fx.grid.has_active_car(goal));

    assert_eq!(fx.update(&mut car, 5), CarUpdateResult::Removed);
    assert_eq!(fx.grid.car_count(goal), 0);
}

#[test]
fn test_red_light_blocks() {
    let mut fx = Fixture::new(">S>D\n");
    let mut car = fx.add_car(0, Coord::new(0, 0), Coord::new(3, 0));

    let result = fx.update(&mut car, 5);

    assert_eq!(result, CarUpdateResult::Blocked(BlockReason::RedLight));
    assert_eq!(car.status, CarStatus::Blocked);
    assert_eq!(car.position, Coord::new(0, 0));
    assert_eq!(car.blocked_ticks, 0);
}

#[test]
fn test_blocked_by_car_counts_ticks() {
    let mut fx = Fixture::new(">>>D\n");
    let mut car = fx.add_car(0, Coord::new(0, 0), Coord::new(3, 0));
    fx.add_car(1, Coord::new(1, 0), Coord::new(3, 0));

    for expected in 1..=3 {
        let result = fx.update(&mut car, 5);
        assert_eq!(result, CarUpdateResult::Blocked(BlockReason::Occupied(CarId(1))));
        assert_eq!(car.blocked_ticks, expected);
    }
    assert_eq!(car.position, Coord::new(0, 0));

    // Once the way clears the counter resets
    fx.grid
        .move_car(CarId(1), Coord::new(1, 0), Coord::new(2, 0))
        .unwrap();
    fx.grid.vacate_car(CarId(1), Coord::new(2, 0)).unwrap();
    assert!(matches!(fx.update(&mut car, 5), CarUpdateResult::Moved { .. }));
    assert_eq!(car.blocked_ticks, 0);
}

#[test]
fn test_no_path_blocks() {
    let mut fx = Fixture::new(">.D\n");
    let mut car = fx.add_car(0, Coord::new(0, 0), Coord::new(2, 0));

    assert_eq!(
        fx.update(&mut car, 5),
        CarUpdateResult::Blocked(BlockReason::NoPath)
    );
    assert!(car.path.is_empty());
    assert_eq!(car.status, CarStatus::Blocked);
}

/// Test that a car whose route no longer contains it plans a new one
#[test]
fn test_desynced_route_is_replanned() {
    let mut fx = Fixture::new(">>>>D\n");
    let mut car = fx.add_car(0, Coord::new(1, 0), Coord::new(4, 0));
    car.path = vec![Coord::new(7, 7), Coord::new(8, 7)];
    car.cursor = 1;

    let result = fx.update(&mut car, 5);

    assert_eq!(
        result,
        CarUpdateResult::Moved {
            from: Coord::new(1, 0),
            to: Coord::new(2, 0),
            arrived: false
        }
    );
    assert_eq!(car.path.first(), Some(&Coord::new(1, 0)));
    assert_eq!(car.path.last(), Some(&Coord::new(4, 0)));
}

#[test]
fn test_obstacle_on_route_forces_replan() {
    let mut fx = Fixture::new(">>>>\n>#>D\n");
    let obstacle = Coord::new(1, 0);
    let mut car = fx.add_car(0, Coord::new(0, 0), Coord::new(3, 0));
    car.path = vec![Coord::new(0, 0), obstacle, Coord::new(2, 0), Coord::new(3, 0)];

    let result = fx.update(&mut car, 5);

    assert_eq!(result, CarUpdateResult::Blocked(BlockReason::Obstacle));
    assert_eq!(car.position, Coord::new(0, 0));
    assert_eq!(car.path.first(), Some(&Coord::new(0, 0)));
    assert!(!car.path.contains(&obstacle));
    assert_eq!(car.next_cell(), Some(Coord::new(0, 1)));
}

#[test]
fn test_car_already_on_destination_is_removed() {
    let mut fx = Fixture::new(">D\n");
    let goal = Coord::new(1, 0);
    let mut car = fx.add_car(0, goal, goal);

    assert_eq!(fx.update(&mut car, 5), CarUpdateResult::Removed);
    assert_eq!(fx.grid.car_count(goal), 0);
}
