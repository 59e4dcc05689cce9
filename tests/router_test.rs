//! A* routing tests

mod common;

use petgraph::algo::dijkstra;
use petgraph::visit::EdgeRef;

use city_traffic::simulation::{Coord, Router, SimConfig, SimWorld};

/// Test that a red light is routed around when a cheaper detour exists
#[test]
fn test_red_light_is_avoided_when_detour_is_cheaper() {
    let world = common::quiet_world(">>>>>>>\n>>>S>>D\n");
    let light = Coord::new(3, 0);
    assert!(world.lights().is_red_at(light));

    let route = world
        .router()
        .plan(
            Coord::new(0, 0),
            Coord::new(6, 0),
            world.network(),
            world.grid(),
            world.lights(),
        )
        .expect("goal should be reachable");

    // Straight through costs 6 steps plus a penalty of 5
    assert_eq!(route.cost, 8.0);
    assert!(!route.cells.contains(&light));
    assert_eq!(route.cells.first(), Some(&Coord::new(0, 0)));
    assert_eq!(route.cells.last(), Some(&Coord::new(6, 0)));
}

/// Test that a red light loses a tie against a detour of the same cost
#[test]
fn test_red_light_is_avoided_when_detour_costs_the_same() {
    // Period 8 makes the light cost 4: six steps plus 4 equals the ten-step detour
    let dictionary = r#"{">": "Right", "<": "Left", "^": "Up", "v": "Down", "S": 8}"#;
    let world = SimWorld::from_text(
        ">>>>>>>\n^#####v\n>>>S>>D\n",
        dictionary,
        SimConfig::default().with_cars_per_spawn(0),
    )
    .unwrap();
    let light = Coord::new(3, 0);
    assert!(world.lights().is_red_at(light));

    let route = world
        .router()
        .plan(
            Coord::new(0, 0),
            Coord::new(6, 0),
            world.network(),
            world.grid(),
            world.lights(),
        )
        .unwrap();

    assert_eq!(route.cost, 10.0);
    assert!(!route.cells.contains(&light));
    assert_eq!(route.cells.len(), 11);
}

#[test]
fn test_occupied_cell_is_avoided_when_detour_is_cheaper() {
    let mut world = common::quiet_world(">>>>>>\n>>>>>D\n");
    let blocker = Coord::new(2, 0);
    world.spawn_car(blocker, Coord::new(5, 0)).unwrap();

    let route = world
        .router()
        .plan(
            Coord::new(0, 0),
            Coord::new(5, 0),
            world.network(),
            world.grid(),
            world.lights(),
        )
        .unwrap();

    assert_eq!(route.cost, 7.0);
    assert!(!route.cells.contains(&blocker));
}

#[test]
fn test_edge_costs() {
    let mut world = common::quiet_world(">S>D\n");
    world.spawn_car(Coord::new(2, 0), Coord::new(3, 0)).unwrap();
    let router = world.router();

    assert_eq!(router.edge_cost(Coord::new(0, 0), world.grid(), world.lights()), 1.0);
    assert_eq!(router.edge_cost(Coord::new(1, 0), world.grid(), world.lights()), 6.0);
    assert_eq!(router.edge_cost(Coord::new(2, 0), world.grid(), world.lights()), 4.0);

    assert_eq!(router.red_light_penalty(10), 5.0);
    assert_eq!(router.red_light_penalty(50), 10.0);
    assert_eq!(Router::new(100, 2.0).red_light_penalty(10), 2.0);
}

#[test]
fn test_start_equals_goal() {
    let world = common::quiet_world(">>D\n");
    let start = Coord::new(1, 0);
    let route = world
        .router()
        .plan(start, start, world.network(), world.grid(), world.lights())
        .unwrap();

    assert_eq!(route.cells, vec![start]);
    assert_eq!(route.cost, 0.0);
}

#[test]
fn test_unreachable_goal_gives_empty_path() {
    let world = common::quiet_world(">.D\n");
    let path = world.router().find_path(
        Coord::new(0, 0),
        Coord::new(2, 0),
        world.network(),
        world.grid(),
        world.lights(),
    );
    assert!(path.is_empty());

    // Off the map
    let path = world.router().find_path(
        Coord::new(0, 0),
        Coord::new(9, 9),
        world.network(),
        world.grid(),
        world.lights(),
    );
    assert!(path.is_empty());
}

/// Test that the search gives up once the expansion cap is reached
#[test]
fn test_expansion_cap() {
    let world = common::quiet_world(">>>>>D\n");
    let start = Coord::new(0, 0);
    let goal = Coord::new(5, 0);

    let capped = Router::new(3, 10.0);
    assert!(capped
        .plan(start, goal, world.network(), world.grid(), world.lights())
        .is_none());
    assert!(capped
        .find_path(start, goal, world.network(), world.grid(), world.lights())
        .is_empty());

    let route = world
        .router()
        .plan(start, goal, world.network(), world.grid(), world.lights())
        .unwrap();
    assert_eq!(route.cells.len(), 6);
    assert!(route.expansions <= world.router().max_expansions());
}

fn busy_demo_world() -> SimWorld {
    let mut world = SimWorld::demo(SimConfig::default().with_cars_per_spawn(0)).unwrap();
    for (entry, destination) in [
        (Coord::new(5, 0), Coord::new(3, 7)),
        (Coord::new(11, 4), Coord::new(3, 1)),
        (Coord::new(6, 8), Coord::new(7, 1)),
        (Coord::new(2, 5), Coord::new(4, 4)),
    ] {
        world.spawn_car(entry, destination).unwrap();
    }
    world
}

fn road_cells(world: &SimWorld) -> Vec<Coord> {
    let graph = world.network().graph();
    graph
        .node_indices()
        .map(|node| graph[node])
        .filter(|&coord| world.network().direction_of(coord).is_some())
        .collect()
}

/// Test that A* finds the same cost as an exhaustive Dijkstra search
#[test]
fn test_route_cost_is_optimal() {
    let world = busy_demo_world();
    let network = world.network();
    let graph = network.graph();
    let router = world.router();
    let destinations: Vec<Coord> = network.destinations().collect();

    for start in road_cells(&world) {
        let start_node = network.node_of(start).unwrap();
        let costs = dijkstra(graph, start_node, None, |edge| {
            router.edge_cost(graph[edge.target()], world.grid(), world.lights())
        });

        for &goal in &destinations {
            let goal_node = network.node_of(goal).unwrap();
            let route = router.plan(start, goal, network, world.grid(), world.lights());
            match (costs.get(&goal_node), route) {
                (Some(&best), Some(route)) => assert!(
                    (best - route.cost).abs() < 1e-4,
                    "{} -> {}: A* cost {} but best is {}",
                    start,
                    goal,
                    route.cost,
                    best
                ),
                (None, None) => {}
                (best, route) => panic!(
                    "{} -> {}: reachability mismatch ({:?} vs {:?})",
                    start, goal, best, route
                ),
            }
        }
    }
}

/// Test that every planned step is a legal move and no cell repeats
#[test]
fn test_routes_follow_legal_moves() {
    let world = busy_demo_world();
    let network = world.network();
    let destinations: Vec<Coord> = network.destinations().collect();

    for start in road_cells(&world) {
        for &goal in &destinations {
            let path = world
                .router()
                .find_path(start, goal, network, world.grid(), world.lights());
            if path.is_empty() {
                continue;
            }

            assert_eq!(path[0], start);
            assert_eq!(*path.last().unwrap(), goal);
            for step in path.windows(2) {
                assert!(
                    network.is_legal_move(step[0], step[1]),
                    "illegal step {} -> {}",
                    step[0],
                    step[1]
                );
                let road = network.direction_of(step[0]).unwrap();
                assert_ne!(step[0].direction_to(step[1]), Some(road.opposite()));
            }

            let mut seen = path.clone();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), path.len(), "{} -> {} revisits a cell", start, goal);
        }
    }
}
