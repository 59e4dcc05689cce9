//! Shared helpers for the integration tests

#![allow(dead_code)]

use city_traffic::simulation::{MapDescription, SimConfig, SimWorld, SymbolDictionary};

pub const DICTIONARY: &str = r#"{">": "Right", "<": "Left", "^": "Up", "v": "Down", "S": 10, "s": 10}"#;

pub fn dictionary() -> SymbolDictionary {
    SymbolDictionary::from_json(DICTIONARY).expect("test dictionary should parse")
}

pub fn parse_map(text: &str) -> MapDescription {
    MapDescription::parse(text, &dictionary()).expect("test map should parse")
}

/// A world that never spawns on its own
pub fn quiet_world(text: &str) -> SimWorld {
    SimWorld::new(&parse_map(text), SimConfig::default().with_cars_per_spawn(0))
        .expect("test world should build")
}
