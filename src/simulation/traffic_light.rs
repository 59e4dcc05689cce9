//! Traffic light logic for the traffic simulation
//!
//! Each light is a two-state machine that toggles between green and red on
//! multiples of its own period.

use std::collections::HashMap;

use serde::Serialize;

use super::map::MapDescription;
use super::types::Coord;

/// Phase of a traffic light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LightState {
    Green,
    Red,
}

impl LightState {
    pub fn toggled(self) -> LightState {
        match self {
            LightState::Green => LightState::Red,
            LightState::Red => LightState::Green,
        }
    }
}

/// A traffic light sitting on a road cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficLight {
    pub coord: Coord,
    pub state: LightState,
    /// Ticks between toggles
    pub period: u32,
}

impl TrafficLight {
    pub fn new(coord: Coord, state: LightState, period: u32) -> Self {
        Self {
            coord,
            state,
            period,
        }
    }

    /// Toggle if `tick` is a positive multiple of the period.
    /// Returns true when the light changed.
    pub fn update(&mut self, tick: u64) -> bool {
        if tick > 0 && self.period > 0 && tick % u64::from(self.period) == 0 {
            self.state = self.state.toggled();
            true
        } else {
            false
        }
    }

    pub fn is_red(&self) -> bool {
        self.state == LightState::Red
    }
}

/// Owns every light of the map
#[derive(Debug, Clone, Default)]
pub struct TrafficLightController {
    lights: Vec<TrafficLight>,
    by_coord: HashMap<Coord, usize>,
}

impl TrafficLightController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: &MapDescription) -> Self {
        let mut controller = Self::new();
        for (coord, cell) in map.cells() {
            if let Some(light) = cell.light {
                controller.add_light(TrafficLight::new(coord, light.initial, light.period));
            }
        }
        controller
    }

    /// Adds a light, replacing any light already at the same cell
    pub fn add_light(&mut self, light: TrafficLight) {
        match self.by_coord.get(&light.coord) {
            Some(&index) => self.lights[index] = light,
            None => {
                self.by_coord.insert(light.coord, self.lights.len());
                self.lights.push(light);
            }
        }
    }

    /// Advance every light to `tick`. Returns how many toggled.
    pub fn update(&mut self, tick: u64) -> usize {
        let mut toggled = 0;
        for light in &mut self.lights {
            if light.update(tick) {
                log::trace!("light at {} turned {:?} at tick {}", light.coord, light.state, tick);
                toggled += 1;
            }
        }
        toggled
    }

    pub fn light_at(&self, coord: Coord) -> Option<&TrafficLight> {
        self.by_coord.get(&coord).map(|&index| &self.lights[index])
    }

    pub fn state_at(&self, coord: Coord) -> Option<LightState> {
        self.light_at(coord).map(|light| light.state)
    }

    pub fn is_red_at(&self, coord: Coord) -> bool {
        self.light_at(coord).is_some_and(TrafficLight::is_red)
    }

    pub fn lights(&self) -> &[TrafficLight] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}
