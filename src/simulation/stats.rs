//! Simulation statistics

use log::info;

/// Running counters of a simulation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub total_cars_spawned: u64,
    pub total_cars_arrived: u64,
    /// Spawn attempts dropped because the entry corner was occupied
    pub spawns_skipped: u64,
    /// Car updates that ended without a route
    pub no_path_events: u64,
    /// Sum over ticks of cars that did not move
    pub blocked_car_ticks: u64,
    pub active_cars: u64,
    /// Sum of spawn-to-arrival ticks over arrived cars
    pub total_trip_ticks: u64,
}

impl SimulationStats {
    pub fn record_arrival(&mut self, trip_ticks: u64) {
        self.total_cars_arrived += 1;
        self.total_trip_ticks += trip_ticks;
    }

    pub fn average_trip_ticks(&self) -> f32 {
        if self.total_cars_arrived == 0 {
            0.0
        } else {
            self.total_trip_ticks as f32 / self.total_cars_arrived as f32
        }
    }

    /// Share of spawned cars that reached their destination, in percent
    pub fn success_rate(&self) -> f32 {
        if self.total_cars_spawned > 0 {
            (self.total_cars_arrived as f32 / self.total_cars_spawned as f32) * 100.0
        } else {
            0.0
        }
    }

    pub fn log_summary(&self, tick: u64) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Ticks: {}", tick);
        info!("Total cars spawned: {}", self.total_cars_spawned);
        info!("Total cars arrived: {}", self.total_cars_arrived);
        info!("Active cars: {}", self.active_cars);
        info!("Skipped spawns: {}", self.spawns_skipped);
        info!("No-path events: {}", self.no_path_events);
        info!("Blocked car-ticks: {}", self.blocked_car_ticks);
        info!("Average trip: {:.1} ticks", self.average_trip_ticks());
        info!("Success rate: {:.1}%", self.success_rate());
    }
}
