//! City Traffic Simulation Library
//!
//! A deterministic, tick-based traffic simulation on a grid city map. The
//! core is headless; front ends read [`simulation::WorldSnapshot`]s.

pub mod simulation;
