//! Derived read-only views
//!
//! Projections of [`SimState`] for consumers that only care about one part
//! of it. Pass these to `subscribe_view` or `select`.

use super::state::{DisplayMode, Energy, Forces, Parameters, Power, SimState};

pub fn params(state: &SimState) -> Parameters {
    state.params
}

pub fn running(state: &SimState) -> bool {
    state.running
}

pub fn time_s(state: &SimState) -> f64 {
    state.time_s
}

pub fn mode(state: &SimState) -> DisplayMode {
    state.mode
}

pub fn position(state: &SimState) -> f64 {
    state.position
}

pub fn velocity(state: &SimState) -> f64 {
    state.velocity
}

pub fn acceleration(state: &SimState) -> f64 {
    state.acceleration
}

pub fn forces(state: &SimState) -> Forces {
    state.forces
}

pub fn energy(state: &SimState) -> Energy {
    state.energy
}

/// Clones the power log; prefer a narrower view on hot paths
pub fn power(state: &SimState) -> Power {
    state.power.clone()
}

/// Number of samples in the power log
pub fn power_log_len(state: &SimState) -> usize {
    state.power.log.len()
}
