//! Fixed timestep physics step
//!
//! Advances the body along the incline by one tick: force composition with a
//! static/dynamic friction branch, semi-implicit Euler integration, then
//! energy and power bookkeeping.

use super::state::{Energy, Forces, Parameters, Power, PowerSample, SimState};
use crate::incline_components;
use crate::settings::{Settings, WorkAccounting};

/// Resolve the forces acting along the line of motion.
///
/// `velocity` is the pre-tick velocity. Below the rest threshold static
/// friction cancels the other forces up to its limit; otherwise kinetic
/// friction opposes the current direction of motion.
fn resolve_forces(
    params: &Parameters,
    velocity: f64,
    force_active: bool,
    (sin_a, cos_a): (f64, f64),
    settings: &Settings,
) -> Forces {
    let g = settings.gravity;
    let applied = if force_active { params.force_n } else { 0.0 };
    let gravity_parallel = params.mass_kg * g * sin_a;
    let friction_max = params.friction_mu * params.mass_kg * g * cos_a;

    let friction = if velocity.abs() < settings.rest_velocity_threshold {
        let other = applied + gravity_parallel;
        let magnitude = friction_max.min(other.abs());
        if other > 0.0 { -magnitude } else { magnitude }
    } else {
        -velocity.signum() * friction_max
    };

    Forces {
        total: applied + gravity_parallel + friction,
        applied,
        friction,
        gravity_parallel,
    }
}

/// Advance the simulation by one fixed timestep.
///
/// A state that is not running comes back unchanged. Mass must be positive;
/// the control layer rejects anything else before `running` can be set.
pub fn step(mut state: SimState, dt: f64, settings: &Settings) -> SimState {
    if !state.running {
        return state;
    }

    let params = state.params;
    let prev_position = state.position;

    state.time_s += dt;
    let force_active = state.time_s <= params.duration_s;
    let incline = incline_components(params.angle_deg);

    let forces = resolve_forces(&params, state.velocity, force_active, incline, settings);
    let acceleration = forces.total / params.mass_kg;

    // Linear term uses the updated velocity
    let velocity = state.velocity + acceleration * dt;
    let position = prev_position + velocity * dt + 0.5 * acceleration * dt * dt;

    let distance = position - prev_position;
    let work_delta = match settings.work_accounting {
        WorkAccounting::ForwardOnly if force_active && distance > 0.0 => forces.applied * distance,
        WorkAccounting::Signed if force_active => forces.applied * distance,
        _ => 0.0,
    };

    let height = position * incline.0;
    state.energy = Energy {
        kinetic: 0.5 * params.mass_kg * velocity * velocity,
        potential: params.mass_kg * settings.gravity * height,
        work: state.energy.work + work_delta,
        loss: 0.0,
    };

    let instant = forces.applied * velocity;
    record_power(&mut state.power, state.time_s, instant, dt, settings);

    state.forces = forces;
    state.acceleration = acceleration;
    state.velocity = velocity;
    state.position = position;
    state
}

/// Append a power sample when this tick crosses a sampling boundary
fn record_power(power: &mut Power, time_s: f64, instant: f64, dt: f64, settings: &Settings) {
    power.instant = instant;

    if time_s % settings.power_sample_interval < dt {
        power.log.push(PowerSample {
            time: time_s,
            power: instant,
        });

        if let Some(capacity) = settings.power_log_capacity {
            let excess = power.log.len().saturating_sub(capacity);
            power.log.drain(..excess);
        }
    }
}

/// Show the instantaneous force balance without advancing time.
///
/// The body is treated as resting, so the static friction branch always
/// applies. Only forces and acceleration change.
pub fn preview_forces(mut state: SimState, settings: &Settings) -> SimState {
    let params = state.params;
    let force_active = state.time_s <= params.duration_s;
    let incline = incline_components(params.angle_deg);

    let forces = resolve_forces(&params, 0.0, force_active, incline, settings);
    state.acceleration = forces.total / params.mass_kg;
    state.forces = forces;
    state
}
