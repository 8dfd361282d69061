//! Incline Lab - a 1D force, friction and incline motion lab
//!
//! Core modules:
//! - `sim`: Physics step, state container, clock and control API
//! - `platform`: Host frame scheduling (requestAnimationFrame on web)
//! - `settings`: Data-driven simulation configuration
//! - `error`: Parameter validation and configuration errors

pub mod error;
pub mod platform;
pub mod settings;
pub mod sim;

pub use error::{SimError, SimResult};
pub use settings::{Settings, WorkAccounting};
pub use sim::{DisplayMode, ParameterKey, Parameters, SimState, Simulation};

/// Simulation configuration constants
pub mod consts {
    /// Gravitational acceleration (m/s²)
    pub const GRAVITY: f64 = 9.81;
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta fed to the accumulator (seconds)
    pub const MAX_FRAME_DELTA: f64 = 0.1;

    /// Interval between power log samples (seconds)
    pub const POWER_SAMPLE_INTERVAL: f64 = 0.1;
    /// Below this speed the body counts as resting and static friction applies (m/s)
    pub const REST_VELOCITY_THRESHOLD: f64 = 0.001;
}

/// Sine and cosine of an incline angle given in degrees
#[inline]
pub fn incline_components(angle_deg: f64) -> (f64, f64) {
    (angle_deg * std::f64::consts::PI / 180.0).sin_cos()
}
