//! Simulation settings
//!
//! Physical constants, clock tuning and policy switches. Every field has a
//! default, so a settings document only needs to name what it changes.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{SimError, SimResult};
use crate::sim::Parameters;

/// How work done by the applied force is accumulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkAccounting {
    /// Only forward displacement under active force adds work (classic lab behaviour)
    #[default]
    ForwardOnly,
    /// Signed integral: backward displacement under active force subtracts
    Signed,
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Physics ===
    /// Gravitational acceleration (m/s²)
    pub gravity: f64,
    /// Fixed tick length (s)
    pub timestep: f64,
    /// Speed below which static friction applies (m/s)
    pub rest_velocity_threshold: f64,
    pub work_accounting: WorkAccounting,

    // === Power history ===
    /// Interval between power samples (s)
    pub power_sample_interval: f64,
    /// Keep only the newest N samples (`None` = unbounded)
    pub power_log_capacity: Option<usize>,

    // === Clock ===
    /// Cap on ticks run per frame
    pub max_substeps: u32,
    /// Longest frame delta fed to the accumulator (s)
    pub max_frame_delta: f64,

    // === Policy ===
    /// Force substituted on start when the applied force is zero (`None` = never)
    pub start_force_fallback: Option<f64>,
    /// Parameters at process start
    pub initial_parameters: Parameters,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            timestep: SIM_DT,
            rest_velocity_threshold: REST_VELOCITY_THRESHOLD,
            work_accounting: WorkAccounting::ForwardOnly,

            power_sample_interval: POWER_SAMPLE_INTERVAL,
            power_log_capacity: None,

            max_substeps: MAX_SUBSTEPS,
            max_frame_delta: MAX_FRAME_DELTA,

            start_force_fallback: None,
            initial_parameters: Parameters::default(),
        }
    }
}

impl Settings {
    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> SimResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        log::info!(
            "Loaded settings (dt = {:.5} s, g = {} m/s²)",
            settings.timestep,
            settings.gravity
        );
        Ok(settings)
    }

    /// Reject settings that would stall the clock or poison the physics
    pub fn validate(&self) -> SimResult<()> {
        at_least("gravity", self.gravity, 0.0)?;
        at_least("timestep", self.timestep, f64::MIN_POSITIVE)?;
        at_least("rest_velocity_threshold", self.rest_velocity_threshold, 0.0)?;
        at_least("power_sample_interval", self.power_sample_interval, f64::MIN_POSITIVE)?;
        at_least("max_frame_delta", self.max_frame_delta, f64::MIN_POSITIVE)?;
        if self.max_substeps == 0 {
            return Err(SimError::OutOfRange {
                parameter: "max_substeps",
                value: 0.0,
                expected: ">= 1",
            });
        }
        if self.start_force_fallback.is_some_and(|f| !f.is_finite()) {
            return Err(SimError::NonFinite {
                parameter: "start_force_fallback",
            });
        }
        self.initial_parameters.validate()
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn at_least(parameter: &'static str, value: f64, min: f64) -> SimResult<()> {
    if !value.is_finite() {
        return Err(SimError::NonFinite { parameter });
    }
    if value < min {
        return Err(SimError::OutOfRange {
            parameter,
            value,
            expected: if min > 0.0 { "> 0" } else { ">= 0" },
        });
    }
    Ok(())
}
