//! Simulation state and core data types
//!
//! Everything a consumer can observe lives in [`SimState`]. The state is a
//! plain value: the physics step returns a new one rather than mutating.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Which derived view the UI is presenting. Has no effect on physics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Forces,
    Motion,
    Energy,
    Power,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 4] = [
        DisplayMode::Forces,
        DisplayMode::Motion,
        DisplayMode::Energy,
        DisplayMode::Power,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Forces => "forces",
            DisplayMode::Motion => "motion",
            DisplayMode::Energy => "energy",
            DisplayMode::Power => "power",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = SimError;

    fn from_str(s: &str) -> SimResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "forces" => Ok(DisplayMode::Forces),
            "motion" => Ok(DisplayMode::Motion),
            "energy" => Ok(DisplayMode::Energy),
            "power" => Ok(DisplayMode::Power),
            _ => Err(SimError::UnknownDisplayMode(s.to_string())),
        }
    }
}

/// Identifies one user-controllable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKey {
    Mass,
    Force,
    Friction,
    Angle,
    Duration,
}

impl ParameterKey {
    pub const ALL: [ParameterKey; 5] = [
        ParameterKey::Mass,
        ParameterKey::Force,
        ParameterKey::Friction,
        ParameterKey::Angle,
        ParameterKey::Duration,
    ];

    /// Field name as the browser UI knows it
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKey::Mass => "massKg",
            ParameterKey::Force => "forceN",
            ParameterKey::Friction => "frictionMu",
            ParameterKey::Angle => "angleDeg",
            ParameterKey::Duration => "durationS",
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterKey {
    type Err = SimError;

    fn from_str(s: &str) -> SimResult<Self> {
        match s.trim() {
            "massKg" | "mass" => Ok(ParameterKey::Mass),
            "forceN" | "force" => Ok(ParameterKey::Force),
            "frictionMu" | "friction" => Ok(ParameterKey::Friction),
            "angleDeg" | "angle" => Ok(ParameterKey::Angle),
            "durationS" | "duration" => Ok(ParameterKey::Duration),
            _ => Err(SimError::UnknownParameter(s.to_string())),
        }
    }
}

/// User-controllable inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    /// Mass of the body (kg, > 0)
    pub mass_kg: f64,
    /// Applied force while active (N, signed)
    pub force_n: f64,
    /// Friction coefficient (≥ 0)
    pub friction_mu: f64,
    /// Incline angle (degrees, -90..=90)
    pub angle_deg: f64,
    /// How long the applied force acts (s, ≥ 0)
    pub duration_s: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            mass_kg: 2.0,
            force_n: 5.0,
            friction_mu: 0.0,
            angle_deg: 0.0,
            duration_s: 3.0,
        }
    }
}

impl Parameters {
    pub fn get(&self, key: ParameterKey) -> f64 {
        match key {
            ParameterKey::Mass => self.mass_kg,
            ParameterKey::Force => self.force_n,
            ParameterKey::Friction => self.friction_mu,
            ParameterKey::Angle => self.angle_deg,
            ParameterKey::Duration => self.duration_s,
        }
    }

    /// Return a copy with one field replaced, rejecting values the
    /// physics step cannot handle
    pub fn with(&self, key: ParameterKey, value: f64) -> SimResult<Self> {
        validate(key, value)?;
        let mut params = *self;
        match key {
            ParameterKey::Mass => params.mass_kg = value,
            ParameterKey::Force => params.force_n = value,
            ParameterKey::Friction => params.friction_mu = value,
            ParameterKey::Angle => params.angle_deg = value,
            ParameterKey::Duration => params.duration_s = value,
        }
        Ok(params)
    }

    /// Check every field (used for parameter sets that did not arrive
    /// through [`Parameters::with`], e.g. deserialized settings)
    pub fn validate(&self) -> SimResult<()> {
        ParameterKey::ALL
            .iter()
            .try_for_each(|&key| validate(key, self.get(key)))
    }
}

fn validate(key: ParameterKey, value: f64) -> SimResult<()> {
    let parameter = key.as_str();
    if !value.is_finite() {
        return Err(SimError::NonFinite { parameter });
    }

    let expected = match key {
        ParameterKey::Mass if value <= 0.0 => "> 0",
        ParameterKey::Friction if value < 0.0 => ">= 0",
        ParameterKey::Duration if value < 0.0 => ">= 0",
        ParameterKey::Angle if !(-90.0..=90.0).contains(&value) => "-90..=90",
        _ => return Ok(()),
    };

    Err(SimError::OutOfRange {
        parameter,
        value,
        expected,
    })
}

/// Force breakdown along the line of motion (N, positive = direction of +x)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Forces {
    /// Net force; always `applied + gravity_parallel + friction`
    #[serde(rename = "sumN")]
    pub total: f64,
    #[serde(rename = "appliedN")]
    pub applied: f64,
    #[serde(rename = "frictionN")]
    pub friction: f64,
    #[serde(rename = "gravityParallelN")]
    pub gravity_parallel: f64,
}

/// Energy bookkeeping (J)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Energy {
    #[serde(rename = "EkJ")]
    pub kinetic: f64,
    #[serde(rename = "EpJ")]
    pub potential: f64,
    /// Cumulative work done by the applied force
    #[serde(rename = "WJ")]
    pub work: f64,
    /// Reserved; always zero
    #[serde(rename = "lossJ")]
    pub loss: f64,
}

/// One sample of the power history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSample {
    /// Elapsed simulation time (s)
    #[serde(rename = "t")]
    pub time: f64,
    /// Instantaneous power (W)
    #[serde(rename = "P")]
    pub power: f64,
}

/// Power output of the applied force
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Power {
    /// Instantaneous power (W)
    #[serde(rename = "instantW")]
    pub instant: f64,
    /// Sampled history, oldest first
    pub log: Vec<PowerSample>,
}

/// Complete simulation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimState {
    pub params: Parameters,
    pub running: bool,
    /// Elapsed simulation time (s)
    pub time_s: f64,
    pub mode: DisplayMode,
    /// Position along the incline (m)
    #[serde(rename = "xM")]
    pub position: f64,
    /// Velocity along the incline (m/s)
    #[serde(rename = "vMS")]
    pub velocity: f64,
    /// Acceleration along the incline (m/s²)
    #[serde(rename = "aMS2")]
    pub acceleration: f64,
    pub forces: Forces,
    pub energy: Energy,
    pub power: Power,
}

impl Default for SimState {
    fn default() -> Self {
        Self::new(Parameters::default())
    }
}

impl SimState {
    /// A body at rest at the origin, not running
    pub fn new(params: Parameters) -> Self {
        Self {
            params,
            running: false,
            time_s: 0.0,
            mode: DisplayMode::default(),
            position: 0.0,
            velocity: 0.0,
            acceleration: 0.0,
            forces: Forces::default(),
            energy: Energy::default(),
            power: Power::default(),
        }
    }

    /// Fresh state that keeps the current parameters and display mode
    pub fn reset(&self) -> Self {
        Self {
            mode: self.mode,
            ..Self::new(self.params)
        }
    }
}
