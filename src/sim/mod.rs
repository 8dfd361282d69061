//! Deterministic simulation module
//!
//! All physics and state handling lives here:
//! - Fixed timestep only
//! - The step is a pure function of (state, dt, settings)
//! - State changes go through the control API and are observable
//! - No rendering or platform dependencies beyond the frame scheduler trait

pub mod clock;
pub mod control;
pub mod state;
pub mod store;
pub mod tick;
pub mod views;

pub use clock::{ClockPhase, ClockStats, SimClock};
pub use control::Simulation;
pub use state::{
    DisplayMode, Energy, Forces, ParameterKey, Parameters, Power, PowerSample, SimState,
};
pub use store::{Store, Subscription};
pub use tick::{preview_forces, step};
