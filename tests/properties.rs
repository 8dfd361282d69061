//! Physics step invariants over random valid parameter sets

use incline_lab::consts::SIM_DT;
use incline_lab::sim::{preview_forces, step};
use incline_lab::{Parameters, Settings, SimState, incline_components};
use proptest::prelude::*;

fn parameters() -> impl Strategy<Value = Parameters> {
    (
        0.1f64..50.0,
        -50.0f64..50.0,
        0.0f64..1.0,
        -89.0f64..89.0,
        0.0f64..10.0,
    )
        .prop_map(|(mass_kg, force_n, friction_mu, angle_deg, duration_s)| Parameters {
            mass_kg,
            force_n,
            friction_mu,
            angle_deg,
            duration_s,
        })
}

fn friction_limit(params: &Parameters, settings: &Settings) -> f64 {
    let (_, cos_a) = incline_components(params.angle_deg);
    params.friction_mu * params.mass_kg * settings.gravity * cos_a
}

proptest! {
    #[test]
    fn forces_stay_consistent(params in parameters(), ticks in 1usize..240) {
        let settings = Settings::default();
        let limit = friction_limit(&params, &settings);
        let mut state = SimState {
            running: true,
            ..SimState::new(params)
        };

        for _ in 0..ticks {
            state = step(state, SIM_DT, &settings);
            let f = state.forces;

            prop_assert_eq!(f.total, f.applied + f.gravity_parallel + f.friction);
            prop_assert_eq!(state.acceleration, f.total / params.mass_kg);
            prop_assert!(f.friction.abs() <= limit + 1e-9, "friction {} over limit {}", f.friction, limit);
            prop_assert!(state.energy.kinetic >= 0.0);
            prop_assert_eq!(state.energy.loss, 0.0);
            prop_assert!(state.position.is_finite() && state.velocity.is_finite());
        }
        prop_assert!((state.time_s - ticks as f64 * SIM_DT).abs() < 1e-9);
    }

    #[test]
    fn paused_state_is_untouched(params in parameters(), ticks in 1usize..60) {
        let settings = Settings::default();
        let mut state = SimState::new(params);
        state.position = 1.5;
        state.velocity = -0.5;
        let before = state.clone();

        for _ in 0..ticks {
            state = step(state, SIM_DT, &settings);
        }
        prop_assert_eq!(state, before);
    }

    #[test]
    fn forward_work_never_decreases_for_pushing_force(
        params in parameters(),
        force in 0.0f64..50.0,
        ticks in 1usize..240,
    ) {
        let settings = Settings::default();
        let mut state = SimState {
            running: true,
            ..SimState::new(Parameters { force_n: force, ..params })
        };

        let mut work = 0.0;
        for _ in 0..ticks {
            state = step(state, SIM_DT, &settings);
            prop_assert!(state.energy.work >= work);
            work = state.energy.work;
        }
    }

    #[test]
    fn preview_holds_body_when_friction_suffices(params in parameters()) {
        let settings = Settings::default();
        let limit = friction_limit(&params, &settings);
        let preview = preview_forces(SimState::new(params), &settings);
        let other = preview.forces.applied + preview.forces.gravity_parallel;

        if other.abs() <= limit {
            prop_assert!(preview.forces.total.abs() < 1e-9);
        } else {
            prop_assert_eq!(preview.forces.friction.abs(), limit);
            prop_assert!(preview.forces.total.signum() == other.signum());
        }
        prop_assert_eq!(preview.time_s, 0.0);
        prop_assert_eq!(preview.position, 0.0);
    }
}
