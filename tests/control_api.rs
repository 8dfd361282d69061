//! End-to-end runs through the control API with a manual frame source

use std::cell::RefCell;
use std::rc::Rc;

use incline_lab::consts::SIM_DT;
use incline_lab::platform::ManualFrames;
use incline_lab::sim::{ClockPhase, views};
use incline_lab::{DisplayMode, ParameterKey, Settings, SimState, Simulation};

const FRAME_MS: f64 = 1000.0 / 60.0;

fn lab() -> (Simulation, Rc<ManualFrames>) {
    let frames = Rc::new(ManualFrames::new());
    let sim = Simulation::new(Settings::default(), frames.clone());
    (sim, frames)
}

fn run_seconds(frames: &ManualFrames, seconds: f64) {
    frames.run_frames((seconds * 60.0).round() as usize, FRAME_MS);
}

#[test]
fn flat_push_then_coast() {
    let (sim, frames) = lab();
    sim.start().unwrap();
    run_seconds(&frames, 4.0);

    let state = sim.state();
    assert!((state.time_s - 4.0).abs() < 1e-6);
    // 5 N on 2 kg for 3 s, then no force and no friction
    assert!((state.velocity - 7.5).abs() < 0.05, "{}", state.velocity);
    assert_eq!(state.forces.applied, 0.0);
    assert_eq!(state.acceleration, 0.0);
    assert!(state.position > 11.0 + 7.0);
}

#[test]
fn friction_brings_body_to_rest() {
    let (sim, frames) = lab();
    sim.update_parameter(ParameterKey::Friction, 0.1).unwrap();
    sim.update_parameter(ParameterKey::Duration, 1.0).unwrap();
    sim.start().unwrap();
    run_seconds(&frames, 6.0);

    let state = sim.state();
    assert!(state.velocity.abs() < 0.05, "{}", state.velocity);
    assert!(state.position > 0.0);
}

#[test]
fn steep_incline_slides() {
    let (sim, frames) = lab();
    sim.update_parameter(ParameterKey::Force, 0.0).unwrap();
    sim.update_parameter(ParameterKey::Angle, 30.0).unwrap();
    sim.update_parameter(ParameterKey::Friction, 0.2).unwrap();
    sim.start().unwrap();
    run_seconds(&frames, 1.0);

    // Gravity component is positive along +x for a positive angle
    let state = sim.state();
    assert!(state.velocity > 0.0);
    assert!(state.position > 0.0);
    assert!(state.forces.gravity_parallel > 0.0);
    assert!(state.forces.friction < 0.0);
    assert!(state.energy.potential > 0.0);
}

#[test]
fn start_is_idempotent() {
    let (sim, frames) = lab();
    for _ in 0..5 {
        sim.start().unwrap();
    }
    assert_eq!(frames.pending(), 1);

    run_seconds(&frames, 1.0);
    assert_eq!(sim.clock_stats().ticks, 60);
    assert!((sim.state().time_s - 1.0).abs() < 1e-9);
}

#[test]
fn pause_reset_cycle() {
    let (sim, frames) = lab();
    sim.set_display_mode(DisplayMode::Power);
    sim.start().unwrap();
    run_seconds(&frames, 0.5);

    sim.pause();
    let paused = sim.state();
    run_seconds(&frames, 0.5);
    assert_eq!(sim.state(), paused);
    assert_eq!(sim.clock_phase(), ClockPhase::Idle);

    sim.reset();
    let state = sim.state();
    assert_eq!(state.time_s, 0.0);
    assert_eq!(state.position, 0.0);
    assert!(state.power.log.is_empty());
    assert_eq!(state.mode, DisplayMode::Power);

    sim.start().unwrap();
    run_seconds(&frames, 0.5);
    assert!((sim.state().time_s - 0.5).abs() < 1e-9);
}

#[test]
fn power_log_grows_at_ten_hertz() {
    let (sim, frames) = lab();
    sim.start().unwrap();
    run_seconds(&frames, 2.0);

    let len = sim.select(views::power_log_len);
    assert!((15..=25).contains(&len), "{len}");
    let log = sim.state().power.log;
    assert!(log.windows(2).all(|w| w[0].time < w[1].time));
}

#[test]
fn view_subscribers_follow_mode_changes() {
    let (sim, _frames) = lab();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let s = seen.clone();
    let sub = sim.subscribe_view(views::mode, move |mode| s.borrow_mut().push(*mode));
    sim.set_display_mode(DisplayMode::Motion);
    sim.set_display_mode(DisplayMode::Motion);
    sim.update_parameter(ParameterKey::Mass, 3.0).unwrap();
    sim.set_display_mode(DisplayMode::Energy);
    assert!(sub.unsubscribe());
    sim.set_display_mode(DisplayMode::Forces);

    assert_eq!(
        *seen.borrow(),
        vec![DisplayMode::Forces, DisplayMode::Motion, DisplayMode::Energy]
    );
}

#[test]
fn state_serializes_for_the_browser() {
    let (sim, frames) = lab();
    sim.start().unwrap();
    run_seconds(&frames, 0.2);

    let json = serde_json::to_string(&sim.state()).unwrap();
    let back: SimState = serde_json::from_str(&json).unwrap();
    assert!(back.running);
    assert_eq!(back.params, sim.state().params);
    assert!((back.time_s - 12.0 * SIM_DT).abs() < 1e-9);
}
