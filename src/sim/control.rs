//! Control API
//!
//! [`Simulation`] ties the store, the clock and the host frame scheduler
//! together and is the only way to mutate simulation state from outside the
//! crate.

use std::cell::RefCell;
use std::rc::Rc;

use super::clock::{ClockPhase, ClockStats, SimClock};
use super::state::{DisplayMode, ParameterKey, SimState};
use super::store::{Store, Subscription};
use super::tick::{preview_forces, step};
use crate::error::SimResult;
use crate::platform::FrameScheduler;
use crate::settings::Settings;

struct Inner {
    settings: Settings,
    store: Store,
    clock: RefCell<SimClock>,
    scheduler: Rc<dyn FrameScheduler>,
}

/// Handle to a running lab session. Cloning shares the same session.
#[derive(Clone)]
pub struct Simulation {
    inner: Rc<Inner>,
}

impl Simulation {
    /// Create a session at rest with `settings.initial_parameters`.
    pub fn new(settings: Settings, scheduler: Rc<dyn FrameScheduler>) -> Self {
        let state = SimState::new(settings.initial_parameters);
        Self {
            inner: Rc::new(Inner {
                settings,
                store: Store::new(state),
                clock: RefCell::new(SimClock::new()),
                scheduler,
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Snapshot of the full state
    pub fn state(&self) -> SimState {
        self.inner.store.get()
    }

    /// Read one projection (see [`super::views`])
    pub fn select<T>(&self, view: impl FnOnce(&SimState) -> T) -> T {
        self.inner.store.select(view)
    }

    pub fn subscribe(&self, listener: impl FnMut(&SimState) + 'static) -> Subscription {
        self.inner.store.subscribe(listener)
    }

    pub fn subscribe_view<T, V, F>(&self, view: V, listener: F) -> Subscription
    where
        T: PartialEq + 'static,
        V: Fn(&SimState) -> T + 'static,
        F: FnMut(&T) + 'static,
    {
        self.inner.store.subscribe_view(view, listener)
    }

    pub fn clock_phase(&self) -> ClockPhase {
        self.inner.clock.borrow().phase()
    }

    pub fn clock_stats(&self) -> ClockStats {
        self.inner.clock.borrow().stats()
    }

    /// Whether a host frame is currently requested
    pub fn is_scheduled(&self) -> bool {
        self.inner.clock.borrow().is_scheduled()
    }

    /// Change one parameter. Invalid values are rejected and leave the state
    /// untouched. While paused the force preview is refreshed so the UI shows
    /// the new balance; while running the next tick picks the change up.
    pub fn update_parameter(&self, key: ParameterKey, value: f64) -> SimResult<()> {
        let params = match self.inner.store.select(|s| s.params.with(key, value)) {
            Ok(params) => params,
            Err(err) => {
                log::warn!("Rejected {key} = {value}: {err}");
                return Err(err);
            }
        };

        log::debug!("{key} = {value}");
        let settings = &self.inner.settings;
        self.inner.store.update(|mut state| {
            state.params = params;
            if state.running {
                state
            } else {
                preview_forces(state, settings)
            }
        });
        Ok(())
    }

    /// Switch the UI view. No physics is recomputed.
    pub fn set_display_mode(&self, mode: DisplayMode) {
        log::debug!("Display mode: {mode}");
        self.inner.store.update(|mut state| {
            state.mode = mode;
            state
        });
    }

    /// Start (or resume) the simulation. Calling it while running is a no-op
    /// apart from re-asserting the running flag.
    ///
    /// If the host refuses the first frame the session is left paused and
    /// the host error is returned.
    pub fn start(&self) -> SimResult<()> {
        let inner = &self.inner;
        let mut params = inner.store.select(|s| s.params);
        params.validate()?;

        if params.force_n == 0.0 {
            if let Some(fallback) = inner.settings.start_force_fallback {
                log::info!("Applied force is zero; using start_force_fallback = {fallback} N");
                params = params.with(ParameterKey::Force, fallback)?;
            }
        }

        inner.store.update(|mut state| {
            state.params = params;
            state.running = true;
            state
        });

        // A listener may have paused in response to the running flag
        let still_running = inner.store.select(|s| s.running);
        if still_running && inner.clock.borrow_mut().begin() {
            log::info!("Simulation started");
            schedule_frame(inner)?;
        }
        Ok(())
    }

    /// Stop ticking. The state keeps its last computed values.
    pub fn pause(&self) {
        self.halt_clock();
        self.inner.store.update(|mut state| {
            state.running = false;
            state
        });
        log::info!("Simulation paused");
    }

    /// Stop ticking and return the body to rest at the origin, keeping the
    /// parameters and display mode.
    pub fn reset(&self) {
        self.halt_clock();
        let settings = &self.inner.settings;
        self.inner
            .store
            .update(|state| preview_forces(state.reset(), settings));
        log::info!("Simulation reset");
    }

    fn halt_clock(&self) {
        let pending = self.inner.clock.borrow_mut().halt();
        if let Some(handle) = pending {
            log::debug!("Cancelling frame {handle:?}");
            self.inner.scheduler.cancel_frame(handle);
        }
    }
}

/// Ask the host for the next frame and remember the handle. On failure the
/// clock is halted and `running` cleared before the error is returned.
fn schedule_frame(inner: &Rc<Inner>) -> SimResult<()> {
    let weak = Rc::downgrade(inner);
    let request = inner.scheduler.request_frame(Box::new(move |timestamp| {
        if let Some(inner) = weak.upgrade() {
            on_frame(&inner, timestamp);
        }
    }));

    match request {
        Ok(handle) => {
            inner.clock.borrow_mut().set_frame(handle);
            Ok(())
        }
        Err(err) => {
            log::error!("Could not schedule frame, stopping: {err}");
            inner.clock.borrow_mut().halt();
            inner.store.update(|mut state| {
                state.running = false;
                state
            });
            Err(err)
        }
    }
}

fn on_frame(inner: &Rc<Inner>, timestamp: f64) {
    let ticks = {
        let mut clock = inner.clock.borrow_mut();
        clock.frame_fired();
        if !clock.is_running() {
            return;
        }
        clock.advance(timestamp, &inner.settings)
    };

    let dt = inner.settings.timestep;
    for _ in 0..ticks {
        // A listener may pause or reset mid-frame
        if !inner.clock.borrow().is_running() {
            return;
        }
        inner.store.update(|state| step(state, dt, &inner.settings));
        inner.clock.borrow_mut().record_tick();
    }

    let reschedule = {
        let clock = inner.clock.borrow();
        clock.is_running() && !clock.is_scheduled()
    };
    // No caller to report to from inside a frame; the failure is logged
    // and the session is left paused
    if reschedule && schedule_frame(inner).is_err() {
        log::warn!("Frame loop stopped at t = {:.3} s", inner.store.select(|s| s.time_s));
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("clock", &self.inner.clock.borrow())
            .field("store", &self.inner.store)
            .finish()
    }
}
