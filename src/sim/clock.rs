//! Simulation clock
//!
//! Owns the schedule handle and the fixed-timestep accumulator. Each host
//! frame feeds its real delta into the accumulator, which is drained in
//! whole ticks of `Settings::timestep`.

use crate::platform::FrameHandle;
use crate::settings::Settings;

/// Slack for accumulated rounding so a 60 Hz frame yields exactly one tick
const ACCUMULATOR_EPSILON: f64 = 1e-9;

/// Lifecycle of the frame schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockPhase {
    #[default]
    Idle,
    Running,
}

/// Counters for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockStats {
    /// Frame callbacks handled since creation
    pub frames: u64,
    /// Physics ticks run since creation
    pub ticks: u64,
}

#[derive(Debug, Default)]
pub struct SimClock {
    phase: ClockPhase,
    /// Pending host frame, if one is scheduled
    frame: Option<FrameHandle>,
    /// Timestamp of the last handled frame (ms)
    last_timestamp: Option<f64>,
    /// Unconsumed simulation time (s)
    accumulator: f64,
    stats: ClockStats,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ClockPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == ClockPhase::Running
    }

    /// Whether a host frame is currently requested
    pub fn is_scheduled(&self) -> bool {
        self.frame.is_some()
    }

    pub fn stats(&self) -> ClockStats {
        self.stats
    }

    /// Idle → Running. Returns false if already running, in which case the
    /// caller must not schedule another frame.
    pub(crate) fn begin(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.phase = ClockPhase::Running;
        self.last_timestamp = None;
        self.accumulator = 0.0;
        true
    }

    /// Any → Idle. Returns the pending frame so the caller can cancel it.
    pub(crate) fn halt(&mut self) -> Option<FrameHandle> {
        self.phase = ClockPhase::Idle;
        self.last_timestamp = None;
        self.accumulator = 0.0;
        self.frame.take()
    }

    pub(crate) fn set_frame(&mut self, handle: FrameHandle) {
        self.frame = Some(handle);
    }

    /// Mark the pending frame as delivered
    pub(crate) fn frame_fired(&mut self) {
        self.frame = None;
        self.stats.frames += 1;
    }

    pub(crate) fn record_tick(&mut self) {
        self.stats.ticks += 1;
    }

    /// Feed one frame into the accumulator and return how many ticks to run.
    ///
    /// The first frame after `begin` runs exactly one tick. Later frames use
    /// the real delta, capped at `max_frame_delta`, and never run more than
    /// `max_substeps` ticks.
    pub(crate) fn advance(&mut self, timestamp_ms: f64, settings: &Settings) -> u32 {
        let delta = match self.last_timestamp {
            None => settings.timestep,
            Some(last) => ((timestamp_ms - last) / 1000.0).clamp(0.0, settings.max_frame_delta),
        };
        self.last_timestamp = Some(timestamp_ms);
        self.accumulator += delta;

        let mut ticks = 0;
        while self.accumulator + ACCUMULATOR_EPSILON >= settings.timestep
            && ticks < settings.max_substeps
        {
            self.accumulator -= settings.timestep;
            ticks += 1;
        }
        self.accumulator = self.accumulator.max(0.0);
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    #[test]
    fn test_begin_is_idempotent() {
        let mut clock = SimClock::new();
        assert_eq!(clock.phase(), ClockPhase::Idle);
        assert!(clock.begin());
        assert!(!clock.begin());
        assert_eq!(clock.phase(), ClockPhase::Running);
    }

    #[test]
    fn test_halt_hands_back_pending_frame() {
        let mut clock = SimClock::new();
        clock.begin();
        clock.set_frame(FrameHandle(7));
        assert!(clock.is_scheduled());

        assert_eq!(clock.halt(), Some(FrameHandle(7)));
        assert!(!clock.is_scheduled());
        assert!(!clock.is_running());
        assert_eq!(clock.halt(), None);
    }

    #[test]
    fn test_one_tick_per_60hz_frame() {
        let settings = Settings::default();
        let mut clock = SimClock::new();
        clock.begin();

        let ticks: Vec<u32> = (0..120)
            .map(|i| clock.advance(i as f64 * FRAME_MS, &settings))
            .collect();
        assert!(ticks.iter().all(|&t| t == 1), "{ticks:?}");
    }

    #[test]
    fn test_fast_display_halves_tick_rate() {
        let settings = Settings::default();
        let mut clock = SimClock::new();
        clock.begin();

        let total: u32 = (0..240)
            .map(|i| clock.advance(i as f64 * FRAME_MS / 2.0, &settings))
            .sum();
        assert!((119..=121).contains(&total), "{total}");
    }

    #[test]
    fn test_long_frame_is_capped() {
        let settings = Settings::default();
        let mut clock = SimClock::new();
        clock.begin();
        clock.advance(0.0, &settings);

        // A 5 s stall (e.g. background tab) counts as max_frame_delta
        let ticks = clock.advance(5000.0, &settings);
        assert_eq!(ticks, 6);
        assert!(ticks <= settings.max_substeps);
    }

    #[test]
    fn test_restart_forgets_paused_gap() {
        let settings = Settings::default();
        let mut clock = SimClock::new();
        clock.begin();
        clock.advance(0.0, &settings);
        clock.halt();

        clock.begin();
        assert_eq!(clock.advance(60_000.0, &settings), 1);
    }
}
