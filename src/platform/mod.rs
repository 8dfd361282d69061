//! Platform abstraction layer
//!
//! The simulation clock never owns a timer. It asks the host for "call me on
//! the next frame" and keeps the returned handle so it can cancel:
//! - Browser: `requestAnimationFrame` / `cancelAnimationFrame` (see `web`)
//! - Native and tests: [`ManualFrames`], advanced explicitly by the caller

use std::cell::{Cell, RefCell};

use crate::error::SimResult;

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Callback run once on the next frame with the frame timestamp (ms)
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Host-issued identifier for one pending frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Host per-frame callback mechanism
pub trait FrameScheduler {
    /// Run `callback` once on the next frame
    fn request_frame(&self, callback: FrameCallback) -> SimResult<FrameHandle>;

    /// Drop a pending request. Unknown or already-fired handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);
}

/// Deterministic frame source for native runs and tests.
///
/// Requests queue up until [`ManualFrames::fire`] delivers a frame. Requests
/// made while a frame is being delivered wait for the next one, as with
/// `requestAnimationFrame`.
#[derive(Default)]
pub struct ManualFrames {
    next_handle: Cell<i32>,
    pending: RefCell<Vec<(FrameHandle, FrameCallback)>>,
    now_ms: Cell<f64>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding frame requests
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Timestamp of the most recent frame (ms)
    pub fn now(&self) -> f64 {
        self.now_ms.get()
    }

    /// Deliver one frame at `timestamp_ms` to every request pending right now.
    ///
    /// Returns how many callbacks ran.
    pub fn fire(&self, timestamp_ms: f64) -> usize {
        self.now_ms.set(timestamp_ms);

        let due: Vec<FrameHandle> = self.pending.borrow().iter().map(|(h, _)| *h).collect();
        let mut fired = 0;
        for handle in due {
            // Re-check each time: an earlier callback may have cancelled this one
            let callback = {
                let mut pending = self.pending.borrow_mut();
                pending
                    .iter()
                    .position(|(h, _)| *h == handle)
                    .map(|i| pending.remove(i).1)
            };
            if let Some(callback) = callback {
                callback(timestamp_ms);
                fired += 1;
            }
        }
        fired
    }

    /// Deliver `count` frames spaced `frame_ms` apart, starting one interval
    /// after the current time. Returns the total number of callbacks run.
    pub fn run_frames(&self, count: usize, frame_ms: f64) -> usize {
        let start = self.now();
        (1..=count)
            .map(|i| self.fire(start + i as f64 * frame_ms))
            .sum()
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&self, callback: FrameCallback) -> SimResult<FrameHandle> {
        let handle = FrameHandle(self.next_handle.get() + 1);
        self.next_handle.set(handle.0);
        self.pending.borrow_mut().push((handle, callback));
        Ok(handle)
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.pending.borrow_mut().retain(|(h, _)| *h != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_fire_runs_pending_once() {
        let frames = ManualFrames::new();
        let seen = Rc::new(Cell::new(0.0));

        let s = seen.clone();
        frames
            .request_frame(Box::new(move |ts| s.set(ts)))
            .unwrap();
        assert_eq!(frames.pending(), 1);

        assert_eq!(frames.fire(16.0), 1);
        assert_eq!(seen.get(), 16.0);
        assert_eq!(frames.pending(), 0);
        assert_eq!(frames.fire(32.0), 0);
    }

    #[test]
    fn test_cancel_prevents_callback() {
        let frames = ManualFrames::new();
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        let handle = frames
            .request_frame(Box::new(move |_| h.set(h.get() + 1)))
            .unwrap();
        frames.cancel_frame(handle);
        frames.cancel_frame(handle); // second cancel is a no-op

        assert_eq!(frames.fire(16.0), 0);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_requests_during_fire_wait_for_next_frame() {
        let frames = Rc::new(ManualFrames::new());
        let hits = Rc::new(Cell::new(0));

        let f = frames.clone();
        let h = hits.clone();
        frames
            .request_frame(Box::new(move |_| {
                h.set(h.get() + 1);
                let h = h.clone();
                f.request_frame(Box::new(move |_| h.set(h.get() + 1)))
                    .unwrap();
            }))
            .unwrap();

        assert_eq!(frames.fire(16.0), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(frames.pending(), 1);

        assert_eq!(frames.run_frames(1, 16.0), 1);
        assert_eq!(hits.get(), 2);
        assert_eq!(frames.now(), 32.0);
    }
}
