//! Browser platform: requestAnimationFrame scheduling and JS bindings
//!
//! The rendering layer drives the lab through [`WebSimulation`] and reads
//! state as JSON, either on demand or via a subscription callback.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use super::{FrameCallback, FrameHandle, FrameScheduler};
use crate::error::{SimError, SimResult};
use crate::settings::Settings;
use crate::sim::{DisplayMode, ParameterKey, SimState, Simulation, Subscription};

/// Frame scheduling backed by `window.requestAnimationFrame`
pub struct AnimationFrames {
    window: web_sys::Window,
}

impl AnimationFrames {
    pub fn new() -> SimResult<Self> {
        let window = web_sys::window().ok_or_else(|| SimError::Host("no window".into()))?;
        Ok(Self { window })
    }
}

impl FrameScheduler for AnimationFrames {
    fn request_frame(&self, callback: FrameCallback) -> SimResult<FrameHandle> {
        let closure = Closure::once_into_js(move |timestamp: f64| callback(timestamp));
        self.window
            .request_animation_frame(closure.unchecked_ref())
            .map(FrameHandle)
            .map_err(|e| SimError::Host(format!("{e:?}")))
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        if let Err(e) = self.window.cancel_animation_frame(handle.0) {
            log::warn!("cancelAnimationFrame({}) failed: {:?}", handle.0, e);
        }
    }
}

fn to_js(err: SimError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn state_json(state: &SimState) -> SimResult<String> {
    Ok(serde_json::to_string(state)?)
}

/// JS-facing handle to one lab session
#[wasm_bindgen]
pub struct WebSimulation {
    sim: Simulation,
    subscriptions: RefCell<HashMap<u32, Subscription>>,
    next_subscription: Cell<u32>,
}

#[wasm_bindgen]
impl WebSimulation {
    /// Create a session. `settings_json` may be omitted for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: Option<String>) -> Result<WebSimulation, JsValue> {
        let settings = match settings_json {
            Some(json) => Settings::from_json(&json).map_err(to_js)?,
            None => Settings::default(),
        };
        let frames = AnimationFrames::new().map_err(to_js)?;
        Ok(Self {
            sim: Simulation::new(settings, Rc::new(frames)),
            subscriptions: RefCell::new(HashMap::new()),
            next_subscription: Cell::new(0),
        })
    }

    pub fn start(&self) -> Result<(), JsValue> {
        self.sim.start().map_err(to_js)
    }

    pub fn pause(&self) {
        self.sim.pause();
    }

    pub fn reset(&self) {
        self.sim.reset();
    }

    #[wasm_bindgen(js_name = updateParameter)]
    pub fn update_parameter(&self, key: &str, value: f64) -> Result<(), JsValue> {
        let key: ParameterKey = key.parse().map_err(to_js)?;
        self.sim.update_parameter(key, value).map_err(to_js)
    }

    #[wasm_bindgen(js_name = setDisplayMode)]
    pub fn set_display_mode(&self, mode: &str) -> Result<(), JsValue> {
        let mode: DisplayMode = mode.parse().map_err(to_js)?;
        self.sim.set_display_mode(mode);
        Ok(())
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.sim.select(|s| s.running)
    }

    /// Full state as JSON, with the browser store's field names
    /// (`timeS`, `xM`, `vMS`, `aMS2`, `forces.sumN`, `energy.EkJ`, `power.instantW`, ...)
    #[wasm_bindgen(js_name = stateJson)]
    pub fn state_json(&self) -> Result<String, JsValue> {
        self.sim.select(state_json).map_err(to_js)
    }

    /// Call `callback(stateJson)` now and after every change. Returns an id
    /// for `unsubscribe`.
    ///
    /// Takes `&self` so the callback may call back into this object (e.g.
    /// `pause()` or `stateJson()`) during the initial delivery.
    pub fn subscribe(&self, callback: js_sys::Function) -> u32 {
        let subscription = self.sim.subscribe(move |state| match state_json(state) {
            Ok(json) => {
                if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                    log::warn!("State listener threw: {e:?}");
                }
            }
            Err(err) => log::error!("Could not serialize state: {err}"),
        });

        let id = self.next_subscription.get() + 1;
        self.next_subscription.set(id);
        self.subscriptions.borrow_mut().insert(id, subscription);
        id
    }

    pub fn unsubscribe(&self, id: u32) -> bool {
        // Release the map before the listener registry is touched
        let subscription = self.subscriptions.borrow_mut().remove(&id);
        subscription.is_some_and(Subscription::unsubscribe)
    }
}

/// Module entry point: logging and panic hook
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("Logger init failed: {e}")));
    }
    log::info!("Incline Lab ready");
}
