//! State container with synchronous change notification
//!
//! Holds the one live [`SimState`]. Mutation is crate-private so the control
//! API stays the only way in; anyone may read or subscribe.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::state::SimState;

type Listener = Rc<RefCell<dyn FnMut(&SimState)>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    /// Registration order is notification order
    listeners: Vec<(u64, Listener)>,
}

impl Registry {
    fn contains(&self, id: u64) -> bool {
        self.listeners.iter().any(|(i, _)| *i == id)
    }
}

/// Handle returned by [`Store::subscribe`]. Dropping it keeps the listener
/// registered; call [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.borrow_mut();
        let before = registry.listeners.len();
        registry.listeners.retain(|(id, _)| *id != self.id);
        registry.listeners.len() != before
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Single mutable cell holding the simulation state
#[derive(Debug, Default)]
pub struct Store {
    state: RefCell<SimState>,
    registry: Rc<RefCell<Registry>>,
    notifying: Cell<bool>,
    dirty: Cell<bool>,
}

impl Store {
    pub fn new(state: SimState) -> Self {
        Self {
            state: RefCell::new(state),
            ..Self::default()
        }
    }

    /// Snapshot of the current state
    pub fn get(&self) -> SimState {
        self.state.borrow().clone()
    }

    /// Read a projection without cloning the whole state
    pub fn select<T>(&self, view: impl FnOnce(&SimState) -> T) -> T {
        view(&self.state.borrow())
    }

    /// Register a listener. It is called immediately with the current state,
    /// then after every accepted mutation, in registration order.
    pub fn subscribe(&self, listener: impl FnMut(&SimState) + 'static) -> Subscription {
        let listener: Listener = Rc::new(RefCell::new(listener));
        let id = {
            let mut registry = self.registry.borrow_mut();
            registry.next_id += 1;
            let id = registry.next_id;
            registry.listeners.push((id, listener.clone()));
            id
        };

        let snapshot = self.get();
        let outer = self.notifying.replace(true);
        (&mut *listener.borrow_mut())(&snapshot);
        self.notifying.set(outer);
        if !outer && self.dirty.get() {
            self.notify();
        }

        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Subscribe to a projection. The listener only hears about changes to
    /// the projected value, not to the rest of the state.
    pub fn subscribe_view<T, V, F>(&self, view: V, mut listener: F) -> Subscription
    where
        T: PartialEq + 'static,
        V: Fn(&SimState) -> T + 'static,
        F: FnMut(&T) + 'static,
    {
        let mut last: Option<T> = None;
        self.subscribe(move |state| {
            let value = view(state);
            if last.as_ref() != Some(&value) {
                listener(&value);
                last = Some(value);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }

    /// Replace the state and notify
    pub(crate) fn set(&self, state: SimState) {
        *self.state.borrow_mut() = state;
        self.notify();
    }

    /// Replace the state with `f(current)` and notify
    pub(crate) fn update(&self, f: impl FnOnce(SimState) -> SimState) {
        let current = self.state.take();
        self.set(f(current));
    }

    fn notify(&self) {
        // A listener that mutates the store lands here re-entrantly; the
        // outer pass picks the change up once the current round finishes
        if self.notifying.get() {
            self.dirty.set(true);
            return;
        }

        self.notifying.set(true);
        loop {
            self.dirty.set(false);

            let listeners: Vec<(u64, Listener)> = self.registry.borrow().listeners.clone();
            if listeners.is_empty() {
                break;
            }

            let snapshot = self.get();
            for (id, listener) in listeners {
                if self.registry.borrow().contains(id) {
                    (&mut *listener.borrow_mut())(&snapshot);
                }
            }

            if !self.dirty.get() {
                break;
            }
        }
        self.notifying.set(false);
    }
}
