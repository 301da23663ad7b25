// libportal/src/fsm/mod.rs

//! Generic event driven state machine.
//!
//! A machine is a table of states keyed by `S`. `S::default()` is the entry
//! state: it has no action and exactly one event, fired by
//! [`StateMachine::init`]. Every other state has an action that runs when
//! the state is entered; an action may return a follow-up event which is
//! dispatched immediately.
//!
//! ```
//! use libportal::fsm::{State, StateMachine};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
//! enum Light { #[default] Off, Green, Red }
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Signal { Start, Stop, Go }
//!
//! let fsm = StateMachine::new([
//!     (Light::Off, State::new().on(Signal::Start, Light::Red)),
//!     (Light::Red, State::new().with_action(|_: &mut ()| None).on(Signal::Go, Light::Green)),
//!     (Light::Green, State::new().with_action(|_: &mut ()| None).on(Signal::Stop, Light::Red)),
//! ])?;
//! fsm.init(&mut ())?;
//! assert_eq!(fsm.current(), Light::Red);
//! fsm.send_event(Signal::Go, &mut ())?;
//! assert_eq!(fsm.current(), Light::Green);
//! assert!(fsm.send_event(Signal::Go, &mut ()).is_err());
//! # Ok::<(), libportal::fsm::FsmError>(())
//! ```

mod error;
mod state;

pub use error::FsmError;
pub use state::{Action, State};

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use log::trace;

/// Upper bound on transitions triggered by one external event
pub const MAX_CASCADE: usize = 64;

struct Inner<S, E, C> {
    states: HashMap<S, State<S, E, C>>,
    current: S,
    previous: Option<S>,
}

/// State machine over states `S`, events `E` and a context `C` handed to
/// every action. Dispatch is serialised by an internal mutex, so actions
/// must not call back into the same machine; they return an event instead.
pub struct StateMachine<S, E, C = ()> {
    inner: Mutex<Inner<S, E, C>>,
}

impl<S, E, C> StateMachine<S, E, C>
where
    S: Eq + Hash + Clone + Default + Debug,
    E: Eq + Hash + Clone + Debug,
{
    /// Validate the state table and build the machine, positioned on the
    /// default state.
    pub fn new(states: impl IntoIterator<Item = (S, State<S, E, C>)>) -> Result<Self, FsmError> {
        let mut table = HashMap::new();
        for (key, state) in states {
            if table.contains_key(&key) {
                return Err(FsmError::DuplicateState(format!("{:?}", key)));
            }
            table.insert(key, state);
        }
        if table.is_empty() {
            return Err(FsmError::NoStates);
        }

        let entry = S::default();
        let default = table.get(&entry).ok_or(FsmError::NoDefaultState)?;
        if default.has_action() {
            return Err(FsmError::DefaultAction);
        }
        if default.transitions.len() != 1 {
            return Err(FsmError::DefaultEvents(default.transitions.len()));
        }

        for (key, state) in &table {
            if *key != entry && !state.has_action() {
                return Err(FsmError::MissingAction(format!("{:?}", key)));
            }
            if let Some(target) = state.transitions.values().find(|t| !table.contains_key(*t)) {
                return Err(FsmError::UnknownState {
                    from: format!("{:?}", key),
                    to: format!("{:?}", target),
                });
            }
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                states: table,
                current: entry,
                previous: None,
            }),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<S, E, C>>, FsmError> {
        self.inner.lock().map_err(|_| FsmError::Poisoned)
    }

    /// Fire the single event of the default state
    pub fn init(&self, ctx: &mut C) -> Result<S, FsmError> {
        let event = {
            let inner = self.lock()?;
            inner
                .states
                .get(&S::default())
                .and_then(|s| s.transitions.keys().next().cloned())
                .ok_or(FsmError::NoDefaultState)?
        };
        self.send_event(event, ctx)
    }

    /// Dispatch `event` from the current state and return the state the
    /// machine settled in. An event not valid for the current state is
    /// rejected and leaves the machine where it was.
    ///
    /// Transitions already taken are not rolled back. If an action's
    /// follow-up event is rejected, or the cascade hits its limit, the
    /// error is returned and the machine stays in the state whose action
    /// produced that event.
    pub fn send_event(&self, event: E, ctx: &mut C) -> Result<S, FsmError> {
        let mut inner = self.lock()?;
        let mut pending = event;

        for _ in 0..MAX_CASCADE {
            let target = inner
                .states
                .get(&inner.current)
                .and_then(|s| s.target(&pending))
                .cloned()
                .ok_or_else(|| FsmError::EventRejected {
                    state: format!("{:?}", inner.current),
                    event: format!("{:?}", pending),
                })?;

            trace!("{:?} --{:?}--> {:?}", inner.current, pending, target);
            let from = std::mem::replace(&mut inner.current, target.clone());
            inner.previous = Some(from);

            let next = inner
                .states
                .get_mut(&target)
                .and_then(|s| s.action.as_mut())
                .and_then(|action| action(ctx));
            match next {
                Some(e) if e != pending => pending = e,
                _ => return Ok(target),
            }
        }
        Err(FsmError::CascadeLimit(MAX_CASCADE))
    }

    pub fn current(&self) -> S {
        match self.inner.lock() {
            Ok(inner) => inner.current.clone(),
            Err(poisoned) => poisoned.into_inner().current.clone(),
        }
    }

    pub fn previous(&self) -> Option<S> {
        match self.inner.lock() {
            Ok(inner) => inner.previous.clone(),
            Err(poisoned) => poisoned.into_inner().previous.clone(),
        }
    }

    /// Whether `event` would be accepted in the current state
    pub fn accepts(&self, event: &E) -> bool {
        self.lock()
            .map(|inner| {
                inner
                    .states
                    .get(&inner.current)
                    .is_some_and(|s| s.target(event).is_some())
            })
            .unwrap_or(false)
    }
}

impl<S: Debug, E, C> Debug for StateMachine<S, E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("StateMachine");
        if let Ok(inner) = self.inner.lock() {
            d.field("current", &inner.current)
                .field("states", &inner.states.len());
        }
        d.finish()
    }
}
