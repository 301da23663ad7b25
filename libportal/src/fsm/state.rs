// libportal/src/fsm/state.rs

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Action run when a state is entered. Returning an event different from
/// the one that caused the transition dispatches it right away.
pub type Action<E, C> = Box<dyn FnMut(&mut C) -> Option<E> + Send>;

/// One state: an optional action and the events leaving it
pub struct State<S, E, C = ()> {
    pub(crate) action: Option<Action<E, C>>,
    pub(crate) transitions: HashMap<E, S>,
}

impl<S, E: Eq + Hash, C> State<S, E, C> {
    pub fn new() -> Self {
        Self {
            action: None,
            transitions: HashMap::new(),
        }
    }

    pub fn with_action(mut self, action: impl FnMut(&mut C) -> Option<E> + Send + 'static) -> Self {
        self.action = Some(Box::new(action));
        self
    }

    /// Move to `target` on `event`
    pub fn on(mut self, event: E, target: S) -> Self {
        self.transitions.insert(event, target);
        self
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn target(&self, event: &E) -> Option<&S> {
        self.transitions.get(event)
    }
}

impl<S, E: Eq + Hash, C> Default for State<S, E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: fmt::Debug, E: fmt::Debug, C> fmt::Debug for State<S, E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("action", &self.action.is_some())
            .field("transitions", &self.transitions)
            .finish()
    }
}
