// libportal/src/fsm/error.rs

use thiserror::Error;

/// Construction and dispatch failures of a [`StateMachine`](super::StateMachine)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsmError {
    #[error("state machine has no states")]
    NoStates,

    #[error("state machine has no default state")]
    NoDefaultState,

    #[error("state {0} is defined twice")]
    DuplicateState(String),

    #[error("default state must not have an action")]
    DefaultAction,

    #[error("default state must have exactly one event, found {0}")]
    DefaultEvents(usize),

    #[error("state {0} has no action")]
    MissingAction(String),

    #[error("state {from} has a transition to unknown state {to}")]
    UnknownState { from: String, to: String },

    #[error("event {event} is not valid in state {state}")]
    EventRejected { state: String, event: String },

    #[error("event cascade exceeded {0} transitions")]
    CascadeLimit(usize),

    #[error("state machine lock poisoned")]
    Poisoned,
}
