// libportal/src/device/presence.rs

//! Token presence tracking with hysteresis.
//!
//! A token is reported present on the first successful poll and reported
//! absent only after `total_errors` consecutive failed polls, so a single
//! lost frame on a noisy channel does not cause a removal followed by a
//! fresh read.

use std::sync::{Arc, RwLock};

use crate::types::TokenState;

/// Edge produced by a poll observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Absent -> Present: the caller should read the token
    Arrived,
    /// Present -> Absent
    Departed,
}

/// Presence state machine owned by a polling loop
#[derive(Debug, Clone)]
pub struct TokenPresence {
    state: TokenState,
    errors: usize,
    total_errors: usize,
}

impl TokenPresence {
    pub fn new(total_errors: usize) -> Self {
        Self {
            state: TokenState::Absent,
            errors: 0,
            total_errors: total_errors.max(1),
        }
    }

    pub fn state(&self) -> TokenState {
        self.state
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn total_errors(&self) -> usize {
        self.total_errors
    }

    /// Record a successful poll. Only the Absent -> Present edge is reported;
    /// a success while present just clears the error run.
    pub fn record_success(&mut self) -> Option<Transition> {
        self.errors = 0;
        match self.state {
            TokenState::Absent => {
                self.state = TokenState::Present;
                Some(Transition::Arrived)
            }
            TokenState::Present => None,
        }
    }

    /// Record a failed poll
    pub fn record_error(&mut self) -> Option<Transition> {
        match self.state {
            TokenState::Absent => None,
            TokenState::Present => {
                self.errors += 1;
                if self.errors >= self.total_errors {
                    self.errors = 0;
                    self.state = TokenState::Absent;
                    Some(Transition::Departed)
                } else {
                    None
                }
            }
        }
    }

    /// Force the tracker back to Absent, e.g. when the loop shuts down
    pub fn reset(&mut self) -> Option<Transition> {
        self.errors = 0;
        match std::mem::take(&mut self.state) {
            TokenState::Present => Some(Transition::Departed),
            TokenState::Absent => None,
        }
    }
}

/// Shared handle to a [`TokenPresence`]. The polling loop mutates it; any
/// other thread may query it concurrently through the read accessors.
#[derive(Debug, Clone)]
pub struct PresenceHandle {
    inner: Arc<RwLock<TokenPresence>>,
}

impl PresenceHandle {
    pub fn new(total_errors: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TokenPresence::new(total_errors))),
        }
    }

    pub fn state(&self) -> TokenState {
        self.read(|p| p.state())
    }

    pub fn is_present(&self) -> bool {
        self.state() == TokenState::Present
    }

    /// Current run of consecutive errors while present
    pub fn errors(&self) -> usize {
        self.read(|p| p.errors())
    }

    pub fn record_success(&self) -> Option<Transition> {
        self.write(TokenPresence::record_success)
    }

    pub fn record_error(&self) -> Option<Transition> {
        self.write(TokenPresence::record_error)
    }

    pub fn reset(&self) -> Option<Transition> {
        self.write(TokenPresence::reset)
    }

    // A poisoned lock only means a writer panicked between two plain field
    // stores; the data is still a valid TokenPresence.
    fn read<T>(&self, f: impl FnOnce(&TokenPresence) -> T) -> T {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut TokenPresence) -> T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}
