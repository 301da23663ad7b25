// libportal/src/prelude.rs

pub use crate::device::{Client, ClientBuilder, Driver, DriverOptions, DriverRegistry, PresenceHandle};
pub use crate::fsm::{FsmError, State, StateMachine};
pub use crate::protocol::{Command, CommandKind, Event, EventName};
pub use crate::transport::Transport;
pub use crate::{DeviceSetup, Error, Product, Result, TokenData, TokenState, Uid, Vendor};

// Re-export small utilities for convenience
pub use crate::utils::{bytes_to_hex, bytes_to_hex_spaced, ms};
