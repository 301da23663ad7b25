// libportal/src/device/mod.rs

pub mod client;
pub mod driver;
pub mod models;
pub mod options;
pub mod presence;
pub mod registry;

pub use client::{Client, ClientBuilder};
pub use driver::{COMMAND_QUEUE_DEPTH, Driver, DriverContext, DriverLink};
pub use options::DriverOptions;
pub use presence::{PresenceHandle, TokenPresence, Transition};
pub use registry::{DriverFactory, DriverRegistry, Registration};
