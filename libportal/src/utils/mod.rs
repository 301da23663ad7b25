//! Small helpers shared across the crate: hex rendering for wire dumps and
//! timeout defaults.

pub mod hex;
pub mod timeout;

pub use hex::*;
pub use timeout::*;
