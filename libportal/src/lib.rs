// libportal/src/lib.rs

//! libportal
//!
//! Pure Rust driver framework for NFC token portals. A [`Client`] binds a
//! registered vendor/product driver to a USB or UART transport, runs it on a
//! dedicated thread and streams [`Event`]s back while accepting
//! [`Command`]s.

pub mod constants;
pub mod device;
pub mod error;
pub mod fsm;
pub mod prelude;
pub mod protocol;
pub mod test_support;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the newtypes in `types` are available for consumers and for
// convenient `prelude` re-exports.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
