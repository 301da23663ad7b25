// libportal/src/device/options.rs

use crate::constants::{DEFAULT_TOTAL_ERRORS, OPTIMISED_TOTAL_ERRORS};
use crate::utils::DEFAULT_POLL_INTERVAL_MS;

/// Runtime tunables handed to a driver when it is created
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DriverOptions {
    /// Log every frame at trace level
    pub debug: bool,
    /// Single-pass token reads and a shorter removal threshold
    pub optimised: bool,
    /// Consecutive failed polls before a token counts as removed. `None`
    /// selects the default for the current mode.
    pub total_errors: Option<usize>,
    /// Interval between two polling ticks
    pub poll_interval_ms: u64,
    /// Serial port for UART attached readers; drivers fall back to their
    /// own default when unset
    pub serial_port: Option<String>,
    /// Emulator bank addressed by bank-aware drivers
    pub bank: u8,
}

impl DriverOptions {
    /// Removal threshold in effect
    pub fn total_errors(&self) -> usize {
        match self.total_errors {
            Some(n) => n,
            None if self.optimised => OPTIMISED_TOTAL_ERRORS,
            None => DEFAULT_TOTAL_ERRORS,
        }
    }

    /// Whether token reads are done twice and compared
    pub fn verify_reads(&self) -> bool {
        !self.optimised
    }
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            debug: false,
            optimised: false,
            total_errors: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            serial_port: None,
            bank: 0,
        }
    }
}
