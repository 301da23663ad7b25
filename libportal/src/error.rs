// libportal/src/error.rs

use thiserror::Error;

use crate::fsm::FsmError;

/// Common error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("device not found")]
    DeviceNotFound,

    #[error("no driver registered for vendor '{vendor}' and product '{product}'")]
    DriverNotFound { vendor: String, product: String },

    // USB and serial transports are optional dependencies
    #[cfg(feature = "usb")]
    #[error("usb error: {0}")]
    Usb(#[from] rusb::Error),

    #[cfg(feature = "serial")]
    #[error("serial error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid packet length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("crc mismatch: expected {expected:#06x}, got {actual:#06x}")]
    CrcMismatch { expected: u16, actual: u16 },

    #[error("block check mismatch: expected {expected:#04x}, got {actual:#04x}")]
    BccMismatch { expected: u8, actual: u8 },

    #[error("collision at bit {position}")]
    Collision { position: u8 },

    #[error("chip reported error register {0:#04x}")]
    ChipError(u8),

    #[error("device answered with an error marker")]
    ErrorMarker,

    #[error("token authentication failed")]
    AuthenticationFailed,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    #[error("operation timed out")]
    Timeout,

    #[error("client is not connected")]
    NotConnected,

    #[error("client is already connected")]
    AlreadyConnected,

    #[error("driver loop has stopped")]
    Disconnected,

    #[error("driver loop panicked")]
    DriverPanicked,

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error(transparent)]
    Fsm(#[from] FsmError),
}

pub type Result<T> = std::result::Result<T, Error>;
