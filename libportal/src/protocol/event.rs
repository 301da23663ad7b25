// libportal/src/protocol/event.rs

use derive_more::Display;

/// Names of the notifications a driver publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventName {
    DeviceName,
    HardwareInfo,
    ApiPassword,
    FrontLedOn,
    FrontLedOff,
    TokenDetected,
    TokenRemoved,
    TokenTagData,
    TokenTagDataError,
    TokenTagDataSizeError,
    TokenTagWriteStart,
    TokenTagWriteFinish,
    TokenTagWriteError,
    UnknownCommand,
    Disconnect,
    #[display(fmt = "OK")]
    Ok,
    Error,
}

/// Immutable notification produced by a driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    name: EventName,
    payload: Vec<u8>,
}

impl Event {
    pub fn new(name: EventName, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            name,
            payload: payload.into(),
        }
    }

    /// Event with an empty payload
    pub fn empty(name: EventName) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn name(&self) -> EventName {
        self.name
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// True for events that report a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(
            self.name,
            EventName::TokenTagDataError
                | EventName::TokenTagDataSizeError
                | EventName::TokenTagWriteError
                | EventName::UnknownCommand
                | EventName::Error
        )
    }
}
