// libportal/src/transport/traits.rs

use crate::Result;
use crate::types::DeviceSetup;

/// Transport trait abstracts I/O away from driver logic.
///
/// A transport is moved onto the polling thread while the client is
/// connected, hence the `Send` bound.
pub trait Transport: Send {
    /// Open the physical channel described by `setup`
    fn connect(&mut self, setup: &DeviceSetup) -> Result<()>;

    /// Release the physical channel. Must be safe to call when not connected.
    fn disconnect(&mut self) -> Result<()>;

    /// Send raw bytes to the device
    fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive raw bytes from the device with a timeout in milliseconds
    fn receive(&mut self, timeout_ms: u64) -> Result<Vec<u8>>;

    /// Largest packet the channel moves in one transfer
    fn max_packet_size(&self) -> usize {
        64
    }

    /// Send a request and wait for its answer. Default implementation is a
    /// plain `send` followed by `receive`.
    fn exchange(&mut self, data: &[u8], timeout_ms: u64) -> Result<Vec<u8>> {
        self.send(data)?;
        self.receive(timeout_ms)
    }
}
