// libportal/src/transport/mock.rs

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::transport::traits::Transport;
use crate::types::DeviceSetup;
use crate::{Error, Result};

/// Callback that synthesises a response for every sent frame
pub type Responder = Box<dyn FnMut(&[u8]) -> Option<Vec<u8>> + Send>;

/// Shared view of the frames a mock transport has sent, usable after the
/// transport was moved onto the polling thread.
pub type SentLog = Arc<Mutex<Vec<Vec<u8>>>>;

/// Mock transport for unit tests. It records sent payloads and returns queued
/// responses, or responses produced by a [`Responder`].
#[derive(Default)]
pub struct MockTransport {
    pub sent: Vec<Vec<u8>>,
    pub responses: Vec<Vec<u8>>,
    /// Setup passed to the last successful `connect`
    pub setup: Option<DeviceSetup>,
    pub connected: bool,
    /// Testing hook: number of receive calls that should fail with Timeout
    pub receive_failures: usize,
    /// Testing hook: make `connect` fail
    pub refuse_connect: bool,
    packet_size: Option<usize>,
    responder: Option<Responder>,
    mirror: Option<SentLog>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock whose responses are computed from each sent frame
    pub fn with_responder(
        responder: impl FnMut(&[u8]) -> Option<Vec<u8>> + Send + 'static,
    ) -> Self {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::default()
        }
    }

    /// Override the reported packet size (defaults to 64)
    pub fn set_packet_size(&mut self, size: usize) {
        self.packet_size = Some(size);
    }

    /// Set how many subsequent receive calls should fail (for tests).
    pub fn set_receive_failures(&mut self, n: usize) {
        self.receive_failures = n;
    }

    pub fn push_response(&mut self, resp: Vec<u8>) {
        self.responses.push(resp);
    }

    pub fn pop_sent(&mut self) -> Option<Vec<u8>> {
        self.sent.pop()
    }

    /// Mirror every sent frame into a shared log and return it
    pub fn share_sent(&mut self) -> SentLog {
        let log = self
            .mirror
            .get_or_insert_with(|| Arc::new(Mutex::new(Vec::new())));
        Arc::clone(log)
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("sent", &self.sent.len())
            .field("responses", &self.responses.len())
            .field("connected", &self.connected)
            .field("responder", &self.responder.is_some())
            .finish()
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, setup: &DeviceSetup) -> Result<()> {
        if self.refuse_connect {
            return Err(Error::DeviceNotFound);
        }
        self.setup = Some(setup.clone());
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.sent.push(data.to_vec());
        if let Some(log) = &self.mirror {
            if let Ok(mut log) = log.lock() {
                log.push(data.to_vec());
            }
        }
        if let Some(responder) = self.responder.as_mut() {
            if let Some(resp) = responder(data) {
                self.responses.push(resp);
            }
        }
        Ok(())
    }

    fn receive(&mut self, _timeout_ms: u64) -> Result<Vec<u8>> {
        if self.receive_failures > 0 {
            self.receive_failures -= 1;
            return Err(Error::Timeout);
        }
        if self.responses.is_empty() {
            Err(Error::Timeout)
        } else {
            Ok(self.responses.remove(0))
        }
    }

    fn max_packet_size(&self) -> usize {
        self.packet_size.unwrap_or(64)
    }
}
