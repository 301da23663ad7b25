// libportal/src/transport/serial.rs

#![cfg(feature = "serial")]

use std::io::{Read, Write};
use std::time::Duration;

use log::debug;
use serialport::SerialPort;

use crate::transport::traits::Transport;
use crate::types::DeviceSetup;
use crate::{Error, Result};

/// UART transport for reader chips wired behind a USB serial bridge.
/// Feature-gated behind `--features serial`.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    read_buffer: usize,
}

impl SerialTransport {
    pub fn new() -> Self {
        Self {
            port: None,
            read_buffer: 64,
        }
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(Error::NotConnected)
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SerialTransport {
    fn connect(&mut self, setup: &DeviceSetup) -> Result<()> {
        let DeviceSetup::Serial(setup) = setup else {
            return Err(Error::UnsupportedOperation(
                "serial transport needs a serial device setup".into(),
            ));
        };
        if self.port.is_some() {
            return Err(Error::AlreadyConnected);
        }
        let port = serialport::new(setup.port.as_str(), setup.baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(crate::utils::default_read_timeout())
            .open()?;
        debug!("serial {} opened at {} baud", setup.port, setup.baud);
        self.port = Some(port);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        // Dropping the handle closes the port
        self.port = None;
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port()?;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    fn receive(&mut self, timeout_ms: u64) -> Result<Vec<u8>> {
        let size = self.read_buffer;
        let port = self.port()?;
        port.set_timeout(Duration::from_millis(timeout_ms))?;
        let mut buf = vec![0u8; size];
        match port.read(&mut buf) {
            Ok(0) => Err(Error::Timeout),
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(Error::Timeout),
            Err(e) => Err(e.into()),
        }
    }

    fn max_packet_size(&self) -> usize {
        self.read_buffer
    }
}
