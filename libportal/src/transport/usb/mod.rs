// libportal/src/transport/usb/mod.rs

#![cfg(feature = "usb")]

use std::time::Duration;

use log::{debug, warn};
use rusb::{Context, DeviceHandle, UsbContext};

use crate::transport::traits::Transport;
use crate::types::{DeviceSetup, UsbSetup};
use crate::{Error, Result};

mod descriptor;
use descriptor::in_packet_size;

/// Attempts per transfer before the last USB error is surfaced
const TRANSFER_ATTEMPTS: u64 = 3;

struct OpenDevice {
    handle: DeviceHandle<Context>,
    setup: UsbSetup,
    reattach_kernel_driver: bool,
}

/// USB transport for portals exposing a pair of interrupt (or bulk)
/// endpoints. It is feature-gated behind `--features usb` and requires the
/// `rusb` crate.
pub struct UsbTransport {
    vendor_id: u16,
    product_id: u16,
    device: Option<OpenDevice>,
    packet_size: usize,
    timeout_ms: u64,
}

impl UsbTransport {
    /// Transport for the first device matching `vendor_id:product_id`. The
    /// device is opened on `connect`.
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            device: None,
            packet_size: 64,
            timeout_ms: crate::utils::DEFAULT_READ_TIMEOUT_MS,
        }
    }

    fn open(&self) -> Result<DeviceHandle<Context>> {
        let ctx = Context::new()?;
        for device in ctx.devices()?.iter() {
            let dd = device.device_descriptor()?;
            if dd.vendor_id() == self.vendor_id && dd.product_id() == self.product_id {
                return Ok(device.open()?);
            }
        }
        Err(Error::DeviceNotFound)
    }

    fn device(&mut self) -> Result<&mut OpenDevice> {
        self.device.as_mut().ok_or(Error::NotConnected)
    }
}

impl Transport for UsbTransport {
    fn connect(&mut self, setup: &DeviceSetup) -> Result<()> {
        let DeviceSetup::Usb(setup) = setup else {
            return Err(Error::UnsupportedOperation(
                "usb transport needs a usb device setup".into(),
            ));
        };
        if self.device.is_some() {
            return Err(Error::AlreadyConnected);
        }

        let mut handle = self.open()?;

        // A kernel HID driver commonly owns these portals; detach it so the
        // interface can be claimed and give it back on disconnect.
        let reattach_kernel_driver = matches!(handle.kernel_driver_active(setup.interface), Ok(true));
        if reattach_kernel_driver {
            handle.detach_kernel_driver(setup.interface)?;
        }

        if let Ok(active) = handle.active_configuration() {
            if active != setup.config {
                handle.set_active_configuration(setup.config)?;
            }
        }
        handle.claim_interface(setup.interface)?;
        handle.set_alternate_setting(setup.interface, setup.alt_setting)?;

        if let Some(size) = in_packet_size(&handle.device(), setup) {
            self.packet_size = size;
        }
        debug!(
            "usb {:04x}:{:04x} connected, interface {} packet size {}",
            self.vendor_id, self.product_id, setup.interface, self.packet_size
        );

        self.device = Some(OpenDevice {
            handle,
            setup: *setup,
            reattach_kernel_driver,
        });
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        let Some(mut open) = self.device.take() else {
            return Ok(());
        };
        open.handle.release_interface(open.setup.interface)?;
        if open.reattach_kernel_driver {
            if let Err(e) = open.handle.attach_kernel_driver(open.setup.interface) {
                warn!("could not reattach kernel driver: {}", e);
            }
        }
        Ok(())
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        let timeout = Duration::from_millis(self.timeout_ms);
        let open = self.device()?;
        let ep = open.setup.out_endpoint;

        // Prefer interrupt transfers, fall back to bulk. On repeated
        // failures clear a possible halt and back off between attempts.
        let mut last: Option<rusb::Error> = None;
        for attempt in 1..=TRANSFER_ATTEMPTS {
            match open.handle.write_interrupt(ep, data, timeout) {
                Ok(_) => return Ok(()),
                Err(e) => {
                    last = Some(e);
                    match open.handle.write_bulk(ep, data, timeout) {
                        Ok(_) => return Ok(()),
                        Err(e2) => {
                            last = Some(e2);
                            let _ = open.handle.clear_halt(ep);
                            std::thread::sleep(Duration::from_millis(20 * attempt));
                        }
                    }
                }
            }
        }
        match last {
            Some(e) => Err(e.into()),
            None => Err(Error::Timeout),
        }
    }

    fn receive(&mut self, timeout_ms: u64) -> Result<Vec<u8>> {
        let timeout = Duration::from_millis(timeout_ms);
        let size = self.packet_size;
        let open = self.device()?;
        let ep = open.setup.in_endpoint;
        let mut buf = vec![0u8; size];

        let mut last: Option<rusb::Error> = None;
        for attempt in 1..=TRANSFER_ATTEMPTS {
            match open.handle.read_interrupt(ep, &mut buf, timeout) {
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(buf);
                }
                // A timeout means the device has nothing to say; retrying
                // would only stretch the polling tick.
                Err(rusb::Error::Timeout) => return Err(Error::Timeout),
                Err(e) => {
                    last = Some(e);
                    match open.handle.read_bulk(ep, &mut buf, timeout) {
                        Ok(n) => {
                            buf.truncate(n);
                            return Ok(buf);
                        }
                        Err(_) => {
                            let _ = open.handle.clear_halt(ep);
                            std::thread::sleep(Duration::from_millis(20 * attempt));
                        }
                    }
                }
            }
        }
        match last {
            Some(e) => Err(e.into()),
            None => Err(Error::Timeout),
        }
    }

    fn max_packet_size(&self) -> usize {
        self.packet_size
    }
}
