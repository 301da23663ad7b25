// libportal/src/transport/mod.rs

pub mod mock;
#[cfg(feature = "serial")]
pub mod serial;
pub mod traits;
#[cfg(feature = "usb")]
pub mod usb;

pub use mock::MockTransport;
#[cfg(feature = "serial")]
pub use serial::SerialTransport;
pub use traits::Transport;
#[cfg(feature = "usb")]
pub use usb::UsbTransport;

use crate::types::{DeviceSetup, Product, Vendor};
use crate::{Error, Result};

/// Build the transport matching a driver's device setup. Transports whose
/// feature is disabled are reported as unsupported.
#[allow(unused_variables)]
pub fn open_for(setup: &DeviceSetup, vendor: &Vendor, product: &Product) -> Result<Box<dyn Transport>> {
    match setup {
        #[cfg(feature = "usb")]
        DeviceSetup::Usb(_) => Ok(Box::new(UsbTransport::new(vendor.id(), product.id()))),
        #[cfg(not(feature = "usb"))]
        DeviceSetup::Usb(_) => Err(Error::UnsupportedOperation(
            "usb transport requires the `usb` feature".into(),
        )),
        #[cfg(feature = "serial")]
        DeviceSetup::Serial(_) => Ok(Box::new(SerialTransport::new())),
        #[cfg(not(feature = "serial"))]
        DeviceSetup::Serial(_) => Err(Error::UnsupportedOperation(
            "serial transport requires the `serial` feature".into(),
        )),
    }
}
