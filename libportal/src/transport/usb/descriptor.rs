// libportal/src/transport/usb/descriptor.rs

use rusb::{Device, Direction};

use crate::types::UsbSetup;

/// Inspect the configuration selected by `setup` and return the max packet
/// size of its IN endpoint, if that endpoint exists on the interface.
pub fn in_packet_size<D: rusb::UsbContext>(device: &Device<D>, setup: &UsbSetup) -> Option<usize> {
    // Configuration values are 1-based, descriptor indices are 0-based
    let index = setup.config.saturating_sub(1);
    let config = device.config_descriptor(index).ok()?;

    for interface in config.interfaces() {
        for interface_desc in interface.descriptors() {
            if interface_desc.interface_number() != setup.interface
                || interface_desc.setting_number() != setup.alt_setting
            {
                continue;
            }
            for endpoint_desc in interface_desc.endpoint_descriptors() {
                if endpoint_desc.direction() == Direction::In
                    && endpoint_desc.address() == setup.in_endpoint
                {
                    return Some(endpoint_desc.max_packet_size() as usize);
                }
            }
        }
    }

    None
}
