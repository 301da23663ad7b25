// libportal/src/device/models/mod.rs

//! Built-in drivers, one directory per hardware family.

pub mod n2elite;
pub mod powersaves;

pub use n2elite::N2EliteDriver;
pub use powersaves::PowerSavesDriver;

use crate::device::registry::DriverRegistry;

/// Register every vendor/product pair handled by the built-in drivers
pub fn register_builtin(registry: &mut DriverRegistry) {
    for &(vendor, product) in powersaves::config::SUPPORTED {
        registry.register(vendor, product, PowerSavesDriver::create);
    }
    for &(vendor, product) in n2elite::config::SUPPORTED {
        registry.register(vendor, product, N2EliteDriver::create);
    }
}
