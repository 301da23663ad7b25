// libportal/src/device/registry.rs

use std::collections::HashMap;

use log::debug;

use crate::device::driver::Driver;
use crate::device::options::DriverOptions;
use crate::types::{Product, Vendor};
use crate::{Error, Result};

/// Constructor stored in the registry
pub type DriverFactory = fn(Vendor, Product, &DriverOptions) -> Box<dyn Driver>;

/// One registered vendor/product pair
#[derive(Clone, Copy)]
pub struct Registration {
    pub vendor: Vendor,
    pub product: Product,
    factory: DriverFactory,
}

impl Registration {
    /// Build a driver instance for this pair
    pub fn create(&self, options: &DriverOptions) -> Box<dyn Driver> {
        (self.factory)(self.vendor, self.product, options)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("vendor", &self.vendor)
            .field("product", &self.product)
            .finish()
    }
}

/// Lookup table from (vendor alias, product alias) to driver constructor.
///
/// `DriverRegistry::default()` contains every built-in driver; use
/// [`DriverRegistry::new`] for an empty table.
#[derive(Debug, Clone)]
pub struct DriverRegistry {
    entries: HashMap<(&'static str, &'static str), Registration>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a driver for a vendor/product pair.
    ///
    /// # Panics
    ///
    /// Registering the same alias pair twice is a programming error and
    /// panics.
    pub fn register(&mut self, vendor: Vendor, product: Product, factory: DriverFactory) {
        let key = (vendor.alias(), product.alias());
        assert!(
            !self.entries.contains_key(&key),
            "driver for {}/{} registered twice",
            key.0,
            key.1
        );
        debug!(
            "registered {}/{} ({:04x}:{:04x})",
            key.0,
            key.1,
            vendor.id(),
            product.id()
        );
        self.entries.insert(
            key,
            Registration {
                vendor,
                product,
                factory,
            },
        );
    }

    pub fn lookup(&self, vendor: &str, product: &str) -> Result<&Registration> {
        self.entries
            .iter()
            .find(|((v, p), _)| *v == vendor && *p == product)
            .map(|(_, registration)| registration)
            .ok_or_else(|| Error::DriverNotFound {
                vendor: vendor.to_string(),
                product: product.to_string(),
            })
    }

    /// Find the registration and build a driver from it
    pub fn create(
        &self,
        vendor: &str,
        product: &str,
        options: &DriverOptions,
    ) -> Result<Box<dyn Driver>> {
        Ok(self.lookup(vendor, product)?.create(options))
    }

    /// Registered pairs sorted by alias
    pub fn registrations(&self) -> Vec<&Registration> {
        let mut all: Vec<_> = self.entries.values().collect();
        all.sort_by_key(|r| (r.vendor.alias(), r.product.alias()));
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        crate::device::models::register_builtin(&mut registry);
        registry
    }
}
