use libportal::device::models::{N2EliteDriver, PowerSavesDriver};
use libportal::{DeviceSetup, DriverOptions, DriverRegistry, Error, Product, Vendor};

#[test]
fn builtin_pairs_resolve_to_their_drivers() {
    let registry = DriverRegistry::default();
    let options = DriverOptions::default();

    let powersaves = registry.create("datel", "powersaves", &options).unwrap();
    assert_eq!(powersaves.name(), "powersaves");
    assert_eq!((powersaves.vendor_id(), powersaves.product_id()), (0x1c1a, 0x03d9));
    assert!(matches!(powersaves.setup(), DeviceSetup::Usb(_)));

    let clone = registry.create("maxlander", "maxlander", &options).unwrap();
    assert_eq!(clone.name(), "powersaves");
    assert_eq!((clone.vendor_id(), clone.product_id()), (0x5c60, 0xdead));

    let n2 = registry.create("n2elite", "portal", &options).unwrap();
    assert_eq!(n2.name(), "n2elite");
    assert!(matches!(n2.setup(), DeviceSetup::Serial(s) if s.baud == 9600));
}

#[test]
fn unknown_pair_is_rejected() {
    let registry = DriverRegistry::default();
    let err = registry.create("datel", "portal", &DriverOptions::default()).err();
    assert!(matches!(err, Some(Error::DriverNotFound { .. })));
}

#[test]
fn custom_registration() {
    let mut registry = DriverRegistry::new();
    assert!(registry.is_empty());
    registry.register(
        Vendor::new("acme", 0x1234),
        Product::new("reader", 0x0001),
        N2EliteDriver::create,
    );
    registry.register(
        Vendor::new("acme", 0x1234),
        Product::new("usb", 0x0002),
        PowerSavesDriver::create,
    );
    assert_eq!(registry.len(), 2);

    let driver = registry.create("acme", "usb", &DriverOptions::default()).unwrap();
    assert_eq!(driver.vendor().alias(), "acme");
    assert_eq!(driver.product_id(), 0x0002);
}
