use libportal::transport::{MockTransport, Transport};
use libportal::types::{DeviceSetup, SerialSetup, UsbSetup};
use libportal::Error;

fn usb_setup() -> DeviceSetup {
    DeviceSetup::Usb(UsbSetup {
        config: 1,
        interface: 0,
        alt_setting: 0,
        in_endpoint: 0x81,
        out_endpoint: 0x01,
    })
}

#[test]
fn mock_transport_send_and_receive() {
    let mut m = MockTransport::new();
    m.connect(&usb_setup()).unwrap();
    assert!(m.connected);
    m.push_response(vec![0x01]);
    m.send(&[0xAA]).unwrap();
    assert_eq!(m.sent.len(), 1);
    assert_eq!(m.receive(1000).unwrap(), vec![0x01]);
    assert!(matches!(m.receive(1000), Err(Error::Timeout)));
}

#[test]
fn responder_answers_each_frame() {
    let mut m = MockTransport::with_responder(|frame| match frame {
        [0x80, ..] => Some(vec![0x92]),
        _ => None,
    });
    assert_eq!(m.exchange(&[0x80], 10).unwrap(), vec![0x92]);
    m.send(&[0x01, 0x0f]).unwrap();
    assert!(m.receive(10).is_err());
}

#[test]
fn shared_log_outlives_the_transport() {
    let mut m = MockTransport::new();
    let log = m.share_sent();
    let handle = std::thread::spawn(move || {
        let boxed: &mut dyn Transport = &mut m;
        boxed.send(&[1, 2, 3]).unwrap();
    });
    handle.join().unwrap();
    assert_eq!(*log.lock().unwrap(), vec![vec![1u8, 2, 3]]);
}

#[test]
fn refused_connect_and_receive_failures() {
    let mut m = MockTransport::new();
    m.refuse_connect = true;
    let serial = DeviceSetup::Serial(SerialSetup {
        port: "/dev/null".into(),
        baud: 9600,
    });
    assert!(matches!(m.connect(&serial), Err(Error::DeviceNotFound)));
    assert!(!m.connected);

    m.refuse_connect = false;
    m.connect(&serial).unwrap();
    assert_eq!(m.setup, Some(serial));
    m.set_receive_failures(1);
    m.push_response(vec![0x42]);
    assert!(m.receive(5).is_err());
    assert_eq!(m.receive(5).unwrap(), vec![0x42]);
    m.disconnect().unwrap();
    m.disconnect().unwrap();
}

#[test]
fn packet_size_override() {
    let mut m = MockTransport::new();
    assert_eq!(m.max_packet_size(), 64);
    m.set_packet_size(32);
    assert_eq!(m.max_packet_size(), 32);
}
