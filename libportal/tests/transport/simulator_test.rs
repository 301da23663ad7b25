// The simulators stand in for real portals in the other suites; these
// checks pin down the wire behaviour they rely on.

use libportal::device::models::n2elite::config as n2;
use libportal::device::models::powersaves::config as ps;
use libportal::protocol::{FILLER, OpcodeFrame, RegisterFrame};
use libportal::test_support::{Mfrc522Sim, PowerSavesSim, sample_token};
use libportal::transport::Transport;

#[test]
fn powersaves_sim_speaks_opcode_frames() {
    let sim = PowerSavesSim::with_token(sample_token());
    let mut t = sim.transport();

    let uid = OpcodeFrame::encode(64, ps::GET_TOKEN_UID, &[]).unwrap();
    // the field is still off
    assert!(OpcodeFrame::is_error(&t.exchange(&uid, 10).unwrap()));

    t.exchange(&OpcodeFrame::encode(64, ps::FIELD_ON, &[]).unwrap(), 10).unwrap();
    let resp = t.exchange(&uid, 10).unwrap();
    assert_eq!(resp.len(), 64);
    assert_eq!(&resp[..7], &sim.uid());
    assert_eq!(resp[63], FILLER);

    let pages = t
        .exchange(&OpcodeFrame::encode(64, ps::READ_PAGES, &[0x04]).unwrap(), 10)
        .unwrap();
    assert_eq!(&pages[..16], &sample_token()[16..32]);
    assert_eq!(sim.reads(), 1);
}

#[test]
fn mfrc522_sim_answers_register_reads() {
    let sim = Mfrc522Sim::new();
    let mut t = sim.transport();
    let version = t.exchange(&RegisterFrame::read(n2::reg::VERSION), 10).unwrap();
    assert!(n2::KNOWN_VERSIONS.contains(&version[0]));

    t.send(&RegisterFrame::write(n2::reg::TX_CONTROL, &[n2::ANTENNA_ON])).unwrap();
    assert_eq!(sim.register(n2::reg::TX_CONTROL) & n2::ANTENNA_ON, n2::ANTENNA_ON);
}
