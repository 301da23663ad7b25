use libportal::Error;
use libportal::protocol::{FILLER, OpcodeFrame, RegisterFrame, create_arguments};

#[test]
fn arguments_are_padded_with_filler() {
    let out = create_arguments(25, &[0x58, 0x98, 0x10, 0x38]).unwrap();
    assert_eq!(out.len(), 25);
    assert_eq!(&out[..4], &[0x58, 0x98, 0x10, 0x38]);
    assert!(out[4..].iter().all(|&b| b == FILLER));
    assert_eq!(out[24], 0xcd);
}

#[test]
fn arguments_exactly_filling_the_packet() {
    let args = [0x11u8; 8];
    assert_eq!(create_arguments(8, &args).unwrap(), args.to_vec());
    assert!(create_arguments(0, &[]).unwrap().is_empty());
}

#[test]
fn oversized_arguments_are_rejected() {
    assert!(matches!(
        create_arguments(2, &[1, 2, 3]),
        Err(Error::InvalidLength {
            expected: 2,
            actual: 3
        })
    ));
    assert!(OpcodeFrame::encode(4, 0x1c, &[1, 2, 3, 4]).is_err());
}

#[test]
fn opcode_frame_layout() {
    let frame = OpcodeFrame::encode(64, 0x1d, &[0x10, 0xde, 0xad, 0xbe, 0xef]).unwrap();
    assert_eq!(frame.len(), 64);
    assert_eq!(hex::encode(&frame[..6]), "1d10deadbeef");
    assert!(frame[6..].iter().all(|&b| b == FILLER));
}

#[test]
fn error_marker_detection() {
    assert!(OpcodeFrame::is_error(&[0x01, 0x02, 0xcd, 0xcd]));
    assert!(!OpcodeFrame::is_error(&[0x01]));
    assert!(!OpcodeFrame::is_error(&[0x02, 0x01]));
}

#[test]
fn register_frames() {
    assert_eq!(RegisterFrame::read(0x37), [0xb7]);
    assert_eq!(RegisterFrame::write(0x09, &[0x26]), vec![0x09, 0x26]);
    // address bits above the register range are masked off
    assert_eq!(RegisterFrame::write(0xc1, &[]), vec![0x01]);
}
