use libportal::protocol::{append_crc_a, bcc, crc_a, crc_a_bytes, strip_crc_a};
use libportal::Error;
use proptest::prelude::*;

#[test]
fn known_frames() {
    // HLTA and a SELECT of 4-byte UID 0x01020304 as sent on the air
    assert_eq!(crc_a_bytes(&[0x50, 0x00]), [0x57, 0xcd]);
    assert_eq!(crc_a_bytes(&[0x93, 0x20]), [0x97, 0x0c]);
    let mut select = vec![0x93, 0x70, 0x01, 0x02, 0x03, 0x04];
    select.push(bcc(&select[2..]));
    append_crc_a(&mut select);
    assert_eq!(strip_crc_a(&select).unwrap(), &[0x93, 0x70, 0x01, 0x02, 0x03, 0x04, 0x04]);
}

#[test]
fn corrupted_frame_is_rejected() {
    let mut frame = hex::decode("3b000d01").unwrap();
    append_crc_a(&mut frame);
    frame[1] ^= 0x01;
    assert!(matches!(strip_crc_a(&frame), Err(Error::CrcMismatch { .. })));
    assert!(matches!(strip_crc_a(&[0x01]), Err(Error::InvalidLength { .. })));
}

#[test]
fn empty_payload_crc_is_the_preset() {
    assert_eq!(crc_a(&[]), 0x6363);
}

proptest! {
    #[test]
    fn appended_crc_always_verifies(payload in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut frame = payload.clone();
        append_crc_a(&mut frame);
        prop_assert_eq!(strip_crc_a(&frame).unwrap(), payload.as_slice());
    }

    #[test]
    fn bcc_of_uid_and_bcc_is_zero(uid in proptest::array::uniform4(any::<u8>())) {
        let check = bcc(&uid);
        let mut all = uid.to_vec();
        all.push(check);
        prop_assert_eq!(bcc(&all), 0);
    }
}
