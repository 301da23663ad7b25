// libportal/src/protocol/checksum.rs

use crate::constants::CRC_A_PRESET;

/// Compute the ISO/IEC 14443-3 CRC_A over `data`.
///
/// The register is preset to 0x6363 and every byte is folded in LSB first.
/// The returned value is transmitted low byte first, see [`crc_a_bytes`].
pub fn crc_a(data: &[u8]) -> u16 {
    data.iter().fold(CRC_A_PRESET, |crc, &byte| {
        let mut b = byte ^ (crc & 0x00ff) as u8;
        b ^= b << 4;
        let b = b as u16;
        (crc >> 8) ^ (b << 8) ^ (b << 3) ^ (b >> 4)
    })
}

/// CRC_A of `data` in wire order: `[low, high]`
pub fn crc_a_bytes(data: &[u8]) -> [u8; 2] {
    crc_a(data).to_le_bytes()
}

/// Append the wire-order CRC_A of `frame` to it
pub fn append_crc_a(frame: &mut Vec<u8>) {
    let crc = crc_a_bytes(frame);
    frame.extend_from_slice(&crc);
}

/// Verify that the last two bytes of `frame` are the CRC_A of the bytes
/// preceding them, and return the payload without the CRC.
pub fn strip_crc_a(frame: &[u8]) -> crate::Result<&[u8]> {
    if frame.len() < 2 {
        return Err(crate::Error::InvalidLength {
            expected: 2,
            actual: frame.len(),
        });
    }
    let (payload, crc) = frame.split_at(frame.len() - 2);
    let expected = crc_a(payload);
    let actual = u16::from_le_bytes([crc[0], crc[1]]);
    if expected != actual {
        return Err(crate::Error::CrcMismatch { expected, actual });
    }
    Ok(payload)
}

/// Block check character: XOR of the UID bytes of a cascade level
pub fn bcc(uid: &[u8]) -> u8 {
    uid.iter().fold(0u8, |acc, &b| acc ^ b)
}
