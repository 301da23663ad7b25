//! Hexadecimal helpers used for wire dumps and display purposes.

use std::fmt::Write;

/// Convert a byte slice to a lowercase hex string without separators.
///
/// Example: `&[0xde, 0xad]` -> `"dead"`
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        // write! never fails writing to a String
        let _ = write!(&mut s, "{:02x}", b);
    }
    s
}

/// Convert a byte slice to a lowercase hex string with a single space between
/// each byte.
///
/// Example: `&[0xde, 0xad]` -> `"de ad"`
pub fn bytes_to_hex_spaced(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i != 0 {
            s.push(' ');
        }
        let _ = write!(&mut s, "{:02x}", b);
    }
    s
}

/// Render a wire frame for trace logs. A trailing run of `filler` bytes is
/// collapsed to `filler x count` so padded 64-byte packets stay readable.
///
/// Example: `(&[0x12, 0xcd, 0xcd], 0xcd)` -> `"12 (cd x2)"`
pub fn frame_to_hex(bytes: &[u8], filler: u8) -> String {
    let body_len = bytes
        .iter()
        .rposition(|&b| b != filler)
        .map(|i| i + 1)
        .unwrap_or(0);
    let padding = bytes.len() - body_len;
    let mut s = bytes_to_hex_spaced(&bytes[..body_len]);
    if padding > 1 {
        if !s.is_empty() {
            s.push(' ');
        }
        let _ = write!(&mut s, "({:02x} x{})", filler, padding);
    } else if padding == 1 {
        if !s.is_empty() {
            s.push(' ');
        }
        let _ = write!(&mut s, "{:02x}", filler);
    }
    s
}
