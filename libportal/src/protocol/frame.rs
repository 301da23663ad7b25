// libportal/src/protocol/frame.rs

use crate::{Error, Result};

/// Byte used to right-pad opcode frames. The device ignores its value but
/// requires every frame to span a full packet.
pub const FILLER: u8 = 0xCD;

/// Right-pad `args` with [`FILLER`] to exactly `size` bytes.
///
/// Returns `InvalidLength` when the arguments do not fit.
pub fn create_arguments(size: usize, args: &[u8]) -> Result<Vec<u8>> {
    if args.len() > size {
        return Err(Error::InvalidLength {
            expected: size,
            actual: args.len(),
        });
    }
    let mut out = Vec::with_capacity(size);
    out.extend_from_slice(args);
    out.resize(size, FILLER);
    Ok(out)
}

/// Opcode frame helper for command-opcode portals.
/// Format: [Opcode(1)] [Args(n)] [Filler(packet_size - 1 - n)]
pub struct OpcodeFrame;

impl OpcodeFrame {
    /// Encode an opcode and its arguments into a full packet
    pub fn encode(packet_size: usize, opcode: u8, args: &[u8]) -> Result<Vec<u8>> {
        if packet_size == 0 {
            return Err(Error::InvalidLength {
                expected: 1,
                actual: 0,
            });
        }
        let mut out = Vec::with_capacity(packet_size);
        out.push(opcode);
        out.extend(create_arguments(packet_size - 1, args)?);
        Ok(out)
    }

    /// True when a response starts with the portal's error marker
    pub fn is_error(response: &[u8]) -> bool {
        response.starts_with(&crate::constants::ERROR_MARKER)
    }
}

/// Register frame helpers for register-level reader chips.
/// Writes: [Address(1)] [Data(n)]; reads: [0x80 | Address] answered by 1 byte.
pub struct RegisterFrame;

impl RegisterFrame {
    /// Flag set on the address byte of a register read
    pub const READ_FLAG: u8 = 0x80;

    pub fn write(address: u8, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + data.len());
        out.push(address & 0x3F);
        out.extend_from_slice(data);
        out
    }

    pub fn read(address: u8) -> [u8; 1] {
        [Self::READ_FLAG | (address & 0x3F)]
    }
}
