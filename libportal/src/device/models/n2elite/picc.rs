// libportal/src/device/models/n2elite/picc.rs

//! ISO/IEC 14443-3 type A operations: request, anti-collision cascade,
//! select and halt, plus the emulator unlock handshake.

use log::{debug, trace};

use super::config;
use super::registers::{Mfrc522, Received};
use crate::constants::{CASCADE_TAG, SELECT_CODES};
use crate::protocol::{append_crc_a, bcc, strip_crc_a};
use crate::types::Uid;
use crate::{Error, Result};

/// UID bytes of one cascade level plus their block check byte
type CascadeLevel = [u8; 5];
const LEVEL_BITS: usize = 32;

/// REQA (or WUPA when `wakeup`), returning the ATQA
pub fn request(chip: &mut Mfrc522<'_>, wakeup: bool) -> Result<Vec<u8>> {
    let code = if wakeup {
        config::PICC_WUPA
    } else {
        config::PICC_REQA
    };
    let rx = chip.transceive(&[code], config::SHORT_FRAME_BITS, 0)?;
    // Several tokens with different ATQAs still mean "something is there"
    if rx.collision.is_none() && (rx.data.len() != 2 || rx.last_bits != 0) {
        return Err(Error::InvalidLength {
            expected: 2,
            actual: rx.data.len(),
        });
    }
    Ok(rx.data)
}

/// Send `payload` with CRC_A appended and verify the CRC of the answer
pub fn transceive_crc(chip: &mut Mfrc522<'_>, payload: &[u8]) -> Result<Vec<u8>> {
    let mut frame = payload.to_vec();
    append_crc_a(&mut frame);
    let rx = chip.transceive(&frame, 0, 0)?;
    if let Some(position) = rx.collision {
        return Err(Error::Collision { position });
    }
    Ok(strip_crc_a(&rx.data)?.to_vec())
}

/// Fold the answer of an anti-collision round into the known UID bits.
/// The first received byte shares its low `extra` bits with the last byte
/// that was sent.
fn merge(level: &mut CascadeLevel, full: usize, extra: u8, rx: &Received) {
    let keep = (1u8 << extra).wrapping_sub(1);
    for (i, &byte) in rx.data.iter().enumerate() {
        let Some(slot) = level.get_mut(full + i) else {
            break;
        };
        *slot = if i == 0 && extra > 0 {
            (*slot & keep) | (byte & !keep)
        } else {
            byte
        };
    }
}

/// Run anti-collision rounds on one cascade level until a single token
/// answers with its complete UID part.
fn anticollision(chip: &mut Mfrc522<'_>, select_code: u8) -> Result<CascadeLevel> {
    chip.clear_bits(config::reg::COLL, config::VALUES_AFTER_COLL)?;

    let mut level: CascadeLevel = [0; 5];
    let mut known_bits = 0usize;
    for _ in 0..config::MAX_COLLISION_ROUNDS {
        let full = known_bits / 8;
        let extra = (known_bits % 8) as u8;
        let sent = full + usize::from(extra > 0);
        let nvb = (((2 + full) as u8) << 4) | extra;

        let mut frame = Vec::with_capacity(2 + sent);
        frame.push(select_code);
        frame.push(nvb);
        frame.extend_from_slice(&level[..sent]);

        let rx = chip.transceive(&frame, extra, extra)?;
        merge(&mut level, full, extra, &rx);

        match rx.collision {
            None => {
                let expected = level.len() - full;
                if rx.data.len() < expected {
                    return Err(Error::InvalidLength {
                        expected,
                        actual: rx.data.len(),
                    });
                }
                return Ok(level);
            }
            Some(position) => {
                let position = position as usize;
                if position <= known_bits || position > LEVEL_BITS {
                    return Err(Error::Protocol(format!(
                        "collision at bit {} with {} bits known",
                        position, known_bits
                    )));
                }
                // Keep the bits before the collision, pick the token that
                // has a 1 at the colliding bit
                let bit = position - 1;
                let byte = bit / 8;
                level[byte] &= (1u8 << (bit % 8)).wrapping_sub(1);
                level[byte] |= 1 << (bit % 8);
                level[byte + 1..].fill(0);
                known_bits = position;
                trace!("collision at bit {}, retrying", position);
            }
        }
    }
    Err(Error::Collision {
        position: known_bits as u8,
    })
}

/// Full cascade: anti-collision and SELECT on up to three levels
pub fn select(chip: &mut Mfrc522<'_>) -> Result<Uid> {
    let mut uid = Vec::with_capacity(10);
    for &code in SELECT_CODES.iter() {
        let level = anticollision(chip, code)?;
        let expected = bcc(&level[..4]);
        if expected != level[4] {
            return Err(Error::BccMismatch {
                expected,
                actual: level[4],
            });
        }

        let mut frame = vec![code, config::NVB_SELECT];
        frame.extend_from_slice(&level);
        let sak = match transceive_crc(chip, &frame)?.as_slice() {
            [sak] => *sak,
            other => {
                return Err(Error::InvalidLength {
                    expected: 1,
                    actual: other.len(),
                });
            }
        };

        if sak & config::SAK_CASCADE != 0 {
            if level[0] != CASCADE_TAG {
                return Err(Error::Protocol("cascade without cascade tag".into()));
            }
            uid.extend_from_slice(&level[1..4]);
        } else {
            uid.extend_from_slice(&level[..4]);
            let uid = Uid::try_from(uid.as_slice())?;
            debug!("selected {} (sak {:#04x})", uid, sak);
            return Ok(uid);
        }
    }
    Err(Error::Protocol("uid spans more than three cascade levels".into()))
}

/// HLTA. The token acknowledges a halt by staying silent.
pub fn halt(chip: &mut Mfrc522<'_>) -> Result<()> {
    let mut frame = vec![config::PICC_HLTA, 0x00];
    append_crc_a(&mut frame);
    match chip.transceive(&frame, 0, 0) {
        Err(Error::Timeout) => Ok(()),
        Err(e) => Err(e),
        Ok(_) => Err(Error::Protocol("token answered HLTA".into())),
    }
}

/// Wake a (possibly halted) token and select it
pub fn activate(chip: &mut Mfrc522<'_>) -> Result<Uid> {
    request(chip, true)?;
    select(chip)
}

/// Emulator unlock: the 4-byte challenge is echoed back behind the second
/// unlock opcode and must be acknowledged.
pub fn unlock(chip: &mut Mfrc522<'_>) -> Result<()> {
    let challenge = chip.transceive(&[config::PICC_UNLOCK_1], 0, 0)?;
    if challenge.data.len() != 4 {
        return Err(Error::InvalidLength {
            expected: 4,
            actual: challenge.data.len(),
        });
    }

    let mut frame = Vec::with_capacity(5);
    frame.push(config::PICC_UNLOCK_2);
    frame.extend_from_slice(&challenge.data);
    match chip.transceive(&frame, 0, 0) {
        Ok(rx) if rx.data == config::UNLOCK_ACK => Ok(()),
        Ok(rx) => {
            debug!("unlock refused: {:02x?}", rx.data);
            Err(Error::AuthenticationFailed)
        }
        Err(Error::Timeout) => Err(Error::AuthenticationFailed),
        Err(e) => Err(e),
    }
}
