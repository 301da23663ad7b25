// libportal/src/device/models/n2elite/bank.rs

//! Emulator bank transfers. A bank is moved in chunks of
//! [`config::CHUNK_PAGES`] pages; each chunk is retried a bounded number of
//! times before the transfer gives up.

use log::debug;

use super::config;
use super::picc::transceive_crc;
use super::registers::Mfrc522;
use crate::constants::{MAX_PAGE_ATTEMPTS, PAGE_SIZE};
use crate::{Error, Result};

/// A chunk that kept failing
#[derive(Debug)]
pub struct ChunkFailure {
    /// First page of the failing chunk
    pub page: u8,
    pub cause: Error,
}

fn read_chunk(chip: &mut Mfrc522<'_>, bank: u8, start: u8, count: u8) -> Result<Vec<u8>> {
    let end = start + count - 1;
    let data = transceive_crc(chip, &[config::PICC_READ_BANK, start, end, bank])?;
    let expected = count as usize * PAGE_SIZE;
    if data.len() != expected {
        return Err(Error::InvalidLength {
            expected,
            actual: data.len(),
        });
    }
    Ok(data)
}

fn write_chunk(chip: &mut Mfrc522<'_>, bank: u8, start: u8, data: &[u8]) -> Result<()> {
    let count = (data.len() / PAGE_SIZE) as u8;
    let mut frame = Vec::with_capacity(4 + data.len() + 2);
    frame.extend_from_slice(&[config::PICC_WRITE_BANK, start, count, bank]);
    frame.extend_from_slice(data);
    crate::protocol::append_crc_a(&mut frame);

    let rx = chip.transceive(&frame, 0, 0)?;
    match rx.data.as_slice() {
        [ack] if rx.last_bits == 4 && ack & 0x0F == config::PICC_ACK => Ok(()),
        other => Err(Error::Protocol(format!("write not acknowledged: {:02x?}", other))),
    }
}

/// Run `op` up to MAX_PAGE_ATTEMPTS times
fn with_retries<T>(page: u8, mut op: impl FnMut() -> Result<T>) -> std::result::Result<T, ChunkFailure> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < MAX_PAGE_ATTEMPTS => {
                debug!("chunk at page {:#04x} attempt {} failed: {}", page, attempt, e);
            }
            Err(cause) => return Err(ChunkFailure { page, cause }),
        }
    }
}

/// Read the first `pages` pages of `bank` into `out`. On failure `out`
/// holds every chunk read before the failing one.
pub fn read_bank(
    chip: &mut Mfrc522<'_>,
    bank: u8,
    pages: usize,
    out: &mut Vec<u8>,
) -> std::result::Result<(), ChunkFailure> {
    for start in (0..pages).step_by(config::CHUNK_PAGES) {
        let count = config::CHUNK_PAGES.min(pages - start) as u8;
        let page = start as u8;
        let chunk = with_retries(page, || read_chunk(chip, bank, page, count))?;
        out.extend_from_slice(&chunk);
    }
    Ok(())
}

/// Write `data` (a whole number of pages) to `bank` starting at page 0
pub fn write_bank(chip: &mut Mfrc522<'_>, bank: u8, data: &[u8]) -> std::result::Result<(), ChunkFailure> {
    for (i, chunk) in data.chunks(config::CHUNK_PAGES * PAGE_SIZE).enumerate() {
        let page = (i * config::CHUNK_PAGES) as u8;
        with_retries(page, || write_chunk(chip, bank, page, chunk))?;
    }
    Ok(())
}
