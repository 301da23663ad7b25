// libportal/src/device/models/n2elite/registers.rs

//! MFRC522 register access over the UART link.

use log::{debug, warn};

use super::config::{self, cmd, reg};
use crate::device::driver::DriverContext;
use crate::protocol::RegisterFrame;
use crate::transport::Transport;
use crate::{Error, Result};

/// Bytes read back from the FIFO after a transceive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub data: Vec<u8>,
    /// Valid bits in the last byte, 0 when the last byte is complete
    pub last_bits: u8,
    /// 1-based position of the first collision, as reported by CollReg
    pub collision: Option<u8>,
}

/// Register level view of the chip for the duration of one operation
pub struct Mfrc522<'a> {
    io: &'a mut dyn Transport,
    ctx: &'a DriverContext,
}

impl<'a> Mfrc522<'a> {
    pub fn new(io: &'a mut dyn Transport, ctx: &'a DriverContext) -> Self {
        Self { io, ctx }
    }

    pub fn read(&mut self, address: u8) -> Result<u8> {
        let frame = RegisterFrame::read(address);
        self.ctx.trace_frame(">>", &frame);
        let resp = self.io.exchange(&frame, config::REGISTER_TIMEOUT_MS)?;
        self.ctx.trace_frame("<<", &resp);
        resp.first().copied().ok_or(Error::Timeout)
    }

    pub fn write(&mut self, address: u8, value: u8) -> Result<()> {
        self.write_many(address, &[value])
    }

    /// Write several bytes to the same register (FIFO fills)
    pub fn write_many(&mut self, address: u8, data: &[u8]) -> Result<()> {
        let frame = RegisterFrame::write(address, data);
        self.ctx.trace_frame(">>", &frame);
        self.io.send(&frame)
    }

    pub fn set_bits(&mut self, address: u8, mask: u8) -> Result<()> {
        let value = self.read(address)?;
        self.write(address, value | mask)
    }

    pub fn clear_bits(&mut self, address: u8, mask: u8) -> Result<()> {
        let value = self.read(address)?;
        self.write(address, value & !mask)
    }

    pub fn command(&mut self, command: u8) -> Result<()> {
        self.write(reg::COMMAND, command)
    }

    pub fn version(&mut self) -> Result<u8> {
        self.read(reg::VERSION)
    }

    /// Soft reset, waiting a bounded number of reads for PowerDown to clear
    pub fn soft_reset(&mut self) -> Result<()> {
        self.command(cmd::SOFT_RESET)?;
        for _ in 0..config::RESET_POLL_BUDGET {
            if self.read(reg::COMMAND)? & config::POWER_DOWN == 0 {
                return Ok(());
            }
        }
        Err(Error::InitializationFailed("soft reset did not complete".into()))
    }

    /// Reset the chip and load the timer, modulation and RF settings
    pub fn init(&mut self) -> Result<()> {
        self.soft_reset()?;
        for &(address, value) in config::INIT_SEQUENCE {
            self.write(address, value)?;
        }
        self.antenna_on()?;

        let version = self.version()?;
        if config::KNOWN_VERSIONS.contains(&version) {
            debug!("mfrc522 version {:#04x}", version);
        } else {
            warn!("unexpected mfrc522 version {:#04x}", version);
        }
        Ok(())
    }

    pub fn antenna_on(&mut self) -> Result<()> {
        let value = self.read(reg::TX_CONTROL)?;
        if value & config::ANTENNA_ON != config::ANTENNA_ON {
            self.write(reg::TX_CONTROL, value | config::ANTENNA_ON)?;
        }
        let value = self.read(reg::TX_CONTROL)?;
        if value & config::ANTENNA_ON != config::ANTENNA_ON {
            return Err(Error::InitializationFailed(format!(
                "antenna did not switch on (TxControlReg {:#04x})",
                value
            )));
        }
        Ok(())
    }

    pub fn antenna_off(&mut self) -> Result<()> {
        self.clear_bits(reg::TX_CONTROL, config::ANTENNA_ON)
    }

    /// Run one Transceive. Collisions are reported in the result, every
    /// other fault is an error.
    pub fn transceive(&mut self, data: &[u8], tx_last_bits: u8, rx_align: u8) -> Result<Received> {
        self.command(cmd::IDLE)?;
        self.write(reg::COM_IRQ, config::CLEAR_IRQS)?;
        self.write(reg::FIFO_LEVEL, config::FLUSH_BUFFER)?;
        self.write_many(reg::FIFO_DATA, data)?;
        self.write(reg::BIT_FRAMING, ((rx_align & 0x07) << 4) | (tx_last_bits & 0x07))?;
        self.command(cmd::TRANSCEIVE)?;
        self.set_bits(reg::BIT_FRAMING, config::START_SEND)?;

        let mut done = false;
        for _ in 0..config::IRQ_POLL_BUDGET {
            let irq = self.read(reg::COM_IRQ)?;
            if irq & config::IRQ_DONE != 0 {
                done = true;
                break;
            }
            if irq & config::IRQ_TIMER != 0 {
                break;
            }
        }
        self.clear_bits(reg::BIT_FRAMING, config::START_SEND)?;
        if !done {
            return Err(Error::Timeout);
        }

        let error = self.read(reg::ERROR)?;
        if error & (config::ERR_GENERIC | config::ERR_CRC) != 0 {
            return Err(Error::ChipError(error));
        }

        let collision = if error & config::ERR_COLLISION != 0 {
            let coll = self.read(reg::COLL)?;
            if coll & config::COLL_POS_NOT_VALID != 0 {
                return Err(Error::Protocol("collision outside the valid range".into()));
            }
            Some(match coll & 0x1F {
                0 => 32,
                pos => pos,
            })
        } else {
            None
        };

        let level = self.read(reg::FIFO_LEVEL)? as usize;
        let last_bits = self.read(reg::CONTROL)? & 0x07;
        let mut data = Vec::with_capacity(level);
        for _ in 0..level {
            data.push(self.read(reg::FIFO_DATA)?);
        }
        Ok(Received {
            data,
            last_bits,
            collision,
        })
    }
}
