// libportal/src/device/models/n2elite/mod.rs

//! Driver for the N2 Elite portal. The portal is a bare MFRC522 reader, so
//! the token protocol (anti-collision, select, unlock, bank transfers) is
//! run from the host one register access at a time.

mod bank;
pub mod config;
mod picc;
mod registers;

use log::debug;

use crate::constants::TOKEN_SIZE;
use crate::device::driver::{Driver, DriverContext};
use crate::device::options::DriverOptions;
use crate::device::presence::Transition;
use crate::protocol::{Command, CommandKind, CommandMap, Event, EventName};
use crate::transport::Transport;
use crate::types::{DeviceSetup, Product, SerialSetup, TokenData, TokenState, Uid, Vendor};
use crate::{Error, Result};

use registers::Mfrc522;

const COMMANDS: CommandMap = CommandMap::new(&[
    (CommandKind::GetHardwareInfo, config::reg::VERSION),
    (CommandKind::FetchTokenData, config::PICC_READ_BANK),
    (CommandKind::WriteTokenData, config::PICC_WRITE_BANK),
    (CommandKind::EraseTokenData, config::PICC_WRITE_BANK),
]);

pub struct N2EliteDriver {
    vendor: Vendor,
    product: Product,
    options: DriverOptions,
}

impl N2EliteDriver {
    pub fn new(vendor: Vendor, product: Product, options: &DriverOptions) -> Self {
        Self {
            vendor,
            product,
            options: options.clone(),
        }
    }

    /// Registry factory
    pub fn create(vendor: Vendor, product: Product, options: &DriverOptions) -> Box<dyn Driver> {
        Box::new(Self::new(vendor, product, options))
    }

    /// Wake, select and unlock the token, run `op`, then halt it again
    fn with_unlocked<T>(
        &self,
        transport: &mut dyn Transport,
        ctx: &DriverContext,
        op: impl FnOnce(&mut Mfrc522<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut chip = Mfrc522::new(transport, ctx);
        picc::activate(&mut chip)?;
        let result = picc::unlock(&mut chip).and_then(|_| op(&mut chip));
        if let Err(e) = picc::halt(&mut chip) {
            debug!("halt after bank operation failed: {}", e);
        }
        result
    }

    /// Cycle the field and look for a new token
    fn detect(&self, chip: &mut Mfrc522<'_>) -> Result<Uid> {
        chip.antenna_off()?;
        chip.antenna_on()?;
        picc::request(chip, false)?;
        let uid = picc::select(chip)?;
        picc::halt(chip)?;
        Ok(uid)
    }

    /// Check a halted token is still in the field
    fn still_present(&self, chip: &mut Mfrc522<'_>) -> Result<()> {
        picc::request(chip, true)?;
        picc::halt(chip)
    }

    fn fetch_token(&self, transport: &mut dyn Transport, ctx: &DriverContext) {
        let mut image = Vec::with_capacity(config::BANK_SIZE);
        let result = self.with_unlocked(transport, ctx, |chip| {
            bank::read_bank(chip, self.options.bank, config::BANK_PAGES, &mut image)
                .map_err(|f| f.cause)
        });
        // the token occupies the head of the bank; the tail is emulator padding
        let token = result.and_then(|_| TokenData::try_from(&image[..TOKEN_SIZE.min(image.len())]));
        match token {
            Ok(data) => ctx.publish(Event::new(EventName::TokenTagData, data.to_vec())),
            Err(e) => {
                debug!("bank {} read failed: {}", self.options.bank, e);
                image.truncate(TOKEN_SIZE);
                ctx.publish(Event::new(EventName::TokenTagDataError, image));
            }
        }
    }

    fn write_token(&self, transport: &mut dyn Transport, ctx: &DriverContext, data: &[u8]) {
        if data.len() != TOKEN_SIZE {
            debug!("rejected token write of {} bytes", data.len());
            ctx.publish(Event::empty(EventName::TokenTagDataSizeError));
            return;
        }

        ctx.publish(Event::empty(EventName::TokenTagWriteStart));
        let mut failed_page = None;
        let result = self.with_unlocked(transport, ctx, |chip| {
            bank::write_bank(chip, self.options.bank, data).map_err(|f| {
                failed_page = Some(f.page);
                f.cause
            })
        });
        match result {
            Ok(()) => ctx.publish(Event::empty(EventName::TokenTagWriteFinish)),
            Err(e) => {
                debug!("bank {} write failed: {}", self.options.bank, e);
                ctx.publish(Event::new(
                    EventName::TokenTagWriteError,
                    failed_page.map(|p| vec![p]).unwrap_or_default(),
                ));
            }
        }
    }

    fn erase_bank(&self, transport: &mut dyn Transport, ctx: &DriverContext) -> Result<()> {
        let zeros = [0u8; config::BANK_SIZE];
        self.with_unlocked(transport, ctx, |chip| {
            bank::write_bank(chip, self.options.bank, &zeros).map_err(|f| f.cause)
        })?;
        ctx.publish(Event::empty(EventName::Ok));
        Ok(())
    }
}

impl Driver for N2EliteDriver {
    fn name(&self) -> &'static str {
        "n2elite"
    }

    fn vendor(&self) -> Vendor {
        self.vendor
    }

    fn product(&self) -> Product {
        self.product
    }

    fn supported(&self) -> &'static [(Vendor, Product)] {
        config::SUPPORTED
    }

    fn setup(&self) -> DeviceSetup {
        DeviceSetup::Serial(SerialSetup {
            port: self
                .options
                .serial_port
                .clone()
                .unwrap_or_else(|| config::DEFAULT_SERIAL_PORT.to_string()),
            baud: config::BAUD_RATE,
        })
    }

    fn commands(&self) -> CommandMap {
        COMMANDS
    }

    fn initialize(&mut self, transport: &mut dyn Transport, ctx: &DriverContext) -> Result<()> {
        Mfrc522::new(transport, ctx).init()
    }

    fn handle_command(
        &mut self,
        transport: &mut dyn Transport,
        ctx: &DriverContext,
        command: Command,
        opcode: u8,
    ) -> Result<()> {
        match command.kind() {
            CommandKind::GetHardwareInfo => {
                let version = Mfrc522::new(transport, ctx).read(opcode)?;
                ctx.publish(Event::new(EventName::HardwareInfo, vec![version]));
            }
            CommandKind::FetchTokenData => self.fetch_token(transport, ctx),
            CommandKind::WriteTokenData => self.write_token(transport, ctx, command.args()),
            CommandKind::EraseTokenData => self.erase_bank(transport, ctx)?,
            other => return Err(Error::UnsupportedOperation(other.to_string())),
        }
        Ok(())
    }

    fn poll(&mut self, transport: &mut dyn Transport, ctx: &DriverContext) -> Result<()> {
        let presence = ctx.presence();
        let result = {
            let mut chip = Mfrc522::new(transport, ctx);
            match presence.state() {
                TokenState::Absent => self.detect(&mut chip).map(Some),
                TokenState::Present => self.still_present(&mut chip).map(|_| None),
            }
        };

        match result {
            Ok(uid) => {
                if presence.record_success() == Some(Transition::Arrived) {
                    if let Some(uid) = uid {
                        debug!("token arrived: {}", uid);
                        ctx.publish(Event::new(EventName::TokenDetected, uid.as_bytes().to_vec()));
                    }
                    self.fetch_token(transport, ctx);
                }
                Ok(())
            }
            Err(e) => {
                if presence.record_error() == Some(Transition::Departed) {
                    debug!("token removed");
                    ctx.publish(Event::empty(EventName::TokenRemoved));
                }
                Err(e)
            }
        }
    }

    fn shutdown(&mut self, transport: &mut dyn Transport, ctx: &DriverContext) -> Result<()> {
        Mfrc522::new(transport, ctx).antenna_off()
    }
}
