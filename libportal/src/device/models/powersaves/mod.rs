// libportal/src/device/models/powersaves/mod.rs

//! Driver for opcode based portals (Datel PowerSaves and rebrands).
//!
//! Every request is one full USB packet `[opcode][args][filler..]` and the
//! portal answers every request with exactly one packet. A failed request is
//! answered with a packet starting with the error marker.

mod commands;
pub mod config;

use log::{debug, warn};

use crate::constants::{MAX_PAGE_ATTEMPTS, PAGE_SIZE, PAGES_PER_READ, READ_PAGE_RANGE, TOKEN_PAGES, TOKEN_SIZE};
use crate::device::driver::{Driver, DriverContext};
use crate::device::options::DriverOptions;
use crate::device::presence::Transition;
use crate::protocol::{Command, CommandKind, CommandMap, Event, EventName, OpcodeFrame};
use crate::transport::Transport;
use crate::types::{DeviceSetup, Product, TokenData, TokenState, Vendor};
use crate::{Error, Result};

/// A read pass that stopped early, with whatever was collected so far
#[derive(Debug)]
struct PartialRead {
    data: Vec<u8>,
    cause: Error,
}

pub struct PowerSavesDriver {
    vendor: Vendor,
    product: Product,
    options: DriverOptions,
}

impl PowerSavesDriver {
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

    /// Send one framed request and return the portal's answer. An answer
    /// carrying the error marker is turned into `Error::ErrorMarker`.
    fn request(&self, transport: &mut dyn Transport, ctx: &DriverContext, frame: Vec<u8>) -> Result<Vec<u8>> {
        ctx.trace_frame(">>", &frame);
        let resp = transport.exchange(&frame, config::READ_TIMEOUT_MS)?;
        ctx.trace_frame("<<", &resp);
        if OpcodeFrame::is_error(&resp) {
            return Err(Error::ErrorMarker);
        }
        Ok(resp)
    }

    fn set_led(&self, transport: &mut dyn Transport, ctx: &DriverContext, on: bool) -> Result<Vec<u8>> {
        let frame = commands::set_led(transport.max_packet_size(), on)?;
        self.request(transport, ctx, frame)
    }

    /// Cycle the field and ask for a token UID
    fn probe(&self, transport: &mut dyn Transport, ctx: &DriverContext) -> Result<Vec<u8>> {
        let size = transport.max_packet_size();
        self.request(transport, ctx, commands::field_off(size)?)?;
        self.request(transport, ctx, commands::field_on(size)?)?;
        self.request(transport, ctx, commands::get_token_uid(size)?)
    }

    /// One pass over the whole page range
    fn read_pass(&self, transport: &mut dyn Transport, ctx: &DriverContext) -> std::result::Result<TokenData, PartialRead> {
        let size = transport.max_packet_size();
        let mut buffer = vec![0u8; TOKEN_SIZE];

        for page in (0..READ_PAGE_RANGE).step_by(PAGES_PER_READ) {
            let offset = page * PAGE_SIZE;
            let mut attempt = 0;
            loop {
                attempt += 1;
                let result = commands::read_pages(size, page as u8)
                    .and_then(|frame| self.request(transport, ctx, frame))
                    .and_then(|resp| {
                        if resp.len() < config::READ_CHUNK {
                            Err(Error::InvalidLength {
                                expected: config::READ_CHUNK,
                                actual: resp.len(),
                            })
                        } else {
                            Ok(resp)
                        }
                    });
                match result {
                    Ok(resp) => {
                        let end = (offset + config::READ_CHUNK).min(TOKEN_SIZE);
                        buffer[offset..end].copy_from_slice(&resp[..end - offset]);
                        break;
                    }
                    Err(e) if attempt < MAX_PAGE_ATTEMPTS => {
                        debug!("page {:#04x} read attempt {} failed: {}", page, attempt, e);
                    }
                    Err(e) => {
                        warn!("page {:#04x} unreadable after {} attempts", page, attempt);
                        return Err(PartialRead {
                            data: buffer,
                            cause: e,
                        });
                    }
                }
            }
        }

        TokenData::try_from(buffer.as_slice()).map_err(|cause| PartialRead { data: buffer, cause })
    }

    /// Read the token, verifying with a second pass unless optimised, and
    /// publish the outcome.
    fn fetch_token(&self, transport: &mut dyn Transport, ctx: &DriverContext) {
        let first = match self.read_pass(transport, ctx) {
            Ok(data) => data,
            Err(partial) => {
                debug!("token read failed: {}", partial.cause);
                ctx.publish(Event::new(EventName::TokenTagDataError, partial.data));
                return;
            }
        };

        if self.options.verify_reads() {
            match self.read_pass(transport, ctx) {
                Ok(second) if second == first => {}
                Ok(_) => {
                    warn!("token changed between read passes");
                    ctx.publish(Event::new(EventName::TokenTagDataError, first.to_vec()));
                    return;
                }
                Err(partial) => {
                    debug!("verification read failed: {}", partial.cause);
                    ctx.publish(Event::new(EventName::TokenTagDataError, partial.data));
                    return;
                }
            }
        }

        ctx.publish(Event::new(EventName::TokenTagData, first.to_vec()));
    }

    fn write_token(&self, transport: &mut dyn Transport, ctx: &DriverContext, data: &[u8]) -> Result<()> {
        let data = match TokenData::try_from(data) {
            Ok(data) => data,
            Err(e) => {
                debug!("rejected token write: {}", e);
                ctx.publish(Event::empty(EventName::TokenTagDataSizeError));
                return Ok(());
            }
        };

        ctx.publish(Event::empty(EventName::TokenTagWriteStart));
        let size = transport.max_packet_size();
        for page in 0..TOKEN_PAGES {
            let mut bytes = [0u8; PAGE_SIZE];
            if let Some(p) = data.page(page) {
                bytes.copy_from_slice(p);
            }

            let mut attempt = 0;
            loop {
                attempt += 1;
                let result = commands::write_page(size, page as u8, &bytes)
                    .and_then(|frame| self.request(transport, ctx, frame));
                match result {
                    Ok(_) => break,
                    Err(e) if attempt < MAX_PAGE_ATTEMPTS => {
                        debug!("page {:#04x} write attempt {} failed: {}", page, attempt, e);
                    }
                    Err(e) => {
                        warn!("page {:#04x} write failed: {}", page, e);
                        ctx.publish(Event::new(EventName::TokenTagWriteError, vec![page as u8]));
                        return Ok(());
                    }
                }
            }
        }
        ctx.publish(Event::empty(EventName::TokenTagWriteFinish));
        Ok(())
    }
}

impl Driver for PowerSavesDriver {
    fn name(&self) -> &'static str {
        "powersaves"
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
        DeviceSetup::Usb(config::USB_SETUP)
    }

    fn commands(&self) -> CommandMap {
        commands::COMMANDS
    }

    fn handle_command(
        &mut self,
        transport: &mut dyn Transport,
        ctx: &DriverContext,
        command: Command,
        opcode: u8,
    ) -> Result<()> {
        let size = transport.max_packet_size();
        match command.kind() {
            CommandKind::GetDeviceName | CommandKind::GetHardwareInfo | CommandKind::GetApiPassword => {
                let name = match command.kind() {
                    CommandKind::GetDeviceName => EventName::DeviceName,
                    CommandKind::GetHardwareInfo => EventName::HardwareInfo,
                    _ => EventName::ApiPassword,
                };
                let resp = self.request(transport, ctx, OpcodeFrame::encode(size, opcode, command.args())?)?;
                ctx.publish(Event::new(name, resp));
            }
            CommandKind::SetLedState => {
                let on = command.args().first().is_some_and(|&b| b != 0);
                let resp = self.set_led(transport, ctx, on)?;
                let name = if on {
                    EventName::FrontLedOn
                } else {
                    EventName::FrontLedOff
                };
                ctx.publish(Event::new(name, resp));
            }
            CommandKind::FetchTokenData => self.fetch_token(transport, ctx),
            CommandKind::WriteTokenData => self.write_token(transport, ctx, command.args())?,
            CommandKind::EraseTokenData => {
                return Err(Error::UnsupportedOperation(command.kind().to_string()));
            }
        }
        Ok(())
    }

    fn poll(&mut self, transport: &mut dyn Transport, ctx: &DriverContext) -> Result<()> {
        let presence = ctx.presence();
        let result = match presence.state() {
            TokenState::Absent => self.probe(transport, ctx),
            TokenState::Present => commands::get_token_uid(transport.max_packet_size())
                .and_then(|frame| self.request(transport, ctx, frame)),
        };

        match result {
            Ok(resp) => {
                if presence.record_success() == Some(Transition::Arrived) {
                    let uid = &resp[..resp.len().min(config::UID_LEN)];
                    debug!("token arrived: {}", crate::utils::bytes_to_hex(uid));
                    ctx.publish(Event::new(EventName::TokenDetected, uid.to_vec()));
                    self.fetch_token(transport, ctx);
                }
                Ok(())
            }
            Err(e) => {
                if presence.record_error() == Some(Transition::Departed) {
                    debug!("token removed");
                    if let Err(led) = self.set_led(transport, ctx, false) {
                        debug!("led off failed: {}", led);
                    }
                    ctx.publish(Event::empty(EventName::TokenRemoved));
                }
                Err(e)
            }
        }
    }

    fn shutdown(&mut self, transport: &mut dyn Transport, ctx: &DriverContext) -> Result<()> {
        let led = self.set_led(transport, ctx, false);
        let field = commands::field_off(transport.max_packet_size())
            .and_then(|frame| self.request(transport, ctx, frame));
        led.and(field).map(|_| ())
    }
}
