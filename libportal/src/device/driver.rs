// libportal/src/device/driver.rs

use std::time::Duration;

use log::{debug, error, trace, warn};
use tokio::sync::{mpsc, watch};

use crate::Result;
use crate::device::options::DriverOptions;
use crate::device::presence::PresenceHandle;
use crate::protocol::{Command, CommandMap, Event, EventName};
use crate::transport::Transport;
use crate::types::{DeviceSetup, Product, Vendor};

/// Depth of the command queue. A second command submitted before the first
/// one is drained blocks the sender.
pub const COMMAND_QUEUE_DEPTH: usize = 1;

/// Driver-side ends of the channels connecting a polling loop to its client
pub struct DriverContext {
    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<Event>,
    terminate: watch::Receiver<bool>,
    presence: PresenceHandle,
    poll_interval: Duration,
    debug: bool,
}

/// Client-side ends of the channels created by [`DriverContext::channel`]
pub struct DriverLink {
    pub commands: mpsc::Sender<Command>,
    pub events: mpsc::UnboundedReceiver<Event>,
    pub terminate: watch::Sender<bool>,
    pub presence: PresenceHandle,
}

impl DriverContext {
    /// Create a connected context/link pair for a driver configured with
    /// `options`.
    pub fn channel(options: &DriverOptions) -> (DriverContext, DriverLink) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (terminate_tx, terminate_rx) = watch::channel(false);
        let presence = PresenceHandle::new(options.total_errors());

        let ctx = DriverContext {
            commands: command_rx,
            events: event_tx,
            terminate: terminate_rx,
            presence: presence.clone(),
            poll_interval: crate::utils::ms(options.poll_interval_ms),
            debug: options.debug,
        };
        let link = DriverLink {
            commands: command_tx,
            events: event_rx,
            terminate: terminate_tx,
            presence,
        };
        (ctx, link)
    }

    /// Publish an event. Events published after the subscriber went away
    /// are dropped.
    pub fn publish(&self, event: Event) {
        debug!("event {} ({} bytes)", event.name(), event.payload().len());
        if self.events.send(event).is_err() {
            trace!("event dropped, no subscriber");
        }
    }

    /// Non-blocking check of the command queue
    pub fn next_command(&mut self) -> Option<Command> {
        self.commands.try_recv().ok()
    }

    /// True once termination was signalled or the client went away
    pub fn is_terminated(&self) -> bool {
        *self.terminate.borrow() || self.terminate.has_changed().is_err()
    }

    pub fn presence(&self) -> &PresenceHandle {
        &self.presence
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Sleep until the next polling tick
    pub fn wait_tick(&self) {
        std::thread::sleep(self.poll_interval);
    }

    /// Dump a wire frame at trace level when debugging is enabled
    pub fn trace_frame(&self, direction: &str, frame: &[u8]) {
        if self.debug {
            trace!(
                "{} {}",
                direction,
                crate::utils::frame_to_hex(frame, crate::protocol::FILLER)
            );
        }
    }
}

/// A portal driver: translates abstract commands for one family of hardware
/// and runs its polling loop.
///
/// Implementations provide the hardware specific steps; the provided
/// [`Driver::drive`] ties them into the polling loop.
pub trait Driver: Send {
    /// Short driver name used in logs
    fn name(&self) -> &'static str;

    /// Vendor/product pair this instance was created for
    fn vendor(&self) -> Vendor;
    fn product(&self) -> Product;

    /// Every vendor/product pair this driver family handles
    fn supported(&self) -> &'static [(Vendor, Product)];

    fn vendor_id(&self) -> u16 {
        self.vendor().id()
    }

    fn product_id(&self) -> u16 {
        self.product().id()
    }

    fn supports(&self, vendor: &Vendor, product: &Product) -> bool {
        self.supported()
            .iter()
            .any(|(v, p)| v.alias() == vendor.alias() && p.alias() == product.alias())
    }

    /// Channel configuration the transport needs to reach the hardware
    fn setup(&self) -> DeviceSetup;

    /// Abstract commands understood by this driver and their opcodes
    fn commands(&self) -> CommandMap;

    /// Bring the hardware into a known state before the first tick
    fn initialize(&mut self, _transport: &mut dyn Transport, _ctx: &DriverContext) -> Result<()> {
        Ok(())
    }

    /// Execute one mapped command
    fn handle_command(
        &mut self,
        transport: &mut dyn Transport,
        ctx: &DriverContext,
        command: Command,
        opcode: u8,
    ) -> Result<()>;

    /// One polling tick: check for a token and update presence
    fn poll(&mut self, transport: &mut dyn Transport, ctx: &DriverContext) -> Result<()>;

    /// Bounded cleanup when the loop terminates (field and LED off)
    fn shutdown(&mut self, _transport: &mut dyn Transport, _ctx: &DriverContext) -> Result<()> {
        Ok(())
    }

    /// Polling loop. Runs until termination is signalled; queued commands
    /// take priority over polling on every tick.
    fn drive(&mut self, transport: &mut dyn Transport, ctx: &mut DriverContext) -> Result<()> {
        if let Err(e) = self.initialize(transport, ctx) {
            error!("{}: initialization failed: {}", self.name(), e);
            ctx.publish(Event::new(EventName::Error, e.to_string()));
            ctx.publish(Event::empty(EventName::Disconnect));
            return Err(e);
        }
        debug!("{}: polling loop started", self.name());

        let commands = self.commands();
        while !ctx.is_terminated() {
            match ctx.next_command() {
                Some(command) => match commands.opcode(command.kind()) {
                    Some(opcode) => {
                        let kind = command.kind();
                        if let Err(e) = self.handle_command(transport, ctx, command, opcode) {
                            warn!("{}: {} failed: {}", self.name(), kind, e);
                            ctx.publish(Event::new(EventName::Error, e.to_string()));
                        }
                    }
                    None => {
                        debug!("{}: {} is not supported", self.name(), command.kind());
                        ctx.publish(Event::new(
                            EventName::UnknownCommand,
                            vec![command.kind() as u8],
                        ));
                    }
                },
                None => {
                    if let Err(e) = self.poll(transport, ctx) {
                        trace!("{}: poll failed: {}", self.name(), e);
                    }
                }
            }
            ctx.wait_tick();
        }

        if let Err(e) = self.shutdown(transport, ctx) {
            warn!("{}: cleanup failed: {}", self.name(), e);
        }
        ctx.presence().reset();
        ctx.publish(Event::empty(EventName::Disconnect));
        debug!("{}: polling loop stopped", self.name());
        Ok(())
    }
}
