// libportal/src/device/client.rs

use std::thread::JoinHandle;

use log::{debug, warn};
use tokio::sync::{mpsc, watch};

use crate::device::driver::{Driver, DriverContext, DriverLink};
use crate::device::options::DriverOptions;
use crate::device::presence::PresenceHandle;
use crate::device::registry::DriverRegistry;
use crate::protocol::{Command, Event};
use crate::transport::{self, Transport};
use crate::types::{Product, Vendor, TokenState};
use crate::{Error, Result};

type LoopOutcome = (Box<dyn Driver>, Box<dyn Transport>, Result<()>);

/// Handles of a running polling loop
struct Running {
    commands: mpsc::Sender<Command>,
    terminate: watch::Sender<bool>,
    presence: PresenceHandle,
    thread: JoinHandle<LoopOutcome>,
}

/// Builder for [`Client`]
pub struct ClientBuilder {
    vendor: String,
    product: String,
    options: DriverOptions,
    transport: Option<Box<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new(vendor: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            product: product.into(),
            options: DriverOptions::default(),
            transport: None,
        }
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.options.debug = debug;
        self
    }

    pub fn optimised(mut self, optimised: bool) -> Self {
        self.options.optimised = optimised;
        self
    }

    pub fn total_errors(mut self, total_errors: usize) -> Self {
        self.options.total_errors = Some(total_errors);
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.options.poll_interval_ms = ms;
        self
    }

    pub fn serial_port(mut self, port: impl Into<String>) -> Self {
        self.options.serial_port = Some(port.into());
        self
    }

    pub fn bank(mut self, bank: u8) -> Self {
        self.options.bank = bank;
        self
    }

    /// Replace all tunables at once
    pub fn options(mut self, options: DriverOptions) -> Self {
        self.options = options;
        self
    }

    /// Use `transport` instead of opening one from the driver's setup
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    pub fn build(self, registry: &DriverRegistry) -> Result<Client> {
        let registration = registry.lookup(&self.vendor, &self.product)?;
        let driver = registration.create(&self.options);
        debug!(
            "client for {}/{} uses driver {}",
            self.vendor,
            self.product,
            driver.name()
        );
        Ok(Client {
            vendor: registration.vendor,
            product: registration.product,
            driver: Some(driver),
            transport: self.transport,
            options: self.options,
            running: None,
            events: None,
        })
    }
}

/// Connection to one portal.
///
/// The client owns the driver and its transport. While connected both live
/// on a dedicated polling thread; commands travel to it through a queue of
/// depth one and events come back through [`Client::events`].
///
/// ```no_run
/// use libportal::{Client, Command, CommandKind, DriverRegistry};
///
/// # fn main() -> libportal::Result<()> {
/// let registry = DriverRegistry::default();
/// let mut client = Client::new(&registry, "datel", "powersaves", false)?;
/// client.connect()?;
/// let mut events = client.events().expect("fresh connection");
/// client.send_command(Command::bare(CommandKind::GetHardwareInfo))?;
/// if let Some(event) = events.blocking_recv() {
///     println!("{}: {:02x?}", event.name(), event.payload());
/// }
/// client.disconnect()?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    vendor: Vendor,
    product: Product,
    driver: Option<Box<dyn Driver>>,
    transport: Option<Box<dyn Transport>>,
    options: DriverOptions,
    running: Option<Running>,
    events: Option<mpsc::UnboundedReceiver<Event>>,
}

impl Client {
    /// Look up the driver for `vendor`/`product` in `registry`
    pub fn new(registry: &DriverRegistry, vendor: &str, product: &str, debug: bool) -> Result<Self> {
        ClientBuilder::new(vendor, product).debug(debug).build(registry)
    }

    pub fn builder(vendor: impl Into<String>, product: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(vendor, product)
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }

    pub fn product(&self) -> Product {
        self.product
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    pub fn is_connected(&self) -> bool {
        self.running.is_some()
    }

    /// Open the transport and start the polling loop
    pub fn connect(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Err(Error::AlreadyConnected);
        }
        let mut driver = self.driver.take().ok_or(Error::Disconnected)?;
        let setup = driver.setup();

        let mut transport = match self.transport.take() {
            Some(t) => t,
            None => match transport::open_for(&setup, &self.vendor, &self.product) {
                Ok(t) => t,
                Err(e) => {
                    self.driver = Some(driver);
                    return Err(e);
                }
            },
        };
        if let Err(e) = transport.connect(&setup) {
            self.driver = Some(driver);
            self.transport = Some(transport);
            return Err(e);
        }
        debug!(
            "connected {}/{} ({:04x}:{:04x})",
            self.vendor.alias(),
            self.product.alias(),
            driver.vendor_id(),
            driver.product_id()
        );

        let (mut ctx, link) = DriverContext::channel(&self.options);
        let DriverLink {
            commands,
            events,
            terminate,
            presence,
        } = link;

        let thread = std::thread::Builder::new()
            .name(format!("libportal-{}", driver.name()))
            .spawn(move || {
                let result = driver.drive(transport.as_mut(), &mut ctx);
                // ctx drops here and closes the event stream
                (driver, transport, result)
            })?;

        self.events = Some(events);
        self.running = Some(Running {
            commands,
            terminate,
            presence,
            thread,
        });
        Ok(())
    }

    /// Stop the polling loop, wait for it and release the transport.
    /// Returns `Ok(())` immediately when not connected.
    pub fn disconnect(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        let Running {
            commands,
            terminate,
            thread,
            ..
        } = running;
        // The loop may already have exited on its own
        let _ = terminate.send(true);
        drop(commands);

        let (driver, mut transport, result) = thread.join().map_err(|_| Error::DriverPanicked)?;
        let released = transport.disconnect();
        self.driver = Some(driver);
        self.transport = Some(transport);
        debug!(
            "disconnected {}/{}",
            self.vendor.alias(),
            self.product.alias()
        );
        result.and(released)
    }

    /// Take the event stream of the current connection. The stream is handed
    /// out once per connection and closes after the polling loop exits.
    pub fn events(&mut self) -> Option<mpsc::UnboundedReceiver<Event>> {
        self.events.take()
    }

    /// Queue a command, blocking while another command is still pending.
    ///
    /// Must not be called from within an async runtime; use
    /// [`Client::send_command_async`] there.
    pub fn send_command(&self, command: Command) -> Result<()> {
        let running = self.running.as_ref().ok_or(Error::NotConnected)?;
        running
            .commands
            .blocking_send(command)
            .map_err(|_| Error::Disconnected)
    }

    pub async fn send_command_async(&self, command: Command) -> Result<()> {
        let sender = self.command_sender()?;
        sender.send(command).await.map_err(|_| Error::Disconnected)
    }

    /// Clone of the command queue sender, for producers on other threads
    pub fn command_sender(&self) -> Result<mpsc::Sender<Command>> {
        self.running
            .as_ref()
            .map(|r| r.commands.clone())
            .ok_or(Error::NotConnected)
    }

    /// Shared presence tracker of the running loop
    pub fn presence(&self) -> Option<PresenceHandle> {
        self.running.as_ref().map(|r| r.presence.clone())
    }

    pub fn token_state(&self) -> TokenState {
        self.running
            .as_ref()
            .map(|r| r.presence.state())
            .unwrap_or_default()
    }

    pub fn token_present(&self) -> bool {
        self.token_state() == TokenState::Present
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Err(e) = self.disconnect() {
            warn!("disconnect on drop failed: {}", e);
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("vendor", &self.vendor)
            .field("product", &self.product)
            .field("connected", &self.is_connected())
            .finish()
    }
}
