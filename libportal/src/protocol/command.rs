// libportal/src/protocol/command.rs

use derive_more::Display;

/// Abstract operations an application can request from a portal.
///
/// Every driver maps the kinds it understands to a hardware opcode; the
/// rest are answered with an `UnknownCommand` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CommandKind {
    GetDeviceName = 0x01,
    GetHardwareInfo = 0x02,
    GetApiPassword = 0x03,
    FetchTokenData = 0x04,
    WriteTokenData = 0x05,
    SetLedState = 0x06,
    EraseTokenData = 0x07,
}

/// A command together with its opaque argument bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    kind: CommandKind,
    args: Vec<u8>,
}

impl Command {
    pub fn new(kind: CommandKind, args: Vec<u8>) -> Self {
        Self { kind, args }
    }

    /// Command without arguments
    pub fn bare(kind: CommandKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn args(&self) -> &[u8] {
        &self.args
    }

    pub fn into_args(self) -> Vec<u8> {
        self.args
    }

    /// SetLedState with the LED switched on or off
    pub fn set_led(on: bool) -> Self {
        Self::new(CommandKind::SetLedState, vec![on as u8])
    }

    /// WriteTokenData carrying a token image; length is validated by the driver
    pub fn write_token(data: impl Into<Vec<u8>>) -> Self {
        Self::new(CommandKind::WriteTokenData, data.into())
    }
}

impl From<CommandKind> for Command {
    fn from(kind: CommandKind) -> Self {
        Self::bare(kind)
    }
}

/// Per-driver table mapping abstract commands to hardware opcodes
#[derive(Debug, Clone, Copy)]
pub struct CommandMap(&'static [(CommandKind, u8)]);

impl CommandMap {
    pub const fn new(entries: &'static [(CommandKind, u8)]) -> Self {
        Self(entries)
    }

    pub fn opcode(&self, kind: CommandKind) -> Option<u8> {
        self.0
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, opcode)| *opcode)
    }

    pub fn supports(&self, kind: CommandKind) -> bool {
        self.opcode(kind).is_some()
    }
}
