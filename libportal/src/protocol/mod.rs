// libportal/src/protocol/mod.rs

pub mod checksum;
pub mod command;
pub mod event;
pub mod frame;

pub use checksum::{append_crc_a, bcc, crc_a, crc_a_bytes, strip_crc_a};
pub use command::{Command, CommandKind, CommandMap};
pub use event::{Event, EventName};
pub use frame::{FILLER, OpcodeFrame, RegisterFrame, create_arguments};
