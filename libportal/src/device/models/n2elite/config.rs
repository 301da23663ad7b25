//! N2 Elite portal configuration: an MFRC522 reader chip behind a CH340
//! USB-UART bridge.

use crate::types::{Product, Vendor};

pub const VENDOR_N2ELITE: Vendor = Vendor::new("n2elite", 0x1a86);
pub const PRODUCT_PORTAL: Product = Product::new("portal", 0x7523);

pub const SUPPORTED: &[(Vendor, Product)] = &[(VENDOR_N2ELITE, PRODUCT_PORTAL)];

pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";

/// MFRC522 UART power-on baud rate
pub const BAUD_RATE: u32 = 9600;

/// Timeout for one register read (ms)
pub const REGISTER_TIMEOUT_MS: u64 = 100;

/// Register addresses
pub mod reg {
    pub const COMMAND: u8 = 0x01;
    pub const COM_IRQ: u8 = 0x04;
    pub const ERROR: u8 = 0x06;
    pub const FIFO_DATA: u8 = 0x09;
    pub const FIFO_LEVEL: u8 = 0x0A;
    pub const CONTROL: u8 = 0x0C;
    pub const BIT_FRAMING: u8 = 0x0D;
    pub const COLL: u8 = 0x0E;
    pub const MODE: u8 = 0x11;
    pub const TX_MODE: u8 = 0x12;
    pub const RX_MODE: u8 = 0x13;
    pub const TX_CONTROL: u8 = 0x14;
    pub const TX_ASK: u8 = 0x15;
    pub const MOD_WIDTH: u8 = 0x24;
    pub const RF_CFG: u8 = 0x26;
    pub const T_MODE: u8 = 0x2A;
    pub const T_PRESCALER: u8 = 0x2B;
    pub const T_RELOAD_H: u8 = 0x2C;
    pub const T_RELOAD_L: u8 = 0x2D;
    pub const VERSION: u8 = 0x37;
}

/// Values written to CommandReg
pub mod cmd {
    pub const IDLE: u8 = 0x00;
    pub const TRANSCEIVE: u8 = 0x0C;
    pub const SOFT_RESET: u8 = 0x0F;
}

/// CommandReg PowerDown flag, set while a soft reset is in progress
pub const POWER_DOWN: u8 = 0x10;
/// FIFOLevelReg FlushBuffer
pub const FLUSH_BUFFER: u8 = 0x80;
/// BitFramingReg StartSend
pub const START_SEND: u8 = 0x80;
/// TxControlReg Tx1RFEn | Tx2RFEn
pub const ANTENNA_ON: u8 = 0x03;
/// ComIrqReg: clear every flag
pub const CLEAR_IRQS: u8 = 0x7F;
/// ComIrqReg RxIRq | IdleIRq
pub const IRQ_DONE: u8 = 0x30;
/// ComIrqReg TimerIRq
pub const IRQ_TIMER: u8 = 0x01;
/// ErrorReg BufferOvfl | ParityErr | ProtocolErr
pub const ERR_GENERIC: u8 = 0x13;
pub const ERR_COLLISION: u8 = 0x08;
pub const ERR_CRC: u8 = 0x04;
/// CollReg CollPosNotValid
pub const COLL_POS_NOT_VALID: u8 = 0x20;
/// CollReg ValuesAfterColl
pub const VALUES_AFTER_COLL: u8 = 0x80;

/// Register values loaded by initialization, in write order
pub const INIT_SEQUENCE: &[(u8, u8)] = &[
    // Timer: auto start, 25 ms timeout
    (reg::T_MODE, 0x80),
    (reg::T_PRESCALER, 0xA9),
    (reg::T_RELOAD_H, 0x03),
    (reg::T_RELOAD_L, 0xE8),
    // 100% ASK, CRC preset 0x6363
    (reg::TX_ASK, 0x40),
    (reg::MODE, 0x3D),
    (reg::TX_MODE, 0x00),
    (reg::RX_MODE, 0x00),
    (reg::MOD_WIDTH, 0x26),
    // 48 dB receiver gain
    (reg::RF_CFG, 0x70),
];

/// VersionReg values of genuine chips
pub const KNOWN_VERSIONS: &[u8] = &[0x91, 0x92];

/// Reads of CommandReg while waiting for a soft reset to finish
pub const RESET_POLL_BUDGET: usize = 16;
/// Reads of ComIrqReg while waiting for a transceive to finish
pub const IRQ_POLL_BUDGET: usize = 256;
/// Collision rounds tolerated per cascade level (one per UID bit)
pub const MAX_COLLISION_ROUNDS: usize = 32;

/// PICC commands
pub const PICC_REQA: u8 = 0x26;
pub const PICC_WUPA: u8 = 0x52;
pub const PICC_HLTA: u8 = 0x50;
pub const PICC_UNLOCK_1: u8 = 0xAA;
pub const PICC_UNLOCK_2: u8 = 0x55;
pub const PICC_READ_BANK: u8 = 0x3B;
pub const PICC_WRITE_BANK: u8 = 0xA5;

/// REQA/WUPA are short frames of 7 bits
pub const SHORT_FRAME_BITS: u8 = 7;
/// NVB of a complete SELECT
pub const NVB_SELECT: u8 = 0x70;
/// SAK bit announcing another cascade level
pub const SAK_CASCADE: u8 = 0x04;
/// Answer to a successful unlock
pub const UNLOCK_ACK: [u8; 2] = [0x80, 0x80];
/// 4-bit ACK
pub const PICC_ACK: u8 = 0x0A;

/// Emulator bank geometry
pub const BANK_SIZE: usize = 572;
pub const BANK_PAGES: usize = BANK_SIZE / crate::constants::PAGE_SIZE;
/// Pages moved by one bank read or write
pub const CHUNK_PAGES: usize = 14;
