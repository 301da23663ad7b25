// libportal/src/constants.rs
//! Common constants shared by every portal driver

/// Size of a complete NTAG215-class token image (user + security memory)
pub const TOKEN_SIZE: usize = 540;

/// Bytes per token page
pub const PAGE_SIZE: usize = 4;

/// Number of pages making up a token image
pub const TOKEN_PAGES: usize = TOKEN_SIZE / PAGE_SIZE;

/// Pages returned by a single read request (4 pages, 16 bytes)
pub const PAGES_PER_READ: usize = 4;

/// Upper bound (exclusive) of the page range walked by a full token read
pub const READ_PAGE_RANGE: usize = 0x88;

/// Attempts per page before a read or write gives up (first try + 2 retries)
pub const MAX_PAGE_ATTEMPTS: usize = 3;

/// Marker a portal places at the start of a response to signal failure
pub const ERROR_MARKER: [u8; 2] = [0x01, 0x02];

/// Consecutive polling errors tolerated before a token counts as removed
pub const DEFAULT_TOTAL_ERRORS: usize = 10;

/// Consecutive polling errors tolerated in optimised mode
pub const OPTIMISED_TOTAL_ERRORS: usize = 3;

/// ISO/IEC 14443-3 CRC_A preset value
pub const CRC_A_PRESET: u16 = 0x6363;

/// ISO/IEC 14443-3 cascade tag, marks an incomplete UID at a cascade level
pub const CASCADE_TAG: u8 = 0x88;

/// SELECT codes for cascade levels 1..=3
pub const SELECT_CODES: [u8; 3] = [0x93, 0x95, 0x97];
