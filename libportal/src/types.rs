// libportal/src/types.rs

use std::convert::TryFrom;
use std::fmt;

use crate::Error;
use crate::constants::TOKEN_SIZE;

/// USB vendor known to the driver registry by a short alias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vendor {
    alias: &'static str,
    id: u16,
}

impl Vendor {
    pub const fn new(alias: &'static str, id: u16) -> Self {
        Self { alias, id }
    }

    pub fn alias(&self) -> &'static str {
        self.alias
    }

    pub fn id(&self) -> u16 {
        self.id
    }
}

/// USB product known to the driver registry by a short alias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Product {
    alias: &'static str,
    id: u16,
}

impl Product {
    pub const fn new(alias: &'static str, id: u16) -> Self {
        Self { alias, id }
    }

    pub fn alias(&self) -> &'static str {
        self.alias
    }

    pub fn id(&self) -> u16 {
        self.id
    }
}

/// USB interface selection handed to the transport at connect time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UsbSetup {
    pub config: u8,
    pub interface: u8,
    pub alt_setting: u8,
    pub in_endpoint: u8,
    pub out_endpoint: u8,
}

/// Serial port selection handed to the transport at connect time
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerialSetup {
    pub port: String,
    pub baud: u32,
}

/// Physical channel configuration produced by a driver
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceSetup {
    Usb(UsbSetup),
    Serial(SerialSetup),
}

/// Token presence as seen by the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenState {
    #[default]
    Absent,
    Present,
}

/// Token UID - Newtype Pattern (4, 7 or 10 bytes)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uid(Vec<u8>);

impl Uid {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        crate::utils::bytes_to_hex(&self.0)
    }
}

impl TryFrom<&[u8]> for Uid {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match bytes.len() {
            4 | 7 | 10 => Ok(Self(bytes.to_vec())),
            n => Err(Error::InvalidLength {
                expected: if n < 7 { 4 } else { 10 },
                actual: n,
            }),
        }
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::utils::bytes_to_hex_spaced(&self.0))
    }
}

/// Complete token image (540 bytes). The content is opaque to this crate.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenData([u8; TOKEN_SIZE]);

impl TokenData {
    pub fn from_bytes(bytes: [u8; TOKEN_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TOKEN_SIZE] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Four byte page `index` of the image
    pub fn page(&self, index: usize) -> Option<&[u8]> {
        let start = index * crate::constants::PAGE_SIZE;
        self.0.get(start..start + crate::constants::PAGE_SIZE)
    }
}

impl TryFrom<&[u8]> for TokenData {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != TOKEN_SIZE {
            return Err(Error::InvalidLength {
                expected: TOKEN_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; TOKEN_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for TokenData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TokenData")
            .field(&crate::utils::bytes_to_hex(&self.0[..8]))
            .finish()
    }
}
