//! Fixed-width hop addresses.
//!
//! Every layer of an onion starts with the address its recipient forwards
//! to: ten decimal digits, left-padded with zeros. The value is a UDP port
//! on the network host, so anything above 65535 is malformed.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Digits in an encoded address
pub const ADDRESS_WIDTH: usize = 10;

/// Network address of a relay or user inbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(u16);

impl Address {
    /// Wrap a port.
    #[must_use]
    pub const fn new(port: u16) -> Self {
        Self(port)
    }

    /// Address `base + id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::AddressOutOfRange` if the sum exceeds the port range.
    pub fn offset(base: u16, id: u32) -> Result<Self> {
        u32::from(base)
            .checked_add(id)
            .and_then(|port| u16::try_from(port).ok())
            .map(Self)
            .ok_or(Error::AddressOutOfRange { base, id })
    }

    /// Port number.
    #[must_use]
    pub const fn port(self) -> u16 {
        self.0
    }

    /// Split a decrypted layer into its address prefix and the remainder.
    ///
    /// Returns `None` if the text is shorter than [`ADDRESS_WIDTH`] or the
    /// prefix is not a valid address.
    #[must_use]
    pub fn split_prefix(text: &str) -> Option<(Self, &str)> {
        let prefix = text.get(..ADDRESS_WIDTH)?;
        let address = prefix.parse().ok()?;
        Some((address, &text[ADDRESS_WIDTH..]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = ADDRESS_WIDTH)
    }
}

impl From<u16> for Address {
    fn from(port: u16) -> Self {
        Self(port)
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Parse exactly [`ADDRESS_WIDTH`] ASCII digits.
    fn from_str(s: &str) -> Result<Self> {
        if s.len() != ADDRESS_WIDTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::MalformedLayer(format!(
                "address must be {ADDRESS_WIDTH} digits"
            )));
        }

        let value: u64 = s
            .parse()
            .map_err(|_| Error::MalformedLayer("address is not a number".to_string()))?;
        u16::try_from(value)
            .map(Self)
            .map_err(|_| Error::MalformedLayer(format!("address {value} is out of port range")))
    }
}
