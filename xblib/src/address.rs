//! Addresses, network ids, and I/O pins.

use crate::{Error, Result};

/// A 64-bit radio address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address {
    /// Delivered to every radio sharing the network id.
    pub const BROADCAST: Self = Self(0xffff);
    /// The coordinator.
    pub const COORDINATOR: Self = Self(0);

    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::BROADCAST
    }
}

impl From<u64> for Address {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

impl From<Address> for u64 {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

/// Strip an optional `0x`, and check for 1 to `max` hex digits.
fn hex_digits<'a>(s: &'a str, max: usize, what: &str) -> Result<&'a str> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() || digits.len() > max {
        return Err(Error::InvalidArgument(format!(
            "{} must be 1 to {} hex digits: {:?}",
            what, max, s
        )));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidArgument(format!(
            "{} is not hexadecimal: {:?}",
            what, s
        )));
    }
    Ok(digits)
}

impl std::str::FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = hex_digits(s.trim(), 16, "address")?;
        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| Error::InvalidArgument(format!("address {:?}: {}", s, e)))
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// A network id. Radios only talk to radios sharing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetworkId(u16);

impl NetworkId {
    pub const MAX: u16 = 0x7fff;

    pub fn new(id: u16) -> Result<Self> {
        if id > Self::MAX {
            return Err(Error::InvalidArgument(format!(
                "network id {:#06x} out of range 0..={:#06x}",
                id,
                Self::MAX
            )));
        }
        Ok(Self(id))
    }

    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// The `ID` command parameter.
    pub fn to_be_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl TryFrom<u16> for NetworkId {
    type Error = Error;

    fn try_from(id: u16) -> Result<Self> {
        Self::new(id)
    }
}

impl std::str::FromStr for NetworkId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let digits = hex_digits(s.trim(), 4, "network id")?;
        let id = u16::from_str_radix(digits, 16)
            .map_err(|e| Error::InvalidArgument(format!("network id {:?}: {}", s, e)))?;
        Self::new(id)
    }
}

impl core::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

/// A digital I/O pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DioPin {
    Dio0,
    Dio1,
    Dio2,
    Dio3,
    Dio4,
    Dio5,
    Dio6,
    Dio7,
    Dio8,
    Dio9,
    Dio10,
    Dio11,
    Dio12,
}

impl DioPin {
    /// Pin driving the transmitter enable.
    pub const VTX: Self = Self::Dio12;

    pub const ALL: [Self; 13] = [
        Self::Dio0,
        Self::Dio1,
        Self::Dio2,
        Self::Dio3,
        Self::Dio4,
        Self::Dio5,
        Self::Dio6,
        Self::Dio7,
        Self::Dio8,
        Self::Dio9,
        Self::Dio10,
        Self::Dio11,
        Self::Dio12,
    ];

    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(n as usize).copied()
    }

    /// The AT command that configures this pin.
    pub fn at_command(&self) -> [u8; 2] {
        match self.number() {
            n @ 0..=9 => [b'D', b'0' + n],
            n => [b'P', b'0' + (n - 10)],
        }
    }
}

impl core::fmt::Display for DioPin {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "DIO{}", self.number())
    }
}

/// Output level for a digital I/O pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DioLevel {
    High,
    Low,
}

impl DioLevel {
    /// The AT command parameter for this level.
    pub fn parameter(&self) -> u8 {
        match self {
            Self::High => 0x05,
            Self::Low => 0x04,
        }
    }
}

impl From<bool> for DioLevel {
    fn from(on: bool) -> Self {
        if on {
            Self::High
        } else {
            Self::Low
        }
    }
}
