//! Status codes reported by the module, and the modem status frame.

use nom::IResult;

use crate::protocol::parse::FrameParse;
use crate::protocol::serialize::{FrameSerialize, Serializer};

use super::{util, FrameType};

/// Status of an AT command, local or remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandStatus {
    Ok,
    Error,
    InvalidCommand,
    InvalidParameter,
    /// Remote commands only: the request never reached the remote.
    TransmissionFailure,
    Other(u8),
}

impl CommandStatus {
    pub fn is_ok(&self) -> bool {
        *self == Self::Ok
    }
}

impl From<u8> for CommandStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::Error,
            2 => Self::InvalidCommand,
            3 => Self::InvalidParameter,
            4 => Self::TransmissionFailure,
            other => Self::Other(other),
        }
    }
}

impl From<CommandStatus> for u8 {
    fn from(status: CommandStatus) -> Self {
        match status {
            CommandStatus::Ok => 0,
            CommandStatus::Error => 1,
            CommandStatus::InvalidCommand => 2,
            CommandStatus::InvalidParameter => 3,
            CommandStatus::TransmissionFailure => 4,
            CommandStatus::Other(other) => other,
        }
    }
}

impl core::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Error => write!(f, "error"),
            Self::InvalidCommand => write!(f, "invalid command"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::TransmissionFailure => write!(f, "transmission failure"),
            Self::Other(code) => write!(f, "status {:#04x}", code),
        }
    }
}

/// Delivery status of a transmit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeliveryStatus(pub u8);

impl DeliveryStatus {
    pub const SUCCESS: Self = Self(0x00);

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }

    /// Description of the status, if it's one we know.
    pub fn description(&self) -> Option<&'static str> {
        Some(match self.0 {
            0x00 => "success",
            0x01 => "MAC ACK failure",
            0x02 => "CCA/LBT failure",
            0x03 => "indirect message unrequested",
            0x15 => "invalid destination endpoint",
            0x21 => "network ACK failure",
            0x22 => "not joined to network",
            0x23 => "self-addressed",
            0x24 => "address not found",
            0x25 => "route not found",
            0x26 => "broadcast relay not heard",
            0x2b => "invalid binding table index",
            0x2c => "resource error",
            0x31 => "internal resource error",
            0x32 => "resource error",
            0x74 => "payload too large",
            0x75 => "indirect message unrequested",
            _ => return None,
        })
    }
}

impl core::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.description() {
            Some(desc) => write!(f, "{} ({:#04x})", desc, self.0),
            None => write!(f, "delivery status {:#04x}", self.0),
        }
    }
}

/// A failure status reported by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    Command(CommandStatus),
    Delivery(DeliveryStatus),
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::Command(s) => write!(f, "command {}", s),
            Self::Delivery(s) => s.fmt(f),
        }
    }
}

/// 0x8A Modem Status, unsolicited.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModemStatus {
    pub status: u8,
}

impl ModemStatus {
    pub fn description(&self) -> Option<&'static str> {
        Some(match self.status {
            0x00 => "hardware reset",
            0x01 => "watchdog timer reset",
            0x02 => "joined network",
            0x03 => "disassociated",
            0x06 => "coordinator started",
            0x0b => "network woke up",
            0x0c => "network went to sleep",
            _ => return None,
        })
    }
}

impl core::fmt::Display for ModemStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.description() {
            Some(desc) => write!(f, "{} ({:#04x})", desc, self.status),
            None => write!(f, "modem status {:#04x}", self.status),
        }
    }
}

impl FrameType for ModemStatus {
    const TYPE: u8 = 0x8a;
}

impl FrameSerialize for ModemStatus {
    fn frame_type(&self) -> u8 {
        Self::TYPE
    }

    fn frame_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_u8(self.status)
    }
}

impl FrameParse for ModemStatus {
    fn parse_body(typ: u8, input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = util::expect_type(input, typ, Self::TYPE)?;
        let (input, status) = nom::number::complete::u8(input)?;
        Ok((input, ModemStatus { status }))
    }
}
