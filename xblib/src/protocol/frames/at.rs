//! Local and remote AT command frames.

use nom::IResult;

use crate::protocol::parse::FrameParse;
use crate::protocol::serialize::{FrameSerialize, Serializer};
use crate::Address;

use super::status::CommandStatus;
use super::{util, FrameType, UNKNOWN_16};

/// Remote command option: apply changes immediately.
pub const APPLY_CHANGES: u8 = 0x02;

/// 0x08 AT Command, to the local module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtCommand {
    /// 0 means no response is wanted.
    pub frame_id: u8,
    /// Two-letter command name, like `b"ID"`.
    pub command: [u8; 2],
    /// Parameter to set. Empty to query.
    pub parameter: Vec<u8>,
}

impl FrameType for AtCommand {
    const TYPE: u8 = 0x08;
}

impl FrameSerialize for AtCommand {
    fn frame_type(&self) -> u8 {
        Self::TYPE
    }

    fn frame_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_u8(self.frame_id)?;
        ser.write_bytes(&self.command)?;
        ser.write_bytes(&self.parameter)
    }
}

impl FrameParse for AtCommand {
    fn parse_body(typ: u8, input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = util::expect_type(input, typ, Self::TYPE)?;
        let (input, frame_id) = nom::number::complete::u8(input)?;
        let (input, command) = util::parse_command(input)?;
        let (input, parameter) = util::parse_rest(input)?;
        Ok((
            input,
            AtCommand {
                frame_id,
                command,
                parameter,
            },
        ))
    }
}

/// 0x88 AT Command Response, from the local module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtCommandResponse {
    pub frame_id: u8,
    pub command: [u8; 2],
    pub status: CommandStatus,
    /// Register value, for queries.
    pub data: Vec<u8>,
}

impl FrameType for AtCommandResponse {
    const TYPE: u8 = 0x88;
}

impl FrameSerialize for AtCommandResponse {
    fn frame_type(&self) -> u8 {
        Self::TYPE
    }

    fn frame_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_u8(self.frame_id)?;
        ser.write_bytes(&self.command)?;
        ser.write_u8(self.status.into())?;
        ser.write_bytes(&self.data)
    }
}

impl FrameParse for AtCommandResponse {
    fn parse_body(typ: u8, input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = util::expect_type(input, typ, Self::TYPE)?;
        let (input, frame_id) = nom::number::complete::u8(input)?;
        let (input, command) = util::parse_command(input)?;
        let (input, status) = nom::number::complete::u8(input)?;
        let (input, data) = util::parse_rest(input)?;
        Ok((
            input,
            AtCommandResponse {
                frame_id,
                command,
                status: status.into(),
                data,
            },
        ))
    }
}

/// 0x17 Remote AT Command Request, carried over the air.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemoteAtCommand {
    pub frame_id: u8,
    pub destination: Address,
    /// 16-bit network address. [UNKNOWN_16] if not known.
    pub destination_16: u16,
    /// Usually [APPLY_CHANGES].
    pub options: u8,
    pub command: [u8; 2],
    pub parameter: Vec<u8>,
}

impl RemoteAtCommand {
    /// A request that applies its change right away.
    pub fn new(frame_id: u8, destination: Address, command: [u8; 2], parameter: Vec<u8>) -> Self {
        Self {
            frame_id,
            destination,
            destination_16: UNKNOWN_16,
            options: APPLY_CHANGES,
            command,
            parameter,
        }
    }
}

impl FrameType for RemoteAtCommand {
    const TYPE: u8 = 0x17;
}

impl FrameSerialize for RemoteAtCommand {
    fn frame_type(&self) -> u8 {
        Self::TYPE
    }

    fn frame_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_u8(self.frame_id)?;
        util::serialize_address(ser, self.destination)?;
        ser.write_be_u16(self.destination_16)?;
        ser.write_u8(self.options)?;
        ser.write_bytes(&self.command)?;
        ser.write_bytes(&self.parameter)
    }
}

impl FrameParse for RemoteAtCommand {
    fn parse_body(typ: u8, input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = util::expect_type(input, typ, Self::TYPE)?;
        let (input, frame_id) = nom::number::complete::u8(input)?;
        let (input, destination) = util::parse_address(input)?;
        let (input, destination_16) = nom::number::complete::be_u16(input)?;
        let (input, options) = nom::number::complete::u8(input)?;
        let (input, command) = util::parse_command(input)?;
        let (input, parameter) = util::parse_rest(input)?;
        Ok((
            input,
            RemoteAtCommand {
                frame_id,
                destination,
                destination_16,
                options,
                command,
                parameter,
            },
        ))
    }
}

/// 0x97 Remote AT Command Response.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemoteAtCommandResponse {
    pub frame_id: u8,
    pub source: Address,
    pub source_16: u16,
    pub command: [u8; 2],
    pub status: CommandStatus,
    pub data: Vec<u8>,
}

impl FrameType for RemoteAtCommandResponse {
    const TYPE: u8 = 0x97;
}

impl FrameSerialize for RemoteAtCommandResponse {
    fn frame_type(&self) -> u8 {
        Self::TYPE
    }

    fn frame_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_u8(self.frame_id)?;
        util::serialize_address(ser, self.source)?;
        ser.write_be_u16(self.source_16)?;
        ser.write_bytes(&self.command)?;
        ser.write_u8(self.status.into())?;
        ser.write_bytes(&self.data)
    }
}

impl FrameParse for RemoteAtCommandResponse {
    fn parse_body(typ: u8, input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = util::expect_type(input, typ, Self::TYPE)?;
        let (input, frame_id) = nom::number::complete::u8(input)?;
        let (input, source) = util::parse_address(input)?;
        let (input, source_16) = nom::number::complete::be_u16(input)?;
        let (input, command) = util::parse_command(input)?;
        let (input, status) = nom::number::complete::u8(input)?;
        let (input, data) = util::parse_rest(input)?;
        Ok((
            input,
            RemoteAtCommandResponse {
                frame_id,
                source,
                source_16,
                command,
                status: status.into(),
                data,
            },
        ))
    }
}
