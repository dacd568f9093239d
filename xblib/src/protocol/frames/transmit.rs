//! Data transmission frames.

use nom::IResult;

use crate::protocol::parse::FrameParse;
use crate::protocol::serialize::{FrameSerialize, Serializer};
use crate::Address;

use super::status::DeliveryStatus;
use super::{util, FrameType, UNKNOWN_16};

/// 0x10 Transmit Request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransmitRequest {
    /// 0 means no Transmit Status is wanted.
    pub frame_id: u8,
    pub destination: Address,
    /// 16-bit network address. [UNKNOWN_16] if not known.
    pub destination_16: u16,
    /// Maximum hops for broadcasts. 0 is the network maximum.
    pub broadcast_radius: u8,
    pub options: u8,
    pub data: Vec<u8>,
}

impl TransmitRequest {
    /// A request with default radius and options.
    pub fn new(frame_id: u8, destination: Address, data: Vec<u8>) -> Self {
        Self {
            frame_id,
            destination,
            destination_16: UNKNOWN_16,
            broadcast_radius: 0,
            options: 0,
            data,
        }
    }
}

impl FrameType for TransmitRequest {
    const TYPE: u8 = 0x10;
}

impl FrameSerialize for TransmitRequest {
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
        ser.write_u8(self.broadcast_radius)?;
        ser.write_u8(self.options)?;
        ser.write_bytes(&self.data)
    }
}

impl FrameParse for TransmitRequest {
    fn parse_body(typ: u8, input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = util::expect_type(input, typ, Self::TYPE)?;
        let (input, frame_id) = nom::number::complete::u8(input)?;
        let (input, destination) = util::parse_address(input)?;
        let (input, destination_16) = nom::number::complete::be_u16(input)?;
        let (input, broadcast_radius) = nom::number::complete::u8(input)?;
        let (input, options) = nom::number::complete::u8(input)?;
        let (input, data) = util::parse_rest(input)?;
        Ok((
            input,
            TransmitRequest {
                frame_id,
                destination,
                destination_16,
                broadcast_radius,
                options,
                data,
            },
        ))
    }
}

/// 0x8B Transmit Status.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransmitStatus {
    pub frame_id: u8,
    pub destination_16: u16,
    pub retry_count: u8,
    pub delivery: DeliveryStatus,
    pub discovery: u8,
}

impl FrameType for TransmitStatus {
    const TYPE: u8 = 0x8b;
}

impl FrameSerialize for TransmitStatus {
    fn frame_type(&self) -> u8 {
        Self::TYPE
    }

    fn frame_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_u8(self.frame_id)?;
        ser.write_be_u16(self.destination_16)?;
        ser.write_u8(self.retry_count)?;
        ser.write_u8(self.delivery.0)?;
        ser.write_u8(self.discovery)
    }
}

impl FrameParse for TransmitStatus {
    fn parse_body(typ: u8, input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = util::expect_type(input, typ, Self::TYPE)?;
        let (input, frame_id) = nom::number::complete::u8(input)?;
        let (input, destination_16) = nom::number::complete::be_u16(input)?;
        let (input, retry_count) = nom::number::complete::u8(input)?;
        let (input, delivery) = nom::number::complete::u8(input)?;
        let (input, discovery) = nom::number::complete::u8(input)?;
        Ok((
            input,
            TransmitStatus {
                frame_id,
                destination_16,
                retry_count,
                delivery: DeliveryStatus(delivery),
                discovery,
            },
        ))
    }
}

/// 0x90 Receive Packet, unsolicited data from another radio.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReceivePacket {
    pub source: Address,
    pub source_16: u16,
    pub options: u8,
    pub data: Vec<u8>,
}

impl ReceivePacket {
    /// Receive option bit: packet was a broadcast.
    pub const BROADCAST: u8 = 0x02;

    pub fn is_broadcast(&self) -> bool {
        self.options & Self::BROADCAST != 0
    }
}

impl FrameType for ReceivePacket {
    const TYPE: u8 = 0x90;
}

impl FrameSerialize for ReceivePacket {
    fn frame_type(&self) -> u8 {
        Self::TYPE
    }

    fn frame_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        util::serialize_address(ser, self.source)?;
        ser.write_be_u16(self.source_16)?;
        ser.write_u8(self.options)?;
        ser.write_bytes(&self.data)
    }
}

impl FrameParse for ReceivePacket {
    fn parse_body(typ: u8, input: &[u8]) -> IResult<&[u8], Self> {
        let (input, _) = util::expect_type(input, typ, Self::TYPE)?;
        let (input, source) = util::parse_address(input)?;
        let (input, source_16) = nom::number::complete::be_u16(input)?;
        let (input, options) = nom::number::complete::u8(input)?;
        let (input, data) = util::parse_rest(input)?;
        Ok((
            input,
            ReceivePacket {
                source,
                source_16,
                options,
                data,
            },
        ))
    }
}
