//! Frame types used in the protocol.

use nom::IResult;

use crate::protocol::parse::FrameParse;
use crate::protocol::serialize::{FrameSerialize, Serializer};

pub mod at;
pub mod status;
pub mod transmit;
pub mod util;

pub use at::{AtCommand, AtCommandResponse, RemoteAtCommand, RemoteAtCommandResponse};
pub use status::{CommandStatus, DeliveryStatus, ModemStatus, Status};
pub use transmit::{ReceivePacket, TransmitRequest, TransmitStatus};

/// 16-bit network address meaning "unknown, use the 64-bit address".
pub const UNKNOWN_16: u16 = 0xfffe;

/// A trait for frames that have statically-known frame types.
pub trait FrameType {
    const TYPE: u8;
}

/// Any API frame this library understands.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frame {
    /// 0x08 AT Command
    AtCommand(AtCommand),
    /// 0x88 AT Command Response
    AtCommandResponse(AtCommandResponse),
    /// 0x17 Remote AT Command Request
    RemoteAtCommand(RemoteAtCommand),
    /// 0x97 Remote AT Command Response
    RemoteAtCommandResponse(RemoteAtCommandResponse),
    /// 0x10 Transmit Request
    TransmitRequest(TransmitRequest),
    /// 0x8B Transmit Status
    TransmitStatus(TransmitStatus),
    /// 0x90 Receive Packet
    ReceivePacket(ReceivePacket),
    /// 0x8A Modem Status
    ModemStatus(ModemStatus),
}

impl Frame {
    /// The frame id, for frame types that carry one.
    pub fn frame_id(&self) -> Option<u8> {
        match self {
            Self::AtCommand(f) => Some(f.frame_id),
            Self::AtCommandResponse(f) => Some(f.frame_id),
            Self::RemoteAtCommand(f) => Some(f.frame_id),
            Self::RemoteAtCommandResponse(f) => Some(f.frame_id),
            Self::TransmitRequest(f) => Some(f.frame_id),
            Self::TransmitStatus(f) => Some(f.frame_id),
            Self::ReceivePacket(_) => None,
            Self::ModemStatus(_) => None,
        }
    }

    /// The echoed frame id, if this frame answers a request.
    pub fn response_frame_id(&self) -> Option<u8> {
        match self {
            Self::AtCommandResponse(f) => Some(f.frame_id),
            Self::RemoteAtCommandResponse(f) => Some(f.frame_id),
            Self::TransmitStatus(f) => Some(f.frame_id),
            _ => None,
        }
    }
}

impl From<AtCommand> for Frame {
    fn from(f: AtCommand) -> Self {
        Self::AtCommand(f)
    }
}

impl From<AtCommandResponse> for Frame {
    fn from(f: AtCommandResponse) -> Self {
        Self::AtCommandResponse(f)
    }
}

impl From<RemoteAtCommand> for Frame {
    fn from(f: RemoteAtCommand) -> Self {
        Self::RemoteAtCommand(f)
    }
}

impl From<RemoteAtCommandResponse> for Frame {
    fn from(f: RemoteAtCommandResponse) -> Self {
        Self::RemoteAtCommandResponse(f)
    }
}

impl From<TransmitRequest> for Frame {
    fn from(f: TransmitRequest) -> Self {
        Self::TransmitRequest(f)
    }
}

impl From<TransmitStatus> for Frame {
    fn from(f: TransmitStatus) -> Self {
        Self::TransmitStatus(f)
    }
}

impl From<ReceivePacket> for Frame {
    fn from(f: ReceivePacket) -> Self {
        Self::ReceivePacket(f)
    }
}

impl From<ModemStatus> for Frame {
    fn from(f: ModemStatus) -> Self {
        Self::ModemStatus(f)
    }
}

impl FrameSerialize for Frame {
    fn frame_type(&self) -> u8 {
        match self {
            Self::AtCommand(f) => f.frame_type(),
            Self::AtCommandResponse(f) => f.frame_type(),
            Self::RemoteAtCommand(f) => f.frame_type(),
            Self::RemoteAtCommandResponse(f) => f.frame_type(),
            Self::TransmitRequest(f) => f.frame_type(),
            Self::TransmitStatus(f) => f.frame_type(),
            Self::ReceivePacket(f) => f.frame_type(),
            Self::ModemStatus(f) => f.frame_type(),
        }
    }

    fn frame_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::AtCommand(f) => f.frame_body(ser),
            Self::AtCommandResponse(f) => f.frame_body(ser),
            Self::RemoteAtCommand(f) => f.frame_body(ser),
            Self::RemoteAtCommandResponse(f) => f.frame_body(ser),
            Self::TransmitRequest(f) => f.frame_body(ser),
            Self::TransmitStatus(f) => f.frame_body(ser),
            Self::ReceivePacket(f) => f.frame_body(ser),
            Self::ModemStatus(f) => f.frame_body(ser),
        }
    }
}

impl FrameParse for Frame {
    fn parse_body(typ: u8, input: &[u8]) -> IResult<&[u8], Self> {
        use nom::combinator::map;

        match typ {
            AtCommand::TYPE => map(|i| AtCommand::parse_body(typ, i), Self::AtCommand)(input),
            AtCommandResponse::TYPE => map(
                |i| AtCommandResponse::parse_body(typ, i),
                Self::AtCommandResponse,
            )(input),
            RemoteAtCommand::TYPE => map(
                |i| RemoteAtCommand::parse_body(typ, i),
                Self::RemoteAtCommand,
            )(input),
            RemoteAtCommandResponse::TYPE => map(
                |i| RemoteAtCommandResponse::parse_body(typ, i),
                Self::RemoteAtCommandResponse,
            )(input),
            TransmitRequest::TYPE => map(
                |i| TransmitRequest::parse_body(typ, i),
                Self::TransmitRequest,
            )(input),
            TransmitStatus::TYPE => map(
                |i| TransmitStatus::parse_body(typ, i),
                Self::TransmitStatus,
            )(input),
            ReceivePacket::TYPE => {
                map(|i| ReceivePacket::parse_body(typ, i), Self::ReceivePacket)(input)
            }
            ModemStatus::TYPE => map(|i| ModemStatus::parse_body(typ, i), Self::ModemStatus)(input),
            _ => nom::combinator::fail(input),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::protocol::{DecodeResult, FrameDecoder};
    use crate::Address;

    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    impl Arbitrary for Address {
        fn arbitrary(g: &mut Gen) -> Self {
            Address::new(u64::arbitrary(g))
        }
    }

    impl Arbitrary for CommandStatus {
        fn arbitrary(g: &mut Gen) -> Self {
            u8::arbitrary(g).into()
        }
    }

    fn command(g: &mut Gen) -> [u8; 2] {
        [u8::arbitrary(g), u8::arbitrary(g)]
    }

    impl Arbitrary for Frame {
        fn arbitrary(g: &mut Gen) -> Self {
            match u8::arbitrary(g) % 8 {
                0 => AtCommand {
                    frame_id: u8::arbitrary(g),
                    command: command(g),
                    parameter: Vec::arbitrary(g),
                }
                .into(),
                1 => AtCommandResponse {
                    frame_id: u8::arbitrary(g),
                    command: command(g),
                    status: CommandStatus::arbitrary(g),
                    data: Vec::arbitrary(g),
                }
                .into(),
                2 => RemoteAtCommand {
                    frame_id: u8::arbitrary(g),
                    destination: Address::arbitrary(g),
                    destination_16: u16::arbitrary(g),
                    options: u8::arbitrary(g),
                    command: command(g),
                    parameter: Vec::arbitrary(g),
                }
                .into(),
                3 => RemoteAtCommandResponse {
                    frame_id: u8::arbitrary(g),
                    source: Address::arbitrary(g),
                    source_16: u16::arbitrary(g),
                    command: command(g),
                    status: CommandStatus::arbitrary(g),
                    data: Vec::arbitrary(g),
                }
                .into(),
                4 => TransmitRequest {
                    frame_id: u8::arbitrary(g),
                    destination: Address::arbitrary(g),
                    destination_16: u16::arbitrary(g),
                    broadcast_radius: u8::arbitrary(g),
                    options: u8::arbitrary(g),
                    data: Vec::arbitrary(g),
                }
                .into(),
                5 => TransmitStatus {
                    frame_id: u8::arbitrary(g),
                    destination_16: u16::arbitrary(g),
                    retry_count: u8::arbitrary(g),
                    delivery: DeliveryStatus(u8::arbitrary(g)),
                    discovery: u8::arbitrary(g),
                }
                .into(),
                6 => ReceivePacket {
                    source: Address::arbitrary(g),
                    source_16: u16::arbitrary(g),
                    options: u8::arbitrary(g),
                    data: Vec::arbitrary(g),
                }
                .into(),
                _ => ModemStatus {
                    status: u8::arbitrary(g),
                }
                .into(),
            }
        }
    }

    fn roundtrip(frame: &Frame) -> Option<Frame> {
        let encoded = frame.encode().ok()?;
        let mut decoder = FrameDecoder::new();
        let mut results: Vec<_> = decoder.feed(&encoded).collect();
        if results.len() != 1 || decoder.buffered() != 0 {
            return None;
        }
        results.pop().and_then(DecodeResult::ok)
    }

    #[quickcheck]
    fn roundtrip_frame(frame: Frame) -> bool {
        roundtrip(&frame) == Some(frame)
    }

    #[quickcheck]
    fn roundtrip_frame_type(frame: Frame) -> bool {
        let encoded = frame.encode().unwrap();
        encoded[3] == frame.frame_type()
    }

    #[test]
    fn decode_transmit_status_vector() {
        let data = [0x7e, 0x00, 0x07, 0x8b, 0x01, 0xff, 0xfe, 0x00, 0x00, 0x00, 0x76];
        assert_eq!(
            crate::protocol::decode(&data),
            Some(Frame::TransmitStatus(TransmitStatus {
                frame_id: 1,
                destination_16: 0xfffe,
                retry_count: 0,
                delivery: DeliveryStatus::SUCCESS,
                discovery: 0,
            }))
        );
    }

    #[test]
    fn encode_broadcast_ping() {
        let frame = TransmitRequest::new(0x01, Address::BROADCAST, b"ping".to_vec());
        let encoded = frame.encode().unwrap();
        assert_eq!(
            &encoded[..],
            &[
                0x7e, 0x00, 0x12, 0x10, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff,
                0xff, 0xfe, 0x00, 0x00, b'p', b'i', b'n', b'g', 0x45
            ]
        );
    }

    #[test]
    fn response_frame_ids() {
        let status = Frame::from(TransmitStatus {
            frame_id: 7,
            destination_16: UNKNOWN_16,
            retry_count: 0,
            delivery: DeliveryStatus::SUCCESS,
            discovery: 0,
        });
        assert_eq!(status.response_frame_id(), Some(7));

        let request = Frame::from(TransmitRequest::new(7, Address::BROADCAST, vec![]));
        assert_eq!(request.frame_id(), Some(7));
        assert_eq!(request.response_frame_id(), None);

        let packet = Frame::from(ReceivePacket {
            source: Address::new(1),
            source_16: 0,
            options: 0,
            data: vec![],
        });
        assert_eq!(packet.frame_id(), None);
    }
}
