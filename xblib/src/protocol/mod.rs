/// Marks the start of every API frame.
pub const START_DELIMITER: u8 = 0x7e;

/// Largest frame data (frame type through payload) the length field
/// can describe.
pub const MAX_FRAME_DATA: usize = u16::MAX as usize;

/// Factory default baud rate for XBee modules.
pub const BAUD_RATE: u32 = 9600;

pub mod checksum;
pub use checksum::Checksum;

pub mod parse;
pub use parse::{DecodeResult, FrameDecoder, FrameParse};

mod frames;
pub use frames::*;

pub mod serialize;
pub use serialize::FrameSerialize;

/// Encode a frame into its complete wire form, with start delimiter,
/// length, and checksum.
///
/// Fails if the frame data does not fit in the length field. Nothing
/// is produced in that case.
pub fn encode<M>(frame: &M) -> crate::Result<Vec<u8>>
where
    M: FrameSerialize + ?Sized,
{
    frame.encode()
}

/// Decode the first complete frame found in a byte slice.
///
/// Checksum and parse failures are skipped. For streams, use a
/// [FrameDecoder] instead.
pub fn decode(data: &[u8]) -> Option<Frame> {
    FrameDecoder::new().feed(data).find_map(DecodeResult::ok)
}
