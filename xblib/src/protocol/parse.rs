use nom::error::ErrorKind;
use nom::IResult;

use super::checksum::Checksum;
use super::frames::Frame;
use super::{MAX_FRAME_DATA, START_DELIMITER};

/// Most non-frame bytes kept around for [FrameDecoder::take_discarded].
pub const MAX_DISCARDED: usize = 0x400;

/// A trait for parseable frames.
pub trait FrameParse: Sized {
    /// Parse the body of a frame, given the frame type.
    fn parse_body(typ: u8, input: &[u8]) -> IResult<&[u8], Self>;

    /// Parse frame data: the frame type, then a body that must use
    /// all of the remaining input.
    fn parse_frame_data(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, typ) = nom::number::complete::u8(input)?;
        nom::combinator::all_consuming(move |i| Self::parse_body(typ, i))(input)
    }
}

/// A possible result from [FrameDecoder::feed].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecodeResult {
    /// A complete, checksummed, parsed frame.
    Ok(Frame),
    /// Checksum failed. Holds the frame data and the checksum byte.
    ChecksumErr(Vec<u8>),
    /// Checksum passed, but the frame data did not parse.
    ParseErr(Vec<u8>, ErrorKind),
}

impl DecodeResult {
    pub fn ok(self) -> Option<Frame> {
        match self {
            Self::Ok(f) => Some(f),
            Self::ChecksumErr(_) => None,
            Self::ParseErr(_, _) => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum State {
    /// Looking for a start delimiter.
    Searching,
    /// Delimiter consumed, waiting on the 2-byte length.
    Length,
    /// Waiting on length bytes, frame data, and checksum.
    Body(usize),
}

/// Streaming frame decoder.
///
/// Bytes are fed in whatever chunks the transport provides. Frames
/// that span several chunks, and chunks holding several frames, both
/// decode the same as one contiguous feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    state: State,
    max_len: usize,
    discarded: Vec<u8>,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_len(MAX_FRAME_DATA)
    }

    /// A decoder that treats declared lengths above `max_len` as
    /// corruption.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            state: State::Searching,
            max_len: max_len.min(MAX_FRAME_DATA),
            discarded: Vec::new(),
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Number of bytes held for a frame still being accumulated.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Add bytes, and iterate over every result they complete.
    ///
    /// Dropping the iterator early is fine. Remaining frames are
    /// produced by the next call.
    pub fn feed(&mut self, data: &[u8]) -> Frames<'_> {
        self.buffer.extend_from_slice(data);
        Frames { decoder: self }
    }

    /// Take the bytes skipped while searching for a start delimiter.
    ///
    /// Only the most recent [MAX_DISCARDED] bytes are kept.
    pub fn take_discarded(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.discarded)
    }

    /// Drop all partial state and discarded bytes.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.discarded.clear();
        self.state = State::Searching;
    }

    fn discard(&mut self, count: usize) {
        self.discarded.extend(self.buffer.drain(..count));
        if self.discarded.len() > MAX_DISCARDED {
            let excess = self.discarded.len() - MAX_DISCARDED;
            self.discarded.drain(..excess);
        }
    }

    /// Produce the next result from buffered data, if there is one.
    pub fn next_result(&mut self) -> Option<DecodeResult> {
        loop {
            match self.state {
                State::Searching => {
                    match self.buffer.iter().position(|b| *b == START_DELIMITER) {
                        Some(start) => {
                            self.discard(start);
                            // the delimiter itself is consumed, so
                            // resync starts one byte past it
                            self.buffer.remove(0);
                            self.state = State::Length;
                        }
                        None => {
                            self.discard(self.buffer.len());
                            return None;
                        }
                    }
                }
                State::Length => {
                    if self.buffer.len() < 2 {
                        return None;
                    }
                    let len = u16::from_be_bytes([self.buffer[0], self.buffer[1]]) as usize;
                    if len == 0 || len > self.max_len {
                        tracing::debug!(len, max = self.max_len, "bad frame length, resyncing");
                        self.state = State::Searching;
                        continue;
                    }
                    self.state = State::Body(len);
                }
                State::Body(len) => {
                    // length, frame data, checksum
                    let total = 2 + len + 1;
                    if self.buffer.len() < total {
                        return None;
                    }
                    self.state = State::Searching;

                    let data = &self.buffer[2..2 + len];
                    let provided = self.buffer[2 + len];
                    let mut digest = Checksum::new();
                    digest.update(data);
                    if !digest.validate(provided) {
                        // leave the candidate in place, it gets rescanned
                        let raw = self.buffer[2..total].to_vec();
                        tracing::debug!(
                            len,
                            provided,
                            expected = digest.finalize(),
                            "checksum mismatch"
                        );
                        return Some(DecodeResult::ChecksumErr(raw));
                    }

                    let data: Vec<u8> = self.buffer.drain(..total).skip(2).take(len).collect();
                    let parsed = match Frame::parse_frame_data(&data) {
                        Ok((_, frame)) => Ok(frame),
                        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(e.code),
                        Err(nom::Err::Incomplete(_)) => Err(ErrorKind::Complete),
                    };
                    return Some(match parsed {
                        Ok(frame) => DecodeResult::Ok(frame),
                        Err(kind) => DecodeResult::ParseErr(data, kind),
                    });
                }
            }
        }
    }
}

/// Iterator over results completed by a [FrameDecoder::feed].
#[derive(Debug)]
pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
}

impl<'a> Iterator for Frames<'a> {
    type Item = DecodeResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.next_result()
    }
}
