use std::convert::Infallible;

use super::checksum::Checksum;
use super::{MAX_FRAME_DATA, START_DELIMITER};

/// A trait for serializing frames.
pub trait Serializer {
    type Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error>;

    // everything else can be written in terms of write_u8

    // Note: they *should* be specialized in SerializerLength and
    // &mut S, so if you add a method here, add one there.

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        for b in val.iter() {
            self.write_u8(*b)?;
        }
        Ok(())
    }

    fn write_be_u16(&mut self, val: u16) -> Result<(), Self::Error> {
        self.write_bytes(&val.to_be_bytes())
    }

    fn write_be_u64(&mut self, val: u64) -> Result<(), Self::Error> {
        self.write_bytes(&val.to_be_bytes())
    }
}

impl<S> Serializer for &mut S
where
    S: Serializer,
{
    type Error = S::Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        (*self).write_u8(val)
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        (*self).write_bytes(val)
    }

    fn write_be_u16(&mut self, val: u16) -> Result<(), Self::Error> {
        (*self).write_be_u16(val)
    }

    fn write_be_u64(&mut self, val: u64) -> Result<(), Self::Error> {
        (*self).write_be_u64(val)
    }
}

/// A serializer that collects bytes into a [Vec].
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SerializerVec {
    inner: Vec<u8>,
}

impl SerializerVec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    pub fn done(self) -> Vec<u8> {
        self.inner
    }
}

impl Serializer for SerializerVec {
    type Error = Infallible;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        self.inner.push(val);
        Ok(())
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        self.inner.extend_from_slice(val);
        Ok(())
    }
}

/// A serializer that only counts bytes written.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SerializerLength {
    len: usize,
}

impl SerializerLength {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Serializer for SerializerLength {
    type Error = Infallible;

    fn write_u8(&mut self, _val: u8) -> Result<(), Self::Error> {
        self.len += 1;
        Ok(())
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        self.len += val.len();
        Ok(())
    }

    fn write_be_u16(&mut self, _val: u16) -> Result<(), Self::Error> {
        self.len += 2;
        Ok(())
    }

    fn write_be_u64(&mut self, _val: u64) -> Result<(), Self::Error> {
        self.len += 8;
        Ok(())
    }
}

/// A serializer that also computes a frame checksum on the side.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerializerChecksum<T> {
    digest: Checksum,
    inner: T,
}

impl<T> SerializerChecksum<T> {
    pub fn new(inner: T) -> Self {
        Self {
            digest: Checksum::new(),
            inner,
        }
    }

    pub fn finalize(self) -> (u8, T) {
        (self.digest.finalize(), self.inner)
    }
}

impl<T> std::ops::Deref for SerializerChecksum<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> std::ops::DerefMut for SerializerChecksum<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<T> Serializer for SerializerChecksum<T>
where
    T: Serializer,
{
    type Error = T::Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        self.digest.update(&[val]);
        self.inner.write_u8(val)
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        self.digest.update(val);
        self.inner.write_bytes(val)
    }
}

/// A trait for serializing frames.
pub trait FrameSerialize {
    /// The API frame type byte.
    fn frame_type(&self) -> u8;

    /// Serialize everything after the frame type byte.
    ///
    /// For this to work correctly, it *must* perform the same actions
    /// every time it is called with the same frame. That means no
    /// IO, no funny business.
    fn frame_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer;

    // these can all use default implementations

    /// Serialize the frame data: frame type, then body.
    fn frame_data<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_u8(self.frame_type())?;
        self.frame_body(ser)
    }

    /// Length of the frame data, as written in the length field.
    fn frame_data_len(&self) -> usize {
        let mut len_ser = SerializerLength::new();
        self.frame_data(&mut len_ser).unwrap_or_else(|e| match e {});
        len_ser.len()
    }

    /// Serialize into a full frame, with start delimiter, length and
    /// checksum.
    ///
    /// The length is checked before anything is produced.
    fn encode(&self) -> crate::Result<Vec<u8>> {
        let len = self.frame_data_len();
        if len > MAX_FRAME_DATA {
            return Err(crate::Error::FrameTooLong(len));
        }

        // frame is start, len, checksummed(data), checksum
        let mut ser = SerializerVec::with_capacity(len + 4);
        ser.write_u8(START_DELIMITER).unwrap_or_else(|e| match e {});
        ser.write_be_u16(len as u16).unwrap_or_else(|e| match e {});

        let mut sum_ser = SerializerChecksum::new(ser);
        self.frame_data(&mut sum_ser).unwrap_or_else(|e| match e {});
        let (sum, mut ser) = sum_ser.finalize();

        ser.write_u8(sum).unwrap_or_else(|e| match e {});
        Ok(ser.done())
    }
}
