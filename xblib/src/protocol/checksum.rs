/// Running checksum over frame data, the bytes between the length
/// field and the checksum byte.
///
/// The checksum byte is `0xff` minus the low byte of the sum of the
/// frame data, so a valid frame's data plus its checksum always sums
/// to `0xff`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Checksum(u8);

impl Checksum {
    pub const fn new() -> Self {
        Self(0)
    }

    pub fn update(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = self.0.wrapping_add(*b);
        }
    }

    /// The checksum byte that belongs after the data seen so far.
    pub fn finalize(self) -> u8 {
        0xff - self.0
    }

    /// Check a received checksum byte against the data seen so far.
    pub fn validate(self, provided: u8) -> bool {
        self.0.wrapping_add(provided) == 0xff
    }
}

/// Compute the checksum byte for a complete block of frame data.
pub fn checksum(data: &[u8]) -> u8 {
    let mut digest = Checksum::new();
    digest.update(data);
    digest.finalize()
}
