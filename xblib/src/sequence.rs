/// Hands out frame ids 1 through 255, wrapping around and never
/// producing 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameIdSequence {
    next: u8,
}

impl Default for FrameIdSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameIdSequence {
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Get the next id for which `in_use` is false.
    ///
    /// Returns [None] if every id is in use.
    pub fn allocate<F>(&mut self, mut in_use: F) -> Option<u8>
    where
        F: FnMut(u8) -> bool,
    {
        for _ in 0..u8::MAX {
            let id = self.next;
            self.next = if id == u8::MAX { 1 } else { id + 1 };
            if !in_use(id) {
                return Some(id);
            }
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wraps_skipping_zero() {
        let mut seq = FrameIdSequence::new();
        let ids: Vec<u8> = (0..256).filter_map(|_| seq.allocate(|_| false)).collect();
        assert_eq!(ids.len(), 256);
        assert_eq!(ids[0], 1);
        assert_eq!(ids[254], 255);
        assert_eq!(ids[255], 1);
        assert!(!ids.contains(&0));
    }

    #[test]
    fn skips_in_use() {
        let mut seq = FrameIdSequence::new();
        assert_eq!(seq.allocate(|id| id < 5), Some(5));
        assert_eq!(seq.allocate(|id| id == 6), Some(7));
    }

    #[test]
    fn full() {
        let mut seq = FrameIdSequence::new();
        assert_eq!(seq.allocate(|_| true), None);
        assert_eq!(seq.allocate(|id| id != 200), Some(200));
    }
}
