// shared by DgliDecoder and DlDecoder; the two differ only in header
// parsing once enough bytes have accumulated, so the framing, sizing and
// CRC logic below is composed into each rather than put behind a trait

use crate::crc::crc16_ccitt;

#[derive(Debug, Clone)]
pub struct DataGroup {
    raw: Vec<u8>,
    capacity: usize,
    size: usize,
    size_needed: usize,
}

impl DataGroup {
    pub fn new(capacity: usize) -> Self {
        Self {
            raw: vec![0u8; capacity],
            capacity,
            size: 0,
            size_needed: 0,
        }
    }

    pub fn reset(&mut self) {
        self.size = 0;
        self.size_needed = 0;
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn bytes(&self) -> &[u8] {
        &self.raw[..self.size]
    }

    // `start` resets any prior partial. Returns false if the subfield was
    // dropped: continuation with nothing buffered, or already full.
    pub fn feed(&mut self, start: bool, data: &[u8]) -> bool {
        if start {
            self.reset();
        } else if self.size == 0 {
            log::debug!("data group continuation with no start, dropping");
            return false;
        }

        if self.size_needed != 0 && self.size >= self.size_needed {
            log::debug!("data group already holds size_needed bytes, dropping extra subfield");
            return false;
        }

        if self.size >= self.capacity {
            log::debug!("data group at capacity, dropping subfield");
            return false;
        }

        let take = data.len().min(self.capacity - self.size);
        if take < data.len() {
            log::warn!(
                "data group subfield truncated to fit capacity ({} of {} bytes kept)",
                take,
                data.len()
            );
        }
        self.raw[self.size..self.size + take].copy_from_slice(&data[..take]);
        self.size += take;
        true
    }

    pub fn needs_more(&self) -> bool {
        self.size_needed != 0 && self.size < self.size_needed
    }

    // declares that `n` bytes are required before decoding can proceed;
    // returns true if that many bytes are already present
    pub fn ensure_size(&mut self, n: usize) -> bool {
        if self.size < n {
            self.size_needed = n;
            false
        } else {
            true
        }
    }

    // validates the trailing big-endian CRC-16-CCITT over raw[0..len]
    // against raw[len..len+2]; requires at least len+2 bytes present
    pub fn check_crc(&self, len: usize) -> bool {
        if self.size < len + 2 {
            return false;
        }
        let expected = u16::from_be_bytes([self.raw[len], self.raw[len + 1]]);
        crc16_ccitt(&self.raw[..len]) == expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_respects_capacity() {
        let mut g = DataGroup::new(4);
        assert!(g.feed(true, &[1, 2, 3, 4, 5, 6]));
        assert_eq!(g.bytes(), &[1, 2, 3, 4]);
        // further feeds without a start are dropped once at capacity
        assert!(!g.feed(false, &[9]));
    }

    #[test]
    fn continuation_without_start_is_dropped() {
        let mut g = DataGroup::new(8);
        assert!(!g.feed(false, &[1, 2]));
        assert_eq!(g.len(), 0);
    }

    #[test]
    fn start_resets_prior_partial() {
        let mut g = DataGroup::new(8);
        assert!(g.feed(true, &[1, 2]));
        assert!(g.feed(true, &[9]));
        assert_eq!(g.bytes(), &[9]);
    }

    #[test]
    fn ensure_size_gate() {
        let mut g = DataGroup::new(8);
        g.feed(true, &[1, 2]);
        assert!(!g.ensure_size(4));
        assert!(g.needs_more());
        g.feed(false, &[3, 4]);
        assert!(g.ensure_size(4));
        assert!(!g.needs_more());
    }

    #[test]
    fn crc_round_trip() {
        let mut g = DataGroup::new(8);
        let payload = [0xAAu8, 0xBB];
        let crc = crc16_ccitt(&payload);
        let mut frame = payload.to_vec();
        frame.extend_from_slice(&crc.to_be_bytes());
        g.feed(true, &frame);
        assert!(g.check_crc(2));
        // corrupt one payload byte, CRC must now fail
        let mut bad = frame.clone();
        bad[0] ^= 0xFF;
        let mut g2 = DataGroup::new(8);
        g2.feed(true, &bad);
        assert!(!g2.check_crc(2));
    }
}
