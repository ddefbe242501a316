use crate::data_group::DataGroup;

#[derive(Debug)]
pub struct DgliDecoder {
    group: DataGroup,
    len: Option<u16>,
}

impl Default for DgliDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DgliDecoder {
    pub fn new() -> Self {
        Self {
            // 2 header bytes + 2 CRC bytes
            group: DataGroup::new(4),
            len: None,
        }
    }

    pub fn reset(&mut self) {
        self.group.reset();
        self.len = None;
    }

    pub fn process_data_subfield(&mut self, start: bool, data: &[u8]) {
        if !self.group.feed(start, data) {
            return;
        }
        if !self.group.ensure_size(4) {
            return;
        }
        if !self.group.check_crc(2) {
            log::debug!("DGLI CRC check failed, discarding");
            self.group.reset();
            return;
        }
        let bytes = self.group.bytes();
        let len = (((bytes[0] & 0x3F) as u16) << 8) | bytes[1] as u16;
        log::trace!("DGLI decoded: next MOT data group length = {len}");
        self.len = Some(len);
        self.group.reset();
    }

    // one-shot: clears the stored value once read
    pub fn take_len(&mut self) -> Option<u16> {
        self.len.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::crc16_ccitt;

    fn dgli_frame(len: u16) -> Vec<u8> {
        let header = [((len >> 8) as u8) & 0x3F, (len & 0xFF) as u8];
        let crc = crc16_ccitt(&header);
        let mut frame = header.to_vec();
        frame.extend_from_slice(&crc.to_be_bytes());
        frame
    }

    #[test]
    fn decodes_announced_length() {
        let mut d = DgliDecoder::new();
        d.process_data_subfield(true, &dgli_frame(321));
        assert_eq!(d.take_len(), Some(321));
        // one-shot: taken value is cleared
        assert_eq!(d.take_len(), None);
    }

    #[test]
    fn bad_crc_yields_no_length() {
        let mut d = DgliDecoder::new();
        let mut frame = dgli_frame(10);
        frame[2] ^= 0xFF;
        d.process_data_subfield(true, &frame);
        assert_eq!(d.take_len(), None);
    }
}
