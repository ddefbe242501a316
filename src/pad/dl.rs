use std::collections::BTreeMap;

use crate::data_group::DataGroup;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DlState {
    pub raw: Vec<u8>,
    pub charset: u8,
}

#[derive(Debug, Clone)]
pub struct DlSegment {
    prefix: [u8; 2],
    chars: Vec<u8>,
}

impl DlSegment {
    fn new(prefix: [u8; 2], chars: Vec<u8>) -> Self {
        Self { prefix, chars }
    }

    pub fn toggle(&self) -> bool {
        self.prefix[0] & 0x80 != 0
    }

    pub fn is_first(&self) -> bool {
        self.prefix[0] & 0x40 != 0
    }

    pub fn is_last(&self) -> bool {
        self.prefix[0] & 0x20 != 0
    }

    // 0 for the first segment, else bits 6..4 of the second header byte
    pub fn seg_num(&self) -> u8 {
        if self.is_first() {
            0
        } else {
            (self.prefix[1] >> 4) & 0x07
        }
    }

    // only meaningful on segment 0
    pub fn charset(&self) -> u8 {
        (self.prefix[1] >> 4) & 0x0F
    }

    pub fn chars(&self) -> &[u8] {
        &self.chars
    }
}

// accumulates segments sharing a toggle generation until 0..=last are present
#[derive(Debug, Default)]
pub struct DlReassembler {
    segs: BTreeMap<u8, DlSegment>,
    label_raw: Vec<u8>,
}

impl DlReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_toggle(&self) -> Option<bool> {
        self.segs.values().next().map(|s| s.toggle())
    }

    pub fn add_segment(&mut self, seg: DlSegment) -> bool {
        if let Some(current) = self.current_toggle() {
            if current != seg.toggle() {
                log::debug!("dynamic label toggle flip, discarding partial assembly");
                self.segs.clear();
            }
        }

        let num = seg.seg_num();
        if self.segs.contains_key(&num) {
            log::debug!("duplicate dynamic label segment {num}, dropping");
            return false;
        }
        self.segs.insert(num, seg);
        self.check_complete()
    }

    fn check_complete(&mut self) -> bool {
        let mut last_idx = None;
        for i in 0u8..8 {
            match self.segs.get(&i) {
                Some(seg) => {
                    if seg.is_last() {
                        last_idx = Some(i);
                        break;
                    }
                }
                None => return false,
            }
        }
        let Some(last_idx) = last_idx else {
            return false;
        };
        let mut raw = Vec::new();
        for i in 0..=last_idx {
            raw.extend_from_slice(self.segs[&i].chars());
        }
        self.label_raw = raw;
        true
    }

    pub fn label_raw(&self) -> &[u8] {
        &self.label_raw
    }

    pub fn segment(&self, num: u8) -> Option<&DlSegment> {
        self.segs.get(&num)
    }
}

#[derive(Debug)]
pub struct DlDecoder {
    group: DataGroup,
    reassembler: DlReassembler,
}

impl Default for DlDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DlDecoder {
    pub fn new() -> Self {
        Self {
            // 2 header + up to 16 chars + 2 CRC
            group: DataGroup::new(20),
            reassembler: DlReassembler::new(),
        }
    }

    pub fn reset(&mut self) {
        self.group.reset();
        self.reassembler = DlReassembler::new();
    }

    // returns Some(state) if a new label became available this call (a
    // segment completed the label, or a command reset it)
    pub fn process_data_subfield(&mut self, start: bool, data: &[u8]) -> Option<DlState> {
        if !self.group.feed(start, data) {
            return None;
        }
        if !self.group.ensure_size(2) {
            return None;
        }

        let command = self.group.bytes()[0] & 0x10 != 0;
        if command {
            if !self.group.ensure_size(4) {
                return None;
            }
            if !self.group.check_crc(2) {
                log::debug!("dynamic label command CRC check failed, discarding");
                self.group.reset();
                return None;
            }
            let code = self.group.bytes()[0] & 0x0F;
            self.group.reset();
            return if code == 1 {
                log::trace!("dynamic label remove command received");
                Some(DlState::default())
            } else {
                log::debug!("unknown dynamic label command code {code}, ignoring");
                None
            };
        }

        let field_len = (self.group.bytes()[0] & 0x0F) as usize + 1;
        let real_len = 2 + field_len;
        if !self.group.ensure_size(real_len + 2) {
            return None;
        }
        if !self.group.check_crc(real_len) {
            log::debug!("dynamic label segment CRC check failed, discarding");
            self.group.reset();
            return None;
        }

        let bytes = self.group.bytes();
        let prefix = [bytes[0], bytes[1]];
        let chars = bytes[2..2 + field_len].to_vec();
        self.group.reset();

        let seg = DlSegment::new(prefix, chars);
        if self.reassembler.add_segment(seg) {
            let charset = self.reassembler.segment(0).map(|s| s.charset()).unwrap_or(0);
            Some(DlState {
                raw: self.reassembler.label_raw().to_vec(),
                charset,
            })
        } else {
            None
        }
    }
}
