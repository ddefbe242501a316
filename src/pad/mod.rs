pub mod dgli;
pub mod dl;

use std::sync::Mutex;

use derive_more::Debug;

use dgli::DgliDecoder;
use dl::{DlDecoder, DlState};

const XPADCI_LEN_LOOKUP: [usize; 8] = [4, 6, 8, 12, 16, 24, 32, 48];

mod kind {
    pub const DGLI: i8 = 1;
    pub const DL_START: i8 = 2;
    pub const DL_CONTINUED: i8 = 3;
    pub const MOT_START: i8 = 12;
    pub const MOT_CONTINUED: i8 = 13;
}

// kind == -1 means absent/inert, mirroring the source's sentinel convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XPadCi {
    pub kind: i8,
    pub len: usize,
}

impl XPadCi {
    fn is_some(&self) -> bool {
        self.kind != -1
    }
}

pub type DynamicLabelObserver = Box<dyn FnMut() + Send>;

// receives raw MOT X-PAD data subfields (CI kind 12/13); `start` is true for kind 12
pub type MotSubfieldHook = Box<dyn FnMut(bool, &[u8]) + Send>;

#[derive(Debug)]
pub struct PadDecoder {
    last_xpad_ci: Option<XPadCi>,
    label: Mutex<DlState>,
    dgli: DgliDecoder,
    dl: DlDecoder,
    #[debug(skip)]
    observer: Option<DynamicLabelObserver>,
    #[debug(skip)]
    mot_hook: Option<MotSubfieldHook>,
}

impl Default for PadDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PadDecoder {
    pub fn new() -> Self {
        Self {
            last_xpad_ci: None,
            label: Mutex::new(DlState::default()),
            dgli: DgliDecoder::new(),
            dl: DlDecoder::new(),
            observer: None,
            mot_hook: None,
        }
    }

    pub fn reset(&mut self) {
        self.last_xpad_ci = None;
        self.dgli.reset();
        self.dl.reset();
        *self.label.lock().unwrap() = DlState::default();
    }

    pub fn set_observer(&mut self, observer: DynamicLabelObserver) {
        self.observer = Some(observer);
    }

    pub fn set_mot_hook(&mut self, hook: MotSubfieldHook) {
        self.mot_hook = Some(hook);
    }

    pub fn dynamic_label(&self) -> DlState {
        self.label.lock().unwrap().clone()
    }

    // one-shot: takes the most recently announced MOT data group length, if any
    pub fn dgli_len(&mut self) -> Option<u16> {
        self.dgli.take_len()
    }

    pub fn process(&mut self, fpad: u16, xpad: &[u8]) {
        let fpad_type = (fpad >> 14) & 0x03;
        if fpad_type != 0 {
            log::trace!("ignoring F-PAD type {fpad_type}");
            return;
        }

        let xpad_ind = (fpad >> 12) & 0x03;
        let ci_flag = fpad & 0x0002 != 0;

        let (ci_list, ci_list_len) = self.build_ci_list(xpad_ind, ci_flag, xpad);

        // cleared unconditionally; only repopulated on a successful dispatch below
        self.last_xpad_ci = None;

        if ci_list.is_empty() {
            return;
        }

        let mut offset = ci_list_len;
        let mut last_dispatched: Option<i8> = None;
        for ci in &ci_list {
            if offset + ci.len > xpad.len() {
                log::debug!(
                    "X-PAD subfield of {} bytes exceeds remaining {} bytes, aborting frame",
                    ci.len,
                    xpad.len() - offset.min(xpad.len())
                );
                return;
            }
            let payload = &xpad[offset..offset + ci.len];
            self.dispatch_ci(ci.kind, payload, ci_flag);
            last_dispatched = Some(ci.kind);
            offset += ci.len;
        }

        self.last_xpad_ci = last_dispatched.and_then(|k| {
            let continued_kind = match k {
                kind::DGLI => Some(kind::DGLI),
                kind::DL_START | kind::DL_CONTINUED => Some(kind::DL_CONTINUED),
                kind::MOT_START | kind::MOT_CONTINUED => Some(kind::MOT_CONTINUED),
                _ => None,
            };
            continued_kind.map(|kind| XPadCi { kind, len: offset })
        });
    }

    fn dispatch_ci(&mut self, ci_kind: i8, payload: &[u8], ci_flag: bool) {
        match ci_kind {
            kind::DGLI => {
                self.dgli.process_data_subfield(ci_flag, payload);
            }
            kind::DL_START | kind::DL_CONTINUED => {
                if let Some(state) = self
                    .dl
                    .process_data_subfield(ci_kind == kind::DL_START, payload)
                {
                    *self.label.lock().unwrap() = state;
                    if let Some(observer) = self.observer.as_mut() {
                        observer();
                    }
                }
            }
            kind::MOT_START | kind::MOT_CONTINUED => {
                if let Some(hook) = self.mot_hook.as_mut() {
                    hook(ci_kind == kind::MOT_START, payload);
                }
            }
            other => {
                log::debug!("unhandled X-PAD CI kind {other}, ignoring");
            }
        }
    }

    // returns (list, list_byte_len)
    fn build_ci_list(&self, xpad_ind: u16, ci_flag: bool, xpad: &[u8]) -> (Vec<XPadCi>, usize) {
        if ci_flag {
            match xpad_ind {
                1 => {
                    // short X-PAD: exactly one CI byte, no end-marker check
                    if xpad.is_empty() {
                        return (Vec::new(), 0);
                    }
                    let ci = XPadCi {
                        kind: (xpad[0] & 0x1F) as i8,
                        len: 3,
                    };
                    (vec![ci], 1)
                }
                2 => {
                    // variable X-PAD: up to 4 CI bytes, terminated by a
                    // kind-0 byte which is consumed but not emitted
                    let mut cis = Vec::with_capacity(4);
                    let mut i = 0;
                    while i < 4 && i < xpad.len() {
                        let b = xpad[i];
                        let ci_kind = b & 0x1F;
                        i += 1;
                        if ci_kind == 0 {
                            break;
                        }
                        cis.push(XPadCi {
                            kind: ci_kind as i8,
                            len: XPADCI_LEN_LOOKUP[((b >> 5) & 0x07) as usize],
                        });
                    }
                    (cis, i)
                }
                _ => (Vec::new(), 0),
            }
        } else {
            match xpad_ind {
                1 | 2 => match self.last_xpad_ci {
                    Some(ci) if ci.is_some() => {
                        let continuation = XPadCi {
                            kind: ci.kind,
                            len: xpad.len(),
                        };
                        (vec![continuation], 0)
                    }
                    _ => (Vec::new(), 0),
                },
                _ => (Vec::new(), 0),
            }
        }
    }
}
