pub mod crc;
pub mod data_group;
pub mod pad;

pub use pad::dl::DlState;
pub use pad::{DynamicLabelObserver, MotSubfieldHook, PadDecoder, XPadCi};
