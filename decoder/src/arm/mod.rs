//! Decoding of 32-bit ARM state instruction words.

mod decode;
mod format;

pub use decode::{decode, decode_raw};
pub use format::{FORMAT_MASKS, Format, FormatMask, classify, classify_with};
