mod index;
mod manipulation;
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]
mod unsigned;

pub use index::{BitIndex, BitRange, BitSize};
pub use manipulation::{
    bit_at, bit_at_unchecked, extract, extract_unchecked, insert, insert_unchecked, mask,
    mask_unchecked, sign_extend, sign_extend_unchecked,
};
pub use unsigned::{BitShiftAmount, Byte, Doubleword, Halfword, Raw, Unsigned, Word};
