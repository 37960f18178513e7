//! Masking, extraction, insertion and sign extension over [`Unsigned`] values.
//!
//! Every operation comes in two flavours. The checked one is total: ranges and
//! widths reaching past the value are clamped to the documented result. The
//! `_unchecked` one skips those checks and is only meant for ranges already
//! known to fit, such as packed layout fields; feeding it an out-of-range
//! argument gives an unspecified value but never panics.

use super::index::{BitIndex, BitRange, BitSize};
use super::unsigned::{BitShiftAmount, Raw, Unsigned};

/// Converts a bit count to a shift amount; counts that don't fit saturate.
fn shift_of(bits: usize) -> u32 {
    u32::try_from(bits).unwrap_or(u32::MAX)
}

/// Low `width` bits set. Saturates to all ones once `width` reaches the size of `T`.
#[must_use]
pub fn mask<T: Raw>(width: BitSize) -> Unsigned<T> {
    if width.get() >= T::BITS {
        return Unsigned::MAX;
    }
    mask_unchecked(width)
}

/// Same as [`mask`] for `width < T::BITS`.
#[must_use]
pub fn mask_unchecked<T: Raw>(width: BitSize) -> Unsigned<T> {
    Unsigned::from_raw(
        T::ONE
            .wrapping_shl(shift_of(width.get()))
            .wrapping_sub(T::ONE),
    )
}

impl BitRange {
    /// Ones over the range, zeros elsewhere. Bits past the top of `T` are dropped.
    #[must_use]
    pub fn make_mask<T: Raw>(self) -> Unsigned<T> {
        let Some(begin) = shift_amount::<T>(self.begin()) else {
            return Unsigned::ZERO;
        };
        mask::<T>(self.size()) << begin
    }

    /// Same as [`BitRange::make_mask`] for ranges that start and are narrower than `T`.
    #[must_use]
    pub fn make_mask_unchecked<T: Raw>(self) -> Unsigned<T> {
        Unsigned::from_raw(
            mask_unchecked::<T>(self.size())
                .into_raw()
                .wrapping_shl(shift_of(self.begin().get())),
        )
    }
}

/// Shift amount for `index` when it lies inside `T`.
fn shift_amount<T: Raw>(index: BitIndex) -> Option<BitShiftAmount> {
    if index.get() >= T::BITS {
        return None;
    }
    u8::try_from(index.get()).ok().map(BitShiftAmount::new)
}

/// Bits of `value` under `range`, moved down to bit 0.
///
/// A range starting past the top of `value` extracts zero, a range running past
/// it extracts whatever bits exist.
#[must_use]
pub fn extract<T: Raw>(value: Unsigned<T>, range: BitRange) -> Unsigned<T> {
    let Some(begin) = shift_amount::<T>(range.begin()) else {
        return Unsigned::ZERO;
    };
    (value >> begin) & mask::<T>(range.size())
}

#[must_use]
pub fn extract_unchecked<T: Raw>(value: Unsigned<T>, range: BitRange) -> Unsigned<T> {
    Unsigned::from_raw(
        value.into_raw().wrapping_shr(shift_of(range.begin().get()))
            & mask_unchecked::<T>(range.size()).into_raw(),
    )
}

/// Whether the bit at `index` is set; indexes past the top read as unset.
#[must_use]
pub fn bit_at<T: Raw>(value: Unsigned<T>, index: BitIndex) -> bool {
    extract(value, BitRange::new(index, BitSize::new(1))) != Unsigned::ZERO
}

#[must_use]
pub fn bit_at_unchecked<T: Raw>(value: Unsigned<T>, index: BitIndex) -> bool {
    extract_unchecked(value, BitRange::new(index, BitSize::new(1))) != Unsigned::ZERO
}

/// Replaces the bits of `destination` under `range` with the low bits of `source`.
///
/// Source bits beyond the range size are ignored, and so are the parts of the
/// range that lie past the top of `destination`.
#[must_use]
pub fn insert<T: Raw>(destination: Unsigned<T>, source: Unsigned<T>, range: BitRange) -> Unsigned<T> {
    let Some(begin) = shift_amount::<T>(range.begin()) else {
        return destination;
    };
    let kept = destination & !range.make_mask::<T>();
    let placed = (source & mask::<T>(range.size())) << begin;
    kept | placed
}

#[must_use]
pub fn insert_unchecked<T: Raw>(
    destination: Unsigned<T>,
    source: Unsigned<T>,
    range: BitRange,
) -> Unsigned<T> {
    let begin = shift_of(range.begin().get());
    let kept = destination.into_raw() & !range.make_mask_unchecked::<T>().into_raw();
    let placed = (source.into_raw() & mask_unchecked::<T>(range.size()).into_raw()).wrapping_shl(begin);
    Unsigned::from_raw(kept | placed)
}

/// Treats the low `width` bits as a two's complement number and widens it to `T`.
///
/// A zero width gives zero, a width covering all of `T` returns `value` as is.
#[must_use]
pub fn sign_extend<T: Raw>(value: Unsigned<T>, width: BitSize) -> Unsigned<T> {
    if width.get() == 0 {
        return Unsigned::ZERO;
    }
    if width.get() >= T::BITS {
        return value;
    }
    sign_extend_unchecked(value, width)
}

/// Same as [`sign_extend`] for `0 < width < T::BITS`.
#[must_use]
pub fn sign_extend_unchecked<T: Raw>(value: Unsigned<T>, width: BitSize) -> Unsigned<T> {
    let value = value.into_raw() & mask_unchecked::<T>(width).into_raw();
    let sign = T::ONE.wrapping_shl(shift_of(width.get().wrapping_sub(1)));

    // Flipping the sign bit and subtracting it back borrows through every upper
    // bit when the sign was set, and cancels out otherwise.
    Unsigned::from_raw((value ^ sign).wrapping_sub(sign))
}
