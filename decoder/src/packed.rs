//! Fixed bit layouts over a single unsigned value.
//!
//! A layout is declared once with `packed_struct!`, naming each field, its type
//! and its `[offset, width]` inside the underlying value. The macro generates a
//! `Copy` newtype with an eager constructor, one accessor per field and a
//! `fields()` method reading them all at once. Field types go through
//! [`PackedField`], so reading a field whose bits fall outside its type's domain
//! is reported as [`DecodeError::InvalidField`] instead of being misread, and
//! constructing with a value too wide for its field is reported as
//! [`DecodeError::FieldOverflow`] instead of being cut down to another value.
//!
//! Layout mistakes (a field starting or ending past the underlying value,
//! a field wider than its type, two fields overlapping) fail to compile.

use crate::DecodeError;
use crate::bitwise::{
    BitIndex, BitRange, BitShiftAmount, BitSize, Raw, Unsigned, extract, extract_unchecked,
    insert, insert_unchecked,
};

/// A value that can be stored in a packed field.
pub trait PackedField: Copy {
    /// Width of the value's own representation; a field can't be wider.
    const BITS: usize;

    fn to_bits(self) -> u64;

    /// `None` when `bits` doesn't encode a value of this type.
    fn from_bits(bits: u64) -> Option<Self>;
}

/// A generated layout, seen through its underlying value.
pub trait Packed: Copy {
    type Underlying;
    const FIELD_COUNT: usize;

    fn from_underlying(underlying: Self::Underlying) -> Self;
    fn to_underlying(self) -> Self::Underlying;
}

impl PackedField for bool {
    const BITS: usize = 8;

    fn to_bits(self) -> u64 {
        u64::from(self)
    }

    fn from_bits(bits: u64) -> Option<Self> {
        match bits {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}

impl<T: Raw> PackedField for Unsigned<T> {
    const BITS: usize = T::BITS;

    fn to_bits(self) -> u64 {
        self.widen()
    }

    fn from_bits(bits: u64) -> Option<Self> {
        Some(Self::truncate(bits))
    }
}

impl PackedField for BitShiftAmount {
    const BITS: usize = 8;

    fn to_bits(self) -> u64 {
        u64::from(self.get())
    }

    fn from_bits(bits: u64) -> Option<Self> {
        u8::try_from(bits).ok().map(Self::new)
    }
}

/// Implements [`PackedField`] for a fieldless `#[repr(u8)]` enum with a
/// `from_repr(u8) -> Option<Self>` constructor.
macro_rules! packed_enum {
    ($($name:ty),+ $(,)?) => {
        $(
            impl $crate::packed::PackedField for $name {
                const BITS: usize = 8;

                fn to_bits(self) -> u64 {
                    u64::from(self as u8)
                }

                fn from_bits(bits: u64) -> Option<Self> {
                    u8::try_from(bits).ok().and_then(Self::from_repr)
                }
            }
        )+
    };
}

pub(crate) use packed_enum;

const fn field_range(offset: usize, width: usize) -> BitRange {
    BitRange::new(BitIndex::new(offset), BitSize::new(width))
}

/// Whether `bits` can be stored in `width` bits without losing any.
const fn fits(bits: u64, width: usize) -> bool {
    width >= 64 || bits >> width == 0
}

/// Writes `value` into `underlying` at `[offset, offset + width)`.
pub(crate) fn pack_field<T: Raw, F: PackedField>(
    underlying: Unsigned<T>,
    value: F,
    offset: usize,
    width: usize,
    field: &'static str,
) -> Result<Unsigned<T>, DecodeError> {
    let bits = value.to_bits();
    if !fits(bits, width) {
        tracing::debug!(field, bits, width, "value does not fit its packed field");
        return Err(DecodeError::FieldOverflow { field, bits });
    }

    let bits = Unsigned::truncate(bits);
    let range = field_range(offset, width);
    Ok(if width < T::BITS {
        insert_unchecked(underlying, bits, range)
    } else {
        insert(underlying, bits, range)
    })
}

/// Reads the field at `[offset, offset + width)` of `underlying`.
pub(crate) fn unpack_field<T: Raw, F: PackedField>(
    underlying: Unsigned<T>,
    offset: usize,
    width: usize,
    field: &'static str,
) -> Result<F, DecodeError> {
    let range = field_range(offset, width);
    let bits = if width < T::BITS {
        extract_unchecked(underlying, range)
    } else {
        extract(underlying, range)
    }
    .widen();

    F::from_bits(bits).ok_or_else(|| {
        tracing::debug!(field, bits, "packed field holds an out of domain value");
        DecodeError::InvalidField { field, bits }
    })
}

macro_rules! packed_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident: $underlying:ty {
            $(
                $(#[$field_meta:meta])*
                $field:ident: $ty:ty = [$offset:literal, $width:literal]
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis struct $name($underlying);

        const _: () = {
            let underlying_bits = <$underlying>::BITS.get();
            let mut occupied: u128 = 0;
            $(
                assert!(
                    $offset < underlying_bits,
                    concat!(stringify!($name), "::", stringify!($field), " starts past the underlying value")
                );
                assert!(
                    $offset + $width <= underlying_bits,
                    concat!(stringify!($name), "::", stringify!($field), " ends past the underlying value")
                );
                assert!(
                    $width <= <$ty as $crate::packed::PackedField>::BITS,
                    concat!(stringify!($name), "::", stringify!($field), " is wider than its type")
                );
                let field_mask: u128 = ((1 << $width) - 1) << $offset;
                assert!(
                    occupied & field_mask == 0,
                    concat!(stringify!($name), "::", stringify!($field), " overlaps another field")
                );
                occupied |= field_mask;
            )+
            let _ = occupied;
        };

        #[allow(dead_code)]
        impl $name {
            #[must_use]
            pub const fn from_underlying(underlying: $underlying) -> Self {
                Self(underlying)
            }

            #[must_use]
            pub const fn to_underlying(self) -> $underlying {
                self.0
            }

            /// Packs every field, failing on the first value too wide for its field.
            #[allow(clippy::too_many_arguments)]
            pub fn new($($field: $ty),+) -> Result<Self, $crate::DecodeError> {
                let underlying = <$underlying>::ZERO;
                $(
                    let underlying = $crate::packed::pack_field(
                        underlying,
                        $field,
                        $offset,
                        $width,
                        concat!(stringify!($name), "::", stringify!($field)),
                    )?;
                )+
                Ok(Self(underlying))
            }

            $(
                $(#[$field_meta])*
                pub fn $field(self) -> Result<$ty, $crate::DecodeError> {
                    $crate::packed::unpack_field(
                        self.0,
                        $offset,
                        $width,
                        concat!(stringify!($name), "::", stringify!($field)),
                    )
                }
            )+

            /// Every field, in declaration order.
            pub fn fields(self) -> Result<($($ty,)+), $crate::DecodeError> {
                Ok(($(self.$field()?,)+))
            }
        }

        impl $crate::packed::Packed for $name {
            type Underlying = $underlying;
            const FIELD_COUNT: usize = [$(stringify!($field)),+].len();

            fn from_underlying(underlying: $underlying) -> Self {
                Self(underlying)
            }

            fn to_underlying(self) -> $underlying {
                self.0
            }
        }
    };
}

pub(crate) use packed_struct;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitwise::{Byte, Halfword, Word};
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(u8)]
    enum Colour {
        Red,
        Green,
        Blue,
    }

    impl Colour {
        const fn from_repr(repr: u8) -> Option<Self> {
            match repr {
                0 => Some(Self::Red),
                1 => Some(Self::Green),
                2 => Some(Self::Blue),
                _ => None,
            }
        }
    }

    packed_enum!(Colour);

    packed_struct! {
        struct Pixel: Halfword {
            colour: Colour = [0, 2],
            lit: bool = [2, 1],
            level: Byte = [8, 8],
        }
    }

    packed_struct! {
        struct Whole: Word {
            value: Word = [0, 32],
        }
    }

    #[test]
    fn packs_fields_at_their_offsets() {
        let pixel = Pixel::new(Colour::Blue, true, Byte::new(0xA5)).unwrap();
        assert_eq!(pixel.to_underlying(), Halfword::new(0xA506));
        assert_eq!(pixel.colour(), Ok(Colour::Blue));
        assert_eq!(pixel.lit(), Ok(true));
        assert_eq!(pixel.level(), Ok(Byte::new(0xA5)));
        assert_eq!(pixel.fields(), Ok((Colour::Blue, true, Byte::new(0xA5))));
        assert_eq!(<Pixel as Packed>::FIELD_COUNT, 3);
    }

    #[test]
    fn rewrapping_the_underlying_value_is_lossless() {
        let pixel = Pixel::new(Colour::Green, false, Byte::new(0x17)).unwrap();
        let again = Pixel::from_underlying(pixel.to_underlying());
        assert_eq!(again, pixel);
        assert_eq!(again.fields(), pixel.fields());
    }

    #[test]
    fn values_wider_than_the_field_are_rejected() {
        let whole = Whole::new(Word::MAX).unwrap();
        assert_eq!(whole.value(), Ok(Word::MAX));

        packed_struct! {
            struct Narrow: Halfword {
                nibble: Byte = [4, 4],
            }
        }
        let narrow = Narrow::new(Byte::new(0xF)).unwrap();
        assert_eq!(narrow.to_underlying(), Halfword::new(0x00F0));
        assert_eq!(narrow.nibble(), Ok(Byte::new(0xF)));
        assert_eq!(
            Narrow::new(Byte::new(0x1F)),
            Err(DecodeError::FieldOverflow { field: "Narrow::nibble", bits: 0x1F })
        );

        // blue is 2, which needs both bits of the colour field
        packed_struct! {
            struct Mono: Halfword {
                colour: Colour = [0, 1],
            }
        }
        assert_eq!(Mono::new(Colour::Green).unwrap().colour(), Ok(Colour::Green));
        assert_eq!(
            Mono::new(Colour::Blue),
            Err(DecodeError::FieldOverflow { field: "Mono::colour", bits: 2 })
        );
    }

    #[test]
    fn fits_checks_the_high_bits() {
        assert!(fits(0, 0));
        assert!(!fits(1, 0));
        assert!(fits(0xF, 4));
        assert!(!fits(0x10, 4));
        assert!(fits(u64::MAX, 64));
    }

    #[test]
    fn out_of_domain_bits_are_reported() {
        let pixel = Pixel::from_underlying(Halfword::new(0x0003));
        assert_eq!(
            pixel.colour(),
            Err(DecodeError::InvalidField { field: "Pixel::colour", bits: 3 })
        );
        assert_eq!(pixel.lit(), Ok(false));
        assert!(pixel.fields().is_err());
    }
}
