//! Fixed-width unsigned integers that carry their bit width in the type.
//!
//! Raw machine integers never flow through the decoder directly: every value is
//! wrapped in an [`Unsigned`] so that a `Halfword` can't be silently passed where
//! a `Word` is expected. All operators have defined results for every input,
//! shifting by the full width or more gives zero instead of panicking.

use std::fmt;
use std::hash::Hash;
use std::ops::{
    Add, BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not, Shl, Shr, Sub,
};

use serde::{Deserialize, Serialize};

use super::index::BitSize;

mod sealed {
    pub trait Sealed {}
}

/// Machine integer that can back an [`Unsigned`].
///
/// Implemented for `u8`, `u16`, `u32` and `u64` only.
pub trait Raw:
    sealed::Sealed
    + Copy
    + Eq
    + Ord
    + Hash
    + Default
    + fmt::Debug
    + fmt::Display
    + fmt::LowerHex
    + fmt::UpperHex
    + fmt::Binary
    + Not<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
{
    const BITS: usize;
    const ZERO: Self;
    const ONE: Self;
    const MAX: Self;

    fn checked_shl(self, amount: u32) -> Option<Self>;
    fn checked_shr(self, amount: u32) -> Option<Self>;
    fn wrapping_shl(self, amount: u32) -> Self;
    fn wrapping_shr(self, amount: u32) -> Self;
    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;

    /// Shifts right replicating the most significant bit.
    /// Amounts past the width behave like a shift by `BITS - 1`.
    fn arithmetic_shr(self, amount: u32) -> Self;
    fn rotate_right(self, amount: u32) -> Self;
    fn count_ones(self) -> u32;

    /// Zero-extends to 64 bits.
    fn widen(self) -> u64;

    /// Keeps the low `BITS` bits.
    fn truncate(bits: u64) -> Self;
}

macro_rules! impl_raw {
    ($($raw:ty => $signed:ty),+ $(,)?) => {
        $(
            impl sealed::Sealed for $raw {}

            impl Raw for $raw {
                const BITS: usize = <$raw>::BITS as usize;
                const ZERO: Self = 0;
                const ONE: Self = 1;
                const MAX: Self = <$raw>::MAX;

                fn checked_shl(self, amount: u32) -> Option<Self> {
                    <$raw>::checked_shl(self, amount)
                }

                fn checked_shr(self, amount: u32) -> Option<Self> {
                    <$raw>::checked_shr(self, amount)
                }

                fn wrapping_shl(self, amount: u32) -> Self {
                    <$raw>::wrapping_shl(self, amount)
                }

                fn wrapping_shr(self, amount: u32) -> Self {
                    <$raw>::wrapping_shr(self, amount)
                }

                fn wrapping_add(self, rhs: Self) -> Self {
                    <$raw>::wrapping_add(self, rhs)
                }

                fn wrapping_sub(self, rhs: Self) -> Self {
                    <$raw>::wrapping_sub(self, rhs)
                }

                fn arithmetic_shr(self, amount: u32) -> Self {
                    let amount = amount.min(<$raw>::BITS - 1);
                    ((self as $signed) >> amount) as $raw
                }

                fn rotate_right(self, amount: u32) -> Self {
                    <$raw>::rotate_right(self, amount)
                }

                fn count_ones(self) -> u32 {
                    <$raw>::count_ones(self)
                }

                fn widen(self) -> u64 {
                    u64::from(self)
                }

                fn truncate(bits: u64) -> Self {
                    bits as $raw
                }
            }

            impl Unsigned<$raw> {
                #[must_use]
                pub const fn new(value: $raw) -> Self {
                    Self(value)
                }

                #[must_use]
                pub const fn get(self) -> $raw {
                    self.0
                }
            }

            impl From<$raw> for Unsigned<$raw> {
                fn from(value: $raw) -> Self {
                    Self(value)
                }
            }

            impl From<Unsigned<$raw>> for $raw {
                fn from(value: Unsigned<$raw>) -> Self {
                    value.0
                }
            }
        )+
    };
}

impl_raw!(u8 => i8, u16 => i16, u32 => i32, u64 => i64);

/// Amount of a shift or rotation, in bits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BitShiftAmount(u8);

impl BitShiftAmount {
    #[must_use]
    pub const fn new(amount: u8) -> Self {
        Self(amount)
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for BitShiftAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// An unsigned integer of exactly `size_of::<T>()` bytes.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unsigned<T>(T);

pub type Byte = Unsigned<u8>;
pub type Halfword = Unsigned<u16>;
pub type Word = Unsigned<u32>;
pub type Doubleword = Unsigned<u64>;

impl<T: Raw> Unsigned<T> {
    pub const BITS: BitSize = BitSize::new(T::BITS);
    pub const ZERO: Self = Self(T::ZERO);
    pub const ONE: Self = Self(T::ONE);
    pub const MAX: Self = Self(T::MAX);

    #[must_use]
    pub const fn from_raw(raw: T) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn into_raw(self) -> T {
        self.0
    }

    /// Builds a value from the low bits of `bits`, dropping whatever doesn't fit.
    #[must_use]
    pub fn truncate(bits: u64) -> Self {
        Self(T::truncate(bits))
    }

    /// Zero-extends the value to 64 bits.
    #[must_use]
    pub fn widen(self) -> u64 {
        self.0.widen()
    }

    #[must_use]
    pub fn count_ones(self) -> u32 {
        self.0.count_ones()
    }

    /// Shifts right filling with copies of the sign bit.
    #[must_use]
    pub fn arithmetic_shift_right(self, amount: BitShiftAmount) -> Self {
        Self(self.0.arithmetic_shr(u32::from(amount.get())))
    }

    #[must_use]
    pub fn rotate_right(self, amount: BitShiftAmount) -> Self {
        Self(self.0.rotate_right(u32::from(amount.get())))
    }
}

impl<T: Raw> fmt::Debug for Unsigned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl<T: Raw> fmt::Display for Unsigned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<T: Raw> fmt::LowerHex for Unsigned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl<T: Raw> fmt::UpperHex for Unsigned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl<T: Raw> fmt::Binary for Unsigned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Binary::fmt(&self.0, f)
    }
}

impl<T: Raw> Shl<BitShiftAmount> for Unsigned<T> {
    type Output = Self;

    fn shl(self, amount: BitShiftAmount) -> Self {
        Self(
            self.0
                .checked_shl(u32::from(amount.get()))
                .unwrap_or(T::ZERO),
        )
    }
}

impl<T: Raw> Shr<BitShiftAmount> for Unsigned<T> {
    type Output = Self;

    fn shr(self, amount: BitShiftAmount) -> Self {
        Self(
            self.0
                .checked_shr(u32::from(amount.get()))
                .unwrap_or(T::ZERO),
        )
    }
}

impl<T: Raw> Not for Unsigned<T> {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl<T: Raw> BitAnd for Unsigned<T> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl<T: Raw> BitAndAssign for Unsigned<T> {
    fn bitand_assign(&mut self, rhs: Self) {
        *self = *self & rhs;
    }
}

impl<T: Raw> BitOr for Unsigned<T> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl<T: Raw> BitOrAssign for Unsigned<T> {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

impl<T: Raw> BitXor for Unsigned<T> {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl<T: Raw> BitXorAssign for Unsigned<T> {
    fn bitxor_assign(&mut self, rhs: Self) {
        *self = *self ^ rhs;
    }
}

impl<T: Raw> Add for Unsigned<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl<T: Raw> Sub for Unsigned<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}
