//! Architectural vocabulary shared by every instruction kind: registers,
//! condition codes, shift types and addresses.
//!
//! Each enum is `#[repr(u8)]` with the discriminant used in the packed layouts,
//! and offers `from_repr` to go back from those bits. `Display` gives the
//! lowercase assembler spelling.

use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::bitwise::{BitIndex, BitRange, BitSize, Word, extract};
use crate::packed::packed_enum;

/// A register operand.
///
/// `R0` to `R15` are the general purpose registers as numbered in instruction
/// encodings. `Cpsr` and `Spsr` only appear as operands of PSR transfers and
/// sit past the 4-bit register space, so fields that can hold them are 5 bits wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Register {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
    R8 = 8,
    R9 = 9,
    R10 = 10,
    R11 = 11,
    R12 = 12,
    R13 = 13,
    R14 = 14,
    R15 = 15,
    Cpsr = 16,
    Spsr = 17,
}

impl Register {
    /// Stack pointer.
    pub const SP: Self = Self::R13;
    /// Link register, holds the return address after `bl`.
    pub const LR: Self = Self::R14;
    /// Program counter.
    pub const PC: Self = Self::R15;

    #[must_use]
    pub const fn from_repr(repr: u8) -> Option<Self> {
        Some(match repr {
            0 => Self::R0,
            1 => Self::R1,
            2 => Self::R2,
            3 => Self::R3,
            4 => Self::R4,
            5 => Self::R5,
            6 => Self::R6,
            7 => Self::R7,
            8 => Self::R8,
            9 => Self::R9,
            10 => Self::R10,
            11 => Self::R11,
            12 => Self::R12,
            13 => Self::R13,
            14 => Self::R14,
            15 => Self::R15,
            16 => Self::Cpsr,
            17 => Self::Spsr,
            _ => return None,
        })
    }

    /// Whether this is one of the program status registers.
    #[must_use]
    pub const fn is_psr(self) -> bool {
        matches!(self, Self::Cpsr | Self::Spsr)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::R13 => f.write_str("sp"),
            Self::R14 => f.write_str("lr"),
            Self::R15 => f.write_str("pc"),
            Self::Cpsr => f.write_str("cpsr"),
            Self::Spsr => f.write_str("spsr"),
            general => write!(f, "r{}", *general as u8),
        }
    }
}

/// Condition under which an instruction executes, held in bits 28-31 of every
/// ARM instruction.
///
/// The flags tested are those of the CPSR: N (negative), Z (zero), C (carry)
/// and V (overflow). The bit pattern `0b1111` was "never" on early
/// architectures and is reserved on `ARMv4`, so it has no variant here and
/// reading it from an encoding fails.
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Condition {
    /// Equal, Z set.
    EQ = 0x0,
    /// Not equal, Z clear.
    NE = 0x1,
    /// Carry set, unsigned higher or same.
    CS = 0x2,
    /// Carry clear, unsigned lower.
    CC = 0x3,
    /// Negative, N set.
    MI = 0x4,
    /// Positive or zero, N clear.
    PL = 0x5,
    /// Overflow, V set.
    VS = 0x6,
    /// No overflow, V clear.
    VC = 0x7,
    /// Unsigned higher, C set and Z clear.
    HI = 0x8,
    /// Unsigned lower or same, C clear or Z set.
    LS = 0x9,
    /// Signed greater or equal, N equals V.
    GE = 0xA,
    /// Signed less than, N differs from V.
    LT = 0xB,
    /// Signed greater than, Z clear and N equals V.
    GT = 0xC,
    /// Signed less or equal, Z set or N differs from V.
    LE = 0xD,
    /// Always. Assemblers omit the suffix for it.
    AL = 0xE,
}

impl Condition {
    #[must_use]
    pub const fn from_repr(repr: u8) -> Option<Self> {
        Some(match repr {
            0x0 => Self::EQ,
            0x1 => Self::NE,
            0x2 => Self::CS,
            0x3 => Self::CC,
            0x4 => Self::MI,
            0x5 => Self::PL,
            0x6 => Self::VS,
            0x7 => Self::VC,
            0x8 => Self::HI,
            0x9 => Self::LS,
            0xA => Self::GE,
            0xB => Self::LT,
            0xC => Self::GT,
            0xD => Self::LE,
            0xE => Self::AL,
            _ => return None,
        })
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EQ => f.write_str("eq"),
            Self::NE => f.write_str("ne"),
            Self::CS => f.write_str("cs"),
            Self::CC => f.write_str("cc"),
            Self::MI => f.write_str("mi"),
            Self::PL => f.write_str("pl"),
            Self::VS => f.write_str("vs"),
            Self::VC => f.write_str("vc"),
            Self::HI => f.write_str("hi"),
            Self::LS => f.write_str("ls"),
            Self::GE => f.write_str("ge"),
            Self::LT => f.write_str("lt"),
            Self::GT => f.write_str("gt"),
            Self::LE => f.write_str("le"),
            Self::AL => Ok(()),
        }
    }
}

/// How the barrel shifter transforms a register operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ShiftType {
    LogicalLeft = 0,
    LogicalRight = 1,
    ArithmeticRight = 2,
    RotateRight = 3,
    /// Rotate right by one through the carry flag. Encoded as a rotate right by zero.
    RotateRightExtended = 4,
}

impl ShiftType {
    #[must_use]
    pub const fn from_repr(repr: u8) -> Option<Self> {
        Some(match repr {
            0 => Self::LogicalLeft,
            1 => Self::LogicalRight,
            2 => Self::ArithmeticRight,
            3 => Self::RotateRight,
            4 => Self::RotateRightExtended,
            _ => return None,
        })
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LogicalLeft => "lsl",
            Self::LogicalRight => "lsr",
            Self::ArithmeticRight => "asr",
            Self::RotateRight => "ror",
            Self::RotateRightExtended => "rrx",
        })
    }
}

packed_enum!(Register, Condition, ShiftType);

/// A byte address in the 32-bit address space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(Word);

impl Address {
    #[must_use]
    pub const fn new(address: Word) -> Self {
        Self(address)
    }

    #[must_use]
    pub const fn get(self) -> Word {
        self.0
    }

    /// Whether the two low bits are clear.
    #[must_use]
    pub fn is_word_aligned(self) -> bool {
        extract(self.0, BitRange::new(BitIndex::new(0), BitSize::new(2))) == Word::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Signed distance between two addresses, held in two's complement.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressOffset(Word);

impl AddressOffset {
    #[must_use]
    pub const fn new(offset: Word) -> Self {
        Self(offset)
    }

    #[must_use]
    pub const fn get(self) -> Word {
        self.0
    }

    /// The offset as a signed byte count.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn signed(self) -> i32 {
        self.0.get() as i32
    }
}

impl Neg for AddressOffset {
    type Output = Self;

    fn neg(self) -> Self {
        Self(Word::ZERO - self.0)
    }
}

impl Add<AddressOffset> for Address {
    type Output = Self;

    fn add(self, offset: AddressOffset) -> Self {
        Self(self.0 + offset.0)
    }
}

impl Sub<AddressOffset> for Address {
    type Output = Self;

    fn sub(self, offset: AddressOffset) -> Self {
        Self(self.0 - offset.0)
    }
}

impl Sub for Address {
    type Output = AddressOffset;

    fn sub(self, origin: Self) -> AddressOffset {
        AddressOffset(self.0 - origin.0)
    }
}

impl crate::packed::PackedField for AddressOffset {
    const BITS: usize = 32;

    fn to_bits(self) -> u64 {
        self.0.widen()
    }

    fn from_bits(bits: u64) -> Option<Self> {
        Some(Self(Word::truncate(bits)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn register_aliases() {
        assert_eq!(Register::SP, Register::R13);
        assert_eq!(Register::LR, Register::R14);
        assert_eq!(Register::PC, Register::R15);
        assert!(Register::Spsr.is_psr());
        assert!(!Register::PC.is_psr());
    }

    #[test]
    fn register_repr() {
        for repr in 0..=17 {
            let register = Register::from_repr(repr).unwrap();
            assert_eq!(register as u8, repr);
        }
        assert_eq!(Register::from_repr(18), None);
    }

    #[test]
    fn register_names() {
        assert_eq!(Register::R0.to_string(), "r0");
        assert_eq!(Register::R12.to_string(), "r12");
        assert_eq!(Register::SP.to_string(), "sp");
        assert_eq!(Register::LR.to_string(), "lr");
        assert_eq!(Register::PC.to_string(), "pc");
        assert_eq!(Register::Cpsr.to_string(), "cpsr");
        assert_eq!(Register::Spsr.to_string(), "spsr");
    }

    #[test]
    fn condition_repr() {
        for repr in 0x0..=0xE {
            assert_eq!(Condition::from_repr(repr).unwrap() as u8, repr);
        }
        assert_eq!(Condition::from_repr(0xF), None);
        assert_eq!(Condition::GE.to_string(), "ge");
        assert_eq!(Condition::AL.to_string(), "");
    }

    #[test]
    fn shift_type_repr() {
        assert_eq!(ShiftType::from_repr(4), Some(ShiftType::RotateRightExtended));
        assert_eq!(ShiftType::from_repr(5), None);
        assert_eq!(ShiftType::ArithmeticRight.to_string(), "asr");
    }

    #[test]
    fn address_arithmetic() {
        let origin = Address::new(Word::new(0x0800_0000));
        let target = Address::new(Word::new(0x0800_0010));

        let forward = target - origin;
        assert_eq!(forward, AddressOffset::new(Word::new(0x10)));
        assert_eq!(forward.signed(), 16);
        assert_eq!((origin - target).signed(), -16);
        assert_eq!(-forward, origin - target);
        assert_eq!(origin + forward, target);
        assert_eq!(target - forward, origin);

        assert_eq!(
            Address::new(Word::ZERO) - AddressOffset::new(Word::new(4)),
            Address::new(Word::new(0xFFFF_FFFC))
        );
    }

    #[test]
    fn alignment() {
        assert!(Address::new(Word::new(0x0800_0000)).is_word_aligned());
        assert!(!Address::new(Word::new(0x0800_0002)).is_word_aligned());
        assert!(!Address::new(Word::new(0x0800_0001)).is_word_aligned());
        assert_eq!(Address::new(Word::new(0x1C)).to_string(), "0x0000001c");
    }
}
